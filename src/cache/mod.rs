//! Cache consistency layer - a tag-dependency graph over cached queries.
//!
//! Every cached query walks `fresh → stale → refetching → fresh`. A
//! mutation invalidates tags; invalidation marks dependent entries stale
//! and nothing else (no fetch happens until the next read). A refetch
//! records the graph clock when it starts; if any of its tags is
//! invalidated while the fetch is in flight, the committed entry lands
//! stale again (last invalidation wins) instead of masquerading as fresh.
//! Results are committed under the query identity captured at fetch start,
//! so changing parameters can never smuggle an old result under a new key.
//!
//! Under-declaring tags causes stale reads; over-declaring only causes
//! redundant refetches. When in doubt, declare more.

/// Tag vocabulary of the invalidation graph
pub mod tags;

use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use tracing::trace;

use crate::api::types::{DailyLedgerResponse, DefaultTransactionsResponse, ListResponse};
use crate::core::summary::{ItemSummary, PlanSummary};
use crate::entities::{Budget, Plan, PlanItem};
pub use tags::Tag;

/// Freshness state of one cached query.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QueryState {
    /// The cached value may be served without touching the service
    Fresh,
    /// A depended-on tag was invalidated; the next read must refetch
    Stale,
    /// A read is currently refetching this entry
    Refetching,
}

/// Identity of a cached query, parameters included.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum QueryKey {
    /// Paginated plan list window
    Plans { skip: u64, limit: u64 },
    /// One plan's detail record
    Plan(i64),
    /// Item list of one plan
    PlanItems(i64),
    /// One item's detail record
    PlanItem(i64),
    /// Day-grouped ledger window of one item
    DailyLedger {
        plan_id: i64,
        item_id: i64,
        skip: u64,
        limit: u64,
    },
    /// Template list of one item
    DefaultTransactions { plan_id: i64, item_id: i64 },
    /// Derived item summary over a period window
    ItemSummary {
        item_id: i64,
        start: NaiveDate,
        end: NaiveDate,
    },
    /// Derived plan summary
    PlanSummary(i64),
    /// Paginated budget list window
    Budgets { skip: u64, limit: u64 },
    /// One budget's detail record
    Budget(i64),
}

/// The cached result of a query, one variant per query shape.
#[derive(Clone, Debug)]
pub enum CachedValue {
    Plans(ListResponse<Plan>),
    Plan(Plan),
    PlanItems(ListResponse<PlanItem>),
    PlanItem(PlanItem),
    DailyLedger(DailyLedgerResponse),
    DefaultTransactions(DefaultTransactionsResponse),
    ItemSummary(ItemSummary),
    PlanSummary(PlanSummary),
    Budgets(ListResponse<Budget>),
    Budget(Budget),
}

#[derive(Clone, Debug)]
struct CacheEntry {
    value: CachedValue,
    tags: HashSet<Tag>,
    state: QueryState,
}

/// Tag-dependency graph plus the entries it governs.
///
/// The graph is stored both ways - query → tags inside each entry, tag →
/// dependent queries in `dependents` - and both sides are updated under the
/// same `&mut self`, so a mutation's invalidation is transactional.
#[derive(Debug, Default)]
pub struct QueryCache {
    entries: HashMap<QueryKey, CacheEntry>,
    dependents: HashMap<Tag, HashSet<QueryKey>>,
    invalidated_at: HashMap<Tag, u64>,
    clock: u64,
}

impl QueryCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The cached value, only while the entry is fresh.
    #[must_use]
    pub fn fresh_value(&self, key: &QueryKey) -> Option<&CachedValue> {
        self.entries
            .get(key)
            .filter(|entry| entry.state == QueryState::Fresh)
            .map(|entry| &entry.value)
    }

    /// Freshness state of a query, if it was ever cached.
    #[must_use]
    pub fn state(&self, key: &QueryKey) -> Option<QueryState> {
        self.entries.get(key).map(|entry| entry.state)
    }

    /// Marks the entry as refetching (a read is on its way to the service)
    /// and returns the clock snapshot the commit must be checked against.
    pub fn begin_refetch(&mut self, key: &QueryKey) -> u64 {
        if let Some(entry) = self.entries.get_mut(key) {
            entry.state = QueryState::Refetching;
        }
        self.clock
    }

    /// Commits a refetched value under the identity captured at fetch
    /// start. When one of the declared tags was invalidated after
    /// `started_at`, the entry is stored `stale` - the caller still gets
    /// the value (it is the freshest available) but the next read
    /// refetches. Returns the state the entry landed in.
    pub fn commit(
        &mut self,
        key: QueryKey,
        value: CachedValue,
        tags: HashSet<Tag>,
        started_at: u64,
    ) -> QueryState {
        let invalidated_mid_flight = tags
            .iter()
            .any(|tag| self.invalidated_at.get(tag).copied().unwrap_or(0) > started_at);
        let state = if invalidated_mid_flight {
            QueryState::Stale
        } else {
            QueryState::Fresh
        };
        trace!("commit {key:?} as {state:?}");
        self.unlink(&key);
        for tag in &tags {
            self.dependents.entry(*tag).or_default().insert(key.clone());
        }
        self.entries.insert(key, CacheEntry { value, tags, state });
        state
    }

    /// Returns a refetching entry to `stale` after a failed fetch. The
    /// error is the caller's to surface; the old value is never promoted.
    pub fn abort_refetch(&mut self, key: &QueryKey) {
        if let Some(entry) = self.entries.get_mut(key) {
            if entry.state == QueryState::Refetching {
                entry.state = QueryState::Stale;
            }
        }
    }

    /// Invalidates a set of tags in one transactional step: the clock
    /// advances once and every dependent entry drops to `stale`.
    /// Invalidation is idempotent and never triggers a fetch by itself.
    pub fn invalidate<I>(&mut self, tags: I)
    where
        I: IntoIterator<Item = Tag>,
    {
        self.clock += 1;
        for tag in tags {
            trace!("invalidate {tag:?} at clock {}", self.clock);
            self.invalidated_at.insert(tag, self.clock);
            if let Some(keys) = self.dependents.get(&tag) {
                for key in keys {
                    if let Some(entry) = self.entries.get_mut(key) {
                        if entry.state == QueryState::Fresh {
                            entry.state = QueryState::Stale;
                        }
                        // Refetching entries stay refetching; the clock
                        // comparison at commit demotes them.
                    }
                }
            }
        }
    }

    /// Drops an entry entirely, e.g. after its primary entity is deleted.
    pub fn evict(&mut self, key: &QueryKey) {
        self.unlink(key);
        self.entries.remove(key);
    }

    /// The queries currently depending on a tag. Exposed so invalidation
    /// stays auditable from tests.
    #[must_use]
    pub fn dependents_of(&self, tag: Tag) -> Vec<QueryKey> {
        self.dependents
            .get(&tag)
            .map(|keys| keys.iter().cloned().collect())
            .unwrap_or_default()
    }

    fn unlink(&mut self, key: &QueryKey) {
        if let Some(entry) = self.entries.get(key) {
            for tag in entry.tags.clone() {
                if let Some(keys) = self.dependents.get_mut(&tag) {
                    keys.remove(key);
                    if keys.is_empty() {
                        self.dependents.remove(&tag);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::plan_fixture;

    fn entry_tags(plan_id: i64) -> HashSet<Tag> {
        HashSet::from([Tag::Plan(plan_id)])
    }

    fn commit_plan(cache: &mut QueryCache, plan_id: i64, started_at: u64) -> QueryState {
        cache.commit(
            QueryKey::Plan(plan_id),
            CachedValue::Plan(plan_fixture(plan_id)),
            entry_tags(plan_id),
            started_at,
        )
    }

    #[test]
    fn test_state_machine_happy_path() {
        let mut cache = QueryCache::new();
        let key = QueryKey::Plan(1);

        assert_eq!(cache.state(&key), None);
        let started = cache.begin_refetch(&key);
        assert_eq!(commit_plan(&mut cache, 1, started), QueryState::Fresh);
        assert_eq!(cache.state(&key), Some(QueryState::Fresh));
        assert!(cache.fresh_value(&key).is_some());

        cache.invalidate([Tag::Plan(1)]);
        assert_eq!(cache.state(&key), Some(QueryState::Stale));
        assert!(cache.fresh_value(&key).is_none());

        let started = cache.begin_refetch(&key);
        assert_eq!(cache.state(&key), Some(QueryState::Refetching));
        assert_eq!(commit_plan(&mut cache, 1, started), QueryState::Fresh);
        assert_eq!(cache.state(&key), Some(QueryState::Fresh));
    }

    #[test]
    fn test_invalidation_is_idempotent() {
        let mut cache = QueryCache::new();
        let key = QueryKey::Plan(1);
        let started = cache.begin_refetch(&key);
        commit_plan(&mut cache, 1, started);

        cache.invalidate([Tag::Plan(1)]);
        let clock_after_first = cache.clock;
        cache.invalidate([Tag::Plan(1)]);

        // Still exactly stale - no refetch was triggered, no state churn
        assert_eq!(cache.state(&key), Some(QueryState::Stale));
        assert_eq!(cache.clock, clock_after_first + 1, "clock ticks, state does not");
    }

    #[test]
    fn test_mid_flight_invalidation_wins() {
        let mut cache = QueryCache::new();
        let key = QueryKey::Plan(1);

        let started = cache.begin_refetch(&key);
        // Mutation commits while the read is in flight
        cache.invalidate([Tag::Plan(1)]);

        let state = commit_plan(&mut cache, 1, started);
        assert_eq!(state, QueryState::Stale, "in-flight read must not be cached fresh");
        assert!(cache.fresh_value(&key).is_none());

        // The next read refetches and, without further invalidation, lands fresh
        let started = cache.begin_refetch(&key);
        assert_eq!(commit_plan(&mut cache, 1, started), QueryState::Fresh);
    }

    #[test]
    fn test_unrelated_tags_stay_fresh() {
        let mut cache = QueryCache::new();
        let started_one = cache.begin_refetch(&QueryKey::Plan(1));
        commit_plan(&mut cache, 1, started_one);
        let started_two = cache.begin_refetch(&QueryKey::Plan(2));
        commit_plan(&mut cache, 2, started_two);

        cache.invalidate([Tag::Plan(1)]);

        assert_eq!(cache.state(&QueryKey::Plan(1)), Some(QueryState::Stale));
        assert_eq!(cache.state(&QueryKey::Plan(2)), Some(QueryState::Fresh));
    }

    #[test]
    fn test_failed_refetch_returns_to_stale() {
        let mut cache = QueryCache::new();
        let key = QueryKey::Plan(1);
        let started = cache.begin_refetch(&key);
        commit_plan(&mut cache, 1, started);
        cache.invalidate([Tag::Plan(1)]);

        cache.begin_refetch(&key);
        cache.abort_refetch(&key);
        assert_eq!(cache.state(&key), Some(QueryState::Stale));
        assert!(cache.fresh_value(&key).is_none(), "old value is not promoted");
    }

    #[test]
    fn test_commit_updates_dependency_graph() {
        let mut cache = QueryCache::new();
        let key = QueryKey::PlanItems(1);
        let started = cache.begin_refetch(&key);
        cache.commit(
            key.clone(),
            CachedValue::PlanItems(ListResponse {
                items: vec![],
                pagination: crate::api::types::Pagination::for_window(0, 0, 0),
            }),
            HashSet::from([Tag::PlanItemList(1), Tag::PlanItem(10)]),
            started,
        );

        assert_eq!(cache.dependents_of(Tag::PlanItemList(1)), vec![key.clone()]);
        assert_eq!(cache.dependents_of(Tag::PlanItem(10)), vec![key.clone()]);

        // Recommit with a smaller tag set; the old link must disappear
        let started = cache.begin_refetch(&key);
        cache.commit(
            key.clone(),
            CachedValue::PlanItems(ListResponse {
                items: vec![],
                pagination: crate::api::types::Pagination::for_window(0, 0, 0),
            }),
            HashSet::from([Tag::PlanItemList(1)]),
            started,
        );
        assert!(cache.dependents_of(Tag::PlanItem(10)).is_empty());
    }

    #[test]
    fn test_evict_unlinks_dependents() {
        let mut cache = QueryCache::new();
        let key = QueryKey::Plan(1);
        let started = cache.begin_refetch(&key);
        commit_plan(&mut cache, 1, started);

        cache.evict(&key);
        assert_eq!(cache.state(&key), None);
        assert!(cache.dependents_of(Tag::Plan(1)).is_empty());
    }
}
