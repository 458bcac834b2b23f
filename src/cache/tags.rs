//! Cache tags - the vocabulary of the invalidation graph.
//!
//! A tag names either one entity or one collection. Every cached query
//! declares the tags it depends on; every mutation declares the tags it
//! invalidates. Side-effect tags (an item's aggregate, a plan's summary)
//! make the transitive dependencies explicit instead of hoping the UI
//! refetches the right things.

/// Dependency label connecting cached queries to the entities and
/// collections they were computed from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Tag {
    /// The collection of all plans
    PlanList,
    /// One plan's detail record
    Plan(i64),
    /// One plan's derived summary figures
    PlanSummary(i64),
    /// The item collection of one plan
    PlanItemList(i64),
    /// One item's detail record and aggregates
    PlanItem(i64),
    /// The daily ledger of one item
    DailyLedger(i64),
    /// One explicit ledger entry
    DailyTransaction(i64),
    /// The template collection of one item
    DefaultTransactionList(i64),
    /// One recurring template
    DefaultTransaction(i64),
    /// The collection of all budgets
    BudgetList,
    /// One budget's detail record
    Budget(i64),
}
