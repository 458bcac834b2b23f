//! Domain records exchanged with the remote data service.
//!
//! These are plain serde structs, normalized by id in the
//! [`crate::store::EntityStore`]. Field names follow Rust conventions; the
//! wire format of the remote service (camelCase keys, UPPERCASE enum
//! variants) is handled with serde renames so the rest of the crate never
//! sees wire spelling.

/// Standalone category budget, independent of any Plan
pub mod budget;
/// Explicit daily ledger entry and its edit-capability state machine
pub mod daily_transaction;
/// Recurring daily template applied when no explicit entry exists
pub mod default_transaction;
/// Top-level plan with period and warning thresholds
pub mod plan;
/// Income/expense line within a plan
pub mod plan_item;

pub use budget::Budget;
pub use daily_transaction::{DailyTransaction, EditState};
pub use default_transaction::DefaultTransaction;
pub use plan::{Plan, PlanPeriod, PlanStatus};
pub use plan_item::{ExcludeKind, ItemKind, PlanItem};
