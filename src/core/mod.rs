//! Core business logic - framework-agnostic derived-state computation.
//!
//! Everything in here is a pure function over a snapshot of the entity
//! store. Data-shape edge cases (zero budgets, empty ledgers) degrade to
//! zeros and empty lists, never to errors or NaN.

/// Spent/remaining/average aggregation over effective transactions
pub mod aggregate;
/// Percentage-to-status classification with fixed-point tie-breaks
pub mod classify;
/// Effective-transaction layering of explicit entries over defaults
pub mod reconcile;
/// Item and plan derived views, period windows
pub mod summary;
/// Field-level validation and the ledger edit capability
pub mod validate;
