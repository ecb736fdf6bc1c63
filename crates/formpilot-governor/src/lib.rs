//! # FormPilot Governor
//!
//! Gates plan execution: domain whitelist, daily submission quota, and
//! mandatory human confirmation. Each gate is independently enforceable and
//! every decision is audit-logged. Quota and confirmation are injected
//! dependencies, never module-level state.

pub mod audit;
pub mod error;
pub mod governor;
pub mod lifecycle;
pub mod quota;

pub use audit::{JsonlAuditSink, MemoryAuditSink};
pub use error::GovernorError;
pub use governor::{ConfirmationVerdict, SafetyGovernor, StaticConfirmation};
pub use lifecycle::PlanLifecycle;
pub use quota::{JsonFileQuotaStore, MemoryQuotaStore};
