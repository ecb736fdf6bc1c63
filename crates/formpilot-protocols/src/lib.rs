//! # FormPilot Protocols
//!
//! Shared data model and trait seams for the FormPilot engine.
//! Contains only type definitions and interfaces - no implementations.
//!
//! ## Core Types
//!
//! - [`FieldDescriptor`] / [`Locator`] - what the Field Detector produces
//! - [`ActionPlan`] / [`ActionStep`] - what the Plan Builder produces
//! - [`ExecutionResult`] / [`AuditRecord`] - what execution appends
//!
//! ## Core Traits
//!
//! - [`CompanionService`] - the external loopback automation service
//! - [`QuotaStore`] - daily submission counter persistence
//! - [`ConfirmationSource`] - external human-approval signal
//! - [`AuditSink`] - append-only audit trail

pub mod field;
pub mod geometry;
pub mod outcome;
pub mod plan;
pub mod service;

pub use field::{FieldDescriptor, FieldKind, HopBoundary, Locator, LocatorHop};
pub use geometry::{BoundingBox, ScreenPoint, ViewportInfo};
pub use outcome::{
    AuditRecord, ErrorKind, ExecutionResult, GateDecision, GateKind, PlanPhase, StepStatus,
};
pub use plan::{ActionPlan, ActionStep, StrategyKind, WaitCondition, SUBMIT_KEY, advance_key};
pub use service::{
    AuditSink, CompanionError, CompanionResponse, CompanionService, ConfirmationOutcome,
    ConfirmationSource, HealthStatus, QuotaDecision, QuotaError, QuotaStore, ScreenshotRef,
};
