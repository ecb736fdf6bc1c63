//! # FormPilot Planner
//!
//! Maps field descriptors plus an externally-supplied value map into an
//! ordered, dependency-annotated action plan. Building is pure and
//! deterministic: identical inputs produce byte-identical plans.

pub mod builder;
pub mod similarity;

pub use builder::{PlanOptions, ValueMap, build};
pub use similarity::similarity;
