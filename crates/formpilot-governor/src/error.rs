//! Governor errors.

use formpilot_protocols::PlanPhase;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GovernorError {
    #[error("Invalid plan transition: {from} -> {to}")]
    InvalidTransition { from: PlanPhase, to: PlanPhase },

    #[error("Quota store failure: {0}")]
    Quota(#[from] formpilot_protocols::QuotaError),
}
