//! Executor errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExecError {
    #[error("Invalid plan: {0}")]
    InvalidPlan(String),

    #[error(transparent)]
    Governor(#[from] formpilot_governor::GovernorError),
}
