//! Plan lifecycle state machine.

use std::sync::Arc;

use tracing::debug;

use formpilot_protocols::{AuditRecord, AuditSink, PlanPhase};

use crate::error::GovernorError;

/// Tracks one plan execution through
/// `Created -> DomainChecked -> Executing -> AwaitingConfirmation ->
/// Submitted | SubmitSkipped`, auditing every transition.
pub struct PlanLifecycle {
    phase: PlanPhase,
    audit: Arc<dyn AuditSink>,
}

impl PlanLifecycle {
    pub fn new(audit: Arc<dyn AuditSink>) -> Self {
        Self {
            phase: PlanPhase::Created,
            audit,
        }
    }

    pub fn phase(&self) -> PlanPhase {
        self.phase
    }

    pub fn advance(&mut self, to: PlanPhase) -> Result<(), GovernorError> {
        if !transition_allowed(self.phase, to) {
            return Err(GovernorError::InvalidTransition {
                from: self.phase,
                to,
            });
        }
        debug!("plan phase {} -> {}", self.phase, to);
        self.audit.append(AuditRecord::transition(self.phase, to));
        self.phase = to;
        Ok(())
    }
}

fn transition_allowed(from: PlanPhase, to: PlanPhase) -> bool {
    use PlanPhase::*;
    matches!(
        (from, to),
        (Created, DomainChecked)
            | (DomainChecked, Executing)
            | (Executing, AwaitingConfirmation)
            // A plan without a submit step finishes as SubmitSkipped.
            | (Executing, SubmitSkipped)
            | (AwaitingConfirmation, Submitted)
            | (AwaitingConfirmation, SubmitSkipped)
    )
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
