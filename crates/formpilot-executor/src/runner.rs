//! Dependency-ordered plan execution behind the safety gates.

use std::collections::{BTreeMap, BTreeSet};

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use formpilot_detector::detect;
use formpilot_governor::{ConfirmationVerdict, PlanLifecycle, SafetyGovernor};
use formpilot_protocols::{
    ActionPlan, ActionStep, AuditRecord, ErrorKind, ExecutionResult, FieldDescriptor, PlanPhase,
    StepStatus,
};

use crate::context::ExecutionContext;
use crate::error::ExecError;
use crate::strategies::{ResolvedTarget, StepOutcome, execute_step, record_result};
use crate::wait::await_condition;

/// Outcome of one gated plan run.
#[derive(Debug)]
pub struct PlanReport {
    pub phase: PlanPhase,
    /// One entry per attempt (and per skip), in execution order.
    pub results: Vec<ExecutionResult>,
    /// Final status per step id.
    pub statuses: BTreeMap<u32, StepStatus>,
    /// Set when a pre-flight gate aborted the plan before execution.
    pub denial: Option<ErrorKind>,
}

impl PlanReport {
    pub fn status(&self, step_id: u32) -> Option<StepStatus> {
        self.statuses.get(&step_id).copied()
    }

    pub fn all_succeeded(&self) -> bool {
        !self.statuses.is_empty()
            && self.statuses.values().all(|s| *s == StepStatus::Success)
    }
}

/// Runs plans one step at a time: dependency order, wait conditions,
/// submit gates, re-detection after stage advances, and cancellation at
/// step boundaries.
pub struct PlanRunner {
    ctx: ExecutionContext,
}

impl PlanRunner {
    pub fn new(ctx: ExecutionContext) -> Self {
        Self { ctx }
    }

    /// Token cancelling this runner's plan at the next step boundary.
    pub fn cancel_token(&self) -> CancellationToken {
        self.ctx.cancel.clone()
    }

    pub async fn run(
        &self,
        plan: &ActionPlan,
        governor: &SafetyGovernor,
    ) -> Result<PlanReport, ExecError> {
        validate(plan)?;
        let mut lifecycle = PlanLifecycle::new(governor.audit());

        if !governor.check_domain(&self.ctx.session.origin()).is_allow() {
            return Ok(PlanReport {
                phase: lifecycle.phase(),
                results: Vec::new(),
                statuses: BTreeMap::new(),
                denial: Some(ErrorKind::DomainNotWhitelisted),
            });
        }
        lifecycle.advance(PlanPhase::DomainChecked)?;
        lifecycle.advance(PlanPhase::Executing)?;

        let mut fields = detect(&self.ctx.session.snapshot());
        if plan.is_empty() {
            // Non-fatal: an empty plan just runs no steps.
            debug!("{}: plan has no steps", ErrorKind::DetectionEmpty);
        }

        let mut results: Vec<ExecutionResult> = Vec::new();
        let mut statuses: BTreeMap<u32, StepStatus> = BTreeMap::new();
        let mut failure_kinds: BTreeMap<u32, ErrorKind> = BTreeMap::new();
        let mut cancelled = false;

        for step in &plan.steps {
            if cancelled || self.ctx.cancel.is_cancelled() {
                cancelled = true;
                self.skip(step, ErrorKind::Cancelled, "plan cancelled", &mut results, &mut statuses);
                continue;
            }

            if let Some(&dep) = step
                .depends_on
                .iter()
                .find(|dep| statuses.get(dep) != Some(&StepStatus::Success))
            {
                let kind = failure_kinds
                    .get(&dep)
                    .copied()
                    .unwrap_or(ErrorKind::StrategyExhausted);
                self.skip(
                    step,
                    kind,
                    format!("dependency step {} did not succeed", dep),
                    &mut results,
                    &mut statuses,
                );
                continue;
            }

            if step.is_submit() {
                if !governor.check_quota(Utc::now().date_naive()).is_allow() {
                    self.skip(
                        step,
                        ErrorKind::QuotaExceeded,
                        "daily submission quota reached",
                        &mut results,
                        &mut statuses,
                    );
                    lifecycle.advance(PlanPhase::SubmitSkipped)?;
                    continue;
                }
                lifecycle.advance(PlanPhase::AwaitingConfirmation)?;
                match governor.check_confirmation(plan).await {
                    ConfirmationVerdict::Allowed => {}
                    ConfirmationVerdict::Denied => {
                        self.skip(
                            step,
                            ErrorKind::ConfirmationDenied,
                            "submission denied by user",
                            &mut results,
                            &mut statuses,
                        );
                        lifecycle.advance(PlanPhase::SubmitSkipped)?;
                        continue;
                    }
                    ConfirmationVerdict::TimedOut => {
                        self.skip(
                            step,
                            ErrorKind::ConfirmationTimeout,
                            "confirmation timed out",
                            &mut results,
                            &mut statuses,
                        );
                        lifecycle.advance(PlanPhase::SubmitSkipped)?;
                        continue;
                    }
                }
            }

            // Fail closed unless the key resolves to exactly one live target.
            let target = match resolve_target(step, plan, &fields) {
                Ok(target) => target,
                Err(reason) => {
                    record_result(
                        &self.ctx,
                        &mut results,
                        ExecutionResult::failure(
                            step.id,
                            1,
                            None,
                            ErrorKind::FieldUnresolved,
                            reason,
                            0,
                        ),
                    );
                    statuses.insert(step.id, StepStatus::Failed);
                    failure_kinds.insert(step.id, ErrorKind::FieldUnresolved);
                    if step.is_submit() {
                        lifecycle.advance(PlanPhase::SubmitSkipped)?;
                    }
                    continue;
                }
            };

            let url_before = self.ctx.session.url();
            match execute_step(step, &target, &self.ctx, &mut results).await {
                StepOutcome::Success { .. } => {
                    let mut step_failed = None;
                    if let Some(condition) = &step.wait_for {
                        match await_condition(
                            condition,
                            &*self.ctx.session,
                            &url_before,
                            &self.ctx.config,
                            &self.ctx.cancel,
                        )
                        .await
                        {
                            Ok(()) => {}
                            Err(ErrorKind::Cancelled) => {
                                // The action itself already happened and
                                // cannot be rolled back; stop afterwards.
                                cancelled = true;
                            }
                            Err(kind) => step_failed = Some(kind),
                        }
                    }
                    match step_failed {
                        None => {
                            statuses.insert(step.id, StepStatus::Success);
                            if step.is_submit() {
                                lifecycle.advance(PlanPhase::Submitted)?;
                                info!("plan {} submitted", plan.plan_id);
                            }
                            if step.is_advance() {
                                fields = detect(&self.ctx.session.snapshot());
                                debug!("re-detected {} fields after advance", fields.len());
                            }
                        }
                        Some(kind) => {
                            record_result(
                                &self.ctx,
                                &mut results,
                                ExecutionResult::failure(
                                    step.id,
                                    step.modes.len() as u32 + 1,
                                    None,
                                    kind,
                                    format!("wait condition failed: {}", kind),
                                    0,
                                ),
                            );
                            statuses.insert(step.id, StepStatus::Failed);
                            failure_kinds.insert(step.id, kind);
                            if step.is_submit() {
                                lifecycle.advance(PlanPhase::SubmitSkipped)?;
                            }
                        }
                    }
                }
                StepOutcome::Failed { kind } => {
                    statuses.insert(step.id, StepStatus::Failed);
                    failure_kinds.insert(step.id, kind);
                    if step.is_submit() {
                        lifecycle.advance(PlanPhase::SubmitSkipped)?;
                    }
                }
                StepOutcome::Cancelled => {
                    cancelled = true;
                    self.skip(step, ErrorKind::Cancelled, "plan cancelled", &mut results, &mut statuses);
                }
            }
        }

        // Plans that never reached a submit gate finish as submit-skipped.
        if lifecycle.phase() == PlanPhase::Executing {
            lifecycle.advance(PlanPhase::SubmitSkipped)?;
        }

        Ok(PlanReport {
            phase: lifecycle.phase(),
            results,
            statuses,
            denial: None,
        })
    }

    fn skip(
        &self,
        step: &ActionStep,
        kind: ErrorKind,
        reason: impl Into<String>,
        results: &mut Vec<ExecutionResult>,
        statuses: &mut BTreeMap<u32, StepStatus>,
    ) {
        let result = ExecutionResult::skipped(step.id, kind, reason);
        self.ctx.audit.append(AuditRecord::Step(result.clone()));
        results.push(result);
        statuses.insert(step.id, StepStatus::Skipped);
    }
}

fn validate(plan: &ActionPlan) -> Result<(), ExecError> {
    let mut seen: BTreeSet<u32> = BTreeSet::new();
    for step in &plan.steps {
        if !seen.insert(step.id) {
            return Err(ExecError::InvalidPlan(format!("duplicate step id {}", step.id)));
        }
        for dep in &step.depends_on {
            if *dep >= step.id {
                return Err(ExecError::InvalidPlan(format!(
                    "step {} depends on later step {}",
                    step.id, dep
                )));
            }
            if !seen.contains(dep) {
                return Err(ExecError::InvalidPlan(format!(
                    "step {} depends on unknown step {}",
                    step.id, dep
                )));
            }
        }
    }
    Ok(())
}

fn resolve_target(
    step: &ActionStep,
    plan: &ActionPlan,
    fields: &[FieldDescriptor],
) -> Result<ResolvedTarget, String> {
    if step.is_synthetic() {
        return plan
            .controls
            .get(&step.target_key)
            .map(|locator| ResolvedTarget {
                locator: locator.clone(),
                kind: None,
                label: None,
            })
            .ok_or_else(|| format!("no control locator for '{}'", step.target_key));
    }

    let matches: Vec<&FieldDescriptor> = fields
        .iter()
        .filter(|f| f.key == step.target_key && f.stage == step.stage)
        .collect();
    match matches.len() {
        1 => Ok(ResolvedTarget {
            locator: matches[0].locator.clone(),
            kind: Some(matches[0].kind),
            label: matches[0].label.clone(),
        }),
        0 => Err(format!("no live field matches key '{}'", step.target_key)),
        n => Err(format!("{} live fields match key '{}'", n, step.target_key)),
    }
}

#[cfg(test)]
#[path = "runner_tests.rs"]
mod tests;
