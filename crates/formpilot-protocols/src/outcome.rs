//! Execution outcomes, failure taxonomy, and audit records.

use std::fmt;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::plan::StrategyKind;

/// Final status of one step (or of one attempt at it).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Success,
    Failed,
    Skipped,
}

/// Failure taxonomy surfaced on results and gate decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorKind {
    /// No fields found; the plan is empty. Non-fatal.
    DetectionEmpty,
    /// A locator no longer matches exactly one live element.
    FieldUnresolved,
    /// Every candidate strategy failed for the step.
    StrategyExhausted,
    WaitTimeout,
    OutOfViewport,
    LowOpticalConfidence,
    /// Fatal to the submit step only.
    QuotaExceeded,
    /// Fatal to the entire plan, pre-flight.
    DomainNotWhitelisted,
    ConfirmationDenied,
    ConfirmationTimeout,
    Cancelled,
    /// The external automation service is not reachable or not configured.
    CompanionUnavailable,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::DetectionEmpty => "detection-empty",
            ErrorKind::FieldUnresolved => "field-unresolved",
            ErrorKind::StrategyExhausted => "strategy-exhausted",
            ErrorKind::WaitTimeout => "wait-timeout",
            ErrorKind::OutOfViewport => "out-of-viewport",
            ErrorKind::LowOpticalConfidence => "low-optical-confidence",
            ErrorKind::QuotaExceeded => "quota-exceeded",
            ErrorKind::DomainNotWhitelisted => "domain-not-whitelisted",
            ErrorKind::ConfirmationDenied => "confirmation-denied",
            ErrorKind::ConfirmationTimeout => "confirmation-timeout",
            ErrorKind::Cancelled => "cancelled",
            ErrorKind::CompanionUnavailable => "companion-unavailable",
        };
        f.write_str(s)
    }
}

/// Per-attempt outcome record; appended, never overwritten.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub step_id: u32,
    /// 1-based attempt index within the step.
    pub attempt: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy_used: Option<StrategyKind>,
    pub status: StepStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
    /// Human-readable reason accompanying a failure or skip.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub elapsed_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screenshot_ref: Option<String>,
    pub timestamp_ms: i64,
}

impl ExecutionResult {
    pub fn success(step_id: u32, attempt: u32, strategy: StrategyKind, elapsed_ms: u64) -> Self {
        Self {
            step_id,
            attempt,
            strategy_used: Some(strategy),
            status: StepStatus::Success,
            error_kind: None,
            reason: None,
            elapsed_ms,
            screenshot_ref: None,
            timestamp_ms: Utc::now().timestamp_millis(),
        }
    }

    pub fn failure(
        step_id: u32,
        attempt: u32,
        strategy: Option<StrategyKind>,
        kind: impl Into<Option<ErrorKind>>,
        reason: impl Into<String>,
        elapsed_ms: u64,
    ) -> Self {
        Self {
            step_id,
            attempt,
            strategy_used: strategy,
            status: StepStatus::Failed,
            error_kind: kind.into(),
            reason: Some(reason.into()),
            elapsed_ms,
            screenshot_ref: None,
            timestamp_ms: Utc::now().timestamp_millis(),
        }
    }

    pub fn skipped(step_id: u32, kind: ErrorKind, reason: impl Into<String>) -> Self {
        Self {
            step_id,
            attempt: 0,
            strategy_used: None,
            status: StepStatus::Skipped,
            error_kind: Some(kind),
            reason: Some(reason.into()),
            elapsed_ms: 0,
            screenshot_ref: None,
            timestamp_ms: Utc::now().timestamp_millis(),
        }
    }

    pub fn with_screenshot(mut self, reference: impl Into<String>) -> Self {
        self.screenshot_ref = Some(reference.into());
        self
    }
}

/// Which safety gate produced a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GateKind {
    Domain,
    Quota,
    Confirmation,
}

/// Outcome of a safety gate check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GateDecision {
    Allow,
    Deny,
}

impl GateDecision {
    pub fn is_allow(&self) -> bool {
        matches!(self, GateDecision::Allow)
    }
}

/// Lifecycle phase of one plan execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PlanPhase {
    Created,
    DomainChecked,
    Executing,
    AwaitingConfirmation,
    Submitted,
    SubmitSkipped,
}

impl fmt::Display for PlanPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PlanPhase::Created => "created",
            PlanPhase::DomainChecked => "domain-checked",
            PlanPhase::Executing => "executing",
            PlanPhase::AwaitingConfirmation => "awaiting-confirmation",
            PlanPhase::Submitted => "submitted",
            PlanPhase::SubmitSkipped => "submit-skipped",
        };
        f.write_str(s)
    }
}

/// Append-only audit trail entry; the engine never reads these back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "record", rename_all = "lowercase")]
pub enum AuditRecord {
    Step(ExecutionResult),
    Gate {
        gate: GateKind,
        decision: GateDecision,
        reason: String,
        timestamp_ms: i64,
    },
    Transition {
        from: PlanPhase,
        to: PlanPhase,
        timestamp_ms: i64,
    },
}

impl AuditRecord {
    pub fn gate(gate: GateKind, decision: GateDecision, reason: impl Into<String>) -> Self {
        AuditRecord::Gate {
            gate,
            decision,
            reason: reason.into(),
            timestamp_ms: Utc::now().timestamp_millis(),
        }
    }

    pub fn transition(from: PlanPhase, to: PlanPhase) -> Self {
        AuditRecord::Transition {
            from,
            to,
            timestamp_ms: Utc::now().timestamp_millis(),
        }
    }
}

#[cfg(test)]
#[path = "outcome_tests.rs"]
mod tests;
