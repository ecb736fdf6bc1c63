//! Strategy handlers and the per-step state machine.
//!
//! One handler per strategy tag, selected by the step's ordered mode list:
//! `Pending -> Attempting(i) -> Success | Attempting(i+1) | Failed`. A step
//! fails only once every candidate mode has been attempted.

use std::time::Instant;

use tracing::{debug, info};

use formpilot_page::{CoordinateTranslator, PageError, PageSession};
use formpilot_protocols::{
    ActionStep, AuditRecord, ConfirmationOutcome, ErrorKind, ExecutionResult, FieldKind, Locator,
    StrategyKind,
};

use crate::context::ExecutionContext;

/// The live element (or synthetic control) a step targets, resolved at
/// execution time.
#[derive(Debug, Clone)]
pub(crate) struct ResolvedTarget {
    pub locator: Locator,
    pub kind: Option<FieldKind>,
    pub label: Option<String>,
}

/// Why one attempt failed; `kind` stays `None` for failures outside the
/// taxonomy (e.g. a rejected mutation) where the reason text carries it.
pub(crate) struct AttemptFailure {
    pub kind: Option<ErrorKind>,
    pub reason: String,
    pub screenshot_ref: Option<String>,
}

impl AttemptFailure {
    fn new(kind: impl Into<Option<ErrorKind>>, reason: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            reason: reason.into(),
            screenshot_ref: None,
        }
    }
}

pub(crate) struct AttemptSuccess {
    pub screenshot_ref: Option<String>,
}

/// Final disposition of one step.
pub(crate) enum StepOutcome {
    Success { strategy: StrategyKind },
    Failed { kind: ErrorKind },
    Cancelled,
}

/// Append a result to the caller's list and the audit trail in one place so
/// every attempt leaves exactly one record.
pub(crate) fn record_result(
    ctx: &ExecutionContext,
    results: &mut Vec<ExecutionResult>,
    result: ExecutionResult,
) {
    ctx.audit.append(AuditRecord::Step(result.clone()));
    results.push(result);
}

/// Drive one step through its candidate strategies in order.
pub(crate) async fn execute_step(
    step: &ActionStep,
    target: &ResolvedTarget,
    ctx: &ExecutionContext,
    results: &mut Vec<ExecutionResult>,
) -> StepOutcome {
    if step.modes.is_empty() {
        record_result(
            ctx,
            results,
            ExecutionResult::failure(
                step.id,
                1,
                None,
                ErrorKind::StrategyExhausted,
                "no candidate strategies",
                0,
            ),
        );
        return StepOutcome::Failed { kind: ErrorKind::StrategyExhausted };
    }

    for (index, &strategy) in step.modes.iter().enumerate() {
        if ctx.cancel.is_cancelled() {
            return StepOutcome::Cancelled;
        }
        let attempt_no = index as u32 + 1;
        let started = Instant::now();
        match attempt(strategy, step, target, ctx).await {
            Ok(ok) => {
                let elapsed = started.elapsed().as_millis() as u64;
                let mut result = ExecutionResult::success(step.id, attempt_no, strategy, elapsed);
                if let Some(reference) = ok.screenshot_ref {
                    result = result.with_screenshot(reference);
                }
                info!("step {} succeeded via {} ({} ms)", step.id, strategy, elapsed);
                record_result(ctx, results, result);
                return StepOutcome::Success { strategy };
            }
            Err(failure) => {
                let elapsed = started.elapsed().as_millis() as u64;
                debug!(
                    "step {} attempt {} ({}) failed: {}",
                    step.id, attempt_no, strategy, failure.reason
                );
                let mut result = ExecutionResult::failure(
                    step.id,
                    attempt_no,
                    Some(strategy),
                    failure.kind,
                    failure.reason,
                    elapsed,
                );
                if let Some(reference) = failure.screenshot_ref {
                    result = result.with_screenshot(reference);
                }
                record_result(ctx, results, result);
            }
        }
    }

    StepOutcome::Failed { kind: ErrorKind::StrategyExhausted }
}

async fn attempt(
    strategy: StrategyKind,
    step: &ActionStep,
    target: &ResolvedTarget,
    ctx: &ExecutionContext,
) -> Result<AttemptSuccess, AttemptFailure> {
    match strategy {
        StrategyKind::StructuralMutation => structural_mutation(step, target, &*ctx.session),
        StrategyKind::PrivilegedInput => privileged_input(step, target, ctx).await,
        StrategyKind::OpticalLocate => optical_locate(step, target, ctx).await,
        StrategyKind::ScriptedVerify => scripted_verify(step, target, ctx),
    }
}

/// Set the element value directly; the session dispatches
/// input/change/blur so framework listeners observe the edit.
fn structural_mutation(
    step: &ActionStep,
    target: &ResolvedTarget,
    session: &dyn PageSession,
) -> Result<AttemptSuccess, AttemptFailure> {
    let path = session
        .resolve(&target.locator)
        .map_err(|e| AttemptFailure::new(page_error_kind(&e), e.to_string()))?;

    if step.is_synthetic() {
        session
            .click(&path)
            .map_err(|e| AttemptFailure::new(page_error_kind(&e), e.to_string()))?;
        return Ok(AttemptSuccess { screenshot_ref: None });
    }

    match target.kind {
        Some(FieldKind::Checkbox) | Some(FieldKind::Radio) => {
            let desired = truthy(step.value.as_ref());
            let checked = session
                .read_value(&path)
                .map_err(|e| AttemptFailure::new(page_error_kind(&e), e.to_string()))?
                == "checked";
            if checked != desired {
                session
                    .click(&path)
                    .map_err(|e| AttemptFailure::new(page_error_kind(&e), e.to_string()))?;
            }
        }
        _ => {
            session
                .set_value(&path, &value_text(step))
                .map_err(|e| AttemptFailure::new(page_error_kind(&e), e.to_string()))?;
        }
    }
    Ok(AttemptSuccess { screenshot_ref: None })
}

/// Delegate to the companion service: translate the element to a screen
/// point, then drive the virtual pointer/keyboard. The companion response
/// is the confirmation channel.
async fn privileged_input(
    step: &ActionStep,
    target: &ResolvedTarget,
    ctx: &ExecutionContext,
) -> Result<AttemptSuccess, AttemptFailure> {
    let companion = ctx.companion.as_ref().ok_or_else(|| {
        AttemptFailure::new(ErrorKind::CompanionUnavailable, "no companion service configured")
    })?;
    let _lease = ctx.companion_lease.lock().await;

    let translator = CoordinateTranslator::new(&*ctx.session);
    let point = translator
        .to_screen_point(&target.locator)
        .map_err(|e| AttemptFailure::new(page_error_kind(&e), e.to_string()))?;

    if step.is_synthetic() || matches!(target.kind, Some(FieldKind::Checkbox) | Some(FieldKind::Radio)) {
        let response = companion
            .click(point)
            .await
            .map_err(|e| AttemptFailure::new(companion_error_kind(&e), e.to_string()))?;
        return if response.success {
            Ok(AttemptSuccess { screenshot_ref: None })
        } else {
            Err(AttemptFailure::new(None, response.message))
        };
    }

    let focused = companion
        .focus(point)
        .await
        .map_err(|e| AttemptFailure::new(companion_error_kind(&e), e.to_string()))?;
    if !focused.success {
        return Err(AttemptFailure::new(None, focused.message));
    }

    let response = if target.kind == Some(FieldKind::File) {
        companion
            .upload(&value_text(step))
            .await
            .map_err(|e| AttemptFailure::new(companion_error_kind(&e), e.to_string()))?
    } else {
        companion
            .type_text(&value_text(step))
            .await
            .map_err(|e| AttemptFailure::new(companion_error_kind(&e), e.to_string()))?
    };
    if response.success {
        Ok(AttemptSuccess { screenshot_ref: None })
    } else {
        Err(AttemptFailure::new(None, response.message))
    }
}

/// Locate the target label on screen via text recognition. Low-confidence
/// recognitions escalate to the human confirmation prompt before any click.
async fn optical_locate(
    step: &ActionStep,
    target: &ResolvedTarget,
    ctx: &ExecutionContext,
) -> Result<AttemptSuccess, AttemptFailure> {
    let companion = ctx.companion.as_ref().ok_or_else(|| {
        AttemptFailure::new(ErrorKind::CompanionUnavailable, "no companion service configured")
    })?;
    let _lease = ctx.companion_lease.lock().await;

    let screenshot = companion
        .screenshot()
        .await
        .map_err(|e| AttemptFailure::new(companion_error_kind(&e), e.to_string()))?;
    let screenshot_ref = Some(screenshot.reference.clone());
    let fail = |kind: Option<ErrorKind>, reason: String| AttemptFailure {
        kind,
        reason,
        screenshot_ref: screenshot_ref.clone(),
    };

    let label = target.label.clone().unwrap_or_else(|| step.target_key.clone());
    let threshold = ctx.config.optical_confidence_threshold;
    let response = companion
        .optical_click(&label, threshold)
        .await
        .map_err(|e| fail(companion_error_kind(&e), e.to_string()))?;

    let confidence = response.confidence.unwrap_or(0.0);
    if !(response.success && confidence >= threshold) {
        // Recognized below threshold: ask the human before clicking.
        let point = match response.coordinates {
            Some(point) => point,
            None => {
                return Err(fail(
                    Some(ErrorKind::LowOpticalConfidence),
                    format!("'{}' not recognized on screen", label),
                ));
            }
        };
        let prompt = format!(
            "Optical match for '{}' at {:.2} confidence (threshold {:.2}); click anyway?",
            label, confidence, threshold
        );
        if ctx.confirmation.confirm(&prompt).await != ConfirmationOutcome::Approved {
            return Err(fail(
                Some(ErrorKind::LowOpticalConfidence),
                format!("low-confidence match ({:.2}) declined", confidence),
            ));
        }
        let clicked = companion
            .click(point)
            .await
            .map_err(|e| fail(companion_error_kind(&e), e.to_string()))?;
        if !clicked.success {
            return Err(fail(None, clicked.message));
        }
    }

    if !step.is_synthetic()
        && !matches!(target.kind, Some(FieldKind::Checkbox) | Some(FieldKind::Radio) | Some(FieldKind::File))
    {
        let typed = companion
            .type_text(&value_text(step))
            .await
            .map_err(|e| fail(companion_error_kind(&e), e.to_string()))?;
        if !typed.success {
            return Err(fail(None, typed.message));
        }
    }

    Ok(AttemptSuccess { screenshot_ref })
}

/// Re-attempt the structural mutation under the deterministic harness and
/// verify the value read-back. Offline validation only.
fn scripted_verify(
    step: &ActionStep,
    target: &ResolvedTarget,
    ctx: &ExecutionContext,
) -> Result<AttemptSuccess, AttemptFailure> {
    let harness = ctx
        .harness
        .as_ref()
        .ok_or_else(|| AttemptFailure::new(None, "no harness context available"))?;

    structural_mutation(step, target, &**harness)?;

    if !step.is_synthetic()
        && !matches!(target.kind, Some(FieldKind::Checkbox) | Some(FieldKind::Radio))
    {
        let path = harness
            .resolve(&target.locator)
            .map_err(|e| AttemptFailure::new(page_error_kind(&e), e.to_string()))?;
        let read_back = harness
            .read_value(&path)
            .map_err(|e| AttemptFailure::new(page_error_kind(&e), e.to_string()))?;
        let expected = value_text(step);
        if read_back != expected {
            return Err(AttemptFailure::new(
                None,
                format!("verify mismatch: wrote '{}', read '{}'", expected, read_back),
            ));
        }
    }
    Ok(AttemptSuccess { screenshot_ref: None })
}

fn page_error_kind(error: &PageError) -> Option<ErrorKind> {
    match error {
        PageError::NotFound(_) | PageError::Ambiguous { .. } => Some(ErrorKind::FieldUnresolved),
        PageError::OutOfViewport(_) => Some(ErrorKind::OutOfViewport),
        _ => None,
    }
}

fn companion_error_kind(error: &formpilot_protocols::CompanionError) -> Option<ErrorKind> {
    use formpilot_protocols::CompanionError::*;
    match error {
        Unauthorized | Transport(_) | NotLoopback(_) => Some(ErrorKind::CompanionUnavailable),
        Service(_) | Disabled(_) => None,
    }
}

fn value_text(step: &ActionStep) -> String {
    match &step.value {
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(serde_json::Value::Bool(b)) => b.to_string(),
        Some(serde_json::Value::Number(n)) => n.to_string(),
        Some(other) => other.to_string(),
        None => String::new(),
    }
}

fn truthy(value: Option<&serde_json::Value>) -> bool {
    match value {
        Some(serde_json::Value::Bool(b)) => *b,
        Some(serde_json::Value::String(s)) => {
            matches!(s.to_lowercase().as_str(), "true" | "yes" | "on" | "1" | "checked")
        }
        Some(serde_json::Value::Number(n)) => n.as_f64().unwrap_or(0.0) != 0.0,
        _ => false,
    }
}

#[cfg(test)]
#[path = "strategies_tests.rs"]
mod tests;
