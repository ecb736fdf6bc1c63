//! Action plan construction.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use tracing::{debug, warn};
use uuid::Uuid;

use formpilot_detector::ControlMap;
use formpilot_protocols::{
    ActionPlan, ActionStep, FieldDescriptor, FieldKind, StrategyKind, WaitCondition, SUBMIT_KEY,
    advance_key,
};

use crate::similarity::similarity;

/// Values to insert, keyed by field key; opaque to the engine.
pub type ValueMap = BTreeMap<String, serde_json::Value>;

/// Inputs that make a build reproducible: identity and timestamp are
/// supplied by the caller so identical inputs yield byte-identical plans.
#[derive(Debug, Clone)]
pub struct PlanOptions {
    pub page_origin: String,
    pub plan_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub allow_submit_step: bool,
    pub label_match_threshold: f64,
}

/// Fill steps degrade through the full strategy chain in fixed order.
const FILL_MODES: [StrategyKind; 4] = [
    StrategyKind::StructuralMutation,
    StrategyKind::PrivilegedInput,
    StrategyKind::OpticalLocate,
    StrategyKind::ScriptedVerify,
];

/// File inputs reject programmatic assignment, so they start at the
/// privileged-input tier.
const FILE_MODES: [StrategyKind; 2] = [StrategyKind::PrivilegedInput, StrategyKind::OpticalLocate];

/// Submission is never triggered by direct DOM mutation; that would bypass
/// page-level validation.
const SUBMIT_MODES: [StrategyKind; 3] = [
    StrategyKind::PrivilegedInput,
    StrategyKind::OpticalLocate,
    StrategyKind::ScriptedVerify,
];

/// Build an action plan for the given fields and value map.
///
/// Steps are ordered by stage, then document order; one advance step is
/// inserted per stage boundary; the terminal submit step (when allowed)
/// depends on every other step of its stage.
pub fn build(
    fields: &[FieldDescriptor],
    controls: &ControlMap,
    values: &ValueMap,
    options: &PlanOptions,
) -> ActionPlan {
    let first_stage = fields.iter().map(|f| f.stage).min().unwrap_or(0);

    // Stage -> matched (field, value) pairs, document order preserved.
    let mut by_stage: BTreeMap<u32, Vec<(&FieldDescriptor, serde_json::Value)>> = BTreeMap::new();
    for field in fields {
        if !field.visible && field.stage == first_stage {
            debug!("skipping invisible field '{}' in current stage", field.key);
            continue;
        }
        match match_value(field, values, options.label_match_threshold) {
            Some(value) => by_stage.entry(field.stage).or_default().push((field, value)),
            None => debug!("no value for field '{}'; no step emitted", field.key),
        }
    }

    let mut steps: Vec<ActionStep> = Vec::new();
    let mut plan_controls: BTreeMap<String, _> = BTreeMap::new();
    let mut next_id: u32 = 1;

    let stages: Vec<u32> = by_stage.keys().copied().collect();
    for (position, &stage) in stages.iter().enumerate() {
        let mut stage_step_ids = BTreeSet::new();
        for (field, value) in &by_stage[&stage] {
            let modes = match field.kind {
                FieldKind::File => FILE_MODES.to_vec(),
                _ => FILL_MODES.to_vec(),
            };
            steps.push(ActionStep {
                id: next_id,
                target_key: field.key.clone(),
                modes,
                value: Some(value.clone()),
                depends_on: BTreeSet::new(),
                wait_for: None,
                stage,
            });
            stage_step_ids.insert(next_id);
            next_id += 1;
        }

        if let Some(&next_stage) = stages.get(position + 1) {
            match controls.advance.get(&next_stage) {
                Some(locator) => {
                    let key = advance_key(next_stage);
                    let first_next_field = by_stage[&next_stage]
                        .first()
                        .map(|(field, _)| field.locator.clone());
                    steps.push(ActionStep {
                        id: next_id,
                        target_key: key.clone(),
                        modes: FILL_MODES.to_vec(),
                        value: None,
                        depends_on: stage_step_ids.clone(),
                        wait_for: first_next_field
                            .map(|locator| WaitCondition::ElementAppears { locator }),
                        stage,
                    });
                    plan_controls.insert(key, locator.clone());
                    next_id += 1;
                }
                None => {
                    warn!("no advance control found for stage {}; steps there may stall", next_stage)
                }
            }
        }
    }

    if options.allow_submit_step && !steps.is_empty() {
        match &controls.submit {
            Some(locator) => {
                let final_stage = steps.iter().map(|s| s.stage).max().unwrap_or(0);
                let depends_on: BTreeSet<u32> = steps
                    .iter()
                    .filter(|s| s.stage == final_stage)
                    .map(|s| s.id)
                    .collect();
                steps.push(ActionStep {
                    id: next_id,
                    target_key: SUBMIT_KEY.to_string(),
                    modes: SUBMIT_MODES.to_vec(),
                    value: None,
                    depends_on,
                    wait_for: Some(WaitCondition::UrlChange),
                    stage: final_stage,
                });
                plan_controls.insert(SUBMIT_KEY.to_string(), locator.clone());
            }
            None => warn!("submit step requested but no submit control found"),
        }
    }

    let stage_count = steps
        .iter()
        .map(|s| s.stage)
        .collect::<BTreeSet<_>>()
        .len() as u32;

    ActionPlan {
        plan_id: options.plan_id,
        page_origin: options.page_origin.clone(),
        generated_at: options.generated_at,
        stage_count,
        controls: plan_controls,
        steps,
    }
}

/// Match a field against the value map: exact key match first, then the
/// best fuzzy label match above the threshold. Below-threshold candidates
/// are dropped (no step), which is logged rather than surfaced.
fn match_value(
    field: &FieldDescriptor,
    values: &ValueMap,
    threshold: f64,
) -> Option<serde_json::Value> {
    if let Some(value) = values.get(&field.key) {
        return Some(value.clone());
    }

    let label = field.label.as_deref()?;
    let (best_key, best_score) = values
        .keys()
        .map(|key| (key, similarity(label, key)))
        .max_by(|a, b| a.1.total_cmp(&b.1))?;

    if best_score >= threshold {
        debug!(
            "fuzzy-matched field '{}' (label '{}') to value key '{}' at {:.2}",
            field.key, label, best_key, best_score
        );
        Some(values[best_key].clone())
    } else {
        debug!(
            "dropping field '{}': best label match '{}' scored {:.2} < {:.2}",
            field.key, best_key, best_score, threshold
        );
        None
    }
}

#[cfg(test)]
#[path = "builder_tests.rs"]
mod tests;
