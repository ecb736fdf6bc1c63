//! Action plan schema: steps, strategies, wait conditions.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::field::Locator;

/// Synthetic target key of the terminal submit step.
pub const SUBMIT_KEY: &str = "submit";

/// Synthetic target key of the step that advances the wizard to `stage`.
pub fn advance_key(stage: u32) -> String {
    format!("advance:{}", stage)
}

/// One method of performing a fill/click, attempted in fixed preference order.
///
/// Closed variant set; the executor has exactly one handler per tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyKind {
    /// Set the element value directly and dispatch input/change/blur.
    StructuralMutation,
    /// Delegate to the external automation service (virtual pointer/keyboard).
    PrivilegedInput,
    /// Locate the target via screen-image text recognition, then click.
    OpticalLocate,
    /// Re-attempt the structural mutation under the offline test harness.
    ScriptedVerify,
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StrategyKind::StructuralMutation => "structural-mutation",
            StrategyKind::PrivilegedInput => "privileged-input",
            StrategyKind::OpticalLocate => "optical-locate",
            StrategyKind::ScriptedVerify => "scripted-verify",
        };
        f.write_str(s)
    }
}

/// Condition suspending the plan after a step completes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum WaitCondition {
    /// The page URL differs from the one captured when the step started.
    UrlChange,
    /// The locator resolves to a visible element.
    ElementAppears { locator: Locator },
    /// The locator no longer resolves to a visible element.
    ElementDisappears { locator: Locator },
    /// A fixed pause.
    Timeout { ms: u64 },
}

/// One immutable fill/click/wait step of an action plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionStep {
    pub id: u32,
    /// A detected field key, or a synthetic key ("submit", "advance:N").
    pub target_key: String,
    /// Ordered candidate strategies; the executor degrades left to right.
    pub modes: Vec<StrategyKind>,
    /// The datum to apply; opaque to the engine.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
    /// Step ids that must complete before this step may start.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub depends_on: BTreeSet<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wait_for: Option<WaitCondition>,
    /// Wizard-page index this step belongs to.
    #[serde(default)]
    pub stage: u32,
}

impl ActionStep {
    pub fn is_submit(&self) -> bool {
        self.target_key == SUBMIT_KEY
    }

    pub fn is_advance(&self) -> bool {
        self.target_key.starts_with("advance:")
    }

    /// Whether this step targets a synthetic control rather than a field.
    pub fn is_synthetic(&self) -> bool {
        self.is_submit() || self.is_advance()
    }
}

/// Ordered, dependency-annotated sequence of steps for one page/session.
///
/// Built once; superseded (never mutated) if the page changes materially.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionPlan {
    pub plan_id: Uuid,
    /// Origin of the page the plan was built against.
    pub page_origin: String,
    pub generated_at: DateTime<Utc>,
    pub stage_count: u32,
    /// Click targets for synthetic step keys, found at build time.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub controls: BTreeMap<String, Locator>,
    pub steps: Vec<ActionStep>,
}

impl ActionPlan {
    pub fn step(&self, id: u32) -> Option<&ActionStep> {
        self.steps.iter().find(|s| s.id == id)
    }

    pub fn submit_step(&self) -> Option<&ActionStep> {
        self.steps.iter().find(|s| s.is_submit())
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn final_stage(&self) -> u32 {
        self.steps.iter().map(|s| s.stage).max().unwrap_or(0)
    }
}

#[cfg(test)]
#[path = "plan_tests.rs"]
mod tests;
