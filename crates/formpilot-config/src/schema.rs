//! Configuration schema.

use serde::{Deserialize, Serialize};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub safety: SafetyConfig,
    pub planner: PlannerConfig,
    pub executor: ExecutorConfig,
    pub companion: CompanionConfig,
}

/// Safety gate configuration.
///
/// Defaults are the fail-closed posture: nothing whitelisted, zero quota,
/// confirmation required.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SafetyConfig {
    /// Origin suffixes submissions are allowed on (e.g. "boards.example.com",
    /// "example.org"). Empty denies every domain.
    pub allowed_domains: Vec<String>,
    /// Maximum completed submissions per calendar day.
    pub daily_submission_limit: u32,
    /// Whether a submit step requires explicit human approval.
    pub require_confirmation: bool,
    /// How long to wait for the approval signal before skipping the submit.
    pub confirmation_timeout_secs: u64,
}

impl Default for SafetyConfig {
    fn default() -> Self {
        Self {
            allowed_domains: Vec::new(),
            daily_submission_limit: 0,
            require_confirmation: true,
            confirmation_timeout_secs: 120,
        }
    }
}

/// Plan builder configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Minimum label similarity for a fuzzy value-map match; fields scoring
    /// below are dropped from the plan.
    pub label_match_threshold: f64,
    /// Whether plans end with a terminal submit step.
    pub allow_submit_step: bool,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            label_match_threshold: 0.72,
            allow_submit_step: false,
        }
    }
}

/// Strategy executor configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutorConfig {
    /// Upper bound on any wait condition before the step fails.
    pub wait_timeout_ms: u64,
    /// Poll interval while observing a wait condition.
    pub wait_poll_interval_ms: u64,
    /// Minimum recognition confidence before an optical click proceeds
    /// without escalation.
    pub optical_confidence_threshold: f64,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            wait_timeout_ms: 10_000,
            wait_poll_interval_ms: 100,
            optical_confidence_threshold: 0.8,
        }
    }
}

/// Companion service client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompanionConfig {
    /// Loopback base URL of the local automation service.
    pub base_url: String,
    /// Auth token sent as X-Auth-Token; typically `${FORMPILOT_COMPANION_TOKEN}`.
    pub auth_token: String,
    pub request_timeout_ms: u64,
}

impl Default for CompanionConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8765".to_string(),
            auth_token: String::new(),
            request_timeout_ms: 5_000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safety_defaults_fail_closed() {
        let safety = SafetyConfig::default();
        assert!(safety.allowed_domains.is_empty());
        assert_eq!(safety.daily_submission_limit, 0);
        assert!(safety.require_confirmation);
    }

    #[test]
    fn test_planner_defaults() {
        let planner = PlannerConfig::default();
        assert!(!planner.allow_submit_step);
        assert!(planner.label_match_threshold > 0.5);
    }

    #[test]
    fn test_companion_defaults_loopback() {
        let companion = CompanionConfig::default();
        assert!(companion.base_url.contains("127.0.0.1"));
    }
}
