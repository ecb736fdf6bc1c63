//! The safety governor and its three gates.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use tracing::{info, warn};

use formpilot_config::SafetyConfig;
use formpilot_protocols::{
    ActionPlan, AuditRecord, AuditSink, ConfirmationOutcome, ConfirmationSource, GateDecision,
    GateKind, QuotaDecision, QuotaStore,
};

/// Outcome of the confirmation gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmationVerdict {
    Allowed,
    Denied,
    TimedOut,
}

/// Confirmation source with a fixed answer (CLI flags, tests).
pub struct StaticConfirmation {
    approve: bool,
}

impl StaticConfirmation {
    pub fn approve() -> Self {
        Self { approve: true }
    }

    pub fn deny() -> Self {
        Self { approve: false }
    }
}

#[async_trait]
impl ConfirmationSource for StaticConfirmation {
    async fn confirm(&self, _prompt: &str) -> ConfirmationOutcome {
        if self.approve {
            ConfirmationOutcome::Approved
        } else {
            ConfirmationOutcome::Denied
        }
    }
}

/// Enforces the whitelist, quota, and confirmation gates independent of
/// automation mechanics. Every decision is appended to the audit sink.
pub struct SafetyGovernor {
    config: SafetyConfig,
    quota: Arc<dyn QuotaStore>,
    confirmation: Arc<dyn ConfirmationSource>,
    audit: Arc<dyn AuditSink>,
}

impl SafetyGovernor {
    pub fn new(
        config: SafetyConfig,
        quota: Arc<dyn QuotaStore>,
        confirmation: Arc<dyn ConfirmationSource>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            config,
            quota,
            confirmation,
            audit,
        }
    }

    pub fn audit(&self) -> Arc<dyn AuditSink> {
        self.audit.clone()
    }

    /// Gate 1: exact or suffix match of the page host against the
    /// whitelist. Deny aborts the entire plan before any step executes.
    pub fn check_domain(&self, page_origin: &str) -> GateDecision {
        let host = host_of(page_origin);
        let allowed = self.config.allowed_domains.iter().any(|entry| {
            let entry = entry.to_lowercase();
            host == entry || host.ends_with(&format!(".{}", entry))
        });
        let decision = if allowed { GateDecision::Allow } else { GateDecision::Deny };
        let reason = if allowed {
            format!("host '{}' matches whitelist", host)
        } else {
            format!("host '{}' not in whitelist", host)
        };
        if !allowed {
            warn!("domain gate denied: {}", reason);
        }
        self.audit
            .append(AuditRecord::gate(GateKind::Domain, decision, reason));
        decision
    }

    /// Gate 2: read-check and, only on allow, atomically increment the
    /// daily counter. Deny aborts only the submit step; fills still run so
    /// the user can review a filled-but-unsubmitted form.
    pub fn check_quota(&self, date: NaiveDate) -> GateDecision {
        let max = self.config.daily_submission_limit;
        let (decision, reason) = match self.quota.increment_if_below(date, max) {
            Ok(QuotaDecision::Allow { new_count }) => (
                GateDecision::Allow,
                format!("submission {}/{} for {}", new_count, max, date),
            ),
            Ok(QuotaDecision::Deny { count }) => (
                GateDecision::Deny,
                format!("daily quota reached ({}/{}) for {}", count, max, date),
            ),
            // Fail closed on storage trouble.
            Err(e) => (GateDecision::Deny, format!("quota store error: {}", e)),
        };
        if decision == GateDecision::Deny {
            warn!("quota gate denied: {}", reason);
        }
        self.audit
            .append(AuditRecord::gate(GateKind::Quota, decision, reason));
        decision
    }

    /// Gate 3: block on the external approval signal, bounded by the
    /// configured timeout. A deny or timeout skips the submit step.
    pub async fn check_confirmation(&self, plan: &ActionPlan) -> ConfirmationVerdict {
        if !self.config.require_confirmation {
            self.audit.append(AuditRecord::gate(
                GateKind::Confirmation,
                GateDecision::Allow,
                "confirmation not required by configuration",
            ));
            return ConfirmationVerdict::Allowed;
        }

        let prompt = format!(
            "Submit application on {} ({} steps)?",
            plan.page_origin,
            plan.steps.len()
        );
        let timeout = Duration::from_secs(self.config.confirmation_timeout_secs);
        let (verdict, decision, reason) =
            match tokio::time::timeout(timeout, self.confirmation.confirm(&prompt)).await {
                Ok(ConfirmationOutcome::Approved) => (
                    ConfirmationVerdict::Allowed,
                    GateDecision::Allow,
                    "submission approved".to_string(),
                ),
                Ok(ConfirmationOutcome::Denied) => (
                    ConfirmationVerdict::Denied,
                    GateDecision::Deny,
                    "submission denied by user".to_string(),
                ),
                Err(_) => (
                    ConfirmationVerdict::TimedOut,
                    GateDecision::Deny,
                    format!("no confirmation within {}s", self.config.confirmation_timeout_secs),
                ),
            };
        info!("confirmation gate: {}", reason);
        self.audit
            .append(AuditRecord::gate(GateKind::Confirmation, decision, reason));
        verdict
    }
}

/// Lowercased host part of an origin or URL string.
fn host_of(origin: &str) -> String {
    let rest = match origin.find("://") {
        Some(i) => &origin[i + 3..],
        None => origin,
    };
    let host = rest.split(['/', '?']).next().unwrap_or(rest);
    let host = host.split('@').next_back().unwrap_or(host);
    host.split(':').next().unwrap_or(host).to_lowercase()
}

#[cfg(test)]
#[path = "governor_tests.rs"]
mod tests;
