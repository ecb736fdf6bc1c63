//! Trait seams between the engine and its injected collaborators.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geometry::ScreenPoint;
use crate::outcome::AuditRecord;

/// Errors surfaced by the external automation service boundary.
#[derive(Debug, Error)]
pub enum CompanionError {
    #[error("Companion rejected the auth token")]
    Unauthorized,

    #[error("Companion transport error: {0}")]
    Transport(String),

    #[error("Companion reported failure: {0}")]
    Service(String),

    #[error("Companion capability disabled: {0}")]
    Disabled(String),

    #[error("Companion base URL is not loopback: {0}")]
    NotLoopback(String),
}

/// Response envelope shared by companion actions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanionResponse {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    /// Recognition confidence for optical operations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    /// Where the service acted (or would act, for low-confidence matches).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<ScreenPoint>,
}

/// Handle to a captured screenshot; the image itself stays with the service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreenshotRef {
    pub reference: String,
}

/// Liveness report from the companion health endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub service: String,
}

/// The external, lower-trust-boundary automation service.
///
/// Loopback-only and token-authenticated; pointer/keyboard and screen capture
/// are an exclusive resource, so callers hold a lease for one attempt at a
/// time.
#[async_trait]
pub trait CompanionService: Send + Sync {
    /// Click-focus the element at an already-translated screen point.
    async fn focus(&self, point: ScreenPoint) -> Result<CompanionResponse, CompanionError>;

    /// Type text at the current cursor position.
    async fn type_text(&self, text: &str) -> Result<CompanionResponse, CompanionError>;

    /// Click at an absolute screen point.
    async fn click(&self, point: ScreenPoint) -> Result<CompanionResponse, CompanionError>;

    /// Locate `label` on screen via text recognition and click it if the
    /// recognition confidence reaches `confidence_threshold`.
    async fn optical_click(
        &self,
        label: &str,
        confidence_threshold: f64,
    ) -> Result<CompanionResponse, CompanionError>;

    /// Capture the screen; returns a reference for the audit trail.
    async fn screenshot(&self) -> Result<ScreenshotRef, CompanionError>;

    /// Scroll the focused window by `delta` wheel clicks (negative = down).
    async fn scroll(&self, delta: i32) -> Result<CompanionResponse, CompanionError>;

    /// Drive the native file dialog to attach `path`.
    async fn upload(&self, path: &str) -> Result<CompanionResponse, CompanionError>;

    /// Liveness only; carries no capability information.
    async fn health(&self) -> Result<HealthStatus, CompanionError>;
}

/// Quota store errors.
#[derive(Debug, Error)]
pub enum QuotaError {
    #[error("Quota storage error: {0}")]
    Storage(String),
}

/// Outcome of a guarded quota increment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuotaDecision {
    Allow { new_count: u32 },
    Deny { count: u32 },
}

/// Per-day submission counter, single-writer across concurrent plans.
pub trait QuotaStore: Send + Sync {
    fn count(&self, date: NaiveDate) -> Result<u32, QuotaError>;

    /// Atomically increment the counter for `date` unless it has reached
    /// `max`; the read and the write happen under one lock.
    fn increment_if_below(&self, date: NaiveDate, max: u32) -> Result<QuotaDecision, QuotaError>;
}

/// Verdict from the external confirmation signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmationOutcome {
    Approved,
    Denied,
}

/// External human-approval signal consulted before risky actions.
#[async_trait]
pub trait ConfirmationSource: Send + Sync {
    async fn confirm(&self, prompt: &str) -> ConfirmationOutcome;
}

/// Append-only audit trail consumed by external persistence.
pub trait AuditSink: Send + Sync {
    fn append(&self, record: AuditRecord);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_companion_error_display() {
        let err = CompanionError::Service("click failed".to_string());
        assert!(err.to_string().contains("click failed"));
        assert!(CompanionError::Unauthorized.to_string().contains("auth token"));
    }

    #[test]
    fn test_companion_response_round_trip() {
        let resp = CompanionResponse {
            success: true,
            message: "Clicked at (10, 20)".to_string(),
            duration_ms: Some(42),
            confidence: Some(0.93),
            coordinates: Some(ScreenPoint::new(10, 20)),
        };
        let json = serde_json::to_string(&resp).unwrap();
        let back: CompanionResponse = serde_json::from_str(&json).unwrap();
        assert!(back.success);
        assert_eq!(back.coordinates, Some(ScreenPoint::new(10, 20)));
    }

    #[test]
    fn test_companion_response_optional_fields_absent() {
        let resp: CompanionResponse =
            serde_json::from_str(r#"{"success": false, "message": "no"}"#).unwrap();
        assert!(resp.duration_ms.is_none());
        assert!(resp.confidence.is_none());
        assert!(resp.coordinates.is_none());
    }

    #[test]
    fn test_quota_decision() {
        assert_ne!(QuotaDecision::Allow { new_count: 1 }, QuotaDecision::Deny { count: 1 });
    }
}
