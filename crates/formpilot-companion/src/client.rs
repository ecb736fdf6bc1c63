//! Companion service HTTP client.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tracing::debug;
use url::Url;

use formpilot_protocols::{
    CompanionError, CompanionResponse, CompanionService, HealthStatus, ScreenPoint, ScreenshotRef,
};

const AUTH_HEADER: &str = "X-Auth-Token";

#[derive(Serialize)]
struct PointBody {
    x: i32,
    y: i32,
}

#[derive(Serialize)]
struct TextBody<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct OpticalBody<'a> {
    label: &'a str,
    confidence_threshold: f64,
}

#[derive(Serialize)]
struct ScrollBody {
    delta: i32,
}

#[derive(Serialize)]
struct UploadBody<'a> {
    file_path: &'a str,
}

/// Client for the loopback companion service.
pub struct CompanionClient {
    http: reqwest::Client,
    base: Url,
    token: String,
}

impl CompanionClient {
    /// Create a client. The base URL must point at a loopback host; the
    /// companion controls the real pointer and keyboard, so it is never
    /// reachable across the network.
    pub fn new(
        base_url: &str,
        token: impl Into<String>,
        request_timeout: Duration,
    ) -> Result<Self, CompanionError> {
        let base = Url::parse(base_url)
            .map_err(|e| CompanionError::Transport(format!("invalid base URL: {}", e)))?;
        match base.host_str() {
            Some("127.0.0.1") | Some("localhost") | Some("[::1]") | Some("::1") => {}
            other => {
                return Err(CompanionError::NotLoopback(
                    other.unwrap_or("<no host>").to_string(),
                ));
            }
        }
        let http = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| CompanionError::Transport(e.to_string()))?;
        Ok(Self {
            http,
            base,
            token: token.into(),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, CompanionError> {
        self.base
            .join(path)
            .map_err(|e| CompanionError::Transport(e.to_string()))
    }

    async fn post<B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<CompanionResponse, CompanionError> {
        let response = self
            .http
            .post(self.endpoint(path)?)
            .header(AUTH_HEADER, &self.token)
            .json(body)
            .send()
            .await
            .map_err(|e| CompanionError::Transport(e.to_string()))?;

        match response.status().as_u16() {
            401 => Err(CompanionError::Unauthorized),
            403 => {
                let detail = response.text().await.unwrap_or_default();
                Err(CompanionError::Disabled(detail))
            }
            status if !(200..300).contains(&status) => {
                let detail = response.text().await.unwrap_or_default();
                Err(CompanionError::Service(format!("{}: {}", status, detail)))
            }
            _ => {
                let parsed: CompanionResponse = response
                    .json()
                    .await
                    .map_err(|e| CompanionError::Transport(e.to_string()))?;
                debug!("companion {}: {}", path, parsed.message);
                Ok(parsed)
            }
        }
    }
}

#[async_trait]
impl CompanionService for CompanionClient {
    async fn focus(&self, point: ScreenPoint) -> Result<CompanionResponse, CompanionError> {
        self.post("/focus", &PointBody { x: point.x, y: point.y }).await
    }

    async fn type_text(&self, text: &str) -> Result<CompanionResponse, CompanionError> {
        self.post("/type", &TextBody { text }).await
    }

    async fn click(&self, point: ScreenPoint) -> Result<CompanionResponse, CompanionError> {
        self.post("/click", &PointBody { x: point.x, y: point.y }).await
    }

    async fn optical_click(
        &self,
        label: &str,
        confidence_threshold: f64,
    ) -> Result<CompanionResponse, CompanionError> {
        self.post("/optical_click", &OpticalBody { label, confidence_threshold })
            .await
    }

    async fn screenshot(&self) -> Result<ScreenshotRef, CompanionError> {
        let response = self.post("/screenshot", &serde_json::json!({})).await?;
        if !response.success {
            return Err(CompanionError::Service(response.message));
        }
        // The service stores the image and reports where it put it.
        Ok(ScreenshotRef { reference: response.message })
    }

    async fn scroll(&self, delta: i32) -> Result<CompanionResponse, CompanionError> {
        self.post("/scroll", &ScrollBody { delta }).await
    }

    async fn upload(&self, path: &str) -> Result<CompanionResponse, CompanionError> {
        self.post("/upload", &UploadBody { file_path: path }).await
    }

    async fn health(&self) -> Result<HealthStatus, CompanionError> {
        let response = self
            .http
            .get(self.endpoint("/health")?)
            .send()
            .await
            .map_err(|e| CompanionError::Transport(e.to_string()))?;
        if !response.status().is_success() {
            return Err(CompanionError::Service(format!(
                "health returned {}",
                response.status()
            )));
        }
        response
            .json()
            .await
            .map_err(|e| CompanionError::Transport(e.to_string()))
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
