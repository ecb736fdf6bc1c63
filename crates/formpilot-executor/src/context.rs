//! Execution context shared by the strategies and the plan runner.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use formpilot_config::ExecutorConfig;
use formpilot_page::PageSession;
use formpilot_protocols::{AuditSink, CompanionService, ConfirmationSource};

/// Everything a strategy attempt may touch.
///
/// The companion is an exclusive resource: pointer/keyboard and screen
/// capture are leased for one attempt at a time through `companion_lease`,
/// and the lease guard releases on every path.
pub struct ExecutionContext {
    pub session: Arc<dyn PageSession>,
    /// Deterministic harness context for the scripted-verify strategy;
    /// absent in live runs.
    pub harness: Option<Arc<dyn PageSession>>,
    pub companion: Option<Arc<dyn CompanionService>>,
    pub companion_lease: Arc<tokio::sync::Mutex<()>>,
    pub confirmation: Arc<dyn ConfirmationSource>,
    pub audit: Arc<dyn AuditSink>,
    pub config: ExecutorConfig,
    pub cancel: CancellationToken,
}

impl ExecutionContext {
    pub fn new(
        session: Arc<dyn PageSession>,
        confirmation: Arc<dyn ConfirmationSource>,
        audit: Arc<dyn AuditSink>,
        config: ExecutorConfig,
    ) -> Self {
        Self {
            session,
            harness: None,
            companion: None,
            companion_lease: Arc::new(tokio::sync::Mutex::new(())),
            confirmation,
            audit,
            config,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_companion(mut self, companion: Arc<dyn CompanionService>) -> Self {
        self.companion = Some(companion);
        self
    }

    pub fn with_harness(mut self, harness: Arc<dyn PageSession>) -> Self {
        self.harness = Some(harness);
        self
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }
}
