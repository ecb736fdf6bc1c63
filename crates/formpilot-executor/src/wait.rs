//! Bounded wait primitive for step `wait_for` conditions.

use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use formpilot_config::ExecutorConfig;
use formpilot_page::PageSession;
use formpilot_protocols::{ErrorKind, WaitCondition};

/// Suspend until the condition holds, polling the page at the configured
/// interval. The wait is bounded by `wait_timeout_ms` (failing the step
/// with `WaitTimeout`) and by the single cancellation token.
///
/// `start_url` is the URL captured before the step's action was dispatched;
/// a synchronous navigation triggered by the action still satisfies
/// `UrlChange`.
pub(crate) async fn await_condition(
    condition: &WaitCondition,
    session: &dyn PageSession,
    start_url: &str,
    config: &ExecutorConfig,
    cancel: &CancellationToken,
) -> Result<(), ErrorKind> {
    if let WaitCondition::Timeout { ms } = condition {
        tokio::select! {
            _ = cancel.cancelled() => return Err(ErrorKind::Cancelled),
            _ = tokio::time::sleep(Duration::from_millis(*ms)) => return Ok(()),
        }
    }

    let deadline = Instant::now() + Duration::from_millis(config.wait_timeout_ms);
    let poll = Duration::from_millis(config.wait_poll_interval_ms);

    loop {
        if satisfied(condition, session, start_url) {
            return Ok(());
        }
        if Instant::now() >= deadline {
            debug!("wait condition timed out: {:?}", condition);
            return Err(ErrorKind::WaitTimeout);
        }
        tokio::select! {
            _ = cancel.cancelled() => return Err(ErrorKind::Cancelled),
            _ = tokio::time::sleep(poll) => {}
        }
    }
}

fn satisfied(condition: &WaitCondition, session: &dyn PageSession, start_url: &str) -> bool {
    match condition {
        WaitCondition::UrlChange => session.url() != start_url,
        WaitCondition::ElementAppears { locator } => match session.resolve(locator) {
            Ok(path) => session.is_visible(&path).unwrap_or(false),
            Err(_) => false,
        },
        WaitCondition::ElementDisappears { locator } => match session.resolve(locator) {
            Ok(path) => !session.is_visible(&path).unwrap_or(true),
            Err(_) => true,
        },
        WaitCondition::Timeout { .. } => true,
    }
}

#[cfg(test)]
#[path = "wait_tests.rs"]
mod tests;
