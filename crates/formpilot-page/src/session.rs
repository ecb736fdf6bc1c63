//! The seam between the engine and a live page.

use formpilot_protocols::{BoundingBox, Locator, ViewportInfo};

use crate::dom::PageDocument;
use crate::error::PageError;
use crate::locate::NodePath;

/// A handle on one live page within one session.
///
/// The in-page half of the engine is single-threaded and cooperatively
/// scheduled, so these operations are synchronous; only waits and the
/// companion service suspend.
pub trait PageSession: Send + Sync {
    fn url(&self) -> String;

    fn origin(&self) -> String;

    fn viewport(&self) -> ViewportInfo;

    /// A copy of the current document tree for detection passes.
    fn snapshot(&self) -> PageDocument;

    /// Resolve a locator to exactly one live node (fail closed otherwise).
    fn resolve(&self, locator: &Locator) -> Result<NodePath, PageError>;

    fn rect_of(&self, path: &NodePath) -> Result<BoundingBox, PageError>;

    fn is_visible(&self, path: &NodePath) -> Result<bool, PageError>;

    fn scroll_into_view(&self, path: &NodePath) -> Result<(), PageError>;

    /// Set a field value and dispatch input/change/blur notifications.
    fn set_value(&self, path: &NodePath, value: &str) -> Result<(), PageError>;

    fn read_value(&self, path: &NodePath) -> Result<String, PageError>;

    /// Dispatch a native-equivalent click on the node.
    fn click(&self, path: &NodePath) -> Result<(), PageError>;
}
