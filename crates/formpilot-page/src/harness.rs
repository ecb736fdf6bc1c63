//! Deterministic in-memory page used for offline validation and tests.

use std::collections::HashSet;

use parking_lot::RwLock;
use tracing::debug;

use formpilot_protocols::{BoundingBox, Locator, ViewportInfo};

use crate::dom::{NodeId, PageDocument, origin_of};
use crate::error::PageError;
use crate::locate::{NodePath, resolve};
use crate::session::PageSession;

/// One dispatched DOM event, recorded for assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventRecord {
    /// Field name/id, or tag when the element carries neither.
    pub target: String,
    pub event: String,
}

struct HarnessState {
    doc: PageDocument,
    url: String,
    events: Vec<EventRecord>,
    /// Field keys whose structural mutation is rejected (failure injection).
    fail_structural: HashSet<String>,
    submitted: bool,
}

/// Deterministic page implementation backing the scripted-verify strategy.
///
/// Behaviors mirror what the in-page content script sees on a real wizard:
/// clicking a `data-advance="N"` control reveals the stage-N subtree,
/// clicking a submit control changes the URL, and file inputs reject
/// programmatic value assignment.
pub struct HarnessPage {
    state: RwLock<HarnessState>,
}

impl HarnessPage {
    pub fn new(doc: PageDocument) -> Self {
        let url = doc.url.clone();
        Self {
            state: RwLock::new(HarnessState {
                doc,
                url,
                events: Vec::new(),
                fail_structural: HashSet::new(),
                submitted: false,
            }),
        }
    }

    /// Reject structural mutation for the field named `key`.
    pub fn fail_structural_on(&self, key: &str) {
        self.state.write().fail_structural.insert(key.to_string());
    }

    pub fn events(&self) -> Vec<EventRecord> {
        self.state.read().events.clone()
    }

    pub fn submitted(&self) -> bool {
        self.state.read().submitted
    }

    fn target_of(doc: &PageDocument, id: NodeId) -> String {
        let node = doc.node(id);
        node.attributes
            .name
            .clone()
            .or_else(|| node.attributes.id.clone())
            .unwrap_or_else(|| node.tag.clone())
    }

    fn record(state: &mut HarnessState, target: &str, events: &[&str]) {
        for event in events {
            state.events.push(EventRecord {
                target: target.to_string(),
                event: (*event).to_string(),
            });
        }
    }

    fn reveal_stage(doc: &mut PageDocument, stage: &str) {
        for node in &mut doc.nodes {
            if node.attributes.data.get("stage").map(String::as_str) == Some(stage) {
                node.attributes.hidden = false;
            }
        }
    }
}

impl PageSession for HarnessPage {
    fn url(&self) -> String {
        self.state.read().url.clone()
    }

    fn origin(&self) -> String {
        origin_of(&self.state.read().url)
    }

    fn viewport(&self) -> ViewportInfo {
        self.state.read().doc.viewport.clone()
    }

    fn snapshot(&self) -> PageDocument {
        self.state.read().doc.clone()
    }

    fn resolve(&self, locator: &Locator) -> Result<NodePath, PageError> {
        resolve(&self.state.read().doc, locator)
    }

    fn rect_of(&self, path: &NodePath) -> Result<BoundingBox, PageError> {
        let state = self.state.read();
        let doc = state
            .doc
            .document_at(&path.frames)
            .ok_or_else(|| PageError::FrameInaccessible(format!("{:?}", path.frames)))?;
        Ok(doc.node(path.node).rect)
    }

    fn is_visible(&self, path: &NodePath) -> Result<bool, PageError> {
        let state = self.state.read();
        let doc = state
            .doc
            .document_at(&path.frames)
            .ok_or_else(|| PageError::FrameInaccessible(format!("{:?}", path.frames)))?;
        Ok(doc.is_visible(path.node))
    }

    fn scroll_into_view(&self, path: &NodePath) -> Result<(), PageError> {
        let mut state = self.state.write();
        let rect = {
            let doc = state
                .doc
                .document_at(&path.frames)
                .ok_or_else(|| PageError::FrameInaccessible(format!("{:?}", path.frames)))?;
            let node = doc.node(path.node);
            // Clipped containers swallow the scroll request.
            if node.attributes.data.contains_key("clipped") {
                return Ok(());
            }
            node.rect
        };
        let viewport = &mut state.doc.viewport;
        let (cx, cy) = rect.center();
        viewport.scroll_x = (cx - viewport.width as f64 / 2.0).max(0.0);
        viewport.scroll_y = (cy - viewport.height as f64 / 2.0).max(0.0);
        Ok(())
    }

    fn set_value(&self, path: &NodePath, value: &str) -> Result<(), PageError> {
        let mut state = self.state.write();
        let target = {
            let doc = state
                .doc
                .document_at(&path.frames)
                .ok_or_else(|| PageError::FrameInaccessible(format!("{:?}", path.frames)))?;
            let node = doc.node(path.node);
            if node.attributes.r#type.as_deref() == Some("file") {
                return Err(PageError::MutationRejected(
                    "file inputs cannot be assigned programmatically".to_string(),
                ));
            }
            Self::target_of(doc, path.node)
        };
        if state.fail_structural.contains(&target) {
            return Err(PageError::MutationRejected(format!(
                "injected failure for '{}'",
                target
            )));
        }
        {
            let doc = state.doc.document_at_mut(&path.frames).unwrap();
            doc.node_mut(path.node).attributes.value = Some(value.to_string());
        }
        Self::record(&mut state, &target, &["input", "change", "blur"]);
        debug!("harness set '{}' = '{}'", target, value);
        Ok(())
    }

    fn read_value(&self, path: &NodePath) -> Result<String, PageError> {
        let state = self.state.read();
        let doc = state
            .doc
            .document_at(&path.frames)
            .ok_or_else(|| PageError::FrameInaccessible(format!("{:?}", path.frames)))?;
        let node = doc.node(path.node);
        if node.attributes.checked {
            return Ok("checked".to_string());
        }
        Ok(node.attributes.value.clone().unwrap_or_default())
    }

    fn click(&self, path: &NodePath) -> Result<(), PageError> {
        let mut state = self.state.write();
        let (target, advance, submits, toggles) = {
            let doc = state
                .doc
                .document_at(&path.frames)
                .ok_or_else(|| PageError::FrameInaccessible(format!("{:?}", path.frames)))?;
            let node = doc.node(path.node);
            let advance = node.attributes.data.get("advance").cloned();
            let submits = node.attributes.r#type.as_deref() == Some("submit");
            let toggles = matches!(
                node.attributes.r#type.as_deref(),
                Some("checkbox") | Some("radio")
            );
            (Self::target_of(doc, path.node), advance, submits, toggles)
        };

        Self::record(&mut state, &target, &["click"]);

        if let Some(stage) = advance {
            Self::reveal_stage(&mut state.doc, &stage);
            debug!("harness advanced to stage {}", stage);
        } else if submits {
            state.submitted = true;
            state.url = format!("{}?submitted=1", state.url);
            Self::record(&mut state, &target, &["submit"]);
            debug!("harness submitted");
        } else if toggles {
            let doc = state.doc.document_at_mut(&path.frames).unwrap();
            let attrs = &mut doc.node_mut(path.node).attributes;
            attrs.checked = !attrs.checked;
            Self::record(&mut state, &target, &["change"]);
        }

        Ok(())
    }
}

#[cfg(test)]
#[path = "harness_tests.rs"]
mod tests;
