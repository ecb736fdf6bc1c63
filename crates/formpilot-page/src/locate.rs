//! Locator construction and exactly-one resolution.

use formpilot_protocols::{HopBoundary, Locator, LocatorHop};

use crate::dom::{NodeId, PageDocument};
use crate::error::PageError;

/// Address of a node, possibly inside nested same-origin documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodePath {
    /// Frame index path from the top document.
    pub frames: Vec<usize>,
    pub node: NodeId,
}

impl NodePath {
    pub fn top(node: NodeId) -> Self {
        Self { frames: Vec::new(), node }
    }
}

/// Identifying attributes carried on a locator hop.
const HOP_ATTRS: [&str; 3] = ["id", "name", "type"];

/// Build the hop describing one element, with an optional boundary marker.
///
/// `data-*` markers ride along too; they are what tells two otherwise
/// identical wizard-stage containers apart.
pub fn hop_for(doc: &PageDocument, id: NodeId, boundary: Option<HopBoundary>) -> LocatorHop {
    let node = doc.node(id);
    let mut hop = LocatorHop::new(node.tag.clone());
    for key in HOP_ATTRS {
        if let Some(value) = node.attributes.get(key) {
            hop = hop.with_attr(key, value);
        }
    }
    for (key, value) in &node.attributes.data {
        hop = hop.with_attr(format!("data-{}", key), value);
    }
    if let Some(boundary) = boundary {
        hop = hop.with_boundary(boundary);
    }
    hop
}

fn hop_matches(doc: &PageDocument, id: NodeId, hop: &LocatorHop) -> bool {
    let node = doc.node(id);
    if node.tag != hop.tag {
        return false;
    }
    hop.attributes
        .iter()
        .all(|(key, value)| node.attributes.get(key) == Some(value.as_str()))
}

/// Resolve a locator to exactly one live node.
///
/// Zero matches fail with [`PageError::NotFound`]; more than one fails with
/// [`PageError::Ambiguous`] so no action ever targets multiple elements.
pub fn resolve(doc: &PageDocument, locator: &Locator) -> Result<NodePath, PageError> {
    if locator.is_empty() {
        return Err(PageError::NotFound("empty locator".to_string()));
    }

    let mut matches = Vec::new();
    if hop_matches(doc, doc.root, &locator.hops[0]) {
        descend(doc, doc.root, locator, 1, &mut Vec::new(), &mut matches);
    }

    match matches.len() {
        0 => Err(PageError::NotFound(locator.to_string())),
        1 => Ok(matches.remove(0)),
        count => Err(PageError::Ambiguous {
            locator: locator.to_string(),
            count,
        }),
    }
}

fn descend(
    doc: &PageDocument,
    node: NodeId,
    locator: &Locator,
    hop_index: usize,
    frame_path: &mut Vec<usize>,
    matches: &mut Vec<NodePath>,
) {
    if hop_index == locator.hops.len() {
        matches.push(NodePath {
            frames: frame_path.clone(),
            node,
        });
        return;
    }

    let hop = &locator.hops[hop_index];
    match hop.boundary {
        None => {
            for &child in &doc.node(node).children {
                if hop_matches(doc, child, hop) {
                    descend(doc, child, locator, hop_index + 1, frame_path, matches);
                }
            }
        }
        Some(HopBoundary::ShadowRoot) => {
            if let Some(shadow) = doc.node(node).shadow_root {
                for &child in &doc.node(shadow).children {
                    if hop_matches(doc, child, hop) {
                        descend(doc, child, locator, hop_index + 1, frame_path, matches);
                    }
                }
            }
        }
        Some(HopBoundary::Frame) => {
            if let Some(index) = doc.node(node).frame {
                if let Some(frame_doc) = doc.frames[index].as_ref() {
                    if hop_matches(frame_doc, frame_doc.root, hop) {
                        frame_path.push(index);
                        // Matches inside the frame are collected relative to
                        // the frame document, then re-anchored here.
                        let mut inner = Vec::new();
                        descend(frame_doc, frame_doc.root, locator, hop_index + 1, &mut Vec::new(), &mut inner);
                        for m in inner {
                            let mut frames = frame_path.clone();
                            frames.extend(m.frames);
                            matches.push(NodePath { frames, node: m.node });
                        }
                        frame_path.pop();
                    }
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "locate_tests.rs"]
mod tests;
