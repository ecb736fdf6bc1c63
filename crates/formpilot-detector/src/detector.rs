//! Field detection traversal.

use std::collections::{BTreeMap, HashSet};

use tracing::debug;

use formpilot_page::{NodeId, PageDocument};
use formpilot_protocols::{FieldDescriptor, FieldKind, HopBoundary, Locator, LocatorHop};

use crate::labels::{DocIndex, slug};

/// Click targets for synthetic plan steps, found alongside the fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ControlMap {
    pub submit: Option<Locator>,
    /// Target wizard stage -> control that reveals it.
    pub advance: BTreeMap<u32, Locator>,
}

/// Detect all fillable fields in a document tree.
///
/// Pure read of the DOM: descends shadow roots and same-origin frames,
/// guards cyclic re-entry through slotted content with a visited set, and
/// de-duplicates by locator. Invisible and disabled elements are included
/// with `visible: false`.
pub fn detect(doc: &PageDocument) -> Vec<FieldDescriptor> {
    let mut out = Vec::new();
    let mut seen = HashSet::new();
    walk_document(doc, Vec::new(), &mut out, &mut seen);
    out
}

/// Detection entry point for frame content that may be inaccessible
/// (cross-origin): never fails, an absent document yields no fields.
pub fn detect_frame(frame: Option<&PageDocument>) -> Vec<FieldDescriptor> {
    match frame {
        Some(doc) => detect(doc),
        None => Vec::new(),
    }
}

struct WorkItem {
    node: NodeId,
    chain: Vec<LocatorHop>,
    stage: u32,
    boundary: Option<HopBoundary>,
}

fn walk_document(
    doc: &PageDocument,
    prefix: Vec<LocatorHop>,
    out: &mut Vec<FieldDescriptor>,
    seen: &mut HashSet<Locator>,
) {
    let index = DocIndex::new(doc);
    let mut visited: HashSet<NodeId> = HashSet::new();
    let mut last_text: Option<String> = None;

    let root_boundary = if prefix.is_empty() {
        None
    } else {
        Some(HopBoundary::Frame)
    };
    let mut stack = vec![WorkItem {
        node: doc.root,
        chain: prefix,
        stage: 0,
        boundary: root_boundary,
    }];

    while let Some(item) = stack.pop() {
        if !visited.insert(item.node) {
            continue;
        }
        let node = doc.node(item.node);

        if node.is_text() {
            if !node.text.trim().is_empty() {
                last_text = Some(node.text.trim().to_string());
            }
            continue;
        }

        let stage = node
            .attributes
            .data
            .get("stage")
            .and_then(|s| s.parse().ok())
            .unwrap_or(item.stage);

        let mut chain = item.chain.clone();
        chain.push(formpilot_page::hop_for(doc, item.node, item.boundary));

        if let Some(kind) = field_kind(doc, item.node) {
            let locator = Locator::new(chain.clone());
            if seen.insert(locator.clone()) {
                let label = index.associate(item.node, last_text.as_deref());
                out.push(FieldDescriptor {
                    key: derive_key(doc, item.node, label.as_deref(), kind, out.len()),
                    kind,
                    locator,
                    required: node.attributes.required,
                    visible: doc.is_visible(item.node),
                    label,
                    stage,
                });
            } else {
                debug!("duplicate locator skipped: {}", locator);
            }
        }

        // Descend light children first, then the shadow tree, then frame
        // content. Items are pushed in reverse so document order is kept.
        if let Some(frame_index) = node.frame {
            match doc.frames[frame_index].as_ref() {
                Some(frame_doc) => walk_document(frame_doc, chain.clone(), out, seen),
                None => debug!("skipping cross-origin frame in {}", doc.url),
            }
        }
        if let Some(shadow) = node.shadow_root {
            for &child in doc.node(shadow).children.iter().rev() {
                stack.push(WorkItem {
                    node: child,
                    chain: chain.clone(),
                    stage,
                    boundary: Some(HopBoundary::ShadowRoot),
                });
            }
        }
        for &child in node.children.iter().rev() {
            stack.push(WorkItem {
                node: child,
                chain: chain.clone(),
                stage,
                boundary: None,
            });
        }
    }
}

fn field_kind(doc: &PageDocument, id: NodeId) -> Option<FieldKind> {
    let node = doc.node(id);
    match node.tag.as_str() {
        "textarea" => Some(FieldKind::Textarea),
        "select" => Some(FieldKind::Select),
        "input" => match node.attributes.r#type.as_deref() {
            None | Some("text") | Some("search") | Some("url") | Some("password") => {
                Some(FieldKind::Text)
            }
            Some("email") => Some(FieldKind::Email),
            Some("tel") => Some(FieldKind::Tel),
            Some("file") => Some(FieldKind::File),
            Some("checkbox") => Some(FieldKind::Checkbox),
            Some("radio") => Some(FieldKind::Radio),
            Some("date") => Some(FieldKind::Date),
            _ => None,
        },
        _ => None,
    }
}

fn derive_key(
    doc: &PageDocument,
    id: NodeId,
    label: Option<&str>,
    kind: FieldKind,
    ordinal: usize,
) -> String {
    let attrs = &doc.node(id).attributes;
    let source = attrs
        .name
        .as_deref()
        .or(attrs.id.as_deref())
        .or(label)
        .unwrap_or("");
    let key = slug(source);
    if key.is_empty() {
        format!("{}-{}", kind, ordinal + 1)
    } else {
        key
    }
}

/// Find the submit and advance controls used for synthetic plan steps.
///
/// Submit: the first `type=submit` control, falling back to a button whose
/// text reads like a submission. Advance: controls with a `data-advance`
/// target, falling back to next/continue buttons assigned consecutive
/// stages in document order.
pub fn find_controls(doc: &PageDocument) -> ControlMap {
    let mut controls = ControlMap::default();
    let mut next_fallback_stage = 1;
    scan_controls(doc, Vec::new(), &mut controls, &mut next_fallback_stage);
    controls
}

fn scan_controls(
    doc: &PageDocument,
    prefix: Vec<LocatorHop>,
    controls: &mut ControlMap,
    next_fallback_stage: &mut u32,
) {
    let root_boundary = if prefix.is_empty() {
        None
    } else {
        Some(HopBoundary::Frame)
    };
    let mut visited: HashSet<NodeId> = HashSet::new();
    let mut stack = vec![(doc.root, prefix, root_boundary)];

    while let Some((id, chain, boundary)) = stack.pop() {
        if !visited.insert(id) {
            continue;
        }
        let node = doc.node(id);
        if node.is_text() {
            continue;
        }

        let mut chain = chain;
        chain.push(formpilot_page::hop_for(doc, id, boundary));

        if is_clickable_control(doc, id) {
            let locator = Locator::new(chain.clone());
            if let Some(stage) = node.attributes.data.get("advance").and_then(|s| s.parse().ok()) {
                controls.advance.entry(stage).or_insert(locator);
            } else if node.attributes.r#type.as_deref() == Some("submit")
                || text_matches(doc, id, &["submit", "apply", "send application"])
            {
                if controls.submit.is_none() {
                    controls.submit = Some(locator);
                }
            } else if text_matches(doc, id, &["next", "continue"]) {
                controls.advance.entry(*next_fallback_stage).or_insert(locator);
                *next_fallback_stage += 1;
            }
        }

        if let Some(frame_index) = node.frame {
            if let Some(frame_doc) = doc.frames[frame_index].as_ref() {
                scan_controls(frame_doc, chain.clone(), controls, next_fallback_stage);
            }
        }
        if let Some(shadow) = node.shadow_root {
            for &child in doc.node(shadow).children.iter().rev() {
                stack.push((child, chain.clone(), Some(HopBoundary::ShadowRoot)));
            }
        }
        for &child in node.children.iter().rev() {
            stack.push((child, chain.clone(), None));
        }
    }
}

fn is_clickable_control(doc: &PageDocument, id: NodeId) -> bool {
    let node = doc.node(id);
    match node.tag.as_str() {
        "button" => true,
        "input" => matches!(
            node.attributes.r#type.as_deref(),
            Some("submit") | Some("button")
        ),
        "a" => node.attributes.role.as_deref() == Some("button"),
        _ => false,
    }
}

fn text_matches(doc: &PageDocument, id: NodeId, needles: &[&str]) -> bool {
    let text = doc.subtree_text(id).to_lowercase();
    if text.is_empty() {
        return false;
    }
    needles.iter().any(|n| text.contains(n))
}

#[cfg(test)]
#[path = "detector_tests.rs"]
mod tests;
