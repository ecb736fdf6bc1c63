//! Label association heuristics and key derivation.

use std::collections::HashMap;

use formpilot_page::{NodeId, PageDocument};

/// Slug a human label or attribute value into a stable key:
/// lowercase alphanumeric runs joined by `-`.
pub fn slug(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut pending_sep = false;
    for c in s.chars() {
        if c.is_alphanumeric() {
            if pending_sep && !out.is_empty() {
                out.push('-');
            }
            pending_sep = false;
            out.extend(c.to_lowercase());
        } else {
            pending_sep = true;
        }
    }
    out
}

/// Turn a field name token into readable text:
/// `firstName` / `first_name` / `first-name` all become "first name".
pub fn humanize(token: &str) -> String {
    let mut words: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut prev_lower = false;
    for c in token.chars() {
        if c == '_' || c == '-' || c == ' ' || c == '.' {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            prev_lower = false;
        } else {
            if c.is_uppercase() && prev_lower {
                words.push(std::mem::take(&mut current));
            }
            prev_lower = c.is_lowercase() || c.is_numeric();
            current.extend(c.to_lowercase());
        }
    }
    if !current.is_empty() {
        words.push(current);
    }
    words.join(" ")
}

/// Per-document index backing the association heuristics.
pub(crate) struct DocIndex<'a> {
    doc: &'a PageDocument,
    parents: Vec<Option<NodeId>>,
    labels_by_for: HashMap<String, NodeId>,
}

impl<'a> DocIndex<'a> {
    pub fn new(doc: &'a PageDocument) -> Self {
        let mut labels_by_for = HashMap::new();
        for node in &doc.nodes {
            if node.tag == "label" {
                if let Some(target) = &node.attributes.for_target {
                    labels_by_for.entry(target.clone()).or_insert(node.id);
                }
            }
        }
        Self {
            doc,
            parents: doc.parents(),
            labels_by_for,
        }
    }

    /// Priority-ordered label association: explicit `label[for]`, aria-label,
    /// enclosing label text, placeholder, nearest preceding text node, and
    /// finally the humanized name token.
    pub fn associate(&self, node: NodeId, preceding_text: Option<&str>) -> Option<String> {
        let attrs = &self.doc.node(node).attributes;

        if let Some(id) = &attrs.id {
            if let Some(&label) = self.labels_by_for.get(id) {
                let text = self.doc.subtree_text(label);
                if !text.is_empty() {
                    return Some(text);
                }
            }
        }

        if let Some(aria) = &attrs.aria_label {
            if !aria.trim().is_empty() {
                return Some(aria.trim().to_string());
            }
        }

        if let Some(label) = self.enclosing_label(node) {
            let text = self.doc.subtree_text(label);
            if !text.is_empty() {
                return Some(text);
            }
        }

        if let Some(placeholder) = &attrs.placeholder {
            if !placeholder.trim().is_empty() {
                return Some(placeholder.trim().to_string());
            }
        }

        if let Some(text) = preceding_text {
            if !text.trim().is_empty() {
                return Some(text.trim().to_string());
            }
        }

        attrs.name.as_deref().map(humanize).filter(|s| !s.is_empty())
    }

    fn enclosing_label(&self, node: NodeId) -> Option<NodeId> {
        let mut current = self.parents[node];
        let mut hops = 0;
        while let Some(id) = current {
            if self.doc.node(id).tag == "label" {
                return Some(id);
            }
            current = self.parents[id];
            hops += 1;
            if hops > self.doc.nodes.len() {
                break;
            }
        }
        None
    }
}

#[cfg(test)]
#[path = "labels_tests.rs"]
mod tests;
