//! Arena-based DOM document with shadow-root and nested-document edges.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use formpilot_protocols::{BoundingBox, ViewportInfo};

pub type NodeId = usize;

/// Tag of text nodes.
pub const TEXT_TAG: &str = "#text";
/// Tag of the artificial node rooting a shadow tree.
pub const SHADOW_ROOT_TAG: &str = "#shadow-root";

/// Attributes extracted from an element.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeAttributes {
    pub id: Option<String>,
    pub class: Option<String>,
    pub name: Option<String>,
    pub r#type: Option<String>,
    pub value: Option<String>,
    pub placeholder: Option<String>,
    pub role: Option<String>,
    pub aria_label: Option<String>,
    /// The `for` attribute on label elements.
    pub for_target: Option<String>,
    pub src: Option<String>,
    pub required: bool,
    pub disabled: bool,
    pub hidden: bool,
    pub checked: bool,
    /// `data-*` attributes, keyed without the `data-` prefix.
    pub data: BTreeMap<String, String>,
}

impl NodeAttributes {
    /// Look up an attribute by its markup name.
    pub fn get(&self, key: &str) -> Option<&str> {
        match key {
            "id" => self.id.as_deref(),
            "class" => self.class.as_deref(),
            "name" => self.name.as_deref(),
            "type" => self.r#type.as_deref(),
            "value" => self.value.as_deref(),
            "placeholder" => self.placeholder.as_deref(),
            "role" => self.role.as_deref(),
            "aria-label" => self.aria_label.as_deref(),
            "for" => self.for_target.as_deref(),
            "src" => self.src.as_deref(),
            _ => key
                .strip_prefix("data-")
                .and_then(|k| self.data.get(k).map(String::as_str)),
        }
    }
}

/// One node of a page document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomNode {
    pub id: NodeId,
    /// Lowercase tag name; `#text` for text nodes.
    pub tag: String,
    #[serde(default)]
    pub attributes: NodeAttributes,
    /// Direct text content (text nodes only).
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub children: Vec<NodeId>,
    /// Root of an attached shadow tree.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shadow_root: Option<NodeId>,
    /// Index into [`PageDocument::frames`] for iframe elements.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame: Option<usize>,
    /// Page-absolute bounding rectangle.
    #[serde(default)]
    pub rect: BoundingBox,
}

impl DomNode {
    pub fn is_element(&self) -> bool {
        !self.tag.starts_with('#')
    }

    pub fn is_text(&self) -> bool {
        self.tag == TEXT_TAG
    }
}

/// One document tree: the page itself, or the content of a same-origin frame.
///
/// Child documents are owned; a `None` frame slot marks a cross-origin frame
/// whose content is inaccessible.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageDocument {
    pub url: String,
    #[serde(default)]
    pub viewport: ViewportInfo,
    pub root: NodeId,
    pub nodes: Vec<DomNode>,
    #[serde(default)]
    pub frames: Vec<Option<PageDocument>>,
}

impl PageDocument {
    /// Create a document with an empty `html` root.
    pub fn new(url: impl Into<String>) -> Self {
        let root = DomNode {
            id: 0,
            tag: "html".to_string(),
            attributes: NodeAttributes::default(),
            text: String::new(),
            children: Vec::new(),
            shadow_root: None,
            frame: None,
            rect: BoundingBox::new(0.0, 0.0, 1280.0, 720.0),
        };
        Self {
            url: url.into(),
            viewport: ViewportInfo::default(),
            root: 0,
            nodes: vec![root],
            frames: Vec::new(),
        }
    }

    pub fn node(&self, id: NodeId) -> &DomNode {
        &self.nodes[id]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut DomNode {
        &mut self.nodes[id]
    }

    /// Append an element child; rects are stacked vertically by default so
    /// every element has usable geometry without explicit placement.
    pub fn add_element(&mut self, parent: NodeId, tag: &str) -> NodeId {
        let id = self.nodes.len();
        let rect = BoundingBox::new(8.0, 8.0 + id as f64 * 30.0, 200.0, 24.0);
        self.nodes.push(DomNode {
            id,
            tag: tag.to_lowercase(),
            attributes: NodeAttributes::default(),
            text: String::new(),
            children: Vec::new(),
            shadow_root: None,
            frame: None,
            rect,
        });
        self.nodes[parent].children.push(id);
        id
    }

    /// Append a text node child.
    pub fn add_text(&mut self, parent: NodeId, text: &str) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(DomNode {
            id,
            tag: TEXT_TAG.to_string(),
            attributes: NodeAttributes::default(),
            text: text.to_string(),
            children: Vec::new(),
            shadow_root: None,
            frame: None,
            rect: BoundingBox::default(),
        });
        self.nodes[parent].children.push(id);
        id
    }

    /// Attach a shadow tree to `host` and return its root container node.
    pub fn attach_shadow(&mut self, host: NodeId) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(DomNode {
            id,
            tag: SHADOW_ROOT_TAG.to_string(),
            attributes: NodeAttributes::default(),
            text: String::new(),
            children: Vec::new(),
            shadow_root: None,
            frame: None,
            rect: BoundingBox::default(),
        });
        self.nodes[host].shadow_root = Some(id);
        id
    }

    /// Attach a content document to an iframe element; `None` marks the
    /// frame as cross-origin.
    pub fn attach_frame(&mut self, host: NodeId, content: Option<PageDocument>) {
        let index = self.frames.len();
        self.frames.push(content);
        self.nodes[host].frame = Some(index);
    }

    pub fn set_attrs(&mut self, id: NodeId, configure: impl FnOnce(&mut NodeAttributes)) {
        configure(&mut self.nodes[id].attributes);
    }

    pub fn set_rect(&mut self, id: NodeId, rect: BoundingBox) {
        self.nodes[id].rect = rect;
    }

    /// Resolve a nested document by frame index path.
    pub fn document_at(&self, frame_path: &[usize]) -> Option<&PageDocument> {
        let mut doc = self;
        for &index in frame_path {
            doc = doc.frames.get(index)?.as_ref()?;
        }
        Some(doc)
    }

    pub fn document_at_mut(&mut self, frame_path: &[usize]) -> Option<&mut PageDocument> {
        let mut doc = self;
        for &index in frame_path {
            doc = doc.frames.get_mut(index)?.as_mut()?;
        }
        Some(doc)
    }

    /// Parent id per node, first writer wins for aliased (slotted) children.
    pub fn parents(&self) -> Vec<Option<NodeId>> {
        let mut parents = vec![None; self.nodes.len()];
        for node in &self.nodes {
            for &child in &node.children {
                if child < parents.len() && parents[child].is_none() && child != node.id {
                    parents[child] = Some(node.id);
                }
            }
            if let Some(shadow) = node.shadow_root {
                if shadow < parents.len() && parents[shadow].is_none() {
                    parents[shadow] = Some(node.id);
                }
            }
        }
        parents
    }

    /// Concatenated text of a subtree, guarded against aliased children.
    pub fn subtree_text(&self, id: NodeId) -> String {
        let mut out = Vec::new();
        let mut visited = HashSet::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if !visited.insert(current) {
                continue;
            }
            let node = &self.nodes[current];
            if node.is_text() && !node.text.trim().is_empty() {
                out.push(node.text.trim().to_string());
            }
            for &child in node.children.iter().rev() {
                stack.push(child);
            }
        }
        out.join(" ")
    }

    /// Whether a node is rendered: not hidden (including by an ancestor),
    /// not disabled, and has a non-empty rectangle.
    pub fn is_visible(&self, id: NodeId) -> bool {
        let node = &self.nodes[id];
        if node.attributes.disabled || node.rect.is_empty() {
            return false;
        }
        if node.attributes.r#type.as_deref() == Some("hidden") {
            return false;
        }
        let parents = self.parents();
        let mut current = Some(id);
        let mut hops = 0;
        while let Some(n) = current {
            if self.nodes[n].attributes.hidden {
                return false;
            }
            current = parents[n];
            hops += 1;
            if hops > self.nodes.len() {
                break;
            }
        }
        true
    }
}

/// Extract `scheme://host[:port]` from a URL string.
pub fn origin_of(url: &str) -> String {
    match url.find("://") {
        Some(scheme_end) => {
            let rest = &url[scheme_end + 3..];
            let host_end = rest.find('/').unwrap_or(rest.len());
            format!("{}{}", &url[..scheme_end + 3], &rest[..host_end])
        }
        None => url.to_string(),
    }
}

#[cfg(test)]
#[path = "dom_tests.rs"]
mod tests;
