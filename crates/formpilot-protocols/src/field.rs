//! Field descriptors and structural locators produced by detection.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// The kind of fillable control a descriptor refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Text,
    Email,
    Tel,
    File,
    Select,
    Textarea,
    Checkbox,
    Radio,
    Date,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FieldKind::Text => "text",
            FieldKind::Email => "email",
            FieldKind::Tel => "tel",
            FieldKind::File => "file",
            FieldKind::Select => "select",
            FieldKind::Textarea => "textarea",
            FieldKind::Checkbox => "checkbox",
            FieldKind::Radio => "radio",
            FieldKind::Date => "date",
        };
        f.write_str(s)
    }
}

/// Boundary crossed when descending into a locator hop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HopBoundary {
    /// The previous hop is a shadow host; this hop lives in its shadow tree.
    ShadowRoot,
    /// The previous hop is an iframe; this hop lives in its content document.
    Frame,
}

/// One element along a structural path from the document root to a target.
///
/// Attributes hold only identifying markers (id, name, type), not the full
/// attribute set, so a locator survives cosmetic DOM changes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LocatorHop {
    pub tag: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boundary: Option<HopBoundary>,
}

impl LocatorHop {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attributes: BTreeMap::new(),
            boundary: None,
        }
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn with_boundary(mut self, boundary: HopBoundary) -> Self {
        self.boundary = Some(boundary);
        self
    }
}

/// Structural path usable to re-find an element in a live document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Locator {
    pub hops: Vec<LocatorHop>,
}

impl Locator {
    pub fn new(hops: Vec<LocatorHop>) -> Self {
        Self { hops }
    }

    pub fn is_empty(&self) -> bool {
        self.hops.is_empty()
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, hop) in self.hops.iter().enumerate() {
            match hop.boundary {
                Some(HopBoundary::ShadowRoot) => f.write_str(" #shadow# ")?,
                Some(HopBoundary::Frame) => f.write_str(" #frame# ")?,
                None if i > 0 => f.write_str(" > ")?,
                None => {}
            }
            f.write_str(&hop.tag)?;
            for (k, v) in &hop.attributes {
                write!(f, "[{}={}]", k, v)?;
            }
        }
        Ok(())
    }
}

/// Normalized description of one fillable field, fresh per detection pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    /// Stable identifier derived from name/id/label.
    pub key: String,
    pub kind: FieldKind,
    pub locator: Locator,
    pub required: bool,
    pub visible: bool,
    /// Best-effort associated label text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Wizard-page index the field belongs to (0 for single-page forms).
    #[serde(default)]
    pub stage: u32,
}

#[cfg(test)]
#[path = "field_tests.rs"]
mod tests;
