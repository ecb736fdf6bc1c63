//! # FormPilot Page
//!
//! In-memory DOM document model with shadow-root and nested-document edges,
//! locator resolution with exactly-one semantics, the [`PageSession`] seam
//! the executor drives, the deterministic [`HarnessPage`] used by the
//! scripted-verify strategy, and the [`CoordinateTranslator`].

pub mod coords;
pub mod dom;
pub mod error;
pub mod harness;
pub mod locate;
pub mod session;

pub use coords::CoordinateTranslator;
pub use dom::{DomNode, NodeAttributes, NodeId, PageDocument, SHADOW_ROOT_TAG, TEXT_TAG, origin_of};
pub use error::PageError;
pub use harness::{EventRecord, HarnessPage};
pub use locate::{NodePath, hop_for, resolve};
pub use session::PageSession;
