//! Rendering-environment abstraction shared by the viewport classifier and
//! the style engine.
//!
//! The host document (tree construction, layout, computed styles) is an
//! external collaborator; this crate centralizes the small capability set the
//! rest of the system needs from it, behind the [`Document`] trait, plus an
//! in-memory implementation for tests and headless embedders.

use anyhow::Result;

pub mod memory;
pub mod selectors;

pub use memory::MemoryDocument;

/// A 64-bit stable key for document nodes, shared across subsystems.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct NodeKey(pub u64);

/// The rendering-environment capabilities the classifier and style engine
/// consume. Kept small and object-safe so core logic can run against a
/// substitute environment in tests.
///
/// All methods take `&self`; implementations are expected to use interior
/// mutability, since several subsystems hold the same document handle on a
/// single thread.
pub trait Document {
    /// Parse a markup fragment and append its first element to the document
    /// body. Returns the handle of the inserted element.
    fn append_body_fragment(&self, markup: &str) -> Result<NodeKey>;

    /// Parse a markup fragment and insert its first element at the *front* of
    /// `parent`'s child list. Returns the handle of the inserted element.
    fn prepend_fragment(&self, parent: NodeKey, markup: &str) -> Result<NodeKey>;

    /// A node's children in traversal order. Unknown nodes yield an empty
    /// list.
    fn child_nodes(&self, node: NodeKey) -> Vec<NodeKey>;

    /// Layout-visibility probe: true iff the node currently has no layout box
    /// (the node or one of its ancestors is display-suppressed). This is a
    /// visibility-via-layout test, so it holds for any CSS mechanism the
    /// environment used to hide the node. Unknown nodes are hidden.
    fn is_hidden(&self, node: NodeKey) -> bool;

    /// All elements matching a CSS selector-list string, in document order.
    /// Selectors the environment cannot parse match nothing.
    fn query_selector_all(&self, selector: &str) -> Vec<NodeKey>;

    /// The node's resolved font size in px (post-cascade, inline overrides
    /// included). `None` for unknown nodes.
    fn computed_font_size(&self, node: NodeKey) -> Option<f32>;

    /// Set the node's inline font-size override, in px.
    fn set_inline_font_size(&self, node: NodeKey, px: f32);

    /// Clear the node's inline font-size override, restoring cascade-derived
    /// sizing.
    fn clear_inline_font_size(&self, node: NodeKey);
}
