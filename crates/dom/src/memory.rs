//! In-memory [`Document`] implementation.
//!
//! Backs the integration tests and headless embedders. It models only what
//! the classifier and style engine consume: a node tree with classes and
//! ids, a hidden flag standing in for "no layout box", font-size resolution
//! with inheritance, and selector queries in document order.

use crate::selectors::{Combinator, Compound, Selector, parse_selector_list};
use crate::{Document, NodeKey};
use anyhow::{Result, bail};
use log::debug;
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use smallvec::SmallVec;
use std::cell::RefCell;
use std::collections::HashMap;

/// Default resolved font size of the document root, in px.
pub const ROOT_FONT_SIZE_PX: f32 = 16.0;

#[derive(Debug, Default)]
struct NodeData {
    tag: String,
    element_id: Option<String>,
    classes: Vec<String>,
    /// Attributes other than id/class, which have dedicated fields.
    attrs: SmallVec<[(String, String); 4]>,
    /// Authored (cascade) font size, if any rule set one on this node.
    authored_font_size: Option<f32>,
    /// Inline font-size override, the only style this system writes.
    inline_font_size: Option<f32>,
    /// True when the node generates no layout box of its own.
    hidden: bool,
    parent: Option<NodeKey>,
    children: Vec<NodeKey>,
}

#[derive(Debug)]
struct DocumentTree {
    nodes: HashMap<NodeKey, NodeData>,
    body: NodeKey,
    next_key: u64,
}

/// An in-memory document tree with interior mutability, so the classifier
/// and the style engine can share one handle on a single thread.
#[derive(Debug)]
pub struct MemoryDocument {
    inner: RefCell<DocumentTree>,
}

impl Default for MemoryDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDocument {
    /// Create a document containing only a `body` element.
    pub fn new() -> Self {
        let body = NodeKey(1);
        let mut nodes = HashMap::new();
        nodes.insert(
            body,
            NodeData {
                tag: "body".to_owned(),
                ..NodeData::default()
            },
        );
        Self {
            inner: RefCell::new(DocumentTree {
                nodes,
                body,
                next_key: 2,
            }),
        }
    }

    /// The `body` element handle.
    pub fn body(&self) -> NodeKey {
        self.inner.borrow().body
    }

    /// Append a new element with the given tag as the last child of `parent`.
    pub fn append_element(&self, parent: NodeKey, tag: &str) -> NodeKey {
        let mut tree = self.inner.borrow_mut();
        let key = tree.mint_key();
        tree.nodes.insert(
            key,
            NodeData {
                tag: tag.to_ascii_lowercase(),
                parent: Some(parent),
                ..NodeData::default()
            },
        );
        if let Some(parent_data) = tree.nodes.get_mut(&parent) {
            parent_data.children.push(key);
        }
        key
    }

    /// Add a CSS class to an element.
    pub fn add_class(&self, node: NodeKey, class: &str) {
        if let Some(data) = self.inner.borrow_mut().nodes.get_mut(&node) {
            data.classes.push(class.to_owned());
        }
    }

    /// Set an element's id.
    pub fn set_element_id(&self, node: NodeKey, element_id: &str) {
        if let Some(data) = self.inner.borrow_mut().nodes.get_mut(&node) {
            data.element_id = Some(element_id.to_owned());
        }
    }

    /// Set the authored (cascade) font size of an element, in px.
    pub fn set_authored_font_size(&self, node: NodeKey, px: f32) {
        if let Some(data) = self.inner.borrow_mut().nodes.get_mut(&node) {
            data.authored_font_size = Some(px);
        }
    }

    /// Toggle whether the node generates a layout box. Descendants of a
    /// hidden node report hidden as well, like a collapsed ancestor chain.
    pub fn set_hidden(&self, node: NodeKey, hidden: bool) {
        if let Some(data) = self.inner.borrow_mut().nodes.get_mut(&node) {
            data.hidden = hidden;
        }
    }

    /// The inline font-size override currently on the node, if any.
    pub fn inline_font_size(&self, node: NodeKey) -> Option<f32> {
        self.inner
            .borrow()
            .nodes
            .get(&node)
            .and_then(|data| data.inline_font_size)
    }

    /// An attribute value recorded from a markup fragment (other than
    /// id/class).
    pub fn attr(&self, node: NodeKey, name: &str) -> Option<String> {
        self.inner.borrow().nodes.get(&node).and_then(|data| {
            data.attrs
                .iter()
                .find(|(attr_name, _)| attr_name == name)
                .map(|(_, value)| value.clone())
        })
    }

    /// An element's tag name.
    pub fn tag(&self, node: NodeKey) -> Option<String> {
        self.inner
            .borrow()
            .nodes
            .get(&node)
            .map(|data| data.tag.clone())
    }
}

impl DocumentTree {
    fn mint_key(&mut self) -> NodeKey {
        let key = NodeKey(self.next_key);
        self.next_key += 1;
        key
    }

    fn insert_fragment(
        &mut self,
        parent: NodeKey,
        fragment: FragmentElement,
        at_front: bool,
    ) -> NodeKey {
        let key = self.mint_key();
        self.nodes.insert(
            key,
            NodeData {
                tag: fragment.tag,
                element_id: fragment.element_id,
                classes: fragment.classes,
                attrs: fragment.attrs,
                parent: Some(parent),
                ..NodeData::default()
            },
        );
        if let Some(parent_data) = self.nodes.get_mut(&parent) {
            if at_front {
                parent_data.children.insert(0, key);
            } else {
                parent_data.children.push(key);
            }
        }
        key
    }

    /// Preorder document-order traversal starting at (and including) `body`.
    fn document_order(&self) -> Vec<NodeKey> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![self.body];
        while let Some(node) = stack.pop() {
            order.push(node);
            if let Some(data) = self.nodes.get(&node) {
                for &child in data.children.iter().rev() {
                    stack.push(child);
                }
            }
        }
        order
    }

    fn resolved_font_size(&self, node: NodeKey) -> Option<f32> {
        self.nodes.get(&node)?;
        let mut cursor = Some(node);
        while let Some(key) = cursor {
            let data = self.nodes.get(&key)?;
            if let Some(px) = data.inline_font_size.or(data.authored_font_size) {
                return Some(px);
            }
            cursor = data.parent;
        }
        Some(ROOT_FONT_SIZE_PX)
    }

    fn matches_compound(&self, node: NodeKey, compound: &Compound) -> bool {
        let Some(data) = self.nodes.get(&node) else {
            return false;
        };
        if compound.universal {
            return true;
        }
        if let Some(tag) = &compound.tag {
            if !data.tag.eq_ignore_ascii_case(tag) {
                return false;
            }
        }
        if let Some(element_id) = &compound.element_id {
            let matches = data
                .element_id
                .as_deref()
                .is_some_and(|value| value == element_id);
            if !matches {
                return false;
            }
        }
        compound
            .classes
            .iter()
            .all(|class| data.classes.iter().any(|value| value == class))
    }

    /// Match `node` against a complex selector: rightmost part against the
    /// node itself, then walk ancestors leftward. Each part carries the
    /// combinator linking it to the part on its right, which is exactly the
    /// relationship tested when that part is reached.
    fn matches_selector(&self, node: NodeKey, selector: &Selector) -> bool {
        let Some(rightmost) = selector.parts.last() else {
            return false;
        };
        if !self.matches_compound(node, &rightmost.compound) {
            return false;
        }
        let mut current = node;
        for part in selector.parts.iter().rev().skip(1) {
            match part.combinator_to_next.unwrap_or(Combinator::Descendant) {
                Combinator::Child => {
                    let Some(parent) = self.parent_of(current) else {
                        return false;
                    };
                    if !self.matches_compound(parent, &part.compound) {
                        return false;
                    }
                    current = parent;
                }
                Combinator::Descendant => {
                    let mut climb = self.parent_of(current);
                    loop {
                        let Some(ancestor) = climb else {
                            return false;
                        };
                        if self.matches_compound(ancestor, &part.compound) {
                            current = ancestor;
                            break;
                        }
                        climb = self.parent_of(ancestor);
                    }
                }
            }
        }
        true
    }

    fn parent_of(&self, node: NodeKey) -> Option<NodeKey> {
        self.nodes.get(&node).and_then(|data| data.parent)
    }
}

struct FragmentElement {
    tag: String,
    element_id: Option<String>,
    classes: Vec<String>,
    attrs: SmallVec<[(String, String); 4]>,
}

/// Read the first element (tag + attributes) of a markup fragment. Nested
/// content is ignored; the insertion APIs only place the fragment's outermost
/// element, which is all the probe-marker and placeholder config uses.
fn parse_fragment(markup: &str) -> Result<FragmentElement> {
    let mut reader = Reader::from_str(markup);
    loop {
        match reader.read_event() {
            Ok(Event::Start(element) | Event::Empty(element)) => {
                return Ok(fragment_from_start(&element));
            }
            Ok(Event::Eof) => bail!("markup fragment contains no element: {markup:?}"),
            Ok(_) => {}
            Err(error) => bail!("unreadable markup fragment {markup:?}: {error}"),
        }
    }
}

fn fragment_from_start(element: &BytesStart<'_>) -> FragmentElement {
    let tag = String::from_utf8_lossy(element.name().as_ref()).to_ascii_lowercase();
    let mut fragment = FragmentElement {
        tag,
        element_id: None,
        classes: Vec::new(),
        attrs: SmallVec::new(),
    };
    // Malformed attributes are skipped rather than rejected.
    for attr in element.attributes().flatten() {
        let name = String::from_utf8_lossy(attr.key.as_ref()).to_ascii_lowercase();
        let Ok(value) = attr.unescape_value() else {
            continue;
        };
        match name.as_str() {
            "class" => {
                fragment.classes = value
                    .split_whitespace()
                    .map(str::to_owned)
                    .collect();
            }
            "id" => fragment.element_id = Some(value.into_owned()),
            _ => fragment.attrs.push((name, value.into_owned())),
        }
    }
    fragment
}

impl Document for MemoryDocument {
    fn append_body_fragment(&self, markup: &str) -> Result<NodeKey> {
        let fragment = parse_fragment(markup)?;
        let mut tree = self.inner.borrow_mut();
        let body = tree.body;
        Ok(tree.insert_fragment(body, fragment, false))
    }

    fn prepend_fragment(&self, parent: NodeKey, markup: &str) -> Result<NodeKey> {
        let fragment = parse_fragment(markup)?;
        let mut tree = self.inner.borrow_mut();
        if !tree.nodes.contains_key(&parent) {
            bail!("unknown parent node {parent:?}");
        }
        Ok(tree.insert_fragment(parent, fragment, true))
    }

    fn child_nodes(&self, node: NodeKey) -> Vec<NodeKey> {
        self.inner
            .borrow()
            .nodes
            .get(&node)
            .map(|data| data.children.clone())
            .unwrap_or_default()
    }

    fn is_hidden(&self, node: NodeKey) -> bool {
        let tree = self.inner.borrow();
        if !tree.nodes.contains_key(&node) {
            return true;
        }
        let mut cursor = Some(node);
        while let Some(key) = cursor {
            let Some(data) = tree.nodes.get(&key) else {
                return true;
            };
            if data.hidden {
                return true;
            }
            cursor = data.parent;
        }
        false
    }

    fn query_selector_all(&self, selector: &str) -> Vec<NodeKey> {
        let selectors = parse_selector_list(selector);
        if selectors.is_empty() {
            debug!("selector list matched nothing parseable: {selector:?}");
            return Vec::new();
        }
        let tree = self.inner.borrow();
        tree.document_order()
            .into_iter()
            .filter(|&node| {
                selectors
                    .iter()
                    .any(|parsed| tree.matches_selector(node, parsed))
            })
            .collect()
    }

    fn computed_font_size(&self, node: NodeKey) -> Option<f32> {
        self.inner.borrow().resolved_font_size(node)
    }

    fn set_inline_font_size(&self, node: NodeKey, px: f32) {
        if let Some(data) = self.inner.borrow_mut().nodes.get_mut(&node) {
            data.inline_font_size = Some(px);
        }
    }

    fn clear_inline_font_size(&self, node: NodeKey) {
        if let Some(data) = self.inner.borrow_mut().nodes.get_mut(&node) {
            data.inline_font_size = None;
        }
    }
}
