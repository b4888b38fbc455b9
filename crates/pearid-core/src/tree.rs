//! Content-tree contract.
//!
//! The protocol never owns the document. A host (a browser DOM bridge, the
//! in-memory [`Document`](crate::document::Document), …) implements
//! [`ContentTree`] and the core drives it through node handles.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque handle to a node of a content tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Operations the protocol needs from a host document.
///
/// All enumerations are in document (pre-order) order.
pub trait ContentTree {
    /// Element carrying the given `id`, if any.
    fn element_by_id(&self, id: &str) -> Option<NodeId>;

    /// Every element carrying `class`.
    fn elements_by_class(&self, class: &str) -> Vec<NodeId>;

    /// Direct children of `node`.
    fn children(&self, node: NodeId) -> Vec<NodeId>;

    /// Whether `node` carries `class`.
    fn has_class(&self, node: NodeId, class: &str) -> bool;

    /// Swap `old` for `new` in the class list. Returns false when `old`
    /// was not present (the node is left untouched).
    fn replace_class(&mut self, node: NodeId, old: &str, new: &str) -> bool;

    /// Add `class` to the class list if absent.
    fn add_class(&mut self, node: NodeId, class: &str);

    /// Attribute value, `None` when the attribute is absent.
    fn attribute(&self, node: NodeId, name: &str) -> Option<String>;

    /// Set an attribute.
    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str);

    /// Displayed text of `node`.
    fn text(&self, node: NodeId) -> String;

    /// Replace the displayed text of `node`.
    fn set_text(&mut self, node: NodeId, text: &str);
}
