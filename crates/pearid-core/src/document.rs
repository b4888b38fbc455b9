//! In-memory content tree.
//!
//! [`Element`] is the nested, serde-friendly shape used for JSON documents
//! and for building trees in code. [`Document`] flattens it into a pre-order
//! arena so that [`NodeId`]s are stable indices and document order is index
//! order.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::tree::{ContentTree, NodeId};

fn default_tag() -> String {
    "div".to_string()
}

/// A nested element, as read from or written to JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Element {
    #[serde(default = "default_tag")]
    pub tag: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub classes: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Element>,
}

impl Default for Element {
    fn default() -> Self {
        Self::new(default_tag())
    }
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            id: None,
            classes: Vec::new(),
            attributes: BTreeMap::new(),
            text: String::new(),
            children: Vec::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.classes.push(class.into());
        self
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_children(mut self, children: impl IntoIterator<Item = Element>) -> Self {
        self.children.extend(children);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Node {
    tag: String,
    id: Option<String>,
    classes: Vec<String>,
    attributes: BTreeMap<String, String>,
    text: String,
    children: Vec<NodeId>,
}

/// Arena-backed document implementing [`ContentTree`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Element", into = "Element")]
pub struct Document {
    nodes: Vec<Node>,
}

impl Document {
    /// Flatten an element tree.
    pub fn new(root: Element) -> Self {
        let mut nodes = Vec::new();
        flatten(root, &mut nodes);
        Self { nodes }
    }

    /// Parse a JSON element tree.
    pub fn from_json(json: &str) -> Result<Self> {
        let root: Element = serde_json::from_str(json)?;
        Ok(Self::new(root))
    }

    /// Serialize back to a pretty-printed JSON element tree.
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.to_element())?)
    }

    /// Root node.
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Tag name of a node.
    pub fn tag(&self, node: NodeId) -> Option<&str> {
        self.nodes.get(node.0).map(|n| n.tag.as_str())
    }

    /// Rebuild the nested form.
    pub fn to_element(&self) -> Element {
        if self.nodes.is_empty() {
            return Element::default();
        }
        self.build(NodeId(0))
    }

    fn build(&self, id: NodeId) -> Element {
        let node = &self.nodes[id.0];
        Element {
            tag: node.tag.clone(),
            id: node.id.clone(),
            classes: node.classes.clone(),
            attributes: node.attributes.clone(),
            text: node.text.clone(),
            children: node.children.iter().map(|c| self.build(*c)).collect(),
        }
    }
}

fn flatten(element: Element, nodes: &mut Vec<Node>) -> NodeId {
    let id = NodeId(nodes.len());
    nodes.push(Node {
        tag: element.tag,
        id: element.id,
        classes: element.classes,
        attributes: element.attributes,
        text: element.text,
        children: Vec::new(),
    });
    let children: Vec<NodeId> = element
        .children
        .into_iter()
        .map(|child| flatten(child, nodes))
        .collect();
    nodes[id.0].children = children;
    id
}

impl From<Element> for Document {
    fn from(root: Element) -> Self {
        Self::new(root)
    }
}

impl From<Document> for Element {
    fn from(doc: Document) -> Self {
        doc.to_element()
    }
}

impl ContentTree for Document {
    fn element_by_id(&self, id: &str) -> Option<NodeId> {
        self.nodes
            .iter()
            .position(|n| n.id.as_deref() == Some(id))
            .map(NodeId)
    }

    fn elements_by_class(&self, class: &str) -> Vec<NodeId> {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.classes.iter().any(|c| c == class))
            .map(|(i, _)| NodeId(i))
            .collect()
    }

    fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.nodes
            .get(node.0)
            .map(|n| n.children.clone())
            .unwrap_or_default()
    }

    fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.nodes
            .get(node.0)
            .is_some_and(|n| n.classes.iter().any(|c| c == class))
    }

    fn replace_class(&mut self, node: NodeId, old: &str, new: &str) -> bool {
        let Some(n) = self.nodes.get_mut(node.0) else {
            return false;
        };
        match n.classes.iter().position(|c| c == old) {
            Some(pos) => {
                n.classes[pos] = new.to_string();
                true
            }
            None => false,
        }
    }

    fn add_class(&mut self, node: NodeId, class: &str) {
        if let Some(n) = self.nodes.get_mut(node.0) {
            if !n.classes.iter().any(|c| c == class) {
                n.classes.push(class.to_string());
            }
        }
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        self.nodes
            .get(node.0)
            .and_then(|n| n.attributes.get(name).cloned())
    }

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) {
        if let Some(n) = self.nodes.get_mut(node.0) {
            n.attributes.insert(name.to_string(), value.to_string());
        }
    }

    fn text(&self, node: NodeId) -> String {
        self.nodes
            .get(node.0)
            .map(|n| n.text.clone())
            .unwrap_or_default()
    }

    fn set_text(&mut self, node: NodeId, text: &str) {
        if let Some(n) = self.nodes.get_mut(node.0) {
            n.text = text.to_string();
        }
    }
}
