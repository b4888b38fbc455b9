//! Node classification.
//!
//! Every node is resolved once to a [`NodeKind`] and the extractor dispatches
//! on the variant.

use crate::config::Vocabulary;
use crate::tree::{ContentTree, NodeId};

/// What a node means to the extractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// A named field whose value is part of the payload.
    Value,
    /// Receives the canonical payload.
    PayloadSlot,
    /// Receives the signature.
    SignatureSlot,
    /// Anything else; its children are walked.
    Container,
}

/// Resolves nodes to kinds.
pub trait Classify {
    fn classify(&self, tree: &dyn ContentTree, node: NodeId) -> NodeKind;
}

/// Classifies by class membership. Value wins over payload, payload over
/// signature, when a node carries several markers.
#[derive(Debug, Clone)]
pub struct ClassClassifier {
    value_class: String,
    payload_class: String,
    signature_class: String,
}

impl ClassClassifier {
    pub fn new(vocabulary: &Vocabulary) -> Self {
        Self {
            value_class: vocabulary.value_class.clone(),
            payload_class: vocabulary.payload_class.clone(),
            signature_class: vocabulary.signature_class.clone(),
        }
    }
}

impl Classify for ClassClassifier {
    fn classify(&self, tree: &dyn ContentTree, node: NodeId) -> NodeKind {
        if tree.has_class(node, &self.value_class) {
            NodeKind::Value
        } else if tree.has_class(node, &self.payload_class) {
            NodeKind::PayloadSlot
        } else if tree.has_class(node, &self.signature_class) {
            NodeKind::SignatureSlot
        } else {
            NodeKind::Container
        }
    }
}

impl<F> Classify for F
where
    F: Fn(&dyn ContentTree, NodeId) -> NodeKind,
{
    fn classify(&self, tree: &dyn ContentTree, node: NodeId) -> NodeKind {
        self(tree, node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Document, Element};

    #[test]
    fn test_class_classifier() {
        let doc = Document::new(
            Element::new("form")
                .with_child(Element::new("input").with_class("pearid-value"))
                .with_child(Element::new("input").with_class("pearid-payload"))
                .with_child(Element::new("input").with_class("pearid-signature"))
                .with_child(Element::new("p"))
                .with_child(
                    Element::new("input")
                        .with_class("pearid-signature")
                        .with_class("pearid-value"),
                ),
        );
        let classifier = ClassClassifier::new(&Vocabulary::with_prefix("pearid"));
        let kinds: Vec<NodeKind> = doc
            .children(doc.root())
            .into_iter()
            .map(|n| classifier.classify(&doc, n))
            .collect();
        assert_eq!(
            kinds,
            vec![
                NodeKind::Value,
                NodeKind::PayloadSlot,
                NodeKind::SignatureSlot,
                NodeKind::Container,
                NodeKind::Value,
            ]
        );
    }

    #[test]
    fn test_closure_classifier() {
        let doc = Document::new(Element::new("input").with_attr("name", "uuid"));
        let by_name = |tree: &dyn ContentTree, node: NodeId| {
            if tree.attribute(node, "name").is_some() {
                NodeKind::Value
            } else {
                NodeKind::Container
            }
        };
        assert_eq!(by_name.classify(&doc, doc.root()), NodeKind::Value);
    }
}
