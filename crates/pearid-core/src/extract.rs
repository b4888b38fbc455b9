//! Assertion-region extraction and canonical payloads.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::classify::{ClassClassifier, Classify, NodeKind};
use crate::config::{ProtocolConfig, SlotTarget};
use crate::defaults::UUID_FIELD;
use crate::error::{Error, Result};
use crate::tree::{ContentTree, NodeId};

/// One named value of a region, in document order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldEntry {
    pub name: String,
    pub value: Option<String>,
}

impl FieldEntry {
    pub fn new(name: impl Into<String>, value: Option<String>) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// The exact text that is signed and verified: a JSON array of
/// `[name, value]` pairs.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalPayload(String);

impl CanonicalPayload {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for CanonicalPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CanonicalPayload {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Serialize fields in order. Absent values become `null`.
pub fn canonicalize(fields: &[FieldEntry]) -> Result<CanonicalPayload> {
    let pairs: Vec<(&str, Option<&str>)> = fields
        .iter()
        .map(|f| (f.name.as_str(), f.value.as_deref()))
        .collect();
    Ok(CanonicalPayload(serde_json::to_string(&pairs)?))
}

/// A validated view of one region. Computed fresh on every extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssertionRegion {
    pub root: NodeId,
    pub fields: Vec<FieldEntry>,
    pub value_nodes: Vec<NodeId>,
    pub payload_slot: Option<NodeId>,
    pub signature_slot: Option<NodeId>,
    pub payload: CanonicalPayload,
}

impl AssertionRegion {
    /// Value of the first `uuid` field.
    pub fn uuid(&self) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.name == UUID_FIELD)
            .and_then(|f| f.value.as_deref())
    }
}

/// Walks regions and builds their canonical payloads.
#[derive(Debug, Clone)]
pub struct PayloadExtractor<C = ClassClassifier> {
    classifier: C,
    region_class: String,
}

impl PayloadExtractor<ClassClassifier> {
    /// Extractor using the configured class vocabulary.
    pub fn from_config(config: &ProtocolConfig) -> Self {
        Self {
            classifier: ClassClassifier::new(&config.vocabulary),
            region_class: config.vocabulary.form_class.clone(),
        }
    }
}

impl<C: Classify> PayloadExtractor<C> {
    /// Extractor with an injected classifier.
    pub fn with_classifier(classifier: C, region_class: impl Into<String>) -> Self {
        Self {
            classifier,
            region_class: region_class.into(),
        }
    }

    /// Every region root in document order.
    pub fn region_roots(&self, tree: &dyn ContentTree) -> Vec<NodeId> {
        tree.elements_by_class(&self.region_class)
    }

    /// Extract one region rooted at `root`. The root itself is not
    /// classified; the walk starts at its children.
    pub fn extract(&self, tree: &dyn ContentTree, root: NodeId) -> Result<AssertionRegion> {
        let mut walk = Walk::default();
        for child in tree.children(root) {
            self.visit(tree, child, &mut walk);
        }

        if !walk.fields.iter().any(|f| f.name == UUID_FIELD) {
            return Err(Error::MissingUuid { region: root });
        }

        let payload = canonicalize(&walk.fields)?;
        Ok(AssertionRegion {
            root,
            fields: walk.fields,
            value_nodes: walk.value_nodes,
            payload_slot: walk.payload_slot,
            signature_slot: walk.signature_slot,
            payload,
        })
    }

    /// Extract every region. A failing region does not stop the others.
    pub fn extract_all(&self, tree: &dyn ContentTree) -> Vec<(NodeId, Result<AssertionRegion>)> {
        let roots = self.region_roots(tree);
        debug!(regions = roots.len(), "Extracting assertion regions");
        roots
            .into_iter()
            .map(|root| {
                let result = self.extract(tree, root);
                if let Err(e) = &result {
                    warn!(region = %root, error = %e, "Skipping invalid region");
                }
                (root, result)
            })
            .collect()
    }

    fn visit(&self, tree: &dyn ContentTree, node: NodeId, walk: &mut Walk) {
        match self.classifier.classify(tree, node) {
            NodeKind::Value => {
                let name = tree.attribute(node, "name").unwrap_or_default();
                let value = tree.attribute(node, "value");
                walk.fields.push(FieldEntry { name, value });
                walk.value_nodes.push(node);
            }
            NodeKind::PayloadSlot => walk.payload_slot = Some(node),
            NodeKind::SignatureSlot => walk.signature_slot = Some(node),
            NodeKind::Container => {
                for child in tree.children(node) {
                    self.visit(tree, child, walk);
                }
            }
        }
    }
}

#[derive(Default)]
struct Walk {
    fields: Vec<FieldEntry>,
    value_nodes: Vec<NodeId>,
    payload_slot: Option<NodeId>,
    signature_slot: Option<NodeId>,
}

/// Write `value` into a payload or signature slot.
pub fn write_slot(tree: &mut dyn ContentTree, node: NodeId, target: SlotTarget, value: &str) {
    match target {
        SlotTarget::Value => tree.set_attribute(node, "value", value),
        SlotTarget::Text => tree.set_text(node, value),
    }
}

/// Read a slot's current content. Empty slots read as `None`.
pub fn read_slot(tree: &dyn ContentTree, node: NodeId, target: SlotTarget) -> Option<String> {
    let raw = match target {
        SlotTarget::Value => tree.attribute(node, "value"),
        SlotTarget::Text => Some(tree.text(node)),
    };
    raw.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}
