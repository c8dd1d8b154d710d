//! Graph nodes and their fields.

use std::collections::BTreeSet;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::{NodeId, NodeKind, Symbol, Value};

/// One named parameter of a node.
///
/// A field may carry tags without a value; such a field cannot be emitted
/// and is rejected by validation.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Field {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub tags: BTreeSet<Symbol>,
}

impl Field {
    pub fn new(value: impl Into<Value>) -> Self {
        Self {
            value: Some(value.into()),
            tags: BTreeSet::new(),
        }
    }

    /// Returns true if the field has tags but nothing to tag.
    pub fn is_dangling_tag(&self) -> bool {
        self.value.is_none() && !self.tags.is_empty()
    }
}

/// A deferred construction step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub kind: NodeKind,
    pub target: Symbol,
    #[serde(default)]
    pub fields: IndexMap<String, Field>,
}

impl Node {
    pub fn new(kind: NodeKind, target: impl Into<Symbol>) -> Self {
        Self {
            kind,
            target: target.into(),
            fields: IndexMap::new(),
        }
    }

    /// An eager node.
    pub fn config(target: impl Into<Symbol>) -> Self {
        Self::new(NodeKind::Config, target)
    }

    /// A deferred-partial node.
    pub fn partial(target: impl Into<Symbol>) -> Self {
        Self::new(NodeKind::Partial, target)
    }

    /// A per-call-fresh node.
    pub fn arg_factory(target: impl Into<Symbol>) -> Self {
        Self::new(NodeKind::ArgFactory, target)
    }

    /// Set a field's value, keeping any tags already attached to it.
    pub fn with_arg(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set_arg(name, value);
        self
    }

    /// Attach a tag to a field, creating the field without a value if needed.
    pub fn with_tag(mut self, name: impl Into<String>, tag: impl Into<Symbol>) -> Self {
        self.fields
            .entry(name.into())
            .or_default()
            .tags
            .insert(tag.into());
        self
    }

    pub fn set_arg(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.fields.entry(name.into()).or_default().value = Some(value.into());
    }

    /// Get the value of a field.
    pub fn arg(&self, name: &str) -> Option<&Value> {
        self.fields.get(name).and_then(|f| f.value.as_ref())
    }

    /// Fields that carry a value, in declaration order.
    pub fn args(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields
            .iter()
            .filter_map(|(name, field)| field.value.as_ref().map(|v| (name.as_str(), v)))
    }

    /// Every child reference in field order, with multiplicity.
    pub fn references(&self) -> Vec<NodeId> {
        self.args().flat_map(|(_, value)| value.node_refs()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_tag_then_arg() {
        let node = Node::config("m.Foo")
            .with_tag("a", "m.ATag")
            .with_arg("a", 1);
        let field = &node.fields["a"];
        assert_eq!(field.value, Some(Value::Int(1)));
        assert_eq!(field.tags.len(), 1);
        assert!(!field.is_dangling_tag());
    }

    #[test]
    fn test_dangling_tag() {
        let node = Node::config("m.Foo").with_tag("a", "m.ATag");
        assert!(node.fields["a"].is_dangling_tag());
        assert!(node.args().next().is_none());
    }

    #[test]
    fn test_references_follow_field_order() {
        let node = Node::config("m.Foo")
            .with_arg("b", NodeId(1))
            .with_arg("a", Value::List(vec![NodeId(0).into(), NodeId(1).into()]));
        assert_eq!(node.references(), vec![NodeId(1), NodeId(0), NodeId(1)]);
    }
}
