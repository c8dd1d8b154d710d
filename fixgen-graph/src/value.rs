//! Argument values.

use serde::{Deserialize, Serialize};

use crate::{NodeId, Symbol};

/// A single argument of a node.
///
/// Containers own their elements; other nodes are referenced by id, so the
/// same child may appear in several places.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Value {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),
    /// A reference to an importable name, e.g. an activation function.
    Symbol(Symbol),
    List(Vec<Value>),
    Tuple(Vec<Value>),
    /// Key/value pairs in insertion order.
    Dict(Vec<(Value, Value)>),
    Node(NodeId),
    /// A host object with no textual representation.
    Opaque { type_name: String },
}

impl Value {
    /// Short description used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::None => "none",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::Bytes(_) => "bytes",
            Value::Symbol(_) => "symbol",
            Value::List(_) => "list",
            Value::Tuple(_) => "tuple",
            Value::Dict(_) => "dict",
            Value::Node(_) => "node",
            Value::Opaque { .. } => "opaque",
        }
    }

    /// Returns the referenced node if this value is a direct node reference.
    pub fn as_node(&self) -> Option<NodeId> {
        match self {
            Value::Node(id) => Some(*id),
            _ => None,
        }
    }

    /// Returns true for lists, tuples and dicts.
    pub fn is_container(&self) -> bool {
        matches!(self, Value::List(_) | Value::Tuple(_) | Value::Dict(_))
    }

    /// Collect every node referenced anywhere inside this value, in
    /// left-to-right order and with multiplicity.
    pub fn node_refs(&self) -> Vec<NodeId> {
        let mut refs = Vec::new();
        let mut stack = vec![self];
        while let Some(value) = stack.pop() {
            match value {
                Value::Node(id) => refs.push(*id),
                Value::List(items) | Value::Tuple(items) => stack.extend(items.iter().rev()),
                Value::Dict(entries) => {
                    for (key, item) in entries.iter().rev() {
                        stack.push(item);
                        stack.push(key);
                    }
                }
                _ => {}
            }
        }
        refs
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v.into())
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<NodeId> for Value {
    fn from(id: NodeId) -> Self {
        Value::Node(id)
    }
}

impl From<Symbol> for Value {
    fn from(sym: Symbol) -> Self {
        Value::Symbol(sym)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}
