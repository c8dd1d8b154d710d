//! Lowered form of a compiled fixture.
//!
//! A [`Program`] is what the renderer prints and what the replay interpreter
//! executes. It holds no reference to the input graph.

mod lower;

use fixgen_graph::{NodeId, NodeKind, Symbol};
use serde::Serialize;

pub use lower::lower;

use crate::generation::ImportCollector;

/// Index into a unit's expression arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ExprId(pub u32);

impl ExprId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// An importable name together with how it is spelled in generated code.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SymbolRef {
    pub symbol: Symbol,
    pub rendered: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Arg {
    pub name: String,
    pub value: ExprId,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Expr {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),
    Symbol(SymbolRef),
    List(Vec<ExprId>),
    Tuple(Vec<ExprId>),
    Dict(Vec<(ExprId, ExprId)>),
    /// Builds one graph node.
    Construct {
        node: NodeId,
        kind: NodeKind,
        target: SymbolRef,
        args: Vec<Arg>,
    },
    /// A value wrapped in tags, outermost first.
    Tagged { tags: Vec<SymbolRef>, value: ExprId },
    /// A declared variable or a parameter.
    Var(String),
    /// Invocation of another unit.
    Call {
        unit: usize,
        args: Vec<(String, ExprId)>,
    },
}

/// A formal parameter bound to the node the caller passes in.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Param {
    pub name: String,
    pub node: NodeId,
}

/// `name = value` inside a unit body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Decl {
    pub name: String,
    pub node: NodeId,
    pub value: ExprId,
}

/// One emitted function.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Unit {
    pub name: String,
    pub root: NodeId,
    pub params: Vec<Param>,
    pub decls: Vec<Decl>,
    pub output: ExprId,
    pub exprs: Vec<Expr>,
}

impl Unit {
    pub fn expr(&self, id: ExprId) -> &Expr {
        &self.exprs[id.index()]
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Program {
    pub imports: ImportCollector,
    /// Indexed by unit number: default unit first, then sub-fixtures.
    pub units: Vec<Unit>,
    /// Definition order of `units`, callees first.
    pub order: Vec<usize>,
}

impl Program {
    /// Get a unit by function name.
    pub fn unit(&self, name: &str) -> Option<&Unit> {
        self.units.iter().find(|u| u.name == name)
    }

    pub fn default_unit(&self) -> &Unit {
        &self.units[0]
    }

    /// Units in the order they are defined in the module.
    pub fn emitted_units(&self) -> impl Iterator<Item = &Unit> {
        self.order.iter().filter_map(|&i| self.units.get(i))
    }

    pub fn variable_count(&self) -> usize {
        self.units.iter().map(|u| u.decls.len()).sum()
    }
}
