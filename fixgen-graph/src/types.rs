//! Core type definitions.

use serde::{Deserialize, Serialize};

/// How a node behaves when the generated fixture is executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// Calls the target immediately with its resolved arguments.
    Config,
    /// Produces a partially applied callable of the target.
    Partial,
    /// Builds a fresh value at every use site. Never shared.
    ArgFactory,
}

impl NodeKind {
    /// Get the lowercase string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Config => "config",
            NodeKind::Partial => "partial",
            NodeKind::ArgFactory => "arg_factory",
        }
    }

    /// Returns true for nodes that must be rebuilt at every occurrence.
    pub fn is_fresh(&self) -> bool {
        matches!(self, NodeKind::ArgFactory)
    }

    /// Returns true for nodes whose direct arguments may be per-call-fresh.
    pub fn accepts_factories(&self) -> bool {
        matches!(self, NodeKind::Partial | NodeKind::ArgFactory)
    }
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An importable name: a callable, a type, or a tag.
///
/// `module` is the dotted module path. Names from `builtins` need no import.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Symbol {
    pub module: String,
    pub name: String,
}

impl Symbol {
    pub const BUILTINS: &'static str = "builtins";

    pub fn new(module: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            name: name.into(),
        }
    }

    /// Split a qualified path such as `models.layers.Dense` at its last dot.
    ///
    /// A path without a dot names a builtin.
    pub fn parse(path: &str) -> Self {
        match path.rsplit_once('.') {
            Some((module, name)) => Self::new(module, name),
            None => Self::new(Self::BUILTINS, path),
        }
    }

    /// Returns true if the symbol is available without an import.
    pub fn is_builtin(&self) -> bool {
        self.module == Self::BUILTINS
    }
}

impl From<&str> for Symbol {
    fn from(path: &str) -> Self {
        Self::parse(path)
    }
}

impl std::fmt::Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_builtin() {
            f.write_str(&self.name)
        } else {
            write!(f, "{}.{}", self.module, self.name)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_kind_as_str() {
        assert_eq!(NodeKind::Config.as_str(), "config");
        assert_eq!(NodeKind::Partial.as_str(), "partial");
        assert_eq!(NodeKind::ArgFactory.as_str(), "arg_factory");
    }

    #[test]
    fn test_node_kind_freshness() {
        assert!(NodeKind::ArgFactory.is_fresh());
        assert!(!NodeKind::Config.is_fresh());
        assert!(!NodeKind::Partial.is_fresh());
        assert!(!NodeKind::Config.accepts_factories());
    }

    #[test]
    fn test_symbol_parse() {
        let sym = Symbol::parse("models.layers.Dense");
        assert_eq!(sym.module, "models.layers");
        assert_eq!(sym.name, "Dense");
        assert_eq!(sym.to_string(), "models.layers.Dense");
    }

    #[test]
    fn test_symbol_builtin() {
        let sym = Symbol::parse("dict");
        assert!(sym.is_builtin());
        assert_eq!(sym.to_string(), "dict");
    }
}
