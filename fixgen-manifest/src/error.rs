use std::{ops::Range, path::PathBuf};

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// Result type for manifest operations (boxed to reduce size on stack)
pub type Result<T> = std::result::Result<T, Box<Error>>;

/// Source context for error reporting.
///
/// Carries the manifest text and filename so every error can point back
/// into the file.
#[derive(Debug, Clone)]
pub struct SourceContext {
    src: String,
    filename: String,
}

impl SourceContext {
    pub fn new(src: impl Into<String>, filename: impl Into<String>) -> Self {
        Self {
            src: src.into(),
            filename: filename.into(),
        }
    }

    pub fn src(&self) -> &str {
        &self.src
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Create a NamedSource for miette error reporting.
    pub fn named_source(&self) -> NamedSource<String> {
        NamedSource::new(&self.filename, self.src.clone())
    }

    pub fn parse_error(&self, source: toml::de::Error) -> Box<Error> {
        let span = source.span().map(SourceSpan::from);
        Box::new(Error::Parse {
            src: self.named_source(),
            span,
            source,
        })
    }

    pub fn unknown_root(&self, root: &str, span: Range<usize>) -> Box<Error> {
        Box::new(Error::UnknownRoot {
            src: self.named_source(),
            span: span.into(),
            root: root.to_string(),
        })
    }

    pub fn unknown_reference(&self, node: &str, target: &str, span: Range<usize>) -> Box<Error> {
        Box::new(Error::UnknownReference {
            src: self.named_source(),
            span: span.into(),
            node: node.to_string(),
            target: target.to_string(),
        })
    }

    pub fn unknown_kind(&self, kind: &str, span: Range<usize>) -> Box<Error> {
        Box::new(Error::UnknownKind {
            src: self.named_source(),
            span: span.into(),
            kind: kind.to_string(),
        })
    }

    pub fn cycle(&self, path: &[&str]) -> Box<Error> {
        let first = path.first().copied().unwrap_or_default();
        Box::new(Error::Cycle {
            src: self.named_source(),
            span: find_node_span(&self.src, first),
            path: path.join(" -> "),
        })
    }

    pub fn malformed_value(
        &self,
        message: impl Into<String>,
        span: Range<usize>,
    ) -> Box<Error> {
        Box::new(Error::MalformedValue {
            src: self.named_source(),
            span: span.into(),
            message: message.into(),
        })
    }

    pub fn unknown_sub_fixture_node(
        &self,
        name: &str,
        target: &str,
        span: Range<usize>,
    ) -> Box<Error> {
        Box::new(Error::UnknownSubFixtureNode {
            src: self.named_source(),
            span: span.into(),
            name: name.to_string(),
            target: target.to_string(),
        })
    }

    pub fn validation_error(&self, message: impl Into<String>) -> Box<Error> {
        Box::new(Error::Validation {
            src: self.named_source(),
            span: None,
            message: message.into(),
        })
    }
}

/// Span of the `[nodes.<key>]` header, or of the first mention of `key`.
pub(crate) fn find_node_span(src: &str, key: &str) -> Option<SourceSpan> {
    let header = format!("[nodes.{}]", key);
    if let Some(pos) = src.find(&header) {
        return Some(SourceSpan::from((pos + "[nodes.".len(), key.len())));
    }
    let dotted = format!("nodes.{}.", key);
    if let Some(pos) = src.find(&dotted) {
        return Some(SourceSpan::from((pos + "nodes.".len(), key.len())));
    }
    src.find(key).map(|pos| SourceSpan::from((pos, key.len())))
}

#[derive(Debug, Error, Diagnostic)]
pub enum Error {
    #[error("failed to read '{path}'")]
    #[diagnostic(help("pass the manifest with -c/--config"))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse fixture.toml")]
    #[diagnostic(code(fixgen::parse_error))]
    Parse {
        #[source_code]
        src: NamedSource<String>,
        #[label("parse error here")]
        span: Option<SourceSpan>,
        #[source]
        source: toml::de::Error,
    },

    #[error("root node '{root}' is not defined")]
    #[diagnostic(
        code(fixgen::unknown_root),
        help("add a [nodes.{root}] table or point fixture.root at an existing node")
    )]
    UnknownRoot {
        #[source_code]
        src: NamedSource<String>,
        #[label("no such node")]
        span: SourceSpan,
        root: String,
    },

    #[error("node '{node}' references '{target}', which is not defined")]
    #[diagnostic(code(fixgen::unknown_reference))]
    UnknownReference {
        #[source_code]
        src: NamedSource<String>,
        #[label("unknown node")]
        span: SourceSpan,
        node: String,
        target: String,
    },

    #[error("unknown node kind '{kind}'")]
    #[diagnostic(
        code(fixgen::unknown_kind),
        help("valid kinds are: config, partial, arg_factory")
    )]
    UnknownKind {
        #[source_code]
        src: NamedSource<String>,
        #[label("unknown kind")]
        span: SourceSpan,
        kind: String,
    },

    #[error("nodes reference each other in a cycle: {path}")]
    #[diagnostic(
        code(fixgen::cycle),
        help("a node can only be built from nodes that do not depend on it")
    )]
    Cycle {
        #[source_code]
        src: NamedSource<String>,
        #[label("cycle starts here")]
        span: Option<SourceSpan>,
        path: String,
    },

    #[error("{message}")]
    #[diagnostic(
        code(fixgen::malformed_value),
        help("special tables take exactly one of: ref, symbol, tuple, none, dict, bytes")
    )]
    MalformedValue {
        #[source_code]
        src: NamedSource<String>,
        #[label("{message}")]
        span: SourceSpan,
        message: String,
    },

    #[error("sub-fixture '{name}' names node '{target}', which is not defined")]
    #[diagnostic(code(fixgen::unknown_sub_fixture_node))]
    UnknownSubFixtureNode {
        #[source_code]
        src: NamedSource<String>,
        #[label("unknown node")]
        span: SourceSpan,
        name: String,
        target: String,
    },

    #[error("{message}")]
    #[diagnostic(code(fixgen::validation_error))]
    Validation {
        #[source_code]
        src: NamedSource<String>,
        #[label("{message}")]
        span: Option<SourceSpan>,
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_node_span_prefers_header() {
        let src = "root = \"model\"\n[nodes.model]\ntarget = \"m.M\"\n";
        let span = find_node_span(src, "model").unwrap();
        assert_eq!(&src[span.offset()..span.offset() + span.len()], "model");
        assert_eq!(span.offset(), src.find("[nodes.").unwrap() + 7);
    }

    #[test]
    fn test_find_node_span_dotted_key() {
        let src = "[fixture]\nroot = \"x\"\n[nodes.x.args]\n";
        let span = find_node_span(src, "x").unwrap();
        assert_eq!(span.offset(), src.find("nodes.x.").unwrap() + 6);
    }
}
