//! Code builder utility for generating properly indented code.

/// Line buffer that tracks the indentation level.
///
/// # Example
///
/// ```
/// use fixgen_codegen::generation::CodeBuilder;
///
/// let mut code = CodeBuilder::new(4);
/// code.push_line("def config_fixture():")
///     .push_indent()
///     .push_line("return 1")
///     .push_dedent();
///
/// assert_eq!(code.build(), "def config_fixture():\n    return 1\n");
/// ```
#[derive(Debug, Clone)]
pub struct CodeBuilder {
    indent_level: usize,
    indent_unit: String,
    buffer: String,
}

impl CodeBuilder {
    /// Create a builder that indents with `width` spaces per level.
    pub fn new(width: usize) -> Self {
        Self {
            indent_level: 0,
            indent_unit: " ".repeat(width),
            buffer: String::new(),
        }
    }

    /// Add a line of code at the current indentation.
    pub fn push_line(&mut self, s: &str) -> &mut Self {
        for _ in 0..self.indent_level {
            self.buffer.push_str(&self.indent_unit);
        }
        self.buffer.push_str(s);
        self.buffer.push('\n');
        self
    }

    /// Add a blank line. Never indented.
    pub fn push_blank(&mut self) -> &mut Self {
        self.buffer.push('\n');
        self
    }

    pub fn push_indent(&mut self) -> &mut Self {
        self.indent_level += 1;
        self
    }

    /// Decrease indentation level, stopping at zero.
    pub fn push_dedent(&mut self) -> &mut Self {
        self.indent_level = self.indent_level.saturating_sub(1);
        self
    }

    /// Consume the builder and return the generated code.
    pub fn build(self) -> String {
        self.buffer
    }
}
