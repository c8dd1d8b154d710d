//! Python source generation.
//!
//! - [`CodeBuilder`] - line-oriented buffer with indentation tracking
//! - [`ImportCollector`] - module aliases and import statements
//! - [`PythonRenderer`] - renders a compiled [`Program`](crate::program::Program)
//! - [`literal`] - Python `repr`-compatible literal formatting

mod code_builder;
mod imports;
pub mod literal;
mod python;

pub use code_builder::CodeBuilder;
pub use imports::ImportCollector;
pub use python::PythonRenderer;
