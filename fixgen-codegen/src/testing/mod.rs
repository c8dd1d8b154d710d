//! Test utilities for the fixture compiler.
//!
//! This module is only available when the `testing` feature is enabled
//! or during tests.
//!
//! - [`replay`] - executes a compiled [`Program`] back into a graph
//! - [`python`] - runs the rendered module under `python3` against stubs
//! - [`fixtures`] - small graphs shaped like real model configs

pub mod fixtures;
pub mod python;
pub mod replay;

use std::{
    path::{Path, PathBuf},
    process::Command,
};

use eyre::{Result, eyre};
use fixgen_graph::{Graph, NodeId, dag_eq};

use crate::{CodegenOptions, pipeline::Pipeline, program::Program};

/// Compile and return both the lowered program and the rendered source.
pub fn compile_program(
    graph: &Graph,
    root: NodeId,
    options: CodegenOptions,
) -> Result<(Program, String)> {
    let mut ctx = Pipeline::new().run(graph, root, options)?;
    let source = ctx.take_output()?;
    let program = ctx
        .program
        .take()
        .ok_or_else(|| eyre!("pipeline finished without a program"))?;
    Ok((program, source))
}

/// Compile `graph`, run every unit and check each against the original.
///
/// The default unit must rebuild the whole graph; every sub-fixture, called
/// on its own, must rebuild its subgraph. Units run twice: through
/// [`replay`] over the lowered program, and as rendered source under
/// `python3` when an interpreter is available.
///
/// # Panics
///
/// Panics with the first mismatch or compile error.
pub fn assert_round_trip(graph: &Graph, root: NodeId, options: CodegenOptions) -> Program {
    let sub_fixtures = options.sub_fixtures.clone();
    let (program, source) = match compile_program(graph, root, options) {
        Ok(compiled) => compiled,
        Err(err) => panic!("compilation failed: {:?}", err),
    };
    let units: Vec<(&str, NodeId)> = std::iter::once((program.default_unit().name.as_str(), root))
        .chain(sub_fixtures.iter().map(|(name, id)| (name.as_str(), *id)))
        .collect();
    let executed = python::available();

    for (i, &(name, unit_root)) in units.iter().enumerate() {
        let replayed = if i == 0 {
            replay::run_default(&program)
        } else {
            replay::run_unit(&program, name, graph)
        };
        let (rebuilt, rebuilt_root) = replayed
            .unwrap_or_else(|err| panic!("replay of '{}' failed: {:?}\n{}", name, err, source));
        if let Err(mismatch) = dag_eq(graph, unit_root, &rebuilt, rebuilt_root) {
            panic!("replayed '{}' differs at {}\n{}", name, mismatch, source);
        }

        if !executed {
            continue;
        }
        let ran = if i == 0 {
            python::run_default(&program, &source)
        } else {
            python::run_unit(&program, &source, name, graph)
        };
        let (rebuilt, rebuilt_root) = ran.unwrap_or_else(|err| panic!("{:?}\n{}", err, source));
        if let Err(mismatch) = dag_eq(graph, unit_root, &rebuilt, rebuilt_root) {
            panic!("'{}' under python3 differs at {}\n{}", name, mismatch, source);
        }
    }
    program
}

/// Assert that two strings are equal, with a line diff on failure.
pub fn assert_content_eq(expected: &str, actual: &str) {
    if expected != actual {
        let expected_lines: Vec<&str> = expected.lines().collect();
        let actual_lines: Vec<&str> = actual.lines().collect();

        let mut diff = String::new();
        let max_lines = expected_lines.len().max(actual_lines.len());

        for i in 0..max_lines {
            let exp = expected_lines.get(i).copied().unwrap_or("<missing>");
            let act = actual_lines.get(i).copied().unwrap_or("<missing>");

            if exp != act {
                diff.push_str(&format!("Line {}:\n", i + 1));
                diff.push_str(&format!("  expected: {}\n", exp));
                diff.push_str(&format!("  actual:   {}\n", act));
            }
        }

        panic!("Content mismatch:\n{}", diff);
    }
}

/// Error from checking generated source with an external tool.
#[derive(Debug)]
pub struct CheckError {
    pub message: String,
    pub output: String,
}

impl std::fmt::Display for CheckError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}\n\nOutput:\n{}", self.message, self.output)
    }
}

impl std::error::Error for CheckError {}

/// Verifies that a generated module is syntactically valid.
pub trait SourceChecker {
    fn check(&self, path: &Path) -> Result<(), CheckError>;
}

/// Parses the module with `python3 -m ast`.
pub struct PythonSyntaxChecker;

impl PythonSyntaxChecker {
    /// Returns true if a `python3` interpreter can be started.
    pub fn available() -> bool {
        Command::new("python3")
            .arg("--version")
            .output()
            .is_ok_and(|o| o.status.success())
    }
}

impl SourceChecker for PythonSyntaxChecker {
    fn check(&self, path: &Path) -> Result<(), CheckError> {
        let output = Command::new("python3")
            .args(["-m", "ast"])
            .arg(path)
            .output()
            .map_err(|e| CheckError {
                message: format!("Failed to run python3: {}", e),
                output: String::new(),
            })?;

        if output.status.success() {
            Ok(())
        } else {
            Err(CheckError {
                message: "python3 -m ast failed".to_string(),
                output: String::from_utf8_lossy(&output.stderr).into_owned(),
            })
        }
    }
}

/// Write `source` as `<name>.py` into a fresh temporary directory.
///
/// The directory will be cleaned up when the returned `TempDir` is dropped.
pub fn write_to_temp(name: &str, source: &str) -> Result<(tempfile::TempDir, PathBuf)> {
    let dir = tempfile::TempDir::new()?;
    let path = dir.path().join(format!("{}.py", name));
    std::fs::write(&path, source)?;
    Ok((dir, path))
}

/// Write `source` to disk and run `checker` over it.
pub fn assert_valid_source(source: &str, checker: &impl SourceChecker) -> Result<()> {
    let (_dir, path) = write_to_temp("fixture", source)?;
    checker.check(&path).map_err(|e| {
        eprintln!("{}", source);
        eyre!("source check failed: {}", e)
    })
}
