use std::path::{Path, PathBuf};

use super::{Manifest, parse_manifest};
use crate::{Fixture, Result, SourceContext, build_fixture};

/// Represents a fixture.toml file with its raw content, parsed manifest and built graph.
pub struct FixtureToml {
    path: PathBuf,
    content: String,
    manifest: Manifest,
    fixture: Fixture,
}

impl FixtureToml {
    /// Open, parse and build a fixture.toml file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let content = std::fs::read_to_string(&path).map_err(|e| {
            Box::new(crate::Error::Io {
                path: path.clone(),
                source: e,
            })
        })?;
        let filename = path.display().to_string();
        let manifest = parse_manifest(&content, &filename)?;
        let fixture = build_fixture(&manifest, &SourceContext::new(content.as_str(), filename))?;

        Ok(Self {
            path,
            content,
            manifest,
            fixture,
        })
    }

    /// Get the file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get the raw content.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Get the parsed manifest.
    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    /// Get the built fixture.
    pub fn fixture(&self) -> &Fixture {
        &self.fixture
    }

    pub fn into_fixture(self) -> Fixture {
        self.fixture
    }
}
