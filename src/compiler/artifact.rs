use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::engine::program::Program;
use crate::error::{TemplateError, TemplateResult};

/// Identifier used for sources that did not come from a file.
pub const INLINE_IDENTIFIER: &str = "<inline>";

/// Template text plus where it came from. The identifier only feeds the
/// cache key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateSource {
    identifier: String,
    text: String,
    path: Option<PathBuf>,
}

impl TemplateSource {
    /// Read a template file. A missing file is `TemplateNotFound`.
    pub fn from_file(path: impl AsRef<Path>) -> TemplateResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => TemplateError::TemplateNotFound(path.display().to_string()),
            _ => TemplateError::io(path, e),
        })?;
        Ok(Self {
            identifier: path.to_string_lossy().into_owned(),
            text,
            path: Some(path.to_path_buf()),
        })
    }

    pub fn inline(text: impl Into<String>) -> Self {
        Self {
            identifier: INLINE_IDENTIFIER.to_string(),
            text: text.into(),
            path: None,
        }
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Modification time of the backing file; `None` for inline sources or
    /// when the file has gone away.
    pub fn modified_at(&self) -> Option<SystemTime> {
        let path = self.path.as_ref()?;
        std::fs::metadata(path).and_then(|m| m.modified()).ok()
    }
}

/// Transformed template text: literal text interleaved with `<?tpl ... ?>`
/// instruction tags.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CompiledArtifact(String);

impl CompiledArtifact {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for CompiledArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An artifact together with its lowered program. Rebuilds produce a new
/// value; existing ones are never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledTemplate {
    artifact: CompiledArtifact,
    program: Program,
}

impl CompiledTemplate {
    pub fn from_artifact(artifact: CompiledArtifact) -> TemplateResult<Self> {
        let program = Program::parse(artifact.as_str())?;
        Ok(Self { artifact, program })
    }

    pub fn artifact(&self) -> &CompiledArtifact {
        &self.artifact
    }

    pub fn program(&self) -> &Program {
        &self.program
    }
}
