//! Compiled-artifact cache.
//!
//! Artifacts live on disk as `<cache_dir>/<md5(identifier)>.tplc`. On top of
//! the files, lowered programs are kept in memory keyed by the artifact's
//! mtime, so a warm render neither recompiles nor re-parses.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::SystemTime;

use dashmap::DashMap;
use md5::{Digest, Md5};
use tracing::{debug, trace, warn};

use super::artifact::{CompiledArtifact, CompiledTemplate, TemplateSource};
use super::compiler::TemplateCompiler;
use crate::error::{TemplateError, TemplateResult};

pub const ARTIFACT_EXTENSION: &str = "tplc";

/// Where a source's artifact lives and how old the source was when looked at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub source_identifier: String,
    pub source_modified_at: Option<SystemTime>,
    pub artifact_path: PathBuf,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    /// Every miss is a compilation.
    pub misses: u64,
    pub stores: u64,
    /// Programs currently held in memory.
    pub programs: usize,
}

struct LoadedProgram {
    artifact_modified_at: SystemTime,
    compiled: Arc<CompiledTemplate>,
}

pub struct ArtifactCache {
    cache_dir: PathBuf,
    programs: DashMap<String, LoadedProgram>,
    hits: AtomicU64,
    misses: AtomicU64,
    stores: AtomicU64,
}

impl ArtifactCache {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            programs: DashMap::new(),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            stores: AtomicU64::new(0),
        }
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Stable artifact location for an identifier.
    pub fn artifact_path(&self, identifier: &str) -> PathBuf {
        let digest = Md5::digest(identifier.as_bytes());
        self.cache_dir
            .join(format!("{}.{}", hex::encode(digest), ARTIFACT_EXTENSION))
    }

    /// True only when the artifact exists and is at least as new as the
    /// source. Sources without a file are never fresh.
    pub fn is_fresh(&self, source: &TemplateSource) -> bool {
        let Some(source_mtime) = source.modified_at() else {
            return false;
        };
        match modified_at(&self.artifact_path(source.identifier())) {
            Some(artifact_mtime) => artifact_mtime >= source_mtime,
            None => false,
        }
    }

    /// Read the stored artifact, `None` when there is none.
    pub fn load(&self, identifier: &str) -> TemplateResult<Option<CompiledArtifact>> {
        let path = self.artifact_path(identifier);
        match std::fs::read_to_string(&path) {
            Ok(text) => Ok(Some(CompiledArtifact::new(text))),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(TemplateError::io(path, e)),
        }
    }

    /// Write the artifact, replacing whatever was there.
    pub fn store(
        &self,
        source: &TemplateSource,
        artifact: &CompiledArtifact,
    ) -> TemplateResult<CacheEntry> {
        std::fs::create_dir_all(&self.cache_dir)
            .map_err(|e| TemplateError::io(&self.cache_dir, e))?;
        let artifact_path = self.artifact_path(source.identifier());
        std::fs::write(&artifact_path, artifact.as_str())
            .map_err(|e| TemplateError::io(&artifact_path, e))?;
        self.stores.fetch_add(1, Ordering::Relaxed);
        debug!(
            source = %source.identifier(),
            artifact = %artifact_path.display(),
            "Stored compiled artifact"
        );
        Ok(CacheEntry {
            source_identifier: source.identifier().to_string(),
            source_modified_at: source.modified_at(),
            artifact_path,
        })
    }

    /// Entry for a source whose artifact exists on disk.
    pub fn entry(&self, source: &TemplateSource) -> Option<CacheEntry> {
        let artifact_path = self.artifact_path(source.identifier());
        if !artifact_path.is_file() {
            return None;
        }
        Some(CacheEntry {
            source_identifier: source.identifier().to_string(),
            source_modified_at: source.modified_at(),
            artifact_path,
        })
    }

    /// Drop the artifact and in-memory program for one identifier.
    pub fn invalidate(&self, identifier: &str) -> TemplateResult<()> {
        self.programs.remove(identifier);
        remove_if_present(&self.artifact_path(identifier))
    }

    /// Drop every artifact in the cache directory and all loaded programs.
    pub fn clear(&self) -> TemplateResult<()> {
        self.programs.clear();
        let entries = match std::fs::read_dir(&self.cache_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(TemplateError::io(&self.cache_dir, e)),
        };
        for entry in entries {
            let path = entry.map_err(|e| TemplateError::io(&self.cache_dir, e))?.path();
            if path.extension().is_some_and(|ext| ext == ARTIFACT_EXTENSION) {
                remove_if_present(&path)?;
            }
        }
        Ok(())
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            stores: self.stores.load(Ordering::Relaxed),
            programs: self.programs.len(),
        }
    }

    /// Serve a fresh artifact or compile and store a new one.
    ///
    /// A fresh artifact that no longer lowers is treated as stale.
    pub fn get_or_compile(
        &self,
        source: &TemplateSource,
        compiler: &TemplateCompiler<'_>,
    ) -> TemplateResult<Arc<CompiledTemplate>> {
        let identifier = source.identifier();
        if self.is_fresh(source) {
            if let Some(compiled) = self.load_fresh(identifier)? {
                self.hits.fetch_add(1, Ordering::Relaxed);
                return Ok(compiled);
            }
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let compiled = Arc::new(compiler.compile(source)?);
        let entry = self.store(source, compiled.artifact())?;
        if let Some(artifact_modified_at) = modified_at(&entry.artifact_path) {
            self.programs.insert(
                identifier.to_string(),
                LoadedProgram {
                    artifact_modified_at,
                    compiled: compiled.clone(),
                },
            );
        }
        Ok(compiled)
    }

    fn load_fresh(&self, identifier: &str) -> TemplateResult<Option<Arc<CompiledTemplate>>> {
        let path = self.artifact_path(identifier);
        let Some(artifact_modified_at) = modified_at(&path) else {
            return Ok(None);
        };
        if let Some(loaded) = self.programs.get(identifier) {
            if loaded.artifact_modified_at == artifact_modified_at {
                trace!(source = %identifier, "Program cache hit");
                return Ok(Some(loaded.compiled.clone()));
            }
        }

        let Some(artifact) = self.load(identifier)? else {
            return Ok(None);
        };
        match CompiledTemplate::from_artifact(artifact) {
            Ok(compiled) => {
                trace!(source = %identifier, "Artifact cache hit");
                let compiled = Arc::new(compiled);
                self.programs.insert(
                    identifier.to_string(),
                    LoadedProgram {
                        artifact_modified_at,
                        compiled: compiled.clone(),
                    },
                );
                Ok(Some(compiled))
            }
            Err(e) => {
                warn!(
                    source = %identifier,
                    artifact = %path.display(),
                    error = %e,
                    "Discarding unreadable artifact"
                );
                self.programs.remove(identifier);
                Ok(None)
            }
        }
    }
}

fn modified_at(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}

fn remove_if_present(path: &Path) -> TemplateResult<()> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(TemplateError::io(path, e)),
    }
}
