//! Inbound boundary of the bridge.
//!
//! The host hands paths to [`SassPlugin::load`] and receives either the
//! compiled stylesheet plus its watch set, or a flattened failure message.
//! Errors never cross this boundary as `Err`; the host protocol carries
//! exactly the two shapes below.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;

use crate::cache::CompileCache;
use crate::compiler::SassCompiler;
use crate::options::SassOptions;
use crate::resolver::FilesystemImporter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OutputKind {
    #[serde(rename = "css")]
    Css,
}

impl OutputKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputKind::Css => "css",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadSuccess {
    pub output_text: String,
    pub output_kind: OutputKind,
    /// The requested file first, then every dependency it loaded
    pub watch_files: Vec<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadFailure {
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum LoadResult {
    Success(LoadSuccess),
    Failure(LoadFailure),
}

/// The plugin the host registers for stylesheet files.
///
/// Construction wires the importer chain: the filesystem importer always
/// sits in front of any caller-supplied importers, so relative and
/// load-path lookups win before custom resolution runs.
pub struct SassPlugin {
    cache: CompileCache,
}

impl SassPlugin {
    pub fn new(compiler: Arc<dyn SassCompiler>, mut options: SassOptions) -> Self {
        let filesystem = FilesystemImporter::new(options.load_paths.clone());
        options.importers.insert(0, Arc::new(filesystem));
        // Load paths double as freshness roots: touching anything under a
        // configured root invalidates every cached entry.
        let extra_roots = options.load_paths.clone();
        Self {
            cache: CompileCache::new(compiler, options, extra_roots),
        }
    }

    pub fn with_extra_roots(mut self, extra_roots: Vec<PathBuf>) -> Self {
        self.cache.set_extra_roots(extra_roots);
        self
    }

    /// Whether this plugin should handle `path` at all.
    pub fn matches(&self, path: &Path) -> bool {
        matches!(
            path.extension().and_then(|ext| ext.to_str()),
            Some("scss") | Some("sass")
        )
    }

    /// Resolve `path` through the cache, flattening both error kinds into
    /// the failure shape the host protocol expects.
    pub fn load(&mut self, path: &Path) -> LoadResult {
        match self.cache.resolve(path) {
            Ok(result) => {
                let mut watch_files = Vec::with_capacity(result.dependency_paths.len() + 1);
                watch_files.push(path.to_path_buf());
                watch_files.extend(result.dependency_paths);
                LoadResult::Success(LoadSuccess {
                    output_text: result.output,
                    output_kind: OutputKind::Css,
                    watch_files,
                })
            }
            Err(error) => LoadResult::Failure(LoadFailure {
                message: error.to_string(),
            }),
        }
    }
}
