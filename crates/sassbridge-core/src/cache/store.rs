use std::path::{Path, PathBuf};
use std::sync::Arc;

use rustc_hash::FxHashMap;
use tracing::debug;

use super::freshness::fingerprint;
use crate::compiler::{CompileOutput, SassCompiler};
use crate::error::{BridgeError, Result};
use crate::options::SassOptions;
use crate::sourcemap;

/// One cached compilation
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// Final output text, inline annotation included when enabled
    pub output: String,
    /// Files the compiler reported loading, the entry file excluded
    pub dependency_paths: Vec<PathBuf>,
    /// Mtime sum recorded when this entry was validated
    pub fingerprint: u128,
}

/// What `resolve` hands back, identical for hits and fresh compiles
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledResult {
    pub output: String,
    pub dependency_paths: Vec<PathBuf>,
}

/// Compilation cache keyed on entry paths
///
/// Owns the compile capability and the options passed through to it.
/// Single-owner by design: `resolve` takes `&mut self` and there is no
/// internal locking; concurrent identical requests are not coalesced.
pub struct CompileCache {
    compiler: Arc<dyn SassCompiler>,
    options: SassOptions,
    extra_roots: Vec<PathBuf>,
    entries: FxHashMap<PathBuf, CacheEntry>,
}

impl CompileCache {
    pub fn new(
        compiler: Arc<dyn SassCompiler>,
        options: SassOptions,
        extra_roots: Vec<PathBuf>,
    ) -> Self {
        Self {
            compiler,
            options,
            extra_roots,
            entries: FxHashMap::default(),
        }
    }

    /// Replace the statically configured extra roots.
    pub fn set_extra_roots(&mut self, extra_roots: Vec<PathBuf>) {
        self.extra_roots = extra_roots;
    }

    /// Number of live entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Options forwarded to the compile capability
    pub fn options(&self) -> &SassOptions {
        &self.options
    }

    /// Compile `file` or serve it from cache.
    ///
    /// The current fingerprint is computed over the file, the stored
    /// dependency set, and the extra roots before anything else happens; a
    /// stat failure anywhere aborts the resolution. On a miss the compiler
    /// runs and the entry is replaced wholesale, keeping that same
    /// pre-compile fingerprint. A failed compile leaves any previous entry
    /// untouched.
    pub fn resolve(&mut self, file: &Path) -> Result<CompiledResult> {
        let entry = self.entries.get(file);
        let stored_deps = entry.map(|e| e.dependency_paths.as_slice()).unwrap_or(&[]);
        let current = fingerprint(file, stored_deps, &self.extra_roots)?;

        if let Some(entry) = entry {
            if entry.fingerprint == current {
                debug!("Cache hit: {}", file.display());
                return Ok(CompiledResult {
                    output: entry.output.clone(),
                    dependency_paths: entry.dependency_paths.clone(),
                });
            }
        }

        debug!("Cache miss, compiling: {}", file.display());
        let CompileOutput {
            css,
            loaded_files,
            source_map,
        } = self.compiler.compile(file, &self.options)?;

        let mut output = css;
        if self.options.source_map {
            if let Some(map) = source_map {
                sourcemap::append_annotation(&mut output, &map).map_err(|error| {
                    BridgeError::compile(format!("source map serialization failed: {}", error))
                })?;
            }
        }

        // The entry file itself participates in every fingerprint as the
        // primary path; keep it out of the stored dependency list.
        let dependency_paths: Vec<PathBuf> =
            loaded_files.into_iter().filter(|path| path != file).collect();

        let result = CompiledResult {
            output: output.clone(),
            dependency_paths: dependency_paths.clone(),
        };
        self.entries.insert(
            file.to_path_buf(),
            CacheEntry {
                output,
                dependency_paths,
                fingerprint: current,
            },
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    struct EchoCompiler;

    impl SassCompiler for EchoCompiler {
        fn compile(&self, file: &Path, options: &SassOptions) -> Result<CompileOutput> {
            let source = std::fs::read_to_string(file)
                .map_err(|source| BridgeError::io(file, source))?;
            let source_map = options.source_map.then(|| sourcemap::SourceMap {
                version: 3,
                file: None,
                source_root: None,
                sources: vec![file.display().to_string()],
                sources_content: vec![],
                names: vec![],
                mappings: "AAAA".to_string(),
            });
            Ok(CompileOutput {
                css: source,
                loaded_files: vec![file.to_path_buf()],
                source_map,
            })
        }
    }

    fn write_entry(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_resolve_compiles_and_stores_entry() {
        let dir = TempDir::new().unwrap();
        let file = write_entry(&dir, "app.scss", ".a { color: red; }\n");

        let mut cache =
            CompileCache::new(Arc::new(EchoCompiler), SassOptions::default(), vec![]);
        assert!(cache.is_empty());

        let result = cache.resolve(&file).unwrap();
        assert_eq!(result.output, ".a { color: red; }\n");
        assert!(result.dependency_paths.is_empty());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_entry_file_not_stored_as_dependency() {
        let dir = TempDir::new().unwrap();
        let file = write_entry(&dir, "app.scss", ".a {}\n");

        let mut cache =
            CompileCache::new(Arc::new(EchoCompiler), SassOptions::default(), vec![]);
        let result = cache.resolve(&file).unwrap();

        // EchoCompiler reports the entry among its loaded files
        assert!(result.dependency_paths.is_empty());
    }

    #[test]
    fn test_annotation_appended_when_enabled() {
        let dir = TempDir::new().unwrap();
        let file = write_entry(&dir, "app.scss", ".a {}\n");

        let options = SassOptions {
            source_map: true,
            ..SassOptions::default()
        };
        let mut cache = CompileCache::new(Arc::new(EchoCompiler), options, vec![]);

        let result = cache.resolve(&file).unwrap();
        let last_line = result.output.lines().last().unwrap();
        assert!(last_line.starts_with(sourcemap::ANNOTATION_PREFIX));
    }

    #[test]
    fn test_no_annotation_when_disabled() {
        let dir = TempDir::new().unwrap();
        let file = write_entry(&dir, "app.scss", ".a {}\n");

        let mut cache =
            CompileCache::new(Arc::new(EchoCompiler), SassOptions::default(), vec![]);
        let result = cache.resolve(&file).unwrap();
        assert!(!result.output.contains("sourceMappingURL"));
    }

    #[test]
    fn test_missing_file_propagates_io_error() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("gone.scss");

        let mut cache =
            CompileCache::new(Arc::new(EchoCompiler), SassOptions::default(), vec![]);
        let result = cache.resolve(&missing);
        assert!(matches!(result, Err(BridgeError::Io { .. })));
        assert!(cache.is_empty());
    }
}
