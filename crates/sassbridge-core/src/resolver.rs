use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{BridgeError, Result};

/// Syntax of a stylesheet source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceSyntax {
    Scss,
    Indented,
}

impl SourceSyntax {
    /// Infer the syntax from a file extension: `.scss` is SCSS syntax,
    /// anything else is the indented syntax.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("scss") => SourceSyntax::Scss,
            _ => SourceSyntax::Indented,
        }
    }
}

/// A loaded import: raw contents plus the syntax they are written in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportedSource {
    pub contents: String,
    pub syntax: SourceSyntax,
}

/// Trait for import resolution and loading strategies
///
/// In-process compile capabilities consult importers in order; the first
/// one whose `canonicalize` returns a path wins and its `load` supplies
/// the source text.
pub trait Importer: Send + Sync {
    /// Map an import URL to an absolute file path, or `None` to let the
    /// next importer (or the compiler's own resolution) take over.
    fn canonicalize(&self, url: &str, requesting_file: &Path) -> Option<PathBuf>;

    /// Read a canonicalized file.
    fn load(&self, path: &Path) -> Result<ImportedSource>;
}

/// File names a bare import URL can refer to.
///
/// A URL already carrying a stylesheet extension matches itself or its
/// partial form; a bare URL additionally probes both syntaxes. The
/// underscore lands on the final path component only.
fn candidate_names(url: &str) -> Vec<String> {
    let (dir, name) = match url.rsplit_once('/') {
        Some((dir, name)) => (format!("{dir}/"), name),
        None => (String::new(), url),
    };

    let stems: Vec<String> = if name.ends_with(".scss") || name.ends_with(".sass") {
        vec![name.to_string(), format!("_{name}")]
    } else {
        vec![
            format!("{name}.scss"),
            format!("_{name}.scss"),
            format!("{name}.sass"),
            format!("_{name}.sass"),
        ]
    };

    stems.into_iter().map(|stem| format!("{dir}{stem}")).collect()
}

/// Probe candidate directories in order and return the first existing match.
///
/// The requesting file's own directory is checked before the configured
/// load paths. The search short-circuits on the first hit.
pub fn resolve_import(
    url: &str,
    requesting_dir: &Path,
    load_paths: &[PathBuf],
) -> Option<PathBuf> {
    let names = candidate_names(url);
    let candidates =
        std::iter::once(requesting_dir.to_path_buf()).chain(load_paths.iter().cloned());

    for dir in candidates {
        for name in &names {
            let candidate = dir.join(name);
            if candidate.is_file() {
                debug!("Resolved import '{}' -> {}", url, candidate.display());
                return Some(candidate);
            }
        }
    }

    debug!(
        "Import '{}' not found in {} candidate dir(s)",
        url,
        load_paths.len() + 1
    );
    None
}

/// Built-in filesystem importer backing every compile
///
/// Resolution order matches the candidate search: the requesting file's
/// directory first, then each load path.
#[derive(Debug, Clone, Default)]
pub struct FilesystemImporter {
    load_paths: Vec<PathBuf>,
}

impl FilesystemImporter {
    pub fn new(load_paths: Vec<PathBuf>) -> Self {
        Self { load_paths }
    }
}

impl Importer for FilesystemImporter {
    fn canonicalize(&self, url: &str, requesting_file: &Path) -> Option<PathBuf> {
        let requesting_dir = requesting_file.parent().unwrap_or(Path::new("."));
        resolve_import(url, requesting_dir, &self.load_paths)
    }

    fn load(&self, path: &Path) -> Result<ImportedSource> {
        let contents =
            std::fs::read_to_string(path).map_err(|source| BridgeError::io(path, source))?;
        Ok(ImportedSource {
            contents,
            syntax: SourceSyntax::from_path(path),
        })
    }
}
