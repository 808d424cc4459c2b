//! Test fixtures - stylesheet snippets and on-disk project trees

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tempfile::TempDir;

/// Simple stylesheets for testing
pub fn simple_stylesheet() -> &'static str {
    ".button { color: red; }\n"
}

pub fn stylesheet_with_use() -> &'static str {
    "@use \"base\";\n.app { margin: 0; }\n"
}

pub fn base_partial() -> &'static str {
    ".base { padding: 0; }\n"
}

pub fn indented_stylesheet() -> &'static str {
    ".nav\n  color: blue\n"
}

/// Stylesheets that exercise diagnostics
pub fn warning_stylesheet() -> &'static str {
    "@warn \"legacy mixin\";\n.old { zoom: 1; }\n"
}

pub fn failing_stylesheet() -> &'static str {
    "@error \"unsupported target\";\n"
}

/// An on-disk stylesheet project rooted in a temporary directory
///
/// Files are written relative to the root; the directory disappears when
/// the tree is dropped.
pub struct FixtureTree {
    root: TempDir,
}

impl FixtureTree {
    pub fn new() -> Self {
        Self {
            root: TempDir::new().expect("create fixture dir"),
        }
    }

    pub fn root(&self) -> &Path {
        self.root.path()
    }

    /// Write a file, creating parent directories as needed.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.root.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create fixture parents");
        }
        fs::write(&path, contents).expect("write fixture");
        path
    }

    pub fn mkdir(&self, name: &str) -> PathBuf {
        let path = self.root.path().join(name);
        fs::create_dir_all(&path).expect("create fixture dir");
        path
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.root.path().join(name)
    }
}

impl Default for FixtureTree {
    fn default() -> Self {
        Self::new()
    }
}

static MTIME_STEP: AtomicU64 = AtomicU64::new(1);

/// Push a path's mtime forward by a unique whole-second step, immune to
/// filesystem timestamp granularity.
pub fn bump_mtime(path: &Path) {
    let step = MTIME_STEP.fetch_add(1, Ordering::SeqCst);
    let metadata = fs::metadata(path).expect("stat fixture");
    let file = if metadata.is_dir() {
        fs::File::open(path).expect("open fixture dir")
    } else {
        fs::File::options()
            .write(true)
            .open(path)
            .expect("open fixture file")
    };
    let modified = metadata.modified().expect("fixture mtime");
    file.set_modified(modified + Duration::from_secs(step))
        .expect("advance fixture mtime");
}
