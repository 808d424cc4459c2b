use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::Result;
use crate::options::SassOptions;
use crate::sourcemap::SourceMap;

/// Result of one successful compiler invocation
#[derive(Debug, Clone)]
pub struct CompileOutput {
    /// Generated CSS, without any inline annotation
    pub css: String,
    /// Absolute path of every file the compiler loaded, entry included
    pub loaded_files: Vec<PathBuf>,
    /// Present when a source map was requested
    pub source_map: Option<SourceMap>,
}

/// Trait for the external compile capability
///
/// Implementations may run the preprocessor in process, in a subprocess,
/// or not at all (test doubles); the cache needs only this one operation.
pub trait SassCompiler: Send + Sync {
    fn compile(&self, file: &Path, options: &SassOptions) -> Result<CompileOutput>;
}

/// Decorator that counts successful compilations of the wrapped capability
///
/// Failed invocations propagate their error without counting.
#[derive(Debug)]
pub struct InstrumentedCompiler<C> {
    inner: C,
    compilations: AtomicUsize,
}

impl<C> InstrumentedCompiler<C> {
    pub fn new(inner: C) -> Self {
        Self {
            inner,
            compilations: AtomicUsize::new(0),
        }
    }

    /// Number of successful compilations so far
    pub fn compilations(&self) -> usize {
        self.compilations.load(Ordering::SeqCst)
    }
}

impl<C: SassCompiler> SassCompiler for InstrumentedCompiler<C> {
    fn compile(&self, file: &Path, options: &SassOptions) -> Result<CompileOutput> {
        let output = self.inner.compile(file, options)?;
        self.compilations.fetch_add(1, Ordering::SeqCst);
        Ok(output)
    }
}
