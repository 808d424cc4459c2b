pub mod cache;
pub mod compiler;
pub mod error;
pub mod logger;
pub mod options;
pub mod plugin;
pub mod process;
pub mod resolver;
pub mod sourcemap;

pub use cache::{fingerprint, mtime_millis, CacheEntry, CompileCache, CompiledResult};
pub use compiler::{CompileOutput, InstrumentedCompiler, SassCompiler};
pub use error::{BridgeError, Result};
pub use logger::{CollectingLogger, CompilerLogger, TracingLogger};
pub use options::{CustomFunction, OutputStyle, SassOptions};
pub use plugin::{LoadFailure, LoadResult, LoadSuccess, OutputKind, SassPlugin};
pub use process::SassCliCompiler;
pub use resolver::{resolve_import, FilesystemImporter, ImportedSource, Importer, SourceSyntax};
pub use sourcemap::SourceMap;
