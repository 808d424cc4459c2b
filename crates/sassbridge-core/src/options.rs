use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use crate::logger::CompilerLogger;
use crate::resolver::Importer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputStyle {
    #[serde(rename = "expanded")]
    Expanded,
    #[serde(rename = "compressed")]
    Compressed,
}

impl Default for OutputStyle {
    fn default() -> Self {
        OutputStyle::Expanded
    }
}

impl OutputStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputStyle::Expanded => "expanded",
            OutputStyle::Compressed => "compressed",
        }
    }
}

/// A host-supplied function made visible to the stylesheet language.
///
/// Arguments and return value are raw expression text; interpreting them
/// belongs entirely to the compile capability.
pub trait CustomFunction: Send + Sync {
    fn call(&self, arguments: &[String]) -> std::result::Result<String, String>;
}

/// Options handed to the compile capability
///
/// One value with independently defaulted keys. Most fields pass through
/// verbatim; the cache itself reads only the source-map toggle and the
/// load paths.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SassOptions {
    /// Output style (default: expanded)
    #[serde(default)]
    pub style: OutputStyle,

    /// Generate a source map and append it as an inline annotation
    /// (default: false)
    #[serde(default)]
    pub source_map: bool,

    /// Embed the full text of every source in the source map
    /// (default: false)
    #[serde(default)]
    pub source_map_include_sources: bool,

    /// Directories searched when resolving imports, in order
    #[serde(default)]
    pub load_paths: Vec<PathBuf>,

    /// Only emit ASCII in compiler messages (default: false)
    #[serde(default)]
    pub alert_ascii: bool,

    /// Force or suppress ANSI color in compiler messages; unset means the
    /// compiler decides
    #[serde(default)]
    pub alert_color: Option<bool>,

    /// Deprecation ids treated as hard errors
    #[serde(default)]
    pub fatal_deprecations: Vec<String>,

    /// Opt-in deprecation ids warned about ahead of time
    #[serde(default)]
    pub future_deprecations: Vec<String>,

    /// Deprecation ids never warned about
    #[serde(default)]
    pub silence_deprecations: Vec<String>,

    /// Suppress warnings from stylesheets under the load paths
    /// (default: false)
    #[serde(default)]
    pub quiet_deps: bool,

    /// Report every occurrence of repeated warnings instead of a capped
    /// summary (default: false)
    #[serde(default)]
    pub verbose: bool,

    /// Custom functions by signature, interpreted by the capability
    #[serde(skip)]
    pub functions: HashMap<String, Arc<dyn CustomFunction>>,

    /// Custom importers, consulted after the built-in filesystem importer
    #[serde(skip)]
    pub importers: Vec<Arc<dyn Importer>>,

    /// Receiver for warnings and debug messages the compiler emits
    #[serde(skip)]
    pub logger: Option<Arc<dyn CompilerLogger>>,
}

impl Default for SassOptions {
    fn default() -> Self {
        Self {
            style: OutputStyle::Expanded,
            source_map: false,
            source_map_include_sources: false,
            load_paths: Vec::new(),
            alert_ascii: false,
            alert_color: None,
            fatal_deprecations: Vec::new(),
            future_deprecations: Vec::new(),
            silence_deprecations: Vec::new(),
            quiet_deps: false,
            verbose: false,
            functions: HashMap::new(),
            importers: Vec::new(),
            logger: None,
        }
    }
}

impl fmt::Debug for SassOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SassOptions")
            .field("style", &self.style)
            .field("source_map", &self.source_map)
            .field(
                "source_map_include_sources",
                &self.source_map_include_sources,
            )
            .field("load_paths", &self.load_paths)
            .field("alert_ascii", &self.alert_ascii)
            .field("alert_color", &self.alert_color)
            .field("fatal_deprecations", &self.fatal_deprecations)
            .field("future_deprecations", &self.future_deprecations)
            .field("silence_deprecations", &self.silence_deprecations)
            .field("quiet_deps", &self.quiet_deps)
            .field("verbose", &self.verbose)
            .field("functions", &self.functions.keys().collect::<Vec<_>>())
            .field("importers", &self.importers.len())
            .field("logger", &self.logger.is_some())
            .finish()
    }
}
