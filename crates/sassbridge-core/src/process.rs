//! Compile capability backed by an external `sass` executable.
//!
//! The child process is asked to embed its source map unconditionally; the
//! map is the only channel through which the reference implementation
//! reports which files a compilation loaded. The annotation is stripped
//! from the returned CSS and the map's `sources` become `loaded_files`.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, warn};

use crate::compiler::{CompileOutput, SassCompiler};
use crate::error::{BridgeError, Result};
use crate::options::SassOptions;
use crate::sourcemap;

/// Adapter spawning the `sass` CLI for every compilation.
///
/// Custom functions and in-process importers cannot cross the process
/// boundary and are ignored here; load paths cover the filesystem importer
/// since the executable resolves them natively.
pub struct SassCliCompiler {
    executable: PathBuf,
}

impl SassCliCompiler {
    pub fn new() -> Self {
        Self {
            executable: PathBuf::from("sass"),
        }
    }

    pub fn with_executable(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
        }
    }

    fn build_args(&self, file: &Path, options: &SassOptions) -> Vec<OsString> {
        let mut args: Vec<OsString> = Vec::new();
        args.push("--style".into());
        args.push(options.style.as_str().into());

        // Loaded files are harvested from the embedded map even when the
        // caller asked for no source map at all.
        args.push("--embed-source-map".into());
        if options.source_map && options.source_map_include_sources {
            args.push("--embed-sources".into());
        }

        for path in &options.load_paths {
            args.push("--load-path".into());
            args.push(path.into());
        }

        if options.alert_ascii {
            args.push("--no-unicode".into());
        }
        match options.alert_color {
            Some(true) => args.push("--color".into()),
            Some(false) => args.push("--no-color".into()),
            None => {}
        }
        if options.quiet_deps {
            args.push("--quiet-deps".into());
        }
        if options.verbose {
            args.push("--verbose".into());
        }
        for id in &options.fatal_deprecations {
            args.push("--fatal-deprecation".into());
            args.push(id.into());
        }
        for id in &options.future_deprecations {
            args.push("--future-deprecation".into());
            args.push(id.into());
        }
        for id in &options.silence_deprecations {
            args.push("--silence-deprecation".into());
            args.push(id.into());
        }

        args.push(file.into());
        args
    }
}

impl Default for SassCliCompiler {
    fn default() -> Self {
        Self::new()
    }
}

impl SassCompiler for SassCliCompiler {
    fn compile(&self, file: &Path, options: &SassOptions) -> Result<CompileOutput> {
        for field in unforwardable_options(options) {
            debug!("{} are not forwarded to the external process", field);
        }

        let args = self.build_args(file, options);
        debug!("Spawning {} for {}", self.executable.display(), file.display());
        let output = Command::new(&self.executable)
            .args(&args)
            .output()
            .map_err(|source| BridgeError::io(&self.executable, source))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let message = stderr.trim();
            if message.is_empty() {
                return Err(BridgeError::compile(format!(
                    "{} exited with {}",
                    self.executable.display(),
                    output.status
                )));
            }
            return Err(BridgeError::compile(message));
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        for line in stderr.lines().filter(|line| !line.trim().is_empty()) {
            match &options.logger {
                Some(logger) => logger.warning(line),
                None => warn!("{}", line),
            }
        }

        let raw = String::from_utf8_lossy(&output.stdout).into_owned();
        let (css, map) = sourcemap::split_annotation(&raw);

        let loaded_files = map
            .as_ref()
            .map(|map| {
                map.sources
                    .iter()
                    .filter_map(|source| source_to_path(source))
                    .collect()
            })
            .unwrap_or_default();

        let source_map = if options.source_map { map } else { None };

        Ok(CompileOutput {
            css,
            loaded_files,
            source_map,
        })
    }
}

/// Caller-set option fields the child process cannot receive.
fn unforwardable_options(options: &SassOptions) -> Vec<&'static str> {
    let mut dropped = Vec::new();
    if !options.functions.is_empty() {
        dropped.push("custom functions");
    }
    if !options.importers.is_empty() {
        dropped.push("custom importers");
    }
    dropped
}

/// Turn a map source back into a filesystem path. Inline sources such as
/// `data:` URLs have no path and are dropped.
fn source_to_path(source: &str) -> Option<PathBuf> {
    if source.starts_with("data:") {
        return None;
    }
    if let Some(rest) = source.strip_prefix("file://") {
        return Some(PathBuf::from(percent_decode(rest)));
    }
    Some(PathBuf::from(source))
}

/// Decode `%XX` escapes; anything malformed is kept verbatim.
fn percent_decode(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            let hi = (bytes[i + 1] as char).to_digit(16);
            let lo = (bytes[i + 2] as char).to_digit(16);
            if let (Some(hi), Some(lo)) = (hi, lo) {
                out.push((hi * 16 + lo) as u8);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}
