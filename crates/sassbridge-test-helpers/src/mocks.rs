//! Mock implementations for testing

use std::path::{Path, PathBuf};

use sassbridge_core::{
    BridgeError, CompileOutput, ImportedSource, Importer, OutputStyle, Result, SassCompiler,
    SassOptions, SourceMap, SourceSyntax,
};

/// A small in-process compile capability for tests.
///
/// It understands just enough of the stylesheet language to exercise the
/// bridge end to end: `@use` and `@import` resolve through the configured
/// importer chain, `@warn` goes to the logger, `@error` fails the
/// compilation, and custom functions substitute textually. Everything
/// else passes through as output.
#[derive(Debug, Default)]
pub struct MockSassCompiler;

impl MockSassCompiler {
    pub fn new() -> Self {
        Self
    }

    fn render(
        &self,
        file: &Path,
        source: &str,
        options: &SassOptions,
        state: &mut RenderState,
    ) -> Result<()> {
        for line in source.lines() {
            let trimmed = line.trim();
            if let Some(rest) = strip_directive(trimmed) {
                let url = unquote(directive_url(rest));
                if url.starts_with("sass:") {
                    continue;
                }
                self.load_module(url, file, options, state)?;
            } else if let Some(rest) = trimmed.strip_prefix("@warn ") {
                let message = unquote(rest.trim_end_matches(';'));
                if let Some(logger) = &options.logger {
                    logger.warning(message);
                }
            } else if let Some(rest) = trimmed.strip_prefix("@error ") {
                return Err(BridgeError::compile(unquote(rest.trim_end_matches(';'))));
            } else if !trimmed.is_empty() {
                state.css.push_str(line);
                state.css.push('\n');
            }
        }
        Ok(())
    }

    fn load_module(
        &self,
        url: &str,
        requesting_file: &Path,
        options: &SassOptions,
        state: &mut RenderState,
    ) -> Result<()> {
        let resolved = options.importers.iter().find_map(|importer| {
            importer
                .canonicalize(url, requesting_file)
                .map(|path| (path, importer.clone()))
        });
        let (path, importer) = match resolved {
            Some(found) => found,
            None => {
                return Err(BridgeError::compile(format!(
                    "Can't find stylesheet to import: {url}"
                )))
            }
        };

        // Each module renders once no matter how often it is used.
        if state.loaded.iter().any(|(loaded, _)| loaded == &path) {
            return Ok(());
        }

        let ImportedSource { contents, .. } = importer.load(&path)?;
        state.loaded.push((path.clone(), contents.clone()));
        self.render(&path, &contents, options, state)
    }
}

struct RenderState {
    loaded: Vec<(PathBuf, String)>,
    css: String,
}

impl SassCompiler for MockSassCompiler {
    fn compile(&self, file: &Path, options: &SassOptions) -> Result<CompileOutput> {
        let source =
            std::fs::read_to_string(file).map_err(|source| BridgeError::io(file, source))?;

        let mut state = RenderState {
            loaded: vec![(file.to_path_buf(), source.clone())],
            css: String::new(),
        };
        self.render(file, &source, options, &mut state)?;

        let mut css = apply_functions(state.css, options)?;
        if options.style == OutputStyle::Compressed {
            css = compress(&css);
        }

        let loaded_files: Vec<PathBuf> =
            state.loaded.iter().map(|(path, _)| path.clone()).collect();
        let source_map = options.source_map.then(|| SourceMap {
            version: 3,
            file: None,
            source_root: None,
            sources: loaded_files.iter().map(|p| p.display().to_string()).collect(),
            sources_content: if options.source_map_include_sources {
                state
                    .loaded
                    .iter()
                    .map(|(_, contents)| Some(contents.clone()))
                    .collect()
            } else {
                vec![]
            },
            names: vec![],
            mappings: "AAAA".to_string(),
        });

        Ok(CompileOutput {
            css,
            loaded_files,
            source_map,
        })
    }
}

fn strip_directive(line: &str) -> Option<&str> {
    line.strip_prefix("@use ")
        .or_else(|| line.strip_prefix("@import "))
        .or_else(|| line.strip_prefix("@forward "))
}

fn directive_url(rest: &str) -> &str {
    let rest = rest.trim().trim_end_matches(';').trim();
    let rest = match rest.split_once(" as ") {
        Some((url, _)) => url.trim(),
        None => rest,
    };
    match rest.split_once(" with ") {
        Some((url, _)) => url.trim(),
        None => rest,
    }
}

fn unquote(value: &str) -> &str {
    let value = value.trim();
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .or_else(|| value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')))
        .unwrap_or(value)
}

/// Textual substitution of `name(args)` calls for every registered
/// custom function. A function returning `Err` fails the compilation.
fn apply_functions(mut css: String, options: &SassOptions) -> Result<String> {
    for (name, function) in &options.functions {
        let needle = format!("{name}(");
        while let Some(start) = css.find(&needle) {
            let after = start + needle.len();
            let close = match css[after..].find(')') {
                Some(close) => close,
                None => break,
            };
            let arguments: Vec<String> = css[after..after + close]
                .split(',')
                .map(|argument| argument.trim().to_string())
                .filter(|argument| !argument.is_empty())
                .collect();
            let value = function.call(&arguments).map_err(BridgeError::compile)?;
            css.replace_range(start..after + close + 1, &value);
        }
    }
    Ok(css)
}

fn compress(css: &str) -> String {
    css.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect()
}

/// Importer serving URLs under a custom scheme from one directory.
///
/// `PrefixImporter::new("theme:", dir)` maps `theme:dark` to
/// `<dir>/dark.scss` when that file exists, passing on everything else.
#[derive(Debug, Clone)]
pub struct PrefixImporter {
    scheme: String,
    root: PathBuf,
}

impl PrefixImporter {
    pub fn new(scheme: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            scheme: scheme.into(),
            root: root.into(),
        }
    }
}

impl Importer for PrefixImporter {
    fn canonicalize(&self, url: &str, _requesting_file: &Path) -> Option<PathBuf> {
        let name = url.strip_prefix(&self.scheme)?;
        let candidate = self.root.join(format!("{name}.scss"));
        candidate.is_file().then_some(candidate)
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
