use clap::Parser;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use sassbridge_core::{LoadResult, OutputStyle, SassCliCompiler, SassOptions, SassPlugin};

/// Sassbridge - A cached bridge between build hosts and the Sass compiler
#[derive(Parser, Debug, Clone)]
#[command(name = "sassbridge")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Entry stylesheets to build
    #[arg(value_name = "FILE")]
    files: Vec<PathBuf>,

    /// Path to sassbridge.yaml configuration file
    #[arg(short, long, value_name = "FILE")]
    project: Option<PathBuf>,

    /// Output directory for compiled CSS files
    #[arg(long, value_name = "DIR")]
    out_dir: Option<PathBuf>,

    /// Output file (single entry builds only)
    #[arg(long, value_name = "FILE")]
    out_file: Option<PathBuf>,

    /// Output style (expanded, compressed)
    #[arg(long, value_name = "NAME")]
    style: Option<String>,

    /// Append inline source map annotations to the output
    #[arg(long)]
    source_map: bool,

    /// Embed full source text in source maps
    #[arg(long)]
    embed_sources: bool,

    /// Additional directory to resolve imports from (repeatable)
    #[arg(short = 'I', long = "load-path", value_name = "DIR")]
    load_path: Vec<PathBuf>,

    /// Restrict compiler messages to ASCII
    #[arg(long)]
    no_unicode: bool,

    /// Force colored compiler messages
    #[arg(long)]
    color: bool,

    /// Disable colored compiler messages
    #[arg(long)]
    no_color: bool,

    /// Silence warnings coming from stylesheets on the load paths
    #[arg(long)]
    quiet_deps: bool,

    /// Emit every deprecation warning instead of deduplicating them
    #[arg(long)]
    verbose: bool,

    /// Treat a deprecation as an error (repeatable)
    #[arg(long, value_name = "ID")]
    fatal_deprecation: Vec<String>,

    /// Opt into a deprecation before it lands (repeatable)
    #[arg(long, value_name = "ID")]
    future_deprecation: Vec<String>,

    /// Silence a deprecation (repeatable)
    #[arg(long, value_name = "ID")]
    silence_deprecation: Vec<String>,

    /// Path to the sass executable
    #[arg(long, value_name = "FILE")]
    sass_bin: Option<PathBuf>,

    /// Watch input files for changes
    #[arg(short, long)]
    watch: bool,

    /// Initialize a new Sassbridge project
    #[arg(long)]
    init: bool,
}

fn main() -> anyhow::Result<()> {
    // Initialize tracing subscriber
    // Set RUST_LOG=debug for detailed logs, RUST_LOG=info for normal output
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let cli = Cli::parse();

    // Handle --init flag
    if cli.init {
        init_project()?;
        return Ok(());
    }

    // Load configuration
    let config = load_project_config(&cli)?;
    let options = resolve_options(&cli, config.compiler_options.clone())?;

    // Validate that we have input files
    let files = if !cli.files.is_empty() {
        cli.files.clone()
    } else {
        config.files.clone()
    };
    if files.is_empty() {
        eprintln!("Error: No input files specified. Use --help for usage information.");
        std::process::exit(1);
    }

    let targets = OutputTargets {
        out_dir: cli.out_dir.clone().or_else(|| config.out_dir.clone()),
        out_file: cli.out_file.clone().or_else(|| config.out_file.clone()),
    };

    info!(
        "Sassbridge CLI - building with {} style",
        options.style.as_str()
    );
    info!("Input files: {} file(s)", files.len());
    if let Some(ref out_dir) = targets.out_dir {
        info!("Output directory: {}", out_dir.display());
    }
    debug!("Source maps: {}", options.source_map);
    debug!("Watch mode: {}", cli.watch);

    let compiler = match cli.sass_bin {
        Some(ref bin) => SassCliCompiler::with_executable(bin),
        None => SassCliCompiler::new(),
    };
    let mut plugin = SassPlugin::new(Arc::new(compiler), options);

    if cli.watch {
        watch_mode(plugin, files, targets)?;
    } else {
        let summary = build_once(&mut plugin, &files, &targets)?;
        if summary.failures > 0 {
            std::process::exit(1);
        }
        info!("Build completed successfully!");
    }

    Ok(())
}

/// Project configuration file contents
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ProjectConfig {
    compiler_options: SassOptions,
    out_dir: Option<PathBuf>,
    out_file: Option<PathBuf>,
    files: Vec<PathBuf>,
}

/// Load configuration from file (if specified) or fall back to defaults
fn load_project_config(cli: &Cli) -> anyhow::Result<ProjectConfig> {
    let path = match cli.project {
        Some(ref project_path) => project_path.clone(),
        None => PathBuf::from("sassbridge.yaml"),
    };

    if !path.exists() {
        if cli.project.is_some() {
            return Err(anyhow::anyhow!(
                "Failed to load config file: {} does not exist",
                path.display()
            ));
        }
        return Ok(ProjectConfig::default());
    }

    let raw = std::fs::read_to_string(&path)
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", path.display(), e))?;
    serde_yaml::from_str(&raw)
        .map_err(|e| anyhow::anyhow!("Failed to parse {}: {}", path.display(), e))
}

/// Parse the output style name
fn parse_style(style: &str) -> anyhow::Result<OutputStyle> {
    match style {
        "expanded" => Ok(OutputStyle::Expanded),
        "compressed" => Ok(OutputStyle::Compressed),
        _ => Err(anyhow::anyhow!(
            "Invalid style '{}'. Supported styles: expanded, compressed",
            style
        )),
    }
}

/// Merge command-line flags over the configuration file options
fn resolve_options(cli: &Cli, file_options: SassOptions) -> anyhow::Result<SassOptions> {
    let mut options = file_options;

    if let Some(ref style) = cli.style {
        options.style = parse_style(style)?;
    }
    if cli.source_map {
        options.source_map = true;
    }
    if cli.embed_sources {
        options.source_map_include_sources = true;
    }
    // Command-line load paths search after the configured ones
    options.load_paths.extend(cli.load_path.iter().cloned());
    if cli.no_unicode {
        options.alert_ascii = true;
    }
    if cli.color {
        options.alert_color = Some(true);
    }
    if cli.no_color {
        options.alert_color = Some(false);
    }
    if cli.quiet_deps {
        options.quiet_deps = true;
    }
    if cli.verbose {
        options.verbose = true;
    }
    options
        .fatal_deprecations
        .extend(cli.fatal_deprecation.iter().cloned());
    options
        .future_deprecations
        .extend(cli.future_deprecation.iter().cloned());
    options
        .silence_deprecations
        .extend(cli.silence_deprecation.iter().cloned());

    Ok(options)
}

/// Initialize a new Sassbridge project with a configuration file
fn init_project() -> anyhow::Result<()> {
    println!("Initializing new Sassbridge project...");

    if Path::new("sassbridge.yaml").exists() {
        return Err(anyhow::anyhow!("sassbridge.yaml already exists"));
    }

    let config = r#"# Sassbridge Configuration File

compilerOptions:
  style: "expanded"      # Output style: expanded, compressed
  sourceMap: true        # Append inline source map annotations
  loadPaths: []          # Extra directories for import resolution

files:
  - "src/main.scss"      # Entry stylesheets to build
"#;

    std::fs::write("sassbridge.yaml", config)?;
    println!("Created sassbridge.yaml");

    // Create src directory if it doesn't exist
    std::fs::create_dir_all("src")?;
    println!("Created src/ directory");

    // Create a sample file
    let sample = r#"// Welcome to Sassbridge!
// This is a sample stylesheet to get you started.

$accent: #336699;

.app {
  color: $accent;
  padding: 1rem;
}
"#;

    std::fs::write("src/main.scss", sample)?;
    println!("Created src/main.scss");

    println!("\nProject initialized successfully!");
    println!("Run 'sassbridge src/main.scss' to build your first stylesheet.");

    Ok(())
}

/// Where compiled CSS lands
struct OutputTargets {
    out_dir: Option<PathBuf>,
    out_file: Option<PathBuf>,
}

/// Determine the output file path for a given input file
fn determine_output_path(file_path: &Path, targets: &OutputTargets) -> PathBuf {
    if let Some(out_file) = &targets.out_file {
        out_file.clone()
    } else if let Some(out_dir) = &targets.out_dir {
        let file_name = file_path
            .file_stem()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();
        out_dir.join(format!("{}.css", file_name))
    } else {
        file_path.with_extension("css")
    }
}

/// Result of one pass over the input files
struct BuildSummary {
    failures: usize,
    watch_files: Vec<PathBuf>,
}

/// Build every input file once, writing outputs and reporting failures
fn build_once(
    plugin: &mut SassPlugin,
    files: &[PathBuf],
    targets: &OutputTargets,
) -> anyhow::Result<BuildSummary> {
    let mut summary = BuildSummary {
        failures: 0,
        watch_files: Vec::new(),
    };

    for file in files {
        if !plugin.matches(file) {
            warn!("Skipping {}: not a stylesheet", file.display());
            continue;
        }

        let absolute = std::path::absolute(file)?;
        match plugin.load(&absolute) {
            LoadResult::Success(success) => {
                let output_path = determine_output_path(file, targets);
                if let Some(parent) = output_path.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                std::fs::write(&output_path, &success.output_text)?;
                info!("Generated: {:?}", output_path);
                summary.watch_files.extend(success.watch_files);
            }
            LoadResult::Failure(failure) => {
                summary.failures += 1;
                eprintln!(
                    "\x1b[31merror\x1b[0m [{}]: {}",
                    file.display(),
                    failure.message
                );
                // A failed entry stays on the watch list; fixing it has to
                // trigger a rebuild
                summary.watch_files.push(absolute);
            }
        }
    }

    Ok(summary)
}

/// Register newly discovered watch files with the watcher, one watch per
/// parent directory
fn register_watch_files(
    watcher: &mut notify::RecommendedWatcher,
    new_files: &[PathBuf],
    watched_dirs: &mut rustc_hash::FxHashSet<PathBuf>,
    watch_set: &mut rustc_hash::FxHashSet<PathBuf>,
) -> anyhow::Result<()> {
    use notify::{RecursiveMode, Watcher};

    for file in new_files {
        watch_set.insert(file.clone());
        let dir = match file.parent() {
            Some(parent) if parent != Path::new("") => parent.to_path_buf(),
            _ => file.clone(),
        };
        if watched_dirs.insert(dir.clone()) {
            watcher.watch(&dir, RecursiveMode::NonRecursive)?;
        }
    }

    Ok(())
}

/// Watch mode - rebuild on file changes
fn watch_mode(
    mut plugin: SassPlugin,
    files: Vec<PathBuf>,
    targets: OutputTargets,
) -> anyhow::Result<()> {
    use notify::{
        event::{EventKind, ModifyKind},
        Event,
    };
    use rustc_hash::FxHashSet;
    use std::sync::mpsc::channel;
    use std::time::Duration;

    println!("Watching for changes... (Press Ctrl+C to stop)");

    // Initial build
    println!("\nInitial build:");
    let summary = build_once(&mut plugin, &files, &targets)?;

    // Create a channel to receive file system events
    let (tx, rx) = channel();

    // Create a watcher
    let mut watcher = notify::recommended_watcher(move |res: Result<Event, notify::Error>| {
        if let Ok(event) = res {
            let _ = tx.send(event);
        }
    })?;

    // Watch everything the initial build touched, failed entries included;
    // later builds may widen the set as new modules appear
    let mut watched_dirs: FxHashSet<PathBuf> = FxHashSet::default();
    let mut watch_set: FxHashSet<PathBuf> = FxHashSet::default();
    register_watch_files(&mut watcher, &summary.watch_files, &mut watched_dirs, &mut watch_set)?;

    // Handle file system events
    let mut last_build = std::time::Instant::now();
    let debounce_duration = Duration::from_millis(100);

    loop {
        match rx.recv_timeout(Duration::from_millis(100)) {
            Ok(event) => {
                // Check if this is a file modification event
                let should_rebuild = matches!(
                    event.kind,
                    EventKind::Modify(ModifyKind::Data(_)) | EventKind::Create(_)
                );

                if should_rebuild {
                    // Check if any of the changed paths are files we loaded
                    let changed_watched = event.paths.iter().any(|path| {
                        watch_set
                            .iter()
                            .any(|watched| watched.file_name() == path.file_name())
                    });

                    if changed_watched {
                        // Debounce: only rebuild if enough time has passed
                        let now = std::time::Instant::now();
                        if now.duration_since(last_build) >= debounce_duration {
                            println!("\n\nFile changed, rebuilding...");
                            let summary = build_once(&mut plugin, &files, &targets)?;
                            register_watch_files(
                                &mut watcher,
                                &summary.watch_files,
                                &mut watched_dirs,
                                &mut watch_set,
                            )?;
                            last_build = now;
                        }
                    }
                }
            }
            Err(std::sync::mpsc::RecvTimeoutError::Timeout) => {
                // No events, continue watching
                continue;
            }
            Err(std::sync::mpsc::RecvTimeoutError::Disconnected) => {
                return Err(anyhow::anyhow!("File watcher disconnected"));
            }
        }
    }
}
