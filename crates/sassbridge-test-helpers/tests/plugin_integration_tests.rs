//! Full plugin flows over the mock compile capability: load, cache,
//! importer chain, logging, and source maps working together.

use std::collections::HashMap;
use std::sync::Arc;

use sassbridge_core::sourcemap::split_annotation;
use sassbridge_core::{
    CollectingLogger, CustomFunction, OutputStyle, SassOptions, SassPlugin,
};

use sassbridge_test_helpers::fixtures::{
    base_partial, bump_mtime, failing_stylesheet, indented_stylesheet, simple_stylesheet,
    stylesheet_with_use, warning_stylesheet, FixtureTree,
};
use sassbridge_test_helpers::load::{
    counted_mock_plugin, expect_failure, expect_success, mock_plugin,
};
use sassbridge_test_helpers::mocks::{MockSassCompiler, PrefixImporter};

// =========================================================================
// Loading and watch files
// =========================================================================

/// Loading an entry with one module reports both as watch files, the
/// entry first.
#[test]
fn test_load_compiles_and_reports_watch_files() {
    let tree = FixtureTree::new();
    let entry = tree.write("app.scss", stylesheet_with_use());
    let base = tree.write("_base.scss", base_partial());

    let mut plugin = mock_plugin(SassOptions::default());
    let success = expect_success(plugin.load(&entry));

    assert!(success.output_text.contains(".base"));
    assert!(success.output_text.contains(".app"));
    let base_at = success.output_text.find(".base").unwrap();
    let app_at = success.output_text.find(".app").unwrap();
    assert!(base_at < app_at);

    assert_eq!(success.watch_files, vec![entry, base]);
    assert_eq!(success.output_kind.as_str(), "css");
}

/// An unchanged standalone entry compiles exactly once across loads.
#[test]
fn test_unchanged_entry_compiles_once() {
    let tree = FixtureTree::new();
    let entry = tree.write("app.scss", simple_stylesheet());

    let (mut plugin, counted) = counted_mock_plugin(SassOptions::default());
    let first = expect_success(plugin.load(&entry));
    let second = expect_success(plugin.load(&entry));

    assert_eq!(first, second);
    assert_eq!(counted.compilations(), 1);
}

/// Module discovery costs one extra compile; afterwards loads hit cache.
#[test]
fn test_module_discovery_then_cached() {
    let tree = FixtureTree::new();
    let entry = tree.write("app.scss", stylesheet_with_use());
    tree.write("_base.scss", base_partial());

    let (mut plugin, counted) = counted_mock_plugin(SassOptions::default());
    expect_success(plugin.load(&entry));
    expect_success(plugin.load(&entry));
    expect_success(plugin.load(&entry));
    assert_eq!(counted.compilations(), 2);
}

/// Editing a module shows up in the next load of its dependent.
#[test]
fn test_editing_module_recompiles_dependent() {
    let tree = FixtureTree::new();
    let entry = tree.write("app.scss", stylesheet_with_use());
    let base = tree.write("_base.scss", base_partial());

    let mut plugin = mock_plugin(SassOptions::default());
    expect_success(plugin.load(&entry));
    expect_success(plugin.load(&entry));

    tree.write("_base.scss", ".base { padding: 1rem; }\n");
    bump_mtime(&base);

    let reloaded = expect_success(plugin.load(&entry));
    assert!(reloaded.output_text.contains("padding: 1rem"));
}

/// Indented-syntax entries load like any other stylesheet.
#[test]
fn test_indented_syntax_entry() {
    let tree = FixtureTree::new();
    let entry = tree.write("nav.sass", indented_stylesheet());

    let mut plugin = mock_plugin(SassOptions::default());
    let success = expect_success(plugin.load(&entry));
    assert!(success.output_text.contains(".nav"));
}

// =========================================================================
// Importer chain
// =========================================================================

/// Modules resolve through the configured load paths.
#[test]
fn test_load_path_resolution() {
    let tree = FixtureTree::new();
    let vendor = tree.mkdir("vendor");
    tree.write("vendor/_grid.scss", ".grid { display: flex; }\n");
    let entry = tree.write("app.scss", "@use \"grid\";\n.app { margin: 0; }\n");

    let options = SassOptions {
        load_paths: vec![vendor],
        ..SassOptions::default()
    };
    let mut plugin = mock_plugin(options);
    let success = expect_success(plugin.load(&entry));
    assert!(success.output_text.contains(".grid"));
}

/// Editing a module that resolved through a load path invalidates its
/// dependent.
#[test]
fn test_editing_load_path_module_recompiles_dependent() {
    let tree = FixtureTree::new();
    let vendor = tree.mkdir("vendor");
    let grid = tree.write("vendor/_grid.scss", ".grid { display: flex; }\n");
    let entry = tree.write("app.scss", "@use \"grid\";\n.app { margin: 0; }\n");

    let options = SassOptions {
        load_paths: vec![vendor],
        ..SassOptions::default()
    };
    let (mut plugin, compiler) = counted_mock_plugin(options);
    expect_success(plugin.load(&entry));
    expect_success(plugin.load(&entry));

    tree.write("vendor/_grid.scss", ".grid { display: grid; }\n");
    bump_mtime(&grid);

    let reloaded = expect_success(plugin.load(&entry));
    assert!(reloaded.output_text.contains("display: grid"));
    assert_eq!(compiler.compilations(), 3);
}

/// A caller-supplied importer answers URLs the filesystem cannot.
#[test]
fn test_custom_importer_resolves_scheme_urls() {
    let tree = FixtureTree::new();
    tree.mkdir("themes");
    tree.write("themes/dark.scss", ".theme { background: black; }\n");
    let entry = tree.write("app.scss", "@use \"theme:dark\";\n.app { margin: 0; }\n");

    let options = SassOptions {
        importers: vec![Arc::new(PrefixImporter::new("theme:", tree.path("themes")))],
        ..SassOptions::default()
    };
    let mut plugin = mock_plugin(options);
    let success = expect_success(plugin.load(&entry));
    assert!(success.output_text.contains(".theme"));
}

/// The filesystem importer always runs before caller-supplied ones.
#[test]
fn test_builtin_importer_wins_over_custom() {
    let tree = FixtureTree::new();
    tree.mkdir("themes");
    tree.write("themes/shared.scss", ".themed { color: white; }\n");
    tree.write("shared.scss", ".local { color: black; }\n");
    let entry = tree.write("app.scss", "@use \"shared\";\n");

    let options = SassOptions {
        importers: vec![Arc::new(PrefixImporter::new("", tree.path("themes")))],
        ..SassOptions::default()
    };
    let mut plugin = mock_plugin(options);
    let success = expect_success(plugin.load(&entry));
    assert!(success.output_text.contains(".local"));
    assert!(!success.output_text.contains(".themed"));
}

// =========================================================================
// Diagnostics
// =========================================================================

/// Warnings emitted during compilation land in the configured logger.
#[test]
fn test_warn_reaches_logger() {
    let tree = FixtureTree::new();
    let entry = tree.write("app.scss", warning_stylesheet());

    let logger = Arc::new(CollectingLogger::new());
    let options = SassOptions {
        logger: Some(logger.clone()),
        ..SassOptions::default()
    };
    let mut plugin = mock_plugin(options);
    expect_success(plugin.load(&entry));

    assert_eq!(logger.warnings(), vec!["legacy mixin".to_string()]);
}

/// A failing compilation flattens into the failure shape with the
/// compiler's message.
#[test]
fn test_failure_flattens_message() {
    let tree = FixtureTree::new();
    let entry = tree.write("app.scss", failing_stylesheet());

    let mut plugin = mock_plugin(SassOptions::default());
    let failure = expect_failure(plugin.load(&entry));
    assert!(failure.message.contains("unsupported target"));
}

/// Asking for a file that does not exist is a filesystem failure, not a
/// compiler one.
#[test]
fn test_missing_file_reports_filesystem_failure() {
    let tree = FixtureTree::new();
    let missing = tree.path("gone.scss");

    let mut plugin = mock_plugin(SassOptions::default());
    let failure = expect_failure(plugin.load(&missing));
    assert!(failure.message.contains("IO error"));
    assert!(failure.message.contains("gone.scss"));
}

// =========================================================================
// Output shaping
// =========================================================================

/// The inline annotation decodes back to a map naming every loaded
/// source, including embedded contents when asked for.
#[test]
fn test_sourcemap_annotation_round_trip() {
    let tree = FixtureTree::new();
    let entry = tree.write("app.scss", stylesheet_with_use());
    let base = tree.write("_base.scss", base_partial());

    let options = SassOptions {
        source_map: true,
        source_map_include_sources: true,
        ..SassOptions::default()
    };
    let mut plugin = mock_plugin(options);
    let success = expect_success(plugin.load(&entry));

    let last_line = success.output_text.lines().last().unwrap();
    assert!(last_line.starts_with("/*# sourceMappingURL=data:application/json;charset=utf-8;base64,"));

    let (css, map) = split_annotation(&success.output_text);
    assert!(!css.contains("sourceMappingURL"));
    let map = map.unwrap();
    assert_eq!(
        map.sources,
        vec![entry.display().to_string(), base.display().to_string()]
    );
    assert_eq!(map.sources_content.len(), 2);
    assert_eq!(map.sources_content[1].as_deref(), Some(base_partial()));
}

/// Compressed style renders everything on a single line.
#[test]
fn test_compressed_style_single_line() {
    let tree = FixtureTree::new();
    let entry = tree.write("app.scss", simple_stylesheet());

    let options = SassOptions {
        style: OutputStyle::Compressed,
        ..SassOptions::default()
    };
    let mut plugin = mock_plugin(options);
    let success = expect_success(plugin.load(&entry));
    assert!(!success.output_text.contains('\n'));
    assert!(success.output_text.contains(".button"));
}

/// Custom functions rewrite their call sites in the output.
#[test]
fn test_custom_function_substitution() {
    struct ThemeColor;

    impl CustomFunction for ThemeColor {
        fn call(&self, arguments: &[String]) -> Result<String, String> {
            match arguments.first().map(String::as_str) {
                Some("primary") => Ok("#336699".to_string()),
                other => Err(format!("unknown theme color: {other:?}")),
            }
        }
    }

    let tree = FixtureTree::new();
    let entry = tree.write("app.scss", ".a { color: theme-color(primary); }\n");

    let mut functions: HashMap<String, Arc<dyn CustomFunction>> = HashMap::new();
    functions.insert("theme-color".to_string(), Arc::new(ThemeColor));
    let options = SassOptions {
        functions,
        ..SassOptions::default()
    };
    let mut plugin = mock_plugin(options);
    let success = expect_success(plugin.load(&entry));
    assert!(success.output_text.contains("#336699"));
    assert!(!success.output_text.contains("theme-color("));
}

/// Direct use of the mock without a plugin still honors the compile
/// capability contract.
#[test]
fn test_mock_compiler_reports_entry_in_loaded_files() {
    use sassbridge_core::SassCompiler;

    let tree = FixtureTree::new();
    let entry = tree.write("app.scss", simple_stylesheet());

    let output = MockSassCompiler::new()
        .compile(&entry, &SassOptions::default())
        .unwrap();
    assert_eq!(output.loaded_files, vec![entry]);
    assert!(output.source_map.is_none());
}

/// Plugins only claim stylesheet extensions.
#[test]
fn test_plugin_matches_only_stylesheets() {
    let plugin = SassPlugin::new(
        Arc::new(MockSassCompiler::new()),
        SassOptions::default(),
    );
    assert!(plugin.matches(std::path::Path::new("a.scss")));
    assert!(plugin.matches(std::path::Path::new("a.sass")));
    assert!(!plugin.matches(std::path::Path::new("a.css")));
}
