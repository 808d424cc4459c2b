//! Load helpers for tests
//!
//! Provides convenient functions for assembling fully wired plugins
//! around the mock compile capability, so integration tests read as
//! plain host interactions.

use std::sync::Arc;

use sassbridge_core::{
    InstrumentedCompiler, LoadFailure, LoadResult, LoadSuccess, SassOptions, SassPlugin,
};

use crate::mocks::MockSassCompiler;

/// Build a plugin over the mock compile capability.
pub fn mock_plugin(options: SassOptions) -> SassPlugin {
    SassPlugin::new(Arc::new(MockSassCompiler::new()), options)
}

/// Build a plugin whose compile capability counts the compilations that
/// actually ran.
pub fn counted_mock_plugin(
    options: SassOptions,
) -> (SassPlugin, Arc<InstrumentedCompiler<MockSassCompiler>>) {
    let compiler = Arc::new(InstrumentedCompiler::new(MockSassCompiler::new()));
    let plugin = SassPlugin::new(compiler.clone(), options);
    (plugin, compiler)
}

/// Unwrap a load that must have succeeded.
pub fn expect_success(result: LoadResult) -> LoadSuccess {
    match result {
        LoadResult::Success(success) => success,
        LoadResult::Failure(failure) => {
            panic!("expected success, got failure: {}", failure.message)
        }
    }
}

/// Unwrap a load that must have failed.
pub fn expect_failure(result: LoadResult) -> LoadFailure {
    match result {
        LoadResult::Success(success) => {
            panic!("expected failure, got output: {}", success.output_text)
        }
        LoadResult::Failure(failure) => failure,
    }
}
