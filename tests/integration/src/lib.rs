//! Integration test utilities for xreact
//!
//! Shared object models used by the integration suites, plus a tracing layer capturing log
//! events so tests can assert on warnings raised by turned-off subscriptions.

pub mod models;

use xreact_core::{ExceptionHandlingPolicy, ReactorConfig};

/// Configuration unrelated to the process-wide defaults, using `policy`.
pub fn isolated(policy: ExceptionHandlingPolicy) -> ReactorConfig {
	ReactorConfig::isolated().with_policy(policy)
}
