//! Diagnostic settings and the configuration bundle.
//!
//! [`ReactorConfig`] carries everything the engine would otherwise read from globals: the
//! exception handling policy, the access record shared by cyclic guards, and the marker registry.
//! [`ReactorConfig::global`] hands out the process-wide defaults, while
//! [`ReactorConfig::isolated`] builds fresh instances so that independent graphs (and tests) do not
//! observe each other.
//!
//! ## Example
//!
//! ```ignore
//! use xreact_core::settings::{DiagnosticSettings, ExceptionHandlingPolicy};
//!
//! DiagnosticSettings::global().set_policy(ExceptionHandlingPolicy::TurnOffTheSubscription);
//! // ... live subscriptions now turn themselves off instead of failing
//! DiagnosticSettings::global().reset();
//! ```

use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::RwLock;

use crate::guard::{SharedAccessRecord, global_record, shared_record};
use crate::markers::MarkerRegistry;

/// What a live subscription does when re-evaluation or its observer fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExceptionHandlingPolicy {
	/// Propagate the error out of the mutating call.
	#[default]
	FailFast,
	/// Log the error and deactivate the subscription.
	TurnOffTheSubscription,
}

/// Mutable diagnostic settings.
#[derive(Debug, Default)]
pub struct DiagnosticSettings {
	policy: RwLock<ExceptionHandlingPolicy>,
}

static GLOBAL_SETTINGS: Lazy<Arc<DiagnosticSettings>> =
	Lazy::new(|| Arc::new(DiagnosticSettings::default()));

impl DiagnosticSettings {
	pub fn new(policy: ExceptionHandlingPolicy) -> Self {
		Self {
			policy: RwLock::new(policy),
		}
	}

	/// Process-wide settings.
	pub fn global() -> Arc<DiagnosticSettings> {
		Arc::clone(&GLOBAL_SETTINGS)
	}

	pub fn policy(&self) -> ExceptionHandlingPolicy {
		*self.policy.read()
	}

	/// Change the policy. Only failures raised afterwards are affected.
	pub fn set_policy(&self, policy: ExceptionHandlingPolicy) {
		*self.policy.write() = policy;
	}

	/// Restore [`ExceptionHandlingPolicy::FailFast`].
	pub fn reset(&self) {
		self.set_policy(ExceptionHandlingPolicy::default());
	}
}

/// Configuration passed into analysis, guards and subscriptions.
#[derive(Debug, Clone)]
pub struct ReactorConfig {
	pub diagnostics: Arc<DiagnosticSettings>,
	pub access_record: SharedAccessRecord,
	pub markers: Arc<MarkerRegistry>,
}

impl ReactorConfig {
	/// Process-wide defaults.
	pub fn global() -> Self {
		Self {
			diagnostics: DiagnosticSettings::global(),
			access_record: global_record(),
			markers: MarkerRegistry::global(),
		}
	}

	/// Fresh settings, record and standard markers, unrelated to the process-wide defaults.
	pub fn isolated() -> Self {
		Self {
			diagnostics: Arc::new(DiagnosticSettings::default()),
			access_record: shared_record(),
			markers: Arc::new(MarkerRegistry::standard()),
		}
	}

	/// Use own diagnostic settings with `policy`. The settings this config shared before are left
	/// untouched.
	pub fn with_policy(mut self, policy: ExceptionHandlingPolicy) -> Self {
		self.diagnostics = Arc::new(DiagnosticSettings::new(policy));
		self
	}

	pub fn with_markers(mut self, markers: MarkerRegistry) -> Self {
		self.markers = Arc::new(markers);
		self
	}

	pub fn policy(&self) -> ExceptionHandlingPolicy {
		self.diagnostics.policy()
	}
}

impl Default for ReactorConfig {
	fn default() -> Self {
		Self::global()
	}
}
