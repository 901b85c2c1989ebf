//! Reactor error types.
//!
//! Every fallible operation in the engine returns [`ReactorResult`]. Errors raised while a
//! live subscription re-evaluates its expression are wrapped in
//! [`ReactorError::SubscriptionFailed`] at the subscription boundary, so the original cause is
//! always reachable through [`ReactorError::root_cause`].

use thiserror::Error;

/// Result type for reactor operations.
pub type ReactorResult<T> = Result<T, ReactorError>;

/// Reactive engine errors.
#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum ReactorError {
	/// Expression analysis found no member that can notify about changes.
	#[error(
		"the expression does not contain any trackable member; \
		 at least one notifying property, collection or field-constant root is required"
	)]
	NothingTrackable,

	/// An expression expected to be a plain member access has another shape.
	#[error("expression must be a simple member access (e.g. `owner.property`), got {found}")]
	InvalidExpressionShape {
		/// Description of the node kind that was found instead.
		found: String,
	},

	/// A guarded notification re-entered the same dependency link.
	#[error("{message}")]
	CyclicAccess {
		/// Human readable message including the rendered access layers.
		message: String,
	},

	/// The object that should raise a change notification does not support raising it.
	#[error(
		"cannot raise a change notification for '{property}' on {type_name}: \
		 the object does not implement RaisePropertyChanged"
	)]
	CannotNotify {
		/// Type name of the object that cannot notify.
		type_name: String,
		/// Property whose notification was requested.
		property: String,
	},

	/// A subscription failed while producing or consuming a value.
	#[error("subscription failed: {0}")]
	SubscriptionFailed(Box<ReactorError>),

	/// An operation was called in a state where it is not valid.
	#[error("invalid operation: {0}")]
	InvalidOperation(String),

	/// A property requirement rejected a value.
	#[error("cannot set the value {value} on property '{property}' because: {message}")]
	RequirementFailed {
		/// Property name.
		property: String,
		/// Debug rendering of the rejected value.
		value: String,
		/// Failure message supplied with the requirement.
		message: String,
	},

	/// User supplied evaluation code reported a failure.
	#[error("evaluation failed: {0}")]
	Evaluation(String),
}

impl ReactorError {
	/// Wrap this error in [`ReactorError::SubscriptionFailed`] unless it already is one.
	pub fn into_subscription_failure(self) -> Self {
		match self {
			Self::SubscriptionFailed(_) => self,
			other => Self::SubscriptionFailed(Box::new(other)),
		}
	}

	/// Innermost error, looking through any number of subscription wrappers.
	pub fn root_cause(&self) -> &ReactorError {
		let mut current = self;
		while let Self::SubscriptionFailed(inner) = current {
			current = inner;
		}
		current
	}

	/// Whether the root cause is [`ReactorError::CannotNotify`].
	///
	/// Such errors always propagate, whatever the exception handling policy says.
	pub fn is_cannot_notify(&self) -> bool {
		matches!(self.root_cause(), Self::CannotNotify { .. })
	}

	/// Whether the root cause is [`ReactorError::CyclicAccess`].
	pub fn is_cyclic_access(&self) -> bool {
		matches!(self.root_cause(), Self::CyclicAccess { .. })
	}
}
