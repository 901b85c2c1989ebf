//! Value requirements of properties.
//!
//! A requirement either rejects a value ([`Requirement::require`]) or silently maps it into an
//! acceptable domain ([`Requirement::coerce`]). Coercions run for every value.

use std::rc::Rc;

/// Outcome of checking one value against one requirement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationResult {
	is_valid: bool,
	message: String,
}

impl ValidationResult {
	pub fn valid() -> Self {
		Self {
			is_valid: true,
			message: String::new(),
		}
	}

	pub fn invalid(message: impl Into<String>) -> Self {
		Self {
			is_valid: false,
			message: message.into(),
		}
	}

	pub fn is_valid(&self) -> bool {
		self.is_valid
	}

	/// Failure message; empty for valid results.
	pub fn message(&self) -> &str {
		&self.message
	}
}

/// Condition on the values of a property.
pub struct Requirement<T> {
	condition: Rc<dyn Fn(&T) -> bool>,
	message: String,
	coercion: Option<Rc<dyn Fn(T) -> T>>,
}

impl<T> Requirement<T> {
	/// Requirement that rejects values failing `condition` with `message`.
	pub fn require<F>(condition: F, message: impl Into<String>) -> Self
	where
		F: Fn(&T) -> bool + 'static,
	{
		Self {
			condition: Rc::new(condition),
			message: message.into(),
			coercion: None,
		}
	}

	/// Requirement that passes every value through `coercion`.
	pub fn coerce<F>(coercion: F, message: impl Into<String>) -> Self
	where
		F: Fn(T) -> T + 'static,
	{
		Self {
			condition: Rc::new(|_| false),
			message: message.into(),
			coercion: Some(Rc::new(coercion)),
		}
	}

	pub fn validate(&self, value: &T) -> ValidationResult {
		if (self.condition)(value) {
			ValidationResult::valid()
		} else {
			ValidationResult::invalid(self.message.clone())
		}
	}

	/// Whether a failed validation coerces instead of rejecting.
	pub fn is_silent(&self) -> bool {
		self.coercion.is_some()
	}

	/// Coerce `value`, or `None` for rejecting requirements.
	pub fn apply_coercion(&self, value: T) -> Option<T> {
		self.coercion.as_ref().map(|coercion| coercion(value))
	}
}
