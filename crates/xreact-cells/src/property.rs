//! Property cells.
//!
//! [`Property<T>`] stores a value and raises change notifications through its [`Reactor`] when the
//! value actually changes. [`LazyProperty<T>`] computes its value on demand and caches it until
//! invalidated.
//!
//! ## Setting a value
//!
//! 1. Values equal to the current one are ignored
//! 2. Requirements run in the order they were added; coercions replace the value, other
//!    requirements reject it with [`ReactorError::RequirementFailed`]
//! 3. The value is stored, then property-changing, property-changed and the value stream fire
//!
//! ## Example
//!
//! ```ignore
//! let age = reactor
//! 	.create("Age", 0)
//! 	.require(|age| *age >= 0, "age must not be negative")?
//! 	.coerce(|age| age.min(150), "age capped at 150")?;
//!
//! age.set(200)?;
//! assert_eq!(age.get(), 150);
//! ```

use core::cell::{Cell, RefCell};
use core::fmt;
use std::rc::Rc;

use tracing::debug;
use xreact_core::{HandlerId, ObservableExpression, ReactorError, ReactorResult, Subscription, Thunk};

use crate::reactor::Reactor;
use crate::requirement::Requirement;

/// Ordered requirements of one property.
struct Requirements<T> {
	list: RefCell<Vec<Rc<Requirement<T>>>>,
}

impl<T: fmt::Debug> Requirements<T> {
	fn new() -> Self {
		Self {
			list: RefCell::new(Vec::new()),
		}
	}

	fn push(&self, requirement: Requirement<T>) {
		self.list.borrow_mut().push(Rc::new(requirement));
	}

	fn pop(&self) {
		self.list.borrow_mut().pop();
	}

	fn validate(&self, reactor: &Reactor, property: &str, mut value: T) -> ReactorResult<T> {
		let requirements: Vec<_> = self.list.borrow().iter().cloned().collect();
		for requirement in requirements {
			let result = requirement.validate(&value);
			if result.is_valid() {
				continue;
			}
			let rendered = format!("{value:?}");
			match requirement.apply_coercion(value) {
				Some(coerced) => {
					debug!(
						object = %reactor.id(),
						property,
						from = %rendered,
						to = ?coerced,
						message = result.message(),
						"property value coerced"
					);
					value = coerced;
				}
				None => {
					return Err(ReactorError::RequirementFailed {
						property: property.to_string(),
						value: rendered,
						message: result.message().to_string(),
					});
				}
			}
		}
		Ok(value)
	}
}

struct PropertyCell<T> {
	reactor: Reactor,
	name: String,
	value: RefCell<T>,
	requirements: Requirements<T>,
	binding: RefCell<Option<Subscription>>,
}

/// Notifying value cell.
///
/// Cloning yields another handle to the same cell.
pub struct Property<T: 'static> {
	cell: Rc<PropertyCell<T>>,
}

impl<T: 'static> Clone for Property<T> {
	fn clone(&self) -> Self {
		Self {
			cell: Rc::clone(&self.cell),
		}
	}
}

impl<T> Property<T>
where
	T: Clone + PartialEq + fmt::Debug + 'static,
{
	pub(crate) fn new(reactor: Reactor, name: impl Into<String>, initial: T) -> Self {
		Self {
			cell: Rc::new(PropertyCell {
				reactor,
				name: name.into(),
				value: RefCell::new(initial),
				requirements: Requirements::new(),
				binding: RefCell::new(None),
			}),
		}
	}

	pub fn name(&self) -> &str {
		&self.cell.name
	}

	/// Reactor raising this property's notifications.
	pub fn reactor(&self) -> &Reactor {
		&self.cell.reactor
	}

	/// Current value.
	pub fn get(&self) -> T {
		self.cell.value.borrow().clone()
	}

	/// Run `f` on the current value without cloning it.
	pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
		f(&self.cell.value.borrow())
	}

	/// Validate and store `value`, then raise the change notifications.
	///
	/// # Errors
	///
	/// [`ReactorError::RequirementFailed`] when a requirement rejects the value (the current value
	/// is kept), or the first error returned by a change handler.
	pub fn set(&self, value: T) -> ReactorResult<()> {
		if *self.cell.value.borrow() == value {
			return Ok(());
		}
		let value = self.cell.requirements.validate(&self.cell.reactor, &self.cell.name, value)?;
		self.store(value)
	}

	fn store(&self, value: T) -> ReactorResult<()> {
		if *self.cell.value.borrow() == value {
			return Ok(());
		}
		let old = self.cell.value.replace(value.clone());
		self.cell.reactor.raise_property_changed(&self.cell.name, &old, &value)
	}

	fn revalidate(&self) -> ReactorResult<()> {
		let value = self.cell.requirements.validate(&self.cell.reactor, &self.cell.name, self.get())?;
		self.store(value)
	}

	/// Reject values failing `condition`. The current value is checked right away.
	pub fn require<F>(self, condition: F, message: impl Into<String>) -> ReactorResult<Self>
	where
		F: Fn(&T) -> bool + 'static,
	{
		self.add_requirement(Requirement::require(condition, message))
	}

	/// Pass every value through `coercion`. The current value is coerced right away.
	pub fn coerce<F>(self, coercion: F, message: impl Into<String>) -> ReactorResult<Self>
	where
		F: Fn(T) -> T + 'static,
	{
		self.add_requirement(Requirement::coerce(coercion, message))
	}

	fn add_requirement(self, requirement: Requirement<T>) -> ReactorResult<Self> {
		self.cell.requirements.push(requirement);
		if let Err(err) = self.revalidate() {
			self.cell.requirements.pop();
			return Err(err);
		}
		Ok(self)
	}

	/// Observe the values of this property.
	pub fn on_change<F>(&self, observer: F) -> HandlerId
	where
		F: Fn(&T) + 'static,
	{
		self.cell.reactor.when_property_changes(self.cell.name.clone(), observer)
	}

	/// Keep `subscription` alive as long as this property. Replaces a previous binding.
	pub fn bind(&self, subscription: Subscription) {
		if let Some(previous) = self.cell.binding.replace(Some(subscription)) {
			previous.dispose();
		}
	}

	/// Dispose the binding created by [`bind`](Self::bind), if any.
	pub fn unbind(&self) {
		if let Some(binding) = self.cell.binding.take() {
			binding.dispose();
		}
	}

	/// Take the current value of `source`, then keep following it.
	///
	/// The binding replaces a previous one. A filtered-out current value leaves the property as
	/// it is. The current value is pushed once the chains are attached, so a property following
	/// itself fails here with a cyclic access.
	///
	/// # Errors
	///
	/// [`ReactorError::SubscriptionFailed`] wrapping the error raised while pushing the current
	/// value. The property is left unbound.
	pub fn follow(&self, source: ObservableExpression<T>) -> ReactorResult<()> {
		let target = self.downgrade();
		let subscription = source.try_set(move |value| target.set(value))?;
		self.bind(subscription);
		Ok(())
	}

	pub fn is_bound(&self) -> bool {
		self.cell.binding.borrow().as_ref().is_some_and(Subscription::is_active)
	}

	pub(crate) fn downgrade(&self) -> WeakProperty<T> {
		WeakProperty {
			cell: Rc::downgrade(&self.cell),
		}
	}
}

impl<T: fmt::Debug + 'static> fmt::Debug for Property<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Property")
			.field("name", &self.cell.name)
			.field("value", &*self.cell.value.borrow())
			.finish()
	}
}

/// Non-owning property handle held by bindings.
pub(crate) struct WeakProperty<T> {
	cell: std::rc::Weak<PropertyCell<T>>,
}

impl<T> WeakProperty<T>
where
	T: Clone + PartialEq + fmt::Debug + 'static,
{
	/// Set the value when the property is still alive.
	pub(crate) fn set(&self, value: T) -> ReactorResult<()> {
		match self.cell.upgrade() {
			Some(cell) => Property { cell }.set(value),
			None => Ok(()),
		}
	}
}

struct LazyPropertyCell<T> {
	reactor: Reactor,
	name: String,
	value: RefCell<T>,
	up_to_date: Cell<bool>,
	getter: Thunk<T>,
	requirements: Requirements<T>,
	binding: RefCell<Option<Subscription>>,
}

/// Property computed on first read and cached until invalidated.
pub struct LazyProperty<T: 'static> {
	cell: Rc<LazyPropertyCell<T>>,
}

impl<T: 'static> Clone for LazyProperty<T> {
	fn clone(&self) -> Self {
		Self {
			cell: Rc::clone(&self.cell),
		}
	}
}

impl<T> LazyProperty<T>
where
	T: Clone + PartialEq + Default + fmt::Debug + 'static,
{
	pub(crate) fn new(reactor: Reactor, name: impl Into<String>, getter: Thunk<T>) -> Self {
		Self {
			cell: Rc::new(LazyPropertyCell {
				reactor,
				name: name.into(),
				value: RefCell::new(T::default()),
				up_to_date: Cell::new(false),
				getter,
				requirements: Requirements::new(),
				binding: RefCell::new(None),
			}),
		}
	}

	pub fn name(&self) -> &str {
		&self.cell.name
	}

	/// Cached value, computed first when stale.
	pub fn get(&self) -> ReactorResult<T> {
		if !self.cell.up_to_date.get() {
			let value = (self.cell.getter)()?;
			*self.cell.value.borrow_mut() = value;
			self.cell.up_to_date.set(true);
		}
		Ok(self.cell.value.borrow().clone())
	}

	/// Override the value until the next invalidation.
	pub fn set(&self, value: T) -> ReactorResult<()> {
		if self.cell.up_to_date.get() && *self.cell.value.borrow() == value {
			return Ok(());
		}
		let value = self.cell.requirements.validate(&self.cell.reactor, &self.cell.name, value)?;
		let old = self.cell.value.replace(value.clone());
		self.cell.up_to_date.set(true);
		self.cell.reactor.raise_property_changed(&self.cell.name, &old, &value)
	}

	pub fn is_value_up_to_date(&self) -> bool {
		self.cell.up_to_date.get()
	}

	/// Mark the cached value stale.
	///
	/// Dependents are told the property changed when a fresh value was cached; they read the new
	/// value lazily.
	pub fn invalidate(&self) -> ReactorResult<()> {
		if self.cell.up_to_date.replace(false) {
			self.cell.reactor.notify(Some(&self.cell.name))?;
		}
		Ok(())
	}

	/// Reject overriding values failing `condition`.
	pub fn require<F>(self, condition: F, message: impl Into<String>) -> Self
	where
		F: Fn(&T) -> bool + 'static,
	{
		self.cell.requirements.push(Requirement::require(condition, message));
		self
	}

	/// Pass overriding values through `coercion`.
	pub fn coerce<F>(self, coercion: F, message: impl Into<String>) -> Self
	where
		F: Fn(T) -> T + 'static,
	{
		self.cell.requirements.push(Requirement::coerce(coercion, message));
		self
	}

	pub(crate) fn bind(&self, subscription: Subscription) {
		if let Some(previous) = self.cell.binding.replace(Some(subscription)) {
			previous.dispose();
		}
	}

	/// Stop invalidating on changes of the source expression.
	pub fn unbind(&self) {
		if let Some(binding) = self.cell.binding.take() {
			binding.dispose();
		}
	}

	pub(crate) fn downgrade(&self) -> WeakLazyProperty<T> {
		WeakLazyProperty {
			cell: Rc::downgrade(&self.cell),
		}
	}
}

/// Non-owning lazy property handle held by bindings.
pub(crate) struct WeakLazyProperty<T> {
	cell: std::rc::Weak<LazyPropertyCell<T>>,
}

impl<T> WeakLazyProperty<T>
where
	T: Clone + PartialEq + Default + fmt::Debug + 'static,
{
	/// Invalidate the property when it is still alive.
	pub(crate) fn invalidate(&self) -> ReactorResult<()> {
		match self.cell.upgrade() {
			Some(cell) => LazyProperty { cell }.invalidate(),
			None => Ok(()),
		}
	}
}

impl<T: fmt::Debug + 'static> fmt::Debug for LazyProperty<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("LazyProperty")
			.field("name", &self.cell.name)
			.field("up_to_date", &self.cell.up_to_date.get())
			.finish()
	}
}
