//! Binding expressions to properties.
//!
//! `via_property(name).on(&reactor)` creates a property on `reactor` that follows an observable
//! expression; `via_lazy_property(name)` creates a [`LazyProperty`] invalidated by the
//! expression's change stream instead.
//!
//! ```ignore
//! let people_limit = React::to(Expr::object(&room).property("SquareMeters"), {
//! 	let room = Rc::clone(&room);
//! 	move || room.square_meters.get() / 10
//! })?
//! .via_property("PeopleLimit")
//! .on(&reactor)?;
//! ```

use core::fmt;

use xreact_core::{LazyObservableExpression, ObservableExpression, ReactorResult};

use crate::property::{LazyProperty, Property};
use crate::reactor::Reactor;

/// Name and source of a property that is not created yet.
pub struct PropertyStub<T> {
	name: String,
	source: ObservableExpression<T>,
}

impl<T> PropertyStub<T>
where
	T: Clone + PartialEq + Default + fmt::Debug + 'static,
{
	pub fn name(&self) -> &str {
		&self.name
	}

	/// Create the property on `reactor`, initialized with the current value of the source.
	///
	/// The property starts from `T::default()` when the source filters its current value out.
	pub fn on(self, reactor: &Reactor) -> ReactorResult<Property<T>> {
		let property = reactor.create(self.name, T::default());
		property.follow(self.source)?;
		Ok(property)
	}
}

/// Name and change stream of a lazy property that is not created yet.
pub struct LazyPropertyStub<T> {
	name: String,
	source: LazyObservableExpression<T>,
}

impl<T> LazyPropertyStub<T>
where
	T: Clone + PartialEq + Default + fmt::Debug + 'static,
{
	pub(crate) fn new(name: impl Into<String>, source: LazyObservableExpression<T>) -> Self {
		Self {
			name: name.into(),
			source,
		}
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	/// Create the lazy property on `reactor`.
	pub fn on(self, reactor: &Reactor) -> ReactorResult<LazyProperty<T>> {
		let property = LazyProperty::new(reactor.clone(), self.name, self.source.thunk());
		let target = property.downgrade();
		let subscription = self
			.source
			.skip_initial()
			.try_subscribe(move |_| target.invalidate())?;
		property.bind(subscription);
		Ok(property)
	}
}

/// Property bindings for observable expressions.
pub trait ObservableExpressionExt<T> {
	/// Follow the expression with an eagerly updated property.
	fn via_property(self, name: impl Into<String>) -> PropertyStub<T>;

	/// Follow the expression with a lazily recomputed property.
	fn via_lazy_property(self, name: impl Into<String>) -> LazyPropertyStub<T>;
}

impl<T: 'static> ObservableExpressionExt<T> for ObservableExpression<T> {
	fn via_property(self, name: impl Into<String>) -> PropertyStub<T> {
		PropertyStub {
			name: name.into(),
			source: self,
		}
	}

	fn via_lazy_property(self, name: impl Into<String>) -> LazyPropertyStub<T> {
		LazyPropertyStub {
			name: name.into(),
			source: self.as_lazy(),
		}
	}
}
