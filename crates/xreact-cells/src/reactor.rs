//! Reactor - notifying core of a reactive object
//!
//! A [`Reactor`] owns the change notifications of one object: a property-changing event, a
//! property-changed event and a typed value stream carrying old and new values. Objects built
//! from [`Property`] cells keep a reactor as a field and expose its events through
//! [`reactive_object!`](crate::reactive_object).
//!
//! ## Example
//!
//! ```ignore
//! use xreact_cells::{Property, Reactor, reactive_object};
//!
//! struct Room {
//! 	reactor: Reactor,
//! 	square_meters: Property<i32>,
//! }
//!
//! reactive_object!(Room, reactor);
//!
//! let reactor = Reactor::new("Room");
//! let room = Rc::new(Room {
//! 	square_meters: reactor.create("SquareMeters", 0),
//! 	reactor,
//! });
//! room.square_meters.set(25)?;
//! ```

use core::any::Any;
use core::fmt;
use std::rc::Rc;

use tracing::trace;
use xreact_core::{
	Event, Expr, HandlerId, ObjectId, PropertyChangedArgs, React, ReactorResult,
};

use crate::binding::{LazyPropertyStub, ObservableExpressionExt};
use crate::property::{LazyProperty, Property};

/// Old and new value of a property, as published on the value stream.
pub struct PropertyValueChanged {
	name: String,
	old: Rc<dyn Any>,
	new: Rc<dyn Any>,
}

impl PropertyValueChanged {
	pub fn name(&self) -> &str {
		&self.name
	}

	/// Previous value, if it has type `T`.
	pub fn old<T: Any>(&self) -> Option<&T> {
		self.old.downcast_ref()
	}

	/// Current value, if it has type `T`.
	pub fn new_value<T: Any>(&self) -> Option<&T> {
		self.new.downcast_ref()
	}
}

impl fmt::Debug for PropertyValueChanged {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("PropertyValueChanged").field("name", &self.name).finish_non_exhaustive()
	}
}

struct ReactorInner {
	id: ObjectId,
	property_changing: Event<PropertyChangedArgs>,
	property_changed: Event<PropertyChangedArgs>,
	value_changed: Event<PropertyValueChanged>,
}

/// Change notification hub of one reactive object.
///
/// Cloning a reactor yields another handle to the same events.
#[derive(Clone)]
pub struct Reactor {
	inner: Rc<ReactorInner>,
}

impl Reactor {
	/// Create a reactor for an object of the named type.
	pub fn new(type_name: &'static str) -> Self {
		Self::with_id(ObjectId::new(type_name))
	}

	/// Create a reactor identified by the short name of `T`.
	pub fn of<T: ?Sized>() -> Self {
		Self::with_id(ObjectId::of::<T>())
	}

	fn with_id(id: ObjectId) -> Self {
		Self {
			inner: Rc::new(ReactorInner {
				id,
				property_changing: Event::new(),
				property_changed: Event::new(),
				value_changed: Event::new(),
			}),
		}
	}

	/// Identity of the owning object.
	pub fn id(&self) -> ObjectId {
		self.inner.id
	}

	pub fn property_changing(&self) -> &Event<PropertyChangedArgs> {
		&self.inner.property_changing
	}

	pub fn property_changed(&self) -> &Event<PropertyChangedArgs> {
		&self.inner.property_changed
	}

	/// Stream of every value change, across all properties of the object.
	pub fn value_changed(&self) -> &Event<PropertyValueChanged> {
		&self.inner.value_changed
	}

	/// Publish a value change of property `name`.
	///
	/// Raises property-changing, then property-changed, then the value stream. The first failing
	/// handler stops the sequence and its error is returned.
	pub fn raise_property_changed<T>(&self, name: &str, old: &T, new: &T) -> ReactorResult<()>
	where
		T: Clone + 'static,
	{
		self.notify(Some(name))?;
		self.inner.value_changed.emit(&PropertyValueChanged {
			name: name.to_string(),
			old: Rc::new(old.clone()),
			new: Rc::new(new.clone()),
		})
	}

	/// Raise property-changing and property-changed without a value (`None` means every property).
	pub fn notify(&self, name: Option<&str>) -> ReactorResult<()> {
		trace!(object = %self.inner.id, property = name.unwrap_or("<all>"), "raising property change");
		let args = PropertyChangedArgs::new(self.inner.id, name);
		self.inner.property_changing.emit(&args)?;
		self.inner.property_changed.emit(&args)
	}

	/// Observe the values of property `name`.
	///
	/// Values of another type than `T` are ignored.
	pub fn when_property_changes<T, F>(&self, name: impl Into<String>, observer: F) -> HandlerId
	where
		T: 'static,
		F: Fn(&T) + 'static,
	{
		let name = name.into();
		self.inner.value_changed.connect(move |change: &PropertyValueChanged| {
			if change.name == name
				&& let Some(value) = change.new_value::<T>()
			{
				observer(value);
			}
			Ok(())
		})
	}

	/// Stop a value observer registered with [`when_property_changes`](Self::when_property_changes).
	pub fn remove_observer(&self, id: HandlerId) -> bool {
		self.inner.value_changed.disconnect(id)
	}

	/// Create a property owned by this reactor.
	pub fn create<T>(&self, name: impl Into<String>, initial: T) -> Property<T>
	where
		T: Clone + PartialEq + fmt::Debug + 'static,
	{
		Property::new(self.clone(), name, initial)
	}

	/// Create a property kept equal to `compute`, re-evaluated whenever something `expr` reads
	/// changes.
	///
	/// The binding lives as long as the property (or until [`Property::unbind`]).
	pub fn create_derived<T, F>(&self, name: impl Into<String>, expr: Expr, compute: F) -> ReactorResult<Property<T>>
	where
		T: Clone + PartialEq + Default + fmt::Debug + 'static,
		F: Fn() -> T + 'static,
	{
		React::to(expr, compute)?.via_property(name).on(self)
	}

	/// Create a property whose value is computed on first read and recomputed on the first read
	/// after something `expr` reads changes.
	pub fn create_lazy<T, F>(&self, name: impl Into<String>, expr: Expr, compute: F) -> ReactorResult<LazyProperty<T>>
	where
		T: Clone + PartialEq + Default + fmt::Debug + 'static,
		F: Fn() -> T + 'static,
	{
		LazyPropertyStub::new(name, React::lazily_to(expr, compute)?).on(self)
	}
}

impl fmt::Debug for Reactor {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Reactor")
			.field("id", &self.inner.id)
			.field("receivers", &self.inner.property_changed.receiver_count())
			.finish()
	}
}
