//! Dynamically typed values flowing through dependency chains.
//!
//! The analyzer and the chain machinery never know the concrete types of the objects they walk.
//! They only need to know whether a value can notify (and how), and whether two values are the same
//! instance. [`Value`] captures exactly that.

use core::any::Any;
use core::fmt;
use std::rc::Rc;

use crate::notify::{
	CollectionChangedArgs, Event, NotifyCollectionChanged, NotifyPropertyChanged, ObjectId,
	PropertyChangedArgs, RaisePropertyChanged,
};

/// A value read from the object graph.
#[derive(Clone, Default)]
pub enum Value {
	/// No value (a missing object or a non-nullable default).
	#[default]
	Null,
	/// An object exposing property change notifications.
	Object(Rc<dyn NotifyPropertyChanged>),
	/// A collection exposing membership change notifications.
	Collection(Rc<dyn NotifyCollectionChanged>),
	/// Any other value. Never tracked.
	Plain(Rc<dyn Any>),
}

impl Value {
	pub fn object<T: NotifyPropertyChanged>(object: Rc<T>) -> Self {
		Self::Object(object)
	}

	pub fn collection<T: NotifyCollectionChanged>(collection: Rc<T>) -> Self {
		Self::Collection(collection)
	}

	pub fn plain<T: Any>(value: T) -> Self {
		Self::Plain(Rc::new(value))
	}

	/// Object value, or [`Value::Null`] for `None`.
	pub fn optional_object<T: NotifyPropertyChanged>(object: Option<Rc<T>>) -> Self {
		object.map_or(Self::Null, Self::object)
	}

	pub fn is_null(&self) -> bool {
		matches!(self, Self::Null)
	}

	/// Whether handlers can be attached to property notifications of this value.
	pub fn can_notify(&self) -> bool {
		self.property_changed().is_some()
	}

	pub fn property_changed(&self) -> Option<&Event<PropertyChangedArgs>> {
		match self {
			Self::Object(object) => Some(object.property_changed()),
			Self::Collection(collection) => collection.property_changed(),
			Self::Null | Self::Plain(_) => None,
		}
	}

	pub fn collection_changed(&self) -> Option<&Event<CollectionChangedArgs>> {
		match self {
			Self::Collection(collection) => Some(collection.collection_changed()),
			_ => None,
		}
	}

	/// Current items when this is a collection, otherwise empty.
	pub fn collection_items(&self) -> Vec<Value> {
		match self {
			Self::Collection(collection) => collection.items(),
			_ => Vec::new(),
		}
	}

	pub fn as_raise_property_changed(&self) -> Option<&dyn RaisePropertyChanged> {
		match self {
			Self::Object(object) => object.as_raise_property_changed(),
			_ => None,
		}
	}

	pub fn object_id(&self) -> Option<ObjectId> {
		match self {
			Self::Object(object) => Some(object.object_id()),
			Self::Collection(collection) => Some(collection.object_id()),
			Self::Null | Self::Plain(_) => None,
		}
	}

	/// Address of the referenced instance, `None` for [`Value::Null`].
	pub fn address(&self) -> Option<usize> {
		let ptr = match self {
			Self::Null => return None,
			Self::Object(object) => Rc::as_ptr(object).cast::<()>(),
			Self::Collection(collection) => Rc::as_ptr(collection).cast::<()>(),
			Self::Plain(plain) => Rc::as_ptr(plain).cast::<()>(),
		};
		Some(ptr as usize)
	}

	/// Reference identity. Two nulls are the same value.
	pub fn same(&self, other: &Value) -> bool {
		self.address() == other.address()
	}

	pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
		match self {
			Self::Object(object) => object.as_any().downcast_ref(),
			Self::Collection(collection) => collection.as_any().downcast_ref(),
			Self::Plain(plain) => plain.downcast_ref(),
			Self::Null => None,
		}
	}

	/// Short description used in error messages.
	pub fn type_name(&self) -> String {
		match self {
			Self::Null => "null".to_owned(),
			Self::Object(object) => object.object_id().type_name().to_owned(),
			Self::Collection(collection) => collection.object_id().type_name().to_owned(),
			Self::Plain(_) => "plain value".to_owned(),
		}
	}
}

impl fmt::Debug for Value {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Null => f.write_str("Null"),
			Self::Object(object) => write!(f, "Object({})", object.object_id()),
			Self::Collection(collection) => write!(f, "Collection({})", collection.object_id()),
			Self::Plain(_) => f.write_str("Plain(..)"),
		}
	}
}

impl<T: NotifyPropertyChanged> From<Rc<T>> for Value {
	fn from(object: Rc<T>) -> Self {
		Self::Object(object)
	}
}
