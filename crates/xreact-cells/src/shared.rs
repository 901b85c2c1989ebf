//! Shared object handles with reference identity.
//!
//! Properties compare values before raising a change. An `Rc<T>` compares by content, which
//! is wrong for object references (and unavailable for most reactive objects), so properties
//! holding objects store a [`Shared<T>`] instead: two handles are equal only when they point
//! to the same instance.
//!
//! ```ignore
//! let owner: Property<Option<Shared<Person>>> = reactor.create("Owner", None);
//! owner.set(Some(Shared::new(Person::new(30))))?;
//! ```

use core::fmt;
use core::ops::Deref;
use std::rc::Rc;

use xreact_core::{NotifyCollectionChanged, NotifyPropertyChanged, Value};

use crate::collection::AsValue;

/// Reference-counted handle compared by identity.
pub struct Shared<T: ?Sized> {
	inner: Rc<T>,
}

impl<T> Shared<T> {
	pub fn new(value: T) -> Self {
		Self { inner: Rc::new(value) }
	}
}

impl<T: ?Sized> Shared<T> {
	pub fn from_rc(inner: Rc<T>) -> Self {
		Self { inner }
	}

	/// The underlying `Rc`.
	pub fn rc(&self) -> &Rc<T> {
		&self.inner
	}

	pub fn ptr_eq(&self, other: &Self) -> bool {
		Rc::ptr_eq(&self.inner, &other.inner)
	}
}

impl<T: NotifyPropertyChanged> Shared<T> {
	/// Engine value referencing the object.
	pub fn object_value(&self) -> Value {
		Value::object(Rc::clone(&self.inner))
	}
}

impl<T: NotifyCollectionChanged> Shared<T> {
	/// Engine value referencing the collection.
	pub fn collection_value(&self) -> Value {
		Value::collection(Rc::clone(&self.inner))
	}
}

impl<T: ?Sized> Clone for Shared<T> {
	fn clone(&self) -> Self {
		Self {
			inner: Rc::clone(&self.inner),
		}
	}
}

impl<T: ?Sized> PartialEq for Shared<T> {
	fn eq(&self, other: &Self) -> bool {
		self.ptr_eq(other)
	}
}

impl<T: ?Sized> Eq for Shared<T> {}

impl<T: ?Sized> Deref for Shared<T> {
	type Target = T;

	fn deref(&self) -> &T {
		&self.inner
	}
}

impl<T> From<Rc<T>> for Shared<T> {
	fn from(inner: Rc<T>) -> Self {
		Self::from_rc(inner)
	}
}

impl<T: ?Sized> fmt::Debug for Shared<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "Shared({:p})", Rc::as_ptr(&self.inner))
	}
}

impl<T: NotifyPropertyChanged> AsValue for Shared<T> {
	fn as_value(&self) -> Value {
		self.object_value()
	}
}
