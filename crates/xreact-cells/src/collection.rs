//! Notifying collections.
//!
//! [`ObservableVec<T>`] raises a collection change for every mutation, preceded by a `Count`
//! property change when the length changed. Item types convert to [`Value`] through [`AsValue`]
//! so dependency chains can follow the items.
//!
//! ```ignore
//! let furniture = Rc::new(ObservableVec::<Rc<Furniture>>::new());
//! furniture.push(Rc::new(Furniture::chair(4)))?;
//! furniture.remove(0)?;
//! ```

use core::any::Any;
use core::cell::RefCell;
use core::fmt;
use std::rc::Rc;

use tracing::trace;
use xreact_core::{
	CollectionAction, CollectionChangedArgs, Event, NotifyCollectionChanged, NotifyPropertyChanged, ObjectId,
	PropertyChangedArgs, ReactorError, ReactorResult, Value,
};

/// Conversion of collection items into engine values.
pub trait AsValue {
	fn as_value(&self) -> Value;
}

impl<T: NotifyPropertyChanged> AsValue for Rc<T> {
	fn as_value(&self) -> Value {
		Value::object(Rc::clone(self))
	}
}

macro_rules! plain_as_value {
	($($ty:ty),* $(,)?) => {
		$(
			impl AsValue for $ty {
				fn as_value(&self) -> Value {
					Value::plain(self.clone())
				}
			}
		)*
	};
}

plain_as_value!(bool, char, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64, String);

/// Name of the length property raised before collection changes.
pub const COUNT_PROPERTY: &str = "Count";

/// Vector raising change notifications.
pub struct ObservableVec<T> {
	id: ObjectId,
	items: RefCell<Vec<T>>,
	collection_changed: Event<CollectionChangedArgs>,
	property_changed: Event<PropertyChangedArgs>,
}

impl<T> ObservableVec<T>
where
	T: AsValue + Clone + 'static,
{
	pub fn new() -> Self {
		Self::from_vec(Vec::new())
	}

	pub fn from_vec(items: Vec<T>) -> Self {
		Self {
			id: ObjectId::new("ObservableVec"),
			items: RefCell::new(items),
			collection_changed: Event::new(),
			property_changed: Event::new(),
		}
	}

	pub fn id(&self) -> ObjectId {
		self.id
	}

	pub fn len(&self) -> usize {
		self.items.borrow().len()
	}

	pub fn is_empty(&self) -> bool {
		self.items.borrow().is_empty()
	}

	pub fn get(&self, index: usize) -> Option<T> {
		self.items.borrow().get(index).cloned()
	}

	/// Snapshot of the items.
	pub fn to_vec(&self) -> Vec<T> {
		self.items.borrow().clone()
	}

	/// Run `f` on the items without cloning them.
	///
	/// Mutating the collection from `f` panics.
	pub fn with_items<R>(&self, f: impl FnOnce(&[T]) -> R) -> R {
		f(&self.items.borrow())
	}

	pub fn push(&self, item: T) -> ReactorResult<()> {
		let value = item.as_value();
		self.items.borrow_mut().push(item);
		self.raise(CollectionAction::Add, vec![value], Vec::new(), true)
	}

	pub fn insert(&self, index: usize, item: T) -> ReactorResult<()> {
		let len = self.len();
		if index > len {
			return Err(out_of_bounds("insert", index, len));
		}
		let value = item.as_value();
		self.items.borrow_mut().insert(index, item);
		self.raise(CollectionAction::Add, vec![value], Vec::new(), true)
	}

	/// Remove and return the item at `index`.
	pub fn remove(&self, index: usize) -> ReactorResult<T> {
		let len = self.len();
		if index >= len {
			return Err(out_of_bounds("remove", index, len));
		}
		let removed = self.items.borrow_mut().remove(index);
		self.raise(CollectionAction::Remove, Vec::new(), vec![removed.as_value()], true)?;
		Ok(removed)
	}

	/// Remove the first item equal to `item`. Returns whether one was found.
	pub fn remove_item(&self, item: &T) -> ReactorResult<bool>
	where
		T: PartialEq,
	{
		let position = self.items.borrow().iter().position(|candidate| candidate == item);
		match position {
			Some(index) => self.remove(index).map(|_| true),
			None => Ok(false),
		}
	}

	/// Replace the item at `index`, returning the previous one.
	pub fn replace(&self, index: usize, item: T) -> ReactorResult<T> {
		let len = self.len();
		if index >= len {
			return Err(out_of_bounds("replace", index, len));
		}
		let value = item.as_value();
		let previous = core::mem::replace(&mut self.items.borrow_mut()[index], item);
		self.raise(CollectionAction::Replace, vec![value], vec![previous.as_value()], false)?;
		Ok(previous)
	}

	/// Move the item at `from` so that it ends up at `to`.
	pub fn move_item(&self, from: usize, to: usize) -> ReactorResult<()> {
		let len = self.len();
		if from >= len || to >= len {
			return Err(out_of_bounds("move", from.max(to), len));
		}
		let value = {
			let mut items = self.items.borrow_mut();
			let item = items.remove(from);
			let value = item.as_value();
			items.insert(to, item);
			value
		};
		self.raise(CollectionAction::Move, vec![value.clone()], vec![value], false)
	}

	pub fn clear(&self) -> ReactorResult<()> {
		let was_empty = {
			let mut items = self.items.borrow_mut();
			let was_empty = items.is_empty();
			items.clear();
			was_empty
		};
		self.raise(CollectionAction::Reset, Vec::new(), Vec::new(), !was_empty)
	}

	/// Replace the whole content, raising a single reset.
	pub fn set_all(&self, items: Vec<T>) -> ReactorResult<()> {
		let previous_len = self.items.replace(items).len();
		let count_changed = previous_len != self.len();
		self.raise(CollectionAction::Reset, Vec::new(), Vec::new(), count_changed)
	}

	fn raise(
		&self,
		action: CollectionAction,
		new_items: Vec<Value>,
		old_items: Vec<Value>,
		count_changed: bool,
	) -> ReactorResult<()> {
		trace!(collection = %self.id, ?action, "raising collection change");
		if count_changed {
			self.property_changed
				.emit(&PropertyChangedArgs::new(self.id, Some(COUNT_PROPERTY)))?;
		}
		self.collection_changed
			.emit(&CollectionChangedArgs::new(self.id, action, new_items, old_items))
	}
}

fn out_of_bounds(operation: &str, index: usize, len: usize) -> ReactorError {
	ReactorError::InvalidOperation(format!(
		"cannot {operation} at index {index} of a collection with {len} items"
	))
}

impl<T> Default for ObservableVec<T>
where
	T: AsValue + Clone + 'static,
{
	fn default() -> Self {
		Self::new()
	}
}

impl<T> NotifyCollectionChanged for ObservableVec<T>
where
	T: AsValue + Clone + 'static,
{
	fn collection_changed(&self) -> &Event<CollectionChangedArgs> {
		&self.collection_changed
	}

	fn items(&self) -> Vec<Value> {
		self.items.borrow().iter().map(AsValue::as_value).collect()
	}

	fn object_id(&self) -> ObjectId {
		self.id
	}

	fn as_any(&self) -> &dyn Any {
		self
	}

	fn property_changed(&self) -> Option<&Event<PropertyChangedArgs>> {
		Some(&self.property_changed)
	}
}

impl<T: fmt::Debug> fmt::Debug for ObservableVec<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ObservableVec")
			.field("id", &self.id)
			.field("items", &*self.items.borrow())
			.finish()
	}
}
