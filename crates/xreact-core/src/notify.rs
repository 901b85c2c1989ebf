//! Change notification capabilities.
//!
//! Objects taking part in reactive expressions expose their change notifications through
//! [`NotifyPropertyChanged`] and, for collections, [`NotifyCollectionChanged`]. Both are built on
//! the small single-threaded [`Event`] dispatcher.
//!
//! ## Example
//!
//! ```ignore
//! use xreact_core::notify::{Event, PropertyChangedArgs, ObjectId};
//!
//! let event = Event::<PropertyChangedArgs>::new();
//! let id = event.connect(|args| {
//!     println!("changed: {:?}", args.property_name());
//!     Ok(())
//! });
//!
//! event.emit(&PropertyChangedArgs::new(ObjectId::new("Room"), Some("Area")))?;
//! event.disconnect(id);
//! ```

use core::any::Any;
use core::cell::RefCell;
use core::fmt;
use core::sync::atomic::{AtomicU64, Ordering};
use std::rc::Rc;

use crate::error::ReactorResult;
use crate::value::Value;

/// Identity of a notifying object, used in access traces and diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectId {
	type_name: &'static str,
	serial: u64,
}

impl ObjectId {
	/// Allocate a new unique id for an object of the given type.
	pub fn new(type_name: &'static str) -> Self {
		static COUNTER: AtomicU64 = AtomicU64::new(1);
		Self {
			type_name,
			serial: COUNTER.fetch_add(1, Ordering::Relaxed),
		}
	}

	/// Allocate an id named after `T`.
	pub fn of<T: ?Sized>() -> Self {
		Self::new(core::any::type_name::<T>())
	}

	/// Type name recorded at allocation.
	pub fn type_name(&self) -> &'static str {
		self.type_name
	}

	/// Process-unique serial number.
	pub fn serial(&self) -> u64 {
		self.serial
	}
}

impl fmt::Display for ObjectId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}#{}", self.type_name, self.serial)
	}
}

/// Handle returned by [`Event::connect`], used to disconnect the handler again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

impl HandlerId {
	fn next() -> Self {
		static COUNTER: AtomicU64 = AtomicU64::new(1);
		Self(COUNTER.fetch_add(1, Ordering::Relaxed))
	}
}

type Handler<A> = Rc<dyn Fn(&A) -> ReactorResult<()>>;

struct Receiver<A> {
	id: HandlerId,
	handler: Handler<A>,
}

/// Single-threaded multicast event.
///
/// Handlers may connect and disconnect other handlers (or themselves) while the event is being
/// emitted: emission works on a snapshot of the receivers and skips any receiver that was
/// disconnected in the meantime.
pub struct Event<A> {
	receivers: RefCell<Vec<Receiver<A>>>,
}

impl<A> Event<A> {
	/// Create an event without receivers.
	pub fn new() -> Self {
		Self {
			receivers: RefCell::new(Vec::new()),
		}
	}

	/// Connect a handler.
	///
	/// # Arguments
	///
	/// * `handler` - Called with the event arguments on every emission. An `Err` stops the
	///   emission and is returned from [`Event::emit`].
	pub fn connect<F>(&self, handler: F) -> HandlerId
	where
		F: Fn(&A) -> ReactorResult<()> + 'static,
	{
		let id = HandlerId::next();
		self.receivers.borrow_mut().push(Receiver {
			id,
			handler: Rc::new(handler),
		});
		id
	}

	/// Disconnect a handler. Returns `false` when it was not connected.
	pub fn disconnect(&self, id: HandlerId) -> bool {
		let mut receivers = self.receivers.borrow_mut();
		let before = receivers.len();
		receivers.retain(|receiver| receiver.id != id);
		receivers.len() != before
	}

	/// Whether the handler is still connected.
	pub fn is_connected(&self, id: HandlerId) -> bool {
		self.receivers.borrow().iter().any(|receiver| receiver.id == id)
	}

	/// Number of connected handlers.
	pub fn receiver_count(&self) -> usize {
		self.receivers.borrow().len()
	}

	/// Call every connected handler in connection order.
	pub fn emit(&self, args: &A) -> ReactorResult<()> {
		let snapshot: Vec<(HandlerId, Handler<A>)> = self
			.receivers
			.borrow()
			.iter()
			.map(|receiver| (receiver.id, Rc::clone(&receiver.handler)))
			.collect();

		for (id, handler) in snapshot {
			if !self.is_connected(id) {
				continue;
			}
			handler(args)?;
		}
		Ok(())
	}
}

impl<A> Default for Event<A> {
	fn default() -> Self {
		Self::new()
	}
}

impl<A> fmt::Debug for Event<A> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Event")
			.field("receivers", &self.receiver_count())
			.finish()
	}
}

/// Arguments of a property change notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyChangedArgs {
	sender: ObjectId,
	property_name: Option<String>,
}

impl PropertyChangedArgs {
	/// Notification about a single property. An empty name means "all properties".
	pub fn new(sender: ObjectId, property_name: Option<&str>) -> Self {
		Self {
			sender,
			property_name: property_name.map(str::to_owned),
		}
	}

	/// Notification that every property of `sender` may have changed.
	pub fn all(sender: ObjectId) -> Self {
		Self {
			sender,
			property_name: None,
		}
	}

	pub fn sender(&self) -> ObjectId {
		self.sender
	}

	pub fn property_name(&self) -> Option<&str> {
		self.property_name.as_deref()
	}

	/// `true` when the notification covers every property.
	pub fn is_all(&self) -> bool {
		self.property_name.as_deref().is_none_or(str::is_empty)
	}
}

/// Kind of collection mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionAction {
	Add,
	Remove,
	Replace,
	Move,
	/// The content changed dramatically; handlers must drop everything they know about the items.
	Reset,
}

/// Arguments of a collection change notification.
#[derive(Debug, Clone)]
pub struct CollectionChangedArgs {
	sender: ObjectId,
	action: CollectionAction,
	new_items: Vec<Value>,
	old_items: Vec<Value>,
}

impl CollectionChangedArgs {
	pub fn new(
		sender: ObjectId,
		action: CollectionAction,
		new_items: Vec<Value>,
		old_items: Vec<Value>,
	) -> Self {
		Self {
			sender,
			action,
			new_items,
			old_items,
		}
	}

	/// A reset notification, carrying no items.
	pub fn reset(sender: ObjectId) -> Self {
		Self::new(sender, CollectionAction::Reset, Vec::new(), Vec::new())
	}

	pub fn sender(&self) -> ObjectId {
		self.sender
	}

	pub fn action(&self) -> CollectionAction {
		self.action
	}

	pub fn new_items(&self) -> &[Value] {
		&self.new_items
	}

	pub fn old_items(&self) -> &[Value] {
		&self.old_items
	}
}

/// An object that notifies about property changes.
pub trait NotifyPropertyChanged: Any {
	/// The event raised after a property changed.
	fn property_changed(&self) -> &Event<PropertyChangedArgs>;

	/// Identity used in diagnostics.
	fn object_id(&self) -> ObjectId;

	fn as_any(&self) -> &dyn Any;

	/// Access to the raising capability, when the object supports it.
	///
	/// Set-and-notify bindings need to raise notifications on behalf of the object; objects that
	/// only expose the event return `None` and cause [`CannotNotify`](crate::ReactorError::CannotNotify).
	fn as_raise_property_changed(&self) -> Option<&dyn RaisePropertyChanged> {
		None
	}
}

/// An object on which property change notifications can be raised from the outside.
pub trait RaisePropertyChanged {
	/// Raise a notification for `property_name` (`None` means all properties).
	fn raise_property_changed(&self, property_name: Option<&str>) -> ReactorResult<()>;
}

/// A collection that notifies about membership changes.
pub trait NotifyCollectionChanged: Any {
	fn collection_changed(&self) -> &Event<CollectionChangedArgs>;

	/// Snapshot of the current items.
	fn items(&self) -> Vec<Value>;

	fn object_id(&self) -> ObjectId;

	fn as_any(&self) -> &dyn Any;

	/// Property notifications of the collection itself (for example `Count`), if any.
	fn property_changed(&self) -> Option<&Event<PropertyChangedArgs>> {
		None
	}
}
