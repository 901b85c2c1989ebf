//! # xreact cells
//!
//! Building blocks for reactive objects on top of [`xreact_core`]:
//!
//! - [`Reactor`]: change notification hub of one object
//! - [`Property`] and [`LazyProperty`]: value cells with requirements and coercions
//! - [`ObservableVec`]: a vector raising collection changes
//! - [`Shared`]: object handles compared by identity, for properties holding objects
//! - [`reactive_object!`]: notification plumbing for structs holding a reactor
//! - [`ObservableExpressionExt`]: properties following observable expressions
//!
//! ## Example
//!
//! ```ignore
//! use xreact_cells::{Property, Reactor, reactive_object};
//!
//! struct Person {
//! 	reactor: Reactor,
//! 	age: Property<u32>,
//! }
//!
//! reactive_object!(Person, reactor);
//! ```

pub mod binding;
pub mod collection;
mod macros;
pub mod property;
pub mod reactor;
pub mod requirement;
pub mod shared;

pub use binding::{LazyPropertyStub, ObservableExpressionExt, PropertyStub};
pub use collection::{AsValue, COUNT_PROPERTY, ObservableVec};
pub use property::{LazyProperty, Property};
pub use reactor::{PropertyValueChanged, Reactor};
pub use requirement::{Requirement, ValidationResult};
pub use shared::Shared;

#[doc(hidden)]
pub mod __private {
	pub use xreact_core::{
		Event, NotifyPropertyChanged, ObjectId, PropertyChangedArgs, RaisePropertyChanged, ReactorResult,
	};
}
