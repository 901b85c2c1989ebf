//! # xreact
//!
//! Reactive bindings driven by expression descriptions.
//!
//! Describe what a computation reads with an [`Expr`], hand over the closure computing its value,
//! and xreact subscribes to change notifications on exactly the members the expression reads. The
//! value is republished on every change, and the subscriptions follow the object graph when
//! intermediate objects are replaced.
//!
//! ## Feature Flags
//!
//! - `cells` (default) - [`Reactor`], [`Property`], [`LazyProperty`], [`ObservableVec`] and
//!   [`Shared`] for building notifying objects
//!
//! ## Quick Example
//!
//! ```rust,ignore
//! use xreact::prelude::*;
//!
//! struct Room {
//! 	reactor: Reactor,
//! 	square_meters: Property<i32>,
//! }
//!
//! reactive_object!(Room, reactor);
//!
//! let people_limit = React::to(
//! 	Expr::object(&room).property_with("SquareMeters", |room: &Room| {
//! 		Value::plain(room.square_meters.get())
//! 	}),
//! 	{
//! 		let room = room.clone();
//! 		move || room.square_meters.get() / 10
//! 	},
//! )?
//! .subscribe(|limit| println!("people limit: {limit}"))?;
//! ```

pub mod core;
#[cfg(feature = "cells")]
pub mod cells;

// Re-export the engine surface
pub use xreact_core::{
	ChainHead, CollectionAction, CollectionChangedArgs, CollectionTrackMode, CyclicAccessGuard,
	CyclicAccessRecord, DiagnosticSettings, Event, ExceptionHandlingPolicy, Expr,
	LazyObservableExpression, LazyValue, Marker, MarkerRegistry, NotifyCollectionChanged,
	NotifyPropertyChanged, ObjectId, ObservableExpression, Preconfiguration, PropertyChangedArgs,
	RaisePropertyChanged, React, ReactorConfig, ReactorError, ReactorResult, Subscription,
	TrackedProperties, TraversalOptions, Value, analyze,
};

// Re-export the cells
#[cfg(feature = "cells")]
pub use xreact_cells::{
	LazyProperty, ObservableExpressionExt, ObservableVec, Property, PropertyValueChanged, Reactor, Shared,
	reactive_object,
};

/// Prelude module for convenient imports
pub mod prelude {
	pub use crate::{
		Expr, NotifyCollectionChanged, NotifyPropertyChanged, ObservableExpression, RaisePropertyChanged, React,
		ReactorConfig, ReactorError, ReactorResult, Subscription, Value,
	};

	#[cfg(feature = "cells")]
	pub use crate::{
		LazyProperty, ObservableExpressionExt, ObservableVec, Property, Reactor, Shared, reactive_object,
	};
}
