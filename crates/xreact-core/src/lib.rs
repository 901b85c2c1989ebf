//! # xreact core
//!
//! Reactive dependency tracking for object graphs that expose change notifications.
//!
//! Given a description of an expression over notifying objects, the engine finds every property,
//! field-constant root and collection the expression reads, subscribes to change notifications on
//! exactly those members, and republishes the value of the expression whenever one of them changes.
//! Handlers follow the object graph as it mutates: when an intermediate object of a chain is
//! replaced, the handlers move to the new instance.
//!
//! ## Architecture
//!
//! 1. **Expression description** ([`expr`]): a typed builder describing what a computation reads
//! 2. **Analyzer** ([`analyzer`]): turns the description into dependency chains
//! 3. **Chains** ([`chain`]): attach to the live object graph, guarded against cyclic access
//!    ([`guard`])
//! 4. **Observable expressions** ([`observable`]): re-evaluate and publish on every chain change
//!
//! ## Example
//!
//! ```ignore
//! use xreact_core::{Expr, React};
//!
//! let people_limit = React::to(Expr::object(&room).property("SquareMeters"), {
//! 	let room = room.clone();
//! 	move || room.square_meters() / 10
//! })?
//! .subscribe(|limit| println!("limit: {limit}"))?;
//! ```

pub mod analyzer;
pub mod chain;
pub mod error;
pub mod expr;
pub mod guard;
pub mod markers;
pub mod notify;
pub mod observable;
pub mod options;
pub mod react;
pub mod settings;
pub mod value;

pub use analyzer::analyze;
pub use chain::{ChainHead, ChainLink, ChainSignature};
pub use error::{ReactorError, ReactorResult};
pub use expr::{Expr, MemberKind, Retriever};
pub use guard::{AccessContext, AccessTrace, CyclicAccessGuard, CyclicAccessRecord, SharedAccessRecord};
pub use markers::{Marker, MarkerRegistry};
pub use notify::{
	CollectionAction, CollectionChangedArgs, Event, HandlerId, NotifyCollectionChanged,
	NotifyPropertyChanged, ObjectId, PropertyChangedArgs, RaisePropertyChanged,
};
pub use observable::{LazyObservableExpression, LazyValue, ObservableExpression, Subscription, Thunk};
pub use options::{CollectionTrackMode, TrackedProperties, TraversalOptions};
pub use react::{Preconfiguration, React};
pub use settings::{DiagnosticSettings, ExceptionHandlingPolicy, ReactorConfig};
pub use value::Value;
