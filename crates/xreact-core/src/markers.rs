//! Marker registry.
//!
//! Markers are identity calls inside an expression description that change how the rest of the
//! expression is analyzed. `room.furniture().track_items()` evaluates to the furniture collection,
//! but tells the analyzer to watch every item in it. The [`MarkerRegistry`] maps each marker to its
//! effect on [`TraversalOptions`]; a marker missing from the registry is analyzed like an ordinary
//! method call.

use core::fmt;
use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::Lazy;

use crate::options::{TrackedProperties, TraversalOptions};

/// Built-in marker methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Marker {
	/// Track collection items; arguments restrict the tracked item properties.
	TrackItems,
	TrackLastChild,
	DoNotTrackLastChild,
	TrackFields,
	DoNotTrackFields,
}

impl Marker {
	/// Method name used when rendering expressions.
	pub fn method_name(&self) -> &'static str {
		match self {
			Self::TrackItems => "track_items",
			Self::TrackLastChild => "track_last_child",
			Self::DoNotTrackLastChild => "do_not_track_last_child",
			Self::TrackFields => "track_fields",
			Self::DoNotTrackFields => "do_not_track_fields",
		}
	}
}

impl fmt::Display for Marker {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.method_name())
	}
}

/// Effect of a marker on the options of the remaining scan.
pub type MarkerEffect = fn(&TraversalOptions, &[String]) -> TraversalOptions;

fn track_items(options: &TraversalOptions, args: &[String]) -> TraversalOptions {
	let properties = if args.is_empty() {
		TrackedProperties::all()
	} else {
		TrackedProperties::only(args.iter().cloned())
	};
	options.clone().with_tracked_items(properties)
}

fn track_last_child(options: &TraversalOptions, _: &[String]) -> TraversalOptions {
	options.clone().with_track_last_child(true)
}

fn do_not_track_last_child(options: &TraversalOptions, _: &[String]) -> TraversalOptions {
	options.clone().with_track_last_child(false)
}

fn track_fields(options: &TraversalOptions, _: &[String]) -> TraversalOptions {
	options.clone().with_track_fields(true)
}

fn do_not_track_fields(options: &TraversalOptions, _: &[String]) -> TraversalOptions {
	options.clone().with_track_fields(false)
}

static GLOBAL_REGISTRY: Lazy<Arc<MarkerRegistry>> = Lazy::new(|| Arc::new(MarkerRegistry::standard()));

/// Maps markers to their option effects.
#[derive(Clone)]
pub struct MarkerRegistry {
	effects: HashMap<Marker, MarkerEffect>,
}

impl MarkerRegistry {
	/// Registry without any marker.
	pub fn empty() -> Self {
		Self {
			effects: HashMap::new(),
		}
	}

	/// Registry with every built-in marker.
	pub fn standard() -> Self {
		let mut registry = Self::empty();
		registry.register(Marker::TrackItems, track_items);
		registry.register(Marker::TrackLastChild, track_last_child);
		registry.register(Marker::DoNotTrackLastChild, do_not_track_last_child);
		registry.register(Marker::TrackFields, track_fields);
		registry.register(Marker::DoNotTrackFields, do_not_track_fields);
		registry
	}

	/// Process-wide registry shared by [`ReactorConfig::global`](crate::ReactorConfig::global).
	pub fn global() -> Arc<MarkerRegistry> {
		Arc::clone(&GLOBAL_REGISTRY)
	}

	/// Register (or replace) the effect of a marker.
	pub fn register(&mut self, marker: Marker, effect: MarkerEffect) -> Option<MarkerEffect> {
		self.effects.insert(marker, effect)
	}

	pub fn unregister(&mut self, marker: Marker) -> bool {
		self.effects.remove(&marker).is_some()
	}

	pub fn is_registered(&self, marker: Marker) -> bool {
		self.effects.contains_key(&marker)
	}

	/// Options for the remainder of the scan, or `None` when the marker is not registered.
	pub fn apply(
		&self,
		marker: Marker,
		options: &TraversalOptions,
		args: &[String],
	) -> Option<TraversalOptions> {
		self.effects.get(&marker).map(|effect| effect(options, args))
	}
}

impl Default for MarkerRegistry {
	fn default() -> Self {
		Self::standard()
	}
}

impl fmt::Debug for MarkerRegistry {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let mut markers: Vec<_> = self.effects.keys().map(Marker::method_name).collect();
		markers.sort_unstable();
		f.debug_struct("MarkerRegistry")
			.field("markers", &markers)
			.finish()
	}
}
