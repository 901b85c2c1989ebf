//! Traversal options steering dependency analysis.

use std::collections::BTreeSet;

/// How collections reached by a dependency chain are tracked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CollectionTrackMode {
	/// Collections are treated as plain values.
	DoNotTrack,
	/// Membership changes (add, remove, reset) are tracked.
	#[default]
	CollectionLevel,
	/// Membership changes and property changes of every item are tracked.
	Items,
}

/// Item properties that re-trigger an expression in [`CollectionTrackMode::Items`] mode.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TrackedProperties {
	all: bool,
	names: BTreeSet<String>,
}

impl TrackedProperties {
	/// No item property is tracked. Notifications covering all properties still pass.
	pub fn none() -> Self {
		Self::default()
	}

	/// Every item property is tracked.
	pub fn all() -> Self {
		Self {
			all: true,
			names: BTreeSet::new(),
		}
	}

	/// Only the listed item properties are tracked.
	pub fn only<I, S>(names: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self {
			all: false,
			names: names.into_iter().map(Into::into).collect(),
		}
	}

	pub fn are_all_tracked(&self) -> bool {
		self.all
	}

	pub fn names(&self) -> impl Iterator<Item = &str> {
		self.names.iter().map(String::as_str)
	}

	/// Whether a notification for `name` passes the filter.
	///
	/// A missing or empty name means "all properties changed" and always passes.
	pub fn is_tracked(&self, name: Option<&str>) -> bool {
		match name {
			None | Some("") => true,
			Some(name) => self.all || self.names.contains(name),
		}
	}
}

/// Options propagated top-down while an expression is analyzed.
///
/// Every dependency link freezes the options in effect when it was built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraversalOptions {
	/// Treat fields as transparent (field-constant roots) instead of chain breaks.
	pub track_fields: bool,
	/// Also track property changes of the value at the end of each chain.
	pub track_last_child: bool,
	pub collection_mode: CollectionTrackMode,
	pub item_properties: TrackedProperties,
}

impl Default for TraversalOptions {
	fn default() -> Self {
		Self {
			track_fields: true,
			track_last_child: false,
			collection_mode: CollectionTrackMode::default(),
			item_properties: TrackedProperties::none(),
		}
	}
}

impl TraversalOptions {
	pub fn tracks_collections(&self) -> bool {
		self.collection_mode != CollectionTrackMode::DoNotTrack
	}

	pub fn tracks_collection_items(&self) -> bool {
		self.collection_mode == CollectionTrackMode::Items
	}

	pub fn with_track_fields(mut self, track_fields: bool) -> Self {
		self.track_fields = track_fields;
		self
	}

	pub fn with_track_last_child(mut self, track_last_child: bool) -> Self {
		self.track_last_child = track_last_child;
		self
	}

	pub fn with_collection_mode(mut self, mode: CollectionTrackMode) -> Self {
		self.collection_mode = mode;
		self
	}

	/// Track collection items, filtered by `properties`.
	///
	/// Item tracking needs the value at the end of the chain to be watched too, so this also turns
	/// on `track_last_child`.
	pub fn with_tracked_items(mut self, properties: TrackedProperties) -> Self {
		self.collection_mode = CollectionTrackMode::Items;
		self.item_properties = properties;
		self.track_last_child = true;
		self
	}
}
