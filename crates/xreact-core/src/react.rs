//! Entry points.
//!
//! [`React::to`] turns an expression description plus the closure computing its value into an
//! [`ObservableExpression`]. [`React::preconfig`] applies marker effects to a whole expression
//! instead of a single member.
//!
//! ## Example
//!
//! ```ignore
//! use xreact_core::{Expr, React};
//!
//! let limit = React::to(Expr::object(&room).property("SquareMeters"), {
//! 	let room = room.clone();
//! 	move || room.square_meters() / 10
//! })?;
//!
//! let tracked = React::preconfig()
//! 	.track_fields()
//! 	.track_last_child()
//! 	.to(expr, compute)?;
//! ```

use crate::error::ReactorResult;
use crate::expr::Expr;
use crate::markers::Marker;
use crate::observable::{LazyObservableExpression, ObservableExpression};
use crate::options::{CollectionTrackMode, TraversalOptions};
use crate::settings::ReactorConfig;

/// Fluent entry point for reactive expressions.
pub struct React;

impl React {
	/// Observe `compute`, re-evaluated whenever something `expr` reads changes.
	pub fn to<T, F>(expr: Expr, compute: F) -> ReactorResult<ObservableExpression<T>>
	where
		T: 'static,
		F: Fn() -> T + 'static,
	{
		Preconfiguration::default().to(expr, compute)
	}

	/// Like [`to`](Self::to), for computations that can fail.
	pub fn try_to<T, F>(expr: Expr, compute: F) -> ReactorResult<ObservableExpression<T>>
	where
		T: 'static,
		F: Fn() -> ReactorResult<T> + 'static,
	{
		Preconfiguration::default().try_to(expr, compute)
	}

	/// Observe `compute` without evaluating it eagerly.
	pub fn lazily_to<T, F>(expr: Expr, compute: F) -> ReactorResult<LazyObservableExpression<T>>
	where
		T: 'static,
		F: Fn() -> T + 'static,
	{
		Preconfiguration::default().lazily_to(expr, compute)
	}

	/// Stream of "something `expr` reads changed", without values.
	pub fn when_any_changes(expr: Expr) -> ReactorResult<ObservableExpression<()>> {
		Ok(Self::to(expr, || ())?.skip_initial())
	}

	/// Start a preconfigured expression.
	pub fn preconfig() -> Preconfiguration {
		Preconfiguration::default()
	}

	/// Start an expression using `config` instead of the process-wide defaults.
	pub fn with_config(config: ReactorConfig) -> Preconfiguration {
		Preconfiguration::default().with_config(config)
	}
}

/// Options and configuration applied to a whole expression.
#[derive(Debug, Clone, Default)]
pub struct Preconfiguration {
	options: TraversalOptions,
	config: ReactorConfig,
}

impl Preconfiguration {
	fn apply(mut self, marker: Marker, args: Vec<String>) -> Self {
		if let Some(options) = self.config.markers.apply(marker, &self.options, &args) {
			self.options = options;
		}
		self
	}

	pub fn options(&self) -> &TraversalOptions {
		&self.options
	}

	pub fn with_config(mut self, config: ReactorConfig) -> Self {
		self.config = config;
		self
	}

	pub fn with_options(mut self, options: TraversalOptions) -> Self {
		self.options = options;
		self
	}

	pub fn track_items(self) -> Self {
		self.apply(Marker::TrackItems, Vec::new())
	}

	pub fn track_items_of<I, S>(self, properties: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		let args = properties.into_iter().map(Into::into).collect();
		self.apply(Marker::TrackItems, args)
	}

	pub fn track_last_child(self) -> Self {
		self.apply(Marker::TrackLastChild, Vec::new())
	}

	pub fn do_not_track_last_child(self) -> Self {
		self.apply(Marker::DoNotTrackLastChild, Vec::new())
	}

	pub fn track_fields(self) -> Self {
		self.apply(Marker::TrackFields, Vec::new())
	}

	pub fn do_not_track_fields(self) -> Self {
		self.apply(Marker::DoNotTrackFields, Vec::new())
	}

	/// Treat collections as plain values.
	pub fn do_not_track_collections(mut self) -> Self {
		self.options.collection_mode = CollectionTrackMode::DoNotTrack;
		self
	}

	pub fn to<T, F>(self, expr: Expr, compute: F) -> ReactorResult<ObservableExpression<T>>
	where
		T: 'static,
		F: Fn() -> T + 'static,
	{
		self.try_to(expr, move || Ok(compute()))
	}

	pub fn try_to<T, F>(self, expr: Expr, compute: F) -> ReactorResult<ObservableExpression<T>>
	where
		T: 'static,
		F: Fn() -> ReactorResult<T> + 'static,
	{
		ObservableExpression::new(&expr, compute, &self.options, self.config)
	}

	pub fn lazily_to<T, F>(self, expr: Expr, compute: F) -> ReactorResult<LazyObservableExpression<T>>
	where
		T: 'static,
		F: Fn() -> T + 'static,
	{
		LazyObservableExpression::new(&expr, move || Ok(compute()), &self.options, self.config)
	}
}
