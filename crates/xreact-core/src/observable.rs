//! Observable expressions.
//!
//! An [`ObservableExpression`] owns the dependency chains of one expression and republishes its
//! value whenever any of them reports a change. Subscribing pushes the current value right away,
//! after the subscription's handlers are in place, so a binding that immediately feeds back into
//! its own dependencies is detected as a cycle at construction time.
//!
//! ## Failure handling
//!
//! Errors raised while a live subscription re-evaluates (or while its observer runs) are wrapped
//! in [`ReactorError::SubscriptionFailed`] and then handled according to the
//! [`ExceptionHandlingPolicy`] of the expression's configuration:
//!
//! - `FailFast` returns the error from the call that mutated the object graph,
//! - `TurnOffTheSubscription` logs it and deactivates the subscription.
//!
//! Errors raised while a subscription pushes its initial value, and
//! [`ReactorError::CannotNotify`], always propagate.
//!
//! ## Example
//!
//! ```ignore
//! let subscription = React::to(expr, move || room.square_meters() / 10)?
//! 	.skip_initial()
//! 	.subscribe(|limit| println!("people limit: {limit}"))?;
//!
//! room.set_square_meters(100)?; // prints "people limit: 10"
//! subscription.dispose();
//! ```

use core::cell::{Cell, RefCell};
use core::fmt;
use std::rc::{Rc, Weak};

use tracing::{debug, warn};

use crate::analyzer::analyze;
use crate::chain::ChainHead;
use crate::error::{ReactorError, ReactorResult};
use crate::expr::Expr;
use crate::notify::HandlerId;
use crate::options::TraversalOptions;
use crate::settings::{ExceptionHandlingPolicy, ReactorConfig};

/// Deferred computation of an expression value.
pub type Thunk<T> = Rc<dyn Fn() -> ReactorResult<T>>;

/// Produces the next value, or `None` when a filter dropped it.
type Pipeline<T> = Rc<dyn Fn() -> ReactorResult<Option<T>>>;

/// Work performed on every change.
type Reaction = Rc<dyn Fn() -> ReactorResult<()>>;

/// Chains shared by an expression and its subscriptions.
struct ExpressionCore {
	chains: Vec<ChainHead>,
	config: ReactorConfig,
	description: String,
	disposed: Cell<bool>,
}

impl ExpressionCore {
	fn new(expr: &Expr, options: &TraversalOptions, config: ReactorConfig) -> ReactorResult<Rc<Self>> {
		let chains = analyze(expr, options, &config, true)?;
		Ok(Rc::new(Self {
			chains,
			config,
			description: expr.to_string(),
			disposed: Cell::new(false),
		}))
	}

	fn dispose(&self) {
		if self.disposed.replace(true) {
			return;
		}
		for chain in &self.chains {
			chain.detach();
		}
		debug!(expression = %self.description, "disposed observable expression");
	}
}

impl Drop for ExpressionCore {
	fn drop(&mut self) {
		self.dispose();
	}
}

struct SubscriptionState {
	core: RefCell<Option<Rc<ExpressionCore>>>,
	handlers: RefCell<Vec<(ChainHead, HandlerId)>>,
	config: ReactorConfig,
	description: String,
	active: Cell<bool>,
	initializing: Cell<bool>,
	owns_core: bool,
}

impl SubscriptionState {
	fn deactivate(&self) {
		self.active.set(false);
		for (chain, id) in self.handlers.take() {
			chain.remove_changed_handler(id);
		}
		if let Some(core) = self.core.take()
			&& self.owns_core
		{
			core.dispose();
		}
	}

	fn handle_failure(&self, err: ReactorError) -> ReactorResult<()> {
		let err = err.into_subscription_failure();
		if self.initializing.get() || err.is_cannot_notify() {
			return Err(err);
		}
		match self.config.policy() {
			ExceptionHandlingPolicy::FailFast => Err(err),
			ExceptionHandlingPolicy::TurnOffTheSubscription => {
				warn!(
					expression = %self.description,
					error = %err,
					"turning off subscription after failure"
				);
				self.deactivate();
				Ok(())
			}
		}
	}
}

/// Handle of an active subscription.
///
/// Dropping the handle disposes the subscription.
#[must_use = "dropping a subscription disposes it immediately"]
pub struct Subscription {
	state: Rc<SubscriptionState>,
}

impl Subscription {
	fn attach(core: Rc<ExpressionCore>, reaction: Reaction, owns_core: bool) -> Self {
		let state = Rc::new(SubscriptionState {
			core: RefCell::new(Some(Rc::clone(&core))),
			handlers: RefCell::new(Vec::new()),
			config: core.config.clone(),
			description: core.description.clone(),
			active: Cell::new(true),
			initializing: Cell::new(false),
			owns_core,
		});

		let handlers = core
			.chains
			.iter()
			.map(|chain| {
				let state = Rc::downgrade(&state);
				let reaction = Rc::clone(&reaction);
				let id = chain.on_changed(move || react(&state, &reaction));
				(chain.clone(), id)
			})
			.collect();
		*state.handlers.borrow_mut() = handlers;
		Self { state }
	}

	/// Attach first, then push the current value through `reaction`.
	fn start(
		core: Rc<ExpressionCore>,
		reaction: Reaction,
		push_initial: bool,
		owns_core: bool,
	) -> ReactorResult<Self> {
		let subscription = Self::attach(core, Rc::clone(&reaction), owns_core);
		if !push_initial {
			return Ok(subscription);
		}

		subscription.state.initializing.set(true);
		let result = reaction();
		subscription.state.initializing.set(false);
		match result {
			Ok(()) => Ok(subscription),
			Err(err) => {
				subscription.dispose();
				Err(err.into_subscription_failure())
			}
		}
	}

	/// Whether the subscription still receives changes.
	pub fn is_active(&self) -> bool {
		self.state.active.get()
	}

	/// Stop receiving changes. Calling it again has no effect.
	pub fn dispose(&self) {
		self.state.deactivate();
	}
}

fn react(state: &Weak<SubscriptionState>, reaction: &Reaction) -> ReactorResult<()> {
	let Some(state) = state.upgrade() else {
		return Ok(());
	};
	if !state.active.get() {
		return Ok(());
	}
	match reaction() {
		Ok(()) => Ok(()),
		Err(err) => state.handle_failure(err),
	}
}

impl Drop for Subscription {
	fn drop(&mut self) {
		self.dispose();
	}
}

impl fmt::Debug for Subscription {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Subscription")
			.field("expression", &self.state.description)
			.field("active", &self.state.active.get())
			.finish()
	}
}

/// Value stream of an expression.
pub struct ObservableExpression<T> {
	core: Rc<ExpressionCore>,
	pipeline: Pipeline<T>,
	skip_initial: bool,
}

impl<T> Clone for ObservableExpression<T> {
	fn clone(&self) -> Self {
		Self {
			core: Rc::clone(&self.core),
			pipeline: Rc::clone(&self.pipeline),
			skip_initial: self.skip_initial,
		}
	}
}

impl<T: 'static> ObservableExpression<T> {
	/// Analyze `expr` and attach its chains.
	///
	/// # Arguments
	///
	/// * `expr` - Description of what `compute` reads.
	/// * `compute` - Produces the value; called on subscription and after every change.
	/// * `options` - Traversal options at the top of the expression.
	/// * `config` - Policy, access record and markers used by this expression.
	pub fn new<F>(
		expr: &Expr,
		compute: F,
		options: &TraversalOptions,
		config: ReactorConfig,
	) -> ReactorResult<Self>
	where
		F: Fn() -> ReactorResult<T> + 'static,
	{
		let core = ExpressionCore::new(expr, options, config)?;
		Ok(Self {
			core,
			pipeline: Rc::new(move || compute().map(Some)),
			skip_initial: false,
		})
	}

	pub fn chains(&self) -> &[ChainHead] {
		&self.core.chains
	}

	pub fn config(&self) -> &ReactorConfig {
		&self.core.config
	}

	/// Current value, `None` when a filter drops it.
	pub fn evaluate(&self) -> ReactorResult<Option<T>> {
		(self.pipeline)()
	}

	/// Do not push the current value on subscription.
	pub fn skip_initial(mut self) -> Self {
		self.skip_initial = true;
		self
	}

	pub fn map<U, F>(self, f: F) -> ObservableExpression<U>
	where
		U: 'static,
		F: Fn(T) -> U + 'static,
	{
		self.try_map(move |value| Ok(f(value)))
	}

	pub fn try_map<U, F>(self, f: F) -> ObservableExpression<U>
	where
		U: 'static,
		F: Fn(T) -> ReactorResult<U> + 'static,
	{
		let pipeline = self.pipeline;
		ObservableExpression {
			core: self.core,
			pipeline: Rc::new(move || pipeline()?.map(&f).transpose()),
			skip_initial: self.skip_initial,
		}
	}

	/// Drop values not matching `predicate`.
	pub fn filter<F>(self, predicate: F) -> Self
	where
		F: Fn(&T) -> bool + 'static,
	{
		let pipeline = self.pipeline;
		Self {
			core: self.core,
			pipeline: Rc::new(move || Ok(pipeline()?.filter(&predicate))),
			skip_initial: self.skip_initial,
		}
	}

	/// Map values equal to `case` to `then` and everything else to `otherwise`.
	pub fn switch<U>(self, case: T, then: U, otherwise: U) -> ObservableExpression<U>
	where
		T: PartialEq,
		U: Clone + 'static,
	{
		self.map(move |value| {
			if value == case {
				then.clone()
			} else {
				otherwise.clone()
			}
		})
	}

	/// Call `observer` with the current value (unless skipped) and after every change.
	pub fn subscribe<F>(&self, observer: F) -> ReactorResult<Subscription>
	where
		F: Fn(T) + 'static,
	{
		self.try_subscribe(move |value| {
			observer(value);
			Ok(())
		})
	}

	/// Like [`subscribe`](Self::subscribe), for observers that can fail.
	pub fn try_subscribe<F>(&self, observer: F) -> ReactorResult<Subscription>
	where
		F: Fn(T) -> ReactorResult<()> + 'static,
	{
		self.start(observer, false)
	}

	fn start<F>(&self, observer: F, owns_core: bool) -> ReactorResult<Subscription>
	where
		F: Fn(T) -> ReactorResult<()> + 'static,
	{
		let pipeline = Rc::clone(&self.pipeline);
		let reaction: Reaction = Rc::new(move || match pipeline()? {
			Some(value) => observer(value),
			None => Ok(()),
		});
		Subscription::start(Rc::clone(&self.core), reaction, !self.skip_initial, owns_core)
	}

	/// Bind the expression to a setter. Disposing the returned subscription also detaches the
	/// expression's chains.
	pub fn set<F>(self, setter: F) -> ReactorResult<Subscription>
	where
		F: Fn(T) + 'static,
	{
		self.try_set(move |value| {
			setter(value);
			Ok(())
		})
	}

	pub fn try_set<F>(self, setter: F) -> ReactorResult<Subscription>
	where
		F: Fn(T) -> ReactorResult<()> + 'static,
	{
		self.start(setter, true)
	}

	/// Bind the expression to a setter of a member that does not raise notifications itself.
	///
	/// After each set, a property change is raised for every hop of `target` (for example both
	/// `owner` on `this` and `age` on the owner for `this.owner.age`).
	///
	/// # Errors
	///
	/// - [`ReactorError::InvalidExpressionShape`] when `target` is not a member access.
	/// - [`ReactorError::CannotNotify`] (wrapped) when a hop's owner cannot raise notifications.
	pub fn set_and_notify<F>(self, target: &Expr, setter: F) -> ReactorResult<Subscription>
	where
		F: Fn(T) + 'static,
	{
		self.try_set_and_notify(target, move |value| {
			setter(value);
			Ok(())
		})
	}

	pub fn try_set_and_notify<F>(self, target: &Expr, setter: F) -> ReactorResult<Subscription>
	where
		F: Fn(T) -> ReactorResult<()> + 'static,
	{
		target.member_name()?;
		let mut chains = analyze(target, &TraversalOptions::default(), &self.core.config, false)?;
		if chains.len() != 1 {
			return Err(ReactorError::InvalidExpressionShape {
				found: format!("expression with {} dependency chains", chains.len()),
			});
		}
		let chain = chains.remove(0);
		self.try_set(move |value| {
			setter(value)?;
			chain.notify_targets()
		})
	}

	/// Call `handler` after every change, without computing the value.
	pub fn subscribe_changes<F>(&self, handler: F) -> Subscription
	where
		F: Fn() -> ReactorResult<()> + 'static,
	{
		Subscription::attach(Rc::clone(&self.core), Rc::new(handler), false)
	}

	/// Lazy view publishing thunks instead of values.
	pub fn as_lazy(&self) -> LazyObservableExpression<T> {
		let pipeline = Rc::clone(&self.pipeline);
		LazyObservableExpression {
			core: Rc::clone(&self.core),
			compute: Rc::new(move || {
				pipeline()?.ok_or_else(|| {
					ReactorError::Evaluation("the value was dropped by a filter".into())
				})
			}),
			skip_initial: self.skip_initial,
		}
	}

	/// Detach the chains. Subscriptions stop receiving changes.
	pub fn dispose(&self) {
		self.core.dispose();
	}

	pub fn is_disposed(&self) -> bool {
		self.core.disposed.get()
	}
}

impl<T> fmt::Debug for ObservableExpression<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ObservableExpression")
			.field("expression", &self.core.description)
			.field("chains", &self.core.chains.len())
			.finish()
	}
}

/// Expression stream publishing deferred computations.
pub struct LazyObservableExpression<T> {
	core: Rc<ExpressionCore>,
	compute: Thunk<T>,
	skip_initial: bool,
}

impl<T: 'static> LazyObservableExpression<T> {
	pub fn new<F>(
		expr: &Expr,
		compute: F,
		options: &TraversalOptions,
		config: ReactorConfig,
	) -> ReactorResult<Self>
	where
		F: Fn() -> ReactorResult<T> + 'static,
	{
		Ok(Self {
			core: ExpressionCore::new(expr, options, config)?,
			compute: Rc::new(compute),
			skip_initial: false,
		})
	}

	pub fn skip_initial(mut self) -> Self {
		self.skip_initial = true;
		self
	}

	/// The deferred computation itself.
	pub fn thunk(&self) -> Thunk<T> {
		Rc::clone(&self.compute)
	}

	/// Call `observer` with the thunk on subscription (unless skipped) and after every change.
	pub fn subscribe<F>(&self, observer: F) -> ReactorResult<Subscription>
	where
		F: Fn(Thunk<T>) + 'static,
	{
		self.try_subscribe(move |thunk| {
			observer(thunk);
			Ok(())
		})
	}

	/// Like [`subscribe`](Self::subscribe), for observers that can fail.
	pub fn try_subscribe<F>(&self, observer: F) -> ReactorResult<Subscription>
	where
		F: Fn(Thunk<T>) -> ReactorResult<()> + 'static,
	{
		let compute = Rc::clone(&self.compute);
		let reaction: Reaction = Rc::new(move || observer(Rc::clone(&compute)));
		Subscription::start(Rc::clone(&self.core), reaction, !self.skip_initial, false)
	}

	/// Cache that is marked stale on every change and recomputed on the next read.
	pub fn cached(self) -> LazyValue<T>
	where
		T: Clone,
	{
		let cell = Rc::new(LazyCell {
			compute: Rc::clone(&self.compute),
			cache: RefCell::new(None),
		});
		let stale = Rc::downgrade(&cell);
		let reaction: Reaction = Rc::new(move || {
			if let Some(cell) = stale.upgrade() {
				cell.cache.borrow_mut().take();
			}
			Ok(())
		});
		LazyValue {
			cell,
			_subscription: Subscription::attach(self.core, reaction, true),
		}
	}

	pub fn dispose(&self) {
		self.core.dispose();
	}
}

struct LazyCell<T> {
	compute: Thunk<T>,
	cache: RefCell<Option<T>>,
}

/// Lazily computed, change-invalidated value.
pub struct LazyValue<T> {
	cell: Rc<LazyCell<T>>,
	_subscription: Subscription,
}

impl<T: Clone> LazyValue<T> {
	/// Cached value, recomputed first when stale.
	pub fn get(&self) -> ReactorResult<T> {
		if let Some(value) = self.cell.cache.borrow().as_ref() {
			return Ok(value.clone());
		}
		let value = (self.cell.compute)()?;
		*self.cell.cache.borrow_mut() = Some(value.clone());
		Ok(value)
	}

	pub fn is_up_to_date(&self) -> bool {
		self.cell.cache.borrow().is_some()
	}

	pub fn invalidate(&self) {
		self.cell.cache.borrow_mut().take();
	}
}
