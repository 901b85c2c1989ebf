//! Dependency chains.
//!
//! A dependency chain mirrors one member-access path of an expression, for example
//! `room.owner.age`. The [`ChainHead`] holds the fixed root object (`room`) and owns the `changed`
//! event; every further hop is a [`ChainLink`] that re-resolves its parent through a retriever
//! (`room.owner`) whenever the hop above it reports a change.
//!
//! Each hop keeps the handlers it attached to the live object graph:
//!
//! 1. a handler on its parent, filtered by the hop's member name,
//! 2. a collection handler (and per-item handlers) when the member value is a collection,
//! 3. a handler on the member value itself when `track_last_child` is set on the last hop.
//!
//! When the parent or member value of a hop is replaced, its handlers move to the new instance.
//! Handlers hold weak references only, so dropping a chain disconnects nothing by itself; call
//! [`ChainHead::detach`] (the owning subscription does) to release them.

use core::cell::RefCell;
use core::fmt;
use std::rc::{Rc, Weak};

use tracing::{debug, trace};

use crate::error::{ReactorError, ReactorResult};
use crate::expr::Retriever;
use crate::guard::{AccessContext, AccessTrace, CyclicAccessGuard, RecordScope, SharedAccessRecord};
use crate::notify::{CollectionAction, CollectionChangedArgs, Event, HandlerId, PropertyChangedArgs};
use crate::options::TraversalOptions;
use crate::value::Value;

enum LinkRole {
	Head {
		parent: Value,
		changed: Event<()>,
	},
	Link {
		parent_retriever: Retriever,
	},
}

#[derive(Default)]
struct LinkState {
	last_parent: Value,
	parent_handler: Option<HandlerId>,
	last_target: Value,
	collection_handler: Option<HandlerId>,
	target_handler: Option<HandlerId>,
	traced_items: Vec<(Value, HandlerId)>,
}

pub(crate) struct DependencyLink {
	name: String,
	role: LinkRole,
	child: Option<Rc<DependencyLink>>,
	options: TraversalOptions,
	target_retriever: Option<Retriever>,
	top_level: RefCell<Weak<DependencyLink>>,
	state: RefCell<LinkState>,
	guard: CyclicAccessGuard,
	record: SharedAccessRecord,
	this: Weak<DependencyLink>,
}

/// A property change with an empty or missing name concerns every member.
fn names_match(traced: &str, changed: Option<&str>) -> bool {
	match changed {
		None | Some("") => true,
		Some(changed) => changed == traced,
	}
}

impl DependencyLink {
	fn new(
		name: String,
		role: LinkRole,
		child: Option<Rc<DependencyLink>>,
		options: TraversalOptions,
		target_retriever: Option<Retriever>,
		record: SharedAccessRecord,
	) -> Rc<Self> {
		Rc::new_cyclic(|this| Self {
			name,
			role,
			child,
			options,
			target_retriever,
			top_level: RefCell::new(Weak::new()),
			state: RefCell::new(LinkState::default()),
			guard: CyclicAccessGuard::new(1, Some(record.clone())),
			record,
			this: this.clone(),
		})
	}

	fn set_top_level(&self, head: &Rc<DependencyLink>) {
		*self.top_level.borrow_mut() = Rc::downgrade(head);
		if let Some(child) = &self.child {
			child.set_top_level(head);
		}
	}

	fn is_last_child(&self) -> bool {
		self.child.is_none()
	}

	fn current_parent(&self) -> Value {
		match &self.role {
			LinkRole::Head { parent, .. } => parent.clone(),
			LinkRole::Link { parent_retriever } => parent_retriever(),
		}
	}

	fn current_target(&self) -> Value {
		self.target_retriever
			.as_ref()
			.map(|retriever| retriever())
			.unwrap_or_default()
	}

	fn ensure_attached(&self) {
		self.rehook_parent_if_required();
		self.rehook_target_if_required();
		if let Some(child) = &self.child {
			child.ensure_attached();
		}
	}

	fn rehook_parent_if_required(&self) {
		let parent = self.current_parent();
		let mut state = self.state.borrow_mut();
		if parent.same(&state.last_parent) && state.parent_handler.is_some() {
			return;
		}
		if let Some(id) = state.parent_handler.take()
			&& let Some(event) = state.last_parent.property_changed()
		{
			event.disconnect(id);
		}
		state.parent_handler = parent.property_changed().map(|event| {
			let link = self.this.clone();
			event.connect(move |args: &PropertyChangedArgs| match link.upgrade() {
				Some(link) => link.on_parent_property_changed(args),
				None => Ok(()),
			})
		});
		if state.parent_handler.is_some() {
			debug!(member = %self.name, parent = ?parent, "hooked parent");
		}
		state.last_parent = parent;
	}

	fn rehook_target_if_required(&self) {
		let target = self.current_target();
		let mut state = self.state.borrow_mut();
		if target.same(&state.last_target) {
			return;
		}
		self.unhook_target(&mut state);
		self.hook_target(&target, &mut state);
		state.last_target = target;
	}

	fn hook_target(&self, target: &Value, state: &mut LinkState) {
		if self.options.tracks_collections()
			&& let Some(event) = target.collection_changed()
		{
			let link = self.this.clone();
			state.collection_handler = Some(event.connect(move |args: &CollectionChangedArgs| {
				match link.upgrade() {
					Some(link) => link.on_collection_changed(args),
					None => Ok(()),
				}
			}));
			if self.options.tracks_collection_items() {
				for item in target.collection_items() {
					self.hook_item(item, state);
				}
			}
			debug!(
				member = %self.name,
				collection = ?target,
				items = state.traced_items.len(),
				"hooked collection"
			);
			// membership changes already cover the collection's own properties
			return;
		}
		if self.options.track_last_child
			&& self.is_last_child()
			&& let Some(event) = target.property_changed()
		{
			let link = self.this.clone();
			state.target_handler = Some(event.connect(move |args: &PropertyChangedArgs| {
				match link.upgrade() {
					Some(link) => link.on_target_property_changed(args),
					None => Ok(()),
				}
			}));
			debug!(member = %self.name, target = ?target, "hooked target");
		}
	}

	fn unhook_target(&self, state: &mut LinkState) {
		if let Some(id) = state.collection_handler.take()
			&& let Some(event) = state.last_target.collection_changed()
		{
			event.disconnect(id);
		}
		Self::unhook_all_items(state);
		if let Some(id) = state.target_handler.take()
			&& let Some(event) = state.last_target.property_changed()
		{
			event.disconnect(id);
		}
	}

	fn hook_item(&self, item: Value, state: &mut LinkState) {
		// an item listed twice is hooked once
		if state.traced_items.iter().any(|(traced, _)| traced.same(&item)) {
			return;
		}
		let Some(event) = item.property_changed() else {
			return;
		};
		let link = self.this.clone();
		let id = event.connect(move |args: &PropertyChangedArgs| match link.upgrade() {
			Some(link) => link.on_item_property_changed(args),
			None => Ok(()),
		});
		state.traced_items.push((item, id));
	}

	fn unhook_item(item: &Value, state: &mut LinkState) {
		let Some(position) = state
			.traced_items
			.iter()
			.position(|(traced, _)| traced.same(item))
		else {
			return;
		};
		let (traced, id) = state.traced_items.remove(position);
		if let Some(event) = traced.property_changed() {
			event.disconnect(id);
		}
	}

	fn unhook_all_items(state: &mut LinkState) {
		for (item, id) in state.traced_items.drain(..) {
			if let Some(event) = item.property_changed() {
				event.disconnect(id);
			}
		}
	}

	fn detach(&self) {
		{
			let mut state = self.state.borrow_mut();
			if let Some(id) = state.parent_handler.take()
				&& let Some(event) = state.last_parent.property_changed()
			{
				event.disconnect(id);
			}
			self.unhook_target(&mut state);
			*state = LinkState::default();
		}
		if let Some(child) = &self.child {
			child.detach();
		}
	}

	fn on_parent_property_changed(&self, args: &PropertyChangedArgs) -> ReactorResult<()> {
		if !names_match(&self.name, args.property_name()) {
			return Ok(());
		}
		trace!(member = %self.name, sender = %args.sender(), "parent property changed");
		let _scope = self.guard.enter(AccessTrace::new(
			AccessContext::ParentPropertyChanged,
			args.sender(),
			args.property_name(),
		))?;
		self.rehook_target_if_required();
		if let Some(child) = &self.child {
			child.ensure_attached();
		}
		self.raise_source_changed()
	}

	fn on_target_property_changed(&self, args: &PropertyChangedArgs) -> ReactorResult<()> {
		trace!(member = %self.name, sender = %args.sender(), "target property changed");
		let _scope = self.guard.enter(AccessTrace::new(
			AccessContext::TargetPropertyChanged,
			args.sender(),
			args.property_name(),
		))?;
		self.raise_source_changed()
	}

	fn on_collection_changed(&self, args: &CollectionChangedArgs) -> ReactorResult<()> {
		trace!(member = %self.name, sender = %args.sender(), action = ?args.action(), "collection changed");
		let _scope = RecordScope::enter(
			&self.record,
			AccessTrace::new(AccessContext::CollectionChanged, args.sender(), Some(&self.name)),
		);
		if self.options.tracks_collection_items() {
			let mut state = self.state.borrow_mut();
			if args.action() == CollectionAction::Reset {
				Self::unhook_all_items(&mut state);
				// a reset carries no items; re-read the collection
				let items = state.last_target.collection_items();
				for item in items {
					self.hook_item(item, &mut state);
				}
			} else {
				let remaining = state.last_target.collection_items();
				for item in args.old_items() {
					if !remaining.iter().any(|present| present.same(item)) {
						Self::unhook_item(item, &mut state);
					}
				}
				for item in args.new_items() {
					self.hook_item(item.clone(), &mut state);
				}
			}
		}
		self.raise_source_changed()
	}

	fn on_item_property_changed(&self, args: &PropertyChangedArgs) -> ReactorResult<()> {
		if !self.options.item_properties.is_tracked(args.property_name()) {
			return Ok(());
		}
		trace!(member = %self.name, item = %args.sender(), property = ?args.property_name(), "item property changed");
		let _scope = RecordScope::enter(
			&self.record,
			AccessTrace::new(
				AccessContext::CollectionItemChanged,
				args.sender(),
				args.property_name(),
			),
		);
		self.raise_source_changed()
	}

	fn raise_source_changed(&self) -> ReactorResult<()> {
		let head = self.top_level.borrow().upgrade();
		match head {
			Some(head) => head.raise_chain_changed(),
			None => Ok(()),
		}
	}

	fn raise_chain_changed(&self) -> ReactorResult<()> {
		match &self.role {
			LinkRole::Head { changed, .. } => changed.emit(&()),
			LinkRole::Link { .. } => self.raise_source_changed(),
		}
	}

	fn notify_targets(&self) -> ReactorResult<()> {
		let parent = self.current_parent();
		if !self.name.is_empty() && parent.can_notify() {
			let raiser = parent
				.as_raise_property_changed()
				.ok_or_else(|| ReactorError::CannotNotify {
					type_name: parent.type_name(),
					property: self.name.clone(),
				})?;
			raiser.raise_property_changed(Some(&self.name))?;
		}
		match &self.child {
			Some(child) => child.notify_targets(),
			None => Ok(()),
		}
	}

	fn path(&self, names: &mut Vec<String>) {
		names.push(self.name.clone());
		if let Some(child) = &self.child {
			child.path(names);
		}
	}

	fn is_attached(&self) -> bool {
		self.state.borrow().parent_handler.is_some()
			|| self
				.child
				.as_ref()
				.is_some_and(|child| child.is_attached())
	}
}

/// Identity of a chain: root instance plus member-name path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChainSignature {
	root: Option<usize>,
	path: Vec<String>,
}

/// Interior hop of a dependency chain.
#[derive(Clone)]
pub struct ChainLink {
	link: Rc<DependencyLink>,
}

impl ChainLink {
	pub(crate) fn new(
		name: impl Into<String>,
		parent_retriever: Retriever,
		child: Option<ChainLink>,
		options: TraversalOptions,
		target_retriever: Option<Retriever>,
		record: SharedAccessRecord,
	) -> Self {
		Self {
			link: DependencyLink::new(
				name.into(),
				LinkRole::Link { parent_retriever },
				child.map(|child| child.link),
				options,
				target_retriever,
				record,
			),
		}
	}

	pub fn name(&self) -> &str {
		&self.link.name
	}

	pub fn child(&self) -> Option<ChainLink> {
		self.link.child.clone().map(|link| ChainLink { link })
	}

	pub fn options(&self) -> &TraversalOptions {
		&self.link.options
	}

	/// Current value of the hop's owner.
	pub fn current_parent(&self) -> Value {
		self.link.current_parent()
	}

	/// Current value of the member itself.
	pub fn current_target(&self) -> Value {
		self.link.current_target()
	}
}

impl fmt::Debug for ChainLink {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ChainLink").field("name", &self.link.name).finish()
	}
}

/// Root of a dependency chain.
#[derive(Clone)]
pub struct ChainHead {
	link: Rc<DependencyLink>,
}

impl ChainHead {
	pub(crate) fn new(
		parent: Value,
		name: impl Into<String>,
		child: Option<ChainLink>,
		options: TraversalOptions,
		target_retriever: Option<Retriever>,
		record: SharedAccessRecord,
	) -> Self {
		let link = DependencyLink::new(
			name.into(),
			LinkRole::Head {
				parent,
				changed: Event::new(),
			},
			child.map(|child| child.link),
			options,
			target_retriever,
			record,
		);
		link.set_top_level(&link);
		Self { link }
	}

	/// Member name of the first hop; empty for field-constant roots.
	pub fn name(&self) -> &str {
		&self.link.name
	}

	pub fn parent(&self) -> Value {
		self.link.current_parent()
	}

	pub fn child(&self) -> Option<ChainLink> {
		self.link.child.clone().map(|link| ChainLink { link })
	}

	pub fn options(&self) -> &TraversalOptions {
		&self.link.options
	}

	/// Member names from the root to the last hop.
	pub fn path(&self) -> Vec<String> {
		let mut names = Vec::new();
		self.link.path(&mut names);
		names
	}

	pub fn signature(&self) -> ChainSignature {
		ChainSignature {
			root: self.parent().address(),
			path: self.path(),
		}
	}

	/// Attach handlers to the current object graph, moving them where parents or targets changed.
	pub fn ensure_attached(&self) {
		self.link.ensure_attached();
	}

	/// Whether any hop currently holds a parent handler.
	pub fn is_attached(&self) -> bool {
		self.link.is_attached()
	}

	/// Disconnect every handler of the chain.
	pub fn detach(&self) {
		self.link.detach();
		debug!(chain = ?self.path(), "detached chain");
	}

	/// Register a handler for "something this chain depends on changed".
	pub fn on_changed<F>(&self, handler: F) -> HandlerId
	where
		F: Fn() -> ReactorResult<()> + 'static,
	{
		self.changed().connect(move |_| handler())
	}

	pub fn remove_changed_handler(&self, id: HandlerId) -> bool {
		self.changed().disconnect(id)
	}

	/// Raise `changed` as if a dependency had changed.
	pub fn raise_chain_changed(&self) -> ReactorResult<()> {
		self.link.raise_chain_changed()
	}

	/// Raise a property change for every hop on its current parent.
	///
	/// Fails with [`ReactorError::CannotNotify`] when a notifying parent does not support raising
	/// notifications from the outside.
	pub fn notify_targets(&self) -> ReactorResult<()> {
		self.link.notify_targets()
	}

	fn changed(&self) -> &Event<()> {
		match &self.link.role {
			LinkRole::Head { changed, .. } => changed,
			LinkRole::Link { .. } => unreachable!("chain heads always own the changed event"),
		}
	}
}

impl fmt::Debug for ChainHead {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ChainHead")
			.field("parent", &self.parent())
			.field("path", &self.path())
			.finish()
	}
}
