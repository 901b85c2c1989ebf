//! Expression dependency analysis.
//!
//! The analyzer walks an [`Expr`] from the outside in. Every member access it passes builds one
//! more hop of the chain it is currently following; the chain is closed into a [`ChainHead`] when
//! the walk reaches a constant notifying object, a field-constant root, or a constant collection read
//! as a whole.
//!
//! Method calls and invocations break chains: the analyzer cannot know what a method reads, so
//! the value they return is not followed. Their receivers and arguments are still analyzed, and with
//! `track_last_child` the hop right before the call watches every property of its value.

use std::collections::HashSet;

use tracing::debug;

use crate::chain::{ChainHead, ChainLink, ChainSignature};
use crate::error::{ReactorError, ReactorResult};
use crate::expr::{Expr, ExprNode, MemberKind};
use crate::options::TraversalOptions;
use crate::settings::ReactorConfig;
use crate::value::Value;

/// What follows the node currently being analyzed.
#[derive(Clone)]
enum Continuation {
	/// Nothing trackable follows.
	None,
	/// A chain hop follows.
	Link(ChainLink),
	/// The value flows into a method call or invocation.
	MethodBreak,
	/// The value flows into a field that is not tracked.
	FieldBreak,
}

impl Continuation {
	fn link(&self) -> Option<ChainLink> {
		match self {
			Self::Link(link) => Some(link.clone()),
			_ => None,
		}
	}

	fn is_trackable(&self) -> bool {
		matches!(self, Self::Link(_) | Self::MethodBreak)
	}
}

struct Analyzer<'a> {
	config: &'a ReactorConfig,
	chains: Vec<ChainHead>,
	signatures: HashSet<ChainSignature>,
}

/// Find the dependency chains of `expr`.
///
/// # Arguments
///
/// * `expr` - Expression description to analyze.
/// * `options` - Options in effect at the top of the expression.
/// * `config` - Supplies the marker registry and the access record of the built chains.
/// * `attach` - Attach every chain to the current object graph before returning.
///
/// # Errors
///
/// [`ReactorError::NothingTrackable`] when the expression reads no notifying member.
pub fn analyze(
	expr: &Expr,
	options: &TraversalOptions,
	config: &ReactorConfig,
	attach: bool,
) -> ReactorResult<Vec<ChainHead>> {
	let mut analyzer = Analyzer {
		config,
		chains: Vec::new(),
		signatures: HashSet::new(),
	};
	analyzer.visit(expr, Continuation::None, options);

	if analyzer.chains.is_empty() {
		return Err(ReactorError::NothingTrackable);
	}
	debug!(expression = %expr, chains = analyzer.chains.len(), "analyzed expression");

	if attach {
		for chain in &analyzer.chains {
			chain.ensure_attached();
		}
	}
	Ok(analyzer.chains)
}

/// `true` when `expr` is a field access whose owners are fields all the way down to a constant or a
/// static field.
fn is_field_chain(expr: &Expr) -> bool {
	let mut current = expr;
	loop {
		match current.node() {
			ExprNode::Constant(_) => return true,
			ExprNode::Member {
				kind: MemberKind::Field,
				owner: None,
				..
			} => return true,
			ExprNode::Member {
				kind: MemberKind::Field,
				owner: Some(owner),
				..
			} => current = owner,
			_ => return false,
		}
	}
}

impl Analyzer<'_> {
	fn visit(&mut self, expr: &Expr, child: Continuation, options: &TraversalOptions) {
		match expr.node() {
			ExprNode::Constant(value) => self.add_collection_root(expr, value, &child, options),
			ExprNode::Parameter(_) => {}
			ExprNode::Lambda { body, .. } => self.visit(body, child, options),
			ExprNode::Member { kind, .. } => match kind {
				MemberKind::Field => self.visit_field(expr, child, options),
				MemberKind::Property => self.visit_property(expr, child, options),
			},
			ExprNode::Unary { operand, .. } | ExprNode::TypeTest { operand, .. } => {
				self.visit(operand, child, options)
			}
			ExprNode::Binary { left, right, .. } => {
				self.visit(left, child.clone(), options);
				self.visit(right, child, options);
			}
			ExprNode::Conditional {
				test,
				if_true,
				if_false,
				..
			} => {
				self.visit(test, child.clone(), options);
				self.visit(if_false, child.clone(), options);
				self.visit(if_true, child, options);
			}
			ExprNode::Call { receiver, args, .. } => {
				if let Some(receiver) = receiver {
					self.visit(receiver, Continuation::MethodBreak, options);
				}
				for arg in args {
					self.visit(arg, Continuation::MethodBreak, options);
				}
			}
			ExprNode::Marker {
				marker,
				receiver,
				args,
			} => match self.config.markers.apply(*marker, options, args) {
				Some(marked) => self.visit(receiver, child, &marked),
				None => self.visit(receiver, Continuation::MethodBreak, options),
			},
			ExprNode::Invoke { callee, args, .. } => {
				self.visit(callee, Continuation::MethodBreak, options);
				for arg in args {
					self.visit(arg, Continuation::MethodBreak, options);
				}
			}
		}
	}

	fn visit_field(&mut self, expr: &Expr, child: Continuation, options: &TraversalOptions) {
		let ExprNode::Member { owner, .. } = expr.node() else {
			return;
		};
		if options.track_fields {
			let constant_owner = owner
				.as_ref()
				.is_none_or(|owner| matches!(owner.node(), ExprNode::Constant(_)));
			if constant_owner || (is_field_chain(expr) && child.is_trackable()) {
				self.add_field_constant_root(expr, child, options);
				return;
			}
		}
		if let Some(owner) = owner {
			self.visit(owner, Continuation::FieldBreak, options);
		}
	}

	fn visit_property(&mut self, expr: &Expr, child: Continuation, options: &TraversalOptions) {
		let ExprNode::Member { owner, name, .. } = expr.node() else {
			return;
		};
		let Some(owner) = owner else {
			// static property
			self.add_field_constant_root(expr, child, options);
			return;
		};
		match owner.node() {
			ExprNode::Parameter(_) => {}
			ExprNode::Constant(value) if value.can_notify() => {
				let head = ChainHead::new(
					value.clone(),
					name.as_str(),
					child.link(),
					options.clone(),
					expr.retriever(),
					self.config.access_record.clone(),
				);
				self.add_chain(head);
			}
			ExprNode::Constant(_) => self.add_field_constant_root(expr, child, options),
			_ => {
				let continuation = match owner.retriever() {
					Some(parent_retriever) => Continuation::Link(ChainLink::new(
						name.as_str(),
						parent_retriever,
						child.link(),
						options.clone(),
						expr.retriever(),
						self.config.access_record.clone(),
					)),
					None => Continuation::None,
				};
				self.visit(owner, continuation, options);
			}
		}
	}

	/// Use the current value of a field (or static member) as a fixed root.
	fn add_field_constant_root(&mut self, expr: &Expr, child: Continuation, options: &TraversalOptions) {
		if !child.is_trackable() {
			return;
		}
		let Some(retriever) = expr.retriever() else {
			return;
		};
		let link = child.link();
		let notifier = match &link {
			Some(link) => link.current_parent(),
			None => retriever(),
		};
		if !notifier.can_notify() {
			return;
		}
		let head = ChainHead::new(
			notifier,
			"",
			link,
			options.clone(),
			Some(retriever),
			self.config.access_record.clone(),
		);
		self.add_chain(head);
	}

	/// Watch the membership of a constant collection read as a whole.
	fn add_collection_root(&mut self, expr: &Expr, value: &Value, child: &Continuation, options: &TraversalOptions) {
		if matches!(child, Continuation::FieldBreak)
			|| !options.tracks_collections()
			|| value.collection_changed().is_none()
		{
			return;
		}
		let head = ChainHead::new(
			value.clone(),
			"",
			None,
			options.clone(),
			expr.retriever(),
			self.config.access_record.clone(),
		);
		self.add_chain(head);
	}

	fn add_chain(&mut self, head: ChainHead) {
		if self.signatures.insert(head.signature()) {
			self.chains.push(head);
		}
	}
}
