//! Expression descriptions.
//!
//! An [`Expr`] describes *what* a reactive computation reads: which objects, which members, which
//! method calls and branches. The analyzer walks this description to find the dependencies; the
//! value of the computation itself comes from a separate closure passed to
//! [`React::to`](crate::React::to).
//!
//! Member accesses carry a getter so that the engine can resolve the current parent and target of
//! every hop while the object graph changes.
//!
//! ## Example
//!
//! ```ignore
//! use xreact_core::expr::Expr;
//!
//! // room.owner.age
//! let expr = Expr::object(&room)
//! 	.property_with("Owner", |room: &Room| Value::optional_object(room.owner()))
//! 	.property("Age");
//!
//! // room.furniture().track_items()
//! let expr = Expr::object(&room)
//! 	.property_with("Furniture", |room: &Room| Value::collection(room.furniture()))
//! 	.track_items();
//! ```

use core::any::Any;
use core::fmt;
use std::rc::Rc;

use crate::error::{ReactorError, ReactorResult};
use crate::markers::Marker;
use crate::notify::{NotifyCollectionChanged, NotifyPropertyChanged};
use crate::value::Value;

/// Produces the current value of a node.
pub type Retriever = Rc<dyn Fn() -> Value>;

type MemberGetter = Rc<dyn Fn(&Value) -> Value>;

/// Owner of captured variables.
struct CaptureScope;

/// Member flavour. Fields never notify; properties may.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberKind {
	Property,
	Field,
}

#[derive(Clone)]
pub(crate) enum ExprNode {
	Constant(Value),
	Parameter(String),
	Member {
		/// `None` for static members.
		owner: Option<Expr>,
		name: String,
		kind: MemberKind,
		getter: MemberGetter,
	},
	Unary {
		operand: Expr,
		value: Option<Retriever>,
	},
	Binary {
		left: Expr,
		right: Expr,
		value: Option<Retriever>,
	},
	TypeTest {
		operand: Expr,
		value: Option<Retriever>,
	},
	Conditional {
		test: Expr,
		if_true: Expr,
		if_false: Expr,
		value: Option<Retriever>,
	},
	Call {
		receiver: Option<Expr>,
		method: String,
		args: Vec<Expr>,
		value: Option<Retriever>,
	},
	Marker {
		marker: Marker,
		receiver: Expr,
		args: Vec<String>,
	},
	Invoke {
		callee: Expr,
		args: Vec<Expr>,
		value: Option<Retriever>,
	},
	Lambda {
		parameters: Vec<String>,
		body: Expr,
	},
}

/// Description of an expression over notifying objects.
///
/// Cloning is cheap; nodes are shared.
#[derive(Clone)]
pub struct Expr {
	node: Rc<ExprNode>,
}

fn typed_getter<O, F>(getter: F) -> MemberGetter
where
	O: Any,
	F: Fn(&O) -> Value + 'static,
{
	Rc::new(move |owner: &Value| owner.downcast_ref::<O>().map_or(Value::Null, &getter))
}

impl Expr {
	fn from_node(node: ExprNode) -> Self {
		Self {
			node: Rc::new(node),
		}
	}

	pub(crate) fn node(&self) -> &ExprNode {
		&self.node
	}

	/// A constant value.
	pub fn constant(value: Value) -> Self {
		Self::from_node(ExprNode::Constant(value))
	}

	/// A constant reference to a notifying object.
	pub fn object<T: NotifyPropertyChanged>(object: &Rc<T>) -> Self {
		Self::constant(Value::object(Rc::clone(object)))
	}

	/// A constant reference to a notifying collection.
	pub fn collection<T: NotifyCollectionChanged>(collection: &Rc<T>) -> Self {
		Self::constant(Value::collection(Rc::clone(collection)))
	}

	/// A captured local variable.
	///
	/// Captured variables behave like fields of a constant scope: their current value is used as a
	/// root, but rebinding the variable is not observed.
	pub fn captured(name: impl Into<String>, value: Value) -> Self {
		Self::constant(Value::plain(CaptureScope)).field_with_value(name, move |_| value.clone())
	}

	/// A lambda parameter. Members of parameters are not tracked.
	pub fn parameter(name: impl Into<String>) -> Self {
		Self::from_node(ExprNode::Parameter(name.into()))
	}

	fn member(owner: Option<Expr>, name: String, kind: MemberKind, getter: MemberGetter) -> Self {
		Self::from_node(ExprNode::Member {
			owner,
			name,
			kind,
			getter,
		})
	}

	/// Property whose value is never an object or collection the engine should follow.
	pub fn property(self, name: impl Into<String>) -> Self {
		Self::member(Some(self), name.into(), MemberKind::Property, Rc::new(|_| Value::Null))
	}

	/// Property read through a typed getter on the owner.
	///
	/// # Arguments
	///
	/// * `name` - Member name, matched against property change notifications of the owner.
	/// * `getter` - Reads the member value. Not called when the owner is null or of another type.
	pub fn property_with<O, F>(self, name: impl Into<String>, getter: F) -> Self
	where
		O: Any,
		F: Fn(&O) -> Value + 'static,
	{
		Self::member(Some(self), name.into(), MemberKind::Property, typed_getter(getter))
	}

	/// Field whose value is never followed.
	pub fn field(self, name: impl Into<String>) -> Self {
		Self::member(Some(self), name.into(), MemberKind::Field, Rc::new(|_| Value::Null))
	}

	/// Field read through a typed getter on the owner.
	pub fn field_with<O, F>(self, name: impl Into<String>, getter: F) -> Self
	where
		O: Any,
		F: Fn(&O) -> Value + 'static,
	{
		Self::member(Some(self), name.into(), MemberKind::Field, typed_getter(getter))
	}

	fn field_with_value<F>(self, name: impl Into<String>, getter: F) -> Self
	where
		F: Fn(&Value) -> Value + 'static,
	{
		Self::member(Some(self), name.into(), MemberKind::Field, Rc::new(getter))
	}

	/// Static property. Its current value acts as a constant root.
	pub fn static_property<F>(name: impl Into<String>, getter: F) -> Self
	where
		F: Fn() -> Value + 'static,
	{
		Self::member(None, name.into(), MemberKind::Property, Rc::new(move |_| getter()))
	}

	/// Static field. Its current value acts as a constant root.
	pub fn static_field<F>(name: impl Into<String>, getter: F) -> Self
	where
		F: Fn() -> Value + 'static,
	{
		Self::member(None, name.into(), MemberKind::Field, Rc::new(move |_| getter()))
	}

	pub fn unary(operand: Expr) -> Self {
		Self::from_node(ExprNode::Unary {
			operand,
			value: None,
		})
	}

	pub fn binary(left: Expr, right: Expr) -> Self {
		Self::from_node(ExprNode::Binary {
			left,
			right,
			value: None,
		})
	}

	/// A type test (`x is T`) on `operand`.
	pub fn type_test(operand: Expr) -> Self {
		Self::from_node(ExprNode::TypeTest {
			operand,
			value: None,
		})
	}

	pub fn conditional(test: Expr, if_true: Expr, if_false: Expr) -> Self {
		Self::from_node(ExprNode::Conditional {
			test,
			if_true,
			if_false,
			value: None,
		})
	}

	/// Method call on `self`.
	pub fn call(self, method: impl Into<String>, args: Vec<Expr>) -> Self {
		Self::from_node(ExprNode::Call {
			receiver: Some(self),
			method: method.into(),
			args,
			value: None,
		})
	}

	/// Static or free function call.
	pub fn call_static(method: impl Into<String>, args: Vec<Expr>) -> Self {
		Self::from_node(ExprNode::Call {
			receiver: None,
			method: method.into(),
			args,
			value: None,
		})
	}

	/// Invocation of a function value.
	pub fn invoke(callee: Expr, args: Vec<Expr>) -> Self {
		Self::from_node(ExprNode::Invoke {
			callee,
			args,
			value: None,
		})
	}

	pub fn lambda<I, S>(parameters: I, body: Expr) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self::from_node(ExprNode::Lambda {
			parameters: parameters.into_iter().map(Into::into).collect(),
			body,
		})
	}

	/// Attach an evaluator to a call, invocation, operator or conditional node.
	///
	/// Without an evaluator such a node cannot be resolved, so a chain continuing through it (for
	/// example `room.largest().num_seats`) is dropped. Other node kinds are returned unchanged.
	pub fn with_value<F>(self, value: F) -> Self
	where
		F: Fn() -> Value + 'static,
	{
		let retriever: Retriever = Rc::new(value);
		let mut node = (*self.node).clone();
		match &mut node {
			ExprNode::Unary { value, .. }
			| ExprNode::Binary { value, .. }
			| ExprNode::TypeTest { value, .. }
			| ExprNode::Conditional { value, .. }
			| ExprNode::Call { value, .. }
			| ExprNode::Invoke { value, .. } => *value = Some(retriever),
			_ => return self,
		}
		Self::from_node(node)
	}

	/// Wrap `self` in a marker call.
	pub fn marker(self, marker: Marker, args: Vec<String>) -> Self {
		Self::from_node(ExprNode::Marker {
			marker,
			receiver: self,
			args,
		})
	}

	/// Track every item of the collection and all item properties.
	pub fn track_items(self) -> Self {
		self.marker(Marker::TrackItems, Vec::new())
	}

	/// Track every item of the collection, re-evaluating only for the listed item properties.
	pub fn track_items_of<I, S>(self, properties: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.marker(
			Marker::TrackItems,
			properties.into_iter().map(Into::into).collect(),
		)
	}

	pub fn track_last_child(self) -> Self {
		self.marker(Marker::TrackLastChild, Vec::new())
	}

	pub fn do_not_track_last_child(self) -> Self {
		self.marker(Marker::DoNotTrackLastChild, Vec::new())
	}

	pub fn track_fields(self) -> Self {
		self.marker(Marker::TrackFields, Vec::new())
	}

	pub fn do_not_track_fields(self) -> Self {
		self.marker(Marker::DoNotTrackFields, Vec::new())
	}

	/// Whether the current value of this node can be computed.
	pub fn is_evaluable(&self) -> bool {
		match self.node() {
			ExprNode::Constant(_) => true,
			ExprNode::Parameter(_) | ExprNode::Lambda { .. } => false,
			ExprNode::Member { owner, .. } => owner.as_ref().is_none_or(Expr::is_evaluable),
			ExprNode::Marker { receiver, .. } => receiver.is_evaluable(),
			ExprNode::Unary { value, .. }
			| ExprNode::Binary { value, .. }
			| ExprNode::TypeTest { value, .. }
			| ExprNode::Conditional { value, .. }
			| ExprNode::Call { value, .. }
			| ExprNode::Invoke { value, .. } => value.is_some(),
		}
	}

	/// Current value of this node. Member access on a null owner yields null.
	pub fn evaluate(&self) -> Option<Value> {
		match self.node() {
			ExprNode::Constant(value) => Some(value.clone()),
			ExprNode::Parameter(_) | ExprNode::Lambda { .. } => None,
			ExprNode::Member { owner, getter, .. } => match owner {
				None => Some(getter(&Value::Null)),
				Some(owner) => {
					let owner = owner.evaluate()?;
					if owner.is_null() {
						Some(Value::Null)
					} else {
						Some(getter(&owner))
					}
				}
			},
			ExprNode::Marker { receiver, .. } => receiver.evaluate(),
			ExprNode::Unary { value, .. }
			| ExprNode::Binary { value, .. }
			| ExprNode::TypeTest { value, .. }
			| ExprNode::Conditional { value, .. }
			| ExprNode::Call { value, .. }
			| ExprNode::Invoke { value, .. } => value.as_ref().map(|value| value()),
		}
	}

	/// Retriever re-evaluating this node on every call, if the node is evaluable.
	pub fn retriever(&self) -> Option<Retriever> {
		if !self.is_evaluable() {
			return None;
		}
		let expr = self.clone();
		Some(Rc::new(move || expr.evaluate().unwrap_or_default()))
	}

	/// Name of the member accessed by a simple member access (`owner.name`).
	///
	/// A lambda is looked through to its body.
	pub fn member_name(&self) -> ReactorResult<&str> {
		match self.node() {
			ExprNode::Member { name, .. } => Ok(name),
			ExprNode::Lambda { body, .. } => body.member_name(),
			_ => Err(ReactorError::InvalidExpressionShape {
				found: self.kind_name().to_owned(),
			}),
		}
	}

	/// Short name of the node kind.
	pub fn kind_name(&self) -> &'static str {
		match self.node() {
			ExprNode::Constant(_) => "constant",
			ExprNode::Parameter(_) => "parameter",
			ExprNode::Member {
				kind: MemberKind::Property,
				..
			} => "property access",
			ExprNode::Member {
				kind: MemberKind::Field,
				..
			} => "field access",
			ExprNode::Unary { .. } => "unary operation",
			ExprNode::Binary { .. } => "binary operation",
			ExprNode::TypeTest { .. } => "type test",
			ExprNode::Conditional { .. } => "conditional",
			ExprNode::Call { .. } => "method call",
			ExprNode::Marker { .. } => "marker call",
			ExprNode::Invoke { .. } => "invocation",
			ExprNode::Lambda { .. } => "lambda",
		}
	}
}

fn write_list(f: &mut fmt::Formatter<'_>, items: &[Expr]) -> fmt::Result {
	for (index, item) in items.iter().enumerate() {
		if index > 0 {
			f.write_str(", ")?;
		}
		write!(f, "{item}")?;
	}
	Ok(())
}

impl fmt::Display for Expr {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self.node() {
			ExprNode::Constant(Value::Null) => f.write_str("null"),
			ExprNode::Constant(value) if value.downcast_ref::<CaptureScope>().is_some() => {
				f.write_str("scope")
			}
			ExprNode::Constant(value) => match value.object_id() {
				Some(id) => write!(f, "{id}"),
				None => f.write_str("const"),
			},
			ExprNode::Parameter(name) => f.write_str(name),
			ExprNode::Member { owner, name, .. } => match owner {
				Some(owner) => write!(f, "{owner}.{name}"),
				None => write!(f, "static.{name}"),
			},
			ExprNode::Unary { operand, .. } => write!(f, "op({operand})"),
			ExprNode::Binary { left, right, .. } => write!(f, "({left} op {right})"),
			ExprNode::TypeTest { operand, .. } => write!(f, "({operand} is ..)"),
			ExprNode::Conditional {
				test,
				if_true,
				if_false,
				..
			} => write!(f, "({test} ? {if_true} : {if_false})"),
			ExprNode::Call {
				receiver,
				method,
				args,
				..
			} => {
				if let Some(receiver) = receiver {
					write!(f, "{receiver}.")?;
				}
				write!(f, "{method}(")?;
				write_list(f, args)?;
				f.write_str(")")
			}
			ExprNode::Marker {
				marker,
				receiver,
				args,
			} => write!(f, "{receiver}.{marker}({})", args.join(", ")),
			ExprNode::Invoke { callee, args, .. } => {
				write!(f, "{callee}(")?;
				write_list(f, args)?;
				f.write_str(")")
			}
			ExprNode::Lambda { parameters, body } => {
				write!(f, "|{}| {body}", parameters.join(", "))
			}
		}
	}
}

impl fmt::Debug for Expr {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "Expr({self})")
	}
}
