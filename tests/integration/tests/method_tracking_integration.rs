//! Method call integration tests
//!
//! Calls break dependency chains: their receivers and arguments are followed, their results are
//! not.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use rstest::*;
use xreact_core::{ExceptionHandlingPolicy, Expr, MarkerRegistry, React, ReactorConfig, Subscription, Value};
use xreact_integration_tests::isolated;
use xreact_integration_tests::recursive::{Recursive, path};

#[fixture]
fn config() -> ReactorConfig {
	isolated(ExceptionHandlingPolicy::FailFast)
}

/// Count the changes reported for `expr`.
fn count_changes(config: ReactorConfig, expr: Expr) -> (Subscription, Rc<Cell<usize>>) {
	let changes = Rc::new(Cell::new(0));
	let counter = changes.clone();
	let subscription = React::with_config(config)
		.to(expr, || ())
		.unwrap()
		.skip_initial()
		.subscribe(move |()| counter.set(counter.get() + 1))
		.unwrap();
	(subscription, changes)
}

#[rstest]
fn test_method_receiver_is_tracked(config: ReactorConfig) {
	// Arrange
	let recursive = Recursive::of_depth(1);
	let (_subscription, changes) = count_changes(config, path::inner(Expr::object(&recursive)).call("method_a", vec![]));

	// Act
	recursive.inner_at(1).set_property_a(5).unwrap();
	let after_inner_change = changes.get();
	recursive.set_inner(Some(Recursive::new())).unwrap();

	// Assert
	assert_eq!(after_inner_change, 0);
	assert_eq!(changes.get(), 1);
}

#[rstest]
fn test_track_last_child_follows_every_property_of_the_receiver(config: ReactorConfig) {
	let recursive = Recursive::of_depth(1);
	let old_inner = recursive.inner_at(1);
	let expr = path::inner(Expr::object(&recursive)).track_last_child().call("method_a", vec![]);
	let (_subscription, changes) = count_changes(config, expr);

	old_inner.set_property_b(3).unwrap();
	assert_eq!(changes.get(), 1);

	let new_inner = Recursive::new();
	recursive.set_inner(Some(new_inner.clone())).unwrap();
	assert_eq!(changes.get(), 2);

	old_inner.set_property_a(9).unwrap();
	assert_eq!(changes.get(), 2);
	assert_eq!(old_inner.receiver_count(), 0);

	new_inner.set_property_a(1).unwrap();
	assert_eq!(changes.get(), 3);
}

#[rstest]
fn test_members_of_method_results_are_not_followed(config: ReactorConfig) {
	// Arrange
	let recursive = Recursive::of_depth(1);
	let owner = recursive.clone();
	let call = path::inner(Expr::object(&recursive))
		.call("get_inner", vec![])
		.with_value(move || Value::optional_object(owner.inner()));
	let source = recursive.clone();
	let values = Rc::new(RefCell::new(Vec::new()));
	let sink = values.clone();
	let _subscription = React::with_config(config)
		.to(path::property_a(call), move || source.inner_at(1).property_a())
		.unwrap()
		.skip_initial()
		.subscribe(move |value| sink.borrow_mut().push(value))
		.unwrap();
	let replacement = Recursive::new();
	replacement.set_property_a(7).unwrap();

	// Act
	recursive.inner_at(1).set_property_a(5).unwrap();
	recursive.set_inner(Some(replacement.clone())).unwrap();
	replacement.set_property_a(8).unwrap();

	// Assert
	assert_eq!(*values.borrow(), vec![7]);
}

#[rstest]
fn test_static_call_arguments_are_tracked(config: ReactorConfig) {
	let a = Recursive::new();
	let b = Recursive::new();
	let expr = Expr::call_static(
		"max",
		vec![path::property_a(Expr::object(&a)), path::property_b(Expr::object(&b))],
	);
	let (left, right) = (a.clone(), b.clone());
	let values = Rc::new(RefCell::new(Vec::new()));
	let sink = values.clone();
	let _subscription = React::with_config(config)
		.to(expr, move || left.property_a().max(right.property_b()))
		.unwrap()
		.skip_initial()
		.subscribe(move |value| sink.borrow_mut().push(value))
		.unwrap();

	a.set_property_a(3).unwrap();
	b.set_property_b(8).unwrap();

	assert_eq!(*values.borrow(), vec![3, 8]);
}

#[rstest]
fn test_invocation_arguments_are_tracked(config: ReactorConfig) {
	let recursive = Recursive::new();
	let callee = Expr::static_field("Callback", || Value::Null);
	let expr = Expr::invoke(callee, vec![path::property_a(Expr::object(&recursive))]);
	let (_subscription, changes) = count_changes(config, expr);

	recursive.set_property_a(2).unwrap();
	recursive.set_property_b(2).unwrap();

	assert_eq!(changes.get(), 1);
}

#[rstest]
fn test_unregistered_marker_is_analyzed_like_a_method(config: ReactorConfig) {
	// Arrange
	let recursive = Recursive::of_depth(1);
	let expr = path::inner(Expr::object(&recursive)).track_last_child();
	let (_standard, standard_changes) = count_changes(config.clone(), expr.clone());
	let (_bare, bare_changes) = count_changes(config.with_markers(MarkerRegistry::empty()), expr);

	// Act
	recursive.inner_at(1).set_property_a(4).unwrap();

	// Assert
	assert_eq!(standard_changes.get(), 1);
	assert_eq!(bare_changes.get(), 0);
}
