//! Collection tracking property-based tests
//!
//! Random edits of a tracked furniture list: the tracked total always matches the list, and
//! items that left the list are never observed again.

use std::cell::Cell;
use std::rc::Rc;

use proptest::prelude::*;
use rstest::*;
use xreact_cells::Shared;
use xreact_core::{ExceptionHandlingPolicy, NotifyPropertyChanged, React};
use xreact_integration_tests::isolated;
use xreact_integration_tests::models::{Furniture, Room};

#[derive(Debug, Clone)]
enum Edit {
	Push(i32),
	Remove(usize),
	SetSeats(usize, i32),
	Replace(usize, i32),
	Move(usize, usize),
	Clear,
	SetDetachedSeats(usize, i32),
}

fn edit() -> impl Strategy<Value = Edit> {
	prop_oneof![
		3 => (0..10i32).prop_map(Edit::Push),
		1 => any::<usize>().prop_map(Edit::Remove),
		2 => (any::<usize>(), 0..10i32).prop_map(|(index, seats)| Edit::SetSeats(index, seats)),
		1 => (any::<usize>(), 0..10i32).prop_map(|(index, seats)| Edit::Replace(index, seats)),
		1 => (any::<usize>(), any::<usize>()).prop_map(|(from, to)| Edit::Move(from, to)),
		1 => Just(Edit::Clear),
		1 => (any::<usize>(), 10..20i32).prop_map(|(index, seats)| Edit::SetDetachedSeats(index, seats)),
	]
}

fn furniture_with(seats: i32) -> Shared<Furniture> {
	let item = Furniture::chair();
	item.num_seats.set(seats).unwrap();
	item
}

fn receivers(item: &Shared<Furniture>) -> usize {
	NotifyPropertyChanged::property_changed(&**item).receiver_count()
}

// ============================================================================
// Property-Based Tests: item tracking
// ============================================================================

proptest! {
	/// Test: tracked total follows random edits
	///
	/// Category: Property
	/// Verifies that a subscription tracking every item always reports the current total, and
	/// that items removed from the list keep no handlers.
	#[rstest]
	fn prop_tracked_total_matches_list(edits in prop::collection::vec(edit(), 1..40)) {
		let config = isolated(ExceptionHandlingPolicy::FailFast);
		let room = Room::new(&config).unwrap();
		let list = room.furniture.get();
		let total = Rc::new(Cell::new(0));
		let notifications = Rc::new(Cell::new(0));
		let (sink, counter, source) = (total.clone(), notifications.clone(), room.clone());
		let _subscription = React::with_config(config)
			.to(Room::furniture_expr(&room).track_items(), move || {
				source
					.furniture
					.get()
					.with_items(|items| items.iter().map(|item| item.num_seats.get()).sum::<i32>())
			})
			.unwrap()
			.subscribe(move |value| {
				sink.set(value);
				counter.set(counter.get() + 1);
			})
			.unwrap();
		let mut detached: Vec<Shared<Furniture>> = Vec::new();

		for edit in edits {
			let len = list.len();
			let before = notifications.get();
			match edit {
				Edit::Push(seats) => list.push(furniture_with(seats)).unwrap(),
				Edit::Remove(index) if len > 0 => detached.push(list.remove(index % len).unwrap()),
				Edit::SetSeats(index, seats) if len > 0 => {
					let item = list.get(index % len).unwrap();
					item.num_seats.set(seats).unwrap();
				}
				Edit::Replace(index, seats) if len > 0 => {
					detached.push(list.replace(index % len, furniture_with(seats)).unwrap());
				}
				Edit::Move(from, to) if len > 0 => list.move_item(from % len, to % len).unwrap(),
				Edit::Clear => {
					detached.extend(list.to_vec());
					list.clear().unwrap();
				}
				Edit::SetDetachedSeats(index, seats) if !detached.is_empty() => {
					let item = &detached[index % detached.len()];
					item.num_seats.set(seats).unwrap();
					prop_assert_eq!(notifications.get(), before);
				}
				_ => {}
			}

			let expected: i32 = list.with_items(|items| items.iter().map(|item| item.num_seats.get()).sum());
			prop_assert_eq!(total.get(), expected);
		}

		for item in &detached {
			prop_assert_eq!(receivers(item), 0);
		}
	}

	/// Test: membership-only tracking ignores item edits
	///
	/// Category: Property
	/// Verifies that without item tracking, seat changes never notify.
	#[rstest]
	fn prop_membership_tracking_ignores_items(seats in prop::collection::vec(0..10i32, 1..20)) {
		let config = isolated(ExceptionHandlingPolicy::FailFast);
		let room = Room::new(&config).unwrap();
		let list = room.furniture.get();
		for count in &seats {
			list.push(furniture_with(*count)).unwrap();
		}
		let notifications = Rc::new(Cell::new(0));
		let counter = notifications.clone();
		let _subscription = React::with_config(config)
			.to(Room::furniture_expr(&room), || ())
			.unwrap()
			.skip_initial()
			.subscribe(move |()| counter.set(counter.get() + 1))
			.unwrap();

		for item in list.to_vec() {
			let next = item.num_seats.get() + 1;
			item.num_seats.set(next).unwrap();
		}

		prop_assert_eq!(notifications.get(), 0);
	}
}
