//! Collection tracking integration tests
//!
//! Membership and item tracking of notifying collections reached through properties.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use rstest::*;
use xreact_cells::{ObservableVec, Shared};
use xreact_core::{ExceptionHandlingPolicy, Expr, NotifyPropertyChanged, React, ReactorConfig, Subscription, Value};
use xreact_integration_tests::isolated;
use xreact_integration_tests::models::{Furniture, FurnitureList, Person, Room};

#[fixture]
fn config() -> ReactorConfig {
	isolated(ExceptionHandlingPolicy::FailFast)
}

fn seats(furniture: &Option<Shared<Furniture>>) -> Option<i32> {
	furniture.as_ref().map(|item| item.num_seats.get())
}

/// Count the "changed" notifications of `expr`.
fn count_changes(config: ReactorConfig, expr: Expr) -> (Subscription, Rc<Cell<usize>>) {
	let changes = Rc::new(Cell::new(0));
	let counter = changes.clone();
	let subscription = React::with_config(config)
		.to(expr, || ())
		.unwrap()
		.subscribe_changes(move || {
			counter.set(counter.get() + 1);
			Ok(())
		});
	(subscription, changes)
}

#[rstest]
fn test_largest_place_to_sit_tracks_items(config: ReactorConfig) {
	// Arrange
	let room = Room::new(&config).unwrap();
	let furniture = room.furniture.get();
	let chair = Furniture::chair();
	let sofa = Furniture::sofa();

	// Act
	furniture.push(chair.clone()).unwrap();
	let with_chair = room.largest_place_to_sit.get();
	furniture.push(sofa.clone()).unwrap();
	let with_sofa = room.largest_place_to_sit.get();
	chair.num_seats.set(10).unwrap();

	// Assert
	assert_eq!(with_chair, Some(chair.clone()));
	assert_eq!(with_sofa, Some(sofa.clone()));
	assert_eq!(room.largest_place_to_sit.get(), Some(chair.clone()));
}

#[rstest]
fn test_removed_items_are_no_longer_tracked(config: ReactorConfig) {
	let room = Room::new(&config).unwrap();
	let furniture = room.furniture.get();
	let chair = Furniture::chair();
	let sofa = Furniture::sofa();
	furniture.push(chair.clone()).unwrap();
	furniture.push(sofa.clone()).unwrap();
	chair.num_seats.set(10).unwrap();

	assert!(furniture.remove_item(&chair).unwrap());
	assert_eq!(room.largest_place_to_sit.get(), Some(sofa.clone()));

	chair.num_seats.set(20).unwrap();
	assert_eq!(room.largest_place_to_sit.get(), Some(sofa.clone()));

	sofa.num_seats.set(2).unwrap();
	assert_eq!(seats(&room.largest_place_to_sit.get()), Some(2));
}

#[rstest]
fn test_smallest_place_to_sit_tracks_membership_only(config: ReactorConfig) {
	let room = Room::new(&config).unwrap();
	let furniture = room.furniture.get();
	let chair = Furniture::chair();
	let sofa = Furniture::sofa();
	furniture.push(sofa.clone()).unwrap();
	furniture.push(chair.clone()).unwrap();
	assert_eq!(room.smallest_place_to_sit.get(), Some(chair.clone()));

	// item changes are not observed
	chair.num_seats.set(10).unwrap();
	assert_eq!(room.smallest_place_to_sit.get(), Some(chair.clone()));

	// the next membership change re-evaluates
	furniture.push(Furniture::table()).unwrap();
	assert_eq!(room.smallest_place_to_sit.get(), Some(sofa.clone()));
}

#[rstest]
fn test_num_furniture_follows_count(config: ReactorConfig) {
	let room = Room::new(&config).unwrap();
	let furniture = room.furniture.get();

	furniture.push(Furniture::chair()).unwrap();
	furniture.push(Furniture::sofa()).unwrap();
	assert_eq!(room.num_furniture.get(), 2);

	furniture.set_all(vec![Furniture::table()]).unwrap();
	assert_eq!(room.num_furniture.get(), 1);

	furniture.clear().unwrap();
	assert_eq!(room.num_furniture.get(), 0);
}

#[rstest]
fn test_reset_rehooks_current_items(config: ReactorConfig) {
	let room = Room::new(&config).unwrap();
	let furniture = room.furniture.get();
	let old_chair = Furniture::chair();
	let new_chair = Furniture::chair();
	furniture.push(old_chair.clone()).unwrap();

	furniture.set_all(vec![new_chair.clone(), Furniture::sofa()]).unwrap();
	new_chair.num_seats.set(9).unwrap();
	old_chair.num_seats.set(12).unwrap();

	assert_eq!(room.largest_place_to_sit.get(), Some(new_chair));
}

#[rstest]
fn test_replaced_collection_is_followed(config: ReactorConfig) {
	// Arrange
	let room = Room::new(&config).unwrap();
	let old_list = room.furniture.get();
	let old_sofa = Furniture::sofa();
	old_list.push(old_sofa.clone()).unwrap();
	let chair = Furniture::chair();
	let new_list = Shared::new(FurnitureList::from_vec(vec![chair.clone()]));

	// Act
	room.furniture.set(new_list.clone()).unwrap();

	// Assert
	assert_eq!(room.largest_place_to_sit.get(), Some(chair.clone()));
	assert_eq!(room.num_furniture.get(), 1);

	old_list.push(Furniture::sofa()).unwrap();
	old_sofa.num_seats.set(8).unwrap();
	assert_eq!(room.largest_place_to_sit.get(), Some(chair.clone()));
	assert_eq!(room.num_furniture.get(), 1);

	let sofa = Furniture::sofa();
	new_list.push(sofa.clone()).unwrap();
	assert_eq!(room.largest_place_to_sit.get(), Some(sofa));
	assert_eq!(room.num_furniture.get(), 2);
}

#[rstest]
fn test_preconfigured_item_properties_filter_notifications(config: ReactorConfig) {
	let room = Room::new(&config).unwrap();
	let ann = Person::new(&config, "Ann", 30).unwrap();
	room.guests.get().push(ann.clone()).unwrap();
	let totals = Rc::new(RefCell::new(Vec::new()));
	let sink = totals.clone();
	let source = room.clone();
	let _subscription = React::with_config(config.clone())
		.track_items_of(["Age"])
		.to(Room::guests_expr(&room), move || {
			source.guests.get().with_items(|items| items.iter().map(|guest| guest.age.get()).sum::<i32>())
		})
		.unwrap()
		.skip_initial()
		.subscribe(move |total| sink.borrow_mut().push(total))
		.unwrap();

	ann.name.set("Annie".to_string()).unwrap();
	ann.age.set(35).unwrap();
	room.guests.get().push(Person::new(&config, "Bob", 5).unwrap()).unwrap();

	assert_eq!(*totals.borrow(), vec![35, 40]);
}

#[rstest]
fn test_untracked_collections_ignore_membership(config: ReactorConfig) {
	let room = Room::new(&config).unwrap();
	let reads = Rc::new(RefCell::new(0));
	let counter = reads.clone();
	let _subscription = React::with_config(config.clone())
		.do_not_track_collections()
		.to(Room::furniture_expr(&room), || ())
		.unwrap()
		.skip_initial()
		.subscribe(move |()| *counter.borrow_mut() += 1)
		.unwrap();

	room.furniture.get().push(Furniture::chair()).unwrap();
	assert_eq!(*reads.borrow(), 0);

	room.furniture.set(Shared::new(ObservableVec::new())).unwrap();
	assert_eq!(*reads.borrow(), 1);
}

#[rstest]
fn test_constant_collection_is_tracked_with_its_items(config: ReactorConfig) {
	// Arrange
	let list = Shared::new(FurnitureList::new());
	let chair = Furniture::chair();
	let (_subscription, changes) = count_changes(config, Expr::collection(list.rc()).track_items());

	// Act
	list.push(chair.clone()).unwrap();
	chair.num_seats.set(3).unwrap();
	let removed = list.remove(0).unwrap();
	removed.num_seats.set(5).unwrap();

	// Assert
	assert_eq!(changes.get(), 3);
	assert_eq!(NotifyPropertyChanged::property_changed(&*removed).receiver_count(), 0);
}

#[rstest]
fn test_constant_collection_without_item_tracking_follows_membership(config: ReactorConfig) {
	let chair = Furniture::chair();
	let list = Shared::new(FurnitureList::from_vec(vec![chair.clone()]));
	let (_subscription, changes) = count_changes(config, Expr::collection(list.rc()));

	chair.num_seats.set(3).unwrap();
	list.push(Furniture::sofa()).unwrap();
	list.clear().unwrap();

	assert_eq!(changes.get(), 2);
}

#[rstest]
fn test_count_hop_reports_count_and_membership_changes(config: ReactorConfig) {
	// Arrange
	let room = Room::new(&config).unwrap();
	let furniture = room.furniture.get();
	furniture.push(Furniture::chair()).unwrap();
	let count_expr =
		Room::furniture_expr(&room).property_with("Count", |list: &FurnitureList| Value::plain(list.len()));
	let (_subscription, changes) = count_changes(config, count_expr);

	// Act
	furniture.push(Furniture::sofa()).unwrap();
	let after_push = changes.get();
	furniture.replace(0, Furniture::table()).unwrap();

	// Assert
	// a length change notifies through the Count hop and again through the collection itself
	assert_eq!(after_push, 2);
	assert_eq!(changes.get(), 3);
}

#[rstest]
fn test_item_listed_twice_notifies_once(config: ReactorConfig) {
	let chair = Furniture::chair();
	let list = Shared::new(FurnitureList::from_vec(vec![chair.clone(), chair.clone()]));
	let (_subscription, changes) = count_changes(config, Expr::collection(list.rc()).track_items());

	chair.num_seats.set(2).unwrap();
	list.remove(0).unwrap();
	chair.num_seats.set(3).unwrap();

	assert_eq!(changes.get(), 3);
}
