//! Room model integration tests
//!
//! Derived properties of a room and its owner, wired through observable expressions.

use rstest::*;
use xreact::{ExceptionHandlingPolicy, ReactorConfig};
use xreact_integration_tests::isolated;
use xreact_integration_tests::models::{Person, Room};

#[fixture]
fn config() -> ReactorConfig {
	isolated(ExceptionHandlingPolicy::FailFast)
}

#[rstest]
fn test_people_limit_follows_square_meters(config: ReactorConfig) {
	// Arrange
	let room = Room::new(&config).unwrap();
	assert_eq!(room.people_limit.get(), 0);

	// Act
	room.square_meters.set(100.0).unwrap();
	let after_resize = room.people_limit.get();
	room.square_meters.set(55.5).unwrap();

	// Assert
	assert_eq!(after_resize, 10);
	assert_eq!(room.people_limit.get(), 5);
}

#[rstest]
fn test_owner_age_follows_owner_and_age(config: ReactorConfig) {
	let room = Room::new(&config).unwrap();
	let ann = Person::new(&config, "Ann", 30).unwrap();
	let bob = Person::new(&config, "Bob", 45).unwrap();

	assert_eq!(room.owner_age.get(), 0);

	room.owner.set(Some(ann.clone())).unwrap();
	assert_eq!(room.owner_age.get(), 30);

	ann.age.set(31).unwrap();
	assert_eq!(room.owner_age.get(), 31);

	room.owner.set(Some(bob.clone())).unwrap();
	assert_eq!(room.owner_age.get(), 45);

	// the previous owner is no longer followed
	ann.age.set(80).unwrap();
	assert_eq!(room.owner_age.get(), 45);

	room.owner.set(None).unwrap();
	assert_eq!(room.owner_age.get(), 0);
}

#[rstest]
fn test_owner_age_ignores_unrelated_owner_properties(config: ReactorConfig) {
	let room = Room::new(&config).unwrap();
	let ann = Person::new(&config, "Ann", 30).unwrap();
	room.owner.set(Some(ann.clone())).unwrap();
	let changes = std::rc::Rc::new(std::cell::Cell::new(0));
	let counter = changes.clone();
	room.owner_age.on_change(move |_: &i32| counter.set(counter.get() + 1));

	ann.name.set("Annie".to_string()).unwrap();
	ann.age.set(32).unwrap();

	assert_eq!(changes.get(), 1);
}

#[rstest]
fn test_person_derived_properties(config: ReactorConfig) {
	let person = Person::new(&config, "Ann", 8).unwrap();

	assert!(person.is_kid.get());
	assert!(!person.is_teenager.get());
	assert_eq!(person.card_string.get(), "Name: Ann, Age: 8");

	person.age.set(15).unwrap();

	assert!(!person.is_kid.get());
	assert!(person.is_teenager.get());
	assert_eq!(person.card_string.get(), "Name: Ann, Age: 15");

	person.name.set("Anna".to_string()).unwrap();

	assert_eq!(person.card_string.get(), "Name: Anna, Age: 15");
}

#[rstest]
fn test_negative_age_is_coerced(config: ReactorConfig) {
	let person = Person::new(&config, "Ann", -3).unwrap();
	assert_eq!(person.age.get(), 0);

	person.age.set(20).unwrap();
	person.age.set(-1).unwrap();

	assert_eq!(person.age.get(), 0);
	assert!(person.is_kid.get());
	assert_eq!(person.card_string.get(), "Name: Ann, Age: 0");
}

#[rstest]
fn test_num_guests_counts_guests(config: ReactorConfig) {
	let room = Room::new(&config).unwrap();
	let guests = room.guests.get();

	guests.push(Person::new(&config, "Ann", 30).unwrap()).unwrap();
	guests.push(Person::new(&config, "Bob", 40).unwrap()).unwrap();
	assert_eq!(room.num_guests.get(), 2);

	guests.remove(0).unwrap();
	assert_eq!(room.num_guests.get(), 1);
}

#[rstest]
fn test_unbound_room_stops_updating(config: ReactorConfig) {
	let room = Room::new(&config).unwrap();
	room.square_meters.set(30.0).unwrap();

	room.unbind_all();
	room.square_meters.set(90.0).unwrap();

	assert_eq!(room.people_limit.get(), 3);
	assert!(!room.people_limit.is_bound());
}
