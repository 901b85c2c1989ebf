//! Room, furniture and person models built from property cells.
//!
//! Derived properties follow observable expressions bound after the owning object exists, the
//! way an application would wire a view model.

use std::rc::Rc;

use xreact_cells::{ObservableVec, PropertyValueChanged, Property, Reactor, Shared, reactive_object};
use xreact_core::{Expr, React, ReactorConfig, ReactorResult, Value};

pub type FurnitureList = ObservableVec<Shared<Furniture>>;
pub type PersonList = ObservableVec<Shared<Person>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FurnitureKind {
	Chair,
	Sofa,
	Table,
}

pub struct Furniture {
	reactor: Reactor,
	kind: FurnitureKind,
	pub num_seats: Property<i32>,
}

reactive_object!(Furniture, reactor);

impl Furniture {
	fn new(kind: FurnitureKind, num_seats: i32) -> Shared<Self> {
		let reactor = Reactor::new("Furniture");
		Shared::new(Self {
			num_seats: reactor.create("NumSeats", num_seats),
			kind,
			reactor,
		})
	}

	pub fn chair() -> Shared<Self> {
		Self::new(FurnitureKind::Chair, 1)
	}

	pub fn sofa() -> Shared<Self> {
		Self::new(FurnitureKind::Sofa, 4)
	}

	pub fn table() -> Shared<Self> {
		Self::new(FurnitureKind::Table, 0)
	}

	pub fn kind(&self) -> FurnitureKind {
		self.kind
	}

	pub fn is_sitable(&self) -> bool {
		self.kind != FurnitureKind::Table
	}
}

pub struct Person {
	reactor: Reactor,
	pub name: Property<String>,
	pub age: Property<i32>,
	pub is_kid: Property<bool>,
	pub is_teenager: Property<bool>,
	pub card_string: Property<String>,
}

reactive_object!(Person, reactor);

impl Person {
	pub fn new(config: &ReactorConfig, name: &str, age: i32) -> ReactorResult<Shared<Self>> {
		let reactor = Reactor::new("Person");
		let person = Rc::new(Self {
			name: reactor.create("Name", name.to_string()),
			age: reactor
				.create("Age", age)
				.coerce(|age: i32| age.max(0), "age cannot be negative")?,
			is_kid: reactor.create("IsKid", false),
			is_teenager: reactor.create("IsTeenager", false),
			card_string: reactor.create("CardString", String::new()),
			reactor,
		});

		person.card_string.follow(
			React::with_config(config.clone()).to(
				Expr::binary(Self::name_expr(&person), Self::age_expr(&person)),
				{
					let person = Rc::clone(&person);
					move || format!("Name: {}, Age: {}", person.name.get(), person.age.get())
				},
			)?,
		)?;
		person.is_teenager.follow(React::with_config(config.clone()).to(Self::age_expr(&person), {
			let person = Rc::clone(&person);
			move || (10..20).contains(&person.age.get())
		})?)?;

		// value stream of the age, the way a hand-written observer would use it
		person.is_kid.set(person.age.get() < 10)?;
		let is_kid = person.is_kid.clone();
		person.reactor.value_changed().connect(move |change: &PropertyValueChanged| {
			match change.new_value::<i32>() {
				Some(age) if change.name() == "Age" => is_kid.set(*age < 10),
				_ => Ok(()),
			}
		});

		Ok(Shared::from_rc(person))
	}

	pub fn name_expr(person: &Rc<Self>) -> Expr {
		Expr::object(person).property_with("Name", |person: &Person| Value::plain(person.name.get()))
	}

	pub fn age_expr(person: &Rc<Self>) -> Expr {
		Expr::object(person).property_with("Age", |person: &Person| Value::plain(person.age.get()))
	}
}

pub struct Room {
	reactor: Reactor,
	pub name: Property<String>,
	pub square_meters: Property<f64>,
	pub people_limit: Property<i32>,
	pub furniture: Property<Shared<FurnitureList>>,
	pub num_furniture: Property<usize>,
	pub largest_place_to_sit: Property<Option<Shared<Furniture>>>,
	pub smallest_place_to_sit: Property<Option<Shared<Furniture>>>,
	pub guests: Property<Shared<PersonList>>,
	pub num_guests: Property<usize>,
	pub owner: Property<Option<Shared<Person>>>,
	pub owner_age: Property<i32>,
}

reactive_object!(Room, reactor);

fn first_by<F>(furniture: &FurnitureList, better: F) -> Option<Shared<Furniture>>
where
	F: Fn(i32, i32) -> bool,
{
	furniture.with_items(|items| {
		items
			.iter()
			.filter(|item| item.is_sitable())
			.cloned()
			.reduce(|best, item| {
				if better(item.num_seats.get(), best.num_seats.get()) {
					item
				} else {
					best
				}
			})
	})
}

impl Room {
	pub fn new(config: &ReactorConfig) -> ReactorResult<Rc<Self>> {
		let reactor = Reactor::new("Room");
		let room = Rc::new(Self {
			name: reactor.create("Name", "VIP room".to_string()),
			square_meters: reactor.create("SquareMeters", 0.0),
			people_limit: reactor.create("PeopleLimit", 0),
			furniture: reactor.create("Furniture", Shared::new(FurnitureList::new())),
			num_furniture: reactor.create("NumFurniture", 0),
			largest_place_to_sit: reactor.create("LargestPlaceToSit", None),
			smallest_place_to_sit: reactor.create("SmallestPlaceToSit", None),
			guests: reactor.create("Guests", Shared::new(PersonList::new())),
			num_guests: reactor.create("NumGuests", 0),
			owner: reactor.create("Owner", None),
			owner_age: reactor.create("OwnerAge", 0),
			reactor,
		});
		let react = || React::with_config(config.clone());

		room.people_limit.follow(react().to(Self::square_meters_expr(&room), {
			let room = Rc::clone(&room);
			move || (room.square_meters.get() / 10.0) as i32
		})?)?;

		room.num_furniture.follow(react().to(
			Self::furniture_expr(&room).property_with("Count", |list: &FurnitureList| Value::plain(list.len())),
			{
				let room = Rc::clone(&room);
				move || room.furniture.get().len()
			},
		)?)?;

		room.largest_place_to_sit.follow(react().to(
			Self::furniture_expr(&room).track_items().call("max_by_seats", Vec::new()),
			{
				let room = Rc::clone(&room);
				move || first_by(&room.furniture.get(), |seats, best| seats > best)
			},
		)?)?;

		// same shape without item tracking
		room.smallest_place_to_sit.follow(react().to(
			Self::furniture_expr(&room).call("min_by_seats", Vec::new()),
			{
				let room = Rc::clone(&room);
				move || first_by(&room.furniture.get(), |seats, best| seats < best)
			},
		)?)?;

		room.num_guests.follow(react().to(
			Self::guests_expr(&room).property_with("Count", |list: &PersonList| Value::plain(list.len())),
			{
				let room = Rc::clone(&room);
				move || room.guests.get().len()
			},
		)?)?;

		room.owner_age.follow(react().to(
			Expr::conditional(
				Self::owner_expr(&room),
				Self::owner_age_expr(&room),
				Expr::constant(Value::plain(0)),
			),
			{
				let room = Rc::clone(&room);
				move || room.owner.get().map_or(0, |owner| owner.age.get())
			},
		)?)?;

		Ok(room)
	}

	pub fn square_meters_expr(room: &Rc<Self>) -> Expr {
		Expr::object(room).property_with("SquareMeters", |room: &Room| Value::plain(room.square_meters.get()))
	}

	pub fn furniture_expr(room: &Rc<Self>) -> Expr {
		Expr::object(room).property_with("Furniture", |room: &Room| room.furniture.get().collection_value())
	}

	pub fn guests_expr(room: &Rc<Self>) -> Expr {
		Expr::object(room).property_with("Guests", |room: &Room| room.guests.get().collection_value())
	}

	pub fn owner_expr(room: &Rc<Self>) -> Expr {
		Expr::object(room).property_with("Owner", |room: &Room| {
			room.owner.get().map_or(Value::Null, |owner| owner.object_value())
		})
	}

	pub fn owner_age_expr(room: &Rc<Self>) -> Expr {
		Self::owner_expr(room).property_with("Age", |owner: &Person| Value::plain(owner.age.get()))
	}

	/// Detach every derived property. The room is not updated afterwards.
	pub fn unbind_all(&self) {
		self.people_limit.unbind();
		self.num_furniture.unbind();
		self.largest_place_to_sit.unbind();
		self.smallest_place_to_sit.unbind();
		self.num_guests.unbind();
		self.owner_age.unbind();
	}
}
