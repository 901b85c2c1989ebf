//! Notification plumbing for structs built from property cells.

/// Implement [`NotifyPropertyChanged`](xreact_core::NotifyPropertyChanged) and
/// [`RaisePropertyChanged`](xreact_core::RaisePropertyChanged) for a struct by delegating to its
/// [`Reactor`](crate::Reactor) field.
///
/// ```ignore
/// struct Person {
/// 	reactor: Reactor,
/// 	age: Property<u32>,
/// }
///
/// reactive_object!(Person, reactor);
/// ```
#[macro_export]
macro_rules! reactive_object {
	($ty:ty, $reactor:ident) => {
		impl $crate::__private::NotifyPropertyChanged for $ty {
			fn property_changed(
				&self,
			) -> &$crate::__private::Event<$crate::__private::PropertyChangedArgs> {
				self.$reactor.property_changed()
			}

			fn object_id(&self) -> $crate::__private::ObjectId {
				self.$reactor.id()
			}

			fn as_any(&self) -> &dyn ::core::any::Any {
				self
			}

			fn as_raise_property_changed(
				&self,
			) -> ::core::option::Option<&dyn $crate::__private::RaisePropertyChanged> {
				::core::option::Option::Some(self)
			}
		}

		impl $crate::__private::RaisePropertyChanged for $ty {
			fn raise_property_changed(
				&self,
				property_name: ::core::option::Option<&str>,
			) -> $crate::__private::ReactorResult<()> {
				self.$reactor.notify(property_name)
			}
		}
	};
}
