/// Implement [Injectable](crate::Injectable) for a struct whose injection fields are `Option<Arc<_>>`.
///
/// Each entry names a field and its dependency, separated by commas:
///
/// * ```field: Type``` requires the concrete type, resolved by its simple name
/// * ```field: dyn Trait``` requires an implementation of the interface
/// * ```... = "name"``` resolves either form through a qualifier name instead
/// * a leading ```?``` marks the dependency as optional
///
/// ```
/// # use std::sync::Arc;
/// # use graft::injectable;
/// trait Clock: Send + Sync {}
/// struct Store;
///
/// #[derive(Default)]
/// struct Handler {
///     clock: Option<Arc<dyn Clock>>,
///     store: Option<Arc<Store>>,
///     backup: Option<Arc<Store>>,
/// }
///
/// injectable!(Handler {
///     clock: dyn Clock,
///     store: Store,
///     ?backup: Store = "backup",
/// });
/// ```
#[macro_export]
macro_rules! injectable {
    (@point $Owner:ty, $points:ident;) => {};

    (@point $Owner:ty, $points:ident; ? $field:ident : dyn $Iface:path $(= $name:literal)? $(, $($rest:tt)*)?) => {
        $points.push(
            $crate::InjectionPoint::interface::<$Owner, dyn $Iface>(stringify!($field), |owner, value| {
                owner.$field = Some(value)
            })
            $(.named($name))?
            .optional(),
        );
        $crate::injectable!(@point $Owner, $points; $($($rest)*)?);
    };

    (@point $Owner:ty, $points:ident; ? $field:ident : $Dep:ty $(= $name:literal)? $(, $($rest:tt)*)?) => {
        $points.push(
            $crate::InjectionPoint::concrete::<$Owner, $Dep>(stringify!($field), |owner, value| {
                owner.$field = Some(value)
            })
            $(.named($name))?
            .optional(),
        );
        $crate::injectable!(@point $Owner, $points; $($($rest)*)?);
    };

    (@point $Owner:ty, $points:ident; $field:ident : dyn $Iface:path $(= $name:literal)? $(, $($rest:tt)*)?) => {
        $points.push(
            $crate::InjectionPoint::interface::<$Owner, dyn $Iface>(stringify!($field), |owner, value| {
                owner.$field = Some(value)
            })
            $(.named($name))?,
        );
        $crate::injectable!(@point $Owner, $points; $($($rest)*)?);
    };

    (@point $Owner:ty, $points:ident; $field:ident : $Dep:ty $(= $name:literal)? $(, $($rest:tt)*)?) => {
        $points.push(
            $crate::InjectionPoint::concrete::<$Owner, $Dep>(stringify!($field), |owner, value| {
                owner.$field = Some(value)
            })
            $(.named($name))?,
        );
        $crate::injectable!(@point $Owner, $points; $($($rest)*)?);
    };

    ($Owner:ty { $($fields:tt)* }) => {
        impl $crate::Injectable for $Owner {
            fn injection_points() -> ::std::vec::Vec<$crate::InjectionPoint> {
                #[allow(unused_mut)]
                let mut points = ::std::vec::Vec::new();
                $crate::injectable!(@point $Owner, points; $($fields)*);
                points
            }
        }
    };
}
