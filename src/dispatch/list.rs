use super::{AnyArray, Member, Worker, WorkerMut};
use crate::array::{AosArray, GenericArray, ScaledSoaArray, SoaArray};
use crate::prelude::*;

/// A statically known, ordered set of concrete array types.
///
/// Implemented by every concrete array type (a list of one), by tuples of lists, and by the
/// named lists declared with [`dispatch_list!`](crate::dispatch_list).
pub trait DispatchList {
    /// Run `worker` on `array` if its concrete type is in the list, otherwise hand it back.
    fn dispatch<W: Worker>(array: &AnyArray, worker: W) -> Result<W::Output, W>;

    fn dispatch_mut<W: WorkerMut>(array: &mut AnyArray, worker: W) -> Result<W::Output, W>;

    /// `true` if dispatching `array` against the list would succeed
    fn contains(array: &AnyArray) -> bool;
}

impl<B: Backend> DispatchList for GenericArray<B>
where
    GenericArray<B>: Member,
{
    #[inline]
    fn dispatch<W: Worker>(array: &AnyArray, worker: W) -> Result<W::Output, W> {
        match Self::extract(array) {
            Some(array) => Ok(worker.execute(array)),
            None => Err(worker),
        }
    }

    #[inline]
    fn dispatch_mut<W: WorkerMut>(array: &mut AnyArray, worker: W) -> Result<W::Output, W> {
        match Self::extract_mut(array) {
            Some(array) => Ok(worker.execute(array)),
            None => Err(worker),
        }
    }

    fn contains(array: &AnyArray) -> bool {
        Self::extract(array).is_some()
    }
}

/// the empty list never matches
impl DispatchList for () {
    fn dispatch<W: Worker>(_array: &AnyArray, worker: W) -> Result<W::Output, W> {
        Err(worker)
    }

    fn dispatch_mut<W: WorkerMut>(_array: &mut AnyArray, worker: W) -> Result<W::Output, W> {
        Err(worker)
    }

    fn contains(_array: &AnyArray) -> bool {
        false
    }
}

macro_rules! tuple_list {
    ($last:ident) => {
        impl<$last: DispatchList> DispatchList for ($last,) {
            fn dispatch<W: Worker>(array: &AnyArray, worker: W) -> Result<W::Output, W> {
                $last::dispatch(array, worker)
            }

            fn dispatch_mut<W: WorkerMut>(array: &mut AnyArray, worker: W) -> Result<W::Output, W> {
                $last::dispatch_mut(array, worker)
            }

            fn contains(array: &AnyArray) -> bool {
                $last::contains(array)
            }
        }
    };
    ($head:ident, $($tail:ident),+) => {
        impl<$head: DispatchList, $($tail: DispatchList),+> DispatchList for ($head, $($tail),+) {
            fn dispatch<W: Worker>(array: &AnyArray, worker: W) -> Result<W::Output, W> {
                match $head::dispatch(array, worker) {
                    Ok(output) => Ok(output),
                    Err(worker) => <($($tail,)+)>::dispatch(array, worker),
                }
            }

            fn dispatch_mut<W: WorkerMut>(array: &mut AnyArray, worker: W) -> Result<W::Output, W> {
                match $head::dispatch_mut(array, worker) {
                    Ok(output) => Ok(output),
                    Err(worker) => <($($tail,)+)>::dispatch_mut(array, worker),
                }
            }

            fn contains(array: &AnyArray) -> bool {
                $head::contains(array) || <($($tail,)+)>::contains(array)
            }
        }

        tuple_list!($($tail),+);
    };
}

tuple_list!(L0, L1, L2, L3, L4, L5, L6, L7, L8, L9);

/// Declare a named [`DispatchList`] over concrete array types or other lists.
///
/// ```
/// use vtk_array::{dispatch_list, AosArray, SoaArray};
///
/// dispatch_list! {
///     /// the arrays a solver writes
///     pub SolverOutput = [AosArray<f64>, SoaArray<f64>, AosArray<i32>]
/// }
/// ```
#[macro_export]
macro_rules! dispatch_list {
    ($(#[$meta:meta])* $vis:vis $name:ident = [$($candidate:ty),* $(,)?]) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy)]
        $vis struct $name;

        impl $crate::DispatchList for $name {
            fn dispatch<W: $crate::Worker>(
                array: &$crate::AnyArray,
                worker: W,
            ) -> ::std::result::Result<W::Output, W> {
                $(
                    let worker = match <$candidate as $crate::DispatchList>::dispatch(array, worker) {
                        ::std::result::Result::Ok(output) => return ::std::result::Result::Ok(output),
                        ::std::result::Result::Err(worker) => worker,
                    };
                )*
                let _ = array;
                ::std::result::Result::Err(worker)
            }

            fn dispatch_mut<W: $crate::WorkerMut>(
                array: &mut $crate::AnyArray,
                worker: W,
            ) -> ::std::result::Result<W::Output, W> {
                $(
                    let worker = match <$candidate as $crate::DispatchList>::dispatch_mut(array, worker) {
                        ::std::result::Result::Ok(output) => return ::std::result::Result::Ok(output),
                        ::std::result::Result::Err(worker) => worker,
                    };
                )*
                let _ = array;
                ::std::result::Result::Err(worker)
            }

            fn contains(array: &$crate::AnyArray) -> bool {
                false $(|| <$candidate as $crate::DispatchList>::contains(array))*
            }
        }
    };
}

dispatch_list! {
    /// every array-of-structs array
    pub AosArrays = [
        AosArray<i8>, AosArray<u8>, AosArray<i16>, AosArray<u16>, AosArray<i32>,
        AosArray<u32>, AosArray<i64>, AosArray<u64>, AosArray<f32>, AosArray<f64>,
    ]
}

dispatch_list! {
    /// every struct-of-arrays array
    pub SoaArrays = [
        SoaArray<i8>, SoaArray<u8>, SoaArray<i16>, SoaArray<u16>, SoaArray<i32>,
        SoaArray<u32>, SoaArray<i64>, SoaArray<u64>, SoaArray<f32>, SoaArray<f64>,
    ]
}

dispatch_list! {
    /// every scaled struct-of-arrays array
    pub ScaledSoaArrays = [
        ScaledSoaArray<i8>, ScaledSoaArray<u8>, ScaledSoaArray<i16>, ScaledSoaArray<u16>,
        ScaledSoaArray<i32>, ScaledSoaArray<u32>, ScaledSoaArray<i64>, ScaledSoaArray<u64>,
        ScaledSoaArray<f32>, ScaledSoaArray<f64>,
    ]
}

dispatch_list! {
    /// every array an [`AnyArray`] can hold
    pub AllArrays = [AosArrays, SoaArrays, ScaledSoaArrays]
}

dispatch_list! {
    /// floating point arrays of every layout
    pub Reals = [
        AosArray<f32>, AosArray<f64>, SoaArray<f32>, SoaArray<f64>,
        ScaledSoaArray<f32>, ScaledSoaArray<f64>,
    ]
}

dispatch_list! {
    /// integral arrays of every layout
    pub Integrals = [
        AosArray<i8>, AosArray<u8>, AosArray<i16>, AosArray<u16>,
        AosArray<i32>, AosArray<u32>, AosArray<i64>, AosArray<u64>,
        SoaArray<i8>, SoaArray<u8>, SoaArray<i16>, SoaArray<u16>,
        SoaArray<i32>, SoaArray<u32>, SoaArray<i64>, SoaArray<u64>,
        ScaledSoaArray<i8>, ScaledSoaArray<u8>, ScaledSoaArray<i16>, ScaledSoaArray<u16>,
        ScaledSoaArray<i32>, ScaledSoaArray<u32>, ScaledSoaArray<i64>, ScaledSoaArray<u64>,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Which;

    impl Worker for Which {
        type Output = (Layout, ScalarType);

        fn execute<B: Backend>(self, array: &GenericArray<B>) -> Self::Output {
            (B::LAYOUT, array.scalar_type())
        }
    }

    #[test]
    fn tuple_lists_search_in_order() {
        let array = AnyArray::new(Layout::Soa, ScalarType::Int16);

        type Pair = (AosArray<i16>, SoaArray<i16>);
        assert!(Pair::contains(&array));
        assert_eq!(
            Pair::dispatch(&array, Which).ok(),
            Some((Layout::Soa, ScalarType::Int16))
        );

        assert!(!<(AosArray<i16>,)>::contains(&array));
        assert!(<()>::dispatch(&array, Which).is_err());
    }

    #[test]
    fn predefined_lists_partition_every_array() {
        for layout in [Layout::Aos, Layout::Soa, Layout::ScaledSoa] {
            for ty in ScalarType::ALL {
                let array = AnyArray::new(layout, ty);
                assert!(AllArrays::contains(&array));
                assert_ne!(Reals::contains(&array), Integrals::contains(&array));

                let by_layout = [
                    AosArrays::contains(&array),
                    SoaArrays::contains(&array),
                    ScaledSoaArrays::contains(&array),
                ];
                assert_eq!(by_layout.iter().filter(|hit| **hit).count(), 1);
            }
        }
    }
}
