//! Recovering the concrete type of an [`AnyArray`].
//!
//! Code that is generic over [`Backend`] is written as a worker: a value implementing
//! [`Worker`] (one shared array), [`WorkerMut`] (one mutable array), [`Worker2`] (a source
//! and a mutable destination) or [`Worker3`] (two sources and a mutable destination). A
//! [`DispatchList`] names the concrete array types a call site is prepared to handle; each
//! candidate is compared with the run time type of the array in order, and the worker runs
//! monomorphized for the first match.
//!
//! When no candidate matches, the worker is handed back in `Err` so the caller can fall back
//! to the object safe [`DataArray`](crate::DataArray) interface.
//!
//! ```
//! use vtk_array::dispatch::{AllArrays, Reals};
//! use vtk_array::{AnyArray, Backend, DispatchList, GenericArray, Layout, ScalarType, Scalar, Worker};
//!
//! struct Sum;
//!
//! impl Worker for Sum {
//!     type Output = f64;
//!
//!     fn execute<B: Backend>(self, array: &GenericArray<B>) -> f64 {
//!         array.values().map(Scalar::as_f64).sum()
//!     }
//! }
//!
//! let mut array = AnyArray::new(Layout::Soa, ScalarType::UInt16);
//! array.as_data_array_mut().insert_next_tuple_f64(&[3.0]).unwrap();
//! array.as_data_array_mut().insert_next_tuple_f64(&[4.0]).unwrap();
//!
//! assert_eq!(AllArrays::dispatch(&array, Sum).ok(), Some(7.0));
//! // not a floating point array
//! assert!(Reals::dispatch(&array, Sum).is_err());
//! ```

mod any;
mod list;

pub use any::{AnyArray, Member};
pub use list::{
    AllArrays, AosArrays, DispatchList, Integrals, Reals, ScaledSoaArrays, SoaArrays,
};

use crate::prelude::*;

use std::marker::PhantomData;

/// A computation over one array of any concrete type.
pub trait Worker {
    type Output;

    fn execute<B: Backend>(self, array: &GenericArray<B>) -> Self::Output;
}

/// A computation that modifies one array of any concrete type.
pub trait WorkerMut {
    type Output;

    fn execute<B: Backend>(self, array: &mut GenericArray<B>) -> Self::Output;
}

/// A computation reading `source` and writing `dest`, each of any concrete type.
pub trait Worker2 {
    type Output;

    fn execute<A: Backend, B: Backend>(
        self,
        source: &GenericArray<A>,
        dest: &mut GenericArray<B>,
    ) -> Self::Output;
}

/// A computation reading two arrays and writing a third.
pub trait Worker3 {
    type Output;

    fn execute<A: Backend, B: Backend, C: Backend>(
        self,
        first: &GenericArray<A>,
        second: &GenericArray<B>,
        dest: &mut GenericArray<C>,
    ) -> Self::Output;
}

/// Dispatch `source` against `L1` and `dest` against `L2`, then run `worker` on both.
///
/// The worker only runs once both arrays matched; otherwise it is returned in `Err`.
pub fn dispatch2<L1, L2, W>(source: &AnyArray, dest: &mut AnyArray, worker: W) -> Result<W::Output, W>
where
    L1: DispatchList,
    L2: DispatchList,
    W: Worker2,
{
    let outer = SourceOf2::<L2, W> {
        dest,
        worker,
        _list: PhantomData,
    };

    match L1::dispatch(source, outer) {
        Ok(result) => result,
        Err(outer) => {
            tracing::debug!(
                layout = %source.layout(),
                scalar_type = %source.scalar_type(),
                "source array not in the dispatch list"
            );
            Err(outer.worker)
        }
    }
}

/// Dispatch three arrays against their own lists, then run `worker` on all of them.
///
/// The worker only runs once every array matched; otherwise it is returned in `Err`.
pub fn dispatch3<L1, L2, L3, W>(
    first: &AnyArray,
    second: &AnyArray,
    dest: &mut AnyArray,
    worker: W,
) -> Result<W::Output, W>
where
    L1: DispatchList,
    L2: DispatchList,
    L3: DispatchList,
    W: Worker3,
{
    let outer = FirstOf3::<L2, L3, W> {
        second,
        dest,
        worker,
        _lists: PhantomData,
    };

    match L1::dispatch(first, outer) {
        Ok(result) => result,
        Err(outer) => {
            tracing::debug!(
                layout = %first.layout(),
                scalar_type = %first.scalar_type(),
                "first array not in the dispatch list"
            );
            Err(outer.worker)
        }
    }
}

// dispatch2: source resolved, now resolve the destination
struct SourceOf2<'d, L2, W> {
    dest: &'d mut AnyArray,
    worker: W,
    _list: PhantomData<L2>,
}

impl<'d, L2: DispatchList, W: Worker2> Worker for SourceOf2<'d, L2, W> {
    type Output = Result<W::Output, W>;

    fn execute<A: Backend>(self, source: &GenericArray<A>) -> Self::Output {
        let inner = DestOf2 {
            source,
            worker: self.worker,
        };
        L2::dispatch_mut(self.dest, inner).map_err(|inner| inner.worker)
    }
}

struct DestOf2<'s, A: Backend, W> {
    source: &'s GenericArray<A>,
    worker: W,
}

impl<'s, A: Backend, W: Worker2> WorkerMut for DestOf2<'s, A, W> {
    type Output = W::Output;

    fn execute<B: Backend>(self, dest: &mut GenericArray<B>) -> W::Output {
        self.worker.execute(self.source, dest)
    }
}

// dispatch3: one level per array
struct FirstOf3<'a, L2, L3, W> {
    second: &'a AnyArray,
    dest: &'a mut AnyArray,
    worker: W,
    _lists: PhantomData<(L2, L3)>,
}

impl<'a, L2: DispatchList, L3: DispatchList, W: Worker3> Worker for FirstOf3<'a, L2, L3, W> {
    type Output = Result<W::Output, W>;

    fn execute<A: Backend>(self, first: &GenericArray<A>) -> Self::Output {
        let inner = SecondOf3::<A, L3, W> {
            first,
            dest: self.dest,
            worker: self.worker,
            _list: PhantomData,
        };

        match L2::dispatch(self.second, inner) {
            Ok(result) => result,
            Err(inner) => Err(inner.worker),
        }
    }
}

struct SecondOf3<'a, 'd, A: Backend, L3, W> {
    first: &'a GenericArray<A>,
    dest: &'d mut AnyArray,
    worker: W,
    _list: PhantomData<L3>,
}

impl<'a, 'd, A: Backend, L3: DispatchList, W: Worker3> Worker for SecondOf3<'a, 'd, A, L3, W> {
    type Output = Result<W::Output, W>;

    fn execute<B: Backend>(self, second: &GenericArray<B>) -> Self::Output {
        let inner = DestOf3 {
            first: self.first,
            second,
            worker: self.worker,
        };
        L3::dispatch_mut(self.dest, inner).map_err(|inner| inner.worker)
    }
}

struct DestOf3<'a, 'b, A: Backend, B: Backend, W> {
    first: &'a GenericArray<A>,
    second: &'b GenericArray<B>,
    worker: W,
}

impl<'a, 'b, A: Backend, B: Backend, W: Worker3> WorkerMut for DestOf3<'a, 'b, A, B, W> {
    type Output = W::Output;

    fn execute<C: Backend>(self, dest: &mut GenericArray<C>) -> W::Output {
        self.worker.execute(self.first, self.second, dest)
    }
}
