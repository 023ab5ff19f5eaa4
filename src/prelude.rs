//! Common traits and types that are useful for working with `vtk_array`
#![allow(unused_imports)]

pub use crate::array::{
    AosArray, CopyPolicy, GenericArray, Ghosts, RangeComponent, ScaledSoaArray, SoaArray,
};
pub use crate::dispatch::{AnyArray, DispatchList, Member, Worker, Worker2, Worker3, WorkerMut};
pub use crate::traits::{Backend, DataArray, Layout, Scalar, ScalarType};

pub(crate) use crate::buffer::Buffer;
pub(crate) use crate::Error;

pub(crate) use derive_more::{Constructor, Display, From};
pub(crate) use num_traits::{One, Zero};

pub(crate) use std::io::{BufRead, Write};
