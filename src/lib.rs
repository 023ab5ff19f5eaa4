#![doc = include_str!("../README.md")]

pub mod array;
pub mod buffer;
pub mod dispatch;
pub mod parse;
pub mod prelude;
mod traits;
mod utils;
mod write_vtk;

pub use traits::{Backend, DataArray, Layout, Scalar, ScalarType};

pub use array::{
    AosArray, AosBackend, CopyPolicy, GenericArray, Ghosts, RangeComponent, ScaledSoaArray,
    ScaledSoaBackend, SoaArray, SoaBackend,
};
pub use buffer::{AllocationError, Buffer, ReleasePolicy};
pub use dispatch::{
    dispatch2, dispatch3, AnyArray, DispatchList, Member, Worker, Worker2, Worker3, WorkerMut,
};

pub use parse::{read_inline_dataarray, read_inline_dataarray_as};
pub use parse::ParseError;
pub use write_vtk::{write_inline_dataarray, Encoding};

#[cfg(feature = "ndarray")]
pub use ndarray;

pub use quick_xml::reader::Reader;
pub use quick_xml::writer::Writer;

/// general purpose error enumeration for possible causes of failure.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("an array needs at least one component, got {0}")]
    InvalidComponents(usize),
    #[error("cannot change a {layout} array from {current} to {requested} components while tuples are allocated")]
    ComponentsLocked {
        layout: Layout,
        current: usize,
        requested: usize,
    },
    #[error("the scale of a scaled SoA array cannot be zero")]
    ZeroScale,
    #[error("{0}")]
    Allocation(#[from] AllocationError),
    #[error("{what}: expected {expected}, got {actual}")]
    ShapeMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("component {component} is out of range for an array with {components} components")]
    ComponentOutOfRange { component: usize, components: usize },
    #[error("no dispatch candidate for a {layout} array of {scalar_type}")]
    NotDispatched {
        layout: Layout,
        scalar_type: ScalarType,
    },
    #[error("An io error occured: `{0}`")]
    Io(#[from] std::io::Error),
    #[error("Could not write XML data: `{0}`")]
    XmlWrite(#[from] quick_xml::Error),
    #[error("Error while parsing a VTK xml DataArray: {0}")]
    Parse(#[from] ParseError),
}
