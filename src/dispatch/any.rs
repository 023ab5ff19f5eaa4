use super::list::AllArrays;
use super::{dispatch2, Worker2};
use crate::array::{AosArray, GenericArray, ScaledSoaArray, SoaArray};
use crate::prelude::*;

use std::any::Any;

/// A concrete array type that can be stored in an [`AnyArray`].
pub trait Member: Sized {
    fn extract(array: &AnyArray) -> Option<&Self>;

    fn extract_mut(array: &mut AnyArray) -> Option<&mut Self>;

    fn wrap(self) -> AnyArray;
}

macro_rules! any_array {
    ($($variant:ident => $array:ident<$t:ident>, $layout:ident, $tag:ident;)*) => {
        /// An array whose layout and scalar type are only known at run time.
        ///
        /// Holds one of the 30 concrete arrays. Use a [`DispatchList`] to run generic code on
        /// it, or [`AnyArray::as_data_array`] for the `f64` based slow path.
        #[derive(Debug, From)]
        pub enum AnyArray {
            $($variant($array<$t>),)*
        }

        $(
            impl Member for $array<$t> {
                #[inline]
                fn extract(array: &AnyArray) -> Option<&Self> {
                    match array {
                        AnyArray::$variant(array) => Some(array),
                        _ => None,
                    }
                }

                #[inline]
                fn extract_mut(array: &mut AnyArray) -> Option<&mut Self> {
                    match array {
                        AnyArray::$variant(array) => Some(array),
                        _ => None,
                    }
                }

                fn wrap(self) -> AnyArray {
                    AnyArray::$variant(self)
                }
            }
        )*

        impl AnyArray {
            /// an empty array with one component
            pub fn new(layout: Layout, scalar_type: ScalarType) -> Self {
                match (layout, scalar_type) {
                    $((Layout::$layout, ScalarType::$tag) => Self::$variant($array::<$t>::new()),)*
                }
            }

            pub fn as_data_array(&self) -> &dyn DataArray {
                match self {
                    $(Self::$variant(array) => array,)*
                }
            }

            pub fn as_data_array_mut(&mut self) -> &mut dyn DataArray {
                match self {
                    $(Self::$variant(array) => array,)*
                }
            }

            /// An array sharing the buffers of this one, see
            /// [`GenericArray::shallow_copy`].
            pub fn shallow_copy(&self) -> Self {
                match self {
                    $(Self::$variant(array) => Self::$variant(array.shallow_copy()),)*
                }
            }

            pub fn try_clone(&self) -> Result<Self, Error> {
                Ok(match self {
                    $(Self::$variant(array) => Self::$variant(array.try_clone()?),)*
                })
            }

            pub fn set_name<N: Into<String>>(&mut self, name: N) {
                match self {
                    $(Self::$variant(array) => array.set_name(name),)*
                }
            }
        }
    };
}

any_array! {
    AosInt8 => AosArray<i8>, Aos, Int8;
    AosUInt8 => AosArray<u8>, Aos, UInt8;
    AosInt16 => AosArray<i16>, Aos, Int16;
    AosUInt16 => AosArray<u16>, Aos, UInt16;
    AosInt32 => AosArray<i32>, Aos, Int32;
    AosUInt32 => AosArray<u32>, Aos, UInt32;
    AosInt64 => AosArray<i64>, Aos, Int64;
    AosUInt64 => AosArray<u64>, Aos, UInt64;
    AosFloat32 => AosArray<f32>, Aos, Float32;
    AosFloat64 => AosArray<f64>, Aos, Float64;
    SoaInt8 => SoaArray<i8>, Soa, Int8;
    SoaUInt8 => SoaArray<u8>, Soa, UInt8;
    SoaInt16 => SoaArray<i16>, Soa, Int16;
    SoaUInt16 => SoaArray<u16>, Soa, UInt16;
    SoaInt32 => SoaArray<i32>, Soa, Int32;
    SoaUInt32 => SoaArray<u32>, Soa, UInt32;
    SoaInt64 => SoaArray<i64>, Soa, Int64;
    SoaUInt64 => SoaArray<u64>, Soa, UInt64;
    SoaFloat32 => SoaArray<f32>, Soa, Float32;
    SoaFloat64 => SoaArray<f64>, Soa, Float64;
    ScaledSoaInt8 => ScaledSoaArray<i8>, ScaledSoa, Int8;
    ScaledSoaUInt8 => ScaledSoaArray<u8>, ScaledSoa, UInt8;
    ScaledSoaInt16 => ScaledSoaArray<i16>, ScaledSoa, Int16;
    ScaledSoaUInt16 => ScaledSoaArray<u16>, ScaledSoa, UInt16;
    ScaledSoaInt32 => ScaledSoaArray<i32>, ScaledSoa, Int32;
    ScaledSoaUInt32 => ScaledSoaArray<u32>, ScaledSoa, UInt32;
    ScaledSoaInt64 => ScaledSoaArray<i64>, ScaledSoa, Int64;
    ScaledSoaUInt64 => ScaledSoaArray<u64>, ScaledSoa, UInt64;
    ScaledSoaFloat32 => ScaledSoaArray<f32>, ScaledSoa, Float32;
    ScaledSoaFloat64 => ScaledSoaArray<f64>, ScaledSoa, Float64;
}

impl AnyArray {
    /// an empty array with `components` components
    pub fn with_components(
        layout: Layout,
        scalar_type: ScalarType,
        components: usize,
    ) -> Result<Self, Error> {
        let mut array = Self::new(layout, scalar_type);
        array.as_data_array_mut().set_number_of_components(components)?;
        Ok(array)
    }

    pub fn layout(&self) -> Layout {
        self.as_data_array().layout()
    }

    pub fn scalar_type(&self) -> ScalarType {
        self.as_data_array().scalar_type()
    }

    pub fn name(&self) -> &str {
        self.as_data_array().name()
    }

    pub fn downcast_ref<A: Member>(&self) -> Option<&A> {
        A::extract(self)
    }

    pub fn downcast_mut<A: Member>(&mut self) -> Option<&mut A> {
        A::extract_mut(self)
    }

    /// Replace the contents with a copy of `source`, converting values when the scalar types
    /// differ. The layout of `self` is kept.
    pub fn deep_copy(&mut self, source: &AnyArray) -> Result<(), Error> {
        self.deep_copy_with(source, &CopyPolicy::default())
    }

    pub fn deep_copy_with(&mut self, source: &AnyArray, policy: &CopyPolicy) -> Result<(), Error> {
        dispatch2::<AllArrays, AllArrays, _>(source, self, DeepCopy { policy })
            .unwrap_or_else(|_| {
                Err(Error::NotDispatched {
                    layout: source.layout(),
                    scalar_type: source.scalar_type(),
                })
            })
    }
}

struct DeepCopy<'p> {
    policy: &'p CopyPolicy,
}

impl<'p> Worker2 for DeepCopy<'p> {
    type Output = Result<(), Error>;

    fn execute<A: Backend, B: Backend>(
        self,
        source: &GenericArray<A>,
        dest: &mut GenericArray<B>,
    ) -> Self::Output {
        dest.deep_copy_with(source, self.policy)
    }
}

impl DataArray for AnyArray {
    fn layout(&self) -> Layout {
        AnyArray::layout(self)
    }

    fn scalar_type(&self) -> ScalarType {
        AnyArray::scalar_type(self)
    }

    fn name(&self) -> &str {
        AnyArray::name(self)
    }

    fn number_of_components(&self) -> usize {
        self.as_data_array().number_of_components()
    }

    fn number_of_tuples(&self) -> usize {
        self.as_data_array().number_of_tuples()
    }

    fn number_of_values(&self) -> usize {
        self.as_data_array().number_of_values()
    }

    fn component_f64(&self, tuple_idx: usize, component: usize) -> f64 {
        self.as_data_array().component_f64(tuple_idx, component)
    }

    fn set_component_f64(&mut self, tuple_idx: usize, component: usize, value: f64) {
        self.as_data_array_mut()
            .set_component_f64(tuple_idx, component, value)
    }

    fn value_f64(&self, value_idx: usize) -> f64 {
        self.as_data_array().value_f64(value_idx)
    }

    fn set_value_f64(&mut self, value_idx: usize, value: f64) {
        self.as_data_array_mut().set_value_f64(value_idx, value)
    }

    fn tuple_f64(&self, tuple_idx: usize, tuple: &mut [f64]) {
        self.as_data_array().tuple_f64(tuple_idx, tuple)
    }

    fn set_tuple_f64(&mut self, tuple_idx: usize, tuple: &[f64]) {
        self.as_data_array_mut().set_tuple_f64(tuple_idx, tuple)
    }

    fn insert_next_tuple_f64(&mut self, tuple: &[f64]) -> Result<usize, Error> {
        self.as_data_array_mut().insert_next_tuple_f64(tuple)
    }

    fn set_number_of_components(&mut self, components: usize) -> Result<(), Error> {
        self.as_data_array_mut().set_number_of_components(components)
    }

    fn set_number_of_tuples(&mut self, tuples: usize) -> Result<(), Error> {
        self.as_data_array_mut().set_number_of_tuples(tuples)
    }

    fn fill_component_f64(&mut self, component: usize, value: f64) -> Result<(), Error> {
        self.as_data_array_mut().fill_component_f64(component, value)
    }

    fn range(&self, which: RangeComponent) -> Option<[f64; 2]> {
        self.as_data_array().range(which)
    }

    fn finite_range(&self, which: RangeComponent) -> Option<[f64; 2]> {
        self.as_data_array().finite_range(which)
    }

    fn actual_memory_size(&self) -> usize {
        self.as_data_array().actual_memory_size()
    }

    /// the concrete array, so `downcast_ref::<AosArray<f32>>()` works on the result
    fn as_any(&self) -> &dyn Any {
        self.as_data_array().as_any()
    }
}
