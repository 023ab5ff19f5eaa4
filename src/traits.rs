//! # Traits
//!
//! These are the general purpose traits the rest of the crate is written against.
//!
//! * [`Scalar`] is implemented for the ten arithmetic types an array may hold.
//! * [`Backend`] is the per-layout storage contract. It is deliberately small: a layout only
//!   has to implement eight primitives (plus allocation bookkeeping) and every other array
//!   operation in [`GenericArray`](crate::GenericArray) is written once on top of them.
//! * [`DataArray`] is the object safe, `f64` based view of an array. It is the slow path used
//!   when an array could not be dispatched to a concrete type.

use crate::array::{CopyPolicy, RangeComponent};
use crate::Error;

use num_traits::{Bounded, Num, NumCast, ToPrimitive, Zero};
use std::any::Any;
use std::fmt;
use std::str::FromStr;

/// The closed set of element types an array can store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum ScalarType {
    Int8,
    UInt8,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Float32,
    Float64,
}

impl ScalarType {
    /// every supported scalar type, in the order used by [`AnyArray`](crate::AnyArray)
    pub const ALL: [ScalarType; 10] = [
        ScalarType::Int8,
        ScalarType::UInt8,
        ScalarType::Int16,
        ScalarType::UInt16,
        ScalarType::Int32,
        ScalarType::UInt32,
        ScalarType::Int64,
        ScalarType::UInt64,
        ScalarType::Float32,
        ScalarType::Float64,
    ];

    /// name of the type as it appears in the `type` attribute of a VTK xml `DataArray`
    pub fn vtk_name(&self) -> &'static str {
        match self {
            Self::Int8 => "Int8",
            Self::UInt8 => "UInt8",
            Self::Int16 => "Int16",
            Self::UInt16 => "UInt16",
            Self::Int32 => "Int32",
            Self::UInt32 => "UInt32",
            Self::Int64 => "Int64",
            Self::UInt64 => "UInt64",
            Self::Float32 => "Float32",
            Self::Float64 => "Float64",
        }
    }

    /// inverse of [`ScalarType::vtk_name`]
    pub fn from_vtk_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|ty| ty.vtk_name() == name)
    }

    /// size of a single value in bytes
    pub fn size(&self) -> usize {
        match self {
            Self::Int8 | Self::UInt8 => 1,
            Self::Int16 | Self::UInt16 => 2,
            Self::Int32 | Self::UInt32 | Self::Float32 => 4,
            Self::Int64 | Self::UInt64 | Self::Float64 => 8,
        }
    }

    pub fn is_integral(&self) -> bool {
        !matches!(self, Self::Float32 | Self::Float64)
    }
}

/// Physical arrangement of the values of an array in memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum Layout {
    /// array-of-structs: one buffer, components of a tuple are adjacent
    #[display(fmt = "AoS")]
    Aos,
    /// struct-of-arrays: one buffer per component
    #[display(fmt = "SoA")]
    Soa,
    /// struct-of-arrays with a multiplicative scale applied on read and write
    #[display(fmt = "scaled SoA")]
    ScaledSoa,
}

/// An arithmetic type that can be stored in an array.
///
/// Conversions between scalar types follow one rule everywhere in the crate (see
/// [`Scalar::convert`]): a value is copied exactly when the destination can represent it,
/// otherwise it saturates to the destination's bounds and `NaN` becomes zero.
pub trait Scalar:
    Copy
    + Default
    + fmt::Debug
    + fmt::Display
    + PartialOrd
    + Num
    + NumCast
    + Bounded
    + ToPrimitive
    + FromStr
    + bytemuck::Pod
    + Send
    + Sync
    + 'static
{
    /// tag of this type in the closed [`ScalarType`] set
    const TYPE: ScalarType;

    /// number of bytes of a single value
    const SIZE: usize = std::mem::size_of::<Self>();

    /// `false` only for `NaN` and the infinities; integers are always finite
    fn is_finite(self) -> bool;

    fn is_nan(self) -> bool;

    /// lossy widening to `f64` (`as` semantics)
    fn as_f64(self) -> f64;

    /// `as` cast from `f64`: integers truncate toward zero and saturate, `NaN` becomes zero
    fn from_f64(value: f64) -> Self;

    /// like [`Scalar::from_f64`], but integers round half away from zero first
    fn from_f64_rounded(value: f64) -> Self;

    /// read transform of a scaled array: `stored * scale` (wrapping for integers)
    fn scale_up(self, scale: Self) -> Self;

    /// write transform of a scaled array: `value / scale`.
    ///
    /// Integers use truncating division toward zero (wrapping on `MIN / -1`). `scale` must not
    /// be zero, which [`ScaledSoaBackend`](crate::ScaledSoaBackend) guarantees.
    fn scale_down(self, scale: Self) -> Self;

    /// append the ascii representation used by the xml writer
    fn write_ascii(self, out: &mut String);

    /// convert to another scalar type, saturating values the destination cannot represent
    fn convert<U: Scalar>(self) -> U {
        match <U as NumCast>::from(self) {
            Some(value) => value,
            None if self.is_nan() => U::zero(),
            None if self < Self::zero() => U::min_value(),
            None => U::max_value(),
        }
    }
}

macro_rules! integer_scalar {
    ($($t:ty => $tag:ident),* $(,)?) => {
        $(
            impl Scalar for $t {
                const TYPE: ScalarType = ScalarType::$tag;

                #[inline]
                fn is_finite(self) -> bool {
                    true
                }

                #[inline]
                fn is_nan(self) -> bool {
                    false
                }

                #[inline]
                fn as_f64(self) -> f64 {
                    self as f64
                }

                #[inline]
                fn from_f64(value: f64) -> Self {
                    value as $t
                }

                #[inline]
                fn from_f64_rounded(value: f64) -> Self {
                    value.round() as $t
                }

                #[inline]
                fn scale_up(self, scale: Self) -> Self {
                    self.wrapping_mul(scale)
                }

                #[inline]
                fn scale_down(self, scale: Self) -> Self {
                    self.wrapping_div(scale)
                }

                fn write_ascii(self, out: &mut String) {
                    use std::fmt::Write;
                    // writing into a String cannot fail
                    let _ = write!(out, "{self}");
                }
            }
        )*
    };
}

macro_rules! float_scalar {
    ($($t:ty => $tag:ident),* $(,)?) => {
        $(
            impl Scalar for $t {
                const TYPE: ScalarType = ScalarType::$tag;

                #[inline]
                fn is_finite(self) -> bool {
                    <$t>::is_finite(self)
                }

                #[inline]
                fn is_nan(self) -> bool {
                    <$t>::is_nan(self)
                }

                #[inline]
                fn as_f64(self) -> f64 {
                    self as f64
                }

                #[inline]
                fn from_f64(value: f64) -> Self {
                    value as $t
                }

                #[inline]
                fn from_f64_rounded(value: f64) -> Self {
                    value as $t
                }

                #[inline]
                fn scale_up(self, scale: Self) -> Self {
                    self * scale
                }

                #[inline]
                fn scale_down(self, scale: Self) -> Self {
                    self / scale
                }

                fn write_ascii(self, out: &mut String) {
                    let mut buffer = ryu::Buffer::new();
                    out.push_str(buffer.format(self));
                }
            }
        )*
    };
}

integer_scalar!(
    i8 => Int8,
    u8 => UInt8,
    i16 => Int16,
    u16 => UInt16,
    i32 => Int32,
    u32 => UInt32,
    i64 => Int64,
    u64 => UInt64,
);

float_scalar!(f32 => Float32, f64 => Float64);

/// Storage contract of one memory layout.
///
/// Indices passed to the accessors are not validated here: the façade checks them with
/// `debug_assert!` and the slice indexing inside each backend panics on anything out of
/// range. `capacity` is measured in tuples; how many of those tuples hold data is tracked
/// by the façade.
pub trait Backend: Default + Send + Sync + 'static {
    type Value: Scalar;

    const LAYOUT: Layout;

    fn components(&self) -> usize;

    /// change the number of components. Layouts that keep a buffer per component refuse this
    /// once tuples are allocated.
    fn set_components(&mut self, components: usize) -> Result<(), Error>;

    /// number of tuples that can be addressed without reallocating
    fn capacity(&self) -> usize;

    /// value at a flat index using AoS numbering (`tuple * components + component`)
    fn get_value(&self, value_idx: usize) -> Self::Value;

    fn set_value(&mut self, value_idx: usize, value: Self::Value);

    /// copy the components of a tuple into `tuple`, which holds at least `components()` values
    fn get_tuple(&self, tuple_idx: usize, tuple: &mut [Self::Value]);

    fn set_tuple(&mut self, tuple_idx: usize, tuple: &[Self::Value]);

    fn get_component(&self, tuple_idx: usize, component: usize) -> Self::Value;

    fn set_component(&mut self, tuple_idx: usize, component: usize, value: Self::Value);

    /// allocate room for `tuples` tuples, discarding the current contents
    fn allocate_tuples(&mut self, tuples: usize) -> Result<(), Error>;

    /// resize to `tuples` tuples, keeping the first `min(old, new)` tuples
    fn reallocate_tuples(&mut self, tuples: usize) -> Result<(), Error>;

    /// set the first `values` values to `value`
    fn fill(&mut self, values: usize, value: Self::Value) {
        for idx in 0..values {
            self.set_value(idx, value);
        }
    }

    /// set `component` of the first `tuples` tuples to `value`
    fn fill_component(&mut self, tuples: usize, component: usize, value: Self::Value) {
        for tuple in 0..tuples {
            self.set_component(tuple, component, value);
        }
    }

    /// Copy the first `tuples` tuples of a backend of the same type into this one.
    ///
    /// Both backends have the same number of components and `self` already has the capacity.
    fn copy_from(&mut self, source: &Self, tuples: usize, _policy: &CopyPolicy) {
        let mut tuple = vec![Self::Value::zero(); source.components()];
        for idx in 0..tuples {
            source.get_tuple(idx, &mut tuple);
            self.set_tuple(idx, &tuple);
        }
    }

    /// a new backend sharing the buffers of this one copy on write
    fn shallow_copy(&self) -> Self;

    /// A new backend writing in place into the buffers of this one.
    ///
    /// # Safety
    ///
    /// Same contract as [`Buffer::alias`](crate::Buffer::alias), for every buffer.
    unsafe fn alias(&mut self) -> Self;

    /// changes whenever an aliased buffer is written through any of its handles
    fn generation(&self) -> u64;

    /// the factor applied to stored values, for scaled layouts
    fn scale_factor(&self) -> Option<f64> {
        None
    }

    /// take over the scale of another scaled backend; ignored by unscaled layouts
    fn adopt_scale(&mut self, _scale: f64) {}

    /// drop every buffer, leaving zero capacity
    fn release(&mut self);

    /// bytes of value storage currently held
    fn memory_size(&self) -> usize;
}

/// Object safe, `f64` based interface shared by every array.
///
/// Nothing here is generic, so it can be used through `&dyn DataArray` when the concrete
/// array type is unknown. Every call goes through a virtual call and a conversion to or from
/// `f64`; performance sensitive code should [`dispatch`](crate::dispatch) instead.
pub trait DataArray: Send + Sync {
    fn layout(&self) -> Layout;

    fn scalar_type(&self) -> ScalarType;

    fn name(&self) -> &str;

    fn number_of_components(&self) -> usize;

    fn number_of_tuples(&self) -> usize;

    fn number_of_values(&self) -> usize;

    fn component_f64(&self, tuple_idx: usize, component: usize) -> f64;

    fn set_component_f64(&mut self, tuple_idx: usize, component: usize, value: f64);

    fn value_f64(&self, value_idx: usize) -> f64;

    fn set_value_f64(&mut self, value_idx: usize, value: f64);

    /// copy a tuple into `tuple`, which holds at least `number_of_components()` values
    fn tuple_f64(&self, tuple_idx: usize, tuple: &mut [f64]);

    fn set_tuple_f64(&mut self, tuple_idx: usize, tuple: &[f64]);

    /// append a tuple, growing the array, and return its index
    fn insert_next_tuple_f64(&mut self, tuple: &[f64]) -> Result<usize, Error>;

    fn set_number_of_components(&mut self, components: usize) -> Result<(), Error>;

    fn set_number_of_tuples(&mut self, tuples: usize) -> Result<(), Error>;

    fn fill_component_f64(&mut self, component: usize, value: f64) -> Result<(), Error>;

    fn range(&self, which: RangeComponent) -> Option<[f64; 2]>;

    fn finite_range(&self, which: RangeComponent) -> Option<[f64; 2]>;

    fn actual_memory_size(&self) -> usize;

    fn as_any(&self) -> &dyn Any;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vtk_names_round_trip() {
        for ty in ScalarType::ALL {
            assert_eq!(ScalarType::from_vtk_name(ty.vtk_name()), Some(ty));
        }
        assert_eq!(ScalarType::from_vtk_name("Float16"), None);
    }

    #[test]
    fn convert_saturates() {
        assert_eq!(300_i32.convert::<u8>(), 255);
        assert_eq!((-5_i32).convert::<u8>(), 0);
        assert_eq!(f64::NAN.convert::<i16>(), 0);
        assert_eq!(1e10_f64.convert::<i32>(), i32::MAX);
        assert_eq!(7_u8.convert::<f64>(), 7.0);
        assert_eq!(u64::MAX.convert::<u64>(), u64::MAX);
    }

    #[test]
    fn integer_scale_truncates_toward_zero() {
        assert_eq!(7_i32.scale_down(2), 3);
        assert_eq!((-7_i32).scale_down(2), -3);
        assert_eq!(3_i32.scale_up(2), 6);
        assert_eq!(7.0_f32.scale_down(2.0), 3.5);
    }

    #[test]
    fn rounding_conversion() {
        assert_eq!(i32::from_f64_rounded(2.5), 3);
        assert_eq!(i32::from_f64_rounded(-2.5), -3);
        assert_eq!(i32::from_f64(2.9), 2);
        assert_eq!(u8::from_f64_rounded(1000.0), 255);
    }
}
