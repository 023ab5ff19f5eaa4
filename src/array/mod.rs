//! container types for typed numeric arrays
//!
//! [`GenericArray`] implements every array operation exactly once on top of the primitives of
//! a [`Backend`]. The three layouts shipped with the crate are exposed as aliases:
//! [`AosArray`], [`SoaArray`] and [`ScaledSoaArray`].
//!
//! ## Values, tuples and capacity
//!
//! An array holds `number_of_values()` populated values, grouped into tuples of
//! `number_of_components()` values. Values are addressed with AoS numbering regardless of
//! layout: value `i` is component `i % components` of tuple `i / components`. The backend
//! may hold more tuples than are populated (`capacity()`); the `insert_*` family grows it on
//! demand with some headroom, while the `set_*` family never allocates and expects the index
//! to be addressable already.
//!
//! ## Caches
//!
//! Ranges and the value lookup table are computed lazily and cached. Every mutation through
//! the array bumps a modification counter, which invalidates both caches; call
//! [`GenericArray::data_changed`] after writing through a raw slice. Writes through another
//! handle of an aliased buffer (see [`GenericArray::alias`]) are picked up from the buffer
//! generation.

mod aos;
mod copy;
mod erased;
mod iter;
mod lookup;
mod range;
mod scaled_soa;
mod soa;

pub use aos::AosBackend;
pub use copy::CopyPolicy;
pub use iter::{ComponentValues, TupleRef, Tuples, Values};
pub use range::{Ghosts, RangeComponent};
pub use scaled_soa::ScaledSoaBackend;
pub use soa::{ComponentBuffers, SoaBackend};

use crate::prelude::*;

use lookup::LookupTable;
use range::RangeCache;

use std::fmt;
use std::ops::Range;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// array-of-structs array: one interleaved buffer
pub type AosArray<T> = GenericArray<AosBackend<T>>;

/// struct-of-arrays array: one buffer per component
pub type SoaArray<T> = GenericArray<SoaBackend<T>>;

/// struct-of-arrays array whose values are scaled on every read and write
pub type ScaledSoaArray<T> = GenericArray<ScaledSoaBackend<T>>;

/// lazily computed state, valid for one modification count and buffer generation
#[derive(Debug)]
pub(crate) struct Cache<T> {
    modified: (u64, u64),
    ranges: RangeCache,
    lookup: Option<LookupTable<T>>,
}

impl<T> Cache<T> {
    pub(crate) fn new(modified: (u64, u64)) -> Self {
        Self {
            modified,
            ranges: RangeCache::default(),
            lookup: None,
        }
    }

    fn sync(&mut self, modified: (u64, u64)) {
        if self.modified != modified {
            self.ranges.clear();
            self.lookup = None;
            self.modified = modified;
        }
    }
}

/// A typed numeric array over the storage layout `B`.
pub struct GenericArray<B: Backend> {
    pub(crate) backend: B,
    /// populated values
    pub(crate) len: usize,
    name: String,
    modified: u64,
    cache: Mutex<Cache<B::Value>>,
}

impl<B: Backend> GenericArray<B> {
    /// an empty array with a single component
    pub fn new() -> Self {
        Self::from_backend(B::default(), 0)
    }

    /// an empty array with `components` components per tuple
    pub fn with_components(components: usize) -> Result<Self, Error> {
        let mut array = Self::new();
        array.set_number_of_components(components)?;
        Ok(array)
    }

    pub(crate) fn from_backend(backend: B, len: usize) -> Self {
        Self {
            backend,
            len,
            name: String::new(),
            modified: 0,
            cache: Mutex::new(Cache::new((0, 0))),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name<T: Into<String>>(&mut self, name: T) {
        self.name = name.into();
    }

    pub fn layout(&self) -> Layout {
        B::LAYOUT
    }

    pub fn scalar_type(&self) -> ScalarType {
        <B::Value as Scalar>::TYPE
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Mutable access to the backend. Writes through it do not invalidate cached ranges or
    /// lookups; call [`GenericArray::data_changed`] afterwards.
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn number_of_components(&self) -> usize {
        self.backend.components()
    }

    /// number of complete tuples that hold data
    pub fn number_of_tuples(&self) -> usize {
        self.len / self.number_of_components()
    }

    pub fn number_of_values(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// number of tuples that can be addressed without reallocating
    pub fn capacity(&self) -> usize {
        self.backend.capacity()
    }

    /// bytes of value storage held by the array
    pub fn actual_memory_size(&self) -> usize {
        self.backend.memory_size()
    }

    /// Invalidate every cached range and the lookup table.
    pub fn data_changed(&mut self) {
        self.modified = self.modified.wrapping_add(1);
    }

    pub(crate) fn cache(&self) -> MutexGuard<'_, Cache<B::Value>> {
        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        cache.sync((self.modified, self.backend.generation()));
        cache
    }

    //
    // shape
    //

    /// Set the number of components per tuple. Fails for zero, and for per-component layouts
    /// once tuples are allocated. Existing values are not moved.
    pub fn set_number_of_components(&mut self, components: usize) -> Result<(), Error> {
        if components < 1 {
            return Err(Error::InvalidComponents(components));
        }

        self.backend.set_components(components)?;
        self.data_changed();
        Ok(())
    }

    /// Allocate `tuples` tuples, discarding the current contents. Every tuple is populated
    /// (with zeros) afterwards.
    pub fn set_number_of_tuples(&mut self, tuples: usize) -> Result<(), Error> {
        self.backend.allocate_tuples(tuples)?;
        self.len = tuples * self.number_of_components();
        self.data_changed();
        Ok(())
    }

    /// Resize to hold exactly `values` populated values, keeping the existing ones.
    pub fn set_number_of_values(&mut self, values: usize) -> Result<(), Error> {
        let tuples = values.div_ceil(self.number_of_components());
        self.backend.reallocate_tuples(tuples)?;
        self.len = values;
        self.data_changed();
        Ok(())
    }

    /// Change the capacity to `tuples` tuples, keeping the first `min(old, new)` tuples.
    pub fn resize(&mut self, tuples: usize) -> Result<(), Error> {
        self.backend.reallocate_tuples(tuples)?;
        self.len = self.len.min(tuples * self.number_of_components());
        self.data_changed();
        Ok(())
    }

    /// make sure at least `tuples` tuples are addressable, never shrinks
    pub fn reserve_tuples(&mut self, tuples: usize) -> Result<(), Error> {
        if tuples > self.capacity() {
            self.backend.reallocate_tuples(tuples)?;
        }
        Ok(())
    }

    /// release capacity that holds no data
    pub fn squeeze(&mut self) -> Result<(), Error> {
        let tuples = self.len.div_ceil(self.number_of_components());
        if tuples != self.capacity() {
            self.backend.reallocate_tuples(tuples)?;
        }
        Ok(())
    }

    /// forget every value but keep the memory for reuse
    pub fn reset(&mut self) {
        self.len = 0;
        self.data_changed();
    }

    /// forget every value and release the memory
    pub fn initialize(&mut self) {
        self.backend.release();
        self.len = 0;
        self.data_changed();
    }

    /// grow so that `tuple_idx` is addressable, with headroom for further insertions
    fn ensure_tuple(&mut self, tuple_idx: usize) -> Result<(), Error> {
        let capacity = self.capacity();
        if tuple_idx < capacity {
            return Ok(());
        }

        let required = tuple_idx + 1;
        let grown = capacity.saturating_add(required);

        match self.backend.reallocate_tuples(grown) {
            Ok(()) => Ok(()),
            Err(err) => {
                tracing::debug!(grown, required, "growth with headroom failed: {err}");
                self.backend.reallocate_tuples(required)
            }
        }
    }

    //
    // element access. Indices must be addressable (see module docs)
    //

    #[inline]
    pub fn value(&self, value_idx: usize) -> B::Value {
        debug_assert!(value_idx < self.len, "value index {value_idx} out of range");
        self.backend.get_value(value_idx)
    }

    #[inline]
    pub fn set_value(&mut self, value_idx: usize, value: B::Value) {
        debug_assert!(value_idx < self.len, "value index {value_idx} out of range");
        self.backend.set_value(value_idx, value);
        self.data_changed();
    }

    #[inline]
    pub fn component(&self, tuple_idx: usize, component: usize) -> B::Value {
        debug_assert!(tuple_idx < self.capacity(), "tuple index {tuple_idx} out of range");
        debug_assert!(component < self.number_of_components());
        self.backend.get_component(tuple_idx, component)
    }

    #[inline]
    pub fn set_component(&mut self, tuple_idx: usize, component: usize, value: B::Value) {
        debug_assert!(tuple_idx < self.capacity(), "tuple index {tuple_idx} out of range");
        debug_assert!(component < self.number_of_components());
        self.backend.set_component(tuple_idx, component, value);
        self.data_changed();
    }

    /// copy a tuple into `tuple`, which holds at least `number_of_components()` values
    #[inline]
    pub fn typed_tuple(&self, tuple_idx: usize, tuple: &mut [B::Value]) {
        debug_assert!(tuple_idx < self.capacity(), "tuple index {tuple_idx} out of range");
        debug_assert!(tuple.len() >= self.number_of_components());
        self.backend.get_tuple(tuple_idx, tuple);
    }

    #[inline]
    pub fn set_typed_tuple(&mut self, tuple_idx: usize, tuple: &[B::Value]) {
        debug_assert!(tuple_idx < self.capacity(), "tuple index {tuple_idx} out of range");
        debug_assert!(tuple.len() >= self.number_of_components());
        self.backend.set_tuple(tuple_idx, tuple);
        self.data_changed();
    }

    pub fn tuple_f64(&self, tuple_idx: usize, tuple: &mut [f64]) {
        for (component, out) in tuple.iter_mut().take(self.number_of_components()).enumerate() {
            *out = self.component(tuple_idx, component).as_f64();
        }
    }

    pub fn set_tuple_f64(&mut self, tuple_idx: usize, tuple: &[f64]) {
        let components = self.number_of_components();
        debug_assert!(tuple.len() >= components);
        for (component, value) in tuple.iter().take(components).enumerate() {
            self.backend
                .set_component(tuple_idx, component, B::Value::from_f64(*value));
        }
        self.data_changed();
    }

    //
    // insertion: grows the array as needed
    //

    pub fn insert_value(&mut self, value_idx: usize, value: B::Value) -> Result<(), Error> {
        self.ensure_tuple(value_idx / self.number_of_components())?;
        self.backend.set_value(value_idx, value);
        self.len = self.len.max(value_idx + 1);
        self.data_changed();
        Ok(())
    }

    /// append a value and return its index
    pub fn insert_next_value(&mut self, value: B::Value) -> Result<usize, Error> {
        let value_idx = self.len;
        self.insert_value(value_idx, value)?;
        Ok(value_idx)
    }

    pub fn insert_typed_tuple(&mut self, tuple_idx: usize, tuple: &[B::Value]) -> Result<(), Error> {
        let components = self.number_of_components();
        check_tuple_len(components, tuple.len())?;

        self.ensure_tuple(tuple_idx)?;
        self.backend.set_tuple(tuple_idx, tuple);
        self.len = self.len.max((tuple_idx + 1) * components);
        self.data_changed();
        Ok(())
    }

    /// append a tuple after the last (possibly partial) tuple and return its index
    pub fn insert_next_typed_tuple(&mut self, tuple: &[B::Value]) -> Result<usize, Error> {
        let tuple_idx = self.len.div_ceil(self.number_of_components());
        self.insert_typed_tuple(tuple_idx, tuple)?;
        Ok(tuple_idx)
    }

    pub fn insert_component(
        &mut self,
        tuple_idx: usize,
        component: usize,
        value: B::Value,
    ) -> Result<(), Error> {
        let components = self.number_of_components();
        check_component(components, component)?;

        self.ensure_tuple(tuple_idx)?;
        self.backend.set_component(tuple_idx, component, value);
        self.len = self.len.max(tuple_idx * components + component + 1);
        self.data_changed();
        Ok(())
    }

    pub fn insert_tuple_f64(&mut self, tuple_idx: usize, tuple: &[f64]) -> Result<(), Error> {
        let components = self.number_of_components();
        check_tuple_len(components, tuple.len())?;

        self.ensure_tuple(tuple_idx)?;
        self.set_tuple_f64(tuple_idx, tuple);
        self.len = self.len.max((tuple_idx + 1) * components);
        Ok(())
    }

    pub fn insert_next_tuple_f64(&mut self, tuple: &[f64]) -> Result<usize, Error> {
        let tuple_idx = self.len.div_ceil(self.number_of_components());
        self.insert_tuple_f64(tuple_idx, tuple)?;
        Ok(tuple_idx)
    }

    //
    // operations between two arrays of any layout / type
    //

    /// Copy tuple `src_tuple` of `source` into tuple `dst_tuple`, converting values. No
    /// allocation is performed.
    pub fn set_tuple_from<S: Backend>(
        &mut self,
        dst_tuple: usize,
        src_tuple: usize,
        source: &GenericArray<S>,
    ) {
        let components = self.number_of_components();
        debug_assert_eq!(components, source.number_of_components());

        for component in 0..components {
            let value = source.component(src_tuple, component).convert();
            self.backend.set_component(dst_tuple, component, value);
        }
        self.data_changed();
    }

    /// like [`GenericArray::set_tuple_from`] but grows the array as needed
    pub fn insert_tuple_from<S: Backend>(
        &mut self,
        dst_tuple: usize,
        src_tuple: usize,
        source: &GenericArray<S>,
    ) -> Result<(), Error> {
        let components = self.number_of_components();
        check_same_components(components, source.number_of_components())?;

        self.ensure_tuple(dst_tuple)?;
        self.set_tuple_from(dst_tuple, src_tuple, source);
        self.len = self.len.max((dst_tuple + 1) * components);
        Ok(())
    }

    pub fn insert_next_tuple_from<S: Backend>(
        &mut self,
        src_tuple: usize,
        source: &GenericArray<S>,
    ) -> Result<usize, Error> {
        let dst_tuple = self.len.div_ceil(self.number_of_components());
        self.insert_tuple_from(dst_tuple, src_tuple, source)?;
        Ok(dst_tuple)
    }

    /// Gather the tuples listed in `ids` into the first `ids.len()` tuples of `output`, which
    /// must already hold that many tuples.
    pub fn get_tuples<S: Backend>(
        &self,
        ids: &[usize],
        output: &mut GenericArray<S>,
    ) -> Result<(), Error> {
        check_same_components(self.number_of_components(), output.number_of_components())?;
        check_output_tuples(ids.len(), output.number_of_tuples())?;

        for (dst_tuple, &src_tuple) in ids.iter().enumerate() {
            output.set_tuple_from(dst_tuple, src_tuple, self);
        }
        Ok(())
    }

    /// Copy the tuples in `tuples` into the start of `output`, which must already hold
    /// `tuples.len()` tuples.
    pub fn get_tuple_range<S: Backend>(
        &self,
        tuples: Range<usize>,
        output: &mut GenericArray<S>,
    ) -> Result<(), Error> {
        check_same_components(self.number_of_components(), output.number_of_components())?;
        check_output_tuples(tuples.len(), output.number_of_tuples())?;

        for (dst_tuple, src_tuple) in tuples.enumerate() {
            output.set_tuple_from(dst_tuple, src_tuple, self);
        }
        Ok(())
    }

    /// Copy the rectangle of `tuples` × `components` into the start of `output`, which must
    /// have `components.len()` components and already hold `tuples.len()` tuples.
    pub fn get_block<S: Backend>(
        &self,
        tuples: Range<usize>,
        components: Range<usize>,
        output: &mut GenericArray<S>,
    ) -> Result<(), Error> {
        if !components.is_empty() {
            check_component(self.number_of_components(), components.end - 1)?;
        }
        if tuples.end > self.number_of_tuples() {
            return Err(Error::ShapeMismatch {
                what: "tuples in the source array",
                expected: tuples.end,
                actual: self.number_of_tuples(),
            });
        }
        check_same_components(components.len(), output.number_of_components())?;
        check_output_tuples(tuples.len(), output.number_of_tuples())?;

        for (dst_tuple, src_tuple) in tuples.enumerate() {
            for (dst_component, src_component) in components.clone().enumerate() {
                let value = self.backend.get_component(src_tuple, src_component).convert();
                output
                    .backend
                    .set_component(dst_tuple, dst_component, value);
            }
        }
        output.data_changed();
        Ok(())
    }

    /// overwrite component `dst_component` of every tuple with a component of `source`
    pub fn copy_component<S: Backend>(
        &mut self,
        dst_component: usize,
        source: &GenericArray<S>,
        src_component: usize,
    ) -> Result<(), Error> {
        check_component(self.number_of_components(), dst_component)?;
        check_component(source.number_of_components(), src_component)?;

        let tuples = self.number_of_tuples();
        if source.number_of_tuples() != tuples {
            return Err(Error::ShapeMismatch {
                what: "number of tuples of the source array",
                expected: tuples,
                actual: source.number_of_tuples(),
            });
        }

        for tuple in 0..tuples {
            let value = source.component(tuple, src_component).convert();
            self.backend.set_component(tuple, dst_component, value);
        }
        self.data_changed();
        Ok(())
    }

    /// Remove a tuple, shifting the following tuples down. Indices past the end are ignored.
    pub fn remove_tuple(&mut self, tuple_idx: usize) {
        let tuples = self.number_of_tuples();
        if tuple_idx >= tuples {
            return;
        }

        let components = self.number_of_components();
        let mut tuple = vec![B::Value::zero(); components];
        for idx in tuple_idx + 1..tuples {
            self.backend.get_tuple(idx, &mut tuple);
            self.backend.set_tuple(idx - 1, &tuple);
        }

        self.len = (tuples - 1) * components;
        self.data_changed();
    }

    pub fn remove_first_tuple(&mut self) {
        self.remove_tuple(0);
    }

    pub fn remove_last_tuple(&mut self) {
        let tuples = self.number_of_tuples();
        if tuples > 0 {
            self.len = (tuples - 1) * self.number_of_components();
            self.data_changed();
        }
    }

    //
    // interpolation
    //

    /// Write the weighted sum of the `ids` tuples of `source` into `dst_tuple`, growing the
    /// array as needed. Integral destinations are rounded and saturated.
    pub fn interpolate_tuple<S: Backend>(
        &mut self,
        dst_tuple: usize,
        ids: &[usize],
        source: &GenericArray<S>,
        weights: &[f64],
    ) -> Result<(), Error> {
        let components = self.number_of_components();
        check_same_components(components, source.number_of_components())?;
        if weights.len() < ids.len() {
            return Err(Error::ShapeMismatch {
                what: "number of interpolation weights",
                expected: ids.len(),
                actual: weights.len(),
            });
        }

        self.ensure_tuple(dst_tuple)?;
        for component in 0..components {
            let sum: f64 = ids
                .iter()
                .zip(weights)
                .map(|(&id, &weight)| weight * source.component(id, component).as_f64())
                .sum();

            self.backend
                .set_component(dst_tuple, component, B::Value::from_f64_rounded(sum));
        }

        self.len = self.len.max((dst_tuple + 1) * components);
        self.data_changed();
        Ok(())
    }

    /// Write `(1 - t) * a + t * b` into `dst_tuple`, where `a` and `b` are tuples of two
    /// (possibly different) arrays, growing the array as needed.
    pub fn interpolate_tuple_between<S1: Backend, S2: Backend>(
        &mut self,
        dst_tuple: usize,
        src_tuple1: usize,
        source1: &GenericArray<S1>,
        src_tuple2: usize,
        source2: &GenericArray<S2>,
        t: f64,
    ) -> Result<(), Error> {
        let components = self.number_of_components();
        check_same_components(components, source1.number_of_components())?;
        check_same_components(components, source2.number_of_components())?;

        self.ensure_tuple(dst_tuple)?;
        for component in 0..components {
            let a = source1.component(src_tuple1, component).as_f64();
            let b = source2.component(src_tuple2, component).as_f64();
            let value = (1.0 - t) * a + t * b;

            self.backend
                .set_component(dst_tuple, component, B::Value::from_f64_rounded(value));
        }

        self.len = self.len.max((dst_tuple + 1) * components);
        self.data_changed();
        Ok(())
    }

    //
    // bulk
    //

    /// set every populated value to `value`
    pub fn fill_value(&mut self, value: B::Value) {
        self.backend.fill(self.len, value);
        self.data_changed();
    }

    /// set one component of every tuple to `value`
    pub fn fill_component(&mut self, component: usize, value: B::Value) -> Result<(), Error> {
        check_component(self.number_of_components(), component)?;

        self.backend
            .fill_component(self.number_of_tuples(), component, value);
        self.data_changed();
        Ok(())
    }
}

fn check_component(components: usize, component: usize) -> Result<(), Error> {
    if component < components {
        Ok(())
    } else {
        Err(Error::ComponentOutOfRange {
            component,
            components,
        })
    }
}

fn check_tuple_len(components: usize, len: usize) -> Result<(), Error> {
    if len >= components {
        Ok(())
    } else {
        Err(Error::ShapeMismatch {
            what: "values in the tuple",
            expected: components,
            actual: len,
        })
    }
}

fn check_same_components(expected: usize, actual: usize) -> Result<(), Error> {
    if expected == actual {
        Ok(())
    } else {
        Err(Error::ShapeMismatch {
            what: "number of components",
            expected,
            actual,
        })
    }
}

fn check_output_tuples(required: usize, available: usize) -> Result<(), Error> {
    if available >= required {
        Ok(())
    } else {
        Err(Error::ShapeMismatch {
            what: "tuples in the output array",
            expected: required,
            actual: available,
        })
    }
}

impl<B: Backend> Default for GenericArray<B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: Backend> fmt::Debug for GenericArray<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenericArray")
            .field("name", &self.name)
            .field("layout", &B::LAYOUT)
            .field("scalar_type", &self.scalar_type())
            .field("components", &self.number_of_components())
            .field("tuples", &self.number_of_tuples())
            .field("capacity", &self.capacity())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_of_tuples_and_components() {
        let mut source = AosArray::<i32>::with_components(4).unwrap();
        for t in 0..5 {
            source
                .insert_next_typed_tuple(&[t * 10, t * 10 + 1, t * 10 + 2, t * 10 + 3])
                .unwrap();
        }

        let mut block = SoaArray::<f64>::with_components(2).unwrap();
        block.set_number_of_tuples(3).unwrap();
        source.get_block(1..4, 1..3, &mut block).unwrap();
        assert_eq!(
            block.values().collect::<Vec<_>>(),
            vec![11.0, 12.0, 21.0, 22.0, 31.0, 32.0]
        );

        assert!(matches!(
            source.get_block(0..2, 3..5, &mut block),
            Err(Error::ComponentOutOfRange { component: 4, .. })
        ));
        assert!(matches!(
            source.get_block(4..6, 0..2, &mut block),
            Err(Error::ShapeMismatch { .. })
        ));
        assert!(matches!(
            source.get_block(0..3, 0..3, &mut block),
            Err(Error::ShapeMismatch { .. })
        ));
    }

    fn xyz(tuples: usize) -> AosArray<f64> {
        let mut array = AosArray::with_components(3).unwrap();
        for t in 0..tuples {
            let t = t as f64;
            array.insert_next_typed_tuple(&[t, t + 0.5, -t]).unwrap();
        }
        array
    }

    #[test]
    fn zero_components_rejected() {
        let mut array = SoaArray::<u8>::new();
        assert!(matches!(
            array.set_number_of_components(0),
            Err(Error::InvalidComponents(0))
        ));
        assert_eq!(array.number_of_components(), 1);
    }

    #[test]
    fn insert_grows_with_headroom() {
        let mut array = AosArray::<i16>::new();
        for v in 0..10 {
            assert_eq!(array.insert_next_value(v).unwrap(), v as usize);
        }
        assert_eq!(array.number_of_values(), 10);
        assert!(array.capacity() >= 10);

        array.insert_value(30, 7).unwrap();
        assert_eq!(array.number_of_values(), 31);
        assert_eq!(array.value(30), 7);
        // the gap is zero filled
        assert_eq!(array.value(20), 0);
    }

    #[test]
    fn insert_next_tuple_after_partial_tuple() {
        let mut array = SoaArray::<i32>::with_components(2).unwrap();
        array.insert_next_value(1).unwrap();
        let idx = array.insert_next_typed_tuple(&[5, 6]).unwrap();
        assert_eq!(idx, 1);
        assert_eq!(array.number_of_tuples(), 2);
        assert_eq!(array.component(1, 1), 6);
    }

    #[test]
    fn short_tuple_is_rejected() {
        let mut array = AosArray::<f32>::with_components(3).unwrap();
        assert!(matches!(
            array.insert_next_typed_tuple(&[1.0, 2.0]),
            Err(Error::ShapeMismatch { .. })
        ));
        assert!(array.is_empty());
    }

    #[test]
    fn remove_tuples() {
        let mut array = xyz(4);
        array.remove_tuple(1);
        assert_eq!(array.number_of_tuples(), 3);
        assert_eq!(array.component(1, 0), 2.0);

        array.remove_first_tuple();
        assert_eq!(array.component(0, 0), 2.0);

        array.remove_last_tuple();
        assert_eq!(array.number_of_tuples(), 1);

        array.remove_tuple(10);
        assert_eq!(array.number_of_tuples(), 1);
    }

    #[test]
    fn gather_tuples_across_layouts() {
        let source = xyz(5);
        let mut output = SoaArray::<f32>::with_components(3).unwrap();
        output.set_number_of_tuples(2).unwrap();

        source.get_tuples(&[4, 1], &mut output).unwrap();
        assert_eq!(output.component(0, 0), 4.0);
        assert_eq!(output.component(1, 1), 1.5);

        source.get_tuple_range(2..4, &mut output).unwrap();
        assert_eq!(output.component(1, 2), -3.0);

        assert!(source.get_tuple_range(0..3, &mut output).is_err());
    }

    #[test]
    fn copy_component_between_arrays() {
        let source = xyz(3);
        let mut dest = AosArray::<i64>::with_components(2).unwrap();
        dest.set_number_of_tuples(3).unwrap();

        dest.copy_component(1, &source, 2).unwrap();
        assert_eq!(dest.component(2, 1), -2);
        assert_eq!(dest.component(2, 0), 0);

        assert!(dest.copy_component(2, &source, 0).is_err());
    }

    #[test]
    fn interpolation_rounds_integral_destinations() {
        let source = xyz(3);
        let mut dest = AosArray::<i32>::with_components(3).unwrap();

        dest.interpolate_tuple(0, &[0, 1], &source, &[0.25, 0.75]).unwrap();
        assert_eq!(dest.component(0, 0), 1);
        // 0.25 * 0.5 + 0.75 * 1.5 = 1.25
        assert_eq!(dest.component(0, 1), 1);

        dest.interpolate_tuple_between(1, 0, &source, 2, &source, 0.5)
            .unwrap();
        assert_eq!(dest.number_of_tuples(), 2);
        assert_eq!(dest.component(1, 0), 1);
        assert_eq!(dest.component(1, 2), -1);
    }

    #[test]
    fn fill_component_checks_index() {
        let mut array = xyz(2);
        array.fill_component(1, 9.0).unwrap();
        assert_eq!(array.component(1, 1), 9.0);
        assert_eq!(array.component(1, 0), 1.0);
        assert!(array.fill_component(3, 0.0).is_err());

        array.fill_value(2.0);
        assert!(array.values().all(|v| v == 2.0));
    }

    #[test]
    fn resize_keeps_prefix() {
        let mut array = xyz(4);
        array.resize(2).unwrap();
        assert_eq!(array.number_of_tuples(), 2);
        assert_eq!(array.component(1, 1), 1.5);

        array.resize(6).unwrap();
        assert_eq!(array.number_of_tuples(), 2);
        assert_eq!(array.capacity(), 6);

        array.squeeze().unwrap();
        assert_eq!(array.capacity(), 2);

        array.initialize();
        assert_eq!(array.capacity(), 0);
        assert!(array.is_empty());
    }

    #[test]
    fn set_number_of_tuples_discards() {
        let mut array = xyz(2);
        array.set_number_of_tuples(3).unwrap();
        assert!(array.values().all(|v| v == 0.0));
        assert_eq!(array.number_of_values(), 9);
    }
}
