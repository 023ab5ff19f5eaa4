use super::copy::copy_values;
use super::GenericArray;
use crate::buffer::ReleasePolicy;
use crate::prelude::*;

use std::ptr::NonNull;

/// Array-of-structs storage: a single buffer with the components of each tuple adjacent.
#[derive(Debug)]
pub struct AosBackend<T: Scalar> {
    buffer: Buffer<T>,
    components: usize,
}

impl<T: Scalar> AosBackend<T> {
    pub fn buffer(&self) -> &Buffer<T> {
        &self.buffer
    }

    /// every allocated value, tuple after tuple
    pub fn as_slice(&self) -> &[T] {
        self.buffer.as_slice()
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        self.buffer.as_mut_slice()
    }

    #[inline]
    fn offset(&self, tuple_idx: usize) -> usize {
        tuple_idx * self.components
    }
}

impl<T: Scalar> Default for AosBackend<T> {
    fn default() -> Self {
        Self {
            buffer: Buffer::new(),
            components: 1,
        }
    }
}

impl<T: Scalar> Backend for AosBackend<T> {
    type Value = T;

    const LAYOUT: Layout = Layout::Aos;

    fn components(&self) -> usize {
        self.components
    }

    fn set_components(&mut self, components: usize) -> Result<(), Error> {
        self.components = components;
        Ok(())
    }

    fn capacity(&self) -> usize {
        self.buffer.len() / self.components
    }

    #[inline]
    fn get_value(&self, value_idx: usize) -> T {
        self.buffer.get(value_idx)
    }

    #[inline]
    fn set_value(&mut self, value_idx: usize, value: T) {
        self.buffer.set(value_idx, value)
    }

    #[inline]
    fn get_tuple(&self, tuple_idx: usize, tuple: &mut [T]) {
        let start = self.offset(tuple_idx);
        tuple[..self.components].copy_from_slice(&self.as_slice()[start..start + self.components]);
    }

    #[inline]
    fn set_tuple(&mut self, tuple_idx: usize, tuple: &[T]) {
        let start = self.offset(tuple_idx);
        let components = self.components;
        self.as_mut_slice()[start..start + components].copy_from_slice(&tuple[..components]);
    }

    #[inline]
    fn get_component(&self, tuple_idx: usize, component: usize) -> T {
        self.buffer.get(self.offset(tuple_idx) + component)
    }

    #[inline]
    fn set_component(&mut self, tuple_idx: usize, component: usize, value: T) {
        let idx = self.offset(tuple_idx) + component;
        self.buffer.set(idx, value)
    }

    fn allocate_tuples(&mut self, tuples: usize) -> Result<(), Error> {
        self.buffer.allocate(tuples.saturating_mul(self.components))?;
        Ok(())
    }

    fn reallocate_tuples(&mut self, tuples: usize) -> Result<(), Error> {
        self.buffer
            .reallocate(tuples.saturating_mul(self.components))?;
        Ok(())
    }

    fn fill(&mut self, values: usize, value: T) {
        self.as_mut_slice()[..values].fill(value);
    }

    fn copy_from(&mut self, source: &Self, tuples: usize, policy: &CopyPolicy) {
        let values = tuples * self.components;
        copy_values(
            &source.as_slice()[..values],
            &mut self.buffer.as_mut_slice()[..values],
            policy,
        );
    }

    fn shallow_copy(&self) -> Self {
        Self {
            buffer: self.buffer.share(),
            components: self.components,
        }
    }

    unsafe fn alias(&mut self) -> Self {
        Self {
            // SAFETY: forwarded to the caller
            buffer: unsafe { self.buffer.alias() },
            components: self.components,
        }
    }

    fn generation(&self) -> u64 {
        self.buffer.generation()
    }

    fn release(&mut self) {
        self.buffer.release();
    }

    fn memory_size(&self) -> usize {
        self.buffer.memory_size()
    }
}

/// Installing caller memory
impl<T: Scalar> GenericArray<AosBackend<T>> {
    /// Store the values of `values`, interpreted as interleaved tuples.
    ///
    /// With `update_tuples` every value becomes populated, otherwise the array is left empty
    /// with the values available as capacity.
    pub fn set_vec(&mut self, values: Vec<T>, update_tuples: bool) {
        let len = values.len();
        self.backend.buffer.set_vec(values);
        self.len = if update_tuples { len } else { 0 };
        self.data_changed();
    }

    /// Use caller supplied memory holding `len` interleaved values.
    ///
    /// The previous buffer is released with its own policy; `policy` is used for `ptr` once
    /// the array (and every shallow copy of it) is done with it.
    ///
    /// # Safety
    ///
    /// Same contract as [`Buffer::set_external`](crate::Buffer::set_external).
    pub unsafe fn set_external(
        &mut self,
        ptr: NonNull<T>,
        len: usize,
        policy: ReleasePolicy<T>,
        update_tuples: bool,
    ) {
        // SAFETY: forwarded to the caller
        unsafe { self.backend.buffer.set_external(ptr, len, policy) };
        self.len = if update_tuples { len } else { 0 };
        self.data_changed();
    }

    /// populated values, tuple after tuple
    pub fn as_slice(&self) -> &[T] {
        &self.backend.as_slice()[..self.len]
    }

    /// Mutable view of the populated values. Call [`GenericArray::data_changed`] once done
    /// writing so cached ranges are recomputed.
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        let len = self.len;
        &mut self.backend.as_mut_slice()[..len]
    }
}

#[cfg(feature = "ndarray")]
mod interop {
    use super::*;
    use ndarray::{Array2, ArrayView2};

    impl<T: Scalar> GenericArray<AosBackend<T>> {
        /// Build an array from a `(tuples, components)` ndarray.
        pub fn from_ndarray(values: Array2<T>) -> Result<Self, Error> {
            let (tuples, components) = values.dim();
            let mut array = Self::with_components(components.max(1))?;

            // logical (row major) order, whatever the memory order of the input
            let values: Vec<T> = values.iter().copied().collect();

            debug_assert_eq!(values.len(), tuples * components);
            array.set_vec(values, true);
            Ok(array)
        }

        /// Zero copy `(tuples, components)` view of the populated tuples
        pub fn as_ndarray_view(&self) -> Result<ArrayView2<'_, T>, Error> {
            let components = self.number_of_components();
            let tuples = self.number_of_tuples();
            let values = &self.backend.as_slice()[..tuples * components];

            ArrayView2::from_shape((tuples, components), values).map_err(|_| Error::ShapeMismatch {
                what: "values for an ndarray view",
                expected: tuples * components,
                actual: values.len(),
            })
        }
    }

    impl<B: Backend> GenericArray<B> {
        /// Copy the populated tuples into a `(tuples, components)` ndarray, for any layout.
        pub fn to_ndarray(&self) -> Array2<B::Value> {
            let components = self.number_of_components();
            Array2::from_shape_fn((self.number_of_tuples(), components), |(tuple, component)| {
                self.component(tuple, component)
            })
        }
    }
}
