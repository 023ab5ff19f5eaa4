use super::copy::copy_values;
use super::GenericArray;
use crate::buffer::ReleasePolicy;
use crate::prelude::*;

use std::ptr::NonNull;

/// Struct-of-arrays storage: one buffer per component, all with the same number of tuples.
///
/// The number of components cannot change while tuples are allocated, since that would mean
/// redistributing every buffer.
#[derive(Debug)]
pub struct SoaBackend<T: Scalar> {
    buffers: Vec<Buffer<T>>,
    tuples: usize,
}

impl<T: Scalar> Default for SoaBackend<T> {
    fn default() -> Self {
        Self {
            buffers: vec![Buffer::new()],
            tuples: 0,
        }
    }
}

impl<T: Scalar> SoaBackend<T> {
    pub fn buffers(&self) -> &[Buffer<T>] {
        &self.buffers
    }

    /// the capacity is bounded by the shortest buffer
    fn refresh_capacity(&mut self) {
        self.tuples = self.buffers.iter().map(Buffer::len).min().unwrap_or(0);
    }
}

impl<T: Scalar> Backend for SoaBackend<T> {
    type Value = T;

    const LAYOUT: Layout = Layout::Soa;

    fn components(&self) -> usize {
        self.buffers.len()
    }

    fn set_components(&mut self, components: usize) -> Result<(), Error> {
        let current = self.buffers.len();
        if components == current {
            return Ok(());
        }

        if self.tuples > 0 {
            return Err(Error::ComponentsLocked {
                layout: Self::LAYOUT,
                current,
                requested: components,
            });
        }

        self.buffers.resize_with(components, Buffer::new);
        Ok(())
    }

    fn capacity(&self) -> usize {
        self.tuples
    }

    #[inline]
    fn get_value(&self, value_idx: usize) -> T {
        let components = self.buffers.len();
        self.buffers[value_idx % components].get(value_idx / components)
    }

    #[inline]
    fn set_value(&mut self, value_idx: usize, value: T) {
        let components = self.buffers.len();
        self.buffers[value_idx % components].set(value_idx / components, value)
    }

    #[inline]
    fn get_tuple(&self, tuple_idx: usize, tuple: &mut [T]) {
        for (out, buffer) in tuple.iter_mut().zip(&self.buffers) {
            *out = buffer.get(tuple_idx);
        }
    }

    #[inline]
    fn set_tuple(&mut self, tuple_idx: usize, tuple: &[T]) {
        for (value, buffer) in tuple.iter().zip(&mut self.buffers) {
            buffer.set(tuple_idx, *value);
        }
    }

    #[inline]
    fn get_component(&self, tuple_idx: usize, component: usize) -> T {
        self.buffers[component].get(tuple_idx)
    }

    #[inline]
    fn set_component(&mut self, tuple_idx: usize, component: usize, value: T) {
        self.buffers[component].set(tuple_idx, value)
    }

    fn allocate_tuples(&mut self, tuples: usize) -> Result<(), Error> {
        // every buffer is allocated before any is replaced
        let fresh = (0..self.buffers.len())
            .map(|_| Buffer::with_len(tuples))
            .collect::<Result<Vec<_>, _>>()?;

        self.buffers = fresh;
        self.tuples = tuples;
        Ok(())
    }

    fn reallocate_tuples(&mut self, tuples: usize) -> Result<(), Error> {
        // reserving leaves the contents alone, so a failure part way through changes nothing
        for buffer in &mut self.buffers {
            buffer.reserve(tuples)?;
        }
        for buffer in &mut self.buffers {
            buffer.resize_reserved(tuples);
        }

        self.tuples = tuples;
        Ok(())
    }

    fn fill(&mut self, values: usize, value: T) {
        let components = self.buffers.len();
        let full = values / components;

        for buffer in &mut self.buffers {
            buffer.as_mut_slice()[..full].fill(value);
        }
        for idx in full * components..values {
            self.set_value(idx, value);
        }
    }

    fn fill_component(&mut self, tuples: usize, component: usize, value: T) {
        self.buffers[component].as_mut_slice()[..tuples].fill(value);
    }

    fn copy_from(&mut self, source: &Self, tuples: usize, policy: &CopyPolicy) {
        for (dest, source) in self.buffers.iter_mut().zip(&source.buffers) {
            copy_values(
                &source.as_slice()[..tuples],
                &mut dest.as_mut_slice()[..tuples],
                policy,
            );
        }
    }

    fn shallow_copy(&self) -> Self {
        Self {
            buffers: self.buffers.iter().map(Buffer::share).collect(),
            tuples: self.tuples,
        }
    }

    unsafe fn alias(&mut self) -> Self {
        Self {
            // SAFETY: forwarded to the caller
            buffers: self.buffers.iter_mut().map(|b| unsafe { b.alias() }).collect(),
            tuples: self.tuples,
        }
    }

    fn generation(&self) -> u64 {
        self.buffers
            .iter()
            .fold(0, |sum, buffer| sum.wrapping_add(buffer.generation()))
    }

    fn release(&mut self) {
        for buffer in &mut self.buffers {
            buffer.release();
        }
        self.tuples = 0;
    }

    fn memory_size(&self) -> usize {
        self.buffers.iter().map(Buffer::memory_size).sum()
    }
}

/// Layouts that keep the values of each component in a buffer of its own.
///
/// The buffers hold *stored* values: for a scaled layout they are not multiplied by the scale.
pub trait ComponentBuffers: Backend {
    fn component_buffer(&self, component: usize) -> &Buffer<Self::Value>;

    fn component_buffer_mut(&mut self, component: usize) -> &mut Buffer<Self::Value>;

    /// recompute the capacity after buffers were swapped out
    fn buffers_replaced(&mut self);
}

impl<T: Scalar> ComponentBuffers for SoaBackend<T> {
    fn component_buffer(&self, component: usize) -> &Buffer<T> {
        &self.buffers[component]
    }

    fn component_buffer_mut(&mut self, component: usize) -> &mut Buffer<T> {
        &mut self.buffers[component]
    }

    fn buffers_replaced(&mut self) {
        self.refresh_capacity();
    }
}

/// Per-component memory
impl<B: ComponentBuffers> GenericArray<B> {
    /// stored values of one component, one per allocated tuple
    pub fn component_slice(&self, component: usize) -> &[B::Value] {
        self.backend.component_buffer(component).as_slice()
    }

    /// Mutable stored values of one component. Call [`GenericArray::data_changed`] once done
    /// writing so cached ranges are recomputed.
    pub fn component_slice_mut(&mut self, component: usize) -> &mut [B::Value] {
        self.backend.component_buffer_mut(component).as_mut_slice()
    }

    /// Store `values` as the buffer of one component.
    ///
    /// The capacity becomes the length of the shortest component buffer. With `update_tuples`
    /// every tuple of that capacity becomes populated.
    pub fn set_component_vec(
        &mut self,
        component: usize,
        values: Vec<B::Value>,
        update_tuples: bool,
    ) -> Result<(), Error> {
        super::check_component(self.number_of_components(), component)?;

        self.backend.component_buffer_mut(component).set_vec(values);
        self.component_buffer_installed(update_tuples);
        Ok(())
    }

    /// Use caller supplied memory holding `len` values as the buffer of one component.
    ///
    /// The previous buffer of that component is released with its own policy. Capacity and
    /// `update_tuples` behave as in [`GenericArray::set_component_vec`].
    ///
    /// # Safety
    ///
    /// Same contract as [`Buffer::set_external`](crate::Buffer::set_external).
    pub unsafe fn set_component_external(
        &mut self,
        component: usize,
        ptr: NonNull<B::Value>,
        len: usize,
        policy: ReleasePolicy<B::Value>,
        update_tuples: bool,
    ) -> Result<(), Error> {
        super::check_component(self.number_of_components(), component)?;

        // SAFETY: forwarded to the caller
        unsafe {
            self.backend
                .component_buffer_mut(component)
                .set_external(ptr, len, policy)
        };
        self.component_buffer_installed(update_tuples);
        Ok(())
    }

    fn component_buffer_installed(&mut self, update_tuples: bool) {
        self.backend.buffers_replaced();

        let values = self.capacity() * self.number_of_components();
        self.len = if update_tuples {
            values
        } else {
            self.len.min(values)
        };
        self.data_changed();
    }
}
