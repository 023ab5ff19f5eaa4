//! Bulk copies between arrays.

use super::{Cache, GenericArray};
use crate::prelude::*;

use std::any::Any;
use std::sync::Mutex;

/// Thresholds for splitting large same-type copies across threads.
///
/// Copies of fewer than `parallel_threshold_bytes` bytes run on the calling thread. Larger
/// copies are split into at most `max_tasks` chunks of at least `min_chunk_bytes` bytes.
/// Without the `parallel` feature every copy is sequential.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CopyPolicy {
    pub parallel_threshold_bytes: usize,
    pub min_chunk_bytes: usize,
    pub max_tasks: usize,
}

impl CopyPolicy {
    pub const DEFAULT_PARALLEL_THRESHOLD_BYTES: usize = 1 << 20;
    pub const DEFAULT_MIN_CHUNK_BYTES: usize = 256 << 10;
    pub const DEFAULT_MAX_TASKS: usize = 8;

    /// never split a copy
    pub fn sequential() -> Self {
        Self {
            parallel_threshold_bytes: usize::MAX,
            ..Self::default()
        }
    }

    /// number of chunks a copy of `bytes` bytes is split into
    pub(crate) fn tasks_for(&self, bytes: usize) -> usize {
        if bytes < self.parallel_threshold_bytes {
            return 1;
        }

        (bytes / self.min_chunk_bytes.max(1)).clamp(1, self.max_tasks.max(1))
    }
}

impl Default for CopyPolicy {
    fn default() -> Self {
        Self {
            parallel_threshold_bytes: Self::DEFAULT_PARALLEL_THRESHOLD_BYTES,
            min_chunk_bytes: Self::DEFAULT_MIN_CHUNK_BYTES,
            max_tasks: Self::DEFAULT_MAX_TASKS,
        }
    }
}

/// copy `source` into `dest`, which have the same length
pub(crate) fn copy_values<T: Scalar>(source: &[T], dest: &mut [T], policy: &CopyPolicy) {
    debug_assert_eq!(source.len(), dest.len());

    let tasks = policy.tasks_for(source.len() * T::SIZE);
    if tasks <= 1 {
        dest.copy_from_slice(source);
    } else {
        parallel_copy(source, dest, tasks);
    }
}

#[cfg(feature = "parallel")]
fn parallel_copy<T: Scalar>(source: &[T], dest: &mut [T], tasks: usize) {
    use rayon::prelude::*;

    let chunk = source.len().div_ceil(tasks).max(1);
    tracing::debug!(values = source.len(), tasks, chunk, "parallel copy");

    dest.par_chunks_mut(chunk)
        .zip(source.par_chunks(chunk))
        .for_each(|(dest, source)| dest.copy_from_slice(source));
}

#[cfg(not(feature = "parallel"))]
fn parallel_copy<T: Scalar>(source: &[T], dest: &mut [T], _tasks: usize) {
    dest.copy_from_slice(source);
}

impl<B: Backend> GenericArray<B> {
    /// Replace the contents with a copy of `source`, converting values as needed.
    pub fn deep_copy<S: Backend>(&mut self, source: &GenericArray<S>) -> Result<(), Error> {
        self.deep_copy_with(source, &CopyPolicy::default())
    }

    /// Like [`GenericArray::deep_copy`]. When `source` has the same layout and value type, its
    /// storage is copied in bulk following `policy`; otherwise the values are converted one at
    /// a time. On failure `self` is unchanged.
    pub fn deep_copy_with<S: Backend>(
        &mut self,
        source: &GenericArray<S>,
        policy: &CopyPolicy,
    ) -> Result<(), Error> {
        let components = source.number_of_components();
        let values = source.len;
        let tuples = values.div_ceil(components);

        let mut backend = B::default();
        backend.set_components(components)?;
        backend.allocate_tuples(tuples)?;
        if let Some(scale) = source.backend.scale_factor() {
            backend.adopt_scale(scale);
        }

        if let Some(same) = (source as &dyn Any).downcast_ref::<GenericArray<B>>() {
            backend.copy_from(&same.backend, tuples, policy);
        } else {
            tracing::trace!(
                from = %source.scalar_type(),
                to = %self.scalar_type(),
                values,
                "converting deep copy"
            );
            for idx in 0..values {
                backend.set_value(idx, source.backend.get_value(idx).convert());
            }
        }

        self.backend = backend;
        self.len = values;
        self.data_changed();
        Ok(())
    }

    /// A new array sharing the buffers of this one without copying them. The first write
    /// through either array gives that array a private copy of the buffer it writes to.
    pub fn shallow_copy(&self) -> Self {
        self.with_backend(self.backend.shallow_copy())
    }

    /// A new array writing in place into the buffers of this one: a write through either is
    /// read back through both, and invalidates the cached ranges of both, until one of them
    /// reallocates.
    ///
    /// # Safety
    ///
    /// While both arrays are alive, neither may be written while a slice, iterator or tuple
    /// borrowed from the other is in use, and they must not be used from different threads at
    /// the same time when either writes. See [`Buffer::alias`](crate::Buffer::alias).
    pub unsafe fn alias(&mut self) -> Self {
        // SAFETY: forwarded to the caller
        let backend = unsafe { self.backend.alias() };
        self.with_backend(backend)
    }

    fn with_backend(&self, backend: B) -> Self {
        Self {
            backend,
            len: self.len,
            name: self.name.clone(),
            modified: 0,
            cache: Mutex::new(Cache::new((0, 0))),
        }
    }

    /// a deep copy with its own storage
    pub fn try_clone(&self) -> Result<Self, Error> {
        let mut copy = Self::new();
        copy.deep_copy(self)?;
        copy.set_name(self.name());
        Ok(copy)
    }
}
