//! Reference counted storage for the values of a single buffer.
//!
//! A [`Buffer`] is a handle to a contiguous block of values. The block was either allocated by
//! the buffer itself (a Rust `Vec`), or handed in by the caller through
//! [`Buffer::set_external`] together with a [`ReleasePolicy`] describing how it must be freed.
//!
//! Whenever a block is replaced (by `allocate`, a reallocation that has to move the data,
//! `set_external`, `set_vec`, or `release`) or the last handle to it is dropped, the block is
//! released with the policy it was installed with. The policy of the *new* block never
//! applies to the old one.
//!
//! ## Sharing
//!
//! [`Buffer::share`] creates a second handle to the same block without copying. The block is
//! copy on write: the first mutable access through any handle of a shared block moves that
//! handle onto a private copy, so a slice borrowed from one handle never changes underneath
//! the borrow.
//!
//! [`Buffer::alias`] creates a handle that writes *in place*: every handle of an aliased block
//! sees the writes of the others. Nothing stops one handle from writing while another holds a
//! slice, or two threads from touching the block at once, so it is `unsafe` and the caller
//! upholds the exclusion instead. Every in place write to an aliased block bumps
//! [`Buffer::generation`], which lets the owners of the other handles notice the change.

use crate::Scalar;

use std::alloc::{self, Layout};
use std::collections::TryReserveError;
use std::fmt;
use std::mem::ManuallyDrop;
use std::ptr::NonNull;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

/// Failure to obtain memory for a buffer.
#[derive(thiserror::Error, derive_more::Constructor, Debug, Clone, PartialEq, Eq)]
#[error("failed to allocate {requested} values of {value_size} bytes each")]
pub struct AllocationError {
    pub requested: usize,
    pub value_size: usize,
    #[source]
    source: TryReserveError,
}

/// callback used by [`ReleasePolicy::Custom`]
pub type ReleaseFn<T> = Box<dyn FnOnce(NonNull<T>, usize) + Send>;

/// How externally supplied memory is given back once the buffer is done with it.
pub enum ReleasePolicy<T> {
    /// the memory belongs to the caller and is never freed by the buffer
    None,
    /// allocated with [`std::alloc::alloc`] and `Layout::array::<T>(len)`
    Free,
    /// the leaked contents of a `Box<[T]>` of exactly `len` values
    Delete,
    /// allocated with [`std::alloc::alloc`] using `len * size_of::<T>()` bytes and `align`
    AlignedFree { align: usize },
    /// called exactly once with the original pointer and length
    Custom(ReleaseFn<T>),
}

impl<T> ReleasePolicy<T> {
    /// wrap a closure as a [`ReleasePolicy::Custom`]
    pub fn custom<F>(callback: F) -> Self
    where
        F: FnOnce(NonNull<T>, usize) + Send + 'static,
    {
        Self::Custom(Box::new(callback))
    }
}

impl<T> fmt::Debug for ReleasePolicy<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "None"),
            Self::Free => write!(f, "Free"),
            Self::Delete => write!(f, "Delete"),
            Self::AlignedFree { align } => write!(f, "AlignedFree {{ align: {align} }}"),
            Self::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}

enum Origin<T> {
    /// allocated by the buffer as a `Vec<T>` with this capacity
    Owned { capacity: usize },
    External(ReleasePolicy<T>),
}

struct Block<T> {
    ptr: NonNull<T>,
    len: usize,
    origin: Origin<T>,
    /// set once by `Buffer::alias`, handles then write in place
    aliased: AtomicBool,
    /// in place writes to an aliased block
    writes: AtomicU64,
}

// SAFETY: the block owns (or borrows with the caller's guarantee) plain-old-data values. A
// block reachable from more than one handle is only written after `Buffer::make_unique`
// detached the writer, or when aliased, under the exclusion promised to `Buffer::alias`. The
// release callback is only touched from `drop`, which has exclusive access.
unsafe impl<T: Send> Send for Block<T> {}
unsafe impl<T: Sync> Sync for Block<T> {}

impl<T> Block<T> {
    fn new(ptr: NonNull<T>, len: usize, origin: Origin<T>) -> Self {
        Self {
            ptr,
            len,
            origin,
            aliased: AtomicBool::new(false),
            writes: AtomicU64::new(0),
        }
    }

    fn is_aliased(&self) -> bool {
        self.aliased.load(Ordering::Acquire)
    }
}

impl<T: Scalar> Block<T> {
    fn empty() -> Self {
        Self::from_vec(Vec::new())
    }

    fn from_vec(vec: Vec<T>) -> Self {
        let mut vec = ManuallyDrop::new(vec);
        let len = vec.len();
        let capacity = vec.capacity();
        // SAFETY: a Vec pointer is never null, even without an allocation
        let ptr = unsafe { NonNull::new_unchecked(vec.as_mut_ptr()) };

        Self::new(ptr, len, Origin::Owned { capacity })
    }

    fn zeroed(len: usize) -> Result<Self, AllocationError> {
        let mut vec = Vec::new();
        vec.try_reserve_exact(len)
            .map_err(|source| AllocationError::new(len, T::SIZE, source))?;
        vec.resize(len, T::zero());
        Ok(Self::from_vec(vec))
    }

    fn copied_with_capacity(values: &[T], capacity: usize) -> Result<Self, AllocationError> {
        let mut vec = Vec::new();
        vec.try_reserve_exact(capacity.max(values.len()))
            .map_err(|source| AllocationError::new(capacity, T::SIZE, source))?;
        vec.extend_from_slice(values);
        Ok(Self::from_vec(vec))
    }

    fn capacity(&self) -> usize {
        match self.origin {
            Origin::Owned { capacity } => capacity,
            Origin::External(_) => self.len,
        }
    }

    /// run `f` on the block as a `Vec`, if the block was allocated by us
    fn with_vec<R>(&mut self, f: impl FnOnce(&mut Vec<T>) -> R) -> Option<R> {
        let Origin::Owned { capacity } = self.origin else {
            return None;
        };

        // SAFETY: `ptr`, `len` and `capacity` came from a `Vec<T>` and are kept in sync below
        let mut vec =
            ManuallyDrop::new(unsafe { Vec::from_raw_parts(self.ptr.as_ptr(), self.len, capacity) });
        let out = f(&mut vec);

        // SAFETY: a Vec pointer is never null
        self.ptr = unsafe { NonNull::new_unchecked(vec.as_mut_ptr()) };
        self.len = vec.len();
        self.origin = Origin::Owned {
            capacity: vec.capacity(),
        };

        Some(out)
    }
}

impl<T> Drop for Block<T> {
    fn drop(&mut self) {
        let origin = std::mem::replace(&mut self.origin, Origin::External(ReleasePolicy::None));

        match origin {
            Origin::Owned { capacity } => {
                // SAFETY: the parts came from a `Vec<T>` in `Block::from_vec` / `with_vec`
                drop(unsafe { Vec::from_raw_parts(self.ptr.as_ptr(), self.len, capacity) });
            }
            Origin::External(policy) => release_external(self.ptr, self.len, policy),
        }
    }
}

fn release_external<T>(ptr: NonNull<T>, len: usize, policy: ReleasePolicy<T>) {
    tracing::trace!(len, ?policy, "releasing external buffer");

    match policy {
        ReleasePolicy::None => {}
        ReleasePolicy::Free => {
            if len == 0 {
                return;
            }
            match Layout::array::<T>(len) {
                // SAFETY: the installer of the block promised it came from `alloc` with this layout
                Ok(layout) => unsafe { alloc::dealloc(ptr.as_ptr().cast(), layout) },
                Err(_) => tracing::warn!(len, "invalid layout for external buffer, leaking it"),
            }
        }
        ReleasePolicy::Delete => {
            let slice = std::ptr::slice_from_raw_parts_mut(ptr.as_ptr(), len);
            // SAFETY: the installer of the block promised it is a leaked `Box<[T]>` of `len` values
            drop(unsafe { Box::from_raw(slice) });
        }
        ReleasePolicy::AlignedFree { align } => {
            if len == 0 {
                return;
            }
            match Layout::from_size_align(len * std::mem::size_of::<T>(), align) {
                // SAFETY: the installer of the block promised it came from `alloc` with this layout
                Ok(layout) => unsafe { alloc::dealloc(ptr.as_ptr().cast(), layout) },
                Err(_) => tracing::warn!(len, align, "invalid layout for external buffer, leaking it"),
            }
        }
        ReleasePolicy::Custom(callback) => callback(ptr, len),
    }
}

/// Handle to a contiguous block of `len` values of one scalar type.
pub struct Buffer<T: Scalar> {
    block: Arc<Block<T>>,
}

impl<T: Scalar> Buffer<T> {
    /// an empty buffer, no memory is allocated
    pub fn new() -> Self {
        Self {
            block: Arc::new(Block::empty()),
        }
    }

    /// a zero filled buffer of `len` values
    pub fn with_len(len: usize) -> Result<Self, AllocationError> {
        Ok(Self {
            block: Arc::new(Block::zeroed(len)?),
        })
    }

    /// take ownership of the values of a `Vec`
    pub fn from_vec(values: Vec<T>) -> Self {
        Self {
            block: Arc::new(Block::from_vec(values)),
        }
    }

    pub fn len(&self) -> usize {
        self.block.len
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `true` if the memory was allocated by the buffer rather than supplied externally
    pub fn is_owned(&self) -> bool {
        matches!(self.block.origin, Origin::Owned { .. })
    }

    /// `true` if another handle created by [`Buffer::share`] or [`Buffer::alias`] refers to
    /// the same memory
    pub fn is_shared(&self) -> bool {
        Arc::strong_count(&self.block) > 1
    }

    /// `true` if the block was handed out by [`Buffer::alias`] and is written in place
    pub fn is_aliased(&self) -> bool {
        self.block.is_aliased()
    }

    /// Number of in place writes to an aliased block, through any of its handles. Stays zero
    /// for blocks that were never aliased.
    pub fn generation(&self) -> u64 {
        self.block.writes.load(Ordering::Acquire)
    }

    /// bytes of value storage
    pub fn memory_size(&self) -> usize {
        self.len() * T::SIZE
    }

    pub fn as_ptr(&self) -> *const T {
        self.block.ptr.as_ptr()
    }

    pub fn as_slice(&self) -> &[T] {
        // SAFETY: the block holds `len` initialized values for as long as it is alive
        unsafe { std::slice::from_raw_parts(self.block.ptr.as_ptr(), self.block.len) }
    }

    /// Mutable view of the values.
    ///
    /// A block shared through [`Buffer::share`] is copied first, so the other handles keep
    /// the old values. An aliased block is written in place.
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        self.make_unique();
        if self.block.is_aliased() {
            self.block.writes.fetch_add(1, Ordering::AcqRel);
        }

        // SAFETY: the block holds `len` initialized values. After `make_unique` this handle is
        // the only one, or the block is aliased and `Buffer::alias` made the caller responsible
        // for exclusive access.
        unsafe { std::slice::from_raw_parts_mut(self.block.ptr.as_ptr(), self.block.len) }
    }

    /// move onto a private copy when other handles share the block copy on write
    fn make_unique(&mut self) {
        if Arc::get_mut(&mut self.block).is_some() || self.block.is_aliased() {
            return;
        }

        tracing::trace!(len = self.len(), "detaching shared buffer before writing");
        let private = Block::from_vec(self.as_slice().to_vec());
        self.replace(private);
    }

    #[inline]
    pub fn get(&self, idx: usize) -> T {
        self.as_slice()[idx]
    }

    #[inline]
    pub fn set(&mut self, idx: usize, value: T) {
        self.as_mut_slice()[idx] = value;
    }

    /// Discard the contents and hold `len` zeroed values. On failure the buffer is unchanged.
    pub fn allocate(&mut self, len: usize) -> Result<(), AllocationError> {
        let block = Block::zeroed(len).map_err(|err| {
            tracing::warn!(len, "buffer allocation failed");
            err
        })?;
        self.replace(block);
        Ok(())
    }

    /// Resize to `len` values, keeping the first `min(old, new)` values and zero filling the
    /// rest. On failure the buffer is unchanged.
    pub fn reallocate(&mut self, len: usize) -> Result<(), AllocationError> {
        self.reserve(len)?;
        self.resize_reserved(len);

        if let Some(block) = Arc::get_mut(&mut self.block) {
            block.with_vec(|vec| vec.shrink_to(len));
        }

        Ok(())
    }

    /// Make sure the buffer owns its memory exclusively with room for at least `len` values.
    ///
    /// The logical contents and length are unchanged. External or shared memory is copied
    /// into a fresh block first, which releases (or un-shares) the old one.
    pub fn reserve(&mut self, len: usize) -> Result<(), AllocationError> {
        if let Some(block) = Arc::get_mut(&mut self.block) {
            let reserved = block.with_vec(|vec| {
                let additional = len.saturating_sub(vec.len());
                vec.try_reserve_exact(additional)
            });

            if let Some(result) = reserved {
                return result.map_err(|source| {
                    tracing::warn!(len, "buffer reallocation failed");
                    AllocationError::new(len, T::SIZE, source)
                });
            }
        }

        let block = Block::copied_with_capacity(self.as_slice(), len).map_err(|err| {
            tracing::warn!(len, "buffer reallocation failed");
            err
        })?;
        self.replace(block);
        Ok(())
    }

    /// Resize within the capacity secured by a previous [`Buffer::reserve`]. Never allocates.
    pub(crate) fn resize_reserved(&mut self, len: usize) {
        match Arc::get_mut(&mut self.block) {
            Some(block) => {
                debug_assert!(block.capacity() >= len, "resize past the reserved capacity");
                let resized = block.with_vec(|vec| vec.resize(len, T::zero()));
                debug_assert!(resized.is_some(), "resize of a block that was not reserved");
            }
            None => debug_assert!(false, "resize of a shared block that was not reserved"),
        }
    }

    /// Install caller supplied memory holding `len` initialized values.
    ///
    /// The previous block is released with its own policy. `policy` is applied to `ptr` once
    /// this buffer (and every handle sharing the block) lets go of it.
    ///
    /// # Safety
    ///
    /// `ptr` must be valid for reads and writes of `len` values of `T` until it is released,
    /// must not be accessed through other pointers while the buffer uses it, and must satisfy
    /// the allocation requirements of `policy` (see [`ReleasePolicy`]).
    pub unsafe fn set_external(&mut self, ptr: NonNull<T>, len: usize, policy: ReleasePolicy<T>) {
        self.replace(Block::new(ptr, len, Origin::External(policy)));
    }

    /// replace the contents with the values of a `Vec`
    pub fn set_vec(&mut self, values: Vec<T>) {
        self.replace(Block::from_vec(values));
    }

    /// drop the current block and become empty
    pub fn release(&mut self) {
        self.replace(Block::empty());
    }

    /// A second handle to the same memory, copied on the first write through either one.
    ///
    /// An aliased block is never shared copy on write; it is copied right away.
    pub fn share(&self) -> Self {
        if self.block.is_aliased() {
            return self.clone();
        }

        Self {
            block: Arc::clone(&self.block),
        }
    }

    /// A second handle writing in place into the same memory.
    ///
    /// When the block is shared copy on write with other handles, this handle first moves onto
    /// a private copy, so only handles created by `alias` ever see each other's writes. A
    /// reallocation detaches the reallocated handle onto a fresh block.
    ///
    /// # Safety
    ///
    /// For as long as two handles of the block are alive, no handle may be written while a
    /// slice or value borrowed from another handle is in use, and handles on different threads
    /// must not be accessed concurrently when any of them writes.
    pub unsafe fn alias(&mut self) -> Self {
        self.make_unique();
        self.block.aliased.store(true, Ordering::Release);

        Self {
            block: Arc::clone(&self.block),
        }
    }

    fn replace(&mut self, block: Block<T>) {
        // dropping the old Arc releases the old block with its own policy
        self.block = Arc::new(block);
    }
}

impl<T: Scalar> Default for Buffer<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// A deep copy, use [`Buffer::share`] to alias
impl<T: Scalar> Clone for Buffer<T> {
    fn clone(&self) -> Self {
        Self::from_vec(self.as_slice().to_vec())
    }
}

impl<T: Scalar> fmt::Debug for Buffer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Buffer")
            .field("len", &self.len())
            .field("owned", &self.is_owned())
            .field("shared", &self.is_shared())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_policy(calls: &Arc<AtomicUsize>, expected: usize) -> ReleasePolicy<f64> {
        let calls = Arc::clone(calls);
        ReleasePolicy::custom(move |ptr: NonNull<f64>, len| {
            assert_eq!(ptr.as_ptr() as usize, expected);
            calls.fetch_add(1, Ordering::SeqCst);
            // the memory came from a leaked Vec in the test
            drop(unsafe { Vec::from_raw_parts(ptr.as_ptr(), len, len) });
        })
    }

    fn leaked(values: Vec<f64>) -> (NonNull<f64>, usize) {
        let mut values = ManuallyDrop::new(values.into_boxed_slice().into_vec());
        let len = values.len();
        (NonNull::new(values.as_mut_ptr()).unwrap(), len)
    }

    #[test]
    fn allocate_discards_and_zero_fills() {
        let mut buffer = Buffer::from_vec(vec![1_i32, 2, 3]);
        buffer.allocate(5).unwrap();
        assert_eq!(buffer.as_slice(), &[0, 0, 0, 0, 0]);

        buffer.allocate(0).unwrap();
        assert!(buffer.is_empty());
    }

    #[test]
    fn reallocate_preserves_prefix() {
        let mut buffer = Buffer::from_vec(vec![1_u16, 2, 3, 4]);
        buffer.reallocate(6).unwrap();
        assert_eq!(buffer.as_slice(), &[1, 2, 3, 4, 0, 0]);

        buffer.reallocate(2).unwrap();
        assert_eq!(buffer.as_slice(), &[1, 2]);
    }

    #[test]
    fn absurd_allocation_fails_and_leaves_buffer_alone() {
        let mut buffer = Buffer::from_vec(vec![1_u64, 2]);
        assert!(buffer.allocate(usize::MAX / 4).is_err());
        assert!(buffer.reallocate(usize::MAX / 4).is_err());
        assert_eq!(buffer.as_slice(), &[1, 2]);
    }

    #[test]
    fn custom_release_runs_once_on_drop() {
        let calls = Arc::new(AtomicUsize::new(0));
        let (ptr, len) = leaked(vec![1.0, 2.0, 3.0]);

        let mut buffer = Buffer::new();
        unsafe { buffer.set_external(ptr, len, counting_policy(&calls, ptr.as_ptr() as usize)) };
        assert_eq!(buffer.as_slice(), &[1.0, 2.0, 3.0]);
        assert!(!buffer.is_owned());

        let shared = buffer.share();
        drop(buffer);
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        drop(shared);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn replacing_uses_the_previous_policy() {
        let calls = Arc::new(AtomicUsize::new(0));
        let (ptr, len) = leaked(vec![4.0, 5.0]);

        let mut buffer = Buffer::new();
        unsafe { buffer.set_external(ptr, len, counting_policy(&calls, ptr.as_ptr() as usize)) };

        // the new block is never released with the old callback, and vice versa
        let mut caller_owned = vec![7.0, 8.0, 9.0];
        let raw = NonNull::new(caller_owned.as_mut_ptr()).unwrap();
        unsafe { buffer.set_external(raw, 3, ReleasePolicy::None) };
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        buffer.set_vec(vec![1.0]);
        drop(buffer);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        // untouched by the buffer
        assert_eq!(caller_owned, vec![7.0, 8.0, 9.0]);
    }

    #[test]
    fn reallocating_external_memory_copies_then_releases() {
        let calls = Arc::new(AtomicUsize::new(0));
        let (ptr, len) = leaked(vec![1.0, 2.0]);

        let mut buffer = Buffer::new();
        unsafe { buffer.set_external(ptr, len, counting_policy(&calls, ptr.as_ptr() as usize)) };
        buffer.reallocate(4).unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(buffer.is_owned());
        assert_eq!(buffer.as_slice(), &[1.0, 2.0, 0.0, 0.0]);
    }

    #[test]
    fn delete_and_free_policies() {
        let boxed: Box<[f32]> = vec![1.0, 2.0].into_boxed_slice();
        let len = boxed.len();
        let ptr = NonNull::new(Box::into_raw(boxed) as *mut f32).unwrap();
        let mut buffer = Buffer::new();
        unsafe { buffer.set_external(ptr, len, ReleasePolicy::Delete) };
        assert_eq!(buffer.get(1), 2.0);
        buffer.release();

        let layout = Layout::array::<f32>(3).unwrap();
        let raw = unsafe { alloc::alloc_zeroed(layout) } as *mut f32;
        let ptr = NonNull::new(raw).unwrap();
        unsafe { buffer.set_external(ptr, 3, ReleasePolicy::Free) };
        buffer.set(2, 5.0);
        assert_eq!(buffer.as_slice(), &[0.0, 0.0, 5.0]);

        let layout = Layout::from_size_align(4 * 4, 64).unwrap();
        let raw = unsafe { alloc::alloc_zeroed(layout) } as *mut f32;
        let ptr = NonNull::new(raw).unwrap();
        unsafe { buffer.set_external(ptr, 4, ReleasePolicy::AlignedFree { align: 64 }) };
        assert_eq!(buffer.as_ptr() as usize % 64, 0);
        drop(buffer);
    }

    #[test]
    fn shared_handles_copy_on_write() {
        let mut first = Buffer::from_vec(vec![1_i8, 2, 3]);
        let second = first.share();
        assert!(first.is_shared());
        assert_eq!(first.as_ptr(), second.as_ptr());

        let view = second.as_slice();
        first.set(0, 10);
        assert_eq!(view, &[1, 2, 3]);
        assert_eq!(first.as_slice(), &[10, 2, 3]);
        assert!(!first.is_shared());
        assert!(!second.is_shared());
    }

    #[test]
    fn aliased_handles_write_in_place() {
        let mut first = Buffer::from_vec(vec![1_i8, 2, 3]);
        let snapshot = first.share();
        let mut second = unsafe { first.alias() };
        assert!(second.is_aliased());
        assert_eq!(first.generation(), 0);

        first.set(0, 10);
        assert_eq!(second.get(0), 10);
        assert_eq!(second.generation(), 1);
        second.set(1, 20);
        assert_eq!(first.as_slice(), &[10, 20, 3]);

        // the copy on write handle never sees the aliased writes
        assert_eq!(snapshot.as_slice(), &[1, 2, 3]);
        assert!(!snapshot.is_aliased());

        // sharing an aliased block copies it
        let copy = first.share();
        assert_ne!(copy.as_ptr(), first.as_ptr());

        first.reallocate(4).unwrap();
        first.set(2, 30);
        assert_eq!(second.as_slice(), &[10, 20, 3]);
    }

    #[test]
    fn clone_is_deep() {
        let mut first = Buffer::from_vec(vec![1_u32, 2]);
        let second = first.clone();
        first.set(0, 9);
        assert_eq!(second.as_slice(), &[1, 2]);
    }
}
