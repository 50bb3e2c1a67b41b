//! Reusable scratch objects for the write path.
//!
//! Every [`Logger::write`](crate::logger::Logger::write) needs one byte
//! buffer and one [`FieldList`]. Rather than allocating both per call, they
//! are checked out of a [`ScratchPool`] and handed back when the guard drops.
//!
//! # Design
//!
//! Each pool is a stack behind a [`Mutex`]: items are pushed on release and
//! popped on checkout, so recently-used (warm) items are reused first. The
//! lock is held only for the push or pop. A popped item belongs to exactly
//! one [`Pooled`] guard until that guard drops, so two checkouts never share
//! an item.
//!
//! Pools are unbounded. They grow to the peak number of concurrent writers
//! and keep those items for as long as the pool lives.

use std::mem;
use std::ops::{Deref, DerefMut};
use std::sync::{Arc, LazyLock, Mutex, PoisonError};

use crate::fields::FieldList;

/// Initial capacity of a fresh line buffer.
pub const BUFFER_CAPACITY: usize = 1024;

/// Initial capacity of a fresh scratch field list.
pub const FIELDS_CAPACITY: usize = 16;

static SHARED: LazyLock<Arc<ScratchPool>> = LazyLock::new(|| Arc::new(ScratchPool::new()));

/// An object that can be reset to empty and reused.
///
/// `Default` must not allocate; it fills the guard's slot after the item
/// has been handed back.
pub trait Scratch: Default + Send {
    /// A newly allocated item, used when the pool is empty.
    fn fresh() -> Self;

    /// Empty the item while keeping its allocation.
    fn reset(&mut self);
}

impl Scratch for Vec<u8> {
    fn fresh() -> Self {
        Vec::with_capacity(BUFFER_CAPACITY)
    }

    fn reset(&mut self) {
        self.clear();
    }
}

impl Scratch for FieldList {
    fn fresh() -> Self {
        FieldList::with_capacity(FIELDS_CAPACITY)
    }

    fn reset(&mut self) {
        FieldList::reset(self);
    }
}

/// A thread-safe free list of scratch items.
#[derive(Debug)]
pub struct Pool<T> {
    free: Mutex<Vec<T>>,
}

impl<T: Scratch> Pool<T> {
    pub fn new() -> Self {
        Pool {
            free: Mutex::new(Vec::new()),
        }
    }

    /// Take an empty item from the pool, allocating one if none is free.
    pub fn checkout(&self) -> Pooled<'_, T> {
        let item = self
            .free
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop();

        let mut item = item.unwrap_or_else(T::fresh);
        item.reset();

        Pooled { item, pool: self }
    }

    fn release(&self, mut item: T) {
        item.reset();
        self.free
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(item);
    }

    /// Number of items currently waiting in the pool.
    pub fn available(&self) -> usize {
        self.free
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl<T: Scratch> Default for Pool<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// RAII guard over a checked-out item; returns it to the pool on drop.
#[derive(Debug)]
pub struct Pooled<'a, T: Scratch> {
    item: T,
    pool: &'a Pool<T>,
}

impl<T: Scratch> Deref for Pooled<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.item
    }
}

impl<T: Scratch> DerefMut for Pooled<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.item
    }
}

impl<T: Scratch> Drop for Pooled<'_, T> {
    fn drop(&mut self) {
        let item = mem::take(&mut self.item);
        self.pool.release(item);
    }
}

/// The two pools used by the write path.
///
/// Loggers hold an `Arc<ScratchPool>`; loggers derived from one another
/// share it. [`ScratchPool::shared`] is the default for new loggers.
#[derive(Debug, Default)]
pub struct ScratchPool {
    buffers: Pool<Vec<u8>>,
    fields: Pool<FieldList>,
}

impl ScratchPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide pool used unless another one is injected.
    pub fn shared() -> Arc<ScratchPool> {
        Arc::clone(&SHARED)
    }

    pub fn buffer(&self) -> Pooled<'_, Vec<u8>> {
        self.buffers.checkout()
    }

    pub fn fields(&self) -> Pooled<'_, FieldList> {
        self.fields.checkout()
    }

    pub fn buffers_available(&self) -> usize {
        self.buffers.available()
    }

    pub fn fields_available(&self) -> usize {
        self.fields.available()
    }
}
