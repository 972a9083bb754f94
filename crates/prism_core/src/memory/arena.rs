//! # Arena Allocator
//!
//! A write-once arena of values addressed by typed indices.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

use thiserror::Error;

/// Errors from arena slot management.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ArenaError {
    /// The handle does not belong to this arena.
    #[error("unknown arena handle {0}")]
    UnknownHandle(usize),

    /// The slot was already defined; slots are write-once.
    #[error("arena slot {0} is already defined")]
    AlreadyDefined(usize),
}

/// Typed index into an [`Arena`].
///
/// Handles are plain integers: copying, hashing and comparing them is free.
pub struct Handle<T> {
    index: u32,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Handle<T> {
    /// Builds a handle from a raw index.
    ///
    /// Nothing guarantees that the index exists in any particular arena;
    /// lookups with a foreign handle return `None`.
    #[must_use]
    pub const fn from_raw(index: u32) -> Self {
        Self {
            index,
            _marker: PhantomData,
        }
    }

    /// Position of the slot inside its arena.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.index as usize
    }
}

impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Handle<T> {}

impl<T> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
    }
}

impl<T> Eq for Handle<T> {}

impl<T> PartialOrd for Handle<T> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Handle<T> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.index.cmp(&other.index)
    }
}

impl<T> Hash for Handle<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.index.hash(state);
    }
}

impl<T> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.index)
    }
}

impl<T> fmt::Display for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.index)
    }
}

/// A slot is either reserved (handle handed out, value pending) or defined.
enum Slot<T> {
    Reserved,
    Defined(T),
}

/// A write-once arena.
///
/// Values are appended and never moved, mutated or removed. A slot can be
/// [`reserve`](Arena::reserve)d before its value exists, which lets callers
/// build forward references and close them later with
/// [`define`](Arena::define).
///
/// # Example
///
/// ```rust,ignore
/// let mut arena = Arena::new();
/// let later = arena.reserve();
/// let first = arena.insert("depends on later");
/// arena.define(later, "defined last")?;
/// ```
pub struct Arena<T> {
    slots: Vec<Slot<T>>,
}

impl<T> Arena<T> {
    /// Creates an empty arena.
    #[must_use]
    pub const fn new() -> Self {
        Self { slots: Vec::new() }
    }

    /// Creates an empty arena with room for `capacity` slots.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
        }
    }

    /// Number of slots, reserved or defined.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the arena holds no slots at all.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Appends a value and returns its handle.
    pub fn insert(&mut self, value: T) -> Handle<T> {
        let handle = self.next_handle();
        self.slots.push(Slot::Defined(value));
        handle
    }

    /// Hands out a handle whose value will be provided later.
    pub fn reserve(&mut self) -> Handle<T> {
        let handle = self.next_handle();
        self.slots.push(Slot::Reserved);
        handle
    }

    /// Fills a reserved slot.
    ///
    /// # Errors
    ///
    /// [`ArenaError::UnknownHandle`] if the handle is out of range,
    /// [`ArenaError::AlreadyDefined`] if the slot already holds a value.
    pub fn define(&mut self, handle: Handle<T>, value: T) -> Result<(), ArenaError> {
        let slot = self
            .slots
            .get_mut(handle.index())
            .ok_or(ArenaError::UnknownHandle(handle.index()))?;

        match slot {
            Slot::Reserved => {
                *slot = Slot::Defined(value);
                Ok(())
            }
            Slot::Defined(_) => Err(ArenaError::AlreadyDefined(handle.index())),
        }
    }

    /// Returns the value behind a handle, if the slot exists and is defined.
    #[inline]
    #[must_use]
    pub fn get(&self, handle: Handle<T>) -> Option<&T> {
        match self.slots.get(handle.index())? {
            Slot::Defined(value) => Some(value),
            Slot::Reserved => None,
        }
    }

    /// Whether the handle addresses a slot of this arena.
    #[inline]
    #[must_use]
    pub fn contains(&self, handle: Handle<T>) -> bool {
        handle.index() < self.slots.len()
    }

    /// Whether the slot exists and holds a value.
    #[inline]
    #[must_use]
    pub fn is_defined(&self, handle: Handle<T>) -> bool {
        self.get(handle).is_some()
    }

    /// Number of slots still waiting for a value.
    #[must_use]
    pub fn reserved_count(&self) -> usize {
        self.slots
            .iter()
            .filter(|slot| matches!(slot, Slot::Reserved))
            .count()
    }

    /// Iterates over defined values in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (Handle<T>, &T)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| match slot {
                Slot::Defined(value) => Some((Handle::from_raw(index as u32), value)),
                Slot::Reserved => None,
            })
    }

    fn next_handle(&self) -> Handle<T> {
        let index = u32::try_from(self.slots.len()).unwrap_or(u32::MAX);
        Handle::from_raw(index)
    }
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: fmt::Debug> fmt::Debug for Arena<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}
