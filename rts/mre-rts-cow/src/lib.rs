//! Copy-on-write payloads for the MRE runtime.
//!
//! Tuples, sets and matrices share an immutable payload through an atomic
//! reference count. A handle that needs to mutate first checks whether it is
//! the only owner; if it is not, it detaches by deep-copying the payload and
//! then mutates its private copy. Other handles never observe the change.
//!
//! # Overview
//!
//! - [`Shared`] - the reference-counted handle with copy-on-write mutation
//! - [`Generation`] - process-wide mutation stamp used to detect stale cursors
//! - [`Alignment`] / [`padded_len`] - SIMD-friendly column strides for dense
//!   coefficient stores
//!
//! # Memory ordering
//!
//! Reference counts are maintained by [`std::sync::Arc`], which uses
//! release decrements paired with an acquire fence before the final drop.
//! Detaching happens through [`Arc::make_mut`], which only mutates in place
//! after proving the strong count is one and no weak handles exist.

#![warn(missing_docs)]
#![deny(unsafe_code)]

mod stride;

pub use stride::{padded_len, Alignment};

use std::fmt;
use std::ops::Deref;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tracing::trace;

/// Source of generations; zero is never handed out.
static NEXT_GENERATION: AtomicU64 = AtomicU64::new(1);

/// Mutation stamp carried by every [`Shared`] handle.
///
/// Stamps are drawn from a process-wide counter, so no two payload states
/// share one: a new handle and every mutation get a fresh stamp, while clones
/// inherit the stamp of the state they alias. Cursors capture the stamp of
/// the handle they were created from and compare it before each access; a
/// mismatch means the container was mutated or replaced since.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(u64);

impl Generation {
    /// Raw stamp value.
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }

    fn fresh() -> Self {
        Self(NEXT_GENERATION.fetch_add(1, Ordering::Relaxed))
    }
}

/// A copy-on-write handle over a reference-counted payload.
///
/// Cloning a `Shared` is O(1) and only bumps the reference count. Mutation
/// goes through [`Shared::make_mut`], which detaches the payload first when
/// it is aliased.
pub struct Shared<T> {
    payload: Arc<T>,
    generation: Generation,
}

impl<T> Shared<T> {
    /// Wrap a payload in a fresh, uniquely owned handle.
    #[must_use]
    pub fn new(payload: T) -> Self {
        Self {
            payload: Arc::new(payload),
            generation: Generation::fresh(),
        }
    }

    /// Number of handles currently sharing the payload.
    #[must_use]
    pub fn strong_count(this: &Self) -> usize {
        Arc::strong_count(&this.payload)
    }

    /// True if both handles share the same payload allocation.
    #[must_use]
    pub fn ptr_eq(this: &Self, other: &Self) -> bool {
        Arc::ptr_eq(&this.payload, &other.payload)
    }

    /// True if this handle is the only owner of its payload.
    #[must_use]
    pub fn is_unique(this: &Self) -> bool {
        Arc::strong_count(&this.payload) == 1 && Arc::weak_count(&this.payload) == 0
    }

    /// The mutation generation of this handle.
    #[must_use]
    pub fn generation(this: &Self) -> Generation {
        this.generation
    }

    /// Borrow the payload.
    #[must_use]
    pub fn get(&self) -> &T {
        &self.payload
    }
}

impl<T: Clone> Shared<T> {
    /// Obtain mutable access to the payload, detaching it first if shared.
    ///
    /// The handle receives a fresh generation on every call, so any cursor
    /// created before the call reports itself stale afterwards.
    pub fn make_mut(this: &mut Self) -> &mut T {
        if !Self::is_unique(this) {
            trace!(
                strong = Arc::strong_count(&this.payload),
                "detaching shared payload before mutation"
            );
        }
        this.generation = Generation::fresh();
        Arc::make_mut(&mut this.payload)
    }

    /// Take the payload out, cloning only if it is still shared.
    #[must_use]
    pub fn into_inner(this: Self) -> T {
        Arc::try_unwrap(this.payload).unwrap_or_else(|shared| (*shared).clone())
    }
}

impl<T> Clone for Shared<T> {
    fn clone(&self) -> Self {
        Self {
            payload: Arc::clone(&self.payload),
            generation: self.generation,
        }
    }
}

impl<T> Deref for Shared<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.payload
    }
}

impl<T: Default> Default for Shared<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: fmt::Debug> fmt::Debug for Shared<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.payload, f)
    }
}

impl<T> From<T> for Shared<T> {
    fn from(payload: T) -> Self {
        Self::new(payload)
    }
}
