//! Per-thread generator streams
//!
//! Every thread lazily receives its own [`MersenneTwister64`], keyed by the
//! process-wide registry seed and a stream index handed out from an atomic
//! counter. Threads never share a generator, so drawing requires no locks
//! beyond a read of the registry seed on first use.

use std::cell::RefCell;
use std::sync::atomic::{AtomicU32, Ordering};

use parking_lot::RwLock;
use tracing::debug;

use crate::mt::{MersenneTwister64, Seed};

static REGISTRY_SEED: RwLock<Seed> = RwLock::new(Seed::DEFAULT);
static NEXT_STREAM: AtomicU32 = AtomicU32::new(0);

thread_local! {
    static THREAD_RNG: RefCell<Option<Box<MersenneTwister64>>> = const { RefCell::new(None) };
}

/// Puts a borrowed-out generator back into the thread slot, also on unwind.
struct Restore(Option<Box<MersenneTwister64>>);

impl Drop for Restore {
    fn drop(&mut self) {
        if let Some(rng) = self.0.take() {
            // Fails only while the thread-local is being torn down.
            let _ = THREAD_RNG.try_with(|cell| *cell.borrow_mut() = Some(rng));
        }
    }
}

fn new_thread_generator() -> Box<MersenneTwister64> {
    let stream = NEXT_STREAM.fetch_add(1, Ordering::Relaxed);
    let seed = registry_seed();
    debug!(stream, "thread generator created");
    Box::new(MersenneTwister64::new(seed, stream))
}

/// The seed new thread streams are derived from.
#[must_use]
pub fn registry_seed() -> Seed {
    *REGISTRY_SEED.read()
}

/// Replace the registry seed.
///
/// Threads that already hold a generator keep it; only streams created after
/// the call use the new seed. Call [`reseed_thread_rng`] to re-key the
/// current thread explicitly.
pub fn set_registry_seed(seed: Seed) {
    *REGISTRY_SEED.write() = seed;
    debug!(?seed, "registry seed replaced");
}

/// Run `f` with the calling thread's generator, creating it on first use.
///
/// The generator is moved out of the thread slot while `f` runs, so `f` may
/// itself call `with_thread_rng`. Such a nested call draws from a generator
/// on a fresh stream; when `f` returns, the outer generator is put back and
/// any generator installed meanwhile, by a nested call or by
/// [`reseed_thread_rng`], is discarded.
pub fn with_thread_rng<R>(f: impl FnOnce(&mut MersenneTwister64) -> R) -> R {
    let rng = THREAD_RNG
        .with(|cell| cell.borrow_mut().take())
        .unwrap_or_else(new_thread_generator);
    let mut guard = Restore(None);
    f(guard.0.insert(rng))
}

/// Re-key the calling thread's generator with an explicit seed and stream.
///
/// After this call the thread's draws are fully reproducible: the same seed
/// and stream always yield the same sequence.
pub fn reseed_thread_rng(seed: Seed, stream: u32) {
    THREAD_RNG.with(|cell| {
        let mut slot = cell.borrow_mut();
        match slot.as_mut() {
            Some(rng) => rng.reseed(seed, stream),
            None => *slot = Some(Box::new(MersenneTwister64::new(seed, stream))),
        }
    });
    debug!(stream, "thread generator reseeded");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_reseed_is_reproducible() {
        let seed = Seed::new([9, 8, 7, 6]);
        reseed_thread_rng(seed, 4);
        let a: Vec<u64> = (0..16).map(|_| with_thread_rng(|r| r.random_integer64())).collect();
        reseed_thread_rng(seed, 4);
        let b: Vec<u64> = (0..16).map(|_| with_thread_rng(|r| r.random_integer64())).collect();
        assert_eq!(a, b);

        let mut direct = MersenneTwister64::new(seed, 4);
        let c: Vec<u64> = (0..16).map(|_| direct.random_integer64()).collect();
        assert_eq!(a, c);
    }

    #[test]
    fn test_nested_use_does_not_disturb_outer_stream() {
        let seed = Seed::new([1, 1, 2, 3]);
        reseed_thread_rng(seed, 9);
        let outer = with_thread_rng(|r| {
            let first = r.random_integer64();
            with_thread_rng(|nested| nested.random_integer64());
            vec![first, r.random_integer64()]
        });
        assert_eq!(with_thread_rng(|r| r.stream()), 9);

        let mut direct = MersenneTwister64::new(seed, 9);
        assert_eq!(outer, vec![direct.random_integer64(), direct.random_integer64()]);
        assert_eq!(with_thread_rng(|r| r.random_integer64()), direct.random_integer64());
    }

    #[test]
    fn test_threads_get_distinct_streams() {
        let handles: Vec<_> = (0..4)
            .map(|_| thread::spawn(|| with_thread_rng(|r| r.stream())))
            .collect();
        let mut streams: Vec<u32> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        streams.sort_unstable();
        streams.dedup();
        assert_eq!(streams.len(), 4);
    }
}
