//! Once-per-key construction cache shared by concurrent queries

use std::hash::Hash;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use hashbrown::HashMap;
use log::trace;

type Slot<V> = Arc<Mutex<Option<Arc<V>>>>;

/// Memo of expensive, immutable values keyed by `K`.
///
/// The map lock is held only long enough to fetch or create the per-key
/// slot; the slot lock is held for the whole construction, so concurrent
/// first users of one key block until the single build finishes while other
/// keys proceed independently. Failed builds leave the slot empty.
#[derive(Debug)]
pub struct Memo<K, V> {
    slots: Mutex<HashMap<K, Slot<V>>>,
    builds: AtomicUsize,
}

impl<K, V> Default for Memo<K, V> {
    fn default() -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
            builds: AtomicUsize::new(0),
        }
    }
}

impl<K: Eq + Hash + Clone + std::fmt::Debug, V> Memo<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, key: &K) -> Slot<V> {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots.entry(key.clone()).or_default().clone()
    }

    /// Cached value for `key`, building it with `build` if absent.
    ///
    /// # Errors
    ///
    /// Propagates the error returned by `build`; nothing is cached then.
    pub fn get_or_try_build<E, F>(&self, key: &K, build: F) -> Result<Arc<V>, E>
    where
        F: FnOnce() -> Result<V, E>,
    {
        let slot = self.slot(key);
        let mut value = slot.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(existing) = value.as_ref() {
            trace!("Memo hit for {key:?}");
            return Ok(Arc::clone(existing));
        }

        trace!("Memo miss for {key:?}, building");
        let built = Arc::new(build()?);
        self.builds.fetch_add(1, Ordering::Relaxed);
        *value = Some(Arc::clone(&built));
        Ok(built)
    }

    /// Number of successful constructions so far
    pub fn builds(&self) -> usize {
        self.builds.load(Ordering::Relaxed)
    }

    #[cfg(test)]
    fn contains(&self, key: &K) -> bool {
        let slot = {
            let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            match slots.get(key) {
                Some(slot) => Arc::clone(slot),
                None => return false,
            }
        };
        slot.lock().unwrap_or_else(PoisonError::into_inner).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Barrier;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn builds_once_per_key() {
        let memo: Memo<&str, usize> = Memo::new();

        let a = memo.get_or_try_build(&"a", || Ok::<_, ()>(1)).unwrap();
        let again = memo.get_or_try_build(&"a", || Ok::<_, ()>(99)).unwrap();
        let b = memo.get_or_try_build(&"b", || Ok::<_, ()>(2)).unwrap();

        assert_eq!((*a, *again, *b), (1, 1, 2));
        assert_eq!(memo.builds(), 2);
        assert!(memo.contains(&"a"));
        assert!(!memo.contains(&"c"));
    }

    #[test]
    fn failures_are_not_cached() {
        let memo: Memo<u8, u8> = Memo::new();

        assert!(memo.get_or_try_build(&1, || Err("boom")).is_err());
        assert!(!memo.contains(&1));
        assert_eq!(*memo.get_or_try_build(&1, || Ok::<_, &str>(7)).unwrap(), 7);
        assert_eq!(memo.builds(), 1);
    }

    #[test]
    fn concurrent_first_use_builds_once() {
        let memo: Arc<Memo<u8, u64>> = Arc::new(Memo::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let barrier = Arc::new(Barrier::new(8));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let memo = Arc::clone(&memo);
                let calls = Arc::clone(&calls);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    memo.get_or_try_build(&0, || {
                        calls.fetch_add(1, Ordering::SeqCst);
                        thread::sleep(Duration::from_millis(20));
                        Ok::<_, ()>(42)
                    })
                    .unwrap()
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(*handle.join().unwrap(), 42);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(memo.builds(), 1);
    }
}
