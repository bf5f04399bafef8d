//! Lazy, invalidatable memoization cells.

use std::sync::Mutex;

/// A thread-safe, invalidatable memoization cell.
///
/// [`get`](LazyCache::get) returns the cached value, computing it with the
/// supplied derivation on first access or on any access after
/// [`invalidate`](LazyCache::invalidate). The cell lock is held across the
/// derivation, so the derivation runs at most once per generation and
/// every concurrent caller observes the one consistent result. Derivations
/// are expected to be fast pure computations over in-memory data.
///
/// A failed derivation propagates to the caller and leaves the cell empty:
/// the next access retries rather than observing a poisoned state.
///
/// # Examples
///
/// ```
/// use precedence::LazyCache;
///
/// let cache: LazyCache<u64> = LazyCache::new();
/// let value = cache.get(|| Ok::<_, std::convert::Infallible>(42)).unwrap();
/// assert_eq!(value, 42);
///
/// cache.invalidate();
/// let value = cache.get(|| Ok::<_, std::convert::Infallible>(7)).unwrap();
/// assert_eq!(value, 7);
/// ```
#[derive(Debug, Default)]
pub struct LazyCache<T> {
    slot: Mutex<Slot<T>>,
}

#[derive(Debug)]
struct Slot<T> {
    value: Option<T>,
    generation: u64,
}

impl<T> Default for Slot<T> {
    fn default() -> Self {
        Self {
            value: None,
            generation: 0,
        }
    }
}

impl<T: Clone> LazyCache<T> {
    /// Creates an empty cell.
    #[must_use]
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(Slot::default()),
        }
    }

    /// Returns the cached value, deriving it if the cell is empty.
    ///
    /// # Errors
    ///
    /// Propagates the derivation's error unchanged; the cell stays empty
    /// so a later call retries.
    pub fn get<E>(&self, derive: impl FnOnce() -> Result<T, E>) -> Result<T, E> {
        let mut slot = self.lock();
        if let Some(value) = &slot.value {
            return Ok(value.clone());
        }

        let value = derive()?;
        slot.value = Some(value.clone());
        Ok(value)
    }

    /// Returns the cached value without deriving, if populated.
    #[must_use]
    pub fn peek(&self) -> Option<T> {
        self.lock().value.clone()
    }

    /// Clears the cell and advances its generation.
    ///
    /// Safe to call concurrently with [`get`](LazyCache::get): after this
    /// returns, the next access recomputes. An access already holding the
    /// cell lock completes with the old generation's result first.
    pub fn invalidate(&self) {
        let mut slot = self.lock();
        slot.value = None;
        slot.generation += 1;
    }

    /// The current generation, advanced once per invalidation.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.lock().generation
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Slot<T>> {
        // A panicking derivation never writes a value (the write happens
        // after it returns), so a poisoned lock still guards a coherent
        // slot and the cell can keep serving.
        match self.slot.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
