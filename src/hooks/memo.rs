//! Memoization keyed by dependency lists.

use tracing::{trace, warn};

use super::deps::DependencyList;

/// A cache that recomputes its value only when the dependencies change.
pub trait MemoCache<T> {
    /// Returns the cached value if `deps` equals the stored list, otherwise
    /// calls `create`, stores the result under `deps` and returns it.
    fn memoize<F>(&mut self, deps: DependencyList, create: F) -> T
    where
        F: FnOnce() -> T;
}

/// A single memoized value, as held by one hook call site.
#[derive(Debug)]
pub struct MemoSlot<T> {
    entry: Option<(DependencyList, T)>,
    computations: u64,
}

impl<T> MemoSlot<T> {
    /// An empty slot; the first `memoize` always computes.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entry: None,
            computations: 0,
        }
    }

    /// Number of times the value has been (re)created.
    #[must_use]
    pub const fn computations(&self) -> u64 {
        self.computations
    }

    /// The current value, if one has been computed.
    pub fn current(&self) -> Option<&T> {
        self.entry.as_ref().map(|(_, value)| value)
    }
}

impl<T> Default for MemoSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> MemoCache<T> for MemoSlot<T> {
    fn memoize<F>(&mut self, deps: DependencyList, create: F) -> T
    where
        F: FnOnce() -> T,
    {
        if let Some((previous, value)) = &self.entry {
            if *previous == deps {
                return value.clone();
            }
            if previous.len() != deps.len() {
                warn!(
                    previous = previous.len(),
                    current = deps.len(),
                    "dependency list changed size between renders"
                );
            }
        }

        let value = create();
        self.computations += 1;
        trace!(computations = self.computations, "memoized value recomputed");
        self.entry = Some((deps, value.clone()));
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::deps;

    #[test]
    fn computes_once_for_stable_deps() {
        let mut slot = MemoSlot::new();
        assert_eq!(slot.memoize(deps![1], || 10), 10);
        assert_eq!(slot.memoize(deps![1], || 20), 10);
        assert_eq!(slot.computations(), 1);
        assert_eq!(slot.current(), Some(&10));
    }

    #[test]
    fn recomputes_when_a_dependency_changes() {
        let mut slot = MemoSlot::new();
        slot.memoize(deps![1, "a"], || 1);
        assert_eq!(slot.memoize(deps![1, "b"], || 2), 2);
        assert_eq!(slot.memoize(deps![1, "b"], || 3), 2);
        assert_eq!(slot.computations(), 2);
    }

    #[test]
    fn empty_deps_never_recompute() {
        let mut slot = MemoSlot::new();
        slot.memoize(deps![], || "first");
        assert_eq!(slot.memoize(deps![], || "second"), "first");
    }

    #[test]
    fn size_change_recomputes() {
        let mut slot = MemoSlot::new();
        slot.memoize(deps![1], || 1);
        assert_eq!(slot.memoize(deps![1, 2], || 2), 2);
    }
}
