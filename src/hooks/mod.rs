//! Memoized worklet hook.
//!
//! The host UI framework's memoization primitive is modelled by
//! [`MemoCache`]; [`MemoSlot`] is a single-value implementation suitable for
//! one hook call site. [`use_worklet`] combines a cache with a
//! [`ContextSelector`](crate::worklet::ContextSelector).

pub mod deps;
pub mod memo;
mod use_worklet;

pub use deps::{Dependency, DependencyList};
pub use memo::{MemoCache, MemoSlot};
pub use use_worklet::use_worklet;
