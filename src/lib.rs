//! # worklets
//!
//! Two small, independent utilities for async Rust code:
//!
//! - **Expectation helpers** ([`expect`], [`expect_value`],
//!   [`expect_exception`]) resolve an immediate or deferred input and produce
//!   a future that completes with `Ok(())` or a displayable
//!   [`ExpectationError`].
//! - **Worklets** ([`use_worklet`]) memoize a callback bound to a worker
//!   context. Calling the returned [`RunAsync`] dispatches the callback to
//!   the context and yields a [`WorkletFuture`] for its result.
//!
//! ## Usage
//!
//! ```rust
//! use worklets::{deps, expect_value, use_worklet, ContextSelector, Deferred, MemoSlot};
//!
//! # futures::executor::block_on(async {
//! let mut slot = MemoSlot::new();
//! let square = use_worklet(&mut slot, ContextSelector::Default, |x: u64| x * x, deps![]);
//!
//! let result = square.call(12).await.unwrap();
//! expect_value(Deferred::Ready(result), &144).await.unwrap();
//! # });
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod expect;
pub mod hooks;
pub mod worklet;

// Re-export primary types at crate root for convenience
pub use error::{ExpectationError, Failure, WorkletError};
pub use expect::{expect, expect_exception, expect_value, Attempt, Deferred};
pub use hooks::{use_worklet, Dependency, DependencyList, MemoCache, MemoSlot};
pub use worklet::{
	current_context_name, ContextId, ContextSelector, RunAsync, WorkerContext, WorkerContextExt,
	WorkletContext, WorkletContextConfig, WorkletFuture,
};
