use crate::worklet::{ContextSelector, RunAsync};

use super::deps::DependencyList;
use super::memo::MemoCache;

/// Creates a worklet function that persists across renders.
///
/// The returned [`RunAsync`] runs `callback` on the selected context and can
/// be called from any thread. It is rebuilt only when `deps` differs from the
/// list passed on the previous call with the same `cache`; otherwise the
/// previous wrapper (and the callback it captured) is returned unchanged.
///
/// ```
/// use worklets::{deps, use_worklet, ContextSelector, MemoSlot};
///
/// # futures::executor::block_on(async {
/// let mut slot = MemoSlot::new();
/// let say_hello = use_worklet(
///     &mut slot,
///     ContextSelector::Default,
///     |name: String| format!("Hello {name}, I am running on a worklet thread!"),
///     deps![],
/// );
/// let greeting = say_hello.call("Ada".to_string()).await.unwrap();
/// assert!(greeting.starts_with("Hello Ada"));
/// # });
/// ```
pub fn use_worklet<M, A, R, F>(
    cache: &mut M,
    context: ContextSelector,
    callback: F,
    deps: DependencyList,
) -> RunAsync<A, R>
where
    M: MemoCache<RunAsync<A, R>>,
    F: Fn(A) -> R + Send + Sync + 'static,
    A: Send + 'static,
    R: Send + 'static,
{
    cache.memoize(deps, move || context.create_run_async(callback))
}
