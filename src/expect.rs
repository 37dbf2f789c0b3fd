//! Async expectation helpers.
//!
//! Each helper resolves an immediate or deferred input and produces a future
//! that completes with `Ok(())` when the expectation holds, or with an
//! [`ExpectationError`] whose message is suitable for direct display in test
//! output.
//!
//! # Examples
//!
//! ```
//! use worklets::expect::{expect_value, Deferred};
//!
//! # futures::executor::block_on(async {
//! expect_value(Deferred::pending(async { vec![1, 2] }), &[1, 2]).await.unwrap();
//! # });
//! ```

use std::fmt;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};

use futures::future::BoxFuture;
use futures::FutureExt;
use serde::Serialize;
use serde_json::{Number, Value};
use tracing::debug;

use crate::error::{ExpectationError, Failure};

/// A value under test: either already available or still being computed.
pub enum Deferred<'a, V> {
    /// Already available.
    Ready(V),
    /// Available once the future completes.
    Pending(BoxFuture<'a, V>),
}

impl<'a, V> Deferred<'a, V> {
    /// Wraps a future producing the value.
    pub fn pending<F>(future: F) -> Self
    where
        F: Future<Output = V> + Send + 'a,
    {
        Self::Pending(future.boxed())
    }

    /// Resolves to the wrapped value.
    pub async fn resolve(self) -> V {
        match self {
            Self::Ready(value) => value,
            Self::Pending(future) => future.await,
        }
    }
}

impl<V> From<V> for Deferred<'_, V> {
    fn from(value: V) -> Self {
        Self::Ready(value)
    }
}

impl<V: fmt::Debug> fmt::Debug for Deferred<'_, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ready(value) => f.debug_tuple("Ready").field(value).finish(),
            Self::Pending(_) => f.write_str("Pending(..)"),
        }
    }
}

/// The outcome of running an executor passed to [`expect_exception`].
pub enum Attempt<'a, T> {
    /// The executor finished synchronously.
    Ready(Result<T, Failure>),
    /// The executor returned a pending outcome.
    Deferred(BoxFuture<'a, Result<T, Failure>>),
}

impl<'a, T> Attempt<'a, T> {
    /// An executor that completed successfully.
    pub fn ok(value: T) -> Self {
        Self::Ready(Ok(value))
    }

    /// An executor that failed immediately.
    pub fn err(failure: impl Into<Failure>) -> Self {
        Self::Ready(Err(failure.into()))
    }

    /// An executor whose outcome is still being computed.
    pub fn deferred<F, E>(future: F) -> Self
    where
        F: Future<Output = Result<T, E>> + Send + 'a,
        E: Into<Failure>,
        T: 'a,
    {
        Self::Deferred(future.map(|result| result.map_err(Into::into)).boxed())
    }
}

impl<T, E: Into<Failure>> From<Result<T, E>> for Attempt<'_, T> {
    fn from(result: Result<T, E>) -> Self {
        Self::Ready(result.map_err(Into::into))
    }
}

impl<T: fmt::Debug> fmt::Debug for Attempt<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ready(result) => f.debug_tuple("Ready").field(result).finish(),
            Self::Deferred(_) => f.write_str("Deferred(..)"),
        }
    }
}

fn reject(err: ExpectationError) -> Result<(), ExpectationError> {
    debug!(error = %err, "expectation rejected");
    Err(err)
}

/// Resolves `value` and checks it with `predicate`.
///
/// The predicate returns `None` when the value is acceptable, or a
/// description of what was expected. An empty description counts as a pass.
pub async fn expect<V, P>(value: Deferred<'_, V>, predicate: P) -> Result<(), ExpectationError>
where
    P: FnOnce(&V) -> Option<String>,
{
    let resolved = value.resolve().await;
    match predicate(&resolved) {
        Some(description) if !description.is_empty() => {
            reject(ExpectationError::Predicate { description })
        }
        _ => Ok(()),
    }
}

/// Resolves `value` and compares it structurally against `expected`.
///
/// Both sides are compared through their canonical JSON serialization, so
/// object key order does not matter and an integral float such as `2.0`
/// equals the integer `2`.
pub async fn expect_value<V, T>(value: Deferred<'_, V>, expected: &T) -> Result<(), ExpectationError>
where
    V: Serialize,
    T: Serialize + ?Sized,
{
    let resolved = value.resolve().await;
    let actual = canonical_json(&resolved, "actual")?;
    let expected = canonical_json(expected, "expected")?;

    if actual == expected {
        Ok(())
    } else {
        reject(ExpectationError::ValueMismatch { expected, actual })
    }
}

/// Runs `executor` and expects it to fail with exactly `expected_reason`.
///
/// Panics raised by the executor, or by its deferred outcome, count as
/// structured failures carrying the panic message.
pub async fn expect_exception<'a, T, F>(executor: F, expected_reason: &str) -> Result<(), ExpectationError>
where
    F: FnOnce() -> Attempt<'a, T>,
{
    let outcome = match panic::catch_unwind(AssertUnwindSafe(executor)) {
        Ok(Attempt::Ready(result)) => result,
        Ok(Attempt::Deferred(future)) => match AssertUnwindSafe(future).catch_unwind().await {
            Ok(result) => result,
            Err(payload) => Err(Failure::from_panic(payload)),
        },
        Err(payload) => Err(Failure::from_panic(payload)),
    };

    match outcome {
        Ok(_) => reject(ExpectationError::MissingException),
        Err(failure) if failure.matches_reason(expected_reason) => Ok(()),
        Err(failure) => reject(ExpectationError::ReasonMismatch {
            expected: expected_reason.to_string(),
            actual: failure.reason(),
        }),
    }
}

fn canonical_json<T: Serialize + ?Sized>(value: &T, side: &'static str) -> Result<String, ExpectationError> {
    serde_json::to_value(value)
        .map(|v| normalize_numbers(v).to_string())
        .map_err(|e| ExpectationError::Serialization {
            side,
            message: e.to_string(),
        })
}

// Numbers have a single representation: integral floats print as integers.
fn normalize_numbers(value: Value) -> Value {
    match value {
        Value::Number(n) if n.is_f64() => Value::Number(integral_number(&n).unwrap_or(n)),
        Value::Array(items) => Value::Array(items.into_iter().map(normalize_numbers).collect()),
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| (k, normalize_numbers(v)))
                .collect(),
        ),
        other => other,
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn integral_number(n: &Number) -> Option<Number> {
    const I64_BOUND: f64 = 9_223_372_036_854_775_808.0;
    const U64_BOUND: f64 = 18_446_744_073_709_551_616.0;

    let f = n.as_f64()?;
    if !f.is_finite() || f.fract() != 0.0 {
        return None;
    }
    if (-I64_BOUND..I64_BOUND).contains(&f) {
        Some(Number::from(f as i64))
    } else if (0.0..U64_BOUND).contains(&f) {
        Some(Number::from(f as u64))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::{BTreeMap, HashMap};

    use serde_json::json;

    fn positive(v: &i64) -> Option<String> {
        (*v <= 0).then(|| "a positive number".to_string())
    }

    #[tokio::test]
    async fn expect_passes_when_predicate_is_silent() {
        expect(Deferred::Ready(5_i64), positive).await.unwrap();
        expect(Deferred::pending(async { 7_i64 }), positive).await.unwrap();
    }

    #[tokio::test]
    async fn expect_rejects_with_description() {
        let err = expect(Deferred::Ready(-1_i64), positive).await.unwrap_err();
        assert_eq!(err.to_string(), "Expected a positive number.");
    }

    #[tokio::test]
    async fn expect_treats_empty_description_as_pass() {
        expect(Deferred::Ready(()), |_| Some(String::new())).await.unwrap();
    }

    #[tokio::test]
    async fn expect_value_compares_serialized_forms() {
        expect_value(Deferred::Ready(1), &1).await.unwrap();
        expect_value(Deferred::pending(async { "hi" }), "hi").await.unwrap();
        expect_value(Deferred::Ready(vec![1_u8, 2]), &json!([1, 2])).await.unwrap();
    }

    #[tokio::test]
    async fn expect_value_treats_integral_floats_as_integers() {
        expect_value(Deferred::Ready(2.0_f64), &2).await.unwrap();
        expect_value(Deferred::Ready(-0.0_f64), &0).await.unwrap();
        expect_value(Deferred::Ready(vec![1.0_f64, 2.5]), &json!([1, 2.5]))
            .await
            .unwrap();
        expect_value(Deferred::Ready(json!({ "n": 3.0 })), &json!({ "n": 3 }))
            .await
            .unwrap();

        let err = expect_value(Deferred::Ready(2.5_f64), &2).await.unwrap_err();
        assert_eq!(err.to_string(), "Expected 2, got 2.5.");
    }

    #[tokio::test]
    async fn expect_value_ignores_key_order() {
        let mut map = HashMap::new();
        map.insert("b", 2);
        map.insert("a", 1);
        expect_value(Deferred::Ready(map), &json!({ "a": 1, "b": 2 })).await.unwrap();
    }

    #[tokio::test]
    async fn expect_value_reports_both_forms() {
        let err = expect_value(Deferred::Ready(json!({ "a": 1 })), &json!({ "a": 2 }))
            .await
            .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains(r#"{"a":1}"#));
        assert!(msg.contains(r#"{"a":2}"#));
        assert_eq!(msg, r#"Expected {"a":2}, got {"a":1}."#);
    }

    #[tokio::test]
    async fn expect_value_surfaces_serialization_failure() {
        let mut map = BTreeMap::new();
        map.insert(vec![1_u8], 1);
        let err = expect_value(Deferred::Ready(map), &json!({})).await.unwrap_err();
        let ExpectationError::Serialization { side, .. } = err else {
            panic!("expected Serialization, got {err:?}");
        };
        assert_eq!(side, "actual");
    }

    #[tokio::test]
    async fn expect_exception_accepts_matching_structured_failure() {
        expect_exception(|| Attempt::<()>::err(Failure::structured("boom")), "boom")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn expect_exception_accepts_matching_panic() {
        expect_exception(|| -> Attempt<'static, ()> { panic!("boom") }, "boom")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn expect_exception_rejects_success() {
        let err = expect_exception(|| Attempt::ok(42), "boom").await.unwrap_err();
        assert_eq!(err, ExpectationError::MissingException);
        assert_eq!(err.to_string(), "Expected error but function succeeded.");

        let err = expect_exception(|| Attempt::deferred(async { Ok::<_, Failure>(42) }), "boom")
            .await
            .unwrap_err();
        assert_eq!(err, ExpectationError::MissingException);
    }

    #[tokio::test]
    async fn expect_exception_names_both_reasons_on_mismatch() {
        let err = expect_exception(|| Attempt::<()>::deferred(async { Err("x") }), "y")
            .await
            .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("'y'"));
        assert!(msg.contains("'x'"));
    }

    #[tokio::test]
    async fn expect_exception_catches_deferred_panic() {
        let attempt = || {
            Attempt::<()>::deferred(async {
                if true {
                    panic!("late");
                }
                Ok::<_, Failure>(())
            })
        };
        expect_exception(attempt, "late").await.unwrap();
    }

    #[tokio::test]
    async fn expect_exception_compares_raw_values_strictly() {
        let err = expect_exception(|| Attempt::<()>::err(json!(42)), "42")
            .await
            .unwrap_err();
        assert_eq!(
            err,
            ExpectationError::ReasonMismatch {
                expected: "42".to_string(),
                actual: "42".to_string(),
            }
        );

        expect_exception(|| Attempt::<()>::err(json!("42")), "42").await.unwrap();
    }

    #[tokio::test]
    async fn expect_exception_reads_message_of_thrown_objects() {
        expect_exception(|| Attempt::<()>::err(json!({ "message": "boom" })), "boom")
            .await
            .unwrap();

        let err = expect_exception(|| Attempt::<()>::err(json!({ "code": 1 })), "boom")
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Expected error message 'boom', got 'undefined'.");
    }

    #[tokio::test]
    async fn expect_exception_requires_string_messages() {
        let err = expect_exception(|| Attempt::<()>::err(json!({ "message": 42 })), "42")
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Expected error message '42', got '42'.");

        expect_exception(|| Attempt::<()>::err(json!({})), "undefined")
            .await
            .unwrap_err();

        let err = expect_exception(|| Attempt::<()>::err(json!([1])), "boom")
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Expected error message 'boom', got 'undefined'.");
    }

    #[tokio::test]
    async fn expect_exception_accepts_std_errors() {
        let attempt = || -> Attempt<'static, u8> {
            "300".parse::<u8>().map_err(|e| Failure::from_error(&e)).into()
        };
        expect_exception(attempt, "number too large to fit in target type")
            .await
            .unwrap();
    }
}
