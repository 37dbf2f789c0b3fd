//! Error types for worklets.
//!
//! Errors are strongly typed using thiserror, split by concern: expectation
//! violations raised by the assertion helpers, and dispatch errors raised by
//! worker contexts. Values caught from failing code are carried as a tagged
//! [`Failure`], which is deliberately not an error type itself.

use std::any::Any;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A caught failure, classified at the boundary where it was caught.
///
/// `Structured` failures carry the `message` of an error value, a panic or a
/// thrown object; a `None` message means the thrown object had none.
/// `Raw` failures carry the thrown value verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Failure {
    /// An error-shaped failure, compared by its message.
    Structured {
        /// The `message` property, `None` when the value had none.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<serde_json::Value>,
    },
    /// A non-object thrown value, compared verbatim.
    Raw {
        /// The thrown value.
        value: serde_json::Value,
    },
}

impl Failure {
    /// Creates a structured failure with the given message.
    #[must_use]
    pub fn structured(message: impl Into<String>) -> Self {
        Self::Structured {
            message: Some(serde_json::Value::String(message.into())),
        }
    }

    /// Creates a raw failure from an arbitrary thrown value.
    #[must_use]
    pub fn raw(value: impl Into<serde_json::Value>) -> Self {
        Self::Raw {
            value: value.into(),
        }
    }

    /// Creates a structured failure from an error, using its `Display` output.
    #[must_use]
    pub fn from_error(err: &dyn std::error::Error) -> Self {
        Self::structured(err.to_string())
    }

    /// Classifies a thrown JSON value.
    ///
    /// Objects and arrays are structured and contribute their `message`
    /// property as-is (arrays never have one). Every other value is raw.
    #[must_use]
    pub fn from_thrown(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Object(mut map) => Self::Structured {
                message: map.remove("message"),
            },
            serde_json::Value::Array(_) => Self::Structured { message: None },
            other => Self::Raw { value: other },
        }
    }

    /// Converts a panic payload into a structured failure.
    #[must_use]
    pub fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&'static str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "Box<dyn Any>".to_string()
        };
        Self::structured(message)
    }

    /// Returns the reason rendered for display.
    ///
    /// Strings render bare, other values as JSON, a missing message as
    /// `undefined`.
    #[must_use]
    pub fn reason(&self) -> String {
        match self {
            Self::Structured { message: None } => "undefined".to_string(),
            Self::Structured {
                message: Some(serde_json::Value::String(s)),
            }
            | Self::Raw {
                value: serde_json::Value::String(s),
            } => s.clone(),
            Self::Structured { message: Some(value) } | Self::Raw { value } => value.to_string(),
        }
    }

    /// Returns true if this failure's reason strictly equals `expected`.
    ///
    /// Only string reasons can match; a number, a missing message or any
    /// other value never equals a string.
    #[must_use]
    pub fn matches_reason(&self, expected: &str) -> bool {
        match self {
            Self::Structured {
                message: Some(serde_json::Value::String(s)),
            }
            | Self::Raw {
                value: serde_json::Value::String(s),
            } => s == expected,
            _ => false,
        }
    }

    /// Returns true if this is a structured failure.
    #[must_use]
    pub const fn is_structured(&self) -> bool {
        matches!(self, Self::Structured { .. })
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.reason())
    }
}

impl From<&str> for Failure {
    fn from(value: &str) -> Self {
        Self::raw(value)
    }
}

impl From<String> for Failure {
    fn from(value: String) -> Self {
        Self::raw(value)
    }
}

impl From<serde_json::Value> for Failure {
    fn from(value: serde_json::Value) -> Self {
        Self::from_thrown(value)
    }
}

impl From<ExpectationError> for Failure {
    fn from(err: ExpectationError) -> Self {
        Self::from_error(&err)
    }
}

impl From<WorkletError> for Failure {
    fn from(err: WorkletError) -> Self {
        match err {
            WorkletError::Panicked { failure, .. } => failure,
            other => Self::from_error(&other),
        }
    }
}

/// Expectation violations raised by the assertion helpers.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExpectationError {
    /// The predicate described what it expected.
    #[error("Expected {description}.")]
    Predicate {
        /// What the predicate expected.
        description: String,
    },

    /// Canonical serializations differ.
    #[error("Expected {expected}, got {actual}.")]
    ValueMismatch {
        /// Expected value as JSON.
        expected: String,
        /// Actual value as JSON.
        actual: String,
    },

    /// One side could not be serialized.
    #[error("Failed to serialize {side} value: {message}")]
    Serialization {
        /// `"actual"` or `"expected"`.
        side: &'static str,
        /// The serializer's error.
        message: String,
    },

    /// The executor succeeded.
    #[error("Expected error but function succeeded.")]
    MissingException,

    /// The executor failed with a different reason.
    #[error("Expected error message '{expected}', got '{actual}'.")]
    ReasonMismatch {
        /// Expected reason.
        expected: String,
        /// Reason the executor failed with.
        actual: String,
    },
}

/// Errors raised while dispatching work onto a worker context.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WorkletError {
    /// The context's bounded queue had no free slot.
    #[error("Worklet context '{context}' queue is full (capacity {capacity})")]
    QueueFull {
        /// Context name.
        context: String,
        /// Queue capacity.
        capacity: usize,
    },

    /// The context was shut down, or dropped the job's reply.
    #[error("Worklet context '{context}' is disconnected")]
    Disconnected {
        /// Context name.
        context: String,
    },

    /// The callback panicked on a worker.
    #[error("Worklet panicked on context '{context}': {failure}")]
    Panicked {
        /// Context name.
        context: String,
        /// The caught panic.
        failure: Failure,
    },
}
