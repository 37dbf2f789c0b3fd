//! Dependency lists controlling memoization.
//!
//! Elements are compared shallowly: scalars by value (floats with
//! `Object.is` semantics, so `NaN` equals `NaN` and `0.0` differs from
//! `-0.0`), shared references by identity.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// A single entry of a [`DependencyList`].
#[derive(Clone)]
pub enum Dependency {
    /// `()`.
    Unit,
    /// A boolean.
    Bool(bool),
    /// Any integer that fits in `i64`.
    Int(i64),
    /// A float, compared with `Object.is` semantics.
    Float(f64),
    /// A string, compared by contents.
    Str(Arc<str>),
    /// Compared by pointer identity; holds the referent alive.
    Ref(Arc<dyn Any + Send + Sync>),
}

impl Dependency {
    /// A dependency that changes only when `value` points elsewhere.
    pub fn identity<T: Any + Send + Sync>(value: &Arc<T>) -> Self {
        Self::Ref(Arc::clone(value) as Arc<dyn Any + Send + Sync>)
    }

    fn address(value: &Arc<dyn Any + Send + Sync>) -> *const () {
        Arc::as_ptr(value).cast::<()>()
    }
}

impl PartialEq for Dependency {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Unit, Self::Unit) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a.to_bits() == b.to_bits() || (a.is_nan() && b.is_nan()),
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::Ref(a), Self::Ref(b)) => Self::address(a) == Self::address(b),
            _ => false,
        }
    }
}

impl fmt::Debug for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unit => f.write_str("Unit"),
            Self::Bool(v) => f.debug_tuple("Bool").field(v).finish(),
            Self::Int(v) => f.debug_tuple("Int").field(v).finish(),
            Self::Float(v) => f.debug_tuple("Float").field(v).finish(),
            Self::Str(v) => f.debug_tuple("Str").field(v).finish(),
            Self::Ref(v) => f.debug_tuple("Ref").field(&Self::address(v)).finish(),
        }
    }
}

impl From<()> for Dependency {
    fn from((): ()) -> Self {
        Self::Unit
    }
}

impl From<bool> for Dependency {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i32> for Dependency {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<u32> for Dependency {
    fn from(value: u32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<i64> for Dependency {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f32> for Dependency {
    fn from(value: f32) -> Self {
        Self::Float(f64::from(value))
    }
}

impl From<f64> for Dependency {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for Dependency {
    fn from(value: &str) -> Self {
        Self::Str(Arc::from(value))
    }
}

impl From<String> for Dependency {
    fn from(value: String) -> Self {
        Self::Str(Arc::from(value))
    }
}

impl<T: Any + Send + Sync> From<&Arc<T>> for Dependency {
    fn from(value: &Arc<T>) -> Self {
        Self::identity(value)
    }
}

/// The dependencies of a memoized value, compared element by element.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DependencyList(Vec<Dependency>);

impl DependencyList {
    /// An empty list: the value is computed once and never again.
    #[must_use]
    pub const fn empty() -> Self {
        Self(Vec::new())
    }

    /// Number of dependencies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the list has no dependencies.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over the dependencies in order.
    pub fn iter(&self) -> impl Iterator<Item = &Dependency> {
        self.0.iter()
    }
}

impl From<Vec<Dependency>> for DependencyList {
    fn from(deps: Vec<Dependency>) -> Self {
        Self(deps)
    }
}

impl FromIterator<Dependency> for DependencyList {
    fn from_iter<I: IntoIterator<Item = Dependency>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Builds a [`DependencyList`] from values convertible into [`Dependency`].
///
/// ```
/// use std::sync::Arc;
/// use worklets::deps;
///
/// let shared = Arc::new(5_u8);
/// let a = deps![1, "theme", &shared];
/// let b = deps![1, "theme", &shared];
/// assert_eq!(a, b);
/// assert_ne!(a, deps![1, "theme", &Arc::new(5_u8)]);
/// ```
#[macro_export]
macro_rules! deps {
    () => {
        $crate::hooks::DependencyList::empty()
    };
    ($($dep:expr),+ $(,)?) => {
        $crate::hooks::DependencyList::from(::std::vec![$($crate::hooks::Dependency::from($dep)),+])
    };
}
