//! `Value` — the runtime values patterns are matched against
//!
//! A uniform, tagged representation of everything a subject can be: scalars,
//! ordered sequences, insertion-ordered mappings, callables, and opaque
//! domain objects.
//!
//! # Extensibility via `Opaque`
//!
//! Domain types the engine should not look inside (an `Option`, a parsed
//! request, a character marker) implement [`OpaqueValue`] and are wrapped in
//! `Value::Opaque(Arc::new(your_type))`. They can only be decomposed through
//! an [`Extractor`](crate::Extractor).

use crate::{CallError, Scope};
use indexmap::IndexMap;
use std::any::Any;
use std::fmt::{self, Debug};
use std::sync::Arc;

/// Extension trait for opaque domain objects.
///
/// Equality between opaque values is owned by the domain: two values are
/// equal when they are the same allocation, or when [`domain_eq`](Self::domain_eq)
/// says so.
///
/// # Example
///
/// ```
/// use std::any::Any;
/// use std::sync::Arc;
/// use pmatch::{OpaqueValue, Value};
///
/// #[derive(Debug)]
/// struct Point { x: i32, y: i32 }
///
/// impl OpaqueValue for Point {
///     fn type_name(&self) -> &'static str { "point" }
///     fn as_any(&self) -> &dyn Any { self }
/// }
///
/// let v = Value::opaque(Point { x: 1, y: 2 });
/// assert_eq!(v.as_opaque().map(|o| o.type_name()), Some("point"));
/// ```
pub trait OpaqueValue: Send + Sync + Debug {
    /// Human-readable type identifier, e.g. `"option"`.
    fn type_name(&self) -> &'static str;

    /// Returns `self` as `&dyn Any`, for downcasting inside extractors.
    fn as_any(&self) -> &dyn Any;

    /// Domain-defined equality with another opaque value.
    ///
    /// Only consulted when the two values are different allocations.
    fn domain_eq(&self, other: &dyn OpaqueValue) -> bool {
        let _ = other;
        false
    }
}

/// A function value: used by predicate patterns and stored in subjects.
///
/// The scope parameter makes the enclosing bindings an explicit input
/// instead of an implicit closure capture.
pub trait Callable: Send + Sync + Debug {
    /// Name used in traces and error messages.
    fn name(&self) -> &str;

    /// Invoke the function with the value under test.
    ///
    /// # Errors
    ///
    /// Returns [`CallError`] when the function itself fails.
    fn call(&self, subject: &Value, scope: &Scope<'_>) -> Result<Value, CallError>;
}

type CallFn = dyn Fn(&Value, &Scope<'_>) -> Result<Value, CallError> + Send + Sync;

/// A [`Callable`] backed by a closure.
pub struct FnCallable {
    name: String,
    f: Box<CallFn>,
}

impl FnCallable {
    /// Wrap a closure under the given name.
    pub fn new<F>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&Value, &Scope<'_>) -> Result<Value, CallError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            f: Box::new(f),
        }
    }
}

impl Callable for FnCallable {
    fn name(&self) -> &str {
        &self.name
    }

    fn call(&self, subject: &Value, scope: &Scope<'_>) -> Result<Value, CallError> {
        (self.f)(subject, scope)
    }
}

impl Debug for FnCallable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("FnCallable").field(&self.name).finish()
    }
}

/// Classification of a [`Value`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Kind {
    Null,
    Bool,
    Number,
    Text,
    Sequence,
    Mapping,
    Callable,
    Opaque,
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Null => "null",
            Self::Bool => "bool",
            Self::Number => "number",
            Self::Text => "text",
            Self::Sequence => "sequence",
            Self::Mapping => "mapping",
            Self::Callable => "callable",
            Self::Opaque => "opaque",
        };
        f.write_str(name)
    }
}

/// A runtime value.
///
/// # Example
///
/// ```
/// use pmatch::{Kind, Value};
///
/// let res = Value::mapping([("status", Value::from(200)), ("body", Value::from("ok"))]);
/// assert_eq!(res.kind(), Kind::Mapping);
/// assert_eq!(res.as_mapping().and_then(|m| m.get("status")), Some(&Value::from(200)));
/// ```
#[derive(Debug, Clone)]
pub enum Value {
    /// Absence of a value.
    Null,
    /// Boolean.
    Bool(bool),
    /// Number. Equality is exact; there is no coercion from other kinds.
    Number(f64),
    /// Text.
    Text(String),
    /// Ordered sequence.
    Sequence(Vec<Value>),
    /// Insertion-ordered string-keyed mapping.
    Mapping(IndexMap<String, Value>),
    /// Function value. Compared by identity.
    Callable(Arc<dyn Callable>),
    /// Opaque domain object. Compared by identity or domain equality.
    Opaque(Arc<dyn OpaqueValue>),
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            #[allow(clippy::float_cmp)] // exact numeric equality is the contract
            (Self::Number(a), Self::Number(b)) => a == b,
            (Self::Text(a), Self::Text(b)) => a == b,
            (Self::Sequence(a), Self::Sequence(b)) => a == b,
            (Self::Mapping(a), Self::Mapping(b)) => a == b,
            (Self::Callable(a), Self::Callable(b)) => Arc::ptr_eq(a, b),
            (Self::Opaque(a), Self::Opaque(b)) => {
                Arc::ptr_eq(a, b) || a.domain_eq(b.as_ref())
            }
            _ => false,
        }
    }
}

impl Value {
    /// Create a text value.
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }

    /// Create a number value.
    #[must_use]
    pub fn number(n: f64) -> Self {
        Self::Number(n)
    }

    /// Create a sequence from anything convertible to values.
    pub fn sequence<I, V>(items: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self::Sequence(items.into_iter().map(Into::into).collect())
    }

    /// Create a mapping from key/value pairs, keeping their order.
    pub fn mapping<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        Self::Mapping(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Wrap a domain object.
    pub fn opaque<T: OpaqueValue + 'static>(value: T) -> Self {
        Self::Opaque(Arc::new(value))
    }

    /// Wrap a closure as a callable value.
    pub fn callable<F>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&Value, &Scope<'_>) -> Result<Value, CallError> + Send + Sync + 'static,
    {
        Self::Callable(Arc::new(FnCallable::new(name, f)))
    }

    /// Classify this value.
    #[must_use]
    pub fn kind(&self) -> Kind {
        match self {
            Self::Null => Kind::Null,
            Self::Bool(_) => Kind::Bool,
            Self::Number(_) => Kind::Number,
            Self::Text(_) => Kind::Text,
            Self::Sequence(_) => Kind::Sequence,
            Self::Mapping(_) => Kind::Mapping,
            Self::Callable(_) => Kind::Callable,
            Self::Opaque(_) => Kind::Opaque,
        }
    }

    /// Truthiness as seen by guards and predicate patterns.
    ///
    /// `Null`, `false`, `0`, `NaN` and the empty text are falsy; everything
    /// else (including empty sequences and mappings) is truthy.
    #[must_use]
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Null => false,
            Self::Bool(b) => *b,
            Self::Number(n) => *n != 0.0 && !n.is_nan(),
            Self::Text(s) => !s.is_empty(),
            Self::Sequence(_) | Self::Mapping(_) | Self::Callable(_) | Self::Opaque(_) => true,
        }
    }

    /// Returns `true` if this is `Null`.
    #[inline]
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[inline]
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_sequence(&self) -> Option<&[Value]> {
        match self {
            Self::Sequence(items) => Some(items.as_slice()),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_mapping(&self) -> Option<&IndexMap<String, Value>> {
        match self {
            Self::Mapping(map) => Some(map),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_callable(&self) -> Option<&dyn Callable> {
        match self {
            Self::Callable(c) => Some(c.as_ref()),
            _ => None,
        }
    }

    /// Returns the inner opaque object. Use [`OpaqueValue::as_any`] to downcast.
    #[inline]
    #[must_use]
    pub fn as_opaque(&self) -> Option<&dyn OpaqueValue> {
        match self {
            Self::Opaque(o) => Some(o.as_ref()),
            _ => None,
        }
    }

    /// Downcast an opaque value to a concrete domain type.
    #[must_use]
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.as_opaque()?.as_any().downcast_ref::<T>()
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Self::Number(f64::from(n))
    }
}

impl From<u8> for Value {
    fn from(n: u8) -> Self {
        Self::Number(f64::from(n))
    }
}

impl From<i64> for Value {
    #[allow(clippy::cast_precision_loss)] // same precision as the host's numbers
    fn from(n: i64) -> Self {
        Self::Number(n as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Self::Sequence(items)
    }
}

impl From<IndexMap<String, Value>> for Value {
    fn from(map: IndexMap<String, Value>) -> Self {
        Self::Mapping(map)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// JSON conversion (feature = "serde")
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(feature = "serde")]
impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => Self::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Self::Text(s),
            serde_json::Value::Array(items) => {
                Self::Sequence(items.into_iter().map(Self::from).collect())
            }
            serde_json::Value::Object(map) => {
                Self::Mapping(map.into_iter().map(|(k, v)| (k, Self::from(v))).collect())
            }
        }
    }
}

#[cfg(feature = "serde")]
impl Value {
    /// Render as JSON.
    ///
    /// Whole numbers render as integers. Callables and opaque values have no
    /// JSON form and render as descriptive strings.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Null => serde_json::Value::Null,
            Self::Bool(b) => serde_json::Value::Bool(*b),
            Self::Number(n) => number_to_json(*n),
            Self::Text(s) => serde_json::Value::String(s.clone()),
            Self::Sequence(items) => {
                serde_json::Value::Array(items.iter().map(Self::to_json).collect())
            }
            Self::Mapping(map) => serde_json::Value::Object(
                map.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
            Self::Callable(c) => serde_json::Value::String(format!("<callable {}>", c.name())),
            Self::Opaque(o) => serde_json::Value::String(format!("<opaque {}>", o.type_name())),
        }
    }
}

#[cfg(feature = "serde")]
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn number_to_json(n: f64) -> serde_json::Value {
    if n.fract() == 0.0 && n.abs() < 9_007_199_254_740_992.0 {
        serde_json::Value::from(n as i64)
    } else {
        serde_json::Number::from_f64(n).map_or(serde_json::Value::Null, serde_json::Value::Number)
    }
}
