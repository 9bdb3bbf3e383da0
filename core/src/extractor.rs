//! `Extractor` — the custom-matcher protocol
//!
//! An extractor decides whether a subject "is one of these" and, if so, what
//! it decomposes into. It is the sole extension point for opaque domain
//! types: the engine never inspects an opaque value directly.
//!
//! Extractors are attached to the *pattern* position (a pattern node holds
//! one, or the registry resolves one by name), never looked up from the
//! subject's type. Third-party code can therefore add matching support to a
//! type it does not own.
//!
//! # Available Extractors
//!
//! - [`FnExtractor`] — wraps a closure
//! - [`KindExtractor`] — matches subjects of one [`Kind`]
//! - [`RegexExtractor`](crate::RegexExtractor) — text against a regular expression

use crate::{Kind, Value};
use indexmap::IndexMap;
use std::fmt::{self, Debug};

/// Destructurable output of an extractor.
#[derive(Debug, Clone, PartialEq)]
pub enum Groups {
    /// Positional groups, destructured by sequence patterns.
    Sequence(Vec<Value>),
    /// Named groups, destructured by mapping patterns.
    Mapping(IndexMap<String, Value>),
}

impl Groups {
    /// The groups as a plain value.
    #[must_use]
    pub fn to_value(&self) -> Value {
        match self {
            Self::Sequence(items) => Value::Sequence(items.clone()),
            Self::Mapping(map) => Value::Mapping(map.clone()),
        }
    }

    /// The [`Kind`] of [`to_value`](Self::to_value).
    #[must_use]
    pub fn kind(&self) -> Kind {
        match self {
            Self::Sequence(_) => Kind::Sequence,
            Self::Mapping(_) => Kind::Mapping,
        }
    }
}

/// What an extractor reports about one subject.
///
/// # Example
///
/// ```
/// use pmatch::{ExtractResult, Value};
///
/// let hit = ExtractResult::matched().with_value(Value::from(42));
/// assert!(hit.matched);
/// assert_eq!(hit.value, Some(Value::from(42)));
///
/// let miss = ExtractResult::no_match();
/// assert!(!miss.matched);
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExtractResult {
    /// Whether the subject is accepted.
    pub matched: bool,
    /// The produced value, destructured by an inner pattern.
    pub value: Option<Value>,
    /// Positional or named groups, destructured by an inner sequence/mapping pattern.
    pub groups: Option<Groups>,
}

impl ExtractResult {
    /// The subject is not accepted.
    #[must_use]
    pub fn no_match() -> Self {
        Self::default()
    }

    /// The subject is accepted, with nothing produced yet.
    #[must_use]
    pub fn matched() -> Self {
        Self {
            matched: true,
            ..Self::default()
        }
    }

    /// `matched()` or `no_match()` depending on `matched`.
    #[must_use]
    pub fn from_bool(matched: bool) -> Self {
        Self {
            matched,
            ..Self::default()
        }
    }

    /// Attach a produced value.
    #[must_use]
    pub fn with_value(mut self, value: Value) -> Self {
        self.value = Some(value);
        self
    }

    /// Attach groups.
    #[must_use]
    pub fn with_groups(mut self, groups: Groups) -> Self {
        self.groups = Some(groups);
        self
    }
}

/// Tests and decomposes a subject on behalf of a pattern.
///
/// Implementations should be referentially transparent with respect to the
/// subject: the same subject yields the same result. Reading explicitly
/// external state is allowed but makes that guarantee the caller's problem.
///
/// # Example
///
/// ```
/// use pmatch::{ExtractResult, Extractor, Value};
///
/// #[derive(Debug)]
/// struct Even;
///
/// impl Extractor for Even {
///     fn name(&self) -> &str { "Even" }
///
///     fn extract(&self, subject: &Value) -> ExtractResult {
///         match subject.as_number() {
///             Some(n) if n % 2.0 == 0.0 => ExtractResult::matched().with_value(Value::from(n / 2.0)),
///             _ => ExtractResult::no_match(),
///         }
///     }
/// }
///
/// assert!(Even.extract(&Value::from(4)).matched);
/// assert!(!Even.extract(&Value::from(3)).matched);
/// ```
#[diagnostic::on_unimplemented(
    message = "`{Self}` does not implement `Extractor`",
    label = "this type cannot be used in an extractor pattern",
    note = "implement `name(&self) -> &str` and `extract(&self, &Value) -> ExtractResult`, or wrap a closure with `extractor_fn`"
)]
pub trait Extractor: Send + Sync + Debug {
    /// Name used in traces and contract-violation errors.
    fn name(&self) -> &str;

    /// Inspect `subject`.
    fn extract(&self, subject: &Value) -> ExtractResult;
}

type ExtractFn = dyn Fn(&Value) -> ExtractResult + Send + Sync;

/// An [`Extractor`] backed by a closure.
pub struct FnExtractor {
    name: String,
    f: Box<ExtractFn>,
}

impl FnExtractor {
    /// Wrap a closure under the given name.
    pub fn new<F>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&Value) -> ExtractResult + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            f: Box::new(f),
        }
    }
}

impl Extractor for FnExtractor {
    fn name(&self) -> &str {
        &self.name
    }

    fn extract(&self, subject: &Value) -> ExtractResult {
        (self.f)(subject)
    }
}

impl Debug for FnExtractor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("FnExtractor").field(&self.name).finish()
    }
}

/// Shorthand for `Arc::new(FnExtractor::new(name, f))`.
pub fn extractor_fn<F>(name: impl Into<String>, f: F) -> std::sync::Arc<dyn Extractor>
where
    F: Fn(&Value) -> ExtractResult + Send + Sync + 'static,
{
    std::sync::Arc::new(FnExtractor::new(name, f))
}

/// Matches subjects of one [`Kind`]; the produced value is the subject itself.
///
/// ```
/// use pmatch::{Extractor, Kind, KindExtractor, Value};
///
/// let text = KindExtractor::new(Kind::Text);
/// assert!(text.extract(&Value::from("go")).matched);
/// assert!(!text.extract(&Value::from(1)).matched);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct KindExtractor {
    kind: Kind,
}

impl KindExtractor {
    /// Accept subjects of `kind`.
    #[must_use]
    pub fn new(kind: Kind) -> Self {
        Self { kind }
    }
}

impl Extractor for KindExtractor {
    fn name(&self) -> &str {
        match self.kind {
            Kind::Null => "Null",
            Kind::Bool => "Bool",
            Kind::Number => "Number",
            Kind::Text => "Text",
            Kind::Sequence => "Sequence",
            Kind::Mapping => "Mapping",
            Kind::Callable => "Callable",
            Kind::Opaque => "Opaque",
        }
    }

    fn extract(&self, subject: &Value) -> ExtractResult {
        if subject.kind() == self.kind {
            ExtractResult::matched().with_value(subject.clone())
        } else {
            ExtractResult::no_match()
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// IntoExtractor impls (feature = "registry")
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(feature = "registry")]
mod into_extractor {
    use super::{Extractor, Kind, KindExtractor};
    use crate::registry::IntoExtractor;
    use crate::PatternError;
    use serde::Deserialize;
    use std::sync::Arc;

    /// Configuration for constructing a [`KindExtractor`] via the registry.
    #[derive(Debug, Clone, Deserialize)]
    pub struct KindExtractorConfig {
        /// The kind to accept, e.g. `"text"`.
        pub kind: Kind,
    }

    impl IntoExtractor for KindExtractor {
        type Config = KindExtractorConfig;

        fn from_config(config: Self::Config) -> Result<Arc<dyn Extractor>, PatternError> {
            Ok(Arc::new(KindExtractor::new(config.kind)))
        }
    }
}

#[cfg(feature = "registry")]
pub use into_extractor::KindExtractorConfig;
