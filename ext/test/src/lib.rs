//! pmatch-test: reference extension domain for pmatch
//!
//! Exercises the extractor protocol against types the engine cannot see into:
//!
//! - [`TestOption`]: an `Option`-style value whose fields are private; only
//!   [`SomeExtractor`] and [`NoneExtractor`] can look inside
//! - [`lf()`] / [`cr()`]: character markers matched by reference equality
//! - [`is_server_error()`]: a predicate over HTTP status codes
//!
//! With the `registry` feature, [`register()`] installs all of it into a
//! [`RegistryBuilder`](pmatch::RegistryBuilder). With `fixtures`, the
//! [`fixture`] module runs YAML conformance fixtures.

use pmatch::{CallError, ExtractResult, Extractor, FnCallable, OpaqueValue, Value};
use std::any::Any;
use std::sync::{Arc, OnceLock};

#[cfg(feature = "fixtures")]
pub mod fixture;

// ═══════════════════════════════════════════════════════════════════════════════
// Option
// ═══════════════════════════════════════════════════════════════════════════════

/// An optional value with private internals.
///
/// Patterns cannot destructure it directly: it is an opaque [`Value`], and
/// matching goes through the extractors below.
#[derive(Debug, Clone)]
pub struct TestOption {
    has_value: bool,
    value: Value,
}

impl OpaqueValue for TestOption {
    fn type_name(&self) -> &'static str {
        "Option"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn domain_eq(&self, other: &dyn OpaqueValue) -> bool {
        other
            .as_any()
            .downcast_ref::<TestOption>()
            .is_some_and(|o| o.has_value == self.has_value && o.value == self.value)
    }
}

/// `Option.some(value)`
pub fn option_some(value: impl Into<Value>) -> Value {
    Value::opaque(TestOption {
        has_value: true,
        value: value.into(),
    })
}

/// `Option.none()`
#[must_use]
pub fn option_none() -> Value {
    Value::opaque(TestOption {
        has_value: false,
        value: Value::Null,
    })
}

/// Matches a present [`TestOption`]; the extracted value is its content.
#[derive(Debug, Clone, Copy, Default)]
pub struct SomeExtractor;

impl Extractor for SomeExtractor {
    fn name(&self) -> &str {
        "Option.Some"
    }

    fn extract(&self, subject: &Value) -> ExtractResult {
        match subject.downcast_ref::<TestOption>() {
            Some(opt) if opt.has_value => ExtractResult::matched().with_value(opt.value.clone()),
            _ => ExtractResult::no_match(),
        }
    }
}

/// Matches an absent [`TestOption`]. Nothing is extracted.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoneExtractor;

impl Extractor for NoneExtractor {
    fn name(&self) -> &str {
        "Option.None"
    }

    fn extract(&self, subject: &Value) -> ExtractResult {
        ExtractResult::from_bool(
            subject
                .downcast_ref::<TestOption>()
                .is_some_and(|opt| !opt.has_value),
        )
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Character markers
// ═══════════════════════════════════════════════════════════════════════════════

/// A control character marker.
///
/// Has no domain equality: two markers are equal only when they are the same
/// allocation, so a literal pattern built from [`lf()`] matches [`lf()`] and
/// nothing else.
#[derive(Debug)]
pub struct CharMarker {
    name: &'static str,
    code: u8,
}

impl CharMarker {
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[must_use]
    pub fn code(&self) -> u8 {
        self.code
    }
}

impl OpaqueValue for CharMarker {
    fn type_name(&self) -> &'static str {
        "Char"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

static LF: OnceLock<Value> = OnceLock::new();
static CR: OnceLock<Value> = OnceLock::new();

/// Line feed (0x0a).
pub fn lf() -> Value {
    LF.get_or_init(|| Value::opaque(CharMarker { name: "LF", code: 0x0a }))
        .clone()
}

/// Carriage return (0x0d).
pub fn cr() -> Value {
    CR.get_or_init(|| Value::opaque(CharMarker { name: "CR", code: 0x0d }))
        .clone()
}

// ═══════════════════════════════════════════════════════════════════════════════
// Predicates
// ═══════════════════════════════════════════════════════════════════════════════

/// `true` for numeric status codes in `500..600`.
///
/// Non-numeric subjects are simply not server errors.
#[must_use]
pub fn is_server_error() -> Arc<FnCallable> {
    Arc::new(FnCallable::new("is_server_error", |subject, _scope| {
        Ok::<_, CallError>(Value::from(
            subject
                .as_number()
                .is_some_and(|code| (500.0..600.0).contains(&code)),
        ))
    }))
}

// ═══════════════════════════════════════════════════════════════════════════════
// Registry (feature = "registry")
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(feature = "registry")]
mod registry {
    use super::{cr, is_server_error, lf, NoneExtractor, SomeExtractor};
    use pmatch::{
        Bound, Extractor, IntoExtractor, Not, PatternError, RegistryBuilder, UnitConfig,
    };
    use std::sync::Arc;

    impl IntoExtractor for SomeExtractor {
        type Config = UnitConfig;

        fn from_config(_: UnitConfig) -> Result<Arc<dyn Extractor>, PatternError> {
            Ok(Arc::new(SomeExtractor))
        }
    }

    impl IntoExtractor for NoneExtractor {
        type Config = UnitConfig;

        fn from_config(_: UnitConfig) -> Result<Arc<dyn Extractor>, PatternError> {
            Ok(Arc::new(NoneExtractor))
        }
    }

    /// Register the core extractors and the test domain.
    ///
    /// | Kind | Name |
    /// |------|------|
    /// | extractor | `pmatch.core.v1.KindExtractor`, `test.v1.OptionSome`, `test.v1.OptionNone` |
    /// | constant | `LF`, `CR` |
    /// | predicate | `is_server_error` |
    /// | guard | `can_retry` (`has_retried` is not bound to a truthy value) |
    #[must_use]
    pub fn register(builder: RegistryBuilder) -> RegistryBuilder {
        pmatch::register_core_extractors(builder)
            .extractor::<SomeExtractor>("test.v1.OptionSome")
            .extractor::<NoneExtractor>("test.v1.OptionNone")
            .constant("LF", lf())
            .constant("CR", cr())
            .predicate("is_server_error", is_server_error())
            .guard(
                "can_retry",
                Arc::new(Not(Arc::new(Bound("has_retried".into())))),
            )
    }
}

#[cfg(feature = "registry")]
pub use registry::register;

/// Prelude for test-domain imports.
pub mod prelude {
    pub use crate::{
        cr, is_server_error, lf, option_none, option_some, CharMarker, NoneExtractor,
        SomeExtractor, TestOption,
    };
    pub use pmatch::prelude::*;
}

#[cfg(test)]
mod tests {
    use super::*;
    use pmatch::{Callable, Clause, MatchExpr, Pattern, Scope};

    #[test]
    fn some_extracts_content() {
        let result = SomeExtractor.extract(&option_some(42));
        assert!(result.matched);
        assert_eq!(result.value, Some(Value::from(42)));

        assert!(!SomeExtractor.extract(&option_none()).matched);
        assert!(!SomeExtractor.extract(&Value::from(42)).matched);
    }

    #[test]
    fn none_extracts_nothing() {
        let result = NoneExtractor.extract(&option_none());
        assert!(result.matched);
        assert!(result.value.is_none());

        assert!(!NoneExtractor.extract(&option_some(Value::Null)).matched);
        assert!(!NoneExtractor.extract(&Value::Null).matched);
    }

    #[test]
    fn options_compare_by_content() {
        assert_eq!(option_some("x"), option_some("x"));
        assert_ne!(option_some("x"), option_some("y"));
        assert_eq!(option_none(), option_none());
        assert_ne!(option_none(), option_some(Value::Null));
    }

    #[test]
    fn markers_compare_by_reference() {
        assert_eq!(lf(), lf());
        assert_ne!(lf(), cr());
        let imposter = Value::opaque(CharMarker { name: "LF", code: 0x0a });
        assert_ne!(lf(), imposter);
        assert_eq!(lf().downcast_ref::<CharMarker>().map(CharMarker::code), Some(0x0a));
    }

    #[test]
    fn option_match_expression() {
        // match (opt) {
        //   when Option.Some(val) -> "some"
        //   when Option.None      -> "none"
        // }
        let expr = MatchExpr::new(
            vec![
                Clause::new(
                    Pattern::extract_into(Arc::new(SomeExtractor), Pattern::bind("val")),
                    "some",
                )
                .unwrap(),
                Clause::new(Pattern::extract(Arc::new(NoneExtractor)), "none").unwrap(),
            ],
            None,
        );

        let selected = expr.evaluate(&option_some("hi"), &Scope::root()).unwrap();
        assert_eq!(*selected.body, "some");
        assert_eq!(selected.bindings.get("val"), Some(&Value::from("hi")));

        let selected = expr.evaluate(&option_none(), &Scope::root()).unwrap();
        assert_eq!(*selected.body, "none");
        assert!(selected.bindings.is_empty());

        let err = expr.evaluate(&Value::from(1), &Scope::root()).unwrap_err();
        assert!(err.is_exhausted());
    }

    #[test]
    fn line_ending_match_expression() {
        let expr = MatchExpr::new(
            vec![
                Clause::new(Pattern::literal(lf()), "newline").unwrap(),
                Clause::new(Pattern::literal(cr()), "return").unwrap(),
            ],
            Some("other"),
        );
        let scope = Scope::root();
        assert_eq!(*expr.evaluate(&lf(), &scope).unwrap().body, "newline");
        assert_eq!(*expr.evaluate(&cr(), &scope).unwrap().body, "return");
        assert_eq!(*expr.evaluate(&Value::from("\n"), &scope).unwrap().body, "other");
    }

    #[test]
    fn server_error_predicate() {
        let f = is_server_error();
        let scope = Scope::root();
        assert_eq!(f.call(&Value::from(503), &scope), Ok(Value::from(true)));
        assert_eq!(f.call(&Value::from(404), &scope), Ok(Value::from(false)));
        assert_eq!(f.call(&Value::from("500"), &scope), Ok(Value::from(false)));
    }

    #[cfg(feature = "registry")]
    #[test]
    fn register_installs_domain() {
        let registry = register(pmatch::RegistryBuilder::new()).build();
        assert_eq!(
            registry.extractor_type_urls(),
            ["pmatch.core.v1.KindExtractor", "test.v1.OptionNone", "test.v1.OptionSome"]
        );
        assert_eq!(registry.constant_names(), ["CR", "LF"]);
        assert_eq!(registry.predicate_names(), ["is_server_error"]);
        assert_eq!(registry.guard_names(), ["can_retry"]);
        assert_eq!(registry.constant_value("LF"), Some(&lf()));
    }
}
