//! Registry for config-driven match expression construction.
//!
//! A [`Registry`] turns [`MatchConfig`] data into a runtime
//! [`MatchExpr`] without domain-specific compile code. Everything a config
//! can refer to by name is registered up front:
//!
//! | Seam | Registration | Referenced from config as |
//! |------|--------------|---------------------------|
//! | Extractors | `builder.extractor::<T>(type_url)` | `{ type: extractor, extractor: { type_url } }` |
//! | Predicates | `builder.predicate(name, f)` | `{ type: predicate, name }` |
//! | Guards | `builder.guard(name, g)` | `{ type: named, name }` |
//! | Constants | `builder.constant(name, value)` | `{ type: constant, name }` |
//!
//! Extractor types register via [`IntoExtractor`]: the concrete type `T` is
//! monomorphized into a closure at registration time and erased behind
//! `Box<dyn Fn>`, so the registry itself stays non-generic.
//!
//! # Example
//!
//! ```
//! use pmatch::{register_core_extractors, MatchConfig, RegistryBuilder, Scope, Value};
//!
//! let registry = register_core_extractors(RegistryBuilder::new()).build();
//!
//! let config: MatchConfig<String> = serde_json::from_value(serde_json::json!({
//!     "clauses": [{
//!         "capture": { "type": "bind", "name": "word" },
//!         "pattern": {
//!             "type": "extractor",
//!             "extractor": { "type_url": "pmatch.core.v1.KindExtractor", "config": { "kind": "text" } }
//!         },
//!         "body": "text"
//!     }],
//!     "default": "other"
//! }))
//! .unwrap();
//!
//! let expr = registry.load_match(config).unwrap();
//! let selection = expr.evaluate(&Value::from("hello"), &Scope::root()).unwrap();
//! assert_eq!(selection.body, "text");
//! assert_eq!(selection.bindings.get("word"), Some(&Value::from("hello")));
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use tracing::debug;

use crate::{
    config::{ClauseConfig, GuardConfig, MatchConfig, PatternConfig, TypedConfig},
    All, Any, Bound, Callable, Clause, ClauseHead, Compare, Element, Extractor, Guard, MatchExpr,
    Not, Pattern, PatternError, RegexExtractor, Value, MAX_BRANCHES, MAX_CLAUSES,
    MAX_PATTERN_DEPTH,
};

// ═══════════════════════════════════════════════════════════════════════════════
// Traits
// ═══════════════════════════════════════════════════════════════════════════════

/// Trait for [`Extractor`] types that can be constructed from configuration.
///
/// Each extractor type knows its own config shape via the associated
/// `Config` type. The registry calls [`from_config`](Self::from_config) at
/// load time.
///
/// # Example
///
/// ```ignore
/// impl IntoExtractor for SomeExtractor {
///     type Config = UnitConfig;
///     fn from_config(_: UnitConfig) -> Result<Arc<dyn Extractor>, PatternError> {
///         Ok(Arc::new(SomeExtractor))
///     }
/// }
/// ```
pub trait IntoExtractor: Send + Sync + 'static {
    /// The configuration type deserialized from JSON/YAML.
    type Config: DeserializeOwned + Send + Sync;

    /// Construct an extractor from deserialized configuration.
    ///
    /// # Errors
    ///
    /// Returns [`PatternError::InvalidConfig`] if the config is semantically invalid.
    fn from_config(config: Self::Config) -> Result<Arc<dyn Extractor>, PatternError>;
}

/// Type-erased extractor factory closure.
type BoxedExtractorFactory =
    Box<dyn Fn(&serde_json::Value) -> Result<Arc<dyn Extractor>, PatternError> + Send + Sync>;

// ═══════════════════════════════════════════════════════════════════════════════
// Builder
// ═══════════════════════════════════════════════════════════════════════════════

/// Builder for constructing a [`Registry`].
///
/// The registry is immutable after [`build()`](Self::build); no runtime
/// registration is possible.
#[derive(Default)]
pub struct RegistryBuilder {
    extractor_factories: HashMap<String, BoxedExtractorFactory>,
    predicates: HashMap<String, Arc<dyn Callable>>,
    guards: HashMap<String, Arc<dyn Guard>>,
    constants: HashMap<String, Value>,
}

impl RegistryBuilder {
    /// Create a new empty registry builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an extractor type with a type URL.
    ///
    /// At load time the registry deserializes the config payload as
    /// `T::Config` and calls `T::from_config()`.
    #[must_use]
    pub fn extractor<T: IntoExtractor>(mut self, type_url: &str) -> Self {
        self.extractor_factories.insert(
            type_url.to_owned(),
            Box::new(|value: &serde_json::Value| {
                let config: T::Config = serde_json::from_value(value.clone()).map_err(|e| {
                    PatternError::InvalidConfig {
                        reason: e.to_string(),
                    }
                })?;
                T::from_config(config)
            }),
        );
        self
    }

    /// Register a predicate function by name.
    #[must_use]
    pub fn predicate(mut self, name: &str, f: Arc<dyn Callable>) -> Self {
        self.predicates.insert(name.to_owned(), f);
        self
    }

    /// Register a guard by name.
    #[must_use]
    pub fn guard(mut self, name: &str, guard: Arc<dyn Guard>) -> Self {
        self.guards.insert(name.to_owned(), guard);
        self
    }

    /// Register a constant, usable as a literal pattern.
    #[must_use]
    pub fn constant(mut self, name: &str, value: Value) -> Self {
        self.constants.insert(name.to_owned(), value);
        self
    }

    /// Freeze the registry.
    #[must_use]
    pub fn build(self) -> Registry {
        Registry {
            extractor_factories: self.extractor_factories,
            predicates: self.predicates,
            guards: self.guards,
            constants: self.constants,
        }
    }
}

/// Register the core built-in extractors (`KindExtractor`).
///
/// Call this in domain `register()` functions, then add domain extractors
/// on top.
#[must_use]
pub fn register_core_extractors(builder: RegistryBuilder) -> RegistryBuilder {
    use crate::KindExtractor;
    builder.extractor::<KindExtractor>("pmatch.core.v1.KindExtractor")
}

// ═══════════════════════════════════════════════════════════════════════════════
// Registry
// ═══════════════════════════════════════════════════════════════════════════════

/// Immutable registry of extractor factories, predicates, guards and constants.
///
/// Constructed via [`RegistryBuilder`].
pub struct Registry {
    extractor_factories: HashMap<String, BoxedExtractorFactory>,
    predicates: HashMap<String, Arc<dyn Callable>>,
    guards: HashMap<String, Arc<dyn Guard>>,
    constants: HashMap<String, Value>,
}

impl Registry {
    /// Load a [`MatchExpr`] from configuration.
    ///
    /// Every clause head is desugared and compiled; any invalid clause
    /// rejects the whole expression.
    ///
    /// # Errors
    ///
    /// - [`PatternError::TooManyClauses`] — more than [`MAX_CLAUSES`] clauses
    /// - [`PatternError::UnknownName`] — unregistered type URL, predicate, guard or constant
    /// - [`PatternError::InvalidConfig`] — extractor config failed to deserialize
    /// - any validation error from [`CompiledPattern::new`](crate::CompiledPattern::new)
    pub fn load_match<A>(&self, config: MatchConfig<A>) -> Result<MatchExpr<A>, PatternError> {
        if config.clauses.len() > MAX_CLAUSES {
            return Err(PatternError::TooManyClauses {
                count: config.clauses.len(),
                max: MAX_CLAUSES,
            });
        }

        let clauses = config
            .clauses
            .into_iter()
            .map(|clause| self.load_clause(clause))
            .collect::<Result<Vec<_>, _>>()?;

        let expr = MatchExpr::new(clauses, config.default);
        expr.validate()?;
        debug!(
            clauses = expr.len(),
            has_default = expr.has_default(),
            "loaded match expression"
        );
        Ok(expr)
    }

    /// Load one clause.
    ///
    /// # Errors
    ///
    /// Same as [`load_match`](Self::load_match).
    pub fn load_clause<A>(&self, config: ClauseConfig<A>) -> Result<Clause<A>, PatternError> {
        let head = ClauseHead {
            capture: config.capture.map(|c| self.load_pattern(c)).transpose()?,
            test: config.pattern.map(|p| self.load_pattern(p)).transpose()?,
        };
        let clause = Clause::from_head(head, config.body)?;
        match config.guard {
            Some(guard) => Ok(clause.with_guard(self.load_guard(guard)?)),
            None => Ok(clause),
        }
    }

    /// Load a pattern tree (not yet compiled).
    ///
    /// # Errors
    ///
    /// - [`PatternError::UnknownName`] / [`PatternError::InvalidConfig`]
    /// - [`PatternError::InvalidRegex`] / [`PatternError::PatternTooLong`]
    /// - [`PatternError::DepthExceeded`] / [`PatternError::TooManyBranches`]
    pub fn load_pattern(&self, config: PatternConfig) -> Result<Pattern, PatternError> {
        self.load_pattern_at(config, 1)
    }

    fn load_pattern_at(&self, config: PatternConfig, depth: usize) -> Result<Pattern, PatternError> {
        if depth > MAX_PATTERN_DEPTH {
            return Err(PatternError::DepthExceeded {
                depth,
                max: MAX_PATTERN_DEPTH,
            });
        }
        let child = |c: PatternConfig| self.load_pattern_at(c, depth + 1);
        let children = |cs: Vec<PatternConfig>| -> Result<Vec<Pattern>, PatternError> {
            check_width(cs.len())?;
            cs.into_iter().map(child).collect()
        };

        Ok(match config {
            PatternConfig::Literal { value } => Pattern::Literal(Value::from(value)),
            PatternConfig::Wildcard => Pattern::Wildcard,
            PatternConfig::Bind { name } => Pattern::Binder(name),
            PatternConfig::Sequence { elements, rest } => {
                check_width(elements.len())?;
                let elements = elements
                    .into_iter()
                    .map(|e| match e {
                        Some(p) => child(p).map(Element::Pattern),
                        None => Ok(Element::Hole),
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Pattern::Sequence { elements, rest }
            }
            PatternConfig::Mapping { fields, rest } => {
                check_width(fields.len())?;
                let fields = fields
                    .into_iter()
                    .map(|f| -> Result<_, PatternError> { Ok((f.key, child(f.pattern)?)) })
                    .collect::<Result<Vec<_>, _>>()?;
                Pattern::Mapping { fields, rest }
            }
            PatternConfig::Alternation { branches } => Pattern::Alternation(children(branches)?),
            PatternConfig::Conjunction { patterns } => Pattern::Conjunction(children(patterns)?),
            PatternConfig::Predicate { name } => Pattern::Predicate(self.resolve_predicate(&name)?),
            PatternConfig::Extractor { extractor, inner } => Pattern::Extractor {
                extractor: self.resolve_extractor(&extractor)?,
                inner: inner.map(|p| child(*p).map(Box::new)).transpose()?,
            },
            PatternConfig::Regex {
                expression,
                groups_as,
            } => Pattern::Regex {
                extractor: Arc::new(RegexExtractor::compile(&expression)?),
                groups_as: groups_as.map(|p| child(*p).map(Box::new)).transpose()?,
            },
            PatternConfig::Constant { name } => Pattern::Literal(self.resolve_constant(&name)?),
        })
    }

    /// Load a guard.
    ///
    /// # Errors
    ///
    /// [`PatternError::UnknownName`] for an unregistered named guard, or
    /// [`PatternError::DepthExceeded`] for over-nested combinators.
    pub fn load_guard(&self, config: GuardConfig) -> Result<Arc<dyn Guard>, PatternError> {
        self.load_guard_at(config, 1)
    }

    fn load_guard_at(&self, config: GuardConfig, depth: usize) -> Result<Arc<dyn Guard>, PatternError> {
        if depth > MAX_PATTERN_DEPTH {
            return Err(PatternError::DepthExceeded {
                depth,
                max: MAX_PATTERN_DEPTH,
            });
        }
        let children = |gs: Vec<GuardConfig>| -> Result<Vec<Arc<dyn Guard>>, PatternError> {
            check_width(gs.len())?;
            gs.into_iter()
                .map(|g| self.load_guard_at(g, depth + 1))
                .collect()
        };

        let guard: Arc<dyn Guard> = match config {
            GuardConfig::Compare { binding, op, value } => {
                Arc::new(Compare::new(binding, op, Value::from(value)))
            }
            GuardConfig::All { guards } => Arc::new(All(children(guards)?)),
            GuardConfig::Any { guards } => Arc::new(Any(children(guards)?)),
            GuardConfig::Not { guard } => Arc::new(Not(self.load_guard_at(*guard, depth + 1)?)),
            GuardConfig::Bound { name } => Arc::new(Bound(name)),
            GuardConfig::Named { name } => match self.guards.get(&name) {
                Some(guard) => Arc::clone(guard),
                None => {
                    return Err(unknown(name, "guard", self.guards.keys()));
                }
            },
        };
        Ok(guard)
    }

    fn resolve_extractor(&self, config: &TypedConfig) -> Result<Arc<dyn Extractor>, PatternError> {
        let factory = self
            .extractor_factories
            .get(&config.type_url)
            .ok_or_else(|| {
                unknown(
                    config.type_url.clone(),
                    "extractor",
                    self.extractor_factories.keys(),
                )
            })?;
        factory(&config.config)
    }

    fn resolve_predicate(&self, name: &str) -> Result<Arc<dyn Callable>, PatternError> {
        self.predicates
            .get(name)
            .cloned()
            .ok_or_else(|| unknown(name.to_owned(), "predicate", self.predicates.keys()))
    }

    fn resolve_constant(&self, name: &str) -> Result<Value, PatternError> {
        self.constants
            .get(name)
            .cloned()
            .ok_or_else(|| unknown(name.to_owned(), "constant", self.constants.keys()))
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Introspection
    // ═══════════════════════════════════════════════════════════════════════

    /// Registered extractor type URLs, sorted.
    #[must_use]
    pub fn extractor_type_urls(&self) -> Vec<&str> {
        sorted_keys(self.extractor_factories.keys())
    }

    /// Registered predicate names, sorted.
    #[must_use]
    pub fn predicate_names(&self) -> Vec<&str> {
        sorted_keys(self.predicates.keys())
    }

    /// Registered guard names, sorted.
    #[must_use]
    pub fn guard_names(&self) -> Vec<&str> {
        sorted_keys(self.guards.keys())
    }

    /// Registered constant names, sorted.
    #[must_use]
    pub fn constant_names(&self) -> Vec<&str> {
        sorted_keys(self.constants.keys())
    }

    /// Look up a registered constant.
    #[must_use]
    pub fn constant_value(&self, name: &str) -> Option<&Value> {
        self.constants.get(name)
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("extractors", &self.extractor_type_urls())
            .field("predicates", &self.predicate_names())
            .field("guards", &self.guard_names())
            .field("constants", &self.constant_names())
            .finish()
    }
}

fn check_width(count: usize) -> Result<(), PatternError> {
    if count > MAX_BRANCHES {
        return Err(PatternError::TooManyBranches {
            count,
            max: MAX_BRANCHES,
        });
    }
    Ok(())
}

fn sorted_keys<'a>(keys: impl Iterator<Item = &'a String>) -> Vec<&'a str> {
    let mut names: Vec<&str> = keys.map(String::as_str).collect();
    names.sort_unstable();
    names
}

fn unknown<'a>(
    name: String,
    registry: &'static str,
    keys: impl Iterator<Item = &'a String>,
) -> PatternError {
    PatternError::UnknownName {
        name,
        registry,
        available: keys.cloned().collect(),
    }
}
