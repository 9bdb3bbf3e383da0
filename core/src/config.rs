//! Config types for loading match expressions from JSON/YAML.
//!
//! These types mirror the runtime types but are serde-deserializable, so a
//! whole match expression can be described as data and turned into a
//! [`MatchExpr`](crate::MatchExpr) via [`Registry::load_match()`](crate::Registry::load_match).
//!
//! # Relationship to runtime types
//!
//! | Config type | Runtime type | Loader method |
//! |-------------|-------------|---------------|
//! | [`MatchConfig`] | [`MatchExpr`](crate::MatchExpr) | `Registry::load_match()` |
//! | [`ClauseConfig`] | [`Clause`](crate::Clause) | via `load_match()` |
//! | [`PatternConfig`] | [`Pattern`](crate::Pattern) | `Registry::load_pattern()` |
//! | [`GuardConfig`] | `Arc<dyn Guard>` | `Registry::load_guard()` |
//! | [`TypedConfig`] | `Arc<dyn Extractor>` | via registry factory |
//!
//! # Example
//!
//! ```yaml
//! clauses:
//!   - pattern:
//!       type: mapping
//!       fields:
//!         - { key: status, pattern: { type: literal, value: 200 } }
//!         - { key: body, pattern: { type: bind, name: body } }
//!     body: ok
//!   - pattern:
//!       type: mapping
//!       fields: [{ key: status, pattern: { type: bind, name: status } }]
//!     guard: { type: compare, binding: status, op: ">=", value: 500 }
//!     body: retry
//! default: fail
//! ```

use crate::CompareOp;
use serde::Deserialize;

/// Configuration for a [`MatchExpr`](crate::MatchExpr).
#[derive(Debug, Clone, Deserialize)]
#[serde(bound(deserialize = "A: Deserialize<'de>"))]
pub struct MatchConfig<A> {
    /// Clauses, tried in order (first-match-wins).
    pub clauses: Vec<ClauseConfig<A>>,

    /// Body of the default clause.
    #[serde(default)]
    pub default: Option<A>,
}

/// Configuration for a [`Clause`](crate::Clause).
///
/// `capture` is the `let` target and `pattern` the `when` test; both are
/// optional and folded together by [`desugar`](crate::desugar).
#[derive(Debug, Clone, Deserialize)]
#[serde(bound(deserialize = "A: Deserialize<'de>"))]
pub struct ClauseConfig<A> {
    #[serde(default)]
    pub capture: Option<PatternConfig>,

    #[serde(default)]
    pub pattern: Option<PatternConfig>,

    #[serde(default)]
    pub guard: Option<GuardConfig>,

    /// Returned to the caller when this clause is selected.
    pub body: A,
}

/// Configuration for a [`Pattern`](crate::Pattern).
///
/// Uses `#[serde(tag = "type")]` for discriminated union deserialization:
///
/// ```json
/// { "type": "sequence", "elements": [{ "type": "literal", "value": "go" }, { "type": "bind", "name": "dir" }] }
/// { "type": "sequence", "elements": [null, { "type": "bind", "name": "left" }] }
/// { "type": "alternation", "branches": [...] }
/// { "type": "extractor", "extractor": { "type_url": "test.v1.OptionSome" }, "inner": { "type": "bind", "name": "val" } }
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PatternConfig {
    Literal {
        value: serde_json::Value,
    },

    Wildcard,

    Bind {
        name: String,
    },

    /// `null` elements are holes.
    Sequence {
        elements: Vec<Option<PatternConfig>>,
        #[serde(default)]
        rest: Option<String>,
    },

    Mapping {
        fields: Vec<FieldConfig>,
        #[serde(default)]
        rest: Option<String>,
    },

    Alternation {
        branches: Vec<PatternConfig>,
    },

    Conjunction {
        patterns: Vec<PatternConfig>,
    },

    /// A predicate registered by name.
    Predicate {
        name: String,
    },

    /// An extractor resolved through its type URL.
    Extractor {
        extractor: TypedConfig,
        #[serde(default)]
        inner: Option<Box<PatternConfig>>,
    },

    Regex {
        expression: String,
        #[serde(default)]
        groups_as: Option<Box<PatternConfig>>,
    },

    /// A literal whose value is a registered constant (e.g. an opaque marker).
    Constant {
        name: String,
    },
}

/// One `key: pattern` field of a mapping pattern.
#[derive(Debug, Clone, Deserialize)]
pub struct FieldConfig {
    pub key: String,
    pub pattern: PatternConfig,
}

/// Configuration for a [`Guard`](crate::Guard).
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GuardConfig {
    /// `binding <op> value`; `op` accepts `eq`/`ne`/`lt`/`le`/`gt`/`ge` or the symbols.
    Compare {
        binding: String,
        op: CompareOp,
        value: serde_json::Value,
    },

    All {
        guards: Vec<GuardConfig>,
    },

    Any {
        guards: Vec<GuardConfig>,
    },

    Not {
        guard: Box<GuardConfig>,
    },

    /// The binding is present and truthy.
    Bound {
        name: String,
    },

    /// A guard registered by name.
    Named {
        name: String,
    },
}

/// Reference to a registered type with its configuration.
///
/// - `type_url` identifies the registered type
/// - `config` carries the type-specific configuration payload
#[derive(Debug, Clone, Deserialize)]
pub struct TypedConfig {
    /// Must match a `type_url` registered in the [`Registry`](crate::Registry).
    pub type_url: String,

    /// Deserialized as the `Config` associated type of the registered
    /// [`IntoExtractor`](crate::IntoExtractor).
    #[serde(default = "default_config")]
    pub config: serde_json::Value,
}

fn default_config() -> serde_json::Value {
    serde_json::Value::Object(serde_json::Map::new())
}

/// Empty configuration for extractors that need none.
///
/// Accepts any JSON value (`{}`, `null`, etc.) and ignores it.
#[derive(Debug, Clone, Copy)]
pub struct UnitConfig;

impl<'de> Deserialize<'de> for UnitConfig {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        serde::de::IgnoredAny::deserialize(deserializer)?;
        Ok(UnitConfig)
    }
}
