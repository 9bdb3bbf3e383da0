//! pmatch - structural pattern matching for dynamic values
//!
//! A match engine for `match` expressions over dynamically typed values:
//! clauses destructure a subject, bind fragments of it, optionally check a
//! guard, and the first clause that succeeds wins.
//!
//! # Architecture
//!
//! - [`Value`] — the dynamic value model (null, bool, number, text, sequence,
//!   mapping, callable, opaque domain object)
//! - [`Pattern`] — immutable pattern tree; [`CompiledPattern`] is a
//!   validated one, the only thing the matcher accepts
//! - [`Extractor`] — the custom-matcher protocol for types the engine cannot
//!   inspect; [`RegexExtractor`] bridges regular expressions into it
//! - [`Clause`] / [`MatchExpr`] — ordered clauses with guards and a default
//! - [`Scope`] — binding frames passed explicitly to guards, predicates and bodies
//!
//! # Key Design Insights
//!
//! 1. **Non-match is a value**: [`MatchResult::NoMatch`] moves on to the next
//!    clause; [`MatchError`] is reserved for broken extensions and exhaustion.
//!
//! 2. **Validate before matching**: ambiguous binders, inconsistent
//!    alternations and oversized trees are rejected by [`CompiledPattern::new`],
//!    never discovered halfway through a match.
//!
//! 3. **Extractors belong to the pattern**: the engine never looks up matching
//!    behaviour from a subject's type, so matching support can be added to
//!    types the caller does not own.
//!
//! # Example
//!
//! ```
//! use pmatch::prelude::*;
//!
//! // match (command) {
//! //   when ["go", dir] or [dir] -> "go"
//! //   when ["take", item]       -> "take"
//! //   default                   -> "unknown"
//! // }
//! let expr = MatchExpr::new(
//!     vec![
//!         Clause::new(
//!             Pattern::any_of([
//!                 Pattern::sequence([Pattern::literal("go"), Pattern::bind("dir")]),
//!                 Pattern::sequence([Pattern::bind("dir")]),
//!             ]),
//!             "go",
//!         )?,
//!         Clause::new(
//!             Pattern::sequence([Pattern::literal("take"), Pattern::bind("item")]),
//!             "take",
//!         )?,
//!     ],
//!     Some("unknown"),
//! );
//!
//! let selection = expr.evaluate(&Value::sequence(["go", "north"]), &Scope::root())?;
//! assert_eq!(*selection.body, "go");
//! assert_eq!(selection.bindings.get("dir"), Some(&Value::from("north")));
//!
//! let selection = expr.evaluate(&Value::sequence(["dance"]), &Scope::root())?;
//! assert_eq!(selection.bindings.get("dir"), Some(&Value::from("dance")));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Extensions
//!
//! - [`pmatch-test`](https://docs.rs/pmatch-test) — reference domain with an
//!   `Option` type, character constants and YAML conformance fixtures

// ═══════════════════════════════════════════════════════════════════════════════
// Modules
// ═══════════════════════════════════════════════════════════════════════════════

mod bindings;
mod clause;
mod desugar;
mod error;
mod evaluator;
mod extractor;
mod guard;
mod matcher;
mod pattern;
mod regex_extract;
mod trace;
mod value;

#[cfg(feature = "registry")]
mod config;
#[cfg(feature = "registry")]
mod registry;

// ═══════════════════════════════════════════════════════════════════════════════
// Public API
// ═══════════════════════════════════════════════════════════════════════════════

// Core types
pub use bindings::{Bindings, Scope};
pub use clause::Clause;
pub use desugar::{desugar, ClauseHead};
pub use evaluator::{MatchExpr, Selection};
pub use matcher::MatchResult;
pub use pattern::{CompiledPattern, Element, Pattern, Shape};
pub use value::{Callable, FnCallable, Kind, OpaqueValue, Value};

// Extension points
pub use extractor::{extractor_fn, ExtractResult, Extractor, FnExtractor, Groups, KindExtractor};
pub use guard::{guard_fn, All, Any, Bound, Compare, CompareOp, FnGuard, Guard, Not};
pub use regex_extract::{compile_regex, Captures, RegexEngine, RegexExtractor};

// Errors
pub use error::{CallError, GuardError, MatchError, PatternError};

// Trace types
pub use trace::{ClauseStep, EvalTrace, GuardOutcome};

// Registry (feature-gated)
#[cfg(feature = "registry")]
pub use config::{
    ClauseConfig, FieldConfig, GuardConfig, MatchConfig, PatternConfig, TypedConfig, UnitConfig,
};
#[cfg(feature = "registry")]
pub use extractor::KindExtractorConfig;
#[cfg(feature = "registry")]
pub use registry::{register_core_extractors, IntoExtractor, Registry, RegistryBuilder};

// ═══════════════════════════════════════════════════════════════════════════════
// Prelude
// ═══════════════════════════════════════════════════════════════════════════════

/// Prelude module for convenient imports.
///
/// ```
/// use pmatch::prelude::*;
/// ```
///
/// The guard combinators ([`All`], [`Any`], [`Not`], [`Bound`]) are left out
/// because their names collide easily; import them explicitly.
pub mod prelude {
    pub use crate::{
        // Extension points
        extractor_fn,
        guard_fn,
        // Core types
        Bindings,
        Callable,
        Clause,
        ClauseHead,
        Compare,
        CompareOp,
        CompiledPattern,
        Element,
        // Trace types
        EvalTrace,
        ExtractResult,
        Extractor,
        Guard,
        Kind,
        // Errors
        MatchError,
        MatchExpr,
        MatchResult,
        OpaqueValue,
        Pattern,
        PatternError,
        Scope,
        Selection,
        Value,
    };
}

// ═══════════════════════════════════════════════════════════════════════════════
// Constants
// ═══════════════════════════════════════════════════════════════════════════════

/// Maximum nesting depth of a pattern tree.
///
/// Protects the recursive matcher from stack overflow. Checked by
/// [`CompiledPattern::new`] and by the registry while loading config.
pub const MAX_PATTERN_DEPTH: usize = 32;

/// Maximum number of children of one sequence, mapping, alternation or
/// conjunction pattern.
///
/// Width-based protection: a pattern with millions of branches at depth 1
/// passes [`MAX_PATTERN_DEPTH`] but still costs too much to match.
pub const MAX_BRANCHES: usize = 256;

/// Maximum number of clauses in a [`MatchExpr`].
pub const MAX_CLAUSES: usize = 256;

/// Maximum length for regex expressions.
///
/// Regex compilation is expensive even with the linear-time `regex` crate.
pub const MAX_REGEX_PATTERN_LENGTH: usize = 4096;
