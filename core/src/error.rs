//! Error types for pattern construction and match evaluation.
//!
//! Two phases, two enums:
//!
//! - [`PatternError`] — raised while a pattern tree or match expression is
//!   being built (or loaded from config). Fix the pattern and rebuild.
//! - [`MatchError`] — raised while a subject is being matched. Ordinary
//!   non-matches are never errors; these signal broken extensions, failing
//!   guards, or an exhausted match.

use thiserror::Error;

/// Errors from pattern construction and validation.
///
/// A pattern that fails any of these checks is rejected as a whole; nothing
/// is ever partially compiled.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    /// Two sibling subpatterns (outside an alternation) declare the same binder.
    #[error("binder \"{name}\" is declared more than once — rename one of the bindings")]
    AmbiguousBinding {
        /// The duplicated binder name.
        name: String,
    },

    /// Alternation branches do not bind the same set of names.
    #[error(
        "alternation branch {branch} binds {found:?}, but branch 0 binds {expected:?} \
         — every branch must bind the same names"
    )]
    InconsistentAlternationBindings {
        /// Binder names of the first branch (sorted).
        expected: Vec<String>,
        /// Binder names of the offending branch (sorted).
        found: Vec<String>,
        /// Index of the offending branch.
        branch: usize,
    },

    /// An alternation with no branches can never match.
    #[error("alternation has no branches")]
    EmptyAlternation,

    /// A conjunction with no members.
    #[error("conjunction has no patterns")]
    EmptyConjunction,

    /// A mapping pattern names the same key twice.
    #[error("mapping pattern names key \"{key}\" more than once")]
    DuplicateKey {
        /// The repeated key.
        key: String,
    },

    /// Pattern nesting exceeds [`MAX_PATTERN_DEPTH`](crate::MAX_PATTERN_DEPTH).
    #[error("pattern nesting depth is {depth}, but maximum allowed is {max} — flatten the pattern")]
    DepthExceeded {
        /// Actual depth of the pattern tree.
        depth: usize,
        /// Maximum allowed depth.
        max: usize,
    },

    /// Too many children in one sequence, mapping, alternation or conjunction.
    #[error("pattern node has {count} children, but maximum allowed is {max}")]
    TooManyBranches {
        /// Actual child count.
        count: usize,
        /// Maximum allowed.
        max: usize,
    },

    /// Too many clauses in one match expression.
    #[error("match expression has {count} clauses, but maximum allowed is {max}")]
    TooManyClauses {
        /// Actual clause count.
        count: usize,
        /// Maximum allowed.
        max: usize,
    },

    /// A regular expression failed to compile.
    #[error("invalid regex \"{pattern}\": {reason}")]
    InvalidRegex {
        /// The expression that failed to compile.
        pattern: String,
        /// The underlying error message.
        reason: String,
    },

    /// A regular expression exceeds [`MAX_REGEX_PATTERN_LENGTH`](crate::MAX_REGEX_PATTERN_LENGTH).
    #[error("regex length is {len}, but maximum allowed is {max}")]
    PatternTooLong {
        /// Actual length of the expression.
        len: usize,
        /// Maximum allowed length.
        max: usize,
    },

    /// A name was not found in the registry.
    #[error("unknown {registry} \"{name}\"{}", available_suffix(.registry, .available))]
    UnknownName {
        /// The unregistered name or type URL.
        name: String,
        /// Which table was searched (`"extractor"`, `"predicate"`, `"guard"` or `"constant"`).
        registry: &'static str,
        /// Names that ARE registered (for self-correcting error messages).
        available: Vec<String>,
    },

    /// Configuration deserialization or construction failed.
    #[error("invalid config: {reason}")]
    InvalidConfig {
        /// The underlying error message.
        reason: String,
    },
}

fn available_suffix(registry: &str, available: &[String]) -> String {
    if available.is_empty() {
        format!(" — no {registry} entries are registered")
    } else {
        let mut names = available.to_vec();
        names.sort_unstable();
        format!(" — registered: {}", names.join(", "))
    }
}

/// Failure raised by a [`Callable`](crate::Callable) (a predicate pattern's function).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct CallError {
    message: String,
}

impl CallError {
    /// Create a call error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The error message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Failure raised while evaluating a [`Guard`](crate::Guard).
///
/// Distinct from a guard that evaluates to a falsy value: a falsy guard
/// moves on to the next clause, a `GuardError` aborts the match.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct GuardError {
    message: String,
}

impl GuardError {
    /// Create a guard error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The error message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Errors raised while matching a subject.
///
/// Only [`MatchError::MatchExhausted`] is expected in routine operation.
/// The other variants propagate out of the whole match expression
/// immediately; they are never retried as an ordinary non-match.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatchError {
    /// An extractor returned a result the pattern cannot destructure.
    #[error("extractor \"{extractor}\" violated its contract: {reason}")]
    ExtractorContractViolation {
        /// Name of the offending extractor.
        extractor: String,
        /// What was wrong with the result.
        reason: String,
    },

    /// A guard expression failed (as opposed to evaluating to false).
    #[error("guard of clause {clause} failed: {source}")]
    GuardEvaluation {
        /// Index of the clause whose guard failed.
        clause: usize,
        /// The guard's error.
        #[source]
        source: GuardError,
    },

    /// A predicate pattern's function failed.
    #[error("predicate \"{predicate}\" failed: {source}")]
    PredicateEvaluation {
        /// Name of the predicate.
        predicate: String,
        /// The predicate's error.
        #[source]
        source: CallError,
    },

    /// No clause matched and the expression has no default clause.
    #[error("no clause matched the subject ({clauses} clauses tried, no default clause)")]
    MatchExhausted {
        /// Number of clauses that were tried.
        clauses: usize,
    },
}

impl MatchError {
    /// Returns `true` for [`MatchError::MatchExhausted`].
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        matches!(self, Self::MatchExhausted { .. })
    }
}
