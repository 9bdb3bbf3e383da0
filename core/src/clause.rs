//! Clause — a compiled pattern, an optional guard, and a body

use crate::{desugar, ClauseHead, CompiledPattern, Guard, Pattern, PatternError};
use std::fmt;
use std::sync::Arc;

/// One arm of a match expression.
///
/// The body is opaque to the engine: it is handed back to the caller on
/// selection, together with the clause's bindings.
pub struct Clause<A> {
    pattern: CompiledPattern,
    guard: Option<Arc<dyn Guard>>,
    body: A,
}

impl<A> Clause<A> {
    /// Compile `pattern` into an unguarded clause.
    ///
    /// # Errors
    ///
    /// Any [`PatternError`] from [`CompiledPattern::new`].
    pub fn new(pattern: Pattern, body: A) -> Result<Self, PatternError> {
        Ok(Self::compiled(CompiledPattern::new(pattern)?, body))
    }

    /// Build from an already compiled pattern.
    pub fn compiled(pattern: CompiledPattern, body: A) -> Self {
        Self {
            pattern,
            guard: None,
            body,
        }
    }

    /// Desugar `let <capture> when <test>` and compile it.
    ///
    /// # Errors
    ///
    /// Any [`PatternError`] from [`CompiledPattern::new`].
    pub fn from_head(head: ClauseHead, body: A) -> Result<Self, PatternError> {
        Self::new(desugar(head), body)
    }

    /// Attach a guard, replacing any previous one.
    #[must_use]
    pub fn with_guard(mut self, guard: Arc<dyn Guard>) -> Self {
        self.guard = Some(guard);
        self
    }

    #[must_use]
    pub fn pattern(&self) -> &CompiledPattern {
        &self.pattern
    }

    #[must_use]
    pub fn guard(&self) -> Option<&Arc<dyn Guard>> {
        self.guard.as_ref()
    }

    #[must_use]
    pub fn body(&self) -> &A {
        &self.body
    }
}

impl<A: fmt::Debug> fmt::Debug for Clause<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Clause")
            .field("pattern", &self.pattern)
            .field("guard", &self.guard)
            .field("body", &self.body)
            .finish()
    }
}
