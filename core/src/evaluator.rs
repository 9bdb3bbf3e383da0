//! `MatchExpr` — ordered clauses with first-match-wins semantics
//!
//! Evaluation walks the clauses top to bottom:
//!
//! ```text
//! Pending ─▶ Trying(i) ─┬─ NoMatch ──────────────▶ Pending(i + 1)
//!                       └─ Matched(b) ─▶ GuardCheck(i, b)
//!                                          ├─ falsy ─▶ Pending(i + 1)
//!                                          ├─ error ─▶ GuardEvaluation
//!                                          └─ truthy/absent ─▶ Selected(i, b)
//! Pending(past last) ─▶ default ─▶ Selected(default, {})
//!                    └─ no default ─▶ MatchExhausted
//! ```
//!
//! # INV: First-match-wins
//!
//! The first clause whose pattern matches and whose guard is truthy is
//! selected, even if later clauses would also match.
//!
//! # INV: No backtracking on guard failure
//!
//! A falsy guard moves to the next clause. Other ways the same clause's
//! pattern could have matched (a later alternation branch, say) are not
//! retried.

use crate::{
    Bindings, Clause, ClauseStep, EvalTrace, GuardOutcome, MatchError, MatchResult, PatternError,
    Scope, Value, MAX_CLAUSES,
};
use std::fmt;
use tracing::{debug, instrument, trace};

/// A clause selected by [`MatchExpr::evaluate`].
#[derive(Debug)]
pub struct Selection<'m, A> {
    /// Index of the selected clause; `None` for the default clause.
    pub clause: Option<usize>,
    /// The selected clause body.
    pub body: &'m A,
    /// Bindings of the selected clause (empty for the default clause).
    pub bindings: Bindings,
}

impl<A> Selection<'_, A> {
    /// Returns `true` if the default clause was selected.
    #[must_use]
    pub fn is_default(&self) -> bool {
        self.clause.is_none()
    }
}

/// An ordered list of clauses plus an optional default clause.
///
/// # Example
///
/// ```
/// use pmatch::{Clause, Compare, CompareOp, MatchExpr, Pattern, Scope, Value};
/// use std::sync::Arc;
///
/// // match (res) {
/// //   when { status: 200, body } -> "ok"
/// //   when { status } if status >= 500 -> "retry"
/// //   default -> "fail"
/// // }
/// let expr = MatchExpr::new(
///     vec![
///         Clause::new(
///             Pattern::mapping([("status", Pattern::literal(200)), ("body", Pattern::bind("body"))]),
///             "ok",
///         )
///         .unwrap(),
///         Clause::new(Pattern::mapping([Pattern::field("status")]), "retry")
///             .unwrap()
///             .with_guard(Arc::new(Compare::new("status", CompareOp::Ge, 500))),
///     ],
///     Some("fail"),
/// );
///
/// let res = Value::mapping([("status", 503)]);
/// let selection = expr.evaluate(&res, &Scope::root()).unwrap();
/// assert_eq!(*selection.body, "retry");
/// assert_eq!(selection.bindings.get("status"), Some(&Value::from(503)));
///
/// let res = Value::mapping([("status", 404)]);
/// assert!(expr.evaluate(&res, &Scope::root()).unwrap().is_default());
/// ```
pub struct MatchExpr<A> {
    clauses: Vec<Clause<A>>,
    default: Option<A>,
}

impl<A> MatchExpr<A> {
    /// Create a match expression.
    pub fn new(clauses: Vec<Clause<A>>, default: Option<A>) -> Self {
        Self { clauses, default }
    }

    /// Check the clause count against [`MAX_CLAUSES`].
    ///
    /// Patterns are already validated when their clauses are built.
    ///
    /// # Errors
    ///
    /// [`PatternError::TooManyClauses`].
    pub fn validate(&self) -> Result<(), PatternError> {
        if self.clauses.len() > MAX_CLAUSES {
            return Err(PatternError::TooManyClauses {
                count: self.clauses.len(),
                max: MAX_CLAUSES,
            });
        }
        Ok(())
    }

    #[must_use]
    pub fn clauses(&self) -> &[Clause<A>] {
        &self.clauses
    }

    #[must_use]
    pub fn default_body(&self) -> Option<&A> {
        self.default.as_ref()
    }

    #[must_use]
    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }

    /// Number of clauses, not counting the default.
    #[must_use]
    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Select the clause for `subject`.
    ///
    /// Guards run against `scope.child(bindings)`.
    ///
    /// # Errors
    ///
    /// - [`MatchError::MatchExhausted`] if nothing matched and there is no default
    /// - [`MatchError::GuardEvaluation`] if a guard failed
    /// - [`MatchError::PredicateEvaluation`] / [`MatchError::ExtractorContractViolation`]
    ///   from the patterns
    #[instrument(level = "debug", skip(self, subject, scope), fields(clauses = self.clauses.len()))]
    pub fn evaluate<'m>(
        &'m self,
        subject: &Value,
        scope: &Scope<'_>,
    ) -> Result<Selection<'m, A>, MatchError> {
        match self.select(subject, scope, None)? {
            Some(selection) => Ok(selection),
            None => self.fallback(),
        }
    }

    /// Evaluate, then hand the selected body and its scope to `f`.
    ///
    /// The body runs synchronously with `scope.child(bindings)`; its result
    /// is returned as-is.
    ///
    /// # Errors
    ///
    /// Same as [`evaluate`](Self::evaluate). Errors raised by the body itself
    /// are part of `R`.
    pub fn run<R, F>(&self, subject: &Value, scope: &Scope<'_>, f: F) -> Result<R, MatchError>
    where
        F: FnOnce(&A, &Scope<'_>) -> R,
    {
        let selection = self.evaluate(subject, scope)?;
        let body_scope = scope.child(selection.bindings);
        Ok(f(selection.body, &body_scope))
    }

    /// Evaluate and record every clause attempt.
    ///
    /// # Errors
    ///
    /// Same as [`evaluate`](Self::evaluate), except that exhaustion is
    /// reported as an [`EvalTrace`] with nothing selected.
    pub fn evaluate_with_trace<'m>(
        &'m self,
        subject: &Value,
        scope: &Scope<'_>,
    ) -> Result<EvalTrace<'m, A>, MatchError> {
        let mut steps = Vec::new();
        let selected = self.select(subject, scope, Some(&mut steps))?;
        let (selected, used_default) = match selected {
            Some(selection) => (Some(selection), false),
            None => match self.fallback() {
                Ok(selection) => (Some(selection), true),
                Err(_) => (None, false),
            },
        };
        Ok(EvalTrace {
            selected,
            steps,
            used_default,
        })
    }

    fn fallback(&self) -> Result<Selection<'_, A>, MatchError> {
        match &self.default {
            Some(body) => {
                debug!("no clause matched, using default");
                Ok(Selection {
                    clause: None,
                    body,
                    bindings: Bindings::new(),
                })
            }
            None => {
                debug!(clauses = self.clauses.len(), "match exhausted");
                Err(MatchError::MatchExhausted {
                    clauses: self.clauses.len(),
                })
            }
        }
    }

    fn select<'m>(
        &'m self,
        subject: &Value,
        scope: &Scope<'_>,
        mut steps: Option<&mut Vec<ClauseStep>>,
    ) -> Result<Option<Selection<'m, A>>, MatchError> {
        for (index, clause) in self.clauses.iter().enumerate() {
            let bindings = match clause.pattern().match_in_scope(subject, scope)? {
                MatchResult::Matched(bindings) => bindings,
                MatchResult::NoMatch => {
                    trace!(clause = index, "pattern did not match");
                    if let Some(steps) = steps.as_deref_mut() {
                        steps.push(ClauseStep {
                            index,
                            matched: false,
                            guard: GuardOutcome::NotReached,
                            bindings: Bindings::new(),
                        });
                    }
                    continue;
                }
            };

            let (outcome, bindings) = match clause.guard() {
                None => (GuardOutcome::Absent, bindings),
                Some(guard) => {
                    let guard_scope = scope.child(bindings);
                    let verdict = guard
                        .evaluate(&guard_scope)
                        .map_err(|source| MatchError::GuardEvaluation {
                            clause: index,
                            source,
                        })?;
                    let outcome = if verdict.is_truthy() {
                        GuardOutcome::Passed
                    } else {
                        GuardOutcome::Rejected
                    };
                    (outcome, guard_scope.into_frame())
                }
            };
            trace!(clause = index, guard = ?outcome, "pattern matched");

            if let Some(steps) = steps.as_deref_mut() {
                steps.push(ClauseStep {
                    index,
                    matched: true,
                    guard: outcome,
                    bindings: bindings.clone(),
                });
            }

            if outcome.admits() {
                debug!(clause = index, bindings = bindings.len(), "clause selected");
                return Ok(Some(Selection {
                    clause: Some(index),
                    body: clause.body(),
                    bindings,
                }));
            }
        }
        Ok(None)
    }
}

impl<A: fmt::Debug> fmt::Debug for MatchExpr<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MatchExpr")
            .field("clauses", &self.clauses)
            .field("default", &self.default)
            .finish()
    }
}
