//! Evaluation trace types for debugging match expressions.
//!
//! Use [`MatchExpr::evaluate_with_trace`](crate::MatchExpr::evaluate_with_trace)
//! to see every clause that was attempted, whether its pattern matched, what
//! it bound, and what its guard decided.
//!
//! # Example
//!
//! ```
//! use pmatch::{Clause, MatchExpr, Pattern, Scope, Value};
//!
//! let expr = MatchExpr::new(
//!     vec![
//!         Clause::new(Pattern::literal("north"), "up").unwrap(),
//!         Clause::new(Pattern::bind("dir"), "other").unwrap(),
//!     ],
//!     None,
//! );
//! let trace = expr.evaluate_with_trace(&Value::from("west"), &Scope::root()).unwrap();
//! assert_eq!(trace.steps.len(), 2);
//! assert!(!trace.steps[0].matched);
//! assert_eq!(trace.selected_clause(), Some(1));
//! ```

use crate::{Bindings, Selection};
use std::fmt;

/// Trace of a full [`MatchExpr`](crate::MatchExpr) evaluation.
///
/// # INV: `selected` == `evaluate()` selection
///
/// `selected` is what [`MatchExpr::evaluate`](crate::MatchExpr::evaluate)
/// would return for the same subject and scope. Exhaustion is reported as
/// `selected == None` instead of an error; guard errors and extractor
/// contract violations still fail the traced evaluation.
pub struct EvalTrace<'m, A> {
    /// The selection, if any clause or the default was selected.
    pub selected: Option<Selection<'m, A>>,
    /// Every clause attempted, in order. Stops at the selected clause.
    pub steps: Vec<ClauseStep>,
    /// Whether the default clause was used.
    pub used_default: bool,
}

impl<A> EvalTrace<'_, A> {
    /// Index of the selected clause; `None` for the default or exhaustion.
    #[must_use]
    pub fn selected_clause(&self) -> Option<usize> {
        self.selected.as_ref().and_then(|s| s.clause)
    }

    /// Returns `true` if nothing was selected.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.selected.is_none()
    }
}

impl<A: fmt::Debug> fmt::Debug for EvalTrace<'_, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EvalTrace")
            .field("selected", &self.selected)
            .field("steps", &self.steps)
            .field("used_default", &self.used_default)
            .finish()
    }
}

/// One clause attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct ClauseStep {
    /// Clause index (0-based).
    pub index: usize,
    /// Did the pattern match?
    pub matched: bool,
    /// What the guard decided.
    pub guard: GuardOutcome,
    /// Bindings of the pattern match (empty if it did not match).
    pub bindings: Bindings,
}

/// Guard decision for one clause attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardOutcome {
    /// The clause has no guard.
    Absent,
    /// The guard was truthy.
    Passed,
    /// The guard was falsy; evaluation moved to the next clause.
    Rejected,
    /// The pattern did not match, so the guard was not evaluated.
    NotReached,
}

impl GuardOutcome {
    /// Whether this outcome lets the clause be selected.
    #[must_use]
    pub fn admits(self) -> bool {
        matches!(self, Self::Absent | Self::Passed)
    }
}
