//! Clause-head desugaring
//!
//! A clause head has two optional halves: a *capture* target (`let <target>`)
//! and a *test* (`when <pattern>`). [`desugar`] folds them into the single
//! pattern the matcher runs.
//!
//! | capture | test | result |
//! |---------|------|--------|
//! | –       | –    | `Wildcard` |
//! | –       | `t`  | `t` |
//! | `c`     | –    | `c` |
//! | `c`     | bare extractor `E` | `Extractor { E, inner: c }` |
//! | `c`     | bare regex `R` | `Regex { R, groups_as: c }` |
//! | `c`     | anything else `t` | `Conjunction([t, c])` |
//!
//! The extractor row is the implicit-capture rule: `let val when Option.Some`
//! binds what `Some` *produces*, not the subject itself.

use crate::Pattern;

/// The two halves of a clause head before desugaring.
#[derive(Debug, Clone, Default)]
pub struct ClauseHead {
    /// The `let` target.
    pub capture: Option<Pattern>,
    /// The `when` pattern.
    pub test: Option<Pattern>,
}

impl ClauseHead {
    /// `when <test>`
    #[must_use]
    pub fn when(test: Pattern) -> Self {
        Self {
            capture: None,
            test: Some(test),
        }
    }

    /// `let <capture>`
    #[must_use]
    pub fn capture(capture: Pattern) -> Self {
        Self {
            capture: Some(capture),
            test: None,
        }
    }

    /// `let <capture> when <test>`
    #[must_use]
    pub fn capture_when(capture: Pattern, test: Pattern) -> Self {
        Self {
            capture: Some(capture),
            test: Some(test),
        }
    }

    /// Fold into one pattern; see [`desugar`].
    #[must_use]
    pub fn into_pattern(self) -> Pattern {
        desugar(self)
    }
}

/// Fold a clause head into one pattern.
#[must_use]
pub fn desugar(head: ClauseHead) -> Pattern {
    match (head.capture, head.test) {
        (None, None) => Pattern::Wildcard,
        (None, Some(test)) => test,
        (Some(capture), None) => capture,
        (
            Some(capture),
            Some(Pattern::Extractor {
                extractor,
                inner: None,
            }),
        ) => Pattern::Extractor {
            extractor,
            inner: Some(Box::new(capture)),
        },
        (
            Some(capture),
            Some(Pattern::Regex {
                extractor,
                groups_as: None,
            }),
        ) => Pattern::Regex {
            extractor,
            groups_as: Some(Box::new(capture)),
        },
        (Some(capture), Some(test)) => Pattern::Conjunction(vec![test, capture]),
    }
}
