//! Pattern AST and construction-time validation
//!
//! A [`Pattern`] is an immutable tree with one node per matching rule. It is
//! built once and reused across any number of match evaluations.
//!
//! Before anything is matched, a pattern goes through [`CompiledPattern::new`],
//! which rejects ambiguous or malformed trees as a whole:
//!
//! - the same binder declared by two non-alternative siblings
//! - alternation branches that bind different name sets
//! - empty alternations/conjunctions, repeated mapping keys
//! - trees deeper than [`MAX_PATTERN_DEPTH`] or wider than [`MAX_BRANCHES`]
//!
//! The matcher only accepts a `CompiledPattern`, so a pattern that fails these
//! checks can never be half-matched.

use crate::{
    Callable, Extractor, PatternError, RegexExtractor, Value, MAX_BRANCHES, MAX_PATTERN_DEPTH,
};
use std::collections::HashSet;
use std::sync::Arc;

/// One position of a sequence pattern.
#[derive(Debug, Clone)]
pub enum Element {
    /// Match this position against a pattern.
    Pattern(Pattern),
    /// Skip this position: always matches, binds nothing.
    Hole,
}

impl Element {
    /// A hole, as in `[, dir]`.
    #[must_use]
    pub fn hole() -> Self {
        Self::Hole
    }
}

impl From<Pattern> for Element {
    fn from(pattern: Pattern) -> Self {
        Self::Pattern(pattern)
    }
}

/// A pattern tree.
///
/// # Example
///
/// ```
/// use pmatch::{CompiledPattern, Pattern, Value};
///
/// // { status: 200, body, ...rest }
/// let pattern = Pattern::mapping_with_rest(
///     [("status", Pattern::literal(200)), ("body", Pattern::bind("body"))],
///     "rest",
/// );
/// let compiled = CompiledPattern::new(pattern).unwrap();
/// assert_eq!(compiled.binders(), ["body", "rest"]);
///
/// let res = Value::mapping([("status", Value::from(200)), ("body", Value::from("x"))]);
/// assert!(compiled.match_value(&res).unwrap().is_match());
/// ```
#[derive(Debug, Clone)]
pub enum Pattern {
    /// Matches a value equal to this one.
    Literal(Value),

    /// Matches anything, binds nothing.
    Wildcard,

    /// Matches anything, binds the subject to the name.
    Binder(String),

    /// Matches a sequence position by position, optionally capturing the rest.
    Sequence {
        /// Positional element patterns.
        elements: Vec<Element>,
        /// Name bound to the remaining elements, if any.
        rest: Option<String>,
    },

    /// Matches a mapping key by key, optionally capturing the other keys.
    Mapping {
        /// `(key, pattern)` pairs; every key must be present.
        fields: Vec<(String, Pattern)>,
        /// Name bound to a mapping of the keys not named in `fields`.
        rest: Option<String>,
    },

    /// Matches if any branch matches, tried in order.
    Alternation(Vec<Pattern>),

    /// Matches if every member matches the same subject, tried in order.
    Conjunction(Vec<Pattern>),

    /// Matches if the function returns a truthy value for the subject.
    Predicate(Arc<dyn Callable>),

    /// Matches through an extractor, then destructures its output with `inner`.
    Extractor {
        /// The extractor attached to this pattern position.
        extractor: Arc<dyn Extractor>,
        /// Pattern for the extractor's value or groups.
        inner: Option<Box<Pattern>>,
    },

    /// Matches text against a regular expression, then destructures the captures.
    Regex {
        /// The regex adapter.
        extractor: Arc<RegexExtractor>,
        /// Pattern for the capture groups or the match record.
        groups_as: Option<Box<Pattern>>,
    },
}

impl Pattern {
    /// Matches subjects equal to `value`.
    pub fn literal(value: impl Into<Value>) -> Self {
        Self::Literal(value.into())
    }

    #[must_use]
    pub fn wildcard() -> Self {
        Self::Wildcard
    }

    /// Matches anything and binds it to `name`.
    pub fn bind(name: impl Into<String>) -> Self {
        Self::Binder(name.into())
    }

    /// Exact-length sequence pattern.
    pub fn sequence<I, E>(elements: I) -> Self
    where
        I: IntoIterator<Item = E>,
        E: Into<Element>,
    {
        Self::Sequence {
            elements: elements.into_iter().map(Into::into).collect(),
            rest: None,
        }
    }

    /// Sequence pattern binding the remaining elements to `rest`.
    pub fn sequence_with_rest<I, E>(elements: I, rest: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = E>,
        E: Into<Element>,
    {
        Self::Sequence {
            elements: elements.into_iter().map(Into::into).collect(),
            rest: Some(rest.into()),
        }
    }

    /// Mapping pattern; extra keys in the subject are ignored.
    pub fn mapping<I, K>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, Pattern)>,
        K: Into<String>,
    {
        Self::Mapping {
            fields: fields.into_iter().map(|(k, p)| (k.into(), p)).collect(),
            rest: None,
        }
    }

    /// Mapping pattern binding the un-named keys to `rest`.
    pub fn mapping_with_rest<I, K>(fields: I, rest: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = (K, Pattern)>,
        K: Into<String>,
    {
        Self::Mapping {
            fields: fields.into_iter().map(|(k, p)| (k.into(), p)).collect(),
            rest: Some(rest.into()),
        }
    }

    /// Shorthand field `{ name }`: key `name` bound to the binder `name`.
    pub fn field(name: impl Into<String>) -> (String, Pattern) {
        let name = name.into();
        (name.clone(), Self::Binder(name))
    }

    /// `a or b or …`
    pub fn any_of(branches: impl IntoIterator<Item = Pattern>) -> Self {
        Self::Alternation(branches.into_iter().collect())
    }

    /// `a and b and …`
    pub fn all_of(patterns: impl IntoIterator<Item = Pattern>) -> Self {
        Self::Conjunction(patterns.into_iter().collect())
    }

    /// Matches when `f` returns a truthy value for the subject.
    pub fn predicate(f: Arc<dyn Callable>) -> Self {
        Self::Predicate(f)
    }

    /// Bare extractor use: accept or reject, bind nothing.
    pub fn extract(extractor: Arc<dyn Extractor>) -> Self {
        Self::Extractor {
            extractor,
            inner: None,
        }
    }

    /// Extractor use whose output is destructured by `inner`.
    pub fn extract_into(extractor: Arc<dyn Extractor>, inner: Pattern) -> Self {
        Self::Extractor {
            extractor,
            inner: Some(Box::new(inner)),
        }
    }

    /// Regex test on a text subject, binding nothing.
    ///
    /// # Errors
    ///
    /// [`PatternError::InvalidRegex`] or [`PatternError::PatternTooLong`].
    pub fn regex(expression: &str) -> Result<Self, PatternError> {
        Ok(Self::Regex {
            extractor: Arc::new(RegexExtractor::compile(expression)?),
            groups_as: None,
        })
    }

    /// Regex test whose captures are destructured by `groups_as`.
    ///
    /// # Errors
    ///
    /// [`PatternError::InvalidRegex`] or [`PatternError::PatternTooLong`].
    pub fn regex_into(expression: &str, groups_as: Pattern) -> Result<Self, PatternError> {
        Ok(Self::Regex {
            extractor: Arc::new(RegexExtractor::compile(expression)?),
            groups_as: Some(Box::new(groups_as)),
        })
    }

    /// Returns `true` for sequence patterns.
    #[must_use]
    pub fn is_sequence(&self) -> bool {
        matches!(self, Self::Sequence { .. })
    }

    /// Returns `true` for mapping patterns.
    #[must_use]
    pub fn is_mapping(&self) -> bool {
        matches!(self, Self::Mapping { .. })
    }

    /// The structure this pattern destructures.
    ///
    /// Alternations and conjunctions take the shape their members agree on;
    /// members that accept anything do not vote.
    #[must_use]
    pub fn shape(&self) -> Shape {
        match self {
            Self::Sequence { .. } => Shape::Sequence,
            Self::Mapping { .. } => Shape::Mapping,
            Self::Alternation(members) | Self::Conjunction(members) => members
                .iter()
                .map(Pattern::shape)
                .fold(Shape::Any, Shape::join),
            _ => Shape::Any,
        }
    }
}

/// What an extractor's inner pattern wants to destructure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// No structural demand (binders, wildcards, literals, predicates, extractors).
    Any,
    Sequence,
    Mapping,
    /// Members demand both sequences and mappings.
    Mixed,
}

impl Shape {
    fn join(self, other: Shape) -> Shape {
        match (self, other) {
            (Shape::Any, s) | (s, Shape::Any) => s,
            (a, b) if a == b => a,
            _ => Shape::Mixed,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Compilation
// ═══════════════════════════════════════════════════════════════════════════════

/// A validated pattern, ready to match.
///
/// Cheap to clone; the tree is shared.
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    pattern: Arc<Pattern>,
    binders: Vec<String>,
    depth: usize,
}

impl CompiledPattern {
    /// Validate `pattern`.
    ///
    /// # Errors
    ///
    /// - [`PatternError::AmbiguousBinding`]
    /// - [`PatternError::InconsistentAlternationBindings`]
    /// - [`PatternError::EmptyAlternation`] / [`PatternError::EmptyConjunction`]
    /// - [`PatternError::DuplicateKey`]
    /// - [`PatternError::DepthExceeded`] / [`PatternError::TooManyBranches`]
    pub fn new(pattern: Pattern) -> Result<Self, PatternError> {
        let analysis = analyze(&pattern, 1)?;
        Ok(Self {
            pattern: Arc::new(pattern),
            binders: analysis.binders,
            depth: analysis.depth,
        })
    }

    /// The underlying tree.
    #[must_use]
    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    /// Every name a successful match binds, in declaration order.
    #[must_use]
    pub fn binders(&self) -> &[String] {
        &self.binders
    }

    /// Nesting depth of the tree (a leaf has depth 1).
    #[must_use]
    pub fn depth(&self) -> usize {
        self.depth
    }
}

impl TryFrom<Pattern> for CompiledPattern {
    type Error = PatternError;

    fn try_from(pattern: Pattern) -> Result<Self, Self::Error> {
        Self::new(pattern)
    }
}

struct Analysis {
    binders: Vec<String>,
    depth: usize,
}

impl Analysis {
    fn leaf(level: usize) -> Self {
        Self {
            binders: Vec::new(),
            depth: level,
        }
    }

    fn declare(&mut self, name: &str) -> Result<(), PatternError> {
        if self.binders.iter().any(|b| b == name) {
            return Err(PatternError::AmbiguousBinding {
                name: name.to_owned(),
            });
        }
        self.binders.push(name.to_owned());
        Ok(())
    }

    /// Merge a non-alternative sibling: its names must be new.
    fn sibling(&mut self, other: Analysis) -> Result<(), PatternError> {
        for name in &other.binders {
            self.declare(name)?;
        }
        self.depth = self.depth.max(other.depth);
        Ok(())
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

fn sorted(names: &[String]) -> Vec<String> {
    let mut names = names.to_vec();
    names.sort_unstable();
    names
}

fn analyze(pattern: &Pattern, level: usize) -> Result<Analysis, PatternError> {
    if level > MAX_PATTERN_DEPTH {
        return Err(PatternError::DepthExceeded {
            depth: level,
            max: MAX_PATTERN_DEPTH,
        });
    }

    match pattern {
        Pattern::Literal(_) | Pattern::Wildcard | Pattern::Predicate(_) => {
            Ok(Analysis::leaf(level))
        }
        Pattern::Binder(name) => {
            let mut a = Analysis::leaf(level);
            a.declare(name)?;
            Ok(a)
        }
        Pattern::Sequence { elements, rest } => {
            check_width(elements.len())?;
            let mut a = Analysis::leaf(level);
            for element in elements {
                if let Element::Pattern(p) = element {
                    a.sibling(analyze(p, level + 1)?)?;
                }
            }
            if let Some(rest) = rest {
                a.declare(rest)?;
            }
            Ok(a)
        }
        Pattern::Mapping { fields, rest } => {
            check_width(fields.len())?;
            let mut keys = HashSet::with_capacity(fields.len());
            let mut a = Analysis::leaf(level);
            for (key, p) in fields {
                if !keys.insert(key.as_str()) {
                    return Err(PatternError::DuplicateKey { key: key.clone() });
                }
                a.sibling(analyze(p, level + 1)?)?;
            }
            if let Some(rest) = rest {
                a.declare(rest)?;
            }
            Ok(a)
        }
        Pattern::Alternation(branches) => {
            let Some((first, others)) = branches.split_first() else {
                return Err(PatternError::EmptyAlternation);
            };
            check_width(branches.len())?;
            let mut a = analyze(first, level + 1)?;
            let expected = sorted(&a.binders);
            for (i, branch) in others.iter().enumerate() {
                let b = analyze(branch, level + 1)?;
                let found = sorted(&b.binders);
                if found != expected {
                    return Err(PatternError::InconsistentAlternationBindings {
                        expected,
                        found,
                        branch: i + 1,
                    });
                }
                a.depth = a.depth.max(b.depth);
            }
            a.depth = a.depth.max(level);
            Ok(a)
        }
        Pattern::Conjunction(patterns) => {
            if patterns.is_empty() {
                return Err(PatternError::EmptyConjunction);
            }
            check_width(patterns.len())?;
            let mut a = Analysis::leaf(level);
            for p in patterns {
                a.sibling(analyze(p, level + 1)?)?;
            }
            Ok(a)
        }
        Pattern::Extractor { inner, .. } => match inner {
            Some(inner) => {
                let mut a = Analysis::leaf(level);
                a.sibling(analyze(inner, level + 1)?)?;
                Ok(a)
            }
            None => Ok(Analysis::leaf(level)),
        },
        Pattern::Regex { groups_as, .. } => match groups_as {
            Some(groups_as) => {
                let mut a = Analysis::leaf(level);
                a.sibling(analyze(groups_as, level + 1)?)?;
                Ok(a)
            }
            None => Ok(Analysis::leaf(level)),
        },
    }
}
