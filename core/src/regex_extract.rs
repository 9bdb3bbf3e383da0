//! Regex extraction adapter
//!
//! Bridges text patterns into the [`Extractor`] protocol. Regex execution
//! itself belongs to an external engine behind [`RegexEngine`]; the default
//! engine is the `regex` crate (linear time, no catastrophic backtracking).
//!
//! # What a match produces
//!
//! For `(?<left>\d+) \+ (?<right>\d+)` against `"3 + 4"`:
//!
//! | Output | Shape | Destructured by |
//! |--------|-------|-----------------|
//! | `groups` | `["3 + 4", "3", "4"]` (group 0 first) | `[, left, right]` |
//! | `value` | `{ match: "3 + 4", index: 0, groups: ["3", "4"], named: { left: "3", right: "4" } }` | `{ groups: [left, right] }` |
//!
//! Optional groups that did not participate in the match become `Null`.
//! `index` is a UTF-8 byte offset into the text, not a character offset.

use crate::{ExtractResult, Extractor, Groups, PatternError, Value, MAX_REGEX_PATTERN_LENGTH};
use indexmap::IndexMap;
use std::fmt::{self, Debug};
use std::sync::Arc;

/// Capture groups of one successful regex execution.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Captures {
    /// Every group in order, group 0 (the whole match) first.
    pub positional: Vec<Option<String>>,
    /// Named groups, in the order they appear in the expression.
    pub named: IndexMap<String, Option<String>>,
    /// Byte offset of the whole match within the text.
    pub index: usize,
}

/// The external regex engine's single operation.
pub trait RegexEngine: Send + Sync + Debug {
    /// The expression this engine was compiled from.
    fn source(&self) -> &str;

    /// Execute against `text`; `None` when there is no match.
    fn execute(&self, text: &str) -> Option<Captures>;
}

impl RegexEngine for regex::Regex {
    fn source(&self) -> &str {
        self.as_str()
    }

    fn execute(&self, text: &str) -> Option<Captures> {
        let caps = self.captures(text)?;
        let index = caps.get(0).map_or(0, |m| m.start());
        let positional = caps
            .iter()
            .map(|group| group.map(|m| m.as_str().to_owned()))
            .collect();
        let named = self
            .capture_names()
            .flatten()
            .map(|name| {
                (
                    name.to_owned(),
                    caps.name(name).map(|m| m.as_str().to_owned()),
                )
            })
            .collect();
        Some(Captures {
            positional,
            named,
            index,
        })
    }
}

/// Compile `expression` with the default engine.
///
/// # Errors
///
/// - [`PatternError::PatternTooLong`] — longer than [`MAX_REGEX_PATTERN_LENGTH`]
/// - [`PatternError::InvalidRegex`] — the expression does not compile
pub fn compile_regex(expression: &str) -> Result<regex::Regex, PatternError> {
    if expression.len() > MAX_REGEX_PATTERN_LENGTH {
        return Err(PatternError::PatternTooLong {
            len: expression.len(),
            max: MAX_REGEX_PATTERN_LENGTH,
        });
    }
    regex::Regex::new(expression).map_err(|e| PatternError::InvalidRegex {
        pattern: expression.to_owned(),
        reason: e.to_string(),
    })
}

/// An [`Extractor`] over text subjects, backed by a [`RegexEngine`].
///
/// # Example
///
/// ```
/// use pmatch::{Extractor, RegexExtractor, Value};
///
/// let sum = RegexExtractor::compile(r"(?<left>\d+) \+ (?<right>\d+)").unwrap();
/// let result = sum.extract(&Value::from("3 + 4"));
/// assert!(result.matched);
///
/// let record = result.value.unwrap();
/// let named = record.as_mapping().unwrap()["named"].clone();
/// assert_eq!(named, Value::mapping([("left", "3"), ("right", "4")]));
/// ```
#[derive(Clone)]
pub struct RegexExtractor {
    engine: Arc<dyn RegexEngine>,
}

impl RegexExtractor {
    /// Use an already-built engine.
    #[must_use]
    pub fn new(engine: Arc<dyn RegexEngine>) -> Self {
        Self { engine }
    }

    /// Compile `expression` with the default engine.
    ///
    /// # Errors
    ///
    /// See [`compile_regex`].
    pub fn compile(expression: &str) -> Result<Self, PatternError> {
        Ok(Self::new(Arc::new(compile_regex(expression)?)))
    }

    /// The source expression.
    #[must_use]
    pub fn source(&self) -> &str {
        self.engine.source()
    }
}

impl Extractor for RegexExtractor {
    fn name(&self) -> &str {
        self.engine.source()
    }

    fn extract(&self, subject: &Value) -> ExtractResult {
        let Some(text) = subject.as_str() else {
            return ExtractResult::no_match();
        };
        match self.engine.execute(text) {
            Some(caps) => ExtractResult::matched()
                .with_value(match_record(&caps))
                .with_groups(Groups::Sequence(
                    caps.positional.iter().map(|g| Value::from(g.clone())).collect(),
                )),
            None => ExtractResult::no_match(),
        }
    }
}

impl Debug for RegexExtractor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RegexExtractor")
            .field(&self.engine.source())
            .finish()
    }
}

/// The mapping view of a match: `match`, `index` (UTF-8 byte offset),
/// `groups` (group 0 excluded), `named`.
fn match_record(caps: &Captures) -> Value {
    let whole = caps.positional.first().cloned().flatten();
    let groups: Vec<Value> = caps
        .positional
        .iter()
        .skip(1)
        .map(|g| Value::from(g.clone()))
        .collect();
    let named: IndexMap<String, Value> = caps
        .named
        .iter()
        .map(|(name, g)| (name.clone(), Value::from(g.clone())))
        .collect();

    let mut record = IndexMap::with_capacity(4);
    record.insert("match".to_owned(), Value::from(whole));
    #[allow(clippy::cast_precision_loss)]
    record.insert("index".to_owned(), Value::Number(caps.index as f64));
    record.insert("groups".to_owned(), Value::Sequence(groups));
    record.insert("named".to_owned(), Value::Mapping(named));
    Value::Mapping(record)
}
