//! Matcher — structural matching of one pattern against one subject
//!
//! The matcher walks a [`CompiledPattern`] top-down against a subject and
//! either produces the [`Bindings`] of a successful match or reports
//! [`MatchResult::NoMatch`]. A non-match is a value, never an error;
//! [`MatchError`] is reserved for broken extensions (a predicate that fails,
//! an extractor that breaks its contract).
//!
//! # INV: Purity
//!
//! The subject is only ever borrowed. Matching the same pattern against the
//! same subject yields the same result, provided extractors and predicates
//! are themselves pure.
//!
//! # INV: Ordered short-circuit
//!
//! Sequence elements, mapping fields, conjunction members and alternation
//! branches are tried left to right, and evaluation stops at the first
//! decisive result. A later alternation branch is never evaluated once an
//! earlier one matched.

use crate::{
    Bindings, CompiledPattern, Element, ExtractResult, Extractor, Groups, MatchError, Pattern,
    Scope, Shape, Value,
};
use indexmap::IndexMap;
use tracing::{trace, warn};

/// Outcome of matching one pattern against one subject.
#[derive(Debug, Clone, PartialEq)]
pub enum MatchResult {
    /// The subject does not have the pattern's shape.
    NoMatch,
    /// The subject matched; every binder of the pattern is bound.
    Matched(Bindings),
}

impl MatchResult {
    /// Returns `true` for [`MatchResult::Matched`].
    #[must_use]
    pub fn is_match(&self) -> bool {
        matches!(self, Self::Matched(_))
    }

    /// Bindings of a successful match.
    #[must_use]
    pub fn bindings(&self) -> Option<&Bindings> {
        match self {
            Self::Matched(b) => Some(b),
            Self::NoMatch => None,
        }
    }

    /// Consume into the bindings of a successful match.
    #[must_use]
    pub fn into_bindings(self) -> Option<Bindings> {
        match self {
            Self::Matched(b) => Some(b),
            Self::NoMatch => None,
        }
    }
}

impl CompiledPattern {
    /// Match `subject` with an empty enclosing scope.
    ///
    /// # Errors
    ///
    /// [`MatchError::PredicateEvaluation`] or
    /// [`MatchError::ExtractorContractViolation`].
    pub fn match_value(&self, subject: &Value) -> Result<MatchResult, MatchError> {
        self.match_in_scope(subject, &Scope::root())
    }

    /// Match `subject`; predicate patterns see `scope`.
    ///
    /// # Errors
    ///
    /// [`MatchError::PredicateEvaluation`] or
    /// [`MatchError::ExtractorContractViolation`].
    pub fn match_in_scope(
        &self,
        subject: &Value,
        scope: &Scope<'_>,
    ) -> Result<MatchResult, MatchError> {
        let mut out = Bindings::new();
        if match_node(self.pattern(), subject, scope, &mut out)? {
            Ok(MatchResult::Matched(out))
        } else {
            Ok(MatchResult::NoMatch)
        }
    }
}

/// Match one node, appending bindings to `out`.
///
/// On `Ok(false)` `out` may hold partial bindings; callers that continue
/// after a failure (alternation) roll them back.
fn match_node(
    pattern: &Pattern,
    subject: &Value,
    scope: &Scope<'_>,
    out: &mut Bindings,
) -> Result<bool, MatchError> {
    match pattern {
        Pattern::Literal(expected) => Ok(subject == expected),
        Pattern::Wildcard => Ok(true),
        Pattern::Binder(name) => {
            out.bind(name, subject.clone());
            Ok(true)
        }
        Pattern::Sequence { elements, rest } => {
            match_sequence(elements, rest.as_deref(), subject, scope, out)
        }
        Pattern::Mapping { fields, rest } => {
            match_mapping(fields, rest.as_deref(), subject, scope, out)
        }
        Pattern::Alternation(branches) => {
            let mark = out.len();
            for branch in branches {
                if match_node(branch, subject, scope, out)? {
                    return Ok(true);
                }
                out.truncate(mark);
            }
            Ok(false)
        }
        Pattern::Conjunction(patterns) => {
            for p in patterns {
                if !match_node(p, subject, scope, out)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        Pattern::Predicate(f) => {
            let verdict = f
                .call(subject, scope)
                .map_err(|source| MatchError::PredicateEvaluation {
                    predicate: f.name().to_owned(),
                    source,
                })?;
            Ok(verdict.is_truthy())
        }
        Pattern::Extractor { extractor, inner } => {
            let result = extractor.extract(subject);
            match_extracted(extractor.as_ref(), result, inner.as_deref(), scope, out)
        }
        Pattern::Regex {
            extractor,
            groups_as,
        } => {
            let result = extractor.extract(subject);
            match_extracted(extractor.as_ref(), result, groups_as.as_deref(), scope, out)
        }
    }
}

fn match_sequence(
    elements: &[Element],
    rest: Option<&str>,
    subject: &Value,
    scope: &Scope<'_>,
    out: &mut Bindings,
) -> Result<bool, MatchError> {
    let Some(items) = subject.as_sequence() else {
        return Ok(false);
    };
    let fits = match rest {
        Some(_) => items.len() >= elements.len(),
        None => items.len() == elements.len(),
    };
    if !fits {
        return Ok(false);
    }

    for (element, item) in elements.iter().zip(items) {
        if let Element::Pattern(p) = element {
            if !match_node(p, item, scope, out)? {
                return Ok(false);
            }
        }
    }

    if let Some(rest) = rest {
        out.bind(rest, Value::Sequence(items[elements.len()..].to_vec()));
    }
    Ok(true)
}

fn match_mapping(
    fields: &[(String, Pattern)],
    rest: Option<&str>,
    subject: &Value,
    scope: &Scope<'_>,
    out: &mut Bindings,
) -> Result<bool, MatchError> {
    let Some(map) = subject.as_mapping() else {
        return Ok(false);
    };

    for (key, p) in fields {
        let Some(value) = map.get(key) else {
            return Ok(false);
        };
        if !match_node(p, value, scope, out)? {
            return Ok(false);
        }
    }

    if let Some(rest) = rest {
        let remaining: IndexMap<String, Value> = map
            .iter()
            .filter(|(k, _)| !fields.iter().any(|(named, _)| named == *k))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        out.bind(rest, Value::Mapping(remaining));
    }
    Ok(true)
}

fn match_extracted(
    extractor: &dyn Extractor,
    result: ExtractResult,
    inner: Option<&Pattern>,
    scope: &Scope<'_>,
    out: &mut Bindings,
) -> Result<bool, MatchError> {
    if !result.matched {
        trace!(extractor = extractor.name(), "extractor rejected subject");
        return Ok(false);
    }
    let Some(inner) = inner else {
        return Ok(true);
    };
    let target = destructure_target(extractor.name(), result, inner)?;
    match_node(inner, &target, scope, out)
}

/// Pick what the inner pattern of an extractor destructures.
///
/// Shape-matching groups win, then the produced value, then groups as a
/// plain value when the inner pattern does not demand the other shape. The
/// demanded shape looks through alternations and conjunctions ([`Pattern::shape`]).
fn destructure_target(
    name: &str,
    result: ExtractResult,
    inner: &Pattern,
) -> Result<Value, MatchError> {
    let ExtractResult { value, groups, .. } = result;
    let shape = inner.shape();

    let groups = match groups {
        Some(Groups::Sequence(items)) if shape == Shape::Sequence => {
            return Ok(Value::Sequence(items))
        }
        Some(Groups::Mapping(map)) if shape == Shape::Mapping => return Ok(Value::Mapping(map)),
        other => other,
    };

    if let Some(value) = value {
        return Ok(value);
    }

    let reason = match groups {
        Some(groups) if matches!(shape, Shape::Any | Shape::Mixed) => {
            return Ok(groups.to_value());
        }
        Some(groups) => format!(
            "produced {} groups and no value, but the pattern destructures a {}",
            groups.kind(),
            if shape == Shape::Sequence { "sequence" } else { "mapping" },
        ),
        None => "reported a match but produced neither a value nor groups to destructure"
            .to_owned(),
    };
    warn!(extractor = name, %reason, "extractor contract violation");
    Err(MatchError::ExtractorContractViolation {
        extractor: name.to_owned(),
        reason,
    })
}
