//! Conformance fixture runner
//!
//! Loads YAML fixtures and runs them against the pmatch engine through the
//! registry, so every fixture also exercises the config loader.
//!
//! ```yaml
//! name: option_some_none
//! description: Option values only open up through their extractors
//! expression:
//!   clauses:
//!     - pattern:
//!         type: extractor
//!         extractor: { type_url: test.v1.OptionSome }
//!         inner: { type: bind, name: val }
//!       body: some
//!   default: other
//! cases:
//!   - name: some
//!     subject: { $some: 42 }
//!     expect: some
//!     bindings: { val: 42 }
//! ```
//!
//! Subjects, scopes and expected bindings are JSON with three escape forms for
//! values JSON cannot express: `{ $some: v }`, `{ $none: null }` and
//! `{ $const: NAME }` (a registered constant such as `LF`).
//!
//! A case with `expect: null` (or no `expect`) expects exhaustion; a case with
//! `error` expects evaluation to fail with a message containing that text. A
//! fixture with `load_error` expects the expression itself to be rejected.

use crate::{option_none, option_some};
use pmatch::{Bindings, MatchConfig, PatternError, Registry, RegistryBuilder, Scope, Value};
use serde::Deserialize;
use thiserror::Error;

/// A complete test fixture
#[derive(Debug, Deserialize)]
pub struct Fixture {
    pub name: String,
    pub description: String,
    pub expression: MatchConfig<String>,
    #[serde(default)]
    pub load_error: Option<String>,
    #[serde(default)]
    pub cases: Vec<TestCase>,
}

/// Test case
#[derive(Debug, Deserialize)]
pub struct TestCase {
    pub name: String,
    pub subject: serde_json::Value,
    /// Bindings of the enclosing scope, visible to guards and predicates.
    #[serde(default)]
    pub scope: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    pub expect: Option<String>,
    #[serde(default)]
    pub bindings: Option<serde_json::Map<String, serde_json::Value>>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Errors that stop a fixture before its cases can be judged.
#[derive(Debug, Error)]
pub enum FixtureError {
    #[error("fixture \"{fixture}\" failed to load: {reason}")]
    Load {
        fixture: String,
        #[source]
        reason: PatternError,
    },

    #[error("fixture \"{fixture}\" loaded, expected a load error containing \"{expected}\"")]
    UnexpectedLoad { fixture: String, expected: String },

    #[error("unknown constant \"{0}\"")]
    UnknownConstant(String),

    #[error("malformed escape {0}")]
    MalformedEscape(serde_json::Value),
}

// ═══════════════════════════════════════════════════════════════════════════════
// Value decoding
// ═══════════════════════════════════════════════════════════════════════════════

/// Decode fixture JSON into a [`Value`], resolving escape forms.
///
/// # Errors
///
/// Returns [`FixtureError`] for unknown constants or malformed escapes.
pub fn decode(json: &serde_json::Value, registry: &Registry) -> Result<Value, FixtureError> {
    match json {
        serde_json::Value::Array(items) => Ok(Value::Sequence(
            items
                .iter()
                .map(|item| decode(item, registry))
                .collect::<Result<_, _>>()?,
        )),
        serde_json::Value::Object(map) => {
            if let Some((key, inner)) = single_entry(map).filter(|(k, _)| k.starts_with('$')) {
                return decode_escape(key, inner, registry);
            }
            let entries = map
                .iter()
                .map(|(k, v)| Ok((k.clone(), decode(v, registry)?)))
                .collect::<Result<Vec<_>, FixtureError>>()?;
            Ok(Value::mapping(entries))
        }
        scalar => Ok(Value::from(scalar.clone())),
    }
}

fn single_entry(
    map: &serde_json::Map<String, serde_json::Value>,
) -> Option<(&str, &serde_json::Value)> {
    let mut entries = map.iter();
    match (entries.next(), entries.next()) {
        (Some((k, v)), None) => Some((k.as_str(), v)),
        _ => None,
    }
}

fn decode_escape(
    key: &str,
    inner: &serde_json::Value,
    registry: &Registry,
) -> Result<Value, FixtureError> {
    match key {
        "$some" => Ok(option_some(decode(inner, registry)?)),
        "$none" => Ok(option_none()),
        "$const" => {
            let name = inner
                .as_str()
                .ok_or_else(|| FixtureError::MalformedEscape(inner.clone()))?;
            registry
                .constant_value(name)
                .cloned()
                .ok_or_else(|| FixtureError::UnknownConstant(name.to_string()))
        }
        _ => {
            let mut escape = serde_json::Map::new();
            escape.insert(key.to_string(), inner.clone());
            Err(FixtureError::MalformedEscape(serde_json::Value::Object(escape)))
        }
    }
}

fn decode_map(
    map: &serde_json::Map<String, serde_json::Value>,
    registry: &Registry,
) -> Result<Bindings, FixtureError> {
    map.iter()
        .map(|(k, v)| Ok((k.clone(), decode(v, registry)?)))
        .collect()
}

// ═══════════════════════════════════════════════════════════════════════════════
// Runner
// ═══════════════════════════════════════════════════════════════════════════════

/// Result of running a single test case
#[derive(Debug)]
pub struct CaseResult {
    pub case_name: String,
    pub passed: bool,
    pub expected: Option<String>,
    pub actual: Option<String>,
    /// Why a case failed beyond a body mismatch.
    pub detail: Option<String>,
}

/// The registry fixtures run against: core extractors plus the test domain.
#[must_use]
pub fn default_registry() -> Registry {
    crate::register(RegistryBuilder::new()).build()
}

impl Fixture {
    /// Parse a fixture from YAML
    ///
    /// # Errors
    ///
    /// Returns the YAML error if the document is not a fixture.
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    /// Parse multiple fixtures from a YAML file with `---` separators
    ///
    /// # Errors
    ///
    /// Returns the first document's YAML error.
    pub fn from_yaml_multi(yaml: &str) -> Result<Vec<Self>, serde_yaml::Error> {
        let mut fixtures = Vec::new();
        for doc in serde_yaml::Deserializer::from_str(yaml) {
            fixtures.push(Self::deserialize(doc)?);
        }
        Ok(fixtures)
    }

    /// Load the expression and run all test cases.
    ///
    /// # Errors
    ///
    /// Returns [`FixtureError`] when the expression does not load as the
    /// fixture expects, or when a case's JSON cannot be decoded.
    pub fn run(&self, registry: &Registry) -> Result<Vec<CaseResult>, FixtureError> {
        let loaded = registry.load_match(self.expression.clone());

        let expr = match (loaded, &self.load_error) {
            (Ok(expr), None) => expr,
            (Ok(_), Some(expected)) => {
                return Err(FixtureError::UnexpectedLoad {
                    fixture: self.name.clone(),
                    expected: expected.clone(),
                })
            }
            (Err(e), Some(expected)) if e.to_string().contains(expected.as_str()) => {
                return Ok(Vec::new())
            }
            (Err(reason), _) => {
                return Err(FixtureError::Load {
                    fixture: self.name.clone(),
                    reason,
                })
            }
        };

        self.cases
            .iter()
            .map(|case| {
                let subject = decode(&case.subject, registry)?;
                let scope = Scope::from_bindings(decode_map(&case.scope, registry)?);
                let expected_bindings = case
                    .bindings
                    .as_ref()
                    .map(|map| decode_map(map, registry))
                    .transpose()?;

                let (actual, detail) = match expr.evaluate(&subject, &scope) {
                    Ok(selection) => {
                        let detail = match (&case.error, &expected_bindings) {
                            (Some(expected), _) => {
                                Some(format!("expected error containing \"{expected}\""))
                            }
                            (None, Some(expected)) => {
                                bindings_mismatch(expected, &selection.bindings)
                            }
                            (None, None) => None,
                        };
                        (Some(selection.body.clone()), detail)
                    }
                    Err(e) if e.is_exhausted() && case.error.is_none() => (None, None),
                    Err(e) => {
                        let message = e.to_string();
                        let detail = match &case.error {
                            Some(expected) if message.contains(expected.as_str()) => None,
                            _ => Some(message),
                        };
                        (None, detail)
                    }
                };

                Ok(CaseResult {
                    case_name: case.name.clone(),
                    passed: actual == case.expect && detail.is_none(),
                    expected: case.expect.clone(),
                    actual,
                    detail,
                })
            })
            .collect()
    }

    /// Run all test cases and panic on first failure
    pub fn run_and_assert(&self) {
        let results = self
            .run(&default_registry())
            .unwrap_or_else(|e| panic!("Fixture '{}': {e}", self.name));
        for result in results {
            assert!(
                result.passed,
                "Fixture '{}' case '{}' failed: expected {:?}, got {:?}{}",
                self.name,
                result.case_name,
                result.expected,
                result.actual,
                result.detail.map(|d| format!(" ({d})")).unwrap_or_default()
            );
        }
    }
}

fn bindings_mismatch(expected: &Bindings, actual: &Bindings) -> Option<String> {
    let same = expected.len() == actual.len()
        && expected
            .iter()
            .all(|(name, value)| actual.get(name) == Some(value));
    (!same).then(|| format!("expected bindings {expected:?}, got {actual:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lf;
    use pretty_assertions::assert_eq;

    #[test]
    fn decode_resolves_escapes() {
        let registry = default_registry();
        let json = serde_json::json!({
            "opt": { "$some": [1, { "$none": null }] },
            "eol": { "$const": "LF" },
            "plain": { "a": 1 }
        });

        let value = decode(&json, &registry).unwrap();
        let map = value.as_mapping().unwrap();
        assert_eq!(
            map["opt"],
            option_some(Value::sequence([Value::from(1), option_none()]))
        );
        assert_eq!(map["eol"], lf());
        assert_eq!(map["plain"], Value::mapping([("a", 1)]));
    }

    #[test]
    fn decode_rejects_unknown_constant() {
        let err = decode(&serde_json::json!({ "$const": "TAB" }), &default_registry()).unwrap_err();
        assert!(matches!(err, FixtureError::UnknownConstant(name) if name == "TAB"));
    }

    #[test]
    fn run_reports_binding_mismatch() {
        let yaml = r"
name: mismatch
description: wrong expected binding
expression:
  clauses:
    - pattern: { type: bind, name: x }
      body: any
cases:
  - name: wrong
    subject: 1
    expect: any
    bindings: { x: 2 }
";
        let fixture = Fixture::from_yaml(yaml).unwrap();
        let results = fixture.run(&default_registry()).unwrap();
        assert_eq!(results.len(), 1);
        assert!(!results[0].passed);
        assert!(results[0].detail.as_deref().unwrap().contains("expected bindings"));
    }

    #[test]
    fn run_accepts_expected_load_error() {
        let yaml = r"
name: ambiguous
description: duplicate binder
load_error: declared more than once
expression:
  clauses:
    - pattern:
        type: sequence
        elements: [{ type: bind, name: x }, { type: bind, name: x }]
      body: dup
";
        let fixture = Fixture::from_yaml(yaml).unwrap();
        assert!(fixture.run(&default_registry()).unwrap().is_empty());
    }

    #[test]
    fn multi_document_yaml() {
        let yaml = r"
name: a
description: first
expression: { clauses: [], default: d }
cases: [{ name: c, subject: 1, expect: d }]
---
name: b
description: second
expression: { clauses: [] }
cases: [{ name: c, subject: 1, expect: ~ }]
";
        let fixtures = Fixture::from_yaml_multi(yaml).unwrap();
        assert_eq!(fixtures.len(), 2);
        for fixture in fixtures {
            fixture.run_and_assert();
        }
    }
}
