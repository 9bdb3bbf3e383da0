//! `Bindings` and `Scope` — what a successful match hands to guards and bodies
//!
//! [`Bindings`] is the flat name → value map produced by one clause attempt.
//! [`Scope`] chains binding frames so guards, predicates and bodies see the
//! enclosing bindings plus the clause's own, innermost first.

use crate::Value;
use indexmap::IndexMap;

/// Names bound by one successful match, in binding order.
///
/// Created fresh for every clause attempt; never shared between clauses or
/// between alternation branches.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bindings {
    values: IndexMap<String, Value>,
}

impl Bindings {
    /// Create an empty set of bindings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a bound value.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Returns `true` if `name` is bound.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Number of bound names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if nothing is bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Bound names in binding order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Iterate over `(name, value)` pairs in binding order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Consume into the underlying map.
    #[must_use]
    pub fn into_map(self) -> IndexMap<String, Value> {
        self.values
    }

    /// Bind `name`. Binder uniqueness is checked when the pattern is
    /// compiled, so a later binding of the same name simply replaces it.
    pub(crate) fn bind(&mut self, name: &str, value: Value) {
        self.values.insert(name.to_owned(), value);
    }

    /// Drop everything bound after `len`, undoing a failed branch attempt.
    pub(crate) fn truncate(&mut self, len: usize) {
        self.values.truncate(len);
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Bindings {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl From<Bindings> for Value {
    fn from(bindings: Bindings) -> Self {
        Value::Mapping(bindings.values)
    }
}

/// A chain of binding frames, searched innermost first.
///
/// The evaluator builds `enclosing.child(clause_bindings)` before running a
/// guard or a body, so a clause binding shadows an enclosing one of the same
/// name.
///
/// # Example
///
/// ```
/// use pmatch::{Bindings, Scope, Value};
///
/// let outer = Scope::from_bindings([("has_retried", false)].into_iter().collect());
/// let inner = outer.child([("status", 500)].into_iter().collect());
///
/// assert_eq!(inner.lookup("status"), Some(&Value::from(500)));
/// assert_eq!(inner.lookup("has_retried"), Some(&Value::from(false)));
/// assert_eq!(outer.lookup("status"), None);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Scope<'a> {
    parent: Option<&'a Scope<'a>>,
    frame: Bindings,
}

impl<'a> Scope<'a> {
    /// An empty scope with no enclosing frame.
    #[must_use]
    pub fn root() -> Self {
        Self::default()
    }

    /// A root scope holding `bindings`.
    #[must_use]
    pub fn from_bindings(bindings: Bindings) -> Self {
        Self {
            parent: None,
            frame: bindings,
        }
    }

    /// A new innermost frame on top of this scope.
    #[must_use]
    pub fn child<'b>(&'b self, bindings: Bindings) -> Scope<'b>
    where
        'a: 'b,
    {
        Scope {
            parent: Some(self),
            frame: bindings,
        }
    }

    /// Resolve `name`, innermost frame first.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<&Value> {
        self.frame
            .get(name)
            .or_else(|| self.parent.and_then(|p| p.lookup(name)))
    }

    /// Bindings of the innermost frame only.
    #[must_use]
    pub fn frame(&self) -> &Bindings {
        &self.frame
    }

    /// Drop the chain and keep the innermost frame.
    #[must_use]
    pub fn into_frame(self) -> Bindings {
        self.frame
    }

    /// Number of frames in the chain.
    #[must_use]
    pub fn depth(&self) -> usize {
        1 + self.parent.map_or(0, Scope::depth)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bindings_keep_insertion_order() {
        let mut b = Bindings::new();
        b.bind("right", Value::from("4"));
        b.bind("left", Value::from("3"));
        assert_eq!(b.names().collect::<Vec<_>>(), ["right", "left"]);
    }

    #[test]
    fn truncate_undoes_partial_bindings() {
        let mut b: Bindings = [("a", 1)].into_iter().collect();
        let mark = b.len();
        b.bind("b", Value::from(2));
        b.bind("c", Value::from(3));
        b.truncate(mark);
        assert_eq!(b, [("a", 1)].into_iter().collect());
    }

    #[test]
    fn child_scope_shadows_parent() {
        let root = Scope::from_bindings([("x", "outer")].into_iter().collect());
        let child = root.child([("x", "inner")].into_iter().collect());
        assert_eq!(child.lookup("x"), Some(&Value::from("inner")));
        assert_eq!(root.lookup("x"), Some(&Value::from("outer")));
        assert_eq!(child.depth(), 2);
    }

    #[test]
    fn root_scope_is_empty() {
        let root = Scope::root();
        assert!(root.frame().is_empty());
        assert_eq!(root.lookup("anything"), None);
    }

    #[test]
    fn bindings_convert_to_mapping_value() {
        let b: Bindings = [("left", "3"), ("right", "4")].into_iter().collect();
        assert_eq!(
            Value::from(b),
            Value::mapping([("left", "3"), ("right", "4")])
        );
    }
}
