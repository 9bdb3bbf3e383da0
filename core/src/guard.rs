//! Guards — boolean side conditions evaluated after a clause's pattern matched
//!
//! A guard sees the enclosing scope plus the clause's bindings (one
//! [`Scope`] chain) and returns a [`Value`]; the evaluator only looks at its
//! truthiness. A [`GuardError`] is different from a falsy result: it aborts
//! the whole match expression.
//!
//! # Available Guards
//!
//! - [`FnGuard`] — wraps a closure
//! - [`Compare`] — compares a binding against a constant
//! - [`All`] / [`Any`] / [`Not`] — boolean combinators
//! - [`Bound`] — a binding is present and truthy

use crate::{GuardError, Scope, Value};
use std::cmp::Ordering;
use std::fmt::{self, Debug};
use std::sync::Arc;

/// A side condition evaluated against a scope.
#[diagnostic::on_unimplemented(
    message = "`{Self}` does not implement `Guard`",
    label = "this type cannot be used as a clause guard",
    note = "implement `evaluate(&self, &Scope<'_>) -> Result<Value, GuardError>`, or wrap a closure with `guard_fn`"
)]
pub trait Guard: Send + Sync + Debug {
    /// Evaluate against `scope`. Only the truthiness of the result matters.
    ///
    /// # Errors
    ///
    /// A [`GuardError`] aborts the match expression.
    fn evaluate(&self, scope: &Scope<'_>) -> Result<Value, GuardError>;
}

type GuardFn = dyn Fn(&Scope<'_>) -> Result<Value, GuardError> + Send + Sync;

/// A [`Guard`] backed by a closure.
pub struct FnGuard {
    name: String,
    f: Box<GuardFn>,
}

impl FnGuard {
    /// Wrap a closure under the given name.
    pub fn new<F>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&Scope<'_>) -> Result<Value, GuardError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            f: Box::new(f),
        }
    }
}

impl Guard for FnGuard {
    fn evaluate(&self, scope: &Scope<'_>) -> Result<Value, GuardError> {
        (self.f)(scope)
    }
}

impl Debug for FnGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("FnGuard").field(&self.name).finish()
    }
}

/// Shorthand for `Arc::new(FnGuard::new(name, f))`.
///
/// ```
/// use pmatch::{guard_fn, Guard, Scope, Value};
///
/// let retry = guard_fn("can_retry", |scope| {
///     Ok(Value::from(scope.lookup("has_retried") == Some(&Value::from(false))))
/// });
/// let scope = Scope::from_bindings([("has_retried", false)].into_iter().collect());
/// assert!(retry.evaluate(&scope).unwrap().is_truthy());
/// ```
pub fn guard_fn<F>(name: impl Into<String>, f: F) -> Arc<dyn Guard>
where
    F: Fn(&Scope<'_>) -> Result<Value, GuardError> + Send + Sync + 'static,
{
    Arc::new(FnGuard::new(name, f))
}

// ═══════════════════════════════════════════════════════════════════════════════
// Built-in guards
// ═══════════════════════════════════════════════════════════════════════════════

/// Comparison operator for [`Compare`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum CompareOp {
    #[cfg_attr(feature = "serde", serde(alias = "=="))]
    Eq,
    #[cfg_attr(feature = "serde", serde(alias = "!="))]
    Ne,
    #[cfg_attr(feature = "serde", serde(alias = "<"))]
    Lt,
    #[cfg_attr(feature = "serde", serde(alias = "<="))]
    Le,
    #[cfg_attr(feature = "serde", serde(alias = ">"))]
    Gt,
    #[cfg_attr(feature = "serde", serde(alias = ">="))]
    Ge,
}

impl CompareOp {
    fn symbol(self) -> &'static str {
        match self {
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
        }
    }

    fn accepts(self, ordering: Ordering) -> bool {
        match self {
            Self::Eq => ordering == Ordering::Equal,
            Self::Ne => ordering != Ordering::Equal,
            Self::Lt => ordering == Ordering::Less,
            Self::Le => ordering != Ordering::Greater,
            Self::Gt => ordering == Ordering::Greater,
            Self::Ge => ordering != Ordering::Less,
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// `binding <op> value`
///
/// Numbers compare numerically and text lexicographically. Other kinds only
/// support `==` and `!=`.
///
/// ```
/// use pmatch::{Compare, CompareOp, Guard, Scope, Value};
///
/// let is_error = Compare::new("status", CompareOp::Ge, 300);
/// let scope = Scope::from_bindings([("status", 404)].into_iter().collect());
/// assert_eq!(is_error.evaluate(&scope).unwrap(), Value::from(true));
/// ```
#[derive(Debug, Clone)]
pub struct Compare {
    pub binding: String,
    pub op: CompareOp,
    pub value: Value,
}

impl Compare {
    pub fn new(binding: impl Into<String>, op: CompareOp, value: impl Into<Value>) -> Self {
        Self {
            binding: binding.into(),
            op,
            value: value.into(),
        }
    }
}

impl Guard for Compare {
    fn evaluate(&self, scope: &Scope<'_>) -> Result<Value, GuardError> {
        let Some(actual) = scope.lookup(&self.binding) else {
            return Err(GuardError::new(format!(
                "binding \"{}\" is not in scope",
                self.binding
            )));
        };

        let verdict = match (self.op, actual, &self.value) {
            (CompareOp::Eq, a, b) => a == b,
            (CompareOp::Ne, a, b) => a != b,
            (op, Value::Number(a), Value::Number(b)) => {
                let Some(ordering) = a.partial_cmp(b) else {
                    return Err(GuardError::new(format!("cannot order NaN with {op}")));
                };
                op.accepts(ordering)
            }
            (op, Value::Text(a), Value::Text(b)) => op.accepts(a.cmp(b)),
            (op, a, b) => {
                return Err(GuardError::new(format!(
                    "cannot compare {} {op} {} (binding \"{}\")",
                    a.kind(),
                    b.kind(),
                    self.binding
                )));
            }
        };
        Ok(Value::Bool(verdict))
    }
}

/// True iff every member is truthy; stops at the first falsy one.
#[derive(Debug, Clone)]
pub struct All(pub Vec<Arc<dyn Guard>>);

impl Guard for All {
    fn evaluate(&self, scope: &Scope<'_>) -> Result<Value, GuardError> {
        for guard in &self.0 {
            if !guard.evaluate(scope)?.is_truthy() {
                return Ok(Value::Bool(false));
            }
        }
        Ok(Value::Bool(true))
    }
}

/// True iff some member is truthy; stops at the first truthy one.
#[derive(Debug, Clone)]
pub struct Any(pub Vec<Arc<dyn Guard>>);

impl Guard for Any {
    fn evaluate(&self, scope: &Scope<'_>) -> Result<Value, GuardError> {
        for guard in &self.0 {
            if guard.evaluate(scope)?.is_truthy() {
                return Ok(Value::Bool(true));
            }
        }
        Ok(Value::Bool(false))
    }
}

/// Negates the truthiness of the inner guard.
#[derive(Debug, Clone)]
pub struct Not(pub Arc<dyn Guard>);

impl Guard for Not {
    fn evaluate(&self, scope: &Scope<'_>) -> Result<Value, GuardError> {
        Ok(Value::Bool(!self.0.evaluate(scope)?.is_truthy()))
    }
}

/// The named binding is in scope and truthy. An unbound name is falsy.
#[derive(Debug, Clone)]
pub struct Bound(pub String);

impl Guard for Bound {
    fn evaluate(&self, scope: &Scope<'_>) -> Result<Value, GuardError> {
        Ok(Value::Bool(scope.lookup(&self.0).is_some_and(Value::is_truthy)))
    }
}
