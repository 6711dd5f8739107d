//! Rule kinds and the registry the engine dispatches through.
//!
//! A rule expression has the shape `<kind>:<argument>`. The kind selects a
//! [`Rule`] from a [`RuleSet`]; the argument is handed to it untouched.

use crate::error::RuleError;
use crate::inspect::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

pub const LEN: &str = "len";

/// Evaluates one rule kind against a field value.
pub trait Rule: Send + Sync {
    fn kind(&self) -> &str;

    /// `arg` is the text after the first `:` of the expression, possibly empty.
    fn check(&self, arg: &str, value: &Value<'_>) -> Result<(), RuleError>;
}

pub type CheckFn = fn(&str, &Value<'_>) -> Result<(), RuleError>;

/// Statically registered rule kind, submitted by `#[validation_rule]`.
#[derive(Clone, Copy)]
pub struct RuleRegistration {
    pub kind: &'static str,
    pub check: CheckFn,
}

inventory::collect!(RuleRegistration);

impl fmt::Debug for RuleRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleRegistration")
            .field("kind", &self.kind)
            .finish()
    }
}

impl Rule for RuleRegistration {
    fn kind(&self) -> &str {
        self.kind
    }

    fn check(&self, arg: &str, value: &Value<'_>) -> Result<(), RuleError> {
        (self.check)(arg, value)
    }
}

/// All rule kinds submitted through `inventory` across the linked crates.
pub fn registered_rules() -> impl Iterator<Item = &'static RuleRegistration> {
    inventory::iter::<RuleRegistration>.into_iter()
}

/// Split an expression into kind and argument. `None` when there is no `:`.
pub fn split_expression(expr: &str) -> Option<(&str, &str)> {
    expr.split_once(':')
}

/// `len:<n>`: text must be non-empty and shorter than `n` bytes.
///
/// The bound is checked before the value kind, so a malformed bound is a
/// syntax error on any field. Non-text values always pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct LenRule;

impl LenRule {
    fn bound(arg: &str) -> Result<usize, RuleError> {
        if arg.is_empty() {
            return Err(RuleError::InvalidSyntax);
        }
        match arg.parse::<i64>() {
            Ok(n) if n >= 1 => Ok(usize::try_from(n).unwrap_or(usize::MAX)),
            _ => Err(RuleError::InvalidSyntax),
        }
    }
}

impl Rule for LenRule {
    fn kind(&self) -> &str {
        LEN
    }

    fn check(&self, arg: &str, value: &Value<'_>) -> Result<(), RuleError> {
        let bound = Self::bound(arg)?;
        if let Some(text) = value.as_text() {
            if text.is_empty() || text.len() >= bound {
                return Err(RuleError::Len);
            }
        }
        Ok(())
    }
}

/// Mapping from rule kind to evaluator.
#[derive(Clone, Default)]
pub struct RuleSet {
    by_kind: BTreeMap<String, Arc<dyn Rule>>,
}

impl RuleSet {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Built-in kinds only.
    pub fn builtin() -> Self {
        let mut set = Self::empty();
        set.insert(LenRule);
        set
    }

    /// Built-in kinds plus every `#[validation_rule]` in the binary. A
    /// registration reusing a built-in kind replaces it. When two
    /// registrations share a kind, which one is kept depends on link order
    /// and is unspecified; a warning is logged.
    pub fn with_registered() -> Self {
        let mut set = Self::builtin();
        for reg in registered_rules() {
            if set.by_kind.contains_key(reg.kind) {
                tracing::warn!(kind = reg.kind, "registered rule replaces an existing kind");
            }
            set.insert(*reg);
        }
        set
    }

    pub fn with_kind<R: Rule + 'static>(mut self, rule: R) -> Self {
        self.insert(rule);
        self
    }

    /// Add a rule, returning the one previously stored under the same kind.
    pub fn insert<R: Rule + 'static>(&mut self, rule: R) -> Option<Arc<dyn Rule>> {
        let kind = rule.kind().to_string();
        self.by_kind.insert(kind, Arc::new(rule))
    }

    pub fn get(&self, kind: &str) -> Option<&Arc<dyn Rule>> {
        self.by_kind.get(kind)
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.by_kind.contains_key(kind)
    }

    pub fn kinds(&self) -> impl Iterator<Item = &str> + '_ {
        self.by_kind.keys().map(String::as_str)
    }

    /// Evaluate a full `<kind>:<argument>` expression.
    pub fn evaluate(&self, expr: &str, value: &Value<'_>) -> Result<(), RuleError> {
        let Some((kind, arg)) = split_expression(expr) else {
            return Err(RuleError::InvalidSyntax);
        };
        match self.get(kind) {
            Some(rule) => {
                tracing::trace!(kind, arg, "dispatching rule");
                rule.check(arg, value)
            }
            None => Err(RuleError::InvalidSyntax),
        }
    }
}

impl fmt::Debug for RuleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.by_kind.keys()).finish()
    }
}
