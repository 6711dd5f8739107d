use crate::config::EngineConfig;
use crate::error::{Error, RuleError, ValidationError, ValidationErrors};
use crate::inspect::{Inspect, Value};
use crate::rules::{Rule, RuleSet};
use once_cell::sync::Lazy;

static DEFAULT_ENGINE: Lazy<Engine> =
    Lazy::new(|| Engine::with_config(EngineConfig::load_from_env()));

/// Validate `val` with the process-wide default engine.
///
/// The default engine reads its configuration from the environment once, on
/// first use, and knows the built-in rule kinds plus every
/// `#[validation_rule]` linked into the binary.
pub fn validate<T: Inspect + ?Sized>(val: &T) -> Result<(), Error> {
    DEFAULT_ENGINE.validate(val)
}

/// Walks a record's fields and evaluates the rule expression tagged on each.
#[derive(Debug, Clone)]
pub struct Engine {
    cfg: EngineConfig,
    rules: RuleSet,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(cfg: EngineConfig) -> Self {
        Self::with_rules(cfg, RuleSet::with_registered())
    }

    pub fn with_rules(cfg: EngineConfig, rules: RuleSet) -> Self {
        Self { cfg, rules }
    }

    /// Builder form of [`Engine::register`].
    pub fn with_rule<R: Rule + 'static>(mut self, rule: R) -> Self {
        self.register(rule);
        self
    }

    /// Add a rule kind, replacing any rule already stored under that kind.
    pub fn register<R: Rule + 'static>(&mut self, rule: R) -> &mut Self {
        self.rules.insert(rule);
        self
    }

    pub fn tag_key(&self) -> &str {
        &self.cfg.tag_key
    }

    pub fn kinds(&self) -> impl Iterator<Item = &str> + '_ {
        self.rules.kinds()
    }

    /// Check every tagged field of `val` and collect all violations.
    ///
    /// Returns [`Error::NotStruct`] untouched when `val` is not a record.
    /// Otherwise each field is handled in declaration order: untagged fields
    /// are skipped, tagged unexported fields are reported without looking at
    /// the rule, and the rest are dispatched on their rule kind. `Ok(())`
    /// means no field produced an error.
    pub fn validate<T: Inspect + ?Sized>(&self, val: &T) -> Result<(), Error> {
        let record = match val.inspect() {
            Value::Record(record) => record,
            other => {
                tracing::debug!(kind = %other.kind(), "refusing to validate non-struct value");
                return Err(Error::NotStruct);
            }
        };

        let type_name = record.type_name();
        let mut errs = ValidationErrors::new();
        for field in record.fields() {
            let expr = field.tags.get(&self.cfg.tag_key);
            if expr.is_empty() {
                continue;
            }
            let outcome = match field.value {
                Some(value) if field.exported => self.rules.evaluate(expr, &value),
                _ => Err(RuleError::UnexportedField),
            };
            if let Err(err) = outcome {
                tracing::debug!(
                    record = type_name,
                    field = field.name,
                    rule = expr,
                    code = err.code(),
                    "field failed validation"
                );
                errs.push(ValidationError::new(field.name, err));
            }
        }

        if errs.is_empty() {
            Ok(())
        } else {
            Err(Error::Validation(errs))
        }
    }
}
