use serde::ser::{Serialize, SerializeStruct, Serializer};
use std::fmt;
use std::ops::Index;

/// Cause of a single field-level failure.
///
/// The message texts are stable; consumers match on the rendered output.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RuleError {
    #[error("invalid validator syntax")]
    InvalidSyntax,
    #[error("validation for unexported field is not allowed")]
    UnexportedField,
    #[error("validator LEN: wrong length of string")]
    Len,
    /// Raised by rule kinds registered outside this crate.
    #[error("validator {kind}: {message}")]
    Violation { kind: String, message: String },
}

impl RuleError {
    pub fn violation(kind: impl Into<String>, message: impl Into<String>) -> Self {
        RuleError::Violation {
            kind: kind.into(),
            message: message.into(),
        }
    }

    /// Short machine-readable identifier.
    pub fn code(&self) -> &str {
        match self {
            RuleError::InvalidSyntax => "syntax",
            RuleError::UnexportedField => "unexported",
            RuleError::Len => "len",
            RuleError::Violation { kind, .. } => kind.as_str(),
        }
    }
}

/// One violation found on one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub err: RuleError,
}

impl ValidationError {
    pub fn new(field: &'static str, err: RuleError) -> Self {
        Self { field, err }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.err, f)
    }
}

impl std::error::Error for ValidationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.err)
    }
}

impl Serialize for ValidationError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("ValidationError", 3)?;
        s.serialize_field("field", self.field)?;
        s.serialize_field("code", self.err.code())?;
        s.serialize_field("message", &self.err.to_string())?;
        s.end()
    }
}

/// Every violation of one validation pass, in field declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(Vec<ValidationError>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, err: ValidationError) {
        self.0.push(err);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ValidationError> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[ValidationError] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<ValidationError> {
        self.0
    }
}

// Messages are joined with no separator; existing consumers depend on it.
impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for err in &self.0 {
            write!(f, "{}", err.err)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

impl Index<usize> for ValidationErrors {
    type Output = ValidationError;

    fn index(&self, index: usize) -> &ValidationError {
        &self.0[index]
    }
}

impl IntoIterator for ValidationErrors {
    type Item = ValidationError;
    type IntoIter = std::vec::IntoIter<ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a ValidationErrors {
    type Item = &'a ValidationError;
    type IntoIter = std::slice::Iter<'a, ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl FromIterator<ValidationError> for ValidationErrors {
    fn from_iter<I: IntoIterator<Item = ValidationError>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Outcome of [`crate::validate`] when the value is not valid.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The value handed in is not a record; no field was looked at.
    #[error("wrong argument given, should be a struct")]
    NotStruct,
    #[error(transparent)]
    Validation(#[from] ValidationErrors),
}

impl Error {
    /// Per-field violations, if any were collected.
    pub fn validation_errors(&self) -> Option<&ValidationErrors> {
        match self {
            Error::Validation(errs) => Some(errs),
            Error::NotStruct => None,
        }
    }
}
