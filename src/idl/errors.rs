use super::ast::Position;
use std::fmt;

/// Malformed IDL text. Parsing stops at the first one.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{line}:{column}: {message}")]
pub struct SyntaxError {
    pub line: usize,
    pub column: usize,
    pub message: String,
}

impl SyntaxError {
    pub fn new(pos: Position, message: impl Into<String>) -> Self {
        Self {
            line: pos.line,
            column: pos.column,
            message: message.into(),
        }
    }

    pub fn position(&self) -> Position {
        Position::new(self.line, self.column)
    }
}

/// A semantic rule violation found by the [`crate::idl::IdlValidator`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{pos}: {construct}: {message}")]
pub struct ValidationError {
    /// The offending construct, e.g. `struct shop.Item` or `field Item.price`.
    pub construct: String,
    pub pos: Position,
    pub message: String,
}

impl ValidationError {
    pub fn new(construct: impl Into<String>, pos: Position, message: impl Into<String>) -> Self {
        Self {
            construct: construct.into(),
            pos,
            message: message.into(),
        }
    }
}

/// Every validation error of one document, reported together.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    pub errors: Vec<ValidationError>,
}

impl ValidationErrors {
    pub fn new(errors: Vec<ValidationError>) -> Self {
        Self { errors }
    }

    pub fn push(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ValidationError> {
        self.errors.iter()
    }

    /// Converts into `Err` when any error was collected.
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.has_errors() {
            Err(self)
        } else {
            Ok(())
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.errors.len() {
            0 => write!(f, "validation errors"),
            1 => write!(f, "{}", self.errors[0]),
            n => {
                write!(f, "{} validation errors:", n)?;
                for error in &self.errors {
                    write!(f, "\n  {}", error)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ValidationErrors {}

impl From<Vec<ValidationError>> for ValidationErrors {
    fn from(errors: Vec<ValidationError>) -> Self {
        Self { errors }
    }
}

impl IntoIterator for ValidationErrors {
    type Item = ValidationError;
    type IntoIter = std::vec::IntoIter<ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}
