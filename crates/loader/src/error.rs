//! Error types for the IPPcode20 loader.

use ippcode_common::{ArgKind, EscapeError, ShapeError};
use thiserror::Error;

/// Errors produced while turning a program representation into a program.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    /// The first meaningful line is not `.IPPcode20`.
    #[error("line {line}: missing .IPPcode20 header")]
    MissingHeader { line: usize },

    /// An unrecognized opcode mnemonic was encountered.
    #[error("line {line}: unknown opcode '{token}'")]
    UnknownOpcode { line: usize, token: String },

    /// Operand count does not match the opcode.
    #[error("line {line}: {source}")]
    Shape { line: usize, source: ShapeError },

    /// A token that cannot be the operand kind required at its position.
    #[error("line {line}: expected {expected} operand, found '{token}'")]
    InvalidOperand {
        line: usize,
        token: String,
        expected: ArgKind,
    },

    /// A constant whose value does not fit its type prefix.
    #[error("line {line}: invalid literal '{token}'")]
    InvalidLiteral { line: usize, token: String },

    /// A variable or label name with characters outside the identifier set.
    #[error("line {line}: invalid identifier '{token}'")]
    InvalidIdentifier { line: usize, token: String },

    /// A string literal with a broken `\DDD` escape.
    #[error("line {line}: {source}")]
    Escape { line: usize, source: EscapeError },

    /// The XML document is not well-formed.
    #[error("line {line}: malformed XML: {message}")]
    MalformedXml { line: usize, message: String },

    /// Well-formed XML that does not describe a program.
    #[error("line {line}: {reason}")]
    Structure { line: usize, reason: String },
}

impl LoadError {
    /// Process exit status for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            LoadError::MissingHeader { .. } | LoadError::MalformedXml { .. } => 31,
            _ => 32,
        }
    }

    /// 1-based source line the error refers to.
    pub fn line(&self) -> usize {
        match self {
            LoadError::MissingHeader { line }
            | LoadError::UnknownOpcode { line, .. }
            | LoadError::Shape { line, .. }
            | LoadError::InvalidOperand { line, .. }
            | LoadError::InvalidLiteral { line, .. }
            | LoadError::InvalidIdentifier { line, .. }
            | LoadError::Escape { line, .. }
            | LoadError::MalformedXml { line, .. }
            | LoadError::Structure { line, .. } => *line,
        }
    }
}
