//! Errors shared by the loader and the engine.

use thiserror::Error;

use crate::opcode::Opcode;
use crate::operand::ArgKind;

/// An instruction whose operand list does not match its opcode's signature.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShapeError {
    /// Wrong number of operands.
    #[error("{opcode} expects {expected} operand(s), found {found}")]
    Arity {
        opcode: Opcode,
        expected: usize,
        found: usize,
    },

    /// An operand of the wrong kind (e.g. a constant where a variable is required).
    #[error("{opcode} operand {position} must be a {expected}")]
    OperandKind {
        opcode: Opcode,
        position: usize,
        expected: ArgKind,
    },
}

/// Malformed `\DDD` escape inside a string literal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid escape sequence in string literal '{literal}'")]
pub struct EscapeError {
    pub literal: String,
}
