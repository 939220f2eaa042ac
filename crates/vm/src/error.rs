//! Runtime errors for the IPPcode20 VM.
//!
//! Every error carries `at`, the 1-based position of the failing
//! instruction. Each variant maps to one process exit status through
//! [`RuntimeError::exit_code`].

use ippcode_common::{FrameKind, Opcode, ShapeError};
use thiserror::Error;

/// Errors that halt execution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuntimeError {
    /// Operand count or kind does not match the opcode.
    #[error("malformed instruction at {at}: {source}")]
    Malformed { at: usize, source: ShapeError },

    /// `READ` asked for a type it cannot produce.
    #[error("READ cannot produce type '{ty}' at instruction {at}")]
    UnsupportedReadType { at: usize, ty: &'static str },

    /// The same label is defined twice. Detected by the label pass.
    #[error("label '{label}' defined twice (instruction {at})")]
    DuplicateLabel { at: usize, label: String },

    /// Jump or call to a label that is not defined anywhere.
    #[error("undefined label '{label}' at instruction {at}")]
    UndefinedLabel { at: usize, label: String },

    /// `DEFVAR` of a name that already exists in the frame.
    #[error("variable {name} redefined at instruction {at}")]
    Redefinition { at: usize, name: String },

    /// Operand kinds are not valid for the operation.
    #[error("wrong operand types for {opcode} at instruction {at}")]
    TypeMismatch { at: usize, opcode: Opcode },

    /// Variable name absent from an existing frame.
    #[error("undeclared variable {name} at instruction {at}")]
    UndeclaredVariable { at: usize, name: String },

    /// LF with an empty local frame stack, or TF while no temporary frame exists.
    #[error("frame {frame} does not exist at instruction {at}")]
    FrameNotFound { at: usize, frame: FrameKind },

    /// Read of a declared variable that was never written.
    #[error("variable {name} has no value at instruction {at}")]
    MissingValue { at: usize, name: String },

    /// Pop from an empty value stack.
    #[error("value stack is empty at instruction {at}")]
    EmptyValueStack { at: usize },

    /// `RETURN` with an empty call stack.
    #[error("call stack is empty at instruction {at}")]
    EmptyCallStack { at: usize },

    /// Integer or float division by zero.
    #[error("division by zero at instruction {at}")]
    DivisionByZero { at: usize },

    /// `EXIT` with a code outside 0-49.
    #[error("exit code {code} out of range 0-49 at instruction {at}")]
    InvalidExitCode { at: usize, code: i64 },

    /// Character index outside the string.
    #[error("index {index} out of range for string of length {length} at instruction {at}")]
    StringIndex { at: usize, index: i64, length: usize },

    /// Integer is not a valid Unicode scalar value.
    #[error("invalid character code {code} at instruction {at}")]
    InvalidCodePoint { at: usize, code: i64 },

    /// `SETCHAR` with an empty replacement string.
    #[error("empty replacement string at instruction {at}")]
    EmptyReplacement { at: usize },

    /// `FLOAT2INT` of NaN, infinity, or a value outside the i64 range.
    #[error("float {value} cannot be converted to int at instruction {at}")]
    FloatConversion { at: usize, value: String },

    /// Writing program output or diagnostics failed.
    #[error("output error at instruction {at}: {message}")]
    Output { at: usize, message: String },
}

impl RuntimeError {
    /// Process exit status for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            RuntimeError::Output { .. } => 12,
            RuntimeError::Malformed { .. } | RuntimeError::UnsupportedReadType { .. } => 32,
            RuntimeError::DuplicateLabel { .. }
            | RuntimeError::UndefinedLabel { .. }
            | RuntimeError::Redefinition { .. } => 52,
            RuntimeError::TypeMismatch { .. } => 53,
            RuntimeError::UndeclaredVariable { .. } => 54,
            RuntimeError::FrameNotFound { .. } => 55,
            RuntimeError::MissingValue { .. }
            | RuntimeError::EmptyValueStack { .. }
            | RuntimeError::EmptyCallStack { .. } => 56,
            RuntimeError::DivisionByZero { .. } | RuntimeError::InvalidExitCode { .. } => 57,
            RuntimeError::StringIndex { .. }
            | RuntimeError::InvalidCodePoint { .. }
            | RuntimeError::EmptyReplacement { .. }
            | RuntimeError::FloatConversion { .. } => 58,
        }
    }
}
