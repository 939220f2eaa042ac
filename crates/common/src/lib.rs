//! IPPcode20 common types.
//!
//! This crate provides the foundational data structures shared by the
//! loader and the virtual machine:
//!
//! - [`Value`]: the five runtime value kinds
//! - [`Opcode`]: every instruction with its operand signature
//! - [`Operand`]: variable references, constants, labels and type names
//! - [`Instruction`] and [`Program`]: the loaded instruction list
//! - [`hexfloat`] and [`escape`]: the literal codecs
//! - [`ShapeError`]: operand count/kind violations

pub mod error;
pub mod escape;
pub mod hexfloat;
pub mod instruction;
pub mod opcode;
pub mod operand;
pub mod program;
pub mod value;

// Re-export commonly used types at the crate root.
pub use error::{EscapeError, ShapeError};
pub use instruction::Instruction;
pub use opcode::Opcode;
pub use operand::{ArgKind, DataType, FrameKind, Operand, Variable};
pub use program::Program;
pub use value::Value;
