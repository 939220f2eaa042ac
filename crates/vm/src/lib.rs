//! IPPcode20 virtual machine: executes loaded three-address programs.
//!
//! The machine has:
//! - A global frame, a stack of local frames, and an optional temporary frame
//! - A value stack for the `*S` instruction variants
//! - A call stack of return positions
//! - A label table built in a single pass before execution
//!
//! # Usage
//!
//! ```
//! use ippcode_common::{FrameKind, Instruction, Opcode, Operand, Program, Value, Variable};
//! use ippcode_vm::{run, Console, Halt, ScriptedInput};
//!
//! let x = Operand::Var(Variable::new(FrameKind::Global, "x"));
//! let program = Program::new(vec![
//!     Instruction::new(Opcode::Defvar, vec![x.clone()]),
//!     Instruction::new(Opcode::Add, vec![x.clone(), Operand::Const(Value::Int(40)), Operand::Const(Value::Int(2))]),
//!     Instruction::new(Opcode::Write, vec![x]),
//! ]);
//!
//! let mut input = ScriptedInput::default();
//! let (mut out, mut err) = (Vec::new(), Vec::new());
//! let console = Console { input: &mut input, output: &mut out, diagnostics: &mut err };
//!
//! let (halt, stats) = run(&program, console).unwrap();
//! assert_eq!(halt, Halt::Finished);
//! assert_eq!(stats.instructions, 3);
//! assert_eq!(out, b"42");
//! ```

pub mod error;
pub mod execute;
pub mod io;
pub mod labels;
pub mod machine;
pub mod memory;

pub use error::RuntimeError;
pub use io::{Console, LineSource, ReaderInput, ScriptedInput};
pub use labels::LabelTable;
pub use machine::{Halt, Stats, VM};
pub use memory::{Frame, Memory, MemoryError};

use ippcode_common::Program;

/// Execute a program and report how it stopped.
///
/// Labels are collected first, then instructions run from the first one
/// until EXIT, the end of the program, or an error.
///
/// # Errors
///
/// Returns [`RuntimeError`] for the first failing instruction. Its
/// [`exit_code`](RuntimeError::exit_code) is the process status to use.
pub fn run<'a>(program: &'a Program, console: Console<'a>) -> Result<(Halt, Stats), RuntimeError> {
    let mut vm = VM::new(program, console);
    let halt = vm.execute()?;
    Ok((halt, vm.stats()))
}
