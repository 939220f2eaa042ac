//! VM state management: memory, label table, call stack, value stack.

use ippcode_common::{
    ArgKind, DataType, Instruction, Operand, Program, ShapeError, Value, Variable,
};

use crate::error::RuntimeError;
use crate::io::Console;
use crate::labels::LabelTable;
use crate::memory::Memory;

/// Why execution stopped without an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Halt {
    /// The program counter ran past the last instruction.
    Finished,
    /// `EXIT` with a code in 0-49.
    Exit(u8),
}

impl Halt {
    /// Process exit status.
    pub fn status(&self) -> i32 {
        match self {
            Halt::Finished => 0,
            Halt::Exit(code) => i32::from(*code),
        }
    }
}

/// Counters reported through `--stats`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    /// Executed instructions, not counting LABEL, DPRINT and BREAK.
    pub instructions: u64,
    /// Every store into a variable, DEFVAR included.
    pub variable_writes: u64,
}

/// The IPPcode20 virtual machine.
pub struct VM<'a> {
    /// The program being executed.
    pub(crate) program: &'a Program,
    /// Input and output streams.
    pub(crate) console: Console<'a>,
    /// Global, local and temporary frames.
    pub(crate) memory: Memory,
    /// Built by the label pass at the start of `execute`.
    pub(crate) labels: LabelTable,
    /// Saved return positions.
    pub(crate) call_stack: Vec<usize>,
    /// Operand stack for PUSHS/POPS and the stack-flavoured instructions.
    pub(crate) stack: Vec<Value>,
    /// Index of the next instruction. While a handler runs this equals the
    /// 1-based position of the instruction being executed.
    pub(crate) pc: usize,
    pub(crate) stats: Stats,
}

impl<'a> VM<'a> {
    /// Create a new VM for the given program.
    pub fn new(program: &'a Program, console: Console<'a>) -> Self {
        Self {
            program,
            console,
            memory: Memory::new(),
            labels: LabelTable::default(),
            call_stack: Vec::new(),
            stack: Vec::new(),
            pc: 0,
            stats: Stats::default(),
        }
    }

    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    /// Value stack, bottom first.
    pub fn stack(&self) -> &[Value] {
        &self.stack
    }

    /// Saved return positions, bottom first.
    pub fn call_stack(&self) -> &[usize] {
        &self.call_stack
    }

    pub fn pc(&self) -> usize {
        self.pc
    }

    pub fn stats(&self) -> Stats {
        self.stats
    }

    /// Pop a value from the stack.
    pub(crate) fn pop(&mut self) -> Result<Value, RuntimeError> {
        self.stack
            .pop()
            .ok_or(RuntimeError::EmptyValueStack { at: self.pc })
    }

    /// The top `n` stack values, deepest first, without popping them.
    pub(crate) fn peek(&self, n: usize) -> Result<&[Value], RuntimeError> {
        let len = self.stack.len();
        if len < n {
            return Err(RuntimeError::EmptyValueStack { at: self.pc });
        }
        Ok(&self.stack[len - n..])
    }

    /// Replace the top `n` stack values with `value`.
    pub(crate) fn replace_top(&mut self, n: usize, value: Value) {
        let len = self.stack.len();
        self.stack.truncate(len.saturating_sub(n));
        self.stack.push(value);
    }

    /// Instruction index of `label`.
    pub(crate) fn resolve(&self, label: &str) -> Result<usize, RuntimeError> {
        self.labels
            .resolve(label)
            .ok_or_else(|| RuntimeError::UndefinedLabel {
                at: self.pc,
                label: label.to_string(),
            })
    }

    /// Store into a declared variable.
    pub(crate) fn store(&mut self, var: &Variable, value: Value) -> Result<(), RuntimeError> {
        self.memory
            .write(var, value)
            .map_err(|e| e.at(self.pc))?;
        self.stats.variable_writes += 1;
        Ok(())
    }

    fn operand_kind_error(&self, instr: &Instruction, index: usize, expected: ArgKind) -> RuntimeError {
        RuntimeError::Malformed {
            at: self.pc,
            source: ShapeError::OperandKind {
                opcode: instr.opcode,
                position: index + 1,
                expected,
            },
        }
    }

    /// Operand `index` as a variable reference.
    pub(crate) fn var<'i>(&self, instr: &'i Instruction, index: usize) -> Result<&'i Variable, RuntimeError> {
        match instr.args.get(index) {
            Some(Operand::Var(var)) => Ok(var),
            _ => Err(self.operand_kind_error(instr, index, ArgKind::Var)),
        }
    }

    /// Operand `index` evaluated: a constant, or the value of a variable.
    pub(crate) fn symb(&self, instr: &Instruction, index: usize) -> Result<Value, RuntimeError> {
        match instr.args.get(index) {
            Some(Operand::Const(value)) => Ok(value.clone()),
            Some(Operand::Var(var)) => self
                .memory
                .read(var)
                .cloned()
                .map_err(|e| e.at(self.pc)),
            _ => Err(self.operand_kind_error(instr, index, ArgKind::Symb)),
        }
    }

    /// Operand `index` as a label name.
    pub(crate) fn label<'i>(&self, instr: &'i Instruction, index: usize) -> Result<&'i str, RuntimeError> {
        match instr.args.get(index) {
            Some(Operand::Label(name)) => Ok(name),
            _ => Err(self.operand_kind_error(instr, index, ArgKind::Label)),
        }
    }

    /// Operand `index` as a type name.
    pub(crate) fn data_type(&self, instr: &Instruction, index: usize) -> Result<DataType, RuntimeError> {
        match instr.args.get(index) {
            Some(Operand::Type(ty)) => Ok(*ty),
            _ => Err(self.operand_kind_error(instr, index, ArgKind::Type)),
        }
    }
}
