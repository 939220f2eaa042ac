//! A single loaded instruction: opcode plus ordered operands.

use std::fmt;

use crate::error::ShapeError;
use crate::opcode::Opcode;
use crate::operand::Operand;

/// One IPPcode20 instruction. Immutable once loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct Instruction {
    /// The operation to perform.
    pub opcode: Opcode,
    /// Operands in `arg1..argN` order.
    pub args: Vec<Operand>,
}

impl Instruction {
    /// Create a new instruction.
    pub fn new(opcode: Opcode, args: Vec<Operand>) -> Self {
        Self { opcode, args }
    }

    /// Check the operand count and kinds against [`Opcode::signature`].
    pub fn check_shape(&self) -> Result<(), ShapeError> {
        let signature = self.opcode.signature();
        if self.args.len() != signature.len() {
            return Err(ShapeError::Arity {
                opcode: self.opcode,
                expected: signature.len(),
                found: self.args.len(),
            });
        }

        for (i, (kind, operand)) in signature.iter().zip(&self.args).enumerate() {
            if !kind.accepts(operand) {
                return Err(ShapeError::OperandKind {
                    opcode: self.opcode,
                    position: i + 1,
                    expected: *kind,
                });
            }
        }

        Ok(())
    }

    /// The label name, if this is a `LABEL` instruction.
    pub fn defined_label(&self) -> Option<&str> {
        match (self.opcode, self.args.first()) {
            (Opcode::Label, Some(Operand::Label(name))) => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.opcode.mnemonic())?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}
