//! Program representation: an ordered instruction list.

use crate::instruction::Instruction;

/// A loaded program. Instruction `order` is its 1-based position.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    /// The instruction stream.
    pub instructions: Vec<Instruction>,
}

impl Program {
    /// Create a new program from a vector of instructions.
    pub fn new(instructions: Vec<Instruction>) -> Self {
        Self { instructions }
    }

    /// Number of instructions in the program.
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    /// Returns true if the program has no instructions.
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Instruction at 0-based index `pc`.
    pub fn get(&self, pc: usize) -> Option<&Instruction> {
        self.instructions.get(pc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::opcode::Opcode;

    #[test]
    fn empty_program() {
        let program = Program::new(vec![]);
        assert!(program.is_empty());
        assert_eq!(program.len(), 0);
        assert_eq!(program.get(0), None);
    }

    #[test]
    fn len_and_get() {
        let program = Program::new(vec![
            Instruction::new(Opcode::CreateFrame, vec![]),
            Instruction::new(Opcode::PushFrame, vec![]),
        ]);
        assert_eq!(program.len(), 2);
        assert!(!program.is_empty());
        assert_eq!(program.get(1).map(|i| i.opcode), Some(Opcode::PushFrame));
    }
}
