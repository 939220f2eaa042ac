//! Opcode definitions for the IPPcode20 instruction set.

use std::fmt;

use crate::operand::ArgKind::{self, Label as L, Symb as S, Type as T, Var as V};

/// Identifies the operation to perform.
///
/// Operand conventions: `var` is a variable reference, `symb` is a variable
/// or a constant, `label` is a label name and `type` is a type name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    // Frames & calls
    /// `MOVE var symb`
    Move,
    /// Replace the temporary frame with a fresh empty one.
    CreateFrame,
    /// Move the temporary frame onto the local frame stack.
    PushFrame,
    /// Move the top local frame into the temporary frame.
    PopFrame,
    /// `DEFVAR var`: declare an uninitialised variable.
    Defvar,
    /// `CALL label`: save the return position, then jump.
    Call,
    /// Jump back to the most recently saved return position.
    Return,

    // Value stack
    /// `PUSHS symb`
    Pushs,
    /// `POPS var`
    Pops,
    /// Empty the value stack.
    Clears,

    // Arithmetic, relational, logic: `OP var symb symb` (NOT: `var symb`)
    Add,
    Sub,
    Mul,
    /// Integer (floor) division.
    Idiv,
    /// Float division.
    Div,
    Lt,
    Gt,
    Eq,
    And,
    Or,
    Not,

    // Conversion
    /// `INT2CHAR var symb`
    Int2Char,
    /// `STRI2INT var symb symb`
    Stri2Int,
    Int2Float,
    Float2Int,

    // Stack-flavoured variants: operands come from the value stack.
    Adds,
    Subs,
    Muls,
    Idivs,
    Divs,
    Lts,
    Gts,
    Eqs,
    Ands,
    Ors,
    Nots,
    Int2Chars,
    Stri2Ints,
    Int2Floats,
    Float2Ints,
    /// `JUMPIFEQS label`
    JumpIfEqs,
    /// `JUMPIFNEQS label`
    JumpIfNeqs,

    // I/O
    /// `READ var type`
    Read,
    /// `WRITE symb`
    Write,

    // Strings
    Concat,
    Strlen,
    GetChar,
    /// `SETCHAR var symb symb`: modifies `var` in place.
    SetChar,

    // Types
    /// `TYPE var symb`
    Type,

    // Flow control
    /// `LABEL label`: resolved before execution, a no-op at runtime.
    Label,
    Jump,
    /// `JUMPIFEQ label symb symb`
    JumpIfEq,
    /// `JUMPIFNEQ label symb symb`
    JumpIfNeq,
    /// `EXIT symb`: terminate with status 0-49.
    Exit,

    // Debugging
    /// `DPRINT symb`: write to the diagnostic stream.
    Dprint,
    /// Dump the machine state to the diagnostic stream.
    Break,
}

/// All valid opcodes, in definition order. Useful for exhaustive testing.
pub const ALL_OPCODES: [Opcode; 56] = [
    Opcode::Move,
    Opcode::CreateFrame,
    Opcode::PushFrame,
    Opcode::PopFrame,
    Opcode::Defvar,
    Opcode::Call,
    Opcode::Return,
    Opcode::Pushs,
    Opcode::Pops,
    Opcode::Clears,
    Opcode::Add,
    Opcode::Sub,
    Opcode::Mul,
    Opcode::Idiv,
    Opcode::Div,
    Opcode::Lt,
    Opcode::Gt,
    Opcode::Eq,
    Opcode::And,
    Opcode::Or,
    Opcode::Not,
    Opcode::Int2Char,
    Opcode::Stri2Int,
    Opcode::Int2Float,
    Opcode::Float2Int,
    Opcode::Adds,
    Opcode::Subs,
    Opcode::Muls,
    Opcode::Idivs,
    Opcode::Divs,
    Opcode::Lts,
    Opcode::Gts,
    Opcode::Eqs,
    Opcode::Ands,
    Opcode::Ors,
    Opcode::Nots,
    Opcode::Int2Chars,
    Opcode::Stri2Ints,
    Opcode::Int2Floats,
    Opcode::Float2Ints,
    Opcode::JumpIfEqs,
    Opcode::JumpIfNeqs,
    Opcode::Read,
    Opcode::Write,
    Opcode::Concat,
    Opcode::Strlen,
    Opcode::GetChar,
    Opcode::SetChar,
    Opcode::Type,
    Opcode::Label,
    Opcode::Jump,
    Opcode::JumpIfEq,
    Opcode::JumpIfNeq,
    Opcode::Exit,
    Opcode::Dprint,
    Opcode::Break,
];

impl Opcode {
    /// Returns the assembly mnemonic for this opcode.
    pub fn mnemonic(&self) -> &'static str {
        match self {
            Opcode::Move => "MOVE",
            Opcode::CreateFrame => "CREATEFRAME",
            Opcode::PushFrame => "PUSHFRAME",
            Opcode::PopFrame => "POPFRAME",
            Opcode::Defvar => "DEFVAR",
            Opcode::Call => "CALL",
            Opcode::Return => "RETURN",
            Opcode::Pushs => "PUSHS",
            Opcode::Pops => "POPS",
            Opcode::Clears => "CLEARS",
            Opcode::Add => "ADD",
            Opcode::Sub => "SUB",
            Opcode::Mul => "MUL",
            Opcode::Idiv => "IDIV",
            Opcode::Div => "DIV",
            Opcode::Lt => "LT",
            Opcode::Gt => "GT",
            Opcode::Eq => "EQ",
            Opcode::And => "AND",
            Opcode::Or => "OR",
            Opcode::Not => "NOT",
            Opcode::Int2Char => "INT2CHAR",
            Opcode::Stri2Int => "STRI2INT",
            Opcode::Int2Float => "INT2FLOAT",
            Opcode::Float2Int => "FLOAT2INT",
            Opcode::Adds => "ADDS",
            Opcode::Subs => "SUBS",
            Opcode::Muls => "MULS",
            Opcode::Idivs => "IDIVS",
            Opcode::Divs => "DIVS",
            Opcode::Lts => "LTS",
            Opcode::Gts => "GTS",
            Opcode::Eqs => "EQS",
            Opcode::Ands => "ANDS",
            Opcode::Ors => "ORS",
            Opcode::Nots => "NOTS",
            Opcode::Int2Chars => "INT2CHARS",
            Opcode::Stri2Ints => "STRI2INTS",
            Opcode::Int2Floats => "INT2FLOATS",
            Opcode::Float2Ints => "FLOAT2INTS",
            Opcode::JumpIfEqs => "JUMPIFEQS",
            Opcode::JumpIfNeqs => "JUMPIFNEQS",
            Opcode::Read => "READ",
            Opcode::Write => "WRITE",
            Opcode::Concat => "CONCAT",
            Opcode::Strlen => "STRLEN",
            Opcode::GetChar => "GETCHAR",
            Opcode::SetChar => "SETCHAR",
            Opcode::Type => "TYPE",
            Opcode::Label => "LABEL",
            Opcode::Jump => "JUMP",
            Opcode::JumpIfEq => "JUMPIFEQ",
            Opcode::JumpIfNeq => "JUMPIFNEQ",
            Opcode::Exit => "EXIT",
            Opcode::Dprint => "DPRINT",
            Opcode::Break => "BREAK",
        }
    }

    /// Look up an opcode by mnemonic, ignoring ASCII case.
    pub fn from_mnemonic(text: &str) -> Option<Opcode> {
        ALL_OPCODES
            .iter()
            .find(|op| op.mnemonic().eq_ignore_ascii_case(text))
            .copied()
    }

    /// The operand kinds this opcode takes, in order.
    pub fn signature(&self) -> &'static [ArgKind] {
        match self {
            Opcode::CreateFrame
            | Opcode::PushFrame
            | Opcode::PopFrame
            | Opcode::Return
            | Opcode::Clears
            | Opcode::Adds
            | Opcode::Subs
            | Opcode::Muls
            | Opcode::Idivs
            | Opcode::Divs
            | Opcode::Lts
            | Opcode::Gts
            | Opcode::Eqs
            | Opcode::Ands
            | Opcode::Ors
            | Opcode::Nots
            | Opcode::Int2Chars
            | Opcode::Stri2Ints
            | Opcode::Int2Floats
            | Opcode::Float2Ints
            | Opcode::Break => &[],

            Opcode::Defvar | Opcode::Pops => &[V],
            Opcode::Pushs | Opcode::Write | Opcode::Exit | Opcode::Dprint => &[S],
            Opcode::Call
            | Opcode::Label
            | Opcode::Jump
            | Opcode::JumpIfEqs
            | Opcode::JumpIfNeqs => &[L],

            Opcode::Move
            | Opcode::Not
            | Opcode::Int2Char
            | Opcode::Int2Float
            | Opcode::Float2Int
            | Opcode::Strlen
            | Opcode::Type => &[V, S],

            Opcode::Add
            | Opcode::Sub
            | Opcode::Mul
            | Opcode::Idiv
            | Opcode::Div
            | Opcode::Lt
            | Opcode::Gt
            | Opcode::Eq
            | Opcode::And
            | Opcode::Or
            | Opcode::Stri2Int
            | Opcode::Concat
            | Opcode::GetChar
            | Opcode::SetChar => &[V, S, S],

            Opcode::Read => &[V, T],
            Opcode::JumpIfEq | Opcode::JumpIfNeq => &[L, S, S],
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}
