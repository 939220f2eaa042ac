//! Instruction operands: variable references, constants, labels and type names.

use std::fmt;

use crate::value::Value;

/// Which frame a variable reference addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameKind {
    /// `GF`: always present.
    Global,
    /// `LF`: top of the local frame stack.
    Local,
    /// `TF`: the temporary frame, if one exists.
    Temporary,
}

impl FrameKind {
    /// The two-letter source prefix (`GF`, `LF`, `TF`).
    pub fn prefix(&self) -> &'static str {
        match self {
            FrameKind::Global => "GF",
            FrameKind::Local => "LF",
            FrameKind::Temporary => "TF",
        }
    }

    /// Parse a frame prefix. Case-sensitive, as in source text.
    pub fn from_prefix(text: &str) -> Option<FrameKind> {
        match text {
            "GF" => Some(FrameKind::Global),
            "LF" => Some(FrameKind::Local),
            "TF" => Some(FrameKind::Temporary),
            _ => None,
        }
    }
}

impl fmt::Display for FrameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

/// A `(frame, name)` variable reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Variable {
    pub frame: FrameKind,
    pub name: String,
}

impl Variable {
    pub fn new(frame: FrameKind, name: impl Into<String>) -> Self {
        Self {
            frame,
            name: name.into(),
        }
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.frame, self.name)
    }
}

/// A type name as used by `READ`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    Nil,
    Bool,
    Int,
    Float,
    String,
}

/// All type names, in definition order.
pub const ALL_DATA_TYPES: [DataType; 5] = [
    DataType::Nil,
    DataType::Bool,
    DataType::Int,
    DataType::Float,
    DataType::String,
];

impl DataType {
    /// Source spelling, also the result of `TYPE`.
    pub fn name(&self) -> &'static str {
        match self {
            DataType::Nil => "nil",
            DataType::Bool => "bool",
            DataType::Int => "int",
            DataType::Float => "float",
            DataType::String => "string",
        }
    }

    pub fn from_name(text: &str) -> Option<DataType> {
        ALL_DATA_TYPES.iter().find(|t| t.name() == text).copied()
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single instruction operand.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// Variable reference.
    Var(Variable),
    /// Constant fixed at load time.
    Const(Value),
    /// Label name.
    Label(String),
    /// Type name.
    Type(DataType),
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Var(var) => write!(f, "{var}"),
            Operand::Const(Value::Nil) => f.write_str("nil@nil"),
            Operand::Const(value) => write!(f, "{}@{}", value.data_type(), value),
            Operand::Label(name) => f.write_str(name),
            Operand::Type(ty) => write!(f, "{ty}"),
        }
    }
}

/// The operand kind an opcode expects at a given position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArgKind {
    /// A variable reference.
    Var,
    /// A variable reference or a constant.
    Symb,
    Label,
    Type,
}

impl ArgKind {
    /// Does `operand` fit this slot?
    pub fn accepts(&self, operand: &Operand) -> bool {
        matches!(
            (self, operand),
            (ArgKind::Var, Operand::Var(_))
                | (ArgKind::Symb, Operand::Var(_) | Operand::Const(_))
                | (ArgKind::Label, Operand::Label(_))
                | (ArgKind::Type, Operand::Type(_))
        )
    }
}

impl fmt::Display for ArgKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ArgKind::Var => "var",
            ArgKind::Symb => "symb",
            ArgKind::Label => "label",
            ArgKind::Type => "type",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_prefix_roundtrip() {
        for kind in [FrameKind::Global, FrameKind::Local, FrameKind::Temporary] {
            assert_eq!(FrameKind::from_prefix(kind.prefix()), Some(kind));
        }
        assert_eq!(FrameKind::from_prefix("gf"), None);
        assert_eq!(FrameKind::from_prefix("XF"), None);
    }

    #[test]
    fn variable_display() {
        let var = Variable::new(FrameKind::Local, "counter");
        assert_eq!(var.to_string(), "LF@counter");
    }

    #[test]
    fn data_type_names() {
        for ty in ALL_DATA_TYPES {
            assert_eq!(DataType::from_name(ty.name()), Some(ty));
        }
        assert_eq!(DataType::from_name("INT"), None);
    }

    #[test]
    fn symb_accepts_var_and_const() {
        let var = Operand::Var(Variable::new(FrameKind::Global, "x"));
        let constant = Operand::Const(Value::Int(1));
        let label = Operand::Label("end".to_string());

        assert!(ArgKind::Symb.accepts(&var));
        assert!(ArgKind::Symb.accepts(&constant));
        assert!(!ArgKind::Symb.accepts(&label));
        assert!(ArgKind::Var.accepts(&var));
        assert!(!ArgKind::Var.accepts(&constant));
        assert!(ArgKind::Label.accepts(&label));
        assert!(ArgKind::Type.accepts(&Operand::Type(DataType::Int)));
    }

    #[test]
    fn operand_display() {
        assert_eq!(Operand::Const(Value::Int(-3)).to_string(), "int@-3");
        assert_eq!(Operand::Const(Value::Nil).to_string(), "nil@nil");
        assert_eq!(Operand::Type(DataType::Bool).to_string(), "bool");
    }
}
