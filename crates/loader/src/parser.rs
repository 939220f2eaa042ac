//! Parser for IPPcode20 tokens -> instructions.
//!
//! Operands are read according to the opcode's signature, so a bare word
//! becomes a label or a type depending on where it appears.

use ippcode_common::escape::decode_escapes;
use ippcode_common::{
    hexfloat, ArgKind, DataType, FrameKind, Instruction, Opcode, Operand, ShapeError, Value,
    Variable,
};

use crate::error::LoadError;
use crate::lexer::Token;

const HEADER: &str = ".IPPcode20";

/// Is `tokens` exactly the `.IPPcode20` header line?
pub(crate) fn is_header(tokens: &[Token]) -> bool {
    matches!(tokens, [Token::Bare(word)] if word.eq_ignore_ascii_case(HEADER))
}

/// Parse a sequence of tokens from a single line into an instruction.
///
/// Returns `Ok(None)` for blank lines (empty token list).
pub(crate) fn parse_line(tokens: &[Token], line_num: usize) -> Result<Option<Instruction>, LoadError> {
    let Some((first, args)) = tokens.split_first() else {
        return Ok(None);
    };

    let opcode = match first {
        Token::Bare(word) => Opcode::from_mnemonic(word),
        Token::Qualified { .. } => None,
    }
    .ok_or_else(|| LoadError::UnknownOpcode {
        line: line_num,
        token: first.text(),
    })?;

    let signature = opcode.signature();
    if args.len() != signature.len() {
        return Err(LoadError::Shape {
            line: line_num,
            source: ShapeError::Arity {
                opcode,
                expected: signature.len(),
                found: args.len(),
            },
        });
    }

    let operands = signature
        .iter()
        .zip(args)
        .map(|(kind, token)| parse_operand(*kind, token, line_num))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Some(Instruction::new(opcode, operands)))
}

fn parse_operand(kind: ArgKind, token: &Token, line_num: usize) -> Result<Operand, LoadError> {
    let invalid = || LoadError::InvalidOperand {
        line: line_num,
        token: token.text(),
        expected: kind,
    };

    match (kind, token) {
        (ArgKind::Var, Token::Qualified { prefix, rest }) => FrameKind::from_prefix(prefix)
            .ok_or_else(invalid)
            .and_then(|frame| parse_variable(frame, rest, &token.text(), line_num)),
        (ArgKind::Symb, Token::Qualified { prefix, rest }) => match FrameKind::from_prefix(prefix) {
            Some(frame) => parse_variable(frame, rest, &token.text(), line_num),
            None => {
                let ty = DataType::from_name(prefix).ok_or_else(invalid)?;
                parse_constant(ty, rest, &token.text(), line_num).map(Operand::Const)
            }
        },
        (ArgKind::Label, Token::Bare(name)) => {
            check_identifier(name, line_num)?;
            Ok(Operand::Label((*name).to_string()))
        }
        (ArgKind::Type, Token::Bare(name)) => DataType::from_name(name)
            .map(Operand::Type)
            .ok_or_else(invalid),
        _ => Err(invalid()),
    }
}

/// `token` is the operand as written, used in error reports.
pub(crate) fn parse_variable(
    frame: FrameKind,
    name: &str,
    token: &str,
    line_num: usize,
) -> Result<Operand, LoadError> {
    if !is_identifier(name) {
        return Err(LoadError::InvalidIdentifier {
            line: line_num,
            token: token.to_string(),
        });
    }
    Ok(Operand::Var(Variable::new(frame, name)))
}

pub(crate) fn parse_constant(
    ty: DataType,
    text: &str,
    token: &str,
    line_num: usize,
) -> Result<Value, LoadError> {
    let literal = || LoadError::InvalidLiteral {
        line: line_num,
        token: token.to_string(),
    };

    match ty {
        DataType::Nil if text == "nil" => Ok(Value::Nil),
        DataType::Nil => Err(literal()),
        DataType::Bool => match text {
            "true" => Ok(Value::Bool(true)),
            "false" => Ok(Value::Bool(false)),
            _ => Err(literal()),
        },
        DataType::Int => text.parse().map(Value::Int).map_err(|_| literal()),
        DataType::Float => hexfloat::parse(text).map(Value::Float).ok_or_else(literal),
        DataType::String => decode_escapes(text)
            .map(Value::Str)
            .map_err(|source| LoadError::Escape {
                line: line_num,
                source,
            }),
    }
}

pub(crate) fn check_identifier(name: &str, line_num: usize) -> Result<(), LoadError> {
    if is_identifier(name) {
        Ok(())
    } else {
        Err(LoadError::InvalidIdentifier {
            line: line_num,
            token: name.to_string(),
        })
    }
}

fn is_special(c: char) -> bool {
    matches!(c, '_' | '-' | '$' | '&' | '%' | '*' | '!' | '?')
}

/// A letter or special character, then letters, digits or special characters.
pub(crate) fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || is_special(c) => {
            chars.all(|c| c.is_alphanumeric() || is_special(c))
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize_line;

    fn parse(text: &str) -> Result<Option<Instruction>, LoadError> {
        parse_line(&tokenize_line(text), 1)
    }

    fn gf(name: &str) -> Operand {
        Operand::Var(Variable::new(FrameKind::Global, name))
    }

    #[test]
    fn header_detection() {
        assert!(is_header(&tokenize_line(".IPPcode20")));
        assert!(is_header(&tokenize_line("  .ippCODE20  # comment")));
        assert!(!is_header(&tokenize_line(".IPPcode19")));
        assert!(!is_header(&tokenize_line(".IPPcode20 extra")));
    }

    #[test]
    fn blank_line() {
        assert_eq!(parse("   # nothing").unwrap(), None);
    }

    #[test]
    fn no_operands() {
        assert_eq!(
            parse("createframe").unwrap(),
            Some(Instruction::new(Opcode::CreateFrame, vec![]))
        );
    }

    #[test]
    fn var_and_constants() {
        assert_eq!(
            parse("MOVE GF@x int@-5").unwrap(),
            Some(Instruction::new(
                Opcode::Move,
                vec![gf("x"), Operand::Const(Value::Int(-5))]
            ))
        );
        assert_eq!(
            parse("EQ GF@r bool@true nil@nil").unwrap(),
            Some(Instruction::new(
                Opcode::Eq,
                vec![
                    gf("r"),
                    Operand::Const(Value::Bool(true)),
                    Operand::Const(Value::Nil)
                ]
            ))
        );
    }

    #[test]
    fn float_constant() {
        assert_eq!(
            parse("WRITE float@0x1.8p+1").unwrap(),
            Some(Instruction::new(
                Opcode::Write,
                vec![Operand::Const(Value::Float(3.0))]
            ))
        );
    }

    #[test]
    fn string_constant_decodes_escapes() {
        assert_eq!(
            parse("WRITE string@a\\032b\\035c").unwrap(),
            Some(Instruction::new(
                Opcode::Write,
                vec![Operand::Const(Value::Str("a b#c".into()))]
            ))
        );
        assert_eq!(
            parse("WRITE string@").unwrap(),
            Some(Instruction::new(
                Opcode::Write,
                vec![Operand::Const(Value::Str(String::new()))]
            ))
        );
    }

    #[test]
    fn label_and_type_operands() {
        assert_eq!(
            parse("JUMPIFEQ end$1 LF@a string@x").unwrap(),
            Some(Instruction::new(
                Opcode::JumpIfEq,
                vec![
                    Operand::Label("end$1".into()),
                    Operand::Var(Variable::new(FrameKind::Local, "a")),
                    Operand::Const(Value::Str("x".into())),
                ]
            ))
        );
        assert_eq!(
            parse("READ TF@v float").unwrap(),
            Some(Instruction::new(
                Opcode::Read,
                vec![
                    Operand::Var(Variable::new(FrameKind::Temporary, "v")),
                    Operand::Type(DataType::Float),
                ]
            ))
        );
    }

    #[test]
    fn unknown_opcode() {
        assert_eq!(
            parse("FROB GF@x").unwrap_err(),
            LoadError::UnknownOpcode {
                line: 1,
                token: "FROB".into()
            }
        );
    }

    #[test]
    fn wrong_arity() {
        assert_eq!(
            parse("ADD GF@x int@1").unwrap_err(),
            LoadError::Shape {
                line: 1,
                source: ShapeError::Arity {
                    opcode: Opcode::Add,
                    expected: 3,
                    found: 2
                }
            }
        );
    }

    #[test]
    fn constant_where_variable_required() {
        assert_eq!(
            parse("MOVE int@1 int@2").unwrap_err(),
            LoadError::InvalidOperand {
                line: 1,
                token: "int@1".into(),
                expected: ArgKind::Var
            }
        );
    }

    #[test]
    fn bad_literals() {
        for text in [
            "WRITE int@1.5",
            "WRITE bool@True",
            "WRITE nil@null",
            "WRITE float@zz",
        ] {
            assert!(
                matches!(parse(text), Err(LoadError::InvalidLiteral { .. })),
                "{text}"
            );
        }
        assert!(matches!(
            parse("WRITE string@bad\\x"),
            Err(LoadError::Escape { .. })
        ));
        assert!(matches!(
            parse("WRITE blob@1"),
            Err(LoadError::InvalidOperand { .. })
        ));
    }

    #[test]
    fn bad_identifiers() {
        assert!(matches!(
            parse("DEFVAR GF@1x"),
            Err(LoadError::InvalidIdentifier { .. })
        ));
        assert!(matches!(
            parse("LABEL a.b"),
            Err(LoadError::InvalidIdentifier { .. })
        ));
        assert!(matches!(
            parse("DEFVAR gf@x"),
            Err(LoadError::InvalidOperand { .. })
        ));
    }

    #[test]
    fn identifier_rules() {
        assert!(is_identifier("x"));
        assert!(is_identifier("_tmp-1"));
        assert!(is_identifier("?ok!"));
        assert!(is_identifier("čaj"));
        assert!(!is_identifier(""));
        assert!(!is_identifier("9lives"));
        assert!(!is_identifier("a@b"));
    }
}
