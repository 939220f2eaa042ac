//! XML program form.
//!
//! ```xml
//! <program language="IPPcode20">
//!   <instruction order="1" opcode="WRITE">
//!     <arg1 type="string">hello</arg1>
//!   </instruction>
//! </program>
//! ```
//!
//! Instructions run in ascending `order`, which must be a unique positive
//! integer; gaps are allowed. Arguments may appear in any document order
//! but must be exactly `arg1..argN`.

use std::collections::BTreeMap;

use ippcode_common::{ArgKind, DataType, FrameKind, Instruction, Opcode, Operand, Program, ShapeError};
use roxmltree::{Document, Node};
use tracing::debug;

use crate::error::LoadError;
use crate::parser::{check_identifier, parse_constant, parse_variable};

const LANGUAGE: &str = "IPPcode20";

/// Load an XML document into a program.
///
/// Errors carry the 1-based line of the offending element.
pub fn load_xml(text: &str) -> Result<Program, LoadError> {
    let doc = Document::parse(text).map_err(|e| LoadError::MalformedXml {
        line: e.pos().row as usize,
        message: e.to_string(),
    })?;

    let root = doc.root_element();
    if root.tag_name().name() != "program" {
        return Err(structure(
            root,
            format!("expected <program> root, found <{}>", root.tag_name().name()),
        ));
    }
    match root.attribute("language") {
        Some(language) if language.trim().eq_ignore_ascii_case(LANGUAGE) => {}
        _ => return Err(structure(root, "missing language=\"IPPcode20\"")),
    }

    let mut ordered = BTreeMap::new();
    for node in root.children().filter(|n| n.is_element()) {
        let order = instruction_order(node)?;
        if ordered.insert(order, node).is_some() {
            return Err(structure(node, format!("duplicate order {order}")));
        }
    }

    let instructions = ordered
        .into_values()
        .map(parse_instruction)
        .collect::<Result<Vec<_>, _>>()?;

    debug!(count = instructions.len(), "XML program loaded");
    Ok(Program::new(instructions))
}

fn line_of(node: Node) -> usize {
    node.document().text_pos_at(node.range().start).row as usize
}

fn structure(node: Node, reason: impl Into<String>) -> LoadError {
    LoadError::Structure {
        line: line_of(node),
        reason: reason.into(),
    }
}

fn instruction_order(node: Node) -> Result<u64, LoadError> {
    let tag = node.tag_name().name();
    if tag != "instruction" {
        return Err(structure(node, format!("unexpected element <{tag}>")));
    }
    let order = node
        .attribute("order")
        .ok_or_else(|| structure(node, "instruction without order"))?;
    match order.trim().parse::<u64>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(structure(node, format!("invalid order '{order}'"))),
    }
}

fn parse_instruction(node: Node) -> Result<Instruction, LoadError> {
    let line = line_of(node);
    let name = node
        .attribute("opcode")
        .ok_or_else(|| structure(node, "instruction without opcode"))?;
    let opcode = Opcode::from_mnemonic(name.trim()).ok_or_else(|| LoadError::UnknownOpcode {
        line,
        token: name.to_string(),
    })?;

    let args = arguments(node)?;
    let signature = opcode.signature();
    if args.len() != signature.len() {
        return Err(LoadError::Shape {
            line,
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
        .map(|(kind, arg)| parse_argument(*kind, arg))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Instruction::new(opcode, operands))
}

/// The `argN` children sorted by N, which must run from 1 without gaps.
fn arguments<'a, 'input>(node: Node<'a, 'input>) -> Result<Vec<Node<'a, 'input>>, LoadError> {
    let mut args = Vec::new();
    for child in node.children().filter(|n| n.is_element()) {
        let tag = child.tag_name().name();
        let position = tag
            .strip_prefix("arg")
            .filter(|n| !n.starts_with('0') && n.bytes().all(|b| b.is_ascii_digit()))
            .and_then(|n| n.parse::<usize>().ok())
            .ok_or_else(|| structure(child, format!("unexpected element <{tag}>")))?;
        args.push((position, child));
    }

    args.sort_by_key(|(position, _)| *position);
    for (expected, (position, child)) in (1..).zip(&args) {
        if *position < expected {
            return Err(structure(*child, format!("duplicate <arg{position}>")));
        }
        if *position > expected {
            return Err(structure(node, format!("missing <arg{expected}>")));
        }
    }

    Ok(args.into_iter().map(|(_, child)| child).collect())
}

fn parse_argument(kind: ArgKind, arg: Node) -> Result<Operand, LoadError> {
    let line = line_of(arg);
    let ty = arg
        .attribute("type")
        .ok_or_else(|| structure(arg, format!("<{}> without type", arg.tag_name().name())))?;
    let raw = arg.text().unwrap_or("");
    let text = if ty == "string" { raw } else { raw.trim() };
    let token = format!("{ty}@{text}");
    let invalid = || LoadError::InvalidOperand {
        line,
        token: token.clone(),
        expected: kind,
    };

    match (kind, ty) {
        (ArgKind::Var | ArgKind::Symb, "var") => {
            let (prefix, name) = text.split_once('@').ok_or_else(invalid)?;
            let frame = FrameKind::from_prefix(prefix).ok_or_else(invalid)?;
            parse_variable(frame, name, text, line)
        }
        (ArgKind::Symb, _) => {
            let data_type = DataType::from_name(ty).ok_or_else(invalid)?;
            parse_constant(data_type, text, &token, line).map(Operand::Const)
        }
        (ArgKind::Label, "label") => {
            check_identifier(text, line)?;
            Ok(Operand::Label(text.to_string()))
        }
        (ArgKind::Type, "type") => DataType::from_name(text)
            .map(Operand::Type)
            .ok_or_else(invalid),
        _ => Err(invalid()),
    }
}
