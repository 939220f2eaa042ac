//! IPPcode20 loader: program representation -> instruction list.
//!
//! Two forms are accepted. The line-oriented source is translated line by
//! line: the first meaningful line must be the `.IPPcode20` header and every
//! later non-blank line is one instruction. The XML form is described in
//! [`load_xml`]. [`load_source`] picks the form from the text itself.
//!
//! # Usage
//!
//! ```
//! use ippcode_common::Opcode;
//! use ippcode_loader::load;
//!
//! let text = ".IPPcode20\nDEFVAR GF@x\nMOVE GF@x int@42 # answer\nWRITE GF@x\n";
//! let program = load(text).unwrap();
//! assert_eq!(program.len(), 3);
//! assert_eq!(program.instructions[1].opcode, Opcode::Move);
//! ```

pub mod error;

mod lexer;
mod parser;
mod xml;

pub use error::LoadError;
pub use xml::load_xml;

use ippcode_common::Program;
use lexer::tokenize_line;
use parser::{is_header, parse_line};
use tracing::debug;

/// Load source text into a program.
///
/// Returns the first error encountered, tagged with its 1-based line.
pub fn load(text: &str) -> Result<Program, LoadError> {
    let mut lines = text.lines().enumerate().map(|(idx, line)| (idx + 1, line));

    let mut header_seen = false;
    for (line_num, line) in lines.by_ref() {
        let tokens = tokenize_line(line);
        if tokens.is_empty() {
            continue;
        }
        if !is_header(&tokens) {
            return Err(LoadError::MissingHeader { line: line_num });
        }
        header_seen = true;
        break;
    }
    if !header_seen {
        return Err(LoadError::MissingHeader { line: 1 });
    }

    let mut instructions = Vec::new();
    for (line_num, line) in lines {
        if let Some(instr) = parse_line(&tokenize_line(line), line_num)? {
            instructions.push(instr);
        }
    }

    debug!(count = instructions.len(), "program loaded");
    Ok(Program::new(instructions))
}

/// Load either program form: XML when the first non-blank character is
/// `<`, the line-oriented source otherwise.
pub fn load_source(text: &str) -> Result<Program, LoadError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    if text.trim_start().starts_with('<') {
        load_xml(text)
    } else {
        load(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ippcode_common::Opcode;

    #[test]
    fn load_minimal() {
        let program = load(".IPPcode20\nBREAK\n").unwrap();
        assert_eq!(program.len(), 1);
        assert_eq!(program.instructions[0].opcode, Opcode::Break);
    }

    #[test]
    fn header_only() {
        assert!(load(".IPPcode20").unwrap().is_empty());
    }

    #[test]
    fn comments_and_blanks_before_header() {
        let program = load("# leading comment\n\n  .IPPCODE20 # header\nCLEARS\n").unwrap();
        assert_eq!(program.len(), 1);
    }

    #[test]
    fn missing_header() {
        assert_eq!(
            load("\nWRITE int@1\n").unwrap_err(),
            LoadError::MissingHeader { line: 2 }
        );
        assert_eq!(load("").unwrap_err(), LoadError::MissingHeader { line: 1 });
    }

    #[test]
    fn source_form_detected() {
        let text = load_source(".IPPcode20\nBREAK\n").unwrap();
        let xml = load_source(
            "\n  <program language=\"IPPcode20\"><instruction order=\"1\" opcode=\"BREAK\"/></program>",
        )
        .unwrap();
        assert_eq!(text, xml);
        assert_eq!(
            load_source("<program").unwrap_err().exit_code(),
            31
        );
    }

    #[test]
    fn error_reports_source_line() {
        let err = load(".IPPcode20\n\nCREATEFRAME\n# note\nPUSHS\n").unwrap_err();
        assert_eq!(err.line(), 5);
        assert_eq!(err.exit_code(), 32);
    }
}
