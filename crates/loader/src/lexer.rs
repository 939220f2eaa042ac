//! Tokenizer for IPPcode20 source text.

/// A single whitespace-separated word of a source line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Token<'a> {
    /// `prefix@rest`: a variable reference or a typed constant.
    Qualified { prefix: &'a str, rest: &'a str },
    /// A bare word: header, opcode, label or type name.
    Bare(&'a str),
}

impl Token<'_> {
    /// The token as written in the source.
    pub(crate) fn text(&self) -> String {
        match self {
            Token::Qualified { prefix, rest } => format!("{prefix}@{rest}"),
            Token::Bare(word) => (*word).to_string(),
        }
    }
}

/// Tokenize a single line of source text.
///
/// Returns an empty Vec for blank lines and comment-only lines.
/// Comments start with `#` and extend to end of line.
pub(crate) fn tokenize_line(line: &str) -> Vec<Token<'_>> {
    let line = match line.find('#') {
        Some(pos) => &line[..pos],
        None => line,
    };

    line.split_whitespace()
        .map(|word| match word.split_once('@') {
            Some((prefix, rest)) => Token::Qualified { prefix, rest },
            None => Token::Bare(word),
        })
        .collect()
}
