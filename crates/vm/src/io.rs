//! Input sources for `READ` and the output streams the engine writes to.

use std::collections::VecDeque;
use std::io::{BufRead, Write};

/// Supplier of input lines for `READ`.
pub trait LineSource {
    /// The next raw line, or `None` once the source is exhausted.
    fn next_line(&mut self) -> Option<String>;
}

/// A pre-supplied, ordered list of input lines.
#[derive(Debug, Clone, Default)]
pub struct ScriptedInput {
    lines: VecDeque<String>,
}

impl ScriptedInput {
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
        }
    }

    /// Split text into lines (without terminators).
    pub fn from_text(text: &str) -> Self {
        Self::new(text.lines())
    }

    pub fn remaining(&self) -> usize {
        self.lines.len()
    }
}

impl LineSource for ScriptedInput {
    fn next_line(&mut self) -> Option<String> {
        self.lines.pop_front()
    }
}

/// Lines read on demand from a buffered reader, e.g. stdin.
#[derive(Debug)]
pub struct ReaderInput<R> {
    reader: R,
}

impl<R: BufRead> ReaderInput<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}

impl<R: BufRead> LineSource for ReaderInput<R> {
    // A read error ends the input like EOF does.
    fn next_line(&mut self) -> Option<String> {
        let mut line = String::new();
        match self.reader.read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(line),
        }
    }
}

/// Where a running program reads from and writes to.
pub struct Console<'io> {
    /// Source for `READ`.
    pub input: &'io mut dyn LineSource,
    /// Program output (`WRITE`).
    pub output: &'io mut dyn Write,
    /// Diagnostic stream (`DPRINT`, `BREAK`).
    pub diagnostics: &'io mut dyn Write,
}
