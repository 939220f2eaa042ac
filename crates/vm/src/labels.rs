//! Label table: label name -> instruction index, built once before execution.

use indexmap::IndexMap;
use ippcode_common::Program;
use tracing::debug;

use crate::error::RuntimeError;

/// Immutable mapping from label name to the 0-based index of its `LABEL`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelTable {
    targets: IndexMap<String, usize>,
}

impl LabelTable {
    /// Scan the whole program in order and record every `LABEL`.
    ///
    /// A label defined twice is an error reported at its second definition.
    pub fn build(program: &Program) -> Result<Self, RuntimeError> {
        let mut targets = IndexMap::new();

        for (pc, instr) in program.instructions.iter().enumerate() {
            if let Some(name) = instr.defined_label() {
                if targets.insert(name.to_string(), pc).is_some() {
                    return Err(RuntimeError::DuplicateLabel {
                        at: pc + 1,
                        label: name.to_string(),
                    });
                }
            }
        }

        debug!(count = targets.len(), "label table built");
        Ok(Self { targets })
    }

    /// Index of the `LABEL` instruction named `name`.
    pub fn resolve(&self, name: &str) -> Option<usize> {
        self.targets.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Labels in program order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.targets.iter().map(|(k, v)| (k.as_str(), *v))
    }
}
