//! The three-tier frame memory model.
//!
//! - The global frame always exists.
//! - Local frames form a stack; `LF` addresses its top and exists only
//!   while the stack is non-empty.
//! - The temporary frame is either absent or present. `CREATEFRAME`
//!   installs a fresh one, `PUSHFRAME` moves it onto the local stack,
//!   `POPFRAME` moves the local top back into it.
//!
//! Operations check all preconditions before mutating anything, so a failed
//! call leaves the memory untouched.

use indexmap::IndexMap;
use ippcode_common::{FrameKind, Value, Variable};
use thiserror::Error;

use crate::error::RuntimeError;

/// Memory-model failures, without instruction position.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MemoryError {
    #[error("frame {0} does not exist")]
    FrameNotFound(FrameKind),
    #[error("undeclared variable {0}")]
    Undeclared(String),
    #[error("variable {0} already declared")]
    Redeclared(String),
    #[error("variable {0} has no value")]
    MissingValue(String),
}

impl MemoryError {
    /// Attach the failing instruction position.
    pub fn at(self, at: usize) -> RuntimeError {
        match self {
            MemoryError::FrameNotFound(frame) => RuntimeError::FrameNotFound { at, frame },
            MemoryError::Undeclared(name) => RuntimeError::UndeclaredVariable { at, name },
            MemoryError::Redeclared(name) => RuntimeError::Redefinition { at, name },
            MemoryError::MissingValue(name) => RuntimeError::MissingValue { at, name },
        }
    }
}

/// Named variable storage. A declared slot is `None` until first written.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frame {
    slots: IndexMap<String, Option<Value>>,
}

impl Frame {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.slots.contains_key(name)
    }

    /// Slot contents: `None` if undeclared, `Some(None)` if uninitialised.
    pub fn slot(&self, name: &str) -> Option<Option<&Value>> {
        self.slots.get(name).map(Option::as_ref)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Declared variables in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&Value>)> {
        self.slots.iter().map(|(k, v)| (k.as_str(), v.as_ref()))
    }
}

/// Owner of the global, local and temporary frames.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Memory {
    global: Frame,
    locals: Vec<Frame>,
    temporary: Option<Frame>,
}

impl Memory {
    pub fn new() -> Self {
        Self::default()
    }

    fn frame(&self, kind: FrameKind) -> Result<&Frame, MemoryError> {
        let frame = match kind {
            FrameKind::Global => Some(&self.global),
            FrameKind::Local => self.locals.last(),
            FrameKind::Temporary => self.temporary.as_ref(),
        };
        frame.ok_or(MemoryError::FrameNotFound(kind))
    }

    fn frame_mut(&mut self, kind: FrameKind) -> Result<&mut Frame, MemoryError> {
        let frame = match kind {
            FrameKind::Global => Some(&mut self.global),
            FrameKind::Local => self.locals.last_mut(),
            FrameKind::Temporary => self.temporary.as_mut(),
        };
        frame.ok_or(MemoryError::FrameNotFound(kind))
    }

    /// Create an uninitialised slot.
    pub fn declare(&mut self, var: &Variable) -> Result<(), MemoryError> {
        let frame = self.frame_mut(var.frame)?;
        if frame.contains(&var.name) {
            return Err(MemoryError::Redeclared(var.to_string()));
        }
        frame.slots.insert(var.name.clone(), None);
        Ok(())
    }

    /// Slot contents, `None` meaning declared but uninitialised.
    pub fn lookup(&self, var: &Variable) -> Result<Option<&Value>, MemoryError> {
        self.frame(var.frame)?
            .slot(&var.name)
            .ok_or_else(|| MemoryError::Undeclared(var.to_string()))
    }

    /// The stored value. Uninitialised slots are an error.
    pub fn read(&self, var: &Variable) -> Result<&Value, MemoryError> {
        self.lookup(var)?
            .ok_or_else(|| MemoryError::MissingValue(var.to_string()))
    }

    /// Ensure `var` could be written, without writing it.
    pub fn check_writable(&self, var: &Variable) -> Result<(), MemoryError> {
        self.lookup(var).map(|_| ())
    }

    /// Store into an existing declared slot.
    pub fn write(&mut self, var: &Variable, value: Value) -> Result<(), MemoryError> {
        let frame = self.frame_mut(var.frame)?;
        match frame.slots.get_mut(&var.name) {
            Some(slot) => {
                *slot = Some(value);
                Ok(())
            }
            None => Err(MemoryError::Undeclared(var.to_string())),
        }
    }

    /// `CREATEFRAME`: replace any temporary frame with an empty one.
    pub fn create_frame(&mut self) {
        self.temporary = Some(Frame::new());
    }

    /// `PUSHFRAME`: temporary frame becomes the new local top.
    pub fn push_frame(&mut self) -> Result<(), MemoryError> {
        let frame = self
            .temporary
            .take()
            .ok_or(MemoryError::FrameNotFound(FrameKind::Temporary))?;
        self.locals.push(frame);
        Ok(())
    }

    /// `POPFRAME`: local top becomes the temporary frame.
    pub fn pop_frame(&mut self) -> Result<(), MemoryError> {
        let frame = self
            .locals
            .pop()
            .ok_or(MemoryError::FrameNotFound(FrameKind::Local))?;
        self.temporary = Some(frame);
        Ok(())
    }

    pub fn global(&self) -> &Frame {
        &self.global
    }

    /// Local frames, bottom first.
    pub fn locals(&self) -> &[Frame] {
        &self.locals
    }

    pub fn temporary(&self) -> Option<&Frame> {
        self.temporary.as_ref()
    }
}
