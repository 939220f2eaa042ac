//! Main execution loop and opcode dispatch for the IPPcode20 VM.

use std::fmt::Write as _;
use std::io::Write as _;

use ippcode_common::{hexfloat, DataType, Instruction, Opcode, Operand, Value};
use tracing::{debug, trace};

use crate::error::RuntimeError;
use crate::labels::LabelTable;
use crate::machine::{Halt, VM};
use crate::memory::Frame;

/// Pure operation over two evaluated operands.
type BinaryOp<'a> = fn(&VM<'a>, Opcode, &Value, &Value) -> Result<Value, RuntimeError>;
/// Pure operation over one evaluated operand.
type UnaryOp<'a> = fn(&VM<'a>, Opcode, &Value) -> Result<Value, RuntimeError>;

impl<'a> VM<'a> {
    /// Execute the program until it runs off the end, hits EXIT, or fails.
    pub fn execute(&mut self) -> Result<Halt, RuntimeError> {
        self.labels = LabelTable::build(self.program)?;
        self.pc = 0;
        let program = self.program;

        loop {
            let Some(instr) = program.get(self.pc) else {
                debug!(executed = self.stats.instructions, "end of program");
                return Ok(Halt::Finished);
            };
            self.pc += 1;

            instr
                .check_shape()
                .map_err(|source| RuntimeError::Malformed { at: self.pc, source })?;
            trace!(pc = self.pc, %instr, "dispatch");

            if !matches!(instr.opcode, Opcode::Label | Opcode::Dprint | Opcode::Break) {
                self.stats.instructions += 1;
            }

            match instr.opcode {
                // Frames and calls
                Opcode::Move => self.exec_move(instr)?,
                Opcode::CreateFrame => self.memory.create_frame(),
                Opcode::PushFrame => self.memory.push_frame().map_err(|e| e.at(self.pc))?,
                Opcode::PopFrame => self.memory.pop_frame().map_err(|e| e.at(self.pc))?,
                Opcode::Defvar => self.exec_defvar(instr)?,
                Opcode::Call => self.exec_call(instr)?,
                Opcode::Return => self.exec_return()?,

                // Value stack
                Opcode::Pushs => {
                    let value = self.symb(instr, 0)?;
                    self.stack.push(value);
                }
                Opcode::Pops => self.exec_pops(instr)?,
                Opcode::Clears => self.stack.clear(),

                // Arithmetic, relational, boolean, conversion
                Opcode::Add => self.exec_binary(instr, Self::add)?,
                Opcode::Sub => self.exec_binary(instr, Self::sub)?,
                Opcode::Mul => self.exec_binary(instr, Self::mul)?,
                Opcode::Idiv => self.exec_binary(instr, Self::idiv)?,
                Opcode::Div => self.exec_binary(instr, Self::div)?,
                Opcode::Lt => self.exec_binary(instr, Self::lt)?,
                Opcode::Gt => self.exec_binary(instr, Self::gt)?,
                Opcode::Eq => self.exec_binary(instr, Self::eq)?,
                Opcode::And => self.exec_binary(instr, Self::and)?,
                Opcode::Or => self.exec_binary(instr, Self::or)?,
                Opcode::Not => self.exec_unary(instr, Self::not)?,
                Opcode::Int2Char => self.exec_unary(instr, Self::int2char)?,
                Opcode::Stri2Int => self.exec_binary(instr, Self::stri2int)?,
                Opcode::Int2Float => self.exec_unary(instr, Self::int2float)?,
                Opcode::Float2Int => self.exec_unary(instr, Self::float2int)?,

                // Stack-flavoured variants
                Opcode::Adds => self.exec_binary_stack(instr.opcode, Self::add)?,
                Opcode::Subs => self.exec_binary_stack(instr.opcode, Self::sub)?,
                Opcode::Muls => self.exec_binary_stack(instr.opcode, Self::mul)?,
                Opcode::Idivs => self.exec_binary_stack(instr.opcode, Self::idiv)?,
                Opcode::Divs => self.exec_binary_stack(instr.opcode, Self::div)?,
                Opcode::Lts => self.exec_binary_stack(instr.opcode, Self::lt)?,
                Opcode::Gts => self.exec_binary_stack(instr.opcode, Self::gt)?,
                Opcode::Eqs => self.exec_binary_stack(instr.opcode, Self::eq)?,
                Opcode::Ands => self.exec_binary_stack(instr.opcode, Self::and)?,
                Opcode::Ors => self.exec_binary_stack(instr.opcode, Self::or)?,
                Opcode::Nots => self.exec_unary_stack(instr.opcode, Self::not)?,
                Opcode::Int2Chars => self.exec_unary_stack(instr.opcode, Self::int2char)?,
                Opcode::Stri2Ints => self.exec_binary_stack(instr.opcode, Self::stri2int)?,
                Opcode::Int2Floats => self.exec_unary_stack(instr.opcode, Self::int2float)?,
                Opcode::Float2Ints => self.exec_unary_stack(instr.opcode, Self::float2int)?,
                Opcode::JumpIfEqs => self.exec_jump_if_stack(instr, true)?,
                Opcode::JumpIfNeqs => self.exec_jump_if_stack(instr, false)?,

                // I/O
                Opcode::Read => self.exec_read(instr)?,
                Opcode::Write => {
                    let value = self.symb(instr, 0)?;
                    self.emit(&value.to_string())?;
                }

                // Strings
                Opcode::Concat => self.exec_binary(instr, Self::concat)?,
                Opcode::Strlen => self.exec_unary(instr, Self::strlen)?,
                Opcode::GetChar => self.exec_binary(instr, Self::getchar)?,
                Opcode::SetChar => self.exec_setchar(instr)?,

                // Types
                Opcode::Type => self.exec_type(instr)?,

                // Control flow
                Opcode::Label => {}
                Opcode::Jump => {
                    self.pc = self.resolve(self.label(instr, 0)?)?;
                }
                Opcode::JumpIfEq => self.exec_jump_if(instr, true)?,
                Opcode::JumpIfNeq => self.exec_jump_if(instr, false)?,
                Opcode::Exit => return self.exec_exit(instr),

                // Debugging
                Opcode::Dprint => {
                    let text = self.symb(instr, 0)?.diagnostic();
                    self.emit_diagnostic(&text)?;
                }
                Opcode::Break => {
                    let dump = self.dump_state();
                    self.emit_diagnostic(&dump)?;
                }
            }
        }
    }

    // ---- Frames and calls ----

    fn exec_move(&mut self, instr: &Instruction) -> Result<(), RuntimeError> {
        let target = self.var(instr, 0)?;
        let value = self.symb(instr, 1)?;
        self.store(target, value)
    }

    fn exec_defvar(&mut self, instr: &Instruction) -> Result<(), RuntimeError> {
        let var = self.var(instr, 0)?;
        self.memory.declare(var).map_err(|e| e.at(self.pc))?;
        self.stats.variable_writes += 1;
        Ok(())
    }

    fn exec_call(&mut self, instr: &Instruction) -> Result<(), RuntimeError> {
        let target = self.resolve(self.label(instr, 0)?)?;
        // pc already points at the instruction after CALL.
        self.call_stack.push(self.pc);
        self.pc = target;
        Ok(())
    }

    fn exec_return(&mut self) -> Result<(), RuntimeError> {
        self.pc = self
            .call_stack
            .pop()
            .ok_or(RuntimeError::EmptyCallStack { at: self.pc })?;
        Ok(())
    }

    fn exec_pops(&mut self, instr: &Instruction) -> Result<(), RuntimeError> {
        let target = self.var(instr, 0)?;
        self.memory
            .check_writable(target)
            .map_err(|e| e.at(self.pc))?;
        let value = self.pop()?;
        self.store(target, value)
    }

    // ---- Generic dispatch shapes ----

    /// `OP var symb1 symb2`
    fn exec_binary(&mut self, instr: &Instruction, op: BinaryOp<'a>) -> Result<(), RuntimeError> {
        let target = self.var(instr, 0)?;
        let left = self.symb(instr, 1)?;
        let right = self.symb(instr, 2)?;
        let result = op(self, instr.opcode, &left, &right)?;
        self.store(target, result)
    }

    /// `OP var symb`
    fn exec_unary(&mut self, instr: &Instruction, op: UnaryOp<'a>) -> Result<(), RuntimeError> {
        let target = self.var(instr, 0)?;
        let operand = self.symb(instr, 1)?;
        let result = op(self, instr.opcode, &operand)?;
        self.store(target, result)
    }

    /// Stack form of a binary operation: the right operand is on top.
    /// Nothing is popped unless the operation succeeds.
    fn exec_binary_stack(&mut self, opcode: Opcode, op: BinaryOp<'a>) -> Result<(), RuntimeError> {
        let result = {
            let top = self.peek(2)?;
            op(self, opcode, &top[0], &top[1])?
        };
        self.replace_top(2, result);
        Ok(())
    }

    fn exec_unary_stack(&mut self, opcode: Opcode, op: UnaryOp<'a>) -> Result<(), RuntimeError> {
        let result = {
            let top = self.peek(1)?;
            op(self, opcode, &top[0])?
        };
        self.replace_top(1, result);
        Ok(())
    }

    // ---- Arithmetic ----

    fn arith(
        &self,
        opcode: Opcode,
        left: &Value,
        right: &Value,
        int_op: fn(i64, i64) -> i64,
        float_op: fn(f64, f64) -> f64,
    ) -> Result<Value, RuntimeError> {
        match (left, right) {
            (Value::Int(a), Value::Int(b)) => Ok(Value::Int(int_op(*a, *b))),
            (Value::Float(a), Value::Float(b)) => Ok(Value::Float(float_op(*a, *b))),
            _ => Err(self.type_mismatch(opcode)),
        }
    }

    fn add(&self, opcode: Opcode, left: &Value, right: &Value) -> Result<Value, RuntimeError> {
        self.arith(opcode, left, right, i64::wrapping_add, |a, b| a + b)
    }

    fn sub(&self, opcode: Opcode, left: &Value, right: &Value) -> Result<Value, RuntimeError> {
        self.arith(opcode, left, right, i64::wrapping_sub, |a, b| a - b)
    }

    fn mul(&self, opcode: Opcode, left: &Value, right: &Value) -> Result<Value, RuntimeError> {
        self.arith(opcode, left, right, i64::wrapping_mul, |a, b| a * b)
    }

    /// Integer division rounding toward negative infinity.
    fn idiv(&self, opcode: Opcode, left: &Value, right: &Value) -> Result<Value, RuntimeError> {
        match (left, right) {
            (Value::Int(_), Value::Int(0)) => Err(RuntimeError::DivisionByZero { at: self.pc }),
            (Value::Int(a), Value::Int(b)) => Ok(Value::Int(floor_div(*a, *b))),
            _ => Err(self.type_mismatch(opcode)),
        }
    }

    fn div(&self, opcode: Opcode, left: &Value, right: &Value) -> Result<Value, RuntimeError> {
        match (left, right) {
            (Value::Float(_), Value::Float(b)) if *b == 0.0 => {
                Err(RuntimeError::DivisionByZero { at: self.pc })
            }
            (Value::Float(a), Value::Float(b)) => Ok(Value::Float(a / b)),
            _ => Err(self.type_mismatch(opcode)),
        }
    }

    // ---- Relational and boolean ----

    fn lt(&self, opcode: Opcode, left: &Value, right: &Value) -> Result<Value, RuntimeError> {
        left.try_lt(right)
            .map(Value::Bool)
            .ok_or_else(|| self.type_mismatch(opcode))
    }

    fn gt(&self, opcode: Opcode, left: &Value, right: &Value) -> Result<Value, RuntimeError> {
        left.try_gt(right)
            .map(Value::Bool)
            .ok_or_else(|| self.type_mismatch(opcode))
    }

    fn eq(&self, opcode: Opcode, left: &Value, right: &Value) -> Result<Value, RuntimeError> {
        left.try_eq(right)
            .map(Value::Bool)
            .ok_or_else(|| self.type_mismatch(opcode))
    }

    fn and(&self, opcode: Opcode, left: &Value, right: &Value) -> Result<Value, RuntimeError> {
        match (left, right) {
            (Value::Bool(a), Value::Bool(b)) => Ok(Value::Bool(*a && *b)),
            _ => Err(self.type_mismatch(opcode)),
        }
    }

    fn or(&self, opcode: Opcode, left: &Value, right: &Value) -> Result<Value, RuntimeError> {
        match (left, right) {
            (Value::Bool(a), Value::Bool(b)) => Ok(Value::Bool(*a || *b)),
            _ => Err(self.type_mismatch(opcode)),
        }
    }

    fn not(&self, opcode: Opcode, operand: &Value) -> Result<Value, RuntimeError> {
        match operand {
            Value::Bool(b) => Ok(Value::Bool(!b)),
            _ => Err(self.type_mismatch(opcode)),
        }
    }

    // ---- Conversions ----

    fn int2char(&self, opcode: Opcode, operand: &Value) -> Result<Value, RuntimeError> {
        let Value::Int(code) = operand else {
            return Err(self.type_mismatch(opcode));
        };
        u32::try_from(*code)
            .ok()
            .and_then(char::from_u32)
            .map(|c| Value::Str(c.to_string()))
            .ok_or(RuntimeError::InvalidCodePoint { at: self.pc, code: *code })
    }

    fn stri2int(&self, opcode: Opcode, left: &Value, right: &Value) -> Result<Value, RuntimeError> {
        match (left, right) {
            (Value::Str(s), Value::Int(index)) => {
                let c = self.char_at(s, *index)?;
                Ok(Value::Int(i64::from(u32::from(c))))
            }
            _ => Err(self.type_mismatch(opcode)),
        }
    }

    fn int2float(&self, opcode: Opcode, operand: &Value) -> Result<Value, RuntimeError> {
        match operand {
            Value::Int(i) => Ok(Value::Float(*i as f64)),
            _ => Err(self.type_mismatch(opcode)),
        }
    }

    /// Truncates toward zero. NaN, infinities and values outside the
    /// i64 range are rejected.
    fn float2int(&self, opcode: Opcode, operand: &Value) -> Result<Value, RuntimeError> {
        let Value::Float(f) = operand else {
            return Err(self.type_mismatch(opcode));
        };
        // 2^63 is exactly representable; i64::MAX is not.
        const LIMIT: f64 = 9_223_372_036_854_775_808.0;
        let truncated = f.trunc();
        if truncated.is_finite() && truncated >= -LIMIT && truncated < LIMIT {
            Ok(Value::Int(truncated as i64))
        } else {
            Err(RuntimeError::FloatConversion {
                at: self.pc,
                value: hexfloat::format(*f),
            })
        }
    }

    // ---- Strings ----

    fn concat(&self, opcode: Opcode, left: &Value, right: &Value) -> Result<Value, RuntimeError> {
        match (left, right) {
            (Value::Str(a), Value::Str(b)) => Ok(Value::Str(format!("{a}{b}"))),
            _ => Err(self.type_mismatch(opcode)),
        }
    }

    fn strlen(&self, opcode: Opcode, operand: &Value) -> Result<Value, RuntimeError> {
        match operand {
            Value::Str(s) => Ok(Value::Int(s.chars().count() as i64)),
            _ => Err(self.type_mismatch(opcode)),
        }
    }

    fn getchar(&self, opcode: Opcode, left: &Value, right: &Value) -> Result<Value, RuntimeError> {
        match (left, right) {
            (Value::Str(s), Value::Int(index)) => {
                Ok(Value::Str(self.char_at(s, *index)?.to_string()))
            }
            _ => Err(self.type_mismatch(opcode)),
        }
    }

    fn exec_setchar(&mut self, instr: &Instruction) -> Result<(), RuntimeError> {
        let target = self.var(instr, 0)?;
        let current = self
            .memory
            .read(target)
            .cloned()
            .map_err(|e| e.at(self.pc))?;
        let index = self.symb(instr, 1)?;
        let replacement = self.symb(instr, 2)?;

        let (Value::Str(s), Value::Int(index), Value::Str(replacement)) =
            (current, index, replacement)
        else {
            return Err(self.type_mismatch(instr.opcode));
        };

        let mut chars: Vec<char> = s.chars().collect();
        let slot = self.char_index(chars.len(), index)?;
        let c = replacement
            .chars()
            .next()
            .ok_or(RuntimeError::EmptyReplacement { at: self.pc })?;
        chars[slot] = c;
        self.store(target, Value::Str(chars.into_iter().collect()))
    }

    /// Character at `index`, counted in Unicode scalar values.
    fn char_at(&self, s: &str, index: i64) -> Result<char, RuntimeError> {
        let length = s.chars().count();
        let slot = self.char_index(length, index)?;
        s.chars()
            .nth(slot)
            .ok_or(RuntimeError::StringIndex { at: self.pc, index, length })
    }

    fn char_index(&self, length: usize, index: i64) -> Result<usize, RuntimeError> {
        usize::try_from(index)
            .ok()
            .filter(|slot| *slot < length)
            .ok_or(RuntimeError::StringIndex { at: self.pc, index, length })
    }

    // ---- Types and input ----

    fn exec_type(&mut self, instr: &Instruction) -> Result<(), RuntimeError> {
        let target = self.var(instr, 0)?;
        let name = match instr.args.get(1) {
            Some(Operand::Var(var)) => self
                .memory
                .lookup(var)
                .map_err(|e| e.at(self.pc))?
                .map_or("", Value::type_name),
            _ => self.symb(instr, 1)?.type_name(),
        };
        self.store(target, Value::Str(name.to_string()))
    }

    fn exec_read(&mut self, instr: &Instruction) -> Result<(), RuntimeError> {
        let target = self.var(instr, 0)?;
        let ty = self.data_type(instr, 1)?;
        if ty == DataType::Nil {
            return Err(RuntimeError::UnsupportedReadType {
                at: self.pc,
                ty: ty.name(),
            });
        }
        self.memory
            .check_writable(target)
            .map_err(|e| e.at(self.pc))?;

        let line = self.console.input.next_line().unwrap_or_default();
        let value = convert_input(line.trim_end(), ty);
        self.store(target, value)
    }

    // ---- Control flow ----

    fn exec_jump_if(&mut self, instr: &Instruction, on_equal: bool) -> Result<(), RuntimeError> {
        let target = self.resolve(self.label(instr, 0)?)?;
        let left = self.symb(instr, 1)?;
        let right = self.symb(instr, 2)?;
        let equal = left
            .try_eq(&right)
            .ok_or_else(|| self.type_mismatch(instr.opcode))?;
        if equal == on_equal {
            self.pc = target;
        }
        Ok(())
    }

    fn exec_jump_if_stack(&mut self, instr: &Instruction, on_equal: bool) -> Result<(), RuntimeError> {
        let target = self.resolve(self.label(instr, 0)?)?;
        let equal = {
            let top = self.peek(2)?;
            top[0]
                .try_eq(&top[1])
                .ok_or_else(|| self.type_mismatch(instr.opcode))?
        };
        let len = self.stack.len();
        self.stack.truncate(len - 2);
        if equal == on_equal {
            self.pc = target;
        }
        Ok(())
    }

    fn exec_exit(&mut self, instr: &Instruction) -> Result<Halt, RuntimeError> {
        match self.symb(instr, 0)? {
            Value::Int(code) => match u8::try_from(code) {
                Ok(status) if status <= 49 => {
                    debug!(status, executed = self.stats.instructions, "exit");
                    Ok(Halt::Exit(status))
                }
                _ => Err(RuntimeError::InvalidExitCode { at: self.pc, code }),
            },
            _ => Err(self.type_mismatch(instr.opcode)),
        }
    }

    // ---- Output ----

    fn emit(&mut self, text: &str) -> Result<(), RuntimeError> {
        let at = self.pc;
        self.console
            .output
            .write_all(text.as_bytes())
            .map_err(|e| RuntimeError::Output { at, message: e.to_string() })
    }

    fn emit_diagnostic(&mut self, text: &str) -> Result<(), RuntimeError> {
        let at = self.pc;
        self.console
            .diagnostics
            .write_all(text.as_bytes())
            .map_err(|e| RuntimeError::Output { at, message: e.to_string() })
    }

    /// Human-readable snapshot of the machine for BREAK.
    fn dump_state(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "-- break at instruction {} --", self.pc);
        let _ = writeln!(out, "executed: {}", self.stats.instructions);
        let _ = writeln!(out, "call stack: {:?}", self.call_stack);
        let _ = writeln!(out, "GF: {}", describe_frame(self.memory.global()));
        for (depth, frame) in self.memory.locals().iter().rev().enumerate() {
            let _ = writeln!(out, "LF[{depth}]: {}", describe_frame(frame));
        }
        match self.memory.temporary() {
            Some(frame) => {
                let _ = writeln!(out, "TF: {}", describe_frame(frame));
            }
            None => {
                let _ = writeln!(out, "TF: undefined");
            }
        }
        let stack: Vec<String> = self.stack.iter().map(describe_value).collect();
        let _ = writeln!(out, "stack: [{}]", stack.join(", "));
        let labels: Vec<String> = self
            .labels
            .iter()
            .map(|(name, pc)| format!("{name}@{}", pc + 1))
            .collect();
        let _ = writeln!(out, "labels: [{}]", labels.join(", "));
        out
    }

    fn type_mismatch(&self, opcode: Opcode) -> RuntimeError {
        RuntimeError::TypeMismatch { at: self.pc, opcode }
    }
}

fn floor_div(a: i64, b: i64) -> i64 {
    let q = a.wrapping_div(b);
    if a.wrapping_rem(b) != 0 && ((a < 0) != (b < 0)) {
        q - 1
    } else {
        q
    }
}

/// Convert one input line to the requested type. Unparseable ints become
/// nil and unparseable floats become the empty string.
fn convert_input(line: &str, ty: DataType) -> Value {
    match ty {
        DataType::Bool => Value::Bool(line.eq_ignore_ascii_case("true")),
        DataType::Int => line.trim_start().parse().map_or(Value::Nil, Value::Int),
        DataType::Float => {
            hexfloat::parse(line.trim_start()).map_or(Value::Str(String::new()), Value::Float)
        }
        DataType::String | DataType::Nil => Value::Str(line.to_string()),
    }
}

fn describe_value(value: &Value) -> String {
    format!("{}@{}", value.type_name(), value.diagnostic())
}

fn describe_frame(frame: &Frame) -> String {
    let slots: Vec<String> = frame
        .iter()
        .map(|(name, value)| match value {
            Some(v) => format!("{name}={}", describe_value(v)),
            None => format!("{name}=?"),
        })
        .collect();
    format!("{{{}}}", slots.join(", "))
}
