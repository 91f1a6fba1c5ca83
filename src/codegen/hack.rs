//! Hack assembly emission, one routine per command shape.
//!
//! Register conventions: `D` is the working data register, `R13`/`R14` are
//! free scratch words, and no routine relies on register contents left by a
//! previous command. `SP`, `LCL`, `ARG`, `THIS` and `THAT` hold the stack
//! pointer and the four segment base addresses.

use std::fmt::Write;

use super::{Context, EmitError};
use crate::command::{Command, Op, Segment};

/// Address of `pointer 0`; `pointer i` lives at `3 + i` (the `THIS`/`THAT`
/// words and onward).
const POINTER_BASE: u16 = 3;

/// Address of `temp 0`; `temp i` lives at `5 + i`.
const TEMP_BASE: u16 = 5;

/// Initial stack pointer value installed by the bootstrap.
const STACK_BASE: u16 = 256;

/// Function the bootstrap transfers control to.
const ENTRY_FUNCTION: &str = "Sys.init";

/// Words pushed by `call` ahead of the callee's arguments: the return
/// address plus the four saved base registers.
const FRAME_WORDS: u32 = 5;

type Result<T = ()> = std::result::Result<T, EmitError>;

pub(super) fn command(w: &mut String, ctx: &mut Context, unit: &str, command: &Command) -> Result {
    match command {
        Command::Arithmetic(op) => arithmetic(w, ctx, *op),
        Command::Push { segment, index } => push(w, unit, *segment, *index),
        Command::Pop { segment, index } => pop(w, unit, *segment, *index),
        Command::Label(name) => {
            writeln!(w, "({unit}${name})")?;
            Ok(())
        }
        Command::Goto(name) => {
            writeln!(w, "@{unit}${name}")?;
            writeln!(w, "0;JMP")?;
            Ok(())
        }
        Command::IfGoto(name) => {
            pop_d(w)?;
            writeln!(w, "@{unit}${name}")?;
            writeln!(w, "D;JNE")?;
            Ok(())
        }
        Command::Function { name, locals } => function(w, name, *locals),
        Command::Call { name, args } => call(w, ctx, name, *args),
        Command::Return => ret(w),
    }
}

pub(super) fn bootstrap(w: &mut String, ctx: &mut Context) -> Result {
    writeln!(w, "@{STACK_BASE}")?;
    lines(w, &["D=A", "@SP", "M=D"])?;
    call(w, ctx, ENTRY_FUNCTION, 0)
}

fn arithmetic(w: &mut String, ctx: &mut Context, op: Op) -> Result {
    match op {
        Op::Add => binary(w, "D+M"),
        Op::Sub => binary(w, "M-D"),
        Op::And => binary(w, "D&M"),
        Op::Or => binary(w, "D|M"),
        Op::Neg => unary(w, "-M"),
        Op::Not => unary(w, "!M"),
        Op::Eq => compare(w, ctx, "JEQ"),
        Op::Gt => compare(w, ctx, "JGT"),
        Op::Lt => compare(w, ctx, "JLT"),
    }
}

/// Pops the right operand into `D`, then combines with the left operand in
/// place at the new stack top.
fn binary(w: &mut String, comp: &str) -> Result {
    pop_d(w)?;
    writeln!(w, "A=A-1")?;
    writeln!(w, "M={comp}")?;
    Ok(())
}

fn unary(w: &mut String, comp: &str) -> Result {
    lines(w, &["@SP", "A=M-1"])?;
    writeln!(w, "M={comp}")?;
    Ok(())
}

/// Computes left minus right and branches on the sign, leaving all-ones for
/// a true relation and all-zeros otherwise. Each site takes a fresh label
/// pair from the run-wide comparison counter.
fn compare(w: &mut String, ctx: &mut Context, jump: &str) -> Result {
    let id = ctx.next_compare();
    pop_d(w)?;
    lines(w, &["A=A-1", "D=M-D"])?;
    writeln!(w, "@true{id}")?;
    writeln!(w, "D;{jump}")?;
    writeln!(w, "D=0")?;
    writeln!(w, "@end{id}")?;
    writeln!(w, "0;JMP")?;
    writeln!(w, "(true{id})")?;
    writeln!(w, "D=-1")?;
    writeln!(w, "(end{id})")?;
    lines(w, &["@SP", "A=M-1", "M=D"])
}

fn push(w: &mut String, unit: &str, segment: Segment, index: u16) -> Result {
    if let Some(base) = segment.base_register() {
        writeln!(w, "@{base}")?;
        writeln!(w, "D=M")?;
        writeln!(w, "@{index}")?;
        lines(w, &["A=D+A", "D=M"])?;
    } else {
        match segment {
            Segment::Constant => {
                writeln!(w, "@{index}")?;
                writeln!(w, "D=A")?;
            }
            Segment::Static => {
                writeln!(w, "@{unit}.{index}")?;
                writeln!(w, "D=M")?;
            }
            Segment::Pointer => {
                writeln!(w, "@{}", address(POINTER_BASE, index))?;
                writeln!(w, "D=M")?;
            }
            Segment::Temp => {
                writeln!(w, "@{}", address(TEMP_BASE, index))?;
                writeln!(w, "D=M")?;
            }
            _ => unreachable!(),
        }
    }
    push_d(w)
}

fn pop(w: &mut String, unit: &str, segment: Segment, index: u16) -> Result {
    if let Some(base) = segment.base_register() {
        // Destination address goes to R13 first; the pop then stores
        // through it.
        writeln!(w, "@{base}")?;
        writeln!(w, "D=M")?;
        writeln!(w, "@{index}")?;
        lines(w, &["D=D+A", "@R13", "M=D"])?;
        pop_d(w)?;
        return lines(w, &["@R13", "A=M", "M=D"]);
    }
    match segment {
        Segment::Constant => return Err(EmitError::PopConstant),
        Segment::Static => {
            pop_d(w)?;
            writeln!(w, "@{unit}.{index}")?;
        }
        Segment::Pointer => {
            pop_d(w)?;
            writeln!(w, "@{}", address(POINTER_BASE, index))?;
        }
        Segment::Temp => {
            pop_d(w)?;
            writeln!(w, "@{}", address(TEMP_BASE, index))?;
        }
        _ => unreachable!(),
    }
    writeln!(w, "M=D")?;
    Ok(())
}

fn function(w: &mut String, name: &str, locals: u16) -> Result {
    writeln!(w, "({name})")?;
    for _ in 0..locals {
        lines(w, &["@SP", "M=M+1", "A=M-1", "M=0"])?;
    }
    Ok(())
}

fn call(w: &mut String, ctx: &mut Context, name: &str, args: u16) -> Result {
    let id = ctx.next_call();

    writeln!(w, "@{name}_return{id}")?;
    writeln!(w, "D=A")?;
    push_d(w)?;
    for base in ["LCL", "ARG", "THIS", "THAT"] {
        writeln!(w, "@{base}")?;
        writeln!(w, "D=M")?;
        push_d(w)?;
    }
    // ARG = SP - args - FRAME_WORDS, LCL = SP
    writeln!(w, "@SP")?;
    writeln!(w, "D=M")?;
    writeln!(w, "@{}", u32::from(args) + FRAME_WORDS)?;
    lines(w, &["D=D-A", "@ARG", "M=D", "@SP", "D=M", "@LCL", "M=D"])?;
    writeln!(w, "@{name}")?;
    writeln!(w, "0;JMP")?;
    writeln!(w, "({name}_return{id})")?;
    Ok(())
}

/// Unwinds the frame saved by [`call`].
///
/// The frame base (callee `LCL`) and the return address at frame minus
/// [`FRAME_WORDS`] are copied to scratch up front: the restore targets alias
/// the restore sources, so nothing may be overwritten before both are safe.
/// R13 then walks the frame downwards, restoring `THAT`, `THIS`, `ARG` and
/// `LCL` in turn.
fn ret(w: &mut String) -> Result {
    lines(
        w,
        &[
            "@LCL", "D=M", "@R13", "M=D", // R13 = frame
            "@5", "A=D-A", "D=M", "@R14", "M=D", // R14 = return address
        ],
    )?;
    pop_d(w)?;
    lines(
        w,
        &[
            "@ARG", "A=M", "M=D", // *ARG = return value
            "@ARG", "D=M+1", "@SP", "M=D", // SP = ARG + 1
        ],
    )?;
    for base in ["THAT", "THIS", "ARG", "LCL"] {
        lines(w, &["@R13", "AM=M-1", "D=M"])?;
        writeln!(w, "@{base}")?;
        writeln!(w, "M=D")?;
    }
    lines(w, &["@R14", "A=M", "0;JMP"])
}

/// Pushes `D`, bumping the stack pointer.
fn push_d(w: &mut String) -> Result {
    lines(w, &["@SP", "M=M+1", "A=M-1", "M=D"])
}

/// Pops the stack top into `D`, leaving `A` at the popped slot.
fn pop_d(w: &mut String) -> Result {
    lines(w, &["@SP", "AM=M-1", "D=M"])
}

fn lines(w: &mut String, instructions: &[&str]) -> Result {
    for instruction in instructions {
        writeln!(w, "{instruction}")?;
    }
    Ok(())
}

fn address(base: u16, index: u16) -> u32 {
    u32::from(base) + u32::from(index)
}
