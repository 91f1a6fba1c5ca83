use std::fmt;

use crate::command::Command;

mod hack;

/// Upper bound, in bytes, on the assembly text a single command may expand
/// to. The scratch buffer itself grows freely; the cap only exists so that a
/// pathological command (say, a `function` declaring tens of thousands of
/// locals) surfaces as a typed error instead of a giant artifact.
pub const MAX_COMMAND_OUTPUT: usize = 64 * 1024;

/// Cross-command label state for one translation run.
///
/// Comparison sites and call sites draw from separate counter spaces; both
/// are monotonic for the lifetime of the context, which is what keeps every
/// generated label unique across a multi-unit run. Construct a fresh context
/// per run; there is no hidden global to reset.
#[derive(Debug, Default)]
pub struct Context {
    compare_labels: u32,
    call_labels: u32,
}

impl Context {
    pub fn new() -> Context {
        Context::default()
    }

    fn next_compare(&mut self) -> u32 {
        let id = self.compare_labels;
        self.compare_labels += 1;
        id
    }

    fn next_call(&mut self) -> u32 {
        let id = self.call_labels;
        self.call_labels += 1;
        id
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmitError {
    /// The command's generated text exceeded [`MAX_COMMAND_OUTPUT`].
    Overflow { len: usize },
    /// `pop constant` has no destination to store into.
    PopConstant,
    /// A formatter reported failure while encoding instruction text.
    Fmt,
}

impl fmt::Display for EmitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmitError::Overflow { len } => write!(
                f,
                "generated {len} bytes of assembly, over the {MAX_COMMAND_OUTPUT} byte per-command capacity"
            ),
            EmitError::PopConstant => write!(f, "cannot pop into the constant segment"),
            EmitError::Fmt => write!(f, "error encoding instruction text"),
        }
    }
}

impl std::error::Error for EmitError {}

impl From<fmt::Error> for EmitError {
    fn from(_: fmt::Error) -> EmitError {
        EmitError::Fmt
    }
}

/// Translates single commands into Hack assembly text.
///
/// The emitter owns one scratch buffer which is cleared and refilled per
/// command; the returned `&str` is only valid until the next emission, by
/// which time the driver must have committed it to the output artifact. On
/// failure nothing is handed back, so a failed command can never leave a
/// partial instruction sequence in the program.
#[derive(Debug, Default)]
pub struct Emitter {
    buf: String,
}

impl Emitter {
    pub fn new() -> Emitter {
        Emitter {
            buf: String::with_capacity(1024),
        }
    }

    /// Generates the assembly for one command, scoped to the named source
    /// unit (statics and user labels embed the unit name).
    pub fn command(
        &mut self,
        ctx: &mut Context,
        unit: &str,
        command: &Command,
    ) -> Result<&str, EmitError> {
        self.buf.clear();
        hack::command(&mut self.buf, ctx, unit, command)?;
        self.finish()
    }

    /// Generates the run prologue: stack pointer initialization followed by
    /// a call to the program entry function. Shares the context's call
    /// counter with ordinary `call` commands.
    pub fn bootstrap(&mut self, ctx: &mut Context) -> Result<&str, EmitError> {
        self.buf.clear();
        hack::bootstrap(&mut self.buf, ctx)?;
        self.finish()
    }

    fn finish(&self) -> Result<&str, EmitError> {
        if self.buf.len() > MAX_COMMAND_OUTPUT {
            return Err(EmitError::Overflow {
                len: self.buf.len(),
            });
        }
        Ok(&self.buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{Op, Segment};
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    fn emit(command: &Command) -> String {
        let mut ctx = Context::new();
        let mut emitter = Emitter::new();
        emitter.command(&mut ctx, "Unit", command).unwrap().into()
    }

    #[test]
    fn push_constant() {
        let asm = emit(&Command::Push {
            segment: Segment::Constant,
            index: 7,
        });
        assert_eq!(
            asm,
            indoc! {"
                @7
                D=A
                @SP
                M=M+1
                A=M-1
                M=D
            "}
        );
    }

    #[test]
    fn push_local_indexes_through_the_base_register() {
        let asm = emit(&Command::Push {
            segment: Segment::Local,
            index: 2,
        });
        assert_eq!(
            asm,
            indoc! {"
                @LCL
                D=M
                @2
                A=D+A
                D=M
                @SP
                M=M+1
                A=M-1
                M=D
            "}
        );
    }

    #[test]
    fn pop_argument_stashes_the_destination_address() {
        let asm = emit(&Command::Pop {
            segment: Segment::Argument,
            index: 3,
        });
        assert_eq!(
            asm,
            indoc! {"
                @ARG
                D=M
                @3
                D=D+A
                @R13
                M=D
                @SP
                AM=M-1
                D=M
                @R13
                A=M
                M=D
            "}
        );
    }

    #[test]
    fn static_addressing_is_keyed_by_unit_and_index() {
        let push = emit(&Command::Push {
            segment: Segment::Static,
            index: 5,
        });
        assert!(push.contains("@Unit.5\n"));

        let pop = emit(&Command::Pop {
            segment: Segment::Static,
            index: 5,
        });
        assert_eq!(
            pop,
            indoc! {"
                @SP
                AM=M-1
                D=M
                @Unit.5
                M=D
            "}
        );
    }

    #[test]
    fn pointer_and_temp_resolve_to_fixed_addresses() {
        let cases = [
            (Segment::Pointer, 0, "@3\n"),
            (Segment::Pointer, 1, "@4\n"),
            (Segment::Temp, 0, "@5\n"),
            (Segment::Temp, 7, "@12\n"),
        ];
        for (segment, index, address) in cases {
            let asm = emit(&Command::Push { segment, index });
            assert!(asm.starts_with(address), "{segment} {index}: {asm}");
        }
    }

    #[test]
    fn add_combines_in_place() {
        let asm = emit(&Command::Arithmetic(Op::Add));
        assert_eq!(
            asm,
            indoc! {"
                @SP
                AM=M-1
                D=M
                A=A-1
                M=D+M
            "}
        );
    }

    #[test]
    fn sub_takes_the_first_pop_as_right_operand() {
        let asm = emit(&Command::Arithmetic(Op::Sub));
        assert!(asm.ends_with("M=M-D\n"));
    }

    #[test]
    fn unary_ops_rewrite_the_stack_top() {
        assert!(emit(&Command::Arithmetic(Op::Neg)).ends_with("M=-M\n"));
        assert!(emit(&Command::Arithmetic(Op::Not)).ends_with("M=!M\n"));
    }

    #[test]
    fn eq_allocates_a_fresh_label_pair_per_site() {
        let mut ctx = Context::new();
        let mut emitter = Emitter::new();

        let first: String = emitter
            .command(&mut ctx, "Unit", &Command::Arithmetic(Op::Eq))
            .unwrap()
            .into();
        assert_eq!(
            first,
            indoc! {"
                @SP
                AM=M-1
                D=M
                A=A-1
                D=M-D
                @true0
                D;JEQ
                D=0
                @end0
                0;JMP
                (true0)
                D=-1
                (end0)
                @SP
                A=M-1
                M=D
            "}
        );

        // The same operator again, even in another unit, must not reuse the
        // pair.
        let second = emitter
            .command(&mut ctx, "Other", &Command::Arithmetic(Op::Eq))
            .unwrap();
        assert!(second.contains("(true1)"));
        assert!(second.contains("(end1)"));
        assert!(!second.contains("true0"));
    }

    #[test]
    fn gt_and_lt_branch_on_the_difference_sign() {
        assert!(emit(&Command::Arithmetic(Op::Gt)).contains("D;JGT"));
        assert!(emit(&Command::Arithmetic(Op::Lt)).contains("D;JLT"));
    }

    #[test]
    fn user_labels_are_scoped_by_source_unit() {
        let mut ctx = Context::new();
        let mut emitter = Emitter::new();

        let a: String = emitter
            .command(&mut ctx, "A", &Command::Label("loop".into()))
            .unwrap()
            .into();
        let b: String = emitter
            .command(&mut ctx, "B", &Command::Label("loop".into()))
            .unwrap()
            .into();
        assert_eq!(a, "(A$loop)\n");
        assert_eq!(b, "(B$loop)\n");
    }

    #[test]
    fn goto_and_if_goto_target_the_scoped_marker() {
        let goto = emit(&Command::Goto("end".into()));
        assert_eq!(goto, "@Unit$end\n0;JMP\n");

        let if_goto = emit(&Command::IfGoto("end".into()));
        assert_eq!(
            if_goto,
            indoc! {"
                @SP
                AM=M-1
                D=M
                @Unit$end
                D;JNE
            "}
        );
    }

    #[test]
    fn function_pushes_one_zero_per_local() {
        let asm = emit(&Command::Function {
            name: "Main.run".into(),
            locals: 2,
        });
        assert_eq!(
            asm,
            indoc! {"
                (Main.run)
                @SP
                M=M+1
                A=M-1
                M=0
                @SP
                M=M+1
                A=M-1
                M=0
            "}
        );
    }

    #[test]
    fn call_saves_the_frame_and_places_the_return_marker() {
        let asm = emit(&Command::Call {
            name: "Main.run".into(),
            args: 2,
        });
        assert!(asm.starts_with("@Main.run_return0\nD=A\n"));
        for reg in ["@LCL", "@ARG", "@THIS", "@THAT"] {
            assert!(asm.contains(&format!("{reg}\nD=M\n")), "missing save of {reg}");
        }
        // ARG = SP - (2 args + 5 saved words)
        assert!(asm.contains("@SP\nD=M\n@7\nD=D-A\n@ARG\nM=D\n"));
        assert!(asm.ends_with("@Main.run\n0;JMP\n(Main.run_return0)\n"));
    }

    #[test]
    fn call_sites_use_their_own_counter_space() {
        let mut ctx = Context::new();
        let mut emitter = Emitter::new();

        // A comparison in between must not disturb the call numbering.
        let calls = [
            Command::Call {
                name: "F.g".into(),
                args: 0,
            },
            Command::Arithmetic(Op::Lt),
            Command::Call {
                name: "F.g".into(),
                args: 0,
            },
        ];
        let mut out = String::new();
        for command in &calls {
            out.push_str(emitter.command(&mut ctx, "Unit", command).unwrap());
        }
        assert!(out.contains("(F.g_return0)"));
        assert!(out.contains("(F.g_return1)"));
        assert!(out.contains("(true0)"));
    }

    #[test]
    fn return_restores_the_frame_through_scratch() {
        let asm = emit(&Command::Return);
        // Frame base and return address are stashed before anything is
        // overwritten.
        assert!(asm.starts_with("@LCL\nD=M\n@R13\nM=D\n@5\nA=D-A\nD=M\n@R14\nM=D\n"));
        // Restore order walks the frame downwards.
        let that = asm.find("@THAT\nM=D").unwrap();
        let this = asm.find("@THIS\nM=D").unwrap();
        let arg = asm.rfind("@ARG\nM=D").unwrap();
        let lcl = asm.find("@LCL\nM=D").unwrap();
        assert!(that < this && this < arg && arg < lcl);
        assert!(asm.ends_with("@R14\nA=M\n0;JMP\n"));
    }

    #[test]
    fn bootstrap_initializes_sp_then_calls_the_entry_function() {
        let mut ctx = Context::new();
        let mut emitter = Emitter::new();
        let asm = emitter.bootstrap(&mut ctx).unwrap();
        assert!(asm.starts_with("@256\nD=A\n@SP\nM=D\n"));
        assert!(asm.contains("@Sys.init\n0;JMP\n(Sys.init_return0)\n"));

        // The bootstrap call consumed return label 0.
        let next = emitter
            .command(
                &mut ctx,
                "Unit",
                &Command::Call {
                    name: "F.g".into(),
                    args: 0,
                },
            )
            .unwrap();
        assert!(next.contains("(F.g_return1)"));
    }

    #[test]
    fn pop_constant_is_a_typed_error() {
        let mut ctx = Context::new();
        let mut emitter = Emitter::new();
        let err = emitter
            .command(
                &mut ctx,
                "Unit",
                &Command::Pop {
                    segment: Segment::Constant,
                    index: 0,
                },
            )
            .unwrap_err();
        assert_eq!(err, EmitError::PopConstant);
    }

    #[test]
    fn absurd_local_counts_overflow_rather_than_truncate() {
        let mut ctx = Context::new();
        let mut emitter = Emitter::new();
        let err = emitter
            .command(
                &mut ctx,
                "Unit",
                &Command::Function {
                    name: "Main.big".into(),
                    locals: u16::MAX,
                },
            )
            .unwrap_err();
        assert!(matches!(err, EmitError::Overflow { len } if len > MAX_COMMAND_OUTPUT));
    }

    #[test]
    fn scratch_buffer_does_not_leak_between_commands() {
        let mut ctx = Context::new();
        let mut emitter = Emitter::new();
        emitter
            .command(&mut ctx, "Unit", &Command::Return)
            .unwrap();
        let neg: String = emitter
            .command(&mut ctx, "Unit", &Command::Arithmetic(Op::Neg))
            .unwrap()
            .into();
        assert_eq!(neg, "@SP\nA=M-1\nM=-M\n");
    }
}
