use std::{
    fmt,
    io::{self, BufRead, Write},
};

use crate::{
    codegen::{Context, EmitError, Emitter},
    parser,
    source,
};

/// A line-scoped problem the driver recovered from: the offending line's
/// output was omitted and translation continued.
#[derive(Debug, PartialEq, Eq)]
pub struct Diagnostic {
    pub unit: Box<str>,
    pub line: u32,
    pub kind: DiagnosticKind,
}

#[derive(Debug, PartialEq, Eq)]
pub enum DiagnosticKind {
    Parse(parser::Error),
    Emit(EmitError),
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "error in {} on source line #{}: ", self.unit, self.line)?;
        match &self.kind {
            DiagnosticKind::Parse(error) => write!(f, "{error}"),
            DiagnosticKind::Emit(error) => write!(f, "{error}"),
        }
    }
}

/// A failure the driver cannot recover from; currently only output-sink and
/// source-read errors qualify.
#[derive(Debug)]
pub enum Error {
    Io(io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(error) => write!(f, "i/o failure: {error}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(error) => Some(error),
        }
    }
}

impl From<io::Error> for Error {
    fn from(error: io::Error) -> Error {
        Error::Io(error)
    }
}

/// Sequences a translation run: feeds cleaned lines through the parser and
/// the emitter, owns the cross-command [`Context`], and concatenates the
/// per-unit output into one artifact on the sink `W`.
///
/// Line-scoped failures accumulate as [`Diagnostic`]s; the caller drains
/// them once the run is over.
pub struct Driver<W> {
    out: W,
    ctx: Context,
    emitter: Emitter,
    diagnostics: Vec<Diagnostic>,
}

impl<W: Write> Driver<W> {
    pub fn new(out: W) -> Driver<W> {
        Driver {
            out,
            ctx: Context::new(),
            emitter: Emitter::new(),
            diagnostics: Vec::new(),
        }
    }

    /// Emits the run prologue. Call at most once, before any unit.
    pub fn bootstrap(&mut self) -> Result<(), Error> {
        writeln!(self.out, "//bootstrap")?;
        match self.emitter.bootstrap(&mut self.ctx) {
            Ok(asm) => self.out.write_all(asm.as_bytes())?,
            Err(error) => self.diagnostics.push(Diagnostic {
                unit: "bootstrap".into(),
                line: 0,
                kind: DiagnosticKind::Emit(error),
            }),
        }
        Ok(())
    }

    /// Translates one source unit, reading raw lines from `input`.
    ///
    /// `unit` is the unit's scoping name (file stem); it prefixes statics
    /// and user labels, and appears in a provenance marker ahead of the
    /// unit's code. Each translated command is preceded by its original
    /// source line as a comment.
    pub fn translate_unit<R: BufRead>(&mut self, unit: &str, input: R) -> Result<(), Error> {
        writeln!(self.out, "//input file: {unit}")?;

        for (number, line) in input.lines().enumerate() {
            let line = line?;
            let number = u32::try_from(number).unwrap_or(u32::MAX).saturating_add(1);
            let Some(cleaned) = source::clean(&line) else {
                continue;
            };

            let command = match parser::parse(cleaned) {
                Ok(command) => command,
                Err(error) => {
                    self.report(unit, number, DiagnosticKind::Parse(error));
                    continue;
                }
            };

            writeln!(self.out, "//{cleaned}")?;
            match self.emitter.command(&mut self.ctx, unit, &command) {
                Ok(asm) => self.out.write_all(asm.as_bytes())?,
                Err(error) => self.report(unit, number, DiagnosticKind::Emit(error)),
            }
        }
        Ok(())
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Tears the driver down, handing back the sink and the accumulated
    /// diagnostics.
    pub fn finish(self) -> (W, Vec<Diagnostic>) {
        (self.out, self.diagnostics)
    }

    fn report(&mut self, unit: &str, line: u32, kind: DiagnosticKind) {
        self.diagnostics.push(Diagnostic {
            unit: unit.into(),
            line,
            kind,
        });
    }
}
