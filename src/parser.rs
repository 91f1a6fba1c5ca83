use std::fmt;

use crate::command::{Command, Keyword, Segment, COMMANDS, SEGMENTS};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    EmptyLine,
    TooManyTokens,
    UnknownCommand(Box<str>),
    UnknownSegment(Box<str>),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::EmptyLine => write!(f, "no tokens found"),
            Error::TooManyTokens => write!(f, "more than three tokens found"),
            Error::UnknownCommand(token) => write!(f, "unknown command `{token}`"),
            Error::UnknownSegment(token) => write!(f, "unknown memory segment `{token}`"),
        }
    }
}

impl std::error::Error for Error {}

/// Parses one already-cleaned source line into a [`Command`].
///
/// The input is expected to have had comments and surrounding whitespace
/// stripped already (see [`crate::source::clean`]). The function is pure: it
/// neither mutates its input nor keeps state between calls.
///
/// Operand arity is deliberately loose. A missing index or count defaults to
/// zero, a non-numeric one parses as zero, and a stray trailing identifier
/// after an arithmetic command or `return` is ignored; only the three-token
/// cap and the two keyword tables are enforced.
pub fn parse(line: &str) -> Result<Command, Error> {
    let mut tokens = line.split_whitespace();
    let Some(first) = tokens.next() else {
        return Err(Error::EmptyLine);
    };
    let second = tokens.next();
    let third = tokens.next();
    if tokens.next().is_some() {
        return Err(Error::TooManyTokens);
    }

    let keyword = COMMANDS
        .get(first)
        .copied()
        .ok_or_else(|| Error::UnknownCommand(first.into()))?;

    let name = || second.map(Box::from).unwrap_or_default();
    let count = third.map_or(0, |token| token.parse().unwrap_or(0));

    match keyword {
        Keyword::Arithmetic(op) => Ok(Command::Arithmetic(op)),
        Keyword::Push | Keyword::Pop => {
            let segment = match second {
                Some(token) => SEGMENTS
                    .get(token)
                    .copied()
                    .ok_or_else(|| Error::UnknownSegment(token.into()))?,
                // A segmentless push/pop is still accepted; the zero segment
                // is the first table entry.
                None => Segment::Local,
            };
            if keyword == Keyword::Push {
                Ok(Command::Push {
                    segment,
                    index: count,
                })
            } else {
                Ok(Command::Pop {
                    segment,
                    index: count,
                })
            }
        }
        Keyword::Label => Ok(Command::Label(name())),
        Keyword::Goto => Ok(Command::Goto(name())),
        Keyword::IfGoto => Ok(Command::IfGoto(name())),
        Keyword::Function => Ok(Command::Function {
            name: name(),
            locals: count,
        }),
        Keyword::Call => Ok(Command::Call {
            name: name(),
            args: count,
        }),
        Keyword::Return => Ok(Command::Return),
    }
}
