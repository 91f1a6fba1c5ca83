use std::fmt;

/// One VM command, as produced by the parser for a single source line.
///
/// Identifier-carrying variants own their name; a command is constructed per
/// line and handed straight to the code generator, so nothing here borrows
/// from the source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Arithmetic(Op),
    Push { segment: Segment, index: u16 },
    Pop { segment: Segment, index: u16 },
    Label(Box<str>),
    Goto(Box<str>),
    IfGoto(Box<str>),
    Function { name: Box<str>, locals: u16 },
    Call { name: Box<str>, args: u16 },
    Return,
}

/// The nine stack arithmetic/logic operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Add,
    Sub,
    Neg,
    Eq,
    Gt,
    Lt,
    And,
    Or,
    Not,
}

/// The eight memory segments a `push`/`pop` can address.
///
/// `Constant` is virtual: its "value at index i" is the immediate i, and it
/// can never be a pop destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment {
    Local,
    Argument,
    This,
    That,
    Constant,
    Static,
    Pointer,
    Temp,
}

impl Segment {
    /// The assembly symbol holding the segment's base address, for the four
    /// indirectly addressed segments.
    pub fn base_register(self) -> Option<&'static str> {
        match self {
            Segment::Local => Some("LCL"),
            Segment::Argument => Some("ARG"),
            Segment::This => Some("THIS"),
            Segment::That => Some("THAT"),
            _ => None,
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Segment::Local => "local",
            Segment::Argument => "argument",
            Segment::This => "this",
            Segment::That => "that",
            Segment::Constant => "constant",
            Segment::Static => "static",
            Segment::Pointer => "pointer",
            Segment::Temp => "temp",
        };
        f.write_str(name)
    }
}

/// The command-position keyword, before its operand tokens are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    Arithmetic(Op),
    Push,
    Pop,
    Label,
    Goto,
    IfGoto,
    Function,
    Call,
    Return,
}

pub static COMMANDS: phf::Map<&'static str, Keyword> = phf::phf_map! {
    "add" => Keyword::Arithmetic(Op::Add),
    "sub" => Keyword::Arithmetic(Op::Sub),
    "neg" => Keyword::Arithmetic(Op::Neg),
    "eq" => Keyword::Arithmetic(Op::Eq),
    "gt" => Keyword::Arithmetic(Op::Gt),
    "lt" => Keyword::Arithmetic(Op::Lt),
    "and" => Keyword::Arithmetic(Op::And),
    "or" => Keyword::Arithmetic(Op::Or),
    "not" => Keyword::Arithmetic(Op::Not),
    "push" => Keyword::Push,
    "pop" => Keyword::Pop,
    "label" => Keyword::Label,
    "goto" => Keyword::Goto,
    "if-goto" => Keyword::IfGoto,
    "function" => Keyword::Function,
    "call" => Keyword::Call,
    "return" => Keyword::Return,
};

pub static SEGMENTS: phf::Map<&'static str, Segment> = phf::phf_map! {
    "local" => Segment::Local,
    "argument" => Segment::Argument,
    "this" => Segment::This,
    "that" => Segment::That,
    "constant" => Segment::Constant,
    "static" => Segment::Static,
    "pointer" => Segment::Pointer,
    "temp" => Segment::Temp,
};
