/// The parser takes one cleaned source line, mapping it into a command.
pub mod parser;

/// The code generator takes a command (plus its scoping context), mapping it
/// into a sequence of Hack assembly instructions.
pub mod codegen;

/// The translation driver sequences commands from one or more source units,
/// owns the cross-command label state, and concatenates the output.
pub mod driver;

pub mod command;
pub mod source;
