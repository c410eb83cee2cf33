pub mod ast;
pub mod environment;
pub mod interpreter;
pub mod lexer;
pub mod parser;
pub mod token;
pub mod value;

use std::error::Error;
use std::fmt::{self, Display};
use std::io::Write;

use interpreter::{Interpreter, RuntimeError};
use lexer::{LexError, Lexer};
use parser::{ParseError, Parser};

/// Everything that can go wrong running a program, unified behind one type
/// at the library boundary so the CLI only has to handle one error kind.
#[derive(Debug)]
pub enum EmberError {
    Lex(LexError),
    Parse(Vec<ParseError>),
    Runtime(RuntimeError),
}

impl Display for EmberError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmberError::Lex(e) => write!(f, "{e}"),
            EmberError::Parse(errors) => {
                for (i, e) in errors.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    write!(f, "{e}")?;
                }
                Ok(())
            }
            EmberError::Runtime(e) => write!(f, "{e}"),
        }
    }
}

impl Error for EmberError {}

impl From<LexError> for EmberError {
    fn from(e: LexError) -> Self {
        EmberError::Lex(e)
    }
}

impl From<RuntimeError> for EmberError {
    fn from(e: RuntimeError) -> Self {
        EmberError::Runtime(e)
    }
}

/// Lexes, parses, and evaluates `source` against `interpreter`'s current
/// environment, writing `print` output to the sink the interpreter was
/// constructed with. A single `Interpreter` reused across calls is how the
/// REPL keeps one persistent global environment across input lines.
pub fn run(source: &str, interpreter: &mut Interpreter) -> Result<(), EmberError> {
    let tokens = Lexer::new(source).lex()?;
    let (statements, parse_errors) = Parser::new(tokens).parse();

    if !parse_errors.is_empty() {
        return Err(EmberError::Parse(parse_errors));
    }

    interpreter.interpret(&statements)?;
    Ok(())
}

/// Convenience wrapper for tests: runs `source` against a fresh interpreter
/// and returns everything written to its output sink.
pub fn run_capturing(source: &str) -> Result<String, EmberError> {
    let mut buf: Vec<u8> = Vec::new();
    {
        let mut interpreter = Interpreter::new(&mut buf as &mut dyn Write);
        run(source, &mut interpreter)?;
    }
    Ok(String::from_utf8_lossy(&buf).into_owned())
}
