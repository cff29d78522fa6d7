mod builtin;
mod config;
mod dictionary;
mod error;
mod interpreter;
mod lexer;
mod object;
mod output;
mod parser;
mod stack;

#[cfg(test)]
mod test_utils;

pub use config::InterpreterConfig;
pub use dictionary::DictionaryStack;
pub use error::{ErrorKind, PsError};
pub use interpreter::Interpreter;
pub use lexer::{tokenize, LexicalError, Position, Spanned, Token, Tokenizer};
pub use object::{ArrayRef, Dictionary, Name, Object, Operator, SharedSlice, StringRef, Value};
pub use output::SharedOutput;
pub use parser::{parse, Program, Reader};
