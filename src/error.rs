use core::fmt;

use thiserror::Error;

use crate::lexer::Position;

/// PostScript error names, used as the kind of every reportable failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    StackUnderflow,
    StackOverflow,
    TypeCheck,
    RangeCheck,
    Undefined,
    UndefinedResult,
    UnmatchedMark,
    SyntaxError,
    InvalidAccess,
    ExecStackOverflow,
    DictStackOverflow,
    InvalidExit,
    InvalidStop,
    IoError,
    LimitCheck,
}

impl ErrorKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::StackUnderflow => "stackunderflow",
            Self::StackOverflow => "stackoverflow",
            Self::TypeCheck => "typecheck",
            Self::RangeCheck => "rangecheck",
            Self::Undefined => "undefined",
            Self::UndefinedResult => "undefinedresult",
            Self::UnmatchedMark => "unmatchedmark",
            Self::SyntaxError => "syntaxerror",
            Self::InvalidAccess => "invalidaccess",
            Self::ExecStackOverflow => "execstackoverflow",
            Self::DictStackOverflow => "dictstackoverflow",
            Self::InvalidExit => "invalidexit",
            Self::InvalidStop => "invalidstop",
            Self::IoError => "ioerror",
            Self::LimitCheck => "limitcheck",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "stackunderflow" => Self::StackUnderflow,
            "stackoverflow" => Self::StackOverflow,
            "typecheck" => Self::TypeCheck,
            "rangecheck" => Self::RangeCheck,
            "undefined" => Self::Undefined,
            "undefinedresult" => Self::UndefinedResult,
            "unmatchedmark" => Self::UnmatchedMark,
            "syntaxerror" => Self::SyntaxError,
            "invalidaccess" => Self::InvalidAccess,
            "execstackoverflow" => Self::ExecStackOverflow,
            "dictstackoverflow" => Self::DictStackOverflow,
            "invalidexit" => Self::InvalidExit,
            "invalidstop" => Self::InvalidStop,
            "ioerror" => Self::IoError,
            "limitcheck" => Self::LimitCheck,
            _ => return None,
        })
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An error reported to the caller of [`crate::Interpreter::run`], or
/// caught by `stopped`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Error: /{kind}{}{}", CommandSuffix(.command.as_deref()), PositionSuffix(.position))]
pub struct PsError {
    pub kind: ErrorKind,
    /// The operator or name that was executing when the error was raised.
    pub command: Option<String>,
    /// Source position, only known for lexical and structural errors.
    pub position: Option<Position>,
}

struct CommandSuffix<'a>(Option<&'a str>);

impl fmt::Display for CommandSuffix<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(command) => write!(f, " in {}", command),
            None => Ok(()),
        }
    }
}

struct PositionSuffix<'a>(&'a Option<Position>);

impl fmt::Display for PositionSuffix<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(position) => write!(f, " at {}", position),
            None => Ok(()),
        }
    }
}

impl PsError {
    pub fn new(kind: ErrorKind) -> Self {
        Self { kind, command: None, position: None }
    }

    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        if self.command.is_none() {
            self.command = Some(command.into());
        }
        self
    }

    pub fn at(mut self, position: Position) -> Self {
        self.position = Some(position);
        self
    }
}

impl From<ErrorKind> for PsError {
    fn from(kind: ErrorKind) -> Self {
        Self::new(kind)
    }
}

/// Everything that can abort an `evaluate` call chain.
///
/// `Exit` is caught by the looping operators, `Stop` by `stopped`. Ordinary
/// errors travel as `Error` and are also caught by `stopped`.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Unwind {
    Exit,
    Stop,
    Error(PsError),
}

impl Unwind {
    pub(crate) fn with_command(self, command: &str) -> Self {
        match self {
            Self::Error(error) => Self::Error(error.with_command(command)),
            signal => signal,
        }
    }

    // What a signal means once it has escaped every handler
    pub(crate) fn into_error(self) -> PsError {
        match self {
            Self::Exit => PsError::new(ErrorKind::InvalidExit).with_command("exit"),
            Self::Stop => PsError::new(ErrorKind::InvalidStop).with_command("stop"),
            Self::Error(error) => error,
        }
    }
}

impl From<ErrorKind> for Unwind {
    fn from(kind: ErrorKind) -> Self {
        Self::Error(PsError::new(kind))
    }
}

impl From<PsError> for Unwind {
    fn from(error: PsError) -> Self {
        Self::Error(error)
    }
}

pub(crate) type ExecResult<T = ()> = Result<T, Unwind>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_uses_postscript_names() {
        let error = PsError::new(ErrorKind::TypeCheck).with_command("add");
        assert_eq!(error.to_string(), "Error: /typecheck in add");

        let error = PsError::new(ErrorKind::SyntaxError).at(Position { line: 2, column: 5 });
        assert_eq!(error.to_string(), "Error: /syntaxerror at 2:5");
    }

    #[test]
    fn first_command_wins() {
        let error = PsError::new(ErrorKind::RangeCheck).with_command("get").with_command("exec");
        assert_eq!(error.command.as_deref(), Some("get"));
    }

    #[test]
    fn escaped_signals_become_errors() {
        assert_eq!(Unwind::Exit.into_error().kind, ErrorKind::InvalidExit);
        assert_eq!(Unwind::Stop.into_error().kind, ErrorKind::InvalidStop);
        assert_eq!(ErrorKind::from_name("undefinedresult"), Some(ErrorKind::UndefinedResult));
    }
}
