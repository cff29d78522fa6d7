use crate::{
    error::{ErrorKind, PsError},
    lexer::{Position, Spanned, Token, Tokenizer},
    object::{Object, StringRef, Value},
    stack::ensure_sufficient_stack,
};

type ParseResult<O> = Result<O, PsError>;

/// A parsed top-level sequence of objects, ready to evaluate.
#[derive(Debug, Clone, Default)]
pub struct Program(Vec<Object>);

impl Program {
    pub fn objects(&self) -> &[Object] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn snapshot(&self) -> Vec<Value> {
        self.0.iter().map(Object::snapshot).collect()
    }
}

impl IntoIterator for Program {
    type Item = Object;
    type IntoIter = std::vec::IntoIter<Object>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Delimiter {
    Procedure,
    Array,
    Input,
}

impl Delimiter {
    fn opener(&self) -> &'static str {
        match self {
            Self::Procedure => "{",
            Self::Array => "[",
            Self::Input => "",
        }
    }
}

fn syntax_error(command: impl Into<String>, position: Position) -> PsError {
    PsError::new(ErrorKind::SyntaxError).with_command(command).at(position)
}

pub(crate) fn parse_number(text: &str) -> Option<Object> {
    if let Ok(integer) = text.parse::<i64>() { return Some(Object::Integer(integer)); }

    // Integers too large for i64 read as reals
    match text.parse::<f64>() {
        Ok(real) if real.is_finite() => Some(Object::Real(real)),
        _ => None,
    }
}

fn parse_atom(token: Token<'_>) -> Object {
    // Names are never resolved here; that happens when they are executed
    match token {
        Token::Number(text) => parse_number(text).unwrap_or_else(|| Object::executable_name(text)),
        Token::Name(text) => Object::executable_name(text),
        Token::LiteralName(text) => Object::literal_name(text),
        Token::String(bytes) => Object::String(StringRef::new(bytes)),
        Token::DictOpen => Object::executable_name("<<"),
        Token::DictClose => Object::executable_name(">>"),
        Token::ProcOpen | Token::ProcClose | Token::ArrayOpen | Token::ArrayClose | Token::End
            => unreachable!("structural tokens are handled by the reader"),
    }
}

/// Builds nested procedures and arrays out of a token stream.
pub struct Reader<'src> {
    tokens: Tokenizer<'src>,
    last_position: Position,
}

impl<'src> Reader<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            tokens: Tokenizer::new(source),
            last_position: Position { line: 1, column: 1 },
        }
    }

    pub fn read_program(mut self) -> ParseResult<Program> {
        let start = self.last_position;
        self.read_sequence(Delimiter::Input, start).map(Program)
    }

    fn next_token(&mut self) -> ParseResult<Spanned<'src>> {
        match self.tokens.next() {
            Some(Ok(spanned)) => {
                self.last_position = spanned.position;
                Ok(spanned)
            }
            Some(Err(error)) => Err(error),
            None => Ok(Spanned { token: Token::End, position: self.last_position }),
        }
    }

    fn read_sequence(&mut self, delimiter: Delimiter, opened_at: Position) -> ParseResult<Vec<Object>> {
        // Reads objects until the token closing `delimiter`. Openers recurse,
        // so nesting depth is only limited by the host stack guard.
        let mut objects = vec![];

        loop {
            let Spanned { token, position } = self.next_token()?;
            match (token, delimiter) {
                (Token::ProcClose, Delimiter::Procedure)
                | (Token::ArrayClose, Delimiter::Array)
                | (Token::End, Delimiter::Input) => return Ok(objects),
                (Token::End, _) => return Err(syntax_error(delimiter.opener(), opened_at)),
                (token @ (Token::ProcClose | Token::ArrayClose), _) => return Err(syntax_error(token.to_string(), position)),
                (Token::ProcOpen, _) => {
                    let body = ensure_sufficient_stack(|| self.read_sequence(Delimiter::Procedure, position))?;
                    objects.push(Object::procedure(body));
                }
                (Token::ArrayOpen, _) => {
                    let items = ensure_sufficient_stack(|| self.read_sequence(Delimiter::Array, position))?;
                    objects.push(Object::array(items));
                }
                (token, _) => objects.push(parse_atom(token)),
            }
        }
    }
}

pub fn parse(source: &str) -> ParseResult<Program> {
    Reader::new(source).read_program()
}
