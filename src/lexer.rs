use core::fmt;

use logos::{Lexer, Logos};

use crate::error::{ErrorKind, PsError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LexicalError {
    #[default]
    UnexpectedCharacter,
    UnterminatedString,
    InvalidHexString,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

#[derive(Debug, Logos)]
#[logos(error = LexicalError)]
#[logos(skip r"[ \t\r\n\f\x00]+")]
#[logos(skip r"%[^\r\n]*")]
enum RawToken<'src> {
    // Anything number-shaped. Longest match hands `3abc` or `1.2.3` to Name.
    #[regex(r"[+-]?([0-9]+\.?[0-9]*|\.[0-9]+)([eE][+-]?[0-9]+)?", |lex| lex.slice(), priority = 3)]
    Number(&'src str),

    #[regex(r"[^ \t\r\n\f\x00()<>\[\]{}/%]+", |lex| lex.slice())]
    Name(&'src str),

    #[regex(r"/[^ \t\r\n\f\x00()<>\[\]{}/%]*", |lex| &lex.slice()[1..])]
    LiteralName(&'src str),

    #[token("(", string_literal)]
    String(Vec<u8>),

    #[regex(r"<[^<>]*>", hex_string)]
    HexString(Vec<u8>),

    #[token("{")]
    ProcOpen,

    #[token("}")]
    ProcClose,

    #[token("[")]
    ArrayOpen,

    #[token("]")]
    ArrayClose,

    #[token("<<")]
    DictOpen,

    #[token(">>")]
    DictClose,
}

fn string_literal<'src>(lex: &mut Lexer<'src, RawToken<'src>>) -> Result<Vec<u8>, LexicalError> {
    // Parentheses nest inside a string literal; only the balancing `)` ends it.
    let remainder = lex.remainder().as_bytes();
    let mut bytes = Vec::new();
    let mut depth = 1usize;
    let mut index = 0;

    while index < remainder.len() {
        let byte = remainder[index];
        index += 1;
        match byte {
            b'(' => {
                depth += 1;
                bytes.push(byte);
            }
            b')' => {
                depth -= 1;
                if depth == 0 {
                    lex.bump(index);
                    return Ok(bytes);
                }
                bytes.push(byte);
            }
            b'\\' => index += unescape(&remainder[index..], &mut bytes),
            _ => bytes.push(byte),
        }
    }

    lex.bump(remainder.len());
    Err(LexicalError::UnterminatedString)
}

// Decodes one escape sequence (the part after the backslash), returning
// how many bytes it consumed.
fn unescape(rest: &[u8], bytes: &mut Vec<u8>) -> usize {
    let Some(&first) = rest.first() else { return 0 };
    match first {
        b'n' => bytes.push(b'\n'),
        b'r' => bytes.push(b'\r'),
        b't' => bytes.push(b'\t'),
        b'b' => bytes.push(0x08),
        b'f' => bytes.push(0x0c),
        b'\\' | b'(' | b')' => bytes.push(first),
        // Line continuation
        b'\r' => return if rest.get(1) == Some(&b'\n') { 2 } else { 1 },
        b'\n' => {}
        b'0'..=b'7' => {
            let digits = rest.iter()
                .take(3)
                .take_while(|byte| (b'0'..=b'7').contains(*byte))
                .count();
            let value = rest[..digits].iter()
                .fold(0u32, |acc, digit| acc * 8 + u32::from(digit - b'0'));
            bytes.push((value & 0xff) as u8);
            return digits;
        }
        other => bytes.push(other),
    }
    1
}

fn hex_string<'src>(lex: &mut Lexer<'src, RawToken<'src>>) -> Result<Vec<u8>, LexicalError> {
    let slice = lex.slice();
    let digits = slice[1..slice.len() - 1]
        .chars()
        .filter(|ch| !ch.is_ascii_whitespace())
        .map(|ch| ch.to_digit(16).ok_or(LexicalError::InvalidHexString))
        .collect::<Result<Vec<u32>, _>>()?;

    // An odd trailing digit behaves as if followed by 0
    Ok(digits.chunks(2)
        .map(|pair| (pair[0] * 16 + pair.get(1).copied().unwrap_or(0)) as u8)
        .collect())
}

/// A lexeme produced by the [`Tokenizer`].
#[derive(Debug, Clone, PartialEq)]
pub enum Token<'src> {
    Number(&'src str),
    Name(&'src str),
    LiteralName(&'src str),
    String(Vec<u8>),
    ProcOpen,
    ProcClose,
    ArrayOpen,
    ArrayClose,
    DictOpen,
    DictClose,
    End,
}

impl<'src> From<RawToken<'src>> for Token<'src> {
    fn from(raw: RawToken<'src>) -> Self {
        match raw {
            RawToken::Number(text) => Self::Number(text),
            RawToken::Name(text) => Self::Name(text),
            RawToken::LiteralName(text) => Self::LiteralName(text),
            RawToken::String(bytes) | RawToken::HexString(bytes) => Self::String(bytes),
            RawToken::ProcOpen => Self::ProcOpen,
            RawToken::ProcClose => Self::ProcClose,
            RawToken::ArrayOpen => Self::ArrayOpen,
            RawToken::ArrayClose => Self::ArrayClose,
            RawToken::DictOpen => Self::DictOpen,
            RawToken::DictClose => Self::DictClose,
        }
    }
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(text) | Self::Name(text) => f.write_str(text),
            Self::LiteralName(text) => write!(f, "/{}", text),
            Self::String(bytes) => write!(f, "({})", String::from_utf8_lossy(bytes)),
            Self::ProcOpen => f.write_str("{"),
            Self::ProcClose => f.write_str("}"),
            Self::ArrayOpen => f.write_str("["),
            Self::ArrayClose => f.write_str("]"),
            Self::DictOpen => f.write_str("<<"),
            Self::DictClose => f.write_str(">>"),
            Self::End => f.write_str("end of input"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Spanned<'src> {
    pub token: Token<'src>,
    pub position: Position,
}

// Turns byte offsets into line/column pairs. Offsets only move forward.
struct Cursor<'src> {
    source: &'src str,
    offset: usize,
    position: Position,
}

impl<'src> Cursor<'src> {
    fn new(source: &'src str) -> Self {
        Self { source, offset: 0, position: Position { line: 1, column: 1 } }
    }

    fn locate(&mut self, offset: usize) -> Position {
        for ch in self.source[self.offset..offset].chars() {
            if ch == '\n' {
                self.position.line += 1;
                self.position.column = 1;
            } else {
                self.position.column += 1;
            }
        }
        self.offset = offset;
        self.position
    }
}

/// Lazy token stream over PostScript source.
///
/// Yields every lexeme followed by a single [`Token::End`]. A lexical error
/// is yielded once and ends the stream.
pub struct Tokenizer<'src> {
    lexer: Lexer<'src, RawToken<'src>>,
    cursor: Cursor<'src>,
    finished: bool,
}

impl<'src> Tokenizer<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            lexer: RawToken::lexer(source),
            cursor: Cursor::new(source),
            finished: false,
        }
    }
}

impl<'src> Iterator for Tokenizer<'src> {
    type Item = Result<Spanned<'src>, PsError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished { return None; }

        match self.lexer.next() {
            Some(Ok(raw)) => {
                let position = self.cursor.locate(self.lexer.span().start);
                Some(Ok(Spanned { token: raw.into(), position }))
            }
            Some(Err(error)) => {
                self.finished = true;
                let position = self.cursor.locate(self.lexer.span().start);
                let command = match error {
                    LexicalError::UnterminatedString => "unterminated string".to_owned(),
                    LexicalError::InvalidHexString => "invalid hex string".to_owned(),
                    LexicalError::UnexpectedCharacter => self.lexer.slice().to_owned(),
                };
                Some(Err(PsError::new(ErrorKind::SyntaxError).with_command(command).at(position)))
            }
            None => {
                self.finished = true;
                let position = self.cursor.locate(self.cursor.source.len());
                Some(Ok(Spanned { token: Token::End, position }))
            }
        }
    }
}

pub fn tokenize(source: &str) -> Tokenizer<'_> {
    Tokenizer::new(source)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(source: &str) -> Result<Vec<Token<'_>>, PsError> {
        tokenize(source).map(|spanned| spanned.map(|s| s.token)).collect()
    }

    #[test]
    fn numbers_and_names() -> anyhow::Result<()> {
        assert_eq!(tokens("42 3.14 -10 +5 .5 1e3 add")?, vec![
            Token::Number("42"),
            Token::Number("3.14"),
            Token::Number("-10"),
            Token::Number("+5"),
            Token::Number(".5"),
            Token::Number("1e3"),
            Token::Name("add"),
            Token::End,
        ]);
        Ok(())
    }

    #[test]
    fn number_shaped_names() -> anyhow::Result<()> {
        assert_eq!(tokens("3abc 1.2.3 - +")?, vec![
            Token::Name("3abc"),
            Token::Name("1.2.3"),
            Token::Name("-"),
            Token::Name("+"),
            Token::End,
        ]);
        Ok(())
    }

    #[test]
    fn literal_names_stop_at_delimiters() -> anyhow::Result<()> {
        assert_eq!(tokens("/x/y{/z}")?, vec![
            Token::LiteralName("x"),
            Token::LiteralName("y"),
            Token::ProcOpen,
            Token::LiteralName("z"),
            Token::ProcClose,
            Token::End,
        ]);
        Ok(())
    }

    #[test]
    fn strings_nest_and_unescape() -> anyhow::Result<()> {
        assert_eq!(tokens(r"(hello world) (nested (parens)) (a\)b\n\101)")?, vec![
            Token::String(b"hello world".to_vec()),
            Token::String(b"nested (parens)".to_vec()),
            Token::String(b"a)b\nA".to_vec()),
            Token::End,
        ]);
        Ok(())
    }

    #[test]
    fn line_continuation_in_strings() -> anyhow::Result<()> {
        assert_eq!(tokens("(ab\\\ncd)")?, vec![Token::String(b"abcd".to_vec()), Token::End]);
        Ok(())
    }

    #[test]
    fn hex_strings_and_dict_delimiters() -> anyhow::Result<()> {
        assert_eq!(tokens("<48 69> <7> << >>")?, vec![
            Token::String(b"Hi".to_vec()),
            Token::String(vec![0x70]),
            Token::DictOpen,
            Token::DictClose,
            Token::End,
        ]);
        Ok(())
    }

    #[test]
    fn bad_hex_digit_is_a_syntax_error() {
        let error = tokens("1 <4z>").unwrap_err();
        assert_eq!(error.kind, ErrorKind::SyntaxError);
        assert_eq!(error.command.as_deref(), Some("invalid hex string"));
        assert_eq!(error.position, Some(Position { line: 1, column: 3 }));
    }

    #[test]
    fn comments_are_skipped() -> anyhow::Result<()> {
        assert_eq!(tokens("1 % this is a comment\n2")?, vec![
            Token::Number("1"),
            Token::Number("2"),
            Token::End,
        ]);
        Ok(())
    }

    #[test]
    fn unterminated_string_is_a_syntax_error() {
        let error = tokens("1 (unterminated").unwrap_err();
        assert_eq!(error.kind, ErrorKind::SyntaxError);
        assert_eq!(error.position, Some(Position { line: 1, column: 3 }));
    }

    #[test]
    fn stray_close_paren_is_a_syntax_error() {
        let error = tokens("1\n  )").unwrap_err();
        assert_eq!(error.kind, ErrorKind::SyntaxError);
        assert_eq!(error.position, Some(Position { line: 2, column: 3 }));
    }

    #[test]
    fn stream_ends_after_end_token() {
        let mut tokenizer = tokenize("");
        assert!(matches!(tokenizer.next(), Some(Ok(Spanned { token: Token::End, .. }))));
        assert!(tokenizer.next().is_none());
    }
}
