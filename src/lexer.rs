// ABOUTME: Tokenizes Lissp source into a flat token stream (§4.B)

use crate::error::{LexError, Position};
use nom::{
    bytes::complete::{tag, take_while, take_while1},
    character::complete::char,
    combinator::recognize,
    IResult, Parser,
};

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Open,
    Close,
    /// Content between the delimiting quotes, backslashes un-processed.
    RawString(String),
    /// Same, but prefixed with `#`; escape processing happens at read time.
    HashString(String),
    Quote,
    Template,
    Unquote,
    Splice,
    Discard,
    Inject,
    Gensym,
    Extra,
    /// `<name>#`, a reader-macro invocation by qualified or unqualified name.
    NamedMacro(String),
    /// A `:`-prefixed atom — never munged.
    Control(String),
    /// Any other atom, including a bracketed atom's literal bytes.
    Atom(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub position: Position,
}

struct LineIndex {
    line_starts: Vec<usize>,
}

impl LineIndex {
    fn new(src: &str) -> Self {
        let mut line_starts = vec![0];
        for (i, c) in src.char_indices() {
            if c == '\n' {
                line_starts.push(i + 1);
            }
        }
        LineIndex { line_starts }
    }

    fn position(&self, byte_offset: usize) -> Position {
        let line = match self.line_starts.binary_search(&byte_offset) {
            Ok(i) => i,
            Err(i) => i - 1,
        };
        let column = byte_offset - self.line_starts[line];
        Position::new(line + 1, column + 1)
    }
}

fn is_delimiter(c: char) -> bool {
    c.is_whitespace() || c == '(' || c == ')' || c == '"' || c == ';'
}

/// Same as `is_delimiter`, but also breaks atom scanning at a bare `#`, so a
/// trailing `name#` tag is recognized even when glued to the next token with
/// no separating whitespace (`mac#x`). `#` can still appear inside a name
/// when backslash-escaped.
fn is_atom_boundary(c: char) -> bool {
    is_delimiter(c) || c == '#'
}

fn ws(input: &str) -> IResult<&str, &str> {
    take_while1(char::is_whitespace)(input)
}

fn comment(input: &str) -> IResult<&str, &str> {
    recognize((char(';'), take_while(|c| c != '\n'))).parse(input)
}

/// An atom run: any non-boundary char, or a backslash-escaped one.
/// Terminates at whitespace, `(`, `)`, `"`, `;`, `#` unless escaped (§4.B).
fn atom_text(input: &str) -> IResult<&str, String> {
    let mut consumed = 0usize;
    let mut chars = input.char_indices().peekable();
    while let Some(&(i, c)) = chars.peek() {
        if c == '\\' {
            chars.next();
            match chars.next() {
                Some((j, escaped)) => consumed = j + escaped.len_utf8(),
                None => consumed = input.len(),
            }
            continue;
        }
        if is_atom_boundary(c) {
            break;
        }
        consumed = i + c.len_utf8();
        chars.next();
    }
    if consumed == 0 {
        return Err(nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::TakeWhile1)));
    }
    Ok((&input[consumed..], input[..consumed].to_string()))
}

/// A bracketed atom: `[...]` or `{...}`, nested brackets balanced, no
/// unescaped whitespace.
fn bracketed_atom(input: &str) -> IResult<&str, String> {
    let (open, close) = match input.chars().next() {
        Some('[') => ('[', ']'),
        Some('{') => ('{', '}'),
        _ => return Err(nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::Char))),
    };
    let mut depth = 0i32;
    let mut end = None;
    let mut chars = input.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        if c == '\\' {
            chars.next();
            continue;
        }
        if c == open {
            depth += 1;
        } else if c == close {
            depth -= 1;
            if depth == 0 {
                end = Some(i + c.len_utf8());
                break;
            }
        }
    }
    match end {
        Some(end) => Ok((&input[end..], input[..end].to_string())),
        None => Err(nom::Err::Failure(nom::error::Error::new(input, nom::error::ErrorKind::Eof))),
    }
}

fn raw_string(input: &str) -> IResult<&str, String> {
    let (input, _) = char('"')(input)?;
    let mut chars = input.char_indices();
    let mut end = None;
    while let Some((i, c)) = chars.next() {
        if c == '\\' {
            // Backslashes must be paired even in raw form.
            if chars.next().is_none() {
                return Err(nom::Err::Failure(nom::error::Error::new(input, nom::error::ErrorKind::Eof)));
            }
            continue;
        }
        if c == '"' {
            end = Some(i);
            break;
        }
    }
    match end {
        Some(end) => Ok((&input[end + 1..], input[..end].to_string())),
        None => Err(nom::Err::Failure(nom::error::Error::new(input, nom::error::ErrorKind::Eof))),
    }
}

fn one_token(input: &str) -> IResult<&str, (TokenKind, usize)> {
    let start_len = input.len();
    let consumed = |rest: &str| start_len - rest.len();

    if let Ok((rest, _)) = char::<_, nom::error::Error<&str>>('(')(input) {
        return Ok((rest, (TokenKind::Open, consumed(rest))));
    }
    if let Ok((rest, _)) = char::<_, nom::error::Error<&str>>(')')(input) {
        return Ok((rest, (TokenKind::Close, consumed(rest))));
    }
    if let Ok((rest, content)) = (|i| -> IResult<&str, String> {
        let (i, _) = char('#')(i)?;
        raw_string(i)
    })(input)
    {
        return Ok((rest, (TokenKind::HashString(content), consumed(rest))));
    }
    if let Ok((rest, content)) = raw_string(input) {
        return Ok((rest, (TokenKind::RawString(content), consumed(rest))));
    }
    if let Ok((rest, _)) = tag::<_, _, nom::error::Error<&str>>(",@")(input) {
        return Ok((rest, (TokenKind::Splice, consumed(rest))));
    }
    if let Ok((rest, _)) = char::<_, nom::error::Error<&str>>(',')(input) {
        return Ok((rest, (TokenKind::Unquote, consumed(rest))));
    }
    if let Ok((rest, _)) = char::<_, nom::error::Error<&str>>('\'')(input) {
        return Ok((rest, (TokenKind::Quote, consumed(rest))));
    }
    if let Ok((rest, _)) = char::<_, nom::error::Error<&str>>('`')(input) {
        return Ok((rest, (TokenKind::Template, consumed(rest))));
    }
    if let Ok((rest, _)) = tag::<_, _, nom::error::Error<&str>>("_#")(input) {
        return Ok((rest, (TokenKind::Discard, consumed(rest))));
    }
    if let Ok((rest, _)) = tag::<_, _, nom::error::Error<&str>>(".#")(input) {
        return Ok((rest, (TokenKind::Inject, consumed(rest))));
    }
    if let Ok((rest, _)) = tag::<_, _, nom::error::Error<&str>>("$#")(input) {
        return Ok((rest, (TokenKind::Gensym, consumed(rest))));
    }
    if let Ok((rest, _)) = char::<_, nom::error::Error<&str>>('!')(input) {
        return Ok((rest, (TokenKind::Extra, consumed(rest))));
    }
    if matches!(input.chars().next(), Some('[') | Some('{')) {
        if let Ok((rest, text)) = bracketed_atom(input) {
            return Ok((rest, (TokenKind::Atom(text), consumed(rest))));
        }
    }
    if input.starts_with(':') {
        let (rest, text) = atom_text(input)?;
        return Ok((rest, (TokenKind::Control(text), consumed(rest))));
    }
    // Otherwise a plain atom; a bare `#` right after it (even glued to the
    // next token, no whitespace between) makes it a named reader macro.
    let (rest, text) = atom_text(input)?;
    if !text.is_empty() {
        if let Ok((rest, _)) = char::<_, nom::error::Error<&str>>('#')(rest) {
            return Ok((rest, (TokenKind::NamedMacro(text), consumed(rest))));
        }
    }
    Ok((rest, (TokenKind::Atom(text), consumed(rest))))
}

/// Tokenizes a whole source string, dropping whitespace and comments as it
/// goes (they carry no information the reader needs — §4.C step 1 already
/// treats them as transparent).
pub fn tokenize(src: &str) -> Result<Vec<Token>, LexError> {
    let index = LineIndex::new(src);
    let mut tokens = Vec::new();
    let mut input = src;
    let mut offset = 0usize;
    let mut depth = 0i32;

    loop {
        if input.is_empty() {
            break;
        }
        if let Ok((rest, _)) = ws(input) {
            offset += input.len() - rest.len();
            input = rest;
            continue;
        }
        if let Ok((rest, _)) = comment(input) {
            offset += input.len() - rest.len();
            input = rest;
            continue;
        }
        let position = index.position(offset);
        match one_token(input) {
            Ok((rest, (kind, consumed))) => {
                match kind {
                    TokenKind::Open => depth += 1,
                    TokenKind::Close => {
                        depth -= 1;
                        if depth < 0 {
                            return Err(LexError::new(position, "unbalanced closing delimiter"));
                        }
                    }
                    _ => {}
                }
                tracing::trace!(?kind, %position, "lexer token");
                tokens.push(Token { kind, position });
                offset += consumed;
                input = rest;
            }
            Err(nom::Err::Failure(_)) => {
                return Err(LexError::new(position, "unterminated string or bracketed atom"));
            }
            Err(_) => {
                return Err(LexError::new(position, format!("unexpected input: {:?}", &input[..input.len().min(20)])));
            }
        }
    }
    if depth != 0 {
        return Err(LexError::new(index.position(offset), "unbalanced opening delimiter"));
    }
    Ok(tokens)
}
