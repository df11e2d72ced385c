// ABOUTME: Error types for the lex/read/compile/macro-expansion pipeline

use thiserror::Error;

/// A location in a source, or `None` for an anonymously-constructed form
/// (e.g. one built directly via the library API rather than read from
/// text).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Position {
    pub line: usize,
    pub column: usize,
    pub file: Option<String>,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Position { line, column, file: None }
    }

    pub fn anonymous() -> Self {
        Position::default()
    }

    pub fn in_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.file {
            Some(file) => write!(f, "{file}:{}:{}", self.line, self.column),
            None => write!(f, "<anonymous>:{}:{}", self.line, self.column),
        }
    }
}

#[derive(Error, Debug, Clone)]
#[error("lex error at {position}: {reason}")]
pub struct LexError {
    pub position: Position,
    pub reason: String,
}

impl LexError {
    pub fn new(position: Position, reason: impl Into<String>) -> Self {
        let reason = reason.into();
        tracing::error!(%position, %reason, "lex error");
        LexError { position, reason }
    }
}

#[derive(Error, Debug, Clone)]
#[error("read error at {position}: {cause}")]
pub struct ReadError {
    pub position: Position,
    pub cause: String,
}

impl ReadError {
    pub fn new(position: Position, cause: impl Into<String>) -> Self {
        let cause = cause.into();
        tracing::error!(%position, %cause, "read error");
        ReadError { position, cause }
    }
}

#[derive(Error, Debug, Clone)]
#[error("compile error at {position}: {reason}\n{}", render_marker(offending))]
pub struct CompileError {
    pub position: Position,
    pub reason: String,
    /// The offending form, rendered with a `^` marker under the faulty
    /// subform (§6: "`CompileError` additionally carries the offending form
    /// rendered with a marker highlighting the subform at fault").
    pub offending: String,
}

fn render_marker(offending: &str) -> String {
    let width = offending.chars().count().max(1);
    format!("{offending}\n{}", "^".repeat(width))
}

impl CompileError {
    pub fn new(position: Position, reason: impl Into<String>, offending: impl Into<String>) -> Self {
        let reason = reason.into();
        let offending = offending.into();
        tracing::error!(%position, %reason, %offending, "compile error");
        CompileError { position, reason, offending }
    }
}

#[derive(Error, Debug, Clone)]
#[error("error expanding macro {qualified_name}: {source}\nin form: {form}")]
pub struct MacroError {
    pub qualified_name: String,
    pub form: String,
    pub source: Box<HisspError>,
}

impl MacroError {
    pub fn new(qualified_name: impl Into<String>, form: impl Into<String>, source: HisspError) -> Self {
        let qualified_name = qualified_name.into();
        let form = form.into();
        tracing::error!(%qualified_name, %form, source = %source, "macro expansion error");
        MacroError {
            qualified_name,
            form,
            source: Box::new(source),
        }
    }
}

/// The union of every way compilation of one top-level form can fail (§6,
/// §7). Each variant is terminating: it aborts only the current top-level
/// form, not the state shared between forms (the gensym counter, macro
/// namespaces — see §5).
#[derive(Error, Debug, Clone)]
pub enum HisspError {
    #[error(transparent)]
    Lex(#[from] LexError),
    #[error(transparent)]
    Read(#[from] ReadError),
    #[error(transparent)]
    Compile(#[from] CompileError),
    #[error(transparent)]
    Macro(#[from] MacroError),
}

pub type Result<T> = std::result::Result<T, HisspError>;
