// ABOUTME: Folds a token stream into Hissp trees, dispatching reader macros (§4.C)

use crate::error::{HisspError, Position, ReadError};
use crate::host::HostEvaluator;
use crate::lexer::{tokenize, Token, TokenKind};
use crate::macro_ns::MacroRegistry;
use crate::template::{self, GensymScope};
use crate::value::{Hissp, Obj, Text};
use std::sync::atomic::AtomicU64;
use std::sync::Arc;

/// Library-level configuration for one reading session (§3 of `SPEC_FULL.md`).
#[derive(Debug, Clone)]
pub struct ReaderConfig {
    pub module_name: String,
    pub gensym_counter: Arc<AtomicU64>,
}

impl ReaderConfig {
    pub fn new(module_name: impl Into<String>) -> Self {
        ReaderConfig { module_name: module_name.into(), gensym_counter: template::new_counter() }
    }
}

/// Guards against runaway reader-macro composition (`a#b#c#...`), not a
/// depth any legitimate source would hit.
const MAX_RECURSION: usize = 512;

pub struct Reader<'a> {
    tokens: &'a [Token],
    pos: usize,
    module_name: String,
    gensym_counter: Arc<AtomicU64>,
    registry: &'a MacroRegistry,
    host: Option<&'a dyn HostEvaluator>,
    template_depth: usize,
    recursion: usize,
}

/// Reads every top-level form in `src`. `registry` supplies macros reachable
/// at read time (named reader-macro invocations, §4.C rule 8); `host`, if
/// given, backs `.#` (inject). Forms that read to nothing (`_#x`, discard)
/// are simply absent from the result.
pub fn read_all(
    src: &str,
    config: &ReaderConfig,
    registry: &MacroRegistry,
    host: Option<&dyn HostEvaluator>,
) -> Result<Vec<Hissp>, HisspError> {
    let tokens = tokenize(src)?;
    let mut reader = Reader {
        tokens: &tokens,
        pos: 0,
        module_name: config.module_name.clone(),
        gensym_counter: config.gensym_counter.clone(),
        registry,
        host,
        template_depth: 0,
        recursion: 0,
    };
    let mut forms = Vec::new();
    while reader.pos < reader.tokens.len() {
        if let Some(form) = reader.read_one()? {
            forms.push(form);
        }
    }
    Ok(forms)
}

impl<'a> Reader<'a> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<&Token> {
        let t = self.tokens.get(self.pos);
        if t.is_some() {
            self.pos += 1;
        }
        t
    }

    fn current_position(&self) -> Position {
        self.peek()
            .or_else(|| self.tokens.last())
            .map(|t| t.position.clone())
            .unwrap_or_default()
    }

    fn err(&self, msg: impl Into<String>) -> HisspError {
        ReadError::new(self.current_position(), msg).into()
    }

    /// Reads the next value, recursing through reader macros. Returns
    /// `None` only for a discard (`_#x`).
    fn read_one(&mut self) -> Result<Option<Hissp>, HisspError> {
        self.recursion += 1;
        if self.recursion > MAX_RECURSION {
            self.recursion -= 1;
            return Err(self.err("reader macro composition nested too deeply"));
        }
        let result = self.read_one_inner();
        self.recursion -= 1;
        result
    }

    /// Like `read_one` but requires a value (errors at end of input or on a
    /// discard used where a value is mandatory).
    fn read_required(&mut self) -> Result<Hissp, HisspError> {
        match self.read_one()? {
            Some(v) => Ok(v),
            None => Err(self.err("expected a value here, found discard or nothing")),
        }
    }

    fn read_one_inner(&mut self) -> Result<Option<Hissp>, HisspError> {
        let token = match self.advance() {
            Some(t) => t.clone(),
            None => return Err(self.err("unexpected end of input")),
        };
        match token.kind {
            TokenKind::Open => Ok(Some(self.read_tuple()?)),
            TokenKind::Close => Err(ReadError::new(token.position, "unmatched closing delimiter").into()),

            TokenKind::RawString(s) => Ok(Some(Hissp::Text(Text::raw_string(python_str_literal(&s))))),
            TokenKind::HashString(s) => {
                let unescaped = unescape_host_string(&s);
                Ok(Some(Hissp::Text(Text::raw_string(python_str_literal(&unescaped)))))
            }
            TokenKind::Control(s) => Ok(Some(Hissp::control(s))),

            TokenKind::Quote => {
                let x = self.read_required()?;
                Ok(Some(Hissp::tuple(vec![Hissp::sym("quote"), x])))
            }
            TokenKind::Template => {
                self.template_depth += 1;
                let body = self.read_required();
                self.template_depth -= 1;
                let body = body?;
                let mut gensyms = GensymScope::new(&self.gensym_counter);
                Ok(Some(template::template(&body, &self.module_name, &mut gensyms)))
            }
            TokenKind::Unquote => {
                if self.template_depth == 0 {
                    return Err(ReadError::new(token.position, "`,` is only legal inside a template").into());
                }
                let y = self.read_required()?;
                Ok(Some(template::unquote_marker(y)))
            }
            TokenKind::Splice => {
                if self.template_depth == 0 {
                    return Err(ReadError::new(token.position, "`,@` is only legal inside a template").into());
                }
                let y = self.read_required()?;
                Ok(Some(template::splice_marker(y)))
            }
            TokenKind::Gensym => {
                if self.template_depth == 0 {
                    return Err(ReadError::new(token.position, "`$#` is only legal inside a template").into());
                }
                let name = self.read_required()?;
                let name = name
                    .as_text()
                    .ok_or_else(|| ReadError::new(token.position.clone(), "`$#` must be followed by a symbol"))?
                    .value
                    .clone();
                Ok(Some(Hissp::sym(format!("{}{name}", template::GENSYM_PREFIX))))
            }
            TokenKind::Discard => {
                self.read_one()?;
                Ok(None)
            }
            TokenKind::Inject => {
                let form = self.read_required()?;
                self.inject(form, &token.position).map(Some)
            }
            TokenKind::Extra => Err(ReadError::new(token.position, "`!` extra without a pending reader-macro invocation").into()),
            TokenKind::NamedMacro(name) => {
                let mut extras = Vec::new();
                while matches!(self.peek().map(|t| &t.kind), Some(TokenKind::Extra)) {
                    self.advance();
                    extras.push(self.read_required()?);
                }
                let primary = self.read_required()?;
                self.invoke_named_macro(&name, extras, primary, &token.position).map(Some)
            }

            TokenKind::Atom(text) => Ok(Some(self.read_atom(&text)?)),
        }
    }

    fn read_tuple(&mut self) -> Result<Hissp, HisspError> {
        let mut items = Vec::new();
        loop {
            match self.peek() {
                None => return Err(self.err("unterminated list")),
                Some(t) if t.kind == TokenKind::Close => {
                    self.advance();
                    break;
                }
                _ => {
                    if let Some(v) = self.read_one()? {
                        items.push(v);
                    }
                }
            }
        }
        Ok(Hissp::tuple(items))
    }

    fn inject(&mut self, form: Hissp, position: &Position) -> Result<Hissp, HisspError> {
        let host = self
            .host
            .ok_or_else(|| ReadError::new(position.clone(), ".# requires a host evaluator, none was supplied"))?;
        let source = crate::compiler::compile(&form, &self.module_name, self.registry)?;
        let obj = host
            .eval(&source)
            .map_err(|cause| ReadError::new(position.clone(), format!(".# evaluation failed: {cause}")))?;
        Ok(Hissp::Obj(obj))
    }

    fn invoke_named_macro(
        &mut self,
        name: &str,
        extras: Vec<Hissp>,
        primary: Hissp,
        position: &Position,
    ) -> Result<Hissp, HisspError> {
        tracing::debug!(name, %position, "reader-macro dispatch");
        let lookup = Text::symbol(name);
        let found = match lookup.qualified_split() {
            Some((module, attr)) => self.registry.lookup_qualified(module, attr),
            None => self.registry.lookup_unqualified(&self.module_name, name),
        };
        let f = found.ok_or_else(|| ReadError::new(position.clone(), format!("unknown reader macro: {name}")))?;
        let mut args = extras;
        args.push(primary);
        f(&args).map_err(|e| {
            ReadError::new(position.clone(), format!("reader macro {name} failed: {e}")).into()
        })
    }

    fn read_atom(&self, text: &str) -> Result<Hissp, HisspError> {
        match text {
            "True" => return Ok(Hissp::Obj(Obj::Bool(true))),
            "False" => return Ok(Hissp::Obj(Obj::Bool(false))),
            "None" => return Ok(Hissp::Obj(Obj::None)),
            "..." => return Ok(Hissp::Obj(Obj::Ellipsis)),
            _ => {}
        }
        if let Some(obj) = parse_number(text) {
            return Ok(Hissp::Obj(obj));
        }
        if matches!(text.chars().next(), Some('[') | Some('{')) {
            return parse_host_literal(text).map(Hissp::Obj);
        }
        let symbol_text = Text::symbol(text.to_string());
        if symbol_text.is_module_handle() || symbol_text.qualified_split().is_some() {
            return Ok(Hissp::Text(symbol_text));
        }
        // A leading-dot atom (and not just `.`, already excluded by the
        // module-handle/qualified checks having first claim on `...`) is a
        // method-call selector (§4.D.2); kept verbatim, never munged, so
        // the compiler can recognize the literal `.` prefix.
        if text.starts_with('.') && text.len() > 1 {
            return Ok(Hissp::Text(symbol_text));
        }
        Ok(Hissp::sym(crate::munger::munge(text)))
    }
}

/// Renders raw Lissp source text as a host string-literal expression, the
/// way the reader's RAW_STRING rule requires (§4.C step 4): the emitted
/// text, parenthesized, evaluates to a string equal to `content`.
fn python_str_literal(content: &str) -> String {
    let mut out = String::with_capacity(content.len() + 2);
    out.push('"');
    for c in content.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Processes host-style backslash escapes in a `#"..."` (HASH_STRING)
/// body before it is wrapped as a string literal (§4.C step 5).
fn unescape_host_string(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some('\\') => out.push('\\'),
            Some('"') => out.push('"'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

fn looks_numeric(s: &str) -> bool {
    let mut chars = s.chars().peekable();
    if matches!(chars.peek(), Some('+') | Some('-')) {
        chars.next();
    }
    let rest: String = chars.collect();
    !rest.is_empty() && rest.chars().any(|c| c.is_ascii_digit()) && rest.chars().all(|c| {
        c.is_ascii_digit() || c == '.' || c == 'e' || c == 'E' || c == '+' || c == '-'
    })
}

/// Attempts int/float/complex parse with underscore separators and sign
/// (§4.C step 3).
fn parse_number(raw: &str) -> Option<Obj> {
    let cleaned: String = raw.chars().filter(|&c| c != '_').collect();
    if cleaned.is_empty() {
        return None;
    }
    if let Some(body) = cleaned.strip_suffix('j').or_else(|| cleaned.strip_suffix('J')) {
        return parse_complex(body);
    }
    if !looks_numeric(&cleaned) {
        return None;
    }
    if let Ok(i) = cleaned.parse::<i64>() {
        return Some(Obj::Int(i));
    }
    cleaned.parse::<f64>().ok().map(Obj::Float)
}

fn parse_complex(body: &str) -> Option<Obj> {
    if body.is_empty() || body == "+" {
        return Some(Obj::Complex(0.0, 1.0));
    }
    if body == "-" {
        return Some(Obj::Complex(0.0, -1.0));
    }
    if !looks_numeric(body) {
        return None;
    }
    let chars: Vec<char> = body.chars().collect();
    let mut split = None;
    for i in (1..chars.len()).rev() {
        let c = chars[i];
        if (c == '+' || c == '-') && !matches!(chars[i - 1], 'e' | 'E') {
            split = Some(i);
            break;
        }
    }
    match split {
        Some(i) => {
            let re: f64 = body[..i].parse().ok()?;
            let im: f64 = body[i..].parse().ok()?;
            Some(Obj::Complex(re, im))
        }
        None => body.parse::<f64>().ok().map(|im| Obj::Complex(0.0, im)),
    }
}

/// Parses the content of a bracketed atom (`[...]`/`{...}`) as a host
/// collection literal (§4.C step 7). Supports nested lists, dicts, sets,
/// numbers, quoted strings, and the three singletons.
fn parse_host_literal(text: &str) -> Result<Obj, HisspError> {
    let mut p = LiteralParser { chars: text.chars().collect(), pos: 0 };
    let obj = p.parse_value().map_err(|e| ReadError::new(Position::anonymous(), e))?;
    p.skip_ws();
    if p.pos != p.chars.len() {
        return Err(ReadError::new(Position::anonymous(), "trailing content after bracketed literal").into());
    }
    Ok(obj)
}

struct LiteralParser {
    chars: Vec<char>,
    pos: usize,
}

impl LiteralParser {
    fn skip_ws(&mut self) {
        while matches!(self.chars.get(self.pos), Some(c) if c.is_whitespace()) {
            self.pos += 1;
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn expect(&mut self, c: char) -> Result<(), String> {
        self.skip_ws();
        if self.peek() == Some(c) {
            self.pos += 1;
            Ok(())
        } else {
            Err(format!("expected '{c}' in bracketed literal"))
        }
    }

    fn parse_value(&mut self) -> Result<Obj, String> {
        self.skip_ws();
        match self.peek() {
            Some('[') => self.parse_list(),
            Some('{') => self.parse_brace(),
            Some('"') | Some('\'') => self.parse_string(),
            Some(_) => self.parse_atom(),
            None => Err("unexpected end of bracketed literal".into()),
        }
    }

    fn parse_list(&mut self) -> Result<Obj, String> {
        self.expect('[')?;
        let mut items = Vec::new();
        loop {
            self.skip_ws();
            if self.peek() == Some(']') {
                self.pos += 1;
                break;
            }
            items.push(self.parse_value()?);
            self.skip_ws();
            match self.peek() {
                Some(',') => {
                    self.pos += 1;
                }
                Some(']') => {
                    self.pos += 1;
                    break;
                }
                _ => return Err("expected ',' or ']' in list literal".into()),
            }
        }
        Ok(Obj::List(Arc::new(items)))
    }

    /// `{...}` is a dict if any entry has a `:`, else a set — falling back
    /// to an empty dict for `{}` (Python's own convention).
    fn parse_brace(&mut self) -> Result<Obj, String> {
        self.expect('{')?;
        self.skip_ws();
        if self.peek() == Some('}') {
            self.pos += 1;
            return Ok(Obj::Dict(Arc::new(Vec::new())));
        }
        let first_key = self.parse_value()?;
        self.skip_ws();
        if self.peek() == Some(':') {
            self.pos += 1;
            let first_val = self.parse_value()?;
            let mut pairs = vec![(first_key, first_val)];
            loop {
                self.skip_ws();
                match self.peek() {
                    Some(',') => {
                        self.pos += 1;
                        self.skip_ws();
                        if self.peek() == Some('}') {
                            self.pos += 1;
                            break;
                        }
                        let k = self.parse_value()?;
                        self.expect(':')?;
                        let v = self.parse_value()?;
                        pairs.push((k, v));
                    }
                    Some('}') => {
                        self.pos += 1;
                        break;
                    }
                    _ => return Err("expected ',' or '}' in dict literal".into()),
                }
            }
            return Ok(Obj::Dict(Arc::new(pairs)));
        }
        // Set literal: represented as a deduped tuple-like list, since
        // `Obj` has no dedicated set variant and the opaque encoder treats
        // any unordered collection as data regardless.
        let mut items = vec![first_key];
        loop {
            self.skip_ws();
            match self.peek() {
                Some(',') => {
                    self.pos += 1;
                    self.skip_ws();
                    if self.peek() == Some('}') {
                        self.pos += 1;
                        break;
                    }
                    items.push(self.parse_value()?);
                }
                Some('}') => {
                    self.pos += 1;
                    break;
                }
                _ => return Err("expected ',' or '}' in set literal".into()),
            }
        }
        Ok(Obj::List(Arc::new(items)))
    }

    fn parse_string(&mut self) -> Result<Obj, String> {
        let quote = self.peek().unwrap();
        self.pos += 1;
        let mut s = String::new();
        loop {
            match self.chars.get(self.pos) {
                None => return Err("unterminated string in bracketed literal".into()),
                Some(&c) if c == quote => {
                    self.pos += 1;
                    break;
                }
                Some(&'\\') => {
                    self.pos += 1;
                    match self.chars.get(self.pos) {
                        Some('n') => s.push('\n'),
                        Some('t') => s.push('\t'),
                        Some(&other) => s.push(other),
                        None => return Err("unterminated escape in bracketed literal".into()),
                    }
                    self.pos += 1;
                }
                Some(&c) => {
                    s.push(c);
                    self.pos += 1;
                }
            }
        }
        Ok(Obj::Str(Arc::from(s.as_str())))
    }

    fn parse_atom(&mut self) -> Result<Obj, String> {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c != ',' && c != ']' && c != '}' && c != ':' && !c.is_whitespace()) {
            self.pos += 1;
        }
        let text: String = self.chars[start..self.pos].iter().collect();
        match text.as_str() {
            "True" => return Ok(Obj::Bool(true)),
            "False" => return Ok(Obj::Bool(false)),
            "None" => return Ok(Obj::None),
            _ => {}
        }
        parse_number(&text).ok_or_else(|| format!("unrecognized atom in bracketed literal: {text}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::TextOrigin;

    fn cfg() -> ReaderConfig {
        ReaderConfig::new("pkg.mod")
    }

    fn read(src: &str) -> Vec<Hissp> {
        let registry = MacroRegistry::new();
        read_all(src, &cfg(), &registry, None).unwrap()
    }

    #[test]
    fn reads_a_plain_call() {
        let forms = read("(print 1 2)");
        assert_eq!(forms.len(), 1);
        let items = forms[0].as_tuple().unwrap();
        assert_eq!(items.len(), 3);
        assert!(items[0].is_text("print"));
        assert_eq!(items[1], Hissp::Obj(Obj::Int(1)));
    }

    #[test]
    fn munges_plain_symbols() {
        let forms = read("also-a-symbol");
        assert_eq!(forms[0].as_text().unwrap().value, "alsoQz_aQz_symbol");
    }

    #[test]
    fn numeric_atoms_parse_int_float_complex() {
        assert_eq!(read("42")[0], Hissp::Obj(Obj::Int(42)));
        assert_eq!(read("-7")[0], Hissp::Obj(Obj::Int(-7)));
        assert_eq!(read("3.14")[0], Hissp::Obj(Obj::Float(3.14)));
        assert_eq!(read("1_000")[0], Hissp::Obj(Obj::Int(1000)));
        assert_eq!(read("3j")[0], Hissp::Obj(Obj::Complex(0.0, 3.0)));
        assert_eq!(read("1+2j")[0], Hissp::Obj(Obj::Complex(1.0, 2.0)));
    }

    #[test]
    fn singletons_are_recognized() {
        assert_eq!(read("True")[0], Hissp::Obj(Obj::Bool(true)));
        assert_eq!(read("None")[0], Hissp::Obj(Obj::None));
        assert_eq!(read("...")[0], Hissp::Obj(Obj::Ellipsis));
    }

    #[test]
    fn quote_wraps_in_a_quote_tuple() {
        let items = read("'x")[0].as_tuple().unwrap().to_vec();
        assert!(items[0].is_text("quote"));
        assert_eq!(items[1].as_text().unwrap().value, "x");
    }

    #[test]
    fn discard_consumes_and_yields_nothing() {
        assert_eq!(read("(a _#b c)")[0].as_tuple().unwrap().len(), 2);
    }

    #[test]
    fn unquote_outside_template_is_an_error() {
        let registry = MacroRegistry::new();
        assert!(read_all(",x", &cfg(), &registry, None).is_err());
    }

    #[test]
    fn raw_string_is_marked_with_raw_string_origin() {
        let forms = read(r#""hi""#);
        let t = forms[0].as_text().unwrap();
        assert_eq!(t.origin, TextOrigin::RawString);
        assert_eq!(t.value, "\"hi\"");
    }

    #[test]
    fn bracketed_list_literal_parses_to_obj_list() {
        let forms = read("[1, 2, 3]");
        assert_eq!(forms[0], Hissp::Obj(Obj::List(Arc::new(vec![Obj::Int(1), Obj::Int(2), Obj::Int(3)]))));
    }

    #[test]
    fn bracketed_dict_literal_parses_to_obj_dict() {
        let forms = read("{1: 2}");
        assert_eq!(forms[0], Hissp::Obj(Obj::Dict(Arc::new(vec![(Obj::Int(1), Obj::Int(2))]))));
    }

    #[test]
    fn module_handle_and_qualified_text_are_not_munged() {
        let forms = read("pkg.mod.");
        assert_eq!(forms[0].as_text().unwrap().value, "pkg.mod.");
        let forms = read("pkg.mod..attr-name");
        assert_eq!(forms[0].as_text().unwrap().value, "pkg.mod..attr-name");
    }

    #[test]
    fn template_auto_qualifies_and_gensym_is_stable() {
        let forms = read("`($#x $#x)");
        let outer = forms[0].as_tuple().unwrap();
        // (lambda-identity ...) call built from quote-wrapped pieces
        assert!(outer.len() >= 1);
    }
}
