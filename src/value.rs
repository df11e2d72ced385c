// ABOUTME: The Hissp value model — tuples, text, and opaque host atoms

use std::sync::Arc;

/// A Hissp value: the disjoint union of tuple, text, and "other" (§3).
#[derive(Debug, Clone, PartialEq)]
pub enum Hissp {
    /// An ordered finite sequence of Hissp values — a form.
    Tuple(Arc<[Hissp]>),
    /// Raw host source text: an identifier, module reference, control
    /// word, or arbitrary host expression, tagged with where it came from.
    Text(Text),
    /// Any host-level atom compiled as data.
    Obj(Obj),
}

/// Where a `Text` value originated. Templates auto-qualify unqualified
/// `Symbol` text but never `RawString` text (§4.E) or `Control` words.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextOrigin {
    Symbol,
    RawString,
    Control,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Text {
    pub value: String,
    pub origin: TextOrigin,
}

impl Text {
    pub fn symbol(value: impl Into<String>) -> Text {
        Text { value: value.into(), origin: TextOrigin::Symbol }
    }

    pub fn raw_string(value: impl Into<String>) -> Text {
        Text { value: value.into(), origin: TextOrigin::RawString }
    }

    pub fn control(value: impl Into<String>) -> Text {
        let value = value.into();
        debug_assert!(value.starts_with(':'), "control word must start with ':'");
        Text { value, origin: TextOrigin::Control }
    }

    pub fn is_control(&self) -> bool {
        self.origin == TextOrigin::Control || self.value.starts_with(':')
    }

    /// A module handle: bare `pkg.mod.` with no attribute part.
    pub fn is_module_handle(&self) -> bool {
        self.origin == TextOrigin::Symbol
            && self.value.ends_with('.')
            && !self.value.ends_with("..")
    }

    /// Qualified text: contains `..` exactly once, splitting module from
    /// attribute path (§3 "Qualified text").
    pub fn qualified_split(&self) -> Option<(&str, &str)> {
        if self.origin != TextOrigin::Symbol {
            return None;
        }
        let mut parts = self.value.splitn(2, "..");
        let module = parts.next()?;
        let attr = parts.next()?;
        if module.is_empty() || attr.contains("..") {
            return None;
        }
        Some((module, attr))
    }
}

/// "Other": a host-level object with no tuple/text shape. `List`/`TupleLit`/
/// `Dict` are host collection literals (from a bracketed atom, §4.C rule 7)
/// with no *self-evaluating* literal notation in the compiled subset, so
/// they always go through opaque emission (§4.H); the rest have a direct
/// literal repr.
#[derive(Debug, Clone, PartialEq)]
pub enum Obj {
    Int(i64),
    Float(f64),
    Complex(f64, f64),
    Bool(bool),
    None,
    Ellipsis,
    Bytes(Arc<Vec<u8>>),
    Str(Arc<str>),
    List(Arc<Vec<Obj>>),
    TupleLit(Arc<Vec<Obj>>),
    Dict(Arc<Vec<(Obj, Obj)>>),
}

impl Obj {
    /// Has a known, direct host literal notation (no pickle fallback
    /// needed).
    pub fn has_known_literal(&self) -> bool {
        matches!(
            self,
            Obj::Int(_) | Obj::Float(_) | Obj::Complex(..) | Obj::Bool(_) | Obj::None
                | Obj::Ellipsis | Obj::Bytes(_) | Obj::Str(_)
        )
    }
}

impl Hissp {
    pub fn tuple(items: Vec<Hissp>) -> Hissp {
        Hissp::Tuple(items.into())
    }

    pub fn empty_tuple() -> Hissp {
        Hissp::Tuple(Arc::from(Vec::new()))
    }

    pub fn sym(name: impl Into<String>) -> Hissp {
        Hissp::Text(Text::symbol(name))
    }

    pub fn raw_string(text: impl Into<String>) -> Hissp {
        Hissp::Text(Text::raw_string(text))
    }

    pub fn control(word: impl Into<String>) -> Hissp {
        Hissp::Text(Text::control(word))
    }

    pub fn as_tuple(&self) -> Option<&[Hissp]> {
        match self {
            Hissp::Tuple(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&Text> {
        match self {
            Hissp::Text(t) => Some(t),
            _ => None,
        }
    }

    pub fn is_empty_tuple(&self) -> bool {
        matches!(self, Hissp::Tuple(items) if items.is_empty())
    }

    /// True if this is text equal to `s` (used for recognizing `quote`,
    /// `lambda`, and control words by text match — §3 invariants).
    pub fn is_text(&self, s: &str) -> bool {
        matches!(self.as_text(), Some(t) if t.value == s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn qualified_split_finds_single_separator() {
        let t = Text::symbol("pkg.mod..attr.chain");
        assert_eq!(t.qualified_split(), Some(("pkg.mod", "attr.chain")));
    }

    #[test]
    fn qualified_split_rejects_double_separator() {
        let t = Text::symbol("a..b..c");
        assert_eq!(t.qualified_split(), None);
    }

    #[test]
    fn module_handle_detects_trailing_dot() {
        assert!(Text::symbol("pkg.mod.").is_module_handle());
        assert!(!Text::symbol("pkg.mod").is_module_handle());
        assert!(!Text::symbol("pkg.mod..").is_module_handle());
    }
}
