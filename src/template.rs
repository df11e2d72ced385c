// ABOUTME: Template-quote expansion — auto-qualification, gensyms, holes (§4.E)

use crate::value::{Hissp, Text, TextOrigin};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// A tiny, fixed subset of the host's builtin namespace, consulted at read
/// time so template auto-qualification can tell "this name is a host
/// builtin" from "this name is a global/macro in the current module"
/// (§4.E, §8 "Template auto-qualification"). Closed and documented, like
/// the munger's tag table — not meant to be exhaustive, just the names
/// this crate's own tests and worked examples exercise.
pub const BUILTIN_NAMES: &[&str] = &[
    "print", "len", "str", "int", "float", "list", "dict", "set", "tuple", "range",
    "bool", "bytes", "repr", "type", "isinstance", "getattr", "setattr", "hasattr",
    "iter", "next", "map", "filter", "zip", "enumerate", "sorted", "reversed", "sum",
    "min", "max", "abs", "all", "any", "open", "input", "None", "True", "False",
    "Ellipsis", "Exception", "object", "super",
];

pub fn is_builtin(name: &str) -> bool {
    BUILTIN_NAMES.contains(&name)
}

const UNQUOTE: &str = "unquote";
const SPLICE: &str = "unquote_splicing";

pub fn unquote_marker(y: Hissp) -> Hissp {
    Hissp::tuple(vec![Hissp::sym(UNQUOTE), y])
}

pub fn splice_marker(y: Hissp) -> Hissp {
    Hissp::tuple(vec![Hissp::sym(SPLICE), y])
}

fn as_unquote(x: &Hissp) -> Option<&Hissp> {
    match x.as_tuple() {
        Some([head, y]) if head.is_text(UNQUOTE) => Some(y),
        _ => None,
    }
}

fn as_splice(x: &Hissp) -> Option<&Hissp> {
    match x.as_tuple() {
        Some([head, y]) if head.is_text(SPLICE) => Some(y),
        _ => None,
    }
}

/// One template evaluation's gensym state: the counter bump happens once
/// per template, then every `$#name` occurrence inside reuses the same
/// freshly-minted identifier for that name (§4.E "Gensym token" / §3).
pub struct GensymScope {
    n: u64,
    cache: HashMap<String, String>,
}

impl GensymScope {
    pub fn new(counter: &AtomicU64) -> Self {
        GensymScope { n: counter.fetch_add(1, Ordering::SeqCst), cache: HashMap::new() }
    }

    pub fn fresh(&mut self, name: &str) -> String {
        self.cache
            .entry(name.to_string())
            .or_insert_with(|| format!("_{name}QzNo{}_", self.n))
            .clone()
    }
}

/// Prefix the reader attaches to a munged symbol name to mark it as a
/// gensym placeholder, e.g. `$#x` becomes text `"$#x"` after munging `x`.
pub const GENSYM_PREFIX: &str = "$#";

/// The recursive Hissp-to-Hissp transform a template-quote reads into.
/// `x` is the already-read body (with `,`/`,@` holes represented as
/// `(unquote y)`/`(unquote_splicing y)` marker tuples, and `$#name` tokens
/// represented as `Text` values literally prefixed with `$#`).
pub fn template(x: &Hissp, module_name: &str, gensyms: &mut GensymScope) -> Hissp {
    match x {
        Hissp::Tuple(items) => {
            if let Some(y) = as_unquote(x) {
                return y.clone();
            }
            let mut call = vec![Hissp::raw_string(crate::runtime_shims::VARIADIC_IDENTITY)];
            for item in items.iter() {
                if let Some(y) = as_splice(item) {
                    call.push(Hissp::tuple(vec![
                        Hissp::sym(":*"),
                        template(y, module_name, gensyms),
                    ]));
                } else {
                    call.push(template(item, module_name, gensyms));
                }
            }
            Hissp::tuple(call)
        }
        Hissp::Text(t) => template_text(t, module_name, gensyms),
        Hissp::Obj(_) => quote_of(x.clone()),
    }
}

fn template_text(t: &Text, module_name: &str, gensyms: &mut GensymScope) -> Hissp {
    if t.origin == TextOrigin::RawString {
        return quote_of(Hissp::Text(t.clone()));
    }
    if t.origin == TextOrigin::Control {
        return quote_of(Hissp::Text(t.clone()));
    }
    if t.value == "quote" || t.value == "lambda" {
        return quote_of(Hissp::Text(t.clone()));
    }
    if t.value.ends_with('.') || t.qualified_split().is_some() {
        return quote_of(Hissp::Text(t.clone()));
    }
    if t.value.starts_with('.') && t.value != "." {
        return quote_of(Hissp::Text(t.clone()));
    }
    if let Some(name) = t.value.strip_prefix(GENSYM_PREFIX) {
        let fresh = gensyms.fresh(name);
        return quote_of(Hissp::sym(fresh));
    }
    if is_builtin(&t.value) {
        return quote_of(Hissp::sym(format!("builtins..{}", t.value)));
    }
    quote_of(Hissp::sym(format!("{module_name}..QzMaybe_.{}", t.value)))
}

fn quote_of(x: Hissp) -> Hissp {
    Hissp::tuple(vec![Hissp::sym("quote"), x])
}

pub fn new_counter() -> Arc<AtomicU64> {
    Arc::new(AtomicU64::new(0))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counter() -> Arc<AtomicU64> {
        new_counter()
    }

    #[test]
    fn auto_qualifies_unqualified_symbol() {
        let c = counter();
        let mut g = GensymScope::new(&c);
        let out = template(&Hissp::sym("s"), "pkg.mod", &mut g);
        // (quote pkg.mod..QzMaybe_.s)
        let items = out.as_tuple().unwrap();
        assert!(items[0].is_text("quote"));
        assert_eq!(items[1].as_text().unwrap().value, "pkg.mod..QzMaybe_.s");
    }

    #[test]
    fn qualifies_builtins_to_the_builtins_module() {
        let c = counter();
        let mut g = GensymScope::new(&c);
        let out = template(&Hissp::sym("print"), "pkg.mod", &mut g);
        let items = out.as_tuple().unwrap();
        assert_eq!(items[1].as_text().unwrap().value, "builtins..print");
    }

    #[test]
    fn unquote_yields_the_bare_hole() {
        let c = counter();
        let mut g = GensymScope::new(&c);
        let hole = unquote_marker(Hissp::sym("s"));
        let out = template(&hole, "pkg.mod", &mut g);
        assert_eq!(out, Hissp::sym("s"));
    }

    #[test]
    fn raw_strings_are_never_auto_qualified() {
        let c = counter();
        let mut g = GensymScope::new(&c);
        let out = template(&Hissp::raw_string("s"), "pkg.mod", &mut g);
        let items = out.as_tuple().unwrap();
        assert_eq!(items[1], Hissp::raw_string("s"));
    }

    #[test]
    fn gensym_is_stable_within_one_template_but_not_across_templates() {
        let c = counter();
        let mut g1 = GensymScope::new(&c);
        let x1a = template(&Hissp::sym("$#x"), "m", &mut g1);
        let x1b = template(&Hissp::sym("$#x"), "m", &mut g1);
        assert_eq!(x1a, x1b);

        let mut g2 = GensymScope::new(&c);
        let x2 = template(&Hissp::sym("$#x"), "m", &mut g2);
        assert_ne!(x1a, x2);
    }
}
