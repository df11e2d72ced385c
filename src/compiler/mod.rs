// ABOUTME: Top-level lowering of Hissp trees to host source text (§4.D)

mod call;
mod data;
mod lambda;

use crate::error::{CompileError, HisspError, MacroError, Position};
use crate::macro_ns::{MacroFn, MacroRegistry};
use crate::runtime_shims;
use crate::value::{Hissp, Text, TextOrigin};

pub use data::{emit_data, emit_obj};

/// Lowers one Hissp form to host source text (an expression, per this
/// crate's narrow functional subset — §1 Non-goals: "supporting host
/// statements as first-class Hissp forms").
pub fn compile(form: &Hissp, module: &str, registry: &MacroRegistry) -> Result<String, HisspError> {
    match form {
        Hissp::Tuple(items) if items.is_empty() => Ok("()".to_string()),
        Hissp::Tuple(items) => compile_tuple(items, form, module, registry),
        Hissp::Text(t) => Ok(compile_text(t, registry)),
        Hissp::Obj(obj) => Ok(emit_obj(obj)),
    }
}

fn compile_tuple(items: &[Hissp], whole_form: &Hissp, module: &str, registry: &MacroRegistry) -> Result<String, HisspError> {
    let head = &items[0];
    let tail = &items[1..];

    if head.is_text("quote") {
        let arg = tail.first().ok_or_else(|| {
            CompileError::new(Position::anonymous(), "quote requires exactly one argument", render_form(whole_form))
        })?;
        return Ok(emit_data(arg));
    }
    if head.is_text("lambda") {
        return lambda::compile_lambda(tail, module, registry, whole_form);
    }
    if let Hissp::Text(t) = head {
        if let Some((f, qualified_name)) = resolve_macro(t, module, registry) {
            return expand_macro(&f, qualified_name, tail, whole_form, module, registry);
        }
        if is_method_selector(t) && !tail.is_empty() {
            return call::compile_method_call(t, tail, module, registry, whole_form);
        }
    }
    call::compile_call(head, tail, module, registry, whole_form)
}

fn is_method_selector(t: &Text) -> bool {
    t.origin == TextOrigin::Symbol && t.value.starts_with('.') && t.value != "."
}

fn expand_macro(
    f: &MacroFn,
    qualified_name: String,
    tail: &[Hissp],
    whole_form: &Hissp,
    module: &str,
    registry: &MacroRegistry,
) -> Result<String, HisspError> {
    let expanded = f(tail).map_err(|e| MacroError::new(qualified_name.clone(), render_form(whole_form), e))?;
    let body = compile(&expanded, module, registry)?;
    Ok(format!("# {qualified_name}\n{body}"))
}

/// Resolves a tuple head to a macro, per the namespace protocol (§4.F):
/// fully-qualified (`mod.._macro_.name`), `QzMaybe_`-qualified (resolved
/// here, at compile time), or unqualified (current module only). `quote`
/// and `lambda` are never reached here — the caller checks those first.
fn resolve_macro(head: &Text, module: &str, registry: &MacroRegistry) -> Option<(MacroFn, String)> {
    if head.origin != TextOrigin::Symbol || is_method_selector(head) {
        return None;
    }
    if let Some((m, attr)) = head.qualified_split() {
        let name = attr.strip_prefix("QzMaybe_.").or_else(|| attr.strip_prefix("_macro_."))?;
        return registry.lookup_qualified(m, name).map(|f| (f, format!("{m}.._macro_.{name}")));
    }
    if head.is_module_handle() {
        return None;
    }
    registry
        .lookup_unqualified(module, &head.value)
        .map(|f| (f, format!("{module}.._macro_.{}", head.value)))
}

/// Resolves a `QzMaybe_` marker against the macro namespace (§4.E,
/// §9 "Auto-qualification ambiguity"): if a macro of that name exists in
/// the named module, the reference becomes `mod.._macro_.name`; otherwise
/// it falls back to a plain global `mod..name`, deferring to the host's
/// `NameError` if the global doesn't exist either. Every other text shape
/// passes through unchanged.
fn resolve_maybe(t: &Text, registry: &MacroRegistry) -> Text {
    let Some((module, attr)) = t.qualified_split() else {
        return t.clone();
    };
    let Some(name) = attr.strip_prefix("QzMaybe_.") else {
        return t.clone();
    };
    if registry.lookup_qualified(module, name).is_some() {
        Text::symbol(format!("{module}.._macro_.{name}"))
    } else {
        tracing::warn!(module, name, "QzMaybe_ marker did not resolve to a macro, falling back to a global reference");
        Text::symbol(format!("{module}..{name}"))
    }
}

/// Emits verbatim host source for a text value, translating module
/// handles and qualified texts into import expressions (§4.D "If form is
/// text").
fn compile_text(t: &Text, registry: &MacroRegistry) -> String {
    // Control words are always data, never code (§3) — even reached as a
    // bare value outside the `:`/`:?`/`:*`/`:**`/`:/` pair slots that
    // `compile_params`/`compile_args` intercept structurally.
    if t.origin == TextOrigin::Control {
        return format!("{:?}", t.value);
    }
    let t = resolve_maybe(t, registry);
    if t.is_module_handle() {
        let module = t.value.trim_end_matches('.');
        return format!("{}({module:?})", runtime_shims::IMPORTER);
    }
    if let Some((module, attr)) = t.qualified_split() {
        return format!("{}({module:?}).{attr}", runtime_shims::IMPORTER);
    }
    t.value.clone()
}

/// A plain textual rendering of a Hissp form, used only for diagnostics
/// (`CompileError::offending`, `MacroError::form`) — never fails, unlike
/// `compile`, so it can describe a form compilation itself rejected.
pub fn render_form(x: &Hissp) -> String {
    match x {
        Hissp::Tuple(items) => format!("({})", items.iter().map(render_form).collect::<Vec<_>>().join(" ")),
        Hissp::Text(t) => t.value.clone(),
        Hissp::Obj(obj) => emit_obj(obj),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Obj;
    use std::sync::Arc;

    #[test]
    fn compiles_a_plain_call() {
        let registry = MacroRegistry::new();
        let form = Hissp::tuple(vec![Hissp::sym("print"), Hissp::Obj(Obj::Int(1))]);
        assert_eq!(compile(&form, "m", &registry).unwrap(), "print(1)");
    }

    #[test]
    fn compiles_quote_as_data() {
        let registry = MacroRegistry::new();
        let form = Hissp::tuple(vec![Hissp::sym("quote"), Hissp::tuple(vec![Hissp::sym("a"), Hissp::sym("b")])]);
        assert_eq!(compile(&form, "m", &registry).unwrap(), "(\"a\", \"b\")");
    }

    #[test]
    fn compiles_a_bare_control_word_to_a_string_literal() {
        let registry = MacroRegistry::new();
        let form = Hissp::Text(Text::control(":foo"));
        assert_eq!(compile(&form, "m", &registry).unwrap(), "\":foo\"");
    }

    #[test]
    fn compiles_module_handle_to_import() {
        let registry = MacroRegistry::new();
        let form = Hissp::Text(Text::symbol("pkg.mod."));
        assert_eq!(compile(&form, "m", &registry).unwrap(), "__import__(\"pkg.mod\")");
    }

    #[test]
    fn compiles_qualified_text_to_import_then_attr() {
        let registry = MacroRegistry::new();
        let form = Hissp::Text(Text::symbol("pkg.mod..attr"));
        assert_eq!(compile(&form, "m", &registry).unwrap(), "__import__(\"pkg.mod\").attr");
    }

    #[test]
    fn macro_invocation_recompiles_expansion_with_comment() {
        let mut registry = MacroRegistry::new();
        registry.namespace_mut("m").define("double", Arc::new(|args: &[Hissp]| {
            Ok(Hissp::tuple(vec![Hissp::sym("print"), args[0].clone(), args[0].clone()]))
        }));
        let form = Hissp::tuple(vec![Hissp::sym("double"), Hissp::Obj(Obj::Int(5))]);
        let out = compile(&form, "m", &registry).unwrap();
        assert!(out.starts_with("# m.._macro_.double\n"));
        assert!(out.ends_with("print(5, 5)"));
    }

    #[test]
    fn quote_lambda_never_shadowed_by_macro_of_same_name() {
        let mut registry = MacroRegistry::new();
        registry.namespace_mut("m").define("quote", Arc::new(|_: &[Hissp]| Ok(Hissp::empty_tuple())));
        let form = Hissp::tuple(vec![Hissp::sym("quote"), Hissp::sym("x")]);
        assert_eq!(compile(&form, "m", &registry).unwrap(), "\"x\"");
    }
}
