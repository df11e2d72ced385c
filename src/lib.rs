// ABOUTME: Library surface for the Lissp-to-host-source compilation pipeline

pub mod bootstrap;
pub mod compiler;
pub mod error;
pub mod host;
pub mod lexer;
pub mod macro_ns;
pub mod munger;
pub mod opaque;
pub mod reader;
pub mod runtime_shims;
pub mod template;
pub mod value;

pub use error::{CompileError, HisspError, LexError, MacroError, ReadError, Result};
pub use host::HostEvaluator;
pub use macro_ns::{MacroFn, MacroNamespace, MacroRegistry};
pub use munger::{demunge, munge};
pub use reader::{read_all, ReaderConfig};
pub use value::{Hissp, Obj, Text, TextOrigin};

/// Lowers one Hissp form to host source text (§4.D, §6 "compile"). Takes an
/// explicit `MacroRegistry` rather than consulting process-global state —
/// multiple independent compilations (e.g. concurrent modules) never share
/// macro bindings unless the caller hands them the same registry.
///
/// Atom literals are parenthesized only when needed to defend against
/// unary-minus parsing (§4.D, `compiler::data::emit_obj`) — uniformly,
/// whether the atom is a whole top-level form or nested inside a call,
/// tuple, or macro expansion, since §8's idempotence property requires
/// compiling a macro's expansion to match compiling its invocation
/// byte-for-byte, and those two paths recompile sub-forms through the same
/// recursive `compile`. See DESIGN.md for why §8 scenario 5's prose
/// rendering of this as `(3)` is read as expository, not a literal-text
/// requirement that would contradict that invariant.
pub fn compile(form: &Hissp, module_name: &str, registry: &MacroRegistry) -> Result<String> {
    tracing::info!(module = module_name, "compiling top-level form");
    compiler::compile(form, module_name, registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn end_to_end_read_then_compile_a_call() {
        let config = ReaderConfig::new("__main__");
        let registry = MacroRegistry::new();
        let forms = read_all("(print 1 2 3 : sep \"-\")", &config, &registry, None).unwrap();
        let source = compile(&forms[0], "__main__", &registry).unwrap();
        assert_eq!(source, "print(1, 2, 3, sep=\"-\")");
    }

    #[test]
    fn munge_and_demunge_round_trip_through_the_public_api() {
        assert_eq!(demunge(&munge("Also-a-symbol!")), "Also-a-symbol!");
    }

    #[test]
    fn macro_invocation_receives_code_not_values() {
        // scenario 6: a `triple` macro built from a template must expand to
        // three copies of the *unevaluated* argument form, so the host
        // evaluates the side-effecting argument three times, not once.
        let config = ReaderConfig::new("__main__");
        let mut registry = MacroRegistry::new();
        registry.namespace_mut("__main__").define(
            "triple",
            Arc::new(|args: &[Hissp]| {
                let x = args[0].clone();
                Ok(Hissp::tuple(vec![Hissp::sym("f"), x.clone(), x.clone(), x]))
            }),
        );
        let forms = read_all("(triple (loud 14))", &config, &registry, None).unwrap();
        let source = compile(&forms[0], "__main__", &registry).unwrap();
        assert_eq!(source, "# __main__.._macro_.triple\nf(loud(14), loud(14), loud(14))");
    }
}
