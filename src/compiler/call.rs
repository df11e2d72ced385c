// ABOUTME: Call-argument pairs grammar and method-call lowering (§4.D.2)

use crate::error::{CompileError, HisspError, Position};
use crate::macro_ns::MacroRegistry;
use crate::value::{Hissp, Text};

pub fn compile_call(
    head: &Hissp,
    tail: &[Hissp],
    module: &str,
    registry: &MacroRegistry,
    whole_form: &Hissp,
) -> Result<String, HisspError> {
    let callee = super::compile(head, module, registry)?;
    let args = compile_args(tail, module, registry, whole_form)?;
    Ok(format!("{callee}({args})"))
}

/// `(.<name>, receiver, args…)` ⇒ `<receiver>.<name>(args…)`. Never a macro
/// invocation, even if a macro of that munged name happens to exist.
pub fn compile_method_call(
    selector: &Text,
    tail: &[Hissp],
    module: &str,
    registry: &MacroRegistry,
    whole_form: &Hissp,
) -> Result<String, HisspError> {
    let name = selector.value.trim_start_matches('.');
    let receiver = super::compile(&tail[0], module, registry)?;
    let args = compile_args(&tail[1..], module, registry, whole_form)?;
    Ok(format!("{receiver}.{name}({args})"))
}

fn compile_args(
    tail: &[Hissp],
    module: &str,
    registry: &MacroRegistry,
    whole_form: &Hissp,
) -> Result<String, HisspError> {
    let mut i = 0;
    let mut parts: Vec<String> = Vec::new();

    while i < tail.len() {
        if tail[i].is_text(":") {
            i += 1;
            break;
        }
        parts.push(super::compile(&tail[i], module, registry)?);
        i += 1;
    }

    let mut seen_starstar = false;
    while i < tail.len() {
        if i + 1 >= tail.len() {
            return Err(CompileError::new(Position::anonymous(), "odd pair count in call arguments", super::render_form(whole_form)).into());
        }
        let slot = &tail[i];
        let value = &tail[i + 1];
        i += 2;

        if slot.is_text(":*") {
            if seen_starstar {
                return Err(CompileError::new(Position::anonymous(), "`:*` cannot follow `:**`", super::render_form(whole_form)).into());
            }
            parts.push(format!("*{}", super::compile(value, module, registry)?));
        } else if slot.is_text(":**") {
            seen_starstar = true;
            parts.push(format!("**{}", super::compile(value, module, registry)?));
        } else if slot.is_text(":?") {
            parts.push(super::compile(value, module, registry)?);
        } else if let Some(t) = slot.as_text() {
            if t.is_control() {
                return Err(CompileError::new(Position::anonymous(), format!("malformed call pair slot: {}", t.value), super::render_form(whole_form)).into());
            }
            parts.push(format!("{}={}", t.value, super::compile(value, module, registry)?));
        } else {
            return Err(CompileError::new(Position::anonymous(), "call pair slot must be text", super::render_form(whole_form)).into());
        }
    }
    Ok(parts.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{Obj, Text};

    fn ctl(s: &str) -> Hissp {
        Hissp::Text(Text::control(s))
    }

    #[test]
    fn compiles_positional_call() {
        let registry = MacroRegistry::new();
        let form = Hissp::tuple(vec![Hissp::sym("print"), Hissp::Obj(Obj::Int(1)), Hissp::Obj(Obj::Int(2))]);
        let items = form.as_tuple().unwrap();
        let out = compile_call(&items[0], &items[1..], "m", &registry, &form).unwrap();
        assert_eq!(out, "print(1, 2)");
    }

    #[test]
    fn compiles_keyword_and_unpack_args() {
        let registry = MacroRegistry::new();
        let form = Hissp::tuple(vec![
            Hissp::sym("f"),
            Hissp::Obj(Obj::Int(1)),
            ctl(":"),
            Hissp::sym("sep"),
            Hissp::Obj(Obj::Str(std::sync::Arc::from(","))),
            ctl(":*"),
            Hissp::sym("rest"),
        ]);
        let items = form.as_tuple().unwrap();
        let out = compile_call(&items[0], &items[1..], "m", &registry, &form).unwrap();
        assert_eq!(out, "f(1, sep=\",\", *rest)");
    }

    #[test]
    fn method_call_compiles_receiver_dot_name() {
        let registry = MacroRegistry::new();
        let form = Hissp::tuple(vec![Hissp::Text(Text::symbol(".upper")), Hissp::sym("s")]);
        let items = form.as_tuple().unwrap();
        let selector = items[0].as_text().unwrap();
        let out = compile_method_call(selector, &items[1..], "m", &registry, &form).unwrap();
        assert_eq!(out, "s.upper()");
    }
}
