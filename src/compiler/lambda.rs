// ABOUTME: Parameter-tuple grammar parsing and lambda lowering (§4.D.1)

use crate::error::{CompileError, HisspError, Position};
use crate::macro_ns::MacroRegistry;
use crate::value::Hissp;

pub fn compile_lambda(
    tail: &[Hissp],
    module: &str,
    registry: &MacroRegistry,
    whole_form: &Hissp,
) -> Result<String, HisspError> {
    let params_form = tail.first().ok_or_else(|| {
        CompileError::new(Position::anonymous(), "lambda requires a parameter tuple", super::render_form(whole_form))
    })?;
    let params = params_form.as_tuple().ok_or_else(|| {
        CompileError::new(Position::anonymous(), "lambda parameters must be a tuple", super::render_form(whole_form))
    })?;
    let signature = compile_params(params, module, registry, whole_form)?;
    let body = compile_body(&tail[1..], module, registry)?;
    if signature.is_empty() {
        Ok(format!("(lambda: {body})"))
    } else {
        Ok(format!("(lambda {signature}: {body})"))
    }
}

fn text_name<'a>(x: &'a Hissp, whole_form: &Hissp) -> Result<&'a str, HisspError> {
    x.as_text()
        .map(|t| t.value.as_str())
        .ok_or_else(|| CompileError::new(Position::anonymous(), "expected a name in lambda parameters", super::render_form(whole_form)).into())
}

fn compile_params(
    items: &[Hissp],
    module: &str,
    registry: &MacroRegistry,
    whole_form: &Hissp,
) -> Result<String, HisspError> {
    let mut tokens: Vec<String> = Vec::new();
    let mut i = 0;
    let mut pad = 0usize;

    while i < items.len() {
        if items[i].is_text(":") {
            i += 1;
            break;
        }
        tokens.push(text_name(&items[i], whole_form)?.to_string());
        i += 1;
    }

    while i < items.len() {
        if i + 1 >= items.len() {
            return Err(CompileError::new(
                Position::anonymous(),
                "odd pair count in lambda parameters",
                super::render_form(whole_form),
            )
            .into());
        }
        let slot = &items[i];
        let value = &items[i + 1];
        i += 2;

        if slot.is_text(":?") {
            if value.is_text(":?") {
                tokens.push(format!("_pad{pad}"));
                pad += 1;
            } else {
                return Err(CompileError::new(
                    Position::anonymous(),
                    "`:?` slot takes only `:?` as its value",
                    super::render_form(whole_form),
                )
                .into());
            }
        } else if slot.is_text(":*") {
            if value.is_text(":?") {
                tokens.push("*".to_string());
            } else {
                tokens.push(format!("*{}", text_name(value, whole_form)?));
            }
        } else if slot.is_text(":**") {
            tokens.push(format!("**{}", text_name(value, whole_form)?));
        } else if slot.is_text(":/") {
            if !value.is_text(":?") {
                return Err(CompileError::new(
                    Position::anonymous(),
                    "`:/` must be paired with `:?`",
                    super::render_form(whole_form),
                )
                .into());
            }
            tokens.push("/".to_string());
        } else {
            let name = text_name(slot, whole_form)?.to_string();
            if value.is_text(":?") {
                tokens.push(name);
            } else {
                let default = super::compile(value, module, registry)?;
                tokens.push(format!("{name}={default}"));
            }
        }
    }
    Ok(tokens.join(", "))
}

/// A body of zero expressions is an empty tuple; more than one is sequenced
/// via `(e0, e1, …, en)[-1]`, preserving evaluation order (§4.D.1).
fn compile_body(body: &[Hissp], module: &str, registry: &MacroRegistry) -> Result<String, HisspError> {
    match body.len() {
        0 => Ok("()".to_string()),
        1 => super::compile(&body[0], module, registry),
        _ => {
            let parts = body
                .iter()
                .map(|b| super::compile(b, module, registry))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(format!("({})[-1]", parts.join(", ")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Text;

    fn ctl(s: &str) -> Hissp {
        Hissp::Text(Text::control(s))
    }

    #[test]
    fn compiles_empty_params_and_single_body_expr() {
        let registry = MacroRegistry::new();
        let form = Hissp::tuple(vec![Hissp::sym("lambda"), Hissp::empty_tuple(), Hissp::sym("x")]);
        let tail = &form.as_tuple().unwrap()[1..];
        let out = compile_lambda(tail, "m", &registry, &form).unwrap();
        assert_eq!(out, "(lambda: x)");
    }

    #[test]
    fn compiles_defaulted_and_starred_params() {
        let registry = MacroRegistry::new();
        let params = Hissp::tuple(vec![
            Hissp::sym("a"),
            ctl(":"),
            ctl(":?"),
            ctl(":?"),
            Hissp::sym("b"),
            Hissp::Obj(crate::value::Obj::Int(1)),
            ctl(":*"),
            Hissp::sym("args"),
            ctl(":**"),
            Hissp::sym("kwargs"),
        ]);
        let form = Hissp::tuple(vec![Hissp::sym("lambda"), params, Hissp::sym("a")]);
        let tail = &form.as_tuple().unwrap()[1..];
        let out = compile_lambda(tail, "m", &registry, &form).unwrap();
        assert_eq!(out, "(lambda a, _pad0, b=1, *args, **kwargs: a)");
    }

    #[test]
    fn sequences_multi_expression_bodies() {
        let registry = MacroRegistry::new();
        let form = Hissp::tuple(vec![Hissp::sym("lambda"), Hissp::empty_tuple(), Hissp::sym("a"), Hissp::sym("b")]);
        let tail = &form.as_tuple().unwrap()[1..];
        let out = compile_lambda(tail, "m", &registry, &form).unwrap();
        assert_eq!(out, "(lambda: (a, b)[-1])");
    }
}
