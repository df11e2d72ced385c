// ABOUTME: The handful of macros built via `hissp-macros`, registered into a fresh namespace

use crate::error::HisspError;
use crate::macro_ns::MacroRegistry;
use crate::value::Hissp;
use hissp_macros::compiler_macro;

/// Expands `(triple x)` to a call applying `plus` to three copies of the
/// unevaluated argument form (§8 scenario 6).
#[compiler_macro(name = "triple")]
fn triple(args: &[Hissp]) -> Result<Hissp, HisspError> {
    let x = args[0].clone();
    Ok(Hissp::tuple(vec![Hissp::sym("plus"), x.clone(), x.clone(), x]))
}

/// Builds a registry with this crate's own bootstrap macros bound into
/// `module`'s namespace, via the `register_*` functions `hissp-macros`
/// generates (§0).
pub fn bootstrap_registry(module: &str) -> MacroRegistry {
    let mut registry = MacroRegistry::new();
    register_triple(&mut registry, module);
    registry
}
