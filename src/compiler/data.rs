// ABOUTME: Quote/data emission and the opaque-literal escape hatch (§4.D, §4.H)

use crate::opaque;
use crate::runtime_shims;
use crate::value::{Hissp, Obj, TextOrigin};

/// Compiles `x` as literal data — what `(quote, x)` lowers to (§4.D "data
/// emission"). Tuples become host tuple literals, text becomes the host
/// string equal to its own source characters, and atoms follow the same
/// literal-or-opaque rule as a bare atom form.
pub fn emit_data(x: &Hissp) -> String {
    match x {
        Hissp::Tuple(items) => {
            if items.is_empty() {
                return "()".to_string();
            }
            let inner = items.iter().map(emit_data).collect::<Vec<_>>().join(", ");
            if items.len() == 1 {
                format!("({inner},)")
            } else {
                format!("({inner})")
            }
        }
        // A `RawString` leaf's `value` is already a complete host string
        // literal (quotes included, per `reader::python_str_literal`) —
        // emitting it verbatim reproduces that literal. Everything else
        // (a bare symbol, a control word) becomes the host string equal to
        // its own surface characters.
        Hissp::Text(t) if t.origin == TextOrigin::RawString => t.value.clone(),
        Hissp::Text(t) => format!("{:?}", t.value),
        Hissp::Obj(obj) => emit_obj(obj),
    }
}

/// Compiles a bare `Obj` atom: a direct literal if the host has one,
/// parenthesized to defend against unary-minus parsing, else an opaque
/// loader expression (§4.D last two dispatch rules).
pub fn emit_obj(obj: &Obj) -> String {
    if obj.has_known_literal() {
        let repr = opaque::repr(obj);
        if repr.starts_with('-') {
            format!("({repr})")
        } else {
            repr
        }
    } else {
        emit_opaque(obj)
    }
}

fn emit_opaque(obj: &Obj) -> String {
    let bytes = opaque::encode_bytes(obj);
    let escaped: String = bytes.iter().map(|b| format!("\\x{b:02x}")).collect();
    format!("# {}\n{}.loads(b\"{escaped}\")", opaque::repr(obj), runtime_shims::PICKLE_LOADER)
}
