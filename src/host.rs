// ABOUTME: The seam between the reader and the host's evaluator (§1, §9)

use crate::value::Obj;

/// `.#x` (inject) compiles `x` to host source and evaluates it, yielding
/// the result as a Hissp value. The host's own evaluator is explicitly out
/// of scope for this crate (§1): this trait is the contract a caller
/// implements to supply one. Without an evaluator, `.#` fails with a
/// `ReadError` rather than silently no-opping.
///
/// §9 "Reader macros run host code mid-parse": this is an intentional
/// escape hatch. Implementations of this trait should sandbox or at least
/// document that reading a source can execute arbitrary host code.
pub trait HostEvaluator {
    /// Evaluates `source` (host-language source text, as produced by
    /// `compile`) and returns the resulting value, or an error message on
    /// failure (which the reader wraps into a `ReadError`).
    fn eval(&self, source: &str) -> Result<Obj, String>;
}
