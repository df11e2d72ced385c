// ABOUTME: Fixed names the emitted host source refers to but never defines (§4.G)

/// The variadic identity expression templates expand into: collects its
/// arguments into a tuple unchanged. Used so a template's call-to-build-a-
/// tuple is itself just an ordinary call in the compiled subset, with no
/// bespoke "build a tuple" AST node needed.
pub const VARIADIC_IDENTITY: &str = "(lambda *_: _)";

/// The host's import-by-name primitive, used for module handles and
/// qualified symbols. Takes a dotted module path, returns the module
/// object (or raises on failure — not this crate's concern, §5 "all file
/// I/O is the responsibility of external collaborators").
pub const IMPORTER: &str = "__import__";

/// Conventional attribute name for a module's macro namespace.
pub const MACRO_NS_ATTR: &str = "_macro_";

/// The loader entry point for opaque-emitted objects (§4.H). Emitted
/// source calls `<LOADER>.loads(b"...")`; this crate never defines
/// `<LOADER>` itself — supplying it is the host runtime's job (§4.G "no
/// library code is shipped with the compiled output").
pub const PICKLE_LOADER: &str = "_Qzpickle_";

/// Top-level binding primitive referenced by expanded macros that need to
/// inject a name into the enclosing module's namespace.
pub const GLOBALS: &str = "globals()";
