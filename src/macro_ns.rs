// ABOUTME: The macro namespace protocol — contract between compiler and macros (§4.F)

use crate::error::HisspError;
use crate::munger::munge;
use crate::value::Hissp;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// A compile-time macro: called with the unevaluated tail of the
/// invocation tuple, returns a Hissp tree the compiler recompiles in the
/// same lexical context (§4.F).
pub type MacroFn = Arc<dyn Fn(&[Hissp]) -> Result<Hissp, HisspError> + Send + Sync>;

#[derive(Clone)]
pub struct MacroNamespace {
    macros: HashMap<String, MacroFn>,
}

impl fmt::Debug for MacroNamespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MacroNamespace")
            .field("names", &self.macros.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Default for MacroNamespace {
    fn default() -> Self {
        MacroNamespace { macros: HashMap::new() }
    }
}

impl MacroNamespace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds a macro under its surface name (munged before storage, since
    /// the namespace's attributes are host-identifier-keyed, §3 "Macro
    /// namespace").
    pub fn define(&mut self, surface_name: &str, f: MacroFn) {
        self.macros.insert(munge(surface_name), f);
    }

    pub fn get(&self, surface_name: &str) -> Option<MacroFn> {
        self.macros.get(&munge(surface_name)).cloned()
    }

    pub fn contains(&self, surface_name: &str) -> bool {
        self.macros.contains_key(&munge(surface_name))
    }
}

/// A compile-time registry of one `MacroNamespace` per module. `quote` and
/// `lambda` are never looked up here — they're recognized by text match
/// before this registry is ever consulted (§3, §4.F).
#[derive(Debug, Clone, Default)]
pub struct MacroRegistry {
    namespaces: HashMap<String, MacroNamespace>,
}

impl MacroRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn namespace_mut(&mut self, module: &str) -> &mut MacroNamespace {
        self.namespaces.entry(module.to_string()).or_default()
    }

    pub fn namespace(&self, module: &str) -> Option<&MacroNamespace> {
        self.namespaces.get(module)
    }

    /// Resolves a macro by fully-qualified text (`module.._macro_.name`),
    /// bare `name` (current module's namespace only), or a `QzMaybe_`
    /// marker (resolved by the caller — see `compiler::resolve_maybe`).
    pub fn lookup_qualified(&self, module: &str, name: &str) -> Option<MacroFn> {
        let found = self.namespaces.get(module).and_then(|ns| ns.get(name));
        tracing::debug!(module, name, hit = found.is_some(), "macro namespace lookup");
        found
    }

    pub fn lookup_unqualified(&self, current_module: &str, name: &str) -> Option<MacroFn> {
        self.lookup_qualified(current_module, name)
    }
}
