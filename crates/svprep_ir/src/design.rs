//! Top-level design container.
//!
//! A [`Design`] holds every module to be emitted together with the string
//! interner their identifiers resolve against. It is what the CLI reads from
//! JSON and what the per-design preparation driver walks.

use crate::arena::Arena;
use crate::ids::ModuleId;
use crate::module::Module;
use serde::{Deserialize, Serialize};
use svprep_common::Interner;

/// A set of modules sharing one interner.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Design {
    /// All modules, keyed by [`ModuleId`].
    pub modules: Arena<ModuleId, Module>,
    /// Interner for every identifier appearing in the modules.
    pub interner: Interner,
}

impl Design {
    /// Creates an empty design.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a module and returns its ID.
    pub fn add_module(&mut self, module: Module) -> ModuleId {
        self.modules.alloc(module)
    }

    /// Returns the number of modules in the design.
    pub fn module_count(&self) -> usize {
        self.modules.len()
    }

    /// Returns the resolved name of a module.
    pub fn module_name(&self, id: ModuleId) -> &str {
        self.interner.resolve(self.modules[id].name)
    }

    /// Finds a module by name.
    pub fn find_module(&self, name: &str) -> Option<ModuleId> {
        let ident = self.interner.get(name)?;
        self.modules
            .iter()
            .find(|(_, m)| m.name == ident)
            .map(|(id, _)| id)
    }
}
