//! Per-module preparation state.

use crate::oracle::ExprOracle;
use crate::stats::PrepareStats;
use svprep_common::{Ident, InternalError, Interner, PrepResult};
use svprep_config::LoweringOptions;
use svprep_ir::{Module, NodeId, TypeId, ValueId};

/// Everything a rewrite needs while preparing one module.
///
/// A context borrows exactly one module mutably, so two contexts never share
/// mutable state and modules can be prepared on separate threads.
pub(crate) struct PrepareCx<'a> {
    pub module: &'a mut Module,
    pub interner: &'a Interner,
    pub options: &'a LoweringOptions,
    pub oracle: &'a dyn ExprOracle,
    pub stats: PrepareStats,
    pub module_name: String,
}

impl<'a> PrepareCx<'a> {
    pub fn new(
        module: &'a mut Module,
        interner: &'a Interner,
        options: &'a LoweringOptions,
        oracle: &'a dyn ExprOracle,
    ) -> Self {
        let module_name = interner.resolve(module.name).to_string();
        Self {
            module,
            interner,
            options,
            oracle,
            stats: PrepareStats::default(),
            module_name,
        }
    }

    pub fn is_expression(&self, node: NodeId) -> bool {
        self.oracle.is_expression(self.module, node)
    }

    pub fn is_always_inline(&self, node: NodeId) -> bool {
        self.oracle.is_always_inline(self.module, node)
    }

    pub fn is_memory_effect_free(&self, node: NodeId) -> bool {
        self.oracle.is_memory_effect_free(self.module, node)
    }

    pub fn intern(&self, name: &str) -> Ident {
        self.interner.get_or_intern(name)
    }

    /// Returns the storage type wrapping the type of `value`.
    pub fn storage_type_of(&mut self, value: ValueId) -> TypeId {
        let ty = self.module.value_type(value);
        self.module.types.inout(ty)
    }

    /// Returns the type a read of the storage value `storage` produces.
    pub fn element_type_of(&self, storage: ValueId) -> PrepResult<TypeId> {
        let ty = self.module.value_type(storage);
        self.module.types.inout_element(ty).ok_or_else(|| {
            InternalError::new(format!(
                "{storage:?} in module '{}' is read but is not storage",
                self.module_name
            ))
        })
    }

    /// Walks up from a node in a procedural region to the outermost control
    /// node that still sits in a graph region.
    pub fn find_parent_in_non_procedural_region(&self, node: NodeId) -> PrepResult<NodeId> {
        let m = &*self.module;
        let mut parent = m.parent_node(node).ok_or_else(|| {
            InternalError::new(format!(
                "{node:?} in module '{}' sits in a procedural block with no owner",
                self.module_name
            ))
        })?;
        while m.in_procedural_region(parent) {
            match m.parent_node(parent) {
                Some(up) => parent = up,
                None => break,
            }
        }
        Ok(parent)
    }
}
