//! Legalization of hardware IR modules ahead of SystemVerilog emission.
//!
//! The emitter prints a module graph in one linear walk and cannot change
//! it, so every structural property the text needs has to hold beforehand:
//! no use before definition in graph regions, declarations at the top of
//! procedural blocks, single-use side effects, bounded expression size and
//! anchored instance ports. This crate rewrites a [`Module`] until those
//! properties hold.
//!
//! Preparation of one module runs a fixed pipeline of passes:
//!
//! 1. dead-logic pruning,
//! 2. legalization (innermost regions first, with declaration reordering and
//!    use-before-definition resolution per block),
//! 3. prettification (output-quality spilling in graph regions).
//!
//! Modules share no mutable state, so [`prepare_design`] prepares them in
//! parallel and reports failing modules through a [`DiagnosticSink`].

#![warn(missing_docs)]

mod context;
mod cost;
mod decl_order;
pub mod error;
mod forward_refs;
mod hoist;
mod instance;
mod legalize;
pub mod oracle;
mod prettify;
mod prune;
mod rewrite;
mod spill;
pub mod stats;

pub use error::LegalizeError;
pub use oracle::{ExprOracle, SvOracle};
pub use stats::PrepareStats;

use context::PrepareCx;
use cost::CostModel;
use rayon::prelude::*;
use svprep_common::Interner;
use svprep_config::LoweringOptions;
use svprep_diagnostics::{Diagnostic, DiagnosticCode, DiagnosticSink};
use svprep_ir::{Design, Module, ModuleId};

/// One step of the per-module preparation pipeline.
trait PreparePass {
    /// Short name used in log output.
    fn name(&self) -> &'static str;

    /// Runs the pass over the whole module.
    fn run(&self, cx: &mut PrepareCx<'_>) -> Result<(), LegalizeError>;
}

struct PrunePass;

impl PreparePass for PrunePass {
    fn name(&self) -> &'static str {
        "prune"
    }

    fn run(&self, cx: &mut PrepareCx<'_>) -> Result<(), LegalizeError> {
        prune::prune_dead_logic(cx);
        Ok(())
    }
}

struct LegalizePass;

impl PreparePass for LegalizePass {
    fn name(&self) -> &'static str {
        "legalize"
    }

    fn run(&self, cx: &mut PrepareCx<'_>) -> Result<(), LegalizeError> {
        let body = cx.module.body;
        legalize::legalize_block(cx, body)
    }
}

struct PrettifyPass;

impl PreparePass for PrettifyPass {
    fn name(&self) -> &'static str {
        "prettify"
    }

    fn run(&self, cx: &mut PrepareCx<'_>) -> Result<(), LegalizeError> {
        let body = cx.module.body;
        let mut costs = CostModel::new();
        prettify::prettify_block(cx, &mut costs, body)?;
        Ok(())
    }
}

fn run_passes(
    passes: &[&dyn PreparePass],
    module: &mut Module,
    interner: &Interner,
    options: &LoweringOptions,
    oracle: &dyn ExprOracle,
) -> Result<PrepareStats, LegalizeError> {
    let mut cx = PrepareCx::new(module, interner, options, oracle);
    for pass in passes {
        tracing::trace!(module = %cx.module_name, pass = pass.name(), "running pass");
        pass.run(&mut cx)?;
    }
    tracing::debug!(module = %cx.module_name, stats = ?cx.stats, "prepared module");
    Ok(cx.stats)
}

/// Prepares one module for emission: prunes dead logic, legalizes, then
/// spills for readability.
///
/// On error the module is left in a consistent but partially rewritten
/// state and must not be emitted.
pub fn prepare_module(
    module: &mut Module,
    interner: &Interner,
    options: &LoweringOptions,
    oracle: &dyn ExprOracle,
) -> Result<PrepareStats, LegalizeError> {
    run_passes(
        &[&PrunePass, &LegalizePass, &PrettifyPass],
        module,
        interner,
        options,
        oracle,
    )
}

/// Runs only the legalization pass. Running it on its own output changes
/// nothing.
pub fn legalize_module(
    module: &mut Module,
    interner: &Interner,
    options: &LoweringOptions,
    oracle: &dyn ExprOracle,
) -> Result<PrepareStats, LegalizeError> {
    run_passes(&[&LegalizePass], module, interner, options, oracle)
}

/// Runs only the prettification pass over an already legal module.
pub fn prettify_module(
    module: &mut Module,
    interner: &Interner,
    options: &LoweringOptions,
    oracle: &dyn ExprOracle,
) -> Result<PrepareStats, LegalizeError> {
    run_passes(&[&PrettifyPass], module, interner, options, oracle)
}

/// Converts a module failure into the diagnostics reported for it.
fn failure_diagnostics(module: &str, err: &LegalizeError) -> [Diagnostic; 2] {
    let error = match err {
        LegalizeError::UnsupportedConstruct { dialect, op, .. } => Diagnostic::error(
            DiagnosticCode::UNSUPPORTED_CONSTRUCT,
            format!("unsupported operation '{dialect}.{op}'"),
            module,
            err.loc(),
        )
        .with_help("lower this operation before preparing the design for emission"),
        LegalizeError::Internal(_) => {
            Diagnostic::error(DiagnosticCode::INTERNAL, err.to_string(), module, err.loc())
        }
    };
    let skipped = Diagnostic::warning(
        DiagnosticCode::MODULE_SKIPPED,
        "excluded from emission",
        module,
        err.loc(),
    )
    .with_note("the other modules of the design are still prepared");
    [error, skipped]
}

/// Outcome of preparing a whole design.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DesignReport {
    /// Modules that could not be prepared and must not be emitted.
    pub failed: Vec<ModuleId>,
    /// Statistics summed over the modules that were prepared.
    pub stats: PrepareStats,
}

/// Prepares every module of `design` in parallel.
///
/// Failing modules are reported to `sink` and listed in the returned
/// report; the remaining modules are ready for emission.
pub fn prepare_design(
    design: &mut Design,
    options: &LoweringOptions,
    oracle: &dyn ExprOracle,
    sink: &DiagnosticSink,
) -> DesignReport {
    let Design { modules, interner } = design;
    let interner = &*interner;
    let ids: Vec<ModuleId> = modules.iter().map(|(id, _)| id).collect();

    let results: Vec<(ModuleId, Result<PrepareStats, LegalizeError>)> = modules
        .as_mut_slice()
        .par_iter_mut()
        .zip(ids.into_par_iter())
        .map(|(module, id)| (id, prepare_module(module, interner, options, oracle)))
        .collect();

    let mut total = PrepareStats::default();
    let mut failed = Vec::new();
    for (id, result) in results {
        match result {
            Ok(stats) => total += stats,
            Err(err) => {
                let name = interner.resolve(modules[id].name);
                tracing::warn!(module = %name, error = %err, "module preparation failed");
                for diag in failure_diagnostics(name, &err) {
                    sink.emit(diag);
                }
                failed.push(id);
            }
        }
    }
    tracing::debug!(
        modules = modules.len(),
        failed = failed.len(),
        stats = ?total,
        "prepared design"
    );
    DesignReport {
        failed,
        stats: total,
    }
}
