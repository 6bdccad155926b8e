//! The prepare command: load a design, legalize it, report the result.

use std::error::Error;
use std::fs;

use serde::Serialize;
use svprep_config::{load_options, LoweringOptions};
use svprep_diagnostics::{Diagnostic, DiagnosticRenderer, DiagnosticSink, TerminalRenderer};
use svprep_ir::{print_module, Design};
use svprep_legalize::{prepare_design, PrepareStats, SvOracle};

use crate::{Cli, ReportFormat};

/// Machine-readable output of one run.
#[derive(Serialize)]
struct JsonReport {
    modules: Vec<JsonModule>,
    skipped: Vec<String>,
    stats: PrepareStats,
    diagnostics: Vec<Diagnostic>,
}

#[derive(Serialize)]
struct JsonModule {
    name: String,
    ir: String,
}

/// Resolves the lowering options from the command line.
fn resolve_options(args: &Cli) -> Result<LoweringOptions, Box<dyn Error>> {
    let options = match (&args.options, &args.lowering) {
        (Some(path), _) => load_options(path)?,
        (None, Some(list)) => LoweringOptions::parse(list)?,
        (None, None) => LoweringOptions::default(),
    };
    Ok(options)
}

/// Runs the command and returns the process exit code.
pub fn run(args: &Cli, color: bool) -> Result<i32, Box<dyn Error>> {
    let options = resolve_options(args)?;
    let source = fs::read_to_string(&args.input)
        .map_err(|e| format!("cannot read '{}': {e}", args.input.display()))?;
    let mut design: Design = serde_json::from_str(&source)
        .map_err(|e| format!("cannot parse '{}': {e}", args.input.display()))?;
    tracing::debug!(
        input = %args.input.display(),
        modules = design.modules.len(),
        "loaded design"
    );

    let sink = DiagnosticSink::new();
    let report = prepare_design(&mut design, &options, &SvOracle, &sink);
    let diagnostics = sink.take_all();

    let mut prepared = Vec::new();
    let mut skipped = Vec::new();
    for (id, module) in design.modules.iter() {
        let name = design.interner.resolve(module.name).to_string();
        if report.failed.contains(&id) {
            skipped.push(name);
        } else {
            prepared.push(JsonModule {
                name,
                ir: print_module(module, &design.interner),
            });
        }
    }

    match args.format {
        ReportFormat::Text => {
            if !args.quiet {
                for module in &prepared {
                    print!("{}", module.ir);
                }
            }
            let renderer = TerminalRenderer::new(color);
            for diag in &diagnostics {
                if args.quiet && !diag.severity.is_error() {
                    continue;
                }
                eprint!("{}", renderer.render(diag, &design.interner));
            }
            if args.stats {
                eprintln!("{}", summarize(&report.stats));
            }
            if !args.quiet {
                eprintln!(
                    "prepared {} module(s), skipped {}",
                    prepared.len(),
                    skipped.len()
                );
            }
        }
        ReportFormat::Json => {
            let out = JsonReport {
                modules: prepared,
                skipped,
                stats: report.stats,
                diagnostics,
            };
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
    }

    Ok(if report.failed.is_empty() { 0 } else { 1 })
}

fn summarize(stats: &PrepareStats) -> String {
    format!(
        "stats: {} temporaries, {} duplicated, {} hoisted, {} balanced, {} reused, \
         {} forward references, {} side effects captured, {} pruned",
        stats.temporaries,
        stats.duplicated,
        stats.hoisted,
        stats.balanced,
        stats.reused,
        stats.forward_refs,
        stats.side_effects_extracted,
        stats.pruned
    )
}
