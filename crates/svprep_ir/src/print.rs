//! Deterministic textual dump of a module graph.
//!
//! The dump is SSA-style: node results are numbered in emission order and
//! input ports print as `%name`. Two graphs that print identically are
//! structurally identical, which is what the preparation tests compare.

use crate::ids::{BlockId, ValueId};
use crate::module::Module;
use crate::node::{PortDirection, ValueDef};
use std::collections::HashMap;
use std::fmt::Write;
use svprep_common::Interner;

/// Renders a module as text.
pub fn print_module(module: &Module, interner: &Interner) -> String {
    let mut printer = Printer {
        module,
        interner,
        numbers: HashMap::new(),
        out: String::new(),
    };
    printer.number_block(module.body);
    printer.print();
    printer.out
}

struct Printer<'a> {
    module: &'a Module,
    interner: &'a Interner,
    numbers: HashMap<ValueId, usize>,
    out: String,
}

impl Printer<'_> {
    fn number_block(&mut self, block: BlockId) {
        let module = self.module;
        for node in module.block_nodes(block) {
            for &result in &module.node(node).results {
                let next = self.numbers.len();
                self.numbers.insert(result, next);
            }
            for &region in &module.node(node).regions {
                self.number_block(region);
            }
        }
    }

    fn value_name(&self, value: ValueId) -> String {
        match self.module.value(value).def {
            ValueDef::Port { index } => match self.module.input_name(index) {
                Some(name) => format!("%{}", self.interner.resolve(name)),
                None => format!("%arg{index}"),
            },
            ValueDef::Result { .. } => match self.numbers.get(&value) {
                Some(n) => format!("%{n}"),
                None => "%<dead>".to_string(),
            },
        }
    }

    fn print(&mut self) {
        let m = self.module;
        let ports: Vec<String> = m
            .ports
            .iter()
            .map(|p| {
                let ty = m.types.display(p.ty, self.interner);
                let name = self.interner.resolve(p.name);
                match p.direction {
                    PortDirection::Input => format!("in %{name}: {ty}"),
                    PortDirection::Output => format!("out {name}: {ty}"),
                }
            })
            .collect();
        let _ = writeln!(
            self.out,
            "module @{}({}) {{",
            self.interner.resolve(m.name),
            ports.join(", ")
        );
        self.print_block(m.body, 1);
        self.out.push_str("}\n");
    }

    fn print_block(&mut self, block: BlockId, depth: usize) {
        let module = self.module;
        let indent = "  ".repeat(depth);
        for id in module.block_nodes(block) {
            let node = module.node(id);
            let mut line = indent.clone();
            if !node.results.is_empty() {
                let results: Vec<String> =
                    node.results.iter().map(|&r| self.value_name(r)).collect();
                let _ = write!(line, "{} = ", results.join(", "));
            }
            line.push_str(node.kind.mnemonic());
            if let Some(attr) = node.kind.attr_text(self.interner) {
                let _ = write!(line, " {attr}");
            }
            if !node.operands.is_empty() {
                let operands: Vec<String> =
                    node.operands.iter().map(|&v| self.value_name(v)).collect();
                let _ = write!(line, " {}", operands.join(", "));
            }
            let mut attrs = Vec::new();
            if let Some(name) = node.name {
                attrs.push(format!("name = {:?}", self.interner.resolve(name)));
            }
            if node.two_state {
                attrs.push("two_state".to_string());
            }
            if !attrs.is_empty() {
                let _ = write!(line, " {{{}}}", attrs.join(", "));
            }
            if !node.results.is_empty() {
                let types: Vec<String> = node
                    .results
                    .iter()
                    .map(|&r| module.types.display(module.value_type(r), self.interner))
                    .collect();
                let _ = write!(line, " : {}", types.join(", "));
            }
            if node.regions.is_empty() {
                self.out.push_str(&line);
                self.out.push('\n');
                continue;
            }
            self.out.push_str(&line);
            for &region in &node.regions {
                self.out.push_str(" {\n");
                self.print_block(region, depth + 1);
                self.out.push_str(&indent);
                self.out.push('}');
            }
            self.out.push('\n');
        }
    }
}
