//! Structural size estimate of the expression tree behind a value.
//!
//! Ports and operand-free nodes count as one term; any other node counts as
//! the sum of its operands. Estimates are memoized for the lifetime of one
//! module's preparation and never shared across modules.

use std::collections::{HashMap, HashSet};
use svprep_ir::{Module, ValueId};

/// Memoized term counts for one module.
#[derive(Debug, Default)]
pub(crate) struct CostModel {
    memo: HashMap<ValueId, usize>,
}

impl CostModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of terms the expression producing `value` would
    /// print as if fully inlined.
    pub fn cost(&mut self, module: &Module, value: ValueId) -> usize {
        if let Some(&cost) = self.memo.get(&value) {
            return cost;
        }
        // Post-order over the operand graph without recursion; deep chains of
        // expressions are common in generated code.
        let mut stack = vec![(value, false)];
        let mut in_progress = HashSet::new();
        while let Some((v, expanded)) = stack.pop() {
            if self.memo.contains_key(&v) {
                continue;
            }
            let Some(def) = module.defining_node(v) else {
                self.memo.insert(v, 1);
                continue;
            };
            let operands = &module.node(def).operands;
            if operands.is_empty() {
                self.memo.insert(v, 1);
                continue;
            }
            if expanded {
                let size = operands
                    .iter()
                    .map(|o| self.memo.get(o).copied().unwrap_or(1))
                    .sum();
                self.memo.insert(v, size);
                in_progress.remove(&v);
                continue;
            }
            in_progress.insert(v);
            stack.push((v, true));
            for &operand in operands.iter().rev() {
                if !self.memo.contains_key(&operand) && !in_progress.contains(&operand) {
                    stack.push((operand, false));
                }
            }
        }
        self.memo.get(&value).copied().unwrap_or(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use svprep_common::{Interner, Loc};
    use svprep_ir::{InsertPoint, OpKind};

    #[test]
    fn ports_and_leaves_cost_one() {
        let interner = Interner::new();
        let mut m = Module::new(interner.get_or_intern("m"), Loc::UNKNOWN);
        let i8 = m.types.int(8);
        let a = m.add_input(interner.get_or_intern("a"), i8);
        let body = m.body;
        let c = m.create_node(
            InsertPoint::End(body),
            OpKind::Constant { value: 3 },
            vec![],
            vec![i8],
        );
        let mut model = CostModel::new();
        assert_eq!(model.cost(&m, a), 1);
        assert_eq!(model.cost(&m, m.result(c, 0)), 1);
    }

    #[test]
    fn shared_subtrees_count_per_use() {
        let interner = Interner::new();
        let mut m = Module::new(interner.get_or_intern("m"), Loc::UNKNOWN);
        let i8 = m.types.int(8);
        let a = m.add_input(interner.get_or_intern("a"), i8);
        let b = m.add_input(interner.get_or_intern("b"), i8);
        let body = m.body;
        let add = m.create_node(InsertPoint::End(body), OpKind::Add, vec![a, b], vec![i8]);
        let sum = m.result(add, 0);
        let mul = m.create_node(InsertPoint::End(body), OpKind::Mul, vec![sum, sum, a], vec![i8]);
        let mut model = CostModel::new();
        assert_eq!(model.cost(&m, sum), 2);
        assert_eq!(model.cost(&m, m.result(mul, 0)), 5);
    }

    #[test]
    fn deep_chain_does_not_overflow() {
        let interner = Interner::new();
        let mut m = Module::new(interner.get_or_intern("m"), Loc::UNKNOWN);
        let i8 = m.types.int(8);
        let a = m.add_input(interner.get_or_intern("a"), i8);
        let body = m.body;
        let mut v = a;
        for _ in 0..50_000 {
            let n = m.create_node(InsertPoint::End(body), OpKind::Xor, vec![v, a], vec![i8]);
            v = m.result(n, 0);
        }
        let mut model = CostModel::new();
        assert_eq!(model.cost(&m, v), 50_001);
    }
}
