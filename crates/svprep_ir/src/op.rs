//! Operation kinds and their static properties.
//!
//! [`OpKind`] is a closed set: every pass in the toolchain matches on it
//! exhaustively, so adding a kind forces each consumer to decide how to treat
//! it. The one escape hatch is [`OpKind::Foreign`], which stands for an
//! operation from a dialect this toolchain does not understand.

use serde::{Deserialize, Serialize};
use svprep_common::{Ident, Interner};

/// Execution semantics of a region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RegionKind {
    /// Declarative, order-insensitive semantics (module body, `ifdef`).
    Graph,
    /// Ordered statement-by-statement semantics (`always`, `initial`, `if`).
    Procedural,
}

/// A clock or trigger edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventEdge {
    /// Rising edge.
    Posedge,
    /// Falling edge.
    Negedge,
    /// Either edge.
    Edge,
}

impl EventEdge {
    /// Returns the SystemVerilog keyword for this edge.
    pub fn keyword(self) -> &'static str {
        match self {
            EventEdge::Posedge => "posedge",
            EventEdge::Negedge => "negedge",
            EventEdge::Edge => "edge",
        }
    }
}

/// Whether a flip-flop reset is sampled with the clock or not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResetKind {
    /// Reset is checked on the clock edge only.
    Sync,
    /// Reset also triggers the process.
    Async,
}

/// The reset arm of an `always_ff` process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResetSpec {
    /// Synchronous or asynchronous.
    pub kind: ResetKind,
    /// Active edge of the reset signal.
    pub edge: EventEdge,
}

/// Integer comparison predicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[allow(missing_docs)]
pub enum ICmpPredicate {
    Eq,
    Ne,
    Slt,
    Sle,
    Sgt,
    Sge,
    Ult,
    Ule,
    Ugt,
    Uge,
}

impl ICmpPredicate {
    /// Returns the lowercase predicate name.
    pub fn as_str(self) -> &'static str {
        match self {
            ICmpPredicate::Eq => "eq",
            ICmpPredicate::Ne => "ne",
            ICmpPredicate::Slt => "slt",
            ICmpPredicate::Sle => "sle",
            ICmpPredicate::Sgt => "sgt",
            ICmpPredicate::Sge => "sge",
            ICmpPredicate::Ult => "ult",
            ICmpPredicate::Ule => "ule",
            ICmpPredicate::Ugt => "ugt",
            ICmpPredicate::Uge => "uge",
        }
    }
}

/// Coarse classification of operation kinds used by the legalizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpCategory {
    /// Storage cells: `wire`, `reg`, `logic`.
    Declaration,
    /// `read_inout`.
    Read,
    /// Continuous or procedural assignment into storage.
    Connection,
    /// Module instantiation.
    Instance,
    /// Module terminator.
    Output,
    /// Pure or side-effecting computation.
    Expression,
    /// Region-owning process and conditional nodes.
    Control,
    /// Procedural statements without results.
    Statement,
    /// Not understood by this toolchain.
    Foreign,
}

/// The operation performed by a node.
///
/// Operand and region layouts per kind:
///
/// | kind | operands | regions |
/// |---|---|---|
/// | `Wire`, `Reg`, `Logic` | none | none |
/// | `ReadInOut` | storage | none |
/// | `Assign`, `BPAssign`, `PAssign` | `[dest, src]` | none |
/// | `Always` | one trigger per edge | body |
/// | `AlwaysFF` | `[clock]` or `[clock, reset]` | body, plus reset body with a reset |
/// | `AlwaysComb`, `Initial` | none | body |
/// | `If` | `[cond]` | then, else |
/// | `IfDef`, `IfDefProcedural` | none | then, else |
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OpKind {
    // --- Declarations ---
    /// Net declaration.
    Wire,
    /// Variable declaration with static storage.
    Reg,
    /// Variable declaration; automatic storage inside procedural regions.
    Logic,

    /// Reads the current value of a storage cell.
    ReadInOut,

    // --- Connections ---
    /// Continuous assignment.
    Assign,
    /// Blocking procedural assignment.
    BPAssign,
    /// Non-blocking procedural assignment.
    PAssign,

    /// Instantiation of another module.
    Instance {
        /// Name of the instantiated module.
        module: Ident,
        /// Instance name.
        instance_name: Ident,
        /// Input port names, one per operand.
        input_names: Vec<Option<Ident>>,
        /// Output port names, one per result.
        output_names: Vec<Option<Ident>>,
    },

    /// Module terminator; operands drive the output ports in order.
    Output,

    // --- Expressions ---
    /// Integer constant, stored sign-extended to 64 bits.
    Constant {
        /// The constant value.
        value: i64,
    },
    /// Variadic addition.
    Add,
    /// Variadic multiplication.
    Mul,
    /// Variadic bitwise AND.
    And,
    /// Variadic bitwise OR.
    Or,
    /// Variadic bitwise XOR.
    Xor,
    /// Subtraction.
    Sub,
    /// Left shift.
    Shl,
    /// Logical right shift.
    ShrU,
    /// Integer comparison.
    ICmp {
        /// Comparison predicate.
        pred: ICmpPredicate,
    },
    /// `cond ? a : b`.
    Mux,
    /// Bit concatenation.
    Concat,
    /// Bit-range selection starting at `low`.
    Extract {
        /// Lowest selected bit.
        low: u32,
    },
    /// Bit replication.
    Replicate,
    /// Reinterpretation between types of equal width.
    Bitcast,
    /// Struct construction from one operand per field.
    StructCreate,
    /// Selection of a single struct field.
    StructExtract {
        /// Field name.
        field: Ident,
    },
    /// Splits a struct into one result per field.
    StructExplode,
    /// Array element selection by index.
    ArrayGet,
    /// Storage-level array element selection.
    ArrayIndexInOut,
    /// Storage-level struct field selection.
    StructFieldInOut {
        /// Field name.
        field: Ident,
    },
    /// A `$name(...)` system function call.
    SystemFunction {
        /// Function name without the `$`.
        name: Ident,
        /// Whether the call has side effects.
        side_effects: bool,
    },
    /// Literal expression text.
    VerbatimExpr {
        /// The text emitted verbatim.
        text: String,
        /// Whether evaluating the text has side effects.
        side_effects: bool,
    },

    // --- Control ---
    /// `always @(...)` process.
    Always {
        /// One edge per trigger operand.
        edges: Vec<EventEdge>,
    },
    /// `always_ff` process.
    AlwaysFF {
        /// Active clock edge.
        clock_edge: EventEdge,
        /// Optional reset arm.
        reset: Option<ResetSpec>,
    },
    /// `always_comb` process.
    AlwaysComb,
    /// `initial` process.
    Initial,
    /// Procedural conditional.
    If,
    /// Conditional compilation at module level.
    IfDef {
        /// Macro tested by the `ifdef`.
        macro_name: Ident,
    },
    /// Conditional compilation inside procedural code. Purely syntactic.
    IfDefProcedural {
        /// Macro tested by the `ifdef`.
        macro_name: Ident,
    },

    /// `$fwrite` statement.
    FWrite {
        /// Format string.
        format: String,
    },

    /// An operation from a dialect this toolchain cannot emit.
    Foreign {
        /// Dialect namespace.
        dialect: String,
        /// Operation name within the dialect.
        name: String,
    },
}

impl OpKind {
    /// Returns the coarse category of this kind.
    pub fn category(&self) -> OpCategory {
        use OpKind::*;
        match self {
            Wire | Reg | Logic => OpCategory::Declaration,
            ReadInOut => OpCategory::Read,
            Assign | BPAssign | PAssign => OpCategory::Connection,
            Instance { .. } => OpCategory::Instance,
            Output => OpCategory::Output,
            Constant { .. } | Add | Mul | And | Or | Xor | Sub | Shl | ShrU | ICmp { .. } | Mux
            | Concat | Extract { .. } | Replicate | Bitcast | StructCreate
            | StructExtract { .. } | StructExplode | ArrayGet | ArrayIndexInOut
            | StructFieldInOut { .. } | SystemFunction { .. } | VerbatimExpr { .. } => {
                OpCategory::Expression
            }
            Always { .. } | AlwaysFF { .. } | AlwaysComb | Initial | If | IfDef { .. }
            | IfDefProcedural { .. } => OpCategory::Control,
            FWrite { .. } => OpCategory::Statement,
            Foreign { .. } => OpCategory::Foreign,
        }
    }

    /// Returns `true` for storage declarations.
    pub fn is_declaration(&self) -> bool {
        self.category() == OpCategory::Declaration
    }

    /// Returns `true` for the variadic operators whose operands may be
    /// regrouped freely.
    pub fn is_commutative(&self) -> bool {
        matches!(
            self,
            OpKind::Add | OpKind::Mul | OpKind::And | OpKind::Or | OpKind::Xor
        )
    }

    /// Returns `true` for kinds whose evaluation has side effects.
    pub fn has_side_effects(&self) -> bool {
        match self {
            OpKind::SystemFunction { side_effects, .. }
            | OpKind::VerbatimExpr { side_effects, .. } => *side_effects,
            _ => false,
        }
    }

    /// Returns `true` for control nodes that only wrap their body
    /// syntactically and open no new declaration scope of their own.
    pub fn is_syntactic_wrapper(&self) -> bool {
        matches!(self, OpKind::IfDefProcedural { .. })
    }

    /// Returns the execution semantics of each region this kind owns.
    pub fn region_kinds(&self) -> Vec<RegionKind> {
        use RegionKind::*;
        match self {
            OpKind::Always { .. } | OpKind::AlwaysComb | OpKind::Initial => vec![Procedural],
            OpKind::AlwaysFF { reset: None, .. } => vec![Procedural],
            OpKind::AlwaysFF { reset: Some(_), .. } => vec![Procedural, Procedural],
            OpKind::If | OpKind::IfDefProcedural { .. } => vec![Procedural, Procedural],
            OpKind::IfDef { .. } => vec![Graph, Graph],
            _ => Vec::new(),
        }
    }

    /// Returns the textual mnemonic used by the IR dump.
    pub fn mnemonic(&self) -> &'static str {
        use OpKind::*;
        match self {
            Wire => "wire",
            Reg => "reg",
            Logic => "logic",
            ReadInOut => "read_inout",
            Assign => "assign",
            BPAssign => "bpassign",
            PAssign => "passign",
            Instance { .. } => "instance",
            Output => "output",
            Constant { .. } => "constant",
            Add => "add",
            Mul => "mul",
            And => "and",
            Or => "or",
            Xor => "xor",
            Sub => "sub",
            Shl => "shl",
            ShrU => "shru",
            ICmp { .. } => "icmp",
            Mux => "mux",
            Concat => "concat",
            Extract { .. } => "extract",
            Replicate => "replicate",
            Bitcast => "bitcast",
            StructCreate => "struct_create",
            StructExtract { .. } => "struct_extract",
            StructExplode => "struct_explode",
            ArrayGet => "array_get",
            ArrayIndexInOut => "array_index_inout",
            StructFieldInOut { .. } => "struct_field_inout",
            SystemFunction { .. } => "system_function",
            VerbatimExpr { .. } => "verbatim_expr",
            Always { .. } => "always",
            AlwaysFF { .. } => "always_ff",
            AlwaysComb => "always_comb",
            Initial => "initial",
            If => "if",
            IfDef { .. } => "ifdef",
            IfDefProcedural { .. } => "ifdef_procedural",
            FWrite { .. } => "fwrite",
            Foreign { .. } => "foreign",
        }
    }

    /// Renders the kind-specific attributes for the IR dump, if any.
    pub fn attr_text(&self, interner: &Interner) -> Option<String> {
        match self {
            OpKind::Instance {
                module,
                instance_name,
                ..
            } => Some(format!(
                "\"{}\" @{}",
                interner.resolve(*instance_name),
                interner.resolve(*module)
            )),
            OpKind::Constant { value } => Some(value.to_string()),
            OpKind::ICmp { pred } => Some(pred.as_str().to_string()),
            OpKind::Extract { low } => Some(format!("from {low}")),
            OpKind::StructExtract { field } | OpKind::StructFieldInOut { field } => {
                Some(format!("\"{}\"", interner.resolve(*field)))
            }
            OpKind::SystemFunction { name, side_effects } => Some(format!(
                "${}{}",
                interner.resolve(*name),
                if *side_effects { " side_effects" } else { "" }
            )),
            OpKind::VerbatimExpr { text, side_effects } => Some(format!(
                "{text:?}{}",
                if *side_effects { " side_effects" } else { "" }
            )),
            OpKind::Always { edges } => Some(
                edges
                    .iter()
                    .map(|e| e.keyword())
                    .collect::<Vec<_>>()
                    .join(", "),
            ),
            OpKind::AlwaysFF { clock_edge, reset } => Some(match reset {
                Some(r) => format!(
                    "{} {} {}",
                    clock_edge.keyword(),
                    match r.kind {
                        ResetKind::Sync => "sync",
                        ResetKind::Async => "async",
                    },
                    r.edge.keyword()
                ),
                None => clock_edge.keyword().to_string(),
            }),
            OpKind::IfDef { macro_name } | OpKind::IfDefProcedural { macro_name } => {
                Some(interner.resolve(*macro_name).to_string())
            }
            OpKind::FWrite { format } => Some(format!("{format:?}")),
            OpKind::Foreign { dialect, name } => Some(format!("\"{dialect}.{name}\"")),
            _ => None,
        }
    }
}

/// Truncates `value` to `width` bits and sign-extends the result back to 64
/// bits, giving the canonical stored form of a constant.
pub fn canonicalize_constant(value: i64, width: u32) -> i64 {
    if width == 0 {
        return 0;
    }
    if width >= 64 {
        return value;
    }
    let shift = 64 - width;
    (value << shift) >> shift
}
