//! Names for the target machine's registers and instruction mnemonics
//! (spec §4.12's 8-register, descending-stack, caller-cleans 32-bit RISC
//! target). The spec describes the machine abstractly and only names
//! `R_ret`, `JEQ`, and `JMP` directly; the rest of this vocabulary is a
//! closed, deterministic choice recorded in the design ledger rather than
//! left to be reinvented ad hoc at every call site.

/// Registers the generator addresses by name rather than by number: a
/// stack-based expression evaluator only ever needs a handful of live
/// values at once, so no general register allocator is required.
pub mod reg {
    /// Holds a function's return value across `CALL`/`RET` (spec §4.12).
    pub const RET: &str = "R_ret";
    /// Where every expression rule leaves its result.
    pub const TOP: &str = "R_top";
    /// Scratch register for a binary operator's left operand.
    pub const LHS: &str = "R_lhs";
    /// Scratch register for a binary operator's right operand.
    pub const RHS: &str = "R_rhs";
    /// Scratch register holding a computed l-value's effective address.
    pub const ADDR: &str = "R_addr";
    /// Frame pointer.
    pub const FP: &str = "R_fp";
    /// Stack pointer.
    pub const SP: &str = "R_sp";
}

pub mod op {
    pub const MOVE: &str = "MOVE";
    pub const PUSH: &str = "PUSH";
    pub const POP: &str = "POP";
    pub const ADD: &str = "ADD";
    pub const SUB: &str = "SUB";
    pub const MUL: &str = "MUL";
    pub const DIV: &str = "DIV";
    /// Not in the spec's own closed mnemonic list (ADD/SUB/MUL/DIV/AND/
    /// OR/XOR); added because the source grammar has `%` (`OP_MOD`) and
    /// the abstract machine has no other way to express it.
    pub const MOD: &str = "MOD";
    pub const AND: &str = "AND";
    pub const OR: &str = "OR";
    pub const XOR: &str = "XOR";
    pub const CMP: &str = "CMP";
    pub const JEQ: &str = "JEQ";
    pub const JNE: &str = "JNE";
    /// Order-comparison jumps. The spec names only `JEQ`/`JNE` (enough for
    /// `if`/`while`/`for`), but `<`, `>`, `<=`, `>=` are full expression
    /// operators here and need their own conditional jumps to lower to
    /// values without a dedicated compare-and-set instruction.
    pub const JLT: &str = "JLT";
    pub const JGT: &str = "JGT";
    pub const JLE: &str = "JLE";
    pub const JGE: &str = "JGE";
    pub const JMP: &str = "JMP";
    pub const CALL: &str = "CALL";
    pub const RET: &str = "RET";
    pub const LOAD: &str = "LOAD";
    pub const STORE: &str = "STORE";
    /// Reserves one word of static storage; used only for global variables
    /// and the string-literal pool, never inside a function body.
    pub const WORD: &str = "WORD";
}
