//! Activation-record layout (spec §4.12): parameters get positive offsets
//! above the frame pointer, locals get negative offsets below it.
//!
//! Frame shape, relative to `R_fp` at function entry (after the prologue's
//! `PUSH R_fp` / `MOVE R_fp, R_sp`):
//!
//! ```text
//! R_fp + 4            return address
//! R_fp + 8            parameter 0
//! R_fp + 8 + 4*i      parameter i
//! R_fp                saved caller R_fp
//! R_fp - 4 - 4*j      local j (0-based, in declaration order across the
//!                     whole function, including nested blocks)
//! ```

use cflatc_core::{ScopeId, SymbolEntry, SymbolTable};

/// Assigns offsets to every parameter and local reachable from
/// `func_scope` (the function's parameter scope, which nested blocks are
/// children of) and returns the number of local slots the prologue must
/// reserve.
pub fn assign_offsets(symbols: &mut SymbolTable, func_scope: ScopeId, param_names: &[String]) -> u32 {
    for (i, name) in param_names.iter().enumerate() {
        symbols.set_offset(func_scope, name, 8 + 4 * i as i32);
    }
    let mut locals = 0u32;
    assign_locals(symbols, func_scope, param_names, &mut locals);
    locals
}

fn assign_locals(symbols: &mut SymbolTable, scope_id: ScopeId, param_names: &[String], locals: &mut u32) {
    let vars: Vec<(String, u32)> = symbols
        .scope(scope_id)
        .symbols()
        .filter_map(|entry| match entry {
            SymbolEntry::Variable { name, element_count, .. } => {
                Some((name.clone(), element_count.unwrap_or(1)))
            }
            SymbolEntry::Function { .. } => None,
        })
        .collect();
    for (name, words) in vars {
        if param_names.iter().any(|p| p == &name) {
            continue;
        }
        // A size-`n` array occupies slots [fp-4*(locals+n) .. fp-4*(locals+1)];
        // its offset names the slot closest to fp, i.e. element 0.
        *locals += words;
        let offset = -4 * (*locals - words + 1) as i32;
        symbols.set_offset(scope_id, &name, offset);
    }
    let children = symbols.scope(scope_id).children.clone();
    for child in children {
        assign_locals(symbols, child, param_names, locals);
    }
}

#[cfg(test)]
mod frame_tests {
    use super::*;
    use cflatc_core::{SymbolEntry, Type};

    #[test]
    fn parameters_get_ascending_positive_offsets() {
        let mut symbols = SymbolTable::new();
        let scope = symbols.open_child();
        symbols.declare_variable("a", Type::INT, false, None).unwrap();
        symbols.declare_variable("b", Type::INT, false, None).unwrap();
        assign_offsets(&mut symbols, scope, &["a".to_string(), "b".to_string()]);
        match symbols.scope(scope).get("a") {
            Some(SymbolEntry::Variable { offset, .. }) => assert_eq!(*offset, Some(8)),
            _ => panic!("expected a"),
        }
        match symbols.scope(scope).get("b") {
            Some(SymbolEntry::Variable { offset, .. }) => assert_eq!(*offset, Some(12)),
            _ => panic!("expected b"),
        }
    }

    #[test]
    fn locals_in_nested_blocks_continue_the_same_negative_sequence() {
        let mut symbols = SymbolTable::new();
        let func_scope = symbols.open_child();
        symbols.declare_variable("x", Type::INT, false, None).unwrap();
        let block = symbols.open_child();
        symbols.declare_variable("y", Type::INT, false, None).unwrap();
        symbols.close_child();
        symbols.close_child();

        let locals = assign_offsets(&mut symbols, func_scope, &[]);
        assert_eq!(locals, 2);
        match symbols.scope(func_scope).get("x") {
            Some(SymbolEntry::Variable { offset, .. }) => assert_eq!(*offset, Some(-4)),
            _ => panic!("expected x"),
        }
        match symbols.scope(block).get("y") {
            Some(SymbolEntry::Variable { offset, .. }) => assert_eq!(*offset, Some(-8)),
            _ => panic!("expected y"),
        }
    }

    #[test]
    fn array_locals_reserve_one_slot_per_element() {
        let mut symbols = SymbolTable::new();
        let func_scope = symbols.open_child();
        symbols
            .declare_variable("buf", Type::array(Type::CHAR), false, Some(3))
            .unwrap();
        symbols.declare_variable("n", Type::INT, false, None).unwrap();

        let locals = assign_offsets(&mut symbols, func_scope, &[]);
        assert_eq!(locals, 4);
        match symbols.scope(func_scope).get("buf") {
            Some(SymbolEntry::Variable { offset, .. }) => assert_eq!(*offset, Some(-4)),
            _ => panic!("expected buf"),
        }
        match symbols.scope(func_scope).get("n") {
            Some(SymbolEntry::Variable { offset, .. }) => assert_eq!(*offset, Some(-16)),
            _ => panic!("expected n"),
        }
    }
}
