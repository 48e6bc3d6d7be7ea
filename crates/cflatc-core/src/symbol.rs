//! Symbols and the hierarchical symbol table (spec §3, §4.10).
//!
//! Scopes are owned in a flat arena and referenced by index rather than by
//! pointer, per the "cycles in scope traversal" design note in spec §9:
//! the "current scope" is just an index, lookup walks parent indices, and
//! no runtime cycle can form. Child scopes stay reachable from the root
//! after they are closed, so the full tree can still be dumped once
//! analysis finishes (spec §3's "Lifecycle" paragraph).

use std::collections::HashMap;

use crate::types::Type;

/// `(returnType, paramTypes)`; `paramTypes` is ordered and may be empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FunctionSignature {
    pub ret: Type,
    pub params: Vec<Type>,
}

impl FunctionSignature {
    pub fn new(ret: Type, params: Vec<Type>) -> Self {
        Self { ret, params }
    }

    pub fn as_type(&self) -> Type {
        Type::function(self.ret.clone(), self.params.clone())
    }
}

/// A declared variable or function. Activation-record offsets are filled
/// in by the code generator once a function's locals are allocated (spec
/// §3's "Activation record" paragraph); they are `None` until then.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SymbolEntry {
    Variable {
        name: String,
        ty: Type,
        is_const: bool,
        /// Positive for parameters (above the frame), negative for locals,
        /// relative to the frame pointer.
        offset: Option<i32>,
        /// Word count for array variables, `None` for scalars. Set at
        /// declaration time so the code generator can reserve the right
        /// number of activation-record slots without re-deriving array
        /// length from the parse tree.
        element_count: Option<u32>,
    },
    Function {
        name: String,
        signature: FunctionSignature,
        defined: bool,
        label: Option<String>,
    },
}

impl SymbolEntry {
    pub fn name(&self) -> &str {
        match self {
            SymbolEntry::Variable { name, .. } => name,
            SymbolEntry::Function { name, .. } => name,
        }
    }

    pub fn ty(&self) -> Type {
        match self {
            SymbolEntry::Variable { ty, .. } => ty.clone(),
            SymbolEntry::Function { signature, .. } => signature.as_type(),
        }
    }

    pub fn is_variable(&self) -> bool {
        matches!(self, SymbolEntry::Variable { .. })
    }

    pub fn is_function(&self) -> bool {
        matches!(self, SymbolEntry::Function { .. })
    }
}

pub type ScopeId = usize;

/// One lexical scope: a name -> symbol map (in declaration order), a
/// back-reference to its parent, and the ordered list of child scopes.
#[derive(Debug, Clone, Default)]
pub struct Scope {
    pub parent: Option<ScopeId>,
    pub children: Vec<ScopeId>,
    order: Vec<String>,
    symbols: HashMap<String, SymbolEntry>,
}

impl Scope {
    /// Declared symbols in the order they were declared.
    pub fn symbols(&self) -> impl Iterator<Item = &SymbolEntry> {
        self.order.iter().map(move |name| &self.symbols[name])
    }

    pub fn get(&self, name: &str) -> Option<&SymbolEntry> {
        self.symbols.get(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SymbolTableError {
    #[error("identifier '{0}' already declared in this scope")]
    AlreadyDeclared(String),
    #[error("conflicting redeclaration of function '{0}' with a different signature")]
    ConflictingSignature(String),
    #[error("function '{0}' already has a definition")]
    AlreadyDefined(String),
}

/// Hierarchical, arena-backed symbol table (spec §4.10).
#[derive(Debug, Clone)]
pub struct SymbolTable {
    scopes: Vec<Scope>,
    current: ScopeId,
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolTable {
    pub fn new() -> Self {
        Self {
            scopes: vec![Scope::default()],
            current: 0,
        }
    }

    pub fn root(&self) -> ScopeId {
        0
    }

    pub fn current_scope(&self) -> ScopeId {
        self.current
    }

    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id]
    }

    /// Push a new child scope of the current scope and make it current.
    pub fn open_child(&mut self) -> ScopeId {
        let parent = self.current;
        let id = self.scopes.len();
        self.scopes.push(Scope {
            parent: Some(parent),
            ..Scope::default()
        });
        self.scopes[parent].children.push(id);
        self.current = id;
        id
    }

    /// Re-enter the `index`-th child scope opened under the current scope,
    /// without creating a new one. Used to replay the exact scope tree a
    /// prior pass already built (spec §4.12: the code generator walks the
    /// same tree the checker produced and needs the same "current scope"
    /// at each point, but must not re-declare anything).
    pub fn enter_child(&mut self, index: usize) -> ScopeId {
        let id = self.scopes[self.current].children[index];
        self.current = id;
        id
    }

    /// Pop back to the parent of the current scope. The closed scope
    /// remains reachable from its parent for later dumping.
    pub fn close_child(&mut self) {
        if let Some(parent) = self.scopes[self.current].parent {
            self.current = parent;
        }
    }

    /// Record the activation-record offset the code generator assigned to
    /// a variable already declared in `scope_id` (spec §4.12's "positive
    /// for parameters, negative for locals"). No-op if `name` does not
    /// name a variable in that scope.
    pub fn set_offset(&mut self, scope_id: ScopeId, name: &str, offset: i32) {
        if let Some(SymbolEntry::Variable { offset: slot, .. }) = self.scopes[scope_id].symbols.get_mut(name) {
            *slot = Some(offset);
        }
    }

    /// Record the assembly label the code generator chose for a function
    /// declared in `scope_id` (spec §4.12's `F_<name>` scheme).
    pub fn set_function_label(&mut self, scope_id: ScopeId, name: &str, label: String) {
        if let Some(SymbolEntry::Function { label: slot, .. }) = self.scopes[scope_id].symbols.get_mut(name) {
            *slot = Some(label);
        }
    }

    /// Declare a variable in the current scope. `element_count` is `Some`
    /// for array variables (spec §4.12 needs it to size activation-record
    /// storage; everywhere else only `ty.is_array()` matters).
    pub fn declare_variable(
        &mut self,
        name: &str,
        ty: Type,
        is_const: bool,
        element_count: Option<u32>,
    ) -> Result<(), SymbolTableError> {
        let scope = &mut self.scopes[self.current];
        if scope.symbols.contains_key(name) {
            return Err(SymbolTableError::AlreadyDeclared(name.to_owned()));
        }
        scope.order.push(name.to_owned());
        scope.symbols.insert(
            name.to_owned(),
            SymbolEntry::Variable {
                name: name.to_owned(),
                ty,
                is_const,
                offset: None,
                element_count,
            },
        );
        Ok(())
    }

    /// Declare or redeclare a function in the current scope.
    ///
    /// A function may be redeclared if the new signature is identical to
    /// the existing one; redefining an already-defined function is an
    /// error (spec §4.10).
    pub fn declare_function(
        &mut self,
        name: &str,
        signature: FunctionSignature,
        defined: bool,
    ) -> Result<(), SymbolTableError> {
        let scope = &mut self.scopes[self.current];
        match scope.symbols.get(name) {
            None => {
                scope.order.push(name.to_owned());
                scope.symbols.insert(
                    name.to_owned(),
                    SymbolEntry::Function {
                        name: name.to_owned(),
                        signature,
                        defined,
                        label: None,
                    },
                );
                Ok(())
            }
            Some(SymbolEntry::Variable { .. }) => {
                Err(SymbolTableError::AlreadyDeclared(name.to_owned()))
            }
            Some(SymbolEntry::Function {
                signature: existing_sig,
                defined: already_defined,
                ..
            }) => {
                if existing_sig != &signature {
                    return Err(SymbolTableError::ConflictingSignature(name.to_owned()));
                }
                if defined && *already_defined {
                    return Err(SymbolTableError::AlreadyDefined(name.to_owned()));
                }
                let now_defined = *already_defined || defined;
                let entry = SymbolEntry::Function {
                    name: name.to_owned(),
                    signature,
                    defined: now_defined,
                    label: None,
                };
                scope.symbols.insert(name.to_owned(), entry);
                Ok(())
            }
        }
    }

    /// Look up `name` starting at the current scope and walking parents.
    pub fn lookup(&self, name: &str) -> Option<&SymbolEntry> {
        let mut scope_id = Some(self.current);
        while let Some(id) = scope_id {
            if let Some(entry) = self.scopes[id].get(name) {
                return Some(entry);
            }
            scope_id = self.scopes[id].parent;
        }
        None
    }

    /// Look up `name` only within the global (root) scope, used for the
    /// whole-program checks in spec §4.10/§4.11.
    pub fn lookup_global(&self, name: &str) -> Option<&SymbolEntry> {
        self.scopes[self.root()].get(name)
    }

    /// Deterministic ordered snapshot of every symbol declared directly in
    /// `scope_id` (not its children).
    pub fn all_symbols(&self, scope_id: ScopeId) -> Vec<&SymbolEntry> {
        self.scopes[scope_id].symbols().collect()
    }

    /// All declared functions in the root scope, for the "every declared
    /// function is defined" whole-program check.
    pub fn root_functions(&self) -> impl Iterator<Item = &SymbolEntry> {
        self.scopes[self.root()]
            .symbols()
            .filter(|e| e.is_function())
    }
}

#[cfg(test)]
mod symbol_tests {
    use super::*;

    #[test]
    fn lookup_walks_parent_chain() {
        let mut table = SymbolTable::new();
        table
            .declare_variable("x", Type::INT, false, None)
            .expect("declare global x");
        table.open_child();
        assert!(table.lookup("x").is_some());
        table
            .declare_variable("y", Type::CHAR, false, None)
            .expect("declare local y");
        assert!(table.lookup("y").is_some());
        table.close_child();
        assert!(table.lookup("y").is_none());
    }

    #[test]
    fn duplicate_declaration_in_same_scope_errors() {
        let mut table = SymbolTable::new();
        table.declare_variable("x", Type::INT, false, None).unwrap();
        let err = table.declare_variable("x", Type::INT, false, None).unwrap_err();
        assert_eq!(err, SymbolTableError::AlreadyDeclared("x".into()));
    }

    #[test]
    fn shadowing_in_child_scope_is_allowed() {
        let mut table = SymbolTable::new();
        table.declare_variable("x", Type::INT, false, None).unwrap();
        table.open_child();
        table.declare_variable("x", Type::CHAR, false, None).unwrap();
        match table.lookup("x") {
            Some(SymbolEntry::Variable { ty, .. }) => assert_eq!(*ty, Type::CHAR),
            _ => panic!("expected shadowed variable"),
        }
    }

    #[test]
    fn identical_redeclaration_of_function_is_allowed() {
        let mut table = SymbolTable::new();
        let sig = FunctionSignature::new(Type::INT, vec![]);
        table
            .declare_function("main", sig.clone(), false)
            .unwrap();
        table.declare_function("main", sig, true).unwrap();
        match table.lookup("main") {
            Some(SymbolEntry::Function { defined, .. }) => assert!(*defined),
            _ => panic!("expected function"),
        }
    }

    #[test]
    fn conflicting_signature_redeclaration_errors() {
        let mut table = SymbolTable::new();
        table
            .declare_function("f", FunctionSignature::new(Type::INT, vec![]), false)
            .unwrap();
        let err = table
            .declare_function("f", FunctionSignature::new(Type::CHAR, vec![]), false)
            .unwrap_err();
        assert_eq!(err, SymbolTableError::ConflictingSignature("f".into()));
    }

    #[test]
    fn redefining_a_defined_function_errors() {
        let mut table = SymbolTable::new();
        let sig = FunctionSignature::new(Type::INT, vec![]);
        table.declare_function("f", sig.clone(), true).unwrap();
        let err = table.declare_function("f", sig, true).unwrap_err();
        assert_eq!(err, SymbolTableError::AlreadyDefined("f".into()));
    }

    #[test]
    fn closed_child_scopes_stay_reachable_from_parent() {
        let mut table = SymbolTable::new();
        let child = table.open_child();
        table.declare_variable("x", Type::INT, false, None).unwrap();
        table.close_child();
        assert_eq!(table.scope(table.root()).children, vec![child]);
        assert_eq!(table.all_symbols(child).len(), 1);
    }

    #[test]
    fn set_offset_fills_in_a_variables_activation_record_slot() {
        let mut table = SymbolTable::new();
        table.declare_variable("x", Type::INT, false, None).unwrap();
        table.set_offset(table.root(), "x", -4);
        match table.lookup("x") {
            Some(SymbolEntry::Variable { offset, .. }) => assert_eq!(*offset, Some(-4)),
            _ => panic!("expected variable"),
        }
    }

    #[test]
    fn enter_child_revisits_an_already_built_scope_without_creating_one() {
        let mut table = SymbolTable::new();
        let child = table.open_child();
        table.declare_variable("x", Type::INT, false, None).unwrap();
        table.close_child();
        let scope_count_before = table.scopes.len();
        let revisited = table.enter_child(0);
        assert_eq!(revisited, child);
        assert_eq!(table.scopes.len(), scope_count_before);
        assert!(table.lookup("x").is_some());
    }

    #[test]
    fn set_function_label_fills_in_a_functions_assembly_label() {
        let mut table = SymbolTable::new();
        let sig = FunctionSignature::new(Type::INT, vec![]);
        table.declare_function("main", sig, true).unwrap();
        table.set_function_label(table.root(), "main", "F_main".to_string());
        match table.lookup("main") {
            Some(SymbolEntry::Function { label, .. }) => assert_eq!(label.as_deref(), Some("F_main")),
            _ => panic!("expected function"),
        }
    }
}
