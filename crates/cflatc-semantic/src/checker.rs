//! The syntax-directed semantic checker (spec §4.11).
//!
//! Dispatches on [`NonTerminalKind`] rather than on the node's raw name —
//! each node is classified exactly once, then every rule matches over the
//! closed enum. Expression rules return the child's type (and l-value-ness)
//! to the parent instead of re-reading it back out of the side-table,
//! which only exists so the CLI can dump it afterwards.

use cflatc_core::{FunctionSignature, SymbolTable, Type};
use cflatc_parser::Node;

use crate::error::Error;
use crate::literals::{parse_c_integer, process_escapes};
use crate::names::*;
use crate::shapes::{flatten_comma, flatten_two, lexeme_text, only_child};
use crate::tree::{id_of, Attributes, SemanticTree};

/// What an expression rule hands back to its parent.
#[derive(Debug)]
struct ExprInfo {
    ty: Type,
    is_lvalue: bool,
    is_string_literal: bool,
    string_literal_length: Option<u32>,
}

impl ExprInfo {
    fn rvalue(ty: Type) -> Self {
        Self {
            ty,
            is_lvalue: false,
            is_string_literal: false,
            string_literal_length: None,
        }
    }

    fn lvalue(ty: Type) -> Self {
        Self {
            ty,
            is_lvalue: true,
            is_string_literal: false,
            string_literal_length: None,
        }
    }
}

pub struct SemanticChecker {
    symbols: SymbolTable,
    tree: SemanticTree,
    loop_depth: usize,
    current_return: Vec<Type>,
}

impl SemanticChecker {
    /// Run semantic analysis over a full `prijevodna_jedinica` tree.
    /// Single-shot fatal: the first violation aborts (spec §4.11's
    /// "Failure semantics").
    pub fn check(root: &Node) -> Result<(SymbolTable, SemanticTree), Error> {
        let mut checker = SemanticChecker {
            symbols: SymbolTable::new(),
            tree: SemanticTree::new(),
            loop_depth: 0,
            current_return: Vec::new(),
        };
        checker.check_translation_unit(root)?;
        checker.check_program_level()?;
        Ok((checker.symbols, checker.tree))
    }

    fn check_program_level(&self) -> Result<(), Error> {
        match self.symbols.lookup_global(MAIN) {
            Some(cflatc_core::SymbolEntry::Function { signature, defined, .. })
                if signature.ret == Type::INT && signature.params.is_empty() =>
            {
                if !*defined {
                    return Err(Error::Semantic {
                        production: format!("<{MAIN}>"),
                        message: "function 'main' is declared but never defined".to_string(),
                    });
                }
            }
            _ => {
                return Err(Error::Semantic {
                    production: format!("<{MAIN}>"),
                    message: "program must define exactly one function 'main' with signature int()".to_string(),
                });
            }
        }
        for entry in self.symbols.root_functions() {
            if let cflatc_core::SymbolEntry::Function { name, defined, .. } = entry {
                if !*defined {
                    return Err(Error::Semantic {
                        production: format!("<{name}>"),
                        message: format!("function '{name}' is declared but never defined"),
                    });
                }
            }
        }
        Ok(())
    }

    // ---- external declarations -------------------------------------

    fn check_translation_unit(&mut self, node: &Node) -> Result<(), Error> {
        let id = id_of(node);
        for decl in flatten_two(node) {
            self.check_external_declaration(decl)?;
        }
        self.tree.set(id, Attributes::default());
        Ok(())
    }

    fn check_external_declaration(&mut self, node: &Node) -> Result<(), Error> {
        let id = id_of(node);
        let inner = only_child(node);
        match NonTerminalKind::from_name(inner.name()) {
            Some(NonTerminalKind::DefinicijaFunkcije) => self.check_function_definition(inner)?,
            Some(NonTerminalKind::Deklaracija) => self.check_declaration(inner)?,
            _ => return Err(Error::at(node, "unrecognised external declaration")),
        }
        self.tree.set(id, Attributes::default());
        Ok(())
    }

    fn check_function_definition(&mut self, node: &Node) -> Result<(), Error> {
        let id = id_of(node);
        let children = node.children();
        let ret_ty = self.check_ime_tipa(&children[0])?;
        let name_node = &children[1];
        let name = lexeme_text(name_node);

        let (params, body): (Vec<(String, Type)>, &Node) = if children[3].name() == KR_VOID {
            // ime_tipa IDN L_ZAGRADA KR_VOID D_ZAGRADA slozena_naredba
            (Vec::new(), &children[5])
        } else {
            // ime_tipa IDN L_ZAGRADA lista_parametara D_ZAGRADA slozena_naredba
            (self.check_lista_parametara(&children[3])?, &children[5])
        };

        let signature = FunctionSignature::new(ret_ty.clone(), params.iter().map(|(_, t)| t.clone()).collect());
        self.symbols
            .declare_function(&name, signature.clone(), true)
            .map_err(|e| Error::at(node, e.to_string()))?;

        self.symbols.open_child();
        for (pname, pty) in &params {
            self.symbols
                .declare_variable(pname, pty.clone(), false, None)
                .map_err(|e| Error::at(node, e.to_string()))?;
        }
        self.current_return.push(ret_ty);
        self.check_function_body(body)?;
        self.current_return.pop();
        self.symbols.close_child();

        self.tree.set(id, Attributes::default());
        Ok(())
    }

    /// The function body's own `slozena_naredba` does not open another
    /// scope on top of the parameter scope (spec §4.11: "function
    /// parameters live in the outer scope of the function body").
    fn check_function_body(&mut self, node: &Node) -> Result<(), Error> {
        let id = id_of(node);
        let children = node.children();
        let list = &children[1];
        for stmt in flatten_two(list) {
            self.check_naredba(stmt)?;
        }
        self.tree.set(id, Attributes::default());
        Ok(())
    }

    fn check_lista_parametara(&mut self, node: &Node) -> Result<Vec<(String, Type)>, Error> {
        let id = id_of(node);
        let mut params = Vec::new();
        for decl in flatten_comma(node) {
            let children = decl.children();
            let ty = self.check_ime_tipa(&children[0])?;
            let name = lexeme_text(&children[1]);
            params.push((name, ty));
        }
        self.tree.set(id, Attributes::default());
        Ok(params)
    }

    fn check_ime_tipa(&mut self, node: &Node) -> Result<Type, Error> {
        let id = id_of(node);
        let children = node.children();
        let ty = if children.len() == 2 {
            let base = self.check_ime_tipa(&children[1])?;
            Type::constant(base)
        } else {
            match children[0].name() {
                KR_INT => Type::INT,
                KR_CHAR => Type::CHAR,
                KR_VOID => Type::VOID,
                other => return Err(Error::at(node, format!("unrecognised type specifier '{other}'"))),
            }
        };
        if !ty.is_well_formed() {
            return Err(Error::at(node, format!("ill-formed type '{ty}'")));
        }
        self.tree.set(id, Attributes::with_type(ty.clone()));
        Ok(ty)
    }

    // ---- declarations -------------------------------------------------

    fn check_declaration(&mut self, node: &Node) -> Result<(), Error> {
        let id = id_of(node);
        let children = node.children();
        let base_ty = self.check_ime_tipa(&children[0])?;
        let declarator = &children[1];

        let (name, declared_ty, declared_len) = self.check_declarator(declarator, &base_ty)?;

        let final_len = if children.len() == 5 {
            let init_info = self.check_inicijalizator(&children[3])?;
            if let Some(lit_len) = init_info.string_literal_length {
                let inferred = lit_len + 1;
                if let Some(declared) = declared_len {
                    if inferred > declared {
                        return Err(Error::at(
                            node,
                            format!("string literal of length {inferred} does not fit declared array length {declared}"),
                        ));
                    }
                    Some(declared)
                } else {
                    Some(inferred)
                }
            } else {
                if !Type::can_assign(&init_info.ty, &declared_ty) {
                    return Err(Error::at(
                        node,
                        format!("cannot initialise '{declared_ty}' from '{}'", init_info.ty),
                    ));
                }
                declared_len
            }
        } else {
            declared_len
        };

        self.symbols
            .declare_variable(&name, declared_ty.clone(), declared_ty.is_const(), final_len)
            .map_err(|e| Error::at(node, e.to_string()))?;

        self.tree.set(
            id,
            Attributes {
                ty: Some(declared_ty),
                element_count: final_len,
                ..Attributes::default()
            },
        );
        Ok(())
    }

    /// Returns (name, full declared type, declared array length if fixed).
    fn check_declarator(&mut self, node: &Node, base_ty: &Type) -> Result<(String, Type, Option<u32>), Error> {
        let id = id_of(node);
        let children = node.children();
        let name = lexeme_text(&children[0]);
        let (ty, len) = match children.len() {
            1 => (base_ty.clone(), None),
            3 => (Type::array(base_ty.clone()), None),
            4 => {
                let lexeme = lexeme_text(&children[2]);
                let n: u32 = lexeme
                    .parse()
                    .map_err(|_| Error::at(node, format!("invalid array length literal '{lexeme}'")))?;
                (Type::array(base_ty.clone()), Some(n))
            }
            _ => return Err(Error::at(node, "unrecognised declarator shape")),
        };
        if !ty.is_well_formed() {
            return Err(Error::at(node, format!("ill-formed type '{ty}'")));
        }
        self.tree.set(
            id,
            Attributes {
                ty: Some(ty.clone()),
                identifier: Some(name.clone()),
                element_count: len,
                ..Attributes::default()
            },
        );
        Ok((name, ty, len))
    }

    fn check_inicijalizator(&mut self, node: &Node) -> Result<ExprInfo, Error> {
        let id = id_of(node);
        let child = only_child(node);
        let info = if child.name() == NIZ_ZNAKOVA {
            self.check_string_literal(child)?
        } else {
            self.check_izraz_pridruzivanja(child)?
        };
        self.tree.set(
            id,
            Attributes {
                ty: Some(info.ty.clone()),
                element_count: info.string_literal_length,
                ..Attributes::default()
            },
        );
        Ok(info)
    }

    // ---- statements -----------------------------------------------------

    fn check_naredba(&mut self, node: &Node) -> Result<(), Error> {
        let id = id_of(node);
        let inner = only_child(node);
        match NonTerminalKind::from_name(inner.name()) {
            Some(NonTerminalKind::SlozenaNaredba) => self.check_compound(inner)?,
            Some(NonTerminalKind::IzrazNaredba) => self.check_izraz_naredba(inner)?,
            Some(NonTerminalKind::NaredbaGrananja) => self.check_naredba_grananja(inner)?,
            Some(NonTerminalKind::NaredbaPetlje) => self.check_naredba_petlje(inner)?,
            Some(NonTerminalKind::NaredbaSkoka) => self.check_naredba_skoka(inner)?,
            Some(NonTerminalKind::Deklaracija) => self.check_declaration(inner)?,
            _ => return Err(Error::at(node, "unrecognised statement")),
        }
        self.tree.set(id, Attributes::default());
        Ok(())
    }

    fn check_compound(&mut self, node: &Node) -> Result<(), Error> {
        let id = id_of(node);
        let children = node.children();
        self.symbols.open_child();
        for stmt in flatten_two(&children[1]) {
            self.check_naredba(stmt)?;
        }
        self.symbols.close_child();
        self.tree.set(id, Attributes::default());
        Ok(())
    }

    fn check_izraz_naredba(&mut self, node: &Node) -> Result<(), Error> {
        let id = id_of(node);
        let children = node.children();
        if children.len() == 2 {
            self.check_izraz(&children[0])?;
        }
        self.tree.set(id, Attributes::default());
        Ok(())
    }

    fn check_naredba_grananja(&mut self, node: &Node) -> Result<(), Error> {
        let id = id_of(node);
        let children = node.children();
        let cond = self.check_izraz(&children[2])?;
        if !cond.ty.is_int_convertible() {
            return Err(Error::at(node, "if condition must be int-convertible"));
        }
        self.check_naredba(&children[4])?;
        if children.len() == 7 {
            self.check_naredba(&children[6])?;
        }
        self.tree.set(id, Attributes::default());
        Ok(())
    }

    fn check_naredba_petlje(&mut self, node: &Node) -> Result<(), Error> {
        let id = id_of(node);
        let children = node.children();
        match children[0].name() {
            KR_WHILE => {
                let cond = self.check_izraz(&children[2])?;
                if !cond.ty.is_int_convertible() {
                    return Err(Error::at(node, "while condition must be int-convertible"));
                }
                self.loop_depth += 1;
                self.check_naredba(&children[4])?;
                self.loop_depth -= 1;
            }
            KR_DO => {
                self.loop_depth += 1;
                self.check_naredba(&children[1])?;
                self.loop_depth -= 1;
                let cond = self.check_izraz(&children[4])?;
                if !cond.ty.is_int_convertible() {
                    return Err(Error::at(node, "do-while condition must be int-convertible"));
                }
            }
            KR_FOR => {
                self.check_izraz_naredba(&children[2])?;
                let cond_stmt = &children[3];
                if cond_stmt.children().len() == 2 {
                    let cond = self.check_izraz(&cond_stmt.children()[0])?;
                    if !cond.ty.is_int_convertible() {
                        return Err(Error::at(node, "for condition must be int-convertible"));
                    }
                }
                let (step, body) = if children.len() == 7 {
                    (Some(&children[4]), &children[6])
                } else {
                    (None, &children[5])
                };
                if let Some(step) = step {
                    self.check_izraz(step)?;
                }
                self.loop_depth += 1;
                self.check_naredba(body)?;
                self.loop_depth -= 1;
            }
            other => return Err(Error::at(node, format!("unrecognised loop statement '{other}'"))),
        }
        self.tree.set(id, Attributes::default());
        Ok(())
    }

    fn check_naredba_skoka(&mut self, node: &Node) -> Result<(), Error> {
        let id = id_of(node);
        let children = node.children();
        match children[0].name() {
            KR_BREAK | KR_CONTINUE => {
                if self.loop_depth == 0 {
                    let what = if children[0].name() == KR_BREAK { "break" } else { "continue" };
                    return Err(Error::at(node, format!("'{what}' outside a loop context")));
                }
            }
            KR_RETURN => {
                let expected = self
                    .current_return
                    .last()
                    .cloned()
                    .ok_or_else(|| Error::at(node, "'return' outside a function"))?;
                if children.len() == 3 {
                    let value = self.check_izraz(&children[1])?;
                    if expected.is_void() {
                        return Err(Error::at(node, "'return' with a value in a void function"));
                    }
                    if !Type::can_assign(&value.ty, &expected) {
                        return Err(Error::at(
                            node,
                            format!("cannot return '{}' from a function returning '{expected}'", value.ty),
                        ));
                    }
                } else if !expected.is_void() {
                    return Err(Error::at(node, format!("'return' with no value in a function returning '{expected}'")));
                }
            }
            other => return Err(Error::at(node, format!("unrecognised jump statement '{other}'"))),
        }
        self.tree.set(id, Attributes::default());
        Ok(())
    }

    // ---- expressions ------------------------------------------------

    fn check_izraz(&mut self, node: &Node) -> Result<ExprInfo, Error> {
        let id = id_of(node);
        let children = node.children();
        let info = if children.len() == 1 {
            self.check_izraz_pridruzivanja(&children[0])?
        } else {
            self.check_izraz(&children[0])?;
            self.check_izraz_pridruzivanja(&children[2])?
        };
        self.tree.set(id, flat_attrs(&info));
        Ok(info)
    }

    fn check_izraz_pridruzivanja(&mut self, node: &Node) -> Result<ExprInfo, Error> {
        let id = id_of(node);
        let children = node.children();
        let info = if children.len() == 1 {
            self.check_izraz_ili(&children[0])?
        } else {
            let lhs = self.check_postfix_izraz(&children[0])?;
            let rhs = self.check_izraz_pridruzivanja(&children[2])?;
            if !lhs.is_lvalue || lhs.ty.is_const() {
                return Err(Error::at(node, "left side of assignment must be a modifiable l-value"));
            }
            if !Type::can_assign(&rhs.ty, &lhs.ty) {
                return Err(Error::at(node, format!("cannot assign '{}' to '{}'", rhs.ty, lhs.ty)));
            }
            ExprInfo::rvalue(lhs.ty)
        };
        self.tree.set(id, flat_attrs(&info));
        Ok(info)
    }

    fn check_izraz_ili(&mut self, node: &Node) -> Result<ExprInfo, Error> {
        self.check_logical_binary(node, Self::check_izraz_i)
    }

    fn check_izraz_i(&mut self, node: &Node) -> Result<ExprInfo, Error> {
        self.check_logical_binary(node, Self::check_izraz_bit_ili)
    }

    fn check_izraz_bit_ili(&mut self, node: &Node) -> Result<ExprInfo, Error> {
        self.check_logical_binary(node, Self::check_izraz_bit_xor)
    }

    fn check_izraz_bit_xor(&mut self, node: &Node) -> Result<ExprInfo, Error> {
        self.check_logical_binary(node, Self::check_izraz_bit_i)
    }

    fn check_izraz_bit_i(&mut self, node: &Node) -> Result<ExprInfo, Error> {
        self.check_logical_binary(node, Self::check_izraz_jednakosti)
    }

    fn check_izraz_jednakosti(&mut self, node: &Node) -> Result<ExprInfo, Error> {
        self.check_logical_binary(node, Self::check_izraz_odnosa)
    }

    fn check_izraz_odnosa(&mut self, node: &Node) -> Result<ExprInfo, Error> {
        self.check_logical_binary(node, Self::check_izraz_zbrajanja)
    }

    fn check_izraz_zbrajanja(&mut self, node: &Node) -> Result<ExprInfo, Error> {
        self.check_logical_binary(node, Self::check_izraz_mnozenja)
    }

    fn check_izraz_mnozenja(&mut self, node: &Node) -> Result<ExprInfo, Error> {
        self.check_logical_binary(node, Self::check_izraz_castanja)
    }

    /// Every left-recursive binary-operator chain (`ili`, `i`, `bit_ili`,
    /// `bit_xor`, `bit_i`, `jednakosti`, `odnosa`, `zbrajanja`, `mnozenja`)
    /// shares the same rule: a single child passes through unchanged; a
    /// three-child production requires both operands int-convertible and
    /// yields int (spec §4.11's arithmeticResult).
    fn check_logical_binary(
        &mut self,
        node: &Node,
        next: fn(&mut Self, &Node) -> Result<ExprInfo, Error>,
    ) -> Result<ExprInfo, Error> {
        let id = id_of(node);
        let children = node.children();
        let info = if children.len() == 1 {
            next(self, &children[0])?
        } else {
            let left = next(self, &children[0])?;
            let right = next(self, &children[2])?;
            let result = Type::arithmetic_result(&left.ty, &right.ty).ok_or_else(|| {
                Error::at(node, format!("binary operator requires int-convertible operands, got '{}' and '{}'", left.ty, right.ty))
            })?;
            ExprInfo::rvalue(result)
        };
        self.tree.set(id, flat_attrs(&info));
        Ok(info)
    }

    fn check_izraz_castanja(&mut self, node: &Node) -> Result<ExprInfo, Error> {
        let id = id_of(node);
        let children = node.children();
        let info = if children.len() == 1 {
            self.check_unarni_izraz(&children[0])?
        } else {
            let target = self.check_ime_tipa(&children[1])?;
            let operand = self.check_izraz_castanja(&children[3])?;
            if !Type::can_cast(&operand.ty, &target) {
                return Err(Error::at(node, format!("cannot cast '{}' to '{target}'", operand.ty)));
            }
            ExprInfo::rvalue(target)
        };
        self.tree.set(id, flat_attrs(&info));
        Ok(info)
    }

    fn check_unarni_izraz(&mut self, node: &Node) -> Result<ExprInfo, Error> {
        let id = id_of(node);
        let children = node.children();
        let info = match children.len() {
            1 => self.check_postfix_izraz(&children[0])?,
            2 if children[0].name() == OP_INC || children[0].name() == OP_DEC => {
                let operand = self.check_unarni_izraz(&children[1])?;
                self.require_modifiable_lvalue(node, &operand)?;
                if !operand.ty.is_int_convertible() {
                    return Err(Error::at(node, "prefix ++/-- requires an int-convertible operand"));
                }
                ExprInfo::rvalue(Type::INT)
            }
            2 => {
                let operand = self.check_izraz_castanja(&children[1])?;
                if !operand.ty.is_int_convertible() {
                    return Err(Error::at(node, "unary operator requires an int-convertible operand"));
                }
                ExprInfo::rvalue(Type::INT)
            }
            _ => return Err(Error::at(node, "unrecognised unary expression")),
        };
        self.tree.set(id, flat_attrs(&info));
        Ok(info)
    }

    fn require_modifiable_lvalue(&self, node: &Node, info: &ExprInfo) -> Result<(), Error> {
        if !info.is_lvalue || info.ty.is_const() {
            return Err(Error::at(node, "operand must be a modifiable l-value"));
        }
        Ok(())
    }

    fn check_postfix_izraz(&mut self, node: &Node) -> Result<ExprInfo, Error> {
        let id = id_of(node);
        let children = node.children();
        let info = match children.len() {
            1 => self.check_primarni_izraz(&children[0])?,
            2 => {
                let operand = self.check_postfix_izraz(&children[0])?;
                self.require_modifiable_lvalue(node, &operand)?;
                if !operand.ty.is_int_convertible() {
                    return Err(Error::at(node, "postfix ++/-- requires an int-convertible operand"));
                }
                ExprInfo::rvalue(Type::INT)
            }
            4 if children[1].name() == L_UGL_ZAGRADA => {
                let array = self.check_postfix_izraz(&children[0])?;
                let index = self.check_izraz(&children[2])?;
                let element = array
                    .ty
                    .array_element()
                    .ok_or_else(|| Error::at(node, format!("'{}' is not an array and cannot be indexed", array.ty)))?
                    .clone();
                if !index.ty.is_int_convertible() {
                    return Err(Error::at(node, "array index must be int-convertible"));
                }
                if element.is_const() {
                    ExprInfo::rvalue(element)
                } else {
                    ExprInfo::lvalue(element)
                }
            }
            3 => {
                // postfix_izraz L_ZAGRADA D_ZAGRADA -- zero-argument call
                self.check_call(node, &children[0], &[])?
            }
            4 => {
                // postfix_izraz L_ZAGRADA lista_argumenata D_ZAGRADA
                let args = self.check_lista_argumenata(&children[2])?;
                self.check_call(node, &children[0], &args)?
            }
            _ => return Err(Error::at(node, "unrecognised postfix expression")),
        };
        self.tree.set(id, flat_attrs(&info));
        Ok(info)
    }

    fn check_call(&mut self, node: &Node, callee: &Node, args: &[Type]) -> Result<ExprInfo, Error> {
        let callee_info = self.check_postfix_izraz(callee)?;
        let (ret, params) = callee_info
            .ty
            .function_signature()
            .ok_or_else(|| Error::at(node, format!("'{}' is not callable", callee_info.ty)))?;
        if params.len() != args.len() {
            return Err(Error::at(
                node,
                format!("function expects {} argument(s), got {}", params.len(), args.len()),
            ));
        }
        for (param, arg) in params.iter().zip(args.iter()) {
            if !Type::can_assign(arg, param) {
                return Err(Error::at(node, format!("argument of type '{arg}' is not assignable to parameter of type '{param}'")));
            }
        }
        Ok(ExprInfo::rvalue(ret.clone()))
    }

    fn check_lista_argumenata(&mut self, node: &Node) -> Result<Vec<Type>, Error> {
        let id = id_of(node);
        let mut args = Vec::new();
        for item in flatten_comma(node) {
            args.push(self.check_izraz_pridruzivanja(item)?.ty);
        }
        self.tree.set(id, Attributes::default());
        Ok(args)
    }

    fn check_primarni_izraz(&mut self, node: &Node) -> Result<ExprInfo, Error> {
        let id = id_of(node);
        let children = node.children();
        let info = if children.len() == 3 {
            self.check_izraz(&children[1])?
        } else {
            let leaf = &children[0];
            match leaf.name() {
                IDN => {
                    let name = lexeme_text(leaf);
                    let entry = self
                        .symbols
                        .lookup(&name)
                        .ok_or_else(|| Error::at(node, format!("'{name}' used before declaration")))?;
                    let ty = entry.ty();
                    let is_lvalue = entry.is_variable() && !ty.is_array() && !ty.is_function();
                    if is_lvalue {
                        ExprInfo::lvalue(ty)
                    } else {
                        ExprInfo::rvalue(ty)
                    }
                }
                BROJ => ExprInfo::rvalue(self.check_integer_literal(node, &lexeme_text(leaf))?),
                ZNAK => {
                    self.check_character_literal(node, &lexeme_text(leaf))?;
                    ExprInfo::rvalue(Type::CHAR)
                }
                NIZ_ZNAKOVA => self.check_string_literal(leaf)?,
                other => return Err(Error::at(node, format!("unrecognised primary expression '{other}'"))),
            }
        };
        self.tree.set(id, flat_attrs(&info));
        Ok(info)
    }

    fn check_integer_literal(&self, node: &Node, lexeme: &str) -> Result<Type, Error> {
        let value = parse_c_integer(lexeme)
            .ok_or_else(|| Error::at(node, format!("malformed integer literal '{lexeme}'")))?;
        if value < i64::from(i32::MIN) || value > i64::from(i32::MAX) {
            return Err(Error::at(node, format!("integer literal '{lexeme}' does not fit a 32-bit signed integer")));
        }
        Ok(Type::INT)
    }

    fn check_character_literal(&self, node: &Node, lexeme: &str) -> Result<(), Error> {
        let inner = lexeme.trim_start_matches('\'').trim_end_matches('\'');
        let chars = process_escapes(inner)
            .map_err(|msg| Error::at(node, msg))?;
        if chars.len() != 1 {
            return Err(Error::at(node, format!("character literal '{lexeme}' must denote exactly one character")));
        }
        Ok(())
    }

    fn check_string_literal(&mut self, leaf: &Node) -> Result<ExprInfo, Error> {
        let id = id_of(leaf);
        let lexeme = lexeme_text(leaf);
        let inner = lexeme.trim_start_matches('"').trim_end_matches('"');
        let chars = process_escapes(inner).map_err(|msg| Error::at(leaf, msg))?;
        let len = chars.len() as u32;
        let ty = Type::array(Type::constant(Type::CHAR));
        self.tree.set(
            id,
            Attributes {
                ty: Some(ty.clone()),
                is_string_literal: true,
                string_literal_length: Some(len),
                ..Attributes::default()
            },
        );
        Ok(ExprInfo {
            ty,
            is_lvalue: false,
            is_string_literal: true,
            string_literal_length: Some(len),
        })
    }
}

fn flat_attrs(info: &ExprInfo) -> Attributes {
    Attributes {
        ty: Some(info.ty.clone()),
        is_lvalue: info.is_lvalue,
        is_string_literal: info.is_string_literal,
        string_literal_length: info.string_literal_length,
        ..Attributes::default()
    }
}

#[cfg(test)]
mod checker_tests {
    use super::*;
    use cflatc_core::Position;

    fn term(name: &str, lexeme: &str) -> Node {
        Node::Terminal {
            name: name.to_string(),
            position: Position::new(1, 1),
            lexeme: lexeme.to_string(),
        }
    }

    fn nt(name: &str, children: Vec<Node>) -> Node {
        Node::NonTerminal {
            name: name.to_string(),
            children,
        }
    }

    /// `int main(void) { return 0; }`
    fn minimal_main() -> Node {
        let ime_tipa_int = nt("ime_tipa", vec![term(KR_INT, "int")]);
        let ret_stmt = nt(
            "naredba_skoka",
            vec![term(KR_RETURN, "return"), nt("izraz", vec![nt("izraz_pridruzivanja", vec![nt("izraz_ili", vec![nt("izraz_i", vec![nt("izraz_bit_ili", vec![nt("izraz_bit_xor", vec![nt("izraz_bit_i", vec![nt("izraz_jednakosti", vec![nt("izraz_odnosa", vec![nt("izraz_zbrajanja", vec![nt("izraz_mnozenja", vec![nt("izraz_castanja", vec![nt("unarni_izraz", vec![nt("postfix_izraz", vec![nt("primarni_izraz", vec![term(BROJ, "0")])])])])])])])])])])])])])])]), term(TOCKAZAREZ, ";")],
        );
        let naredba = nt("naredba", vec![nt("naredba_skoka", ret_stmt.children().to_vec())]);
        let body = nt(
            "slozena_naredba",
            vec![
                term(L_VIT_ZAGRADA, "{"),
                nt("lista_naredbi", vec![nt("lista_naredbi", vec![]), naredba]),
                term(D_VIT_ZAGRADA, "}"),
            ],
        );
        let func_def = nt(
            "definicija_funkcije",
            vec![
                ime_tipa_int,
                term(IDN, "main"),
                term(L_ZAGRADA, "("),
                term(KR_VOID, "void"),
                term(D_ZAGRADA, ")"),
                body,
            ],
        );
        let ext_decl = nt("vanjska_deklaracija", vec![func_def]);
        nt("prijevodna_jedinica", vec![ext_decl])
    }

    #[test]
    fn minimal_main_passes_and_is_recorded_as_defined() {
        let tree = minimal_main();
        let (symbols, _) = SemanticChecker::check(&tree).expect("minimal main should be accepted");
        match symbols.lookup_global("main") {
            Some(cflatc_core::SymbolEntry::Function { defined, .. }) => assert!(*defined),
            _ => panic!("expected a function symbol for main"),
        }
    }

    #[test]
    fn missing_main_is_a_program_level_error() {
        let ime_tipa_int = nt("ime_tipa", vec![term(KR_INT, "int")]);
        let body = nt(
            "slozena_naredba",
            vec![term(L_VIT_ZAGRADA, "{"), nt("lista_naredbi", vec![]), term(D_VIT_ZAGRADA, "}")],
        );
        let func_def = nt(
            "definicija_funkcije",
            vec![ime_tipa_int, term(IDN, "helper"), term(L_ZAGRADA, "("), term(KR_VOID, "void"), term(D_ZAGRADA, ")"), body],
        );
        let tree = nt("prijevodna_jedinica", vec![nt("vanjska_deklaracija", vec![func_def])]);
        let err = SemanticChecker::check(&tree).unwrap_err();
        assert!(matches!(err, Error::Semantic { .. }));
    }

    #[test]
    fn break_outside_loop_is_rejected() {
        let ime_tipa_int = nt("ime_tipa", vec![term(KR_INT, "int")]);
        let break_stmt = nt("naredba_skoka", vec![term(KR_BREAK, "break"), term(TOCKAZAREZ, ";")]);
        let naredba = nt("naredba", vec![break_stmt]);
        let body = nt(
            "slozena_naredba",
            vec![
                term(L_VIT_ZAGRADA, "{"),
                nt("lista_naredbi", vec![nt("lista_naredbi", vec![]), naredba]),
                term(D_VIT_ZAGRADA, "}"),
            ],
        );
        let func_def = nt(
            "definicija_funkcije",
            vec![ime_tipa_int, term(IDN, "main"), term(L_ZAGRADA, "("), term(KR_VOID, "void"), term(D_ZAGRADA, ")"), body],
        );
        let tree = nt("prijevodna_jedinica", vec![nt("vanjska_deklaracija", vec![func_def])]);
        let err = SemanticChecker::check(&tree).unwrap_err();
        match err {
            Error::Semantic { production, message } => {
                assert!(production.contains("naredba_skoka"));
                assert!(message.contains("outside a loop"));
            }
        }
    }

    #[test]
    fn use_before_declaration_is_rejected() {
        let primary = nt("primarni_izraz", vec![term(IDN, "x")]);
        let err = {
            let mut checker = SemanticChecker {
                symbols: SymbolTable::new(),
                tree: SemanticTree::new(),
                loop_depth: 0,
                current_return: Vec::new(),
            };
            checker.check_primarni_izraz(&primary).unwrap_err()
        };
        match err {
            Error::Semantic { production, .. } => assert!(production.contains("IDN(1,x)")),
        }
    }

    #[test]
    fn integer_literal_out_of_range_is_rejected() {
        let checker = SemanticChecker {
            symbols: SymbolTable::new(),
            tree: SemanticTree::new(),
            loop_depth: 0,
            current_return: Vec::new(),
        };
        let primary = nt("primarni_izraz", vec![term(BROJ, "9999999999")]);
        let err = checker.check_integer_literal(&primary, "9999999999").unwrap_err();
        assert!(matches!(err, Error::Semantic { .. }));
    }

    #[test]
    fn string_literal_length_counts_post_escape_characters() {
        let mut checker = SemanticChecker {
            symbols: SymbolTable::new(),
            tree: SemanticTree::new(),
            loop_depth: 0,
            current_return: Vec::new(),
        };
        let leaf = term(NIZ_ZNAKOVA, "\"a\\nb\"");
        let info = checker.check_string_literal(&leaf).unwrap();
        assert_eq!(info.string_literal_length, Some(3));
    }
}
