//! Recursive-descent code generation over an already-checked parse tree
//! (spec §4.12). Each `gen_*` method mirrors the semantic checker's rule
//! of the same shape, but lowers to assembly text instead of validating
//! types — the tree has already been accepted, so every shape this module
//! doesn't recognise is an internal error, not a diagnostic.

use cflatc_core::{SymbolEntry, SymbolTable};
use cflatc_parser::Node;
use cflatc_semantic::literals::{parse_c_integer, process_escapes};
use cflatc_semantic::names::*;
use cflatc_semantic::shapes::{flatten_comma, flatten_two, lexeme_text, only_child};

use crate::error::Error;
use crate::frame;
use crate::isa::{op, reg};

pub struct CodeGenerator {
    symbols: SymbolTable,
    code: Vec<String>,
    data: Vec<String>,
    label_counter: u32,
    string_counter: u32,
    string_pool: Vec<(String, Vec<char>)>,
    loop_labels: Vec<(String, String)>,
    epilogue_label: Option<String>,
    /// Mirrors the checker's `open_child` call order: `child_cursor[depth]`
    /// is the index of the next not-yet-entered child of the scope at that
    /// depth, so `enter_scope`/`leave_scope` replay exactly the scopes
    /// `SemanticChecker` built without re-declaring anything.
    child_cursor: Vec<usize>,
}

impl CodeGenerator {
    pub fn generate(root: &Node, symbols: SymbolTable) -> Result<(String, SymbolTable), Error> {
        let mut gen = CodeGenerator {
            symbols,
            code: Vec::new(),
            data: Vec::new(),
            label_counter: 0,
            string_counter: 0,
            string_pool: Vec::new(),
            loop_labels: Vec::new(),
            epilogue_label: None,
            child_cursor: vec![0],
        };
        gen.gen_translation_unit(root)?;

        let mut out = Vec::new();
        out.extend(gen.data);
        for (label, chars) in &gen.string_pool {
            for (i, ch) in chars.iter().chain(std::iter::once(&'\0')).enumerate() {
                if i == 0 {
                    out.push(format!("{label}: {} {}", op::WORD, *ch as u32));
                } else {
                    out.push(format!("{} {}", op::WORD, *ch as u32));
                }
            }
        }
        if !out.is_empty() {
            out.push(String::new());
        }
        out.extend(gen.code);
        Ok((out.join("\n"), gen.symbols))
    }

    // ---- scope replay ---------------------------------------------------

    fn enter_scope(&mut self) -> Result<(), Error> {
        let idx = *self
            .child_cursor
            .last()
            .ok_or_else(|| Error::internal("scope cursor underflow"))?;
        self.symbols.enter_child(idx);
        *self.child_cursor.last_mut().expect("checked above") += 1;
        self.child_cursor.push(0);
        Ok(())
    }

    fn leave_scope(&mut self) {
        self.child_cursor.pop();
        self.symbols.close_child();
    }

    // ---- emission helpers -------------------------------------------------

    fn emit(&mut self, line: impl Into<String>) {
        self.code.push(line.into());
    }

    fn label(&mut self, name: &str) {
        self.code.push(format!("{name}:"));
    }

    fn new_label(&mut self, purpose: &str) -> String {
        let id = self.label_counter;
        self.label_counter += 1;
        format!("L{id}_{purpose}")
    }

    fn push_reg(&mut self, r: &str) {
        self.emit(format!("{} {r}", op::PUSH));
    }

    fn pop_reg(&mut self, r: &str) {
        self.emit(format!("{} {r}", op::POP));
    }

    // ---- translation unit / declarations ---------------------------------

    fn gen_translation_unit(&mut self, node: &Node) -> Result<(), Error> {
        for decl in flatten_two(node) {
            self.gen_external_declaration(decl)?;
        }
        Ok(())
    }

    fn gen_external_declaration(&mut self, node: &Node) -> Result<(), Error> {
        let inner = only_child(node);
        match NonTerminalKind::from_name(inner.name()) {
            Some(NonTerminalKind::DefinicijaFunkcije) => self.gen_function_definition(inner),
            Some(NonTerminalKind::Deklaracija) => self.gen_global_declaration(inner),
            _ => Err(Error::internal("unrecognised external declaration")),
        }
    }

    fn gen_global_declaration(&mut self, node: &Node) -> Result<(), Error> {
        let children = node.children();
        let declarator = &children[1];
        let name = lexeme_text(&declarator.children()[0]);
        let words = match self.symbols.lookup_global(&name) {
            Some(SymbolEntry::Variable { element_count, .. }) => element_count.unwrap_or(1),
            _ => return Err(Error::internal(format!("'{name}' has no global symbol entry"))),
        };
        let mut values = vec![0i64; words as usize];
        if children.len() == 5 {
            let init = only_child(&children[3]);
            if init.name() == NIZ_ZNAKOVA {
                let chars = self.decode_string_literal(init)?;
                for (i, ch) in chars.iter().chain(std::iter::once(&'\0')).enumerate() {
                    if let Some(slot) = values.get_mut(i) {
                        *slot = *ch as i64;
                    }
                }
            } else if let Some(value) = self.constant_value(init) {
                values[0] = value;
            }
            // Non-constant scalar initialisers are left zero: there is no
            // loader to run arbitrary code before `main` starts.
        }
        for (i, value) in values.iter().enumerate() {
            if i == 0 {
                self.data.push(format!("G_{name}: {} {value}", op::WORD));
            } else {
                self.data.push(format!("{} {value}", op::WORD));
            }
        }
        Ok(())
    }

    /// Folds a scalar initialiser that is a bare integer/character literal,
    /// optionally unary-negated. Anything else (a binary expression, a
    /// function call, another variable) is not a compile-time constant.
    fn constant_value(&self, init: &Node) -> Option<i64> {
        let mut negate = false;
        let mut current = init;
        loop {
            if matches!(current, Node::Terminal { .. }) {
                break;
            }
            let children = current.children();
            if children.len() == 1 {
                current = &children[0];
                continue;
            }
            if NonTerminalKind::from_name(current.name()) == Some(NonTerminalKind::UnarniIzraz)
                && children.len() == 2
                && children[0].name() == MINUS
            {
                negate = !negate;
                current = &children[1];
                continue;
            }
            return None;
        }
        let value = match current.name() {
            BROJ => parse_c_integer(&lexeme_text(current))?,
            ZNAK => {
                let lexeme = lexeme_text(current);
                let inner = lexeme.trim_start_matches('\'').trim_end_matches('\'');
                i64::from(*process_escapes(inner).ok()?.first()? as u32)
            }
            _ => return None,
        };
        Some(if negate { -value } else { value })
    }

    fn gen_function_definition(&mut self, node: &Node) -> Result<(), Error> {
        let children = node.children();
        let name = lexeme_text(&children[1]);
        let (param_names, body): (Vec<String>, &Node) = if children[3].name() == KR_VOID {
            (Vec::new(), &children[5])
        } else {
            let params = flatten_comma(&children[3])
                .into_iter()
                .map(|decl| lexeme_text(&decl.children()[1]))
                .collect();
            (params, &children[5])
        };

        let root_scope = self.symbols.root();
        let label = format!("F_{name}");
        self.symbols.set_function_label(root_scope, &name, label.clone());

        self.enter_scope()?;
        let func_scope = self.symbols.current_scope();
        let locals = frame::assign_offsets(&mut self.symbols, func_scope, &param_names);

        let epilogue = format!("{label}_end");
        self.epilogue_label = Some(epilogue.clone());
        self.loop_labels.clear();

        self.label(&label);
        self.push_reg(reg::FP);
        self.emit(format!("{} {}, {}", op::MOVE, reg::FP, reg::SP));
        if locals > 0 {
            self.emit(format!("{} {}, {}, #{}", op::SUB, reg::SP, reg::SP, 4 * locals));
        }

        let stmt_list = &body.children()[1];
        for stmt in flatten_two(stmt_list) {
            self.gen_naredba(stmt)?;
        }

        self.label(&epilogue);
        if locals > 0 {
            self.emit(format!("{} {}, {}, #{}", op::ADD, reg::SP, reg::SP, 4 * locals));
        }
        self.pop_reg(reg::FP);
        self.emit(op::RET);

        self.leave_scope();
        self.epilogue_label = None;
        Ok(())
    }

    // ---- statements -------------------------------------------------------

    fn gen_naredba(&mut self, node: &Node) -> Result<(), Error> {
        let inner = only_child(node);
        match NonTerminalKind::from_name(inner.name()) {
            Some(NonTerminalKind::SlozenaNaredba) => self.gen_compound(inner),
            Some(NonTerminalKind::IzrazNaredba) => self.gen_izraz_naredba(inner),
            Some(NonTerminalKind::NaredbaGrananja) => self.gen_naredba_grananja(inner),
            Some(NonTerminalKind::NaredbaPetlje) => self.gen_naredba_petlje(inner),
            Some(NonTerminalKind::NaredbaSkoka) => self.gen_naredba_skoka(inner),
            Some(NonTerminalKind::Deklaracija) => self.gen_local_declaration(inner),
            _ => Err(Error::internal("unrecognised statement")),
        }
    }

    fn gen_compound(&mut self, node: &Node) -> Result<(), Error> {
        let children = node.children();
        self.enter_scope()?;
        for stmt in flatten_two(&children[1]) {
            self.gen_naredba(stmt)?;
        }
        self.leave_scope();
        Ok(())
    }

    fn gen_izraz_naredba(&mut self, node: &Node) -> Result<(), Error> {
        let children = node.children();
        if children.len() == 2 {
            self.gen_izraz(&children[0])?;
        }
        Ok(())
    }

    fn gen_naredba_grananja(&mut self, node: &Node) -> Result<(), Error> {
        let children = node.children();
        self.gen_izraz(&children[2])?;
        self.emit(format!("{} {}, #0", op::CMP, reg::TOP));
        if children.len() == 7 {
            let lelse = self.new_label("else");
            let lend = self.new_label("endif");
            self.emit(format!("{} {lelse}", op::JEQ));
            self.gen_naredba(&children[4])?;
            self.emit(format!("{} {lend}", op::JMP));
            self.label(&lelse);
            self.gen_naredba(&children[6])?;
            self.label(&lend);
        } else {
            let lend = self.new_label("endif");
            self.emit(format!("{} {lend}", op::JEQ));
            self.gen_naredba(&children[4])?;
            self.label(&lend);
        }
        Ok(())
    }

    fn gen_naredba_petlje(&mut self, node: &Node) -> Result<(), Error> {
        let children = node.children();
        match children[0].name() {
            KR_WHILE => {
                let ltop = self.new_label("top");
                let lbreak = self.new_label("break");
                self.label(&ltop);
                self.gen_izraz(&children[2])?;
                self.emit(format!("{} {}, #0", op::CMP, reg::TOP));
                self.emit(format!("{} {lbreak}", op::JEQ));
                self.loop_labels.push((lbreak.clone(), ltop.clone()));
                self.gen_naredba(&children[4])?;
                self.loop_labels.pop();
                self.emit(format!("{} {ltop}", op::JMP));
                self.label(&lbreak);
            }
            KR_DO => {
                let ltop = self.new_label("top");
                let lcontinue = self.new_label("continue");
                let lbreak = self.new_label("break");
                self.label(&ltop);
                self.loop_labels.push((lbreak.clone(), lcontinue.clone()));
                self.gen_naredba(&children[1])?;
                self.loop_labels.pop();
                self.label(&lcontinue);
                self.gen_izraz(&children[4])?;
                self.emit(format!("{} {}, #0", op::CMP, reg::TOP));
                self.emit(format!("{} {ltop}", op::JNE));
                self.label(&lbreak);
            }
            KR_FOR => {
                self.gen_izraz_naredba(&children[2])?;
                let ltop = self.new_label("top");
                let lcontinue = self.new_label("continue");
                let lbreak = self.new_label("break");
                self.label(&ltop);
                let cond_stmt = &children[3];
                if cond_stmt.children().len() == 2 {
                    self.gen_izraz(&cond_stmt.children()[0])?;
                    self.emit(format!("{} {}, #0", op::CMP, reg::TOP));
                    self.emit(format!("{} {lbreak}", op::JEQ));
                }
                let (step, body) = if children.len() == 7 {
                    (Some(&children[4]), &children[6])
                } else {
                    (None, &children[5])
                };
                self.loop_labels.push((lbreak.clone(), lcontinue.clone()));
                self.gen_naredba(body)?;
                self.loop_labels.pop();
                self.label(&lcontinue);
                if let Some(step) = step {
                    self.gen_izraz(step)?;
                }
                self.emit(format!("{} {ltop}", op::JMP));
                self.label(&lbreak);
            }
            other => return Err(Error::internal(format!("unrecognised loop statement '{other}'"))),
        }
        Ok(())
    }

    fn gen_naredba_skoka(&mut self, node: &Node) -> Result<(), Error> {
        let children = node.children();
        match children[0].name() {
            KR_BREAK => {
                let (lbreak, _) = self
                    .loop_labels
                    .last()
                    .cloned()
                    .ok_or_else(|| Error::internal("'break' outside a loop"))?;
                self.emit(format!("{} {lbreak}", op::JMP));
            }
            KR_CONTINUE => {
                let (_, lcontinue) = self
                    .loop_labels
                    .last()
                    .cloned()
                    .ok_or_else(|| Error::internal("'continue' outside a loop"))?;
                self.emit(format!("{} {lcontinue}", op::JMP));
            }
            KR_RETURN => {
                if children.len() == 3 {
                    self.gen_izraz(&children[1])?;
                    self.emit(format!("{} {}, {}", op::MOVE, reg::RET, reg::TOP));
                }
                let epilogue = self
                    .epilogue_label
                    .clone()
                    .ok_or_else(|| Error::internal("'return' outside a function"))?;
                self.emit(format!("{} {epilogue}", op::JMP));
            }
            other => return Err(Error::internal(format!("unrecognised jump statement '{other}'"))),
        }
        Ok(())
    }

    fn gen_local_declaration(&mut self, node: &Node) -> Result<(), Error> {
        let children = node.children();
        let declarator = &children[1];
        let name = lexeme_text(&declarator.children()[0]);
        if children.len() == 5 {
            let init = only_child(&children[3]);
            if init.name() == NIZ_ZNAKOVA {
                self.gen_string_array_init(&name, init)?;
            } else {
                self.gen_identifier_address(&name)?;
                self.push_reg(reg::ADDR);
                self.gen_izraz_pridruzivanja(init)?;
                self.pop_reg(reg::ADDR);
                self.emit(format!("{} [{}], {}", op::STORE, reg::ADDR, reg::TOP));
            }
        }
        Ok(())
    }

    fn gen_string_array_init(&mut self, name: &str, literal: &Node) -> Result<(), Error> {
        let chars = self.decode_string_literal(literal)?;
        for (i, ch) in chars.iter().chain(std::iter::once(&'\0')).enumerate() {
            self.gen_indexed_identifier_address(name, i as u32)?;
            self.emit(format!("{} {}, #{}", op::MOVE, reg::TOP, *ch as u32));
            self.emit(format!("{} [{}], {}", op::STORE, reg::ADDR, reg::TOP));
        }
        Ok(())
    }

    fn decode_string_literal(&self, literal: &Node) -> Result<Vec<char>, Error> {
        let lexeme = lexeme_text(literal);
        let inner = lexeme.trim_start_matches('"').trim_end_matches('"');
        process_escapes(inner).map_err(Error::internal)
    }

    // ---- addressing ---------------------------------------------------------

    fn gen_identifier_address(&mut self, name: &str) -> Result<(), Error> {
        match self.symbols.lookup(name) {
            Some(SymbolEntry::Variable { offset: Some(off), .. }) => {
                let off = *off;
                self.emit(format!("{} {}, {}", op::MOVE, reg::ADDR, reg::FP));
                self.emit(format!("{} {}, {}, #{off}", op::ADD, reg::ADDR, reg::ADDR));
                Ok(())
            }
            Some(SymbolEntry::Variable { offset: None, .. }) => {
                self.emit(format!("{} {}, G_{name}", op::MOVE, reg::ADDR));
                Ok(())
            }
            _ => Err(Error::internal(format!("'{name}' is not an addressable variable"))),
        }
    }

    fn gen_indexed_identifier_address(&mut self, name: &str, index: u32) -> Result<(), Error> {
        match self.symbols.lookup(name) {
            Some(SymbolEntry::Variable { offset: Some(off), .. }) => {
                let off = off + 4 * index as i32;
                self.emit(format!("{} {}, {}", op::MOVE, reg::ADDR, reg::FP));
                self.emit(format!("{} {}, {}, #{off}", op::ADD, reg::ADDR, reg::ADDR));
                Ok(())
            }
            Some(SymbolEntry::Variable { offset: None, .. }) => {
                let bytes = 4 * index;
                self.emit(format!("{} {}, G_{name}+{bytes}", op::MOVE, reg::ADDR));
                Ok(())
            }
            _ => Err(Error::internal(format!("'{name}' is not an addressable variable"))),
        }
    }

    /// Resolves any node in the single-child chain down to `postfix_izraz`/
    /// `primarni_izraz` to the address of the l-value it denotes, left in
    /// `R_addr`. Mirrors the checker's own transparent l-value propagation
    /// through that same chain (`check_logical_binary`'s single-child
    /// passthrough, `check_primarni_izraz`'s parenthesised case).
    fn gen_lvalue_address(&mut self, node: &Node) -> Result<(), Error> {
        match NonTerminalKind::from_name(node.name()) {
            Some(NonTerminalKind::PrimarniIzraz) => self.gen_primary_lvalue(node),
            Some(NonTerminalKind::PostfixIzraz) => self.gen_postfix_lvalue(node),
            Some(_) if node.children().len() == 1 => self.gen_lvalue_address(&node.children()[0]),
            _ => Err(Error::internal(format!("'{}' is not an l-value production", node.name()))),
        }
    }

    fn gen_primary_lvalue(&mut self, node: &Node) -> Result<(), Error> {
        let children = node.children();
        if children.len() == 3 {
            self.gen_lvalue_address(&children[1])
        } else {
            let leaf = &children[0];
            if leaf.name() != IDN {
                return Err(Error::internal("only identifiers are addressable"));
            }
            self.gen_identifier_address(&lexeme_text(leaf))
        }
    }

    fn gen_postfix_lvalue(&mut self, node: &Node) -> Result<(), Error> {
        let children = node.children();
        match children.len() {
            1 => self.gen_lvalue_address(&children[0]),
            4 if children[1].name() == L_UGL_ZAGRADA => {
                self.gen_lvalue_address(&children[0])?;
                self.push_reg(reg::ADDR);
                self.gen_izraz(&children[2])?;
                self.emit(format!("{} {}, {}, #4", op::MUL, reg::TOP, reg::TOP));
                self.pop_reg(reg::LHS);
                self.emit(format!("{} {}, {}, {}", op::ADD, reg::ADDR, reg::LHS, reg::TOP));
                Ok(())
            }
            _ => Err(Error::internal("postfix expression is not addressable")),
        }
    }

    // ---- expressions ----------------------------------------------------

    fn gen_izraz(&mut self, node: &Node) -> Result<(), Error> {
        let children = node.children();
        if children.len() == 1 {
            self.gen_izraz_pridruzivanja(&children[0])
        } else {
            self.gen_izraz(&children[0])?;
            self.gen_izraz_pridruzivanja(&children[2])
        }
    }

    fn gen_izraz_pridruzivanja(&mut self, node: &Node) -> Result<(), Error> {
        let children = node.children();
        if children.len() == 1 {
            self.gen_izraz_ili(&children[0])
        } else {
            self.gen_lvalue_address(&children[0])?;
            self.push_reg(reg::ADDR);
            self.gen_izraz_pridruzivanja(&children[2])?;
            self.pop_reg(reg::ADDR);
            self.emit(format!("{} [{}], {}", op::STORE, reg::ADDR, reg::TOP));
            Ok(())
        }
    }

    fn gen_izraz_ili(&mut self, node: &Node) -> Result<(), Error> {
        let children = node.children();
        if children.len() == 1 {
            return self.gen_izraz_i(&children[0]);
        }
        self.gen_izraz_ili(&children[0])?;
        self.emit(format!("{} {}, #0", op::CMP, reg::TOP));
        let ltrue = self.new_label("or_true");
        let lend = self.new_label("or_end");
        self.emit(format!("{} {ltrue}", op::JNE));
        self.gen_izraz_i(&children[2])?;
        self.normalize_bool();
        self.emit(format!("{} {lend}", op::JMP));
        self.label(&ltrue);
        self.emit(format!("{} {}, #1", op::MOVE, reg::TOP));
        self.label(&lend);
        Ok(())
    }

    fn gen_izraz_i(&mut self, node: &Node) -> Result<(), Error> {
        let children = node.children();
        if children.len() == 1 {
            return self.gen_izraz_bit_ili(&children[0]);
        }
        self.gen_izraz_i(&children[0])?;
        self.emit(format!("{} {}, #0", op::CMP, reg::TOP));
        let lfalse = self.new_label("and_false");
        let lend = self.new_label("and_end");
        self.emit(format!("{} {lfalse}", op::JEQ));
        self.gen_izraz_bit_ili(&children[2])?;
        self.normalize_bool();
        self.emit(format!("{} {lend}", op::JMP));
        self.label(&lfalse);
        self.emit(format!("{} {}, #0", op::MOVE, reg::TOP));
        self.label(&lend);
        Ok(())
    }

    /// A short-circuited operand's raw value may be any nonzero int, not
    /// necessarily 1; this collapses `R_top` to a strict 0/1 so `&&`/`||`
    /// results stay consistent with every other boolean-producing operator.
    fn normalize_bool(&mut self) {
        self.emit(format!("{} {}, #0", op::CMP, reg::TOP));
        let lzero = self.new_label("bool_zero");
        let ldone = self.new_label("bool_done");
        self.emit(format!("{} {lzero}", op::JEQ));
        self.emit(format!("{} {}, #1", op::MOVE, reg::TOP));
        self.emit(format!("{} {ldone}", op::JMP));
        self.label(&lzero);
        self.emit(format!("{} {}, #0", op::MOVE, reg::TOP));
        self.label(&ldone);
    }

    /// Shared shape for every eager left-recursive binary-operator chain:
    /// left operand computed and pushed, then right, then popped right
    /// before left (spec §4.12) and reduced with `mnemonic` into `R_top`.
    fn gen_eager_binary(
        &mut self,
        node: &Node,
        this: fn(&mut Self, &Node) -> Result<(), Error>,
        next: fn(&mut Self, &Node) -> Result<(), Error>,
        mnemonic: &str,
    ) -> Result<(), Error> {
        let children = node.children();
        if children.len() == 1 {
            return next(self, &children[0]);
        }
        this(self, &children[0])?;
        self.push_reg(reg::TOP);
        next(self, &children[2])?;
        self.push_reg(reg::TOP);
        self.pop_reg(reg::RHS);
        self.pop_reg(reg::LHS);
        self.emit(format!("{mnemonic} {}, {}, {}", reg::TOP, reg::LHS, reg::RHS));
        Ok(())
    }

    fn gen_izraz_bit_ili(&mut self, node: &Node) -> Result<(), Error> {
        self.gen_eager_binary(node, Self::gen_izraz_bit_ili, Self::gen_izraz_bit_xor, op::OR)
    }

    fn gen_izraz_bit_xor(&mut self, node: &Node) -> Result<(), Error> {
        self.gen_eager_binary(node, Self::gen_izraz_bit_xor, Self::gen_izraz_bit_i, op::XOR)
    }

    fn gen_izraz_bit_i(&mut self, node: &Node) -> Result<(), Error> {
        self.gen_eager_binary(node, Self::gen_izraz_bit_i, Self::gen_izraz_jednakosti, op::AND)
    }

    fn gen_izraz_jednakosti(&mut self, node: &Node) -> Result<(), Error> {
        self.gen_relational(node, Self::gen_izraz_jednakosti, Self::gen_izraz_odnosa)
    }

    fn gen_izraz_odnosa(&mut self, node: &Node) -> Result<(), Error> {
        self.gen_relational(node, Self::gen_izraz_odnosa, Self::gen_izraz_zbrajanja)
    }

    /// `==`/`!=`/`<`/`>`/`<=`/`>=` all lower the same way: compare, then a
    /// conditional jump picks between `MOVE #1` and `MOVE #0` since this
    /// machine has no compare-and-set instruction.
    fn gen_relational(
        &mut self,
        node: &Node,
        this: fn(&mut Self, &Node) -> Result<(), Error>,
        next: fn(&mut Self, &Node) -> Result<(), Error>,
    ) -> Result<(), Error> {
        let children = node.children();
        if children.len() == 1 {
            return next(self, &children[0]);
        }
        this(self, &children[0])?;
        self.push_reg(reg::TOP);
        next(self, &children[2])?;
        self.push_reg(reg::TOP);
        self.pop_reg(reg::RHS);
        self.pop_reg(reg::LHS);
        self.emit(format!("{} {}, {}", op::CMP, reg::LHS, reg::RHS));
        let jump = match children[1].name() {
            OP_JEDNAKO => op::JEQ,
            OP_NJEDNAKO => op::JNE,
            OP_LT => op::JLT,
            OP_GT => op::JGT,
            OP_LEQ => op::JLE,
            OP_GEQ => op::JGE,
            other => return Err(Error::internal(format!("unrecognised relational operator '{other}'"))),
        };
        let ltrue = self.new_label("rel_true");
        let lend = self.new_label("rel_end");
        self.emit(format!("{jump} {ltrue}"));
        self.emit(format!("{} {}, #0", op::MOVE, reg::TOP));
        self.emit(format!("{} {lend}", op::JMP));
        self.label(&ltrue);
        self.emit(format!("{} {}, #1", op::MOVE, reg::TOP));
        self.label(&lend);
        Ok(())
    }

    fn gen_izraz_zbrajanja(&mut self, node: &Node) -> Result<(), Error> {
        let children = node.children();
        if children.len() == 1 {
            return self.gen_izraz_mnozenja(&children[0]);
        }
        let mnemonic = match children[1].name() {
            PLUS => op::ADD,
            MINUS => op::SUB,
            other => return Err(Error::internal(format!("unrecognised additive operator '{other}'"))),
        };
        self.gen_izraz_zbrajanja(&children[0])?;
        self.push_reg(reg::TOP);
        self.gen_izraz_mnozenja(&children[2])?;
        self.push_reg(reg::TOP);
        self.pop_reg(reg::RHS);
        self.pop_reg(reg::LHS);
        self.emit(format!("{mnemonic} {}, {}, {}", reg::TOP, reg::LHS, reg::RHS));
        Ok(())
    }

    fn gen_izraz_mnozenja(&mut self, node: &Node) -> Result<(), Error> {
        let children = node.children();
        if children.len() == 1 {
            return self.gen_izraz_castanja(&children[0]);
        }
        let mnemonic = match children[1].name() {
            OP_PUTA => op::MUL,
            OP_DIJELI => op::DIV,
            OP_MOD => op::MOD,
            other => return Err(Error::internal(format!("unrecognised multiplicative operator '{other}'"))),
        };
        self.gen_izraz_mnozenja(&children[0])?;
        self.push_reg(reg::TOP);
        self.gen_izraz_castanja(&children[2])?;
        self.push_reg(reg::TOP);
        self.pop_reg(reg::RHS);
        self.pop_reg(reg::LHS);
        self.emit(format!("{mnemonic} {}, {}, {}", reg::TOP, reg::LHS, reg::RHS));
        Ok(())
    }

    /// Every value here is a uniform 4-byte word, so a cast never changes
    /// the bit pattern — only the type-checker's view of it.
    fn gen_izraz_castanja(&mut self, node: &Node) -> Result<(), Error> {
        let children = node.children();
        if children.len() == 1 {
            self.gen_unarni_izraz(&children[0])
        } else {
            self.gen_izraz_castanja(&children[3])
        }
    }

    fn gen_unarni_izraz(&mut self, node: &Node) -> Result<(), Error> {
        let children = node.children();
        match children.len() {
            1 => self.gen_postfix_izraz(&children[0]),
            2 if children[0].name() == OP_INC || children[0].name() == OP_DEC => {
                let mnemonic = if children[0].name() == OP_INC { op::ADD } else { op::SUB };
                self.gen_lvalue_address(&children[1])?;
                self.emit(format!("{} {}, [{}]", op::LOAD, reg::TOP, reg::ADDR));
                self.emit(format!("{mnemonic} {}, {}, #1", reg::TOP, reg::TOP));
                self.emit(format!("{} [{}], {}", op::STORE, reg::ADDR, reg::TOP));
                Ok(())
            }
            2 => {
                let operator = children[0].name();
                self.gen_izraz_castanja(&children[1])?;
                match operator {
                    PLUS => {}
                    MINUS => {
                        self.emit(format!("{} {}, #0", op::MOVE, reg::LHS));
                        self.emit(format!("{} {}, {}, {}", op::SUB, reg::TOP, reg::LHS, reg::TOP));
                    }
                    OP_TILDA => self.emit(format!("{} {}, {}, #-1", op::XOR, reg::TOP, reg::TOP)),
                    OP_NEG => {
                        self.emit(format!("{} {}, #0", op::CMP, reg::TOP));
                        let lzero = self.new_label("not_zero");
                        let ldone = self.new_label("not_done");
                        self.emit(format!("{} {lzero}", op::JEQ));
                        self.emit(format!("{} {}, #0", op::MOVE, reg::TOP));
                        self.emit(format!("{} {ldone}", op::JMP));
                        self.label(&lzero);
                        self.emit(format!("{} {}, #1", op::MOVE, reg::TOP));
                        self.label(&ldone);
                    }
                    other => return Err(Error::internal(format!("unrecognised unary operator '{other}'"))),
                }
                Ok(())
            }
            _ => Err(Error::internal("unrecognised unary expression")),
        }
    }

    fn gen_postfix_izraz(&mut self, node: &Node) -> Result<(), Error> {
        let children = node.children();
        match children.len() {
            1 => self.gen_primarni_izraz(&children[0]),
            2 => {
                let mnemonic = if children[1].name() == OP_INC { op::ADD } else { op::SUB };
                self.gen_lvalue_address(&children[0])?;
                self.emit(format!("{} {}, [{}]", op::LOAD, reg::TOP, reg::ADDR));
                self.emit(format!("{mnemonic} {}, {}, #1", reg::LHS, reg::TOP));
                self.emit(format!("{} [{}], {}", op::STORE, reg::ADDR, reg::LHS));
                Ok(())
            }
            4 if children[1].name() == L_UGL_ZAGRADA => {
                self.gen_lvalue_address(node)?;
                self.emit(format!("{} {}, [{}]", op::LOAD, reg::TOP, reg::ADDR));
                Ok(())
            }
            3 => self.gen_call(&children[0], &[]),
            4 => {
                let args = flatten_comma(&children[2]);
                self.gen_call(&children[0], &args)
            }
            _ => Err(Error::internal("unrecognised postfix expression")),
        }
    }

    fn gen_call(&mut self, callee: &Node, args: &[&Node]) -> Result<(), Error> {
        let label = self.resolve_callee_label(callee)?;
        for arg in args.iter().rev() {
            self.gen_izraz_pridruzivanja(arg)?;
            self.push_reg(reg::TOP);
        }
        self.emit(format!("{} {label}", op::CALL));
        if !args.is_empty() {
            self.emit(format!("{} {}, {}, #{}", op::ADD, reg::SP, reg::SP, 4 * args.len()));
        }
        self.emit(format!("{} {}, {}", op::MOVE, reg::TOP, reg::RET));
        Ok(())
    }

    /// Drills through the same single-child wrapper chain `gen_lvalue_address`
    /// uses, but only far enough to find the callee's name: calls are always
    /// to a bare identifier in this language (no function pointers).
    fn resolve_callee_label(&self, node: &Node) -> Result<String, Error> {
        if let Node::Terminal { .. } = node {
            if node.name() != IDN {
                return Err(Error::internal("callee must be a plain identifier"));
            }
            let name = lexeme_text(node);
            return match self.symbols.lookup(&name) {
                Some(SymbolEntry::Function { label: Some(label), .. }) => Ok(label.clone()),
                _ => Err(Error::internal(format!("'{name}' is not a defined function"))),
            };
        }
        let children = node.children();
        if children.len() == 1 {
            return self.resolve_callee_label(&children[0]);
        }
        Err(Error::internal("callee must be a plain identifier"))
    }

    fn gen_primarni_izraz(&mut self, node: &Node) -> Result<(), Error> {
        let children = node.children();
        if children.len() == 3 {
            return self.gen_izraz(&children[1]);
        }
        let leaf = &children[0];
        match leaf.name() {
            IDN => {
                let name = lexeme_text(leaf);
                let is_array = match self.symbols.lookup(&name) {
                    Some(entry) => entry.ty().is_array(),
                    None => return Err(Error::internal(format!("'{name}' used before declaration"))),
                };
                self.gen_identifier_address(&name)?;
                if is_array {
                    // Arrays decay to their own address; nothing to load.
                    self.emit(format!("{} {}, {}", op::MOVE, reg::TOP, reg::ADDR));
                } else {
                    self.emit(format!("{} {}, [{}]", op::LOAD, reg::TOP, reg::ADDR));
                }
                Ok(())
            }
            BROJ => {
                let value = parse_c_integer(&lexeme_text(leaf))
                    .ok_or_else(|| Error::internal("malformed integer literal"))?;
                self.emit(format!("{} {}, #{value}", op::MOVE, reg::TOP));
                Ok(())
            }
            ZNAK => {
                let lexeme = lexeme_text(leaf);
                let inner = lexeme.trim_start_matches('\'').trim_end_matches('\'');
                let chars = process_escapes(inner).map_err(Error::internal)?;
                let code = *chars.first().ok_or_else(|| Error::internal("empty character literal"))? as u32;
                self.emit(format!("{} {}, #{code}", op::MOVE, reg::TOP));
                Ok(())
            }
            NIZ_ZNAKOVA => {
                let chars = self.decode_string_literal(leaf)?;
                let label = self.intern_string(chars);
                self.emit(format!("{} {}, {label}", op::MOVE, reg::TOP));
                Ok(())
            }
            other => Err(Error::internal(format!("unrecognised primary expression '{other}'"))),
        }
    }

    fn intern_string(&mut self, chars: Vec<char>) -> String {
        let label = format!("S{}", self.string_counter);
        self.string_counter += 1;
        self.string_pool.push((label.clone(), chars));
        label
    }
}

#[cfg(test)]
mod generator_tests {
    use super::*;
    use cflatc_core::Position;
    use cflatc_semantic::SemanticChecker;

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

    /// Wraps a `primarni_izraz` leaf all the way up to `izraz`, the shape
    /// every statement-level expression position expects.
    fn wrap_expr(primary_children: Vec<Node>) -> Node {
        let mut current = nt("primarni_izraz", primary_children);
        for level in [
            "postfix_izraz",
            "unarni_izraz",
            "izraz_castanja",
            "izraz_mnozenja",
            "izraz_zbrajanja",
            "izraz_odnosa",
            "izraz_jednakosti",
            "izraz_bit_i",
            "izraz_bit_xor",
            "izraz_bit_ili",
            "izraz_i",
            "izraz_ili",
            "izraz_pridruzivanja",
            "izraz",
        ] {
            current = nt(level, vec![current]);
        }
        current
    }

    fn return_stmt(value: Node) -> Node {
        nt("naredba", vec![nt("naredba_skoka", vec![term(KR_RETURN, "return"), value, term(TOCKAZAREZ, ";")])])
    }

    fn function(name: &str, params: Option<Node>, body_stmts: Vec<Node>) -> Node {
        let mut list = nt("lista_naredbi", vec![]);
        for stmt in body_stmts {
            list = nt("lista_naredbi", vec![list, stmt]);
        }
        let body = nt("slozena_naredba", vec![term(L_VIT_ZAGRADA, "{"), list, term(D_VIT_ZAGRADA, "}")]);
        let mut children = vec![nt("ime_tipa", vec![term(KR_INT, "int")]), term(IDN, name), term(L_ZAGRADA, "(")];
        match params {
            Some(p) => children.push(p),
            None => children.push(term(KR_VOID, "void")),
        }
        children.push(term(D_ZAGRADA, ")"));
        children.push(body);
        nt("vanjska_deklaracija", vec![nt("definicija_funkcije", children)])
    }

    fn program(decls: Vec<Node>) -> Node {
        let mut unit = nt("prijevodna_jedinica", vec![]);
        for decl in decls {
            unit = nt("prijevodna_jedinica", vec![unit, decl]);
        }
        unit
    }

    fn compile(root: &Node) -> String {
        let (symbols, _) = SemanticChecker::check(root).expect("program should pass semantic analysis");
        let (asm, _) = CodeGenerator::generate(root, symbols).expect("program should generate");
        asm
    }

    #[test]
    fn minimal_main_emits_a_matched_prologue_and_epilogue() {
        let zero = wrap_expr(vec![term(BROJ, "0")]);
        let main = function("main", None, vec![return_stmt(zero)]);
        let asm = compile(&program(vec![main]));
        assert!(asm.contains("F_main:"));
        assert!(asm.contains(&format!("{} {}", op::PUSH, reg::FP)));
        assert!(asm.contains("F_main_end:"));
        assert!(asm.ends_with(op::RET));
    }

    #[test]
    fn addition_of_two_parameters_pops_right_before_left() {
        let params = nt(
            "lista_parametara",
            vec![
                nt("deklaracija_parametra", vec![nt("ime_tipa", vec![term(KR_INT, "int")]), term(IDN, "a")]),
                term(ZAREZ, ","),
                nt("deklaracija_parametra", vec![nt("ime_tipa", vec![term(KR_INT, "int")]), term(IDN, "b")]),
            ],
        );
        fn operand(name: &str) -> Node {
            let mut current = nt("primarni_izraz", vec![term(IDN, name)]);
            for level in ["postfix_izraz", "unarni_izraz", "izraz_castanja", "izraz_mnozenja"] {
                current = nt(level, vec![current]);
            }
            current
        }
        let sum = nt("izraz_zbrajanja", vec![operand("a"), term(PLUS, "+"), operand("b")]);
        // Re-wrap `izraz_zbrajanja` up through `izraz` like `wrap_expr` does for a bare primary.
        let mut current = sum;
        for level in [
            "izraz_odnosa",
            "izraz_jednakosti",
            "izraz_bit_i",
            "izraz_bit_xor",
            "izraz_bit_ili",
            "izraz_i",
            "izraz_ili",
            "izraz_pridruzivanja",
            "izraz",
        ] {
            current = nt(level, vec![current]);
        }
        let func = function("f", Some(params), vec![return_stmt(current)]);
        let asm = compile(&program(vec![func]));
        let lines: Vec<&str> = asm.lines().collect();
        let add_idx = lines.iter().position(|l| l.starts_with(op::ADD) && l.contains(reg::LHS)).expect("ADD present");
        assert_eq!(lines[add_idx - 1], format!("{} {}", op::POP, reg::LHS));
        assert_eq!(lines[add_idx - 2], format!("{} {}", op::POP, reg::RHS));
        assert!(lines[..add_idx].iter().filter(|l| **l == format!("{} {}", op::PUSH, reg::TOP)).count() >= 2);
    }

    #[test]
    fn if_else_jumps_around_the_untaken_branch() {
        let one = wrap_expr(vec![term(BROJ, "1")]);
        let zero_a = wrap_expr(vec![term(BROJ, "1")]);
        let zero_b = wrap_expr(vec![term(BROJ, "0")]);
        let then_branch = nt("naredba", vec![return_stmt(zero_a)]);
        let else_branch = nt("naredba", vec![return_stmt(zero_b)]);
        let branch = nt(
            "naredba_grananja",
            vec![
                term(KR_IF, "if"),
                term(L_ZAGRADA, "("),
                one,
                term(D_ZAGRADA, ")"),
                then_branch,
                term(KR_ELSE, "else"),
                else_branch,
            ],
        );
        let main = function("main", None, vec![nt("naredba", vec![branch])]);
        let asm = compile(&program(vec![main]));
        assert!(asm.contains(&format!("{} L0_else", op::JEQ)));
        assert!(asm.contains("L0_else:"));
        assert!(asm.contains("L1_endif:"));
    }
}
