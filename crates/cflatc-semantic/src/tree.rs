//! `SemanticTree`: a node-id -> attributes side-table over the parser's
//! `Node` tree (spec §4.9). The parse tree itself is never mutated; the
//! checker records attributes for a node by that node's address, which
//! stays stable for as long as the caller holds on to the same tree, so
//! a later render pass over that same tree can look each node's
//! attributes back up without needing to replay any traversal order.

use std::collections::HashMap;

use cflatc_core::Type;
use cflatc_parser::Node;

pub type NodeId = usize;

/// A node's address, used as its key in the side-table. Only meaningful
/// for the lifetime of the tree the checker was run against.
pub fn id_of(node: &Node) -> NodeId {
    node as *const Node as NodeId
}

/// Semantic attributes attached to one tree node (spec §3's "Semantic
/// attributes on a parse node" list). Every field is optional: a given
/// rule only fills in what its grammar position actually uses.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes {
    pub ty: Option<Type>,
    pub is_lvalue: bool,
    pub identifier: Option<String>,
    pub element_count: Option<u32>,
    pub is_string_literal: bool,
    pub string_literal_length: Option<u32>,
    pub contains_return: bool,
}

impl Attributes {
    pub fn with_type(ty: Type) -> Self {
        Self {
            ty: Some(ty),
            ..Self::default()
        }
    }

    pub fn lvalue(ty: Type) -> Self {
        Self {
            ty: Some(ty),
            is_lvalue: true,
            ..Self::default()
        }
    }
}

#[derive(Debug, Default)]
pub struct SemanticTree {
    attributes: HashMap<NodeId, Attributes>,
}

impl SemanticTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, id: NodeId, attributes: Attributes) {
        self.attributes.insert(id, attributes);
    }

    pub fn get(&self, id: NodeId) -> Option<&Attributes> {
        self.attributes.get(&id)
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}

/// Render the generative tree with each node's attributes appended (the
/// `semanticko_stablo.txt` CLI output, spec §6). `root` must be the same
/// tree [`SemanticChecker::check`](crate::checker::SemanticChecker::check)
/// ran over — attribute lookup is keyed by node address, not position.
pub fn render_annotated(root: &Node, tree: &SemanticTree) -> String {
    let mut lines = Vec::new();
    let mut next_display_id: NodeId = 0;
    write_node(root, 0, tree, &mut next_display_id, &mut lines);
    lines.join("\n")
}

fn write_node(node: &Node, depth: usize, tree: &SemanticTree, next_display_id: &mut NodeId, lines: &mut Vec<String>) {
    let display_id = *next_display_id;
    *next_display_id += 1;
    let indent = "    ".repeat(depth);
    let suffix = render_attributes(display_id, tree.get(id_of(node)));
    match node {
        Node::Terminal { name, lexeme, .. } => {
            lines.push(format!("{indent}{depth}:{name} , {lexeme}{suffix}"));
        }
        Node::NonTerminal { name, children } => {
            lines.push(format!("{indent}{depth}:{name}{suffix}"));
            for child in children {
                write_node(child, depth + 1, tree, next_display_id, lines);
            }
        }
    }
}

/// Matches the external `semanticko_stablo.txt` contract (spec §6): every
/// node gets a sequential display id; `type`/`lvalue`/`elements` appear
/// only for nodes a rule actually annotated.
fn render_attributes(display_id: NodeId, attrs: Option<&Attributes>) -> String {
    let mut parts = vec![format!("id={display_id}")];
    if let Some(attrs) = attrs {
        if let Some(ty) = &attrs.ty {
            parts.push(format!("type={ty}"));
            parts.push(format!("lvalue={}", attrs.is_lvalue));
        }
        if let Some(count) = attrs.element_count {
            parts.push(format!("elements={count}"));
        }
    }
    format!(" [{}]", parts.join(", "))
}

#[cfg(test)]
mod tree_tests {
    use super::*;
    use cflatc_core::Position;

    #[test]
    fn attributes_are_looked_up_by_node_address() {
        let node = Node::Terminal {
            name: "IDN".to_string(),
            position: Position::new(1, 1),
            lexeme: "x".to_string(),
        };
        let mut tree = SemanticTree::new();
        tree.set(id_of(&node), Attributes::lvalue(Type::INT));
        assert_eq!(tree.get(id_of(&node)), Some(&Attributes::lvalue(Type::INT)));
    }

    #[test]
    fn annotated_rendering_looks_up_each_nodes_own_attributes() {
        let leaf = Node::Terminal {
            name: "IDN".to_string(),
            position: Position::new(1, 1),
            lexeme: "x".to_string(),
        };
        let root = Node::NonTerminal {
            name: "izraz".to_string(),
            children: vec![leaf],
        };
        let leaf_ref = &root.children()[0];

        let mut tree = SemanticTree::new();
        tree.set(id_of(&root), Attributes::with_type(Type::INT));
        tree.set(id_of(leaf_ref), Attributes::lvalue(Type::INT));

        let rendered = render_annotated(&root, &tree);
        assert!(rendered.contains("0:izraz [id=0, type=int, lvalue=false]"));
        assert!(rendered.contains("IDN , x [id=1, type=int, lvalue=true]"));
    }
}
