//! The parse tree and its two textual renderings (spec §4.8, §6).

use cflatc_core::Position;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Terminal {
        name: String,
        position: Position,
        lexeme: String,
    },
    NonTerminal {
        name: String,
        children: Vec<Node>,
    },
}

impl Node {
    pub fn name(&self) -> &str {
        match self {
            Node::Terminal { name, .. } | Node::NonTerminal { name, .. } => name,
        }
    }

    pub fn children(&self) -> &[Node] {
        match self {
            Node::Terminal { .. } => &[],
            Node::NonTerminal { children, .. } => children,
        }
    }
}

pub struct ParseTree;

impl ParseTree {
    /// Preorder dump, 4-space indentation per depth, `<depth>:<symbol>`
    /// for non-terminals and `<depth>:TERMINAL , lexeme` for terminals.
    pub fn render_generative(root: &Node) -> String {
        let mut lines = Vec::new();
        write_node(root, 0, &mut lines);
        lines.join("\n")
    }

    /// Same rendering, with wrapper (single-child) non-terminals elided —
    /// a subtree-preserving contraction of the generative tree (spec §9).
    pub fn render_syntax(root: &Node) -> String {
        let collapsed = elide_wrappers(root);
        let mut lines = Vec::new();
        write_node(&collapsed, 0, &mut lines);
        lines.join("\n")
    }
}

fn write_node(node: &Node, depth: usize, lines: &mut Vec<String>) {
    let indent = "    ".repeat(depth);
    match node {
        Node::Terminal { name, lexeme, .. } => {
            lines.push(format!("{indent}{depth}:{name} , {lexeme}"));
        }
        Node::NonTerminal { name, children } => {
            lines.push(format!("{indent}{depth}:{name}"));
            for child in children {
                write_node(child, depth + 1, lines);
            }
        }
    }
}

/// A non-terminal with exactly one child is a chain/wrapper production;
/// collapsing it to that child (repeatedly) preserves every terminal leaf
/// while dropping the wrapper layer.
fn elide_wrappers(node: &Node) -> Node {
    let mut current = node;
    while let Node::NonTerminal { children, .. } = current {
        if children.len() == 1 {
            current = &children[0];
        } else {
            break;
        }
    }
    match current {
        Node::Terminal {
            name,
            position,
            lexeme,
        } => Node::Terminal {
            name: name.clone(),
            position: *position,
            lexeme: lexeme.clone(),
        },
        Node::NonTerminal { name, children } => Node::NonTerminal {
            name: name.clone(),
            children: children.iter().map(elide_wrappers).collect(),
        },
    }
}

#[cfg(test)]
mod tree_tests {
    use super::*;

    fn leaf(name: &str, lexeme: &str) -> Node {
        Node::Terminal {
            name: name.to_string(),
            position: Position::new(1, 1),
            lexeme: lexeme.to_string(),
        }
    }

    #[test]
    fn generative_rendering_lists_every_node_at_its_depth() {
        let tree = Node::NonTerminal {
            name: "s".to_string(),
            children: vec![leaf("IDN", "x")],
        };
        let rendered = ParseTree::render_generative(&tree);
        assert_eq!(rendered, "0:s\n    1:IDN , x");
    }

    #[test]
    fn syntax_rendering_elides_single_child_wrappers() {
        let tree = Node::NonTerminal {
            name: "wrapper".to_string(),
            children: vec![Node::NonTerminal {
                name: "inner".to_string(),
                children: vec![leaf("IDN", "x"), leaf("PLUS", "+"), leaf("IDN", "y")],
            }],
        };
        let rendered = ParseTree::render_syntax(&tree);
        assert!(rendered.starts_with("0:inner"));
        assert!(!rendered.contains("wrapper"));
    }

    #[test]
    fn syntax_rendering_keeps_multi_child_structure_intact() {
        let tree = Node::NonTerminal {
            name: "s".to_string(),
            children: vec![leaf("IDN", "x"), leaf("PLUS", "+"), leaf("IDN", "y")],
        };
        let rendered = ParseTree::render_syntax(&tree);
        assert_eq!(rendered.lines().count(), 4);
    }
}
