//! Shared grammar-shape helpers for walking the parse tree produced by
//! `config/grammar.def`. The checker and the code generator both need to
//! flatten the same left-recursive list productions the same way, so that
//! logic lives here once instead of being re-derived (and risking
//! divergence) in each consumer.

use cflatc_parser::Node;

/// `lista_x ::= item | lista_x ZAREZ item`: flattens left recursion with a
/// separator terminal between the recursive call and the new item.
pub fn flatten_comma(node: &Node) -> Vec<&Node> {
    let children = node.children();
    if children.len() == 1 {
        vec![&children[0]]
    } else {
        let mut items = flatten_comma(&children[0]);
        items.push(&children[2]);
        items
    }
}

/// `lista_x ::= $ | lista_x item`: flattens left recursion with no
/// separator (used for statement and translation-unit lists).
pub fn flatten_two(node: &Node) -> Vec<&Node> {
    let children = node.children();
    if children.is_empty() {
        Vec::new()
    } else if children.len() == 1 {
        vec![&children[0]]
    } else {
        let mut items = flatten_two(&children[0]);
        items.push(&children[1]);
        items
    }
}

pub fn only_child(node: &Node) -> &Node {
    &node.children()[0]
}

/// A terminal's lexeme, or the empty string for a non-terminal.
pub fn lexeme_text(node: &Node) -> String {
    match node {
        Node::Terminal { lexeme, .. } => lexeme.clone(),
        Node::NonTerminal { .. } => String::new(),
    }
}

#[cfg(test)]
mod shapes_tests {
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

    #[test]
    fn flatten_comma_collects_items_in_source_order() {
        let list = nt(
            "lista_argumenata",
            vec![
                nt("lista_argumenata", vec![term("IDN", "a")]),
                term("ZAREZ", ","),
                term("IDN", "b"),
            ],
        );
        let items = flatten_comma(&list);
        assert_eq!(items.len(), 2);
        assert_eq!(lexeme_text(items[0]), "a");
        assert_eq!(lexeme_text(items[1]), "b");
    }

    #[test]
    fn flatten_two_handles_the_empty_list() {
        let empty = nt("lista_naredbi", vec![]);
        assert!(flatten_two(&empty).is_empty());
    }
}
