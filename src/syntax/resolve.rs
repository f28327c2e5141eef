//! Cursor-to-node resolution

use crate::syntax::SyntaxNode;

/// Find the smallest node whose span contains `index`
///
/// Every node of the tree is considered. When two candidates have the same
/// width, the later one only wins if it lies inside the current best, so
/// a child sharing its parent's span is preferred over the parent.
pub fn find_node_at<'a>(root: &'a dyn SyntaxNode, index: usize) -> Option<&'a dyn SyntaxNode> {
    let mut best: Option<&'a dyn SyntaxNode> = None;

    root.walk(&mut |node| {
        if !node.contains(index) {
            return true;
        }

        let replace = match best {
            None => true,
            Some(current) => {
                node.span_len() < current.span_len()
                    || (node.span_len() == current.span_len() && is_within(node, current))
            }
        };

        if replace {
            best = Some(node);
        }
        true
    });

    best
}

fn is_within(node: &dyn SyntaxNode, outer: &dyn SyntaxNode) -> bool {
    outer.start() <= node.start() && node.end() <= outer.end()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::ExprParser;

    /// Node with an explicit span and children, for shapes the parser never builds
    #[derive(Debug)]
    struct MockNode {
        label: &'static str,
        start: usize,
        end: usize,
        children: Vec<MockNode>,
    }

    impl MockNode {
        fn new(label: &'static str, start: usize, end: usize, children: Vec<MockNode>) -> Self {
            Self {
                label,
                start,
                end,
                children,
            }
        }
    }

    impl SyntaxNode for MockNode {
        fn start(&self) -> usize {
            self.start
        }

        fn end(&self) -> usize {
            self.end
        }

        fn walk<'a>(&'a self, visitor: &mut dyn FnMut(&'a dyn SyntaxNode) -> bool) -> bool {
            if !visitor(self) {
                return false;
            }
            self.children.iter().all(|child| child.walk(&mut *visitor))
        }

        fn kind(&self) -> &'static str {
            self.label
        }

        fn expr(&self) -> String {
            self.label.to_string()
        }
    }

    #[test]
    fn test_identifier_in_binary_expression() {
        let tree = ExprParser::new().parse_program("x + 5").unwrap();

        let node = find_node_at(&tree, 0).unwrap();
        assert_eq!(node.kind(), "Identifier");
        assert_eq!(node.expr(), "x");
        assert_eq!((node.start(), node.end()), (0, 1));

        let node = find_node_at(&tree, 4).unwrap();
        assert_eq!(node.kind(), "NumberLiteral");
    }

    #[test]
    fn test_gap_resolves_to_enclosing_node() {
        let tree = ExprParser::new().parse_program("x + 5").unwrap();

        let node = find_node_at(&tree, 2).unwrap();
        assert_eq!(node.kind(), "BinaryExpr");
        assert_eq!(node.expr(), "(x + 5)");
    }

    #[test]
    fn test_end_is_exclusive() {
        let tree = ExprParser::new().parse_program("x + 5").unwrap();

        assert!(find_node_at(&tree, 5).is_none());
        assert!(find_node_at(&tree, 100).is_none());
    }

    #[test]
    fn test_call_argument_wins_over_call() {
        let tree = ExprParser::new().parse_program("printf(name)").unwrap();

        assert_eq!(find_node_at(&tree, 8).unwrap().kind(), "Identifier");
        assert_eq!(find_node_at(&tree, 2).unwrap().kind(), "FunctionCall");
    }

    #[test]
    fn test_equal_span_prefers_nested_node() {
        let tree = MockNode::new(
            "root",
            0,
            10,
            vec![MockNode::new(
                "wrapper",
                2,
                6,
                vec![MockNode::new("inner", 2, 6, vec![])],
            )],
        );

        assert_eq!(find_node_at(&tree, 3).unwrap().kind(), "inner");
        assert_eq!(find_node_at(&tree, 8).unwrap().kind(), "root");
    }

    #[test]
    fn test_equal_span_siblings_keep_first() {
        let tree = MockNode::new(
            "root",
            0,
            10,
            vec![
                MockNode::new("first", 0, 4, vec![]),
                MockNode::new("overlap", 2, 6, vec![]),
            ],
        );

        assert_eq!(find_node_at(&tree, 3).unwrap().kind(), "first");
    }

    #[test]
    fn test_empty_span_never_matches() {
        let tree = MockNode::new("root", 0, 0, vec![]);
        assert!(find_node_at(&tree, 0).is_none());
    }
}
