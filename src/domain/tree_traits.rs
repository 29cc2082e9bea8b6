use std::fmt::Display;

use termtree::Tree;

use crate::domain::forest::{Forest, Node};

pub trait ToTreeString {
    /// Convert into a `termtree::Tree`.
    ///
    /// `Tree` drops recursively; prefer [`render_tree`] for very deep threads.
    fn to_tree_string(&self) -> Tree<String>;
}

impl<T: Display> ToTreeString for Node<T> {
    fn to_tree_string(&self) -> Tree<String> {
        // Post-order: the last `children.len()` finished trees are this node's leaves
        let mut finished: Vec<Tree<String>> = Vec::new();
        let mut stack = vec![(self, false)];

        while let Some((node, expanded)) = stack.pop() {
            if expanded {
                let leaves = finished.split_off(finished.len() - node.children.len());
                finished.push(Tree::new(node.item.to_string()).with_leaves(leaves));
            } else {
                stack.push((node, true));
                stack.extend(node.children.iter().rev().map(|child| (child, false)));
            }
        }

        finished
            .pop()
            .unwrap_or_else(|| Tree::new(self.item.to_string()))
    }
}

/// Render one thread as termtree text.
pub fn render_tree<T: Display>(node: &Node<T>) -> String {
    let tree = node.to_tree_string();
    let rendered = tree.to_string();
    dismantle(tree);
    rendered
}

/// Drop a termtree level by level instead of recursively.
fn dismantle<D: Display>(tree: Tree<D>) {
    let mut stack = vec![tree];
    while let Some(mut tree) = stack.pop() {
        stack.append(&mut tree.leaves);
    }
}

impl<T: Display> Forest<T> {
    /// One rendered tree per root.
    pub fn render(&self) -> Vec<String> {
        self.roots().iter().map(render_tree).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_renders_nested_replies() {
        let node = Node::with_children("a", vec![Node::with_children("b", vec![Node::new("c")])]);
        let rendered = render_tree(&node);
        let lines: Vec<_> = rendered.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "a");
        assert!(lines[1].ends_with("b"));
        assert!(lines[2].ends_with("c"));
    }

    #[test]
    fn test_tree_keeps_sibling_order() {
        let node = Node::with_children(
            "a",
            vec![Node::with_children("b", vec![Node::new("c")]), Node::new("d")],
        );
        let tree = node.to_tree_string();
        let leaves: Vec<_> = tree.leaves.iter().map(|t| t.root.as_str()).collect();
        assert_eq!(leaves, vec!["b", "d"]);
        assert_eq!(tree.leaves[0].leaves[0].root, "c");
    }

    #[test]
    fn test_deep_chain_builds_and_drops_tree() {
        let depth = 200_000;
        let mut node = Node::new(depth - 1);
        for item in (0..depth - 1).rev() {
            node = Node::with_children(item, vec![node]);
        }

        let tree = node.to_tree_string();
        assert_eq!(tree.root, "0");
        assert_eq!(tree.leaves.len(), 1);
        dismantle(tree);
    }
}
