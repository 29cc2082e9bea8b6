use std::collections::HashMap;

use generational_arena::{Arena, Index};
use tracing::instrument;

use crate::domain::forest::{Forest, Node};

/// Reply slot in the arena-based staging structure.
#[derive(Debug)]
pub struct ArenaNode<T> {
    /// The reply itself
    pub item: T,
    /// Index of the replied-to node, None for thread starters
    pub parent: Option<Index>,
    /// Indices of direct replies, in insertion order
    pub children: Vec<Index>,
}

/// Arena-based forest used while threading replies.
///
/// Nodes refer to each other by generational index, so a parent can collect
/// its replies before the owned [`Forest`] exists. [`ReplyArena::into_forest`]
/// then moves every item out into nested nodes.
#[derive(Debug)]
pub struct ReplyArena<T> {
    /// Arena storage for all nodes
    arena: Arena<ArenaNode<T>>,
    /// Root indices in insertion order
    roots: Vec<Index>,
}

impl<T> Default for ReplyArena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ReplyArena<T> {
    pub fn new() -> Self {
        Self {
            arena: Arena::new(),
            roots: Vec::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            arena: Arena::with_capacity(capacity),
            roots: Vec::new(),
        }
    }

    /// Insert `item` as the last reply of `parent`, or as the last root.
    ///
    /// A stale or unknown parent index leaves the node detached from any tree.
    pub fn insert_node(&mut self, item: T, parent: Option<Index>) -> Index {
        let node = ArenaNode {
            item,
            parent,
            children: Vec::new(),
        };
        let node_idx = self.arena.insert(node);

        if let Some(parent_idx) = parent {
            if let Some(parent) = self.arena.get_mut(parent_idx) {
                parent.children.push(node_idx);
            }
        } else {
            self.roots.push(node_idx);
        }

        node_idx
    }

    pub fn get_node(&self, idx: Index) -> Option<&ArenaNode<T>> {
        self.arena.get(idx)
    }

    pub fn roots(&self) -> &[Index] {
        &self.roots
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    pub fn iter_postorder(&self) -> PostOrderIterator<'_, T> {
        PostOrderIterator::new(self)
    }

    #[instrument(level = "trace", skip(self))]
    pub fn depth(&self) -> usize {
        let mut max_depth = 0;
        let mut stack: Vec<(Index, usize)> = self.roots.iter().map(|&idx| (idx, 1)).collect();

        while let Some((idx, depth)) = stack.pop() {
            if let Some(node) = self.get_node(idx) {
                max_depth = max_depth.max(depth);
                stack.extend(node.children.iter().map(|&child| (child, depth + 1)));
            }
        }

        max_depth
    }

    /// Move all items out into an owned forest, children before parents.
    #[instrument(level = "trace", skip(self))]
    pub fn into_forest(mut self) -> Forest<T> {
        let order: Vec<Index> = self.iter_postorder().map(|(idx, _)| idx).collect();
        let mut built: HashMap<Index, Node<T>> = HashMap::with_capacity(order.len());

        for idx in order {
            if let Some(slot) = self.arena.remove(idx) {
                let children = slot
                    .children
                    .iter()
                    .filter_map(|child| built.remove(child))
                    .collect();
                built.insert(idx, Node::with_children(slot.item, children));
            }
        }

        self.roots
            .iter()
            .filter_map(|root| built.remove(root))
            .collect()
    }
}

/// Post-order traversal across all roots.
pub struct PostOrderIterator<'a, T> {
    arena: &'a ReplyArena<T>,
    stack: Vec<(Index, bool)>,
}

impl<'a, T> PostOrderIterator<'a, T> {
    fn new(arena: &'a ReplyArena<T>) -> Self {
        Self {
            arena,
            stack: arena.roots.iter().rev().map(|&idx| (idx, false)).collect(),
        }
    }
}

impl<'a, T> Iterator for PostOrderIterator<'a, T> {
    type Item = (Index, &'a ArenaNode<T>);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((current_idx, visited)) = self.stack.pop() {
            if let Some(node) = self.arena.get_node(current_idx) {
                if !visited {
                    self.stack.push((current_idx, true));
                    for &child in node.children.iter().rev() {
                        self.stack.push((child, false));
                    }
                } else {
                    return Some((current_idx, node));
                }
            }
        }
        None
    }
}
