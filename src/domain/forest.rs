//! Owned reply trees.
//!
//! A [`Forest`] is the ordered list of thread starters, each carried as a
//! [`Node`] with its replies nested below it. Every traversal here uses an
//! explicit stack, so arbitrarily deep reply chains do not grow the call stack.
//! That includes dropping, cloning, comparing, formatting and serializing.

use std::fmt;
use std::ops::{Deref, DerefMut};
use std::slice;

use serde::ser::{Serialize, Serializer};

/// An item together with its direct replies, in input order.
pub struct Node<T> {
    pub item: T,
    pub children: Children<T>,
}

/// Direct replies of a [`Node`].
///
/// Dropping moves all descendants onto one heap stack and frees them level
/// by level, so each node is dropped with its reply list already empty.
pub struct Children<T>(Vec<Node<T>>);

impl<T> Children<T> {
    pub fn into_vec(mut self) -> Vec<Node<T>> {
        std::mem::take(&mut self.0)
    }
}

impl<T> Default for Children<T> {
    fn default() -> Self {
        Self(Vec::new())
    }
}

impl<T> From<Vec<Node<T>>> for Children<T> {
    fn from(nodes: Vec<Node<T>>) -> Self {
        Self(nodes)
    }
}

impl<T> Deref for Children<T> {
    type Target = Vec<Node<T>>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<T> DerefMut for Children<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl<T> Drop for Children<T> {
    fn drop(&mut self) {
        let mut stack = std::mem::take(&mut self.0);
        while let Some(mut node) = stack.pop() {
            stack.append(&mut node.children.0);
        }
    }
}

impl<T: Clone> Clone for Children<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T: PartialEq> PartialEq for Children<T> {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl<T: Eq> Eq for Children<T> {}

impl<T: fmt::Debug> fmt::Debug for Children<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.0.iter()).finish()
    }
}

impl<T> Node<T> {
    /// Leaf node without replies.
    pub fn new(item: T) -> Self {
        Self {
            item,
            children: Children::default(),
        }
    }

    pub fn with_children(item: T, children: Vec<Node<T>>) -> Self {
        Self {
            item,
            children: Children(children),
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Number of items in this subtree, the node itself included.
    pub fn size(&self) -> usize {
        self.walk().count()
    }

    /// Length of the longest chain from this node down to a leaf (1 for a leaf).
    pub fn depth(&self) -> usize {
        self.walk()
            .map(|(level, _)| level + 1)
            .max()
            .unwrap_or(0)
    }

    /// Pre-order iteration over this subtree, the node itself at depth 0.
    pub fn walk(&self) -> Walk<'_, T> {
        Walk::new(slice::from_ref(self))
    }
}

// Pre-order `(depth, item)` sequences identify a subtree, so the trait impls
// below compare, copy and print that sequence instead of recursing.

impl<T: Clone> Clone for Node<T> {
    fn clone(&self) -> Self {
        let replies = Walk::new(&self.children).map(|(level, node)| (level, node.item.clone()));
        Self::with_children(self.item.clone(), assemble(replies))
    }
}

impl<T: PartialEq> PartialEq for Node<T> {
    fn eq(&self, other: &Self) -> bool {
        self.walk()
            .map(|(level, node)| (level, &node.item))
            .eq(other.walk().map(|(level, node)| (level, &node.item)))
    }
}

impl<T: Eq> Eq for Node<T> {}

impl<T: fmt::Debug> fmt::Debug for Node<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.walk().map(|(level, node)| (level, &node.item)))
            .finish()
    }
}

/// Serialized form of one item: its depth below the root and the item.
#[derive(serde::Serialize)]
struct Entry<'a, T> {
    depth: usize,
    item: &'a T,
}

impl<T: Serialize> Serialize for Node<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.walk().map(|(depth, node)| Entry {
            depth,
            item: &node.item,
        }))
    }
}

/// Rebuild nodes from a pre-order `(depth, item)` sequence.
///
/// `path` holds the open chain from the current root down to the last item.
/// An entry deeper than the open chain attaches to its last node.
fn assemble<T>(entries: impl IntoIterator<Item = (usize, T)>) -> Vec<Node<T>> {
    let mut roots = Vec::new();
    let mut path: Vec<Node<T>> = Vec::new();

    for (depth, item) in entries {
        close_path(&mut path, &mut roots, depth);
        path.push(Node::new(item));
    }
    close_path(&mut path, &mut roots, 0);

    roots
}

fn close_path<T>(path: &mut Vec<Node<T>>, roots: &mut Vec<Node<T>>, depth: usize) {
    while path.len() > depth {
        let Some(node) = path.pop() else { break };
        match path.last_mut() {
            Some(parent) => parent.children.push(node),
            None => roots.push(node),
        }
    }
}

/// Ordered sequence of root nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Forest<T> {
    roots: Vec<Node<T>>,
}

impl<T> Default for Forest<T> {
    fn default() -> Self {
        Self { roots: Vec::new() }
    }
}

impl<T> Forest<T> {
    pub fn new(roots: Vec<Node<T>>) -> Self {
        Self { roots }
    }

    /// Rebuild a forest from pre-order `(depth, item)` pairs, roots at depth 0.
    ///
    /// Inverse of [`Forest::iter_with_depth`].
    pub fn from_preorder<I: IntoIterator<Item = (usize, T)>>(entries: I) -> Self {
        Self::new(assemble(entries))
    }

    pub fn roots(&self) -> &[Node<T>] {
        &self.roots
    }

    pub fn into_roots(self) -> Vec<Node<T>> {
        self.roots
    }

    /// Total number of items across all trees.
    pub fn len(&self) -> usize {
        self.walk().count()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Longest root-to-leaf chain; 0 for an empty forest.
    pub fn depth(&self) -> usize {
        self.walk()
            .map(|(level, _)| level + 1)
            .max()
            .unwrap_or(0)
    }

    /// Items without replies, in pre-order.
    pub fn leaves(&self) -> Vec<&T> {
        self.walk()
            .filter(|(_, node)| node.is_leaf())
            .map(|(_, node)| &node.item)
            .collect()
    }

    /// Pre-order iteration over borrowed items.
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        self.walk().map(|(_, node)| &node.item)
    }

    /// Pre-order iteration yielding `(depth, item)`, roots at depth 0.
    pub fn iter_with_depth(&self) -> impl Iterator<Item = (usize, &T)> + '_ {
        self.walk().map(|(level, node)| (level, &node.item))
    }

    /// Pre-order iteration over nodes with their depth.
    pub fn walk(&self) -> Walk<'_, T> {
        Walk::new(&self.roots)
    }

    /// Consumes the forest into its items in pre-order.
    pub fn into_flat(self) -> Vec<T> {
        self.into_iter().collect()
    }
}

/// A forest serializes as one flat pre-order array of `{ "depth", "item" }`
/// entries, so output nesting stays constant however deep the threads are.
impl<T: Serialize> Serialize for Forest<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(
            self.iter_with_depth()
                .map(|(depth, item)| Entry { depth, item }),
        )
    }
}

impl<T> FromIterator<Node<T>> for Forest<T> {
    fn from_iter<I: IntoIterator<Item = Node<T>>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<T> IntoIterator for Forest<T> {
    type Item = T;
    type IntoIter = IntoFlat<T>;

    fn into_iter(self) -> Self::IntoIter {
        let mut stack = self.roots;
        stack.reverse();
        IntoFlat { stack }
    }
}

/// Borrowing pre-order traversal.
pub struct Walk<'a, T> {
    stack: Vec<(usize, &'a Node<T>)>,
}

impl<'a, T> Walk<'a, T> {
    fn new(roots: &'a [Node<T>]) -> Self {
        Self {
            stack: roots.iter().rev().map(|node| (0, node)).collect(),
        }
    }
}

impl<'a, T> Iterator for Walk<'a, T> {
    type Item = (usize, &'a Node<T>);

    fn next(&mut self) -> Option<Self::Item> {
        let (level, node) = self.stack.pop()?;
        // Push children in reverse order for left-to-right traversal
        self.stack
            .extend(node.children.iter().rev().map(|child| (level + 1, child)));
        Some((level, node))
    }
}

/// Consuming pre-order traversal. Dismantles the tree node by node.
pub struct IntoFlat<T> {
    stack: Vec<Node<T>>,
}

impl<T> Iterator for IntoFlat<T> {
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        let Node { item, children } = self.stack.pop()?;
        self.stack.extend(children.into_vec().into_iter().rev());
        Some(item)
    }
}
