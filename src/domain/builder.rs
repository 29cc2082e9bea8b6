//! Threading of flat reply lists into forests.

use std::collections::HashMap;

use tracing::{debug, instrument};

use crate::domain::arena::ReplyArena;
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::forest::Forest;
use crate::domain::identifiable::Identifiable;

/// Build a reply forest from a flat, ordered collection.
///
/// Items whose parent id is `None`, or names an id missing from `items`,
/// become roots. Every other item is attached below its parent. Roots and
/// siblings keep their relative input order; nothing is re-sorted.
///
/// # Errors
///
/// * [`DomainError::DuplicateId`] if two items share an id.
/// * [`DomainError::CycleDetected`] if an item is its own parent, or its
///   parent chain loops without ever reaching a root.
#[instrument(level = "debug", skip(items))]
pub fn build_forest<T, I>(items: I) -> DomainResult<Forest<T>>
where
    T: Identifiable,
    I: IntoIterator<Item = T>,
{
    let items: Vec<T> = items.into_iter().collect();

    let mut positions: HashMap<T::Id, usize> = HashMap::with_capacity(items.len());
    for (pos, item) in items.iter().enumerate() {
        if positions.insert(item.id().clone(), pos).is_some() {
            return Err(DomainError::DuplicateId(format!("{:?}", item.id())));
        }
    }

    // Partition: roots vs. replies indexed under their parent's position
    let mut roots = Vec::new();
    let mut replies: Vec<Vec<usize>> = vec![Vec::new(); items.len()];
    for (pos, item) in items.iter().enumerate() {
        match item.parent_id() {
            Some(parent) => match positions.get(parent) {
                Some(&parent_pos) => replies[parent_pos].push(pos),
                None => {
                    debug!("promoting {:?}: parent {:?} not in collection", item.id(), parent);
                    roots.push(pos);
                }
            },
            None => roots.push(pos),
        }
    }

    let mut slots: Vec<Option<T>> = items.into_iter().map(Some).collect();
    let mut arena = ReplyArena::with_capacity(slots.len());
    let mut stack: Vec<_> = roots.iter().rev().map(|&pos| (pos, None)).collect();

    while let Some((pos, parent_idx)) = stack.pop() {
        let Some(item) = slots[pos].take() else {
            continue;
        };
        let idx = arena.insert_node(item, parent_idx);
        stack.extend(replies[pos].iter().rev().map(|&child| (child, Some(idx))));
    }

    // Anything not reached from a root sits on or below a parent cycle
    if let Some(stranded) = slots.iter().flatten().next() {
        return Err(DomainError::CycleDetected(format!("{:?}", stranded.id())));
    }

    debug!(
        "threaded {} items under {} roots, depth {}",
        arena.len(),
        arena.roots().len(),
        arena.depth()
    );
    Ok(arena.into_forest())
}

/// Pre-order flattening: each item followed by its flattened replies.
pub fn flatten<T>(forest: Forest<T>) -> Vec<T> {
    forest.into_flat()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::forest::Node;
    use rstest::rstest;

    #[derive(Debug, Clone, PartialEq, Eq)]
    struct Reply {
        id: u32,
        parent: Option<u32>,
    }

    impl Identifiable for Reply {
        type Id = u32;

        fn id(&self) -> &u32 {
            &self.id
        }

        fn parent_id(&self) -> Option<&u32> {
            self.parent.as_ref()
        }
    }

    fn r(id: u32, parent: Option<u32>) -> Reply {
        Reply { id, parent }
    }

    #[test]
    fn test_single_chain() {
        let forest = build_forest(vec![r(1, None), r(2, Some(1)), r(3, Some(2))]).unwrap();
        let expected = Forest::new(vec![Node::with_children(
            r(1, None),
            vec![Node::with_children(r(2, Some(1)), vec![Node::new(r(3, Some(2)))])],
        )]);
        assert_eq!(forest, expected);
    }

    #[test]
    fn test_child_listed_before_parent() {
        let forest = build_forest(vec![r(3, Some(2)), r(2, Some(1)), r(1, None)]).unwrap();
        let ids: Vec<_> = flatten(forest).into_iter().map(|x| x.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[rstest]
    #[case::self_parent(vec![r(1, Some(1))], "1")]
    #[case::two_cycle(vec![r(1, None), r(2, Some(3)), r(3, Some(2))], "2")]
    #[case::below_cycle(vec![r(4, Some(2)), r(2, Some(3)), r(3, Some(2))], "4")]
    fn test_cycles_are_rejected(#[case] items: Vec<Reply>, #[case] id: &str) {
        assert_eq!(
            build_forest(items),
            Err(DomainError::CycleDetected(id.to_string()))
        );
    }

    #[test]
    fn test_duplicate_id_is_rejected() {
        let result = build_forest(vec![r(1, None), r(2, Some(1)), r(1, None)]);
        assert_eq!(result, Err(DomainError::DuplicateId("1".to_string())));
    }

    #[test]
    fn test_borrowed_items() {
        let items = vec![r(1, None), r(2, Some(1))];
        let forest = build_forest(items.iter()).unwrap();
        assert_eq!(forest.len(), 2);
        assert_eq!(forest.roots()[0].item, &items[0]);
    }
}
