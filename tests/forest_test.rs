//! Tests for build_forest / flatten

use std::collections::HashMap;

use rstest::rstest;

use replytree::{build_forest, flatten, DomainError, Forest, Identifiable, Node};

#[derive(Debug, Clone, PartialEq, Eq)]
struct Item {
    id: u32,
    parent: Option<u32>,
}

impl Identifiable for Item {
    type Id = u32;

    fn id(&self) -> &u32 {
        &self.id
    }

    fn parent_id(&self) -> Option<&u32> {
        self.parent.as_ref()
    }
}

fn item(id: u32, parent: Option<u32>) -> Item {
    Item { id, parent }
}

fn ids(items: &[Item]) -> Vec<u32> {
    items.iter().map(|i| i.id).collect()
}

// ============================================================
// Basic shapes
// ============================================================

#[test]
fn given_empty_input_when_building_then_returns_empty_forest() {
    let forest = build_forest(Vec::<Item>::new()).unwrap();
    assert!(forest.is_empty());
    assert_eq!(forest, Forest::default());
    assert!(flatten(forest).is_empty());
}

#[test]
fn given_single_root_when_building_then_returns_leaf_node() {
    let forest = build_forest(vec![item(1, None)]).unwrap();
    assert_eq!(forest, Forest::new(vec![Node::new(item(1, None))]));
}

#[test]
fn given_chain_when_building_then_nests_grandchild() {
    // A(1) -> B(2) -> C(3)
    let items = vec![item(1, None), item(2, Some(1)), item(3, Some(2))];

    let forest = build_forest(items.clone()).unwrap();

    assert_eq!(forest.roots().len(), 1);
    let a = &forest.roots()[0];
    assert_eq!(a.item.id, 1);
    assert_eq!(a.children.len(), 1);
    let b = &a.children[0];
    assert_eq!(b.item.id, 2);
    assert_eq!(b.children.len(), 1);
    assert_eq!(b.children[0].item.id, 3);
    assert!(b.children[0].is_leaf());

    assert_eq!(flatten(forest), items);
}

#[test]
fn given_siblings_out_of_id_order_when_building_then_keeps_input_order() {
    // [A, C, B] with B and C both replying to A
    let forest = build_forest(vec![item(1, None), item(3, Some(1)), item(2, Some(1))]).unwrap();

    let children: Vec<u32> = forest.roots()[0]
        .children
        .iter()
        .map(|c| c.item.id)
        .collect();
    assert_eq!(children, vec![3, 2]);
}

#[test]
fn given_unknown_parent_when_building_then_promotes_to_root() {
    let forest = build_forest(vec![item(1, None), item(2, Some(99)), item(3, Some(2))]).unwrap();

    let roots: Vec<u32> = forest.roots().iter().map(|n| n.item.id).collect();
    assert_eq!(roots, vec![1, 2]);
    assert_eq!(forest.roots()[1].children[0].item.id, 3);
    assert_eq!(forest.len(), 3);
}

#[test]
fn given_same_input_twice_when_building_then_forests_are_equal() {
    let items = vec![item(1, None), item(2, Some(1)), item(4, None), item(3, Some(1))];
    assert_eq!(
        build_forest(items.clone()).unwrap(),
        build_forest(items).unwrap()
    );
}

#[test]
fn given_multiple_threads_when_flattening_then_concatenates_in_root_order() {
    //  1        5
    //  ├── 2    └── 6
    //  │   └── 4
    //  └── 3
    let items = vec![
        item(5, None),
        item(1, None),
        item(6, Some(5)),
        item(3, Some(1)),
        item(4, Some(2)),
        item(2, Some(1)),
    ];
    let forest = build_forest(items).unwrap();

    // 3 is listed before 2 in the input, so it stays first among 1's replies
    assert_eq!(ids(&flatten(forest)), vec![5, 6, 1, 3, 2, 4]);
}

// ============================================================
// Rejected input
// ============================================================

#[rstest]
#[case::self_parent(vec![item(1, Some(1))], "1")]
#[case::two_cycle(vec![item(1, Some(2)), item(2, Some(1))], "1")]
#[case::three_cycle_beside_root(
    vec![item(9, None), item(1, Some(3)), item(2, Some(1)), item(3, Some(2))],
    "1"
)]
fn given_parent_cycle_when_building_then_errors(#[case] items: Vec<Item>, #[case] id: &str) {
    assert_eq!(
        build_forest(items),
        Err(DomainError::CycleDetected(id.to_string()))
    );
}

#[test]
fn given_duplicate_ids_when_building_then_errors() {
    let result = build_forest(vec![item(1, None), item(1, None)]);
    assert_eq!(result, Err(DomainError::DuplicateId("1".to_string())));
}

// ============================================================
// Structural properties
// ============================================================

fn chain(len: u32) -> Vec<Item> {
    (0..len)
        .map(|i| item(i, if i == 0 { None } else { Some(i - 1) }))
        .collect()
}

#[test]
fn given_deep_chain_when_building_then_flattens_in_order() {
    let items = chain(1000);

    let forest = build_forest(items.clone()).unwrap();

    assert_eq!(forest.depth(), 1000);
    assert_eq!(forest.leaves().len(), 1);
    assert_eq!(flatten(forest), items);
}

#[test]
fn given_very_deep_chain_when_using_forest_then_nothing_recurses_per_level() {
    let depth = 200_000;
    let items = chain(depth);

    let forest = build_forest(items.clone()).unwrap();
    assert_eq!(forest.len(), depth as usize);
    assert_eq!(forest.depth(), depth as usize);
    assert_eq!(forest.leaves(), vec![&items[depth as usize - 1]]);

    let copy = forest.clone();
    assert_eq!(copy, forest);
    drop(copy);

    assert_eq!(flatten(forest), items);
}

#[test]
fn given_very_deep_chain_when_serializing_then_emits_flat_entries() {
    let depth = 200_000;
    let forest = Forest::from_preorder((0..depth).map(|level| (level, level)));
    assert_eq!(forest.depth(), depth);

    let json = serde_json::to_string(&forest).unwrap();

    assert!(json.starts_with(r#"[{"depth":0,"item":0},{"depth":1,"item":1},"#));
    assert!(json.ends_with(&format!(r#"{{"depth":{0},"item":{0}}}]"#, depth - 1)));
}

#[test]
fn given_very_deep_chain_when_dropping_forest_then_completes() {
    let forest = build_forest(chain(250_000)).unwrap();
    drop(forest);
}

/// Deterministic pseudo-random source so failures are reproducible.
struct Lcg(u64);

impl Lcg {
    fn next(&mut self, bound: u32) -> u32 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        ((self.0 >> 33) % bound as u64) as u32
    }
}

/// Random acyclic collection: item `i` replies to an earlier id, to nothing,
/// or to an id outside the collection. The list is then shuffled.
fn random_items(rng: &mut Lcg, n: u32) -> Vec<Item> {
    let mut items: Vec<Item> = (0..n)
        .map(|i| {
            let parent = match rng.next(5) {
                0 => None,
                1 => Some(10_000 + i),
                _ if i > 0 => Some(rng.next(i)),
                _ => None,
            };
            item(i, parent)
        })
        .collect();
    for i in (1..items.len()).rev() {
        let j = rng.next(i as u32 + 1) as usize;
        items.swap(i, j);
    }
    items
}

#[test]
fn given_random_acyclic_input_when_flattening_then_is_topological_permutation() {
    let mut rng = Lcg(42);
    for round in 0..200 {
        let n = rng.next(40) + 1;
        let items = random_items(&mut rng, n);

        let forest = build_forest(items.clone()).unwrap();
        assert_eq!(forest.len(), items.len(), "round {}", round);
        let flat = flatten(forest);

        // permutation
        let mut expected = ids(&items);
        let mut actual = ids(&flat);
        expected.sort_unstable();
        actual.sort_unstable();
        assert_eq!(actual, expected, "round {}", round);

        // every present parent comes before its reply
        let position: HashMap<u32, usize> =
            flat.iter().enumerate().map(|(pos, i)| (i.id, pos)).collect();
        for reply in &flat {
            if let Some(parent_pos) = reply.parent.and_then(|p| position.get(&p)) {
                assert!(*parent_pos < position[&reply.id], "round {}", round);
            }
        }
    }
}

#[test]
fn given_random_input_when_building_then_siblings_keep_input_order() {
    let mut rng = Lcg(7);
    for _ in 0..100 {
        let n = rng.next(30) + 1;
        let items = random_items(&mut rng, n);
        let input_pos: HashMap<u32, usize> =
            items.iter().enumerate().map(|(pos, i)| (i.id, pos)).collect();

        let forest = build_forest(items).unwrap();

        let roots: Vec<usize> = forest.roots().iter().map(|n| input_pos[&n.item.id]).collect();
        assert!(roots.windows(2).all(|w| w[0] < w[1]));
        for (_, node) in forest.walk() {
            let order: Vec<usize> = node.children.iter().map(|c| input_pos[&c.item.id]).collect();
            assert!(order.windows(2).all(|w| w[0] < w[1]));
        }
    }
}
