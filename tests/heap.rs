use std::cmp::Reverse;
use std::collections::BinaryHeap;

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use wabi_monitor::{Error, HeapNode, IndexableHeap, Natural};

/// The number of operations to perform in each proptest case.
const TEST_SIZE: usize = 2_000;

fn value_strategy() -> impl Strategy<Value = i32> {
    -500i32..500i32
}

// ─── Operations enum for driving randomized tests ────────────────────────────

#[derive(Debug, Clone)]
enum HeapOp {
    Insert(i32),
    RemoveMax,
    Max,
}

fn heap_op_strategy() -> impl Strategy<Value = HeapOp> {
    prop_oneof![
        5 => value_strategy().prop_map(HeapOp::Insert),
        3 => Just(HeapOp::RemoveMax),
        2 => Just(HeapOp::Max),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(20))]

    /// Replays insert/remove_max/max on both IndexableHeap and BinaryHeap.
    #[test]
    fn heap_ops_match_binary_heap(ops in proptest::collection::vec(heap_op_strategy(), TEST_SIZE)) {
        let mut heap: IndexableHeap<i32> = IndexableHeap::new();
        let mut model: BinaryHeap<i32> = BinaryHeap::new();

        for op in &ops {
            match op {
                HeapOp::Insert(v) => {
                    heap.insert(*v);
                    model.push(*v);
                }
                HeapOp::RemoveMax => prop_assert_eq!(heap.remove_max(), model.pop(), "remove_max()"),
                HeapOp::Max => prop_assert_eq!(heap.max(), model.peek(), "max()"),
            }
            prop_assert_eq!(heap.len(), model.len());
        }
    }

    /// top_k returns the k largest in descending order and leaves every handle usable.
    #[test]
    fn top_k_is_idempotent(
        values in proptest::collection::vec(value_strategy(), 0..TEST_SIZE),
        k in 0usize..64,
    ) {
        let mut heap = IndexableHeap::new();
        let nodes: Vec<HeapNode> = values.iter().map(|&v| heap.insert(v)).collect();

        let first: Vec<i32> = heap.top_k(k).into_iter().copied().collect();
        let second: Vec<i32> = heap.top_k(k).into_iter().copied().collect();

        let mut expected = values.clone();
        expected.sort_unstable_by_key(|&v| Reverse(v));
        expected.truncate(k);
        prop_assert_eq!(&first, &expected);
        prop_assert_eq!(&first, &second);
        prop_assert_eq!(heap.len(), values.len());

        for (node, v) in nodes.iter().zip(&values) {
            prop_assert_eq!(heap.get(*node), Some(v));
        }
    }

    /// Removing arbitrary nodes leaves the remaining elements draining in sorted order.
    #[test]
    fn remove_node_then_drain(
        values in proptest::collection::vec(value_strategy(), 1..TEST_SIZE),
        picks in proptest::collection::vec(any::<usize>(), 0..200),
    ) {
        let (mut heap, nodes) = IndexableHeap::from_values(Natural, values.iter().copied());
        let mut remaining: Vec<Option<i32>> = values.iter().copied().map(Some).collect();

        for pick in picks {
            let index = pick % nodes.len();
            let expected = remaining[index].take();
            match expected {
                Some(v) => prop_assert_eq!(heap.remove_node(nodes[index]), Ok(v)),
                None => {
                    let stale = matches!(heap.remove_node(nodes[index]), Err(Error::StaleHandle { .. }));
                    prop_assert!(stale);
                }
            }
        }

        let mut expected: Vec<i32> = remaining.into_iter().flatten().collect();
        expected.sort_unstable_by_key(|&v| Reverse(v));
        let drained: Vec<i32> = std::iter::from_fn(|| heap.remove_max()).collect();
        prop_assert_eq!(drained, expected);
    }
}

// ─── Re-prioritization ───────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
struct Cases {
    disease: &'static str,
    count: u32,
}

fn by_count(a: &Cases, b: &Cases) -> std::cmp::Ordering {
    a.count.cmp(&b.count)
}

#[test]
fn update_order_moves_both_ways() {
    let mut heap = IndexableHeap::with_comparator(by_count);
    let flu = heap.insert(Cases { disease: "Flu", count: 5 });
    let cold = heap.insert(Cases { disease: "Cold", count: 3 });
    let measles = heap.insert(Cases { disease: "Measles", count: 1 });

    heap.get_mut(measles).unwrap().count = 10;
    heap.update_order(measles).unwrap();
    assert_eq!(heap.max_node(), Some(measles));

    heap.get_mut(measles).unwrap().count = 0;
    heap.update_order(measles).unwrap();
    assert_eq!(heap.max_node(), Some(flu));

    heap.update(cold, |c| c.count = 6).unwrap();
    let order: Vec<_> = heap.top_k(3).into_iter().map(|c| c.disease).collect();
    assert_eq!(order, ["Cold", "Flu", "Measles"]);
}

#[test]
fn foreign_handle_is_rejected() {
    let mut a = IndexableHeap::new();
    let mut b = IndexableHeap::new();
    let node = a.insert(1u8);
    b.insert(1u8);
    assert!(!b.contains(node));
    assert!(matches!(b.update_order(node), Err(Error::StaleHandle { .. })));
    assert_eq!(b.len(), 1);
}

#[test]
fn clear_invalidates_handles() {
    let mut heap = IndexableHeap::with_capacity(4);
    let node = heap.insert("x");
    heap.clear();
    assert!(heap.is_empty());
    assert_eq!(heap.get(node), None);
    assert_eq!(heap.max(), None);
}
