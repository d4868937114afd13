use blobtree_core::{Error, NodeId, TreeArena, TreeNodeBuilder};
use proptest::prelude::*;

/// Build a random tree: node `i` (for i > 0) is a child of `parents[i - 1] % i`.
fn random_tree(parents: &[usize]) -> (TreeArena<usize>, Vec<NodeId>) {
    let mut tree = TreeArena::new();
    let mut ids = vec![tree.new_node(0)];
    for (i, p) in parents.iter().enumerate() {
        let value = i + 1;
        let parent = ids[p % value];
        ids.push(tree.add(parent, value).unwrap());
    }
    (tree, ids)
}

#[test]
fn reparenting_moves_node_between_parents() {
    let mut tree = TreeArena::new();
    let a = tree.new_node("a");
    let b = tree.new_node("b");
    let child = tree.add(a, "child").unwrap();

    tree.attach(b, child).unwrap();

    assert_eq!(tree.parent(child), Some(b));
    assert!(!tree.children(a).contains(&child));
    assert_eq!(tree.children(b), &[child]);
}

#[test]
fn remove_detaches_and_reports_presence() {
    let mut tree = TreeArena::new();
    let root = tree.new_node(1);
    let child = tree.add(root, 2).unwrap();
    let stranger = tree.new_node(3);

    assert!(tree.remove(root, child).unwrap());
    assert!(tree.is_root(child));
    assert!(tree.children(root).is_empty());

    assert!(!tree.remove(root, stranger).unwrap());
    assert!(tree.is_root(stranger));
}

#[test]
fn descendants_restartable_and_self_first() {
    let (tree, root) = TreeNodeBuilder::begin_tree('r')
        .begin('a')
        .unwrap()
        .add('b')
        .unwrap()
        .end()
        .unwrap()
        .add('c')
        .unwrap()
        .end_tree()
        .unwrap();

    let first: Vec<char> = tree.descendants(root).map(|n| *n.value()).collect();
    let second: Vec<char> = tree.descendants(root).map(|n| *n.value()).collect();
    assert_eq!(first, vec!['a', 'b', 'c']);
    assert_eq!(first, second);

    let with_self = tree.descendants_and_self(root).next().unwrap();
    assert_eq!(with_self.id(), root);
}

#[test]
fn equality_ignores_children() {
    let mut tree = TreeArena::new();
    let bare = tree.new_node(5);
    let parent = tree.new_node(5);
    tree.add(parent, 6).unwrap();
    tree.add(parent, 7).unwrap();

    assert_eq!(tree.node(bare).unwrap(), tree.node(parent).unwrap());
}

#[test]
fn builder_requires_matched_ends() {
    let mut builder = TreeNodeBuilder::begin_tree(1);
    builder.begin(2).unwrap().end().unwrap().begin(3).unwrap();
    assert!(matches!(
        builder.end_tree(),
        Err(Error::InvalidOperation { .. })
    ));

    let (tree, root) = TreeNodeBuilder::begin_tree(1)
        .begin(2)
        .unwrap()
        .end()
        .unwrap()
        .begin(3)
        .unwrap()
        .end()
        .unwrap()
        .end_tree()
        .unwrap();
    let values: Vec<i32> = tree.node(root).unwrap().children().map(|n| *n.value()).collect();
    assert_eq!(values, vec![2, 3]);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn root_has_no_parent_and_is_shared(parents in prop::collection::vec(any::<usize>(), 0..60)) {
        let (tree, ids) = random_tree(&parents);
        let root = ids[0];

        for &id in &ids {
            let node_root = tree.root(id).unwrap();
            prop_assert_eq!(node_root, root);
            prop_assert!(tree.parent(node_root).is_none());
            for ancestor in tree.ancestors(id) {
                prop_assert_eq!(tree.root(ancestor.id()), Some(root));
            }
        }
        prop_assert_eq!(tree.descendants(root).count(), ids.len() - 1);
    }

    #[test]
    fn siblings_partition_parent_children(parents in prop::collection::vec(any::<usize>(), 1..40)) {
        let (tree, ids) = random_tree(&parents);

        for &id in &ids[1..] {
            let parent = tree.parent(id).unwrap();
            let siblings = tree.siblings(id).count();
            prop_assert_eq!(siblings + 1, tree.child_count(parent));
            prop_assert!(tree.siblings(id).all(|s| s.id() != id));
            prop_assert_eq!(tree.siblings_and_self(id).count(), tree.child_count(parent));
        }
    }
}
