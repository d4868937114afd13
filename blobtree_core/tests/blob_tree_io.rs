use blobtree_core::{
    Blob, BlobCollection, BlobTree, BlobTreeNode, Error, SaveOptions, WalkOptions,
};
use std::fs;
use tempfile::TempDir;

fn sample_tree() -> BlobTree {
    let mut sub = BlobTreeNode::new("sub");
    sub.blobs.push(Blob::new("x.bin", vec![0x01]));

    let mut tree = BlobTree::new();
    tree.root_mut().blobs.push(Blob::new("readme.txt", vec![0x41, 0x42]));
    tree.root_mut().nodes.push(sub);
    tree
}

#[test]
fn save_writes_files_and_directories() {
    let temp_dir = TempDir::new().unwrap();
    let out = temp_dir.path().join("out");
    let tree = sample_tree();

    tree.save_to_directory(&out).unwrap();

    assert_eq!(fs::read(out.join("readme.txt")).unwrap(), b"AB");
    assert_eq!(fs::read(out.join("sub").join("x.bin")).unwrap(), vec![0x01]);
    assert_eq!(tree.compute_size(), 3);
}

#[test]
fn directory_roundtrip_preserves_structure_and_digest() {
    let temp_dir = TempDir::new().unwrap();
    let first = temp_dir.path().join("first");
    let second = temp_dir.path().join("second");

    let tree = sample_tree();
    tree.save_to_directory(&first).unwrap();

    let loaded = BlobTree::from_directory(&first).unwrap();
    assert_eq!(loaded.root().name, "first");
    assert_eq!(loaded.root().blobs, tree.root().blobs);
    assert_eq!(loaded.root().nodes, tree.root().nodes);
    assert_eq!(loaded.digest(), tree.digest());

    loaded
        .save_to_directory_with(&second, &SaveOptions { atomic: false })
        .unwrap();
    let again = BlobTree::from_directory_with(&second, &WalkOptions::default()).unwrap();
    assert_eq!(again.digest(), tree.digest());
}

#[test]
fn flatten_puts_descendants_first() {
    let mut sub = BlobTreeNode::new("s");
    sub.blobs.push(Blob::new("S", b"s".to_vec()));
    let mut root = BlobTreeNode::new("root");
    root.blobs.push(Blob::new("R", b"r".to_vec()));
    root.nodes.push(sub);

    let names: Vec<String> = BlobTree::from_root(root)
        .flatten()
        .into_iter()
        .map(|b| b.name)
        .collect();
    assert_eq!(names, vec!["S", "R"]);
}

#[test]
fn find_by_backslash_path() {
    let mut c = BlobTreeNode::new("c");
    c.blobs.push(Blob::new("leaf.txt", b"leaf".to_vec()));
    let mut b = BlobTreeNode::new("b");
    b.nodes.push(c);
    let mut a = BlobTreeNode::new("a");
    a.nodes.push(b);
    let mut tree = BlobTree::new();
    tree.root_mut().nodes.push(a);

    let found = tree.find_node("a\\b\\c", false).unwrap().unwrap();
    assert_eq!(found.name, "c");
    assert!(tree.find_node("a\\x", false).unwrap().is_none());
    assert!(tree.find_node("A\\B\\C", false).unwrap().is_none());
    assert!(tree.find_node("A\\B\\C", true).unwrap().is_some());

    let leaf = tree.find_blob("a\\b\\c\\LEAF.TXT", true).unwrap().unwrap();
    assert_eq!(leaf.content, b"leaf");

    assert!(matches!(
        tree.find_node("", false),
        Err(Error::InvalidArgument { .. })
    ));
}

#[test]
fn illegal_name_blocks_every_write() {
    let temp_dir = TempDir::new().unwrap();
    let out = temp_dir.path().join("out");

    let blobs: BlobCollection = vec![
        Blob::new("good.txt", b"ok".to_vec()),
        Blob::new("a:b", b"bad".to_vec()),
    ]
    .into_iter()
    .collect();

    assert!(matches!(
        blobs.save_to_directory(&out),
        Err(Error::IllegalFileName { .. })
    ));
    assert!(!out.join("good.txt").exists());
}

#[test]
fn illegal_nested_name_blocks_tree_save() {
    let temp_dir = TempDir::new().unwrap();
    let out = temp_dir.path().join("out");

    let mut tree = sample_tree();
    tree.root_mut()
        .find_node_mut("sub", false)
        .unwrap()
        .unwrap()
        .blobs
        .push(Blob::new("what?", b"?".to_vec()));

    assert!(tree.save_to_directory(&out).is_err());
    assert!(!out.join("readme.txt").exists());
}

#[test]
fn import_missing_directory_fails() {
    let temp_dir = TempDir::new().unwrap();

    assert!(matches!(
        BlobTree::from_directory(temp_dir.path().join("missing")),
        Err(Error::NotFound { .. })
    ));
}
