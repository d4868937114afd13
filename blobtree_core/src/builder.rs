//! Stack-based fluent construction of [`TreeArena`] trees.

use crate::error::{Error, Result};
use crate::node::{NodeId, TreeArena};

/// Builds a tree by tracking the current insertion point on a stack.
///
/// ```
/// use blobtree_core::TreeNodeBuilder;
///
/// # fn main() -> blobtree_core::Result<()> {
/// let (tree, root) = TreeNodeBuilder::begin_tree(1)
///     .begin(2)?
///     .end()?
///     .begin(3)?
///     .end()?
///     .end_tree()?;
///
/// assert_eq!(tree.child_count(root), 2);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct TreeNodeBuilder<T> {
    /// `None` once the tree has been handed out by `end_tree`.
    tree: Option<TreeArena<T>>,
    stack: Vec<NodeId>,
}

impl<T> TreeNodeBuilder<T> {
    /// Start a tree whose root holds `value`.
    pub fn begin_tree(value: T) -> Self {
        let mut tree = TreeArena::new();
        let root = tree.new_node(value);
        Self {
            tree: Some(tree),
            stack: vec![root],
        }
    }

    fn building(&mut self) -> Result<(&mut TreeArena<T>, NodeId)> {
        let tree = self
            .tree
            .as_mut()
            .ok_or_else(|| Error::invalid_operation("tree already ended"))?;
        let top = *self
            .stack
            .last()
            .ok_or_else(|| Error::invalid_operation("builder stack is empty"))?;
        Ok((tree, top))
    }

    /// Add a child of the current node and make it the current node.
    pub fn begin(&mut self, value: T) -> Result<&mut Self> {
        let (tree, top) = self.building()?;
        let child = tree.add(top, value)?;
        self.stack.push(child);
        Ok(self)
    }

    /// Close the current node and resume at its parent.
    pub fn end(&mut self) -> Result<&mut Self> {
        self.building()?;
        if self.stack.len() <= 1 {
            return Err(Error::invalid_operation("no open node to end"));
        }
        self.stack.pop();
        Ok(self)
    }

    /// Add a leaf child of the current node; same as `begin` followed by `end`.
    pub fn add(&mut self, value: T) -> Result<&mut Self> {
        let (tree, top) = self.building()?;
        tree.add(top, value)?;
        Ok(self)
    }

    /// Number of nodes currently open, the root included.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Finish the tree and return it with its root.
    ///
    /// Every `begin` must have been matched by an `end`, and a builder can
    /// only be ended once.
    pub fn end_tree(&mut self) -> Result<(TreeArena<T>, NodeId)> {
        self.building()?;
        if self.stack.len() > 1 {
            return Err(Error::invalid_operation(format!(
                "{} node(s) still open",
                self.stack.len() - 1
            )));
        }

        let root = self
            .stack
            .pop()
            .ok_or_else(|| Error::invalid_operation("builder stack is empty"))?;
        let tree = self
            .tree
            .take()
            .ok_or_else(|| Error::invalid_operation("tree already ended"))?;
        Ok((tree, root))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn child_values(tree: &TreeArena<i32>, id: NodeId) -> Vec<i32> {
        tree.node(id)
            .unwrap()
            .children()
            .map(|n| *n.value())
            .collect()
    }

    #[test]
    fn test_build_two_children() {
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

        assert_eq!(tree.value(root), Some(&1));
        assert_eq!(child_values(&tree, root), vec![2, 3]);
        assert!(tree.is_root(root));
    }

    #[test]
    fn test_build_nested() {
        let mut builder = TreeNodeBuilder::begin_tree("a");
        builder.begin("b").unwrap().add("c").unwrap().add("d").unwrap();
        assert_eq!(builder.depth(), 2);
        builder.end().unwrap().add("e").unwrap();

        let (tree, root) = builder.end_tree().unwrap();
        let order: Vec<&str> = tree.descendants_and_self(root).map(|n| *n.value()).collect();
        assert_eq!(order, vec!["a", "b", "c", "d", "e"]);
    }

    #[test]
    fn test_unclosed_branch_fails() {
        let mut builder = TreeNodeBuilder::begin_tree(1);
        builder.begin(2).unwrap().end().unwrap().begin(3).unwrap();

        assert!(matches!(
            builder.end_tree(),
            Err(Error::InvalidOperation { .. })
        ));

        // Closing the branch makes the tree complete again
        builder.end().unwrap();
        assert!(builder.end_tree().is_ok());
    }

    #[test]
    fn test_end_tree_twice_fails() {
        let mut builder = TreeNodeBuilder::begin_tree(1);
        builder.end_tree().unwrap();

        assert!(matches!(
            builder.end_tree(),
            Err(Error::InvalidOperation { .. })
        ));
    }

    #[test]
    fn test_end_at_root_fails() {
        let mut builder = TreeNodeBuilder::begin_tree(1);

        assert!(matches!(builder.end(), Err(Error::InvalidOperation { .. })));
    }

    #[test]
    fn test_closed_builder_rejects_everything() {
        let mut builder = TreeNodeBuilder::begin_tree(1);
        builder.end_tree().unwrap();

        assert!(builder.begin(2).is_err());
        assert!(builder.add(2).is_err());
        assert!(builder.end().is_err());
    }
}
