//! Generic arena-backed n-ary tree.
//!
//! A [`TreeArena`] owns every node it creates. Nodes are addressed by a
//! [`NodeId`] handle; a node's `parent` is navigation only; ownership
//! always lives in the arena. A node without a parent is a root, so one
//! arena may hold several independent trees (a freshly created node and a
//! node detached by [`TreeArena::remove`] are both roots).
//!
//! Traversals return iterators that borrow the arena, so a tree cannot be
//! mutated while one of its enumerations is alive.

use crate::error::{Error, Result};
use generational_arena::{Arena, Index};
use std::fmt;
use tracing::instrument;

/// Handle to a node in a [`TreeArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(Index);

#[derive(Debug)]
struct Slot<T> {
    value: T,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Arena storage for generic tree nodes.
#[derive(Debug)]
pub struct TreeArena<T> {
    arena: Arena<Slot<T>>,
}

impl<T> Default for TreeArena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> TreeArena<T> {
    pub fn new() -> Self {
        Self {
            arena: Arena::new(),
        }
    }

    /// Number of nodes held by the arena, attached or not.
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.arena.contains(id.0)
    }

    /// Create a detached root node holding `value`.
    pub fn new_node(&mut self, value: T) -> NodeId {
        NodeId(self.arena.insert(Slot {
            value,
            parent: None,
            children: Vec::new(),
        }))
    }

    fn slot(&self, id: NodeId) -> Result<&Slot<T>> {
        self.arena
            .get(id.0)
            .ok_or_else(|| Error::invalid_argument(format!("unknown node {:?}", id)))
    }

    fn slot_mut(&mut self, id: NodeId) -> Result<&mut Slot<T>> {
        self.arena
            .get_mut(id.0)
            .ok_or_else(|| Error::invalid_argument(format!("unknown node {:?}", id)))
    }

    /// Borrowed view of a node, or `None` if `id` is not in this arena.
    pub fn node(&self, id: NodeId) -> Option<NodeRef<'_, T>> {
        self.contains(id).then_some(NodeRef { tree: self, id })
    }

    pub fn value(&self, id: NodeId) -> Option<&T> {
        self.arena.get(id.0).map(|slot| &slot.value)
    }

    pub fn value_mut(&mut self, id: NodeId) -> Option<&mut T> {
        self.arena.get_mut(id.0).map(|slot| &mut slot.value)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.arena.get(id.0).and_then(|slot| slot.parent)
    }

    /// Ordered children of `id`; empty for an unknown node.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.arena
            .get(id.0)
            .map(|slot| slot.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn child_count(&self, id: NodeId) -> usize {
        self.children(id).len()
    }

    /// Child of `id` at position `index`.
    pub fn child(&self, id: NodeId, index: usize) -> Result<NodeId> {
        let children = &self.slot(id)?.children;
        children
            .get(index)
            .copied()
            .ok_or_else(|| Error::index_out_of_range(index, children.len()))
    }

    pub fn is_root(&self, id: NodeId) -> bool {
        self.contains(id) && self.parent(id).is_none()
    }

    /// Wrap `value` in a new node and append it as the last child of `parent`.
    pub fn add(&mut self, parent: NodeId, value: T) -> Result<NodeId> {
        self.slot(parent)?;
        let child = self.new_node(value);
        self.link(parent, child);
        Ok(child)
    }

    /// Append an existing node as the last child of `parent`.
    ///
    /// A node that already has a parent is detached from it first. Attaching
    /// a node beneath itself or one of its own descendants would form a cycle
    /// and fails with [`Error::InvalidOperation`].
    #[instrument(level = "trace", skip(self))]
    pub fn attach(&mut self, parent: NodeId, node: NodeId) -> Result<NodeId> {
        self.slot(parent)?;
        self.slot(node)?;

        if self.ancestors_and_self(parent).any(|n| n.id() == node) {
            return Err(Error::invalid_operation(
                "cannot attach a node beneath itself or its descendants",
            ));
        }

        self.detach(node);
        self.link(parent, node);
        Ok(node)
    }

    /// Detach `node` from `parent`. Returns false, changing nothing, when
    /// `node` is not a child of `parent`.
    #[instrument(level = "trace", skip(self))]
    pub fn remove(&mut self, parent: NodeId, node: NodeId) -> Result<bool> {
        if !self.slot(parent)?.children.contains(&node) {
            return Ok(false);
        }
        self.detach(node);
        Ok(true)
    }

    /// Detach every direct child of `parent` matching `predicate`.
    pub fn remove_all<F>(&mut self, parent: NodeId, mut predicate: F) -> Result<usize>
    where
        F: FnMut(NodeRef<'_, T>) -> bool,
    {
        let tree: &Self = self;
        let matching: Vec<NodeId> = tree
            .slot(parent)?
            .children
            .iter()
            .copied()
            .filter(|&child| predicate(NodeRef { tree, id: child }))
            .collect();

        for &child in &matching {
            self.detach(child);
        }
        Ok(matching.len())
    }

    /// Detach every direct child of `parent` whose value matches `predicate`.
    pub fn remove_all_values<F>(&mut self, parent: NodeId, mut predicate: F) -> Result<usize>
    where
        F: FnMut(&T) -> bool,
    {
        self.remove_all(parent, |node| predicate(node.value()))
    }

    /// Detach each of `nodes` that is a child of `parent`; returns how many were.
    pub fn remove_range<I>(&mut self, parent: NodeId, nodes: I) -> Result<usize>
    where
        I: IntoIterator<Item = NodeId>,
    {
        let nodes: Vec<NodeId> = nodes.into_iter().collect();
        let mut removed = 0;
        for node in nodes {
            if self.remove(parent, node)? {
                removed += 1;
            }
        }
        Ok(removed)
    }

    /// Detach all children of `parent`.
    #[instrument(level = "trace", skip(self))]
    pub fn clear(&mut self, parent: NodeId) -> Result<()> {
        let children = std::mem::take(&mut self.slot_mut(parent)?.children);
        for child in children {
            if let Some(slot) = self.arena.get_mut(child.0) {
                slot.parent = None;
            }
        }
        Ok(())
    }

    /// Drop a detached subtree from the arena, returning the number of nodes freed.
    #[instrument(level = "trace", skip(self))]
    pub fn prune(&mut self, root: NodeId) -> Result<usize> {
        if self.slot(root)?.parent.is_some() {
            return Err(Error::invalid_operation(
                "only a detached node can be pruned",
            ));
        }

        let doomed: Vec<NodeId> = self.descendants_and_self(root).map(|n| n.id()).collect();
        for id in &doomed {
            self.arena.remove(id.0);
        }
        Ok(doomed.len())
    }

    fn link(&mut self, parent: NodeId, child: NodeId) {
        if let Some(slot) = self.arena.get_mut(parent.0) {
            slot.children.push(child);
        }
        if let Some(slot) = self.arena.get_mut(child.0) {
            slot.parent = Some(parent);
        }
    }

    fn detach(&mut self, node: NodeId) {
        let Some(parent) = self.parent(node) else {
            return;
        };
        if let Some(slot) = self.arena.get_mut(parent.0) {
            slot.children.retain(|&c| c != node);
        }
        if let Some(slot) = self.arena.get_mut(node.0) {
            slot.parent = None;
        }
    }

    /// Topmost ancestor of `id` (itself when it is a root).
    pub fn root(&self, id: NodeId) -> Option<NodeId> {
        self.ancestors_and_self(id).last().map(|n| n.id())
    }

    /// Number of parent hops from `id` to its root.
    pub fn level(&self, id: NodeId) -> Option<usize> {
        self.contains(id).then(|| self.ancestors(id).count())
    }

    /// Previous sibling, or `None` at a root or the start of the child list.
    pub fn left(&self, id: NodeId) -> Option<NodeId> {
        let siblings = self.children(self.parent(id)?);
        let pos = siblings.iter().position(|&c| c == id)?;
        pos.checked_sub(1).map(|p| siblings[p])
    }

    /// Next sibling, or `None` at a root or the end of the child list.
    pub fn right(&self, id: NodeId) -> Option<NodeId> {
        let siblings = self.children(self.parent(id)?);
        let pos = siblings.iter().position(|&c| c == id)?;
        siblings.get(pos + 1).copied()
    }

    /// Parent, grandparent, ... up to the root; excludes `id`.
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_, T> {
        Ancestors {
            tree: self,
            next: self.parent(id),
        }
    }

    /// `id` first, then its ancestors.
    pub fn ancestors_and_self(&self, id: NodeId) -> Ancestors<'_, T> {
        Ancestors {
            tree: self,
            next: self.contains(id).then_some(id),
        }
    }

    /// Depth-first pre-order walk below `id`; excludes `id`.
    pub fn descendants(&self, id: NodeId) -> Descendants<'_, T> {
        Descendants {
            tree: self,
            stack: self.children(id).iter().rev().copied().collect(),
        }
    }

    /// `id` first, then its descendants in pre-order.
    pub fn descendants_and_self(&self, id: NodeId) -> Descendants<'_, T> {
        let stack = if self.contains(id) { vec![id] } else { Vec::new() };
        Descendants { tree: self, stack }
    }

    /// Other children of `id`'s parent; empty at a root.
    pub fn siblings(&self, id: NodeId) -> Siblings<'_, T> {
        self.siblings_inner(id, Some(id))
    }

    /// All children of `id`'s parent, `id` included; empty at a root.
    pub fn siblings_and_self(&self, id: NodeId) -> Siblings<'_, T> {
        self.siblings_inner(id, None)
    }

    fn siblings_inner(&self, id: NodeId, skip: Option<NodeId>) -> Siblings<'_, T> {
        let peers: &[NodeId] = match self.parent(id) {
            Some(parent) => self.children(parent),
            None => &[],
        };
        Siblings {
            tree: self,
            inner: peers.iter(),
            skip,
        }
    }
}

/// Borrowed view of one node.
///
/// Two views compare equal when their values are equal; children are not
/// compared.
pub struct NodeRef<'a, T> {
    tree: &'a TreeArena<T>,
    id: NodeId,
}

impl<'a, T> NodeRef<'a, T> {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn value(&self) -> &'a T {
        // A NodeRef is only handed out for an id present in the arena, and the
        // shared borrow keeps it there.
        &self.tree.arena[self.id.0].value
    }

    pub fn parent(&self) -> Option<NodeRef<'a, T>> {
        self.tree.parent(self.id).and_then(|p| self.tree.node(p))
    }

    pub fn children(self) -> impl Iterator<Item = NodeRef<'a, T>> + 'a {
        let tree = self.tree;
        tree.children(self.id)
            .iter()
            .map(move |&id| NodeRef { tree, id })
    }

    pub fn child_count(&self) -> usize {
        self.tree.child_count(self.id)
    }

    pub fn level(&self) -> usize {
        self.tree.ancestors(self.id).count()
    }

    pub fn is_root(&self) -> bool {
        self.tree.parent(self.id).is_none()
    }
}

impl<T> Clone for NodeRef<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for NodeRef<'_, T> {}

impl<T: PartialEq> PartialEq for NodeRef<'_, T> {
    fn eq(&self, other: &Self) -> bool {
        self.value() == other.value()
    }
}

impl<T: fmt::Debug> fmt::Debug for NodeRef<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeRef")
            .field("id", &self.id)
            .field("value", self.value())
            .finish()
    }
}

/// Iterator over a node's ancestor chain.
pub struct Ancestors<'a, T> {
    tree: &'a TreeArena<T>,
    next: Option<NodeId>,
}

impl<'a, T> Iterator for Ancestors<'a, T> {
    type Item = NodeRef<'a, T>;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = self.tree.parent(current);
        self.tree.node(current)
    }
}

/// Pre-order depth-first iterator using an explicit stack.
pub struct Descendants<'a, T> {
    tree: &'a TreeArena<T>,
    stack: Vec<NodeId>,
}

impl<'a, T> Iterator for Descendants<'a, T> {
    type Item = NodeRef<'a, T>;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.stack.pop()?;
        // Push children in reverse order for left-to-right traversal
        self.stack
            .extend(self.tree.children(current).iter().rev().copied());
        self.tree.node(current)
    }
}

/// Iterator over the children of a node's parent.
pub struct Siblings<'a, T> {
    tree: &'a TreeArena<T>,
    inner: std::slice::Iter<'a, NodeId>,
    skip: Option<NodeId>,
}

impl<'a, T> Iterator for Siblings<'a, T> {
    type Item = NodeRef<'a, T>;

    fn next(&mut self) -> Option<Self::Item> {
        let tree = self.tree;
        let skip = self.skip;
        self.inner
            .find(|&&id| Some(id) != skip)
            .and_then(|&id| tree.node(id))
    }
}
