//! The AVL engine: an ordered set of keys whose nodes can carry a reference
//! to a node in another tree.

use std::borrow::Borrow;
use std::cmp::{self, Ordering};
use std::fmt;
use std::iter::FusedIterator;

use tracing::trace;

use crate::arena::{Arena, Handle};
use crate::error::{Error, Result};

type Link = Option<Handle>;

#[derive(Clone)]
struct Node<K> {
    key: K,
    pair: Link,
    left: Link,
    right: Link,
    parent: Link,
    height: usize,
}

impl<K> Node<K> {
    fn new(parent: Link, key: K, pair: Link) -> Self {
        Self {
            key,
            pair,
            left: None,
            right: None,
            parent,
            height: 0,
        }
    }
}

/// A self-balancing binary search tree of unique keys.
///
/// Every node is addressed by a [`Handle`] that stays valid for the node's
/// whole lifetime, including across rotations and removals of other nodes.
/// A node may store the handle of a counterpart node living elsewhere
/// (its *pair*); the tree keeps it alongside the key and never interprets it.
#[derive(Clone)]
pub struct Tree<K> {
    nodes: Arena<Node<K>>,
    root: Link,
}

/// An in-order iterator over the handles and keys of a tree.
pub struct Iter<'a, K> {
    tree: &'a Tree<K>,
    front: Link,
    back: Link,
    remaining: usize,
}

#[cfg(any(test, feature = "consistency_check"))]
#[allow(clippy::enum_variant_names)]
enum Direction {
    FromParent,
    FromLeft,
    FromRight,
}

impl<K> Tree<K> {
    /// Creates an empty tree.
    /// No memory is allocated until the first key is inserted.
    pub fn new() -> Self {
        Self {
            nodes: Arena::new(),
            root: None,
        }
    }

    /// Returns true if the tree contains no keys.
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Returns the number of keys in the tree.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns the height of the root node, a single node having height 0.
    /// Returns `None` for an empty tree.
    pub fn height(&self) -> Option<usize> {
        self.root.map(|root_ptr| self.nodes[root_ptr].height)
    }

    /// Removes all keys. Handles obtained before stay dead afterwards.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.root = None;
    }

    /// Makes sure the next `additional` insertions cannot fail for lack of memory.
    pub fn reserve(&mut self, additional: usize) -> Result<()> {
        self.nodes.reserve(additional)
    }

    /// Returns the key stored at `handle`, or `None` if the node is gone.
    pub fn key(&self, handle: Handle) -> Option<&K> {
        self.nodes.get(handle).map(|node| &node.key)
    }

    /// Returns the pair reference stored at `handle`.
    pub fn pair(&self, handle: Handle) -> Option<Handle> {
        self.nodes.get(handle).and_then(|node| node.pair)
    }

    /// Replaces the pair reference stored at `handle`.
    pub fn set_pair(&mut self, handle: Handle, pair: Option<Handle>) -> Result<()> {
        let node = self.nodes.get_mut(handle).ok_or(Error::KeyNotFound)?;
        node.pair = pair;
        Ok(())
    }

    /// Returns true if `handle` refers to a node of this tree.
    pub fn contains_handle(&self, handle: Handle) -> bool {
        self.nodes.contains(handle)
    }

    /// Height of the subtree rooted at `handle`.
    pub fn node_height(&self, handle: Handle) -> Option<usize> {
        self.nodes.get(handle).map(|node| node.height)
    }

    /// `height(right) - height(left)` at `handle`, an absent child counting as -1.
    pub fn balance_factor(&self, handle: Handle) -> Option<isize> {
        self.nodes
            .get(handle)
            .map(|node| self.height_of(node.right) - self.height_of(node.left))
    }

    /// Returns the node holding the smallest key.
    pub fn min(&self) -> Result<Handle> {
        self.root
            .map(|root_ptr| self.leftmost(root_ptr))
            .ok_or(Error::EmptyStructure)
    }

    /// Returns the node holding the largest key.
    pub fn max(&self) -> Result<Handle> {
        self.root
            .map(|root_ptr| self.rightmost(root_ptr))
            .ok_or(Error::EmptyStructure)
    }

    /// Removes the node at `handle` and returns its key and pair reference.
    pub fn remove_at(&mut self, handle: Handle) -> Result<(K, Option<Handle>)> {
        if !self.nodes.contains(handle) {
            return Err(Error::KeyNotFound);
        }
        self.unlink_node(handle);
        let node = self.nodes.remove(handle).ok_or(Error::KeyNotFound)?;
        trace!(len = self.len(), "removed tree node");
        Ok((node.key, node.pair))
    }

    /// Gets an iterator over the handles and keys of the tree, in sorted order.
    pub fn iter(&self) -> Iter<'_, K> {
        Iter {
            tree: self,
            front: self.min().ok(),
            back: self.max().ok(),
            remaining: self.len(),
        }
    }

    fn leftmost(&self, mut node_ptr: Handle) -> Handle {
        while let Some(left_ptr) = self.nodes[node_ptr].left {
            node_ptr = left_ptr;
        }
        node_ptr
    }

    fn rightmost(&self, mut node_ptr: Handle) -> Handle {
        while let Some(right_ptr) = self.nodes[node_ptr].right {
            node_ptr = right_ptr;
        }
        node_ptr
    }

    fn successor(&self, node_ptr: Handle) -> Link {
        if let Some(right_ptr) = self.nodes[node_ptr].right {
            return Some(self.leftmost(right_ptr));
        }
        let mut child_ptr = node_ptr;
        let mut current = self.nodes[node_ptr].parent;
        while let Some(parent_ptr) = current {
            if self.nodes[parent_ptr].left == Some(child_ptr) {
                return Some(parent_ptr);
            }
            child_ptr = parent_ptr;
            current = self.nodes[parent_ptr].parent;
        }
        None
    }

    fn predecessor(&self, node_ptr: Handle) -> Link {
        if let Some(left_ptr) = self.nodes[node_ptr].left {
            return Some(self.rightmost(left_ptr));
        }
        let mut child_ptr = node_ptr;
        let mut current = self.nodes[node_ptr].parent;
        while let Some(parent_ptr) = current {
            if self.nodes[parent_ptr].right == Some(child_ptr) {
                return Some(parent_ptr);
            }
            child_ptr = parent_ptr;
            current = self.nodes[parent_ptr].parent;
        }
        None
    }

    // Points the parent's link (or the root) that referred to `old` at `new`.
    fn replace_child(&mut self, parent: Link, old: Handle, new: Link) {
        match parent {
            None => self.root = new,
            Some(parent_ptr) => {
                let parent_node = &mut self.nodes[parent_ptr];
                if parent_node.left == Some(old) {
                    parent_node.left = new;
                } else {
                    parent_node.right = new;
                }
            }
        }
    }

    fn unlink_node(&mut self, node_ptr: Handle) {
        let left = self.nodes[node_ptr].left;
        let parent = self.nodes[node_ptr].parent;

        // Check if node to-unlink has right sub tree
        if let Some(mut min_child_ptr) = self.nodes[node_ptr].right {
            // Find smallest child node in right sub tree
            let mut min_child_parent_ptr = node_ptr;
            while let Some(left_ptr) = self.nodes[min_child_ptr].left {
                min_child_parent_ptr = min_child_ptr;
                min_child_ptr = left_ptr;
            }

            // Smallest child node is stem or leaf, unlink from tree
            let min_child_right = self.nodes[min_child_ptr].right;
            if self.nodes[min_child_parent_ptr].left == Some(min_child_ptr) {
                self.nodes[min_child_parent_ptr].left = min_child_right;
            } else {
                self.nodes[min_child_parent_ptr].right = min_child_right;
            }
            if let Some(right_ptr) = min_child_right {
                self.nodes[right_ptr].parent = Some(min_child_parent_ptr);
            }

            // Move the smallest child node, key and pair together, into the
            // position of the node to-unlink (up to 6 links)
            let right = self.nodes[node_ptr].right;
            self.nodes[min_child_ptr].left = left;
            if let Some(left_ptr) = left {
                self.nodes[left_ptr].parent = Some(min_child_ptr);
            }
            self.nodes[min_child_ptr].right = right;
            if let Some(right_ptr) = right {
                self.nodes[right_ptr].parent = Some(min_child_ptr);
            }
            self.nodes[min_child_ptr].parent = parent;
            self.replace_child(parent, node_ptr, Some(min_child_ptr));

            // Parent of smallest child node might be out of balance now
            let rebalance_from = if min_child_parent_ptr == node_ptr {
                // Parent is node to-unlink and has been replaced by smallest child
                min_child_ptr
            } else {
                min_child_parent_ptr
            };
            self.rebalance(Some(rebalance_from));
        } else {
            // Node to-unlink is stem or leaf, unlink from tree
            if let Some(left_ptr) = left {
                self.nodes[left_ptr].parent = parent;
            }
            self.replace_child(parent, node_ptr, left);
            // Parent node might be out of balance now
            self.rebalance(parent);
        }
    }

    fn height_of(&self, link: Link) -> isize {
        match link {
            None => -1,
            Some(node_ptr) => self.nodes[node_ptr].height as isize,
        }
    }

    fn balance_of(&self, node_ptr: Handle) -> isize {
        let node = &self.nodes[node_ptr];
        self.height_of(node.right) - self.height_of(node.left)
    }

    fn adjust_height(&mut self, node_ptr: Handle) {
        let node = &self.nodes[node_ptr];
        let height = 1 + cmp::max(self.height_of(node.left), self.height_of(node.right));
        self.nodes[node_ptr].height = height as usize;
    }

    fn rotate_left(&mut self, node_ptr: Handle) {
        if let Some(right_ptr) = self.nodes[node_ptr].right {
            let right_left = self.nodes[right_ptr].left;
            self.nodes[node_ptr].right = right_left;
            if let Some(right_left_ptr) = right_left {
                self.nodes[right_left_ptr].parent = Some(node_ptr);
            }

            let parent = self.nodes[node_ptr].parent;
            self.nodes[right_ptr].parent = parent;
            self.replace_child(parent, node_ptr, Some(right_ptr));

            self.nodes[right_ptr].left = Some(node_ptr);
            self.nodes[node_ptr].parent = Some(right_ptr);

            self.adjust_height(node_ptr);
            self.adjust_height(right_ptr);
        }
    }

    fn rotate_right(&mut self, node_ptr: Handle) {
        if let Some(left_ptr) = self.nodes[node_ptr].left {
            let left_right = self.nodes[left_ptr].right;
            self.nodes[node_ptr].left = left_right;
            if let Some(left_right_ptr) = left_right {
                self.nodes[left_right_ptr].parent = Some(node_ptr);
            }

            let parent = self.nodes[node_ptr].parent;
            self.nodes[left_ptr].parent = parent;
            self.replace_child(parent, node_ptr, Some(left_ptr));

            self.nodes[left_ptr].right = Some(node_ptr);
            self.nodes[node_ptr].parent = Some(left_ptr);

            self.adjust_height(node_ptr);
            self.adjust_height(left_ptr);
        }
    }

    /// Rebalances nodes starting from given position up to the root node.
    fn rebalance(&mut self, start_from: Link) {
        let mut current = start_from;
        while let Some(node_ptr) = current {
            let parent = self.nodes[node_ptr].parent;
            self.rebalance_node(node_ptr);
            current = parent;
        }
    }

    /// Rebalances nodes starting from given position up to the root node.
    /// Stops after first rebalance operation.
    /// This is enough to restore balance after a single insert operation.
    fn rebalance_once(&mut self, start_from: Link) {
        let mut current = start_from;
        while let Some(node_ptr) = current {
            let parent = self.nodes[node_ptr].parent;
            if self.rebalance_node(node_ptr) {
                break;
            }
            current = parent;
        }
    }

    /// Restores AVL condition (balance) at given node if necessary and adjusts height.
    /// Resulting balance factor will be -1, 0 or +1.
    /// Initial balance factor must not exceed -2 or +2, which always holds after a single update.
    /// Returns whether rebalancing had been necessary.
    fn rebalance_node(&mut self, node_ptr: Handle) -> bool {
        let balance = self.balance_of(node_ptr);
        debug_assert!((-2..=2).contains(&balance));
        if balance < -1 {
            // Left-heavy, rotate right (left child first if it leans right)
            if let Some(left_ptr) = self.nodes[node_ptr].left {
                if self.balance_of(left_ptr) > 0 {
                    self.rotate_left(left_ptr);
                }
            }
            self.rotate_right(node_ptr);
            true
        } else if balance > 1 {
            // Right-heavy, rotate left (right child first if it leans left)
            if let Some(right_ptr) = self.nodes[node_ptr].right {
                if self.balance_of(right_ptr) < 0 {
                    self.rotate_right(right_ptr);
                }
            }
            self.rotate_left(node_ptr);
            true
        } else {
            self.adjust_height(node_ptr);
            false
        }
    }
}

impl<K: Ord> Tree<K> {
    /// Returns the handle of the node whose key equals `key`.
    ///
    /// The key may be any borrowed form of the tree's key type, but the ordering
    /// on the borrowed form *must* match the ordering on the key type.
    pub fn find<Q>(&self, key: &Q) -> Option<Handle>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut current = self.root;
        while let Some(node_ptr) = current {
            let node = &self.nodes[node_ptr];
            current = match key.cmp(node.key.borrow()) {
                Ordering::Equal => break,
                Ordering::Less => node.left,
                Ordering::Greater => node.right,
            };
        }
        current
    }

    /// Returns a reference to the stored key equal to `key`.
    pub fn get<Q>(&self, key: &Q) -> Option<&K>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.find(key).map(|node_ptr| &self.nodes[node_ptr].key)
    }

    /// Returns true if the tree contains a key equal to `key`.
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.find(key).is_some()
    }

    /// Inserts a key together with its pair reference and returns the new node's handle.
    ///
    /// Fails with [`Error::DuplicateKey`] if an equal key is present, leaving the
    /// tree unchanged; [`Tree::find`] yields the existing node in that case.
    pub fn insert(&mut self, key: K, pair: Option<Handle>) -> Result<Handle> {
        let Some((parent, side)) = self.find_insert_pos(&key) else {
            return Err(Error::DuplicateKey);
        };
        let node_ptr = self.nodes.try_insert(Node::new(parent, key, pair))?;
        match parent {
            None => self.root = Some(node_ptr),
            Some(parent_ptr) => {
                if side == Ordering::Less {
                    self.nodes[parent_ptr].left = Some(node_ptr);
                } else {
                    self.nodes[parent_ptr].right = Some(node_ptr);
                }
            }
        }
        self.rebalance_once(parent);
        trace!(len = self.len(), "inserted tree node");
        Ok(node_ptr)
    }

    /// Removes the key equal to `key` and returns the stored key and its pair reference.
    pub fn remove<Q>(&mut self, key: &Q) -> Result<(K, Option<Handle>)>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let node_ptr = self.find(key).ok_or(Error::KeyNotFound)?;
        self.remove_at(node_ptr)
    }

    // Returns the parent of the insert position and the side to attach on,
    // or `None` if the key is already present.
    fn find_insert_pos(&self, key: &K) -> Option<(Link, Ordering)> {
        let mut parent: Link = None;
        let mut side = Ordering::Equal;
        let mut current = self.root;
        while let Some(node_ptr) = current {
            let node = &self.nodes[node_ptr];
            side = key.cmp(&node.key);
            current = match side {
                Ordering::Equal => return None,
                Ordering::Less => node.left,
                Ordering::Greater => node.right,
            };
            parent = Some(node_ptr);
        }
        Some((parent, side))
    }

    #[cfg(any(test, feature = "consistency_check"))]
    pub fn check_consistency(&self) {
        // Check root link
        if let Some(root_ptr) = self.root {
            assert!(self.nodes[root_ptr].parent.is_none());
        }

        // Check tree nodes
        let mut num_nodes = 0;
        let mut previous: Link = None;
        self.traverse(
            |node_ptr| {
                let node = &self.nodes[node_ptr];
                let mut left_height = -1;
                let mut right_height = -1;

                // Check link for left child node
                if let Some(left_ptr) = node.left {
                    let left = &self.nodes[left_ptr];
                    assert!(left.parent == Some(node_ptr));
                    assert!(left.key < node.key);
                    left_height = left.height as isize;
                }

                // Check link for right child node
                if let Some(right_ptr) = node.right {
                    let right = &self.nodes[right_ptr];
                    assert!(right.parent == Some(node_ptr));
                    assert!(right.key > node.key);
                    right_height = right.height as isize;
                }

                // Check height
                assert_eq!(node.height as isize, 1 + cmp::max(left_height, right_height));

                // Check AVL condition (nearly balance)
                assert!((right_height - left_height).abs() <= 1);

                num_nodes += 1;
            },
            |node_ptr| {
                // In-order keys are strictly increasing
                if let Some(previous_ptr) = previous {
                    assert!(self.nodes[previous_ptr].key < self.nodes[node_ptr].key);
                }
                previous = Some(node_ptr);
            },
        );

        // Check number of nodes
        assert_eq!(num_nodes, self.len());
    }

    #[cfg(any(test, feature = "consistency_check"))]
    fn traverse<Pre, In>(&self, mut preorder: Pre, mut inorder: In)
    where
        Pre: FnMut(Handle),
        In: FnMut(Handle),
    {
        if let Some(mut node_ptr) = self.root {
            let mut dir = Direction::FromParent;
            loop {
                match dir {
                    Direction::FromParent => {
                        preorder(node_ptr);
                        if let Some(left_ptr) = self.nodes[node_ptr].left {
                            node_ptr = left_ptr;
                        } else {
                            dir = Direction::FromLeft;
                        }
                    }
                    Direction::FromLeft => {
                        inorder(node_ptr);
                        if let Some(right_ptr) = self.nodes[node_ptr].right {
                            node_ptr = right_ptr;
                            dir = Direction::FromParent;
                        } else {
                            dir = Direction::FromRight;
                        }
                    }
                    Direction::FromRight => {
                        if let Some(parent_ptr) = self.nodes[node_ptr].parent {
                            if Some(node_ptr) == self.nodes[parent_ptr].left {
                                dir = Direction::FromLeft;
                            } else {
                                dir = Direction::FromRight;
                            }
                            node_ptr = parent_ptr;
                        } else {
                            break;
                        }
                    }
                }
            }
        }
    }
}

impl<K> Default for Tree<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: fmt::Debug> fmt::Debug for Tree<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter().map(|(_, key)| key)).finish()
    }
}

impl<'a, K> IntoIterator for &'a Tree<K> {
    type Item = (Handle, &'a K);
    type IntoIter = Iter<'a, K>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, K> Iterator for Iter<'a, K> {
    type Item = (Handle, &'a K);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let tree = self.tree;
        let node_ptr = self.front?;
        self.front = tree.successor(node_ptr);
        self.remaining -= 1;
        Some((node_ptr, &tree.nodes[node_ptr].key))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K> DoubleEndedIterator for Iter<'_, K> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let tree = self.tree;
        let node_ptr = self.back?;
        self.back = tree.predecessor(node_ptr);
        self.remaining -= 1;
        Some((node_ptr, &tree.nodes[node_ptr].key))
    }
}

impl<K> ExactSizeIterator for Iter<'_, K> {}

impl<K> FusedIterator for Iter<'_, K> {}
