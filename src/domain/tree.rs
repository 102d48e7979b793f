use std::fmt;
use std::str::FromStr;

use generational_arena::{Arena, Index};
use tracing::{debug, instrument};

use crate::domain::error::{DomainError, TreeResult};

/// Handle to a node inside a [`DecisionTree`].
///
/// Handles stay valid for the lifetime of the node, including across
/// [`DecisionTree::split_leaf`], which repurposes a node in place. After
/// [`DecisionTree::clear`] every previously issued handle is stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(Index);

impl NodeId {
    /// Slot and generation of the underlying arena index.
    pub fn raw_parts(self) -> (usize, u64) {
        self.0.into_raw_parts()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (slot, generation) = self.raw_parts();
        write!(f, "{slot}v{generation}")
    }
}

/// Child slot of an internal node.
///
/// `Yes` is the left slot, `No` the right one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Branch {
    Yes,
    No,
}

impl fmt::Display for Branch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Branch::Yes => write!(f, "yes"),
            Branch::No => write!(f, "no"),
        }
    }
}

impl FromStr for Branch {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "y" | "yes" | "l" | "left" => Ok(Branch::Yes),
            "n" | "no" | "r" | "right" => Ok(Branch::No),
            other => Err(format!("expected yes/no, got {other:?}")),
        }
    }
}

/// Tree vertex: a question for internal nodes, an answer for leaves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    value: String,
    left: Option<NodeId>,
    right: Option<NodeId>,
}

impl Node {
    /// Creates a detached leaf. The value is set at construction, so no
    /// node ever exists without one.
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            left: None,
            right: None,
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn left(&self) -> Option<NodeId> {
        self.left
    }

    pub fn right(&self) -> Option<NodeId> {
        self.right
    }

    pub fn child(&self, branch: Branch) -> Option<NodeId> {
        match branch {
            Branch::Yes => self.left,
            Branch::No => self.right,
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.left.is_none() && self.right.is_none()
    }
}

/// Read-only view of one node for renderers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeView<'a> {
    pub id: NodeId,
    pub value: &'a str,
    pub left: Option<NodeId>,
    pub right: Option<NodeId>,
}

/// Traversal order for [`DecisionTree::values`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Order {
    #[default]
    Pre,
    In,
    Post,
}

/// Arena-backed binary decision tree.
///
/// The tree exclusively owns every node. Children are referenced by
/// [`NodeId`] from exactly one parent slot, so there is no aliasing and no
/// cycle. The node count is the arena length, which keeps `len()` equal to
/// the number of live nodes after every operation.
#[derive(Debug, Default)]
pub struct DecisionTree {
    arena: Arena<Node>,
    root: Option<NodeId>,
}

impl DecisionTree {
    pub fn new() -> Self {
        Self {
            arena: Arena::new(),
            root: None,
        }
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    pub fn get(&self, id: NodeId) -> TreeResult<&Node> {
        self.arena.get(id.0).ok_or(DomainError::NullReference(id))
    }

    fn get_mut(&mut self, id: NodeId) -> TreeResult<&mut Node> {
        self.arena.get_mut(id.0).ok_or(DomainError::NullReference(id))
    }

    pub fn value(&self, id: NodeId) -> TreeResult<&str> {
        self.get(id).map(Node::value)
    }

    pub fn is_leaf(&self, id: NodeId) -> TreeResult<bool> {
        self.get(id).map(Node::is_leaf)
    }

    /// Installs the first node of a fresh tree.
    pub(crate) fn set_root(&mut self, node: Node) -> NodeId {
        debug_assert!(self.root.is_none(), "root installed twice");
        let id = NodeId(self.arena.insert(node));
        self.root = Some(id);
        id
    }

    /// First empty child slot of `parent`, `None` when both are taken.
    pub(crate) fn free_branch(&self, parent: NodeId) -> TreeResult<Option<Branch>> {
        let node = self.get(parent)?;
        Ok(match (node.left, node.right) {
            (None, _) => Some(Branch::Yes),
            (Some(_), None) => Some(Branch::No),
            (Some(_), Some(_)) => None,
        })
    }

    /// Allocates `node` and links it into an empty slot of `parent`.
    pub(crate) fn attach(&mut self, parent: NodeId, branch: Branch, node: Node) -> TreeResult<NodeId> {
        if self.get(parent)?.child(branch).is_some() {
            return Err(DomainError::InvalidPath {
                taken: 0,
                reason: format!("{branch} slot of {parent} is occupied"),
            });
        }
        let id = NodeId(self.arena.insert(node));
        let slot = self.get_mut(parent)?;
        match branch {
            Branch::Yes => slot.left = Some(id),
            Branch::No => slot.right = Some(id),
        }
        Ok(id)
    }

    /// Releases every node children-first and leaves the tree empty.
    ///
    /// Uses an explicit stack, so degenerate deep trees cannot overflow the
    /// call stack. Returns the number of released nodes.
    #[instrument(level = "debug", skip(self))]
    pub fn clear(&mut self) -> usize {
        let mut released = 0;
        let mut stack: Vec<(NodeId, bool)> = self.root.take().map(|r| (r, false)).into_iter().collect();

        while let Some((id, expanded)) = stack.pop() {
            if expanded {
                if self.arena.remove(id.0).is_some() {
                    released += 1;
                }
                continue;
            }
            if let Some(node) = self.arena.get(id.0) {
                stack.push((id, true));
                if let Some(right) = node.right {
                    stack.push((right, false));
                }
                if let Some(left) = node.left {
                    stack.push((left, false));
                }
            }
        }

        debug!("released {} nodes", released);
        debug_assert!(self.arena.is_empty());
        released
    }

    /// Turns leaf `id` into an internal node asking `discriminator`.
    ///
    /// The old answer moves to a new `No` (right) child and `new_answer` to a
    /// new `Yes` (left) child. `id` stays valid and keeps its slot. Nothing
    /// changes when an error is returned.
    #[instrument(level = "debug", skip(self))]
    pub fn split_leaf(&mut self, id: NodeId, new_answer: &str, discriminator: &str) -> TreeResult<()> {
        if !self.get(id)?.is_leaf() {
            return Err(DomainError::NotALeaf(id));
        }
        validate_value(new_answer)?;
        validate_value(discriminator)?;
        let answer = alloc_value(new_answer)?;
        let question = alloc_value(discriminator)?;

        let old_answer = std::mem::replace(&mut self.get_mut(id)?.value, question);
        let yes = NodeId(self.arena.insert(Node::new(answer)));
        let no = NodeId(self.arena.insert(Node::new(old_answer)));

        let node = self.get_mut(id)?;
        node.left = Some(yes);
        node.right = Some(no);
        debug!("split {} into yes={} no={}", id, yes, no);
        Ok(())
    }

    /// Follows `path` from the root and returns the node it ends on.
    pub fn walk(&self, path: &[Branch]) -> TreeResult<NodeId> {
        let mut current = self.root.ok_or(DomainError::EmptyTree)?;
        for (taken, branch) in path.iter().enumerate() {
            let node = self.get(current)?;
            current = node.child(*branch).ok_or_else(|| DomainError::InvalidPath {
                taken,
                reason: format!("{:?} has no {branch} branch", node.value()),
            })?;
        }
        Ok(current)
    }

    /// Number of levels; 0 for an empty tree.
    pub fn depth(&self) -> usize {
        let mut max_depth = 0;
        let mut stack: Vec<(NodeId, usize)> = self.root.map(|r| (r, 1)).into_iter().collect();
        while let Some((id, depth)) = stack.pop() {
            max_depth = max_depth.max(depth);
            if let Some(node) = self.arena.get(id.0) {
                stack.extend(node.left.into_iter().chain(node.right).map(|c| (c, depth + 1)));
            }
        }
        max_depth
    }

    /// Answers held by the leaves, left to right.
    pub fn leaf_values(&self) -> Vec<&str> {
        self.iter_preorder()
            .filter(|(_, node)| node.is_leaf())
            .map(|(_, node)| node.value())
            .collect()
    }

    pub fn iter_preorder(&self) -> PreOrderIter<'_> {
        PreOrderIter::new(self)
    }

    pub fn iter_inorder(&self) -> InOrderIter<'_> {
        InOrderIter::new(self)
    }

    pub fn iter_postorder(&self) -> PostOrderIter<'_> {
        PostOrderIter::new(self)
    }

    /// Node values in the requested order.
    pub fn values(&self, order: Order) -> Box<dyn Iterator<Item = &str> + '_> {
        match order {
            Order::Pre => Box::new(self.iter_preorder().map(|(_, n)| n.value())),
            Order::In => Box::new(self.iter_inorder().map(|(_, n)| n.value())),
            Order::Post => Box::new(self.iter_postorder().map(|(_, n)| n.value())),
        }
    }

    /// Depth-first views of all nodes, for renderers.
    pub fn nodes(&self) -> impl Iterator<Item = NodeView<'_>> {
        self.iter_preorder().map(|(id, node)| NodeView {
            id,
            value: node.value(),
            left: node.left,
            right: node.right,
        })
    }
}

/// Checks that `value` survives a write/parse round trip unchanged.
pub fn validate_value(value: &str) -> TreeResult<()> {
    let reason = if value.is_empty() {
        Some("value is empty")
    } else if value.trim() != value {
        Some("value has leading or trailing whitespace")
    } else if value.contains(['{', '}']) {
        Some("value contains a brace")
    } else {
        None
    };
    match reason {
        Some(reason) => Err(DomainError::InvalidValue {
            value: value.to_string(),
            reason: reason.to_string(),
        }),
        None => Ok(()),
    }
}

/// Copies `value` into freshly reserved storage.
pub(crate) fn alloc_value(value: &str) -> TreeResult<String> {
    let mut owned = String::new();
    owned
        .try_reserve_exact(value.len())
        .map_err(|e| DomainError::AllocationFailure {
            what: format!("value of {} bytes ({e})", value.len()),
        })?;
    owned.push_str(value);
    Ok(owned)
}

pub struct PreOrderIter<'a> {
    tree: &'a DecisionTree,
    stack: Vec<NodeId>,
}

impl<'a> PreOrderIter<'a> {
    fn new(tree: &'a DecisionTree) -> Self {
        Self {
            tree,
            stack: tree.root.into_iter().collect(),
        }
    }
}

impl<'a> Iterator for PreOrderIter<'a> {
    type Item = (NodeId, &'a Node);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(id) = self.stack.pop() {
            if let Some(node) = self.tree.arena.get(id.0) {
                // Right first so the left subtree comes out first
                self.stack.extend(node.right);
                self.stack.extend(node.left);
                return Some((id, node));
            }
        }
        None
    }
}

pub struct InOrderIter<'a> {
    tree: &'a DecisionTree,
    stack: Vec<NodeId>,
    current: Option<NodeId>,
}

impl<'a> InOrderIter<'a> {
    fn new(tree: &'a DecisionTree) -> Self {
        Self {
            tree,
            stack: Vec::new(),
            current: tree.root,
        }
    }
}

impl<'a> Iterator for InOrderIter<'a> {
    type Item = (NodeId, &'a Node);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(id) = self.current {
            self.stack.push(id);
            self.current = self.tree.arena.get(id.0).and_then(|n| n.left);
        }
        let id = self.stack.pop()?;
        let node = self.tree.arena.get(id.0)?;
        self.current = node.right;
        Some((id, node))
    }
}

pub struct PostOrderIter<'a> {
    tree: &'a DecisionTree,
    stack: Vec<(NodeId, bool)>,
}

impl<'a> PostOrderIter<'a> {
    fn new(tree: &'a DecisionTree) -> Self {
        Self {
            tree,
            stack: tree.root.map(|r| (r, false)).into_iter().collect(),
        }
    }
}

impl<'a> Iterator for PostOrderIter<'a> {
    type Item = (NodeId, &'a Node);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((id, visited)) = self.stack.pop() {
            if let Some(node) = self.tree.arena.get(id.0) {
                if visited {
                    return Some((id, node));
                }
                self.stack.push((id, true));
                self.stack.extend(node.right.map(|c| (c, false)));
                self.stack.extend(node.left.map(|c| (c, false)));
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// is_it_alive? -> (is_it_a_plant? -> tree | flower) | cat
    fn sample() -> (DecisionTree, NodeId, NodeId) {
        let mut tree = DecisionTree::new();
        let root = tree.set_root(Node::new("is_it_alive?"));
        let plant = tree.attach(root, Branch::Yes, Node::new("is_it_a_plant?")).unwrap();
        tree.attach(plant, Branch::Yes, Node::new("tree")).unwrap();
        tree.attach(plant, Branch::No, Node::new("flower")).unwrap();
        let cat = tree.attach(root, Branch::No, Node::new("cat")).unwrap();
        (tree, plant, cat)
    }

    #[test]
    fn given_new_tree_then_empty() {
        let tree = DecisionTree::new();
        assert!(tree.is_empty());
        assert_eq!(tree.len(), 0);
        assert_eq!(tree.depth(), 0);
        assert_eq!(tree.iter_preorder().count(), 0);
    }

    #[test]
    fn given_sample_when_traversing_then_orders_match() {
        let (tree, _, _) = sample();
        let pre: Vec<_> = tree.values(Order::Pre).collect();
        let ino: Vec<_> = tree.values(Order::In).collect();
        let post: Vec<_> = tree.values(Order::Post).collect();
        assert_eq!(pre, ["is_it_alive?", "is_it_a_plant?", "tree", "flower", "cat"]);
        assert_eq!(ino, ["tree", "is_it_a_plant?", "flower", "is_it_alive?", "cat"]);
        assert_eq!(post, ["tree", "flower", "is_it_a_plant?", "cat", "is_it_alive?"]);
    }

    #[test]
    fn given_iterator_when_called_twice_then_restarts() {
        let (tree, _, _) = sample();
        let first: Vec<_> = tree.values(Order::In).collect();
        let second: Vec<_> = tree.values(Order::In).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn given_sample_then_depth_and_leaves() {
        let (tree, _, _) = sample();
        assert_eq!(tree.len(), 5);
        assert_eq!(tree.depth(), 3);
        assert_eq!(tree.leaf_values(), ["tree", "flower", "cat"]);
    }

    #[test]
    fn given_leaf_when_split_then_node_repurposed_in_place() {
        let (mut tree, _, cat) = sample();
        tree.split_leaf(cat, "dog", "does_it_bark?").unwrap();

        let node = tree.get(cat).unwrap();
        assert_eq!(node.value(), "does_it_bark?");
        let yes = node.left().unwrap();
        let no = node.right().unwrap();
        assert_eq!(tree.value(yes).unwrap(), "dog");
        assert_eq!(tree.value(no).unwrap(), "cat");
        assert!(tree.is_leaf(yes).unwrap());
        assert!(tree.is_leaf(no).unwrap());
        assert_eq!(tree.len(), 7);
    }

    #[test]
    fn given_internal_node_when_split_then_not_a_leaf() {
        let (mut tree, plant, _) = sample();
        let err = tree.split_leaf(plant, "x", "y").unwrap_err();
        assert_eq!(err, DomainError::NotALeaf(plant));
        assert_eq!(tree.len(), 5);
    }

    #[test]
    fn given_brace_in_answer_when_split_then_invalid_value_and_unchanged() {
        let (mut tree, _, cat) = sample();
        let err = tree.split_leaf(cat, "d{og", "q?").unwrap_err();
        assert!(matches!(err, DomainError::InvalidValue { .. }));
        assert_eq!(tree.value(cat).unwrap(), "cat");
        assert!(tree.is_leaf(cat).unwrap());
        assert_eq!(tree.len(), 5);
    }

    #[test]
    fn given_tree_when_cleared_then_releases_all_and_is_idempotent() {
        let (mut tree, plant, _) = sample();
        assert_eq!(tree.clear(), 5);
        assert!(tree.is_empty());
        assert_eq!(tree.len(), 0);
        assert_eq!(tree.clear(), 0);
        assert_eq!(tree.get(plant).unwrap_err(), DomainError::NullReference(plant));
    }

    #[test]
    fn given_stale_handle_when_split_then_null_reference() {
        let (mut tree, _, cat) = sample();
        tree.clear();
        assert_eq!(
            tree.split_leaf(cat, "a", "b").unwrap_err(),
            DomainError::NullReference(cat)
        );
    }

    #[test]
    fn given_path_when_walking_then_resolves_node() {
        let (tree, plant, cat) = sample();
        assert_eq!(tree.walk(&[Branch::Yes]).unwrap(), plant);
        assert_eq!(tree.walk(&[Branch::No]).unwrap(), cat);
        let err = tree.walk(&[Branch::No, Branch::Yes]).unwrap_err();
        assert!(matches!(err, DomainError::InvalidPath { taken: 1, .. }));
        assert_eq!(DecisionTree::new().walk(&[]).unwrap_err(), DomainError::EmptyTree);
    }

    #[test]
    fn given_deep_chain_when_cleared_then_no_stack_overflow() {
        let mut tree = DecisionTree::new();
        let mut current = tree.set_root(Node::new("leaf"));
        for i in 0..100_000 {
            tree.split_leaf(current, &format!("a{i}"), &format!("q{i}")).unwrap();
            current = tree.get(current).unwrap().right().unwrap();
        }
        assert_eq!(tree.len(), 200_001);
        assert_eq!(tree.depth(), 100_001);
        assert_eq!(tree.clear(), 200_001);
    }

    #[test]
    fn given_branch_strings_then_parses() {
        assert_eq!("yes".parse::<Branch>().unwrap(), Branch::Yes);
        assert_eq!("N".parse::<Branch>().unwrap(), Branch::No);
        assert!("maybe".parse::<Branch>().is_err());
    }
}
