#![forbid(unsafe_code)]

//! Node sets fed to canonicalization.
//!
//! A `NodeSet` names the nodes of one parsed document that take part in
//! canonical output. Only the shapes the signature profiles need are
//! supported: whole subtrees (comments dropped) with individual subtrees
//! carved out again by the enveloped-signature transform.

use std::collections::HashSet;
use roxmltree::{Node, NodeId};

/// A set of nodes of a single parsed document.
#[derive(Debug, Clone, Default)]
pub struct NodeSet {
    nodes: HashSet<NodeId>,
}

impl NodeSet {
    /// All nodes of the subtree rooted at `root`, except comments.
    pub fn tree_without_comments(root: Node<'_, '_>) -> Self {
        let nodes = root
            .descendants()
            .filter(|n| !n.is_comment())
            .map(|n| n.id())
            .collect();
        Self { nodes }
    }

    /// Check if a node is in this set.
    pub fn contains(&self, node: Node<'_, '_>) -> bool {
        self.nodes.contains(&node.id())
    }

    /// Remove `node` and all of its descendants.
    pub fn remove_subtree(&mut self, node: Node<'_, '_>) {
        for n in node.descendants() {
            self.nodes.remove(&n.id());
        }
    }

    /// Check if this set is empty.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of nodes in the set.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }
}
