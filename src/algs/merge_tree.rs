//! Merge tree over persistence events, stored as an id-keyed arena.
//!
//! Nodes live in a `BTreeMap<u32, MergeTreeNode>` owned by the tree; parent
//! and child links are node ids. Dropping the tree drops every node.
//!
//! Two ways of linking nodes share the arena:
//!
//! - [`MergeTree::chain_union`] attaches a node directly under another one,
//!   without looking for representatives. [`build_merge_tree_with_tolerance`]
//!   uses only this.
//! - [`MergeTree::find`] / [`MergeTree::union_nodes`] form a disjoint-set
//!   forest with path compression and the elder rule (the representative
//!   born first stays the parent).
//!
//! Mixing the two on overlapping subtrees within one construction pass is
//! unsupported: path compression re-parents chained nodes.
//!
//! Every attach sets the child's depth to its parent's depth + 1. Depths of
//! the child's own descendants are not refreshed, so re-parenting an inner
//! node leaves stale depths below it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::algs::reduction::PersistencePair;
use crate::debug_invariants::{DebugInvariants, ensure};
use crate::topo_error::TopoError;

/// A birth or death event in the merge tree.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeTreeNode {
    pub id: u32,
    pub birth: u32,
    pub death: u32,
    /// Distance from the root along parent links, as of the last attach.
    pub depth: u32,
    parent: Option<u32>,
    children: Vec<u32>,
}

impl MergeTreeNode {
    fn new(id: u32, birth: u32, death: u32) -> Self {
        Self {
            id,
            birth,
            death,
            depth: 0,
            parent: None,
            children: Vec::new(),
        }
    }

    #[inline]
    pub fn parent(&self) -> Option<u32> {
        self.parent
    }

    /// Child ids in attach order.
    #[inline]
    pub fn children(&self) -> &[u32] {
        &self.children
    }

    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// Arena-backed merge tree.
///
/// Deserializing runs [`DebugInvariants::validate_invariants`] and rejects
/// dangling roots, one-sided links and parent cycles.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "TreeParts", into = "TreeParts")]
pub struct MergeTree {
    nodes: BTreeMap<u32, MergeTreeNode>,
    /// Earliest-born node seen at insertion time.
    root: Option<u32>,
}

/// Unvalidated wire form of [`MergeTree`].
#[derive(Clone, Debug, Serialize, Deserialize)]
struct TreeParts {
    nodes: BTreeMap<u32, MergeTreeNode>,
    root: Option<u32>,
}

impl TryFrom<TreeParts> for MergeTree {
    type Error = TopoError;

    fn try_from(parts: TreeParts) -> Result<Self, Self::Error> {
        let tree = MergeTree {
            nodes: parts.nodes,
            root: parts.root,
        };
        tree.validate_invariants()?;
        Ok(tree)
    }
}

impl From<MergeTree> for TreeParts {
    fn from(tree: MergeTree) -> Self {
        TreeParts {
            nodes: tree.nodes,
            root: tree.root,
        }
    }
}

impl MergeTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a parentless node.
    ///
    /// Rejects an existing id with [`TopoError::DuplicateNode`]. The node
    /// becomes root when no root exists or its birth is strictly smaller
    /// than the current root's.
    pub fn add_node(&mut self, id: u32, birth: u32, death: u32) -> Result<(), TopoError> {
        if self.nodes.contains_key(&id) {
            return Err(TopoError::DuplicateNode(id));
        }
        let becomes_root = self.root().is_none_or(|r| birth < r.birth);
        self.nodes.insert(id, MergeTreeNode::new(id, birth, death));
        if becomes_root {
            self.root = Some(id);
        }
        Ok(())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[inline]
    pub fn contains(&self, id: u32) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn get(&self, id: u32) -> Option<&MergeTreeNode> {
        self.nodes.get(&id)
    }

    pub fn node(&self, id: u32) -> Result<&MergeTreeNode, TopoError> {
        self.nodes.get(&id).ok_or(TopoError::NodeNotFound(id))
    }

    /// All nodes in id order.
    pub fn nodes(&self) -> impl Iterator<Item = &MergeTreeNode> + '_ {
        self.nodes.values()
    }

    /// Root snapshot taken during insertion; not recomputed by later links.
    pub fn root(&self) -> Option<&MergeTreeNode> {
        self.root.and_then(|id| self.nodes.get(&id))
    }

    pub fn root_id(&self) -> Option<u32> {
        self.root
    }

    /// Every parentless node, in id order.
    pub fn roots(&self) -> Vec<u32> {
        self.nodes
            .values()
            .filter(|n| n.parent.is_none())
            .map(|n| n.id)
            .collect()
    }

    /// Parentless nodes whose recorded depth equals `depth`, in id order.
    pub fn find_nodes_by_depth(&self, depth: u32) -> Vec<u32> {
        self.nodes
            .values()
            .filter(|n| n.parent.is_none() && n.depth == depth)
            .map(|n| n.id)
            .collect()
    }

    /// `(parent, child)` links, ordered by child id.
    pub fn edges(&self) -> Vec<(u32, u32)> {
        self.nodes
            .values()
            .filter_map(|n| n.parent.map(|p| (p, n.id)))
            .collect()
    }

    /// Representative of `id`'s set, compressing the path behind it.
    ///
    /// Every node on the path is re-parented directly under the
    /// representative and its depth set to the representative's depth + 1.
    pub fn find(&mut self, id: u32) -> Result<u32, TopoError> {
        let mut path = Vec::new();
        let mut rep = id;
        while let Some(parent) = self.node(rep)?.parent {
            path.push(rep);
            if path.len() > self.nodes.len() {
                return Err(TopoError::InvariantViolation(format!(
                    "parent links from node {id} do not terminate"
                )));
            }
            rep = parent;
        }
        for n in path {
            if self.node(n)?.parent != Some(rep) {
                self.attach(rep, n)?;
            }
        }
        Ok(rep)
    }

    /// Merge the sets of `a` and `b` under the elder representative.
    ///
    /// The representative with the smaller birth becomes the parent; on a
    /// tie `a`'s representative wins. No-op when already merged.
    pub fn union_nodes(&mut self, a: u32, b: u32) -> Result<(), TopoError> {
        self.node(a)?;
        self.node(b)?;
        let ra = self.find(a)?;
        let rb = self.find(b)?;
        if ra == rb {
            return Ok(());
        }
        let (parent, child) = if self.node(ra)?.birth <= self.node(rb)?.birth {
            (ra, rb)
        } else {
            (rb, ra)
        };
        self.attach(parent, child)?;
        log::trace!(
            "union: node {parent} (depth {}) absorbs node {child}",
            self.node(parent)?.depth
        );
        Ok(())
    }

    /// Attach `child` directly under `parent`, without path compression.
    ///
    /// `child` leaves its previous parent's child list. Fails with
    /// [`TopoError::CycleDetected`] if `parent` is `child` or lies below it.
    pub fn chain_union(&mut self, parent: u32, child: u32) -> Result<(), TopoError> {
        self.node(parent)?;
        self.node(child)?;
        if self.is_ancestor(child, parent)? {
            return Err(TopoError::CycleDetected { parent, child });
        }
        self.attach(parent, child)?;
        log::trace!(
            "chain union: node {parent} (depth {}) absorbs node {child}",
            self.node(parent)?.depth
        );
        Ok(())
    }

    /// Whether `ancestor` is `node` or one of its ancestors.
    fn is_ancestor(&self, ancestor: u32, node: u32) -> Result<bool, TopoError> {
        let mut cur = Some(node);
        let mut steps = 0usize;
        while let Some(id) = cur {
            if id == ancestor {
                return Ok(true);
            }
            steps += 1;
            if steps > self.nodes.len() {
                return Err(TopoError::InvariantViolation(format!(
                    "parent links from node {node} do not terminate"
                )));
            }
            cur = self.node(id)?.parent;
        }
        Ok(false)
    }

    fn attach(&mut self, parent: u32, child: u32) -> Result<(), TopoError> {
        let depth = self.node(parent)?.depth + 1;
        let node = self
            .nodes
            .get_mut(&child)
            .ok_or(TopoError::NodeNotFound(child))?;
        let previous = node.parent.replace(parent);
        node.depth = depth;
        if let Some(old) = previous {
            if let Some(old_parent) = self.nodes.get_mut(&old) {
                old_parent.children.retain(|&c| c != child);
            }
        }
        self.nodes
            .get_mut(&parent)
            .ok_or(TopoError::NodeNotFound(parent))?
            .children
            .push(child);
        Ok(())
    }
}

impl DebugInvariants for MergeTree {
    /// Links are symmetric, acyclic and only reference stored nodes.
    fn validate_invariants(&self) -> Result<(), TopoError> {
        if let Some(root) = self.root {
            ensure(self.nodes.contains_key(&root), || {
                format!("root {root} is not stored")
            })?;
        }
        for (&id, node) in &self.nodes {
            ensure(node.id == id, || format!("node keyed {id} carries id {}", node.id))?;
            if let Some(p) = node.parent {
                let parent = self.nodes.get(&p);
                ensure(parent.is_some_and(|pn| pn.children.contains(&id)), || {
                    format!("node {id} is missing from parent {p}'s children")
                })?;
            }
            for &c in &node.children {
                ensure(
                    self.nodes.get(&c).is_some_and(|cn| cn.parent == Some(id)),
                    || format!("child {c} of node {id} does not point back"),
                )?;
            }
            // errors if the parent chain loops
            self.is_ancestor(u32::MAX, id)?;
        }
        Ok(())
    }
}

/// Build a merge tree from persistence pairs, chaining death events whose
/// values lie within `tolerance` of each other.
///
/// Pairs are visited by ascending birth (stable for equal births). Each pair
/// contributes a birth node `(b, b)` and a death node `(b, d)` chained under
/// it; node ids start at 1. A death node is then chained under the open
/// death node whose value is closest to `d` within `tolerance` (ties go to
/// the smaller value), which it replaces as the open node for that event.
pub fn build_merge_tree_with_tolerance(
    pairs: &[PersistencePair],
    tolerance: u32,
) -> Result<MergeTree, TopoError> {
    let mut sorted = pairs.to_vec();
    sorted.sort_by_key(|p| p.birth);

    let mut tree = MergeTree::new();
    let mut open: BTreeMap<u32, u32> = BTreeMap::new();
    let mut next_id: u32 = 1;
    let mut fresh_id = || -> Result<u32, TopoError> {
        let id = next_id;
        next_id = next_id.checked_add(1).ok_or(TopoError::NodeIdOverflow)?;
        Ok(id)
    };

    for pair in &sorted {
        let birth_node = fresh_id()?;
        tree.add_node(birth_node, pair.birth, pair.birth)?;
        let death_node = fresh_id()?;
        tree.add_node(death_node, pair.birth, pair.death)?;
        tree.chain_union(birth_node, death_node)?;

        let lo = pair.death.saturating_sub(tolerance);
        let hi = pair.death.saturating_add(tolerance);
        let matched = open
            .range(lo..=hi)
            .min_by_key(|&(&value, _)| (value.abs_diff(pair.death), value))
            .map(|(&value, &node)| (value, node));
        if let Some((value, node)) = matched {
            tree.chain_union(node, death_node)?;
            open.remove(&value);
        }
        open.insert(pair.death, death_node);
    }

    log::debug!(
        "merge tree: {} pairs -> {} nodes, {} open death events, root {:?}",
        sorted.len(),
        tree.len(),
        open.len(),
        tree.root_id()
    );
    crate::debug_invariants!(tree.validate_invariants(), "build_merge_tree_with_tolerance");
    Ok(tree)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(raw: &[(u32, u32)]) -> Vec<PersistencePair> {
        raw.iter().copied().map(PersistencePair::from).collect()
    }

    #[test]
    fn duplicate_and_missing_ids_are_errors() {
        let mut t = MergeTree::new();
        t.add_node(1, 0, 5).unwrap();
        assert_eq!(t.add_node(1, 3, 3), Err(TopoError::DuplicateNode(1)));
        assert_eq!(t.node(1).unwrap().birth, 0, "first insert kept");
        assert_eq!(t.union_nodes(1, 2), Err(TopoError::NodeNotFound(2)));
        assert_eq!(t.chain_union(9, 1), Err(TopoError::NodeNotFound(9)));
        assert_eq!(t.find(7), Err(TopoError::NodeNotFound(7)));
    }

    #[test]
    fn root_is_earliest_birth_at_insertion() {
        let mut t = MergeTree::new();
        t.add_node(1, 5, 5).unwrap();
        t.add_node(2, 3, 9).unwrap();
        t.add_node(3, 3, 4).unwrap();
        assert_eq!(t.root_id(), Some(2), "ties keep the earlier root");
    }

    #[test]
    fn chain_union_moves_child_and_sets_depth() {
        let mut t = MergeTree::new();
        for id in 1..=3 {
            t.add_node(id, id, id).unwrap();
        }
        t.chain_union(1, 3).unwrap();
        assert_eq!(t.node(3).unwrap().depth, 1);
        t.chain_union(1, 2).unwrap();
        t.chain_union(2, 3).unwrap();
        assert_eq!(t.node(3).unwrap().depth, 2);
        assert_eq!(t.node(1).unwrap().children(), &[2]);
        assert_eq!(t.node(2).unwrap().children(), &[3]);
        assert!(t.validate_invariants().is_ok());
    }

    #[test]
    fn chain_union_rejects_cycles() {
        let mut t = MergeTree::new();
        t.add_node(1, 0, 0).unwrap();
        t.add_node(2, 0, 4).unwrap();
        t.chain_union(1, 2).unwrap();
        assert_eq!(
            t.chain_union(2, 1),
            Err(TopoError::CycleDetected {
                parent: 2,
                child: 1
            })
        );
        assert_eq!(
            t.chain_union(1, 1),
            Err(TopoError::CycleDetected {
                parent: 1,
                child: 1
            })
        );
    }

    #[test]
    fn union_follows_elder_rule_and_compresses() {
        let mut t = MergeTree::new();
        t.add_node(1, 4, 4).unwrap();
        t.add_node(2, 2, 2).unwrap();
        t.add_node(3, 9, 9).unwrap();
        t.union_nodes(1, 2).unwrap();
        assert_eq!(t.node(1).unwrap().parent(), Some(2));
        assert_eq!(t.node(1).unwrap().depth, t.node(2).unwrap().depth + 1);
        t.union_nodes(3, 1).unwrap();
        assert_eq!(t.node(3).unwrap().parent(), Some(2));
        assert_eq!(t.find(3).unwrap(), 2);
        // already merged
        t.union_nodes(1, 3).unwrap();
        assert_eq!(t.roots(), vec![2]);
        assert!(t.validate_invariants().is_ok());
    }

    #[test]
    fn find_compresses_long_chains() {
        let mut t = MergeTree::new();
        for id in 1..=4 {
            t.add_node(id, id, id).unwrap();
        }
        t.chain_union(1, 2).unwrap();
        t.chain_union(2, 3).unwrap();
        t.chain_union(3, 4).unwrap();
        assert_eq!(t.find(4).unwrap(), 1);
        for id in 2..=4 {
            assert_eq!(t.node(id).unwrap().parent(), Some(1));
            assert_eq!(t.node(id).unwrap().depth, 1);
        }
        assert_eq!(t.node(1).unwrap().children().len(), 3);
        assert!(t.validate_invariants().is_ok());
    }

    #[test]
    fn tolerance_chains_close_deaths() {
        let t = build_merge_tree_with_tolerance(&pairs(&[(1, 10), (2, 11)]), 1).unwrap();
        assert_eq!(t.len(), 4);
        let late_death = t.node(4).unwrap();
        assert_eq!((late_death.birth, late_death.death), (2, 11));
        assert_eq!(late_death.parent(), Some(2), "chained to the first death");
        assert_eq!(late_death.depth, 2);
        assert!(t.node(3).unwrap().is_leaf());
        assert_eq!(t.root_id(), Some(1));
        assert_eq!(t.edges(), vec![(1, 2), (2, 4)]);
    }

    #[test]
    fn zero_tolerance_keeps_components_apart() {
        let t = build_merge_tree_with_tolerance(&pairs(&[(1, 10), (2, 11)]), 0).unwrap();
        assert_eq!(t.roots(), vec![1, 3]);
        assert_eq!(t.find_nodes_by_depth(0), vec![1, 3]);
    }

    #[test]
    fn closest_open_death_wins() {
        // open deaths 10 (node 2) and 13 (node 4); 12 is closer to 13
        let t = build_merge_tree_with_tolerance(&pairs(&[(0, 10), (1, 13), (2, 12)]), 2).unwrap();
        assert_eq!(t.node(4).unwrap().parent(), Some(3));
        assert_eq!(t.node(6).unwrap().parent(), Some(4));
    }

    #[test]
    fn equal_distance_prefers_smaller_death() {
        // open deaths 10 and 14 are both 2 away from 12
        let t = build_merge_tree_with_tolerance(&pairs(&[(0, 10), (1, 14), (2, 12)]), 2).unwrap();
        assert_eq!(t.node(6).unwrap().parent(), Some(2));
    }

    #[test]
    fn pairs_are_sorted_by_birth() {
        let t = build_merge_tree_with_tolerance(&pairs(&[(7, 9), (3, 20)]), 0).unwrap();
        let first_birth = t.node(1).unwrap();
        assert_eq!((first_birth.birth, first_birth.death), (3, 3));
        assert_eq!(t.root_id(), Some(1));
    }

    #[test]
    fn inconsistent_json_is_rejected() {
        let node = |id: u32, parent: Option<u32>, children: &[u32]| MergeTreeNode {
            id,
            birth: 0,
            death: 0,
            depth: 0,
            parent,
            children: children.to_vec(),
        };
        let encode = |nodes: Vec<MergeTreeNode>, root: Option<u32>| {
            let parts = TreeParts {
                nodes: nodes.into_iter().map(|n| (n.id, n)).collect(),
                root,
            };
            serde_json::to_string(&parts).unwrap()
        };

        let dangling_root = encode(vec![node(1, None, &[])], Some(9));
        assert!(serde_json::from_str::<MergeTree>(&dangling_root).is_err());

        let one_sided = encode(vec![node(1, None, &[]), node(2, Some(1), &[])], Some(1));
        assert!(serde_json::from_str::<MergeTree>(&one_sided).is_err());

        let cycle = encode(vec![node(1, Some(2), &[2]), node(2, Some(1), &[1])], None);
        assert!(serde_json::from_str::<MergeTree>(&cycle).is_err());

        let fine = encode(vec![node(1, None, &[2]), node(2, Some(1), &[])], Some(1));
        let tree: MergeTree = serde_json::from_str(&fine).unwrap();
        assert_eq!(tree.edges(), vec![(1, 2)]);
    }

    #[test]
    fn tree_round_trips_through_json() {
        let t = build_merge_tree_with_tolerance(&pairs(&[(1, 10), (2, 11), (4, 30)]), 2).unwrap();
        let text = serde_json::to_string(&t).unwrap();
        let back: MergeTree = serde_json::from_str(&text).unwrap();
        assert_eq!(back, t);
    }
}
