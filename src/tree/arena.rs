//! Compact node storage for one tree revision.
//!
//! Nodes are stored in depth-first (pre-order) decoding order, so slot
//! index 0 is always the root and iterating the slots visits the tree in
//! the same order the decoder produced it.

use std::collections::HashMap;
use std::sync::Arc;

use crate::category::Category;
use crate::node::{NodeBehavior, NodeId, TreeId};
use crate::tree::{TreeError, TreeResult};

pub(crate) struct NodeSlot<A> {
    pub(crate) category: Category,
    pub(crate) behavior: Arc<dyn NodeBehavior<A>>,
    pub(crate) children: Box<[u32]>,
    /// Parent slot and the position of this node among the parent's children.
    pub(crate) parent: Option<(u32, u32)>,
    pub(crate) depth: u32,
}

pub(crate) struct NodeArena<A> {
    tree: TreeId,
    revision: u32,
    slots: Vec<NodeSlot<A>>,
    by_category: HashMap<Category, Vec<NodeId>>,
}

impl<A> NodeArena<A> {
    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }

    pub(crate) fn revision(&self) -> u32 {
        self.revision
    }

    pub(crate) fn slot(&self, index: u32) -> &NodeSlot<A> {
        &self.slots[index as usize]
    }

    pub(crate) fn slots(&self) -> &[NodeSlot<A>] {
        &self.slots
    }

    pub(crate) fn id(&self, index: u32) -> NodeId {
        NodeId {
            tree: self.tree,
            revision: self.revision,
            index,
        }
    }

    pub(crate) fn nodes_of(&self, category: &str) -> &[NodeId] {
        self.by_category
            .get(category)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub(crate) fn max_depth(&self) -> usize {
        self.slots.iter().map(|s| s.depth as usize).max().unwrap_or(0)
    }

    /// Resolves a handle to a slot index, rejecting handles from other trees
    /// or from earlier revisions of this one.
    pub(crate) fn resolve(&self, node: NodeId) -> TreeResult<u32> {
        if node.tree != self.tree {
            return Err(TreeError::ForeignNode(node));
        }
        if node.revision != self.revision {
            return Err(TreeError::StaleNode(node));
        }
        if node.index as usize >= self.slots.len() {
            return Err(TreeError::ForeignNode(node));
        }
        Ok(node.index)
    }
}

struct PendingSlot<A> {
    category: Category,
    behavior: Arc<dyn NodeBehavior<A>>,
    children: Vec<u32>,
    parent: Option<(u32, u32)>,
    depth: u32,
}

/// Accumulates slots in pre-order; callers must push a node's subtree
/// completely before pushing its next sibling.
pub(crate) struct ArenaBuilder<A> {
    slots: Vec<PendingSlot<A>>,
    base_depth: u32,
    max_depth: usize,
}

impl<A> ArenaBuilder<A> {
    pub(crate) fn new(base_depth: usize, max_depth: usize) -> Self {
        Self {
            slots: Vec::new(),
            base_depth: base_depth as u32,
            max_depth,
        }
    }

    pub(crate) fn depth_of(&self, parent: Option<u32>) -> usize {
        match parent {
            Some(p) => self.slots[p as usize].depth as usize + 1,
            None => self.base_depth as usize,
        }
    }

    pub(crate) fn push(
        &mut self,
        category: Category,
        behavior: Arc<dyn NodeBehavior<A>>,
        parent: Option<u32>,
    ) -> TreeResult<u32> {
        let depth = self.depth_of(parent);
        if depth > self.max_depth {
            return Err(TreeError::DepthExceeded {
                category,
                limit: self.max_depth,
            });
        }

        let index = self.slots.len() as u32;
        let link = match parent {
            Some(p) => {
                let siblings = &mut self.slots[p as usize].children;
                siblings.push(index);
                Some((p, siblings.len() as u32 - 1))
            }
            None => None,
        };
        self.slots.push(PendingSlot {
            category,
            behavior,
            children: Vec::new(),
            parent: link,
            depth: depth as u32,
        });
        Ok(index)
    }

    /// Deep-copies the subtree rooted at `root` of `source` under `parent`.
    /// Behaviors are shared; structure is not.
    pub(crate) fn copy_subtree(
        &mut self,
        source: &NodeArena<A>,
        root: u32,
        parent: Option<u32>,
    ) -> TreeResult<u32> {
        let mut stack = vec![(root, parent)];
        let mut copied_root = None;
        while let Some((src, dst_parent)) = stack.pop() {
            let slot = source.slot(src);
            let index = self.push(
                slot.category.clone(),
                Arc::clone(&slot.behavior),
                dst_parent,
            )?;
            copied_root.get_or_insert(index);
            for &child in slot.children.iter().rev() {
                stack.push((child, Some(index)));
            }
        }
        // `root` is always pushed first
        Ok(copied_root.unwrap_or_default())
    }

    pub(crate) fn finish(self, tree: TreeId, revision: u32) -> NodeArena<A> {
        let mut by_category: HashMap<Category, Vec<NodeId>> = HashMap::new();
        let slots = self
            .slots
            .into_iter()
            .enumerate()
            .map(|(index, pending)| {
                by_category
                    .entry(pending.category.clone())
                    .or_default()
                    .push(NodeId {
                        tree,
                        revision,
                        index: index as u32,
                    });
                NodeSlot {
                    category: pending.category,
                    behavior: pending.behavior,
                    children: pending.children.into_boxed_slice(),
                    parent: pending.parent,
                    depth: pending.depth,
                }
            })
            .collect();

        NodeArena {
            tree,
            revision,
            slots,
            by_category,
        }
    }
}
