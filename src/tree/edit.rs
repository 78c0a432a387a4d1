//! Structural primitives for evolutionary operators.
//!
//! Crossover swaps same-category subtrees between trees ([`ProgramTree::graft`]);
//! mutation replaces a subtree with one decoded from fresh codons
//! ([`ProgramTree::regrow`]). Every edit rebuilds the arena into a new
//! revision, so the structural invariants checked at decode time keep holding
//! and handles taken before the edit become stale.

use std::sync::Arc;

use tracing::debug;

use crate::node::{NodeId, TreeId};
use crate::tree::arena::{ArenaBuilder, NodeArena};
use crate::tree::decoder::{DecodeStats, Decoder};
use crate::tree::{Codon, ProgramTree, TreeError, TreeResult, TreeStatus};

impl<A> ProgramTree<A> {
    /// Independent, unbound copy of a built tree with its own identity.
    ///
    /// Node behaviors are immutable and shared with the original; the
    /// structure is not.
    pub fn copy(&self) -> TreeResult<Self> {
        let source = self.structure()?;
        let id = TreeId::new();
        let mut builder = ArenaBuilder::new(0, self.config.max_depth);
        builder.copy_subtree(source, 0, None)?;

        let mut copy = Self::empty(Arc::clone(&self.grammar), self.config.clone());
        copy.id = id;
        copy.revision = 1;
        copy.arena = Some(builder.finish(id, copy.revision));
        copy.root_category = self.root_category.clone();
        copy.genotype = self.genotype.clone();
        copy.stats = self.stats;
        copy.status = TreeStatus::Complete;
        Ok(copy)
    }

    /// Replaces the subtree at `target` with a copy of the subtree at
    /// `donor_node` in `donor`. Both subtrees must have the same category.
    pub fn graft(&mut self, target: NodeId, donor: &ProgramTree<A>, donor_node: NodeId) -> TreeResult<()> {
        let target = self.editable(target)?;
        if !Arc::ptr_eq(&self.grammar, &donor.grammar) {
            return Err(TreeError::GrammarMismatch);
        }
        let donor_arena = donor.structure()?;
        let donor_index = donor_arena.resolve(donor_node)?;

        let expected = &self.structure()?.slot(target).category;
        let found = &donor_arena.slot(donor_index).category;
        if expected != found {
            return Err(TreeError::CategoryMismatch {
                expected: expected.clone(),
                found: found.clone(),
            });
        }

        let arena = self.rebuild(target, |builder, parent| {
            builder.copy_subtree(donor_arena, donor_index, parent).map(|_| ())
        })?;
        debug!(tree = %self.id, donor = %donor.id, "subtree grafted");
        self.commit(arena);
        Ok(())
    }

    /// Replaces the subtree at `target` with a fresh derivation of the same
    /// category decoded from `codons`.
    pub fn regrow(&mut self, target: NodeId, codons: &[Codon]) -> TreeResult<DecodeStats> {
        let target = self.editable(target)?;
        let category = self.structure()?.slot(target).category.clone();

        let grammar = Arc::clone(&self.grammar);
        let mut decoder = Decoder::new(&grammar, self.id, codons, self.config.max_wraps);
        let arena = self.rebuild(target, |builder, parent| {
            decoder.decode_into(builder, category.clone(), parent).map(|_| ())
        })?;
        let stats = decoder.stats();
        debug!(tree = %self.id, %category, nodes = stats.nodes, "subtree regrown");
        self.commit(arena);
        Ok(stats)
    }

    /// Resolves an edit target; the tree must be complete and unbound and
    /// the target must not be the root.
    fn editable(&self, target: NodeId) -> TreeResult<u32> {
        if self.status == TreeStatus::Bound {
            return Err(TreeError::BoundToAgent);
        }
        let index = self.structure()?.resolve(target)?;
        if index == 0 {
            return Err(TreeError::RootReplacement);
        }
        Ok(index)
    }

    /// Copies the current structure into a new revision, handing the slot of
    /// `target` to `replace` instead of copying its subtree.
    fn rebuild<F>(&self, target: u32, mut replace: F) -> TreeResult<NodeArena<A>>
    where
        F: FnMut(&mut ArenaBuilder<A>, Option<u32>) -> TreeResult<()>,
    {
        let source = self.structure()?;
        let mut builder = ArenaBuilder::new(0, self.config.max_depth);
        let mut stack = vec![(0u32, None)];
        while let Some((index, parent)) = stack.pop() {
            if index == target {
                replace(&mut builder, parent)?;
                continue;
            }
            let slot = source.slot(index);
            let copied = builder.push(slot.category.clone(), Arc::clone(&slot.behavior), parent)?;
            for &child in slot.children.iter().rev() {
                stack.push((child, Some(copied)));
            }
        }
        Ok(builder.finish(self.id, self.revision.wrapping_add(1)))
    }

    fn commit(&mut self, arena: NodeArena<A>) {
        self.revision = arena.revision();
        self.arena = Some(arena);
        self.genotype = None;
        self.stats = None;
    }
}
