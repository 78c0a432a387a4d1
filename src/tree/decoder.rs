//! Genotype to phenotype mapping.
//!
//! Each non-terminal decision point reads one codon and selects
//! `codon % alternatives` among the category's productions, even when there
//! is only one alternative. Terminals read nothing. Children are expanded
//! depth-first, left to right.

use tracing::trace;

use crate::category::Category;
use crate::grammar::Grammar;
use crate::node::{NodeBase, NodeError, TreeId};
use crate::tree::arena::ArenaBuilder;
use crate::tree::{Codon, TreeError, TreeResult};

/// Summary of one successful decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DecodeStats {
    /// Codons read, counting re-reads after wrapping.
    pub codons_consumed: usize,
    /// How many times the cursor wrapped to the start of the genotype.
    pub wraps: u32,
    pub nodes: usize,
    /// Depth of the deepest node, the root being at depth 0.
    pub depth: usize,
}

struct CodonCursor<'g> {
    genotype: &'g [Codon],
    position: usize,
    consumed: usize,
    wraps: u32,
    max_wraps: u32,
}

impl<'g> CodonCursor<'g> {
    fn new(genotype: &'g [Codon], max_wraps: u32) -> Self {
        Self {
            genotype,
            position: 0,
            consumed: 0,
            wraps: 0,
            max_wraps,
        }
    }

    fn next(&mut self) -> Option<Codon> {
        if self.genotype.is_empty() {
            return None;
        }
        if self.position == self.genotype.len() {
            if self.wraps >= self.max_wraps {
                return None;
            }
            self.wraps += 1;
            self.position = 0;
        }
        let codon = self.genotype[self.position];
        self.position += 1;
        self.consumed += 1;
        Some(codon)
    }
}

pub(crate) struct Decoder<'g, A> {
    grammar: &'g Grammar<A>,
    tree: TreeId,
    cursor: CodonCursor<'g>,
    nodes: usize,
    max_depth: usize,
}

impl<'g, A> Decoder<'g, A> {
    pub(crate) fn new(grammar: &'g Grammar<A>, tree: TreeId, genotype: &'g [Codon], max_wraps: u32) -> Self {
        Self {
            grammar,
            tree,
            cursor: CodonCursor::new(genotype, max_wraps),
            nodes: 0,
            max_depth: 0,
        }
    }

    /// Expands `root` and its whole subtree into `builder` under `parent`.
    /// Returns the slot index of the expanded root.
    pub(crate) fn decode_into(
        &mut self,
        builder: &mut ArenaBuilder<A>,
        root: Category,
        parent: Option<u32>,
    ) -> TreeResult<u32> {
        let grammar = self.grammar;
        let mut stack = vec![(root, parent)];
        let mut subtree_root = None;

        while let Some((category, parent)) = stack.pop() {
            let rule = grammar.rule(category.as_str())?;
            let depth = builder.depth_of(parent);

            if rule.factory.arity().is_terminal() {
                let base = NodeBase {
                    category: category.clone(),
                    tree: self.tree,
                    depth,
                    child_count: 0,
                };
                let behavior = rule.factory.create(&base)?;
                let arity = behavior.arity();
                if !arity.is_terminal() {
                    return Err(NodeError::ArityMismatch {
                        category,
                        arity,
                        children: 0,
                    }
                    .into());
                }
                let index = builder.push(category, behavior, parent)?;
                subtree_root.get_or_insert(index);
                self.record(depth);
                continue;
            }

            if rule.productions.is_empty() {
                return Err(TreeError::NoProductions(category));
            }

            let Some(codon) = self.cursor.next() else {
                return Err(TreeError::NodeMissingChild {
                    category,
                    codons_consumed: self.cursor.consumed,
                    max_wraps: self.cursor.max_wraps,
                });
            };
            let choice = codon as usize % rule.productions.len();
            let production = &rule.productions[choice];
            trace!(%category, codon, choice, depth, "selected production");

            let base = NodeBase {
                category: category.clone(),
                tree: self.tree,
                depth,
                child_count: production.len(),
            };
            let behavior = rule.factory.create(&base)?;
            let arity = behavior.arity();
            if !arity.accepts(production.len()) {
                return Err(NodeError::ArityMismatch {
                    category,
                    arity,
                    children: production.len(),
                }
                .into());
            }

            let index = builder.push(category, behavior, parent)?;
            subtree_root.get_or_insert(index);
            self.record(depth);
            for child in production.children().iter().rev() {
                stack.push((child.clone(), Some(index)));
            }
        }

        // the first pop always pushes a slot or returns an error
        Ok(subtree_root.unwrap_or_default())
    }

    fn record(&mut self, depth: usize) {
        self.nodes += 1;
        self.max_depth = self.max_depth.max(depth);
    }

    pub(crate) fn stats(&self) -> DecodeStats {
        DecodeStats {
            codons_consumed: self.cursor.consumed,
            wraps: self.cursor.wraps,
            nodes: self.nodes,
            depth: self.max_depth,
        }
    }
}
