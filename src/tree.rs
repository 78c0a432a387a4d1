//! # Program Trees
//!
//! A [`ProgramTree`] decodes a genotype into a derivation tree against a
//! shared [`Grammar`], then runs it against an agent once bound.
//!
//! ## Lifecycle
//!
//! | Status        | Entered by        | Allowed operations                                   |
//! |---------------|-------------------|------------------------------------------------------|
//! | `EMPTY`       | construction      | `build`                                              |
//! | `IN_PROGRESS` | `build` start     | none                                                 |
//! | `COMPLETE`    | `build` success   | `build`, `bind`, traversal, editing, rendering       |
//! | `BOUND`       | `bind` success    | `evaluate`, `tick`, `run`, traversal, rendering      |
//!
//! A failed build returns the tree to `EMPTY`; a decode never leaves a
//! half-built structure visible. A panic raised by a custom-init hook leaves
//! the tree `IN_PROGRESS`, and the instance rejects every later build.
//!
//! ## Execution
//!
//! [`ProgramTree::evaluate`] runs the whole tree in one call and returns its
//! value. [`ProgramTree::tick`] runs it step-wise: each tick advances until
//! one action terminal fires, and the next tick resumes after it. The
//! [`ExecStatus`] reports whether an execution is in flight;
//! [`ProgramTree::kill`] abandons it.
//!
//! ## Node handles
//!
//! Traversal hands out [`NodeId`] handles. A handle carries the identity of
//! its tree and the revision it was taken at, so handles from another tree
//! are rejected with [`TreeError::ForeignNode`] and handles taken before a
//! rebuild or an edit are rejected with [`TreeError::StaleNode`].

pub(crate) mod arena;
mod decoder;
mod edit;
mod exec;
mod render;
pub mod status;

use std::fmt;
use std::sync::{Arc, Mutex, Weak};

use thiserror::Error;
use tracing::{debug, instrument, trace};

use crate::category::Category;
use crate::config::DecodeConfig;
use crate::grammar::{Grammar, GrammarError};
use crate::node::scope::StepBudget;
use crate::node::{Arity, NodeError, NodeId, Scope, TreeId};
use crate::value::Value;

use arena::{ArenaBuilder, NodeArena};
use decoder::Decoder;
use exec::ExecStack;

pub use decoder::DecodeStats;
pub use exec::ExecStatus;
pub use status::TreeStatus;

/// One genotype element.
pub type Codon = u32;

/// Genotype-decoded program for agents of type `A`.
pub struct ProgramTree<A> {
    id: TreeId,
    grammar: Arc<Grammar<A>>,
    config: DecodeConfig,
    status: TreeStatus,
    revision: u32,
    arena: Option<NodeArena<A>>,
    root_category: Option<Category>,
    genotype: Option<Vec<Codon>>,
    stats: Option<DecodeStats>,
    agent: Option<Weak<Mutex<A>>>,
    exec: ExecStack,
}

impl<A> ProgramTree<A> {
    pub fn new(grammar: Arc<Grammar<A>>) -> Self {
        Self::empty(grammar, DecodeConfig::default())
    }

    /// Empty tree with custom limits. Rejects limits that would make every
    /// build or evaluation fail.
    pub fn with_config(grammar: Arc<Grammar<A>>, config: DecodeConfig) -> TreeResult<Self> {
        config
            .validate()
            .map_err(|err| TreeError::InvalidConfig(err.to_string()))?;
        Ok(Self::empty(grammar, config))
    }

    fn empty(grammar: Arc<Grammar<A>>, config: DecodeConfig) -> Self {
        Self {
            id: TreeId::new(),
            grammar,
            config,
            status: TreeStatus::Empty,
            revision: 0,
            arena: None,
            root_category: None,
            genotype: None,
            stats: None,
            agent: None,
            exec: ExecStack::default(),
        }
    }

    /// Creates a tree and builds it in one step.
    pub fn decode(grammar: Arc<Grammar<A>>, root: &str, genotype: &[Codon]) -> TreeResult<Self> {
        let mut tree = Self::new(grammar);
        tree.build(root, genotype)?;
        Ok(tree)
    }

    /// Decodes `genotype` starting from `root`, replacing any previous
    /// structure.
    #[instrument(level = "debug", skip(self, genotype), fields(tree = %self.id, codons = genotype.len()))]
    pub fn build(&mut self, root: &str, genotype: &[Codon]) -> TreeResult<DecodeStats> {
        match self.status {
            TreeStatus::InProgress => return Err(TreeError::ProgramInProgress),
            TreeStatus::Bound => return Err(TreeError::BoundToAgent),
            TreeStatus::Empty | TreeStatus::Complete => {}
        }

        self.status = TreeStatus::InProgress;
        self.arena = None;
        self.root_category = None;
        self.genotype = None;
        self.stats = None;
        self.exec.clear();
        self.revision = self.revision.wrapping_add(1);

        let grammar = Arc::clone(&self.grammar);
        let root = Category::from(root);
        let mut builder = ArenaBuilder::new(0, self.config.max_depth);
        let mut decoder = Decoder::new(&grammar, self.id, genotype, self.config.max_wraps);

        if let Err(err) = decoder.decode_into(&mut builder, root.clone(), None) {
            debug!(error = %err, "decode failed");
            self.status = TreeStatus::Empty;
            return Err(err);
        }

        let stats = decoder.stats();
        self.arena = Some(builder.finish(self.id, self.revision));
        self.root_category = Some(root);
        self.genotype = Some(genotype.to_vec());
        self.stats = Some(stats);
        self.status = TreeStatus::Complete;
        debug!(
            nodes = stats.nodes,
            depth = stats.depth,
            codons_consumed = stats.codons_consumed,
            wraps = stats.wraps,
            "tree built"
        );
        Ok(stats)
    }

    /// Associates the tree with the agent it will drive. The tree keeps a
    /// non-owning handle; the caller keeps the agent alive.
    #[instrument(level = "debug", skip_all, fields(tree = %self.id))]
    pub fn bind(&mut self, agent: &Arc<Mutex<A>>) -> TreeResult<()> {
        match self.status {
            TreeStatus::Bound => Err(TreeError::BoundToAgent),
            TreeStatus::InProgress => Err(TreeError::ProgramInProgress),
            TreeStatus::Empty => Err(TreeError::NotComplete(TreeStatus::Empty)),
            TreeStatus::Complete => {
                self.agent = Some(Arc::downgrade(agent));
                self.status = TreeStatus::Bound;
                debug!("tree bound to agent");
                Ok(())
            }
        }
    }

    /// Evaluates the tree once from the root.
    pub fn evaluate(&self) -> TreeResult<Value> {
        let (arena, agent) = self.runnable()?;
        let mut agent = agent.lock().map_err(|_| TreeError::AgentPoisoned)?;
        self.evaluate_root(arena, &mut agent)
    }

    /// Advances execution until one action terminal fires or the program
    /// exits. An exited program restarts from the root. A failing tick
    /// abandons the execution in flight.
    pub fn tick(&mut self) -> TreeResult<ExecStatus> {
        let agent = self.bound_agent()?;
        let mut agent = agent.lock().map_err(|_| TreeError::AgentPoisoned)?;
        let arena = self
            .arena
            .as_ref()
            .ok_or(TreeError::NotComplete(self.status))?;

        let mut budget = StepBudget::new(self.config.max_eval_steps);
        if let Err(err) = self.exec.tick(arena, &mut *agent, &mut budget) {
            debug!(tree = %self.id, error = %err, "tick failed, execution abandoned");
            self.exec.clear();
            return Err(err.into());
        }
        Ok(self.exec.status())
    }

    /// One agent step: ticks, and when the execution in flight runs out
    /// without firing an action, restarts the program and ticks again.
    pub fn step(&mut self) -> TreeResult<ExecStatus> {
        let resumed = self.is_running();
        match self.tick()? {
            ExecStatus::Exited if resumed => self.tick(),
            status => Ok(status),
        }
    }

    /// Abandons the execution in flight; the next tick starts at the root.
    pub fn kill(&mut self) {
        if self.is_running() {
            debug!(tree = %self.id, "execution killed");
        }
        self.exec.clear();
    }

    pub fn exec_status(&self) -> ExecStatus {
        self.exec.status()
    }

    pub fn is_running(&self) -> bool {
        self.exec.status() == ExecStatus::Running
    }

    /// Abandons any execution in flight, then runs the program to completion
    /// `times` times through [`tick`](Self::tick).
    pub fn run(&mut self, times: usize) -> TreeResult<()> {
        self.kill();
        for _ in 0..times {
            while self.tick()? == ExecStatus::Running {}
        }
        Ok(())
    }

    fn runnable(&self) -> TreeResult<(&NodeArena<A>, Arc<Mutex<A>>)> {
        let agent = self.bound_agent()?;
        Ok((self.structure()?, agent))
    }

    fn bound_agent(&self) -> TreeResult<Arc<Mutex<A>>> {
        if self.status != TreeStatus::Bound {
            return Err(TreeError::MissingAgent);
        }
        self.agent
            .as_ref()
            .and_then(Weak::upgrade)
            .ok_or(TreeError::MissingAgent)
    }

    fn evaluate_root(&self, arena: &NodeArena<A>, agent: &mut A) -> TreeResult<Value> {
        let mut budget = StepBudget::new(self.config.max_eval_steps);
        let value = Scope::new(arena, 0, agent, &mut budget).run()?;
        trace!(steps = budget.used(), result = %value, "tree evaluated");
        Ok(value)
    }

    fn structure(&self) -> TreeResult<&NodeArena<A>> {
        self.arena
            .as_ref()
            .ok_or(TreeError::NotComplete(self.status))
    }

    pub fn status(&self) -> TreeStatus {
        self.status
    }

    pub fn is_bound(&self) -> bool {
        self.status == TreeStatus::Bound
    }

    pub fn id(&self) -> TreeId {
        self.id
    }

    pub fn grammar(&self) -> &Arc<Grammar<A>> {
        &self.grammar
    }

    pub fn config(&self) -> &DecodeConfig {
        &self.config
    }

    /// Bumped by every build and structural edit.
    pub fn revision(&self) -> u32 {
        self.revision
    }

    pub fn root(&self) -> TreeResult<NodeId> {
        Ok(self.structure()?.id(0))
    }

    /// All nodes of `category` in depth-first decoding order.
    pub fn get_nodes_by_type(&self, category: &str) -> TreeResult<&[NodeId]> {
        Ok(self.structure()?.nodes_of(category))
    }

    /// Parent of `node`, or `None` for the root.
    pub fn get_parent_of_node(&self, node: NodeId) -> TreeResult<Option<NodeId>> {
        let arena = self.structure()?;
        let index = arena.resolve(node)?;
        Ok(arena.slot(index).parent.map(|(parent, _)| arena.id(parent)))
    }

    /// Index of `node` among its parent's children, or `None` for the root.
    pub fn position_in_parent(&self, node: NodeId) -> TreeResult<Option<usize>> {
        let arena = self.structure()?;
        let index = arena.resolve(node)?;
        Ok(arena.slot(index).parent.map(|(_, position)| position as usize))
    }

    pub fn children_of(&self, node: NodeId) -> TreeResult<Vec<NodeId>> {
        let arena = self.structure()?;
        let index = arena.resolve(node)?;
        Ok(arena
            .slot(index)
            .children
            .iter()
            .map(|&child| arena.id(child))
            .collect())
    }

    pub fn category_of(&self, node: NodeId) -> TreeResult<&Category> {
        let arena = self.structure()?;
        let index = arena.resolve(node)?;
        Ok(&arena.slot(index).category)
    }

    pub fn arity_of(&self, node: NodeId) -> TreeResult<Arity> {
        let arena = self.structure()?;
        let index = arena.resolve(node)?;
        Ok(arena.slot(index).behavior.arity())
    }

    pub fn depth_of(&self, node: NodeId) -> TreeResult<usize> {
        let arena = self.structure()?;
        let index = arena.resolve(node)?;
        Ok(arena.slot(index).depth as usize)
    }

    /// Number of nodes; 0 when nothing is built.
    pub fn size(&self) -> usize {
        self.arena.as_ref().map_or(0, NodeArena::len)
    }

    /// Depth of the deepest node; 0 when nothing is built.
    pub fn depth(&self) -> usize {
        self.arena.as_ref().map_or(0, NodeArena::max_depth)
    }

    /// Every node in depth-first decoding order.
    pub fn nodes(&self) -> TreeResult<Vec<NodeId>> {
        let arena = self.structure()?;
        Ok((0..arena.len() as u32).map(|index| arena.id(index)).collect())
    }

    /// Genotype of the last successful build. Cleared by structural edits,
    /// since it no longer reproduces the tree.
    pub fn genotype(&self) -> Option<&[Codon]> {
        self.genotype.as_deref()
    }

    pub fn root_category(&self) -> Option<&Category> {
        self.root_category.as_ref()
    }

    pub fn decode_stats(&self) -> Option<DecodeStats> {
        self.stats
    }

    /// Same categories in the same shape. Trees with no structure only
    /// match each other.
    pub fn same_structure(&self, other: &ProgramTree<A>) -> bool {
        match (&self.arena, &other.arena) {
            (Some(a), Some(b)) => {
                a.len() == b.len()
                    && a
                        .slots()
                        .iter()
                        .zip(b.slots())
                        .all(|(x, y)| x.category == y.category && x.children == y.children)
            }
            (None, None) => true,
            _ => false,
        }
    }

    /// Re-verifies that every node's children match one production of its
    /// category and the arity of its behavior, and that terminals have no
    /// children.
    pub fn check_structure(&self) -> TreeResult<()> {
        let arena = self.structure()?;
        for slot in arena.slots() {
            let children: Vec<&Category> = slot
                .children
                .iter()
                .map(|&child| &arena.slot(child).category)
                .collect();
            let arity = slot.behavior.arity();
            if !arity.accepts(children.len()) {
                return Err(NodeError::ArityMismatch {
                    category: slot.category.clone(),
                    arity,
                    children: children.len(),
                }
                .into());
            }
            let rule = self.grammar.rule(slot.category.as_str())?;
            let valid = if rule.factory.arity().is_terminal() {
                children.is_empty()
            } else {
                rule.productions
                    .iter()
                    .any(|production| production.matches(children.iter().copied()))
            };
            if !valid {
                return Err(TreeError::StructureViolation {
                    category: slot.category.clone(),
                    children: children.into_iter().cloned().collect(),
                });
            }
        }
        Ok(())
    }
}

impl<A> fmt::Debug for ProgramTree<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgramTree")
            .field("id", &self.id)
            .field("status", &self.status)
            .field("revision", &self.revision)
            .field("root_category", &self.root_category)
            .field("size", &self.size())
            .field("exec", &self.exec.status())
            .finish()
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TreeError {
    #[error("Program tree is already being built")]
    ProgramInProgress,
    #[error("Genotype exhausted while expanding {category} ({codons_consumed} codons read, wrap limit {max_wraps})")]
    NodeMissingChild {
        category: Category,
        codons_consumed: usize,
        max_wraps: u32,
    },
    #[error("Non-terminal category {0} has no productions")]
    NoProductions(Category),
    #[error("Node {category} exceeds the depth limit of {limit}")]
    DepthExceeded { category: Category, limit: usize },
    #[error("No agent is bound to the tree")]
    MissingAgent,
    #[error("Tree is already bound to an agent")]
    BoundToAgent,
    #[error("Agent lock is poisoned")]
    AgentPoisoned,
    #[error("Invalid tree configuration: {0}")]
    InvalidConfig(String),
    #[error("Tree has no complete structure (status: {0})")]
    NotComplete(TreeStatus),
    #[error("Node {0} does not belong to this tree")]
    ForeignNode(NodeId),
    #[error("Node {0} refers to an earlier revision of this tree")]
    StaleNode(NodeId),
    #[error("The root node cannot be replaced")]
    RootReplacement,
    #[error("Expected a subtree of category {expected}, found {found}")]
    CategoryMismatch { expected: Category, found: Category },
    #[error("Trees were decoded against different grammars")]
    GrammarMismatch,
    #[error("Children {children:?} of {category} match none of its productions")]
    StructureViolation {
        category: Category,
        children: Vec<Category>,
    },
    #[error("Grammar error: {0}")]
    Grammar(#[from] GrammarError),
    #[error("Node error: {0}")]
    Node(#[from] NodeError),
}

pub type TreeResult<T> = Result<T, TreeError>;
