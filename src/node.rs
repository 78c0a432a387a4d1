//! # Program Nodes
//!
//! A node is one vertex of a derivation tree. Its shape (category, children,
//! parent, depth) is owned by the [`ProgramTree`](crate::tree::ProgramTree)
//! arena; its behavior is a [`NodeBehavior`] produced by the category's
//! [`NodeFactory`] when the tree instantiates the node.
//!
//! ## Construction
//!
//! Node construction happens in two phases:
//!
//! 1. **Base initialization** is performed uniformly by the tree builder. It
//!    records the category, allocates the (initially empty) child slice and
//!    ties the node to its tree. The result is summarized in a [`NodeBase`].
//! 2. **Custom initialization** is the [`NodeFactory::create`] hook, which
//!    receives the [`NodeBase`] and returns the variant-specific behavior
//!    (an operator, a literal constant, a label).
//!
//! ## Evaluation
//!
//! [`NodeBehavior::evaluate`] receives a [`Scope`] through which it reaches
//! the bound agent and evaluates its children.
//!
//! Step-wise execution ([`ProgramTree::tick`](crate::tree::ProgramTree::tick))
//! consults [`NodeBehavior::exec_mode`] instead. Action terminals end a tick,
//! value nodes are evaluated in one piece, and control nodes pick their next
//! child through [`NodeBehavior::next_child`] so a later tick can resume them.

pub mod arity;
pub mod scope;

use std::fmt;
use std::sync::Arc;

use thiserror::Error;
use uuid::Uuid;

use crate::category::Category;
use crate::value::Value;

pub use arity::Arity;
pub use scope::Scope;

/// Identity of one [`ProgramTree`](crate::tree::ProgramTree) instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TreeId(pub Uuid);

impl TreeId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TreeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TreeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Handle to a node inside a tree.
///
/// Handles are only meaningful for the tree (and the revision of that tree)
/// they were obtained from. Structural edits bump the revision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId {
    pub(crate) tree: TreeId,
    pub(crate) revision: u32,
    pub(crate) index: u32,
}

impl NodeId {
    pub fn tree(&self) -> TreeId {
        self.tree
    }

    /// Position of the node in depth-first decoding order.
    pub fn index(&self) -> usize {
        self.index as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}@r{}", self.index, self.revision)
    }
}

/// Record of the base initialization phase, handed to the custom-init hook.
#[derive(Debug, Clone)]
pub struct NodeBase {
    pub category: Category,
    pub tree: TreeId,
    pub depth: usize,
    /// Number of children the chosen production attaches (0 for terminals).
    pub child_count: usize,
}

/// How the step-wise executor treats a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecMode {
    /// Fired through `evaluate`; ends the current tick.
    Action,
    /// Evaluated in one piece through `evaluate`; does not end the tick.
    Atomic,
    /// Descends into the children chosen by `next_child`.
    Resumable,
}

/// Evaluation behavior of a node, generic over the agent type `A`.
pub trait NodeBehavior<A>: Send + Sync {
    fn arity(&self) -> Arity;

    fn is_terminal(&self) -> bool {
        self.arity().is_terminal()
    }

    fn evaluate(&self, scope: &mut Scope<'_, A>) -> NodeResult<Value>;

    fn exec_mode(&self) -> ExecMode {
        ExecMode::Atomic
    }

    /// Child to run next when this node has already descended `visits`
    /// times during the current execution, or `None` once it is done.
    /// Only called for [`ExecMode::Resumable`] nodes.
    fn next_child(&self, _visits: usize, _scope: &mut Scope<'_, A>) -> NodeResult<Option<usize>> {
        Ok(None)
    }

    /// Extra text shown next to the category when a tree is rendered.
    fn label(&self) -> Option<String> {
        None
    }
}

/// Custom-init hook for a category: produces the behavior of each new node.
pub trait NodeFactory<A>: Send + Sync {
    /// Arity of every node this factory produces. Used to validate productions.
    fn arity(&self) -> Arity;

    fn create(&self, base: &NodeBase) -> NodeResult<Arc<dyn NodeBehavior<A>>>;
}

/// Factory that hands the same behavior instance to every node of a category.
///
/// Suits variants whose state is fixed at registration time.
pub struct Shared<A> {
    behavior: Arc<dyn NodeBehavior<A>>,
}

impl<A> Shared<A> {
    pub fn new<B>(behavior: B) -> Self
    where
        B: NodeBehavior<A> + 'static,
    {
        Self {
            behavior: Arc::new(behavior),
        }
    }
}

impl<A> NodeFactory<A> for Shared<A> {
    fn arity(&self) -> Arity {
        self.behavior.arity()
    }

    fn create(&self, _base: &NodeBase) -> NodeResult<Arc<dyn NodeBehavior<A>>> {
        Ok(Arc::clone(&self.behavior))
    }
}

/// Factory backed by a closure, for per-node custom initialization.
pub struct InitFn<F> {
    arity: Arity,
    init: F,
}

impl<F> InitFn<F> {
    pub fn new(arity: Arity, init: F) -> Self {
        Self { arity, init }
    }
}

impl<A, F> NodeFactory<A> for InitFn<F>
where
    F: Fn(&NodeBase) -> NodeResult<Arc<dyn NodeBehavior<A>>> + Send + Sync,
{
    fn arity(&self) -> Arity {
        self.arity
    }

    fn create(&self, base: &NodeBase) -> NodeResult<Arc<dyn NodeBehavior<A>>> {
        (self.init)(base)
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum NodeError {
    #[error("Invalid node initialization: {0}")]
    InvalidInit(String),
    #[error("Node {category} has arity {arity} but its production has {children} children")]
    ArityMismatch {
        category: Category,
        arity: Arity,
        children: usize,
    },
    #[error("Node {category} has no child at index {index} (children: {count})")]
    ChildOutOfRange {
        category: Category,
        index: usize,
        count: usize,
    },
    #[error("Node {category} expected a {expected} value, got {found}")]
    TypeMismatch {
        category: Category,
        expected: &'static str,
        found: &'static str,
    },
    #[error("Evaluation step limit of {0} exceeded")]
    StepLimitExceeded(u64),
    #[error("Node {category} failed: {message}")]
    Failed { category: Category, message: String },
}

pub type NodeResult<T> = Result<T, NodeError>;

impl NodeError {
    pub fn type_mismatch(category: &Category, expected: &'static str, found: &Value) -> Self {
        NodeError::TypeMismatch {
            category: category.clone(),
            expected,
            found: found.type_name(),
        }
    }

    pub fn failed(category: &Category, message: impl Into<String>) -> Self {
        NodeError::Failed {
            category: category.clone(),
            message: message.into(),
        }
    }
}
