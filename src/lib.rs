//! # grammevo: Grammatical Evolution Derivation Engine
//!
//! grammevo maps linear integer genotypes onto executable program trees
//! through a context-free grammar, the genotype-to-phenotype step of
//! Grammatical Evolution.
//!
//! ## Pipeline
//!
//! ```text
//! Grammar (rules) + genotype (codons) -> ProgramTree::build -> bind(agent) -> evaluate
//! ```
//!
//! - A [`Grammar`] maps each [`Category`] to a node implementation
//!   ([`node::NodeFactory`]) and, for non-terminals, an ordered list of
//!   production alternatives. It is validated once and shared as
//!   `Arc<Grammar<A>>` by every tree decoded against it.
//! - [`ProgramTree::build`] walks the grammar depth-first, left to right.
//!   Each non-terminal decision reads one codon and picks
//!   `codon % alternatives`; the cursor wraps around the genotype up to
//!   [`DecodeConfig::max_wraps`] times.
//! - [`ProgramTree::bind`] attaches the agent whose actions and sensors the
//!   terminal nodes drive; [`ProgramTree::evaluate`] then runs the tree in
//!   one call, or [`ProgramTree::tick`] runs it one action at a time.
//!
//! ## Evolutionary operators
//!
//! Crossover and mutation live outside this crate. They work through
//! [`ProgramTree::get_nodes_by_type`], [`ProgramTree::get_parent_of_node`],
//! node introspection and the [`ProgramTree::graft`] /
//! [`ProgramTree::regrow`] primitives, which keep every tree structurally
//! valid.
//!
//! ## Modules
//!
//! - [`grammar`]: grammar model, builder and validation
//! - [`node`]: node contract, handles and evaluation scope
//! - [`nodes`]: built-in node variants
//! - [`tree`]: decoding, lifecycle, traversal, rendering and editing
//! - [`config`]: decode limits and engine settings
//! - [`error`]: crate-level error type

pub mod category;
pub mod config;
pub mod error;
pub mod grammar;
pub mod node;
pub mod nodes;
pub mod tree;
pub mod value;

// Re-exports
pub use category::Category;
pub use config::{DecodeConfig, EngineConfig, GrammarConfig};
pub use error::{Error, GeResult};
pub use grammar::{Grammar, GrammarBuilder, GrammarError, Production};
pub use node::{Arity, ExecMode, NodeBase, NodeBehavior, NodeError, NodeFactory, NodeId, Scope, TreeId};
pub use tree::{Codon, DecodeStats, ExecStatus, ProgramTree, TreeError, TreeResult, TreeStatus};
pub use value::Value;
