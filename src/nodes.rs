//! Built-in node variants.
//!
//! - [`basic`]: root/pass-through nodes and agent-facing terminals
//!   ([`Action`](basic::Action), [`Sensor`](basic::Sensor)).
//! - [`factor`]: literal constants and arithmetic over factors.
//! - [`logic`]: sequencing, conditional branching, repetition, comparison
//!   and boolean composition.
//!
//! Every variant implements [`NodeBehavior`](crate::node::NodeBehavior) and
//! can be registered with
//! [`GrammarBuilder::register_behavior`](crate::grammar::GrammarBuilder::register_behavior).

pub mod basic;
pub mod factor;
pub mod logic;
