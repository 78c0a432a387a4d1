//! # Grammar
//!
//! A grammar maps every category to the factory that instantiates its nodes
//! and, for non-terminals, to an ordered list of [`Production`] alternatives.
//!
//! Grammars are assembled with a [`GrammarBuilder`], validated once by
//! [`GrammarBuilder::build`], and are immutable afterwards. A single
//! `Arc<Grammar<A>>` is shared by every tree decoded against it, across
//! generations and across threads.
//!
//! The grammar does not choose between alternatives; it only enumerates the
//! legal ones. Selection is driven by the genotype during decoding.
//!
//! ```rust
//! use grammevo::grammar::Grammar;
//! use grammevo::nodes::{basic::Root, factor::Constant, logic::Sequence};
//!
//! let mut builder = Grammar::<()>::builder();
//! builder
//!     .register_behavior("R", Sequence::variable())
//!     .register_behavior("A", Root)
//!     .register_behavior("T", Constant::integer(1))
//!     .register_production("R", ["A", "A"])
//!     .register_production("R", ["T"])
//!     .register_production("A", ["T"])
//!     .set_root("R");
//! let grammar = builder.build().unwrap();
//! assert_eq!(grammar.get_productions("R").unwrap().len(), 2);
//! ```

pub mod builder;
pub mod production;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::category::Category;
use crate::config::GrammarConfig;
use crate::node::{Arity, NodeFactory};

pub use builder::GrammarBuilder;
pub use production::Production;

pub(crate) struct Rule<A> {
    pub(crate) factory: Arc<dyn NodeFactory<A>>,
    pub(crate) productions: Vec<Production>,
}

/// Validated, immutable set of production rules for agents of type `A`.
pub struct Grammar<A> {
    rules: HashMap<Category, Rule<A>>,
    root: Option<Category>,
    config: GrammarConfig,
}

impl<A> Grammar<A> {
    pub fn builder() -> GrammarBuilder<A> {
        GrammarBuilder::new()
    }

    pub(crate) fn from_parts(
        rules: HashMap<Category, Rule<A>>,
        root: Option<Category>,
        config: GrammarConfig,
    ) -> Self {
        Self {
            rules,
            root,
            config,
        }
    }

    pub(crate) fn rule(&self, category: &str) -> GrammarResult<&Rule<A>> {
        self.rules
            .get(category)
            .ok_or_else(|| GrammarError::UnknownCategory(Category::from(category)))
    }

    /// Alternatives registered for `category`, in registration order.
    /// Terminals have none.
    pub fn get_productions(&self, category: &str) -> GrammarResult<&[Production]> {
        Ok(&self.rule(category)?.productions)
    }

    pub fn is_terminal(&self, category: &str) -> GrammarResult<bool> {
        Ok(self.rule(category)?.factory.arity().is_terminal())
    }

    pub fn arity(&self, category: &str) -> GrammarResult<Arity> {
        Ok(self.rule(category)?.factory.arity())
    }

    pub fn contains(&self, category: &str) -> bool {
        self.rules.contains_key(category)
    }

    /// All registered categories, sorted by name.
    pub fn categories(&self) -> Vec<&Category> {
        let mut categories: Vec<&Category> = self.rules.keys().collect();
        categories.sort();
        categories
    }

    /// Root category declared at build time, if any.
    pub fn root(&self) -> Option<&Category> {
        self.root.as_ref()
    }

    pub fn config(&self) -> &GrammarConfig {
        &self.config
    }
}

impl<A> fmt::Debug for Grammar<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut rules: Vec<(&Category, &Rule<A>)> = self.rules.iter().collect();
        rules.sort_by(|a, b| a.0.cmp(b.0));
        let mut map = f.debug_map();
        for (category, rule) in rules {
            map.entry(&category.as_str(), &rule.productions);
        }
        map.finish()
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GrammarError {
    #[error("Unknown category: {0}")]
    UnknownCategory(Category),
    #[error("Category registered more than once: {0}")]
    DuplicateCategory(Category),
    #[error("No node implementation registered for category {0}")]
    MissingImplementation(Category),
    #[error("Terminal category {0} cannot have productions")]
    TerminalWithProductions(Category),
    #[error("Empty production registered for {0}")]
    EmptyProduction(Category),
    #[error("Production {production} for {category} does not fit node arity {arity}")]
    ArityMismatch {
        category: Category,
        arity: Arity,
        production: String,
    },
    #[error("Production for {parent} references undefined category {child}")]
    UndefinedChild { parent: Category, child: Category },
    #[error("Non-terminal category {0} has no productions")]
    NoProductions(Category),
    #[error("Multiple grammar errors: {0:?}")]
    Multiple(Vec<GrammarError>),
}

pub type GrammarResult<T> = Result<T, GrammarError>;
