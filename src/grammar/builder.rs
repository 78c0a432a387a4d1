use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::category::Category;
use crate::config::GrammarConfig;
use crate::grammar::{Grammar, GrammarError, GrammarResult, Production, Rule};
use crate::node::{NodeBehavior, NodeFactory, Shared};

/// Collects node registrations and production rules before validation.
///
/// Registration never fails eagerly; every problem is reported by
/// [`GrammarBuilder::build`].
pub struct GrammarBuilder<A> {
    factories: HashMap<Category, Arc<dyn NodeFactory<A>>>,
    productions: HashMap<Category, Vec<Production>>,
    duplicates: Vec<Category>,
    root: Option<Category>,
    config: GrammarConfig,
}

impl<A> Default for GrammarBuilder<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> GrammarBuilder<A> {
    pub fn new() -> Self {
        Self::with_config(GrammarConfig::default())
    }

    pub fn with_config(config: GrammarConfig) -> Self {
        Self {
            factories: HashMap::new(),
            productions: HashMap::new(),
            duplicates: Vec::new(),
            root: None,
            config,
        }
    }

    /// Registers the node implementation for `category`.
    pub fn register_node<F>(&mut self, category: impl Into<Category>, factory: F) -> &mut Self
    where
        F: NodeFactory<A> + 'static,
    {
        let category = category.into();
        if self.factories.contains_key(&category) {
            self.duplicates.push(category);
        } else {
            self.factories.insert(category, Arc::new(factory));
        }
        self
    }

    /// Registers a behavior shared by every node of `category`.
    pub fn register_behavior<B>(&mut self, category: impl Into<Category>, behavior: B) -> &mut Self
    where
        B: NodeBehavior<A> + 'static,
        A: 'static,
    {
        self.register_node(category, Shared::new(behavior))
    }

    /// Appends an alternative expansion for `category`. Repeated calls
    /// accumulate alternatives in order.
    pub fn register_production<I, C>(&mut self, category: impl Into<Category>, children: I) -> &mut Self
    where
        I: IntoIterator<Item = C>,
        C: Into<Category>,
    {
        self.productions
            .entry(category.into())
            .or_default()
            .push(Production::new(children));
        self
    }

    /// Declares the start category; enables reachability checks.
    pub fn set_root(&mut self, category: impl Into<Category>) -> &mut Self {
        self.root = Some(category.into());
        self
    }

    pub fn build(mut self) -> GrammarResult<Grammar<A>> {
        let mut errors = Vec::new();

        for category in self.duplicates.drain(..) {
            errors.push(GrammarError::DuplicateCategory(category));
        }

        let mut with_productions: Vec<&Category> = self.productions.keys().collect();
        with_productions.sort();
        for category in with_productions {
            let Some(factory) = self.factories.get(category) else {
                errors.push(GrammarError::MissingImplementation(category.clone()));
                continue;
            };
            let arity = factory.arity();
            let productions = &self.productions[category];
            if arity.is_terminal() {
                errors.push(GrammarError::TerminalWithProductions(category.clone()));
                continue;
            }
            for production in productions {
                if production.is_empty() {
                    errors.push(GrammarError::EmptyProduction(category.clone()));
                    continue;
                }
                if !arity.accepts(production.len()) {
                    errors.push(GrammarError::ArityMismatch {
                        category: category.clone(),
                        arity,
                        production: production.to_string(),
                    });
                }
                for child in production.children() {
                    if !self.factories.contains_key(child) {
                        errors.push(GrammarError::UndefinedChild {
                            parent: category.clone(),
                            child: child.clone(),
                        });
                    }
                }
            }
        }

        match &self.root {
            Some(root) if !self.factories.contains_key(root) => {
                errors.push(GrammarError::UnknownCategory(root.clone()));
            }
            Some(root) => {
                let reachable = self.reachable_from(root);
                let mut unexpanded: Vec<&Category> = reachable
                    .iter()
                    .copied()
                    .filter(|c| self.is_unexpanded_non_terminal(c))
                    .collect();
                unexpanded.sort();
                for category in unexpanded {
                    errors.push(GrammarError::NoProductions(category.clone()));
                }
                if self.config.warnings {
                    let mut unreachable: Vec<&Category> = self
                        .factories
                        .keys()
                        .filter(|c| !reachable.contains(c))
                        .collect();
                    unreachable.sort();
                    for category in unreachable {
                        warn!(%category, %root, "category is not reachable from the grammar root");
                    }
                    for parent in self.root_references(root) {
                        warn!(%parent, %root, "grammar root is used as a child category");
                    }
                }
            }
            None => {
                if self.config.warnings {
                    let mut unexpanded: Vec<&Category> = self
                        .factories
                        .keys()
                        .filter(|c| self.is_unexpanded_non_terminal(c))
                        .collect();
                    unexpanded.sort();
                    for category in unexpanded {
                        warn!(%category, "non-terminal category has no productions");
                    }
                }
            }
        }

        match errors.len() {
            0 => {}
            1 => return Err(errors.remove(0)),
            _ => return Err(GrammarError::Multiple(errors)),
        }

        let mut productions = std::mem::take(&mut self.productions);
        let rules: HashMap<Category, Rule<A>> = self
            .factories
            .into_iter()
            .map(|(category, factory)| {
                let productions = productions.remove(&category).unwrap_or_default();
                (
                    category,
                    Rule {
                        factory,
                        productions,
                    },
                )
            })
            .collect();

        debug!(categories = rules.len(), root = ?self.root, "grammar built");
        Ok(Grammar::from_parts(rules, self.root, self.config))
    }

    fn is_unexpanded_non_terminal(&self, category: &Category) -> bool {
        let non_terminal = self
            .factories
            .get(category)
            .is_some_and(|f| !f.arity().is_terminal());
        non_terminal
            && self
                .productions
                .get(category)
                .map_or(true, |p| p.is_empty())
    }

    /// Categories with a production that lists `root` as a child, sorted.
    fn root_references(&self, root: &Category) -> Vec<&Category> {
        let mut parents: Vec<&Category> = self
            .productions
            .iter()
            .filter(|(_, productions)| {
                productions
                    .iter()
                    .any(|production| production.children().contains(root))
            })
            .map(|(category, _)| category)
            .collect();
        parents.sort();
        parents
    }

    fn reachable_from<'a>(&'a self, root: &'a Category) -> HashSet<&'a Category> {
        let mut seen = HashSet::new();
        let mut queue = VecDeque::from([root]);
        while let Some(category) = queue.pop_front() {
            if !seen.insert(category) {
                continue;
            }
            for production in self.productions.get(category).into_iter().flatten() {
                queue.extend(production.children());
            }
        }
        seen
    }
}
