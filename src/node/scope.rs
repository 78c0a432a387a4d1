use crate::category::Category;
use crate::node::{NodeError, NodeResult};
use crate::tree::arena::NodeArena;
use crate::value::Value;

/// Counts node evaluations for one call into the tree.
#[derive(Debug)]
pub(crate) struct StepBudget {
    used: u64,
    limit: u64,
}

impl StepBudget {
    pub(crate) fn new(limit: u64) -> Self {
        Self { used: 0, limit }
    }

    pub(crate) fn charge(&mut self) -> NodeResult<()> {
        if self.used >= self.limit {
            return Err(NodeError::StepLimitExceeded(self.limit));
        }
        self.used += 1;
        Ok(())
    }

    pub(crate) fn used(&self) -> u64 {
        self.used
    }
}

/// Evaluation view of a single node: its category, its children and the
/// bound agent.
pub struct Scope<'t, A> {
    arena: &'t NodeArena<A>,
    index: u32,
    agent: &'t mut A,
    budget: &'t mut StepBudget,
}

impl<'t, A> Scope<'t, A> {
    pub(crate) fn new(
        arena: &'t NodeArena<A>,
        index: u32,
        agent: &'t mut A,
        budget: &'t mut StepBudget,
    ) -> Self {
        Self {
            arena,
            index,
            agent,
            budget,
        }
    }

    /// Evaluates the node this scope points at.
    pub(crate) fn run(&mut self) -> NodeResult<Value> {
        self.budget.charge()?;
        let arena = self.arena;
        arena.slot(self.index).behavior.evaluate(self)
    }

    pub fn category(&self) -> &Category {
        &self.arena.slot(self.index).category
    }

    pub fn depth(&self) -> usize {
        self.arena.slot(self.index).depth as usize
    }

    pub fn child_count(&self) -> usize {
        self.arena.slot(self.index).children.len()
    }

    pub fn child_category(&self, index: usize) -> NodeResult<&Category> {
        let child = self.child_index(index)?;
        Ok(&self.arena.slot(child).category)
    }

    pub fn agent(&self) -> &A {
        &*self.agent
    }

    pub fn agent_mut(&mut self) -> &mut A {
        &mut *self.agent
    }

    pub fn eval_child(&mut self, index: usize) -> NodeResult<Value> {
        let child = self.child_index(index)?;
        let mut scope = Scope {
            arena: self.arena,
            index: child,
            agent: &mut *self.agent,
            budget: &mut *self.budget,
        };
        scope.run()
    }

    /// Evaluates every child left to right and returns the last value.
    pub fn eval_all(&mut self) -> NodeResult<Value> {
        let mut last = Value::Unit;
        for i in 0..self.child_count() {
            last = self.eval_child(i)?;
        }
        Ok(last)
    }

    pub fn eval_bool(&mut self, index: usize) -> NodeResult<bool> {
        let value = self.eval_child(index)?;
        value
            .as_bool()
            .ok_or_else(|| NodeError::type_mismatch(self.category(), "Bool", &value))
    }

    pub fn eval_integer(&mut self, index: usize) -> NodeResult<i64> {
        let value = self.eval_child(index)?;
        value
            .as_integer()
            .ok_or_else(|| NodeError::type_mismatch(self.category(), "Integer", &value))
    }

    pub(crate) fn child_index(&self, index: usize) -> NodeResult<u32> {
        let children = &self.arena.slot(self.index).children;
        children
            .get(index)
            .copied()
            .ok_or_else(|| NodeError::ChildOutOfRange {
                category: self.category().clone(),
                index,
                count: children.len(),
            })
    }
}
