use std::sync::Arc;

use crate::node::{Arity, ExecMode, NodeBehavior, NodeResult, Scope};
use crate::value::Value;

/// Single-child pass-through node, typically the grammar root.
#[derive(Debug, Clone, Copy, Default)]
pub struct Root;

impl<A> NodeBehavior<A> for Root {
    fn arity(&self) -> Arity {
        Arity::Fixed(1)
    }

    fn evaluate(&self, scope: &mut Scope<'_, A>) -> NodeResult<Value> {
        scope.eval_child(0)
    }

    fn exec_mode(&self) -> ExecMode {
        ExecMode::Resumable
    }

    fn next_child(&self, visits: usize, _scope: &mut Scope<'_, A>) -> NodeResult<Option<usize>> {
        Ok((visits == 0).then_some(0))
    }
}

type ActionFn<A> = dyn Fn(&mut A) -> NodeResult<Value> + Send + Sync;
type SensorFn<A> = dyn Fn(&A) -> Value + Send + Sync;

/// Executable terminal: performs an operation on the agent.
pub struct Action<A> {
    name: String,
    run: Arc<ActionFn<A>>,
}

impl<A> Action<A> {
    pub fn new<F>(name: impl Into<String>, run: F) -> Self
    where
        F: Fn(&mut A) + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            run: Arc::new(move |agent| {
                run(agent);
                Ok(Value::Unit)
            }),
        }
    }

    /// Action that reports its own result or failure.
    pub fn fallible<F>(name: impl Into<String>, run: F) -> Self
    where
        F: Fn(&mut A) -> NodeResult<Value> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            run: Arc::new(run),
        }
    }
}

impl<A> NodeBehavior<A> for Action<A> {
    fn arity(&self) -> Arity {
        Arity::TERMINAL
    }

    fn evaluate(&self, scope: &mut Scope<'_, A>) -> NodeResult<Value> {
        (self.run)(scope.agent_mut())
    }

    fn exec_mode(&self) -> ExecMode {
        ExecMode::Action
    }

    fn label(&self) -> Option<String> {
        Some(self.name.clone())
    }
}

/// Terminal that reads a value from the agent without changing it.
pub struct Sensor<A> {
    name: String,
    read: Arc<SensorFn<A>>,
}

impl<A> Sensor<A> {
    pub fn new<F>(name: impl Into<String>, read: F) -> Self
    where
        F: Fn(&A) -> Value + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            read: Arc::new(read),
        }
    }
}

impl<A> NodeBehavior<A> for Sensor<A> {
    fn arity(&self) -> Arity {
        Arity::TERMINAL
    }

    fn evaluate(&self, scope: &mut Scope<'_, A>) -> NodeResult<Value> {
        Ok((self.read)(scope.agent()))
    }

    fn label(&self) -> Option<String> {
        Some(self.name.clone())
    }
}
