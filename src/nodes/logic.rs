use std::collections::HashSet;
use std::sync::Arc;

use strum::{Display, EnumString};

use crate::node::{Arity, ExecMode, NodeBehavior, NodeError, NodeResult, Scope};
use crate::value::Value;

/// Evaluates its children in order and yields the last value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sequence {
    arity: Arity,
    label: Option<String>,
}

impl Sequence {
    pub fn fixed(children: usize) -> Self {
        Self {
            arity: Arity::Fixed(children),
            label: None,
        }
    }

    /// Accepts any number of children; the production decides.
    pub fn variable() -> Self {
        Self {
            arity: Arity::Variable,
            label: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

impl<A> NodeBehavior<A> for Sequence {
    fn arity(&self) -> Arity {
        self.arity
    }

    fn evaluate(&self, scope: &mut Scope<'_, A>) -> NodeResult<Value> {
        scope.eval_all()
    }

    fn exec_mode(&self) -> ExecMode {
        ExecMode::Resumable
    }

    fn next_child(&self, visits: usize, scope: &mut Scope<'_, A>) -> NodeResult<Option<usize>> {
        Ok((visits < scope.child_count()).then_some(visits))
    }

    fn label(&self) -> Option<String> {
        self.label.clone()
    }
}

/// Named factor values handed to a [`Condition`] predicate.
#[derive(Debug, Clone, PartialEq)]
pub struct Factors<'a> {
    names: &'a [String],
    values: Vec<Value>,
}

impl Factors<'_> {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.names
            .iter()
            .position(|n| n == name)
            .and_then(|i| self.values.get(i))
    }

    pub fn integer(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(Value::as_integer)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

type Predicate<A> = dyn Fn(&A, &Factors<'_>) -> bool + Send + Sync;

/// Branches on an agent predicate.
///
/// Children are laid out as `[if_true, if_false, factor...]`. Factor
/// children are evaluated first and passed to the predicate by name; then
/// exactly one branch is evaluated.
pub struct Condition<A> {
    label: String,
    factor_names: Vec<String>,
    predicate: Arc<Predicate<A>>,
}

impl<A> Condition<A> {
    pub const TRUE_INDEX: usize = 0;
    pub const FALSE_INDEX: usize = 1;

    pub fn new<F>(label: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&A, &Factors<'_>) -> bool + Send + Sync + 'static,
    {
        Self {
            label: label.into(),
            factor_names: Vec::new(),
            predicate: Arc::new(predicate),
        }
    }

    /// Adds factor children; names must be unique.
    pub fn with_factors<I, S>(mut self, names: I) -> NodeResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        let mut used = HashSet::new();
        for name in &names {
            if !used.insert(name.as_str()) {
                return Err(NodeError::InvalidInit(format!(
                    "factor name '{name}' used twice in condition '{}'",
                    self.label
                )));
            }
        }
        self.factor_names = names;
        Ok(self)
    }

    pub fn factor_names(&self) -> &[String] {
        &self.factor_names
    }

    /// Evaluates the factors and the predicate; returns the branch to take.
    fn choose(&self, scope: &mut Scope<'_, A>) -> NodeResult<usize> {
        let mut values = Vec::with_capacity(self.factor_names.len());
        for i in 0..self.factor_names.len() {
            values.push(scope.eval_child(2 + i)?);
        }
        let factors = Factors {
            names: &self.factor_names,
            values,
        };
        Ok(if (self.predicate)(scope.agent(), &factors) {
            Self::TRUE_INDEX
        } else {
            Self::FALSE_INDEX
        })
    }
}

impl<A> NodeBehavior<A> for Condition<A> {
    fn arity(&self) -> Arity {
        Arity::Fixed(2 + self.factor_names.len())
    }

    fn evaluate(&self, scope: &mut Scope<'_, A>) -> NodeResult<Value> {
        let branch = self.choose(scope)?;
        scope.eval_child(branch)
    }

    fn exec_mode(&self) -> ExecMode {
        ExecMode::Resumable
    }

    fn next_child(&self, visits: usize, scope: &mut Scope<'_, A>) -> NodeResult<Option<usize>> {
        if visits > 0 {
            return Ok(None);
        }
        self.choose(scope).map(Some)
    }

    fn label(&self) -> Option<String> {
        Some(self.label.clone())
    }
}

/// `[condition, then, else]` branching on a boolean child.
#[derive(Debug, Clone, Copy, Default)]
pub struct Branch;

impl<A> NodeBehavior<A> for Branch {
    fn arity(&self) -> Arity {
        Arity::Fixed(3)
    }

    fn evaluate(&self, scope: &mut Scope<'_, A>) -> NodeResult<Value> {
        if scope.eval_bool(0)? {
            scope.eval_child(1)
        } else {
            scope.eval_child(2)
        }
    }

    fn exec_mode(&self) -> ExecMode {
        ExecMode::Resumable
    }

    fn next_child(&self, visits: usize, scope: &mut Scope<'_, A>) -> NodeResult<Option<usize>> {
        if visits > 0 {
            return Ok(None);
        }
        Ok(Some(if scope.eval_bool(0)? { 1 } else { 2 }))
    }
}

/// `[count, body]`: evaluates the body `count` times. Negative counts run zero times.
#[derive(Debug, Clone, Copy, Default)]
pub struct Repeat;

impl<A> NodeBehavior<A> for Repeat {
    fn arity(&self) -> Arity {
        Arity::Fixed(2)
    }

    fn evaluate(&self, scope: &mut Scope<'_, A>) -> NodeResult<Value> {
        let count = scope.eval_integer(0)?;
        let mut last = Value::Unit;
        for _ in 0..count.max(0) {
            last = scope.eval_child(1)?;
        }
        Ok(last)
    }

    fn exec_mode(&self) -> ExecMode {
        ExecMode::Resumable
    }

    /// The count child is re-read on every pass.
    fn next_child(&self, visits: usize, scope: &mut Scope<'_, A>) -> NodeResult<Option<usize>> {
        let count = scope.eval_integer(0)?;
        Ok(i64::try_from(visits).is_ok_and(|done| done < count).then_some(1))
    }

    fn label(&self) -> Option<String> {
        Some("repeat".to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum BoolOperator {
    And,
    Or,
    Not,
}

/// Boolean composition. `and`/`or` short-circuit over any number of
/// children; `not` takes exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoolOp {
    op: BoolOperator,
}

impl BoolOp {
    pub fn new(op: BoolOperator) -> Self {
        Self { op }
    }

    pub fn and() -> Self {
        Self::new(BoolOperator::And)
    }

    pub fn or() -> Self {
        Self::new(BoolOperator::Or)
    }

    pub fn not() -> Self {
        Self::new(BoolOperator::Not)
    }
}

impl<A> NodeBehavior<A> for BoolOp {
    fn arity(&self) -> Arity {
        match self.op {
            BoolOperator::Not => Arity::Fixed(1),
            BoolOperator::And | BoolOperator::Or => Arity::Variable,
        }
    }

    fn evaluate(&self, scope: &mut Scope<'_, A>) -> NodeResult<Value> {
        let result = match self.op {
            BoolOperator::Not => !scope.eval_bool(0)?,
            BoolOperator::And => {
                let mut all = true;
                for i in 0..scope.child_count() {
                    if !scope.eval_bool(i)? {
                        all = false;
                        break;
                    }
                }
                all
            }
            BoolOperator::Or => {
                let mut any = false;
                for i in 0..scope.child_count() {
                    if scope.eval_bool(i)? {
                        any = true;
                        break;
                    }
                }
                any
            }
        };
        Ok(Value::Bool(result))
    }

    fn label(&self) -> Option<String> {
        Some(self.op.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
pub enum CompareOp {
    #[strum(serialize = "<")]
    Lt,
    #[strum(serialize = "<=")]
    Le,
    #[strum(serialize = ">")]
    Gt,
    #[strum(serialize = ">=")]
    Ge,
    #[strum(serialize = "==")]
    Eq,
    #[strum(serialize = "!=")]
    Ne,
}

/// Compares two children and yields a `Bool`.
///
/// Numbers compare numerically (integers widen to floats); other values
/// only support `==` and `!=`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Compare {
    op: CompareOp,
}

impl Compare {
    pub fn new(op: CompareOp) -> Self {
        Self { op }
    }

    pub fn from_symbol(symbol: &str) -> NodeResult<Self> {
        symbol
            .parse::<CompareOp>()
            .map(Self::new)
            .map_err(|_| NodeError::InvalidInit(format!("unknown comparison operator '{symbol}'")))
    }
}

impl<A> NodeBehavior<A> for Compare {
    fn arity(&self) -> Arity {
        Arity::Fixed(2)
    }

    fn evaluate(&self, scope: &mut Scope<'_, A>) -> NodeResult<Value> {
        let lhs = scope.eval_child(0)?;
        let rhs = scope.eval_child(1)?;

        let result = match (lhs.as_float(), rhs.as_float()) {
            (Some(a), Some(b)) => match self.op {
                CompareOp::Lt => a < b,
                CompareOp::Le => a <= b,
                CompareOp::Gt => a > b,
                CompareOp::Ge => a >= b,
                CompareOp::Eq => a == b,
                CompareOp::Ne => a != b,
            },
            _ => match self.op {
                CompareOp::Eq => lhs == rhs,
                CompareOp::Ne => lhs != rhs,
                _ => {
                    let offending = if lhs.as_float().is_none() { &lhs } else { &rhs };
                    return Err(NodeError::type_mismatch(scope.category(), "numeric", offending));
                }
            },
        };
        Ok(Value::Bool(result))
    }

    fn label(&self) -> Option<String> {
        Some(self.op.to_string())
    }
}
