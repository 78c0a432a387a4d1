use strum::{Display, EnumString};

use crate::node::{Arity, NodeBehavior, NodeError, NodeResult, Scope};
use crate::value::Value;

/// Literal factor: a terminal that always evaluates to the same value.
#[derive(Debug, Clone, PartialEq)]
pub struct Constant {
    value: Value,
}

impl Constant {
    pub fn new(value: impl Into<Value>) -> Self {
        Self {
            value: value.into(),
        }
    }

    pub fn integer(value: i64) -> Self {
        Self::new(value)
    }

    pub fn float(value: f64) -> Self {
        Self::new(value)
    }

    pub fn boolean(value: bool) -> Self {
        Self::new(value)
    }

    pub fn value(&self) -> &Value {
        &self.value
    }
}

impl<A> NodeBehavior<A> for Constant {
    fn arity(&self) -> Arity {
        Arity::TERMINAL
    }

    fn evaluate(&self, _scope: &mut Scope<'_, A>) -> NodeResult<Value> {
        Ok(self.value.clone())
    }

    fn label(&self) -> Option<String> {
        Some(self.value.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
pub enum ArithOp {
    #[strum(serialize = "+")]
    Add,
    #[strum(serialize = "-")]
    Sub,
    #[strum(serialize = "*")]
    Mul,
    #[strum(serialize = "/")]
    Div,
}

/// Binary arithmetic over two numeric children.
///
/// Two integers stay integral (checked); anything else is computed in `f64`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Arithmetic {
    op: ArithOp,
}

impl Arithmetic {
    pub fn new(op: ArithOp) -> Self {
        Self { op }
    }

    /// Parses the operator symbol, e.g. `"+"`.
    pub fn from_symbol(symbol: &str) -> NodeResult<Self> {
        symbol
            .parse::<ArithOp>()
            .map(Self::new)
            .map_err(|_| NodeError::InvalidInit(format!("unknown arithmetic operator '{symbol}'")))
    }
}

impl<A> NodeBehavior<A> for Arithmetic {
    fn arity(&self) -> Arity {
        Arity::Fixed(2)
    }

    fn evaluate(&self, scope: &mut Scope<'_, A>) -> NodeResult<Value> {
        let lhs = scope.eval_child(0)?;
        let rhs = scope.eval_child(1)?;

        if let (Value::Integer(a), Value::Integer(b)) = (&lhs, &rhs) {
            let result = match self.op {
                ArithOp::Add => a.checked_add(*b),
                ArithOp::Sub => a.checked_sub(*b),
                ArithOp::Mul => a.checked_mul(*b),
                ArithOp::Div => a.checked_div(*b),
            };
            return result.map(Value::Integer).ok_or_else(|| {
                NodeError::failed(scope.category(), format!("integer overflow or division by zero in {a} {} {b}", self.op))
            });
        }

        let a = lhs
            .as_float()
            .ok_or_else(|| NodeError::type_mismatch(scope.category(), "numeric", &lhs))?;
        let b = rhs
            .as_float()
            .ok_or_else(|| NodeError::type_mismatch(scope.category(), "numeric", &rhs))?;
        let result = match self.op {
            ArithOp::Add => a + b,
            ArithOp::Sub => a - b,
            ArithOp::Mul => a * b,
            ArithOp::Div => a / b,
        };
        Ok(Value::Float(result))
    }

    fn label(&self) -> Option<String> {
        Some(self.op.to_string())
    }
}
