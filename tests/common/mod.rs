//! Grammars shared by the integration tests.

use std::sync::Arc;

use grammevo::nodes::basic::{Root, Sensor};
use grammevo::nodes::factor::{ArithOp, Arithmetic, Constant};
use grammevo::nodes::logic::{Branch, Compare, CompareOp, Sequence};
use grammevo::{Grammar, Value};

/// `R -> [A, A] | [T]`, `A -> [T]`, `T` terminal.
pub fn scenario_grammar() -> Arc<Grammar<()>> {
    let mut builder = Grammar::builder();
    builder
        .register_behavior("R", Sequence::variable())
        .register_behavior("A", Root)
        .register_behavior("T", Constant::integer(1))
        .register_production("R", ["A", "A"])
        .register_production("R", ["T"])
        .register_production("A", ["T"])
        .set_root("R");
    Arc::new(builder.build().unwrap())
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Registers {
    pub x: i64,
}

/// Recursive integer expressions over a single register.
pub fn expression_grammar() -> Arc<Grammar<Registers>> {
    let mut builder = Grammar::builder();
    builder
        .register_behavior("<prog>", Root)
        .register_behavior("<expr>", Root)
        .register_behavior("<sum>", Arithmetic::new(ArithOp::Add))
        .register_behavior("<if>", Branch)
        .register_behavior("<cond>", Compare::new(CompareOp::Lt))
        .register_behavior("<num>", Root)
        .register_behavior("one", Constant::integer(1))
        .register_behavior("two", Constant::integer(2))
        .register_behavior("x", Sensor::new("x", |r: &Registers| Value::Integer(r.x)))
        .register_production("<prog>", ["<expr>"])
        .register_production("<expr>", ["<sum>"])
        .register_production("<expr>", ["<num>"])
        .register_production("<expr>", ["<if>"])
        .register_production("<sum>", ["<expr>", "<expr>"])
        .register_production("<if>", ["<cond>", "<expr>", "<expr>"])
        .register_production("<cond>", ["<expr>", "<expr>"])
        .register_production("<num>", ["one"])
        .register_production("<num>", ["two"])
        .register_production("<num>", ["x"])
        .set_root("<prog>");
    Arc::new(builder.build().unwrap())
}

pub const EXPRESSION_CATEGORIES: [&str; 9] = [
    "<prog>", "<expr>", "<sum>", "<if>", "<cond>", "<num>", "one", "two", "x",
];
