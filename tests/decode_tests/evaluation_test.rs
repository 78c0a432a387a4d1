use std::sync::{Arc, Mutex};

use grammevo::nodes::basic::Action;
use grammevo::nodes::factor::{Arithmetic, Constant};
use grammevo::nodes::logic::{BoolOp, Branch, Compare, Condition, Factors, Repeat};
use grammevo::{Codon, DecodeConfig, Grammar, GrammarBuilder, NodeError, ProgramTree, TreeError, TreeResult, Value};

use crate::common::Registers;

fn evaluate<F>(configure: F, root: &str, genotype: &[Codon]) -> (TreeResult<Value>, Registers)
where
    F: FnOnce(&mut GrammarBuilder<Registers>),
{
    let mut builder = Grammar::builder();
    configure(&mut builder);
    let grammar = Arc::new(builder.build().unwrap());
    let mut tree = ProgramTree::decode(grammar, root, genotype).unwrap();
    let agent = Arc::new(Mutex::new(Registers::default()));
    tree.bind(&agent).unwrap();
    let result = tree.evaluate();
    let registers = agent.lock().unwrap().clone();
    (result, registers)
}

fn literals(builder: &mut GrammarBuilder<Registers>) {
    builder
        .register_behavior("zero", Constant::integer(0))
        .register_behavior("one", Constant::integer(1))
        .register_behavior("two", Constant::integer(2))
        .register_behavior("three", Constant::integer(3))
        .register_behavior("half", Constant::float(0.5))
        .register_behavior("yes", Constant::boolean(true))
        .register_behavior("no", Constant::boolean(false))
        .register_behavior(
            "inc",
            Action::fallible("inc", |r: &mut Registers| {
                r.x += 1;
                Ok(Value::Integer(r.x))
            }),
        )
        .register_behavior(
            "dec",
            Action::fallible("dec", |r: &mut Registers| {
                r.x -= 1;
                Ok(Value::Integer(r.x))
            }),
        )
        .register_behavior(
            "boom",
            Action::fallible("boom", |_: &mut Registers| {
                Err(NodeError::failed(&"boom".into(), "must not be evaluated"))
            }),
        );
}

#[test]
fn test_repeat_runs_body_count_times() {
    let (result, registers) = evaluate(
        |b| {
            literals(b);
            b.register_behavior("R", Repeat)
                .register_production("R", ["three", "inc"]);
        },
        "R",
        &[0],
    );
    assert_eq!(result, Ok(Value::Integer(3)));
    assert_eq!(registers.x, 3);
}

#[test]
fn test_repeat_negative_count_runs_nothing() {
    let (result, registers) = evaluate(
        |b| {
            literals(b);
            b.register_behavior("minus", Constant::integer(-2))
                .register_behavior("R", Repeat)
                .register_production("R", ["minus", "inc"]);
        },
        "R",
        &[0],
    );
    assert_eq!(result, Ok(Value::Unit));
    assert_eq!(registers.x, 0);
}

#[test]
fn test_and_or_short_circuit() {
    let (result, _) = evaluate(
        |b| {
            literals(b);
            b.register_behavior("B", BoolOp::and())
                .register_production("B", ["no", "boom"]);
        },
        "B",
        &[0],
    );
    assert_eq!(result, Ok(Value::Bool(false)));

    let (result, _) = evaluate(
        |b| {
            literals(b);
            b.register_behavior("B", BoolOp::or())
                .register_production("B", ["no", "yes", "boom"]);
        },
        "B",
        &[0],
    );
    assert_eq!(result, Ok(Value::Bool(true)));

    let (result, _) = evaluate(
        |b| {
            literals(b);
            b.register_behavior("B", BoolOp::not())
                .register_production("B", ["yes"]);
        },
        "B",
        &[0],
    );
    assert_eq!(result, Ok(Value::Bool(false)));
}

#[test]
fn test_bool_op_rejects_non_bool() {
    let (result, _) = evaluate(
        |b| {
            literals(b);
            b.register_behavior("B", BoolOp::and())
                .register_production("B", ["yes", "one"]);
        },
        "B",
        &[0],
    );
    assert_eq!(
        result,
        Err(TreeError::Node(NodeError::TypeMismatch {
            category: "B".into(),
            expected: "Bool",
            found: "Integer",
        }))
    );
}

#[test]
fn test_compare_numeric() {
    let (result, _) = evaluate(
        |b| {
            literals(b);
            b.register_behavior("C", Compare::from_symbol(">=").unwrap())
                .register_production("C", ["two", "one"]);
        },
        "C",
        &[0],
    );
    assert_eq!(result, Ok(Value::Bool(true)));

    let (result, _) = evaluate(
        |b| {
            literals(b);
            b.register_behavior("C", Compare::from_symbol("<").unwrap())
                .register_production("C", ["half", "one"]);
        },
        "C",
        &[0],
    );
    assert_eq!(result, Ok(Value::Bool(true)));

    let (result, _) = evaluate(
        |b| {
            literals(b);
            b.register_behavior("C", Compare::from_symbol("<").unwrap())
                .register_production("C", ["yes", "one"]);
        },
        "C",
        &[0],
    );
    assert!(matches!(result, Err(TreeError::Node(NodeError::TypeMismatch { .. }))));
}

#[test]
fn test_arithmetic() {
    let (result, _) = evaluate(
        |b| {
            literals(b);
            b.register_behavior("M", Arithmetic::from_symbol("*").unwrap())
                .register_production("M", ["half", "three"]);
        },
        "M",
        &[0],
    );
    assert_eq!(result, Ok(Value::Float(1.5)));

    let (result, _) = evaluate(
        |b| {
            literals(b);
            b.register_behavior("D", Arithmetic::from_symbol("/").unwrap())
                .register_production("D", ["one", "zero"]);
        },
        "D",
        &[0],
    );
    assert!(matches!(
        result,
        Err(TreeError::Node(NodeError::Failed { ref category, .. })) if category.as_str() == "D"
    ));
}

#[test]
fn test_condition_reads_factors_then_branches() {
    let below = |b: &mut GrammarBuilder<Registers>| {
        literals(b);
        let condition = Condition::new("below_limit", |r: &Registers, f: &Factors<'_>| {
            f.integer("limit").is_some_and(|limit| r.x < limit)
        })
        .with_factors(["limit"])
        .unwrap();
        b.register_behavior("IF", condition)
            .register_production("IF", ["inc", "dec", "two"]);
    };

    let (result, registers) = evaluate(below, "IF", &[0]);
    assert_eq!(result, Ok(Value::Integer(1)));
    assert_eq!(registers.x, 1);
}

#[test]
fn test_branch_on_bool_child() {
    let (result, _) = evaluate(
        |b| {
            literals(b);
            b.register_behavior("BR", Branch)
                .register_production("BR", ["no", "one", "two"]);
        },
        "BR",
        &[0],
    );
    assert_eq!(result, Ok(Value::Integer(2)));
}

#[test]
fn test_step_budget_stops_long_runs() {
    let mut builder = Grammar::builder();
    literals(&mut builder);
    builder
        .register_behavior("many", Constant::integer(1_000_000_000))
        .register_behavior("R", Repeat)
        .register_production("R", ["many", "inc"]);
    let grammar = Arc::new(builder.build().unwrap());

    let config = DecodeConfig::default().with_max_eval_steps(100);
    let mut tree = ProgramTree::with_config(grammar, config).unwrap();
    tree.build("R", &[0]).unwrap();
    let agent = Arc::new(Mutex::new(Registers::default()));
    tree.bind(&agent).unwrap();

    assert_eq!(
        tree.evaluate(),
        Err(TreeError::Node(NodeError::StepLimitExceeded(100)))
    );
    // root and count take two steps
    assert_eq!(agent.lock().unwrap().x, 98);
}
