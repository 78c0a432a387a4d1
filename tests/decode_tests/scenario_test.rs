use std::sync::Arc;

use grammevo::node::InitFn;
use grammevo::nodes::basic::Root;
use grammevo::nodes::factor::Constant;
use grammevo::nodes::logic::{Compare, CompareOp, Sequence};
use grammevo::{
    Arity, DecodeConfig, EngineConfig, Grammar, GrammarBuilder, NodeBase, NodeBehavior, NodeError, ProgramTree,
    TreeError, TreeStatus,
};
use pretty_assertions::assert_eq;

use crate::common::scenario_grammar;

#[test]
fn test_single_alternative_categories_consume_codons() {
    let mut tree = ProgramTree::new(scenario_grammar());
    let stats = tree.build("R", &[0, 1, 5]).unwrap();

    assert_eq!(tree.format_compact(), "R(A(T), A(T))");
    assert_eq!(stats.codons_consumed, 3);
    assert_eq!(stats.wraps, 0);
    assert_eq!(stats.nodes, 5);
    assert_eq!(stats.depth, 2);
    assert_eq!(tree.decode_stats(), Some(stats));
    tree.check_structure().unwrap();
}

#[test]
fn test_codon_selects_alternative_modulo_count() {
    let tree = ProgramTree::decode(scenario_grammar(), "R", &[3]).unwrap();
    assert_eq!(tree.format_compact(), "R(T)");
    assert_eq!(tree.decode_stats().unwrap().codons_consumed, 1);

    let tree = ProgramTree::decode(scenario_grammar(), "R", &[4, 9, 9]).unwrap();
    assert_eq!(tree.format_compact(), "R(A(T), A(T))");
}

#[test]
fn test_exhausted_genotype_without_wrapping() {
    let config = DecodeConfig::default().with_max_wraps(0);
    let mut tree = ProgramTree::with_config(scenario_grammar(), config).unwrap();

    let err = tree.build("R", &[0]).unwrap_err();
    assert_eq!(
        err,
        TreeError::NodeMissingChild {
            category: "A".into(),
            codons_consumed: 1,
            max_wraps: 0,
        }
    );
    assert_eq!(tree.status(), TreeStatus::Empty);
    assert!(tree.root().is_err());
}

#[test]
fn test_wrapping_reuses_genotype() {
    let tree = ProgramTree::decode(scenario_grammar(), "R", &[0]).unwrap();
    let stats = tree.decode_stats().unwrap();
    assert_eq!(stats.codons_consumed, 3);
    assert_eq!(stats.wraps, 2);

    let config = DecodeConfig::default().with_max_wraps(1);
    let mut tree = ProgramTree::with_config(scenario_grammar(), config).unwrap();
    assert!(matches!(
        tree.build("R", &[0]),
        Err(TreeError::NodeMissingChild { codons_consumed: 2, max_wraps: 1, .. })
    ));
}

#[test]
fn test_empty_genotype_fails_at_first_decision() {
    let mut tree = ProgramTree::new(scenario_grammar());
    assert!(matches!(
        tree.build("R", &[]),
        Err(TreeError::NodeMissingChild { codons_consumed: 0, .. })
    ));
    // terminals need no codons
    let stats = tree.build("T", &[]).unwrap();
    assert_eq!(stats.nodes, 1);
    assert_eq!(tree.format_compact(), "T");
}

#[test]
fn test_same_genotype_gives_independent_equal_trees() {
    let grammar = scenario_grammar();
    let first = ProgramTree::decode(Arc::clone(&grammar), "R", &[0, 0, 0]).unwrap();
    let mut second = ProgramTree::decode(Arc::clone(&grammar), "R", &[0, 0, 0]).unwrap();

    assert!(first.same_structure(&second));
    assert_ne!(first.id(), second.id());
    assert_eq!(first.to_string(), second.to_string());

    let a = second.get_nodes_by_type("A").unwrap()[1];
    let donor = ProgramTree::decode(Arc::clone(&grammar), "R", &[0, 0, 0]).unwrap();
    let donor_a = donor.get_nodes_by_type("A").unwrap()[0];
    second.graft(a, &donor, donor_a).unwrap();

    assert_eq!(first.format_compact(), "R(A(T), A(T))");
    assert_eq!(first.get_nodes_by_type("A").unwrap().len(), 2);
    assert!(first.same_structure(&second));
    assert_ne!(first.revision(), second.revision());
}

#[test]
fn test_type_index_in_decode_order() {
    let tree = ProgramTree::decode(scenario_grammar(), "R", &[0, 0, 0]).unwrap();
    let all = tree.nodes().unwrap();
    let ts = tree.get_nodes_by_type("T").unwrap();
    assert_eq!(ts, &[all[2], all[4]]);
    assert!(ts.windows(2).all(|w| w[0].index() < w[1].index()));
}

#[test]
fn test_non_terminal_without_productions() {
    let mut builder = Grammar::<()>::builder();
    builder
        .register_behavior("R", Sequence::variable())
        .register_behavior("A", Root)
        .register_production("R", ["A"]);
    let grammar = Arc::new(builder.build().unwrap());

    let mut tree = ProgramTree::new(grammar);
    assert_eq!(tree.build("R", &[0, 0]), Err(TreeError::NoProductions("A".into())));
    assert_eq!(tree.status(), TreeStatus::Empty);
}

#[test]
fn test_custom_init_receives_base() {
    let mut builder = Grammar::<()>::builder();
    builder
        .register_behavior("R", Sequence::variable())
        .register_behavior("A", Root)
        .register_node(
            "T",
            InitFn::new(Arity::TERMINAL, |base: &NodeBase| -> Result<Arc<dyn NodeBehavior<()>>, NodeError> {
                Ok(Arc::new(Constant::integer(base.depth as i64)))
            }),
        )
        .register_production("R", ["A", "T"])
        .register_production("A", ["T"]);
    let tree = ProgramTree::decode(Arc::new(builder.build().unwrap()), "R", &[0, 0]).unwrap();

    let expected = "R\n  A\n    T (2)\n  T (1)";
    assert_eq!(tree.to_string(), expected);
}

#[test]
fn test_failing_custom_init_aborts_build() {
    let mut builder = Grammar::<()>::builder();
    builder
        .register_behavior("R", Root)
        .register_node(
            "T",
            InitFn::new(Arity::TERMINAL, |base: &NodeBase| -> Result<Arc<dyn NodeBehavior<()>>, NodeError> {
                Err(NodeError::InvalidInit(format!("no literal for {}", base.category)))
            }),
        )
        .register_production("R", ["T"]);
    let mut tree = ProgramTree::new(Arc::new(builder.build().unwrap()));

    assert_eq!(
        tree.build("R", &[0]),
        Err(TreeError::Node(NodeError::InvalidInit("no literal for T".to_string())))
    );
    assert_eq!(tree.status(), TreeStatus::Empty);
}

#[test]
fn test_terminal_factory_must_yield_terminal_behavior() {
    let mut builder = Grammar::<()>::builder();
    builder
        .register_behavior("R", Root)
        .register_node(
            "T",
            InitFn::new(Arity::TERMINAL, |_: &NodeBase| -> Result<Arc<dyn NodeBehavior<()>>, NodeError> {
                Ok(Arc::new(Compare::new(CompareOp::Lt)))
            }),
        )
        .register_production("R", ["T"]);
    let mut tree = ProgramTree::new(Arc::new(builder.build().unwrap()));

    assert_eq!(
        tree.build("R", &[0]),
        Err(TreeError::Node(NodeError::ArityMismatch {
            category: "T".into(),
            arity: Arity::Fixed(2),
            children: 0,
        }))
    );
    assert_eq!(tree.status(), TreeStatus::Empty);
}

#[test]
fn test_engine_config_drives_decoding() {
    let engine = EngineConfig::from_json_str(r#"{"decode": {"max_wraps": 0}, "grammar": {"warnings": false}}"#)
        .unwrap();

    let mut builder = GrammarBuilder::<()>::with_config(engine.grammar.clone());
    builder
        .register_behavior("R", Sequence::variable())
        .register_behavior("A", Root)
        .register_behavior("T", Constant::integer(1))
        .register_production("R", ["A", "A"])
        .register_production("A", ["T"]);
    let grammar = Arc::new(builder.build().unwrap());
    assert!(!grammar.config().warnings);

    let mut tree = ProgramTree::with_config(grammar, engine.decode).unwrap();
    assert!(matches!(
        tree.build("R", &[0, 0]),
        Err(TreeError::NodeMissingChild { max_wraps: 0, .. })
    ));
    tree.build("R", &[0, 0, 0]).unwrap();
    assert_eq!(tree.config().max_wraps, 0);
}
