//! Property-based tests for genotype decoding.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use grammevo::{Codon, ProgramTree, TreeError, Value};
use proptest::prelude::*;

use crate::common::{expression_grammar, Registers, EXPRESSION_CATEGORIES};

fn genotype_strategy() -> impl Strategy<Value = Vec<Codon>> {
    prop::collection::vec(0u32..1000, 0..48)
}

proptest! {
    #[test]
    fn test_decode_is_valid_or_incomplete(genotype in genotype_strategy()) {
        let mut tree = ProgramTree::new(expression_grammar());
        match tree.build("<prog>", &genotype) {
            Ok(stats) => {
                prop_assert!(tree.check_structure().is_ok());
                prop_assert_eq!(stats.nodes, tree.size());
                prop_assert_eq!(stats.depth, tree.depth());
            }
            Err(TreeError::NodeMissingChild { .. }) | Err(TreeError::DepthExceeded { .. }) => {
                prop_assert_eq!(tree.size(), 0);
            }
            Err(other) => prop_assert!(false, "unexpected decode error: {other}"),
        }
    }

    #[test]
    fn test_decode_is_deterministic(genotype in genotype_strategy()) {
        let grammar = expression_grammar();
        let first = ProgramTree::decode(Arc::clone(&grammar), "<prog>", &genotype);
        let second = ProgramTree::decode(Arc::clone(&grammar), "<prog>", &genotype);
        match (first, second) {
            (Ok(a), Ok(b)) => {
                prop_assert!(a.same_structure(&b));
                prop_assert_eq!(a.format_compact(), b.format_compact());
                prop_assert_eq!(a.decode_stats(), b.decode_stats());
            }
            (Err(a), Err(b)) => prop_assert_eq!(a, b),
            _ => prop_assert!(false, "decoding the same genotype diverged"),
        }
    }

    #[test]
    fn test_type_index_partitions_nodes(genotype in genotype_strategy()) {
        let Ok(tree) = ProgramTree::decode(expression_grammar(), "<prog>", &genotype) else {
            return Ok(());
        };
        let mut seen = HashSet::new();
        for category in EXPRESSION_CATEGORIES {
            let nodes = tree.get_nodes_by_type(category).unwrap();
            prop_assert!(nodes.windows(2).all(|w| w[0].index() < w[1].index()));
            for &node in nodes {
                prop_assert_eq!(tree.category_of(node).unwrap().as_str(), category);
                prop_assert!(seen.insert(node));
            }
        }
        let all: HashSet<_> = tree.nodes().unwrap().into_iter().collect();
        prop_assert_eq!(seen, all);
    }

    #[test]
    fn test_parent_is_inverse_of_children(genotype in genotype_strategy()) {
        let Ok(tree) = ProgramTree::decode(expression_grammar(), "<prog>", &genotype) else {
            return Ok(());
        };
        let nodes = tree.nodes().unwrap();
        let root = tree.root().unwrap();
        for &node in &nodes {
            let claims = nodes
                .iter()
                .filter(|&&other| tree.children_of(other).unwrap().contains(&node))
                .count();
            match tree.get_parent_of_node(node).unwrap() {
                None => {
                    prop_assert_eq!(node, root);
                    prop_assert_eq!(claims, 0);
                }
                Some(parent) => {
                    let position = tree.position_in_parent(node).unwrap().unwrap();
                    prop_assert_eq!(tree.children_of(parent).unwrap()[position], node);
                    prop_assert_eq!(claims, 1);
                    prop_assert_eq!(tree.depth_of(node).unwrap(), tree.depth_of(parent).unwrap() + 1);
                }
            }
        }
    }

    #[test]
    fn test_decoded_expressions_evaluate_to_integers(genotype in genotype_strategy(), x in -50i64..50) {
        let Ok(mut tree) = ProgramTree::decode(expression_grammar(), "<prog>", &genotype) else {
            return Ok(());
        };
        let agent = Arc::new(Mutex::new(Registers { x }));
        tree.bind(&agent).unwrap();
        let value = tree.evaluate().unwrap();
        prop_assert!(matches!(value, Value::Integer(_)));
    }
}
