use evosat_algorithms::satisfiability::wpso_sat::{
    flip_gain, local_search, sigmoid, solve_challenge, GlobalBest, Hyperparameters, Occurrences,
    PositionUpdate, WpsoSearch,
};
use evosat_algorithms::seeded_rng;
use evosat_challenges::satisfiability::{clause_satisfied, weighted_score, Challenge, Difficulty};
use proptest::prelude::*;
use serde_json::json;

fn unsatisfiable_core() -> Challenge {
    Challenge::new(2, vec![vec![1, 2], vec![-1, 2], vec![1, -2], vec![-1, -2]], None).unwrap()
}

fn small_params() -> Hyperparameters {
    Hyperparameters {
        num_particles: 5,
        max_iteration: 20,
        ..Hyperparameters::default()
    }
}

#[test]
fn test_unsatisfiable_core_reports_three() {
    let challenge = unsatisfiable_core();
    let outcome = WpsoSearch::new(&challenge, small_params(), seeded_rng(1))
        .unwrap()
        .run();
    assert_eq!(outcome.num_satisfied, 3);
    assert!(!outcome.satisfied);
    assert_eq!(outcome.iterations, 20);
}

#[test]
fn test_flight_on_unsatisfiable_core() {
    let challenge = unsatisfiable_core();
    let params = Hyperparameters {
        position_update: PositionUpdate::Flight,
        ..small_params()
    };
    let outcome = WpsoSearch::new(&challenge, params, seeded_rng(2))
        .unwrap()
        .run();
    assert_eq!(outcome.num_satisfied, 3);
    assert!(!outcome.satisfied);
    assert_eq!(outcome.iterations, 20);
}

#[test]
fn test_trivial_instance() {
    let challenge = Challenge::new(1, vec![vec![1]], None).unwrap();
    let outcome = solve_challenge(&challenge, &None, 0).unwrap();
    assert!(outcome.satisfied);
    assert_eq!(outcome.solution.variables, vec![true]);
    assert_eq!(outcome.num_satisfied, 1);
    assert!(outcome.iterations <= 1);
}

#[test]
fn test_independent_clauses() {
    let challenge = Challenge::new(3, vec![vec![1], vec![2], vec![3]], None).unwrap();
    let outcome = solve_challenge(&challenge, &None, 3).unwrap();
    assert!(outcome.satisfied);
    assert_eq!(outcome.solution.variables, vec![true, true, true]);
    assert_eq!(outcome.num_satisfied, 3);
    assert!(outcome.iterations <= 1);
}

#[test]
fn test_empty_formulas_finish_immediately() {
    for challenge in [
        Challenge::new(0, vec![], None).unwrap(),
        Challenge::new(4, vec![], None).unwrap(),
    ] {
        let outcome = solve_challenge(&challenge, &None, 0).unwrap();
        assert!(outcome.satisfied);
        assert_eq!(outcome.iterations, 0);
        assert_eq!(outcome.num_satisfied, 0);
    }
}

#[test]
fn test_clause_weights_grow_on_unsatisfied_clauses() {
    let challenge = unsatisfiable_core();
    let mut search = WpsoSearch::new(&challenge, small_params(), seeded_rng(7)).unwrap();
    assert_eq!(search.weights().as_slice(), &[1.0; 4]);
    for _ in 0..10 {
        let before = search.weights().as_slice().to_vec();
        search.step();
        let after = search.weights().as_slice();
        let best = &search.global_best().variables;
        for (idx, clause) in challenge.clauses().iter().enumerate() {
            let expected = if clause_satisfied(clause, best) { 0.0 } else { 1.0 };
            assert_eq!(after[idx] - before[idx], expected);
        }
    }
    // exactly one clause is unsatisfied per iteration
    assert_eq!(search.weights().as_slice().iter().sum::<f64>(), 14.0);
}

#[test]
fn test_global_best_never_decreases() {
    let challenge = Challenge::generate_instance(
        5,
        &Difficulty {
            num_variables: 30,
            clauses_to_variables_percent: 500,
        },
    )
    .unwrap();
    let mut search = WpsoSearch::new(&challenge, small_params(), seeded_rng(5)).unwrap();
    let mut previous = search.global_best().fitness;
    while !search.is_finished() {
        search.step();
        assert!(search.global_best().fitness >= previous);
        previous = search.global_best().fitness;
    }
}

#[test]
fn test_global_best_keeps_first_of_equals() {
    let mut best = GlobalBest {
        variables: vec![false, false],
        fitness: 1.0,
    };
    assert!(!best.offer(&[true, false], 1.0));
    assert!(best.offer(&[true, false], 2.0));
    assert!(!best.offer(&[true, true], 2.0));
    assert_eq!(best.variables, vec![true, false]);
    assert!(!best.offer(&[false, true], 0.5));
    assert_eq!(best.fitness, 2.0);
}

#[test]
fn test_same_seed_same_result() {
    let challenge = Challenge::generate_instance(
        2,
        &Difficulty {
            num_variables: 40,
            clauses_to_variables_percent: 426,
        },
    )
    .unwrap();
    let hyperparameters = json!({"max_iteration": 10, "num_particles": 4})
        .as_object()
        .cloned();
    let a = solve_challenge(&challenge, &hyperparameters, 17).unwrap();
    let b = solve_challenge(&challenge, &hyperparameters, 17).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_sigmoid_is_stable() {
    assert_eq!(sigmoid(0.0), 0.5);
    assert_eq!(sigmoid(1e308), 1.0);
    assert_eq!(sigmoid(-1e308), 0.0);
    assert_eq!(sigmoid(f64::INFINITY), 1.0);
    assert_eq!(sigmoid(f64::NEG_INFINITY), 0.0);
    for v in [-800.0, -30.0, -1.0, 1.0, 30.0, 800.0] {
        let p = sigmoid(v);
        assert!(p.is_finite() && (0.0..=1.0).contains(&p));
        assert!((sigmoid(v) + sigmoid(-v) - 1.0).abs() < 1e-12);
    }
}

#[test]
fn test_local_search_respects_max_flip() {
    let challenge = Challenge::new(3, vec![vec![1], vec![2], vec![3]], None).unwrap();
    let occurrences = Occurrences::new(&challenge);
    let weights = vec![1.0; 3];

    let mut variables = vec![false; 3];
    let flips = local_search(challenge.clauses(), &weights, &occurrences, &mut variables, 0);
    assert_eq!(flips, 0);
    assert_eq!(variables, vec![false; 3]);

    // a started sweep runs to the end even when it passes the budget
    let flips = local_search(challenge.clauses(), &weights, &occurrences, &mut variables, 2);
    assert_eq!(flips, 3);
    assert_eq!(variables, vec![true; 3]);

    let mut variables = vec![false; 3];
    let flips = local_search(challenge.clauses(), &weights, &occurrences, &mut variables, 4);
    assert_eq!(flips, 6);
    assert_eq!(variables, vec![true; 3]);

    let mut variables = vec![false; 3];
    let flips = local_search(challenge.clauses(), &weights, &occurrences, &mut variables, 30000);
    assert_eq!(flips, 6);
    assert_eq!(variables, vec![true; 3]);
}

#[test]
fn test_hyperparameters() {
    assert_eq!(
        Hyperparameters::from_map(&None).unwrap(),
        Hyperparameters::default()
    );
    let params = Hyperparameters::from_map(
        &json!({"c1": 2.0, "position_update": "flight"})
            .as_object()
            .cloned(),
    )
    .unwrap();
    assert_eq!(params.c1, 2.0);
    assert_eq!(params.c2, 2.1);
    assert_eq!(params.position_update, PositionUpdate::Flight);
    assert!(Hyperparameters::from_map(&json!({"num_particles": 0}).as_object().cloned()).is_err());
    assert!(Hyperparameters::from_map(&json!({"w": "fast"}).as_object().cloned()).is_err());
}

fn weighted_formula() -> impl Strategy<Value = (Challenge, Vec<f64>, Vec<bool>)> {
    (1usize..10).prop_flat_map(|n| {
        let literal = (1..=n as i32, any::<bool>()).prop_map(|(v, neg)| if neg { -v } else { v });
        prop::collection::vec(prop::collection::vec(literal, 1..4), 0..25).prop_flat_map(
            move |clauses| {
                let m = clauses.len();
                (
                    Just(Challenge::new(n, clauses, None).unwrap()),
                    prop::collection::vec((1u32..6).prop_map(f64::from), m),
                    prop::collection::vec(any::<bool>(), n),
                )
            },
        )
    })
}

proptest! {
    #[test]
    fn local_search_never_lowers_fitness(
        (challenge, weights, mut variables) in weighted_formula(),
        max_flip in 0usize..60,
    ) {
        let occurrences = Occurrences::new(&challenge);
        let before = weighted_score(challenge.clauses(), &weights, &variables);
        local_search(challenge.clauses(), &weights, &occurrences, &mut variables, max_flip);
        let after = weighted_score(challenge.clauses(), &weights, &variables);
        prop_assert!(after >= before);
    }

    #[test]
    fn flip_gain_matches_full_rescore(
        (challenge, weights, mut variables) in weighted_formula(),
        var_seed in any::<usize>(),
    ) {
        let occurrences = Occurrences::new(&challenge);
        let var_idx = var_seed % challenge.num_variables();
        let before = weighted_score(challenge.clauses(), &weights, &variables);
        let gain = flip_gain(challenge.clauses(), &weights, &occurrences, &mut variables, var_idx);
        let after = weighted_score(challenge.clauses(), &weights, &variables);
        prop_assert_eq!(gain, after - before);
    }
}
