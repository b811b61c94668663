//! Clause evaluation shared by every search engine.
//!
//! All functions are pure and allocation-free. They index `variables` with
//! `|literal| - 1`, so callers pass clauses taken from a validated
//! [`Challenge`](super::Challenge) and an assignment of matching length.

#[inline]
pub fn literal_value(variables: &[bool], literal: i32) -> bool {
    debug_assert!(literal != 0);
    let var_idx = literal.unsigned_abs() as usize - 1;
    if literal < 0 {
        !variables[var_idx]
    } else {
        variables[var_idx]
    }
}

#[inline]
pub fn clause_satisfied(clause: &[i32], variables: &[bool]) -> bool {
    clause
        .iter()
        .any(|&literal| literal_value(variables, literal))
}

/// Number of satisfied clauses.
pub fn num_satisfied(clauses: &[Vec<i32>], variables: &[bool]) -> usize {
    clauses
        .iter()
        .filter(|clause| clause_satisfied(clause, variables))
        .count()
}

/// Sum of the weights of the satisfied clauses. `weights[i]` belongs to
/// `clauses[i]`.
pub fn weighted_score(clauses: &[Vec<i32>], weights: &[f64], variables: &[bool]) -> f64 {
    debug_assert_eq!(clauses.len(), weights.len());
    clauses
        .iter()
        .zip(weights)
        .filter(|(clause, _)| clause_satisfied(clause, variables))
        .map(|(_, &weight)| weight)
        .sum()
}

pub fn unsatisfied_clauses<'a>(
    clauses: &'a [Vec<i32>],
    variables: &'a [bool],
) -> impl Iterator<Item = usize> + 'a {
    clauses
        .iter()
        .enumerate()
        .filter(move |(_, clause)| !clause_satisfied(clause, variables))
        .map(|(idx, _)| idx)
}
