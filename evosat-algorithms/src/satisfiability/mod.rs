use evosat_challenges::satisfiability::Solution;
use serde::{Deserialize, Serialize};

pub mod genetic_sat;
pub mod wpso_sat;

/// What a search run hands back: the best assignment it found and how good
/// it is.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SearchOutcome {
    pub solution: Solution,
    /// Unweighted number of satisfied clauses.
    pub num_satisfied: usize,
    /// Engine fitness of `solution`. Equals `num_satisfied` for the genetic
    /// engine and is the clause-weighted score for the swarm.
    pub fitness: f64,
    pub iterations: usize,
    /// Whether every clause is satisfied.
    pub satisfied: bool,
}
