use evosat_challenges::satisfiability::{unsatisfied_clauses, weighted_score};

/// One weight per clause. Weights start at 1 and only ever grow.
#[derive(Debug, Clone, PartialEq)]
pub struct ClauseWeights {
    weights: Vec<f64>,
}

impl ClauseWeights {
    pub fn new(num_clauses: usize) -> Self {
        Self {
            weights: vec![1.0; num_clauses],
        }
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.weights
    }

    pub fn score(&self, clauses: &[Vec<i32>], variables: &[bool]) -> f64 {
        weighted_score(clauses, &self.weights, variables)
    }

    /// Adds 1 to the weight of every clause `variables` leaves unsatisfied.
    pub fn bump_unsatisfied(&mut self, clauses: &[Vec<i32>], variables: &[bool]) {
        for idx in unsatisfied_clauses(clauses, variables) {
            self.weights[idx] += 1.0;
        }
    }
}

/// Best position seen by the whole swarm and its weighted fitness at the time
/// it was recorded.
#[derive(Debug, Clone, PartialEq)]
pub struct GlobalBest {
    pub variables: Vec<bool>,
    pub fitness: f64,
}

impl GlobalBest {
    /// Takes the candidate only on strict improvement, so among equal
    /// candidates the first one offered is kept.
    pub fn offer(&mut self, variables: &[bool], fitness: f64) -> bool {
        if fitness > self.fitness {
            self.variables.clear();
            self.variables.extend_from_slice(variables);
            self.fitness = fitness;
            true
        } else {
            false
        }
    }
}
