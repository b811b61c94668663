use evosat_challenges::satisfiability::{clause_satisfied, Challenge};

/// For every variable, the indices of the clauses that mention it.
#[derive(Debug, Clone)]
pub struct Occurrences {
    by_variable: Vec<Vec<usize>>,
}

impl Occurrences {
    pub fn new(challenge: &Challenge) -> Self {
        let mut by_variable = vec![Vec::new(); challenge.num_variables()];
        for (idx, clause) in challenge.clauses().iter().enumerate() {
            for &literal in clause {
                let clauses = &mut by_variable[literal.unsigned_abs() as usize - 1];
                if clauses.last() != Some(&idx) {
                    clauses.push(idx);
                }
            }
        }
        Self { by_variable }
    }

    pub fn clauses_of(&self, var_idx: usize) -> &[usize] {
        &self.by_variable[var_idx]
    }
}

/// Flips `variables[var_idx]` and returns the change in weighted score. Only
/// clauses containing the variable can change, so only those are rescored.
pub fn flip_gain(
    clauses: &[Vec<i32>],
    weights: &[f64],
    occurrences: &Occurrences,
    variables: &mut [bool],
    var_idx: usize,
) -> f64 {
    let satisfied_weight = |variables: &[bool]| -> f64 {
        occurrences
            .clauses_of(var_idx)
            .iter()
            .filter(|&&c| clause_satisfied(&clauses[c], variables))
            .map(|&c| weights[c])
            .sum()
    };
    let before = satisfied_weight(&*variables);
    variables[var_idx] = !variables[var_idx];
    let after = satisfied_weight(&*variables);
    after - before
}

/// Bounded first-improvement hill climbing.
///
/// Sweeps the variables in order, keeping every flip whose gain is `>= 0`
/// and undoing the rest. The flip budget is checked between sweeps only, so a
/// started sweep always completes and the count may exceed `max_flip` by up
/// to one sweep. Stops after a sweep without positive gain. Returns the
/// number of flips tried.
pub fn local_search(
    clauses: &[Vec<i32>],
    weights: &[f64],
    occurrences: &Occurrences,
    variables: &mut [bool],
    max_flip: usize,
) -> usize {
    let mut flips = 0;
    while flips < max_flip {
        let mut improvement = 0.0;
        for var_idx in 0..variables.len() {
            let gain = flip_gain(clauses, weights, occurrences, variables, var_idx);
            flips += 1;
            if gain >= 0.0 {
                improvement += gain;
            } else {
                variables[var_idx] = !variables[var_idx];
            }
        }
        if improvement <= 0.0 {
            break;
        }
    }
    flips
}
