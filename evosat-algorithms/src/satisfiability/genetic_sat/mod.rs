use super::SearchOutcome;
use crate::seeded_rng;
use anyhow::{anyhow, Result};
use evosat_challenges::satisfiability::{num_satisfied, Challenge, Solution};
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

mod operators;
pub use operators::{crossover, Mutation, SelectionPolicy};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Hyperparameters {
    pub max_iterations: usize,
    pub generation_size: usize,
    pub mutation_rate: f64,
    pub selection_size: usize,
    pub crossover_p: f64,
    pub selection: SelectionPolicy,
    pub tournament_size: usize,
}

impl Default for Hyperparameters {
    fn default() -> Self {
        Self {
            max_iterations: 1000,
            generation_size: 100,
            mutation_rate: 0.01,
            selection_size: 10,
            crossover_p: 0.5,
            selection: SelectionPolicy::Lowest,
            tournament_size: 20,
        }
    }
}

impl Hyperparameters {
    pub fn from_map(hyperparameters: &Option<Map<String, Value>>) -> Result<Self> {
        let params: Self = match hyperparameters {
            Some(map) => serde_json::from_value(Value::Object(map.clone()))?,
            None => Self::default(),
        };
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.mutation_rate) {
            return Err(anyhow!(
                "mutation_rate must be within [0, 1], got {}",
                self.mutation_rate
            ));
        }
        if !(0.0..=1.0).contains(&self.crossover_p) {
            return Err(anyhow!(
                "crossover_p must be within [0, 1], got {}",
                self.crossover_p
            ));
        }
        if self.selection_size < 2 {
            return Err(anyhow!(
                "selection_size must be at least 2 to draw distinct parents, got {}",
                self.selection_size
            ));
        }
        if self.generation_size < self.selection_size {
            return Err(anyhow!(
                "generation_size ({}) must not be smaller than selection_size ({})",
                self.generation_size,
                self.selection_size
            ));
        }
        if self.selection == SelectionPolicy::Tournament && self.tournament_size == 0 {
            return Err(anyhow!("tournament_size must be at least 1"));
        }
        Ok(())
    }
}

/// A candidate assignment together with its number of satisfied clauses.
/// Only built through [`Chromosome::evaluate`], so the fitness always belongs
/// to the solution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chromosome {
    solution: Vec<bool>,
    fitness: usize,
}

impl Chromosome {
    pub fn evaluate(solution: Vec<bool>, clauses: &[Vec<i32>]) -> Self {
        let fitness = num_satisfied(clauses, &solution);
        Self { solution, fitness }
    }

    pub fn solution(&self) -> &[bool] {
        &self.solution
    }

    pub fn fitness(&self) -> usize {
        self.fitness
    }
}

pub struct GeneticSearch<'a, R: Rng> {
    challenge: &'a Challenge,
    params: Hyperparameters,
    rng: R,
    population: Vec<Chromosome>,
    optimum: Option<Chromosome>,
    iteration: usize,
}

impl<'a, R: Rng> GeneticSearch<'a, R> {
    /// Draws and evaluates the initial population.
    pub fn new(challenge: &'a Challenge, params: Hyperparameters, rng: R) -> Result<Self> {
        params.validate()?;
        if params.generation_size % 2 == 1 {
            warn!(
                "generation_size {} is odd; offspring come in pairs so generations after the first hold {}",
                params.generation_size,
                params.generation_size + 1
            );
        }

        let num_variables = challenge.num_variables();
        let generation_size = params.generation_size;
        let mut search = Self {
            challenge,
            params,
            rng,
            population: Vec::with_capacity(generation_size),
            optimum: None,
            iteration: 0,
        };
        for _ in 0..generation_size {
            let variables: Vec<bool> = (0..num_variables).map(|_| search.rng.gen::<bool>()).collect();
            let chromosome = search.evaluate(variables);
            search.population.push(chromosome);
        }
        Ok(search)
    }

    pub fn population(&self) -> &[Chromosome] {
        &self.population
    }

    pub fn iteration(&self) -> usize {
        self.iteration
    }

    /// First assignment seen that satisfies every clause, if any.
    pub fn optimum(&self) -> Option<&Chromosome> {
        self.optimum.as_ref()
    }

    pub fn is_finished(&self) -> bool {
        self.iteration > self.params.max_iterations || self.optimum.is_some()
    }

    /// Runs one generation: select, reproduce, replace.
    pub fn step(&mut self) {
        let population = std::mem::take(&mut self.population);
        debug!(
            iteration = self.iteration,
            top_fitness = population.iter().map(Chromosome::fitness).max().unwrap_or(0),
            "generation"
        );

        let pool = self.params.selection.select(
            &population,
            self.params.selection_size,
            self.params.tournament_size,
            &mut self.rng,
        );

        let mut next_generation = Vec::with_capacity(self.params.generation_size + 1);
        while next_generation.len() < self.params.generation_size {
            let (i, j) = distinct_pair(pool.len(), &mut self.rng);
            let (a, b) = crossover(
                pool[i].solution(),
                pool[j].solution(),
                self.params.crossover_p,
                &mut self.rng,
            );
            for mut child in [a, b] {
                Mutation::draw(self.params.mutation_rate, child.len(), &mut self.rng)
                    .apply(&mut child);
                next_generation.push(self.evaluate(child));
            }
        }

        self.population = next_generation;
        self.iteration += 1;
    }

    pub fn run(mut self) -> SearchOutcome {
        while !self.is_finished() {
            self.step();
        }
        let outcome = self.into_outcome();
        info!(
            iterations = outcome.iterations,
            num_satisfied = outcome.num_satisfied,
            satisfied = outcome.satisfied,
            "genetic search finished"
        );
        outcome
    }

    fn evaluate(&mut self, solution: Vec<bool>) -> Chromosome {
        let chromosome = Chromosome::evaluate(solution, self.challenge.clauses());
        if self.optimum.is_none() && chromosome.fitness == self.challenge.num_clauses() {
            debug!(iteration = self.iteration, "optimal assignment observed");
            self.optimum = Some(chromosome.clone());
        }
        chromosome
    }

    fn into_outcome(self) -> SearchOutcome {
        let num_clauses = self.challenge.num_clauses();
        let best = match self.optimum {
            Some(optimum) => optimum,
            None => fittest(self.population).unwrap_or_else(|| {
                Chromosome::evaluate(
                    vec![false; self.challenge.num_variables()],
                    self.challenge.clauses(),
                )
            }),
        };
        SearchOutcome {
            num_satisfied: best.fitness,
            fitness: best.fitness as f64,
            iterations: self.iteration,
            satisfied: best.fitness == num_clauses,
            solution: Solution::new(best.solution),
        }
    }
}

/// Highest fitness in `population`; the earliest one wins ties.
pub fn fittest(population: Vec<Chromosome>) -> Option<Chromosome> {
    population
        .into_iter()
        .reduce(|best, c| if c.fitness > best.fitness { c } else { best })
}

/// Two different indices below `len`, uniformly among ordered pairs.
fn distinct_pair<R: Rng>(len: usize, rng: &mut R) -> (usize, usize) {
    let i = rng.gen_range(0..len);
    let mut j = rng.gen_range(0..len - 1);
    if j >= i {
        j += 1;
    }
    (i, j)
}

pub fn solve_challenge(
    challenge: &Challenge,
    hyperparameters: &Option<Map<String, Value>>,
    seed: u64,
) -> Result<SearchOutcome> {
    let params = Hyperparameters::from_map(hyperparameters)?;
    let search = GeneticSearch::new(challenge, params, seeded_rng(seed))?;
    Ok(search.run())
}
