//! Weighted particle swarm optimisation for MAX-SAT.
//!
//! Each iteration moves every particle (by default with greedy local search
//! rather than a sigmoid flight), tracks personal and global bests, then
//! raises the weight of every clause the global best leaves unsatisfied.
//! Clause weights therefore push the swarm towards clauses that stay hard.

use super::SearchOutcome;
use crate::seeded_rng;
use anyhow::{anyhow, Result};
use evosat_challenges::satisfiability::{num_satisfied, Challenge, Solution};
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info};

mod local_search;
mod particle;
mod weights;

pub use local_search::{flip_gain, local_search, Occurrences};
pub use particle::{sigmoid, Particle};
pub use weights::{ClauseWeights, GlobalBest};

/// How a particle's position moves once its velocity is updated.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum PositionUpdate {
    #[default]
    LocalSearch,
    Flight,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Hyperparameters {
    pub num_particles: usize,
    pub max_iteration: usize,
    pub max_flip: usize,
    pub w: f64,
    pub c1: f64,
    pub c2: f64,
    pub position_update: PositionUpdate,
}

impl Default for Hyperparameters {
    fn default() -> Self {
        Self {
            num_particles: 20,
            max_iteration: 1000,
            max_flip: 30000,
            w: 1.0,
            c1: 1.7,
            c2: 2.1,
            position_update: PositionUpdate::LocalSearch,
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
        if self.num_particles == 0 {
            return Err(anyhow!("num_particles must be at least 1"));
        }
        for (name, value) in [("w", self.w), ("c1", self.c1), ("c2", self.c2)] {
            if !value.is_finite() {
                return Err(anyhow!("{} must be finite, got {}", name, value));
            }
        }
        Ok(())
    }
}

pub struct WpsoSearch<'a, R: Rng> {
    challenge: &'a Challenge,
    params: Hyperparameters,
    rng: R,
    swarm: Vec<Particle>,
    weights: ClauseWeights,
    global_best: GlobalBest,
    occurrences: Occurrences,
    iteration: usize,
}

impl<'a, R: Rng> WpsoSearch<'a, R> {
    /// Scatters the swarm and seeds the global best with the first particle.
    pub fn new(challenge: &'a Challenge, params: Hyperparameters, mut rng: R) -> Result<Self> {
        params.validate()?;
        let swarm: Vec<Particle> = (0..params.num_particles)
            .map(|_| Particle::random(challenge.num_variables(), &mut rng))
            .collect();
        let weights = ClauseWeights::new(challenge.num_clauses());
        let seed_position = swarm[0].position.clone();
        let global_best = GlobalBest {
            fitness: weights.score(challenge.clauses(), &seed_position),
            variables: seed_position,
        };
        Ok(Self {
            challenge,
            params,
            rng,
            swarm,
            weights,
            global_best,
            occurrences: Occurrences::new(challenge),
            iteration: 0,
        })
    }

    pub fn swarm(&self) -> &[Particle] {
        &self.swarm
    }

    pub fn weights(&self) -> &ClauseWeights {
        &self.weights
    }

    pub fn global_best(&self) -> &GlobalBest {
        &self.global_best
    }

    pub fn iteration(&self) -> usize {
        self.iteration
    }

    pub fn is_finished(&self) -> bool {
        self.iteration >= self.params.max_iteration
            || num_satisfied(self.challenge.clauses(), &self.global_best.variables)
                == self.challenge.num_clauses()
    }

    pub fn step(&mut self) {
        let challenge = self.challenge;
        let clauses = challenge.clauses();
        let Hyperparameters {
            w,
            c1,
            c2,
            max_flip,
            position_update,
            ..
        } = self.params;

        for particle in self.swarm.iter_mut() {
            particle.fitness = self.weights.score(clauses, &particle.position);
            self.global_best.offer(&particle.position, particle.fitness);
        }

        for particle in self.swarm.iter_mut() {
            particle.update_velocity(&self.global_best.variables, w, c1, c2, &mut self.rng);
            match position_update {
                PositionUpdate::LocalSearch => {
                    local_search(
                        clauses,
                        self.weights.as_slice(),
                        &self.occurrences,
                        &mut particle.position,
                        max_flip,
                    );
                }
                PositionUpdate::Flight => particle.fly(&mut self.rng),
            }
            particle.fitness = self.weights.score(clauses, &particle.position);

            if particle.fitness > self.weights.score(clauses, &particle.best) {
                particle.best.clone_from(&particle.position);
            }
            let best_fitness = self.weights.score(clauses, &particle.best);
            self.global_best.offer(&particle.best, best_fitness);
        }

        self.weights
            .bump_unsatisfied(clauses, &self.global_best.variables);
        self.iteration += 1;
        debug!(
            iteration = self.iteration,
            num_satisfied = num_satisfied(clauses, &self.global_best.variables),
            fitness = self.global_best.fitness,
            "swarm iteration"
        );
    }

    pub fn run(mut self) -> SearchOutcome {
        while !self.is_finished() {
            self.step();
        }
        let num_satisfied = num_satisfied(self.challenge.clauses(), &self.global_best.variables);
        let outcome = SearchOutcome {
            num_satisfied,
            fitness: self.global_best.fitness,
            iterations: self.iteration,
            satisfied: num_satisfied == self.challenge.num_clauses(),
            solution: Solution::new(self.global_best.variables),
        };
        info!(
            iterations = outcome.iterations,
            num_satisfied = outcome.num_satisfied,
            satisfied = outcome.satisfied,
            "swarm search finished"
        );
        outcome
    }
}

pub fn solve_challenge(
    challenge: &Challenge,
    hyperparameters: &Option<Map<String, Value>>,
    seed: u64,
) -> Result<SearchOutcome> {
    let params = Hyperparameters::from_map(hyperparameters)?;
    let search = WpsoSearch::new(challenge, params, seeded_rng(seed))?;
    Ok(search.run())
}
