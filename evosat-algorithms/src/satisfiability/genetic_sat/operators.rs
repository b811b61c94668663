use super::Chromosome;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Which individuals form the reproduction pool.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SelectionPolicy {
    /// The `selection_size` least fit individuals. This is the historical
    /// behaviour of the solver and stays the default.
    #[default]
    Lowest,
    /// The `selection_size` fittest individuals.
    Highest,
    /// `selection_size` winners of independent tournaments of
    /// `tournament_size` uniform draws each.
    Tournament,
}

impl SelectionPolicy {
    pub fn select<'p, R: Rng>(
        &self,
        population: &'p [Chromosome],
        size: usize,
        tournament_size: usize,
        rng: &mut R,
    ) -> Vec<&'p Chromosome> {
        match self {
            Self::Lowest => {
                let mut sorted: Vec<&Chromosome> = population.iter().collect();
                sorted.sort_by_key(|c| c.fitness());
                sorted.truncate(size);
                sorted
            }
            Self::Highest => {
                let mut sorted: Vec<&Chromosome> = population.iter().collect();
                sorted.sort_by(|a, b| b.fitness().cmp(&a.fitness()));
                sorted.truncate(size);
                sorted
            }
            Self::Tournament => (0..size)
                .map(|_| {
                    let first = &population[rng.gen_range(0..population.len())];
                    (1..tournament_size).fold(first, |best, _| {
                        let contender = &population[rng.gen_range(0..population.len())];
                        if contender.fitness() > best.fitness() {
                            contender
                        } else {
                            best
                        }
                    })
                })
                .collect(),
        }
    }
}

/// Uniform crossover. At every locus a coin with bias `crossover_p` decides
/// whether the children keep their own parent's bit or swap, so the two
/// children are complementary.
pub fn crossover<R: Rng>(
    a: &[bool],
    b: &[bool],
    crossover_p: f64,
    rng: &mut R,
) -> (Vec<bool>, Vec<bool>) {
    a.iter()
        .zip(b)
        .map(|(&x, &y)| {
            if rng.gen::<f64>() < crossover_p {
                (x, y)
            } else {
                (y, x)
            }
        })
        .unzip()
}

/// Outcome of the mutation gate for one child. `mutation_rate` is the
/// probability of a single flip per child, not a per-bit probability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    NoMutation,
    SingleFlip(usize),
}

impl Mutation {
    pub fn draw<R: Rng>(mutation_rate: f64, len: usize, rng: &mut R) -> Self {
        if len > 0 && rng.gen::<f64>() < mutation_rate {
            Self::SingleFlip(rng.gen_range(0..len))
        } else {
            Self::NoMutation
        }
    }

    pub fn apply(self, variables: &mut [bool]) {
        if let Self::SingleFlip(locus) = self {
            variables[locus] = !variables[locus];
        }
    }
}
