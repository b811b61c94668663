use crate::error::{ChallengeError, Result};
use anyhow::anyhow;
use ndarray::{Array2, Axis};
use rand::{
    distributions::{Distribution, Uniform},
    rngs::{SmallRng, StdRng},
    Rng, SeedableRng,
};
use serde::{
    de::{self, SeqAccess, Visitor},
    ser::SerializeSeq,
    Deserialize, Deserializer, Serialize, Serializer,
};
use serde_json::{from_value, Map, Value};

mod dimacs;
pub mod evaluate;

pub use evaluate::{
    clause_satisfied, literal_value, num_satisfied, unsatisfied_clauses, weighted_score,
};

#[derive(Serialize, Deserialize, Debug, Copy, Clone)]
pub struct Difficulty {
    pub num_variables: usize,
    pub clauses_to_variables_percent: u32,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Solution {
    #[serde(with = "bool_vec_as_u8")]
    pub variables: Vec<bool>,
}

impl Solution {
    pub fn new(variables: Vec<bool>) -> Self {
        Self { variables }
    }
}

impl TryFrom<Map<String, Value>> for Solution {
    type Error = serde_json::Error;

    fn try_from(v: Map<String, Value>) -> std::result::Result<Self, Self::Error> {
        from_value(Value::Object(v))
    }
}

/// A CNF formula whose literals have been checked against `num_variables`.
///
/// Fields are private so that every `Challenge` an engine sees went through
/// [`Challenge::new`].
#[derive(Serialize, Debug, Clone)]
pub struct Challenge {
    num_variables: usize,
    clauses: Vec<Vec<i32>>,
}

impl<'de> Deserialize<'de> for Challenge {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Raw {
            num_variables: usize,
            clauses: Vec<Vec<i32>>,
        }

        let raw = Raw::deserialize(deserializer)?;
        Challenge::new(raw.num_variables, raw.clauses, None).map_err(de::Error::custom)
    }
}

impl Challenge {
    /// Builds a challenge, rejecting literals that are `0` or name a variable
    /// beyond `num_variables`. When `num_clauses` is given it must match.
    pub fn new(
        num_variables: usize,
        clauses: Vec<Vec<i32>>,
        num_clauses: Option<usize>,
    ) -> Result<Self> {
        if let Some(expected) = num_clauses {
            if expected != clauses.len() {
                return Err(ChallengeError::ClauseCountMismatch {
                    expected,
                    actual: clauses.len(),
                });
            }
        }

        for (idx, clause) in clauses.iter().enumerate() {
            for &literal in clause {
                if literal == 0 {
                    return Err(ChallengeError::ZeroLiteral { clause: idx });
                }
                if literal.unsigned_abs() as usize > num_variables {
                    return Err(ChallengeError::LiteralOutOfRange {
                        clause: idx,
                        literal,
                        num_variables,
                    });
                }
            }
        }

        Ok(Self {
            num_variables,
            clauses,
        })
    }

    pub fn generate_instance(seed: u64, difficulty: &Difficulty) -> anyhow::Result<Self> {
        if difficulty.num_variables == 0 {
            return Err(anyhow!("Cannot generate an instance without variables"));
        }
        let mut rng = SmallRng::from_seed(StdRng::seed_from_u64(seed).gen());
        let num_clauses = (difficulty.num_variables as f64
            * difficulty.clauses_to_variables_percent as f64
            / 100.0)
            .floor() as usize;

        let var_distr = Uniform::new(1, difficulty.num_variables as i32 + 1);
        let neg_distr = Uniform::new(0, 2);

        let clauses_array = Array2::from_shape_fn((num_clauses, 3), |_| var_distr.sample(&mut rng));

        let negations = Array2::from_shape_fn((num_clauses, 3), |_| {
            if neg_distr.sample(&mut rng) == 0 {
                -1
            } else {
                1
            }
        });

        let clauses_array = clauses_array * negations;

        let clauses = clauses_array
            .axis_iter(Axis(0))
            .map(|row| row.to_vec())
            .collect();

        Ok(Self::new(difficulty.num_variables, clauses, Some(num_clauses))?)
    }

    pub fn num_variables(&self) -> usize {
        self.num_variables
    }

    pub fn num_clauses(&self) -> usize {
        self.clauses.len()
    }

    pub fn clauses(&self) -> &[Vec<i32>] {
        &self.clauses
    }

    pub fn verify_solution(&self, solution: &Solution) -> Result<()> {
        if solution.variables.len() != self.num_variables {
            return Err(ChallengeError::InvalidNumVariables {
                expected: self.num_variables,
                actual: solution.variables.len(),
            });
        }

        match unsatisfied_clauses(&self.clauses, &solution.variables).next() {
            Some(idx) => Err(ChallengeError::Unsatisfied(idx)),
            None => Ok(()),
        }
    }
}

mod bool_vec_as_u8 {
    use super::*;
    use std::fmt;

    pub fn serialize<S>(data: &Vec<bool>, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut seq = serializer.serialize_seq(Some(data.len()))?;
        for &value in data {
            seq.serialize_element(&(if value { 1 } else { 0 }))?;
        }
        seq.end()
    }

    struct BoolVecVisitor;

    impl<'de> Visitor<'de> for BoolVecVisitor {
        type Value = Vec<bool>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a sequence of booleans or integers 0/1")
        }

        fn visit_seq<A>(self, mut seq: A) -> std::result::Result<Self::Value, A::Error>
        where
            A: SeqAccess<'de>,
        {
            let mut vec = Vec::new();
            while let Some(value) = seq.next_element::<serde_json::Value>()? {
                match value {
                    serde_json::Value::Number(n) if n.as_u64() == Some(1) => vec.push(true),
                    serde_json::Value::Number(n) if n.as_u64() == Some(0) => vec.push(false),
                    serde_json::Value::Bool(b) => vec.push(b),
                    _ => return Err(de::Error::custom("expected 0, 1, true, or false")),
                }
            }
            Ok(vec)
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> std::result::Result<Vec<bool>, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_seq(BoolVecVisitor)
    }
}
