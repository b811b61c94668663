use thiserror::Error;

/// Contract violations raised while building, reading or checking a challenge.
#[derive(Debug, Error)]
pub enum ChallengeError {
    #[error("Clause {clause} contains the literal 0")]
    ZeroLiteral { clause: usize },

    #[error(
        "Clause {clause} contains literal {literal} but only {num_variables} variables are declared"
    )]
    LiteralOutOfRange {
        clause: usize,
        literal: i32,
        num_variables: usize,
    },

    #[error("Invalid number of clauses. Expected: {expected}, Actual: {actual}")]
    ClauseCountMismatch { expected: usize, actual: usize },

    #[error("Invalid number of variables. Expected: {expected}, Actual: {actual}")]
    InvalidNumVariables { expected: usize, actual: usize },

    #[error("Clause '{0}' not satisfied")]
    Unsatisfied(usize),

    #[error("DIMACS header 'p cnf <variables> <clauses>' not found")]
    MissingHeader,

    #[error("Invalid DIMACS header: {0}")]
    InvalidHeader(String),

    #[error("Invalid literal `{token}` on line {line}")]
    InvalidLiteral { line: usize, token: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ChallengeError>;
