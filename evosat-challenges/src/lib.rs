pub mod error;
pub use error::ChallengeError;

pub mod satisfiability;
