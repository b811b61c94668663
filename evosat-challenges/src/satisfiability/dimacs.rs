use super::Challenge;
use crate::error::{ChallengeError, Result};
use std::fmt::Write;
use std::io::{BufRead, BufReader, Read};

impl Challenge {
    /// Parses a DIMACS CNF document.
    ///
    /// Clauses are `0`-terminated and may span lines. A line starting with `%`
    /// ends the formula.
    pub fn from_dimacs(input: &str) -> Result<Self> {
        Self::from_dimacs_reader(input.as_bytes())
    }

    pub fn from_dimacs_reader<R: Read>(reader: R) -> Result<Self> {
        let reader = BufReader::new(reader);
        let mut header: Option<(usize, usize)> = None;
        let mut clauses = Vec::new();
        let mut clause = Vec::new();

        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            let line = line.trim();

            if line.is_empty() || line.starts_with('c') {
                continue;
            }
            if line.starts_with('%') {
                break;
            }
            if line.starts_with('p') {
                let (num_variables, num_clauses) = parse_header(line)?;
                clauses.reserve(num_clauses);
                header = Some((num_variables, num_clauses));
                continue;
            }
            if header.is_none() {
                return Err(ChallengeError::MissingHeader);
            }

            for token in line.split_whitespace() {
                let literal: i32 = token.parse().map_err(|_| ChallengeError::InvalidLiteral {
                    line: idx + 1,
                    token: token.to_string(),
                })?;
                if literal == 0 {
                    clauses.push(std::mem::take(&mut clause));
                } else {
                    clause.push(literal);
                }
            }
        }

        let (num_variables, num_clauses) = header.ok_or(ChallengeError::MissingHeader)?;
        // tolerate a missing terminator on the last clause
        if !clause.is_empty() {
            clauses.push(clause);
        }

        Challenge::new(num_variables, clauses, Some(num_clauses))
    }

    pub fn to_dimacs(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "p cnf {} {}", self.num_variables(), self.num_clauses());
        for clause in self.clauses() {
            for literal in clause {
                let _ = write!(out, "{} ", literal);
            }
            out.push_str("0\n");
        }
        out
    }
}

/// Parses "p cnf <num_variables> <num_clauses>".
fn parse_header(line: &str) -> Result<(usize, usize)> {
    let mut it = line.split_whitespace();
    match (it.next(), it.next(), it.next(), it.next(), it.next()) {
        (Some("p"), Some("cnf"), Some(v), Some(c), None) => {
            let num_variables = v
                .parse::<usize>()
                .map_err(|e| ChallengeError::InvalidHeader(format!("num_variables: {e}")))?;
            let num_clauses = c
                .parse::<usize>()
                .map_err(|e| ChallengeError::InvalidHeader(format!("num_clauses: {e}")))?;
            Ok((num_variables, num_clauses))
        }
        _ => Err(ChallengeError::InvalidHeader(line.to_string())),
    }
}
