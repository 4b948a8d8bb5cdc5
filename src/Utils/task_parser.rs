//! parse a task document with one `key: value` pair per line into a [`NewtonTask`]
//!
//! ```text
//! // comment lines start with //, #, % or ;
//! unknowns: x, y
//! equation: x^2 + y^2 - 10
//! equation: x - y - 4
//! guess: 1, pi/4
//! tolerance: 1e-9
//! max_iterations: 50
//! method: lu
//! loglevel: info
//! log_file: run.log
//! ```
//! `equation` may be repeated and keeps its order; every other key is given at most once.
//! `equation` and `guess` are required, the rest falls back to the solver defaults.
use crate::Utils::logger::parse_loglevel;
use crate::error::{SolveError, TaskError};
use crate::numerical::NR::{LinearSolver, NR, SolverParams, evaluate_initial_guess};
use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{tag, take_while1},
    character::complete::{alpha1, alphanumeric1, multispace0, not_line_ending, space0},
    combinator::{map, recognize},
    multi::{many0, separated_list1},
    sequence::{delimited, pair, separated_pair},
};
use std::collections::HashSet;
use std::path::Path;

const KEYS: [&str; 8] = [
    "unknowns",
    "equation",
    "guess",
    "tolerance",
    "max_iterations",
    "method",
    "loglevel",
    "log_file",
];

/// Everything needed to start a solve, read from a task document.
#[derive(Debug, Clone, PartialEq)]
pub struct NewtonTask {
    /// `None` means `x1..xn`
    pub unknowns: Option<Vec<String>>,
    pub equations: Vec<String>,
    /// initial guesses in the constant grammar, evaluated at solve time
    pub guess: Vec<String>,
    pub params: SolverParams,
    pub loglevel: Option<String>,
    pub log_file: Option<String>,
}

/// Parses a key (word characters without spaces)
pub fn parse_key(input: &str) -> IResult<&str, String> {
    let parser = recognize(pair(
        alt((alpha1, tag("_"))),
        many0(alt((alphanumeric1, tag("_")))),
    ));
    let mut parser = map(parser, String::from);
    parser.parse(input)
}

/// `key: rest of the line`
pub fn parse_key_value_pair(input: &str) -> IResult<&str, (String, String)> {
    let colon_separator = delimited(space0, tag(":"), space0);
    let value = map(not_line_ending, |s: &str| s.trim().to_string());
    let mut parser = separated_pair(parse_key, colon_separator, value);
    parser.parse(input)
}

/// comma separated items of a single value
pub fn parse_value_list(input: &str) -> IResult<&str, Vec<String>> {
    let separator_coma = delimited(space0, tag(","), space0);
    let item = map(take_while1(|c: char| c != ','), |s: &str| s.trim().to_string());
    let mut parser = separated_list1(separator_coma, item);
    parser.parse(input)
}

/// Filters out comment lines (starting with //, #, %, or ;)
pub fn filter_comments(input: &str) -> String {
    input
        .lines()
        .filter(|line| {
            let trimmed = line.trim();
            !trimmed.starts_with("//")
                && !trimmed.starts_with('#')
                && !trimmed.starts_with('%')
                && !trimmed.starts_with(';')
                && !trimmed.is_empty()
        })
        .collect::<Vec<&str>>()
        .join("\n")
}

/// Splits the document into `(key, value)` lines in document order.
pub fn parse_document(input: &str) -> Result<Vec<(String, String)>, TaskError> {
    let filtered = filter_comments(input);
    let mut parser = many0(delimited(multispace0, parse_key_value_pair, space0));
    match parser.parse(filtered.as_str()) {
        Ok((remaining, pairs)) => {
            if !remaining.trim().is_empty() {
                return Err(TaskError::Malformed {
                    remaining: remaining.trim().to_string(),
                });
            }
            Ok(pairs)
        }
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => Err(TaskError::Malformed {
            remaining: e.input.trim().to_string(),
        }),
        Err(nom::Err::Incomplete(_)) => Err(TaskError::Malformed {
            remaining: filtered.clone(),
        }),
    }
}

fn invalid(key: &str, value: &str) -> TaskError {
    TaskError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    }
}

fn value_list(key: &str, value: &str) -> Result<Vec<String>, TaskError> {
    match parse_value_list(value) {
        Ok((rest, items)) if rest.trim().is_empty() && items.iter().all(|s| !s.is_empty()) => {
            Ok(items)
        }
        _ => Err(invalid(key, value)),
    }
}

impl NewtonTask {
    /// Reads a task document.
    pub fn parse(input: &str) -> Result<Self, TaskError> {
        let pairs = parse_document(input)?;
        let mut seen: HashSet<String> = HashSet::new();
        let mut task = NewtonTask {
            unknowns: None,
            equations: Vec::new(),
            guess: Vec::new(),
            params: SolverParams::default(),
            loglevel: None,
            log_file: None,
        };
        for (key, value) in pairs {
            if !KEYS.contains(&key.as_str()) {
                return Err(TaskError::UnknownKey { key });
            }
            if key != "equation" && !seen.insert(key.clone()) {
                return Err(TaskError::DuplicateKey { key });
            }
            if value.is_empty() {
                return Err(invalid(&key, &value));
            }
            match key.as_str() {
                "unknowns" => task.unknowns = Some(value_list(&key, &value)?),
                "equation" => task.equations.push(value),
                "guess" => task.guess = value_list(&key, &value)?,
                "tolerance" => {
                    task.params.tolerance = value
                        .parse::<f64>()
                        .ok()
                        .filter(|tol| tol.is_finite() && *tol > 0.0)
                        .ok_or_else(|| invalid(&key, &value))?;
                }
                "max_iterations" => {
                    task.params.max_iterations = value
                        .parse::<usize>()
                        .ok()
                        .filter(|n| *n > 0)
                        .ok_or_else(|| invalid(&key, &value))?;
                }
                "method" => {
                    task.params.linear_solver = value
                        .parse::<LinearSolver>()
                        .map_err(|_| invalid(&key, &value))?;
                }
                "loglevel" => {
                    if parse_loglevel(&value).is_none() {
                        return Err(invalid(&key, &value));
                    }
                    task.loglevel = Some(value);
                }
                _ => task.log_file = Some(value),
            }
        }
        if task.equations.is_empty() {
            return Err(TaskError::MissingKey { key: "equation" });
        }
        if !seen.contains("guess") {
            return Err(TaskError::MissingKey { key: "guess" });
        }
        Ok(task)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, TaskError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| TaskError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::parse(&text)
    }

    /// Builds a ready-to-run session: guesses evaluated, Jacobian generated,
    /// linear solver and logging configured.
    pub fn into_session(self) -> Result<NR, SolveError> {
        let guess: Vec<&str> = self.guess.iter().map(|s| s.as_str()).collect();
        let x0 = evaluate_initial_guess(&guess)?;
        let mut session = NR::new();
        session.set_solver_params(self.loglevel, Some(self.params.linear_solver.to_string()))?;
        if self.log_file.is_some() {
            session.set_log_file(self.log_file);
        }
        session.eq_generate_from_str(
            self.equations,
            self.unknowns,
            x0.iter().copied().collect(),
            self.params.tolerance,
            self.params.max_iterations,
        )?;
        Ok(session)
    }
}
