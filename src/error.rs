//! Error kinds reported by the parser, the numeric evaluator and the Newton solver.
//!
//! Every failure the core can produce is a distinct variant so that callers (the
//! console front end, tests, other crates) branch on the kind instead of parsing
//! messages.
use std::fmt;

use thiserror::Error;

use crate::symbolic::symbolic_engine::ElemFn;

/// Malformed equation or value text.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("syntax error at position {position} in '{text}': {message}")]
pub struct SyntaxError {
    /// the text that failed to parse
    pub text: String,
    /// 0-based character offset of the offending token
    pub position: usize,
    pub message: String,
}

impl SyntaxError {
    pub fn new(text: &str, position: usize, message: impl Into<String>) -> Self {
        Self {
            text: text.to_string(),
            position,
            message: message.into(),
        }
    }
}

/// A single operation produced a value that is not a finite real number.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DomainError {
    #[error("{function}({argument}) is not a finite real number")]
    Function { function: ElemFn, argument: f64 },

    #[error("{numerator} / {denominator} is undefined")]
    Division { numerator: f64, denominator: f64 },

    #[error("{base} ^ {exponent} is not a finite real number")]
    Power { base: f64, exponent: f64 },

    #[error("{operation} of {lhs} and {rhs} overflows")]
    Overflow {
        operation: &'static str,
        lhs: f64,
        rhs: f64,
    },
}

/// Position of an evaluated quantity inside the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entry {
    /// equation `F_i` (0-based)
    Residual(usize),
    /// Jacobian entry `(i, j)` (0-based)
    Jacobian(usize, usize),
    /// component `i` of the initial guess (0-based)
    InitialGuess(usize),
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Entry::Residual(i) => write!(f, "F_{}", i + 1),
            Entry::Jacobian(i, j) => write!(f, "J_({},{})", i + 1, j + 1),
            Entry::InitialGuess(i) => write!(f, "initial guess for x{}", i + 1),
        }
    }
}

/// Domain failure located at a particular entry of `F`, `J` or the initial guess.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{entry}: {source}")]
pub struct EvalError {
    pub entry: Entry,
    #[source]
    pub source: DomainError,
}

impl EvalError {
    pub fn new(entry: Entry, source: DomainError) -> Self {
        Self { entry, source }
    }
}

/// Failure while turning an expression into a numeric callable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    #[error("variable '{name}' is not in the variable ordering")]
    UnknownVariable { name: String },
}

/// Which piece of user input a syntax error belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Equation,
    InitialGuess,
}

impl fmt::Display for InputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputKind::Equation => write!(f, "equation"),
            InputKind::InitialGuess => write!(f, "initial guess"),
        }
    }
}

/// Every way a solve attempt can fail.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SolveError {
    #[error("{input} {pos} could not be parsed: {source}", pos = .index + 1)]
    Syntax {
        input: InputKind,
        /// 0-based index of the equation or guess
        index: usize,
        #[source]
        source: SyntaxError,
    },

    #[error("{equations} equations given for {variables} unknowns")]
    DimensionMismatch { equations: usize, variables: usize },

    #[error("invalid parameter: {reason}")]
    InvalidParameter { reason: String },

    #[error("non-real value at iteration {iteration}: {source}")]
    NumericDomain {
        /// 0 when the initial guess itself could not be evaluated
        iteration: usize,
        #[source]
        source: EvalError,
    },

    #[error("Jacobian is singular at iteration {iteration}")]
    SingularJacobian { iteration: usize },

    #[error("no convergence within {max_iterations} iterations")]
    ExceededMaxIterations { max_iterations: usize },

    #[error("variable '{name}' is not among the declared unknowns")]
    UnknownVariable { name: String },
}

impl SolveError {
    pub fn invalid_parameter(reason: impl Into<String>) -> Self {
        SolveError::InvalidParameter {
            reason: reason.into(),
        }
    }
}

impl From<CompileError> for SolveError {
    fn from(err: CompileError) -> Self {
        match err {
            CompileError::UnknownVariable { name } => SolveError::UnknownVariable { name },
        }
    }
}

/// Problems found while reading a task file.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TaskError {
    #[error("malformed task document near: '{remaining}'")]
    Malformed { remaining: String },

    #[error("unknown key '{key}'")]
    UnknownKey { key: String },

    #[error("required key '{key}' is missing")]
    MissingKey { key: &'static str },

    #[error("key '{key}' given more than once")]
    DuplicateKey { key: String },

    #[error("invalid value '{value}' for key '{key}'")]
    InvalidValue { key: String, value: String },

    #[error("cannot read task file {path}: {reason}")]
    Io { path: String, reason: String },
}

/// Logger installation failures.
#[derive(Debug, Error)]
pub enum LogError {
    #[error("cannot create log file {path}: {source}")]
    File {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("a global logger is already installed")]
    AlreadyInstalled,
}
