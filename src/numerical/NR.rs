//! Newton-Raphson solver for square systems of nonlinear equations.
//!
//! The engine (`newton_raphson`) works on anything implementing [`NonlinearSystem`]:
//! the symbolic [`Jacobian`] bundle built from parsed equations, or a pair of plain
//! closures wrapped in [`ClosureSystem`]. Each iteration solves `J·delta = -F` at the
//! current iterate, takes the full step and stops once the infinity norm of the step
//! drops below the tolerance.
//!
//!  Example#1
//! ```
//! use RustedNewton::numerical::NR::solve;
//! // the shortest way: equations over x1..xn and initial guesses as text
//! let solution = solve(&["x1^2 + x2^2 - 10", "x1 - x2 - 4"], &["1", "1"], 1e-9, 100).unwrap();
//! println!("x = {}, found in {} iterations", solution.x, solution.iterations);
//! ```
//! Example#2
//! ```
//! // or more verbose way with the session struct
//! use RustedNewton::numerical::NR::NR;
//! let mut NR_instanse = NR::new();
//! let vec_of_expressions = vec!["x^2+y^2-10".to_string(), "x-y-4".to_string()];
//! let values = vec!["x".to_string(), "y".to_string()];
//! NR_instanse
//!     .eq_generate_from_str(vec_of_expressions, Some(values), vec![1.0, 1.0], 1e-6, 100)
//!     .unwrap();
//! NR_instanse.main_loop().unwrap();
//! println!("result = {:?} \n", NR_instanse.get_result().unwrap().x);
//! ```
use crate::Utils::logger::{default_log_file_name, init_logger, parse_loglevel};
use crate::error::{Entry, EvalError, InputKind, SolveError};
use crate::symbolic::parse_expr::{ParseContext, parse, parse_constant};
use crate::symbolic::symbolic_engine::Expr;
use crate::symbolic::symbolic_functions::{EquationSystem, Jacobian};
use log::{debug, error, info, warn};
use nalgebra::{DMatrix, DVector};
use std::collections::HashMap;
use std::time::Instant;
use strum_macros::{Display, EnumIter, EnumString};
use tabled::{builder::Builder, settings::Style};

/// residual norms above `RESIDUAL_WARNING_FACTOR * tolerance` at a converged point are logged
pub const RESIDUAL_WARNING_FACTOR: f64 = 1e3;

/// A square system `F(x) = 0` that can be evaluated together with its Jacobian.
pub trait NonlinearSystem {
    /// number of equations (and unknowns)
    fn dim(&self) -> usize;
    fn residual(&self, x: &DVector<f64>) -> Result<DVector<f64>, EvalError>;
    fn jacobian(&self, x: &DVector<f64>) -> Result<DMatrix<f64>, EvalError>;
}

/// `F` and `J` given as plain closures.
pub struct ClosureSystem<F, J> {
    dim: usize,
    residual: F,
    jacobian: J,
}

impl<F, J> ClosureSystem<F, J>
where
    F: Fn(&DVector<f64>) -> Result<DVector<f64>, EvalError>,
    J: Fn(&DVector<f64>) -> Result<DMatrix<f64>, EvalError>,
{
    pub fn new(dim: usize, residual: F, jacobian: J) -> Self {
        Self {
            dim,
            residual,
            jacobian,
        }
    }
}

impl<F, J> NonlinearSystem for ClosureSystem<F, J>
where
    F: Fn(&DVector<f64>) -> Result<DVector<f64>, EvalError>,
    J: Fn(&DVector<f64>) -> Result<DMatrix<f64>, EvalError>,
{
    fn dim(&self) -> usize {
        self.dim
    }

    fn residual(&self, x: &DVector<f64>) -> Result<DVector<f64>, EvalError> {
        (self.residual)(x)
    }

    fn jacobian(&self, x: &DVector<f64>) -> Result<DMatrix<f64>, EvalError> {
        (self.jacobian)(x)
    }
}

/// Receives the iterate each Newton step starts from.
///
/// Closures `FnMut(usize, &DVector<f64>)` implement it, and `()` is a no-op observer.
pub trait IterationObserver {
    fn observe(&mut self, iteration: usize, x: &DVector<f64>);
}

impl<F> IterationObserver for F
where
    F: FnMut(usize, &DVector<f64>),
{
    fn observe(&mut self, iteration: usize, x: &DVector<f64>) {
        self(iteration, x)
    }
}

impl IterationObserver for () {
    fn observe(&mut self, _iteration: usize, _x: &DVector<f64>) {}
}

/// Dense solver used for the linear system of each step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString, EnumIter)]
#[strum(ascii_case_insensitive)]
pub enum LinearSolver {
    /// LU decomposition with partial pivoting
    #[default]
    #[strum(serialize = "lu")]
    Lu,
    /// explicit inverse
    #[strum(serialize = "inv")]
    Inverse,
}

impl LinearSolver {
    /// Solves `A·x = b`; `None` when `A` is singular.
    pub fn solve(self, A: &DMatrix<f64>, b: &DVector<f64>) -> Option<DVector<f64>> {
        match self {
            LinearSolver::Lu => A.clone().lu().solve(b),
            LinearSolver::Inverse => A.clone().try_inverse().map(|A_inv| A_inv * b),
        }
    }
}

/// Stopping rule and linear algebra of a solve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverParams {
    /// absolute tolerance on the infinity norm of the step
    pub tolerance: f64,
    pub max_iterations: usize,
    pub linear_solver: LinearSolver,
}

impl Default for SolverParams {
    fn default() -> Self {
        Self {
            tolerance: 1e-6,
            max_iterations: 100,
            linear_solver: LinearSolver::Lu,
        }
    }
}

impl SolverParams {
    pub fn new(tolerance: f64, max_iterations: usize) -> Self {
        Self {
            tolerance,
            max_iterations,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), SolveError> {
        if !(self.tolerance.is_finite() && self.tolerance > 0.0) {
            return Err(SolveError::invalid_parameter(format!(
                "tolerance must be a positive finite number, got {}",
                self.tolerance
            )));
        }
        if self.max_iterations == 0 {
            return Err(SolveError::invalid_parameter(
                "maximum number of iterations must be at least 1",
            ));
        }
        Ok(())
    }
}

/// Converged iterate and how it was reached.
#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    pub x: DVector<f64>,
    /// index of the iteration whose step met the tolerance
    pub iterations: usize,
    /// infinity norm of the last step
    pub step_norm: f64,
    /// infinity norm of `F` at `x`; `None` if `F` cannot be evaluated there
    pub residual_norm: Option<f64>,
    /// names of the unknowns, in the order of `x`
    pub variables: Vec<String>,
}

impl Solution {
    /// value of the unknown called `name`
    pub fn get(&self, name: &str) -> Option<f64> {
        self.variables
            .iter()
            .position(|v| v == name)
            .map(|i| self.x[i])
    }

    /// `(name, value)` pairs in solution order
    pub fn pairs(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.variables
            .iter()
            .map(|v| v.as_str())
            .zip(self.x.iter().copied())
    }
}

/////////////////////////////////////////////////////////////////////////////////////////////
//                ITERATIONS
/////////////////////////////////////////////////////////////////////////////////////////////

/// Newton-Raphson iterations from `x0`.
///
/// Iteration `k` evaluates `F` and `J` at `X_{k-1}`, solves `J·delta = -F`, sets
/// `X_k = X_{k-1} + delta` and converges when `max_i |delta_i| < tolerance`. The
/// observer sees `(k, X_{k-1})` at the start of every iteration.
///
/// # Errors
/// - `InvalidParameter` for a bad tolerance, `max_iterations == 0`, an empty system or
///   an initial guess of the wrong length, all before the first iteration
/// - `NumericDomain` when `F` or `J` has no finite real value at an iterate
/// - `SingularJacobian` when the linear system of a step cannot be solved
/// - `ExceededMaxIterations` when no step meets the tolerance
pub fn newton_raphson<S, O>(
    system: &S,
    x0: DVector<f64>,
    params: &SolverParams,
    mut observer: O,
) -> Result<Solution, SolveError>
where
    S: NonlinearSystem + ?Sized,
    O: IterationObserver,
{
    params.validate()?;
    let n = system.dim();
    if n == 0 {
        return Err(SolveError::invalid_parameter("system has no equations"));
    }
    if x0.len() != n {
        return Err(SolveError::invalid_parameter(format!(
            "initial guess has {} components but the system has {} unknowns",
            x0.len(),
            n
        )));
    }
    if let Some(i) = x0.iter().position(|v| !v.is_finite()) {
        return Err(SolveError::invalid_parameter(format!(
            "initial guess component {} is not a finite number",
            i + 1
        )));
    }
    let mut x = x0;
    let mut previous_norm: Option<f64> = None;
    for k in 1..=params.max_iterations {
        observer.observe(k, &x);
        let domain_error = |source: EvalError| {
            error!("iteration {}: {}", k, source);
            SolveError::NumericDomain {
                iteration: k,
                source,
            }
        };
        let F_val = system.residual(&x).map_err(domain_error)?;
        let J_val = system.jacobian(&x).map_err(domain_error)?;
        let delta = params
            .linear_solver
            .solve(&J_val, &(-F_val))
            .filter(|delta| delta.iter().all(|v| v.is_finite()))
            .ok_or_else(|| {
                error!("Jacobian is singular at iteration {}", k);
                SolveError::SingularJacobian { iteration: k }
            })?;
        x += &delta;
        let norm = delta.amax();
        debug!("iteration = {}, step norm = {:e}", k, norm);
        if let Some(previous) = previous_norm {
            if norm > previous {
                warn!("step norm is increasing: {:e} -> {:e}", previous, norm);
            }
        }
        previous_norm = Some(norm);
        if norm < params.tolerance {
            info!("converged in {} iterations, step norm = {:e}", k, norm);
            let residual_norm = residual_at_solution(system, &x, params.tolerance);
            let (_, variables) = Expr::IndexedVars(n, "x");
            return Ok(Solution {
                x,
                iterations: k,
                step_norm: norm,
                residual_norm,
                variables,
            });
        }
    }
    error!(
        "Maximum number of iterations ({}) reached. No solution found.",
        params.max_iterations
    );
    Err(SolveError::ExceededMaxIterations {
        max_iterations: params.max_iterations,
    })
}

/// Residual norm at an accepted point; a large value is only reported, never acted on.
fn residual_at_solution<S>(system: &S, x: &DVector<f64>, tolerance: f64) -> Option<f64>
where
    S: NonlinearSystem + ?Sized,
{
    match system.residual(x) {
        Ok(F_val) => {
            let norm = F_val.amax();
            if norm > RESIDUAL_WARNING_FACTOR * tolerance {
                warn!(
                    "step converged but residual norm {:e} exceeds {:e}",
                    norm,
                    RESIDUAL_WARNING_FACTOR * tolerance
                );
            }
            Some(norm)
        }
        Err(err) => {
            warn!("residual cannot be evaluated at the solution: {}", err);
            None
        }
    }
}

/// Solves `equations` over `x1..xn` from text initial guesses.
///
/// # Examples
/// ```
/// use RustedNewton::numerical::NR::solve;
/// let solution = solve(&["x1^2 - 4"], &["3"], 1e-9, 50).unwrap();
/// assert!((solution.x[0] - 2.0).abs() < 1e-9);
/// ```
pub fn solve(
    equations: &[&str],
    initial_guess: &[&str],
    tol: f64,
    n_max: usize,
) -> Result<Solution, SolveError> {
    let (_, names) = Expr::IndexedVars(equations.len(), "x");
    let variables: Vec<&str> = names.iter().map(|s| s.as_str()).collect();
    solve_with(
        equations,
        &variables,
        initial_guess,
        &SolverParams::new(tol, n_max),
        (),
    )
}

/// Like [`solve`] with caller-chosen unknowns (their order is the Jacobian column
/// order and the solution order), solver settings and an iteration observer.
pub fn solve_with<O: IterationObserver>(
    equations: &[&str],
    variables: &[&str],
    initial_guess: &[&str],
    params: &SolverParams,
    observer: O,
) -> Result<Solution, SolveError> {
    params.validate()?;
    if equations.is_empty() {
        return Err(SolveError::invalid_parameter("no equations given"));
    }
    if equations.len() != variables.len() {
        return Err(SolveError::DimensionMismatch {
            equations: equations.len(),
            variables: variables.len(),
        });
    }
    if initial_guess.len() != equations.len() {
        return Err(SolveError::invalid_parameter(format!(
            "{} initial guesses given for {} unknowns",
            initial_guess.len(),
            equations.len()
        )));
    }
    let context = ParseContext::with_variables(variables);
    let exprs = parse_equations(equations, &context)?;
    let x0 = evaluate_initial_guess(initial_guess)?;
    let variables: Vec<String> = variables.iter().map(|s| s.to_string()).collect();
    let jacobian = Jacobian::generate(exprs, variables.clone())?;
    let mut solution = newton_raphson(&jacobian, x0, params, observer)?;
    solution.variables = variables;
    Ok(solution)
}

/// Parses every equation, reporting the first failure with its index.
pub fn parse_equations(equations: &[&str], context: &ParseContext) -> Result<Vec<Expr>, SolveError> {
    equations
        .iter()
        .enumerate()
        .map(|(index, text)| {
            parse(text, context).map_err(|source| SolveError::Syntax {
                input: InputKind::Equation,
                index,
                source,
            })
        })
        .collect()
}

/// Evaluates initial guesses written in the constant grammar (`pi/4`, `-e`, `2.5`).
pub fn evaluate_initial_guess(initial_guess: &[&str]) -> Result<DVector<f64>, SolveError> {
    let mut values = Vec::with_capacity(initial_guess.len());
    for (index, text) in initial_guess.iter().enumerate() {
        let expr = parse_constant(text).map_err(|source| SolveError::Syntax {
            input: InputKind::InitialGuess,
            index,
            source,
        })?;
        let compiled = expr.lambdify_checked(&[])?;
        let value = compiled(&[]).map_err(|source| SolveError::NumericDomain {
            iteration: 0,
            source: EvalError::new(Entry::InitialGuess(index), source),
        })?;
        values.push(value);
    }
    Ok(DVector::from_vec(values))
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
//                                       session struct with logging and statistics
////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub struct NR {
    pub jacobian: Option<Jacobian>, // equations and jacobian compiled into rust functions
    pub eq_system: Vec<Expr>,       // vector of equations
    pub values: Vec<String>,        // vector of variables
    pub initial_guess: Vec<f64>,    // initial guess
    pub params: SolverParams,       // tolerance, max number of iterations, linear solver
    pub i: usize,                   // iteration counter
    pub result: Option<Solution>,   // result of the iterations
    pub loglevel: Option<String>,
    pub log_file: Option<String>,
    calc_statistics: HashMap<String, usize>,
}

impl Default for NR {
    fn default() -> Self {
        Self::new()
    }
}

impl NR {
    pub fn new() -> NR {
        NR {
            jacobian: None,
            eq_system: Vec::new(),
            values: Vec::new(),
            initial_guess: Vec::new(),
            params: SolverParams::default(),
            i: 0,
            result: None,
            loglevel: Some("info".to_string()),
            log_file: None,
            calc_statistics: HashMap::new(),
        }
    }
    ////////////////////////////SETTERS///////////////////////////////////////////////////////////////////
    /// Basic methods to set the equation system
    ///
    /// Without `unknowns` the variables found in the equations are used, ordered so
    /// that `x2` precedes `x10`.
    pub fn set_equation_system(
        &mut self,
        eq_system: Vec<Expr>,
        unknowns: Option<Vec<String>>,
        initial_guess: Vec<f64>,
        tolerance: f64,
        max_iterations: usize,
    ) -> Result<(), SolveError> {
        let values = match unknowns {
            Some(values) => values,
            None => EquationSystem::new(eq_system.clone()).variables(),
        };
        if values.len() != eq_system.len() {
            return Err(SolveError::DimensionMismatch {
                equations: eq_system.len(),
                variables: values.len(),
            });
        }
        let params = SolverParams {
            tolerance,
            max_iterations,
            linear_solver: self.params.linear_solver,
        };
        params.validate()?;
        if initial_guess.len() != values.len() {
            return Err(SolveError::invalid_parameter(format!(
                "{} initial guesses given for {} unknowns",
                initial_guess.len(),
                values.len()
            )));
        }
        self.eq_system = eq_system;
        self.values = values;
        self.initial_guess = initial_guess;
        self.params = params;
        Ok(())
    }

    /// Parses the equations and builds the jacobian. Without `unknowns` the
    /// variables are `x1..xn`.
    pub fn eq_generate_from_str(
        &mut self,
        eq_system_string: Vec<String>,
        unknowns: Option<Vec<String>>,
        initial_guess: Vec<f64>,
        tolerance: f64,
        max_iterations: usize,
    ) -> Result<(), SolveError> {
        let unknowns =
            unknowns.unwrap_or_else(|| Expr::IndexedVars(eq_system_string.len(), "x").1);
        let names: Vec<&str> = unknowns.iter().map(|s| s.as_str()).collect();
        let context = ParseContext::with_variables(&names);
        let texts: Vec<&str> = eq_system_string.iter().map(|s| s.as_str()).collect();
        let eq_system = parse_equations(&texts, &context)?;
        self.set_equation_system(
            eq_system,
            Some(unknowns),
            initial_guess,
            tolerance,
            max_iterations,
        )?;
        self.eq_generate()
    }

    pub fn set_solver_params(
        &mut self,
        loglevel: Option<String>,
        linear_sys_method: Option<String>,
    ) -> Result<(), SolveError> {
        if let Some(level) = loglevel {
            if parse_loglevel(&level).is_none() {
                return Err(SolveError::invalid_parameter(format!(
                    "loglevel must be debug, info, warn, error, off or none, got '{}'",
                    level
                )));
            }
            self.loglevel = Some(level);
        }
        if let Some(method) = linear_sys_method {
            self.params.linear_solver = method.parse::<LinearSolver>().map_err(|_| {
                SolveError::invalid_parameter(format!(
                    "linear_sys_method must be lu or inv, got '{}'",
                    method
                ))
            })?;
        }
        Ok(())
    }

    /// write the log into `log_file`; `None` picks a timestamped name
    pub fn set_log_file(&mut self, log_file: Option<String>) {
        self.log_file = Some(log_file.unwrap_or_else(default_log_file_name));
    }

    ///Set system of equations with vector of symbolic expressions
    pub fn eq_generate(&mut self) -> Result<(), SolveError> {
        let jacobian = Jacobian::generate(self.eq_system.clone(), self.values.clone())?;
        self.jacobian = Some(jacobian);
        Ok(())
    }

    /// main function to solve the system of equations
    pub fn main_loop(&mut self) -> Result<Solution, SolveError> {
        if self.jacobian.is_none() {
            self.eq_generate()?;
        }
        let Some(jacobian) = self.jacobian.as_ref() else {
            return Err(SolveError::invalid_parameter("equation system is not set"));
        };
        let x0 = DVector::from_vec(self.initial_guess.clone());
        self.i = 0;
        let counter = &mut self.i;
        let result = newton_raphson(jacobian, x0, &self.params, |k: usize, _x: &DVector<f64>| {
            *counter = k
        });
        let result = result.map(|mut solution| {
            solution.variables = self.values.clone();
            solution
        });
        self.result = result.as_ref().ok().cloned();
        result
    }
    ////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
    //                                       main functions to start the solver and caclulate statistics
    ////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

    pub fn solver(&mut self) -> Result<Solution, SolveError> {
        let begin = Instant::now();
        self.eq_generate()?;
        let symbolic_time = begin.elapsed();
        let res = self.main_loop();
        let end = begin.elapsed();
        info!("elapsed time: {:?}", end);
        self.calc_statistics.insert(
            "symbolic operations, ms".to_string(),
            symbolic_time.as_millis() as usize,
        );
        self.calc_statistics
            .insert("time elapsed, ms".to_string(), end.as_millis() as usize);
        self.calc_statistics();
        res
    }

    // wrapper around solver function to implement logging
    pub fn solve(&mut self) -> Result<Solution, SolveError> {
        let level = self
            .loglevel
            .as_deref()
            .and_then(parse_loglevel)
            .unwrap_or(simplelog::LevelFilter::Info);
        match init_logger(level, self.log_file.as_deref()) {
            Ok(()) => info!("Program started with loglevel: {}", level),
            Err(err) => warn!("logger not installed: {}", err),
        }
        let res = self.solver();
        info!("Program ended");
        res
    }

    pub fn get_result(&self) -> Option<Solution> {
        self.result.clone()
    }

    fn calc_statistics(&self) {
        let mut stats = self.calc_statistics.clone();
        let n = self.values.len();
        stats.insert("number of jacobian elements".to_string(), n * n);
        stats.insert("length of x vector".to_string(), n);
        stats.insert("number of iterations".to_string(), self.i);
        let mut table = Builder::from(stats).build();
        table.with(Style::modern_rounded());
        info!("\n \n CALC STATISTICS \n \n {}", table);
    }
}
