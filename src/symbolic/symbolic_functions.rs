#![allow(non_camel_case_types)]

use crate::error::{CompileError, Entry, EvalError, SolveError};
use crate::numerical::NR::NonlinearSystem;
use crate::symbolic::symbolic_engine::{Expr, natural_key};
use crate::symbolic::symbolic_lambdify::CheckedFn;
use log::debug;
use nalgebra::{DMatrix, DVector};

use rayon::prelude::*;

/// Ordered vector of equations `F_i(x) = 0`.
#[derive(Debug, Clone, PartialEq)]
pub struct EquationSystem {
    equations: Vec<Expr>,
}

impl EquationSystem {
    pub fn new(equations: Vec<Expr>) -> Self {
        Self { equations }
    }

    pub fn equations(&self) -> &[Expr] {
        &self.equations
    }

    pub fn len(&self) -> usize {
        self.equations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.equations.is_empty()
    }

    /// All variables used by the equations, `x2` before `x10`.
    pub fn variables(&self) -> Vec<String> {
        let mut args: Vec<String> = self
            .equations
            .iter()
            .flat_map(|eq| eq.all_arguments_are_variables())
            .collect();
        args.sort_by(|a, b| natural_key(a).cmp(&natural_key(b)));
        args.dedup();
        args
    }

    /// calculate the symbolic jacobian in parallel
    ///
    /// Column `j` holds the derivatives with respect to `variables[j]`.
    pub fn jacobian(&self, variables: &[String]) -> Result<JacobianMatrix, SolveError> {
        if self.equations.len() != variables.len() {
            return Err(SolveError::DimensionMismatch {
                equations: self.equations.len(),
                variables: variables.len(),
            });
        }
        let entries: Vec<Vec<Expr>> = self
            .equations
            .par_iter()
            .map(|func| {
                variables
                    .par_iter()
                    .map(|var| func.diff(var).simplify())
                    .collect()
            })
            .collect();
        Ok(JacobianMatrix {
            entries,
            variables: variables.to_vec(),
        })
    }

    /// Compiles `F` for the given variable ordering.
    pub fn lambdify(&self, variables: &[String]) -> Result<CompiledVector, CompileError> {
        let vars: Vec<&str> = variables.iter().map(|s| s.as_str()).collect();
        let functions = self
            .equations
            .iter()
            .map(|eq| eq.lambdify_checked(&vars))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(CompiledVector { functions })
    }
}

/// Symbolic `n×n` matrix of partial derivatives `∂F_i/∂x_j`.
#[derive(Debug, Clone, PartialEq)]
pub struct JacobianMatrix {
    entries: Vec<Vec<Expr>>,
    variables: Vec<String>,
}

impl JacobianMatrix {
    pub fn dim(&self) -> usize {
        self.entries.len()
    }

    pub fn entry(&self, i: usize, j: usize) -> &Expr {
        &self.entries[i][j]
    }

    pub fn variables(&self) -> &[String] {
        &self.variables
    }

    /// turn jacobian into readable format
    pub fn readable(&self) -> Vec<Vec<String>> {
        self.entries
            .iter()
            .map(|row| row.iter().map(|e| e.to_string()).collect())
            .collect()
    }

    /// Compiles every entry against the ordering the matrix was built with.
    pub fn lambdify(&self) -> Result<CompiledMatrix, CompileError> {
        let vars: Vec<&str> = self.variables.iter().map(|s| s.as_str()).collect();
        let entries = self
            .entries
            .iter()
            .flatten()
            .map(|e| e.lambdify_checked(&vars))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(CompiledMatrix {
            dim: self.dim(),
            entries,
        })
    }
}

/// Compiled residual vector `F`.
pub struct CompiledVector {
    functions: Vec<CheckedFn>,
}

impl CompiledVector {
    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    pub fn call(&self, x: &DVector<f64>) -> Result<DVector<f64>, EvalError> {
        let args = x.as_slice();
        let values = self
            .functions
            .iter()
            .enumerate()
            .map(|(i, f)| f(args).map_err(|e| EvalError::new(Entry::Residual(i), e)))
            .collect::<Result<Vec<f64>, _>>()?;
        Ok(DVector::from_vec(values))
    }
}

/// Compiled Jacobian, entries stored row by row.
pub struct CompiledMatrix {
    dim: usize,
    entries: Vec<CheckedFn>,
}

impl CompiledMatrix {
    pub fn call(&self, x: &DVector<f64>) -> Result<DMatrix<f64>, EvalError> {
        let args = x.as_slice();
        let mut values = Vec::with_capacity(self.entries.len());
        for (k, f) in self.entries.iter().enumerate() {
            let (i, j) = (k / self.dim, k % self.dim);
            values.push(f(args).map_err(|e| EvalError::new(Entry::Jacobian(i, j), e))?);
        }
        Ok(DMatrix::from_row_slice(self.dim, self.dim, &values))
    }
}

///
/// calculate symbolic jacobian and compile it together with the equations
/// Example#
/// ```
/// use RustedNewton::symbolic::parse_expr::{parse, ParseContext};
/// use RustedNewton::symbolic::symbolic_functions::Jacobian;
/// let context = ParseContext::indexed(2, "x");
/// let equations = vec![
///     parse("x1^2 + x2 - 5", &context).unwrap(),
///     parse("x1 x2 - 2", &context).unwrap(),
/// ];
/// let jacobian = Jacobian::generate(equations, context.variables().to_vec()).unwrap();
/// println!("J = {:?}", jacobian.symbolic_jacobian.readable());
/// ```
pub struct Jacobian {
    pub system: EquationSystem,
    pub symbolic_jacobian: JacobianMatrix,
    pub variables: Vec<String>,
    residual_fn: CompiledVector,
    jacobian_fn: CompiledMatrix,
}

impl Jacobian {
    /// Differentiates and compiles `equations` for the ordering `variables`.
    pub fn generate(equations: Vec<Expr>, variables: Vec<String>) -> Result<Self, SolveError> {
        let system = EquationSystem::new(equations);
        let symbolic_jacobian = system.jacobian(&variables)?;
        debug!("symbolic jacobian: {:?}", symbolic_jacobian.readable());
        let residual_fn = system.lambdify(&variables)?;
        let jacobian_fn = symbolic_jacobian.lambdify()?;
        Ok(Self {
            system,
            symbolic_jacobian,
            variables,
            residual_fn,
            jacobian_fn,
        })
    }
}

impl NonlinearSystem for Jacobian {
    fn dim(&self) -> usize {
        self.residual_fn.len()
    }

    fn residual(&self, x: &DVector<f64>) -> Result<DVector<f64>, EvalError> {
        self.residual_fn.call(x)
    }

    fn jacobian(&self, x: &DVector<f64>) -> Result<DMatrix<f64>, EvalError> {
        self.jacobian_fn.call(x)
    }
}
