//! LAMBDIFICATION - turning symbolic expressions into numeric closures.
//!
//! Two flavours are provided:
//! - `lambdify_checked` builds a closure tree in which every node verifies that its
//!   value is a finite real number and reports the first offending operation as a
//!   [`DomainError`]. The Newton solver evaluates `F` and `J` through these closures.
//! - `eval_expression` walks the tree with plain `f64` arithmetic; NaN and infinity
//!   propagate silently. Handy for tests and quick checks.
use crate::error::{CompileError, DomainError};
use crate::symbolic::symbolic_engine::Expr;

/// Thread-safe compiled expression. The slice holds variable values in the order
/// given at compile time.
pub type CheckedFn = Box<dyn Fn(&[f64]) -> Result<f64, DomainError> + Send + Sync>;

fn overflow(operation: &'static str, lhs: f64, rhs: f64) -> DomainError {
    DomainError::Overflow { operation, lhs, rhs }
}

impl Expr {
    /// Compiles the expression for the variable ordering `vars`.
    ///
    /// # Errors
    /// `CompileError::UnknownVariable` if the expression references a name missing
    /// from `vars`.
    ///
    /// # Examples
    /// ```rust, ignore
    /// let f = parse("x1^2 + x2", &ParseContext::indexed(2, "x")).unwrap();
    /// let func = f.lambdify_checked(&["x1", "x2"]).unwrap();
    /// assert_eq!(func(&[3.0, 1.0]), Ok(10.0));
    /// ```
    pub fn lambdify_checked(&self, vars: &[&str]) -> Result<CheckedFn, CompileError> {
        let compiled: CheckedFn = match self {
            Expr::Var(name) => {
                let index = vars.iter().position(|&v| v == name).ok_or_else(|| {
                    CompileError::UnknownVariable { name: name.clone() }
                })?;
                Box::new(move |args| Ok(args[index]))
            }
            Expr::Const(val) => {
                let val = *val;
                Box::new(move |_| Ok(val))
            }
            Expr::NamedConst(c) => {
                let val = c.value();
                Box::new(move |_| Ok(val))
            }
            Expr::Add(lhs, rhs) => {
                let lf = lhs.lambdify_checked(vars)?;
                let rf = rhs.lambdify_checked(vars)?;
                Box::new(move |args| {
                    let (a, b) = (lf(args)?, rf(args)?);
                    let r = a + b;
                    if r.is_finite() { Ok(r) } else { Err(overflow("sum", a, b)) }
                })
            }
            Expr::Sub(lhs, rhs) => {
                let lf = lhs.lambdify_checked(vars)?;
                let rf = rhs.lambdify_checked(vars)?;
                Box::new(move |args| {
                    let (a, b) = (lf(args)?, rf(args)?);
                    let r = a - b;
                    if r.is_finite() { Ok(r) } else { Err(overflow("difference", a, b)) }
                })
            }
            Expr::Mul(lhs, rhs) => {
                let lf = lhs.lambdify_checked(vars)?;
                let rf = rhs.lambdify_checked(vars)?;
                Box::new(move |args| {
                    let (a, b) = (lf(args)?, rf(args)?);
                    let r = a * b;
                    if r.is_finite() { Ok(r) } else { Err(overflow("product", a, b)) }
                })
            }
            Expr::Div(lhs, rhs) => {
                let lf = lhs.lambdify_checked(vars)?;
                let rf = rhs.lambdify_checked(vars)?;
                Box::new(move |args| {
                    let (a, b) = (lf(args)?, rf(args)?);
                    if b == 0.0 {
                        return Err(DomainError::Division {
                            numerator: a,
                            denominator: b,
                        });
                    }
                    let r = a / b;
                    if r.is_finite() { Ok(r) } else { Err(overflow("quotient", a, b)) }
                })
            }
            Expr::Pow(base, exp) => {
                let bf = base.lambdify_checked(vars)?;
                let ef = exp.lambdify_checked(vars)?;
                Box::new(move |args| {
                    let (b, e) = (bf(args)?, ef(args)?);
                    let r = b.powf(e);
                    if r.is_finite() {
                        Ok(r)
                    } else {
                        Err(DomainError::Power {
                            base: b,
                            exponent: e,
                        })
                    }
                })
            }
            Expr::Func(func, arg) => {
                let func = *func;
                let f = arg.lambdify_checked(vars)?;
                Box::new(move |args| {
                    let argument = f(args)?;
                    let r = func.apply(argument);
                    if r.is_finite() {
                        Ok(r)
                    } else {
                        Err(DomainError::Function {
                            function: func,
                            argument,
                        })
                    }
                })
            }
        };
        Ok(compiled)
    } // end of lambdify_checked

    /// Direct evaluation without building closures. Unknown variables read as NaN.
    pub fn eval_expression(&self, vars: &[&str], values: &[f64]) -> f64 {
        match self {
            Expr::Var(name) => vars
                .iter()
                .position(|&v| v == name)
                .and_then(|i| values.get(i).copied())
                .unwrap_or(f64::NAN),
            Expr::Const(val) => *val,
            Expr::NamedConst(c) => c.value(),
            Expr::Add(lhs, rhs) => {
                lhs.eval_expression(vars, values) + rhs.eval_expression(vars, values)
            }
            Expr::Sub(lhs, rhs) => {
                lhs.eval_expression(vars, values) - rhs.eval_expression(vars, values)
            }
            Expr::Mul(lhs, rhs) => {
                lhs.eval_expression(vars, values) * rhs.eval_expression(vars, values)
            }
            Expr::Div(lhs, rhs) => {
                lhs.eval_expression(vars, values) / rhs.eval_expression(vars, values)
            }
            Expr::Pow(base, exp) => base
                .eval_expression(vars, values)
                .powf(exp.eval_expression(vars, values)),
            Expr::Func(func, arg) => func.apply(arg.eval_expression(vars, values)),
        }
    }
}
