//! # Symbolic Engine Derivatives Module
//!
//! Analytical differentiation of [`Expr`] trees. The result of `diff` is a raw tree
//! produced by the textbook rules; run it through `simplify()` before printing or
//! compiling it.
//!
//! ## Rules
//! 1. **Sums, products, quotients**: linearity, product rule and quotient rule
//! 2. **Powers**: three cases depending on where the variable occurs
//!    - only in the base: `d(u^c) = c*u^(c-1)*u'`
//!    - only in the exponent: `d(c^v) = c^v*ln(c)*v'`
//!    - in both: `d(u^v) = u^v*(v'*ln(u) + v*u'/u)`
//! 3. **Chain rule** for every elementary function

use crate::symbolic::symbolic_engine::{ElemFn, Expr};

impl Expr {
    /// DIFFERENTIATION

    /// Computes the analytical derivative of the expression with respect to a variable.
    ///
    /// Variables other than `var` and named constants are treated as constants.
    ///
    /// # Examples
    /// ```rust, ignore
    /// let x = Expr::Var("x".to_string());
    /// let f = x.clone().pow(Expr::Const(2.0)); // x^2
    /// let df_dx = f.diff("x").simplify(); // 2*x
    /// ```
    pub fn diff(&self, var: &str) -> Expr {
        match self {
            Expr::Var(name) => {
                if name == var {
                    Expr::Const(1.0)
                } else {
                    Expr::Const(0.0)
                }
            }
            Expr::Const(_) | Expr::NamedConst(_) => Expr::Const(0.0),
            Expr::Add(lhs, rhs) => Expr::Add(Box::new(lhs.diff(var)), Box::new(rhs.diff(var))),
            Expr::Sub(lhs, rhs) => Expr::Sub(Box::new(lhs.diff(var)), Box::new(rhs.diff(var))),
            Expr::Mul(lhs, rhs) => Expr::Add(
                Box::new(Expr::Mul(Box::new(lhs.diff(var)), rhs.clone())),
                Box::new(Expr::Mul(lhs.clone(), Box::new(rhs.diff(var)))),
            ),
            Expr::Div(lhs, rhs) => Expr::Div(
                Box::new(Expr::Sub(
                    Box::new(Expr::Mul(Box::new(lhs.diff(var)), rhs.clone())),
                    Box::new(Expr::Mul(lhs.clone(), Box::new(rhs.diff(var)))),
                )),
                Box::new(Expr::Pow(rhs.clone(), Box::new(Expr::Const(2.0)))),
            ),
            Expr::Pow(base, exp) => {
                let base_depends = base.contains_variable(var);
                let exp_depends = exp.contains_variable(var);
                match (base_depends, exp_depends) {
                    (_, false) => Expr::Mul(
                        Box::new(Expr::Mul(
                            exp.clone(),
                            Box::new(Expr::Pow(
                                base.clone(),
                                Box::new(Expr::Sub(exp.clone(), Box::new(Expr::Const(1.0)))),
                            )),
                        )),
                        Box::new(base.diff(var)),
                    ),
                    (false, true) => Expr::Mul(
                        Box::new(Expr::Mul(
                            Box::new(self.clone()),
                            Box::new(Expr::Func(ElemFn::Ln, base.clone())),
                        )),
                        Box::new(exp.diff(var)),
                    ),
                    (true, true) => Expr::Mul(
                        Box::new(self.clone()),
                        Box::new(Expr::Add(
                            Box::new(Expr::Mul(
                                Box::new(exp.diff(var)),
                                Box::new(Expr::Func(ElemFn::Ln, base.clone())),
                            )),
                            Box::new(Expr::Div(
                                Box::new(Expr::Mul(exp.clone(), Box::new(base.diff(var)))),
                                base.clone(),
                            )),
                        )),
                    ),
                }
            }
            Expr::Func(func, arg) => {
                Expr::Mul(Box::new(func.derivative_at(arg)), Box::new(arg.diff(var)))
            }
        }
    } // end of diff
}

impl ElemFn {
    /// `f'(u)` as an expression in `u`; the caller multiplies by `u'`.
    pub fn derivative_at(self, arg: &Expr) -> Expr {
        let u = || Box::new(arg.clone());
        let two = || Box::new(Expr::Const(2.0));
        let one = || Box::new(Expr::Const(1.0));
        let one_minus_u2 = || {
            Box::new(Expr::Sub(one(), Box::new(Expr::Pow(u(), two()))))
        };
        let one_plus_u2 = || Box::new(Expr::Add(one(), Box::new(Expr::Pow(u(), two()))));
        match self {
            ElemFn::Exp => Expr::Func(ElemFn::Exp, u()),
            ElemFn::Ln => Expr::Div(one(), u()),
            ElemFn::Sqrt => Expr::Div(
                one(),
                Box::new(Expr::Mul(two(), Box::new(Expr::Func(ElemFn::Sqrt, u())))),
            ),
            ElemFn::Sin => Expr::Func(ElemFn::Cos, u()),
            ElemFn::Cos => Expr::Mul(
                Box::new(Expr::Const(-1.0)),
                Box::new(Expr::Func(ElemFn::Sin, u())),
            ),
            ElemFn::Tan => Expr::Div(
                one(),
                Box::new(Expr::Pow(Box::new(Expr::Func(ElemFn::Cos, u())), two())),
            ),
            ElemFn::Cot => Expr::Div(
                Box::new(Expr::Const(-1.0)),
                Box::new(Expr::Pow(Box::new(Expr::Func(ElemFn::Sin, u())), two())),
            ),
            ElemFn::Asin => Expr::Div(
                one(),
                Box::new(Expr::Pow(one_minus_u2(), Box::new(Expr::Const(0.5)))),
            ),
            ElemFn::Acos => Expr::Div(
                Box::new(Expr::Const(-1.0)),
                Box::new(Expr::Pow(one_minus_u2(), Box::new(Expr::Const(0.5)))),
            ),
            ElemFn::Atan => Expr::Div(one(), one_plus_u2()),
            ElemFn::Acot => Expr::Div(Box::new(Expr::Const(-1.0)), one_plus_u2()),
            ElemFn::Sinh => Expr::Func(ElemFn::Cosh, u()),
            ElemFn::Cosh => Expr::Func(ElemFn::Sinh, u()),
            ElemFn::Tanh => Expr::Div(
                one(),
                Box::new(Expr::Pow(Box::new(Expr::Func(ElemFn::Cosh, u())), two())),
            ),
        }
    }
}
