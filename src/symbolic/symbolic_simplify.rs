//! # Symbolic Expression Simplification Module
//!
//! Bottom-up rewriting that keeps derivative trees small before they are compiled.
//!
//! 1. **Constant Folding**: arithmetic and elementary functions applied to literal
//!    numbers are evaluated, but only when the result is a finite real number, so a
//!    folding step never hides a domain error that evaluation would report
//! 2. **Algebraic Identities**: `0 + a`, `a * 1`, `a ^ 1`, `0 * a` and friends
//! 3. **Coefficient merging**: `c1 * (c2 * a)` becomes `(c1*c2) * a`
//!
//! `pi` and `e` stay symbolic so that simplified expressions still read the way they
//! were typed.

use crate::symbolic::symbolic_engine::Expr;

/// folds only when the result is a finite real number
fn fold(value: f64) -> Option<Expr> {
    value.is_finite().then_some(Expr::Const(value))
}

impl Expr {
    //___________________________________SIMPLIFICATION____________________________________

    /// One bottom-up rewriting pass.
    pub fn simplify_(&self) -> Expr {
        match self {
            Expr::Var(_) | Expr::Const(_) | Expr::NamedConst(_) => self.clone(),
            Expr::Add(lhs, rhs) => {
                let (lhs, rhs) = (lhs.simplify_(), rhs.simplify_());
                match (&lhs, &rhs) {
                    (Expr::Const(a), Expr::Const(b)) => {
                        fold(a + b).unwrap_or_else(|| Expr::Add(lhs.boxed(), rhs.boxed()))
                    }
                    _ if lhs.is_zero() => rhs,
                    _ if rhs.is_zero() => lhs,
                    _ => Expr::Add(lhs.boxed(), rhs.boxed()),
                }
            }
            Expr::Sub(lhs, rhs) => {
                let (lhs, rhs) = (lhs.simplify_(), rhs.simplify_());
                match (&lhs, &rhs) {
                    (Expr::Const(a), Expr::Const(b)) => {
                        fold(a - b).unwrap_or_else(|| Expr::Sub(lhs.boxed(), rhs.boxed()))
                    }
                    _ if rhs.is_zero() => lhs,
                    _ if lhs.is_zero() => Expr::Mul(Box::new(Expr::Const(-1.0)), rhs.boxed()),
                    _ => Expr::Sub(lhs.boxed(), rhs.boxed()),
                }
            }
            Expr::Mul(lhs, rhs) => {
                let (lhs, rhs) = (lhs.simplify_(), rhs.simplify_());
                match (&lhs, &rhs) {
                    (Expr::Const(a), Expr::Const(b)) => {
                        fold(a * b).unwrap_or_else(|| Expr::Mul(lhs.boxed(), rhs.boxed()))
                    }
                    _ if lhs.is_zero() || rhs.is_zero() => Expr::Const(0.0),
                    _ if lhs.is_one() => rhs,
                    _ if rhs.is_one() => lhs,
                    (Expr::Const(a), Expr::Mul(inner_lhs, inner_rhs)) => match inner_lhs.as_ref() {
                        Expr::Const(b) if (a * b).is_finite() => {
                            Expr::Mul(Box::new(Expr::Const(a * b)), inner_rhs.clone())
                        }
                        _ => Expr::Mul(lhs.boxed(), rhs.boxed()),
                    },
                    _ => Expr::Mul(lhs.boxed(), rhs.boxed()),
                }
            }
            Expr::Div(lhs, rhs) => {
                let (lhs, rhs) = (lhs.simplify_(), rhs.simplify_());
                match (&lhs, &rhs) {
                    (Expr::Const(a), Expr::Const(b)) => {
                        fold(a / b).unwrap_or_else(|| Expr::Div(lhs.boxed(), rhs.boxed()))
                    }
                    _ if rhs.is_one() => lhs,
                    _ if lhs.is_zero() && !rhs.is_zero() => Expr::Const(0.0),
                    _ => Expr::Div(lhs.boxed(), rhs.boxed()),
                }
            }
            Expr::Pow(base, exp) => {
                let (base, exp) = (base.simplify_(), exp.simplify_());
                match (&base, &exp) {
                    (Expr::Const(a), Expr::Const(b)) => {
                        fold(a.powf(*b)).unwrap_or_else(|| Expr::Pow(base.boxed(), exp.boxed()))
                    }
                    _ if exp.is_zero() => Expr::Const(1.0),
                    _ if exp.is_one() => base,
                    _ if base.is_one() => Expr::Const(1.0),
                    _ => Expr::Pow(base.boxed(), exp.boxed()),
                }
            }
            Expr::Func(func, arg) => {
                let arg = arg.simplify_();
                match arg {
                    Expr::Const(a) => {
                        fold(func.apply(a)).unwrap_or_else(|| Expr::Func(*func, arg.boxed()))
                    }
                    _ => Expr::Func(*func, arg.boxed()),
                }
            }
        }
    }

    /// Repeats `simplify_` until the tree stops changing.
    pub fn simplify(&self) -> Expr {
        let mut current = self.simplify_();
        loop {
            let next = current.simplify_();
            if next == current {
                return current;
            }
            current = next;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbolic::parse_expr::{ParseContext, parse};
    use crate::symbolic::symbolic_engine::{ElemFn, NamedConst};

    fn expr(text: &str) -> Expr {
        parse(text, &ParseContext::indexed(2, "x")).unwrap()
    }

    #[test]
    fn test_constant_folding() {
        assert_eq!(expr("2 + 3*4 - 1").simplify(), Expr::Const(13.0));
        assert_eq!(expr("2^10 / 4").simplify(), Expr::Const(256.0));
        assert_eq!(expr("exp(0) + cos(0)").simplify(), Expr::Const(2.0));
    }

    #[test]
    fn test_identities() {
        assert_eq!(expr("0 + x1").simplify(), expr("x1"));
        assert_eq!(expr("x1 - 0").simplify(), expr("x1"));
        assert_eq!(expr("x1 * 1").simplify(), expr("x1"));
        assert_eq!(expr("0 * sin(x1)").simplify(), Expr::Const(0.0));
        assert_eq!(expr("x1 / 1").simplify(), expr("x1"));
        assert_eq!(expr("0 / x2").simplify(), Expr::Const(0.0));
        assert_eq!(expr("x1 ^ 0").simplify(), Expr::Const(1.0));
        assert_eq!(expr("x1 ^ 1").simplify(), expr("x1"));
        assert_eq!(expr("1 ^ x2").simplify(), Expr::Const(1.0));
        assert_eq!(expr("0 - x1").simplify(), expr("-x1"));
    }

    #[test]
    fn test_coefficients_merge() {
        assert_eq!(expr("2*(3*x1)").simplify(), expr("6*x1"));
        assert_eq!(expr("-(2*x1)").simplify(), expr("-2*x1"));
    }

    #[test]
    fn test_domain_errors_are_not_folded() {
        let division = expr("1 / 0");
        assert_eq!(division.simplify(), division);
        let log = expr("ln(-1)");
        assert_eq!(
            log.simplify(),
            Expr::Func(ElemFn::Ln, Box::new(Expr::Const(-1.0)))
        );
        let overflow = expr("10^400");
        assert_eq!(overflow.simplify(), overflow);
    }

    #[test]
    fn test_named_constants_stay_symbolic() {
        let e = expr("e + 0");
        assert_eq!(e.simplify(), Expr::NamedConst(NamedConst::E));
    }

    #[test]
    fn test_simplify_is_idempotent() {
        let f = expr("(x1^2 + 0*x2)*(1 + 0) - x2^1");
        let once = f.simplify();
        assert_eq!(once.simplify(), once);
        assert_eq!(once, expr("x1^2 - x2"));
    }
}
