//! # Symbolic Engine Module
//!
//! The expression tree every other part of the crate works on: the parser produces it,
//! the differentiation and simplification visitors transform it, and the lambdify
//! module turns it into numeric closures for the Newton iterations.
//!
//! ## Main Structures
//!
//! ### `Expr` Enum
//! A closed set of node kinds:
//! - **Symbols**: `Var(String)` for unknowns like `x1`, `NamedConst` for `pi` and `e`
//! - **Literals**: `Const(f64)`
//! - **Operations**: `Add`, `Sub`, `Mul`, `Div`, `Pow`
//! - **Functions**: `Func(ElemFn, arg)` for `sin`, `exp`, `ln`, ...
//!
//! ### `ElemFn` Enum
//! The elementary functions understood by the parser. Each one knows its name(s),
//! its real-valued evaluation and (in `symbolic_engine_derivatives`) its derivative.
//!
//! ## Interesting Code Features
//!
//! 1. **Operator Overloading**: `std::ops` traits build trees with natural syntax:
//!    `x.clone() * x + Expr::Const(1.0)`
//! 2. **String round trip**: `Display` prints fully parenthesised text that parses back
//!    into an identical tree (negative literals are printed as `(-2)`)
//! 3. **strum-driven names**: function and constant names, including aliases such as
//!    `tg`/`tan` and `log`/`ln`, come from `EnumString` derives

#![allow(non_camel_case_types)]

use std::f64::consts::{E, PI};
use std::fmt;

use strum_macros::{Display, EnumIter, EnumString};

/// Elementary functions of one argument.
///
/// Parsing accepts every listed spelling, printing always uses the first one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
pub enum ElemFn {
    #[strum(serialize = "exp")]
    Exp,
    #[strum(to_string = "ln", serialize = "log")]
    Ln,
    #[strum(serialize = "sqrt")]
    Sqrt,
    #[strum(serialize = "sin")]
    Sin,
    #[strum(serialize = "cos")]
    Cos,
    #[strum(to_string = "tan", serialize = "tg")]
    Tan,
    #[strum(to_string = "cot", serialize = "ctg")]
    Cot,
    #[strum(to_string = "asin", serialize = "arcsin")]
    Asin,
    #[strum(to_string = "acos", serialize = "arccos")]
    Acos,
    #[strum(to_string = "atan", serialize = "arctan", serialize = "arctg")]
    Atan,
    #[strum(to_string = "acot", serialize = "arccot", serialize = "arcctg")]
    Acot,
    #[strum(serialize = "sinh")]
    Sinh,
    #[strum(serialize = "cosh")]
    Cosh,
    #[strum(serialize = "tanh")]
    Tanh,
}

impl ElemFn {
    /// Plain `f64` evaluation. May return NaN or infinity; callers check the result.
    pub fn apply(self, x: f64) -> f64 {
        match self {
            ElemFn::Exp => x.exp(),
            ElemFn::Ln => x.ln(),
            ElemFn::Sqrt => x.sqrt(),
            ElemFn::Sin => x.sin(),
            ElemFn::Cos => x.cos(),
            ElemFn::Tan => x.tan(),
            ElemFn::Cot => 1.0 / x.tan(),
            ElemFn::Asin => x.asin(),
            ElemFn::Acos => x.acos(),
            ElemFn::Atan => x.atan(),
            ElemFn::Acot => PI / 2.0 - x.atan(),
            ElemFn::Sinh => x.sinh(),
            ElemFn::Cosh => x.cosh(),
            ElemFn::Tanh => x.tanh(),
        }
    }
}

/// Named mathematical constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
pub enum NamedConst {
    #[strum(serialize = "pi")]
    Pi,
    #[strum(serialize = "e")]
    E,
}

impl NamedConst {
    pub fn value(self) -> f64 {
        match self {
            NamedConst::Pi => PI,
            NamedConst::E => E,
        }
    }
}

/// Core symbolic expression enum representing mathematical expressions as an abstract syntax tree.
///
/// # Examples
/// ```rust, ignore
/// use RustedNewton::symbolic::symbolic_engine::Expr;
/// let x1 = Expr::Var("x1".to_string());
/// let expr = Expr::Add(Box::new(x1), Box::new(Expr::Const(2.0)));
/// ```
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    /// Symbolic variable with a name (e.g., "x1", "x2")
    Var(String),
    /// Numerical constant value
    Const(f64),
    /// `pi` or `e`, kept symbolic so that expressions print the way they were typed
    NamedConst(NamedConst),
    /// Addition operation: left + right
    Add(Box<Expr>, Box<Expr>),
    /// Subtraction operation: left - right
    Sub(Box<Expr>, Box<Expr>),
    /// Multiplication operation: left * right
    Mul(Box<Expr>, Box<Expr>),
    /// Division operation: left / right
    Div(Box<Expr>, Box<Expr>),
    /// Power operation: base ^ exponent
    Pow(Box<Expr>, Box<Expr>),
    /// Elementary function applied to an argument
    Func(ElemFn, Box<Expr>),
}

/// Fully parenthesised output that `parse_expr` reads back into the same tree.
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Expr::Var(name) => write!(f, "{}", name),
            Expr::Const(val) if val.is_sign_negative() => write!(f, "({})", val),
            Expr::Const(val) => write!(f, "{}", val),
            Expr::NamedConst(c) => write!(f, "{}", c),
            Expr::Add(lhs, rhs) => write!(f, "({} + {})", lhs, rhs),
            Expr::Sub(lhs, rhs) => write!(f, "({} - {})", lhs, rhs),
            Expr::Mul(lhs, rhs) => write!(f, "({} * {})", lhs, rhs),
            Expr::Div(lhs, rhs) => write!(f, "({} / {})", lhs, rhs),
            Expr::Pow(base, exp) => write!(f, "({} ^ {})", base, exp),
            Expr::Func(func, arg) => write!(f, "{}({})", func, arg),
        }
    }
}

impl std::ops::Add for Expr {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Expr::Add(self.boxed(), rhs.boxed())
    }
}

impl std::ops::Sub for Expr {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Expr::Sub(self.boxed(), rhs.boxed())
    }
}

impl std::ops::Mul for Expr {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self::Output {
        Expr::Mul(self.boxed(), rhs.boxed())
    }
}

impl std::ops::Div for Expr {
    type Output = Self;

    fn div(self, rhs: Self) -> Self::Output {
        Expr::Div(self.boxed(), rhs.boxed())
    }
}

impl std::ops::Neg for Expr {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Expr::Mul(Box::new(Expr::Const(-1.0)), Box::new(self))
    }
}

impl Expr {
    /// BASIC FEATURES

    /// Creates `num_vars` variables named `{var_name}1 .. {var_name}{num_vars}`.
    ///
    /// Numbering starts at 1 because that is how unknowns are typed (`x1`, `x2`, ...).
    pub fn IndexedVars(num_vars: usize, var_name: &str) -> (Vec<Expr>, Vec<String>) {
        let names: Vec<String> = (1..=num_vars)
            .map(|i| format!("{}{}", var_name, i))
            .collect();
        let vars = names.iter().map(|name| Expr::Var(name.clone())).collect();
        (vars, names)
    }

    /// Convenience method to wrap expression in Box for recursive structures.
    pub fn boxed(self) -> Box<Self> {
        Box::new(self)
    }

    /// self ^ rhs
    pub fn pow(self, rhs: Expr) -> Expr {
        Expr::Pow(self.boxed(), rhs.boxed())
    }

    /// Applies an elementary function to this expression.
    pub fn apply(self, func: ElemFn) -> Expr {
        Expr::Func(func, self.boxed())
    }

    /// check if the expression contains a variable
    pub fn contains_variable(&self, var_name: &str) -> bool {
        match self {
            Expr::Var(name) => name == var_name,
            Expr::Const(_) | Expr::NamedConst(_) => false,
            Expr::Add(lhs, rhs)
            | Expr::Sub(lhs, rhs)
            | Expr::Mul(lhs, rhs)
            | Expr::Div(lhs, rhs)
            | Expr::Pow(lhs, rhs) => {
                lhs.contains_variable(var_name) || rhs.contains_variable(var_name)
            }
            Expr::Func(_, arg) => arg.contains_variable(var_name),
        }
    }

    /// `true` when the tree holds no variables at all.
    pub fn is_constant(&self) -> bool {
        match self {
            Expr::Var(_) => false,
            Expr::Const(_) | Expr::NamedConst(_) => true,
            Expr::Add(lhs, rhs)
            | Expr::Sub(lhs, rhs)
            | Expr::Mul(lhs, rhs)
            | Expr::Div(lhs, rhs)
            | Expr::Pow(lhs, rhs) => lhs.is_constant() && rhs.is_constant(),
            Expr::Func(_, arg) => arg.is_constant(),
        }
    }

    pub fn is_zero(&self) -> bool {
        matches!(self, Expr::Const(v) if *v == 0.0)
    }

    pub fn is_one(&self) -> bool {
        matches!(self, Expr::Const(v) if *v == 1.0)
    }

    /// Extracts all unique variable names from the symbolic expression.
    ///
    /// Returns a sorted, deduplicated list. Names that share a prefix and differ only
    /// in a numeric suffix are ordered by the number, so `x2` comes before `x10`.
    pub fn all_arguments_are_variables(&self) -> Vec<String> {
        let mut vars = Vec::new();
        self.collect_variables(&mut vars);
        vars.sort_by(|a, b| natural_key(a).cmp(&natural_key(b)));
        vars.dedup();
        vars
    }

    fn collect_variables(&self, vars: &mut Vec<String>) {
        match self {
            Expr::Var(name) => vars.push(name.clone()),
            Expr::Const(_) | Expr::NamedConst(_) => {}
            Expr::Add(lhs, rhs)
            | Expr::Sub(lhs, rhs)
            | Expr::Mul(lhs, rhs)
            | Expr::Div(lhs, rhs)
            | Expr::Pow(lhs, rhs) => {
                lhs.collect_variables(vars);
                rhs.collect_variables(vars);
            }
            Expr::Func(_, arg) => arg.collect_variables(vars),
        }
    }
}

/// splits `x12` into ("x", 12) so that indexed names sort numerically
pub(crate) fn natural_key(name: &str) -> (&str, u64, &str) {
    let stem_end = name
        .char_indices()
        .rev()
        .take_while(|(_, c)| c.is_ascii_digit())
        .last()
        .map(|(i, _)| i)
        .unwrap_or(name.len());
    let (stem, digits) = name.split_at(stem_end);
    (stem, digits.parse().unwrap_or(0), digits)
}
