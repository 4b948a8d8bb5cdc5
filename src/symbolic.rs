#![allow(non_camel_case_types)]
#![allow(non_snake_case)]
/// a module turns a String expression into a symbolic expression
///
/// understands implicit multiplication (`2x1`, `x1x2`, `2 sin(x1)`), right-associative `^`,
/// the named constants `pi` and `e` and the usual elementary functions with their aliases
/// (`log` for `ln`, `tg` for `tan`, `arcsin` for `asin` ...)
///# Example
/// ```
/// use RustedNewton::symbolic::parse_expr::{parse, ParseContext};
/// let context = ParseContext::indexed(2, "x");
/// let parsed_expression = parse("2x1^2 + sin(pi x2)", &context).unwrap();
/// println!(" parsed_expression {}", parsed_expression);
/// let function_of_x1_x2 = parsed_expression.lambdify_checked(&["x1", "x2"]).unwrap();
/// println!("f(1, 0.5) = {:?}", function_of_x1_x2(&[1.0, 0.5]));
///  ```
/// ________________________________________________________________________________________________________________________________
pub mod parse_expr;
///____________________________________________________________________________________________________________________________
/// # Symbolic engine
/// expression tree, elementary functions and named constants, printing
///# Example#
/// ```
/// use RustedNewton::symbolic::parse_expr::{parse, ParseContext};
/// let context = ParseContext::indexed(2, "x");
/// let parsed_expression = parse("exp(x1) + ln(x2)", &context).unwrap();
/// // return vec of all arguments
/// let all = parsed_expression.all_arguments_are_variables();
/// println!("all arguments are variables {:?}", all);
/// // differentiate with respect to x1 and x2
/// let df_dx1 = parsed_expression.diff("x1").simplify();
/// let df_dx2 = parsed_expression.diff("x2").simplify();
/// println!("df_dx1 = {}, df_dx2 = {}", df_dx1, df_dx2);
/// ```
/// ________________________________________________________________________________________________________________________________________________
pub mod symbolic_engine;
/// symbolic differentiation
pub mod symbolic_engine_derivatives;
///________________________________________________________________________________________________________________________________________________
///
/// equation vector, symbolic jacobian and their compiled counterparts
/// Example#
/// ```
/// use RustedNewton::symbolic::parse_expr::{parse, ParseContext};
/// use RustedNewton::symbolic::symbolic_functions::EquationSystem;
/// let context = ParseContext::indexed(2, "x");
/// let system = EquationSystem::new(vec![
///     parse("2*x1^3 + x2", &context).unwrap(),
///     parse("x1 - x2", &context).unwrap(),
/// ]);
/// let jacobian = system.jacobian(&system.variables()).unwrap();
/// println!("Jacobian readable {:?}", jacobian.readable());
/// ```
pub mod symbolic_functions;
/// numeric closures with finite-value checks
pub mod symbolic_lambdify;
pub mod symbolic_simplify;
