///  Example#1
/// ```
/// //use the shortest way to solve system of equations
/// use RustedNewton::numerical::NR::solve;
/// let solution = solve(&["x1^2 + x2^2 - 10", "x1 - x2 - 4"], &["1", "pi/4"], 1e-6, 100).unwrap();
/// println!("result = {:?} in {} iterations \n", solution.x, solution.iterations);
///  ```
/// Example#2
/// ```
/// // or with your own unknowns and a callback for every iterate
/// use RustedNewton::numerical::NR::{solve_with, SolverParams};
/// use nalgebra::DVector;
/// let params = SolverParams::new(1e-9, 50);
/// let observer = |k: usize, x: &DVector<f64>| println!("iteration {}: {}", k, x);
/// let solution = solve_with(&["x^2 + y^2 - 10", "x - y - 4"], &["x", "y"], &["1", "1"], &params, observer).unwrap();
/// println!("x = {:?}", solution.get("x"));
/// ```
pub mod NR;
mod NR_tests;
