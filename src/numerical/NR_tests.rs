/////////////////////////////TESTS////////////////////////////////////////////////////
/*
Newton-Raphson tests:
convergence on scalar and 2x2 problems
singular and non-real failures with the iteration they happened at
parameter validation before the first iteration
observer calls and variable reordering
session struct
*/

#[cfg(test)]
mod tests {
    use crate::error::{DomainError, Entry, EvalError, InputKind, SolveError};
    use crate::numerical::NR::{
        ClosureSystem, LinearSolver, NR, NonlinearSystem, SolverParams, evaluate_initial_guess,
        newton_raphson, solve, solve_with,
    };
    use crate::symbolic::symbolic_engine::{ElemFn, Expr};
    use approx::assert_relative_eq;
    use nalgebra::{DMatrix, DVector};
    use std::f64::consts::PI;

    #[test]
    fn test_scalar_quadratic_converges_to_positive_root() {
        let solution = solve(&["x1^2 - 4"], &["3"], 1e-9, 50).unwrap();
        assert_relative_eq!(solution.x[0], 2.0, epsilon = 1e-9);
        assert!(solution.iterations <= 6, "took {}", solution.iterations);
        assert!(solution.step_norm < 1e-9);
        assert_eq!(solution.variables, vec!["x1".to_string()]);
    }

    #[test]
    fn test_linear_system_root_after_one_step() {
        let mut iterates: Vec<(usize, DVector<f64>)> = Vec::new();
        let solution = solve_with(
            &["x1 + x2 - 3", "x1 - x2 - 1"],
            &["x1", "x2"],
            &["0", "0"],
            &SolverParams::new(1e-9, 20),
            |k: usize, x: &DVector<f64>| iterates.push((k, x.clone())),
        )
        .unwrap();
        assert_eq!(solution.x, DVector::from_vec(vec![2.0, 1.0]));
        // the first step lands on the root; the zero step that follows confirms it
        assert_eq!(iterates[1], (2, DVector::from_vec(vec![2.0, 1.0])));
        assert_eq!(solution.iterations, 2);
        assert_eq!(solution.step_norm, 0.0);
    }

    #[test]
    fn test_close_guess_has_small_residual() {
        let tol = 1e-8;
        let solution = solve(
            &["x1^2 + x2^2 - 10", "x1 - x2 - 4"],
            &["2.9", "-1.1"],
            tol,
            50,
        )
        .unwrap();
        assert_relative_eq!(solution.x[0], 3.0, epsilon = 1e-8);
        assert_relative_eq!(solution.x[1], -1.0, epsilon = 1e-8);
        let residual = solution.residual_norm.unwrap();
        assert!(residual < 10.0 * tol, "residual {}", residual);
    }

    #[test]
    fn test_decimal_literals_in_equations_and_guesses() {
        let guess = evaluate_initial_guess(&["1.25", "-0.5", "2.5e-1"]).unwrap();
        assert_eq!(guess, DVector::from_vec(vec![1.25, -0.5, 0.25]));

        let solution = solve(&["x1 - 2.5"], &["0.5"], 1e-9, 10).unwrap();
        assert_relative_eq!(solution.x[0], 2.5, epsilon = 1e-12);

        // a guess read as 0 would make the Jacobian 2*x1 singular at the first step
        let solution = solve(&["x1^2 - 2"], &["0.5"], 1e-9, 50).unwrap();
        assert_relative_eq!(solution.x[0], 2f64.sqrt(), epsilon = 1e-9);

        let mut first = None;
        solve_with(
            &["x1^0.5 - 1.5"],
            &["x1"],
            &["0.75"],
            &SolverParams::new(1e-9, 50),
            |k: usize, x: &DVector<f64>| {
                if k == 1 {
                    first = Some(x[0]);
                }
            },
        )
        .unwrap();
        assert_eq!(first, Some(0.75));
    }

    #[test]
    fn test_constant_equation_is_singular_at_first_iteration() {
        let err = solve(&["5"], &["1"], 1e-9, 10).unwrap_err();
        assert_eq!(err, SolveError::SingularJacobian { iteration: 1 });
    }

    #[test]
    fn test_singular_with_inverse_solver() {
        let params = SolverParams {
            linear_solver: LinearSolver::Inverse,
            ..SolverParams::new(1e-9, 10)
        };
        let err = solve_with(&["x1 - x2", "2x1 - 2x2"], &["x1", "x2"], &["1", "2"], &params, ())
            .unwrap_err();
        assert_eq!(err, SolveError::SingularJacobian { iteration: 1 });
    }

    #[test]
    fn test_single_iteration_budget_is_exceeded() {
        let err = solve(&["x1^2 - 4"], &["3"], 1e-9, 1).unwrap_err();
        assert_eq!(err, SolveError::ExceededMaxIterations { max_iterations: 1 });
    }

    #[test]
    fn test_invalid_parameters_are_rejected_before_iterating() {
        for tol in [0.0, -1e-6, f64::NAN, f64::INFINITY] {
            let err = solve(&["x1 - 1"], &["0"], tol, 10).unwrap_err();
            assert!(matches!(err, SolveError::InvalidParameter { .. }), "{}", tol);
        }
        let err = solve(&["x1 - 1"], &["0"], 1e-9, 0).unwrap_err();
        assert!(matches!(err, SolveError::InvalidParameter { .. }));
        let err = solve(&["x1 - 1"], &["0", "1"], 1e-9, 10).unwrap_err();
        assert!(matches!(err, SolveError::InvalidParameter { .. }));
        let err = solve(&[], &[], 1e-9, 10).unwrap_err();
        assert!(matches!(err, SolveError::InvalidParameter { .. }));
    }

    #[test]
    fn test_dimension_mismatch() {
        let err = solve_with(
            &["x1 + x2", "x1 - x2"],
            &["x1"],
            &["0", "0"],
            &SolverParams::default(),
            (),
        )
        .unwrap_err();
        assert_eq!(
            err,
            SolveError::DimensionMismatch {
                equations: 2,
                variables: 1
            }
        );
    }

    #[test]
    fn test_syntax_errors_name_the_input() {
        let err = solve(&["x1 + x2", "x1 - (x2"], &["0", "0"], 1e-9, 10).unwrap_err();
        assert!(matches!(
            err,
            SolveError::Syntax {
                input: InputKind::Equation,
                index: 1,
                ..
            }
        ));
        let err = solve(&["x1 - 1"], &["x1"], 1e-9, 10).unwrap_err();
        assert!(matches!(
            err,
            SolveError::Syntax {
                input: InputKind::InitialGuess,
                index: 0,
                ..
            }
        ));
        assert!(err.to_string().starts_with("initial guess 1 could not be parsed"));
    }

    #[test]
    fn test_initial_guess_domain_error() {
        let err = solve(&["x1 - 1"], &["ln(-1)"], 1e-9, 10).unwrap_err();
        assert_eq!(
            err,
            SolveError::NumericDomain {
                iteration: 0,
                source: EvalError::new(
                    Entry::InitialGuess(0),
                    DomainError::Function {
                        function: ElemFn::Ln,
                        argument: -1.0
                    }
                )
            }
        );
    }

    #[test]
    fn test_non_real_iterate_reports_iteration() {
        // x - x ln(x) jumps from 3 to a negative value
        let err = solve(&["ln(x1)"], &["3"], 1e-9, 20).unwrap_err();
        match err {
            SolveError::NumericDomain { iteration, source } => {
                assert_eq!(iteration, 2);
                assert_eq!(source.entry, Entry::Residual(0));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_named_constants_in_guesses() {
        let solution = solve(&["sin(x1)"], &["3"], 1e-12, 20).unwrap();
        assert_relative_eq!(solution.x[0], PI, epsilon = 1e-12);
        let solution = solve(&["x1 - pi/4"], &["e"], 1e-12, 20).unwrap();
        assert_relative_eq!(solution.x[0], PI / 4.0, epsilon = 1e-12);
    }

    #[test]
    fn test_implicit_multiplication_in_equations() {
        let solution = solve(&["x1x2 - 2", "x1 + x2 - 3"], &["0.5", "2.5"], 1e-10, 50).unwrap();
        assert_relative_eq!(solution.x[0], 1.0, epsilon = 1e-8);
        assert_relative_eq!(solution.x[1], 2.0, epsilon = 1e-8);
    }

    #[test]
    fn test_reordered_variables_recover_same_root() {
        let equations = ["x1^2 + x2 - 5", "x1 - x2^3 + 7"];
        let params = SolverParams::new(1e-12, 50);
        let direct = solve_with(&equations, &["x1", "x2"], &["1", "2"], &params, ()).unwrap();
        let swapped = solve_with(&equations, &["x2", "x1"], &["2", "1"], &params, ()).unwrap();
        assert_relative_eq!(
            direct.get("x1").unwrap(),
            swapped.get("x1").unwrap(),
            epsilon = 1e-10
        );
        assert_relative_eq!(
            direct.get("x2").unwrap(),
            swapped.get("x2").unwrap(),
            epsilon = 1e-10
        );
        assert_eq!(swapped.variables, vec!["x2".to_string(), "x1".to_string()]);
        assert_relative_eq!(swapped.x[0], direct.x[1], epsilon = 1e-10);
    }

    #[test]
    fn test_custom_variable_names() {
        let params = SolverParams::default();
        let solution =
            solve_with(&["a b - 6", "a - b - 1"], &["a", "b"], &["4", "1"], &params, ()).unwrap();
        let pairs: Vec<(&str, f64)> = solution.pairs().collect();
        assert_eq!(pairs[0].0, "a");
        assert_relative_eq!(pairs[0].1, 3.0, epsilon = 1e-6);
        assert_relative_eq!(solution.get("b").unwrap(), 2.0, epsilon = 1e-6);
        assert!(solution.get("c").is_none());
    }

    #[test]
    fn test_observer_sees_every_iteration() {
        let mut seen = Vec::new();
        let solution = solve_with(
            &["x1^2 - 4"],
            &["x1"],
            &["3"],
            &SolverParams::new(1e-9, 50),
            |k: usize, x: &DVector<f64>| seen.push((k, x[0])),
        )
        .unwrap();
        assert_eq!(seen.len(), solution.iterations);
        assert_eq!(seen[0], (1, 3.0));
        let indices: Vec<usize> = seen.iter().map(|(k, _)| *k).collect();
        assert_eq!(indices, (1..=solution.iterations).collect::<Vec<_>>());
    }

    #[test]
    fn test_lu_and_inverse_agree() {
        let equations = ["exp(x1) - x2", "x1 + x2^2 - 3"];
        let lu = SolverParams::new(1e-12, 50);
        let inv = SolverParams {
            linear_solver: LinearSolver::Inverse,
            ..lu
        };
        let a = solve_with(&equations, &["x1", "x2"], &["0.5", "1.5"], &lu, ()).unwrap();
        let b = solve_with(&equations, &["x1", "x2"], &["0.5", "1.5"], &inv, ()).unwrap();
        assert_relative_eq!(a.x[0], b.x[0], epsilon = 1e-10);
        assert_relative_eq!(a.x[1], b.x[1], epsilon = 1e-10);
    }

    #[test]
    fn test_linear_solver_names() {
        assert_eq!("lu".parse::<LinearSolver>().unwrap(), LinearSolver::Lu);
        assert_eq!("INV".parse::<LinearSolver>().unwrap(), LinearSolver::Inverse);
        assert!("qr".parse::<LinearSolver>().is_err());
        assert_eq!(LinearSolver::Inverse.to_string(), "inv");
    }

    #[test]
    fn test_closure_system() {
        let system = ClosureSystem::new(
            1,
            |x: &DVector<f64>| Ok(DVector::from_vec(vec![x[0] * x[0] - 2.0])),
            |x: &DVector<f64>| Ok(DMatrix::from_element(1, 1, 2.0 * x[0])),
        );
        assert_eq!(system.dim(), 1);
        let solution = newton_raphson(
            &system,
            DVector::from_vec(vec![1.0]),
            &SolverParams::new(1e-12, 20),
            (),
        )
        .unwrap();
        assert_relative_eq!(solution.x[0], 2f64.sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn test_closure_system_domain_error() {
        let system = ClosureSystem::new(
            1,
            |x: &DVector<f64>| {
                if x[0] < 0.0 {
                    Err(EvalError::new(
                        Entry::Residual(0),
                        DomainError::Function {
                            function: ElemFn::Sqrt,
                            argument: x[0],
                        },
                    ))
                } else {
                    Ok(DVector::from_vec(vec![x[0].sqrt() - 1.0]))
                }
            },
            |x: &DVector<f64>| Ok(DMatrix::from_element(1, 1, 0.5 / x[0].sqrt())),
        );
        let err = newton_raphson(
            &system,
            DVector::from_vec(vec![-1.0]),
            &SolverParams::default(),
            (),
        )
        .unwrap_err();
        assert!(matches!(err, SolveError::NumericDomain { iteration: 1, .. }));
    }

    #[test]
    fn test_wrong_initial_guess_length_for_engine() {
        let system = ClosureSystem::new(
            2,
            |x: &DVector<f64>| Ok(x.clone()),
            |_x: &DVector<f64>| Ok(DMatrix::identity(2, 2)),
        );
        let err = newton_raphson(
            &system,
            DVector::from_vec(vec![1.0]),
            &SolverParams::default(),
            (),
        )
        .unwrap_err();
        assert!(matches!(err, SolveError::InvalidParameter { .. }));
    }

    #[test]
    fn test_NR_eq_generate_from_str() {
        let mut NR_instanse = NR::new();
        let vec_of_expressions = vec!["x^2+y^2-10".to_string(), "x-y-4".to_string()];
        let values = vec!["x".to_string(), "y".to_string()];
        NR_instanse
            .eq_generate_from_str(vec_of_expressions, Some(values), vec![1.0, 1.0], 1e-9, 100)
            .unwrap();
        let solution = NR_instanse.main_loop().unwrap();
        assert_relative_eq!(solution.get("x").unwrap(), 3.0, epsilon = 1e-9);
        assert_relative_eq!(solution.get("y").unwrap(), -1.0, epsilon = 1e-9);
        assert_eq!(NR_instanse.i, solution.iterations);
        assert_eq!(NR_instanse.get_result(), Some(solution));
    }

    #[test]
    fn test_NR_set_equation_system_finds_variables() {
        let x2 = Expr::Var("x2".to_string());
        let x10 = Expr::Var("x10".to_string());
        let eq1 = x2.clone() - Expr::Const(1.0);
        let eq2 = x10.clone() - x2 * Expr::Const(2.0);
        let mut NR_instanse = NR::new();
        NR_instanse
            .set_equation_system(vec![eq1, eq2], None, vec![0.0, 0.0], 1e-9, 10)
            .unwrap();
        assert_eq!(NR_instanse.values, vec!["x2".to_string(), "x10".to_string()]);
        NR_instanse.set_solver_params(Some("off".to_string()), Some("inv".to_string())).unwrap();
        let solution = NR_instanse.solve().unwrap();
        assert_relative_eq!(solution.x[0], 1.0);
        assert_relative_eq!(solution.x[1], 2.0);
    }

    #[test]
    fn test_NR_rejects_bad_settings() {
        let mut NR_instanse = NR::new();
        assert!(
            NR_instanse
                .set_solver_params(Some("loud".to_string()), None)
                .is_err()
        );
        assert!(
            NR_instanse
                .set_solver_params(None, Some("cholesky".to_string()))
                .is_err()
        );
        let err = NR_instanse
            .set_equation_system(
                vec![Expr::Var("x1".to_string())],
                None,
                vec![1.0, 2.0],
                1e-6,
                10,
            )
            .unwrap_err();
        assert!(matches!(err, SolveError::InvalidParameter { .. }));
        assert!(NR_instanse.main_loop().is_err());
    }

    #[test]
    fn test_NR_failure_keeps_no_result() {
        let mut NR_instanse = NR::new();
        NR_instanse
            .eq_generate_from_str(vec!["x1^2 + 1".to_string()], None, vec![0.5], 1e-9, 5)
            .unwrap();
        let err = NR_instanse.main_loop().unwrap_err();
        assert!(matches!(
            err,
            SolveError::ExceededMaxIterations { max_iterations: 5 }
                | SolveError::SingularJacobian { .. }
        ));
        assert!(NR_instanse.get_result().is_none());
    }

    #[test]
    fn test_function_alias_in_equation() {
        let solution = solve(&["tg(x1) - 1"], &["0.5"], 1e-12, 20).unwrap();
        assert_relative_eq!(solution.x[0], PI / 4.0, epsilon = 1e-12);
    }
}
