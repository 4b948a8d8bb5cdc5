#![allow(non_snake_case)]
use RustedNewton::Utils::task_parser::NewtonTask;
use RustedNewton::error::SolveError;
use RustedNewton::numerical::NR::{SolverParams, Solution, solve_with};
use RustedNewton::symbolic::parse_expr::{ParseContext, parse, parse_constant};
use nalgebra::DVector;
use std::io::{self, BufRead, Write};
use std::process::ExitCode;

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();
    match args.get(1) {
        Some(path) => run_task(path),
        None => match interactive(&mut io::stdin().lock()) {
            Ok(_) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("input error: {}", e);
                ExitCode::FAILURE
            }
        },
    }
}

/// solve the system described in a task file
fn run_task(path: &str) -> ExitCode {
    let task = match NewtonTask::from_file(path) {
        Ok(task) => task,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    let result = task.into_session().and_then(|mut session| session.solve());
    match result {
        Ok(solution) => {
            print_solution(&solution);
            ExitCode::SUCCESS
        }
        Err(e) => {
            println!("{}", failure_message(&e));
            ExitCode::FAILURE
        }
    }
}

fn print_solution(solution: &Solution) {
    println!("\nSolution found in {} iterations:", solution.iterations);
    for (name, value) in solution.pairs() {
        println!("{} = {:.10}", name, value);
    }
}

fn failure_message(err: &SolveError) -> String {
    match err {
        SolveError::SingularJacobian { iteration } => {
            format!("Error: the Jacobian is not invertible (iteration {})", iteration)
        }
        SolveError::ExceededMaxIterations { .. } => {
            "The number of iterations exceeded the given limit.".to_string()
        }
        SolveError::Syntax { .. } => format!("Syntax error: {}", err),
        SolveError::NumericDomain { .. } => format!("Error: {}", err),
        _ => format!("Unexpected error: {}", err),
    }
}

/// `None` at end of input
fn prompt(input: &mut impl BufRead, text: &str) -> io::Result<Option<String>> {
    print!("{}", text);
    io::stdout().flush()?;
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

/// prompts until `accept` takes the answer
fn prompt_until<T>(
    input: &mut impl BufRead,
    text: &str,
    mut accept: impl FnMut(&str) -> Result<T, String>,
) -> io::Result<Option<T>> {
    loop {
        let Some(line) = prompt(input, text)? else {
            return Ok(None);
        };
        match accept(&line) {
            Ok(value) => return Ok(Some(value)),
            Err(message) => println!("{}", message),
        }
    }
}

/// prompt loop; returns the number of systems solved. A failed solve starts a new
/// round, a successful one asks whether to go on
fn interactive(input: &mut impl BufRead) -> io::Result<usize> {
    let mut solved = 0;
    println!("{}", "*".repeat(65));
    println!("Newton-Raphson method for systems of nonlinear equations");
    println!("{}", "*".repeat(65));
    loop {
        let Some(n) = prompt_until(input, "\nNumber of equations/unknowns: ", |s: &str| {
            s.parse::<usize>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| format!("'{}' is not a positive integer", s))
        })?
        else {
            return Ok(solved);
        };
        let context = ParseContext::indexed(n, "x");
        println!("Enter {} functions (f(x) = 0) in x1..x{}", n, n);
        let mut equations = Vec::with_capacity(n);
        for i in 0..n {
            let text = format!("f_{}(x) = ", i + 1);
            let Some(eq) = prompt_until(input, &text, |s: &str| {
                parse(s, &context)
                    .map(|_| s.to_string())
                    .map_err(|e| format!("Syntax error: {}", e))
            })?
            else {
                return Ok(solved);
            };
            equations.push(eq);
        }
        println!("Enter the initial guess (pi and e are allowed)");
        let mut guesses = Vec::with_capacity(n);
        for i in 0..n {
            let text = format!("x{} = ", i + 1);
            let Some(guess) = prompt_until(input, &text, |s: &str| {
                parse_constant(s)
                    .map(|_| s.to_string())
                    .map_err(|e| format!("Syntax error: {}", e))
            })?
            else {
                return Ok(solved);
            };
            guesses.push(guess);
        }
        let Some(tol) = prompt_until(input, "\nAbsolute tolerance: ", |s: &str| {
            s.parse::<f64>()
                .ok()
                .filter(|tol| tol.is_finite() && *tol > 0.0)
                .ok_or_else(|| format!("'{}' is not a positive number", s))
        })?
        else {
            return Ok(solved);
        };
        let Some(n_max) = prompt_until(input, "Maximum number of iterations: ", |s: &str| {
            s.parse::<usize>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| format!("'{}' is not a positive integer", s))
        })?
        else {
            return Ok(solved);
        };

        let eqs: Vec<&str> = equations.iter().map(|s| s.as_str()).collect();
        let xs: Vec<&str> = guesses.iter().map(|s| s.as_str()).collect();
        let vars: Vec<&str> = context.variables().iter().map(|s| s.as_str()).collect();
        let observer = |k: usize, x: &DVector<f64>| {
            let values: Vec<String> = x.iter().map(|v| format!("{:.10}", v)).collect();
            println!("\nIteration {}: X = [{}]", k, values.join(", "));
        };
        match solve_with(&eqs, &vars, &xs, &SolverParams::new(tol, n_max), observer) {
            Ok(solution) => {
                print_solution(&solution);
                solved += 1;
            }
            Err(e) => {
                println!("{}", failure_message(&e));
                continue;
            }
        }

        let Some(answer) = prompt(input, "\nContinue? (y/n) ")? else {
            return Ok(solved);
        };
        if !answer.eq_ignore_ascii_case("y") {
            return Ok(solved);
        }
    }
}
