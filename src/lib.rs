// Copyright (c)  by Gleb E. Zaslavkiy
//MIT License
#![allow(non_camel_case_types)]
#![allow(non_snake_case)]
pub mod Utils;
pub mod error;
pub mod numerical;
pub mod symbolic;

pub use error::SolveError;
pub use numerical::NR::{Solution, SolverParams, solve, solve_with};
pub use symbolic::parse_expr::{ParseContext, parse};
