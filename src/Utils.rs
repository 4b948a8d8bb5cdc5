//! different utility modules used throughout the project
/// terminal and file logging for solver runs
pub mod logger;
/// parse task document with lines like "key: value1, value2" into a NewtonTask
pub mod task_parser;
///
mod task_parser_tests;
