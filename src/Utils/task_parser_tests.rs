/////////////////////////////TESTS////////////////////////////////////////////////////
/*
task document tests:
key and key-value parsing
comment filtering
complete task with defaults and overrides
missing, duplicate, unknown keys and bad values
file-based parsing test
task to session
*/

#[cfg(test)]
mod tests1 {

    use crate::Utils::task_parser::{
        NewtonTask, filter_comments, parse_document, parse_key, parse_key_value_pair,
        parse_value_list,
    };
    use crate::error::{SolveError, TaskError};
    use crate::numerical::NR::{LinearSolver, SolverParams};
    use approx::assert_relative_eq;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const TASK: &str = "
// two circles crossing a line
unknowns: x, y
equation: x^2 + y^2 - 10
equation: x - y - 4
guess: 1, pi/4
# stopping rule
tolerance: 1e-9
max_iterations: 50
method: inv
loglevel: off
";

    #[test]
    fn test_parse_key() {
        let (remaining, key) = parse_key("max_iterations: 5").unwrap();
        assert_eq!(key, "max_iterations");
        assert_eq!(remaining, ": 5");
        let (_, key) = parse_key("_hidden1 value").unwrap();
        assert_eq!(key, "_hidden1");
        assert!(parse_key("1key").is_err());
    }

    #[test]
    fn test_parse_key_value_pair() {
        let (remaining, (key, value)) =
            parse_key_value_pair("equation :  x1^2 + x2, 3 \nguess: 1").unwrap();
        assert_eq!(key, "equation");
        assert_eq!(value, "x1^2 + x2, 3");
        assert_eq!(remaining, "\nguess: 1");
    }

    #[test]
    fn test_parse_value_list() {
        let (_, values) = parse_value_list("1, pi/4 ,-e").unwrap();
        assert_eq!(values, vec!["1", "pi/4", "-e"]);
        let (_, values) = parse_value_list("2.5").unwrap();
        assert_eq!(values, vec!["2.5"]);
    }

    #[test]
    fn test_filter_comments() {
        let filtered = filter_comments("// a\nkey: 1\n\n   # b\n% c\n; d\nother: 2");
        assert_eq!(filtered, "key: 1\nother: 2");
    }

    #[test]
    fn test_parse_document_keeps_order() {
        let pairs = parse_document(TASK).unwrap();
        let keys: Vec<&str> = pairs.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(
            keys,
            vec![
                "unknowns",
                "equation",
                "equation",
                "guess",
                "tolerance",
                "max_iterations",
                "method",
                "loglevel"
            ]
        );
        assert_eq!(pairs[2].1, "x - y - 4");
    }

    #[test]
    fn test_full_task() {
        let task = NewtonTask::parse(TASK).unwrap();
        assert_eq!(task.unknowns, Some(vec!["x".to_string(), "y".to_string()]));
        assert_eq!(task.equations, vec!["x^2 + y^2 - 10", "x - y - 4"]);
        assert_eq!(task.guess, vec!["1", "pi/4"]);
        assert_eq!(
            task.params,
            SolverParams {
                tolerance: 1e-9,
                max_iterations: 50,
                linear_solver: LinearSolver::Inverse
            }
        );
        assert_eq!(task.loglevel, Some("off".to_string()));
        assert_eq!(task.log_file, None);
    }

    #[test]
    fn test_minimal_task_uses_defaults() {
        let task = NewtonTask::parse("equation: x1^2 - 4\nguess: 3").unwrap();
        assert_eq!(task.unknowns, None);
        assert_eq!(task.params, SolverParams::default());
        assert_eq!(task.loglevel, None);
    }

    #[test]
    fn test_missing_keys() {
        assert_eq!(
            NewtonTask::parse("guess: 1"),
            Err(TaskError::MissingKey { key: "equation" })
        );
        assert_eq!(
            NewtonTask::parse("equation: x1 - 1"),
            Err(TaskError::MissingKey { key: "guess" })
        );
        assert_eq!(
            NewtonTask::parse("// nothing here\n"),
            Err(TaskError::MissingKey { key: "equation" })
        );
    }

    #[test]
    fn test_duplicate_and_unknown_keys() {
        assert_eq!(
            NewtonTask::parse("equation: x1\nguess: 1\nguess: 2"),
            Err(TaskError::DuplicateKey {
                key: "guess".to_string()
            })
        );
        assert_eq!(
            NewtonTask::parse("equation: x1\nguess: 1\nsolver: lu"),
            Err(TaskError::UnknownKey {
                key: "solver".to_string()
            })
        );
    }

    #[test]
    fn test_invalid_values() {
        let cases = [
            ("tolerance", "-1"),
            ("tolerance", "small"),
            ("max_iterations", "0"),
            ("max_iterations", "2.5"),
            ("method", "qr"),
            ("loglevel", "loud"),
            ("guess", "1,,2"),
        ];
        for (key, value) in cases {
            let document = format!("equation: x1 - 1\n{}: {}", key, value);
            assert_eq!(
                NewtonTask::parse(&document),
                Err(TaskError::InvalidValue {
                    key: key.to_string(),
                    value: value.to_string()
                }),
                "{}",
                document
            );
        }
        assert!(matches!(
            NewtonTask::parse("equation: x1\nguess:"),
            Err(TaskError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_malformed_line() {
        let err = NewtonTask::parse("equation: x1 - 1\nthis line has no colon\nguess: 1").unwrap_err();
        assert_eq!(
            err,
            TaskError::Malformed {
                remaining: "this line has no colon\nguess: 1".to_string()
            }
        );
    }

    #[test]
    fn test_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", TASK).unwrap();
        let task = NewtonTask::from_file(file.path()).unwrap();
        assert_eq!(task, NewtonTask::parse(TASK).unwrap());

        let missing = file.path().with_extension("missing");
        assert!(matches!(
            NewtonTask::from_file(&missing),
            Err(TaskError::Io { .. })
        ));
    }

    #[test]
    fn test_task_into_session_and_solve() {
        let task = NewtonTask::parse(TASK).unwrap();
        let mut session = task.into_session().unwrap();
        assert_eq!(session.values, vec!["x".to_string(), "y".to_string()]);
        assert_eq!(session.params.linear_solver, LinearSolver::Inverse);
        let solution = session.main_loop().unwrap();
        assert_relative_eq!(solution.get("x").unwrap(), 3.0, epsilon = 1e-9);
        assert_relative_eq!(solution.get("y").unwrap(), -1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_task_with_bad_guess_fails_at_session() {
        let task = NewtonTask::parse("equation: x1 - 1\nguess: ln(0)").unwrap();
        assert!(matches!(
            task.into_session(),
            Err(SolveError::NumericDomain { iteration: 0, .. })
        ));
    }
}
