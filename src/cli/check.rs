//! Parse and evaluate sieve expressions against JSON input

use super::CliError;
use crate::parser::{parse_lambda, parse_ordering};
use crate::{Evaluator, Parameter, Ty, Value, from_json, to_json};

/// Options for the check command
#[derive(Debug, Clone, Default)]
pub struct CheckOptions {
    /// The expression (or ordering list) to check
    pub expression: String,
    /// JSON input string; the document is reachable as `it`
    pub input: Option<String>,
    /// Treat the input as an ordering list and sort the document
    pub ordering: bool,
    /// Only parse and type-check, don't evaluate
    pub syntax_only: bool,
}

/// Result of a check operation
#[derive(Debug)]
pub enum CheckResult {
    /// Parsing and binding passed
    SyntaxValid,
    /// Expression evaluated successfully with JSON output
    Success(serde_json::Value),
}

/// Execute a sieve check operation
pub fn execute_check(options: &CheckOptions) -> Result<CheckResult, CliError> {
    let registry = crate::TypeRegistry::new();

    if options.ordering {
        // Orderings sort the elements of a JSON array document.
        let parsed = parse_ordering(&options.expression, &registry, Ty::Map)?;
        if options.syntax_only {
            return Ok(CheckResult::SyntaxValid);
        }
        let json_str = options.input.as_ref().ok_or(CliError::NoInput)?;
        let document: serde_json::Value = serde_json::from_str(json_str)?;
        let Value::List(items) = from_json(document) else {
            return Err(CliError::Eval(crate::EvalError::TypeError(
                "ordering input must be a JSON array".to_string(),
            )));
        };
        let sorted = Evaluator::new().sort(&parsed, items)?;
        return Ok(CheckResult::Success(to_json(&Value::List(sorted))));
    }

    let lambda = parse_lambda(
        &options.expression,
        &registry,
        vec![Parameter::it(Ty::Map)],
        None,
        Vec::new(),
    )?;

    if options.syntax_only {
        return Ok(CheckResult::SyntaxValid);
    }

    let json_str = options.input.as_ref().ok_or(CliError::NoInput)?;
    let document: serde_json::Value = serde_json::from_str(json_str)?;
    let input = from_json(document);

    let result = Evaluator::new().eval_lambda(&lambda, &[input])?;
    Ok(CheckResult::Success(to_json(&result)))
}
