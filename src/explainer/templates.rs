//! Sentence templates
//!
//! Each function formats the record for one recognized construct from the
//! already-unparsed pieces of its node.

use super::Explanation;

pub fn assignment(line: usize, targets: &[String], value: &str) -> Explanation {
    let targets = targets.join(", ");
    Explanation::new(
        line,
        &format!("Assigns {} to {}.", value, targets),
        format!(
            "This line assigns the value '{}' to the variable(s) '{}'.",
            value, targets
        ),
    )
}

pub fn function_definition(line: usize, name: &str, args: &[&str]) -> Explanation {
    let args = args.join(", ");
    Explanation::new(
        line,
        &format!("Defines a function '{}' with arguments: {}.", name, args),
        format!(
            "The function '{}' is created with parameters: {}. It groups related code together.",
            name, args
        ),
    )
}

pub fn condition(line: usize, test: &str) -> Explanation {
    Explanation::new(
        line,
        &format!("Checks the condition: '{}'.", test),
        format!(
            "This line evaluates the condition '{}' and decides which block of code to execute.",
            test
        ),
    )
}

pub fn else_block(line: usize) -> Explanation {
    Explanation::new(
        line,
        "Executes the else block if the condition is False.",
        "If the condition is not met, this block will be executed.",
    )
}

pub fn for_loop(line: usize, target: &str, iter: &str) -> Explanation {
    Explanation::new(
        line,
        &format!("Loops over '{}' using variable '{}'.", iter, target),
        format!(
            "This line starts a for loop, iterating over '{}' and using '{}' for each item.",
            iter, target
        ),
    )
}

pub fn while_loop(line: usize, test: &str) -> Explanation {
    Explanation::new(
        line,
        &format!("Runs a while loop with condition: '{}'.", test),
        format!(
            "This line creates a while loop that runs as long as the condition '{}' is true.",
            test
        ),
    )
}

pub fn function_call(line: usize, call: &str) -> Explanation {
    Explanation::new(
        line,
        &format!("Executes a function call: '{}'.", call),
        format!(
            "This line calls the function or method '{}' to perform an action.",
            call
        ),
    )
}

/// `value` is `None` for a bare `return`
pub fn return_value(line: usize, value: Option<&str>) -> Explanation {
    let value = value.unwrap_or("nothing");
    Explanation::new(
        line,
        &format!("Returns {}.", value),
        format!(
            "This line ends the function and returns the value '{}' to the caller.",
            value
        ),
    )
}
