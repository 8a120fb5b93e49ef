//! Argument templating for command lines
//!
//! Commands use named `{name}` placeholders filled from the task's
//! `arguments`. `{{` and `}}` produce literal braces. Values are inserted
//! verbatim: nothing is shell-escaped, so a value containing shell
//! metacharacters is interpreted by the shell in shell mode.

use crate::error::{TemplateError, TemplateResult};
use regex::Regex;
use std::collections::HashMap;

/// Escaped braces, a placeholder, or a stray brace
const PLACEHOLDER: &str = r"\{\{|\}\}|\{([^{}]*)\}|[{}]";

/// Fill every placeholder in `template` from `arguments`
pub fn format_command(template: &str, arguments: &HashMap<String, String>) -> TemplateResult<String> {
    let re = Regex::new(PLACEHOLDER).map_err(|e| TemplateError::InvalidSyntax(e.to_string()))?;

    let mut result = String::with_capacity(template.len());
    let mut last = 0;

    for caps in re.captures_iter(template) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        result.push_str(&template[last..whole.start()]);

        match whole.as_str() {
            "{{" => result.push('{'),
            "}}" => result.push('}'),
            brace @ ("{" | "}") => {
                return Err(TemplateError::InvalidSyntax(format!(
                    "single '{}' encountered in \"{}\"",
                    brace, template
                )));
            }
            _ => {
                let field = caps.get(1).map_or("", |m| m.as_str());
                result.push_str(resolve_field(field, arguments)?);
            }
        }

        last = whole.end();
    }

    result.push_str(&template[last..]);
    Ok(result)
}

/// Split `template` into words first, then fill each word on its own
///
/// Used for raw argument vector mode: a substituted value always stays a
/// single argument, whatever characters it contains.
pub fn format_argv(template: &str, arguments: &HashMap<String, String>) -> TemplateResult<Vec<String>> {
    template
        .split_whitespace()
        .map(|word| format_command(word, arguments))
        .collect()
}

fn resolve_field<'a>(field: &str, arguments: &'a HashMap<String, String>) -> TemplateResult<&'a str> {
    if field.is_empty() || field.chars().all(|c| c.is_ascii_digit()) {
        return Err(TemplateError::InvalidSyntax(format!(
            "positional placeholder '{{{}}}' is not supported, use a name",
            field
        )));
    }
    if field.contains(|c| matches!(c, ':' | '!' | '.' | '[')) {
        return Err(TemplateError::InvalidSyntax(format!(
            "placeholder '{{{}}}' must be a plain name",
            field
        )));
    }

    arguments
        .get(field)
        .map(String::as_str)
        .ok_or_else(|| TemplateError::UndefinedArgument(field.to_string()))
}
