//! `${VAR}` substitution in configuration values

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::config::ConfigError;

static ENV_REFERENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("valid pattern"));

/// Replace every `${VAR}` in `input` with the value from `lookup`.
///
/// All missing variables are reported together.
pub fn expand_with<F>(input: &str, lookup: F) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut missing: Vec<String> = Vec::new();

    let expanded = ENV_REFERENCE.replace_all(input, |caps: &Captures<'_>| {
        let name = &caps[1];
        lookup(name).unwrap_or_else(|| {
            if !missing.iter().any(|m| m == name) {
                missing.push(name.to_string());
            }
            String::new()
        })
    });

    if !missing.is_empty() {
        return Err(ConfigError::ValidationError(format!(
            "Missing environment variables: {}",
            missing.join(", ")
        )));
    }

    Ok(expanded.into_owned())
}
