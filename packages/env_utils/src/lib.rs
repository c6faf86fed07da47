//! Runtime environment variable lookups used to configure audioflow binaries.
//!
//! Every lookup treats a missing variable as "use the default" and a present
//! but malformed variable as an error, so a typo in a deployment never
//! silently falls back to the default.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

use std::str::FromStr;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DefaultEnvUsizeError {
    #[error(transparent)]
    ParseInt(#[from] std::num::ParseIntError),
}

/// # Errors
///
/// * If encounters an invalid digit in the value
pub fn default_env_usize(name: &str, default: usize) -> Result<usize, DefaultEnvUsizeError> {
    Ok(option_env_usize(name)?.unwrap_or(default))
}

/// # Errors
///
/// * If encounters an invalid digit in the value
pub fn option_env_usize(name: &str) -> Result<Option<usize>, DefaultEnvUsizeError> {
    match std::env::var(name) {
        Ok(value) => Ok(Some(value.trim().parse::<usize>()?)),
        Err(_) => Ok(None),
    }
}

#[derive(Error, Debug)]
#[error("Invalid value for environment variable {name}: '{value}'")]
pub struct ParseEnvError {
    pub name: String,
    pub value: String,
}

/// Parses an environment variable with the type's [`FromStr`] implementation.
///
/// # Errors
///
/// * If the variable is set but its value fails to parse
pub fn option_env_parse<T: FromStr>(name: &str) -> Result<Option<T>, ParseEnvError> {
    let Ok(value) = std::env::var(name) else {
        return Ok(None);
    };

    value
        .trim()
        .parse::<T>()
        .map(Some)
        .map_err(|_| ParseEnvError {
            name: name.to_string(),
            value,
        })
}

/// # Errors
///
/// * If the variable is set but its value fails to parse
pub fn default_env_parse<T: FromStr>(name: &str, default: T) -> Result<T, ParseEnvError> {
    Ok(option_env_parse(name)?.unwrap_or(default))
}

#[must_use]
pub fn default_env(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}
