// ABOUTME: Engine container name validation.
// ABOUTME: Enforces the daemon's accepted name pattern before any invocation.

use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ContainerNameError {
    #[error("container name cannot be empty")]
    Empty,

    #[error("container name exceeds maximum length of 255 characters")]
    TooLong,

    #[error("container name must start with a letter or digit")]
    BadStart,

    #[error("invalid character in container name: '{0}'")]
    InvalidChar(char),
}

/// A validated container name. The daemon accepts
/// `[a-zA-Z0-9][a-zA-Z0-9_.-]*`, and a Container's identity is nothing
/// but this name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContainerName(String);

impl ContainerName {
    pub fn new(value: &str) -> Result<Self, ContainerNameError> {
        let first = value.chars().next().ok_or(ContainerNameError::Empty)?;

        if value.len() > 255 {
            return Err(ContainerNameError::TooLong);
        }

        if !first.is_ascii_alphanumeric() {
            return Err(ContainerNameError::BadStart);
        }

        for c in value.chars() {
            if !c.is_ascii_alphanumeric() && !matches!(c, '_' | '.' | '-') {
                return Err(ContainerNameError::InvalidChar(c));
            }
        }

        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContainerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
