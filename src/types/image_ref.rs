// ABOUTME: Image reference: a validated name + tag pair.
// ABOUTME: Displays as the derived "name:tag" composite the engine expects.

use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseImageRefError {
    #[error("image name cannot be empty")]
    EmptyName,

    #[error("image name must start with a lowercase letter or digit")]
    NameStart,

    #[error("invalid character in image name: '{0}'")]
    InvalidNameChar(char),

    #[error("image tag cannot be empty")]
    EmptyTag,

    #[error("image tag exceeds maximum length of 128 characters")]
    TagTooLong,

    #[error("image tag must start with a letter or digit")]
    TagStart,

    #[error("invalid character in image tag: '{0}'")]
    InvalidTagChar(char),
}

/// A local image reference. The `name:tag` form handed to the engine is
/// always derived from the two parts; it is never stored or mutated on
/// its own.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageRef {
    name: String,
    tag: String,
}

impl ImageRef {
    pub fn new(name: &str, tag: &str) -> Result<Self, ParseImageRefError> {
        validate_name(name)?;
        validate_tag(tag)?;

        Ok(Self {
            name: name.to_string(),
            tag: tag.to_string(),
        })
    }

    /// Parse a `name[:tag]` string, defaulting the tag to `latest`.
    pub fn parse(input: &str) -> Result<Self, ParseImageRefError> {
        match input.trim().rsplit_once(':') {
            Some((name, tag)) => Self::new(name, tag),
            None => Self::new(input.trim(), "latest"),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.name, self.tag)
    }
}

fn validate_name(name: &str) -> Result<(), ParseImageRefError> {
    let first = name.chars().next().ok_or(ParseImageRefError::EmptyName)?;

    if !first.is_ascii_lowercase() && !first.is_ascii_digit() {
        return Err(ParseImageRefError::NameStart);
    }

    for c in name.chars() {
        if !c.is_ascii_lowercase() && !c.is_ascii_digit() && !matches!(c, '.' | '_' | '-' | '/') {
            return Err(ParseImageRefError::InvalidNameChar(c));
        }
    }

    Ok(())
}

fn validate_tag(tag: &str) -> Result<(), ParseImageRefError> {
    let first = tag.chars().next().ok_or(ParseImageRefError::EmptyTag)?;

    if tag.len() > 128 {
        return Err(ParseImageRefError::TagTooLong);
    }

    if !first.is_ascii_alphanumeric() {
        return Err(ParseImageRefError::TagStart);
    }

    for c in tag.chars() {
        if !c.is_ascii_alphanumeric() && !matches!(c, '.' | '_' | '-') {
            return Err(ParseImageRefError::InvalidTagChar(c));
        }
    }

    Ok(())
}
