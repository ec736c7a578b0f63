//! Bit identification - a named, versioned dependency package.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Error produced when a bit name, version, or `name:version` spec is malformed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BitIdError {
    #[error("expected `name:version`, found `{0}`")]
    MissingVersion(String),

    #[error("invalid bit name `{name}`: {reason}")]
    InvalidName { name: String, reason: &'static str },

    #[error("invalid version `{version}` for bit `{name}`")]
    InvalidVersion { name: String, version: String },
}

/// A bit identified by name and version.
///
/// Both parts end up as path components inside the bit store, so they are
/// restricted to characters that cannot escape it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BitId {
    name: String,
    version: String,
}

impl BitId {
    /// Create a bit id, validating both parts.
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Result<Self, BitIdError> {
        let name = name.into();
        let version = version.into();

        validate_bit_name(&name)?;
        if version.is_empty()
            || version.starts_with('.')
            || !version
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-' | '+'))
        {
            return Err(BitIdError::InvalidVersion { name, version });
        }

        Ok(BitId { name, version })
    }

    /// The bit name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The bit version.
    pub fn version(&self) -> &str {
        &self.version
    }
}

impl fmt::Display for BitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.name, self.version)
    }
}

impl FromStr for BitId {
    type Err = BitIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, version) = s
            .split_once(':')
            .ok_or_else(|| BitIdError::MissingVersion(s.to_string()))?;
        BitId::new(name.trim(), version.trim())
    }
}

/// Validate a bit name.
///
/// Names may contain `[A-Za-z0-9_.-]` and must start with an alphanumeric.
pub fn validate_bit_name(name: &str) -> Result<(), BitIdError> {
    let invalid = |reason| BitIdError::InvalidName {
        name: name.to_string(),
        reason,
    };

    let first = name.chars().next().ok_or_else(|| invalid("name is empty"))?;
    if !first.is_ascii_alphanumeric() {
        return Err(invalid("must start with a letter or digit"));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
    {
        return Err(invalid("only [A-Za-z0-9_.-] allowed"));
    }

    Ok(())
}
