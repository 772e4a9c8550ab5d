//! Error types for proto generation

use std::fmt;

use thiserror::Error;

/// Result type for crate-level operations
pub type Result<T> = std::result::Result<T, ProtogenError>;

/// A single generation-time mapping error.
///
/// Every variant names the schema path (or enum name) it concerns so that an
/// accumulated list can be printed verbatim without further context.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GenerationError {
    #[error("could not resolve name for {path}: {reason}")]
    NameResolution { path: String, reason: String },

    #[error("unsupported type {type_name} for {path}")]
    UnsupportedType { path: String, type_name: String },

    #[error("list {list} has key {key} with non-scalar type {type_name}")]
    KeyType {
        list: String,
        key: String,
        type_name: String,
    },

    #[error("unknown field kind in message {message}, field {field}")]
    UnknownFieldKind { message: String, field: String },

    #[error("unknown shape of enumerated type {name}")]
    UnknownEnumShape { name: String },

    #[error("enumeration {path} specified a default - {default} - that was not a valid value")]
    InvalidDefault { path: String, default: String },

    #[error("unimplemented: {0}")]
    Unimplemented(String),

    #[error("schema element {path} does not have a parent, messages are not generated for modules")]
    ModuleMessage { path: String },

    #[error("list {list} included a key {key} that did not exist")]
    MissingKey { list: String, key: String },

    #[error("enumeration {path} member {member} has value {value}, which does not fit a proto3 enum")]
    EnumValueRange {
        path: String,
        member: String,
        value: i64,
    },

    #[error("identity base {base} has identities {first} and {second} that both map to {symbol}")]
    IdentityCollision {
        base: String,
        first: String,
        second: String,
        symbol: String,
    },
}

/// Ordered collection of generation errors.
///
/// Errors are accumulated rather than short-circuited so that one malformed
/// field never hides its siblings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationErrors {
    items: Vec<GenerationError>,
}

impl GenerationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, err: GenerationError) {
        self.items.push(err);
    }

    pub fn extend(&mut self, other: GenerationErrors) {
        self.items.extend(other.items);
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &GenerationError> {
        self.items.iter()
    }

    pub fn into_vec(self) -> Vec<GenerationError> {
        self.items
    }

    /// `Ok(value)` when nothing was collected, otherwise every collected error.
    pub fn into_result<T>(self, value: T) -> std::result::Result<T, GenerationErrors> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

impl From<GenerationError> for GenerationErrors {
    fn from(err: GenerationError) -> Self {
        Self { items: vec![err] }
    }
}

impl FromIterator<GenerationError> for GenerationErrors {
    fn from_iter<I: IntoIterator<Item = GenerationError>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for GenerationErrors {
    type Item = GenerationError;
    type IntoIter = std::vec::IntoIter<GenerationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl fmt::Display for GenerationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, err) in self.items.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", err)?;
        }
        Ok(())
    }
}

impl std::error::Error for GenerationErrors {}

/// Crate-level errors
#[derive(Error, Debug)]
pub enum ProtogenError {
    #[error("generation failed:\n{0}")]
    Generation(GenerationErrors),

    #[error("invalid schema tree: {0}")]
    InvalidSchema(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(#[from] config_crate::ConfigError),
}

impl From<GenerationErrors> for ProtogenError {
    fn from(errs: GenerationErrors) -> Self {
        Self::Generation(errs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_result_empty_is_ok() {
        let errs = GenerationErrors::new();
        assert_eq!(errs.into_result(7), Ok(7));
    }

    #[test]
    fn test_display_one_per_line() {
        let errs: GenerationErrors = vec![
            GenerationError::Unimplemented("a".to_string()),
            GenerationError::UnknownEnumShape { name: "B".to_string() },
        ]
        .into_iter()
        .collect();

        let text = errs.to_string();
        assert_eq!(text.lines().count(), 2);
        assert!(text.starts_with("unimplemented: a"));
    }
}
