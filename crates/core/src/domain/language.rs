use std::fmt;

use serde::{Deserialize, Serialize};

use super::DomainError;

/// Language identifier as understood by the judge backend (`cpp`, `python`, `rust`, ...).
///
/// The set of supported languages belongs to the backend, so any non-empty
/// name is accepted here and an unknown one is rejected by the submit call.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Language(String);

impl Language {
    pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
        let value = value.into();
        let trimmed = value.trim();

        if trimmed.is_empty() {
            return Err(DomainError::EmptyLanguage);
        }

        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
