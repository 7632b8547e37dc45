// src/ident.rs - 24 character object identifiers

use crate::error::{PatchError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

static IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9A-F]{24}$").expect("valid identifier pattern"));

/// Object identifier: 24 uppercase hexadecimal characters
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Identifier(String);

impl Identifier {
    pub fn parse(value: &str) -> Result<Self> {
        if IDENTIFIER.is_match(value) {
            Ok(Self(value.to_string()))
        } else {
            Err(PatchError::InvalidIdentifier(value.to_string()))
        }
    }

    /// Random identifier from a v4 UUID.
    pub fn generate() -> Self {
        let hex = Uuid::new_v4().simple().to_string().to_uppercase();
        Self(hex[..24].to_string())
    }

    /// Random identifier that does not occur in `text`.
    pub fn generate_unique(text: &str) -> Self {
        loop {
            let candidate = Self::generate();
            if !text.contains(candidate.as_str()) {
                return candidate;
            }
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Identifier {
    type Err = PatchError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Identifier {
    type Error = PatchError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<Identifier> for String {
    fn from(id: Identifier) -> Self {
        id.0
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
