//! Content identifiers and distribution source types.

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Stable logical name for a category of distributed configuration data.
///
/// The identifier is independent of the physical file name the content is
/// published under. Required identifiers are available as associated
/// constants; optional identifiers are discovered at runtime.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentIdentifier(Cow<'static, str>);

impl ContentIdentifier {
    pub const PRIVATE_PARAMETERS: ContentIdentifier =
        ContentIdentifier(Cow::Borrowed("PRIVATE-PARAMETERS"));
    pub const SHARED_PARAMETERS: ContentIdentifier =
        ContentIdentifier(Cow::Borrowed("SHARED-PARAMETERS"));

    /// Create a new identifier from any string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(Cow::Owned(id.into()))
    }

    /// Get the inner string value
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ContentIdentifier {
    fn from(id: String) -> Self {
        Self::new(id)
    }
}

impl From<&str> for ContentIdentifier {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl AsRef<str> for ContentIdentifier {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

/// Kind of configuration source a manifest is produced for.
///
/// External sources only publish shared parameters. Internal sources publish
/// private and shared parameters plus every installed optional part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    Internal,
    External,
}

impl SourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Internal => "internal",
            SourceType::External => "external",
        }
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string is neither `internal` nor `external`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownSourceType(pub String);

impl fmt::Display for UnknownSourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown configuration source type '{}'", self.0)
    }
}

impl std::error::Error for UnknownSourceType {}

impl FromStr for SourceType {
    type Err = UnknownSourceType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "internal" => Ok(SourceType::Internal),
            "external" => Ok(SourceType::External),
            _ => Err(UnknownSourceType(s.to_string())),
        }
    }
}
