use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One record of the data document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extension {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub logo: String,
    #[serde(rename = "isActive", default)]
    pub is_active: bool,
}

impl Extension {
    pub fn new(name: impl Into<String>, description: impl Into<String>, logo: impl Into<String>, is_active: bool) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            logo: logo.into(),
            is_active,
        }
    }
}

/// Identifier assigned to a record when the list is loaded.
/// Unlike the record's position, it survives removals of other records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExtensionId(pub u64);

impl fmt::Display for ExtensionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionEntry {
    pub id: ExtensionId,
    pub extension: Extension,
}

/// Grid filter selected by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Filter {
    #[default]
    All,
    Active,
    Inactive,
}

impl Filter {
    pub const ALL: [Filter; 3] = [Filter::All, Filter::Active, Filter::Inactive];

    pub fn as_str(&self) -> &'static str {
        match self {
            Filter::All => "all",
            Filter::Active => "active",
            Filter::Inactive => "inactive",
        }
    }

    /// Label shown on the filter control.
    pub fn label(&self) -> &'static str {
        match self {
            Filter::All => "All",
            Filter::Active => "Active",
            Filter::Inactive => "Inactive",
        }
    }

    pub fn matches(&self, extension: &Extension) -> bool {
        match self {
            Filter::All => true,
            Filter::Active => extension.is_active,
            Filter::Inactive => !extension.is_active,
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
#[error("Unknown filter: {0}")]
pub struct ParseFilterError(String);

impl FromStr for Filter {
    type Err = ParseFilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" => Ok(Filter::All),
            "active" => Ok(Filter::Active),
            "inactive" => Ok(Filter::Inactive),
            other => Err(ParseFilterError(other.to_string())),
        }
    }
}
