//! YANG language versions.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};

/// Language version declared by a module's `yang-version` statement.
///
/// A module without the statement is version 1.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum YangVersion {
    #[default]
    #[serde(rename = "1")]
    V1,
    #[serde(rename = "1.1")]
    V1_1,
}

impl YangVersion {
    pub fn parse(text: &str) -> Result<Self> {
        match text {
            "1" => Ok(Self::V1),
            "1.1" => Ok(Self::V1_1),
            other => Err(ModelError::InvalidVersion(other.to_string())),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::V1 => "1",
            Self::V1_1 => "1.1",
        }
    }
}

impl fmt::Display for YangVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_matches_display() {
        for version in [YangVersion::V1, YangVersion::V1_1] {
            assert_eq!(YangVersion::parse(&version.to_string()).unwrap(), version);
        }
        assert!(YangVersion::parse("2").is_err());
    }

    #[test]
    fn test_serialized_as_keyword_argument() {
        assert_eq!(serde_json::to_string(&YangVersion::V1_1).unwrap(), r#""1.1""#);
        let parsed: YangVersion = serde_json::from_str(r#""1""#).unwrap();
        assert_eq!(parsed, YangVersion::V1);
        assert!(YangVersion::V1 < YangVersion::V1_1);
    }
}
