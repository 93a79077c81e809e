//! Build configuration.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use yang_model::{QName, YangVersion};

/// Configuration for a single reactor build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReactorConfig {
    /// Features evaluated as supported by `if-feature`. `None` supports all.
    pub supported_features: Option<BTreeSet<QName>>,

    /// Language versions a source may declare.
    pub supported_versions: BTreeSet<YangVersion>,

    /// Upper bound on fixpoint passes per phase. `None` means unbounded.
    pub max_fixpoint_passes: Option<usize>,
}

impl Default for ReactorConfig {
    fn default() -> Self {
        Self {
            supported_features: None,
            supported_versions: [YangVersion::V1, YangVersion::V1_1].into_iter().collect(),
            max_fixpoint_passes: None,
        }
    }
}

impl ReactorConfig {
    pub fn is_feature_supported(&self, feature: &QName) -> bool {
        self.supported_features
            .as_ref()
            .map_or(true, |set| set.contains(feature))
    }

    pub fn is_version_supported(&self, version: YangVersion) -> bool {
        self.supported_versions.contains(&version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use yang_model::QNameModule;

    #[test]
    fn test_default_supports_everything() {
        let config = ReactorConfig::default();
        let q = QName::create(QNameModule::new("urn:a", None), "f").unwrap();
        assert!(config.is_feature_supported(&q));
        assert!(config.is_version_supported(YangVersion::V1));
        assert!(config.is_version_supported(YangVersion::V1_1));
    }

    #[test]
    fn test_deserialize_partial_config() {
        let config: ReactorConfig =
            serde_json::from_str(r#"{ "supported_versions": ["1.1"], "max_fixpoint_passes": 8 }"#)
                .unwrap();
        assert!(!config.is_version_supported(YangVersion::V1));
        assert_eq!(config.max_fixpoint_passes, Some(8));
        assert!(config.supported_features.is_none());
    }
}
