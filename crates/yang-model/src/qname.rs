//! Qualified names and module identity
//!
//! Every schema node, typedef, grouping, identity and feature is named by a
//! [`QName`]: a local name bound to the [`QNameModule`] (namespace URI plus
//! optional revision) of the module that defines it. Statements copied into
//! another module through `uses` are rebound with [`QName::bind_to`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};

/// A module revision date in `YYYY-MM-DD` form.
///
/// Revisions order chronologically, which for this format is the same as
/// lexical order of the validated string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Revision(String);

impl Revision {
    /// Parse and validate a revision date.
    pub fn parse(text: &str) -> Result<Self> {
        let bytes = text.as_bytes();
        let shape_ok = bytes.len() == 10
            && bytes[4] == b'-'
            && bytes[7] == b'-'
            && bytes
                .iter()
                .enumerate()
                .all(|(i, b)| i == 4 || i == 7 || b.is_ascii_digit());
        if !shape_ok {
            return Err(ModelError::InvalidRevision(text.to_string()));
        }

        let month: u32 = text[5..7]
            .parse()
            .map_err(|_| ModelError::InvalidRevision(text.to_string()))?;
        let day: u32 = text[8..10]
            .parse()
            .map_err(|_| ModelError::InvalidRevision(text.to_string()))?;
        if !(1..=12).contains(&month) || !(1..=31).contains(&day) {
            return Err(ModelError::InvalidRevision(text.to_string()));
        }
        Ok(Self(text.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Module identity: namespace URI plus optional revision.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct QNameModule {
    pub namespace: String,
    pub revision: Option<Revision>,
}

impl QNameModule {
    pub fn new(namespace: impl Into<String>, revision: Option<Revision>) -> Self {
        Self {
            namespace: namespace.into(),
            revision,
        }
    }
}

impl fmt::Display for QNameModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.revision {
            Some(rev) => write!(f, "{}?revision={}", self.namespace, rev),
            None => f.write_str(&self.namespace),
        }
    }
}

/// A local name qualified by its defining module.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct QName {
    pub module: QNameModule,
    pub local_name: String,
}

impl QName {
    /// Create a qualified name, validating the local part as a YANG identifier.
    pub fn create(module: QNameModule, local_name: &str) -> Result<Self> {
        if !is_identifier(local_name) {
            return Err(ModelError::InvalidIdentifier(local_name.to_string()));
        }
        Ok(Self {
            module,
            local_name: local_name.to_string(),
        })
    }

    /// Same local name, different module.
    pub fn bind_to(&self, module: &QNameModule) -> Self {
        Self {
            module: module.clone(),
            local_name: self.local_name.clone(),
        }
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}){}", self.module, self.local_name)
    }
}

/// Returns true if `text` is a valid YANG identifier.
///
/// Identifiers start with a letter or underscore, followed by letters,
/// digits, underscores, hyphens or dots.
pub fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
}

/// Identifies a source by module name and optional revision.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SourceIdentifier {
    pub name: String,
    pub revision: Option<Revision>,
}

impl SourceIdentifier {
    pub fn new(name: impl Into<String>, revision: Option<Revision>) -> Self {
        Self {
            name: name.into(),
            revision,
        }
    }
}

impl fmt::Display for SourceIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.revision {
            Some(rev) => write!(f, "{}@{}", self.name, rev),
            None => f.write_str(&self.name),
        }
    }
}

/// Absolute path of a schema node from the module root.
///
/// Groupings, choices and cases contribute steps just like data nodes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SchemaPath {
    steps: Vec<QName>,
}

impl SchemaPath {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn from_steps(steps: Vec<QName>) -> Self {
        Self { steps }
    }

    /// Path of a child node named `step`.
    pub fn child(&self, step: QName) -> Self {
        let mut steps = self.steps.clone();
        steps.push(step);
        Self { steps }
    }

    pub fn steps(&self) -> &[QName] {
        &self.steps
    }

    pub fn last(&self) -> Option<&QName> {
        self.steps.last()
    }

    pub fn is_root(&self) -> bool {
        self.steps.is_empty()
    }
}

impl fmt::Display for SchemaPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.steps.is_empty() {
            return f.write_str("/");
        }
        for step in &self.steps {
            write!(f, "/{}", step.local_name)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn module(ns: &str) -> QNameModule {
        QNameModule::new(ns, None)
    }

    #[test]
    fn test_revision_validation() {
        assert!(Revision::parse("2024-02-29").is_ok());
        assert!(Revision::parse("2024-13-01").is_err());
        assert!(Revision::parse("2024-1-01").is_err());
        assert!(Revision::parse("yesterday").is_err());
    }

    #[test]
    fn test_revision_ordering_is_chronological() {
        let older = Revision::parse("2019-05-01").unwrap();
        let newer = Revision::parse("2021-01-10").unwrap();
        assert!(older < newer);
    }

    #[test]
    fn test_qname_rejects_bad_identifier() {
        assert!(QName::create(module("urn:a"), "9lives").is_err());
        assert!(QName::create(module("urn:a"), "with space").is_err());
        assert!(QName::create(module("urn:a"), "ok-name.v2").is_ok());
    }

    #[test]
    fn test_bind_to_keeps_local_name() {
        let q = QName::create(module("urn:a"), "x").unwrap();
        let rebound = q.bind_to(&module("urn:b"));
        assert_eq!(rebound.local_name, "x");
        assert_eq!(rebound.module.namespace, "urn:b");
        assert_ne!(q, rebound);
    }

    #[test]
    fn test_display_forms() {
        let rev = Revision::parse("2020-01-01").unwrap();
        let q = QName::create(QNameModule::new("urn:a", Some(rev.clone())), "top").unwrap();
        assert_eq!(q.to_string(), "(urn:a?revision=2020-01-01)top");
        assert_eq!(SourceIdentifier::new("a", Some(rev)).to_string(), "a@2020-01-01");

        let path = SchemaPath::root()
            .child(q.clone())
            .child(q.bind_to(&module("urn:b")));
        assert_eq!(path.to_string(), "/top/top");
        assert_eq!(SchemaPath::root().to_string(), "/");
    }
}
