//! Parsed statement arguments
//!
//! The raw argument string of every statement is parsed once, when the
//! statement enters the build, into an [`ArgumentValue`]. The variant used
//! depends on the statement: `container foo` parses to a [`QName`],
//! `config false` to a boolean, `if-feature "a and not b"` to an
//! [`IfFeatureExpr`].

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};
use crate::qname::{QName, QNameModule, Revision};
use crate::version::YangVersion;

/// Status of a definition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[default]
    Current,
    Deprecated,
    Obsolete,
}

impl Status {
    pub fn parse(text: &str) -> Result<Self> {
        match text {
            "current" => Ok(Self::Current),
            "deprecated" => Ok(Self::Deprecated),
            "obsolete" => Ok(Self::Obsolete),
            other => Err(ModelError::InvalidValue {
                expected: "status",
                value: other.to_string(),
            }),
        }
    }
}

/// `ordered-by` argument.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderedBy {
    #[default]
    System,
    User,
}

/// `max-elements` argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MaxElements {
    Bounded(u32),
    Unbounded,
}

/// `deviate` argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeviateKind {
    NotSupported,
    Add,
    Replace,
    Delete,
}

impl DeviateKind {
    pub fn parse(text: &str) -> Result<Self> {
        match text {
            "not-supported" => Ok(Self::NotSupported),
            "add" => Ok(Self::Add),
            "replace" => Ok(Self::Replace),
            "delete" => Ok(Self::Delete),
            other => Err(ModelError::InvalidValue {
                expected: "deviate",
                value: other.to_string(),
            }),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotSupported => "not-supported",
            Self::Add => "add",
            Self::Replace => "replace",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for DeviateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Schema node identifier, as used by `augment`, `refine` and `deviation`.
///
/// Absolute identifiers start at a module root; descendant identifiers are
/// resolved relative to the statement that owns them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SchemaNodeIdentifier {
    pub absolute: bool,
    pub steps: Vec<QName>,
}

impl SchemaNodeIdentifier {
    pub fn last(&self) -> Option<&QName> {
        self.steps.last()
    }
}

impl fmt::Display for SchemaNodeIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, step) in self.steps.iter().enumerate() {
            if self.absolute || i > 0 {
                f.write_str("/")?;
            }
            f.write_str(&step.local_name)?;
        }
        Ok(())
    }
}

/// Boolean expression over feature names, the argument of `if-feature`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IfFeatureExpr {
    Feature(QName),
    Not(Box<IfFeatureExpr>),
    And(Vec<IfFeatureExpr>),
    Or(Vec<IfFeatureExpr>),
}

impl IfFeatureExpr {
    /// Evaluate against a supported-feature predicate.
    pub fn evaluate(&self, supported: &dyn Fn(&QName) -> bool) -> bool {
        match self {
            Self::Feature(name) => supported(name),
            Self::Not(inner) => !inner.evaluate(supported),
            Self::And(terms) => terms.iter().all(|t| t.evaluate(supported)),
            Self::Or(terms) => terms.iter().any(|t| t.evaluate(supported)),
        }
    }

    /// Every feature name the expression mentions.
    pub fn features(&self) -> BTreeSet<QName> {
        let mut out = BTreeSet::new();
        self.collect_features(&mut out);
        out
    }

    fn collect_features(&self, out: &mut BTreeSet<QName>) {
        match self {
            Self::Feature(name) => {
                out.insert(name.clone());
            }
            Self::Not(inner) => inner.collect_features(out),
            Self::And(terms) | Self::Or(terms) => {
                for term in terms {
                    term.collect_features(out);
                }
            }
        }
    }
}

/// A parsed statement argument.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArgumentValue {
    /// Statement takes no argument.
    #[default]
    None,
    /// Free text (description, units, default, XPath expressions).
    String(String),
    /// Bare identifier not bound to a module (module and prefix names).
    Identifier(String),
    QName(QName),
    Module(QNameModule),
    Revision(Revision),
    Version(YangVersion),
    Boolean(bool),
    Status(Status),
    Unsigned(u32),
    /// Signed integer (`value`).
    Integer(i32),
    MaxElements(MaxElements),
    OrderedBy(OrderedBy),
    SchemaNodeId(SchemaNodeIdentifier),
    KeyList(Vec<QName>),
    IfFeature(IfFeatureExpr),
    Deviate(DeviateKind),
}

impl ArgumentValue {
    pub fn as_qname(&self) -> Option<&QName> {
        match self {
            Self::QName(q) => Some(q),
            _ => None,
        }
    }

    /// Textual payload of string and identifier arguments.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) | Self::Identifier(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_revision(&self) -> Option<&Revision> {
        match self {
            Self::Revision(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_unsigned(&self) -> Option<u32> {
        match self {
            Self::Unsigned(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i32> {
        match self {
            Self::Integer(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_deviate(&self) -> Option<DeviateKind> {
        match self {
            Self::Deviate(kind) => Some(*kind),
            _ => None,
        }
    }

    pub fn as_schema_node_id(&self) -> Option<&SchemaNodeIdentifier> {
        match self {
            Self::SchemaNodeId(id) => Some(id),
            _ => None,
        }
    }

    pub fn as_if_feature(&self) -> Option<&IfFeatureExpr> {
        match self {
            Self::IfFeature(expr) => Some(expr),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feature(name: &str) -> IfFeatureExpr {
        IfFeatureExpr::Feature(QName::create(QNameModule::new("urn:f", None), name).unwrap())
    }

    #[test]
    fn test_if_feature_evaluation() {
        // a and not (b or c)
        let expr = IfFeatureExpr::And(vec![
            feature("a"),
            IfFeatureExpr::Not(Box::new(IfFeatureExpr::Or(vec![feature("b"), feature("c")]))),
        ]);

        let only_a = |q: &QName| q.local_name == "a";
        let a_and_c = |q: &QName| q.local_name == "a" || q.local_name == "c";
        assert!(expr.evaluate(&only_a));
        assert!(!expr.evaluate(&a_and_c));
        assert_eq!(expr.features().len(), 3);
    }

    #[test]
    fn test_schema_node_identifier_display() {
        let m = QNameModule::new("urn:a", None);
        let id = SchemaNodeIdentifier {
            absolute: true,
            steps: vec![
                QName::create(m.clone(), "top").unwrap(),
                QName::create(m.clone(), "inner").unwrap(),
            ],
        };
        assert_eq!(id.to_string(), "/top/inner");

        let relative = SchemaNodeIdentifier {
            absolute: false,
            ..id
        };
        assert_eq!(relative.to_string(), "top/inner");
    }

    #[test]
    fn test_deviate_kind_parse() {
        for kind in [
            DeviateKind::NotSupported,
            DeviateKind::Add,
            DeviateKind::Replace,
            DeviateKind::Delete,
        ] {
            assert_eq!(DeviateKind::parse(kind.as_str()).unwrap(), kind);
        }
        assert!(DeviateKind::parse("remove").is_err());
    }

    #[test]
    fn test_status_parse() {
        assert_eq!(Status::parse("deprecated").unwrap(), Status::Deprecated);
        assert!(Status::parse("retired").is_err());
    }
}
