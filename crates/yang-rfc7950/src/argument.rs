//! Argument parsing strategies
//!
//! Every statement support names an [`ArgumentKind`]; the kind decides how
//! the raw argument string becomes an [`ArgumentValue`]. Names that refer to
//! definitions (`uses a:g`, `base x`) are bound to a module here, through
//! the prefixes visible from the statement.
//!
//! # Prefix Resolution
//!
//! ```text
//! "a:g"  -> PrefixToModule["a"]  + "g"
//! "g"    -> ModuleQName of the statement's root + "g"
//! "int8" -> YANG built-in module (type names only)
//! ```

use yang_model::qname::is_identifier;
use yang_model::{
    ArgumentValue, DeviateKind, IfFeatureExpr, MaxElements, OrderedBy, QName, QNameModule,
    Revision, SchemaNodeIdentifier, StatementDefinition, Status, YangVersion,
};
use yang_reactor::{BuildContext, ReactorError, Result, StmtId};

use crate::namespaces::{ModuleQName, PrefixToModule};

/// Namespace of YANG built-in types.
pub const YANG_NAMESPACE: &str = "urn:ietf:params:xml:ns:yang:1";

pub const BUILTIN_TYPES: &[&str] = &[
    "binary",
    "bits",
    "boolean",
    "decimal64",
    "empty",
    "enumeration",
    "identityref",
    "instance-identifier",
    "int8",
    "int16",
    "int32",
    "int64",
    "leafref",
    "string",
    "uint8",
    "uint16",
    "uint32",
    "uint64",
    "union",
];

pub fn yang_module() -> QNameModule {
    QNameModule::new(YANG_NAMESPACE, None)
}

pub fn is_builtin_type(name: &QName) -> bool {
    name.module.namespace == YANG_NAMESPACE && BUILTIN_TYPES.contains(&name.local_name.as_str())
}

/// How a statement's raw argument is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArgumentKind {
    /// No argument allowed.
    None,
    /// Free text, kept as written.
    Text,
    /// Plain identifier (module, prefix and argument names).
    Identifier,
    /// Identifier defined by this statement, bound to its own module.
    LocalQName,
    /// Reference to a definition, optionally prefixed.
    PrefixedQName,
    /// Like [`ArgumentKind::PrefixedQName`], with built-in type names.
    TypeName,
    Revision,
    Version,
    Boolean,
    Status,
    Unsigned,
    /// Signed 32-bit integer (`value`).
    Integer,
    /// Name of an enumeration member: non-empty, no surrounding whitespace.
    EnumName,
    /// `range` and `length` expressions: `bound[..bound]` parts joined by `|`.
    Range,
    /// 1 to 18.
    FractionDigits,
    /// `invert-match`, YANG 1.1 only.
    Modifier,
    Deviate,
    MaxElements,
    OrderedBy,
    SchemaNodeId,
    KeyList,
    IfFeature,
}

impl ArgumentKind {
    /// Parse `raw` as the argument of statement `id`.
    ///
    /// # Errors
    ///
    /// A source error at `id` for a missing, unexpected or malformed
    /// argument, or for a prefix that is not declared.
    pub fn parse(self, build: &BuildContext, id: StmtId, raw: Option<&str>) -> Result<ArgumentValue> {
        let Some(text) = raw else {
            return match self {
                Self::None => Ok(ArgumentValue::None),
                _ => Err(source_error(
                    build,
                    id,
                    format!("statement {} requires an argument", build.keyword(id)),
                )),
            };
        };

        let model = |result: yang_model::error::Result<ArgumentValue>| {
            result.map_err(|e| source_error(build, id, e.to_string()))
        };
        match self {
            Self::None => Err(source_error(
                build,
                id,
                format!("statement {} does not take an argument", build.keyword(id)),
            )),
            Self::Text => Ok(ArgumentValue::String(text.to_string())),
            Self::Identifier => {
                if is_identifier(text) {
                    Ok(ArgumentValue::Identifier(text.to_string()))
                } else {
                    Err(source_error(build, id, format!("invalid identifier '{text}'")))
                }
            }
            Self::LocalQName => {
                let module = module_of(build, id)?;
                model(QName::create(module, text).map(ArgumentValue::QName))
            }
            Self::PrefixedQName => parse_qname(build, id, text).map(ArgumentValue::QName),
            Self::TypeName => parse_type_name(build, id, text).map(ArgumentValue::QName),
            Self::Revision => model(Revision::parse(text).map(ArgumentValue::Revision)),
            Self::Version => model(YangVersion::parse(text).map(ArgumentValue::Version)),
            Self::Boolean => match text {
                "true" => Ok(ArgumentValue::Boolean(true)),
                "false" => Ok(ArgumentValue::Boolean(false)),
                _ => Err(invalid_value(build, id, "boolean", text)),
            },
            Self::Status => model(Status::parse(text).map(ArgumentValue::Status)),
            Self::Unsigned => text
                .parse::<u32>()
                .map(ArgumentValue::Unsigned)
                .map_err(|_| invalid_value(build, id, "non-negative integer", text)),
            Self::Integer => text
                .parse::<i32>()
                .map(ArgumentValue::Integer)
                .map_err(|_| invalid_value(build, id, "integer", text)),
            Self::EnumName => {
                if text.is_empty() || text.trim() != text {
                    Err(invalid_value(build, id, "enum name", text))
                } else {
                    Ok(ArgumentValue::String(text.to_string()))
                }
            }
            Self::Range => {
                if is_range_expression(text) {
                    Ok(ArgumentValue::String(text.to_string()))
                } else {
                    Err(invalid_value(build, id, build.keyword(id), text))
                }
            }
            Self::FractionDigits => match text.parse::<u32>() {
                Ok(n) if (1..=18).contains(&n) => Ok(ArgumentValue::Unsigned(n)),
                _ => Err(invalid_value(build, id, "fraction-digits", text)),
            },
            Self::Modifier => {
                if text != "invert-match" {
                    return Err(invalid_value(build, id, "modifier", text));
                }
                if root_version(build, id) == YangVersion::V1 {
                    return Err(source_error(build, id, "modifier requires yang-version 1.1"));
                }
                Ok(ArgumentValue::Identifier(text.to_string()))
            }
            Self::Deviate => model(DeviateKind::parse(text).map(ArgumentValue::Deviate)),
            Self::MaxElements => match text {
                "unbounded" => Ok(ArgumentValue::MaxElements(MaxElements::Unbounded)),
                _ => match text.parse::<u32>() {
                    Ok(n) if n > 0 => Ok(ArgumentValue::MaxElements(MaxElements::Bounded(n))),
                    _ => Err(invalid_value(build, id, "max-elements", text)),
                },
            },
            Self::OrderedBy => match text {
                "system" => Ok(ArgumentValue::OrderedBy(OrderedBy::System)),
                "user" => Ok(ArgumentValue::OrderedBy(OrderedBy::User)),
                _ => Err(invalid_value(build, id, "ordered-by", text)),
            },
            Self::SchemaNodeId => {
                parse_schema_node_id(build, id, text).map(ArgumentValue::SchemaNodeId)
            }
            Self::KeyList => {
                let keys = text
                    .split_whitespace()
                    .map(|key| parse_qname(build, id, key))
                    .collect::<Result<Vec<_>>>()?;
                if keys.is_empty() {
                    return Err(invalid_value(build, id, "key", text));
                }
                Ok(ArgumentValue::KeyList(keys))
            }
            Self::IfFeature => parse_if_feature(build, id, text).map(ArgumentValue::IfFeature),
        }
    }
}

pub(crate) fn source_error(build: &BuildContext, id: StmtId, message: impl Into<String>) -> ReactorError {
    ReactorError::source(build.reference(id), message)
}

fn invalid_value(build: &BuildContext, id: StmtId, expected: &str, text: &str) -> ReactorError {
    source_error(build, id, format!("invalid {expected} value '{text}'"))
}

/// Module identity names defined by `id` belong to.
pub fn module_of(build: &BuildContext, id: StmtId) -> Result<QNameModule> {
    build
        .namespace_get::<ModuleQName>(id, &())?
        .cloned()
        .ok_or_else(|| {
            source_error(
                build,
                id,
                format!("module of {} is not known", build.describe(id)),
            )
        })
}

pub fn resolve_prefix(build: &BuildContext, id: StmtId, prefix: &str) -> Result<QNameModule> {
    build
        .namespace_get::<PrefixToModule>(id, &prefix.to_string())?
        .cloned()
        .ok_or_else(|| {
            source_error(
                build,
                id,
                format!("prefix '{prefix}' used in {} is not declared", build.keyword(id)),
            )
        })
}

/// Parse `prefix:name` or `name` relative to statement `id`.
pub fn parse_qname(build: &BuildContext, id: StmtId, text: &str) -> Result<QName> {
    let (module, local_name) = match text.split_once(':') {
        Some((prefix, local_name)) => (resolve_prefix(build, id, prefix)?, local_name),
        None => (module_of(build, id)?, text),
    };
    QName::create(module, local_name).map_err(|e| source_error(build, id, e.to_string()))
}

fn parse_type_name(build: &BuildContext, id: StmtId, text: &str) -> Result<QName> {
    if !text.contains(':') && BUILTIN_TYPES.contains(&text) {
        return QName::create(yang_module(), text).map_err(|e| source_error(build, id, e.to_string()));
    }
    parse_qname(build, id, text)
}

fn parse_schema_node_id(build: &BuildContext, id: StmtId, text: &str) -> Result<SchemaNodeIdentifier> {
    let absolute = text.starts_with('/');
    let body = text.strip_prefix('/').unwrap_or(text);
    let mut steps = Vec::new();
    for step in body.split('/') {
        let step = step.trim();
        if step.is_empty() {
            return Err(invalid_value(build, id, "schema node identifier", text));
        }
        steps.push(parse_qname(build, id, step)?);
    }
    Ok(SchemaNodeIdentifier { absolute, steps })
}

/// Syntax of `range` and `length` arguments, e.g. `1..10 | 20..max`.
fn is_range_expression(text: &str) -> bool {
    let is_bound = |bound: &str| {
        matches!(bound, "min" | "max")
            || bound.parse::<i64>().is_ok()
            || bound.parse::<u64>().is_ok()
            || (bound.contains('.') && bound.parse::<f64>().is_ok())
    };
    text.split('|').all(|part| {
        let part = part.trim();
        match part.split_once("..") {
            Some((low, high)) => is_bound(low.trim()) && is_bound(high.trim()),
            None => is_bound(part),
        }
    })
}

/// Declared `yang-version` of the source holding `id`.
pub fn root_version(build: &BuildContext, id: StmtId) -> YangVersion {
    build
        .find_substatement(build.root(id), StatementDefinition::YangVersion)
        .and_then(|version| match build.argument(version) {
            ArgumentValue::Version(v) => Some(*v),
            _ => None,
        })
        .unwrap_or_default()
}

// ============================================================================
// if-feature expressions
// ============================================================================

fn parse_if_feature(build: &BuildContext, id: StmtId, text: &str) -> Result<IfFeatureExpr> {
    let tokens = tokenize(text);
    let mut parser = IfFeatureParser {
        build,
        id,
        tokens: &tokens,
        pos: 0,
    };
    let expr = parser.parse_or().ok_or_else(|| invalid_value(build, id, "if-feature", text))??;
    if parser.pos != tokens.len() {
        return Err(invalid_value(build, id, "if-feature", text));
    }
    if root_version(build, id) == YangVersion::V1 && !matches!(expr, IfFeatureExpr::Feature(_)) {
        return Err(source_error(
            build,
            id,
            format!("if-feature expression '{text}' requires yang-version 1.1"),
        ));
    }
    Ok(expr)
}

fn tokenize(text: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut start = None;
    for (i, c) in text.char_indices() {
        if c.is_whitespace() || c == '(' || c == ')' {
            if let Some(s) = start.take() {
                tokens.push(&text[s..i]);
            }
            if c == '(' || c == ')' {
                tokens.push(&text[i..i + 1]);
            }
        } else if start.is_none() {
            start = Some(i);
        }
    }
    if let Some(s) = start {
        tokens.push(&text[s..]);
    }
    tokens
}

/// Recursive descent over `or` / `and` / `not` / parentheses.
///
/// Each rule returns `None` on a syntax error and `Some(Err)` when a
/// feature name does not resolve.
struct IfFeatureParser<'a> {
    build: &'a BuildContext,
    id: StmtId,
    tokens: &'a [&'a str],
    pos: usize,
}

impl<'a> IfFeatureParser<'a> {
    fn peek(&self) -> Option<&'a str> {
        self.tokens.get(self.pos).copied()
    }

    fn eat(&mut self, token: &str) -> bool {
        if self.peek() == Some(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn parse_or(&mut self) -> Option<Result<IfFeatureExpr>> {
        let mut terms = vec![match self.parse_and()? {
            Ok(term) => term,
            Err(e) => return Some(Err(e)),
        }];
        while self.eat("or") {
            match self.parse_and()? {
                Ok(term) => terms.push(term),
                Err(e) => return Some(Err(e)),
            }
        }
        Some(Ok(if terms.len() == 1 {
            terms.remove(0)
        } else {
            IfFeatureExpr::Or(terms)
        }))
    }

    fn parse_and(&mut self) -> Option<Result<IfFeatureExpr>> {
        let mut terms = vec![match self.parse_factor()? {
            Ok(term) => term,
            Err(e) => return Some(Err(e)),
        }];
        while self.eat("and") {
            match self.parse_factor()? {
                Ok(term) => terms.push(term),
                Err(e) => return Some(Err(e)),
            }
        }
        Some(Ok(if terms.len() == 1 {
            terms.remove(0)
        } else {
            IfFeatureExpr::And(terms)
        }))
    }

    fn parse_factor(&mut self) -> Option<Result<IfFeatureExpr>> {
        if self.eat("not") {
            return Some(self.parse_factor()?.map(|inner| IfFeatureExpr::Not(Box::new(inner))));
        }
        if self.eat("(") {
            let inner = self.parse_or()?;
            return self.eat(")").then_some(inner);
        }
        let token = self.peek()?;
        if matches!(token, ")" | "and" | "or") {
            return None;
        }
        self.pos += 1;
        Some(parse_qname(self.build, self.id, token).map(IfFeatureExpr::Feature))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_splits_parentheses() {
        assert_eq!(
            tokenize("not (a or b:c)and d"),
            vec!["not", "(", "a", "or", "b:c", ")", "and", "d"]
        );
        assert!(tokenize("   ").is_empty());
    }

    #[test]
    fn test_range_expressions() {
        for valid in ["1..10", "min..max", "0 | 5..7 | 100..max", "-2.5..2.5", "42"] {
            assert!(is_range_expression(valid), "{valid}");
        }
        for invalid in ["", "1..", "..5", "one..two", "1..10 |"] {
            assert!(!is_range_expression(invalid), "{invalid}");
        }
    }

    #[test]
    fn test_builtin_types() {
        let int8 = QName::create(yang_module(), "int8").unwrap();
        assert!(is_builtin_type(&int8));
        let shadow = QName::create(QNameModule::new("urn:x", None), "int8").unwrap();
        assert!(!is_builtin_type(&shadow));
    }
}
