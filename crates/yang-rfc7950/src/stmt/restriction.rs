//! Type body statements
//!
//! Everything that can appear inside `type` besides nested types and
//! `base`: enumeration and bits members, restrictions (`range`, `length`,
//! `pattern`) and the leafref and decimal64 parameters. Which of them a
//! given type accepts is checked by [`check_type_body`] once the type is
//! fully declared.
//!
//! Enum values and bit positions without an explicit `value`/`position` are
//! assigned one past the highest value seen so far, starting at zero:
//!
//! ```text
//! enum a;             -> 0
//! enum b { value 5; } -> 5
//! enum c;             -> 6
//! ```

use std::collections::HashMap;

use yang_model::{ArgumentValue, EffectiveKind, EffectiveStatement, StatementDefinition as Def};
use yang_reactor::{
    BuildContext, EffectiveBase, ReactorError, Result, StatementSupport, StmtId,
    SubstatementValidator, SubstatementValidatorBuilder,
};

use crate::argument::{source_error, ArgumentKind};
use crate::stmt::documented;
use crate::stmt::meta::PlainSupport;

/// Statements only meaningful inside `type`.
const TYPE_BODY: &[Def] = &[
    Def::Type,
    Def::Base,
    Def::Enum,
    Def::Bit,
    Def::Range,
    Def::Length,
    Def::Pattern,
    Def::Path,
    Def::RequireInstance,
    Def::FractionDigits,
];

/// Body statements accepted by a derived type.
const DERIVED_BODY: &[Def] = &[
    Def::Enum,
    Def::Bit,
    Def::Range,
    Def::Length,
    Def::Pattern,
    Def::RequireInstance,
];

/// Accepted and required body statements of a built-in type.
fn builtin_body(name: &str) -> (&'static [Def], Option<Def>) {
    match name {
        "int8" | "int16" | "int32" | "int64" | "uint8" | "uint16" | "uint32" | "uint64" => {
            (&[Def::Range], None)
        }
        "decimal64" => (&[Def::FractionDigits, Def::Range], Some(Def::FractionDigits)),
        "string" => (&[Def::Length, Def::Pattern], None),
        "binary" => (&[Def::Length], None),
        "enumeration" => (&[Def::Enum], Some(Def::Enum)),
        "bits" => (&[Def::Bit], Some(Def::Bit)),
        "leafref" => (&[Def::Path, Def::RequireInstance], Some(Def::Path)),
        "instance-identifier" => (&[Def::RequireInstance], None),
        "identityref" => (&[Def::Base], Some(Def::Base)),
        "union" => (&[Def::Type], Some(Def::Type)),
        _ => (&[], None),
    }
}

/// Check the body of type statement `id` named `name`.
///
/// `builtin` selects the rules of the built-in type; derived types accept
/// restrictions only.
///
/// # Errors
///
/// An invalid substatement for a body statement the type does not accept,
/// a missing substatement for one it requires, and a source error for
/// duplicate or out-of-range enum and bit members.
pub(crate) fn check_type_body(build: &BuildContext, id: StmtId, name: &str, builtin: bool) -> Result<()> {
    let (allowed, required) = if builtin {
        builtin_body(name)
    } else {
        (DERIVED_BODY, None)
    };
    for child in build.declared_substatements(id) {
        let definition = build.definition(*child);
        if TYPE_BODY.contains(&definition) && !allowed.contains(&definition) {
            return Err(ReactorError::InvalidSubstatement {
                parent: format!("type {name}"),
                substatement: build.keyword(*child).to_string(),
                reference: build.reference(*child).clone(),
            });
        }
    }
    if let Some(required) = required {
        if build.find_substatement(id, required).is_none() {
            return Err(ReactorError::MissingSubstatement {
                parent: Def::Type,
                substatement: required,
                reference: build.reference(id).clone(),
            });
        }
    }
    check_members(build, id, Def::Enum)?;
    check_members(build, id, Def::Bit)
}

fn check_members(build: &BuildContext, id: StmtId, member: Def) -> Result<()> {
    let (what, limit) = match member {
        Def::Enum => ("value", i64::from(i32::MAX)),
        _ => ("position", i64::from(u32::MAX)),
    };
    let mut names: HashMap<&str, StmtId> = HashMap::new();
    let mut values: HashMap<i64, &str> = HashMap::new();
    for (child, value) in assigned_values(build, id, member) {
        let name = member_name(build, child);
        if let Some(previous) = names.insert(name, child) {
            return Err(source_error(
                build,
                child,
                format!(
                    "duplicate {} '{name}', previously defined at {}",
                    member.keyword(),
                    build.reference(previous)
                ),
            ));
        }
        if value > limit {
            return Err(source_error(
                build,
                child,
                format!("{} '{name}' {what} exceeds {limit}", member.keyword()),
            ));
        }
        if let Some(other) = values.insert(value, name) {
            return Err(source_error(
                build,
                child,
                format!(
                    "{} '{name}' {what} {value} is already used by '{other}'",
                    member.keyword()
                ),
            ));
        }
    }
    Ok(())
}

fn member_name(build: &BuildContext, id: StmtId) -> &str {
    build.argument(id).as_str().unwrap_or_default()
}

/// `member` statements (`enum` or `bit`) under type `ty` with their
/// explicit or assigned values, in declaration order.
pub(crate) fn assigned_values(build: &BuildContext, ty: StmtId, member: Def) -> Vec<(StmtId, i64)> {
    let value_of = match member {
        Def::Enum => Def::Value,
        _ => Def::Position,
    };
    let mut next = 0i64;
    let mut assigned = Vec::new();
    for child in build.substatements(ty) {
        if build.definition(child) != member {
            continue;
        }
        let explicit = build
            .find_substatement(child, value_of)
            .and_then(|value| match build.argument(value) {
                ArgumentValue::Integer(n) => Some(i64::from(*n)),
                ArgumentValue::Unsigned(n) => Some(i64::from(*n)),
                _ => None,
            });
        let value = explicit.unwrap_or(next);
        next = next.max(value + 1);
        assigned.push((child, value));
    }
    assigned
}

/// Value of member `id` as assigned within its type.
fn member_value(build: &BuildContext, id: StmtId, member: Def) -> Result<i64> {
    build
        .parent(id)
        .and_then(|ty| {
            assigned_values(build, ty, member)
                .into_iter()
                .find_map(|(child, value)| (child == id).then_some(value))
        })
        .ok_or_else(|| {
            ReactorError::internal(
                build.reference(id),
                format!("{} is not part of a type", build.describe(id)),
            )
        })
}

fn member_validator(member: Def, value: Def) -> SubstatementValidatorBuilder {
    documented(SubstatementValidator::builder(member))
        .add_optional(value)
        .add_any(Def::IfFeature)
}

// ============================================================================
// enum and bit
// ============================================================================

pub struct EnumSupport {
    validator: SubstatementValidator,
}

impl Default for EnumSupport {
    fn default() -> Self {
        Self {
            validator: member_validator(Def::Enum, Def::Value).build(),
        }
    }
}

impl StatementSupport for EnumSupport {
    fn definition(&self) -> Def {
        Def::Enum
    }

    fn parse_argument(&self, build: &BuildContext, id: StmtId, raw: Option<&str>) -> Result<ArgumentValue> {
        ArgumentKind::EnumName.parse(build, id, raw)
    }

    fn validator(&self) -> Option<&SubstatementValidator> {
        Some(&self.validator)
    }

    fn create_effective(&self, build: &BuildContext, id: StmtId, base: EffectiveBase) -> Result<EffectiveStatement> {
        let value = member_value(build, id, Def::Enum)?;
        let value = i32::try_from(value)
            .map_err(|_| source_error(build, id, format!("enum value {value} is out of range")))?;
        Ok(base.into_statement(EffectiveKind::Enum { value }))
    }
}

pub struct BitSupport {
    validator: SubstatementValidator,
}

impl Default for BitSupport {
    fn default() -> Self {
        Self {
            validator: member_validator(Def::Bit, Def::Position).build(),
        }
    }
}

impl StatementSupport for BitSupport {
    fn definition(&self) -> Def {
        Def::Bit
    }

    fn parse_argument(&self, build: &BuildContext, id: StmtId, raw: Option<&str>) -> Result<ArgumentValue> {
        ArgumentKind::Identifier.parse(build, id, raw)
    }

    fn validator(&self) -> Option<&SubstatementValidator> {
        Some(&self.validator)
    }

    fn create_effective(&self, build: &BuildContext, id: StmtId, base: EffectiveBase) -> Result<EffectiveStatement> {
        let position = member_value(build, id, Def::Bit)?;
        let position = u32::try_from(position)
            .map_err(|_| source_error(build, id, format!("bit position {position} is out of range")))?;
        Ok(base.into_statement(EffectiveKind::Bit { position }))
    }
}

// ============================================================================
// Restrictions and parameters
// ============================================================================

/// Substatements of `range`, `length` and `pattern`.
fn constraint(definition: Def) -> SubstatementValidatorBuilder {
    SubstatementValidator::builder(definition)
        .add_optional(Def::ErrorMessage)
        .add_optional(Def::ErrorAppTag)
        .add_optional(Def::Description)
        .add_optional(Def::Reference)
}

impl PlainSupport {
    pub fn value() -> Self {
        Self::new(Def::Value, ArgumentKind::Integer)
    }

    pub fn position() -> Self {
        Self::new(Def::Position, ArgumentKind::Unsigned)
    }

    /// `range` or `length`.
    pub fn range(definition: Def) -> Self {
        Self::new(definition, ArgumentKind::Range).with_validator(constraint(definition).build())
    }

    pub fn pattern() -> Self {
        Self::new(Def::Pattern, ArgumentKind::Text)
            .with_validator(constraint(Def::Pattern).add_optional(Def::Modifier).build())
    }

    pub fn modifier() -> Self {
        Self::new(Def::Modifier, ArgumentKind::Modifier)
    }

    pub fn path() -> Self {
        Self::new(Def::Path, ArgumentKind::Text)
    }

    pub fn require_instance() -> Self {
        Self::new(Def::RequireInstance, ArgumentKind::Boolean)
    }

    pub fn fraction_digits() -> Self {
        Self::new(Def::FractionDigits, ArgumentKind::FractionDigits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_bodies() {
        assert_eq!(builtin_body("enumeration"), (&[Def::Enum][..], Some(Def::Enum)));
        assert_eq!(builtin_body("leafref").1, Some(Def::Path));
        assert!(builtin_body("boolean").0.is_empty());
        assert!(builtin_body("uint16").0.contains(&Def::Range));
        assert!(!builtin_body("string").0.contains(&Def::Range));
    }

    #[test]
    fn test_derived_types_accept_restrictions_only() {
        assert!(DERIVED_BODY.contains(&Def::Pattern));
        assert!(!DERIVED_BODY.contains(&Def::Path));
        assert!(!DERIVED_BODY.contains(&Def::FractionDigits));
        for definition in DERIVED_BODY {
            assert!(TYPE_BODY.contains(definition));
        }
    }
}
