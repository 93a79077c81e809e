//! Data definition statements and `key`
//!
//! Data nodes are the statements `uses` and `augment` copy around. Their
//! names are qualified by the module they end up in, so a copy rebinds its
//! QName (and a list's key names) to the target module. Each node registers
//! in the schema tree namespace of its parent; a second sibling with the
//! same name is a source error.

use yang_model::{
    ArgumentValue, EffectiveKind, EffectiveStatement, QNameModule, StatementDefinition as Def,
    YangVersion,
};
use yang_reactor::{
    BuildContext, CopyPolicy, EffectiveBase, Result, StatementSupport, StmtId, StmtMut,
    SubstatementValidator, SubstatementValidatorBuilder,
};

use crate::argument::{root_version, source_error, ArgumentKind};
use crate::namespaces::SchemaTreeNamespace;
use crate::stmt::{data_definitions, documented, register_unique};

/// Substatements every data node accepts.
fn common(definition: Def) -> SubstatementValidatorBuilder {
    documented(SubstatementValidator::builder(definition))
        .add_optional(Def::When)
        .add_any(Def::IfFeature)
}

pub struct DataDefinitionSupport {
    definition: Def,
    validator: SubstatementValidator,
}

impl DataDefinitionSupport {
    pub fn container() -> Self {
        let validator = data_definitions(common(Def::Container))
            .add_optional(Def::Presence)
            .add_optional(Def::Config)
            .add_any(Def::Must)
            .add_any(Def::Typedef)
            .add_any(Def::Grouping)
            .build();
        Self {
            definition: Def::Container,
            validator,
        }
    }

    pub fn leaf() -> Self {
        let validator = common(Def::Leaf)
            .add_mandatory(Def::Type)
            .add_optional(Def::Units)
            .add_optional(Def::Default)
            .add_optional(Def::Config)
            .add_optional(Def::Mandatory)
            .add_any(Def::Must)
            .build();
        Self {
            definition: Def::Leaf,
            validator,
        }
    }

    pub fn leaf_list() -> Self {
        let validator = common(Def::LeafList)
            .add_mandatory(Def::Type)
            .add_optional(Def::Units)
            .add_any(Def::Default)
            .add_optional(Def::Config)
            .add_optional(Def::MinElements)
            .add_optional(Def::MaxElements)
            .add_optional(Def::OrderedBy)
            .add_any(Def::Must)
            .build();
        Self {
            definition: Def::LeafList,
            validator,
        }
    }

    pub fn list() -> Self {
        let validator = data_definitions(common(Def::List))
            .add_optional(Def::Key)
            .add_optional(Def::Config)
            .add_optional(Def::MinElements)
            .add_optional(Def::MaxElements)
            .add_optional(Def::OrderedBy)
            .add_any(Def::Must)
            .add_any(Def::Typedef)
            .add_any(Def::Grouping)
            .build();
        Self {
            definition: Def::List,
            validator,
        }
    }

    pub fn choice() -> Self {
        // Short-hand cases: data nodes directly under the choice.
        let validator = common(Def::Choice)
            .add_any(Def::Case)
            .add_any(Def::Container)
            .add_any(Def::Leaf)
            .add_any(Def::LeafList)
            .add_any(Def::List)
            .add_any(Def::Anydata)
            .add_any(Def::Anyxml)
            .add_any(Def::Choice)
            .add_optional(Def::Default)
            .add_optional(Def::Config)
            .add_optional(Def::Mandatory)
            .build();
        Self {
            definition: Def::Choice,
            validator,
        }
    }

    pub fn case() -> Self {
        Self {
            definition: Def::Case,
            validator: data_definitions(common(Def::Case)).build(),
        }
    }

    pub fn anydata() -> Self {
        Self::opaque(Def::Anydata)
    }

    pub fn anyxml() -> Self {
        Self::opaque(Def::Anyxml)
    }

    fn opaque(definition: Def) -> Self {
        let validator = common(definition)
            .add_optional(Def::Config)
            .add_optional(Def::Mandatory)
            .add_any(Def::Must)
            .build();
        Self {
            definition,
            validator,
        }
    }
}

impl StatementSupport for DataDefinitionSupport {
    fn definition(&self) -> Def {
        self.definition
    }

    fn parse_argument(&self, build: &BuildContext, id: StmtId, raw: Option<&str>) -> Result<ArgumentValue> {
        ArgumentKind::LocalQName.parse(build, id, raw)
    }

    fn adapt_argument(&self, build: &BuildContext, id: StmtId, target: &QNameModule) -> ArgumentValue {
        match build.argument(id) {
            ArgumentValue::QName(name) => ArgumentValue::QName(name.bind_to(target)),
            other => other.clone(),
        }
    }

    fn validator(&self) -> Option<&SubstatementValidator> {
        Some(&self.validator)
    }

    fn on_statement_added(&self, ctx: &mut StmtMut<'_>) -> Result<()> {
        let id = ctx.id();
        if self.definition == Def::Anydata && root_version(ctx, id) == YangVersion::V1 {
            return Err(source_error(ctx, id, "anydata requires yang-version 1.1"));
        }
        match ctx.parent(id) {
            Some(parent) => register_unique::<SchemaTreeNamespace>(ctx, parent, "schema node"),
            None => Ok(()),
        }
    }

    fn create_effective(&self, _build: &BuildContext, _id: StmtId, base: EffectiveBase) -> Result<EffectiveStatement> {
        let kind = match self.definition {
            Def::Container => EffectiveKind::Container {
                presence: base.find_first(Def::Presence).is_some(),
            },
            Def::Leaf => EffectiveKind::Leaf {
                mandatory: base
                    .find_first(Def::Mandatory)
                    .and_then(|m| m.argument.as_bool())
                    .unwrap_or(false),
            },
            Def::LeafList => EffectiveKind::LeafList,
            Def::List => EffectiveKind::List {
                keys: match base.find_first(Def::Key).map(|key| &key.argument) {
                    Some(ArgumentValue::KeyList(keys)) => keys.clone(),
                    _ => Vec::new(),
                },
            },
            Def::Choice => EffectiveKind::Choice,
            Def::Case => EffectiveKind::Case,
            Def::Anydata | Def::Anyxml => EffectiveKind::Anydata,
            _ => EffectiveKind::Other,
        };
        Ok(base.into_statement(kind))
    }
}

/// `key`: copied with its list, key names rebound like the list's own.
#[derive(Default)]
pub struct KeySupport;

impl StatementSupport for KeySupport {
    fn definition(&self) -> Def {
        Def::Key
    }

    fn copy_policy(&self) -> CopyPolicy {
        CopyPolicy::DeclaredCopy
    }

    fn parse_argument(&self, build: &BuildContext, id: StmtId, raw: Option<&str>) -> Result<ArgumentValue> {
        ArgumentKind::KeyList.parse(build, id, raw)
    }

    fn adapt_argument(&self, build: &BuildContext, id: StmtId, target: &QNameModule) -> ArgumentValue {
        match build.argument(id) {
            ArgumentValue::KeyList(keys) => {
                ArgumentValue::KeyList(keys.iter().map(|key| key.bind_to(target)).collect())
            }
            other => other.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leaf_requires_exactly_one_type() {
        let leaf = DataDefinitionSupport::leaf();
        let cardinality = leaf.validator.cardinality(Def::Type).unwrap();
        assert_eq!((cardinality.min, cardinality.max), (1, Some(1)));
    }

    #[test]
    fn test_choice_accepts_short_hand_cases() {
        let choice = DataDefinitionSupport::choice();
        assert!(choice.validator.cardinality(Def::Leaf).is_some());
        assert!(choice.validator.cardinality(Def::Uses).is_none());
    }
}
