//! `extension`, `argument` and extension instances
//!
//! A prefixed keyword such as `ex:tag` is an instance of an extension. The
//! reactor hands every such statement (and everything nested inside one) to
//! [`UnknownStatementSupport`]. Parents accept an instance only if its
//! prefix and name resolve to an `extension` defined in some source.

use yang_model::{
    ArgumentValue, EffectiveKind, EffectiveStatement, QName, StatementDefinition as Def,
};
use yang_reactor::{
    BuildContext, CopyPolicy, EffectiveBase, Result, StatementSupport, StmtId, StmtMut,
    SubstatementValidator,
};

use crate::argument::{resolve_prefix, ArgumentKind};
use crate::namespaces::ExtensionNamespace;
use crate::stmt::{documented, in_ignored_source, register_unique};

pub struct ExtensionSupport {
    validator: SubstatementValidator,
}

impl Default for ExtensionSupport {
    fn default() -> Self {
        Self {
            validator: documented(SubstatementValidator::builder(Def::Extension))
                .add_optional(Def::Argument)
                .build(),
        }
    }
}

impl StatementSupport for ExtensionSupport {
    fn definition(&self) -> Def {
        Def::Extension
    }

    fn copy_policy(&self) -> CopyPolicy {
        CopyPolicy::Reject
    }

    fn parse_argument(&self, build: &BuildContext, id: StmtId, raw: Option<&str>) -> Result<ArgumentValue> {
        ArgumentKind::LocalQName.parse(build, id, raw)
    }

    fn validator(&self) -> Option<&SubstatementValidator> {
        Some(&self.validator)
    }

    fn on_statement_added(&self, ctx: &mut StmtMut<'_>) -> Result<()> {
        let id = ctx.id();
        if in_ignored_source(ctx, id) {
            return Ok(());
        }
        register_unique::<ExtensionNamespace>(ctx, id, "extension")
    }

    fn create_effective(&self, _build: &BuildContext, _id: StmtId, base: EffectiveBase) -> Result<EffectiveStatement> {
        Ok(base.into_statement(EffectiveKind::Extension))
    }
}

pub struct ArgumentSupport {
    validator: SubstatementValidator,
}

impl Default for ArgumentSupport {
    fn default() -> Self {
        Self {
            validator: SubstatementValidator::builder(Def::Argument)
                .add_optional(Def::YinElement)
                .build(),
        }
    }
}

impl StatementSupport for ArgumentSupport {
    fn definition(&self) -> Def {
        Def::Argument
    }

    fn copy_policy(&self) -> CopyPolicy {
        CopyPolicy::Reject
    }

    fn parse_argument(&self, build: &BuildContext, id: StmtId, raw: Option<&str>) -> Result<ArgumentValue> {
        ArgumentKind::Identifier.parse(build, id, raw)
    }

    fn validator(&self) -> Option<&SubstatementValidator> {
        Some(&self.validator)
    }
}

/// Extension a prefixed keyword names, if it is defined.
fn resolve_extension(build: &BuildContext, id: StmtId) -> Option<QName> {
    let (prefix, name) = build.keyword(id).split_once(':')?;
    let module = resolve_prefix(build, id, prefix).ok()?;
    let extension = QName::create(module, name).ok()?;
    build
        .namespace_get::<ExtensionNamespace>(id, &extension)
        .ok()
        .flatten()
        .map(|_| extension)
}

/// Extension instances and the statements nested inside them.
#[derive(Default)]
pub struct UnknownStatementSupport;

impl StatementSupport for UnknownStatementSupport {
    fn definition(&self) -> Def {
        Def::Unknown
    }

    fn parse_argument(&self, _build: &BuildContext, _id: StmtId, raw: Option<&str>) -> Result<ArgumentValue> {
        Ok(raw.map_or(ArgumentValue::None, |text| ArgumentValue::String(text.to_string())))
    }

    fn is_registered_extension(&self, build: &BuildContext, id: StmtId) -> bool {
        resolve_extension(build, id).is_some()
    }

    fn create_effective(&self, build: &BuildContext, id: StmtId, base: EffectiveBase) -> Result<EffectiveStatement> {
        let extension = resolve_extension(build, id);
        Ok(base.into_statement(EffectiveKind::UnknownStatement { extension }))
    }
}
