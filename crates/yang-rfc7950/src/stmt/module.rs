//! `module` and `submodule`
//!
//! Root statements register their identity while the sources are being
//! pre-linked, so that `import`, `include` and `belongs-to` in any source can
//! find them during linkage:
//!
//! ```text
//! SOURCE_PRE_LINKAGE  module foo@2024-01-01 -> ModuleNamespace, ModuleByName
//! SOURCE_LINKAGE      namespace + revision  -> ModuleQName, NamespaceToModule,
//!                     own prefix            -> PrefixToModule
//! ```
//!
//! A second source declaring an identity that is already registered is
//! ignored: its tree is kept out of the effective model and registers
//! nothing further.

use tracing::{debug, warn};
use yang_model::{
    ArgumentValue, EffectiveKind, EffectiveStatement, QNameModule, Revision, SourceIdentifier,
    StatementDefinition as Def,
};
use yang_reactor::{
    BuildContext, CopyPolicy, EffectiveBase, ParserNamespace, Result, StatementSupport, StmtId,
    StmtMut, SubstatementValidator, SubstatementValidatorBuilder,
};

use crate::argument::{module_of, root_version, source_error, ArgumentKind};
use crate::namespaces::{
    ModuleByName, ModuleNamespace, ModuleQName, NamespaceToModule, PrefixToModule,
    SubmoduleByName, SubmoduleNamespace,
};
use crate::stmt::{data_definitions, in_ignored_source};

/// Latest `revision` declared directly under `root`.
pub(crate) fn latest_revision(build: &BuildContext, root: StmtId) -> Option<Revision> {
    build
        .declared_substatements(root)
        .iter()
        .filter_map(|child| build.argument(*child).as_revision())
        .max()
        .cloned()
}

/// Name argument of a root, import or include statement.
pub(crate) fn name_argument(build: &BuildContext, id: StmtId) -> &str {
    build.argument(id).as_str().unwrap_or_default()
}

/// Identifier argument of the first `definition` child.
pub(crate) fn child_identifier(build: &BuildContext, id: StmtId, definition: Def) -> Option<String> {
    build
        .find_substatement(id, definition)
        .and_then(|child| build.argument(child).as_str())
        .map(str::to_string)
}

fn body(builder: SubstatementValidatorBuilder) -> SubstatementValidatorBuilder {
    data_definitions(builder)
        .add_optional(Def::YangVersion)
        .add_any(Def::Import)
        .add_any(Def::Include)
        .add_optional(Def::Organization)
        .add_optional(Def::Contact)
        .add_optional(Def::Description)
        .add_optional(Def::Reference)
        .add_any(Def::Revision)
        .add_any(Def::Extension)
        .add_any(Def::Feature)
        .add_any(Def::Identity)
        .add_any(Def::Typedef)
        .add_any(Def::Grouping)
        .add_any(Def::Augment)
        .add_any(Def::Deviation)
}

/// Check the declared version against the configuration and register the
/// root under `ById`/`ByName`. Returns false if the root is a duplicate.
fn register_root<ById, ByName>(ctx: &mut StmtMut<'_>) -> Result<bool>
where
    ById: ParserNamespace<Key = SourceIdentifier, Value = StmtId>,
    ByName: ParserNamespace<Key = String, Value = StmtId>,
{
    let id = ctx.id();
    let version = root_version(ctx, id);
    if !ctx.config().is_version_supported(version) {
        return Err(source_error(
            ctx,
            id,
            format!("yang-version {version} is not supported"),
        ));
    }

    let name = name_argument(ctx, id).to_string();
    let revision = latest_revision(ctx, id);
    let identity = SourceIdentifier::new(name.clone(), revision.clone());
    let existing = ctx.namespace_get::<ById>(id, &identity)?.copied();
    if let Some(existing) = existing {
        warn!(
            source = %ctx.source_name(id),
            existing = %ctx.source_name(existing),
            %identity,
            "ignoring duplicate source"
        );
        ctx.set_supported_to_build_effective(id, false);
        return Ok(false);
    }
    ctx.namespace_add::<ById>(id, identity.clone(), id)?;

    // Latest revision wins; on a tie the first registered source stays.
    let replace = match ctx.namespace_get::<ByName>(id, &name)?.copied() {
        Some(current) => latest_revision(ctx, current) < revision,
        None => true,
    };
    if replace {
        ctx.namespace_add::<ByName>(id, name, id)?;
    }
    debug!(%identity, "registered source");
    Ok(true)
}

// ============================================================================
// module
// ============================================================================

pub struct ModuleSupport {
    validator: SubstatementValidator,
}

impl Default for ModuleSupport {
    fn default() -> Self {
        Self {
            validator: body(SubstatementValidator::builder(Def::Module))
                .add_mandatory(Def::Namespace)
                .add_mandatory(Def::Prefix)
                .build(),
        }
    }
}

impl StatementSupport for ModuleSupport {
    fn definition(&self) -> Def {
        Def::Module
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

    fn on_pre_linkage_declared(&self, ctx: &mut StmtMut<'_>) -> Result<()> {
        register_root::<ModuleNamespace, ModuleByName>(ctx)?;
        Ok(())
    }

    fn on_linkage_declared(&self, ctx: &mut StmtMut<'_>) -> Result<()> {
        let id = ctx.id();
        let namespace = ctx
            .find_substatement(id, Def::Namespace)
            .and_then(|ns| ctx.argument(ns).as_str())
            .map(str::to_string)
            .ok_or_else(|| source_error(ctx, id, "module has no namespace"))?;
        let module = QNameModule::new(namespace, latest_revision(ctx, id));

        ctx.namespace_add::<ModuleQName>(id, (), module.clone())?;
        if let Some(prefix) = child_identifier(ctx, id, Def::Prefix) {
            ctx.namespace_add::<PrefixToModule>(id, prefix, module.clone())?;
        }
        if !in_ignored_source(ctx, id) {
            ctx.namespace_add::<NamespaceToModule>(id, module, id)?;
        }
        Ok(())
    }

    fn create_effective(&self, build: &BuildContext, id: StmtId, base: EffectiveBase) -> Result<EffectiveStatement> {
        let kind = EffectiveKind::Module {
            name: name_argument(build, id).to_string(),
            module: module_of(build, id)?,
            prefix: child_identifier(build, id, Def::Prefix).unwrap_or_default(),
            version: root_version(build, id),
        };
        Ok(base.into_statement(kind))
    }
}

// ============================================================================
// submodule
// ============================================================================

/// Submodules take their module identity from `belongs-to` during linkage.
pub struct SubmoduleSupport {
    validator: SubstatementValidator,
}

impl Default for SubmoduleSupport {
    fn default() -> Self {
        Self {
            validator: body(SubstatementValidator::builder(Def::Submodule))
                .add_mandatory(Def::BelongsTo)
                .build(),
        }
    }
}

impl StatementSupport for SubmoduleSupport {
    fn definition(&self) -> Def {
        Def::Submodule
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

    fn on_pre_linkage_declared(&self, ctx: &mut StmtMut<'_>) -> Result<()> {
        register_root::<SubmoduleNamespace, SubmoduleByName>(ctx)?;
        Ok(())
    }

    fn create_effective(&self, build: &BuildContext, id: StmtId, base: EffectiveBase) -> Result<EffectiveStatement> {
        let kind = EffectiveKind::Submodule {
            name: name_argument(build, id).to_string(),
            belongs_to: child_identifier(build, id, Def::BelongsTo).unwrap_or_default(),
            version: root_version(build, id),
        };
        Ok(base.into_statement(kind))
    }
}
