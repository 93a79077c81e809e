//! `import`, `include` and `belongs-to`
//!
//! All three resolve another source during SOURCE_LINKAGE, once every root
//! has registered its identity. Resolution links the two sources, so
//! tree-scoped lookups (groupings, typedefs) fall through to the linked
//! root, and binds the declared prefix to the linked module. Include and
//! belongs-to links are followed transitively, so an importer also sees
//! what the imported module defines in its submodules.
//!
//! An `import` without `revision-date` picks the latest revision available.

use tracing::trace;
use yang_model::{
    ArgumentValue, EffectiveKind, EffectiveStatement, Revision, SourceIdentifier,
    StatementDefinition as Def,
};
use yang_reactor::{
    BuildContext, CopyPolicy, EffectiveBase, FailedPrerequisites, InferenceAction,
    InferenceContext, ModelProcessingPhase as Phase, ParserNamespace, Prerequisite, ReactorError,
    Result, SourceLink, StatementSupport, StmtId, StmtMut, SubstatementValidator,
};

use crate::argument::{module_of, source_error, ArgumentKind};
use crate::namespaces::{
    ModuleByName, ModuleNamespace, ModuleQName, PrefixToModule, SubmoduleByName, SubmoduleNamespace,
};
use crate::stmt::module::{child_identifier, name_argument};

fn revision_date(build: &BuildContext, id: StmtId) -> Option<Revision> {
    build
        .find_substatement(id, Def::RevisionDate)
        .and_then(|date| build.argument(date).as_revision())
        .cloned()
}

/// Identity named by an `import` or `include`.
fn requested_identity(build: &BuildContext, id: StmtId) -> SourceIdentifier {
    SourceIdentifier::new(name_argument(build, id), revision_date(build, id))
}

/// Root registered under `identity`; without a revision, the latest one.
fn find_root<ById, ByName>(
    identity: SourceIdentifier,
) -> impl Fn(&BuildContext, StmtId) -> Result<Option<StmtId>> + 'static
where
    ById: ParserNamespace<Key = SourceIdentifier, Value = StmtId>,
    ByName: ParserNamespace<Key = String, Value = StmtId>,
{
    move |build: &BuildContext, at: StmtId| {
        let found = match identity.revision {
            Some(_) => build.namespace_get::<ById>(at, &identity)?,
            None => build.namespace_get::<ByName>(at, &identity.name)?,
        };
        Ok(found.copied())
    }
}

/// Bind `prefix` at the root of `owner` to the module identity of `target`.
fn bind_prefix(ctx: &mut InferenceContext<'_>, prefix: &str, target: StmtId) -> Result<()> {
    let owner = ctx.owner();
    let module = module_of(ctx, target)?;
    let key = prefix.to_string();
    let existing = ctx.namespace_get::<PrefixToModule>(owner, &key)?.cloned();
    if let Some(existing) = existing.filter(|existing| *existing != module) {
        return Err(source_error(
            ctx,
            owner,
            format!("prefix '{prefix}' is already bound to {existing}"),
        ));
    }
    ctx.namespace_add::<PrefixToModule>(owner, key, module)?;
    Ok(())
}

// ============================================================================
// import
// ============================================================================

pub struct ImportSupport {
    validator: SubstatementValidator,
}

impl Default for ImportSupport {
    fn default() -> Self {
        Self {
            validator: SubstatementValidator::builder(Def::Import)
                .add_mandatory(Def::Prefix)
                .add_optional(Def::RevisionDate)
                .add_optional(Def::Description)
                .add_optional(Def::Reference)
                .build(),
        }
    }
}

impl StatementSupport for ImportSupport {
    fn definition(&self) -> Def {
        Def::Import
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

    fn on_linkage_declared(&self, ctx: &mut StmtMut<'_>) -> Result<()> {
        let id = ctx.id();
        let identity = requested_identity(ctx, id);
        let prefix = child_identifier(ctx, id, Def::Prefix)
            .ok_or_else(|| source_error(ctx, id, "import has no prefix"))?;

        let mut action = ctx.new_inference_action(Phase::SourceLinkage);
        let target = action.requires_found(
            id,
            format!("module {identity}"),
            find_root::<ModuleNamespace, ModuleByName>(identity.clone()),
            Phase::SourcePreLinkage,
        );
        action.apply(ImportAction {
            target,
            identity,
            prefix,
        })
    }

    fn create_effective(&self, build: &BuildContext, id: StmtId, base: EffectiveBase) -> Result<EffectiveStatement> {
        let kind = EffectiveKind::Import {
            module: requested_identity(build, id),
            prefix: child_identifier(build, id, Def::Prefix).unwrap_or_default(),
        };
        Ok(base.into_statement(kind))
    }
}

struct ImportAction {
    target: Prerequisite,
    identity: SourceIdentifier,
    prefix: String,
}

impl InferenceAction for ImportAction {
    fn apply(&mut self, ctx: &mut InferenceContext<'_>) -> Result<()> {
        let owner = ctx.owner();
        let target = ctx.resolve(self.target)?;
        bind_prefix(ctx, &self.prefix, target)?;
        ctx.link_sources(owner, target, SourceLink::Import);
        trace!(import = %self.identity, source = %ctx.source_name(target), "resolved import");
        Ok(())
    }

    fn prerequisite_failed(&mut self, failed: &FailedPrerequisites<'_>) -> ReactorError {
        ReactorError::inference(
            failed.reference(failed.owner()),
            format!("Imported module {} was not found", self.identity),
        )
    }
}

// ============================================================================
// include
// ============================================================================

pub struct IncludeSupport {
    validator: SubstatementValidator,
}

impl Default for IncludeSupport {
    fn default() -> Self {
        Self {
            validator: SubstatementValidator::builder(Def::Include)
                .add_optional(Def::RevisionDate)
                .add_optional(Def::Description)
                .add_optional(Def::Reference)
                .build(),
        }
    }
}

impl StatementSupport for IncludeSupport {
    fn definition(&self) -> Def {
        Def::Include
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

    fn on_linkage_declared(&self, ctx: &mut StmtMut<'_>) -> Result<()> {
        let id = ctx.id();
        let identity = requested_identity(ctx, id);
        let mut action = ctx.new_inference_action(Phase::SourceLinkage);
        let target = action.requires_found(
            id,
            format!("submodule {identity}"),
            find_root::<SubmoduleNamespace, SubmoduleByName>(identity.clone()),
            Phase::SourcePreLinkage,
        );
        action.apply(IncludeAction { target, identity })
    }
}

struct IncludeAction {
    target: Prerequisite,
    identity: SourceIdentifier,
}

/// Name of the module the root of `id` is, or belongs to.
fn owning_module_name(build: &BuildContext, id: StmtId) -> Option<String> {
    let root = build.root(id);
    match build.definition(root) {
        Def::Module => Some(name_argument(build, root).to_string()),
        _ => child_identifier(build, root, Def::BelongsTo),
    }
}

impl InferenceAction for IncludeAction {
    fn apply(&mut self, ctx: &mut InferenceContext<'_>) -> Result<()> {
        let owner = ctx.owner();
        let target = ctx.resolve(self.target)?;
        let expected = owning_module_name(ctx, owner);
        let actual = owning_module_name(ctx, target);
        if expected != actual {
            return Err(ReactorError::inference(
                ctx.reference(owner),
                format!(
                    "Included submodule {} belongs to {} instead of {}",
                    self.identity,
                    actual.unwrap_or_default(),
                    expected.unwrap_or_default()
                ),
            ));
        }
        ctx.link_sources(owner, target, SourceLink::Include);
        ctx.link_sources(target, owner, SourceLink::Include);
        trace!(include = %self.identity, "resolved include");
        Ok(())
    }

    fn prerequisite_failed(&mut self, failed: &FailedPrerequisites<'_>) -> ReactorError {
        ReactorError::inference(
            failed.reference(failed.owner()),
            format!("Included submodule {} was not found", self.identity),
        )
    }
}

// ============================================================================
// belongs-to
// ============================================================================

pub struct BelongsToSupport {
    validator: SubstatementValidator,
}

impl Default for BelongsToSupport {
    fn default() -> Self {
        Self {
            validator: SubstatementValidator::builder(Def::BelongsTo)
                .add_mandatory(Def::Prefix)
                .build(),
        }
    }
}

impl StatementSupport for BelongsToSupport {
    fn definition(&self) -> Def {
        Def::BelongsTo
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

    fn on_linkage_declared(&self, ctx: &mut StmtMut<'_>) -> Result<()> {
        let id = ctx.id();
        let module = name_argument(ctx, id).to_string();
        let prefix = child_identifier(ctx, id, Def::Prefix)
            .ok_or_else(|| source_error(ctx, id, "belongs-to has no prefix"))?;

        let mut action = ctx.new_inference_action(Phase::SourceLinkage);
        let target = action.requires_found(
            id,
            format!("module {module}"),
            find_root::<ModuleNamespace, ModuleByName>(SourceIdentifier::new(module.clone(), None)),
            Phase::SourcePreLinkage,
        );
        action.apply(BelongsToAction {
            target,
            module,
            prefix,
        })
    }
}

struct BelongsToAction {
    target: Prerequisite,
    module: String,
    prefix: String,
}

impl InferenceAction for BelongsToAction {
    fn apply(&mut self, ctx: &mut InferenceContext<'_>) -> Result<()> {
        let owner = ctx.owner();
        let target = ctx.resolve(self.target)?;
        let module = module_of(ctx, target)?;
        ctx.namespace_add::<ModuleQName>(owner, (), module)?;
        bind_prefix(ctx, &self.prefix, target)?;
        ctx.link_sources(owner, target, SourceLink::Include);
        Ok(())
    }

    fn prerequisite_failed(&mut self, failed: &FailedPrerequisites<'_>) -> ReactorError {
        ReactorError::inference(
            failed.reference(failed.owner()),
            format!("Module {} that the submodule belongs to was not found", self.module),
        )
    }
}
