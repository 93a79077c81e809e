//! `grouping`, `uses` and `refine`
//!
//! Groupings register in the tree-scoped grouping namespace of their parent
//! as they are declared. Each `uses` schedules one action for the effective
//! model phase which waits for its grouping to be fully expanded (nested
//! `uses` included), then copies the grouping's schema nodes under the
//! parent of the `uses`:
//!
//! ```text
//! grouping g { leaf x; }        container c {
//! container c { uses g; }   =>      leaf x;      (added by uses, rebound
//!                                 }               to the module of `uses`)
//! ```
//!
//! `refine` statements under the `uses` are applied to the fresh copies
//! before anything else can observe them.

use tracing::trace;
use yang_model::{
    ArgumentValue, CopyType, EffectiveKind, EffectiveStatement, QName, SchemaNodeIdentifier,
    StatementDefinition as Def,
};
use yang_reactor::{
    BuildContext, CopyPolicy, EffectiveBase, FailedPrerequisites, InferenceAction,
    InferenceContext, ModelProcessingPhase as Phase, Prerequisite, ReactorError, Result,
    StatementSupport, StmtId, StmtMut, SubstatementValidator,
};

use crate::argument::{module_of, source_error, ArgumentKind};
use crate::namespaces::GroupingNamespace;
use crate::stmt::{
    add_schema_tree_child, copied_children, data_definitions, documented, in_ignored_source,
    index_copied_schema_tree, qname_argument, register_unique, schema_child,
};

/// Substatements a refine replaces rather than adds to.
const REPLACED_BY_REFINE: &[Def] = &[
    Def::Description,
    Def::Reference,
    Def::Default,
    Def::Config,
    Def::Mandatory,
    Def::Presence,
    Def::MinElements,
    Def::MaxElements,
];

// ============================================================================
// grouping
// ============================================================================

pub struct GroupingSupport {
    validator: SubstatementValidator,
}

impl Default for GroupingSupport {
    fn default() -> Self {
        Self {
            validator: data_definitions(documented(SubstatementValidator::builder(Def::Grouping)))
                .add_any(Def::Typedef)
                .add_any(Def::Grouping)
                .build(),
        }
    }
}

impl StatementSupport for GroupingSupport {
    fn definition(&self) -> Def {
        Def::Grouping
    }

    fn copy_policy(&self) -> CopyPolicy {
        CopyPolicy::ContextIndependent
    }

    fn parse_argument(&self, build: &BuildContext, id: StmtId, raw: Option<&str>) -> Result<ArgumentValue> {
        ArgumentKind::LocalQName.parse(build, id, raw)
    }

    fn validator(&self) -> Option<&SubstatementValidator> {
        Some(&self.validator)
    }

    fn on_statement_added(&self, ctx: &mut StmtMut<'_>) -> Result<()> {
        let id = ctx.id();
        let parent = ctx.parent(id).unwrap_or(id);
        register_unique::<GroupingNamespace>(ctx, parent, "grouping")
    }

    fn create_effective(&self, _build: &BuildContext, _id: StmtId, base: EffectiveBase) -> Result<EffectiveStatement> {
        Ok(base.into_statement(EffectiveKind::Grouping))
    }
}

// ============================================================================
// uses
// ============================================================================

pub struct UsesSupport {
    validator: SubstatementValidator,
}

impl Default for UsesSupport {
    fn default() -> Self {
        Self {
            validator: documented(SubstatementValidator::builder(Def::Uses))
                .add_optional(Def::When)
                .add_any(Def::IfFeature)
                .add_any(Def::Refine)
                .add_any(Def::Augment)
                .build(),
        }
    }
}

/// True if `ancestor` encloses `id`.
fn is_ancestor(build: &BuildContext, ancestor: StmtId, id: StmtId) -> bool {
    let mut current = build.parent(id);
    while let Some(at) = current {
        if at == ancestor {
            return true;
        }
        current = build.parent(at);
    }
    false
}

impl StatementSupport for UsesSupport {
    fn definition(&self) -> Def {
        Def::Uses
    }

    fn copy_policy(&self) -> CopyPolicy {
        CopyPolicy::Ignore
    }

    fn parse_argument(&self, build: &BuildContext, id: StmtId, raw: Option<&str>) -> Result<ArgumentValue> {
        ArgumentKind::PrefixedQName.parse(build, id, raw)
    }

    fn validator(&self) -> Option<&SubstatementValidator> {
        Some(&self.validator)
    }

    fn on_full_definition_declared(&self, ctx: &mut StmtMut<'_>) -> Result<()> {
        let id = ctx.id();
        if in_ignored_source(ctx, id) {
            return Ok(());
        }
        let name = qname_argument(ctx, id)?;
        let parent = ctx
            .parent(id)
            .ok_or_else(|| source_error(ctx, id, "uses cannot be a root statement"))?;

        // Every grouping is declared by now, so a self-reference shows up here
        // instead of as an unresolvable action.
        let visible = ctx.namespace_get::<GroupingNamespace>(id, &name)?.copied();
        if visible.is_some_and(|grouping| is_ancestor(ctx, grouping, id)) {
            return Err(source_error(
                ctx,
                id,
                format!("grouping '{}' uses itself", name.local_name),
            ));
        }

        let mut action = ctx.new_inference_action(Phase::EffectiveModel);
        let grouping =
            action.requires_ctx_in::<GroupingNamespace>(id, name.clone(), Phase::EffectiveModel);
        let target = action.mutates_ctx(parent, Phase::EffectiveModel);
        action.apply(UsesAction {
            grouping,
            target,
            name,
        })
    }

    fn create_effective(&self, build: &BuildContext, id: StmtId, base: EffectiveBase) -> Result<EffectiveStatement> {
        let grouping = qname_argument(build, id)?;
        Ok(base.into_statement(EffectiveKind::Uses { grouping }))
    }
}

struct UsesAction {
    grouping: Prerequisite,
    target: Prerequisite,
    name: QName,
}

impl InferenceAction for UsesAction {
    fn apply(&mut self, ctx: &mut InferenceContext<'_>) -> Result<()> {
        let uses = ctx.owner();
        let grouping = ctx.resolve(self.grouping)?;
        let target = ctx.resolve(self.target)?;
        let module = module_of(ctx, uses)?;
        let enabled = ctx.is_supported_by_features(uses);

        let mut copies = Vec::new();
        for child in copied_children(ctx, grouping) {
            let Some(copy) = ctx.copy_as_child_of(child, target, CopyType::AddedByUses, Some(&module))? else {
                continue;
            };
            if ctx.definition(copy).is_schema_tree() {
                if add_schema_tree_child(ctx, target, copy)?.is_some() {
                    let name = qname_argument(ctx, copy)?;
                    return Err(ReactorError::inference(
                        ctx.reference(uses),
                        format!(
                            "Node '{}' added by uses of '{}' already exists in {}",
                            name.local_name,
                            self.name.local_name,
                            ctx.describe(target)
                        ),
                    ));
                }
                index_copied_schema_tree(ctx, copy)?;
            }
            if !enabled {
                ctx.set_supported_to_build_effective(copy, false);
            }
            copies.push(copy);
        }
        trace!(
            uses = %ctx.describe(uses),
            copies = copies.len(),
            "instantiated grouping"
        );
        ctx.add_effective_substatements(target, copies.clone())?;

        let refines: Vec<StmtId> = ctx
            .declared_substatements(uses)
            .iter()
            .copied()
            .filter(|child| ctx.definition(*child) == Def::Refine)
            .collect();
        for refine in refines {
            apply_refine(ctx, refine, &copies)?;
        }
        Ok(())
    }

    fn prerequisite_failed(&mut self, failed: &FailedPrerequisites<'_>) -> ReactorError {
        ReactorError::inference(
            failed.reference(failed.owner()),
            format!("Grouping '{}' was not resolved.", self.name.local_name),
        )
    }
}

/// Node addressed by a refine, searched among the copies a `uses` made.
fn refine_target(build: &BuildContext, path: &SchemaNodeIdentifier, copies: &[StmtId]) -> Option<StmtId> {
    let (first, rest) = path.steps.split_first()?;
    let mut current = copies.iter().copied().find(|copy| {
        build.definition(*copy).is_schema_tree() && build.argument(*copy).as_qname() == Some(first)
    })?;
    for step in rest {
        current = schema_child(build, current, step)?;
    }
    Some(current)
}

fn apply_refine(ctx: &mut InferenceContext<'_>, refine: StmtId, copies: &[StmtId]) -> Result<()> {
    let Some(path) = ctx.argument(refine).as_schema_node_id().cloned() else {
        return Ok(());
    };
    let target = refine_target(ctx, &path, copies).ok_or_else(|| {
        ReactorError::inference(
            ctx.reference(refine),
            format!("Refine target '{path}' not found"),
        )
    })?;

    let changes = ctx.declared_substatements(refine).to_vec();
    for definition in REPLACED_BY_REFINE {
        if !changes.iter().any(|change| ctx.definition(*change) == *definition) {
            continue;
        }
        while let Some(existing) = ctx.find_substatement(target, *definition) {
            if !ctx.remove_effective_substatement(target, existing)? {
                break;
            }
        }
    }
    for change in changes {
        if let Some(copy) = ctx.copy_as_child_of(change, target, CopyType::AddedByUses, None)? {
            ctx.add_effective_substatement(target, copy)?;
        }
    }
    trace!(refine = %path, target = %ctx.describe(target), "applied refine");
    Ok(())
}

// ============================================================================
// refine
// ============================================================================

pub struct RefineSupport {
    validator: SubstatementValidator,
}

impl Default for RefineSupport {
    fn default() -> Self {
        Self {
            validator: SubstatementValidator::builder(Def::Refine)
                .add_any(Def::IfFeature)
                .add_any(Def::Must)
                .add_optional(Def::Presence)
                .add_any(Def::Default)
                .add_optional(Def::Config)
                .add_optional(Def::Mandatory)
                .add_optional(Def::MinElements)
                .add_optional(Def::MaxElements)
                .add_optional(Def::Description)
                .add_optional(Def::Reference)
                .build(),
        }
    }
}

impl StatementSupport for RefineSupport {
    fn definition(&self) -> Def {
        Def::Refine
    }

    fn copy_policy(&self) -> CopyPolicy {
        CopyPolicy::Ignore
    }

    fn parse_argument(&self, build: &BuildContext, id: StmtId, raw: Option<&str>) -> Result<ArgumentValue> {
        let argument = ArgumentKind::SchemaNodeId.parse(build, id, raw)?;
        if argument.as_schema_node_id().is_some_and(|path| path.absolute) {
            return Err(source_error(
                build,
                id,
                "refine target must be a descendant schema node identifier",
            ));
        }
        Ok(argument)
    }

    fn validator(&self) -> Option<&SubstatementValidator> {
        Some(&self.validator)
    }
}
