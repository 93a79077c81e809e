//! `augment`
//!
//! A top-level augment names its target with an absolute schema node
//! identifier; one nested in `uses` names it relative to the nodes that
//! `uses` instantiates. Either way the target may not exist until other
//! `uses` and `augment` statements have run, so the augment waits for its
//! target in the effective model phase and then copies its schema nodes
//! into it.

use tracing::debug;
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
use crate::namespaces::SchemaTreeNamespace;
use crate::stmt::{
    add_schema_tree_child, copied_children, data_definitions, documented, in_ignored_source,
    index_copied_schema_tree, is_mandatory, schema_child,
};

pub struct AugmentSupport {
    validator: SubstatementValidator,
}

impl Default for AugmentSupport {
    fn default() -> Self {
        Self {
            validator: data_definitions(documented(SubstatementValidator::builder(Def::Augment)))
                .add_optional(Def::When)
                .add_any(Def::IfFeature)
                .add_any(Def::Case)
                .build(),
        }
    }
}

fn is_under_uses(build: &BuildContext, id: StmtId) -> bool {
    build
        .parent(id)
        .is_some_and(|parent| build.definition(parent) == Def::Uses)
}

/// Top-level schema node `name` of its module, looked up in every source
/// that defines names of that module (the module and its submodules).
pub(crate) fn top_level_node(build: &BuildContext, name: &QName) -> Option<StmtId> {
    build
        .source_roots()
        .into_iter()
        .filter(|root| build.is_supported_to_build_effective(*root))
        .filter(|root| module_of(build, *root).is_ok_and(|module| module == name.module))
        .find_map(|root| schema_child(build, root, name))
}

/// Node `path` names, if it exists yet. A descendant path starts at the
/// nodes of the `uses` that `id` is nested in.
pub(crate) fn find_target(build: &BuildContext, id: StmtId, path: &SchemaNodeIdentifier) -> Option<StmtId> {
    let (first, rest) = path.steps.split_first()?;
    let mut current = if path.absolute {
        top_level_node(build, first)?
    } else {
        let uses = build.parent(id)?;
        schema_child(build, build.parent(uses)?, first)?
    };
    for step in rest {
        current = schema_child(build, current, step)?;
    }
    Some(current)
}

pub(crate) fn target_path(build: &BuildContext, id: StmtId) -> Result<SchemaNodeIdentifier> {
    build.argument(id).as_schema_node_id().cloned().ok_or_else(|| {
        ReactorError::internal(
            build.reference(id),
            format!("{} has no target", build.describe(id)),
        )
    })
}

impl StatementSupport for AugmentSupport {
    fn definition(&self) -> Def {
        Def::Augment
    }

    fn copy_policy(&self) -> CopyPolicy {
        CopyPolicy::Ignore
    }

    fn parse_argument(&self, build: &BuildContext, id: StmtId, raw: Option<&str>) -> Result<ArgumentValue> {
        let argument = ArgumentKind::SchemaNodeId.parse(build, id, raw)?;
        let absolute = argument.as_schema_node_id().is_some_and(|path| path.absolute);
        match (is_under_uses(build, id), absolute) {
            (true, true) => Err(source_error(
                build,
                id,
                "augment in uses must use a descendant schema node identifier",
            )),
            (false, false) => Err(source_error(
                build,
                id,
                "augment must use an absolute schema node identifier",
            )),
            _ => Ok(argument),
        }
    }

    fn validator(&self) -> Option<&SubstatementValidator> {
        Some(&self.validator)
    }

    fn on_full_definition_declared(&self, ctx: &mut StmtMut<'_>) -> Result<()> {
        let id = ctx.id();
        if in_ignored_source(ctx, id) {
            return Ok(());
        }
        let path = target_path(ctx, id)?;
        let under_uses = is_under_uses(ctx, id);

        let mut action = ctx.new_inference_action(Phase::EffectiveModel);
        let lookup_path = path.clone();
        let target = action.mutates_found(
            id,
            format!("augment target {path}"),
            move |build: &BuildContext, at: StmtId| Ok(find_target(build, at, &lookup_path)),
            Phase::EffectiveModel,
        );
        // Nested uses and augments inside this augment run first.
        action.requires_ctx(id, Phase::EffectiveModel);
        action.apply(AugmentAction {
            target,
            path,
            under_uses,
        })
    }

    fn create_effective(&self, build: &BuildContext, id: StmtId, base: EffectiveBase) -> Result<EffectiveStatement> {
        let target = target_path(build, id)?;
        Ok(base.into_statement(EffectiveKind::Augment { target }))
    }
}

struct AugmentAction {
    target: Prerequisite,
    path: SchemaNodeIdentifier,
    under_uses: bool,
}

impl AugmentAction {
    fn check_child(&self, ctx: &InferenceContext<'_>, target: StmtId, child: StmtId) -> Result<()> {
        let augment = ctx.owner();
        let Some(name) = ctx.argument(child).as_qname() else {
            return Ok(());
        };
        if ctx.namespace_get::<SchemaTreeNamespace>(target, name)?.is_some() {
            return Err(ReactorError::inference(
                ctx.reference(child),
                format!(
                    "Node '{}' added by augment '{}' already exists in the target",
                    name.local_name, self.path
                ),
            ));
        }

        let foreign = ctx
            .argument(target)
            .as_qname()
            .is_some_and(|target_name| target_name.module != name.module);
        let conditional = self.under_uses || ctx.find_substatement(augment, Def::When).is_some();
        if foreign && !conditional && is_mandatory(ctx, child) {
            return Err(ReactorError::inference(
                ctx.reference(child),
                format!(
                    "Augment '{}' adds mandatory node '{}' to a node of another module",
                    self.path, name.local_name
                ),
            ));
        }
        Ok(())
    }
}

impl InferenceAction for AugmentAction {
    fn apply(&mut self, ctx: &mut InferenceContext<'_>) -> Result<()> {
        let augment = ctx.owner();
        let target = ctx.resolve(self.target)?;
        let definition = ctx.definition(target);
        if !matches!(definition, Def::Container | Def::List | Def::Choice | Def::Case) {
            return Err(ReactorError::inference(
                ctx.reference(augment),
                format!("Augment target '{}' is a {definition} and cannot be augmented", self.path),
            ));
        }

        let copy_type = if self.under_uses {
            CopyType::AddedByUsesAugmentation
        } else {
            CopyType::AddedByAugmentation
        };
        let enabled = ctx.is_supported_by_features(augment);

        let mut copies = Vec::new();
        for child in copied_children(ctx, augment) {
            self.check_child(ctx, target, child)?;
            if let Some(copy) = ctx.copy_as_child_of(child, target, copy_type, None)? {
                if ctx.definition(copy).is_schema_tree() {
                    add_schema_tree_child(ctx, target, copy)?;
                    index_copied_schema_tree(ctx, copy)?;
                }
                if !enabled {
                    ctx.set_supported_to_build_effective(copy, false);
                }
                copies.push(copy);
            }
        }
        debug!(
            augment = %self.path,
            target = %ctx.describe(target),
            nodes = copies.len(),
            "applied augment"
        );
        ctx.add_effective_substatements(target, copies)
    }

    fn prerequisite_failed(&mut self, failed: &FailedPrerequisites<'_>) -> ReactorError {
        let message = if failed.contains(self.target) {
            format!("Augment target '{}' not found", self.path)
        } else {
            format!(
                "Augment '{}' could not be applied: {}",
                self.path,
                failed.descriptions().collect::<Vec<_>>().join(", ")
            )
        };
        ReactorError::inference(failed.reference(failed.owner()), message)
    }
}
