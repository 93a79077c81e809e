//! `deviation` and `deviate`
//!
//! A deviation names a schema node, usually of another module, and each of
//! its `deviate` statements changes that node once it exists:
//!
//! | deviate         | effect on the target                                   |
//! |-----------------|--------------------------------------------------------|
//! | `not-supported` | left out of the effective model                         |
//! | `add`           | properties appended; single-valued ones must be absent  |
//! | `replace`       | properties swapped for the deviate's own                |
//! | `delete`        | properties with the same keyword and argument removed   |
//!
//! Like augments, deviations wait in the effective model phase for their
//! target, so nodes added by `uses` and `augment` can be deviated too.

use tracing::{debug, warn};
use yang_model::{
    ArgumentValue, DeviateKind, EffectiveKind, EffectiveStatement, SchemaNodeIdentifier,
    StatementDefinition as Def,
};
use yang_reactor::{
    BuildContext, CopyPolicy, EffectiveBase, FailedPrerequisites, InferenceAction,
    InferenceContext, ModelProcessingPhase as Phase, Prerequisite, ReactorError, Result,
    StatementSupport, StmtId, StmtMut, SubstatementValidator,
};

use crate::argument::{source_error, ArgumentKind};
use crate::stmt::augment::{find_target, target_path};
use crate::stmt::in_ignored_source;

pub struct DeviationSupport {
    validator: SubstatementValidator,
}

impl Default for DeviationSupport {
    fn default() -> Self {
        Self {
            validator: SubstatementValidator::builder(Def::Deviation)
                .add_optional(Def::Description)
                .add_optional(Def::Reference)
                .add_at_least_one(Def::Deviate)
                .build(),
        }
    }
}

impl StatementSupport for DeviationSupport {
    fn definition(&self) -> Def {
        Def::Deviation
    }

    fn copy_policy(&self) -> CopyPolicy {
        CopyPolicy::Reject
    }

    fn parse_argument(&self, build: &BuildContext, id: StmtId, raw: Option<&str>) -> Result<ArgumentValue> {
        let argument = ArgumentKind::SchemaNodeId.parse(build, id, raw)?;
        if !argument.as_schema_node_id().is_some_and(|path| path.absolute) {
            return Err(source_error(
                build,
                id,
                "deviation must use an absolute schema node identifier",
            ));
        }
        Ok(argument)
    }

    fn validator(&self) -> Option<&SubstatementValidator> {
        Some(&self.validator)
    }

    fn on_full_definition_declared(&self, ctx: &mut StmtMut<'_>) -> Result<()> {
        let id = ctx.id();
        let deviates: Vec<StmtId> = ctx
            .declared_substatements(id)
            .iter()
            .copied()
            .filter(|child| ctx.definition(*child) == Def::Deviate)
            .collect();
        let not_supported = deviates
            .iter()
            .any(|deviate| ctx.argument(*deviate).as_deviate() == Some(DeviateKind::NotSupported));
        if not_supported && deviates.len() > 1 {
            return Err(source_error(
                ctx,
                id,
                "deviate not-supported cannot be combined with other deviates",
            ));
        }
        Ok(())
    }

    fn create_effective(&self, build: &BuildContext, id: StmtId, base: EffectiveBase) -> Result<EffectiveStatement> {
        let target = target_path(build, id)?;
        Ok(base.into_statement(EffectiveKind::Deviation { target }))
    }
}

/// `deviate`: substatements accepted depend on the deviate kind, so the
/// validator is picked once the argument is known.
pub struct DeviateSupport {
    not_supported: SubstatementValidator,
    add: SubstatementValidator,
    replace: SubstatementValidator,
    delete: SubstatementValidator,
}

impl Default for DeviateSupport {
    fn default() -> Self {
        Self {
            not_supported: SubstatementValidator::builder(Def::Deviate).build(),
            add: SubstatementValidator::builder(Def::Deviate)
                .add_optional(Def::Config)
                .add_any(Def::Default)
                .add_optional(Def::Mandatory)
                .add_optional(Def::MaxElements)
                .add_optional(Def::MinElements)
                .add_any(Def::Must)
                .add_optional(Def::Units)
                .build(),
            replace: SubstatementValidator::builder(Def::Deviate)
                .add_optional(Def::Config)
                .add_optional(Def::Default)
                .add_optional(Def::Mandatory)
                .add_optional(Def::MaxElements)
                .add_optional(Def::MinElements)
                .add_optional(Def::Type)
                .add_optional(Def::Units)
                .build(),
            delete: SubstatementValidator::builder(Def::Deviate)
                .add_any(Def::Default)
                .add_any(Def::Must)
                .add_optional(Def::Units)
                .build(),
        }
    }
}

impl DeviateSupport {
    fn validator_for(&self, kind: DeviateKind) -> &SubstatementValidator {
        match kind {
            DeviateKind::NotSupported => &self.not_supported,
            DeviateKind::Add => &self.add,
            DeviateKind::Replace => &self.replace,
            DeviateKind::Delete => &self.delete,
        }
    }
}

fn deviate_kind(build: &BuildContext, id: StmtId) -> Result<DeviateKind> {
    build.argument(id).as_deviate().ok_or_else(|| {
        ReactorError::internal(
            build.reference(id),
            format!("{} has no deviate kind", build.describe(id)),
        )
    })
}

impl StatementSupport for DeviateSupport {
    fn definition(&self) -> Def {
        Def::Deviate
    }

    fn copy_policy(&self) -> CopyPolicy {
        CopyPolicy::Reject
    }

    fn parse_argument(&self, build: &BuildContext, id: StmtId, raw: Option<&str>) -> Result<ArgumentValue> {
        ArgumentKind::Deviate.parse(build, id, raw)
    }

    fn on_full_definition_declared(&self, ctx: &mut StmtMut<'_>) -> Result<()> {
        let id = ctx.id();
        let kind = deviate_kind(ctx, id)?;
        self.validator_for(kind).validate(ctx, id)?;
        if in_ignored_source(ctx, id) {
            return Ok(());
        }
        let Some(deviation) = ctx.parent(id) else {
            return Ok(());
        };
        let path = target_path(ctx, deviation)?;

        let mut action = ctx.new_inference_action(Phase::EffectiveModel);
        let lookup_path = path.clone();
        let target = action.mutates_found(
            id,
            format!("deviation target {path}"),
            move |build: &BuildContext, at: StmtId| Ok(find_target(build, at, &lookup_path)),
            Phase::EffectiveModel,
        );
        action.requires_ctx(id, Phase::EffectiveModel);
        action.apply(DeviateAction { target, path, kind })
    }

    fn create_effective(&self, _build: &BuildContext, _id: StmtId, base: EffectiveBase) -> Result<EffectiveStatement> {
        Ok(base.into_statement(EffectiveKind::Other))
    }
}

/// Properties a node can hold only once.
fn is_single_valued(property: Def, target: Def) -> bool {
    match property {
        Def::Units | Def::Config | Def::Mandatory | Def::MinElements | Def::MaxElements | Def::Type => true,
        Def::Default => target != Def::LeafList,
        _ => false,
    }
}

/// Properties every applicable node has implicitly, even when undeclared.
fn is_implicit(property: Def) -> bool {
    matches!(property, Def::Config | Def::Mandatory | Def::MinElements | Def::MaxElements)
}

/// Node kinds a deviate property may target.
fn is_valid_target(property: Def, target: Def) -> bool {
    match property {
        Def::Config => matches!(
            target,
            Def::Container | Def::Leaf | Def::LeafList | Def::List | Def::Choice | Def::Anydata | Def::Anyxml
        ),
        Def::Mandatory => matches!(target, Def::Leaf | Def::Choice | Def::Anydata | Def::Anyxml),
        Def::MinElements | Def::MaxElements => matches!(target, Def::List | Def::LeafList),
        Def::Type | Def::Units => matches!(target, Def::Leaf | Def::LeafList),
        Def::Default => matches!(target, Def::Leaf | Def::LeafList | Def::Choice),
        Def::Must => matches!(
            target,
            Def::Container | Def::Leaf | Def::LeafList | Def::List | Def::Anydata | Def::Anyxml
        ),
        _ => false,
    }
}

/// Substatement of `target` with the given keyword still in the model.
fn present(build: &BuildContext, target: StmtId, property: Def) -> Option<StmtId> {
    build.substatements(target).into_iter().find(|child| {
        build.definition(*child) == property && build.is_supported_to_build_effective(*child)
    })
}

struct DeviateAction {
    target: Prerequisite,
    path: SchemaNodeIdentifier,
    kind: DeviateKind,
}

impl DeviateAction {
    fn check_target(&self, ctx: &InferenceContext<'_>, property: StmtId, target: StmtId) -> Result<()> {
        let definition = ctx.definition(property);
        let target_definition = ctx.definition(target);
        if is_valid_target(definition, target_definition) {
            return Ok(());
        }
        Err(ReactorError::inference(
            ctx.reference(property),
            format!(
                "{target_definition} '{}' is not a valid deviation target for substatement {definition}",
                self.path
            ),
        ))
    }

    /// Drop `existing` from `target`, effective substatement or declared.
    fn retire(ctx: &mut InferenceContext<'_>, target: StmtId, existing: StmtId) -> Result<()> {
        if !ctx.remove_effective_substatement(target, existing)? {
            ctx.set_supported_to_build_effective(existing, false);
        }
        Ok(())
    }

    fn add(&self, ctx: &mut InferenceContext<'_>, property: StmtId, target: StmtId) -> Result<()> {
        let definition = ctx.definition(property);
        if is_single_valued(definition, ctx.definition(target)) && present(ctx, target, definition).is_some() {
            return Err(ReactorError::inference(
                ctx.reference(property),
                format!(
                    "Deviation cannot add substatement {definition} to '{}', it is already defined there",
                    self.path
                ),
            ));
        }
        ctx.add_effective_substatement(target, property)
    }

    fn replace(&self, ctx: &mut InferenceContext<'_>, property: StmtId, target: StmtId) -> Result<()> {
        let definition = ctx.definition(property);
        if definition == Def::Default && ctx.definition(target) == Def::LeafList {
            warn!(
                target = %self.path,
                at = %ctx.reference(property),
                "deviation cannot replace a leaf-list default, ignoring"
            );
            return Ok(());
        }
        match present(ctx, target, definition) {
            Some(existing) => Self::retire(ctx, target, existing)?,
            None if is_implicit(definition) => {}
            None => {
                return Err(ReactorError::inference(
                    ctx.reference(property),
                    format!(
                        "Deviation cannot replace substatement {definition} of '{}', it does not exist there",
                        self.path
                    ),
                ));
            }
        }
        ctx.add_effective_substatement(target, property)
    }

    fn delete(&self, ctx: &mut InferenceContext<'_>, property: StmtId, target: StmtId) -> Result<()> {
        let definition = ctx.definition(property);
        let argument = ctx.raw_argument(property);
        let existing = ctx.substatements(target).into_iter().find(|child| {
            ctx.definition(*child) == definition
                && ctx.raw_argument(*child) == argument
                && ctx.is_supported_to_build_effective(*child)
        });
        match existing {
            Some(existing) => Self::retire(ctx, target, existing),
            None => {
                warn!(
                    target = %self.path,
                    substatement = %definition,
                    argument = argument.unwrap_or_default(),
                    at = %ctx.reference(property),
                    "deviation cannot delete a substatement the target does not have"
                );
                Ok(())
            }
        }
    }
}

impl InferenceAction for DeviateAction {
    fn apply(&mut self, ctx: &mut InferenceContext<'_>) -> Result<()> {
        let deviate = ctx.owner();
        let target = ctx.resolve(self.target)?;
        if self.kind == DeviateKind::NotSupported {
            ctx.set_supported_to_build_effective(target, false);
            debug!(target = %self.path, "deviated node is not supported");
            return Ok(());
        }

        let properties = ctx.declared_substatements(deviate).to_vec();
        for property in properties {
            self.check_target(ctx, property, target)?;
            match self.kind {
                DeviateKind::Add => self.add(ctx, property, target)?,
                DeviateKind::Replace => self.replace(ctx, property, target)?,
                DeviateKind::Delete => self.delete(ctx, property, target)?,
                DeviateKind::NotSupported => {}
            }
        }
        debug!(target = %self.path, deviate = %self.kind, "applied deviate");
        Ok(())
    }

    fn prerequisite_failed(&mut self, failed: &FailedPrerequisites<'_>) -> ReactorError {
        let owner = failed.owner();
        let at = failed.parent(owner).unwrap_or(owner);
        ReactorError::inference(
            failed.reference(at),
            format!("Deviation target '{}' not found", self.path),
        )
    }
}
