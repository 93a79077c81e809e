//! `feature` and `if-feature`
//!
//! An `if-feature` is a guard on its parent: when its expression evaluates
//! false under the build configuration, the parent and everything below it
//! are left out of the effective model. Every feature an expression names
//! must still be defined, whether or not it is supported.

use yang_model::{ArgumentValue, EffectiveKind, EffectiveStatement, QName, StatementDefinition as Def};
use yang_reactor::{
    BuildContext, CopyPolicy, EffectiveBase, FailedPrerequisites, InferenceAction,
    InferenceContext, ModelProcessingPhase as Phase, Prerequisite, ReactorError, Result,
    StatementSupport, StmtId, StmtMut, SubstatementValidator,
};

use crate::argument::{source_error, ArgumentKind};
use crate::namespaces::FeatureNamespace;
use crate::stmt::{documented, in_ignored_source, register_unique};

pub struct FeatureSupport {
    validator: SubstatementValidator,
}

impl Default for FeatureSupport {
    fn default() -> Self {
        Self {
            validator: documented(SubstatementValidator::builder(Def::Feature))
                .add_any(Def::IfFeature)
                .build(),
        }
    }
}

impl StatementSupport for FeatureSupport {
    fn definition(&self) -> Def {
        Def::Feature
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
        register_unique::<FeatureNamespace>(ctx, id, "feature")
    }

    fn create_effective(&self, _build: &BuildContext, _id: StmtId, base: EffectiveBase) -> Result<EffectiveStatement> {
        Ok(base.into_statement(EffectiveKind::Feature))
    }
}

#[derive(Default)]
pub struct IfFeatureSupport;

impl StatementSupport for IfFeatureSupport {
    fn definition(&self) -> Def {
        Def::IfFeature
    }

    fn copy_policy(&self) -> CopyPolicy {
        CopyPolicy::ContextIndependent
    }

    fn parse_argument(&self, build: &BuildContext, id: StmtId, raw: Option<&str>) -> Result<ArgumentValue> {
        ArgumentKind::IfFeature.parse(build, id, raw)
    }

    fn feature_guard(&self, build: &BuildContext, id: StmtId) -> Option<bool> {
        let config = build.config();
        build
            .argument(id)
            .as_if_feature()
            .map(|expr| expr.evaluate(&|feature| config.is_feature_supported(feature)))
    }

    fn on_full_definition_declared(&self, ctx: &mut StmtMut<'_>) -> Result<()> {
        let id = ctx.id();
        if in_ignored_source(ctx, id) {
            return Ok(());
        }
        let features = ctx
            .argument(id)
            .as_if_feature()
            .map(|expr| expr.features())
            .ok_or_else(|| source_error(ctx, id, "if-feature has no expression"))?;

        let mut action = ctx.new_inference_action(Phase::EffectiveModel);
        let required = features
            .into_iter()
            .map(|feature| {
                let prerequisite = action.requires_ctx_in::<FeatureNamespace>(
                    id,
                    feature.clone(),
                    Phase::StatementDefinition,
                );
                (prerequisite, feature)
            })
            .collect();
        action.apply(IfFeatureAction { required })
    }
}

struct IfFeatureAction {
    required: Vec<(Prerequisite, QName)>,
}

impl InferenceAction for IfFeatureAction {
    fn apply(&mut self, _ctx: &mut InferenceContext<'_>) -> Result<()> {
        Ok(())
    }

    fn prerequisite_failed(&mut self, failed: &FailedPrerequisites<'_>) -> ReactorError {
        let missing: Vec<&str> = self
            .required
            .iter()
            .filter(|(prerequisite, _)| failed.contains(*prerequisite))
            .map(|(_, feature)| feature.local_name.as_str())
            .collect();
        ReactorError::inference(
            failed.reference(failed.owner()),
            format!(
                "If-feature statement refers to unknown feature(s): {}",
                missing.join(", ")
            ),
        )
    }
}
