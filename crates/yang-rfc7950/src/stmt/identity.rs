//! `identity` and `base`
//!
//! Identities live in one global namespace. A `base` under an identity
//! records the derivation on the base identity while statement definitions
//! are being resolved, so every identity knows its derived identities by the
//! time the effective model is built. A `base` under `type` (identityref)
//! only has to resolve.

use yang_model::{ArgumentValue, EffectiveKind, EffectiveStatement, QName, StatementDefinition as Def};
use yang_reactor::{
    BuildContext, CopyPolicy, EffectiveBase, FailedPrerequisites, InferenceAction,
    InferenceContext, ModelProcessingPhase as Phase, ParserNamespace, Prerequisite, ReactorError,
    Result, StatementSupport, StmtId, StmtMut, SubstatementValidator,
};

use crate::argument::ArgumentKind;
use crate::namespaces::{DerivedIdentities, IdentityNamespace};
use crate::stmt::{documented, in_ignored_source, qname_argument, register_unique};

pub struct IdentitySupport {
    validator: SubstatementValidator,
}

impl Default for IdentitySupport {
    fn default() -> Self {
        Self {
            validator: documented(SubstatementValidator::builder(Def::Identity))
                .add_any(Def::Base)
                .add_any(Def::IfFeature)
                .build(),
        }
    }
}

impl StatementSupport for IdentitySupport {
    fn definition(&self) -> Def {
        Def::Identity
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
        register_unique::<IdentityNamespace>(ctx, id, "identity")
    }

    fn create_effective(&self, build: &BuildContext, id: StmtId, base: EffectiveBase) -> Result<EffectiveStatement> {
        let bases = base
            .substatements
            .iter()
            .filter(|child| child.definition == Def::Base)
            .filter_map(|child| child.argument.as_qname().cloned())
            .collect();
        let derived = build
            .namespace_get_all::<DerivedIdentities>(id)?
            .map(|all| all.keys().cloned().collect())
            .unwrap_or_default();
        Ok(base.into_statement(EffectiveKind::Identity { bases, derived }))
    }
}

// ============================================================================
// base
// ============================================================================

#[derive(Default)]
pub struct BaseSupport;

fn identity_lookup(name: QName) -> impl Fn(&BuildContext, StmtId) -> Result<Option<StmtId>> + 'static {
    move |build: &BuildContext, at: StmtId| Ok(build.namespace_get::<IdentityNamespace>(at, &name)?.copied())
}

impl StatementSupport for BaseSupport {
    fn definition(&self) -> Def {
        Def::Base
    }

    fn copy_policy(&self) -> CopyPolicy {
        CopyPolicy::ContextIndependent
    }

    fn parse_argument(&self, build: &BuildContext, id: StmtId, raw: Option<&str>) -> Result<ArgumentValue> {
        ArgumentKind::PrefixedQName.parse(build, id, raw)
    }

    fn on_statement_definition_declared(&self, ctx: &mut StmtMut<'_>) -> Result<()> {
        let id = ctx.id();
        let Some(identity) = ctx.parent(id).filter(|parent| ctx.definition(*parent) == Def::Identity) else {
            return Ok(());
        };
        if in_ignored_source(ctx, id) {
            return Ok(());
        }
        let base = qname_argument(ctx, id)?;
        let derived = qname_argument(ctx, identity)?;

        let mut action = ctx.new_inference_action(Phase::StatementDefinition);
        let target = action.mutates_found(
            id,
            format!("{} {:?}", IdentityNamespace::NAME, base),
            identity_lookup(base.clone()),
            Phase::StatementDefinition,
        );
        action.apply(DeriveIdentityAction {
            target,
            base,
            derived,
        })
    }

    fn on_full_definition_declared(&self, ctx: &mut StmtMut<'_>) -> Result<()> {
        let id = ctx.id();
        let under_type = ctx
            .parent(id)
            .is_some_and(|parent| ctx.definition(parent) == Def::Type);
        if !under_type || in_ignored_source(ctx, id) {
            return Ok(());
        }
        let base = qname_argument(ctx, id)?;
        let mut action = ctx.new_inference_action(Phase::EffectiveModel);
        action.requires_ctx_in::<IdentityNamespace>(id, base.clone(), Phase::StatementDefinition);
        action.apply(ResolveBaseAction { base })
    }
}

/// Records `derived` on the identity named by a `base`.
struct DeriveIdentityAction {
    target: Prerequisite,
    base: QName,
    derived: QName,
}

impl InferenceAction for DeriveIdentityAction {
    fn apply(&mut self, ctx: &mut InferenceContext<'_>) -> Result<()> {
        let owner = ctx.owner();
        let target = ctx.resolve(self.target)?;
        let Some(identity) = ctx.parent(owner) else {
            return Ok(());
        };
        if target == identity {
            return Err(ReactorError::inference(
                ctx.reference(owner),
                format!("Identity '{}' is derived from itself", self.derived.local_name),
            ));
        }
        ctx.namespace_add::<DerivedIdentities>(target, self.derived.clone(), identity)?;
        Ok(())
    }

    fn prerequisite_failed(&mut self, failed: &FailedPrerequisites<'_>) -> ReactorError {
        ReactorError::inference(
            failed.reference(failed.owner()),
            format!(
                "Base identity '{}' of identity '{}' was not found",
                self.base.local_name, self.derived.local_name
            ),
        )
    }
}

/// Identityref base: only needs to exist.
struct ResolveBaseAction {
    base: QName,
}

impl InferenceAction for ResolveBaseAction {
    fn apply(&mut self, _ctx: &mut InferenceContext<'_>) -> Result<()> {
        Ok(())
    }

    fn prerequisite_failed(&mut self, failed: &FailedPrerequisites<'_>) -> ReactorError {
        ReactorError::inference(
            failed.reference(failed.owner()),
            format!("Referenced base identity '{}' was not found", self.base.local_name),
        )
    }
}
