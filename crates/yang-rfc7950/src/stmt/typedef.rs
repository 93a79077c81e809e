//! `typedef` and `type`

use tracing::trace;
use yang_model::{ArgumentValue, EffectiveKind, EffectiveStatement, QName, StatementDefinition as Def};
use yang_reactor::{
    BuildContext, CopyPolicy, EffectiveBase, FailedPrerequisites, InferenceAction,
    InferenceContext, ModelProcessingPhase as Phase, Prerequisite, ReactorError, Result,
    StatementSupport, StmtId, StmtMut, SubstatementValidator,
};

use crate::argument::{is_builtin_type, source_error, ArgumentKind, BUILTIN_TYPES};
use crate::namespaces::TypedefNamespace;
use crate::stmt::restriction::check_type_body;
use crate::stmt::{documented, in_ignored_source, qname_argument, register_unique};

pub struct TypedefSupport {
    validator: SubstatementValidator,
}

impl Default for TypedefSupport {
    fn default() -> Self {
        Self {
            validator: documented(SubstatementValidator::builder(Def::Typedef))
                .add_mandatory(Def::Type)
                .add_optional(Def::Units)
                .add_optional(Def::Default)
                .build(),
        }
    }
}

impl StatementSupport for TypedefSupport {
    fn definition(&self) -> Def {
        Def::Typedef
    }

    fn copy_policy(&self) -> CopyPolicy {
        CopyPolicy::ContextIndependent
    }

    fn parse_argument(&self, build: &BuildContext, id: StmtId, raw: Option<&str>) -> Result<ArgumentValue> {
        if let Some(name) = raw.filter(|name| BUILTIN_TYPES.contains(name)) {
            return Err(source_error(
                build,
                id,
                format!("typedef name '{name}' is a built-in type"),
            ));
        }
        ArgumentKind::LocalQName.parse(build, id, raw)
    }

    fn validator(&self) -> Option<&SubstatementValidator> {
        Some(&self.validator)
    }

    fn on_statement_added(&self, ctx: &mut StmtMut<'_>) -> Result<()> {
        let id = ctx.id();
        let parent = ctx.parent(id).unwrap_or(id);
        register_unique::<TypedefNamespace>(ctx, parent, "typedef")
    }

    fn create_effective(&self, _build: &BuildContext, _id: StmtId, base: EffectiveBase) -> Result<EffectiveStatement> {
        Ok(base.into_statement(EffectiveKind::Typedef))
    }
}

/// `type`: built-in types are complete as parsed; derived types must
/// resolve to a typedef in scope.
pub struct TypeSupport {
    validator: SubstatementValidator,
}

impl Default for TypeSupport {
    fn default() -> Self {
        Self {
            // Per-type rules live in `check_type_body`.
            validator: SubstatementValidator::builder(Def::Type)
                .add_any(Def::Type)
                .add_any(Def::Base)
                .add_any(Def::Enum)
                .add_any(Def::Bit)
                .add_optional(Def::Range)
                .add_optional(Def::Length)
                .add_any(Def::Pattern)
                .add_optional(Def::Path)
                .add_optional(Def::RequireInstance)
                .add_optional(Def::FractionDigits)
                .build(),
        }
    }
}

impl StatementSupport for TypeSupport {
    fn definition(&self) -> Def {
        Def::Type
    }

    fn copy_policy(&self) -> CopyPolicy {
        CopyPolicy::ContextIndependent
    }

    fn parse_argument(&self, build: &BuildContext, id: StmtId, raw: Option<&str>) -> Result<ArgumentValue> {
        ArgumentKind::TypeName.parse(build, id, raw)
    }

    fn validator(&self) -> Option<&SubstatementValidator> {
        Some(&self.validator)
    }

    fn on_full_definition_declared(&self, ctx: &mut StmtMut<'_>) -> Result<()> {
        let id = ctx.id();
        let name = qname_argument(ctx, id)?;
        let builtin = is_builtin_type(&name);
        check_type_body(ctx, id, &name.local_name, builtin)?;
        if builtin || in_ignored_source(ctx, id) {
            return Ok(());
        }
        let mut action = ctx.new_inference_action(Phase::EffectiveModel);
        let typedef = action.requires_ctx_in::<TypedefNamespace>(id, name.clone(), Phase::FullDeclaration);
        action.apply(TypeAction { typedef, name })
    }

    fn create_effective(&self, build: &BuildContext, id: StmtId, base: EffectiveBase) -> Result<EffectiveStatement> {
        let name = qname_argument(build, id)?;
        let typedef = (!is_builtin_type(&name)).then_some(name);
        Ok(base.into_statement(EffectiveKind::Type { typedef }))
    }
}

struct TypeAction {
    typedef: Prerequisite,
    name: QName,
}

impl InferenceAction for TypeAction {
    fn apply(&mut self, ctx: &mut InferenceContext<'_>) -> Result<()> {
        let owner = ctx.owner();
        let typedef = ctx.resolve(self.typedef)?;
        if ctx.parent(owner) == Some(typedef) {
            return Err(ReactorError::inference(
                ctx.reference(owner),
                format!("Typedef '{}' refers to itself", self.name.local_name),
            ));
        }
        trace!(type_name = %self.name.local_name, typedef = %ctx.describe(typedef), "resolved type");
        Ok(())
    }

    fn prerequisite_failed(&mut self, failed: &FailedPrerequisites<'_>) -> ReactorError {
        ReactorError::inference(
            failed.reference(failed.owner()),
            format!("Type '{}' was not found", self.name.local_name),
        )
    }
}
