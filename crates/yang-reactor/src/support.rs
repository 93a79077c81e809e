//! Statement supports
//!
//! A [`StatementSupport`] is the plug-in that gives a keyword its meaning:
//! how its argument parses, what it does as each phase closes, how it
//! behaves when copied, and what its effective statement looks like.
//!
//! # Callbacks
//!
//! For every phase from `SourcePreLinkage` to `FullDeclaration` the reactor
//! invokes the matching `on_*_declared` callback exactly once per declared
//! context, children before parents and siblings in declaration order.
//! `on_statement_added` fires once, right after the context is created and
//! its argument parsed. Callbacks receive a [`StmtMut`] which dereferences
//! to the [`BuildContext`] and can register inference actions.
//!
//! # Bundles
//!
//! Supports are grouped per phase into a [`StatementSupportBundle`]. Bundles
//! are cumulative: the bundle of a phase also holds every support of the
//! earlier phases. A keyword is materialised in the first phase whose bundle
//! knows it.

use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use indexmap::IndexMap;
use yang_model::{
    ArgumentValue, CopyHistory, DeclaredStatement, EffectiveKind, EffectiveStatement,
    QNameModule, SchemaPath, StatementDefinition, StatementSourceReference,
};

use crate::action::ModelActionBuilder;
use crate::build::BuildContext;
use crate::context::StmtId;
use crate::error::Result;
use crate::namespace::NamespaceBehaviour;
use crate::phase::ModelProcessingPhase;
use crate::validator::SubstatementValidator;

/// What happens when a statement must be placed under another parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CopyPolicy {
    /// Reuse the same context at the new place.
    ContextIndependent,
    /// Create a fresh context sharing the declared statement.
    DeclaredCopy,
    /// Copying is a source error.
    Reject,
    /// Drop the statement and its substatements from the copy.
    Ignore,
}

/// Per-keyword behaviour plugged into the reactor.
pub trait StatementSupport: Send + Sync {
    fn definition(&self) -> StatementDefinition;

    fn copy_policy(&self) -> CopyPolicy {
        CopyPolicy::DeclaredCopy
    }

    /// Parse the raw argument of a freshly created context.
    ///
    /// Fails with a source error tied to the context on malformed input.
    fn parse_argument(
        &self,
        build: &BuildContext,
        id: StmtId,
        raw: Option<&str>,
    ) -> Result<ArgumentValue>;

    /// Argument of a copy placed into `target` module.
    fn adapt_argument(&self, build: &BuildContext, id: StmtId, _target: &QNameModule) -> ArgumentValue {
        build.argument(id).clone()
    }

    /// Cardinality rules checked when full declaration closes.
    fn validator(&self) -> Option<&SubstatementValidator> {
        None
    }

    /// True if this context is an instance of a registered extension.
    fn is_registered_extension(&self, _build: &BuildContext, _id: StmtId) -> bool {
        false
    }

    /// Feature condition this statement imposes on its parent.
    ///
    /// `Some(false)` disables the parent; `None` means no condition.
    fn feature_guard(&self, _build: &BuildContext, _id: StmtId) -> Option<bool> {
        None
    }

    fn on_statement_added(&self, _ctx: &mut StmtMut<'_>) -> Result<()> {
        Ok(())
    }

    fn on_pre_linkage_declared(&self, _ctx: &mut StmtMut<'_>) -> Result<()> {
        Ok(())
    }

    fn on_linkage_declared(&self, _ctx: &mut StmtMut<'_>) -> Result<()> {
        Ok(())
    }

    fn on_statement_definition_declared(&self, _ctx: &mut StmtMut<'_>) -> Result<()> {
        Ok(())
    }

    fn on_full_definition_declared(&self, _ctx: &mut StmtMut<'_>) -> Result<()> {
        Ok(())
    }

    /// Build the effective statement from its common parts.
    fn create_effective(
        &self,
        _build: &BuildContext,
        _id: StmtId,
        base: EffectiveBase,
    ) -> Result<EffectiveStatement> {
        Ok(base.into_statement(EffectiveKind::Other))
    }
}

/// Dispatch the declaration callback matching `phase`.
pub(crate) fn on_phase_declared(
    support: &dyn StatementSupport,
    phase: ModelProcessingPhase,
    ctx: &mut StmtMut<'_>,
) -> Result<()> {
    match phase {
        ModelProcessingPhase::SourcePreLinkage => support.on_pre_linkage_declared(ctx),
        ModelProcessingPhase::SourceLinkage => support.on_linkage_declared(ctx),
        ModelProcessingPhase::StatementDefinition => support.on_statement_definition_declared(ctx),
        ModelProcessingPhase::FullDeclaration => support.on_full_definition_declared(ctx),
        ModelProcessingPhase::Init | ModelProcessingPhase::EffectiveModel => Ok(()),
    }
}

/// Parts of an effective statement common to every keyword.
///
/// Supports inspect these (substatements in particular) to derive their
/// [`EffectiveKind`] payload.
#[derive(Debug)]
pub struct EffectiveBase {
    pub definition: StatementDefinition,
    pub keyword: String,
    pub raw_argument: Option<String>,
    pub argument: ArgumentValue,
    pub reference: StatementSourceReference,
    pub history: &'static CopyHistory,
    pub schema_path: Option<SchemaPath>,
    pub declared: Option<Arc<DeclaredStatement>>,
    pub substatements: Vec<Arc<EffectiveStatement>>,
}

impl EffectiveBase {
    pub fn into_statement(self, kind: EffectiveKind) -> EffectiveStatement {
        EffectiveStatement {
            definition: self.definition,
            keyword: self.keyword,
            raw_argument: self.raw_argument,
            argument: self.argument,
            reference: self.reference,
            history: self.history,
            schema_path: self.schema_path,
            declared: self.declared,
            substatements: self.substatements,
            kind,
        }
    }

    pub fn find_first(&self, definition: StatementDefinition) -> Option<&Arc<EffectiveStatement>> {
        self.substatements.iter().find(|s| s.definition == definition)
    }
}

/// Mutable handle on one context, passed to support callbacks.
pub struct StmtMut<'a> {
    build: &'a mut BuildContext,
    id: StmtId,
}

impl<'a> StmtMut<'a> {
    pub(crate) fn new(build: &'a mut BuildContext, id: StmtId) -> Self {
        Self { build, id }
    }

    pub fn id(&self) -> StmtId {
        self.id
    }

    /// Start building an inference action owned by this context.
    pub fn new_inference_action(&mut self, phase: ModelProcessingPhase) -> ModelActionBuilder<'_> {
        ModelActionBuilder::new(&mut *self.build, self.id, phase)
    }
}

impl Deref for StmtMut<'_> {
    type Target = BuildContext;

    fn deref(&self) -> &BuildContext {
        &*self.build
    }
}

impl DerefMut for StmtMut<'_> {
    fn deref_mut(&mut self) -> &mut BuildContext {
        &mut *self.build
    }
}

/// Supports and namespaces usable in one phase.
#[derive(Clone, Default)]
pub struct StatementSupportBundle {
    supports: IndexMap<String, Arc<dyn StatementSupport>>,
    namespaces: Vec<NamespaceBehaviour>,
}

impl StatementSupportBundle {
    pub fn get(&self, keyword: &str) -> Option<&Arc<dyn StatementSupport>> {
        self.supports.get(keyword)
    }

    pub fn has_support(&self, keyword: &str) -> bool {
        self.supports.contains_key(keyword)
    }

    pub fn namespaces(&self) -> &[NamespaceBehaviour] {
        &self.namespaces
    }

    pub fn keywords(&self) -> impl Iterator<Item = &str> + '_ {
        self.supports.keys().map(String::as_str)
    }

    pub(crate) fn add_support(&mut self, support: Arc<dyn StatementSupport>) {
        self.supports
            .insert(support.definition().keyword().to_string(), support);
    }

    pub(crate) fn add_namespace(&mut self, behaviour: NamespaceBehaviour) {
        self.namespaces
            .retain(|existing| existing.type_id() != behaviour.type_id());
        self.namespaces.push(behaviour);
    }
}
