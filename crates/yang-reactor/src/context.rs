//! Statement contexts
//!
//! The mutable statement graph lives in an arena owned by the
//! [`BuildContext`](crate::build::BuildContext). Contexts address each other
//! by [`StmtId`]; parent links, declared and effective substatement lists,
//! copy prototypes and namespace values are all plain indices.
//!
//! A context has two child lists:
//!
//! - `declared`: substatements written in the source, in source order
//! - `effective`: substatements added during inference (`uses` expansion,
//!   augmentation, refine replacements)
//!
//! A context-independent statement reused by a copy appears in the
//! `effective` list of several parents while its own `parent` link keeps
//! pointing at the place it was declared.

use std::cell::Cell;
use std::fmt;
use std::sync::Arc;

use yang_model::{
    ArgumentValue, CopyHistory, DeclaredStatement, EffectiveStatement, StatementDefinition,
    StatementSourceReference,
};

use crate::namespace::NamespaceStorage;
use crate::phase::ModelProcessingPhase;
use crate::support::StatementSupport;

/// Handle of a statement context in the build arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StmtId(pub(crate) u32);

impl StmtId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for StmtId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Index of a source in the build.
pub type SourceId = usize;

/// One node of the statement graph.
pub(crate) struct StatementContext {
    pub(crate) definition: StatementDefinition,
    pub(crate) keyword: String,
    pub(crate) raw_argument: Option<String>,
    pub(crate) argument: ArgumentValue,
    pub(crate) reference: StatementSourceReference,
    pub(crate) support: Arc<dyn StatementSupport>,

    pub(crate) source: SourceId,
    pub(crate) parent: Option<StmtId>,
    pub(crate) root: StmtId,
    pub(crate) declared: Vec<StmtId>,
    pub(crate) effective: Vec<StmtId>,

    pub(crate) history: &'static CopyHistory,
    /// Context this one was directly copied from.
    pub(crate) prototype: Option<StmtId>,
    /// Declared context at the start of the copy chain.
    pub(crate) original: Option<StmtId>,

    pub(crate) completed_phase: ModelProcessingPhase,
    /// Actions that must apply before this context completes a phase.
    pub(crate) mutations: Vec<(ModelProcessingPhase, usize)>,

    pub(crate) supported_to_build_effective: bool,
    pub(crate) supported_by_features: Cell<Option<bool>>,

    pub(crate) storage: NamespaceStorage,

    pub(crate) declared_instance: Option<Arc<DeclaredStatement>>,
    pub(crate) effective_instance: Option<Arc<EffectiveStatement>>,
}

impl StatementContext {
    /// Declared children followed by effective children.
    pub(crate) fn substatements(&self) -> impl Iterator<Item = StmtId> + '_ {
        self.declared.iter().chain(self.effective.iter()).copied()
    }
}

impl fmt::Debug for StatementContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StatementContext")
            .field("keyword", &self.keyword)
            .field("argument", &self.raw_argument)
            .field("reference", &self.reference)
            .field("completed_phase", &self.completed_phase)
            .field("history", &self.history)
            .finish_non_exhaustive()
    }
}
