//! Copy operations and effective substatement management
//!
//! `uses` and `augment` place statements under parents they were not
//! declared in. [`BuildContext::copy_as_child_of`] performs that placement
//! according to the [`CopyPolicy`] of each statement's support, recursing
//! through substatements; the caller then attaches the result with
//! [`BuildContext::add_effective_substatements`].

use std::cell::Cell;

use tracing::trace;
use yang_model::{CopyHistory, CopyType, QNameModule};

use crate::build::BuildContext;
use crate::context::{StatementContext, StmtId};
use crate::error::{ReactorError, Result};
use crate::namespace::NamespaceStorage;
use crate::phase::ModelProcessingPhase;
use crate::support::CopyPolicy;

impl BuildContext {
    /// Place `original` under `target` as an effective substatement.
    ///
    /// Returns the context to attach: `original` itself for
    /// context-independent statements, a fresh copy for declared copies, or
    /// `None` when the statement is ignored. The result is not attached.
    ///
    /// # Parameters
    ///
    /// * `original` - statement being copied
    /// * `target` - new parent
    /// * `copy_type` - operation recorded in the copy's history
    /// * `target_module` - module to rebind QName arguments to, if any
    ///
    /// # Errors
    ///
    /// A source error at `original` if its support rejects copying.
    pub fn copy_as_child_of(
        &mut self,
        original: StmtId,
        target: StmtId,
        copy_type: CopyType,
        target_module: Option<&QNameModule>,
    ) -> Result<Option<StmtId>> {
        match self.ctx(original).support.copy_policy() {
            CopyPolicy::ContextIndependent => Ok(Some(original)),
            CopyPolicy::Ignore => Ok(None),
            CopyPolicy::Reject => Err(ReactorError::source(
                self.reference(original),
                format!("statement {} cannot be copied", self.keyword(original)),
            )),
            CopyPolicy::DeclaredCopy => self
                .declared_copy(original, target, copy_type, target_module)
                .map(Some),
        }
    }

    fn declared_copy(
        &mut self,
        original: StmtId,
        target: StmtId,
        copy_type: CopyType,
        target_module: Option<&QNameModule>,
    ) -> Result<StmtId> {
        let support = self.ctx(original).support.clone();
        let argument = match target_module {
            Some(module) => support.adapt_argument(self, original, module),
            None => self.ctx(original).argument.clone(),
        };

        // A copy made now has not completed the current phase yet.
        let ceiling = self
            .current_phase
            .previous()
            .unwrap_or(ModelProcessingPhase::Init);
        let src = self.ctx(original);
        let parent = self.ctx(target);
        let context = StatementContext {
            definition: src.definition,
            keyword: src.keyword.clone(),
            raw_argument: src.raw_argument.clone(),
            argument,
            reference: src.reference.clone(),
            support,
            source: parent.source,
            parent: Some(target),
            root: parent.root,
            declared: Vec::new(),
            effective: Vec::new(),
            history: CopyHistory::of(copy_type, src.history),
            prototype: Some(original),
            original: Some(src.original.unwrap_or(original)),
            completed_phase: src.completed_phase.min(ceiling),
            mutations: Vec::new(),
            supported_to_build_effective: src.supported_to_build_effective,
            supported_by_features: Cell::new(None),
            storage: NamespaceStorage::default(),
            declared_instance: None,
            effective_instance: None,
        };
        let copy = self.push_context(context);
        trace!(
            copy = %copy,
            from = %self.describe(original),
            ?copy_type,
            "copied statement"
        );

        for child in self.substatements(original) {
            if let Some(child_copy) = self.copy_as_child_of(child, copy, copy_type, target_module)? {
                self.ctx_mut(copy).effective.push(child_copy);
            }
        }
        Ok(copy)
    }

    fn check_effective_mutable(&self, parent: StmtId) -> Result<()> {
        if self.current_phase < ModelProcessingPhase::FullDeclaration {
            return Err(ReactorError::internal(
                self.reference(parent),
                format!("effective statements cannot be added in {}", self.current_phase),
            ));
        }
        Ok(())
    }

    pub fn add_effective_substatement(&mut self, parent: StmtId, child: StmtId) -> Result<()> {
        self.add_effective_substatements(parent, vec![child])
    }

    /// Append inferred substatements to `parent`, keeping their order.
    pub fn add_effective_substatements(&mut self, parent: StmtId, children: Vec<StmtId>) -> Result<()> {
        self.check_effective_mutable(parent)?;
        let ctx = self.ctx_mut(parent);
        ctx.effective.extend(children);
        ctx.supported_by_features.set(None);
        Ok(())
    }

    /// Detach an effective substatement. Returns false if it was not attached.
    pub fn remove_effective_substatement(&mut self, parent: StmtId, child: StmtId) -> Result<bool> {
        self.check_effective_mutable(parent)?;
        let ctx = self.ctx_mut(parent);
        let before = ctx.effective.len();
        ctx.effective.retain(|c| *c != child);
        let removed = ctx.effective.len() != before;
        if removed {
            ctx.supported_by_features.set(None);
        }
        Ok(removed)
    }
}
