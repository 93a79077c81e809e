//! Build context and phase driver
//!
//! [`BuildContext`] owns everything a single build touches: the statement
//! arena, per-source state, the global namespace node and the inference
//! worklist. It is created by
//! [`BuildAction`](crate::reactor::BuildAction) and driven through the
//! phases in lock-step:
//!
//! ```text
//! for phase in SourcePreLinkage..=EffectiveModel:
//!     emit statements known to the phase bundle   (every source)
//!     run declaration callbacks, children first    (every source)
//!     loop:
//!         apply ready inference actions until none applies
//!         try to complete the phase on every source
//!     until every source completed or nothing progressed
//! ```
//!
//! A phase that stops making progress with work outstanding fails the
//! build; nothing is retried.

use std::any::TypeId;
use std::cell::Cell;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use indexmap::IndexMap;
use tracing::{debug, error, trace};
use yang_model::{
    ArgumentValue, CopyHistory, StatementDefinition, StatementSourceReference,
};

use crate::action::Modifier;
use crate::config::ReactorConfig;
use crate::context::{SourceId, StatementContext, StmtId};
use crate::error::{ReactorError, Result};
use crate::namespace::{NamespaceBehaviour, NamespaceStorage};
use crate::phase::ModelProcessingPhase;
use crate::source::{SourceContext, SourceLink, StatementStreamSource};
use crate::support::{on_phase_declared, StatementSupport, StatementSupportBundle, StmtMut};

/// Mutable state of one build.
pub struct BuildContext {
    pub(crate) config: ReactorConfig,
    pub(crate) bundles: Arc<IndexMap<ModelProcessingPhase, StatementSupportBundle>>,
    pub(crate) unknown_support: Option<Arc<dyn StatementSupport>>,
    pub(crate) namespaces: HashMap<TypeId, NamespaceBehaviour>,
    pub(crate) contexts: Vec<StatementContext>,
    pub(crate) sources: Vec<SourceContext>,
    pub(crate) global: NamespaceStorage,
    pub(crate) modifiers: Vec<Modifier>,
    pub(crate) current_phase: ModelProcessingPhase,
}

impl std::fmt::Debug for BuildContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuildContext")
            .field("config", &self.config)
            .field("current_phase", &self.current_phase)
            .field("contexts", &self.contexts.len())
            .field("sources", &self.sources.len())
            .field("modifiers", &self.modifiers.len())
            .finish_non_exhaustive()
    }
}

/// Outcome of trying to close a phase on one source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PhaseCompletion {
    Finished,
    Progress,
    NoProgress,
}

impl BuildContext {
    pub(crate) fn new(
        bundles: Arc<IndexMap<ModelProcessingPhase, StatementSupportBundle>>,
        unknown_support: Option<Arc<dyn StatementSupport>>,
        sources: Vec<StatementStreamSource>,
        config: ReactorConfig,
    ) -> Self {
        let namespaces = bundles
            .values()
            .flat_map(|bundle| bundle.namespaces().iter().cloned())
            .map(|behaviour| (behaviour.type_id(), behaviour))
            .collect();
        Self {
            config,
            bundles,
            unknown_support,
            namespaces,
            contexts: Vec::new(),
            sources: sources.into_iter().map(SourceContext::new).collect(),
            global: NamespaceStorage::default(),
            modifiers: Vec::new(),
            current_phase: ModelProcessingPhase::Init,
        }
    }

    // =========================================================================
    // Arena access
    // =========================================================================

    pub(crate) fn ctx(&self, id: StmtId) -> &StatementContext {
        &self.contexts[id.index()]
    }

    pub(crate) fn ctx_mut(&mut self, id: StmtId) -> &mut StatementContext {
        &mut self.contexts[id.index()]
    }

    pub(crate) fn push_context(&mut self, context: StatementContext) -> StmtId {
        let id = StmtId(self.contexts.len() as u32);
        self.contexts.push(context);
        id
    }

    pub fn config(&self) -> &ReactorConfig {
        &self.config
    }

    pub fn current_phase(&self) -> ModelProcessingPhase {
        self.current_phase
    }

    /// Number of contexts in the arena, copies included.
    pub fn context_count(&self) -> usize {
        self.contexts.len()
    }

    /// Every context id, in creation order.
    pub fn context_ids(&self) -> impl Iterator<Item = StmtId> + '_ {
        (0..self.contexts.len() as u32).map(StmtId)
    }

    pub fn definition(&self, id: StmtId) -> StatementDefinition {
        self.ctx(id).definition
    }

    /// Keyword as written (prefixed for extension instances).
    pub fn keyword(&self, id: StmtId) -> &str {
        &self.ctx(id).keyword
    }

    pub fn argument(&self, id: StmtId) -> &ArgumentValue {
        &self.ctx(id).argument
    }

    pub fn raw_argument(&self, id: StmtId) -> Option<&str> {
        self.ctx(id).raw_argument.as_deref()
    }

    pub fn reference(&self, id: StmtId) -> &StatementSourceReference {
        &self.ctx(id).reference
    }

    pub fn support(&self, id: StmtId) -> &Arc<dyn StatementSupport> {
        &self.ctx(id).support
    }

    pub fn parent(&self, id: StmtId) -> Option<StmtId> {
        self.ctx(id).parent
    }

    pub fn root(&self, id: StmtId) -> StmtId {
        self.ctx(id).root
    }

    pub fn declared_substatements(&self, id: StmtId) -> &[StmtId] {
        &self.ctx(id).declared
    }

    pub fn effective_substatements(&self, id: StmtId) -> &[StmtId] {
        &self.ctx(id).effective
    }

    /// Declared then effective substatements.
    pub fn substatements(&self, id: StmtId) -> Vec<StmtId> {
        self.ctx(id).substatements().collect()
    }

    /// First substatement (declared or effective) of the given kind.
    pub fn find_substatement(&self, id: StmtId, definition: StatementDefinition) -> Option<StmtId> {
        self.ctx(id)
            .substatements()
            .find(|child| self.ctx(*child).definition == definition)
    }

    pub fn history(&self, id: StmtId) -> &'static CopyHistory {
        self.ctx(id).history
    }

    /// Context this one was directly copied from.
    pub fn prototype(&self, id: StmtId) -> Option<StmtId> {
        self.ctx(id).prototype
    }

    /// Declared context at the start of the copy chain.
    pub fn original(&self, id: StmtId) -> Option<StmtId> {
        self.ctx(id).original
    }

    pub fn completed_phase(&self, id: StmtId) -> ModelProcessingPhase {
        self.ctx(id).completed_phase
    }

    pub fn is_supported_to_build_effective(&self, id: StmtId) -> bool {
        self.ctx(id).supported_to_build_effective
    }

    pub fn set_supported_to_build_effective(&mut self, id: StmtId, supported: bool) {
        self.ctx_mut(id).supported_to_build_effective = supported;
    }

    /// True unless one of the statement's feature guards evaluates false.
    ///
    /// Cached once full declaration has started, since every guard exists
    /// by then.
    pub fn is_supported_by_features(&self, id: StmtId) -> bool {
        let ctx = self.ctx(id);
        if let Some(cached) = ctx.supported_by_features.get() {
            return cached;
        }
        let supported = ctx
            .substatements()
            .all(|child| self.ctx(child).support.feature_guard(self, child) != Some(false));
        if self.current_phase >= ModelProcessingPhase::FullDeclaration {
            ctx.supported_by_features.set(Some(supported));
        }
        supported
    }

    /// Root statement of every source, in source order.
    pub fn source_roots(&self) -> Vec<StmtId> {
        self.sources.iter().filter_map(|s| s.root).collect()
    }

    pub fn source_name(&self, id: StmtId) -> &str {
        &self.sources[self.ctx(id).source].name
    }

    /// Make the source of `from` see the source of `to` in lookups.
    pub fn link_sources(&mut self, from: StmtId, to: StmtId, link: SourceLink) {
        let (from, to) = (self.ctx(from).source, self.ctx(to).source);
        if from != to && !self.sources[from].links.contains(&(to, link)) {
            self.sources[from].links.push((to, link));
        }
    }

    /// Sources visible from `source` past its own root, nearest first.
    ///
    /// Every directly linked source is visible. Beyond that only include
    /// links are followed, so a module's submodules are visible to its
    /// importers while its own imports are not.
    pub(crate) fn visible_sources(&self, source: SourceId) -> Vec<SourceId> {
        let mut visible: Vec<SourceId> = Vec::new();
        let mut queue: VecDeque<SourceId> = self.sources[source]
            .links
            .iter()
            .map(|(linked, _)| *linked)
            .collect();
        while let Some(next) = queue.pop_front() {
            if next == source || visible.contains(&next) {
                continue;
            }
            visible.push(next);
            queue.extend(
                self.sources[next]
                    .links
                    .iter()
                    .filter(|(_, link)| *link == SourceLink::Include)
                    .map(|(linked, _)| *linked),
            );
        }
        visible
    }

    /// Short description for diagnostics: keyword, argument and location.
    pub fn describe(&self, id: StmtId) -> String {
        let ctx = self.ctx(id);
        match &ctx.raw_argument {
            Some(arg) => format!("{} \"{}\" at {}", ctx.keyword, arg, ctx.reference),
            None => format!("{} at {}", ctx.keyword, ctx.reference),
        }
    }

    // =========================================================================
    // Phase driver
    // =========================================================================

    /// Run every phase in order.
    pub(crate) fn execute(&mut self) -> Result<()> {
        for phase in ModelProcessingPhase::ALL.into_iter().skip(1) {
            self.execute_phase(phase)?;
        }
        Ok(())
    }

    pub(crate) fn execute_phase(&mut self, phase: ModelProcessingPhase) -> Result<()> {
        if self.current_phase.next() != Some(phase) {
            return Err(ReactorError::internal(
                &StatementSourceReference::new("<reactor>", 0, 0),
                format!("cannot start {} after {}", phase, self.current_phase),
            ));
        }
        self.current_phase = phase;
        debug!(%phase, sources = self.sources.len(), "starting phase");

        if phase <= ModelProcessingPhase::FullDeclaration {
            for source in 0..self.sources.len() {
                self.emit_statements(source, phase)?;
            }
            for source in 0..self.sources.len() {
                self.declare_phase(source, phase)?;
            }
        }

        self.complete_phase_actions(phase)?;

        debug!(%phase, contexts = self.contexts.len(), "finished phase");
        Ok(())
    }

    /// Materialise every raw statement of `source` the phase bundle knows.
    fn emit_statements(&mut self, source: SourceId, phase: ModelProcessingPhase) -> Result<()> {
        for index in 0..self.sources[source].nodes.len() {
            let node = &self.sources[source].nodes[index];
            if node.emitted.is_some() {
                continue;
            }
            let parent = match node.parent {
                None => None,
                Some(raw_parent) => match self.sources[source].nodes[raw_parent].emitted {
                    Some(id) => Some(id),
                    None => continue,
                },
            };
            if let Some(support) = self.support_for(source, index, parent, phase)? {
                self.create_context(source, index, parent, support)?;
            }
        }

        let src = &self.sources[source];
        if phase == ModelProcessingPhase::SourcePreLinkage && src.root.is_none() {
            let root = &src.nodes[0];
            return Err(ReactorError::source(
                &root.reference,
                format!("root statement '{}' is not supported", root.keyword),
            ));
        }
        trace!(source = %src.name, %phase, pending = src.pending_count(), "emitted statements");
        Ok(())
    }

    fn support_for(
        &self,
        source: SourceId,
        index: usize,
        parent: Option<StmtId>,
        phase: ModelProcessingPhase,
    ) -> Result<Option<Arc<dyn StatementSupport>>> {
        let node = &self.sources[source].nodes[index];
        let full = phase == ModelProcessingPhase::FullDeclaration;

        let inside_extension =
            parent.is_some_and(|p| self.ctx(p).definition == StatementDefinition::Unknown);
        if !inside_extension {
            if let Some(support) = self.bundles.get(&phase).and_then(|b| b.get(&node.keyword)) {
                return Ok(Some(support.clone()));
            }
        }
        if !full {
            return Ok(None);
        }
        if inside_extension || node.keyword.contains(':') {
            if let Some(unknown) = &self.unknown_support {
                return Ok(Some(unknown.clone()));
            }
        }
        Err(ReactorError::source(
            &node.reference,
            format!("statement '{}' does not have type mapping defined", node.keyword),
        ))
    }

    fn create_context(
        &mut self,
        source: SourceId,
        index: usize,
        parent: Option<StmtId>,
        support: Arc<dyn StatementSupport>,
    ) -> Result<StmtId> {
        let node = &self.sources[source].nodes[index];
        let next = StmtId(self.contexts.len() as u32);
        let context = StatementContext {
            definition: support.definition(),
            keyword: node.keyword.clone(),
            raw_argument: node.argument.clone(),
            argument: ArgumentValue::None,
            reference: node.reference.clone(),
            support: support.clone(),
            source,
            parent,
            root: parent.map_or(next, |p| self.ctx(p).root),
            declared: Vec::new(),
            effective: Vec::new(),
            history: CopyHistory::original(),
            prototype: None,
            original: None,
            completed_phase: self
                .current_phase
                .previous()
                .unwrap_or(ModelProcessingPhase::Init),
            mutations: Vec::new(),
            supported_to_build_effective: true,
            supported_by_features: Cell::new(None),
            storage: NamespaceStorage::default(),
            declared_instance: None,
            effective_instance: None,
        };
        let id = self.push_context(context);

        let position = self.sources[source].emitted_position(index);
        self.sources[source].nodes[index].emitted = Some(id);
        match parent {
            Some(parent) => self.ctx_mut(parent).declared.insert(position, id),
            None => self.sources[source].root = Some(id),
        }
        trace!(statement = %self.describe(id), "created context");

        let raw = self.ctx(id).raw_argument.clone();
        let argument = support.parse_argument(self, id, raw.as_deref())?;
        self.ctx_mut(id).argument = argument;
        support.on_statement_added(&mut StmtMut::new(self, id))?;
        Ok(id)
    }

    /// Invoke the phase callback on every declared context of `source`,
    /// children before parents.
    fn declare_phase(&mut self, source: SourceId, phase: ModelProcessingPhase) -> Result<()> {
        let Some(root) = self.sources[source].root else {
            return Ok(());
        };
        let mut order = Vec::new();
        self.collect_post_order(root, &mut order);

        for id in order {
            let support = self.ctx(id).support.clone();
            if phase == ModelProcessingPhase::FullDeclaration {
                if let Some(validator) = support.validator() {
                    validator.validate(self, id)?;
                }
            }
            on_phase_declared(support.as_ref(), phase, &mut StmtMut::new(self, id))?;
        }
        Ok(())
    }

    fn collect_post_order(&self, id: StmtId, order: &mut Vec<StmtId>) {
        for child in &self.ctx(id).declared {
            self.collect_post_order(*child, order);
        }
        order.push(id);
    }

    /// Run the inference worklist of `phase` to a fixpoint and close the
    /// phase on every source.
    fn complete_phase_actions(&mut self, phase: ModelProcessingPhase) -> Result<()> {
        let mut passes = 0usize;
        loop {
            let mut progressed = false;
            while self.apply_ready_actions(phase)? > 0 {
                progressed = true;
            }

            let mut all_finished = true;
            for source in 0..self.sources.len() {
                match self.try_complete_source(source, phase) {
                    PhaseCompletion::Finished => {}
                    PhaseCompletion::Progress => {
                        all_finished = false;
                        progressed = true;
                    }
                    PhaseCompletion::NoProgress => all_finished = false,
                }
            }
            if all_finished {
                return Ok(());
            }
            if !progressed {
                break;
            }

            passes += 1;
            if self.config.max_fixpoint_passes.is_some_and(|max| passes >= max) {
                debug!(%phase, passes, "fixpoint pass limit reached");
                break;
            }
        }
        self.fail_phase(phase)
    }

    fn try_complete_source(&mut self, source: SourceId, phase: ModelProcessingPhase) -> PhaseCompletion {
        let Some(root) = self.sources[source].root else {
            return PhaseCompletion::Finished;
        };
        let mut progressed = false;
        let tree_finished = self.try_complete_context(root, phase, &mut progressed);

        if tree_finished && !self.has_pending_actions(source, phase) {
            trace!(source = %self.sources[source].name, %phase, "source completed phase");
            PhaseCompletion::Finished
        } else if progressed {
            PhaseCompletion::Progress
        } else {
            PhaseCompletion::NoProgress
        }
    }

    /// A context completes a phase once nothing still mutates it and all
    /// of its substatements have completed it.
    fn try_complete_context(
        &mut self,
        id: StmtId,
        phase: ModelProcessingPhase,
        progressed: &mut bool,
    ) -> bool {
        let mut finished = !self.has_pending_mutations(id, phase);
        for child in self.substatements(id) {
            finished &= self.try_complete_context(child, phase, progressed);
        }
        if finished && self.ctx(id).completed_phase < phase {
            self.ctx_mut(id).completed_phase = phase;
            *progressed = true;
        }
        finished
    }

    fn fail_phase(&mut self, phase: ModelProcessingPhase) -> Result<()> {
        let mut errors = self.fail_pending_actions(phase);
        if errors.is_empty() {
            for source in &self.sources {
                if let Some(root) = source.root {
                    if self.ctx(root).completed_phase < phase {
                        errors.push(ReactorError::internal(
                            self.reference(root),
                            format!("source {} did not complete {}", source.name, phase),
                        ));
                    }
                }
            }
        }
        for cause in &errors {
            error!(%phase, error = %cause, "phase failed");
        }
        Err(ReactorError::PhaseFailed { phase, errors })
    }
}
