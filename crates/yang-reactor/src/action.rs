//! Inference actions
//!
//! A statement support that cannot finish its work from local information
//! (a `uses` whose grouping lives in another module, an `augment` whose
//! target has not been instantiated yet) registers an [`InferenceAction`]
//! for some phase, together with the [`Prerequisite`]s it waits for:
//!
//! - `requires_ctx`: a known context has completed a phase
//! - `requires_ctx_in` / `requires_found`: a context located by a namespace
//!   key or lookup exists and has completed a phase
//! - `mutates_ctx` / `mutates_found`: the action will modify a context, which
//!   therefore cannot complete the phase until the action has applied
//!
//! The reactor keeps all actions in a worklist. After the declaration sweep
//! of a phase it repeatedly evaluates pending prerequisites and applies every
//! action whose prerequisites are all resolved, until a pass applies
//! nothing. Actions still pending once the whole phase stops making progress
//! receive [`InferenceAction::prerequisite_failed`] and the build fails.
//!
//! # Ownership
//!
//! An action is taken out of its slot while it runs, so `apply` has full
//! mutable access to the build. It runs at most once.

use std::ops::{Deref, DerefMut};

use tracing::trace;

use crate::build::BuildContext;
use crate::context::StmtId;
use crate::error::{ReactorError, Result};
use crate::namespace::ParserNamespace;
use crate::phase::ModelProcessingPhase;

/// Locates a context starting from another one.
pub type Lookup = Box<dyn Fn(&BuildContext, StmtId) -> Result<Option<StmtId>>>;

/// Handle of one prerequisite of an action under construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Prerequisite(usize);

/// Deferred work registered by a statement support.
pub trait InferenceAction {
    /// Called once every prerequisite has resolved.
    fn apply(&mut self, ctx: &mut InferenceContext<'_>) -> Result<()>;

    /// Called when the phase cannot progress and some prerequisites never
    /// resolved. Returns the error to report.
    fn prerequisite_failed(&mut self, failed: &FailedPrerequisites<'_>) -> ReactorError;
}

pub(crate) enum PrerequisiteKind {
    PhaseFinished {
        target: StmtId,
        phase: ModelProcessingPhase,
    },
    Lookup {
        from: StmtId,
        lookup: Lookup,
        phase: ModelProcessingPhase,
        mutates: bool,
    },
    Mutates {
        target: StmtId,
        phase: ModelProcessingPhase,
    },
}

pub(crate) struct PrerequisiteSlot {
    kind: PrerequisiteKind,
    description: String,
    resolved: Option<StmtId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ActionState {
    Pending,
    Applied,
    Failed,
}

/// Registered action plus its bookkeeping.
pub(crate) struct Modifier {
    pub(crate) owner: StmtId,
    pub(crate) phase: ModelProcessingPhase,
    pub(crate) prerequisites: Vec<PrerequisiteSlot>,
    pub(crate) action: Option<Box<dyn InferenceAction>>,
    pub(crate) state: ActionState,
}

/// Collects prerequisites for one action, then registers it.
pub struct ModelActionBuilder<'a> {
    build: &'a mut BuildContext,
    owner: StmtId,
    phase: ModelProcessingPhase,
    prerequisites: Vec<PrerequisiteSlot>,
}

impl<'a> ModelActionBuilder<'a> {
    pub(crate) fn new(build: &'a mut BuildContext, owner: StmtId, phase: ModelProcessingPhase) -> Self {
        Self {
            build,
            owner,
            phase,
            prerequisites: Vec::new(),
        }
    }

    fn push(&mut self, kind: PrerequisiteKind, description: String) -> Prerequisite {
        self.prerequisites.push(PrerequisiteSlot {
            kind,
            description,
            resolved: None,
        });
        Prerequisite(self.prerequisites.len() - 1)
    }

    /// `target` must have completed `phase`.
    pub fn requires_ctx(&mut self, target: StmtId, phase: ModelProcessingPhase) -> Prerequisite {
        let description = format!("{} completes {}", self.build.describe(target), phase);
        self.push(PrerequisiteKind::PhaseFinished { target, phase }, description)
    }

    /// The context stored under `key` in namespace `N`, as seen from
    /// `from`, must exist and have completed `phase`.
    pub fn requires_ctx_in<N>(
        &mut self,
        from: StmtId,
        key: N::Key,
        phase: ModelProcessingPhase,
    ) -> Prerequisite
    where
        N: ParserNamespace<Value = StmtId>,
    {
        let description = format!("{} {:?} completes {}", N::NAME, key, phase);
        let lookup: Lookup =
            Box::new(move |build: &BuildContext, at: StmtId| {
                Ok(build.namespace_get::<N>(at, &key)?.copied())
            });
        self.push(
            PrerequisiteKind::Lookup {
                from,
                lookup,
                phase,
                mutates: false,
            },
            description,
        )
    }

    /// The context found by `lookup` must exist and have completed `phase`.
    pub fn requires_found(
        &mut self,
        from: StmtId,
        description: impl Into<String>,
        lookup: impl Fn(&BuildContext, StmtId) -> Result<Option<StmtId>> + 'static,
        phase: ModelProcessingPhase,
    ) -> Prerequisite {
        self.push(
            PrerequisiteKind::Lookup {
                from,
                lookup: Box::new(lookup),
                phase,
                mutates: false,
            },
            description.into(),
        )
    }

    /// This action modifies `target` during `phase`.
    pub fn mutates_ctx(&mut self, target: StmtId, phase: ModelProcessingPhase) -> Prerequisite {
        let description = format!("{} accepts changes in {}", self.build.describe(target), phase);
        self.push(PrerequisiteKind::Mutates { target, phase }, description)
    }

    /// This action modifies the context found by `lookup` during `phase`.
    ///
    /// Resolves as soon as the context exists; from then on it cannot
    /// complete `phase` until this action has applied.
    pub fn mutates_found(
        &mut self,
        from: StmtId,
        description: impl Into<String>,
        lookup: impl Fn(&BuildContext, StmtId) -> Result<Option<StmtId>> + 'static,
        phase: ModelProcessingPhase,
    ) -> Prerequisite {
        self.push(
            PrerequisiteKind::Lookup {
                from,
                lookup: Box::new(lookup),
                phase,
                mutates: true,
            },
            description.into(),
        )
    }

    /// Register the action with the reactor.
    pub fn apply(self, action: impl InferenceAction + 'static) -> Result<()> {
        let Self {
            build,
            owner,
            phase,
            mut prerequisites,
        } = self;

        if phase < build.current_phase {
            return Err(ReactorError::internal(
                build.reference(owner),
                format!(
                    "action for {} registered while in {}",
                    phase, build.current_phase
                ),
            ));
        }

        let id = build.modifiers.len();
        for slot in &mut prerequisites {
            if let PrerequisiteKind::Mutates { target, phase } = slot.kind {
                build.register_mutation(owner, target, phase, id)?;
                slot.resolved = Some(target);
            }
        }

        trace!(
            owner = %build.describe(owner),
            %phase,
            prerequisites = prerequisites.len(),
            "registered inference action"
        );
        build.modifiers.push(Modifier {
            owner,
            phase,
            prerequisites,
            action: Some(Box::new(action)),
            state: ActionState::Pending,
        });
        Ok(())
    }
}

/// Build access handed to [`InferenceAction::apply`].
pub struct InferenceContext<'a> {
    build: &'a mut BuildContext,
    owner: StmtId,
    resolved: Vec<Option<StmtId>>,
}

impl InferenceContext<'_> {
    /// Context the action was registered by.
    pub fn owner(&self) -> StmtId {
        self.owner
    }

    /// Context a prerequisite resolved to.
    pub fn resolve(&self, prerequisite: Prerequisite) -> Result<StmtId> {
        self.resolved
            .get(prerequisite.0)
            .copied()
            .flatten()
            .ok_or_else(|| {
                ReactorError::internal(
                    self.build.reference(self.owner),
                    format!("prerequisite {} is not resolved", prerequisite.0),
                )
            })
    }
}

impl Deref for InferenceContext<'_> {
    type Target = BuildContext;

    fn deref(&self) -> &BuildContext {
        &*self.build
    }
}

impl DerefMut for InferenceContext<'_> {
    fn deref_mut(&mut self) -> &mut BuildContext {
        &mut *self.build
    }
}

/// View handed to [`InferenceAction::prerequisite_failed`].
pub struct FailedPrerequisites<'a> {
    build: &'a BuildContext,
    owner: StmtId,
    failed: Vec<(Prerequisite, &'a str)>,
}

impl FailedPrerequisites<'_> {
    pub fn owner(&self) -> StmtId {
        self.owner
    }

    pub fn contains(&self, prerequisite: Prerequisite) -> bool {
        self.failed.iter().any(|(p, _)| *p == prerequisite)
    }

    /// Human-readable descriptions of the unresolved prerequisites.
    pub fn descriptions(&self) -> impl Iterator<Item = &str> + '_ {
        self.failed.iter().map(|(_, d)| *d)
    }
}

impl Deref for FailedPrerequisites<'_> {
    type Target = BuildContext;

    fn deref(&self) -> &BuildContext {
        self.build
    }
}

impl BuildContext {
    fn register_mutation(
        &mut self,
        owner: StmtId,
        target: StmtId,
        phase: ModelProcessingPhase,
        action: usize,
    ) -> Result<()> {
        if self.ctx(target).completed_phase >= phase {
            return Err(ReactorError::internal(
                self.reference(owner),
                format!(
                    "{} already completed {} and cannot be mutated",
                    self.describe(target),
                    phase
                ),
            ));
        }
        self.ctx_mut(target).mutations.push((phase, action));
        Ok(())
    }

    /// True while some action registered to mutate `id` in `phase` has not applied.
    pub(crate) fn has_pending_mutations(&self, id: StmtId, phase: ModelProcessingPhase) -> bool {
        self.ctx(id)
            .mutations
            .iter()
            .any(|(p, action)| *p == phase && self.modifiers[*action].state != ActionState::Applied)
    }

    pub(crate) fn has_pending_actions(&self, source: usize, phase: ModelProcessingPhase) -> bool {
        self.modifiers.iter().any(|m| {
            m.phase == phase
                && m.state == ActionState::Pending
                && self.ctx(m.owner).source == source
        })
    }

    fn resolve_slot(&mut self, action: usize, slot: &mut PrerequisiteSlot) -> Result<()> {
        if slot.resolved.is_some() {
            return Ok(());
        }
        match &slot.kind {
            PrerequisiteKind::PhaseFinished { target, phase } => {
                if self.ctx(*target).completed_phase >= *phase {
                    slot.resolved = Some(*target);
                }
            }
            PrerequisiteKind::Lookup {
                from,
                lookup,
                phase,
                mutates,
            } => {
                if let Some(found) = lookup(self, *from)? {
                    if *mutates {
                        let owner = self.modifiers[action].owner;
                        self.register_mutation(owner, found, *phase, action)?;
                        slot.resolved = Some(found);
                    } else if self.ctx(found).completed_phase >= *phase {
                        slot.resolved = Some(found);
                    }
                }
            }
            PrerequisiteKind::Mutates { target, .. } => slot.resolved = Some(*target),
        }
        Ok(())
    }

    /// One pass over the worklist: resolve what can be resolved and apply
    /// every ready action of `phase`. Returns the number applied.
    pub(crate) fn apply_ready_actions(&mut self, phase: ModelProcessingPhase) -> Result<usize> {
        let mut applied = 0;
        // Actions registered by an apply are visited later in the same pass.
        let mut index = 0;
        while index < self.modifiers.len() {
            if self.modifiers[index].phase != phase
                || self.modifiers[index].state != ActionState::Pending
            {
                index += 1;
                continue;
            }

            let mut slots = std::mem::take(&mut self.modifiers[index].prerequisites);
            let evaluated = slots
                .iter_mut()
                .try_for_each(|slot| self.resolve_slot(index, slot));
            let resolved: Vec<Option<StmtId>> = slots.iter().map(|s| s.resolved).collect();
            self.modifiers[index].prerequisites = slots;
            evaluated?;

            if resolved.iter().all(Option::is_some) {
                if let Some(mut action) = self.modifiers[index].action.take() {
                    let owner = self.modifiers[index].owner;
                    trace!(owner = %self.describe(owner), %phase, "applying inference action");
                    let mut ctx = InferenceContext {
                        build: self,
                        owner,
                        resolved,
                    };
                    action.apply(&mut ctx)?;
                    self.modifiers[index].state = ActionState::Applied;
                    applied += 1;
                }
            }
            index += 1;
        }
        Ok(applied)
    }

    /// Report every action of `phase` that is still pending.
    pub(crate) fn fail_pending_actions(&mut self, phase: ModelProcessingPhase) -> Vec<ReactorError> {
        let mut errors = Vec::new();
        for index in 0..self.modifiers.len() {
            if self.modifiers[index].phase != phase
                || self.modifiers[index].state != ActionState::Pending
            {
                continue;
            }
            let Some(mut action) = self.modifiers[index].action.take() else {
                continue;
            };
            self.modifiers[index].state = ActionState::Failed;

            let modifier = &self.modifiers[index];
            let failed = modifier
                .prerequisites
                .iter()
                .enumerate()
                .filter(|(_, slot)| slot.resolved.is_none())
                .map(|(i, slot)| (Prerequisite(i), slot.description.as_str()))
                .collect();
            let view = FailedPrerequisites {
                build: self,
                owner: modifier.owner,
                failed,
            };
            errors.push(action.prerequisite_failed(&view));
        }
        errors
    }

    /// Number of actions registered for `phase` that have applied.
    pub fn applied_action_count(&self, phase: ModelProcessingPhase) -> usize {
        self.modifiers
            .iter()
            .filter(|m| m.phase == phase && m.state == ActionState::Applied)
            .count()
    }
}
