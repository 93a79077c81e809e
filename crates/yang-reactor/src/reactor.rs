//! Reactor assembly and build entry point
//!
//! A [`CrossSourceStatementReactor`] is an immutable set of statement
//! supports and namespaces, assembled once with a [`ReactorBuilder`] and
//! reused for any number of builds. Each build is independent; builds may
//! run concurrently on separate threads.
//!
//! ```text
//! let model = reactor.new_build()
//!     .add_source(a)
//!     .add_source(b)
//!     .build()?;
//! ```

use std::sync::Arc;

use indexmap::IndexMap;
use tracing::{info, instrument};
use yang_model::EffectiveModelContext;

use crate::build::BuildContext;
use crate::config::ReactorConfig;
use crate::error::Result;
use crate::namespace::NamespaceBehaviour;
use crate::phase::ModelProcessingPhase;
use crate::source::StatementStreamSource;
use crate::support::{StatementSupport, StatementSupportBundle};

/// Statement supports and namespaces, bundled per phase.
#[derive(Clone)]
pub struct CrossSourceStatementReactor {
    bundles: Arc<IndexMap<ModelProcessingPhase, StatementSupportBundle>>,
    unknown_support: Option<Arc<dyn StatementSupport>>,
}

impl CrossSourceStatementReactor {
    pub fn builder() -> ReactorBuilder {
        ReactorBuilder::default()
    }

    /// Cumulative bundle of `phase`.
    pub fn bundle(&self, phase: ModelProcessingPhase) -> Option<&StatementSupportBundle> {
        self.bundles.get(&phase)
    }

    pub(crate) fn new_build_context(
        &self,
        sources: Vec<StatementStreamSource>,
        config: ReactorConfig,
    ) -> BuildContext {
        BuildContext::new(self.bundles.clone(), self.unknown_support.clone(), sources, config)
    }

    pub fn new_build(&self) -> BuildAction<'_> {
        BuildAction {
            reactor: self,
            sources: Vec::new(),
            config: ReactorConfig::default(),
        }
    }
}

/// Assembles a [`CrossSourceStatementReactor`].
///
/// Registering a support for a keyword that already has one replaces it,
/// including the phase it is introduced in.
#[derive(Default)]
pub struct ReactorBuilder {
    supports: IndexMap<String, (ModelProcessingPhase, Arc<dyn StatementSupport>)>,
    namespaces: Vec<NamespaceBehaviour>,
    unknown_support: Option<Arc<dyn StatementSupport>>,
}

impl ReactorBuilder {
    /// Introduce `support` in the bundle of `phase` (and every later one).
    pub fn add_support(self, phase: ModelProcessingPhase, support: impl StatementSupport + 'static) -> Self {
        self.add_shared_support(phase, Arc::new(support))
    }

    pub fn add_shared_support(
        mut self,
        phase: ModelProcessingPhase,
        support: Arc<dyn StatementSupport>,
    ) -> Self {
        let keyword = support.definition().keyword().to_string();
        self.supports.insert(keyword, (phase, support));
        self
    }

    /// Register a namespace; it becomes usable from its `available_from` phase.
    pub fn add_namespace(mut self, behaviour: NamespaceBehaviour) -> Self {
        self.namespaces
            .retain(|existing| existing.type_id() != behaviour.type_id());
        self.namespaces.push(behaviour);
        self
    }

    /// Support used for extension instances (prefixed keywords).
    pub fn unknown_statement_support(mut self, support: impl StatementSupport + 'static) -> Self {
        self.unknown_support = Some(Arc::new(support));
        self
    }

    pub fn build(self) -> CrossSourceStatementReactor {
        let mut bundles = IndexMap::new();
        let mut cumulative = StatementSupportBundle::default();
        for phase in ModelProcessingPhase::ALL {
            for (support_phase, support) in self.supports.values() {
                if *support_phase == phase {
                    cumulative.add_support(support.clone());
                }
            }
            for behaviour in &self.namespaces {
                if behaviour.available_from() == phase {
                    cumulative.add_namespace(behaviour.clone());
                }
            }
            bundles.insert(phase, cumulative.clone());
        }
        CrossSourceStatementReactor {
            bundles: Arc::new(bundles),
            unknown_support: self.unknown_support,
        }
    }
}

/// One build: a set of sources plus configuration.
pub struct BuildAction<'a> {
    reactor: &'a CrossSourceStatementReactor,
    sources: Vec<StatementStreamSource>,
    config: ReactorConfig,
}

impl BuildAction<'_> {
    pub fn add_source(mut self, source: StatementStreamSource) -> Self {
        self.sources.push(source);
        self
    }

    pub fn add_sources(mut self, sources: impl IntoIterator<Item = StatementStreamSource>) -> Self {
        self.sources.extend(sources);
        self
    }

    pub fn with_config(mut self, config: ReactorConfig) -> Self {
        self.config = config;
        self
    }

    /// Drive every phase and return the finished build context.
    pub fn execute(self) -> Result<BuildContext> {
        let mut build = self.reactor.new_build_context(self.sources, self.config);
        build.execute()?;
        Ok(build)
    }

    /// Build the effective model of all sources.
    #[instrument(skip_all, fields(sources = self.sources.len()))]
    pub fn build(self) -> Result<EffectiveModelContext> {
        let mut build = self.execute()?;
        let model = build.effective_model()?;
        info!(
            modules = model.modules().len(),
            contexts = build.context_count(),
            "effective model built"
        );
        Ok(model)
    }
}
