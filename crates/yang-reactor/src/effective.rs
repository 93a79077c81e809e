//! Freezing the statement graph into declared and effective views.

use std::sync::Arc;

use tracing::debug;
use yang_model::{
    DeclaredStatement, EffectiveModelContext, EffectiveStatement, SchemaPath, StatementDefinition,
};

use crate::build::BuildContext;
use crate::context::StmtId;
use crate::error::{ReactorError, Result};
use crate::phase::ModelProcessingPhase;
use crate::support::EffectiveBase;

impl BuildContext {
    /// Schema path of schema tree nodes and groupings.
    ///
    /// Steps are collected from the enclosing schema nodes; an absolute
    /// `augment` contributes its target path and ends the walk.
    pub fn schema_path(&self, id: StmtId) -> Option<SchemaPath> {
        let definition = self.definition(id);
        if !definition.is_schema_tree() && definition != StatementDefinition::Grouping {
            return None;
        }

        let mut steps = Vec::new();
        let mut current = Some(id);
        while let Some(at) = current {
            let ctx = self.ctx(at);
            if ctx.definition.is_schema_tree() || ctx.definition == StatementDefinition::Grouping {
                if let Some(qname) = ctx.argument.as_qname() {
                    steps.push(qname.clone());
                }
            } else if ctx.definition == StatementDefinition::Augment {
                if let Some(target) = ctx.argument.as_schema_node_id().filter(|t| t.absolute) {
                    steps.extend(target.steps.iter().rev().cloned());
                    break;
                }
            }
            current = ctx.parent;
        }
        steps.reverse();
        Some(SchemaPath::from_steps(steps))
    }

    /// As-written view of a declared context, cached.
    pub(crate) fn build_declared(&mut self, id: StmtId) -> Arc<DeclaredStatement> {
        if let Some(declared) = &self.ctx(id).declared_instance {
            return declared.clone();
        }
        let substatements = self
            .declared_substatements(id)
            .to_vec()
            .into_iter()
            .map(|child| self.build_declared(child))
            .collect();
        let ctx = self.ctx(id);
        let declared = Arc::new(DeclaredStatement {
            definition: ctx.definition,
            keyword: ctx.keyword.clone(),
            raw_argument: ctx.raw_argument.clone(),
            argument: ctx.argument.clone(),
            reference: ctx.reference.clone(),
            substatements,
        });
        self.ctx_mut(id).declared_instance = Some(declared.clone());
        declared
    }

    /// Effective view of a context, built children first and cached.
    ///
    /// Substatements not supported to build effective, or disabled by
    /// features, are left out.
    pub(crate) fn build_effective(&mut self, id: StmtId) -> Result<Arc<EffectiveStatement>> {
        if let Some(effective) = &self.ctx(id).effective_instance {
            return Ok(effective.clone());
        }
        if self.ctx(id).completed_phase < ModelProcessingPhase::EffectiveModel {
            return Err(ReactorError::internal(
                self.reference(id),
                format!("{} has not completed the effective model", self.describe(id)),
            ));
        }

        let children: Vec<StmtId> = self
            .ctx(id)
            .substatements()
            .filter(|child| {
                self.ctx(*child).supported_to_build_effective && self.is_supported_by_features(*child)
            })
            .collect();
        let mut substatements = Vec::with_capacity(children.len());
        for child in children {
            substatements.push(self.build_effective(child)?);
        }

        let origin = self.ctx(id).original.unwrap_or(id);
        let declared = self.build_declared(origin);
        let schema_path = self.schema_path(id);

        let ctx = self.ctx(id);
        let base = EffectiveBase {
            definition: ctx.definition,
            keyword: ctx.keyword.clone(),
            raw_argument: ctx.raw_argument.clone(),
            argument: ctx.argument.clone(),
            reference: ctx.reference.clone(),
            history: ctx.history,
            schema_path,
            declared: Some(declared),
            substatements,
        };
        let support = ctx.support.clone();
        let effective = Arc::new(support.create_effective(self, id, base)?);
        self.ctx_mut(id).effective_instance = Some(effective.clone());
        Ok(effective)
    }

    /// Assemble the model from every source root.
    pub(crate) fn effective_model(&mut self) -> Result<EffectiveModelContext> {
        let mut modules = Vec::new();
        let mut submodules = Vec::new();
        let mut declared_roots = Vec::new();

        for root in self.source_roots() {
            if !self.ctx(root).supported_to_build_effective {
                continue;
            }
            let effective = self.build_effective(root)?;
            declared_roots.push(self.build_declared(root));
            if effective.definition == StatementDefinition::Submodule {
                submodules.push(effective);
            } else {
                modules.push(effective);
            }
        }
        debug!(
            modules = modules.len(),
            submodules = submodules.len(),
            "assembled effective model"
        );
        Ok(EffectiveModelContext::new(modules, submodules, declared_roots))
    }

    /// Effective view of one context of a finished build.
    pub fn effective_of(&mut self, id: StmtId) -> Result<Arc<EffectiveStatement>> {
        self.build_effective(id)
    }
}
