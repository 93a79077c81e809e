//! Substatement cardinality validation
//!
//! Each statement support may carry a [`SubstatementValidator`]: a table of
//! allowed substatement kinds with `[min, max]` occurrence bounds. When full
//! declaration closes, the reactor counts the substatements actually present
//! (declared and effective) and reports the first violation.

use std::fmt;

use indexmap::IndexMap;
use yang_model::StatementDefinition;

use crate::build::BuildContext;
use crate::context::StmtId;
use crate::error::{ReactorError, Result};

/// Occurrence bounds of one substatement kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cardinality {
    pub min: usize,
    /// `None` means unbounded.
    pub max: Option<usize>,
}

impl Cardinality {
    pub fn allows(&self, count: usize) -> bool {
        count >= self.min && self.max.map_or(true, |max| count <= max)
    }
}

impl fmt::Display for Cardinality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.max {
            Some(max) => write!(f, "[{}, {}]", self.min, max),
            None => write!(f, "[{}, *]", self.min),
        }
    }
}

/// Allowed substatements of one statement kind.
#[derive(Debug, Clone)]
pub struct SubstatementValidator {
    parent: StatementDefinition,
    cardinality: IndexMap<StatementDefinition, Cardinality>,
}

impl SubstatementValidator {
    pub fn builder(parent: StatementDefinition) -> SubstatementValidatorBuilder {
        SubstatementValidatorBuilder {
            parent,
            cardinality: IndexMap::new(),
        }
    }

    pub fn parent(&self) -> StatementDefinition {
        self.parent
    }

    pub fn cardinality(&self, substatement: StatementDefinition) -> Option<Cardinality> {
        self.cardinality.get(&substatement).copied()
    }

    /// Check the substatements of `id` against the table.
    pub fn validate(&self, build: &BuildContext, id: StmtId) -> Result<()> {
        let mut counts: IndexMap<StatementDefinition, usize> = IndexMap::new();

        for child in build.substatements(id) {
            let definition = build.definition(child);
            let allowed = if definition == StatementDefinition::Unknown {
                build
                    .support(child)
                    .is_registered_extension(build, child)
            } else {
                self.cardinality.contains_key(&definition)
            };
            if !allowed {
                return Err(ReactorError::InvalidSubstatement {
                    parent: build.keyword(id).to_string(),
                    substatement: build.keyword(child).to_string(),
                    reference: build.reference(child).clone(),
                });
            }
            if definition != StatementDefinition::Unknown {
                *counts.entry(definition).or_default() += 1;
            }
        }

        for (definition, bounds) in &self.cardinality {
            let count = counts.get(definition).copied().unwrap_or(0);
            if count < bounds.min {
                return Err(ReactorError::MissingSubstatement {
                    parent: self.parent,
                    substatement: *definition,
                    reference: build.reference(id).clone(),
                });
            }
            if let Some(max) = bounds.max.filter(|max| count > *max) {
                return Err(ReactorError::CardinalityExceeded {
                    parent: self.parent,
                    substatement: *definition,
                    max,
                    count,
                    reference: build.reference(id).clone(),
                });
            }
        }
        Ok(())
    }
}

/// Builder for [`SubstatementValidator`].
#[derive(Debug)]
pub struct SubstatementValidatorBuilder {
    parent: StatementDefinition,
    cardinality: IndexMap<StatementDefinition, Cardinality>,
}

impl SubstatementValidatorBuilder {
    pub fn add(mut self, substatement: StatementDefinition, min: usize, max: Option<usize>) -> Self {
        self.cardinality
            .insert(substatement, Cardinality { min, max });
        self
    }

    /// `[0, *]`
    pub fn add_any(self, substatement: StatementDefinition) -> Self {
        self.add(substatement, 0, None)
    }

    /// `[0, 1]`
    pub fn add_optional(self, substatement: StatementDefinition) -> Self {
        self.add(substatement, 0, Some(1))
    }

    /// `[1, 1]`
    pub fn add_mandatory(self, substatement: StatementDefinition) -> Self {
        self.add(substatement, 1, Some(1))
    }

    /// `[1, *]`
    pub fn add_at_least_one(self, substatement: StatementDefinition) -> Self {
        self.add(substatement, 1, None)
    }

    pub fn build(self) -> SubstatementValidator {
        SubstatementValidator {
            parent: self.parent,
            cardinality: self.cardinality,
        }
    }
}
