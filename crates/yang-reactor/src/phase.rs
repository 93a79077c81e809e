//! Model processing phases
//!
//! Every statement of every source passes through the same totally ordered
//! sequence of phases, in lock-step across the whole source set:
//!
//! ```text
//! Init -> SourcePreLinkage -> SourceLinkage -> StatementDefinition
//!      -> FullDeclaration -> EffectiveModel
//! ```
//!
//! No source enters phase N+1 before every source has completed phase N.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A processing phase.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum ModelProcessingPhase {
    Init,
    /// Module identity and linkage statements are declared.
    SourcePreLinkage,
    /// Imports, includes and belongs-to are resolved.
    SourceLinkage,
    /// Extensions, identities, features and typedefs are declared.
    StatementDefinition,
    /// Every remaining statement is declared and validated.
    FullDeclaration,
    /// Cross-statement inference (uses, augment, type resolution).
    EffectiveModel,
}

impl ModelProcessingPhase {
    /// Phases in execution order.
    pub const ALL: [ModelProcessingPhase; 6] = [
        Self::Init,
        Self::SourcePreLinkage,
        Self::SourceLinkage,
        Self::StatementDefinition,
        Self::FullDeclaration,
        Self::EffectiveModel,
    ];

    /// Numeric execution order.
    pub fn execution_order(self) -> usize {
        self as usize
    }

    /// The phase that must complete before this one starts.
    pub fn previous(self) -> Option<Self> {
        match self {
            Self::Init => None,
            Self::SourcePreLinkage => Some(Self::Init),
            Self::SourceLinkage => Some(Self::SourcePreLinkage),
            Self::StatementDefinition => Some(Self::SourceLinkage),
            Self::FullDeclaration => Some(Self::StatementDefinition),
            Self::EffectiveModel => Some(Self::FullDeclaration),
        }
    }

    pub fn next(self) -> Option<Self> {
        Self::ALL.get(self.execution_order() + 1).copied()
    }

    /// True if reaching `other` means this phase is complete.
    pub fn is_completed_by(self, other: Self) -> bool {
        other.execution_order() >= self.execution_order()
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Init => "INIT",
            Self::SourcePreLinkage => "SOURCE_PRE_LINKAGE",
            Self::SourceLinkage => "SOURCE_LINKAGE",
            Self::StatementDefinition => "STATEMENT_DEFINITION",
            Self::FullDeclaration => "FULL_DECLARATION",
            Self::EffectiveModel => "EFFECTIVE_MODEL",
        }
    }
}

impl fmt::Display for ModelProcessingPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_chain_is_consistent() {
        for pair in ModelProcessingPhase::ALL.windows(2) {
            assert_eq!(pair[1].previous(), Some(pair[0]));
            assert_eq!(pair[0].next(), Some(pair[1]));
        }
        assert_eq!(ModelProcessingPhase::EffectiveModel.next(), None);
        assert_eq!(ModelProcessingPhase::Init.previous(), None);
    }

    #[test]
    fn test_is_completed_by() {
        use ModelProcessingPhase::*;
        assert!(SourceLinkage.is_completed_by(SourceLinkage));
        assert!(SourceLinkage.is_completed_by(EffectiveModel));
        assert!(!FullDeclaration.is_completed_by(StatementDefinition));
    }
}
