//! YANG 1 and YANG 1.1 on top of the statement reactor
//!
//! This crate gives the YANG keywords their meaning: argument syntax,
//! namespaces, linkage between sources, and the inference that instantiates
//! groupings and applies augmentations. [`default_reactor`] wires every
//! support into a ready-to-use reactor.
//!
//! # Phases
//!
//! Statements are introduced in the phase where they are first needed:
//!
//! - `SOURCE_PRE_LINKAGE`: module identity and linkage statements
//! - `STATEMENT_DEFINITION`: extensions, identities, features, typedefs with
//!   their type bodies, and documentation
//! - `FULL_DECLARATION`: everything else, data definitions in particular
//!
//! # Example
//!
//! ```ignore
//! let model = yang_rfc7950::default_reactor()
//!     .new_build()
//!     .add_sources(sources)
//!     .build()?;
//! let module = model.find_module("example").expect("module is present");
//! ```

pub mod argument;
pub mod namespaces;
pub mod stmt;

use yang_model::StatementDefinition as Def;
use yang_reactor::{CrossSourceStatementReactor, ModelProcessingPhase as Phase, ReactorBuilder};

use crate::stmt::augment::AugmentSupport;
use crate::stmt::data::{DataDefinitionSupport, KeySupport};
use crate::stmt::deviation::{DeviateSupport, DeviationSupport};
use crate::stmt::extension::{ArgumentSupport, ExtensionSupport, UnknownStatementSupport};
use crate::stmt::feature::{FeatureSupport, IfFeatureSupport};
use crate::stmt::grouping::{GroupingSupport, RefineSupport, UsesSupport};
use crate::stmt::identity::{BaseSupport, IdentitySupport};
use crate::stmt::linkage::{BelongsToSupport, ImportSupport, IncludeSupport};
use crate::stmt::meta::PlainSupport;
use crate::stmt::module::{ModuleSupport, SubmoduleSupport};
use crate::stmt::restriction::{BitSupport, EnumSupport};
use crate::stmt::typedef::{TypeSupport, TypedefSupport};

/// Builder preloaded with every YANG statement support and namespace.
///
/// Callers may override individual supports before building.
pub fn reactor_builder() -> ReactorBuilder {
    let builder = CrossSourceStatementReactor::builder()
        // Linkage
        .add_support(Phase::SourcePreLinkage, ModuleSupport::default())
        .add_support(Phase::SourcePreLinkage, SubmoduleSupport::default())
        .add_support(Phase::SourcePreLinkage, PlainSupport::yang_version())
        .add_support(Phase::SourcePreLinkage, PlainSupport::namespace())
        .add_support(Phase::SourcePreLinkage, PlainSupport::prefix())
        .add_support(Phase::SourcePreLinkage, ImportSupport::default())
        .add_support(Phase::SourcePreLinkage, IncludeSupport::default())
        .add_support(Phase::SourcePreLinkage, BelongsToSupport::default())
        .add_support(Phase::SourcePreLinkage, PlainSupport::revision())
        .add_support(Phase::SourcePreLinkage, PlainSupport::revision_date())
        // Definitions
        .add_support(Phase::StatementDefinition, ExtensionSupport::default())
        .add_support(Phase::StatementDefinition, ArgumentSupport::default())
        .add_support(Phase::StatementDefinition, PlainSupport::yin_element())
        .add_support(Phase::StatementDefinition, IdentitySupport::default())
        .add_support(Phase::StatementDefinition, BaseSupport)
        .add_support(Phase::StatementDefinition, FeatureSupport::default())
        .add_support(Phase::StatementDefinition, TypedefSupport::default())
        .add_support(Phase::StatementDefinition, TypeSupport::default())
        .add_support(Phase::StatementDefinition, EnumSupport::default())
        .add_support(Phase::StatementDefinition, PlainSupport::value())
        .add_support(Phase::StatementDefinition, BitSupport::default())
        .add_support(Phase::StatementDefinition, PlainSupport::position())
        .add_support(Phase::StatementDefinition, PlainSupport::range(Def::Range))
        .add_support(Phase::StatementDefinition, PlainSupport::range(Def::Length))
        .add_support(Phase::StatementDefinition, PlainSupport::pattern())
        .add_support(Phase::StatementDefinition, PlainSupport::modifier())
        .add_support(Phase::StatementDefinition, PlainSupport::text(Def::ErrorMessage))
        .add_support(Phase::StatementDefinition, PlainSupport::text(Def::ErrorAppTag))
        .add_support(Phase::StatementDefinition, PlainSupport::path())
        .add_support(Phase::StatementDefinition, PlainSupport::require_instance())
        .add_support(Phase::StatementDefinition, PlainSupport::fraction_digits())
        .add_support(Phase::StatementDefinition, PlainSupport::status())
        .add_support(Phase::StatementDefinition, PlainSupport::text(Def::Description))
        .add_support(Phase::StatementDefinition, PlainSupport::text(Def::Reference))
        .add_support(Phase::StatementDefinition, PlainSupport::text(Def::Organization))
        .add_support(Phase::StatementDefinition, PlainSupport::text(Def::Contact))
        .add_support(Phase::StatementDefinition, PlainSupport::text(Def::Units))
        .add_support(Phase::StatementDefinition, PlainSupport::text(Def::Default))
        // Full declaration
        .add_support(Phase::FullDeclaration, IfFeatureSupport)
        .add_support(Phase::FullDeclaration, PlainSupport::text(Def::Presence))
        .add_support(Phase::FullDeclaration, PlainSupport::text(Def::When))
        .add_support(Phase::FullDeclaration, PlainSupport::must())
        .add_support(Phase::FullDeclaration, PlainSupport::config())
        .add_support(Phase::FullDeclaration, PlainSupport::mandatory())
        .add_support(Phase::FullDeclaration, PlainSupport::min_elements())
        .add_support(Phase::FullDeclaration, PlainSupport::max_elements())
        .add_support(Phase::FullDeclaration, PlainSupport::ordered_by())
        .add_support(Phase::FullDeclaration, KeySupport)
        .add_support(Phase::FullDeclaration, DataDefinitionSupport::container())
        .add_support(Phase::FullDeclaration, DataDefinitionSupport::leaf())
        .add_support(Phase::FullDeclaration, DataDefinitionSupport::leaf_list())
        .add_support(Phase::FullDeclaration, DataDefinitionSupport::list())
        .add_support(Phase::FullDeclaration, DataDefinitionSupport::choice())
        .add_support(Phase::FullDeclaration, DataDefinitionSupport::case())
        .add_support(Phase::FullDeclaration, DataDefinitionSupport::anydata())
        .add_support(Phase::FullDeclaration, DataDefinitionSupport::anyxml())
        .add_support(Phase::FullDeclaration, GroupingSupport::default())
        .add_support(Phase::FullDeclaration, UsesSupport::default())
        .add_support(Phase::FullDeclaration, RefineSupport::default())
        .add_support(Phase::FullDeclaration, AugmentSupport::default())
        .add_support(Phase::FullDeclaration, DeviationSupport::default())
        .add_support(Phase::FullDeclaration, DeviateSupport::default())
        .unknown_statement_support(UnknownStatementSupport);
    namespaces::register(builder)
}

/// Reactor with the standard YANG statement set.
pub fn default_reactor() -> CrossSourceStatementReactor {
    reactor_builder().build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_native_keyword_has_support() {
        let reactor = default_reactor();
        let full = reactor.bundle(Phase::FullDeclaration).unwrap();
        for definition in Def::ALL {
            assert!(full.has_support(definition.keyword()), "missing {definition}");
        }
    }

    #[test]
    fn test_linkage_statements_come_first() {
        let reactor = default_reactor();
        let pre_linkage = reactor.bundle(Phase::SourcePreLinkage).unwrap();
        assert!(pre_linkage.has_support("import"));
        assert!(pre_linkage.has_support("belongs-to"));
        assert!(!pre_linkage.has_support("typedef"));
        assert!(!pre_linkage.has_support("container"));

        let definitions = reactor.bundle(Phase::StatementDefinition).unwrap();
        assert!(definitions.has_support("identity"));
        assert!(definitions.has_support("enum"));
        assert!(definitions.has_support("fraction-digits"));
        assert!(!definitions.has_support("uses"));
    }
}
