//! Namespaces used by the YANG statement supports
//!
//! | namespace | key | scope | from |
//! |-----------|-----|-------|------|
//! | [`ModuleNamespace`] | source identifier | global | pre-linkage |
//! | [`ModuleByName`] | module name (latest revision) | global | pre-linkage |
//! | [`SubmoduleNamespace`] | source identifier | global | pre-linkage |
//! | [`SubmoduleByName`] | submodule name (latest revision) | global | pre-linkage |
//! | [`ModuleQName`] | `()` | root statement | linkage |
//! | [`NamespaceToModule`] | module identity | global | linkage |
//! | [`PrefixToModule`] | prefix | root statement | linkage |
//! | [`TypedefNamespace`] | typedef name | tree scoped | statement definition |
//! | [`IdentityNamespace`] | identity name | global | statement definition |
//! | [`DerivedIdentities`] | derived identity name | statement | statement definition |
//! | [`FeatureNamespace`] | feature name | global | statement definition |
//! | [`ExtensionNamespace`] | extension name | global | statement definition |
//! | [`GroupingNamespace`] | grouping name | tree scoped | full declaration |
//! | [`SchemaTreeNamespace`] | schema node name | statement | full declaration |

use yang_model::{QName, QNameModule, SourceIdentifier};
use yang_reactor::{
    ModelProcessingPhase as Phase, NamespaceBehaviour, ParserNamespace, ReactorBuilder, StmtId,
};

macro_rules! namespace {
    ($(#[$meta:meta])* $name:ident: $key:ty => $value:ty) => {
        $(#[$meta])*
        pub struct $name;

        impl ParserNamespace for $name {
            type Key = $key;
            type Value = $value;
            const NAME: &'static str = stringify!($name);
        }
    };
}

namespace! {
    /// Module roots by exact identity.
    ModuleNamespace: SourceIdentifier => StmtId
}

namespace! {
    /// Module roots by name; holds the latest revision seen.
    ModuleByName: String => StmtId
}

namespace! {
    SubmoduleNamespace: SourceIdentifier => StmtId
}

namespace! {
    SubmoduleByName: String => StmtId
}

namespace! {
    /// Module identity a root statement defines names in.
    ///
    /// For submodules this is the identity of the module they belong to.
    ModuleQName: () => QNameModule
}

namespace! {
    NamespaceToModule: QNameModule => StmtId
}

namespace! {
    /// Own prefix plus every import prefix of a root statement.
    PrefixToModule: String => QNameModule
}

namespace! {
    TypedefNamespace: QName => StmtId
}

namespace! {
    IdentityNamespace: QName => StmtId
}

namespace! {
    /// Identities naming this identity as a base.
    DerivedIdentities: QName => StmtId
}

namespace! {
    FeatureNamespace: QName => StmtId
}

namespace! {
    ExtensionNamespace: QName => StmtId
}

namespace! {
    GroupingNamespace: QName => StmtId
}

namespace! {
    /// Schema tree children of a statement, declared or added by `uses`
    /// and `augment`.
    SchemaTreeNamespace: QName => StmtId
}

/// Register every namespace above.
pub fn register(builder: ReactorBuilder) -> ReactorBuilder {
    builder
        .add_namespace(NamespaceBehaviour::global::<ModuleNamespace>(Phase::SourcePreLinkage))
        .add_namespace(NamespaceBehaviour::global::<ModuleByName>(Phase::SourcePreLinkage))
        .add_namespace(NamespaceBehaviour::global::<SubmoduleNamespace>(Phase::SourcePreLinkage))
        .add_namespace(NamespaceBehaviour::global::<SubmoduleByName>(Phase::SourcePreLinkage))
        .add_namespace(NamespaceBehaviour::root_statement_local::<ModuleQName>(Phase::SourceLinkage))
        .add_namespace(NamespaceBehaviour::global::<NamespaceToModule>(Phase::SourceLinkage))
        .add_namespace(NamespaceBehaviour::root_statement_local::<PrefixToModule>(Phase::SourceLinkage))
        .add_namespace(NamespaceBehaviour::tree_scoped::<TypedefNamespace>(Phase::StatementDefinition))
        .add_namespace(NamespaceBehaviour::global::<IdentityNamespace>(Phase::StatementDefinition))
        .add_namespace(NamespaceBehaviour::statement_local::<DerivedIdentities>(
            Phase::StatementDefinition,
        ))
        .add_namespace(NamespaceBehaviour::global::<FeatureNamespace>(Phase::StatementDefinition))
        .add_namespace(NamespaceBehaviour::global::<ExtensionNamespace>(Phase::StatementDefinition))
        .add_namespace(NamespaceBehaviour::tree_scoped::<GroupingNamespace>(Phase::FullDeclaration))
        .add_namespace(NamespaceBehaviour::statement_local::<SchemaTreeNamespace>(
            Phase::FullDeclaration,
        ))
}
