//! Foundation types for the YANG schema model
//!
//! This crate holds the vocabulary shared by the statement reactor and the
//! statement supports built on top of it:
//!
//! - [`qname`] - qualified names, module identities and revisions
//! - [`statement`] - the closed set of recognised statement keywords
//! - [`argument`] - parsed statement argument values
//! - [`copy`] - copy provenance ([`CopyType`], interned [`CopyHistory`])
//! - [`effective`] - immutable declared/effective statement views and the
//!   assembled [`EffectiveModelContext`]
//!
//! Nothing in here knows how sources are parsed or how inference runs; the
//! types are plain data so they can be shared freely once a build finishes.

pub mod argument;
pub mod copy;
pub mod effective;
pub mod error;
pub mod qname;
pub mod reference;
pub mod statement;
pub mod version;

pub use argument::{
    ArgumentValue, DeviateKind, IfFeatureExpr, MaxElements, OrderedBy, SchemaNodeIdentifier,
    Status,
};
pub use copy::{CopyHistory, CopyType};
pub use effective::{
    DeclaredStatement, EffectiveKind, EffectiveModelContext, EffectiveStatement,
};
pub use error::ModelError;
pub use qname::{QName, QNameModule, Revision, SchemaPath, SourceIdentifier};
pub use reference::StatementSourceReference;
pub use statement::StatementDefinition;
pub use version::YangVersion;
