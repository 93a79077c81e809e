//! Statement processing reactor
//!
//! Turns a forest of raw statements, one tree per source, into an immutable
//! [`EffectiveModelContext`](yang_model::EffectiveModelContext). The reactor
//! itself knows nothing about individual keywords; their behaviour comes from
//! [`StatementSupport`] plug-ins registered per phase.
//!
//! # Architecture
//!
//! - [`phase`] - the totally ordered processing phases
//! - [`namespace`] - typed key/value stores and their scoping behaviours
//! - [`context`] - the statement arena
//! - [`support`] - the statement support contract and bundles
//! - [`action`] - inference actions, prerequisites and the worklist
//! - [`validator`] - substatement cardinality checks
//! - [`build`] - the phase driver
//! - [`reactor`] - reactor assembly and the build entry point
//!
//! # Errors
//!
//! Every failure is a [`ReactorError`] carrying the source reference of the
//! statement involved. Inference failures are collected per phase into
//! [`ReactorError::PhaseFailed`].

pub mod action;
pub mod build;
pub mod config;
pub mod context;
mod copy;
mod effective;
pub mod error;
pub mod namespace;
pub mod phase;
pub mod reactor;
pub mod source;
pub mod support;
pub mod validator;

pub use action::{FailedPrerequisites, InferenceAction, InferenceContext, ModelActionBuilder, Prerequisite};
pub use build::BuildContext;
pub use config::ReactorConfig;
pub use context::StmtId;
pub use error::{ErrorKind, ReactorError, Result};
pub use namespace::{NamespaceBehaviour, NamespaceScope, ParserNamespace, StorageNodeType};
pub use phase::ModelProcessingPhase;
pub use reactor::{BuildAction, CrossSourceStatementReactor, ReactorBuilder};
pub use source::{RawStatement, SourceLink, StatementStreamSource};
pub use support::{CopyPolicy, EffectiveBase, StatementSupport, StatementSupportBundle, StmtMut};
pub use validator::{Cardinality, SubstatementValidator, SubstatementValidatorBuilder};
