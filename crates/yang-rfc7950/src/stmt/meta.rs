//! Statements described entirely by their argument
//!
//! Documentation, constraints and linkage details (`description`, `config`,
//! `revision-date`, ...) carry a value and nothing else. A single
//! [`PlainSupport`] covers all of them, configured with the argument kind,
//! copy policy and, where the grammar allows substatements, a validator.

use yang_model::{ArgumentValue, StatementDefinition as Def};
use yang_reactor::{BuildContext, CopyPolicy, Result, StatementSupport, StmtId, SubstatementValidator};

use crate::argument::ArgumentKind;

pub struct PlainSupport {
    definition: Def,
    argument: ArgumentKind,
    policy: CopyPolicy,
    validator: Option<SubstatementValidator>,
}

impl PlainSupport {
    /// Context-independent statement without substatements.
    pub fn new(definition: Def, argument: ArgumentKind) -> Self {
        Self {
            definition,
            argument,
            policy: CopyPolicy::ContextIndependent,
            validator: None,
        }
    }

    pub fn with_policy(mut self, policy: CopyPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_validator(mut self, validator: SubstatementValidator) -> Self {
        self.validator = Some(validator);
        self
    }

    pub fn yang_version() -> Self {
        Self::new(Def::YangVersion, ArgumentKind::Version).with_policy(CopyPolicy::Reject)
    }

    pub fn namespace() -> Self {
        Self::new(Def::Namespace, ArgumentKind::Text).with_policy(CopyPolicy::Reject)
    }

    pub fn prefix() -> Self {
        Self::new(Def::Prefix, ArgumentKind::Identifier).with_policy(CopyPolicy::Reject)
    }

    pub fn revision() -> Self {
        Self::new(Def::Revision, ArgumentKind::Revision)
            .with_policy(CopyPolicy::Reject)
            .with_validator(
                SubstatementValidator::builder(Def::Revision)
                    .add_optional(Def::Description)
                    .add_optional(Def::Reference)
                    .build(),
            )
    }

    pub fn revision_date() -> Self {
        Self::new(Def::RevisionDate, ArgumentKind::Revision).with_policy(CopyPolicy::Reject)
    }

    /// `organization`, `contact`, `description`, `reference`, `units`,
    /// `default`, `presence`, `when`.
    pub fn text(definition: Def) -> Self {
        Self::new(definition, ArgumentKind::Text)
    }

    pub fn status() -> Self {
        Self::new(Def::Status, ArgumentKind::Status)
    }

    pub fn config() -> Self {
        Self::new(Def::Config, ArgumentKind::Boolean)
    }

    pub fn mandatory() -> Self {
        Self::new(Def::Mandatory, ArgumentKind::Boolean)
    }

    pub fn min_elements() -> Self {
        Self::new(Def::MinElements, ArgumentKind::Unsigned)
    }

    pub fn max_elements() -> Self {
        Self::new(Def::MaxElements, ArgumentKind::MaxElements)
    }

    pub fn ordered_by() -> Self {
        Self::new(Def::OrderedBy, ArgumentKind::OrderedBy)
    }

    pub fn must() -> Self {
        Self::new(Def::Must, ArgumentKind::Text).with_validator(
            SubstatementValidator::builder(Def::Must)
                .add_optional(Def::Description)
                .add_optional(Def::Reference)
                .build(),
        )
    }

    pub fn yin_element() -> Self {
        Self::new(Def::YinElement, ArgumentKind::Boolean).with_policy(CopyPolicy::Reject)
    }
}

impl StatementSupport for PlainSupport {
    fn definition(&self) -> Def {
        self.definition
    }

    fn copy_policy(&self) -> CopyPolicy {
        self.policy
    }

    fn parse_argument(&self, build: &BuildContext, id: StmtId, raw: Option<&str>) -> Result<ArgumentValue> {
        self.argument.parse(build, id, raw)
    }

    fn validator(&self) -> Option<&SubstatementValidator> {
        self.validator.as_ref()
    }
}
