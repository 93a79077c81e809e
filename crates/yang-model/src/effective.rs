//! Declared and effective statement views
//!
//! Once a build completes, the mutable statement graph is frozen into two
//! immutable trees:
//!
//! - [`DeclaredStatement`] mirrors the source text: exactly the
//!   substatements that were written, in source order.
//! - [`EffectiveStatement`] is the resolved model: groupings instantiated,
//!   augmentations applied, unsupported features removed. Copies of a
//!   statement share the declared view of the statement they came from.
//!
//! Both trees are reference counted and freely shareable between threads.
//!
//! # Sharing
//!
//! A statement whose meaning does not depend on where it sits (a
//! `description`, say) is not duplicated when copied; the same
//! `Arc<EffectiveStatement>` appears under every parent that received it.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::argument::{ArgumentValue, SchemaNodeIdentifier};
use crate::copy::CopyHistory;
use crate::qname::{QName, QNameModule, Revision, SchemaPath, SourceIdentifier};
use crate::reference::StatementSourceReference;
use crate::statement::StatementDefinition;
use crate::version::YangVersion;

/// A statement exactly as written in its source.
#[derive(Debug)]
pub struct DeclaredStatement {
    pub definition: StatementDefinition,
    pub keyword: String,
    pub raw_argument: Option<String>,
    pub argument: ArgumentValue,
    pub reference: StatementSourceReference,
    pub substatements: Vec<Arc<DeclaredStatement>>,
}

impl DeclaredStatement {
    pub fn find_first(&self, definition: StatementDefinition) -> Option<&Arc<DeclaredStatement>> {
        self.substatements.iter().find(|s| s.definition == definition)
    }
}

/// Statement-specific payload of an [`EffectiveStatement`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EffectiveKind {
    Module {
        name: String,
        module: QNameModule,
        prefix: String,
        version: YangVersion,
    },
    Submodule {
        name: String,
        belongs_to: String,
        version: YangVersion,
    },
    Import {
        module: SourceIdentifier,
        prefix: String,
    },
    Container {
        presence: bool,
    },
    Leaf {
        mandatory: bool,
    },
    LeafList,
    List {
        keys: Vec<QName>,
    },
    Choice,
    Case,
    Anydata,
    Grouping,
    Uses {
        grouping: QName,
    },
    Augment {
        target: SchemaNodeIdentifier,
    },
    Deviation {
        target: SchemaNodeIdentifier,
    },
    Typedef,
    Type {
        /// Resolved typedef for derived types; `None` for built-in types.
        typedef: Option<QName>,
    },
    /// Enumeration member with its explicit or assigned value.
    Enum {
        value: i32,
    },
    /// Bits member with its explicit or assigned position.
    Bit {
        position: u32,
    },
    Identity {
        bases: Vec<QName>,
        derived: Vec<QName>,
    },
    Feature,
    Extension,
    /// Instance of an extension statement.
    UnknownStatement {
        extension: Option<QName>,
    },
    /// Statements with no payload beyond their argument.
    Other,
}

/// A resolved, immutable statement.
#[derive(Debug)]
pub struct EffectiveStatement {
    pub definition: StatementDefinition,
    pub keyword: String,
    pub raw_argument: Option<String>,
    pub argument: ArgumentValue,
    pub reference: StatementSourceReference,
    pub history: &'static CopyHistory,
    /// Set for schema tree nodes and groupings.
    pub schema_path: Option<SchemaPath>,
    pub declared: Option<Arc<DeclaredStatement>>,
    pub substatements: Vec<Arc<EffectiveStatement>>,
    pub kind: EffectiveKind,
}

impl EffectiveStatement {
    pub fn qname(&self) -> Option<&QName> {
        self.argument.as_qname()
    }

    pub fn find_first(&self, definition: StatementDefinition) -> Option<&Arc<EffectiveStatement>> {
        self.substatements.iter().find(|s| s.definition == definition)
    }

    pub fn find_all(
        &self,
        definition: StatementDefinition,
    ) -> impl Iterator<Item = &Arc<EffectiveStatement>> + '_ {
        self.substatements
            .iter()
            .filter(move |s| s.definition == definition)
    }

    /// Schema tree children, in order.
    pub fn schema_children(&self) -> impl Iterator<Item = &Arc<EffectiveStatement>> + '_ {
        self.substatements
            .iter()
            .filter(|s| s.definition.is_schema_tree())
    }

    /// Schema tree child with the given name.
    pub fn schema_child(&self, name: &QName) -> Option<&Arc<EffectiveStatement>> {
        self.schema_children().find(|s| s.qname() == Some(name))
    }

    /// Schema tree child matched by local name only.
    pub fn schema_child_named(&self, local_name: &str) -> Option<&Arc<EffectiveStatement>> {
        self.schema_children()
            .find(|s| s.qname().is_some_and(|q| q.local_name == local_name))
    }

    /// Follow a sequence of local names down the schema tree.
    pub fn descendant(&self, local_names: &[&str]) -> Option<&Arc<EffectiveStatement>> {
        let (first, rest) = local_names.split_first()?;
        let mut current = self.schema_child_named(first)?;
        for name in rest {
            current = current.schema_child_named(name)?;
        }
        Some(current)
    }

    pub fn is_added_by_uses(&self) -> bool {
        self.history.is_added_by_uses()
    }

    pub fn is_augmenting(&self) -> bool {
        self.history.is_augmenting()
    }
}

/// Root of the effective model: every module and submodule of a build.
#[derive(Debug, Default)]
pub struct EffectiveModelContext {
    modules: Vec<Arc<EffectiveStatement>>,
    submodules: Vec<Arc<EffectiveStatement>>,
    declared_roots: Vec<Arc<DeclaredStatement>>,
}

impl EffectiveModelContext {
    pub fn new(
        modules: Vec<Arc<EffectiveStatement>>,
        submodules: Vec<Arc<EffectiveStatement>>,
        declared_roots: Vec<Arc<DeclaredStatement>>,
    ) -> Self {
        Self {
            modules,
            submodules,
            declared_roots,
        }
    }

    pub fn modules(&self) -> &[Arc<EffectiveStatement>] {
        &self.modules
    }

    pub fn submodules(&self) -> &[Arc<EffectiveStatement>] {
        &self.submodules
    }

    /// Declared root statements, in source order.
    pub fn declared_roots(&self) -> &[Arc<DeclaredStatement>] {
        &self.declared_roots
    }

    /// Module by name; with several revisions, the latest wins.
    pub fn find_module(&self, name: &str) -> Option<&Arc<EffectiveStatement>> {
        self.modules
            .iter()
            .filter(|m| matches!(&m.kind, EffectiveKind::Module { name: n, .. } if n == name))
            .max_by(|a, b| module_revision(a).cmp(&module_revision(b)))
    }

    pub fn find_module_revision(
        &self,
        name: &str,
        revision: Option<&Revision>,
    ) -> Option<&Arc<EffectiveStatement>> {
        self.modules.iter().find(|m| {
            matches!(&m.kind, EffectiveKind::Module { name: n, .. } if n == name)
                && module_revision(m) == revision
        })
    }

    pub fn find_module_by_qname_module(
        &self,
        module: &QNameModule,
    ) -> Option<&Arc<EffectiveStatement>> {
        self.modules
            .iter()
            .find(|m| matches!(&m.kind, EffectiveKind::Module { module: q, .. } if q == module))
    }

    /// All modules sharing a namespace URI (one per revision).
    pub fn find_modules_by_namespace<'a>(
        &'a self,
        namespace: &'a str,
    ) -> impl Iterator<Item = &'a Arc<EffectiveStatement>> + 'a {
        self.modules.iter().filter(move |m| {
            matches!(&m.kind, EffectiveKind::Module { module, .. } if module.namespace == namespace)
        })
    }

    /// Top-level data node of any module.
    pub fn data_child(&self, name: &QName) -> Option<&Arc<EffectiveStatement>> {
        self.find_module_by_qname_module(&name.module)?
            .schema_child(name)
    }
}

fn module_revision(module: &EffectiveStatement) -> Option<&Revision> {
    match &module.kind {
        EffectiveKind::Module { module, .. } => module.revision.as_ref(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stmt(
        definition: StatementDefinition,
        argument: ArgumentValue,
        kind: EffectiveKind,
        substatements: Vec<Arc<EffectiveStatement>>,
    ) -> Arc<EffectiveStatement> {
        Arc::new(EffectiveStatement {
            definition,
            keyword: definition.keyword().to_string(),
            raw_argument: None,
            argument,
            reference: StatementSourceReference::new("test.yang", 1, 1),
            history: CopyHistory::original(),
            schema_path: None,
            declared: None,
            substatements,
            kind,
        })
    }

    fn module(name: &str, revision: Option<&str>, children: Vec<Arc<EffectiveStatement>>) -> Arc<EffectiveStatement> {
        let qm = QNameModule::new(
            format!("urn:{name}"),
            revision.map(|r| Revision::parse(r).unwrap()),
        );
        stmt(
            StatementDefinition::Module,
            ArgumentValue::Identifier(name.to_string()),
            EffectiveKind::Module {
                name: name.to_string(),
                module: qm,
                prefix: name.to_string(),
                version: YangVersion::V1_1,
            },
            children,
        )
    }

    #[test]
    fn test_find_module_prefers_latest_revision() {
        let ctx = EffectiveModelContext::new(
            vec![
                module("a", Some("2020-01-01"), vec![]),
                module("a", Some("2022-06-30"), vec![]),
                module("b", None, vec![]),
            ],
            vec![],
            vec![],
        );
        let found = ctx.find_module("a").unwrap();
        assert_eq!(
            module_revision(found).map(Revision::as_str),
            Some("2022-06-30")
        );
        assert_eq!(ctx.find_modules_by_namespace("urn:a").count(), 2);
        assert!(ctx.find_module("c").is_none());
    }

    #[test]
    fn test_data_child_lookup() {
        let qm = QNameModule::new("urn:a", None);
        let top = QName::create(qm.clone(), "top").unwrap();
        let leaf = stmt(
            StatementDefinition::Leaf,
            ArgumentValue::QName(QName::create(qm.clone(), "x").unwrap()),
            EffectiveKind::Leaf { mandatory: false },
            vec![],
        );
        let container = stmt(
            StatementDefinition::Container,
            ArgumentValue::QName(top.clone()),
            EffectiveKind::Container { presence: false },
            vec![leaf],
        );
        let ctx = EffectiveModelContext::new(vec![module("a", None, vec![container])], vec![], vec![]);

        let found = ctx.data_child(&top).unwrap();
        assert_eq!(found.definition, StatementDefinition::Container);
        assert!(ctx.modules()[0].descendant(&["top", "x"]).is_some());
        assert!(ctx.modules()[0].descendant(&["top", "y"]).is_none());
    }
}
