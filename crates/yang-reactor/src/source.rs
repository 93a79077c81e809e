//! Source input
//!
//! The text parser hands the reactor one [`RawStatement`] tree per source,
//! wrapped in a [`StatementStreamSource`]. Internally the tree is flattened
//! in pre-order so statements can be materialised phase by phase while
//! keeping their position among siblings.

use yang_model::StatementSourceReference;

use crate::context::{SourceId, StmtId};
use crate::namespace::NamespaceStorage;

/// A statement as produced by the text parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawStatement {
    pub keyword: String,
    pub argument: Option<String>,
    pub reference: StatementSourceReference,
    pub substatements: Vec<RawStatement>,
}

impl RawStatement {
    pub fn new(
        keyword: impl Into<String>,
        argument: Option<&str>,
        reference: StatementSourceReference,
    ) -> Self {
        Self {
            keyword: keyword.into(),
            argument: argument.map(str::to_string),
            reference,
            substatements: Vec::new(),
        }
    }

    pub fn with_substatement(mut self, child: RawStatement) -> Self {
        self.substatements.push(child);
        self
    }
}

/// One parsed source: a name for diagnostics plus its root statement.
#[derive(Debug, Clone)]
pub struct StatementStreamSource {
    name: String,
    root: RawStatement,
}

impl StatementStreamSource {
    pub fn new(name: impl Into<String>, root: RawStatement) -> Self {
        Self {
            name: name.into(),
            root,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn root(&self) -> &RawStatement {
        &self.root
    }
}

/// How one source came to see another.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceLink {
    /// `import`: only the linked source itself is visible.
    Import,
    /// `include` or `belongs-to`: the linked source is part of the same
    /// module, so whatever it includes is visible too.
    Include,
}

/// Flattened raw statement awaiting or past materialisation.
#[derive(Debug)]
pub(crate) struct RawNode {
    pub(crate) keyword: String,
    pub(crate) argument: Option<String>,
    pub(crate) reference: StatementSourceReference,
    pub(crate) parent: Option<usize>,
    pub(crate) children: Vec<usize>,
    pub(crate) emitted: Option<StmtId>,
}

/// Per-source state of a build.
#[derive(Debug)]
pub(crate) struct SourceContext {
    pub(crate) name: String,
    pub(crate) nodes: Vec<RawNode>,
    pub(crate) root: Option<StmtId>,
    /// Storage for source-local namespaces.
    pub(crate) storage: NamespaceStorage,
    /// Sources reachable through import, include or belongs-to.
    pub(crate) links: Vec<(SourceId, SourceLink)>,
}

impl SourceContext {
    pub(crate) fn new(source: StatementStreamSource) -> Self {
        let mut nodes = Vec::new();
        flatten(source.root, None, &mut nodes);
        Self {
            name: source.name,
            nodes,
            root: None,
            storage: NamespaceStorage::default(),
            links: Vec::new(),
        }
    }

    /// Position of raw node `index` among the already emitted siblings.
    pub(crate) fn emitted_position(&self, index: usize) -> usize {
        let Some(parent) = self.nodes[index].parent else {
            return 0;
        };
        self.nodes[parent]
            .children
            .iter()
            .take_while(|sibling| **sibling != index)
            .filter(|sibling| self.nodes[**sibling].emitted.is_some())
            .count()
    }

    pub(crate) fn pending_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.emitted.is_none()).count()
    }
}

fn flatten(statement: RawStatement, parent: Option<usize>, nodes: &mut Vec<RawNode>) -> usize {
    let index = nodes.len();
    nodes.push(RawNode {
        keyword: statement.keyword,
        argument: statement.argument,
        reference: statement.reference,
        parent,
        children: Vec::new(),
        emitted: None,
    });
    for child in statement.substatements {
        let child_index = flatten(child, Some(index), nodes);
        nodes[index].children.push(child_index);
    }
    index
}
