//! Statement supports, one module per statement family.
//!
//! - [`module`] - `module`, `submodule`
//! - [`linkage`] - `import`, `include`, `belongs-to`
//! - [`meta`] - statements with no behaviour beyond their argument
//! - [`data`] - data definition statements and `key`
//! - [`grouping`] - `grouping`, `uses`, `refine`
//! - [`augment`] - `augment`
//! - [`typedef`] - `typedef`, `type`
//! - [`restriction`] - `enum`, `bit`, `range`, `pattern` and the rest of a
//!   type's body
//! - [`deviation`] - `deviation`, `deviate`
//! - [`identity`] - `identity`, `base`
//! - [`feature`] - `feature`, `if-feature`
//! - [`extension`] - `extension`, `argument`, extension instances

pub mod augment;
pub mod data;
pub mod deviation;
pub mod extension;
pub mod feature;
pub mod grouping;
pub mod identity;
pub mod linkage;
pub mod meta;
pub mod module;
pub mod restriction;
pub mod typedef;

use yang_model::{ArgumentValue, QName, StatementDefinition as Def};
use yang_reactor::{
    BuildContext, ParserNamespace, Result, StmtId, StmtMut, SubstatementValidatorBuilder,
};

use crate::argument::source_error;
use crate::namespaces::SchemaTreeNamespace;

/// True for statements of a source ignored as a duplicate module.
///
/// Such trees are still declared but register nothing globally and
/// schedule no inference.
pub(crate) fn in_ignored_source(build: &BuildContext, id: StmtId) -> bool {
    !build.is_supported_to_build_effective(build.root(id))
}

/// QName argument of `id`, or an internal error.
pub(crate) fn qname_argument(build: &BuildContext, id: StmtId) -> Result<QName> {
    build.argument(id).as_qname().cloned().ok_or_else(|| {
        yang_reactor::ReactorError::internal(
            build.reference(id),
            format!("{} has no qualified name", build.describe(id)),
        )
    })
}

/// Register `id` under its QName in `N`, rejecting a second definition at
/// the same storage node.
pub(crate) fn register_unique<N>(ctx: &mut StmtMut<'_>, at: StmtId, what: &str) -> Result<()>
where
    N: ParserNamespace<Key = QName, Value = StmtId>,
{
    let id = ctx.id();
    let name = qname_argument(ctx, id)?;
    if let Some(previous) = ctx.namespace_add::<N>(at, name.clone(), id)? {
        ctx.namespace_add::<N>(at, name.clone(), previous)?;
        return Err(source_error(
            ctx,
            id,
            format!(
                "duplicate {what} '{}', previously defined at {}",
                name.local_name,
                ctx.reference(previous)
            ),
        ));
    }
    Ok(())
}

/// Register schema node `child` under `parent`.
///
/// Returns the node already registered there under the same name instead,
/// which is left in place.
pub(crate) fn add_schema_tree_child(
    build: &mut BuildContext,
    parent: StmtId,
    child: StmtId,
) -> Result<Option<StmtId>> {
    let name = qname_argument(build, child)?;
    if let Some(existing) = build.namespace_get::<SchemaTreeNamespace>(parent, &name)?.copied() {
        return Ok(Some(existing));
    }
    build.namespace_add::<SchemaTreeNamespace>(parent, name, child)?;
    Ok(None)
}

/// Register the schema tree below a fresh copy. Copies skip the
/// declaration callbacks that index declared nodes.
pub(crate) fn index_copied_schema_tree(build: &mut BuildContext, copy: StmtId) -> Result<()> {
    for child in build.substatements(copy) {
        if build.definition(child).is_schema_tree() {
            add_schema_tree_child(build, copy, child)?;
            index_copied_schema_tree(build, child)?;
        }
    }
    Ok(())
}

/// Boolean argument of the first `definition` substatement of `id`.
pub(crate) fn flag(build: &BuildContext, id: StmtId, definition: Def) -> Option<bool> {
    build
        .find_substatement(id, definition)
        .and_then(|child| build.argument(child).as_bool())
}

/// True if `id` is a node that must be present in data.
pub(crate) fn is_mandatory(build: &BuildContext, id: StmtId) -> bool {
    match build.definition(id) {
        Def::Leaf | Def::Choice | Def::Anydata | Def::Anyxml => {
            flag(build, id, Def::Mandatory) == Some(true)
        }
        Def::List | Def::LeafList => build
            .find_substatement(id, Def::MinElements)
            .is_some_and(|min| matches!(build.argument(min), ArgumentValue::Unsigned(n) if *n > 0)),
        Def::Container => {
            build.find_substatement(id, Def::Presence).is_none()
                && build
                    .substatements(id)
                    .into_iter()
                    .any(|child| build.definition(child).is_schema_tree() && is_mandatory(build, child))
        }
        _ => false,
    }
}

/// Children copied by `uses` and `augment`: schema nodes and extension
/// instances.
pub(crate) fn copied_children(build: &BuildContext, id: StmtId) -> Vec<StmtId> {
    build
        .substatements(id)
        .into_iter()
        .filter(|child| {
            let definition = build.definition(*child);
            definition.is_schema_tree() || definition == Def::Unknown
        })
        .collect()
}

/// Common substatements of `status`/`description`/`reference`.
pub(crate) fn documented(builder: SubstatementValidatorBuilder) -> SubstatementValidatorBuilder {
    builder
        .add_optional(Def::Status)
        .add_optional(Def::Description)
        .add_optional(Def::Reference)
}

/// Every data definition statement plus `uses`, any number of times.
pub(crate) fn data_definitions(builder: SubstatementValidatorBuilder) -> SubstatementValidatorBuilder {
    builder
        .add_any(Def::Container)
        .add_any(Def::Leaf)
        .add_any(Def::LeafList)
        .add_any(Def::List)
        .add_any(Def::Choice)
        .add_any(Def::Anydata)
        .add_any(Def::Anyxml)
        .add_any(Def::Uses)
}

/// Schema tree child of `parent` named `name`, declared or inferred.
pub(crate) fn schema_child(build: &BuildContext, parent: StmtId, name: &QName) -> Option<StmtId> {
    build.substatements(parent).into_iter().find(|child| {
        build.definition(*child).is_schema_tree() && build.argument(*child).as_qname() == Some(name)
    })
}
