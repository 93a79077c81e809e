//! Definitions resolved before data nodes: identities, typedefs and
//! extensions, plus substatement validation and the two model views.

mod common;

use common::{build, build_err, build_ok, init_tracing, parse, qname};
use yang_model::{ArgumentValue, EffectiveKind, StatementDefinition as Def};
use yang_reactor::{
    BuildContext, ErrorKind, ModelProcessingPhase, ReactorError, Result, StatementSupport, StmtId,
    StmtMut,
};
use yang_rfc7950::namespaces::GroupingNamespace;

// =============================================================================
// Identities
// =============================================================================

#[test]
fn test_identity_derivation_within_module() {
    let a = r#"
    module a {
        namespace "urn:a";
        prefix a;
        identity animal;
        identity dog { base animal; }
        identity cat { base a:animal; }
        leaf pet { type identityref { base animal; } }
    }
    "#;
    let model = build_ok(&[("a.yang", a)]);
    let module = model.find_module("a").unwrap();
    let identities: Vec<_> = module.find_all(Def::Identity).collect();
    assert_eq!(identities.len(), 3);

    assert_eq!(
        identities[0].kind,
        EffectiveKind::Identity {
            bases: vec![],
            derived: vec![qname("urn:a", "dog"), qname("urn:a", "cat")],
        }
    );
    assert_eq!(
        identities[1].kind,
        EffectiveKind::Identity {
            bases: vec![qname("urn:a", "animal")],
            derived: vec![],
        }
    );
}

#[test]
fn test_identity_derivation_across_modules() {
    let a = r#"
    module a {
        namespace "urn:a";
        prefix a;
        identity crypto-alg;
    }
    "#;
    let b = r#"
    module b {
        namespace "urn:b";
        prefix b;
        import a { prefix a; }
        identity aes { base a:crypto-alg; }
    }
    "#;
    let model = build_ok(&[("b.yang", b), ("a.yang", a)]);
    let base = model.find_module("a").unwrap().find_first(Def::Identity).unwrap();
    match &base.kind {
        EffectiveKind::Identity { derived, .. } => {
            assert_eq!(derived, &vec![qname("urn:b", "aes")]);
        }
        other => panic!("expected identity, got {other:?}"),
    }
}

#[test]
fn test_unknown_base_identity() {
    let a = r#"
    module a {
        namespace "urn:a";
        prefix a;
        identity x { base ghost; }
    }
    "#;
    let err = build(&[("a.yang", a)]).unwrap_err();
    assert!(matches!(
        err,
        ReactorError::PhaseFailed {
            phase: ModelProcessingPhase::StatementDefinition,
            ..
        }
    ));
    assert!(err
        .to_string()
        .contains("Base identity 'ghost' of identity 'x' was not found"));
}

#[test]
fn test_unknown_identityref_base() {
    let a = r#"
    module a {
        namespace "urn:a";
        prefix a;
        leaf l { type identityref { base ghost; } }
    }
    "#;
    let causes = build_err(&[("a.yang", a)]);
    assert!(causes[0]
        .to_string()
        .contains("Referenced base identity 'ghost' was not found"));
}

#[test]
fn test_identity_derived_from_itself() {
    let a = r#"
    module a {
        namespace "urn:a";
        prefix a;
        identity x { base x; }
    }
    "#;
    let causes = build_err(&[("a.yang", a)]);
    assert!(causes[0].to_string().contains("Identity 'x' is derived from itself"));
}

// =============================================================================
// Typedefs
// =============================================================================

#[test]
fn test_typedef_chain_resolves() {
    let a = r#"
    module a {
        namespace "urn:a";
        prefix a;
        typedef percent { type uint8; units "%"; }
        typedef load { type percent; }
        leaf cpu { type load; }
        leaf name { type string; }
    }
    "#;
    let model = build_ok(&[("a.yang", a)]);
    let module = model.find_module("a").unwrap();
    let cpu_type = module.schema_child_named("cpu").unwrap().find_first(Def::Type).unwrap();
    assert_eq!(
        cpu_type.kind,
        EffectiveKind::Type {
            typedef: Some(qname("urn:a", "load"))
        }
    );
    let name_type = module.schema_child_named("name").unwrap().find_first(Def::Type).unwrap();
    assert_eq!(name_type.kind, EffectiveKind::Type { typedef: None });
}

#[test]
fn test_typedef_from_submodule_of_imported_module() {
    let a = r#"
    module a {
        namespace "urn:a";
        prefix a;
        include asub;
    }
    "#;
    let asub = r#"
    submodule asub {
        belongs-to a { prefix a; }
        typedef t { type string; }
    }
    "#;
    let b = r#"
    module b {
        namespace "urn:b";
        prefix b;
        import a { prefix a; }
        leaf y { type a:t; }
    }
    "#;
    let model = build_ok(&[("b.yang", b), ("a.yang", a), ("asub.yang", asub)]);
    let y_type = model
        .find_module("b")
        .unwrap()
        .schema_child_named("y")
        .unwrap()
        .find_first(Def::Type)
        .unwrap();
    assert_eq!(
        y_type.kind,
        EffectiveKind::Type {
            typedef: Some(qname("urn:a", "t"))
        }
    );
}

#[test]
fn test_typedef_is_scoped_to_its_subtree() {
    let a = r#"
    module a {
        namespace "urn:a";
        prefix a;
        container one {
            typedef percent { type uint8; }
            leaf used { type percent; }
        }
        container two {
            leaf stray { type percent; }
        }
    }
    "#;
    let causes = build_err(&[("a.yang", a)]);
    assert_eq!(causes.len(), 1);
    assert!(causes[0].to_string().contains("Type 'percent' was not found"));
}

#[test]
fn test_typedef_shadowing_builtin() {
    let a = r#"
    module a {
        namespace "urn:a";
        prefix a;
        typedef string { type int8; }
    }
    "#;
    let causes = build_err(&[("a.yang", a)]);
    assert_eq!(causes[0].kind(), ErrorKind::Source);
    assert!(causes[0]
        .to_string()
        .contains("typedef name 'string' is a built-in type"));
}

#[test]
fn test_typedef_referring_to_itself() {
    let a = r#"
    module a {
        namespace "urn:a";
        prefix a;
        typedef loop { type loop; }
    }
    "#;
    let causes = build_err(&[("a.yang", a)]);
    assert!(causes[0].to_string().contains("Typedef 'loop' refers to itself"));
}

// =============================================================================
// Extensions
// =============================================================================

#[test]
fn test_extension_instance() {
    let a = r#"
    module a {
        namespace "urn:a";
        prefix a;
        extension tag { argument name; }
        leaf x {
            type string;
            a:tag "hello";
        }
    }
    "#;
    let model = build_ok(&[("a.yang", a)]);
    let module = model.find_module("a").unwrap();
    assert_eq!(module.find_first(Def::Extension).unwrap().kind, EffectiveKind::Extension);

    let tag = module
        .schema_child_named("x")
        .unwrap()
        .find_first(Def::Unknown)
        .unwrap();
    assert_eq!(tag.keyword, "a:tag");
    assert_eq!(tag.argument, ArgumentValue::String("hello".to_string()));
    assert_eq!(
        tag.kind,
        EffectiveKind::UnknownStatement {
            extension: Some(qname("urn:a", "tag"))
        }
    );
}

#[test]
fn test_extension_instance_is_copied_by_uses() {
    let a = r#"
    module a {
        namespace "urn:a";
        prefix a;
        extension marker;
        grouping g { a:marker; leaf x { type string; } }
        container c { uses g; }
    }
    "#;
    let model = build_ok(&[("a.yang", a)]);
    let c = model.find_module("a").unwrap().schema_child_named("c").unwrap();
    assert!(c.find_first(Def::Unknown).is_some());
}

#[test]
fn test_unregistered_extension_is_invalid_substatement() {
    let a = r#"
    module a {
        namespace "urn:a";
        prefix a;
        leaf x {
            type string;
            a:nope "value";
        }
    }
    "#;
    let causes = build_err(&[("a.yang", a)]);
    assert_eq!(causes[0].kind(), ErrorKind::InvalidSubstatement);
}

// =============================================================================
// Substatement validation
// =============================================================================

#[test]
fn test_leaf_with_two_types() {
    let a = r#"
    module a {
        namespace "urn:a";
        prefix a;
        leaf x { type string; type int8; }
    }
    "#;
    let causes = build_err(&[("a.yang", a)]);
    match &causes[0] {
        ReactorError::CardinalityExceeded {
            parent,
            substatement,
            max,
            count,
            ..
        } => {
            assert_eq!((*parent, *substatement), (Def::Leaf, Def::Type));
            assert_eq!((*max, *count), (1, 2));
        }
        other => panic!("expected cardinality error, got {other:?}"),
    }
}

#[test]
fn test_leaf_without_type() {
    let a = r#"
    module a {
        namespace "urn:a";
        prefix a;
        leaf x { description "untyped"; }
    }
    "#;
    let causes = build_err(&[("a.yang", a)]);
    assert!(matches!(
        &causes[0],
        ReactorError::MissingSubstatement {
            parent: Def::Leaf,
            substatement: Def::Type,
            ..
        }
    ));
}

#[test]
fn test_unknown_keyword_in_container() {
    let a = r#"
    module a {
        namespace "urn:a";
        prefix a;
        container c { identity nested; }
    }
    "#;
    let causes = build_err(&[("a.yang", a)]);
    assert_eq!(causes[0].kind(), ErrorKind::InvalidSubstatement);
}

#[test]
fn test_duplicate_sibling_schema_nodes() {
    let a = r#"module a {
    namespace "urn:a";
    prefix a;
    container c {
        leaf x { type string; }
        leaf x { type int8; }
    }
}"#;
    let causes = build_err(&[("a.yang", a)]);
    assert_eq!(causes.len(), 1);
    assert_eq!(causes[0].kind(), ErrorKind::Source);
    assert!(causes[0].to_string().contains("duplicate schema node 'x'"));
    assert_eq!(causes[0].reference().unwrap().line(), 6);
}

#[test]
fn test_same_name_in_different_parents() {
    let a = r#"
    module a {
        namespace "urn:a";
        prefix a;
        container one { leaf x { type string; } }
        container two { leaf x { type string; } }
        choice pick {
            case left { leaf l { type string; } }
            case right { leaf r { type string; } }
        }
    }
    "#;
    let model = build_ok(&[("a.yang", a)]);
    let module = model.find_module("a").unwrap();
    assert!(module.descendant(&["one", "x"]).is_some());
    assert!(module.descendant(&["two", "x"]).is_some());
}

#[test]
fn test_anydata_requires_yang_1_1() {
    let v1 = r#"
    module a {
        namespace "urn:a";
        prefix a;
        anydata blob;
    }
    "#;
    let causes = build_err(&[("a.yang", v1)]);
    assert!(causes[0].to_string().contains("anydata requires yang-version 1.1"));

    let v11 = r#"
    module a {
        yang-version 1.1;
        namespace "urn:a";
        prefix a;
        anydata blob;
    }
    "#;
    let model = build_ok(&[("a.yang", v11)]);
    let blob = model.find_module("a").unwrap().schema_child_named("blob").unwrap();
    assert_eq!(blob.kind, EffectiveKind::Anydata);
}

// =============================================================================
// Namespace availability
// =============================================================================

/// Feature support that reads groupings while definitions are declared,
/// before that namespace is open.
struct EarlyGroupingProbe;

impl StatementSupport for EarlyGroupingProbe {
    fn definition(&self) -> Def {
        Def::Feature
    }

    fn parse_argument(&self, _build: &BuildContext, _id: StmtId, raw: Option<&str>) -> Result<ArgumentValue> {
        Ok(ArgumentValue::Identifier(raw.unwrap_or_default().to_string()))
    }

    fn on_statement_added(&self, ctx: &mut StmtMut<'_>) -> Result<()> {
        let id = ctx.id();
        ctx.namespace_get::<GroupingNamespace>(id, &qname("urn:a", "g"))?;
        Ok(())
    }
}

#[test]
fn test_namespace_not_available_before_its_phase() {
    init_tracing();
    let a = r#"
    module a {
        namespace "urn:a";
        prefix a;
        feature early;
    }
    "#;
    let reactor = yang_rfc7950::reactor_builder()
        .add_support(ModelProcessingPhase::StatementDefinition, EarlyGroupingProbe)
        .build();
    let err = reactor
        .new_build()
        .add_source(parse("a.yang", a))
        .build()
        .unwrap_err();
    let causes = err.causes();
    match causes[0] {
        ReactorError::NamespaceNotAvailable {
            namespace, phase, ..
        } => {
            assert_eq!(*namespace, "GroupingNamespace");
            assert_eq!(*phase, ModelProcessingPhase::StatementDefinition);
        }
        other => panic!("expected namespace error, got {other:?}"),
    }
}

// =============================================================================
// Declared and effective views
// =============================================================================

#[test]
fn test_declared_view_keeps_source_shape() {
    let a = r#"
    module a {
        namespace "urn:a";
        prefix a;
        grouping g { leaf x { type string; } }
        container c { uses g; }
    }
    "#;
    let model = build_ok(&[("a.yang", a)]);

    let declared = &model.declared_roots()[0];
    assert_eq!(declared.raw_argument.as_deref(), Some("a"));
    let declared_c = declared.find_first(Def::Container).unwrap();
    let keywords: Vec<&str> = declared_c
        .substatements
        .iter()
        .map(|s| s.keyword.as_str())
        .collect();
    assert_eq!(keywords, vec!["uses"]);

    let effective_c = model.find_module("a").unwrap().schema_child_named("c").unwrap();
    let definitions: Vec<Def> = effective_c.substatements.iter().map(|s| s.definition).collect();
    assert_eq!(definitions, vec![Def::Uses, Def::Leaf]);

    // A copy points back at the declaration it came from.
    let x = effective_c.schema_child_named("x").unwrap();
    let origin = x.declared.as_ref().unwrap();
    assert_eq!(origin.reference.line(), 5);
}
