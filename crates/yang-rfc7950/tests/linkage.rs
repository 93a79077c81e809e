//! Source linkage: module identity, imports, includes and model queries.

mod common;

use common::{build, build_err, build_ok, build_with, parse};
use yang_model::{
    EffectiveKind, QNameModule, Revision, SourceIdentifier, StatementDefinition as Def, YangVersion,
};
use yang_reactor::{ErrorKind, ModelProcessingPhase, ReactorConfig, ReactorError};

const A_2023: &str = r#"
module a {
    namespace "urn:a";
    prefix a;
    revision 2023-01-01;
    typedef old-type { type string; }
    container top { leaf x { type string; } }
}
"#;

const A_2024: &str = r#"
module a {
    namespace "urn:a";
    prefix a;
    revision 2024-06-01 { description "second release"; }
    revision 2023-01-01;
    typedef new-type { type int32; }
    container top { leaf x { type string; } }
}
"#;

fn revision(text: &str) -> Revision {
    Revision::parse(text).unwrap()
}

// =============================================================================
// Parser fixture
// =============================================================================

#[test]
fn test_parser_reads_nested_statements() {
    let source = parse(
        "t.yang",
        r#"
        module t {
            // comment
            namespace "urn:" + 't';
            /* block
               comment */
            leaf x { type string; }
        }
        "#,
    );
    let root = source.root();
    assert_eq!(root.keyword, "module");
    assert_eq!(root.argument.as_deref(), Some("t"));
    assert_eq!(root.substatements[0].argument.as_deref(), Some("urn:t"));
    let leaf = &root.substatements[1];
    assert_eq!((leaf.reference.line(), leaf.reference.column()), (7, 13));
    assert_eq!(leaf.substatements[0].keyword, "type");
}

// =============================================================================
// Imports
// =============================================================================

#[test]
fn test_import_resolves_typedef_of_imported_module() {
    let b = r#"
    module b {
        namespace "urn:b";
        prefix b;
        import a { prefix pa; revision-date 2023-01-01; }
        leaf l { type pa:old-type; }
    }
    "#;
    let model = build_ok(&[("a.yang", A_2023), ("b.yang", b)]);
    assert_eq!(model.modules().len(), 2);

    let b = model.find_module("b").unwrap();
    let import = b.find_first(Def::Import).unwrap();
    assert_eq!(
        import.kind,
        EffectiveKind::Import {
            module: SourceIdentifier::new("a", Some(revision("2023-01-01"))),
            prefix: "pa".to_string(),
        }
    );

    let leaf_type = b.schema_child_named("l").unwrap().find_first(Def::Type).unwrap();
    match &leaf_type.kind {
        EffectiveKind::Type { typedef: Some(typedef) } => {
            assert_eq!(typedef.local_name, "old-type");
            assert_eq!(
                typedef.module,
                QNameModule::new("urn:a", Some(revision("2023-01-01")))
            );
        }
        other => panic!("expected derived type, got {other:?}"),
    }
}

#[test]
fn test_import_without_revision_picks_latest() {
    let b = r#"
    module b {
        namespace "urn:b";
        prefix b;
        import a { prefix pa; }
        leaf l { type pa:new-type; }
    }
    "#;
    // Older revision registered first, so the newer one must replace it.
    let model = build_ok(&[("a@2023.yang", A_2023), ("a@2024.yang", A_2024), ("b.yang", b)]);
    assert_eq!(model.modules().len(), 3);

    let latest = model.find_module("a").unwrap();
    match &latest.kind {
        EffectiveKind::Module { module, .. } => {
            assert_eq!(module.revision, Some(revision("2024-06-01")));
        }
        other => panic!("expected module, got {other:?}"),
    }
}

#[test]
fn test_import_with_revision_date_picks_exact_revision() {
    let b = r#"
    module b {
        namespace "urn:b";
        prefix b;
        import a { prefix pa; revision-date 2023-01-01; }
        leaf l { type pa:new-type; }
    }
    "#;
    let causes = build_err(&[("a@2023.yang", A_2023), ("a@2024.yang", A_2024), ("b.yang", b)]);
    assert!(
        causes.iter().any(|e| e.to_string().contains("Type 'new-type' was not found")),
        "got: {causes:?}"
    );
}

#[test]
fn test_missing_import_reports_import_location() {
    let b = r#"module b {
    namespace "urn:b";
    prefix b;
    import missing { prefix m; }
}"#;
    let err = build(&[("b.yang", b)]).unwrap_err();
    match &err {
        ReactorError::PhaseFailed { phase, .. } => {
            assert_eq!(*phase, ModelProcessingPhase::SourceLinkage);
        }
        other => panic!("expected phase failure, got {other:?}"),
    }

    let causes = err.causes();
    assert_eq!(causes.len(), 1);
    assert_eq!(causes[0].kind(), ErrorKind::Inference);
    assert!(causes[0].to_string().contains("Imported module missing was not found"));
    let reference = causes[0].reference().unwrap();
    assert_eq!((reference.source(), reference.line()), ("b.yang", 4));
}

#[test]
fn test_conflicting_prefix_is_rejected() {
    let c = r#"
    module c {
        namespace "urn:c";
        prefix c;
        import a { prefix x; revision-date 2023-01-01; }
        import a { prefix x; revision-date 2024-06-01; }
    }
    "#;
    let causes = build_err(&[("a@2023.yang", A_2023), ("a@2024.yang", A_2024), ("c.yang", c)]);
    assert!(causes[0].to_string().contains("prefix 'x' is already bound"));
}

#[test]
fn test_undeclared_prefix_is_source_error() {
    let a = r#"
    module a {
        namespace "urn:a";
        prefix a;
        leaf l { type nope:t; }
    }
    "#;
    let causes = build_err(&[("a.yang", a)]);
    assert_eq!(causes[0].kind(), ErrorKind::Source);
    assert!(causes[0].to_string().contains("prefix 'nope' used in type is not declared"));
}

// =============================================================================
// Module identity
// =============================================================================

#[test]
fn test_duplicate_module_is_ignored() {
    let model = build_ok(&[("a.yang", A_2023), ("copy/a.yang", A_2023)]);
    assert_eq!(model.modules().len(), 1);
    assert_eq!(model.declared_roots().len(), 1);
    assert!(model.find_module("a").unwrap().schema_child_named("top").is_some());
}

#[test]
fn test_unsupported_version_is_rejected() {
    let config = ReactorConfig {
        supported_versions: [YangVersion::V1_1].into_iter().collect(),
        ..ReactorConfig::default()
    };
    let err = build_with(config, &[("a.yang", A_2023)]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Source);
    assert!(err.to_string().contains("yang-version 1 is not supported"));
}

#[test]
fn test_unsupported_root_statement() {
    let causes = build_err(&[("x.yang", "container x;")]);
    assert!(causes[0].to_string().contains("root statement 'container' is not supported"));
}

#[test]
fn test_module_requires_namespace() {
    let causes = build_err(&[("a.yang", "module a { prefix a; }")]);
    assert_eq!(causes[0].kind(), ErrorKind::Source);
    assert!(causes[0].to_string().contains("module has no namespace"));
}

// =============================================================================
// Submodules
// =============================================================================

#[test]
fn test_submodule_include_and_belongs_to() {
    let m = r#"
    module m {
        yang-version 1.1;
        namespace "urn:m";
        prefix m;
        include s;
        container c { uses sg; }
    }
    "#;
    let s = r#"
    submodule s {
        yang-version 1.1;
        belongs-to m { prefix m; }
        grouping sg { leaf from-sub { type string; } }
        container sub-top;
    }
    "#;
    let model = build_ok(&[("m.yang", m), ("s.yang", s)]);
    assert_eq!(model.modules().len(), 1);
    assert_eq!(model.submodules().len(), 1);

    let module = model.find_module("m").unwrap();
    let leaf = module.descendant(&["c", "from-sub"]).unwrap();
    assert!(leaf.is_added_by_uses());
    assert_eq!(leaf.qname().unwrap().module.namespace, "urn:m");

    let submodule = &model.submodules()[0];
    assert!(matches!(
        &submodule.kind,
        EffectiveKind::Submodule { belongs_to, .. } if belongs_to == "m"
    ));
    assert_eq!(
        submodule.schema_child_named("sub-top").unwrap().qname().unwrap().module.namespace,
        "urn:m"
    );
}

#[test]
fn test_include_of_foreign_submodule_fails() {
    let m = r#"
    module m { namespace "urn:m"; prefix m; include s; }
    "#;
    let other = r#"
    module other { namespace "urn:o"; prefix o; }
    "#;
    let s = r#"
    submodule s { belongs-to other { prefix o; } }
    "#;
    let causes = build_err(&[("m.yang", m), ("other.yang", other), ("s.yang", s)]);
    assert_eq!(causes[0].kind(), ErrorKind::Inference);
    assert!(causes[0]
        .to_string()
        .contains("Included submodule s belongs to other instead of m"));
}

#[test]
fn test_missing_submodule() {
    let m = r#"
    module m { namespace "urn:m"; prefix m; include nope; }
    "#;
    let causes = build_err(&[("m.yang", m)]);
    assert!(causes[0].to_string().contains("Included submodule nope was not found"));
}

// =============================================================================
// Model queries
// =============================================================================

#[test]
fn test_model_queries() {
    let model = build_ok(&[("a@2023.yang", A_2023), ("a@2024.yang", A_2024)]);

    let old = model
        .find_module_revision("a", Some(&revision("2023-01-01")))
        .unwrap();
    assert!(old.schema_child_named("top").is_some());
    assert!(model.find_module_revision("a", None).is_none());
    assert_eq!(model.find_modules_by_namespace("urn:a").count(), 2);

    let newest = QNameModule::new("urn:a", Some(revision("2024-06-01")));
    let module = model.find_module_by_qname_module(&newest).unwrap();
    assert!(matches!(&module.kind, EffectiveKind::Module { version: YangVersion::V1, .. }));

    let top = module.schema_child_named("top").unwrap().qname().unwrap().clone();
    let found = model.data_child(&top).unwrap();
    assert_eq!(found.schema_path.as_ref().unwrap().steps().len(), 1);
    assert!(!found.is_added_by_uses());
}
