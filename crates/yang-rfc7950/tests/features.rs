//! Feature guards: `feature` and `if-feature`.

mod common;

use common::{build, build_err, build_ok, build_with, qname, with_features};
use yang_model::QName;
use yang_reactor::{ErrorKind, ModelProcessingPhase, ReactorError};

const FLAGS: &str = r#"
module flags {
    yang-version 1.1;
    namespace "urn:flags";
    prefix f;
    feature a;
    feature b;
    container both { if-feature "a and b"; }
    container either { if-feature "a or b"; }
    container only-a { if-feature a; }
    container not-a { if-feature "not a"; }
    container plain;
}
"#;

fn top_level(config_features: &[&str]) -> Vec<String> {
    let features: Vec<QName> = config_features
        .iter()
        .map(|name| qname("urn:flags", name))
        .collect();
    let model = build_with(with_features(features), &[("flags.yang", FLAGS)]).unwrap();
    model
        .find_module("flags")
        .unwrap()
        .schema_children()
        .map(|node| node.qname().unwrap().local_name.clone())
        .collect()
}

// =============================================================================
// Evaluation
// =============================================================================

#[test]
fn test_all_features_supported_by_default() {
    let model = build_ok(&[("flags.yang", FLAGS)]);
    let names: Vec<&str> = model
        .find_module("flags")
        .unwrap()
        .schema_children()
        .map(|node| node.qname().unwrap().local_name.as_str())
        .collect();
    assert_eq!(names, vec!["both", "either", "only-a", "plain"]);
}

#[test]
fn test_expressions_under_feature_sets() {
    assert_eq!(top_level(&[]), vec!["not-a", "plain"]);
    assert_eq!(top_level(&["a"]), vec!["either", "only-a", "plain"]);
    assert_eq!(top_level(&["b"]), vec!["either", "not-a", "plain"]);
    assert_eq!(top_level(&["a", "b"]), vec!["both", "either", "only-a", "plain"]);
}

#[test]
fn test_disabled_node_takes_its_subtree() {
    let a = r#"
    module a {
        namespace "urn:a";
        prefix a;
        feature extra;
        container c {
            leaf keep { type string; }
            container gated {
                if-feature extra;
                leaf inside { type string; }
            }
        }
    }
    "#;
    let model = build_with(with_features(Vec::<QName>::new()), &[("a.yang", a)]).unwrap();
    let c = model.find_module("a").unwrap().schema_child_named("c").unwrap();
    assert!(c.schema_child_named("keep").is_some());
    assert!(c.schema_child_named("gated").is_none());

    // Feature definitions stay in the model either way.
    assert!(model
        .find_module("a")
        .unwrap()
        .find_first(yang_model::StatementDefinition::Feature)
        .is_some());
}

#[test]
fn test_imported_feature() {
    let a = r#"
    module a {
        namespace "urn:a";
        prefix a;
        feature remote;
    }
    "#;
    let b = r#"
    module b {
        namespace "urn:b";
        prefix b;
        import a { prefix a; }
        leaf gated { if-feature a:remote; type string; }
    }
    "#;
    let sources = [("a.yang", a), ("b.yang", b)];

    let on = build_with(with_features([qname("urn:a", "remote")]), &sources).unwrap();
    assert!(on.find_module("b").unwrap().schema_child_named("gated").is_some());

    let off = build_with(with_features([qname("urn:b", "remote")]), &sources).unwrap();
    assert!(off.find_module("b").unwrap().schema_child_named("gated").is_none());
}

// =============================================================================
// Failures
// =============================================================================

#[test]
fn test_unknown_feature() {
    let a = r#"
    module a {
        namespace "urn:a";
        prefix a;
        leaf x { if-feature ghost; type string; }
    }
    "#;
    let err = build(&[("a.yang", a)]).unwrap_err();
    assert!(matches!(
        err,
        ReactorError::PhaseFailed {
            phase: ModelProcessingPhase::EffectiveModel,
            ..
        }
    ));
    let causes = err.causes();
    assert_eq!(causes[0].kind(), ErrorKind::Inference);
    assert!(causes[0]
        .to_string()
        .contains("If-feature statement refers to unknown feature(s): ghost"));
}

#[test]
fn test_expression_requires_yang_1_1() {
    let a = r#"
    module a {
        namespace "urn:a";
        prefix a;
        feature x;
        feature y;
        leaf l { if-feature "x and y"; type string; }
    }
    "#;
    let causes = build_err(&[("a.yang", a)]);
    assert_eq!(causes[0].kind(), ErrorKind::Source);
    assert!(causes[0].to_string().contains("requires yang-version 1.1"));
}

#[test]
fn test_malformed_expression() {
    let a = r#"
    module a {
        yang-version 1.1;
        namespace "urn:a";
        prefix a;
        feature x;
        leaf l { if-feature "x and"; type string; }
    }
    "#;
    let causes = build_err(&[("a.yang", a)]);
    assert!(causes[0].to_string().contains("invalid if-feature value 'x and'"));
}

#[test]
fn test_duplicate_feature() {
    let a = r#"
    module a {
        namespace "urn:a";
        prefix a;
        feature x;
        feature x;
    }
    "#;
    let causes = build_err(&[("a.yang", a)]);
    assert!(causes[0].to_string().contains("duplicate feature 'x'"));
}
