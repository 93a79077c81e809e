//! Type bodies: enumeration and bits members, restrictions, and which of
//! them each built-in type accepts.

mod common;

use common::{build_err, build_ok};
use yang_model::{ArgumentValue, EffectiveKind, StatementDefinition as Def};
use yang_reactor::ErrorKind;

fn module(body: &str) -> String {
    format!(
        r#"
    module a {{
        namespace "urn:a";
        prefix a;
        {body}
    }}
    "#
    )
}

// =============================================================================
// Enumerations and bits
// =============================================================================

#[test]
fn test_enum_values_are_assigned_in_order() {
    let a = module(
        r#"
        leaf mode {
            type enumeration {
                enum off;
                enum low { value 5; }
                enum high;
                enum auto { value 2; }
            }
        }
        "#,
    );
    let model = build_ok(&[("a.yang", a.as_str())]);
    let ty = model
        .find_module("a")
        .unwrap()
        .schema_child_named("mode")
        .unwrap()
        .find_first(Def::Type)
        .unwrap();
    let values: Vec<_> = ty
        .find_all(Def::Enum)
        .map(|member| (member.raw_argument.clone().unwrap(), member.kind.clone()))
        .collect();
    assert_eq!(
        values,
        vec![
            ("off".to_string(), EffectiveKind::Enum { value: 0 }),
            ("low".to_string(), EffectiveKind::Enum { value: 5 }),
            ("high".to_string(), EffectiveKind::Enum { value: 6 }),
            ("auto".to_string(), EffectiveKind::Enum { value: 2 }),
        ]
    );
}

#[test]
fn test_bit_positions_in_typedef() {
    let a = module(
        r#"
        typedef flags {
            type bits {
                bit read { position 1; }
                bit write;
                bit exec { position 7; }
            }
        }
        leaf mask { type flags; }
        "#,
    );
    let model = build_ok(&[("a.yang", a.as_str())]);
    let typedef = model.find_module("a").unwrap().find_first(Def::Typedef).unwrap();
    let positions: Vec<_> = typedef
        .find_first(Def::Type)
        .unwrap()
        .find_all(Def::Bit)
        .map(|bit| bit.kind.clone())
        .collect();
    assert_eq!(
        positions,
        vec![
            EffectiveKind::Bit { position: 1 },
            EffectiveKind::Bit { position: 2 },
            EffectiveKind::Bit { position: 7 },
        ]
    );
}

#[test]
fn test_enumeration_without_members() {
    let a = module("leaf mode { type enumeration; }");
    let causes = build_err(&[("a.yang", a.as_str())]);
    assert_eq!(causes[0].kind(), ErrorKind::MissingSubstatement);
    assert!(causes[0].to_string().contains("missing enum substatement in type"));
}

#[test]
fn test_duplicate_enum_name() {
    let a = module(
        r#"
        leaf mode {
            type enumeration {
                enum on;
                enum on;
            }
        }
        "#,
    );
    let causes = build_err(&[("a.yang", a.as_str())]);
    assert_eq!(causes[0].kind(), ErrorKind::Source);
    assert!(causes[0].to_string().contains("duplicate enum 'on'"));
}

#[test]
fn test_duplicate_enum_value() {
    let a = module(
        r#"
        leaf mode {
            type enumeration {
                enum on { value 1; }
                enum off { value 1; }
            }
        }
        "#,
    );
    let causes = build_err(&[("a.yang", a.as_str())]);
    assert!(causes[0]
        .to_string()
        .contains("enum 'off' value 1 is already used by 'on'"));
}

#[test]
fn test_bit_position_overflow() {
    let a = module(
        r#"
        leaf mask {
            type bits {
                bit top { position 4294967295; }
                bit over;
            }
        }
        "#,
    );
    let causes = build_err(&[("a.yang", a.as_str())]);
    assert!(causes[0]
        .to_string()
        .contains("bit 'over' position exceeds 4294967295"));
}

// =============================================================================
// Restrictions
// =============================================================================

#[test]
fn test_restrictions_on_builtin_types() {
    let a = module(
        r#"
        leaf port { type uint16 { range "1..1023 | 8080"; } }
        leaf name {
            type string {
                length "1..64";
                pattern '[a-z][a-z0-9-]*' { error-message "lower case only"; }
            }
        }
        leaf ratio { type decimal64 { fraction-digits 2; range "0..1"; } }
        leaf owner { type leafref { path "../name"; } }
        "#,
    );
    let model = build_ok(&[("a.yang", a.as_str())]);
    let module = model.find_module("a").unwrap();
    let ratio = module.schema_child_named("ratio").unwrap().find_first(Def::Type).unwrap();
    assert_eq!(
        ratio.find_first(Def::FractionDigits).unwrap().argument,
        ArgumentValue::Unsigned(2)
    );
    let pattern = module
        .descendant(&["name"])
        .unwrap()
        .find_first(Def::Type)
        .unwrap()
        .find_first(Def::Pattern)
        .unwrap();
    assert!(pattern.find_first(Def::ErrorMessage).is_some());
}

#[test]
fn test_range_on_string_is_invalid() {
    let a = module(r#"leaf name { type string { range "1..5"; } }"#);
    let causes = build_err(&[("a.yang", a.as_str())]);
    assert_eq!(causes[0].kind(), ErrorKind::InvalidSubstatement);
    assert!(causes[0].to_string().contains("range"));
}

#[test]
fn test_malformed_range() {
    let a = module(r#"leaf port { type uint16 { range "1.. | 5"; } }"#);
    let causes = build_err(&[("a.yang", a.as_str())]);
    assert_eq!(causes[0].kind(), ErrorKind::Source);
}

#[test]
fn test_leafref_requires_path() {
    let a = module("leaf owner { type leafref; }");
    let causes = build_err(&[("a.yang", a.as_str())]);
    assert_eq!(causes[0].kind(), ErrorKind::MissingSubstatement);
    assert!(causes[0].to_string().contains("missing path substatement"));
}

#[test]
fn test_decimal64_fraction_digits_bounds() {
    let missing = module("leaf ratio { type decimal64; }");
    let causes = build_err(&[("a.yang", missing.as_str())]);
    assert_eq!(causes[0].kind(), ErrorKind::MissingSubstatement);

    let too_many = module("leaf ratio { type decimal64 { fraction-digits 19; } }");
    let causes = build_err(&[("a.yang", too_many.as_str())]);
    assert_eq!(causes[0].kind(), ErrorKind::Source);
}

#[test]
fn test_derived_type_cannot_set_path() {
    let a = module(
        r#"
        typedef name { type string; }
        leaf owner { type name { path "../x"; } }
        "#,
    );
    let causes = build_err(&[("a.yang", a.as_str())]);
    assert_eq!(causes[0].kind(), ErrorKind::InvalidSubstatement);
}

#[test]
fn test_derived_type_restricts_length() {
    let a = module(
        r#"
        typedef name { type string; }
        leaf short { type name { length "1..8"; } }
        "#,
    );
    let model = build_ok(&[("a.yang", a.as_str())]);
    let short = model.find_module("a").unwrap().schema_child_named("short").unwrap();
    assert!(short.find_first(Def::Type).unwrap().find_first(Def::Length).is_some());
}

#[test]
fn test_pattern_modifier_requires_yang_1_1() {
    let body = r#"
        leaf name {
            type string {
                pattern '[0-9]+' { modifier invert-match; }
            }
        }
    "#;
    let v1 = module(body);
    let causes = build_err(&[("a.yang", v1.as_str())]);
    assert!(causes[0].to_string().contains("modifier requires yang-version 1.1"));

    let v1_1 = module(&format!("yang-version 1.1;\n{body}"));
    build_ok(&[("a.yang", v1_1.as_str())]);
}
