//! Compatibility Integration Tests
//!
//! Checks revisions of the lighting model against the original.

mod common;

use std::collections::BTreeSet;

use common::*;
use idm::Idl;

fn revise_all(edits: &[(&str, &str)]) -> Idl {
    let mut text = LIGHTING_IDL.to_string();
    for (from, to) in edits {
        assert!(text.contains(from), "fixture lacks `{}`", from);
        text = text.replacen(from, to, 1);
    }
    idm::parse_idl(&text, "lighting.matter").unwrap_or_else(|e| panic!("{}\n{}", e, text))
}

fn revise(from: &str, to: &str) -> Idl {
    revise_all(&[(from, to)])
}

fn violations(updated: &Idl) -> BTreeSet<String> {
    idm::check_compatibility(&lighting(), updated)
        .diagnostics
        .into_iter()
        .map(|d| d.message)
        .collect()
}

/// Test: every model is compatible with itself
#[test]
fn test_self_compatible() {
    init_logging();
    println!("\n=== Self Compatibility Test ===");

    for idl in [lighting(), identify()] {
        let (compatible, diagnostics) = idm::is_backwards_compatible(&idl, &idl);
        assert!(compatible, "{:?}", diagnostics);
        assert!(diagnostics.is_empty());
    }
}

/// Test: additions never break compatibility
#[test]
fn test_additions_are_compatible() {
    init_logging();
    println!("\n=== Additions Test ===");

    let updated = revise(
        "    kToggle = 2;\n",
        "    kToggle = 2;\n    kPrevious = 3;\n",
    );
    assert!(violations(&updated).is_empty());

    let updated = revise(
        "  readonly attribute boolean onOff = 0;\n",
        "  readonly attribute boolean onOff = 0;\n  readonly attribute int16u onTime = 16385;\n",
    );
    assert!(violations(&updated).is_empty());

    let updated = revise(
        "client cluster OnOff = 6 {",
        "server cluster Identify = 3 {\n  attribute int16u identifyTime = 0;\n}\n\nclient cluster OnOff = 6 {",
    );
    assert!(violations(&updated).is_empty());

    let updated = revise(
        "    enum8 effectVariant = 1;\n",
        "    enum8 effectVariant = 1;\n    optional int8u extra = 2;\n",
    );
    assert!(violations(&updated).is_empty());
}

/// Test: removing one attribute yields exactly one diagnostic
#[test]
fn test_single_removal() {
    init_logging();
    println!("\n=== Single Removal Test ===");

    // The endpoint stops storing it too, or the model would not resolve
    let updated = revise_all(&[
        ("  readonly attribute boolean onOff = 0;\n  attribute", "  attribute"),
        ("    persist attribute onOff default = 0;\n", ""),
    ]);
    let found = violations(&updated);
    assert_eq!(
        found.into_iter().collect::<Vec<_>>(),
        vec!["Attribute OnOff.onOff was removed".to_string()]
    );
}

/// Test: removing more never reports less
#[test]
fn test_violations_grow_with_removals() {
    init_logging();
    println!("\n=== Monotonicity Test ===");

    let drop_on = [
        ("  command On(): DefaultSuccess = 1;\n", ""),
        ("    handle command On;\n", ""),
    ];
    let drop_event = [
        ("  info event StateChanged = 0 {\n    boolean onOff = 0;\n  }\n", ""),
        ("    emits event StateChanged;\n", ""),
    ];

    let one = violations(&revise_all(&drop_on));
    let two = violations(&revise_all(&[drop_on, drop_event].concat()));

    assert_eq!(one.len(), 1);
    assert!(one.is_subset(&two));
    assert!(two.contains("Event OnOff.StateChanged was removed"));
}

/// Test: widening is accepted, narrowing and signedness flips are not
#[test]
fn test_type_changes() {
    init_logging();
    println!("\n=== Type Change Test ===");

    let widened = revise(
        "  readonly attribute int16u clusterRevision = 65533;\n}\n\n/**",
        "  readonly attribute int32u clusterRevision = 65533;\n}\n\n/**",
    );
    assert!(violations(&widened).is_empty());

    let to_signed = revise(
        "  readonly attribute int16u clusterRevision = 65533;\n}\n\n/**",
        "  readonly attribute int32s clusterRevision = 65533;\n}\n\n/**",
    );
    assert!(violations(&to_signed).is_empty());

    let narrowed = revise("  readonly attribute bitmap32 featureMap = 65532;", "  readonly attribute bitmap16 featureMap = 65532;");
    assert_eq!(
        violations(&narrowed).into_iter().collect::<Vec<_>>(),
        vec!["Descriptor.featureMap changed type from bitmap32 to bitmap16".to_string()]
    );

    let same_width_signed = revise(
        "  readonly attribute int16u clusterRevision = 65533;\n}\n\n/**",
        "  readonly attribute int16s clusterRevision = 65533;\n}\n\n/**",
    );
    assert_eq!(violations(&same_width_signed).len(), 1);
}

/// Test: quality and code changes are each flagged
#[test]
fn test_quality_changes() {
    init_logging();
    println!("\n=== Quality Change Test ===");

    let found = violations(&revise(
        "  attribute access(write: manage) nullable StartUpOnOffEnum startUpOnOff = 16387;",
        "  readonly attribute StartUpOnOffEnum startUpOnOff = 16387;",
    ));
    assert!(found.contains("Attribute OnOff.startUpOnOff is no longer writable"));
    assert!(found.contains("OnOff.startUpOnOff changed nullability"));
    assert_eq!(found.len(), 2);

    let found = violations(&revise(
        "  command Off(): DefaultSuccess = 0;\n  command On()",
        "  command Off(): DefaultSuccess = 5;\n  command On()",
    ));
    assert_eq!(
        found.into_iter().collect::<Vec<_>>(),
        vec!["Command OnOff.Off code changed from 0x00 to 0x05".to_string()]
    );

    let found = violations(&revise("    kOn = 1;\n", ""));
    assert_eq!(found.len(), 1);
    assert!(found.iter().next().unwrap().contains("kOn"));
}

/// Test: removing a whole cluster side is reported once
#[test]
fn test_cluster_removal() {
    init_logging();
    println!("\n=== Cluster Removal Test ===");

    let found = violations(&revise(
        "client cluster OnOff = 6 {\n  readonly attribute boolean onOff = 0;\n  command Off(): DefaultSuccess = 0;\n}\n",
        "",
    ));
    assert_eq!(
        found.into_iter().collect::<Vec<_>>(),
        vec!["Cluster OnOff (client) was removed".to_string()]
    );
}
