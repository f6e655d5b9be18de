//! Pipeline Integration Tests
//!
//! Drives models through both front ends, lint, path expansion and a
//! generator, the way a build step does.

mod common;

use std::collections::BTreeSet;
use std::fs;

use common::*;
use idm::{ClusterSide, XmlSource};

/// Test: parse, generate, then catch a removed request field
#[test]
fn test_identify_end_to_end() {
    init_logging();
    println!("\n=== Identify End-to-End Test ===");

    let original = identify();
    assert_eq!(original.clusters.len(), 1);
    assert_eq!(original.endpoints.len(), 1);

    let (outputs, _) = generate("gn", &original);
    let gni = &outputs["gn/clusters.gni"];
    assert_eq!(gni.matches("name = ").count(), 1);
    assert!(gni.contains("\"Identify\""));
    println!("Generated gn/clusters.gni");

    let updated = idm::parse_idl(&identify_idl(""), "identify.matter").unwrap();
    let (compatible, diagnostics) = idm::is_backwards_compatible(&original, &updated);
    assert!(!compatible);
    assert_eq!(diagnostics.len(), 1, "{:?}", diagnostics);
    assert_eq!(
        diagnostics[0].message,
        "Field Identify.Identify.identifyTime was removed"
    );
    println!("Removal detected: {}", diagnostics[0].message);
}

/// Test: the XML and IDL descriptions of Identify are interchangeable
#[test]
fn test_front_ends_agree() {
    init_logging();
    println!("\n=== Front End Agreement Test ===");

    let from_xml = idm::parse_xmls(&[XmlSource::new("identify.xml", IDENTIFY_XML)]).unwrap();
    let from_idl = identify();

    let cluster = from_xml.cluster("Identify", ClusterSide::Server).unwrap();
    assert_eq!(cluster.revision, 4);
    assert_eq!(cluster.attributes.len(), 2);

    // The IDL file only adds clusterRevision and an endpoint
    let report = idm::check_compatibility(&from_xml, &from_idl);
    assert!(report.is_compatible(), "{:?}", report.diagnostics);

    let report = idm::check_compatibility(&from_idl, &from_xml);
    let messages: Vec<&str> = report.diagnostics.iter().map(|d| d.message.as_str()).collect();
    assert_eq!(messages, vec!["Attribute Identify.clusterRevision was removed"]);
}

/// Test: an XML model re-emitted as IDL reads back to the same clusters
#[test]
fn test_xml_model_reemitted_as_idl() {
    init_logging();
    println!("\n=== XML To IDL Test ===");

    let from_xml = idm::parse_xmls(&[XmlSource::new("identify.xml", IDENTIFY_XML)]).unwrap();
    let (outputs, _) = generate("idl", &from_xml);
    assert_eq!(outputs.keys().collect::<Vec<_>>(), vec!["identify.matter"]);

    let text = &outputs["identify.matter"];
    println!("{}", text);
    let reparsed = idm::parse_idl(text, "identify.matter").unwrap_or_else(|e| panic!("{}\n{}", e, text));
    assert_eq!(reparsed.clusters, from_xml.clusters);
}

/// Test: a rule file on disk with a relative XML load
#[test]
fn test_lint_rule_file() {
    init_logging();
    println!("\n=== Lint Rule File Test ===");

    let dir = tempfile::tempdir().unwrap();
    fs::create_dir(dir.path().join("clusters")).unwrap();
    fs::write(dir.path().join("clusters").join("identify.xml"), IDENTIFY_XML).unwrap();
    let rules = dir.path().join("identify.rules");
    fs::write(
        &rules,
        r#"
        load "clusters/identify.xml";
        all endpoints { require global attribute clusterRevision = 0xFFFD; }
        endpoint 1 { require server cluster Identify; reject server cluster 6; }
        endpoint 2 { require server cluster 3; }
        rule "unique-codes";
        "#,
    )
    .unwrap();

    let diagnostics = idm::lint_file(&identify(), &rules).unwrap();
    for d in &diagnostics {
        println!("  {}", d);
    }
    assert_eq!(diagnostics.len(), 1);
    assert!(diagnostics[0].message.starts_with("EP2: endpoint not found"));

    // Dropping a mandatory attribute from the endpoint is caught
    let stripped = identify_idl("int16u identifyTime = 0;").replace("    ram attribute identifyType default = 2;\n", "");
    let idl = idm::parse_idl(&stripped, "identify.matter").unwrap();
    let diagnostics = idm::lint_file(&idl, &rules).unwrap();
    let messages: Vec<&str> = diagnostics.iter().map(|d| d.message.as_str()).collect();
    assert!(messages.contains(&"EP1: Identify is missing mandatory attribute identifyType (0x0001)"));
}

/// Test: a malformed rule file is an error, not a diagnostic
#[test]
fn test_lint_rule_file_errors() {
    init_logging();
    println!("\n=== Lint Rule File Error Test ===");

    let dir = tempfile::tempdir().unwrap();
    let rules = dir.path().join("bad.rules");

    fs::write(&rules, "rule \"no-such-rule\";").unwrap();
    let err = idm::lint_file(&identify(), &rules).unwrap_err();
    assert!(err.to_string().contains("no-such-rule"));

    fs::write(&rules, "load \"missing.xml\";").unwrap();
    assert!(idm::lint_file(&identify(), &rules).is_err());

    assert!(idm::lint_file(&identify(), dir.path().join("absent.rules")).is_err());
}

/// Test: every expanded path names a cluster, and every cluster gets a path
#[test]
fn test_path_expansion() {
    init_logging();
    println!("\n=== Path Expansion Test ===");

    let idl = lighting();

    let server: Vec<String> = idm::expand(&idl, "app/{{server_cluster_name}}/callbacks.cpp").collect();
    assert_eq!(server, vec!["app/Descriptor/callbacks.cpp", "app/OnOff/callbacks.cpp"]);

    let defined: Vec<String> = idm::expand(&idl, "{{defined_cluster_name}}.h").collect();
    assert_eq!(defined, vec!["Descriptor.h", "OnOff.h"]);

    let names: BTreeSet<&str> = idl.clusters.iter().map(|c| c.name.as_str()).collect();
    let expanded: BTreeSet<String> = defined.iter().map(|p| p.trim_end_matches(".h").to_string()).collect();
    assert_eq!(expanded, names.iter().map(|n| n.to_string()).collect());

    let fixed: Vec<String> = idm::expand(&idl, "gen/all.cpp").collect();
    assert_eq!(fixed, vec!["gen/all.cpp"]);

    // Each call starts over
    assert_eq!(idm::expand(&idl, "{{defined_cluster_name}}").len(), 2);
    assert_eq!(idm::expand(&idl, "{{defined_cluster_name}}").len(), 2);
}

/// Test: load_model picks the front end from the file extension
#[test]
fn test_load_model_from_disk() {
    init_logging();
    println!("\n=== Load Model Test ===");

    let dir = tempfile::tempdir().unwrap();
    let matter = dir.path().join("lighting.matter");
    fs::write(&matter, LIGHTING_IDL).unwrap();
    let xml = dir.path().join("identify.xml");
    fs::write(&xml, IDENTIFY_XML).unwrap();

    let idl = idm::load_model(&[matter.clone()]).unwrap();
    assert_eq!(idl.clusters, lighting().clusters);
    assert_eq!(idl.file_stem(), "lighting");

    let idl = idm::load_model(&[xml.clone()]).unwrap();
    assert_eq!(idl.clusters.len(), 1);

    assert!(idm::load_model(&[matter, xml]).is_err());
}

/// Test: parse errors carry a position
#[test]
fn test_parse_error_position() {
    init_logging();
    println!("\n=== Parse Error Test ===");

    let err = idm::parse_idl("server cluster Broken = 1 {\n  attribute int16u = 0;\n}\n", "broken.matter")
        .unwrap_err();
    let message = err.to_string();
    println!("{}", message);
    assert!(message.contains("broken.matter"));
    assert!(message.contains("2:"));
}
