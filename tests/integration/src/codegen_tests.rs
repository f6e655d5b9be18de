//! Codegen Integration Tests
//!
//! Runs every registered generator against the lighting model and checks
//! storage behavior across repeated runs.

mod common;

use std::fs;

use common::*;
use idm::codegen::{FileSystemStorage, InMemoryStorage};
use idm::{CodegenRunOptions, GeneratorOptions, GeneratorRegistry, IdlError, PipelineContext};

/// Test: each built-in generator produces its documented outputs
#[test]
fn test_every_generator() {
    init_logging();
    println!("\n=== All Generators Test ===");

    let idl = lighting();
    let expected: &[(&str, &[&str])] = &[
        ("bridge", &["bridge/BridgeClustersImpl.h", "bridge/Descriptor.h", "bridge/OnOff.h"]),
        ("cpp-app", &["app/PluginApplicationCallbacks.h", "app/callback-stub.cpp"]),
        (
            "cpp-sdk",
            &[
                "clusters/Descriptor/ClusterMetadata.h",
                "clusters/OnOff/ClusterMetadata.h",
                "clusters/clusters.gni",
            ],
        ),
        ("gn", &["gn/clusters.gni"]),
        ("idl", &["lighting.matter"]),
        (
            "java",
            &[
                "java/chip/devicecontroller/ClusterIDMapping.java",
                "java/chip/devicecontroller/DescriptorCluster.java",
                "java/chip/devicecontroller/OnOffCluster.java",
            ],
        ),
    ];

    let keys: Vec<&str> = GeneratorRegistry::builtin().keys().collect();
    assert_eq!(keys, expected.iter().map(|(k, _)| *k).collect::<Vec<_>>());

    for (key, paths) in expected {
        let (outputs, _) = generate(key, &idl);
        println!("{}: {:?}", key, outputs.keys().collect::<Vec<_>>());
        assert_eq!(outputs.keys().map(String::as_str).collect::<Vec<_>>(), *paths);
        for (path, content) in &outputs {
            assert!(!content.trim().is_empty(), "{} is empty", path);
            if !path.ends_with(".matter") {
                assert!(content.contains("Generated by idm from lighting.matter"), "{}", path);
            }
        }
    }
}

/// Test: application callbacks cover server instances and client bindings
#[test]
fn test_application_callbacks() {
    init_logging();
    println!("\n=== Application Callbacks Test ===");

    let (outputs, _) = generate("cpp-app", &lighting());
    let header = &outputs["app/PluginApplicationCallbacks.h"];
    assert!(header.contains("void MatterDescriptorPluginServerInitCallback();"));
    assert!(header.contains("void MatterOnOffPluginServerInitCallback();"));
    assert!(header.contains("void MatterOnOffPluginClientInitCallback();"));
    assert_eq!(header.matches("MatterOnOffPluginServerInitCallback()").count(), 2);
}

/// Test: the re-emitted IDL parses back to the same model
#[test]
fn test_idl_round_trip() {
    init_logging();
    println!("\n=== IDL Round Trip Test ===");

    let original = lighting();
    let (outputs, _) = generate("idl", &original);
    let reparsed = idm::parse_idl(&outputs["lighting.matter"], "lighting.matter").unwrap();
    assert_eq!(reparsed, original);

    // A second pass is a fixed point
    let (again, _) = generate("idl", &reparsed);
    assert_eq!(again, outputs);
}

/// Test: java honors the package option
#[test]
fn test_java_package_option() {
    init_logging();
    println!("\n=== Java Package Test ===");

    let context = PipelineContext::new()
        .unwrap()
        .with_options(GeneratorOptions::from_pairs(["package:com.example.lighting"]).unwrap());
    let mut storage = InMemoryStorage::new();
    context
        .generate("java", &lighting(), &mut storage, &CodegenRunOptions::new())
        .unwrap();

    let mapping = storage
        .get("java/com/example/lighting/ClusterIDMapping.java")
        .unwrap();
    assert!(mapping.contains("package com.example.lighting;"));
}

/// Test: a second run over unchanged inputs writes nothing
#[test]
fn test_second_run_is_idempotent_in_memory() {
    init_logging();
    println!("\n=== In-Memory Idempotence Test ===");

    let context = PipelineContext::new().unwrap();
    let idl = lighting();
    let mut storage = InMemoryStorage::new();

    let first = context
        .generate("cpp-sdk", &idl, &mut storage, &CodegenRunOptions::new())
        .unwrap();
    assert_eq!(first.written.len(), 3);
    assert_eq!(storage.write_count(), 3);

    let second = context
        .generate("cpp-sdk", &idl, &mut storage, &CodegenRunOptions::new())
        .unwrap();
    assert!(second.written.is_empty());
    assert_eq!(second.unchanged.len(), 3);
    assert_eq!(storage.write_count(), 3);
}

/// Test: file storage leaves untouched files alone on a repeat run
#[test]
fn test_second_run_is_idempotent_on_disk() {
    init_logging();
    println!("\n=== File System Idempotence Test ===");

    let dir = tempfile::tempdir().unwrap();
    let context = PipelineContext::new().unwrap();
    let idl = lighting();

    let mut storage = FileSystemStorage::new(dir.path());
    let first = context
        .generate("bridge", &idl, &mut storage, &CodegenRunOptions::new())
        .unwrap();
    assert_eq!(first.written.len(), 3);

    let header = dir.path().join("bridge").join("OnOff.h");
    let content = fs::read_to_string(&header).unwrap();
    assert!(content.contains("OnOff"));
    let modified = fs::metadata(&header).unwrap().modified().unwrap();

    let mut storage = FileSystemStorage::new(dir.path());
    let second = context
        .generate("bridge", &idl, &mut storage, &CodegenRunOptions::new())
        .unwrap();
    assert!(second.written.is_empty());
    assert_eq!(second.unchanged.len(), 3);
    assert_eq!(fs::metadata(&header).unwrap().modified().unwrap(), modified);

    // A stale file is replaced
    fs::write(&header, "stale").unwrap();
    let third = context
        .generate("bridge", &idl, &mut storage, &CodegenRunOptions::new())
        .unwrap();
    assert_eq!(third.written, vec!["bridge/OnOff.h"]);
    assert_eq!(fs::read_to_string(&header).unwrap(), content);
}

/// Test: declared outputs are enforced before anything is written
#[test]
fn test_expected_outputs() {
    init_logging();
    println!("\n=== Expected Outputs Test ===");

    let context = PipelineContext::new().unwrap();
    let idl = lighting();

    let declared = idm::codegen::parse_expected_outputs("app/PluginApplicationCallbacks.h\n\napp/callback-stub.cpp\n");
    let mut storage = InMemoryStorage::new();
    let report = context
        .generate(
            "cpp-app",
            &idl,
            &mut storage,
            &CodegenRunOptions::new().expected_outputs(declared),
        )
        .unwrap();
    assert_eq!(report.written.len(), 2);

    let mut storage = InMemoryStorage::new();
    let err = context
        .generate(
            "cpp-app",
            &idl,
            &mut storage,
            &CodegenRunOptions::new().expected_outputs(vec!["app/callback-stub.cpp".to_string()]),
        )
        .unwrap_err();
    match err {
        IdlError::ExpectedOutputsMismatch { missing, unexpected } => {
            assert!(missing.is_empty());
            assert_eq!(unexpected, vec!["app/PluginApplicationCallbacks.h"]);
        }
        other => panic!("unexpected error: {}", other),
    }
    assert_eq!(storage.write_count(), 0);
}

/// Test: dry runs render but never write
#[test]
fn test_dry_run() {
    init_logging();
    println!("\n=== Dry Run Test ===");

    let dir = tempfile::tempdir().unwrap();
    let context = PipelineContext::new().unwrap();
    let mut storage = FileSystemStorage::new(dir.path());

    let report = context
        .generate("gn", &lighting(), &mut storage, &CodegenRunOptions::new().dry_run(true))
        .unwrap();
    assert_eq!(report.skipped, vec!["gn/clusters.gni"]);
    assert!(!dir.path().join("gn").exists());
}

/// Test: rendering is deterministic
#[test]
fn test_byte_identical_renders() {
    init_logging();
    println!("\n=== Determinism Test ===");

    let idl = lighting();
    for key in GeneratorRegistry::builtin().keys() {
        let (first, _) = generate(key, &idl);
        let (second, _) = generate(key, &idl);
        assert_eq!(first, second, "{} is not deterministic", key);
    }
}

/// Test: unknown generators list the known ones
#[test]
fn test_unknown_generator() {
    init_logging();
    println!("\n=== Unknown Generator Test ===");

    let context = PipelineContext::new().unwrap();
    let mut storage = InMemoryStorage::new();
    let err = context
        .generate("python", &lighting(), &mut storage, &CodegenRunOptions::new())
        .unwrap_err();
    let message = err.to_string();
    assert!(message.contains("python"));
    assert!(message.contains("cpp-app"));
}
