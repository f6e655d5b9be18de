//! Dynamic bridge generator
//!
//! One header per server cluster definition, describing its attributes for
//! a bridge application that exposes them at runtime, plus a factory header
//! creating cluster objects by id.

use serde_json::{json, Value};

use super::{cpp, source_name, GeneratedOutputs, Generator, TemplateRenderer};
use crate::ast::{Attribute, Cluster, ClusterSide, Idl};
use crate::error::Result;

#[derive(Debug, Default)]
pub struct BridgeGenerator;

fn attribute_flags(attribute: &Attribute) -> String {
    let mut flags = Vec::new();
    if attribute.qualities.writable {
        flags.push("ZAP_ATTRIBUTE_MASK(WRITABLE)");
    }
    if attribute.definition.is_nullable() {
        flags.push("ZAP_ATTRIBUTE_MASK(NULLABLE)");
    }
    if attribute.qualities.timed_write {
        flags.push("ZAP_ATTRIBUTE_MASK(MUST_USE_TIMED_WRITE)");
    }
    cpp::flags(&flags)
}

fn cluster_bindings(idl: &Idl, cluster: &Cluster) -> Value {
    let attributes: Vec<Value> = cluster
        .attributes
        .iter()
        .map(|a| {
            json!({
                "name": a.name(),
                "code": a.code(),
                "cpp_type": cpp::field_type(idl, Some(cluster), &a.definition),
                "flags": attribute_flags(a),
            })
        })
        .collect();
    let commands: Vec<Value> = cluster
        .commands
        .iter()
        .map(|c| json!({ "name": c.name, "code": c.code }))
        .collect();

    json!({
        "name": cluster.name,
        "code": cluster.code,
        "revision": cluster.revision,
        "attributes": attributes,
        "commands": commands,
    })
}

impl Generator for BridgeGenerator {
    fn name(&self) -> &str {
        "bridge"
    }

    fn render_all(&self, idl: &Idl, renderer: &dyn TemplateRenderer) -> Result<GeneratedOutputs> {
        let source = source_name(idl);
        let clusters: Vec<&Cluster> = idl
            .clusters
            .iter()
            .filter(|c| c.side == ClusterSide::Server)
            .collect();

        let mut outputs = GeneratedOutputs::new();
        for cluster in &clusters {
            let mut bindings = cluster_bindings(idl, cluster);
            bindings["source"] = json!(source);
            outputs.insert(
                format!("bridge/{}.h", cluster.name),
                renderer.render("bridge/Cluster.h", &bindings)?,
            );
        }

        let names: Vec<&str> = clusters.iter().map(|c| c.name.as_str()).collect();
        outputs.insert(
            "bridge/BridgeClustersImpl.h".to_string(),
            renderer.render(
                "bridge/BridgeClustersImpl.h",
                &json!({ "source": source, "clusters": names }),
            )?,
        );
        Ok(outputs)
    }
}
