//! SDK metadata generator
//!
//! Per-cluster metadata tables (ids, qualities, access) used by the data
//! model provider, and a build list naming every cluster directory.

use serde_json::{json, Value};

use super::{cpp, distinct_clusters, source_name, GeneratedOutputs, Generator, TemplateRenderer};
use crate::ast::{Attribute, Cluster, Command, Idl};
use crate::error::Result;

#[derive(Debug, Default)]
pub struct SdkGenerator;

fn attribute_entry(attribute: &Attribute) -> Value {
    let mut qualities = Vec::new();
    if attribute.definition.is_list {
        qualities.push("DataModel::AttributeQualityFlags::kListAttribute");
    }
    if attribute.qualities.timed_write {
        qualities.push("DataModel::AttributeQualityFlags::kTimed");
    }
    if attribute.definition.qualities.fabric_sensitive {
        qualities.push("DataModel::AttributeQualityFlags::kFabricSensitive");
    }
    json!({
        "name": attribute.name(),
        "code": attribute.code(),
        "qualities": qualities.join(", "),
        "read_privilege": cpp::privilege(attribute.read_acl),
        "write_privilege": attribute
            .qualities
            .writable
            .then(|| cpp::privilege(attribute.write_acl)),
    })
}

fn command_entry(command: &Command) -> Value {
    let mut qualities = Vec::new();
    if command.qualities.timed_invoke {
        qualities.push("DataModel::CommandQualityFlags::kTimed");
    }
    if command.qualities.fabric_scoped {
        qualities.push("DataModel::CommandQualityFlags::kFabricScoped");
    }
    json!({
        "name": command.name,
        "code": command.code,
        "qualities": qualities.join(", "),
        "invoke_privilege": cpp::privilege(command.invoke_acl),
    })
}

fn cluster_bindings(source: &str, cluster: &Cluster) -> Value {
    json!({
        "source": source,
        "name": cluster.name,
        "code": cluster.code,
        "revision": cluster.revision,
        "attributes": cluster.attributes.iter().map(attribute_entry).collect::<Vec<_>>(),
        "commands": cluster.commands.iter().map(command_entry).collect::<Vec<_>>(),
    })
}

impl Generator for SdkGenerator {
    fn name(&self) -> &str {
        "cpp-sdk"
    }

    fn render_all(&self, idl: &Idl, renderer: &dyn TemplateRenderer) -> Result<GeneratedOutputs> {
        let source = source_name(idl);
        let clusters = distinct_clusters(idl);

        let mut outputs = GeneratedOutputs::new();
        for cluster in &clusters {
            outputs.insert(
                format!("clusters/{}/ClusterMetadata.h", cluster.name),
                renderer.render("sdk/ClusterMetadata.h", &cluster_bindings(source, cluster))?,
            );
        }

        let names: Vec<&str> = clusters.iter().map(|c| c.name.as_str()).collect();
        outputs.insert(
            "clusters/clusters.gni".to_string(),
            renderer.render("sdk/clusters.gni", &json!({ "source": source, "clusters": names }))?,
        );
        Ok(outputs)
    }
}
