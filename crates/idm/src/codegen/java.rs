//! Java bindings generator
//!
//! `ClusterIDMapping.java` maps every cluster, attribute, command and event
//! id to its name; each distinct cluster also gets a `<Name>Cluster.java`
//! with typed read, write and invoke methods.

use indexmap::IndexMap;
use serde_json::{json, Value};

use super::{
    distinct_clusters, source_name, GeneratedOutputs, Generator, GeneratorOptions, TemplateRenderer,
};
use crate::ast::{Cluster, Field, Idl};
use crate::error::{IdlError, Result};
use crate::types::{self, BuiltinKind};

pub const DEFAULT_PACKAGE: &str = "chip.devicecontroller";

#[derive(Debug, Clone)]
pub struct JavaGenerator {
    package: String,
}

impl JavaGenerator {
    /// Reads the `package` option
    pub fn new(options: &GeneratorOptions) -> Self {
        Self {
            package: options.get_or("package", DEFAULT_PACKAGE).to_string(),
        }
    }

    fn package_dir(&self) -> String {
        format!("java/{}", self.package.replace('.', "/"))
    }
}

fn builtin_java_type(kind: BuiltinKind) -> &'static str {
    match kind {
        BuiltinKind::Integer { bits, signed } if bits < 32 || (bits == 32 && signed) => "Integer",
        BuiltinKind::Integer { .. } => "Long",
        BuiltinKind::EnumBase { .. } => "Integer",
        BuiltinKind::BitmapBase { bits } if bits < 32 => "Integer",
        BuiltinKind::BitmapBase { .. } => "Long",
        BuiltinKind::Boolean => "Boolean",
        BuiltinKind::Float { bits: 32 } => "Float",
        BuiltinKind::Float { .. } => "Double",
        BuiltinKind::CharString { .. } => "String",
        BuiltinKind::OctetString { .. } => "byte[]",
    }
}

fn value_type(idl: &Idl, cluster: &Cluster, name: &str) -> String {
    if let Some(kind) = types::builtin(name) {
        return builtin_java_type(kind).to_string();
    }
    let base = idl
        .find_enum(Some(cluster), name)
        .map(|e| e.base_type.as_str())
        .or_else(|| idl.find_bitmap(Some(cluster), name).map(|b| b.base_type.as_str()));
    if let Some(base) = base {
        return types::builtin(base).map(builtin_java_type).unwrap_or("Integer").to_string();
    }
    if cluster.struct_named(name).is_some() {
        format!("ChipStructs.{}Cluster{}", cluster.name, name)
    } else {
        format!("ChipStructs.{}", name)
    }
}

fn java_type(idl: &Idl, cluster: &Cluster, field: &Field) -> String {
    let mut ty = value_type(idl, cluster, &field.data_type.name);
    if field.is_list {
        ty = format!("ArrayList<{}>", ty);
    }
    if field.is_optional() {
        ty = format!("Optional<{}>", ty);
    }
    if field.is_nullable() {
        ty = format!("@Nullable {}", ty);
    }
    ty
}

fn fields(idl: &Idl, cluster: &Cluster, fields: &[Field]) -> Vec<Value> {
    fields
        .iter()
        .map(|f| {
            json!({
                "name": f.name,
                "code": f.code,
                "java_type": java_type(idl, cluster, f),
            })
        })
        .collect()
}

impl JavaGenerator {
    fn cluster_bindings(&self, idl: &Idl, cluster: &Cluster) -> Result<Value> {
        let attributes: Vec<Value> = cluster
            .attributes
            .iter()
            .map(|a| {
                json!({
                    "name": a.name(),
                    "code": a.code(),
                    "java_type": java_type(idl, cluster, &a.definition),
                    "writable": a.qualities.writable,
                    "timed_write": a.qualities.timed_write,
                    "subscribable": !a.qualities.nosubscribe,
                })
            })
            .collect();

        let mut responses: IndexMap<&str, Value> = IndexMap::new();
        let mut commands = Vec::new();
        for command in &cluster.commands {
            let callback = if command.has_response() {
                let response = cluster.struct_named(&command.output_param).ok_or_else(|| {
                    IdlError::generator(
                        "java",
                        format!(
                            "command {}.{} responds with unknown struct {}",
                            cluster.name, command.name, command.output_param
                        ),
                    )
                })?;
                responses.entry(response.name.as_str()).or_insert_with(|| {
                    json!({
                        "name": response.name,
                        "fields": fields(idl, cluster, &response.fields),
                    })
                });
                format!("{}Callback", response.name)
            } else {
                "DefaultClusterCallback".to_string()
            };

            commands.push(json!({
                "name": command.name,
                "code": command.code,
                "callback": callback,
                "timed": command.qualities.timed_invoke,
                "fields": fields(idl, cluster, cluster.input_fields(command)),
            }));
        }

        let events: Vec<Value> = cluster
            .events
            .iter()
            .map(|e| json!({ "name": e.name, "code": e.code }))
            .collect();

        Ok(json!({
            "source": source_name(idl),
            "package": self.package,
            "name": cluster.name,
            "code": cluster.code,
            "revision": cluster.revision,
            "description": cluster.description,
            "attributes": attributes,
            "commands": commands,
            "responses": responses.into_values().collect::<Vec<_>>(),
            "events": events,
        }))
    }
}

impl Generator for JavaGenerator {
    fn name(&self) -> &str {
        "java"
    }

    fn render_all(&self, idl: &Idl, renderer: &dyn TemplateRenderer) -> Result<GeneratedOutputs> {
        let dir = self.package_dir();
        let mut outputs = GeneratedOutputs::new();
        let mut mapping = Vec::new();

        for cluster in distinct_clusters(idl) {
            let bindings = self.cluster_bindings(idl, cluster)?;
            outputs.insert(
                format!("{}/{}Cluster.java", dir, cluster.name),
                renderer.render("java/Cluster.java", &bindings)?,
            );
            mapping.push(bindings);
        }

        outputs.insert(
            format!("{}/ClusterIDMapping.java", dir),
            renderer.render(
                "java/ClusterIDMapping.java",
                &json!({
                    "source": source_name(idl),
                    "package": self.package,
                    "clusters": mapping,
                }),
            )?,
        );
        Ok(outputs)
    }
}
