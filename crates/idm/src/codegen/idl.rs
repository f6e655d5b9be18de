//! IDL re-emitter
//!
//! Renders a model back into IDL text. Parsing the output yields a model
//! equal to the input, whichever front end the input came from; value
//! ranges have no IDL spelling and are dropped.

use std::fmt::Write;

use serde_json::{json, Value};

use super::{source_name, GeneratedOutputs, Generator, TemplateRenderer};
use crate::ast::*;
use crate::error::Result;

#[derive(Debug, Default)]
pub struct IdlGenerator;

fn maturity(api_maturity: ApiMaturity) -> String {
    api_maturity
        .as_keyword()
        .map(|k| format!("{} ", k))
        .unwrap_or_default()
}

fn field_line(field: &Field) -> String {
    let mut line = maturity(field.api_maturity);
    if field.qualities.optional {
        line.push_str("optional ");
    }
    if field.qualities.nullable {
        line.push_str("nullable ");
    }
    if field.qualities.fabric_sensitive {
        line.push_str("fabric_sensitive ");
    }
    line.push_str(&field.data_type.name);
    if let Some(len) = field.data_type.max_length {
        let _ = write!(line, "<{}>", len);
    }
    let _ = write!(line, " {}", field.name);
    if field.is_list {
        line.push_str("[]");
    }
    let _ = write!(line, " = {};", field.code);
    line
}

fn access(entries: &[(&str, AccessPrivilege, AccessPrivilege)]) -> String {
    let changed: Vec<String> = entries
        .iter()
        .filter(|(_, privilege, default)| privilege != default)
        .map(|(op, privilege, _)| format!("{}: {}", op, privilege.as_keyword()))
        .collect();
    if changed.is_empty() {
        String::new()
    } else {
        format!("access({}) ", changed.join(", "))
    }
}

fn constants(kind: &str, name: &str, base_type: &str, api_maturity: ApiMaturity, entries: &[ConstantEntry]) -> Value {
    json!({
        "header": format!("{}{} {} : {}", maturity(api_maturity), kind, name, base_type),
        "entries": entries
            .iter()
            .map(|e| format!("{} = {};", e.name, e.code))
            .collect::<Vec<_>>(),
    })
}

fn type_blocks(enums: &[Enum], bitmaps: &[Bitmap]) -> Vec<Value> {
    enums
        .iter()
        .map(|e| constants("enum", &e.name, &e.base_type, e.api_maturity, &e.entries))
        .chain(
            bitmaps
                .iter()
                .map(|b| constants("bitmap", &b.name, &b.base_type, b.api_maturity, &b.entries)),
        )
        .collect()
}

fn struct_block(s: &Struct) -> Value {
    let mut header = maturity(s.api_maturity);
    if s.fabric_scoped {
        header.push_str("fabric_scoped ");
    }
    match s.tag {
        Some(StructTag::Request) => header.push_str("request "),
        Some(StructTag::Response) => header.push_str("response "),
        None => {}
    }
    let _ = write!(header, "struct {}", s.name);
    if let Some(code) = s.code {
        let _ = write!(header, " = {}", code);
    }
    json!({
        "header": header,
        "fields": s.fields.iter().map(field_line).collect::<Vec<_>>(),
    })
}

fn event_block(e: &Event) -> Value {
    let mut header = maturity(e.api_maturity);
    if e.fabric_sensitive {
        header.push_str("fabric_sensitive ");
    }
    let _ = write!(
        header,
        "{} event {}{} = {}",
        e.priority.as_keyword(),
        access(&[("read", e.read_acl, AccessPrivilege::View)]),
        e.name,
        e.code
    );
    json!({
        "header": header,
        "fields": e.fields.iter().map(field_line).collect::<Vec<_>>(),
    })
}

fn attribute_line(a: &Attribute) -> String {
    let mut line = maturity(a.api_maturity);
    if !a.qualities.writable {
        line.push_str("readonly ");
    }
    if a.qualities.nosubscribe {
        line.push_str("nosubscribe ");
    }
    if a.qualities.timed_write {
        line.push_str("timed write ");
    }
    line.push_str("attribute ");
    line.push_str(&access(&[
        ("read", a.read_acl, AccessPrivilege::View),
        ("write", a.write_acl, AccessPrivilege::Operate),
    ]));
    line.push_str(&field_line(&a.definition));
    line
}

fn command_line(c: &Command) -> String {
    let mut line = maturity(c.api_maturity);
    if c.qualities.timed_invoke {
        line.push_str("timed ");
    }
    if c.qualities.fabric_scoped {
        line.push_str("fabric ");
    }
    let _ = write!(
        line,
        "command {}{}({}): {} = {};",
        access(&[("invoke", c.invoke_acl, AccessPrivilege::Operate)]),
        c.name,
        c.input_param.as_deref().unwrap_or(""),
        c.output_param,
        c.code
    );
    line
}

fn cluster_block(c: &Cluster) -> Value {
    json!({
        "description": c.description,
        "header": format!("{}{} cluster {} = {}", maturity(c.api_maturity), c.side, c.name, c.code),
        "revision": c.revision,
        "types": type_blocks(&c.enums, &c.bitmaps),
        "structs": c.structs.iter().map(struct_block).collect::<Vec<_>>(),
        "events": c.events.iter().map(event_block).collect::<Vec<_>>(),
        "attributes": c.attributes.iter().map(attribute_line).collect::<Vec<_>>(),
        "commands": c.commands.iter().map(command_line).collect::<Vec<_>>(),
    })
}

fn default_value(value: &DefaultValue) -> String {
    match value {
        DefaultValue::Integer(v) => v.to_string(),
        // Debug keeps the decimal point, so the value reads back as a float
        DefaultValue::Float(v) => format!("{:?}", v),
        DefaultValue::Boolean(v) => v.to_string(),
        DefaultValue::String(s) => {
            let mut out = String::with_capacity(s.len() + 2);
            out.push('"');
            for ch in s.chars() {
                match ch {
                    '"' => out.push_str("\\\""),
                    '\\' => out.push_str("\\\\"),
                    '\n' => out.push_str("\\n"),
                    '\r' => out.push_str("\\r"),
                    '\t' => out.push_str("\\t"),
                    other => out.push(other),
                }
            }
            out.push('"');
            out
        }
    }
}

fn instance_block(instance: &ServerClusterInstantiation) -> Value {
    let attributes: Vec<String> = instance
        .attributes
        .iter()
        .map(|a| match &a.default {
            Some(value) => format!(
                "{} attribute {} default = {};",
                a.storage.as_keyword(),
                a.name,
                default_value(value)
            ),
            None => format!("{} attribute {};", a.storage.as_keyword(), a.name),
        })
        .collect();
    json!({
        "name": instance.name,
        "attributes": attributes,
        "events": instance.events_emitted,
        "commands": instance.commands,
    })
}

fn endpoint_block(e: &Endpoint) -> Value {
    json!({
        "number": e.number,
        "device_types": e.device_types,
        "bindings": e.client_bindings,
        "server_clusters": e.server_clusters.iter().map(instance_block).collect::<Vec<_>>(),
    })
}

impl Generator for IdlGenerator {
    fn name(&self) -> &str {
        "idl"
    }

    fn render_all(&self, idl: &Idl, renderer: &dyn TemplateRenderer) -> Result<GeneratedOutputs> {
        let bindings = json!({
            "source": source_name(idl),
            "types": type_blocks(&idl.global_enums, &idl.global_bitmaps),
            "structs": idl.global_structs.iter().map(struct_block).collect::<Vec<_>>(),
            "clusters": idl.clusters.iter().map(cluster_block).collect::<Vec<_>>(),
            "endpoints": idl.endpoints.iter().map(endpoint_block).collect::<Vec<_>>(),
        });

        let mut outputs = GeneratedOutputs::new();
        outputs.insert(
            format!("{}.matter", idl.file_stem()),
            renderer.render("idl/idl.matter", &bindings)?,
        );
        Ok(outputs)
    }
}
