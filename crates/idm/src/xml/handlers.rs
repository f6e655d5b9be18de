//! Element handlers for ZCL XML documents

use roxmltree::{Document, Node};
use tracing::{trace, warn};

use super::{Collected, Extension, Members, Origin, TypeDecl, TypeEntry, XmlSource};
use crate::ast::*;
use crate::builder::{self, FieldBuilder};
use crate::error::{IdlError, Result};

/// Children of `<cluster>` that carry no model data
const IGNORED_CLUSTER_CHILDREN: &[&str] = &["define", "domain", "tag", "introducedIn", "quality"];

/// Top-level elements that carry no model data
const IGNORED_TOP_LEVEL: &[&str] = &["domain", "deviceType", "accessControl", "atomic", "global"];

pub(crate) struct DocumentReader<'a, 'input> {
    source_name: &'a str,
    doc: &'a Document<'input>,
}

impl<'a, 'input> DocumentReader<'a, 'input> {
    pub(crate) fn new(source_name: &'a str, doc: &'a Document<'input>) -> Self {
        Self { source_name, doc }
    }

    fn line(&self, node: Node) -> usize {
        self.doc.text_pos_at(node.range().start).row as usize
    }

    fn origin(&self, node: Node) -> Origin {
        Origin {
            source: self.source_name.to_string(),
            line: self.line(node),
        }
    }

    fn error(&self, node: Node, message: impl Into<String>) -> IdlError {
        IdlError::xml(self.source_name, self.line(node), message)
    }

    fn required<'n>(&self, node: Node<'n, '_>, name: &str) -> Result<&'n str> {
        node.attribute(name).ok_or_else(|| {
            self.error(
                node,
                format!("<{}> is missing attribute `{}`", node.tag_name().name(), name),
            )
        })
    }

    fn number_text(&self, node: Node, text: &str) -> Result<i64> {
        builder::parse_number(text)
            .ok_or_else(|| self.error(node, format!("invalid number `{}`", text.trim())))
    }

    fn number(&self, node: Node, name: &str) -> Result<i64> {
        let text = self.required(node, name)?;
        self.number_text(node, text)
    }

    fn optional_number(&self, node: Node, name: &str) -> Result<Option<i64>> {
        node.attribute(name)
            .map(|text| self.number_text(node, text))
            .transpose()
    }

    fn code(&self, node: Node, name: &str) -> Result<u32> {
        let value = self.number(node, name)?;
        u32::try_from(value).map_err(|_| self.error(node, format!("`{}` out of range: {}", name, value)))
    }

    fn child_code(&self, node: Node, name: &str) -> Result<Option<u32>> {
        let Some(child) = child(node, name) else {
            return Ok(None);
        };
        let value = self.number_text(child, &element_text(child))?;
        u32::try_from(value)
            .map(Some)
            .map_err(|_| self.error(child, format!("<{}> out of range: {}", name, value)))
    }

    /// Read every top-level element of the document into `collected`
    pub(crate) fn read(&self, collected: &mut Collected) -> Result<()> {
        let root = self.doc.root_element();
        if root.tag_name().name() != "configurator" {
            return Err(self.error(
                root,
                format!("expected <configurator>, found <{}>", root.tag_name().name()),
            ));
        }

        for node in root.children().filter(Node::is_element) {
            match node.tag_name().name() {
                "cluster" => {
                    let cluster = self.read_cluster(node)?;
                    trace!(cluster = %cluster.name, "read cluster");
                    collected.clusters.push((cluster, self.origin(node)));
                }
                "clusterExtension" => {
                    let code = self.code(node, "code")?;
                    let mut members = Members::default();
                    for member in node.children().filter(Node::is_element) {
                        self.read_member(member, &mut members)?;
                    }
                    collected.extensions.push(Extension {
                        code,
                        members,
                        origin: self.origin(node),
                    });
                }
                "struct" | "enum" | "bitmap" => collected.types.push(self.read_type(node)?),
                name if IGNORED_TOP_LEVEL.contains(&name) => {}
                name => warn!(source = self.source_name, line = self.line(node), "ignoring <{}>", name),
            }
        }
        Ok(())
    }

    fn read_cluster(&self, node: Node) -> Result<Cluster> {
        let name = child(node, "name")
            .map(element_text)
            .ok_or_else(|| self.error(node, "<cluster> has no <name>"))?;
        let code = self
            .child_code(node, "code")?
            .ok_or_else(|| self.error(node, "<cluster> has no <code>"))?;

        let is_client = child(node, "client").map(|n| is_true(&element_text(n))).unwrap_or(false);
        let is_server = child(node, "server").map(|n| is_true(&element_text(n))).unwrap_or(false);
        let side = if is_client && !is_server {
            ClusterSide::Client
        } else {
            ClusterSide::Server
        };

        let mut cluster = Cluster::new(side, name.split_whitespace().collect::<String>(), code);
        cluster.api_maturity = maturity(node);
        cluster.parse_meta = Some(self.meta(node));

        let mut members = Members::default();
        for member in node.children().filter(Node::is_element) {
            match member.tag_name().name() {
                "name" | "code" | "client" | "server" => {}
                "description" => cluster.description = Some(element_text(member)),
                "globalAttribute" => {
                    // 0xFFFD is ClusterRevision
                    if self.code(member, "code")? == 0xFFFD {
                        if let Some(value) = self.optional_number(member, "value")? {
                            cluster.revision = u32::try_from(value)
                                .map_err(|_| self.error(member, "invalid cluster revision"))?;
                        }
                    }
                }
                "features" => cluster.bitmaps.push(self.read_features(member)?),
                name if IGNORED_CLUSTER_CHILDREN.contains(&name) => {}
                _ => self.read_member(member, &mut members)?,
            }
        }
        members.apply(&mut cluster);

        Ok(cluster)
    }

    fn meta(&self, node: Node) -> ParseMeta {
        let start_pos = node.range().start;
        let pos = self.doc.text_pos_at(start_pos);
        ParseMeta {
            line: pos.row as usize,
            column: pos.col as usize,
            start_pos,
        }
    }

    /// `<attribute>`, `<command>` or `<event>` of a cluster or extension
    fn read_member(&self, node: Node, members: &mut Members) -> Result<()> {
        match node.tag_name().name() {
            "attribute" => {
                if node.attribute("side") != Some("client") {
                    members.attributes.push(self.read_attribute(node)?);
                }
            }
            "command" => self.read_command(node, members)?,
            "event" => members.events.push(self.read_event(node)?),
            other => {
                return Err(self.error(
                    node,
                    format!("unexpected <{}> in <{}>", other, parent_name(node)),
                ))
            }
        }
        Ok(())
    }

    /// Field type and list-ness from `type` / `entryType` / `array`
    fn field_type<'n>(&self, node: Node<'n, '_>) -> Result<(&'n str, bool)> {
        let ty = self.required(node, "type")?;
        if ty.eq_ignore_ascii_case("array") {
            Ok((self.required(node, "entryType")?, true))
        } else {
            Ok((ty, flag(node, "array")))
        }
    }

    fn read_field(&self, node: Node, name: &str, code: u32) -> Result<Field> {
        let (ty, is_list) = self.field_type(node)?;
        let max_length = self
            .optional_number(node, "length")?
            .map(|len| u32::try_from(len).map_err(|_| self.error(node, "invalid length")))
            .transpose()?;

        let ty = builder::normalize_xml_type_name(ty);
        Ok(FieldBuilder::new(builder::normalize_member_name(name), code, &ty)
            .list(is_list)
            .optional(flag(node, "optional"))
            .nullable(flag(node, "isNullable"))
            .fabric_sensitive(flag(node, "isFabricSensitive"))
            .max_length(max_length)
            .range(self.optional_number(node, "min")?, self.optional_number(node, "max")?)
            .api_maturity(maturity(node))
            .build())
    }

    fn read_attribute(&self, node: Node) -> Result<Attribute> {
        let code = self.code(node, "code")?;
        let name = match node.attribute("name") {
            Some(name) => name.to_string(),
            None => child(node, "description")
                .map(element_text)
                .or_else(|| own_text(node))
                .ok_or_else(|| self.error(node, "<attribute> has no name"))?,
        };

        let qualities = AttributeQualities {
            readable: true,
            writable: flag(node, "writable"),
            nosubscribe: false,
            timed_write: flag(node, "mustUseTimedWrite"),
        };

        Ok(Attribute {
            definition: self.read_field(node, &name, code)?,
            qualities,
            read_acl: access(node, "read").unwrap_or(AccessPrivilege::View),
            write_acl: access(node, "write").unwrap_or(AccessPrivilege::Operate),
            api_maturity: maturity(node),
            parse_meta: Some(self.meta(node)),
        })
    }

    fn read_args(&self, node: Node) -> Result<Vec<Field>> {
        node.children()
            .filter(|n| n.has_tag_name("arg"))
            .enumerate()
            .map(|(index, arg)| {
                let name = self.required(arg, "name")?;
                self.read_field(arg, name, index as u32)
            })
            .collect()
    }

    /// Client commands become commands (plus a request struct when they
    /// carry arguments); server commands become response structs
    fn read_command(&self, node: Node, members: &mut Members) -> Result<()> {
        let name = self.required(node, "name")?.to_string();
        let code = self.code(node, "code")?;
        let fields = self.read_args(node)?;

        match self.required(node, "source")? {
            "client" => {
                let input_param = if fields.is_empty() {
                    None
                } else {
                    let request = format!("{}Request", name);
                    members.structs.push(Struct {
                        name: request.clone(),
                        fields,
                        tag: Some(StructTag::Request),
                        code: None,
                        fabric_scoped: false,
                        api_maturity: maturity(node),
                    });
                    Some(request)
                };

                members.commands.push(Command {
                    name,
                    code,
                    input_param,
                    output_param: node.attribute("response").unwrap_or(DEFAULT_SUCCESS).to_string(),
                    qualities: CommandQualities {
                        timed_invoke: flag(node, "mustUseTimedInvoke"),
                        fabric_scoped: flag(node, "isFabricScoped"),
                    },
                    invoke_acl: access(node, "invoke").unwrap_or(AccessPrivilege::Operate),
                    api_maturity: maturity(node),
                });
            }
            "server" => members.structs.push(Struct {
                name,
                fields,
                tag: Some(StructTag::Response),
                code: Some(code),
                fabric_scoped: false,
                api_maturity: maturity(node),
            }),
            other => return Err(self.error(node, format!("unknown command source `{}`", other))),
        }
        Ok(())
    }

    fn read_event(&self, node: Node) -> Result<Event> {
        let priority = match node.attribute("priority").unwrap_or("info") {
            "critical" => EventPriority::Critical,
            "info" => EventPriority::Info,
            "debug" => EventPriority::Debug,
            other => return Err(self.error(node, format!("unknown event priority `{}`", other))),
        };

        let fields = node
            .children()
            .filter(|n| n.has_tag_name("field"))
            .map(|field| {
                let name = self.required(field, "name")?;
                self.read_field(field, name, self.code(field, "id")?)
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Event {
            priority,
            name: self.required(node, "name")?.to_string(),
            code: self.code(node, "code")?,
            fields,
            read_acl: access(node, "read").unwrap_or(AccessPrivilege::View),
            fabric_sensitive: flag(node, "isFabricSensitive"),
            api_maturity: maturity(node),
        })
    }

    /// `<features>` becomes the `Feature` bitmap, one entry per bit
    fn read_features(&self, node: Node) -> Result<Bitmap> {
        let entries = node
            .children()
            .filter(|n| n.has_tag_name("feature"))
            .map(|feature| {
                let bit = self.number(feature, "bit")?;
                if !(0..32).contains(&bit) {
                    return Err(self.error(feature, format!("feature bit {} out of range", bit)));
                }
                let name = self.required(feature, "name")?;
                Ok(builder::constant(builder::normalize_constant_name(name), 1u64 << bit))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Bitmap {
            name: "Feature".to_string(),
            base_type: "bitmap32".to_string(),
            entries,
            api_maturity: ApiMaturity::Stable,
        })
    }

    /// `<struct>`, `<enum>` or `<bitmap>`, scoped by its `<cluster code>` children
    fn read_type(&self, node: Node) -> Result<TypeEntry> {
        let name = self.required(node, "name")?.to_string();
        let cluster_codes = node
            .children()
            .filter(|n| n.has_tag_name("cluster"))
            .map(|c| self.code(c, "code"))
            .collect::<Result<Vec<_>>>()?;

        let decl = match node.tag_name().name() {
            "struct" => {
                let fields = node
                    .children()
                    .filter(|n| n.has_tag_name("item"))
                    .enumerate()
                    .map(|(index, item)| {
                        let code = match self.optional_number(item, "fieldId")? {
                            Some(id) => u32::try_from(id).map_err(|_| self.error(item, "invalid fieldId"))?,
                            None => index as u32,
                        };
                        self.read_field(item, self.required(item, "name")?, code)
                    })
                    .collect::<Result<Vec<_>>>()?;
                TypeDecl::Struct(Struct {
                    name,
                    fields,
                    tag: None,
                    code: None,
                    fabric_scoped: flag(node, "isFabricScoped"),
                    api_maturity: maturity(node),
                })
            }
            "enum" => TypeDecl::Enum(Enum {
                name,
                base_type: builder::normalize_xml_type_name(self.required(node, "type")?),
                entries: self.read_constants(node, "item", "value")?,
                api_maturity: maturity(node),
            }),
            _ => TypeDecl::Bitmap(Bitmap {
                name,
                base_type: builder::normalize_xml_type_name(self.required(node, "type")?),
                entries: self.read_constants(node, "field", "mask")?,
                api_maturity: maturity(node),
            }),
        };

        Ok(TypeEntry {
            decl,
            cluster_codes,
            origin: self.origin(node),
        })
    }

    fn read_constants(&self, node: Node, tag: &str, value_attr: &str) -> Result<Vec<ConstantEntry>> {
        node.children()
            .filter(|n| n.has_tag_name(tag))
            .map(|item| {
                let name = self.required(item, "name")?;
                let value = self.number(item, value_attr)?;
                let code = u64::try_from(value)
                    .map_err(|_| self.error(item, format!("negative {} {}", value_attr, value)))?;
                Ok(builder::constant(builder::normalize_constant_name(name), code))
            })
            .collect()
    }
}

fn child<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|n| n.has_tag_name(name))
}

fn parent_name(node: Node) -> String {
    node.parent_element()
        .map(|p| p.tag_name().name().to_string())
        .unwrap_or_default()
}

/// Text content of an element and its descendants, whitespace collapsed
fn element_text(node: Node) -> String {
    node.descendants()
        .filter(Node::is_text)
        .filter_map(|n| n.text())
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Direct text children only, ignoring nested elements
fn own_text(node: Node) -> Option<String> {
    let text = node
        .children()
        .filter(Node::is_text)
        .filter_map(|n| n.text())
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ");
    (!text.is_empty()).then_some(text)
}

fn is_true(value: &str) -> bool {
    value.trim().eq_ignore_ascii_case("true")
}

fn flag(node: Node, name: &str) -> bool {
    node.attribute(name).map(is_true).unwrap_or(false)
}

fn maturity(node: Node) -> ApiMaturity {
    match node.attribute("apiMaturity") {
        Some("provisional") => ApiMaturity::Provisional,
        Some("internal") => ApiMaturity::Internal,
        Some("deprecated") => ApiMaturity::Deprecated,
        _ => ApiMaturity::Stable,
    }
}

/// Privilege of an `<access op=.. privilege=..>` child
fn access(node: Node, op: &str) -> Option<AccessPrivilege> {
    node.children()
        .filter(|n| n.has_tag_name("access"))
        .find(|n| n.attribute("op") == Some(op))
        .and_then(|n| n.attribute("privilege").or_else(|| n.attribute("role")))
        .and_then(|p| match p {
            "administrator" => Some(AccessPrivilege::Administer),
            other => AccessPrivilege::from_keyword(other),
        })
}

fn is_optional_element(node: Node) -> bool {
    flag(node, "optional") || child(node, "optionalConform").is_some()
}

/// Mandatory server attributes and client commands of one XML cluster
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterRequirements {
    pub name: String,
    pub code: u32,
    /// (code, name) of every mandatory attribute
    pub attributes: Vec<(u32, String)>,
    /// (code, name) of every mandatory command
    pub commands: Vec<(u32, String)>,
}

/// Read the mandatory elements of every cluster in `source`
///
/// Used by lint rule files that `load` XML definitions; only the cluster
/// shape is read, types are not resolved.
pub fn read_requirements(source: &XmlSource) -> Result<Vec<ClusterRequirements>> {
    let doc = source.parse()?;
    let reader = DocumentReader::new(source.name(), &doc);
    let mut clusters = Vec::new();

    for node in doc.root_element().children().filter(|n| n.has_tag_name("cluster")) {
        let name = child(node, "name")
            .map(element_text)
            .ok_or_else(|| reader.error(node, "<cluster> has no <name>"))?;
        let code = reader
            .child_code(node, "code")?
            .ok_or_else(|| reader.error(node, "<cluster> has no <code>"))?;

        let mut requirements = ClusterRequirements {
            name: name.split_whitespace().collect(),
            code,
            attributes: Vec::new(),
            commands: Vec::new(),
        };

        for member in node.children().filter(Node::is_element) {
            if is_optional_element(member) {
                continue;
            }
            match member.tag_name().name() {
                "attribute" if member.attribute("side") != Some("client") => {
                    let attr = reader.read_attribute(member)?;
                    requirements.attributes.push((attr.code(), attr.name().to_string()));
                }
                "command" if member.attribute("source") == Some("client") => {
                    let name = reader.required(member, "name")?.to_string();
                    requirements.commands.push((reader.code(member, "code")?, name));
                }
                _ => {}
            }
        }
        clusters.push(requirements);
    }

    Ok(clusters)
}
