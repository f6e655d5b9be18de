//! Canonical Interaction Data Model
//!
//! Both front ends (IDL text and ZCL XML) produce these types, so every
//! downstream stage is independent of where a definition came from.

use std::fmt;

use serde::Serialize;

/// Where in a source file a definition started
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct ParseMeta {
    pub line: usize,
    pub column: usize,
    pub start_pos: usize,
}

// Positions never take part in structural equality: the same cluster read
// from IDL and from XML compares equal.
impl PartialEq for ParseMeta {
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}

impl Eq for ParseMeta {}

/// API maturity level of a definition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum ApiMaturity {
    #[default]
    Stable,
    Provisional,
    Internal,
    Deprecated,
}

impl ApiMaturity {
    pub fn as_keyword(&self) -> Option<&'static str> {
        match self {
            Self::Stable => None,
            Self::Provisional => Some("provisional"),
            Self::Internal => Some("internal"),
            Self::Deprecated => Some("deprecated"),
        }
    }
}

/// Qualities that may be attached to a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct FieldQualities {
    pub nullable: bool,
    pub optional: bool,
    pub fabric_sensitive: bool,
}

impl FieldQualities {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn fabric_sensitive(mut self) -> Self {
        self.fabric_sensitive = true;
        self
    }
}

/// Reference to a data type, by name
///
/// The name is either a built-in (see [`crate::types`]) or a struct, enum or
/// bitmap declared in the same cluster or globally. The resolution pass
/// guarantees the latter after a successful parse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DataType {
    pub name: String,
    pub min_value: Option<i64>,
    pub max_value: Option<i64>,
    pub max_length: Option<u32>,
}

impl DataType {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            min_value: None,
            max_value: None,
            max_length: None,
        }
    }

    pub fn with_max_length(mut self, max_length: Option<u32>) -> Self {
        self.max_length = max_length;
        self
    }
}

/// A named, numbered member of a struct, event, attribute or command payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Field {
    pub data_type: DataType,
    pub code: u32,
    pub name: String,
    pub is_list: bool,
    pub qualities: FieldQualities,
    pub api_maturity: ApiMaturity,
}

impl Field {
    pub fn is_nullable(&self) -> bool {
        self.qualities.nullable
    }

    pub fn is_optional(&self) -> bool {
        self.qualities.optional
    }
}

/// Role of a struct in command traffic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StructTag {
    Request,
    Response,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Struct {
    pub name: String,
    pub fields: Vec<Field>,
    pub tag: Option<StructTag>,
    /// Response structs carry the id of the response command
    pub code: Option<u32>,
    pub fabric_scoped: bool,
    pub api_maturity: ApiMaturity,
}

impl Struct {
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// `name = code` entry of an enum or bitmap
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConstantEntry {
    pub name: String,
    pub code: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Enum {
    pub name: String,
    pub base_type: String,
    pub entries: Vec<ConstantEntry>,
    pub api_maturity: ApiMaturity,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Bitmap {
    pub name: String,
    pub base_type: String,
    pub entries: Vec<ConstantEntry>,
    pub api_maturity: ApiMaturity,
}

/// Access privilege levels, ordered from least to most privileged
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum AccessPrivilege {
    View,
    Operate,
    Manage,
    Administer,
}

impl AccessPrivilege {
    pub fn from_keyword(s: &str) -> Option<Self> {
        match s {
            "view" => Some(Self::View),
            "operate" => Some(Self::Operate),
            "manage" => Some(Self::Manage),
            "administer" => Some(Self::Administer),
            _ => None,
        }
    }

    pub fn as_keyword(&self) -> &'static str {
        match self {
            Self::View => "view",
            Self::Operate => "operate",
            Self::Manage => "manage",
            Self::Administer => "administer",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AttributeQualities {
    pub readable: bool,
    pub writable: bool,
    pub nosubscribe: bool,
    pub timed_write: bool,
}

impl Default for AttributeQualities {
    fn default() -> Self {
        Self {
            readable: true,
            writable: true,
            nosubscribe: false,
            timed_write: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Attribute {
    pub definition: Field,
    pub qualities: AttributeQualities,
    pub read_acl: AccessPrivilege,
    pub write_acl: AccessPrivilege,
    pub api_maturity: ApiMaturity,
    #[serde(skip)]
    pub parse_meta: Option<ParseMeta>,
}

impl Attribute {
    pub fn name(&self) -> &str {
        &self.definition.name
    }

    pub fn code(&self) -> u32 {
        self.definition.code
    }

    pub fn is_readonly(&self) -> bool {
        !self.qualities.writable
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct CommandQualities {
    pub timed_invoke: bool,
    pub fabric_scoped: bool,
}

/// Output of commands that answer with a bare status
pub const DEFAULT_SUCCESS: &str = "DefaultSuccess";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Command {
    pub name: String,
    pub code: u32,
    /// Request struct name, `None` for commands without payload
    pub input_param: Option<String>,
    /// Response struct name or [`DEFAULT_SUCCESS`]
    pub output_param: String,
    pub qualities: CommandQualities,
    pub invoke_acl: AccessPrivilege,
    pub api_maturity: ApiMaturity,
}

impl Command {
    pub fn has_response(&self) -> bool {
        self.output_param != DEFAULT_SUCCESS
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EventPriority {
    Critical,
    Info,
    Debug,
}

impl EventPriority {
    pub fn as_keyword(&self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::Info => "info",
            Self::Debug => "debug",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Event {
    pub priority: EventPriority,
    pub name: String,
    pub code: u32,
    pub fields: Vec<Field>,
    pub read_acl: AccessPrivilege,
    pub fabric_sensitive: bool,
    pub api_maturity: ApiMaturity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ClusterSide {
    Client,
    Server,
}

impl fmt::Display for ClusterSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Client => f.write_str("client"),
            Self::Server => f.write_str("server"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Cluster {
    pub side: ClusterSide,
    pub name: String,
    pub code: u32,
    pub revision: u32,
    pub description: Option<String>,
    pub api_maturity: ApiMaturity,
    pub enums: Vec<Enum>,
    pub bitmaps: Vec<Bitmap>,
    pub events: Vec<Event>,
    pub attributes: Vec<Attribute>,
    pub structs: Vec<Struct>,
    pub commands: Vec<Command>,
    #[serde(skip)]
    pub parse_meta: Option<ParseMeta>,
}

impl Cluster {
    pub fn new(side: ClusterSide, name: impl Into<String>, code: u32) -> Self {
        Self {
            side,
            name: name.into(),
            code,
            revision: 1,
            description: None,
            api_maturity: ApiMaturity::Stable,
            enums: Vec::new(),
            bitmaps: Vec::new(),
            events: Vec::new(),
            attributes: Vec::new(),
            structs: Vec::new(),
            commands: Vec::new(),
            parse_meta: None,
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name() == name)
    }

    pub fn command(&self, name: &str) -> Option<&Command> {
        self.commands.iter().find(|c| c.name == name)
    }

    pub fn event(&self, name: &str) -> Option<&Event> {
        self.events.iter().find(|e| e.name == name)
    }

    pub fn struct_named(&self, name: &str) -> Option<&Struct> {
        self.structs.iter().find(|s| s.name == name)
    }

    pub fn enum_named(&self, name: &str) -> Option<&Enum> {
        self.enums.iter().find(|e| e.name == name)
    }

    pub fn bitmap_named(&self, name: &str) -> Option<&Bitmap> {
        self.bitmaps.iter().find(|b| b.name == name)
    }

    /// The feature map of the cluster: its bitmap named `Feature`
    pub fn feature_bitmap(&self) -> Option<&Bitmap> {
        self.bitmap_named("Feature")
    }

    /// Request fields of a command, empty when it takes no payload
    pub fn input_fields<'a>(&'a self, command: &Command) -> &'a [Field] {
        command
            .input_param
            .as_deref()
            .and_then(|name| self.struct_named(name))
            .map(|s| s.fields.as_slice())
            .unwrap_or(&[])
    }

    /// Response fields of a command, empty for `DefaultSuccess`
    pub fn output_fields<'a>(&'a self, command: &Command) -> &'a [Field] {
        self.struct_named(&command.output_param)
            .map(|s| s.fields.as_slice())
            .unwrap_or(&[])
    }
}

/// Storage class of an instantiated attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AttributeStorage {
    Ram,
    Persist,
    Callback,
}

impl AttributeStorage {
    pub fn as_keyword(&self) -> &'static str {
        match self {
            Self::Ram => "ram",
            Self::Persist => "persist",
            Self::Callback => "callback",
        }
    }
}

/// Default value of an instantiated attribute
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DefaultValue {
    Integer(i64),
    Float(f64),
    Boolean(bool),
    String(String),
}

impl fmt::Display for DefaultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(v) => write!(f, "{}", v),
            Self::Float(v) => write!(f, "{}", v),
            Self::Boolean(v) => write!(f, "{}", v),
            Self::String(v) => write!(f, "\"{}\"", v.escape_default()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttributeInstantiation {
    pub name: String,
    pub storage: AttributeStorage,
    pub default: Option<DefaultValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServerClusterInstantiation {
    pub name: String,
    pub attributes: Vec<AttributeInstantiation>,
    pub events_emitted: Vec<String>,
    pub commands: Vec<String>,
    #[serde(skip)]
    pub parse_meta: Option<ParseMeta>,
}

impl ServerClusterInstantiation {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            events_emitted: Vec::new(),
            commands: Vec::new(),
            parse_meta: None,
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&AttributeInstantiation> {
        self.attributes.iter().find(|a| a.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceType {
    pub name: String,
    pub code: u32,
    pub version: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Endpoint {
    pub number: u16,
    pub device_types: Vec<DeviceType>,
    pub server_clusters: Vec<ServerClusterInstantiation>,
    pub client_bindings: Vec<String>,
    #[serde(skip)]
    pub parse_meta: Option<ParseMeta>,
}

impl Endpoint {
    pub fn new(number: u16) -> Self {
        Self {
            number,
            device_types: Vec::new(),
            server_clusters: Vec::new(),
            client_bindings: Vec::new(),
            parse_meta: None,
        }
    }

    pub fn server_cluster(&self, name: &str) -> Option<&ServerClusterInstantiation> {
        self.server_clusters.iter().find(|c| c.name == name)
    }
}

/// Root of a parsed document
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Idl {
    pub clusters: Vec<Cluster>,
    pub endpoints: Vec<Endpoint>,
    pub global_enums: Vec<Enum>,
    pub global_bitmaps: Vec<Bitmap>,
    pub global_structs: Vec<Struct>,
    /// File the document was parsed from, for diagnostics and output names
    pub parse_file_name: Option<String>,
}

impl Idl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cluster with the given name and side
    pub fn cluster(&self, name: &str, side: ClusterSide) -> Option<&Cluster> {
        self.clusters.iter().find(|c| c.name == name && c.side == side)
    }

    /// First cluster with the given name, preferring the server side
    pub fn cluster_named(&self, name: &str) -> Option<&Cluster> {
        self.cluster(name, ClusterSide::Server)
            .or_else(|| self.clusters.iter().find(|c| c.name == name))
    }

    pub fn cluster_by_code(&self, code: u32) -> Option<&Cluster> {
        self.clusters.iter().find(|c| c.code == code)
    }

    /// Struct visible from `cluster`: its own first, then the global ones
    pub fn find_struct<'a>(&'a self, cluster: Option<&'a Cluster>, name: &str) -> Option<&'a Struct> {
        cluster
            .and_then(|c| c.struct_named(name))
            .or_else(|| self.global_structs.iter().find(|s| s.name == name))
    }

    pub fn find_enum<'a>(&'a self, cluster: Option<&'a Cluster>, name: &str) -> Option<&'a Enum> {
        cluster
            .and_then(|c| c.enum_named(name))
            .or_else(|| self.global_enums.iter().find(|e| e.name == name))
    }

    pub fn find_bitmap<'a>(&'a self, cluster: Option<&'a Cluster>, name: &str) -> Option<&'a Bitmap> {
        cluster
            .and_then(|c| c.bitmap_named(name))
            .or_else(|| self.global_bitmaps.iter().find(|b| b.name == name))
    }

    /// Stem of the originating file name (`all-clusters.matter` -> `all-clusters`)
    pub fn file_stem(&self) -> &str {
        let name = self.parse_file_name.as_deref().unwrap_or("idl");
        let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
        base.split('.').next().filter(|s| !s.is_empty()).unwrap_or("idl")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(name: &str, code: u32) -> Field {
        Field {
            data_type: DataType::named("int16u"),
            code,
            name: name.to_string(),
            is_list: false,
            qualities: FieldQualities::none(),
            api_maturity: ApiMaturity::Stable,
        }
    }

    #[test]
    fn test_command_fields() {
        let mut cluster = Cluster::new(ClusterSide::Server, "Identify", 3);
        cluster.structs.push(Struct {
            name: "IdentifyRequest".into(),
            fields: vec![field("identifyTime", 0)],
            tag: Some(StructTag::Request),
            code: None,
            fabric_scoped: false,
            api_maturity: ApiMaturity::Stable,
        });
        let command = Command {
            name: "Identify".into(),
            code: 0,
            input_param: Some("IdentifyRequest".into()),
            output_param: DEFAULT_SUCCESS.into(),
            qualities: CommandQualities::default(),
            invoke_acl: AccessPrivilege::Manage,
            api_maturity: ApiMaturity::Stable,
        };
        assert_eq!(cluster.input_fields(&command).len(), 1);
        assert!(cluster.output_fields(&command).is_empty());
        assert!(!command.has_response());
    }

    #[test]
    fn test_file_stem() {
        let mut idl = Idl::new();
        assert_eq!(idl.file_stem(), "idl");
        idl.parse_file_name = Some("examples/lighting-app/lighting.matter".into());
        assert_eq!(idl.file_stem(), "lighting");
    }

    #[test]
    fn test_cluster_lookup_prefers_server() {
        let mut idl = Idl::new();
        idl.clusters.push(Cluster::new(ClusterSide::Client, "OnOff", 6));
        idl.clusters.push(Cluster::new(ClusterSide::Server, "OnOff", 6));
        assert_eq!(idl.cluster_named("OnOff").map(|c| c.side), Some(ClusterSide::Server));
        assert!(idl.cluster("OnOff", ClusterSide::Client).is_some());
        assert!(idl.cluster("Basic", ClusterSide::Server).is_none());
    }
}
