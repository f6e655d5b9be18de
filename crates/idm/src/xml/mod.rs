//! ZCL XML Front End
//!
//! Reads the legacy XML cluster catalog into the same [`Idl`] the IDL parser
//! produces. Documents are read one by one into a [`Collected`] set and
//! merged once at the end, so cross-document references (shared types,
//! `<clusterExtension>`) resolve regardless of input order.

mod handlers;

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::ast::*;
use crate::error::{IdlError, Result};
use crate::resolve;

pub use handlers::{read_requirements, ClusterRequirements};

/// A named XML document
#[derive(Debug, Clone)]
pub struct XmlSource {
    name: String,
    text: String,
}

impl XmlSource {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
        }
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| IdlError::storage(path, e))?;
        Ok(Self::new(path.display().to_string(), text))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    fn parse(&self) -> Result<roxmltree::Document<'_>> {
        roxmltree::Document::parse(&self.text)
            .map_err(|e| IdlError::xml(&self.name, e.pos().row as usize, e.to_string()))
    }
}

/// Where an element was read from
#[derive(Debug, Clone)]
pub(crate) struct Origin {
    pub source: String,
    pub line: usize,
}

impl std::fmt::Display for Origin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.source, self.line)
    }
}

/// Attributes, commands and events of a cluster or cluster extension
#[derive(Debug, Default)]
pub(crate) struct Members {
    pub attributes: Vec<Attribute>,
    pub commands: Vec<Command>,
    pub structs: Vec<Struct>,
    pub events: Vec<Event>,
}

impl Members {
    fn apply(self, cluster: &mut Cluster) {
        cluster.attributes.extend(self.attributes);
        cluster.commands.extend(self.commands);
        cluster.structs.extend(self.structs);
        cluster.events.extend(self.events);
    }
}

#[derive(Debug)]
pub(crate) enum TypeDecl {
    Struct(Struct),
    Enum(Enum),
    Bitmap(Bitmap),
}

impl TypeDecl {
    fn name(&self) -> &str {
        match self {
            TypeDecl::Struct(s) => &s.name,
            TypeDecl::Enum(e) => &e.name,
            TypeDecl::Bitmap(b) => &b.name,
        }
    }
}

/// A type declaration together with the codes of the clusters using it
#[derive(Debug)]
pub(crate) struct TypeEntry {
    pub decl: TypeDecl,
    pub cluster_codes: Vec<u32>,
    pub origin: Origin,
}

#[derive(Debug)]
pub(crate) struct Extension {
    pub code: u32,
    pub members: Members,
    pub origin: Origin,
}

/// Everything read from all documents, before merging
#[derive(Debug, Default)]
pub(crate) struct Collected {
    pub clusters: Vec<(Cluster, Origin)>,
    pub extensions: Vec<Extension>,
    pub types: Vec<TypeEntry>,
}

impl Collected {
    fn merge(self, file_name: Option<String>) -> Result<Idl> {
        let mut idl = Idl::new();
        idl.parse_file_name = file_name;

        for (cluster, origin) in self.clusters {
            if let Some(existing) = idl
                .clusters
                .iter()
                .find(|c| c.code == cluster.code || c.name == cluster.name)
            {
                return Err(IdlError::duplicate(
                    &cluster.name,
                    format!(
                        "cluster 0x{:04X} at {} collides with {} (0x{:04X})",
                        cluster.code, origin, existing.name, existing.code
                    ),
                ));
            }
            idl.clusters.push(cluster);
        }

        for ext in self.extensions {
            let cluster = find_cluster_mut(&mut idl, ext.code, &ext.origin, "clusterExtension")?;
            ext.members.apply(cluster);
        }

        for entry in self.types {
            match entry.cluster_codes.as_slice() {
                [code] => {
                    let cluster = find_cluster_mut(&mut idl, *code, &entry.origin, entry.decl.name())?;
                    add_cluster_type(cluster, entry.decl, &entry.origin)?;
                }
                // Unscoped or shared by several clusters
                _ => add_global_type(&mut idl, entry.decl, &entry.origin)?,
            }
        }

        Ok(idl)
    }
}

fn find_cluster_mut<'a>(idl: &'a mut Idl, code: u32, origin: &Origin, user: &str) -> Result<&'a mut Cluster> {
    idl.clusters
        .iter_mut()
        .find(|c| c.code == code)
        .ok_or_else(|| IdlError::resolution(format!("cluster 0x{:04X}", code), format!("{} at {}", user, origin)))
}

fn add_cluster_type(cluster: &mut Cluster, decl: TypeDecl, origin: &Origin) -> Result<()> {
    let name = decl.name();
    if cluster.struct_named(name).is_some()
        || cluster.enum_named(name).is_some()
        || cluster.bitmap_named(name).is_some()
    {
        return Err(IdlError::duplicate(
            format!("{}.{}", cluster.name, name),
            format!("type redeclared at {}", origin),
        ));
    }
    match decl {
        TypeDecl::Struct(s) => cluster.structs.push(s),
        TypeDecl::Enum(e) => cluster.enums.push(e),
        TypeDecl::Bitmap(b) => cluster.bitmaps.push(b),
    }
    Ok(())
}

fn add_global_type(idl: &mut Idl, decl: TypeDecl, origin: &Origin) -> Result<()> {
    let name = decl.name();
    if idl.find_struct(None, name).is_some()
        || idl.find_enum(None, name).is_some()
        || idl.find_bitmap(None, name).is_some()
    {
        return Err(IdlError::duplicate(name, format!("global type redeclared at {}", origin)));
    }
    match decl {
        TypeDecl::Struct(s) => idl.global_structs.push(s),
        TypeDecl::Enum(e) => idl.global_enums.push(e),
        TypeDecl::Bitmap(b) => idl.global_bitmaps.push(b),
    }
    Ok(())
}

/// Parse and merge XML documents into a resolved [`Idl`]
pub fn parse_xmls(sources: &[XmlSource]) -> Result<Idl> {
    let mut collected = Collected::default();

    for source in sources {
        let doc = source.parse()?;
        handlers::DocumentReader::new(source.name(), &doc).read(&mut collected)?;
        debug!(
            source = source.name(),
            clusters = collected.clusters.len(),
            "read XML document"
        );
    }

    let idl = collected.merge(sources.first().map(|s| s.name.clone()))?;
    resolve::resolve(&idl)?;

    debug!(clusters = idl.clusters.len(), sources = sources.len(), "merged XML documents");
    Ok(idl)
}
