//! Type Resolution
//!
//! Runs once after a front end has built an [`Idl`]: every type name must be
//! a built-in or a declaration visible from its use site, command payloads
//! must name structs, endpoint instantiations must name real clusters and
//! members, and codes must be unique within each cluster record.

use std::collections::HashSet;

use tracing::trace;

use crate::ast::*;
use crate::error::{IdlError, Result};
use crate::types;

struct Resolver<'a> {
    idl: &'a Idl,
}

impl<'a> Resolver<'a> {
    fn new(idl: &'a Idl) -> Self {
        Self { idl }
    }

    fn resolve(&self) -> Result<()> {
        self.check_unique_clusters()?;

        for e in &self.idl.global_enums {
            self.resolve_base_type(&e.base_type, &e.name)?;
        }
        for b in &self.idl.global_bitmaps {
            self.resolve_base_type(&b.base_type, &b.name)?;
        }
        for s in &self.idl.global_structs {
            self.resolve_fields(None, &s.fields, &s.name)?;
        }

        for cluster in &self.idl.clusters {
            self.resolve_cluster(cluster)?;
        }

        for endpoint in &self.idl.endpoints {
            self.resolve_endpoint(endpoint)?;
        }

        Ok(())
    }

    fn check_unique_clusters(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for cluster in &self.idl.clusters {
            if !seen.insert((cluster.name.as_str(), cluster.side)) {
                return Err(IdlError::duplicate(
                    &cluster.name,
                    format!("{} cluster declared more than once", cluster.side),
                ));
            }
        }
        Ok(())
    }

    fn resolve_base_type(&self, base_type: &str, owner: &str) -> Result<()> {
        if types::is_builtin(base_type) {
            Ok(())
        } else {
            Err(IdlError::resolution(base_type, format!("base type of {}", owner)))
        }
    }

    fn resolve_type(&self, cluster: Option<&Cluster>, name: &str, site: &str) -> Result<()> {
        if types::is_builtin(name)
            || self.idl.find_struct(cluster, name).is_some()
            || self.idl.find_enum(cluster, name).is_some()
            || self.idl.find_bitmap(cluster, name).is_some()
        {
            trace!(symbol = name, site, "resolved");
            Ok(())
        } else {
            Err(IdlError::resolution(name, site))
        }
    }

    fn resolve_fields(&self, cluster: Option<&Cluster>, fields: &[Field], owner: &str) -> Result<()> {
        let mut codes = HashSet::new();
        for field in fields {
            let site = format!("{}.{}", owner, field.name);
            self.resolve_type(cluster, &field.data_type.name, &site)?;
            if !codes.insert(field.code) {
                return Err(IdlError::duplicate(site, format!("field code {} reused", field.code)));
            }
        }
        Ok(())
    }

    fn resolve_cluster(&self, cluster: &Cluster) -> Result<()> {
        let name = cluster.name.as_str();

        for e in &cluster.enums {
            self.resolve_base_type(&e.base_type, &format!("{}.{}", name, e.name))?;
        }
        for b in &cluster.bitmaps {
            self.resolve_base_type(&b.base_type, &format!("{}.{}", name, b.name))?;
        }
        for s in &cluster.structs {
            self.resolve_fields(Some(cluster), &s.fields, &format!("{}.{}", name, s.name))?;
        }
        for event in &cluster.events {
            self.resolve_fields(Some(cluster), &event.fields, &format!("{}.{}", name, event.name))?;
        }

        let mut codes = HashSet::new();
        for attr in &cluster.attributes {
            let site = format!("{}.{}", name, attr.name());
            self.resolve_type(Some(cluster), &attr.definition.data_type.name, &site)?;
            if !codes.insert(attr.code()) {
                return Err(IdlError::duplicate(site, format!("attribute code 0x{:04X} reused", attr.code())));
            }
        }

        let mut codes = HashSet::new();
        for command in &cluster.commands {
            let site = format!("{}.{}", name, command.name);
            if let Some(input) = &command.input_param {
                if self.idl.find_struct(Some(cluster), input).is_none() {
                    return Err(IdlError::resolution(input, format!("request of {}", site)));
                }
            }
            if command.has_response() && self.idl.find_struct(Some(cluster), &command.output_param).is_none() {
                return Err(IdlError::resolution(&command.output_param, format!("response of {}", site)));
            }
            if !codes.insert(command.code) {
                return Err(IdlError::duplicate(site, format!("command code 0x{:02X} reused", command.code)));
            }
        }

        let mut codes = HashSet::new();
        for event in &cluster.events {
            if !codes.insert(event.code) {
                return Err(IdlError::duplicate(
                    format!("{}.{}", name, event.name),
                    format!("event code 0x{:02X} reused", event.code),
                ));
            }
        }

        Ok(())
    }

    fn resolve_endpoint(&self, endpoint: &Endpoint) -> Result<()> {
        for instance in &endpoint.server_clusters {
            let site = format!("endpoint {}", endpoint.number);
            let cluster = self
                .idl
                .cluster_named(&instance.name)
                .ok_or_else(|| IdlError::resolution(&instance.name, &site))?;

            let site = format!("endpoint {} server cluster {}", endpoint.number, instance.name);
            for attr in &instance.attributes {
                if cluster.attribute(&attr.name).is_none() {
                    return Err(IdlError::resolution(&attr.name, &site));
                }
            }
            for event in &instance.events_emitted {
                if cluster.event(event).is_none() {
                    return Err(IdlError::resolution(event, &site));
                }
            }
            for command in &instance.commands {
                if cluster.command(command).is_none() {
                    return Err(IdlError::resolution(command, &site));
                }
            }
        }
        Ok(())
    }
}

/// Check every reference in `idl`
pub fn resolve(idl: &Idl) -> Result<()> {
    Resolver::new(idl).resolve()
}
