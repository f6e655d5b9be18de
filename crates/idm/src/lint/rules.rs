//! Lint rule implementations

use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::ast::*;
use crate::diagnostic::{Diagnostic, SourceLocation};
use crate::xml::ClusterRequirements;

use super::LintRule;

fn location(idl: &Idl, meta: Option<ParseMeta>) -> Option<SourceLocation> {
    SourceLocation::from_meta(idl.parse_file_name.as_deref(), meta)
}

/// Code of an instantiated attribute, looked up in its cluster definition
fn instantiated_attribute_codes(idl: &Idl, instance: &ServerClusterInstantiation) -> HashSet<u32> {
    let Some(cluster) = idl.cluster_named(&instance.name) else {
        return HashSet::new();
    };
    instance
        .attributes
        .iter()
        .filter_map(|a| cluster.attribute(&a.name))
        .map(Attribute::code)
        .collect()
}

/// Mandatory attributes and commands of clusters loaded from XML
#[derive(Debug)]
pub struct MandatoryElementsRule {
    source_name: String,
    clusters: HashMap<u32, ClusterRequirements>,
}

impl MandatoryElementsRule {
    pub fn new(source_name: impl Into<String>, clusters: Vec<ClusterRequirements>) -> Self {
        Self {
            source_name: source_name.into(),
            clusters: clusters.into_iter().map(|c| (c.code, c)).collect(),
        }
    }
}

impl LintRule for MandatoryElementsRule {
    fn name(&self) -> &str {
        &self.source_name
    }

    fn check(&self, idl: &Idl) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();

        for endpoint in &idl.endpoints {
            for instance in &endpoint.server_clusters {
                let Some(cluster) = idl.cluster_named(&instance.name) else {
                    continue;
                };
                let Some(required) = self.clusters.get(&cluster.code) else {
                    continue;
                };
                let loc = location(idl, instance.parse_meta);

                let present = instantiated_attribute_codes(idl, instance);
                for (code, name) in &required.attributes {
                    if !present.contains(code) {
                        diagnostics.push(
                            Diagnostic::error(format!(
                                "EP{}: {} is missing mandatory attribute {} (0x{:04X})",
                                endpoint.number, cluster.name, name, code
                            ))
                            .at(loc.clone()),
                        );
                    }
                }

                let handled: HashSet<u32> = instance
                    .commands
                    .iter()
                    .filter_map(|c| cluster.command(c))
                    .map(|c| c.code)
                    .collect();
                for (code, name) in &required.commands {
                    if !handled.contains(code) {
                        diagnostics.push(
                            Diagnostic::error(format!(
                                "EP{}: {} does not handle mandatory command {} (0x{:02X})",
                                endpoint.number, cluster.name, name, code
                            ))
                            .at(loc.clone()),
                        );
                    }
                }
            }
        }

        diagnostics
    }
}

/// Every instantiated server cluster must carry a global attribute
#[derive(Debug)]
pub struct RequiredGlobalAttributeRule {
    name: String,
    attribute: String,
    code: u32,
}

impl RequiredGlobalAttributeRule {
    pub fn new(attribute: impl Into<String>, code: u32) -> Self {
        let attribute = attribute.into();
        Self {
            name: format!("required global attribute {}", attribute),
            attribute,
            code,
        }
    }
}

impl LintRule for RequiredGlobalAttributeRule {
    fn name(&self) -> &str {
        &self.name
    }

    fn check(&self, idl: &Idl) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        for endpoint in &idl.endpoints {
            for instance in &endpoint.server_clusters {
                if !instantiated_attribute_codes(idl, instance).contains(&self.code) {
                    diagnostics.push(
                        Diagnostic::error(format!(
                            "EP{}: {} does not expose global attribute {} (0x{:04X})",
                            endpoint.number, instance.name, self.attribute, self.code
                        ))
                        .at(location(idl, instance.parse_meta)),
                    );
                }
            }
        }
        diagnostics
    }
}

/// A server cluster named in a rule file, by name or by code
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClusterRef {
    Name(String),
    Code(u32),
}

impl ClusterRef {
    fn matches(&self, idl: &Idl, instance: &ServerClusterInstantiation) -> bool {
        match self {
            ClusterRef::Name(name) => instance.name == *name,
            ClusterRef::Code(code) => idl
                .cluster_named(&instance.name)
                .map(|c| c.code == *code)
                .unwrap_or(false),
        }
    }
}

impl fmt::Display for ClusterRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClusterRef::Name(name) => f.write_str(name),
            ClusterRef::Code(code) => write!(f, "0x{:04X}", code),
        }
    }
}

/// An endpoint must instantiate a server cluster
#[derive(Debug)]
pub struct ClusterRequirementRule {
    name: String,
    endpoint: u16,
    cluster: ClusterRef,
}

impl ClusterRequirementRule {
    pub fn new(endpoint: u16, cluster: ClusterRef) -> Self {
        Self {
            name: format!("endpoint {} requires {}", endpoint, cluster),
            endpoint,
            cluster,
        }
    }
}

impl LintRule for ClusterRequirementRule {
    fn name(&self) -> &str {
        &self.name
    }

    fn check(&self, idl: &Idl) -> Vec<Diagnostic> {
        let Some(endpoint) = idl.endpoints.iter().find(|e| e.number == self.endpoint) else {
            return vec![Diagnostic::error(format!(
                "EP{}: endpoint not found, cannot require server cluster {}",
                self.endpoint, self.cluster
            ))];
        };

        if endpoint
            .server_clusters
            .iter()
            .any(|c| self.cluster.matches(idl, c))
        {
            Vec::new()
        } else {
            vec![Diagnostic::error(format!(
                "EP{}: required server cluster {} is not instantiated",
                self.endpoint, self.cluster
            ))
            .at(location(idl, endpoint.parse_meta))]
        }
    }
}

/// An endpoint must not instantiate a server cluster
#[derive(Debug)]
pub struct ClusterRejectionRule {
    name: String,
    endpoint: u16,
    cluster: ClusterRef,
}

impl ClusterRejectionRule {
    pub fn new(endpoint: u16, cluster: ClusterRef) -> Self {
        Self {
            name: format!("endpoint {} rejects {}", endpoint, cluster),
            endpoint,
            cluster,
        }
    }
}

impl LintRule for ClusterRejectionRule {
    fn name(&self) -> &str {
        &self.name
    }

    fn check(&self, idl: &Idl) -> Vec<Diagnostic> {
        idl.endpoints
            .iter()
            .filter(|e| e.number == self.endpoint)
            .flat_map(|e| e.server_clusters.iter())
            .filter(|c| self.cluster.matches(idl, c))
            .map(|c| {
                Diagnostic::error(format!(
                    "EP{}: server cluster {} must not be instantiated",
                    self.endpoint, c.name
                ))
                .at(location(idl, c.parse_meta))
            })
            .collect()
    }
}

/// Attribute, command and event codes are unique per cluster, cluster codes
/// are unique per name
#[derive(Debug, Default)]
pub struct UniqueCodesRule;

fn duplicates<'a>(items: impl Iterator<Item = (u32, &'a str)>) -> Vec<(u32, &'a str)> {
    let mut seen = HashSet::new();
    items.filter(|(code, _)| !seen.insert(*code)).collect()
}

impl LintRule for UniqueCodesRule {
    fn name(&self) -> &str {
        "unique-codes"
    }

    fn check(&self, idl: &Idl) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();

        for cluster in &idl.clusters {
            let loc = location(idl, cluster.parse_meta);
            let groups = [
                ("attribute", duplicates(cluster.attributes.iter().map(|a| (a.code(), a.name())))),
                ("command", duplicates(cluster.commands.iter().map(|c| (c.code, c.name.as_str())))),
                ("event", duplicates(cluster.events.iter().map(|e| (e.code, e.name.as_str())))),
            ];
            for (kind, dups) in groups {
                for (code, name) in dups {
                    diagnostics.push(
                        Diagnostic::error(format!(
                            "{}: {} {} reuses code 0x{:04X}",
                            cluster.name, kind, name, code
                        ))
                        .at(loc.clone()),
                    );
                }
            }
        }

        let mut by_code: HashMap<u32, &str> = HashMap::new();
        for cluster in &idl.clusters {
            match by_code.get(&cluster.code) {
                Some(other) if *other != cluster.name => diagnostics.push(
                    Diagnostic::error(format!(
                        "clusters {} and {} share code 0x{:04X}",
                        other, cluster.name, cluster.code
                    ))
                    .at(location(idl, cluster.parse_meta)),
                ),
                Some(_) => {}
                None => {
                    by_code.insert(cluster.code, &cluster.name);
                }
            }
        }

        diagnostics
    }
}

/// Every instantiated or bound cluster has a definition
#[derive(Debug, Default)]
pub struct DefinedClustersRule;

impl LintRule for DefinedClustersRule {
    fn name(&self) -> &str {
        "defined-clusters"
    }

    fn check(&self, idl: &Idl) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        for endpoint in &idl.endpoints {
            for instance in &endpoint.server_clusters {
                if idl.cluster(&instance.name, ClusterSide::Server).is_none() {
                    diagnostics.push(
                        Diagnostic::error(format!(
                            "EP{}: server cluster {} has no server definition",
                            endpoint.number, instance.name
                        ))
                        .at(location(idl, instance.parse_meta)),
                    );
                }
            }
            for binding in &endpoint.client_bindings {
                if idl.cluster_named(binding).is_none() {
                    diagnostics.push(
                        Diagnostic::error(format!(
                            "EP{}: binding to undefined cluster {}",
                            endpoint.number, binding
                        ))
                        .at(location(idl, endpoint.parse_meta)),
                    );
                }
            }
        }
        diagnostics
    }
}

/// Cluster types nothing refers to
#[derive(Debug, Default)]
pub struct UnusedTypesRule;

fn referenced_types(cluster: &Cluster) -> HashSet<&str> {
    let fields = cluster
        .structs
        .iter()
        .flat_map(|s| s.fields.iter())
        .chain(cluster.events.iter().flat_map(|e| e.fields.iter()))
        .chain(cluster.attributes.iter().map(|a| &a.definition));

    let mut used: HashSet<&str> = fields.map(|f| f.data_type.name.as_str()).collect();
    for command in &cluster.commands {
        used.extend(command.input_param.as_deref());
        used.insert(&command.output_param);
    }
    used
}

impl LintRule for UnusedTypesRule {
    fn name(&self) -> &str {
        "unused-types"
    }

    fn check(&self, idl: &Idl) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        for cluster in &idl.clusters {
            let used = referenced_types(cluster);
            let declared = cluster
                .structs
                .iter()
                .map(|s| s.name.as_str())
                .chain(cluster.enums.iter().map(|e| e.name.as_str()))
                .chain(
                    cluster
                        .bitmaps
                        .iter()
                        .filter(|b| b.name != "Feature")
                        .map(|b| b.name.as_str()),
                );
            for name in declared {
                if !used.contains(name) {
                    diagnostics.push(
                        Diagnostic::warning(format!("{}: type {} is never used", cluster.name, name))
                            .at(location(idl, cluster.parse_meta)),
                    );
                }
            }
        }
        diagnostics
    }
}

/// Names accepted by `rule "<name>";`
pub const BUILTIN_RULES: &[&str] = &["unique-codes", "defined-clusters", "unused-types"];

pub fn builtin_rule(name: &str) -> Option<Box<dyn LintRule>> {
    match name {
        "unique-codes" => Some(Box::new(UniqueCodesRule)),
        "defined-clusters" => Some(Box::new(DefinedClustersRule)),
        "unused-types" => Some(Box::new(UnusedTypesRule)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::Severity;
    use crate::parser;

    const APP: &str = r#"
        server cluster Descriptor = 29 {
            readonly attribute int16u clusterRevision = 65533;
        }
        server cluster OnOff = 6 {
            enum DelayedAllOffEffectVariantEnum : enum8 { kFadeToOffIn0p8Seconds = 0; }
            attribute boolean onOff = 0;
            readonly attribute bitmap32 featureMap = 65532;
            command Off(): DefaultSuccess = 0;
            command On(): DefaultSuccess = 1;
        }
        endpoint 0 {
            server cluster Descriptor {
                callback attribute clusterRevision;
            }
        }
        endpoint 1 {
            binding cluster OnOff;
            server cluster OnOff {
                ram attribute onOff default = 0;
                ram attribute featureMap default = 1;
                handle command Off;
            }
        }
    "#;

    fn app() -> Idl {
        parser::parse(APP, "app.matter").unwrap()
    }

    #[test]
    fn test_mandatory_elements() {
        let rule = MandatoryElementsRule::new(
            "onoff.xml",
            vec![ClusterRequirements {
                name: "OnOff".into(),
                code: 6,
                attributes: vec![(0, "onOff".into())],
                commands: vec![(0, "Off".into()), (1, "On".into())],
            }],
        );
        let diagnostics = rule.check(&app());
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].message.contains("mandatory command On"));
        assert_eq!(diagnostics[0].location.as_ref().map(|l| l.line), Some(19));
    }

    #[test]
    fn test_required_global_attribute() {
        let rule = RequiredGlobalAttributeRule::new("featureMap", 0xFFFC);
        let diagnostics = rule.check(&app());
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].message.starts_with("EP0: Descriptor"));
    }

    #[test]
    fn test_cluster_requirement_and_rejection() {
        let idl = app();
        assert!(ClusterRequirementRule::new(0, ClusterRef::Name("Descriptor".into())).check(&idl).is_empty());
        assert_eq!(ClusterRequirementRule::new(0, ClusterRef::Code(6)).check(&idl).len(), 1);
        assert_eq!(ClusterRequirementRule::new(7, ClusterRef::Code(6)).check(&idl).len(), 1);
        assert_eq!(ClusterRejectionRule::new(1, ClusterRef::Code(6)).check(&idl).len(), 1);
        assert!(ClusterRejectionRule::new(0, ClusterRef::Name("OnOff".into())).check(&idl).is_empty());
    }

    #[test]
    fn test_builtin_rules() {
        let idl = app();
        assert!(UniqueCodesRule.check(&idl).is_empty());
        assert!(DefinedClustersRule.check(&idl).is_empty());

        let unused = UnusedTypesRule.check(&idl);
        assert_eq!(unused.len(), 1);
        assert_eq!(unused[0].severity, Severity::Warning);
        assert!(unused[0].message.contains("DelayedAllOffEffectVariantEnum"));
    }

    #[test]
    fn test_unique_codes_on_unresolved_model() {
        let idl = parser::parse_unresolved(
            "server cluster A = 1 { attribute int8u x = 0; attribute int8u y = 0; } server cluster B = 1 { }",
            "dup.matter",
        )
        .unwrap();
        let diagnostics = UniqueCodesRule.check(&idl);
        assert_eq!(diagnostics.len(), 2);
        assert!(diagnostics[0].message.contains("attribute y"));
        assert!(diagnostics[1].message.contains("share code"));
    }

    #[test]
    fn test_builtin_lookup() {
        for name in BUILTIN_RULES {
            assert_eq!(builtin_rule(name).map(|r| r.name().to_string()).as_deref(), Some(*name));
        }
        assert!(builtin_rule("no-such-rule").is_none());
    }
}
