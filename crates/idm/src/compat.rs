//! Backwards Compatibility
//!
//! Compares an original model against an updated one. Everything present in
//! the original must still exist in the update with the same code and a
//! type that can represent every original value; additions are always
//! allowed. Every violation is reported, the check never stops early.

use tracing::debug;

use crate::ast::*;
use crate::diagnostic::{Diagnostic, SourceLocation};
use crate::types;

/// Nesting limit when comparing differently named types structurally
const MAX_TYPE_DEPTH: usize = 16;

/// Outcome of a compatibility check
#[derive(Debug, Clone, Default)]
pub struct CompatibilityReport {
    pub diagnostics: Vec<Diagnostic>,
}

impl CompatibilityReport {
    pub fn is_compatible(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

/// Types visible from one cluster of one model
#[derive(Clone, Copy)]
struct Scope<'a> {
    idl: &'a Idl,
    cluster: Option<&'a Cluster>,
}

impl<'a> Scope<'a> {
    fn global(idl: &'a Idl) -> Self {
        Self { idl, cluster: None }
    }

    fn cluster(idl: &'a Idl, cluster: &'a Cluster) -> Self {
        Self {
            idl,
            cluster: Some(cluster),
        }
    }
}

fn max_length_compatible(original: Option<u32>, updated: Option<u32>) -> bool {
    match (original, updated) {
        (_, None) => true,
        (None, Some(_)) => false,
        (Some(a), Some(b)) => b >= a,
    }
}

fn struct_code(code: Option<u32>) -> String {
    code.map(|c| format!("0x{:02X}", c)).unwrap_or_else(|| "none".to_string())
}

fn entries_compatible(original: &[ConstantEntry], updated: &[ConstantEntry]) -> bool {
    original
        .iter()
        .all(|o| updated.iter().any(|u| u.name == o.name && u.code == o.code))
}

/// Whether values of `original` (seen from `from`) fit `updated` (seen from `to`)
fn types_compatible(original: &str, updated: &str, from: Scope, to: Scope, depth: usize) -> bool {
    if types::is_builtin(original) || types::is_builtin(updated) {
        return types::is_widening(original, updated);
    }
    if original == updated {
        // Same-named declarations are compared where they are declared
        return true;
    }
    if depth >= MAX_TYPE_DEPTH {
        return false;
    }

    if let (Some(o), Some(u)) = (
        from.idl.find_enum(from.cluster, original),
        to.idl.find_enum(to.cluster, updated),
    ) {
        return types::is_widening(&o.base_type, &u.base_type) && entries_compatible(&o.entries, &u.entries);
    }
    if let (Some(o), Some(u)) = (
        from.idl.find_bitmap(from.cluster, original),
        to.idl.find_bitmap(to.cluster, updated),
    ) {
        return types::is_widening(&o.base_type, &u.base_type) && entries_compatible(&o.entries, &u.entries);
    }
    if let (Some(o), Some(u)) = (
        from.idl.find_struct(from.cluster, original),
        to.idl.find_struct(to.cluster, updated),
    ) {
        return o.fields.iter().all(|of| {
            u.field(&of.name).is_some_and(|uf| {
                uf.code == of.code
                    && uf.is_list == of.is_list
                    && uf.qualities == of.qualities
                    && max_length_compatible(of.data_type.max_length, uf.data_type.max_length)
                    && types_compatible(&of.data_type.name, &uf.data_type.name, from, to, depth + 1)
            })
        });
    }
    false
}

struct Checker<'a> {
    original: &'a Idl,
    updated: &'a Idl,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> Checker<'a> {
    fn new(original: &'a Idl, updated: &'a Idl) -> Self {
        Self {
            original,
            updated,
            diagnostics: Vec::new(),
        }
    }

    fn report(&mut self, meta: Option<ParseMeta>, message: String) {
        let location = SourceLocation::from_meta(self.original.parse_file_name.as_deref(), meta);
        self.diagnostics.push(Diagnostic::error(message).at(location));
    }

    fn check(mut self) -> Vec<Diagnostic> {
        let (original, updated) = (self.original, self.updated);

        self.check_enums(&original.global_enums, &updated.global_enums, "");
        self.check_bitmaps(&original.global_bitmaps, &updated.global_bitmaps, "");
        self.check_structs(
            &original.global_structs,
            &updated.global_structs,
            "",
            Scope::global(original),
            Scope::global(updated),
        );

        for cluster in &original.clusters {
            match updated.cluster(&cluster.name, cluster.side) {
                Some(other) => self.check_cluster(cluster, other),
                None => self.report(
                    cluster.parse_meta,
                    format!("Cluster {} ({}) was removed", cluster.name, cluster.side),
                ),
            }
        }

        self.diagnostics
    }

    fn check_cluster(&mut self, original: &Cluster, updated: &Cluster) {
        let name = original.name.as_str();
        let meta = original.parse_meta;
        let from = Scope::cluster(self.original, original);
        let to = Scope::cluster(self.updated, updated);

        if original.code != updated.code {
            self.report(
                meta,
                format!(
                    "Cluster {} code changed from 0x{:04X} to 0x{:04X}",
                    name, original.code, updated.code
                ),
            );
        }

        let prefix = format!("{}.", name);
        self.check_enums(&original.enums, &updated.enums, &prefix);
        self.check_bitmaps(&original.bitmaps, &updated.bitmaps, &prefix);
        self.check_structs(&original.structs, &updated.structs, &prefix, from, to);

        for attr in &original.attributes {
            let location = format!("{}.{}", name, attr.name());
            let Some(other) = updated.attribute(attr.name()) else {
                self.report(attr.parse_meta.or(meta), format!("Attribute {} was removed", location));
                continue;
            };
            if !other.qualities.writable && attr.qualities.writable {
                self.report(attr.parse_meta.or(meta), format!("Attribute {} is no longer writable", location));
            }
            self.check_field(&location, &attr.definition, &other.definition, from, to);
        }

        for command in &original.commands {
            let location = format!("{}.{}", name, command.name);
            let Some(other) = updated.command(&command.name) else {
                self.report(meta, format!("Command {} was removed", location));
                continue;
            };
            if command.code != other.code {
                self.report(
                    meta,
                    format!(
                        "Command {} code changed from 0x{:02X} to 0x{:02X}",
                        location, command.code, other.code
                    ),
                );
            }

            // Request fields are reported under the command they belong to
            self.check_fields(
                &location,
                original.input_fields(command),
                updated.input_fields(other),
                from,
                to,
            );

            if command.has_response() {
                if !other.has_response() {
                    self.report(
                        meta,
                        format!("Command {} no longer returns {}", location, command.output_param),
                    );
                } else if !types_compatible(&command.output_param, &other.output_param, from, to, 0) {
                    self.report(
                        meta,
                        format!(
                            "Command {} response changed from {} to {}",
                            location, command.output_param, other.output_param
                        ),
                    );
                }
            }
        }

        for event in &original.events {
            let location = format!("{}.{}", name, event.name);
            let Some(other) = updated.event(&event.name) else {
                self.report(meta, format!("Event {} was removed", location));
                continue;
            };
            if event.code != other.code {
                self.report(
                    meta,
                    format!("Event {} code changed from 0x{:02X} to 0x{:02X}", location, event.code, other.code),
                );
            }
            self.check_fields(&location, &event.fields, &other.fields, from, to);
        }
    }

    fn check_enums(&mut self, original: &[Enum], updated: &[Enum], prefix: &str) {
        for e in original {
            match updated.iter().find(|u| u.name == e.name) {
                Some(u) => self.check_entries("Enum", prefix, &e.name, &e.base_type, &e.entries, &u.base_type, &u.entries),
                None => self.report(None, format!("Enum {}{} was removed", prefix, e.name)),
            }
        }
    }

    fn check_bitmaps(&mut self, original: &[Bitmap], updated: &[Bitmap], prefix: &str) {
        for b in original {
            match updated.iter().find(|u| u.name == b.name) {
                Some(u) => self.check_entries("Bitmap", prefix, &b.name, &b.base_type, &b.entries, &u.base_type, &u.entries),
                None => self.report(None, format!("Bitmap {}{} was removed", prefix, b.name)),
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn check_entries(
        &mut self,
        kind: &str,
        prefix: &str,
        name: &str,
        original_base: &str,
        original: &[ConstantEntry],
        updated_base: &str,
        updated: &[ConstantEntry],
    ) {
        if !types::is_widening(original_base, updated_base) {
            self.report(
                None,
                format!(
                    "{} {}{} base type changed from {} to {}",
                    kind, prefix, name, original_base, updated_base
                ),
            );
        }
        for entry in original {
            match updated.iter().find(|u| u.name == entry.name) {
                None => self.report(None, format!("{} {}{} entry {} was removed", kind, prefix, name, entry.name)),
                Some(u) if u.code != entry.code => self.report(
                    None,
                    format!(
                        "{} {}{} entry {} code changed from {} to {}",
                        kind, prefix, name, entry.name, entry.code, u.code
                    ),
                ),
                Some(_) => {}
            }
        }
    }

    /// Plain and response structs; request structs are checked through
    /// their commands
    fn check_structs(&mut self, original: &[Struct], updated: &[Struct], prefix: &str, from: Scope, to: Scope) {
        for s in original {
            if s.tag == Some(StructTag::Request) {
                continue;
            }
            let location = format!("{}{}", prefix, s.name);
            let Some(u) = updated.iter().find(|u| u.name == s.name) else {
                self.report(None, format!("Struct {} was removed", location));
                continue;
            };
            if s.code != u.code {
                self.report(
                    None,
                    format!(
                        "Struct {} code changed from {} to {}",
                        location,
                        struct_code(s.code),
                        struct_code(u.code)
                    ),
                );
            }
            self.check_fields(&location, &s.fields, &u.fields, from, to);
        }
    }

    fn check_fields(&mut self, location: &str, original: &[Field], updated: &[Field], from: Scope, to: Scope) {
        for field in original {
            let location = format!("{}.{}", location, field.name);
            match updated.iter().find(|u| u.name == field.name) {
                Some(u) => self.check_field(&location, field, u, from, to),
                None => self.report(None, format!("Field {} was removed", location)),
            }
        }
    }

    fn check_field(&mut self, location: &str, original: &Field, updated: &Field, from: Scope, to: Scope) {
        if original.code != updated.code {
            self.report(
                None,
                format!("{} code changed from {} to {}", location, original.code, updated.code),
            );
        }
        if original.is_list != updated.is_list {
            self.report(None, format!("{} changed list-ness", location));
        }
        if original.qualities.nullable != updated.qualities.nullable {
            self.report(None, format!("{} changed nullability", location));
        }
        if original.qualities.optional != updated.qualities.optional {
            self.report(None, format!("{} changed optionality", location));
        }

        let (o, u) = (&original.data_type, &updated.data_type);
        if !types_compatible(&o.name, &u.name, from, to, 0) {
            self.report(None, format!("{} changed type from {} to {}", location, o.name, u.name));
        } else if !max_length_compatible(o.max_length, u.max_length) {
            self.report(
                None,
                format!(
                    "{} max length shrank from {} to {}",
                    location,
                    o.max_length.map(|l| l.to_string()).unwrap_or_else(|| "unbounded".into()),
                    u.max_length.map(|l| l.to_string()).unwrap_or_else(|| "unbounded".into()),
                ),
            );
        }
    }
}

/// Check that `updated` can replace `original`
pub fn check_compatibility(original: &Idl, updated: &Idl) -> CompatibilityReport {
    let diagnostics = Checker::new(original, updated).check();
    debug!(violations = diagnostics.len(), "compatibility check finished");
    CompatibilityReport { diagnostics }
}

/// `(true, [])` when `updated` is backwards compatible with `original`
pub fn is_backwards_compatible(original: &Idl, updated: &Idl) -> (bool, Vec<Diagnostic>) {
    let report = check_compatibility(original, updated);
    (report.is_compatible(), report.diagnostics)
}
