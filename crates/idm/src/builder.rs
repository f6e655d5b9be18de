//! Shared AST construction
//!
//! The IDL parser and the XML front end both build fields, constants and
//! type references through this module so the same definition read from
//! either format produces identical nodes.

use crate::ast::{ApiMaturity, ConstantEntry, DataType, Field, FieldQualities};
use crate::case;
use crate::types;

/// Canonical spelling of a type name
///
/// Built-in names are matched case-insensitively and lowered (`INT16U` ->
/// `int16u`); user type names are kept as written.
pub fn normalize_type_name(raw: &str) -> String {
    let raw = raw.trim();
    let lowered = raw.to_ascii_lowercase();
    if types::is_builtin(&lowered) {
        lowered
    } else {
        raw.to_string()
    }
}

/// Canonical spelling of a ZCL XML type name
///
/// Like [`normalize_type_name`], plus the XML spellings that have no IDL
/// counterpart (`STRING`, `BOOL`, `FLOAT`).
pub fn normalize_xml_type_name(raw: &str) -> String {
    let alias = match raw.trim().to_ascii_lowercase().as_str() {
        "bool" => "boolean",
        "float" | "float_single" => "single",
        "float_double" => "double",
        "string" => "char_string",
        "octstr" => "octet_string",
        _ => return normalize_type_name(raw),
    };
    alias.to_string()
}

/// Name of a field, attribute or argument coming from a source that does not
/// follow IDL naming (`Identify Time`, `IdentifyTime` -> `identifyTime`)
pub fn normalize_member_name(raw: &str) -> String {
    case::to_lower_camel_case_with(raw.trim(), false)
}

/// Constant entry name in IDL style (`Blink` -> `kBlink`)
pub fn normalize_constant_name(raw: &str) -> String {
    let raw = raw.trim();
    let mut chars = raw.chars();
    if let (Some('k'), Some(second)) = (chars.next(), chars.next()) {
        if second.is_uppercase() || second.is_numeric() {
            return raw.to_string();
        }
    }
    format!("k{}", case::to_pascal_case_with(raw, false))
}

pub fn constant(name: impl Into<String>, code: u64) -> ConstantEntry {
    ConstantEntry {
        name: name.into(),
        code,
    }
}

/// Incremental construction of a [`Field`]
#[derive(Debug, Clone)]
pub struct FieldBuilder {
    field: Field,
}

impl FieldBuilder {
    pub fn new(name: impl Into<String>, code: u32, type_name: &str) -> Self {
        Self {
            field: Field {
                data_type: DataType::named(normalize_type_name(type_name)),
                code,
                name: name.into(),
                is_list: false,
                qualities: FieldQualities::none(),
                api_maturity: ApiMaturity::Stable,
            },
        }
    }

    pub fn list(mut self, is_list: bool) -> Self {
        self.field.is_list = is_list;
        self
    }

    pub fn nullable(mut self, nullable: bool) -> Self {
        self.field.qualities.nullable = nullable;
        self
    }

    pub fn optional(mut self, optional: bool) -> Self {
        self.field.qualities.optional = optional;
        self
    }

    pub fn fabric_sensitive(mut self, fabric_sensitive: bool) -> Self {
        self.field.qualities.fabric_sensitive = fabric_sensitive;
        self
    }

    pub fn qualities(mut self, qualities: FieldQualities) -> Self {
        self.field.qualities = qualities;
        self
    }

    /// Length bound; only meaningful for string and octet string types
    pub fn max_length(mut self, max_length: Option<u32>) -> Self {
        let is_sized = types::builtin(&self.field.data_type.name)
            .map(|k| k.is_string() || k.is_bytes())
            .unwrap_or(false);
        self.field.data_type.max_length = if is_sized { max_length } else { None };
        self
    }

    pub fn range(mut self, min_value: Option<i64>, max_value: Option<i64>) -> Self {
        self.field.data_type.min_value = min_value;
        self.field.data_type.max_value = max_value;
        self
    }

    pub fn api_maturity(mut self, api_maturity: ApiMaturity) -> Self {
        self.field.api_maturity = api_maturity;
        self
    }

    pub fn build(self) -> Field {
        self.field
    }
}

/// Parse an integer written in decimal or `0x` hex, as XML attributes do
pub fn parse_number(text: &str) -> Option<i64> {
    let text = text.trim();
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    let value = match digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
        Some(hex) => i64::from_str_radix(hex, 16).ok()?,
        None => digits.parse::<i64>().ok()?,
    };
    Some(if negative { -value } else { value })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_type_name() {
        assert_eq!(normalize_type_name("INT16U"), "int16u");
        assert_eq!(normalize_type_name("CHAR_STRING"), "char_string");
        assert_eq!(normalize_type_name("BOOLEAN"), "boolean");
        assert_eq!(normalize_type_name("IdentifyEffectIdentifier"), "IdentifyEffectIdentifier");
    }

    #[test]
    fn test_xml_aliases_only_apply_to_xml() {
        assert_eq!(normalize_xml_type_name("bool"), "boolean");
        assert_eq!(normalize_xml_type_name("STRING"), "char_string");
        assert_eq!(normalize_xml_type_name("FLOAT"), "single");
        assert_eq!(normalize_xml_type_name("INT8U"), "int8u");

        // User types may share a name with an XML alias
        assert_eq!(normalize_type_name("String"), "String");
        assert_eq!(normalize_type_name("Float"), "Float");
        assert_eq!(FieldBuilder::new("f", 0, "String").build().data_type.name, "String");
    }

    #[test]
    fn test_member_and_constant_names() {
        assert_eq!(normalize_member_name("IdentifyTime"), "identifyTime");
        assert_eq!(normalize_member_name("identify time"), "identifyTime");
        assert_eq!(normalize_member_name("identifyTime"), "identifyTime");
        assert_eq!(normalize_constant_name("Blink"), "kBlink");
        assert_eq!(normalize_constant_name("kBlink"), "kBlink");
        assert_eq!(normalize_constant_name("keep alive"), "kKeepAlive");
    }

    #[test]
    fn test_field_builder() {
        let field = FieldBuilder::new("label", 1, "CHAR_STRING")
            .max_length(Some(32))
            .nullable(true)
            .list(true)
            .build();
        assert_eq!(field.data_type.name, "char_string");
        assert_eq!(field.data_type.max_length, Some(32));
        assert!(field.is_nullable());
        assert!(field.is_list);

        let field = FieldBuilder::new("x", 0, "int8u").max_length(Some(4)).build();
        assert_eq!(field.data_type.max_length, None);
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number("0x0003"), Some(3));
        assert_eq!(parse_number(" 12 "), Some(12));
        assert_eq!(parse_number("-5"), Some(-5));
        assert_eq!(parse_number("0xFFFD"), Some(0xFFFD));
        assert_eq!(parse_number("abc"), None);
    }
}
