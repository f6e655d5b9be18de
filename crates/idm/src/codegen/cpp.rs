//! C++ spellings shared by the bridge and SDK generators

use crate::ast::{AccessPrivilege, Cluster, DataType, Field, Idl};
use crate::types::{self, BuiltinKind};

fn integer_type(bits: u8, signed: bool) -> String {
    let width = match bits {
        0..=8 => 8,
        9..=16 => 16,
        17..=32 => 32,
        _ => 64,
    };
    if signed {
        format!("int{}_t", width)
    } else {
        format!("uint{}_t", width)
    }
}

fn builtin_type(kind: BuiltinKind) -> String {
    match kind {
        BuiltinKind::Integer { bits, signed } => integer_type(bits, signed),
        BuiltinKind::EnumBase { bits } | BuiltinKind::BitmapBase { bits } => integer_type(bits, false),
        BuiltinKind::Boolean => "bool".to_string(),
        BuiltinKind::Float { bits: 32 } => "float".to_string(),
        BuiltinKind::Float { .. } => "double".to_string(),
        BuiltinKind::CharString { .. } => "chip::CharSpan".to_string(),
        BuiltinKind::OctetString { .. } => "chip::ByteSpan".to_string(),
    }
}

/// Type of a value of `data_type` as seen from `cluster`
pub(crate) fn value_type(idl: &Idl, cluster: Option<&Cluster>, data_type: &DataType) -> String {
    let name = data_type.name.as_str();
    if let Some(kind) = types::builtin(name) {
        return builtin_type(kind);
    }
    // Cluster declarations shadow global ones
    let declaring = cluster.filter(|c| {
        c.struct_named(name).is_some() || c.enum_named(name).is_some() || c.bitmap_named(name).is_some()
    });
    let scope = match declaring {
        Some(c) => format!("chip::app::Clusters::{}::", c.name),
        None => "chip::app::Clusters::Globals::".to_string(),
    };
    if idl.find_struct(cluster, name).is_some() {
        format!("{}Structs::{}::Type", scope, name)
    } else if idl.find_bitmap(cluster, name).is_some() {
        format!("chip::BitMask<{}{}>", scope, name)
    } else {
        format!("{}{}", scope, name)
    }
}

/// Full field type, with list, nullable and optional wrappers
pub(crate) fn field_type(idl: &Idl, cluster: Option<&Cluster>, field: &Field) -> String {
    let mut ty = value_type(idl, cluster, &field.data_type);
    if field.is_list {
        ty = format!("chip::app::DataModel::List<const {}>", ty);
    }
    if field.is_nullable() {
        ty = format!("chip::app::DataModel::Nullable<{}>", ty);
    }
    if field.is_optional() {
        ty = format!("chip::Optional<{}>", ty);
    }
    ty
}

pub(crate) fn privilege(privilege: AccessPrivilege) -> &'static str {
    match privilege {
        AccessPrivilege::View => "kView",
        AccessPrivilege::Operate => "kOperate",
        AccessPrivilege::Manage => "kManage",
        AccessPrivilege::Administer => "kAdminister",
    }
}

/// `a | b | c`, or `0` for no flags
pub(crate) fn flags(flags: &[&str]) -> String {
    if flags.is_empty() {
        "0".to_string()
    } else {
        flags.join(" | ")
    }
}
