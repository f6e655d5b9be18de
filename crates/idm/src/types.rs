//! Built-in data types
//!
//! Everything a field may name without declaring it: sized integers,
//! booleans, floats, strings, the enum/bitmap base types and the semantic
//! typedefs used throughout the cluster catalog (`node_id`, `fabric_idx`, ...).

/// Shape of a built-in type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinKind {
    Integer { bits: u8, signed: bool },
    Boolean,
    Float { bits: u8 },
    CharString { long: bool },
    OctetString { long: bool },
    EnumBase { bits: u8 },
    BitmapBase { bits: u8 },
}

impl BuiltinKind {
    /// Width in bits of integer-like kinds (integers, enum and bitmap bases)
    pub fn bits(&self) -> Option<u8> {
        match self {
            Self::Integer { bits, .. } | Self::EnumBase { bits } | Self::BitmapBase { bits } => {
                Some(*bits)
            }
            Self::Float { bits } => Some(*bits),
            _ => None,
        }
    }

    pub fn is_string(&self) -> bool {
        matches!(self, Self::CharString { .. })
    }

    pub fn is_bytes(&self) -> bool {
        matches!(self, Self::OctetString { .. })
    }
}

const fn unsigned(bits: u8) -> BuiltinKind {
    BuiltinKind::Integer { bits, signed: false }
}

const fn signed(bits: u8) -> BuiltinKind {
    BuiltinKind::Integer { bits, signed: true }
}

static BUILTINS: &[(&str, BuiltinKind)] = &[
    ("boolean", BuiltinKind::Boolean),
    ("single", BuiltinKind::Float { bits: 32 }),
    ("double", BuiltinKind::Float { bits: 64 }),
    ("char_string", BuiltinKind::CharString { long: false }),
    ("long_char_string", BuiltinKind::CharString { long: true }),
    ("octet_string", BuiltinKind::OctetString { long: false }),
    ("long_octet_string", BuiltinKind::OctetString { long: true }),
    ("int8u", unsigned(8)),
    ("int16u", unsigned(16)),
    ("int24u", unsigned(24)),
    ("int32u", unsigned(32)),
    ("int40u", unsigned(40)),
    ("int48u", unsigned(48)),
    ("int56u", unsigned(56)),
    ("int64u", unsigned(64)),
    ("int8s", signed(8)),
    ("int16s", signed(16)),
    ("int24s", signed(24)),
    ("int32s", signed(32)),
    ("int40s", signed(40)),
    ("int48s", signed(48)),
    ("int56s", signed(56)),
    ("int64s", signed(64)),
    ("enum8", BuiltinKind::EnumBase { bits: 8 }),
    ("enum16", BuiltinKind::EnumBase { bits: 16 }),
    ("bitmap8", BuiltinKind::BitmapBase { bits: 8 }),
    ("bitmap16", BuiltinKind::BitmapBase { bits: 16 }),
    ("bitmap32", BuiltinKind::BitmapBase { bits: 32 }),
    ("bitmap64", BuiltinKind::BitmapBase { bits: 64 }),
    // Semantic typedefs
    ("action_id", unsigned(8)),
    ("attrib_id", unsigned(32)),
    ("cluster_id", unsigned(32)),
    ("command_id", unsigned(32)),
    ("data_ver", unsigned(32)),
    ("devtype_id", unsigned(32)),
    ("endpoint_no", unsigned(16)),
    ("entry_idx", unsigned(16)),
    ("event_id", unsigned(32)),
    ("event_no", unsigned(64)),
    ("fabric_id", unsigned(64)),
    ("fabric_idx", unsigned(8)),
    ("field_id", unsigned(32)),
    ("group_id", unsigned(16)),
    ("node_id", unsigned(64)),
    ("percent", unsigned(8)),
    ("percent100ths", unsigned(16)),
    ("status", unsigned(8)),
    ("trans_id", unsigned(32)),
    ("vendor_id", unsigned(16)),
    ("epoch_s", unsigned(32)),
    ("epoch_us", unsigned(64)),
    ("elapsed_s", unsigned(32)),
    ("systime_ms", unsigned(64)),
    ("systime_us", unsigned(64)),
    ("posix_ms", unsigned(64)),
    ("utc", unsigned(32)),
    ("tod", unsigned(32)),
    ("date", unsigned(32)),
    ("temperature", signed(16)),
    ("amperage_ma", signed(64)),
    ("voltage_mv", signed(64)),
    ("power_mw", signed(64)),
    ("energy_mwh", signed(64)),
    ("money", signed(64)),
    ("priority", BuiltinKind::EnumBase { bits: 8 }),
    ("tag", BuiltinKind::EnumBase { bits: 8 }),
    ("namespace", BuiltinKind::EnumBase { bits: 8 }),
    ("ipadr", BuiltinKind::OctetString { long: false }),
    ("ipv4adr", BuiltinKind::OctetString { long: false }),
    ("ipv6adr", BuiltinKind::OctetString { long: false }),
    ("ipv6pre", BuiltinKind::OctetString { long: false }),
    ("hwadr", BuiltinKind::OctetString { long: false }),
];

/// Look up a built-in type by its (IDL, lower case) name
pub fn builtin(name: &str) -> Option<BuiltinKind> {
    BUILTINS
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case(name))
        .map(|(_, kind)| *kind)
}

pub fn is_builtin(name: &str) -> bool {
    builtin(name).is_some()
}

/// Names of all built-in types, in table order
pub fn builtin_names() -> impl Iterator<Item = &'static str> {
    BUILTINS.iter().map(|(n, _)| *n)
}

/// Whether a value of type `original` is always representable as `updated`
///
/// Integers may widen within the same signedness, unsigned integers may also
/// move to a strictly wider signed type; string kinds may go from short to
/// long. Anything else must keep the same name.
pub fn is_widening(original: &str, updated: &str) -> bool {
    if original.eq_ignore_ascii_case(updated) {
        return true;
    }
    match (builtin(original), builtin(updated)) {
        (
            Some(BuiltinKind::Integer { bits: a, signed: sa }),
            Some(BuiltinKind::Integer { bits: b, signed: sb }),
        ) => (sa == sb && b >= a) || (!sa && sb && b > a),
        (Some(BuiltinKind::EnumBase { bits: a }), Some(BuiltinKind::EnumBase { bits: b })) => b >= a,
        (Some(BuiltinKind::BitmapBase { bits: a }), Some(BuiltinKind::BitmapBase { bits: b })) => {
            b >= a
        }
        (Some(BuiltinKind::Float { bits: a }), Some(BuiltinKind::Float { bits: b })) => b >= a,
        (Some(BuiltinKind::CharString { long: false }), Some(BuiltinKind::CharString { .. })) => true,
        (Some(BuiltinKind::OctetString { long: false }), Some(BuiltinKind::OctetString { .. })) => {
            true
        }
        _ => false,
    }
}
