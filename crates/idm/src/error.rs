//! IDM toolchain errors

use std::path::PathBuf;

use thiserror::Error;

/// Source location for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn at(pos: usize) -> Self {
        Self { start: pos, end: pos }
    }
}

/// 1-based line and column of a byte offset in `text`.
pub fn line_col(text: &str, offset: usize) -> (usize, usize) {
    let offset = offset.min(text.len());
    let before = &text[..offset];
    let line = before.matches('\n').count() + 1;
    let column = match before.rfind('\n') {
        Some(nl) => before[nl + 1..].chars().count() + 1,
        None => before.chars().count() + 1,
    };
    (line, column)
}

/// Errors produced by the IDM toolchain
#[derive(Debug, Error)]
pub enum IdlError {
    /// Malformed IDL (or rule file) syntax
    #[error("{file}:{line}:{column}: parse error: {message}")]
    Parse {
        file: String,
        line: usize,
        column: usize,
        message: String,
    },

    /// Malformed XML or a ZCL schema-convention violation
    #[error("{source_name}:{line}: XML error: {message}")]
    XmlParse {
        source_name: String,
        line: usize,
        message: String,
    },

    /// Dangling type, response or cluster reference
    #[error("unresolved symbol `{symbol}` used by {site}")]
    Resolution { symbol: String, site: String },

    /// Colliding definitions (cluster id/name across sources, codes within a cluster)
    #[error("duplicate definition: {name} ({detail})")]
    DuplicateDefinition { name: String, detail: String },

    /// No generator registered under the requested key
    #[error("unknown generator `{name}` (known generators: {known})")]
    UnknownGenerator { name: String, known: String },

    /// A generator's internal invariant did not hold
    #[error("generator {generator}: {message}")]
    Generator { generator: String, message: String },

    /// Template registration or rendering failed
    #[error("template {template}: {message}")]
    Template { template: String, message: String },

    /// I/O failure reading or writing a path
    #[error("I/O error on {}: {source}", .path.display())]
    Storage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Unusable command-line input: no files, mixed formats, malformed options
    #[error("invalid input: {message}")]
    Input { message: String },

    /// The model could not be serialized
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Rendered output paths differ from the expected list
    #[error("generated outputs differ from expectations: missing {missing:?}, unexpected {unexpected:?}")]
    ExpectedOutputsMismatch {
        missing: Vec<String>,
        unexpected: Vec<String>,
    },
}

/// Result type for IDM operations
pub type Result<T> = std::result::Result<T, IdlError>;

impl IdlError {
    /// Parse error at a byte offset of `text`.
    pub fn parse(file: &str, text: &str, position: usize, message: impl Into<String>) -> Self {
        let (line, column) = line_col(text, position);
        Self::Parse {
            file: file.to_string(),
            line,
            column,
            message: message.into(),
        }
    }

    pub fn xml(source_name: impl Into<String>, line: usize, message: impl Into<String>) -> Self {
        Self::XmlParse {
            source_name: source_name.into(),
            line,
            message: message.into(),
        }
    }

    pub fn resolution(symbol: impl Into<String>, site: impl Into<String>) -> Self {
        Self::Resolution {
            symbol: symbol.into(),
            site: site.into(),
        }
    }

    pub fn duplicate(name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::DuplicateDefinition {
            name: name.into(),
            detail: detail.into(),
        }
    }

    pub fn generator(generator: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Generator {
            generator: generator.into(),
            message: message.into(),
        }
    }

    pub fn template(template: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Template {
            template: template.into(),
            message: message.into(),
        }
    }

    pub fn input(message: impl Into<String>) -> Self {
        Self::Input {
            message: message.into(),
        }
    }

    pub fn storage(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Storage {
            path: path.into(),
            source,
        }
    }
}
