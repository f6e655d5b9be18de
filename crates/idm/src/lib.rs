//! Interaction Data Model toolchain
//!
//! Reads cluster definitions written in IDL (`.matter`) or ZCL XML, checks
//! them, and generates code from them.
//!
//! # Architecture
//!
//! The pipeline consists of:
//! 1. Front ends: the IDL [`lexer`] and [`parser`], or the [`xml`] reader
//! 2. [`resolve`]: every type, response and cluster reference must exist
//! 3. Optional checks: [`lint`] rules and the [`compat`] checker
//! 4. [`codegen`]: a registered generator renders outputs into storage
//!
//! # Example
//!
//! ```ignore
//! use idm::{codegen::InMemoryStorage, CodegenRunOptions, PipelineContext};
//!
//! let idl = idm::parse_idl("server cluster Identify = 3 { }", "identify.matter")?;
//! let context = PipelineContext::new()?;
//! let mut storage = InMemoryStorage::new();
//! context.generate("gn", &idl, &mut storage, &CodegenRunOptions::new())?;
//! ```

pub mod ast;
pub mod builder;
pub mod case;
pub mod codegen;
pub mod compat;
pub mod diagnostic;
mod error;
pub mod lexer;
pub mod lint;
pub mod parser;
pub mod paths;
pub mod resolve;
pub mod types;
pub mod xml;

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

pub use ast::*;
pub use codegen::{
    CodegenReport, CodegenRunOptions, GeneratedOutputs, Generator, GeneratorOptions,
    GeneratorRegistry, GeneratorStorage, HandlebarsRenderer, TemplateRenderer,
};
pub use compat::{check_compatibility, is_backwards_compatible, CompatibilityReport};
pub use diagnostic::{Diagnostic, Severity, SourceLocation};
pub use error::{line_col, IdlError, Result, Span};
pub use lint::LintRule;
pub use paths::expand;
pub use xml::{parse_xmls, XmlSource};

/// Everything a run needs besides its inputs: which generators exist, how
/// templates are rendered and the options generators are built with
pub struct PipelineContext {
    registry: GeneratorRegistry,
    renderer: Box<dyn TemplateRenderer>,
    options: GeneratorOptions,
}

impl PipelineContext {
    /// Built-in generators, embedded templates, no options
    pub fn new() -> Result<Self> {
        Ok(Self {
            registry: GeneratorRegistry::builtin(),
            renderer: Box::new(HandlebarsRenderer::new()?),
            options: GeneratorOptions::new(),
        })
    }

    pub fn with_options(mut self, options: GeneratorOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_registry(mut self, registry: GeneratorRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_renderer(mut self, renderer: Box<dyn TemplateRenderer>) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn registry(&self) -> &GeneratorRegistry {
        &self.registry
    }

    pub fn renderer(&self) -> &dyn TemplateRenderer {
        self.renderer.as_ref()
    }

    pub fn options(&self) -> &GeneratorOptions {
        &self.options
    }

    /// Run the generator registered under `key` against `idl`
    pub fn generate(
        &self,
        key: &str,
        idl: &Idl,
        storage: &mut dyn GeneratorStorage,
        run: &CodegenRunOptions,
    ) -> Result<CodegenReport> {
        let generator = self.registry.create(key, &self.options)?;
        codegen::run(generator.as_ref(), idl, self.renderer(), storage, run)
    }
}

impl std::fmt::Debug for PipelineContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineContext")
            .field("registry", &self.registry)
            .field("options", &self.options)
            .finish()
    }
}

/// Parse and resolve IDL text
pub fn parse_idl(text: &str, file_name: &str) -> Result<Idl> {
    parser::parse(text, file_name)
}

/// Parse and resolve an IDL file
pub fn parse_idl_file(path: impl AsRef<Path>) -> Result<Idl> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|e| IdlError::storage(path, e))?;
    parser::parse(&text, &path.display().to_string())
}

/// Read and merge a set of XML files into one model
pub fn parse_xml_files<P: AsRef<Path>>(paths: &[P]) -> Result<Idl> {
    let sources = paths
        .iter()
        .map(XmlSource::from_file)
        .collect::<Result<Vec<_>>>()?;
    xml::parse_xmls(&sources)
}

fn is_xml(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("xml"))
        .unwrap_or(false)
}

/// Load a model from input files: a single IDL file, or any number of XML files
pub fn load_model(paths: &[PathBuf]) -> Result<Idl> {
    let idl = match paths {
        [] => return Err(IdlError::input("no input files")),
        [single] if !is_xml(single) => parse_idl_file(single)?,
        _ => {
            if let Some(other) = paths.iter().find(|p| !is_xml(p)) {
                return Err(IdlError::input(format!(
                    "{} is not XML; IDL input takes exactly one file",
                    other.display()
                )));
            }
            parse_xml_files(paths)?
        }
    };
    info!(
        clusters = idl.clusters.len(),
        endpoints = idl.endpoints.len(),
        "loaded model"
    );
    Ok(idl)
}

/// Load the rule file at `path` and run it against `idl`
///
/// `load` statements inside the rule file are relative to its directory.
pub fn lint_file(idl: &Idl, path: impl AsRef<Path>) -> Result<Vec<Diagnostic>> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|e| IdlError::storage(path, e))?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    let rules = lint::load_rules(&text, &path.display().to_string(), base_dir)?;
    Ok(lint::run(idl, &rules))
}
