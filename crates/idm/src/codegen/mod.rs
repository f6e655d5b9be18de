//! Code Generation
//!
//! A [`Generator`] turns a model into a set of named text outputs. Generators
//! never format text themselves: they build JSON bindings and hand them to a
//! [`TemplateRenderer`]. [`run`] then pushes the outputs through a
//! [`GeneratorStorage`], leaving unchanged files untouched so build systems
//! keyed on modification times do not rebuild.

mod bridge;
mod cpp;
mod cpp_app;
mod gn;
mod idl;
mod java;
pub mod render;
mod sdk;
pub mod storage;

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, info};

use crate::ast::{Cluster, Idl};
use crate::error::{IdlError, Result};
use crate::paths;

pub use bridge::BridgeGenerator;
pub use cpp_app::CppApplicationGenerator;
pub use gn::GnGenerator;
pub use idl::IdlGenerator;
pub use java::JavaGenerator;
pub use render::{HandlebarsRenderer, TemplateRenderer};
pub use sdk::SdkGenerator;
pub use storage::{FileSystemStorage, GeneratorStorage, InMemoryStorage};

/// Rendered outputs of one generator, keyed by relative path
pub type GeneratedOutputs = BTreeMap<String, String>;

/// A code generator
pub trait Generator {
    /// Registry key of the generator
    fn name(&self) -> &str;

    /// Render every output for `idl`
    fn render_all(&self, idl: &Idl, renderer: &dyn TemplateRenderer) -> Result<GeneratedOutputs>;
}

/// One cluster per declared name, in declaration order, server side preferred
pub(crate) fn distinct_clusters(idl: &Idl) -> Vec<&Cluster> {
    paths::defined_cluster_names(idl)
        .into_iter()
        .filter_map(|name| idl.cluster_named(name))
        .collect()
}

/// Name recorded in generated file headers
pub(crate) fn source_name(idl: &Idl) -> &str {
    idl.parse_file_name.as_deref().unwrap_or("<memory>")
}

/// Free-form `key:value` options handed to generator factories
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeneratorOptions {
    values: BTreeMap<String, String>,
}

impl GeneratorOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an option, replacing any earlier value for the key
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    /// Parse `key:value` pairs as given on the command line
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = &'a str>) -> Result<Self> {
        let mut options = Self::new();
        for pair in pairs {
            let (key, value) = pair.split_once(':').ok_or_else(|| {
                IdlError::input(format!("option `{}` is not of the form key:value", pair))
            })?;
            options.values.insert(key.trim().to_string(), value.trim().to_string());
        }
        Ok(options)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn get_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.get(key).unwrap_or(default)
    }
}

/// Builds a generator from its options
pub type GeneratorFactory = fn(&GeneratorOptions) -> Box<dyn Generator>;

/// Generators available to a pipeline, by key
#[derive(Clone)]
pub struct GeneratorRegistry {
    factories: BTreeMap<&'static str, GeneratorFactory>,
}

impl GeneratorRegistry {
    /// An empty registry
    pub fn new() -> Self {
        Self {
            factories: BTreeMap::new(),
        }
    }

    /// Registry holding every generator shipped with the crate
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register("java", |options| -> Box<dyn Generator> {
            Box::new(JavaGenerator::new(options))
        });
        registry.register("bridge", |_| -> Box<dyn Generator> { Box::new(BridgeGenerator) });
        registry.register("cpp-app", |_| -> Box<dyn Generator> { Box::new(CppApplicationGenerator) });
        registry.register("cpp-sdk", |_| -> Box<dyn Generator> { Box::new(SdkGenerator) });
        registry.register("gn", |_| -> Box<dyn Generator> { Box::new(GnGenerator) });
        registry.register("idl", |_| -> Box<dyn Generator> { Box::new(IdlGenerator) });
        registry
    }

    pub fn register(&mut self, key: &'static str, factory: GeneratorFactory) {
        self.factories.insert(key, factory);
    }

    /// Registered keys, sorted
    pub fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.factories.keys().copied()
    }

    /// Instantiate the generator registered under `key`
    pub fn create(&self, key: &str, options: &GeneratorOptions) -> Result<Box<dyn Generator>> {
        let factory = self.factories.get(key).ok_or_else(|| IdlError::UnknownGenerator {
            name: key.to_string(),
            known: self.keys().collect::<Vec<_>>().join(", "),
        })?;
        Ok(factory(options))
    }
}

impl Default for GeneratorRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl std::fmt::Debug for GeneratorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.factories.keys()).finish()
    }
}

/// Options of a single [`run`]
#[derive(Debug, Clone, Default)]
pub struct CodegenRunOptions {
    /// Render but do not touch storage
    pub dry_run: bool,
    /// Paths the generator must produce, exactly
    pub expected_outputs: Option<Vec<String>>,
}

impl CodegenRunOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn expected_outputs(mut self, paths: Vec<String>) -> Self {
        self.expected_outputs = Some(paths);
        self
    }
}

/// Read an expected-outputs list: one path per line, blank lines ignored
pub fn parse_expected_outputs(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// What [`run`] did with each rendered output
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodegenReport {
    pub written: Vec<String>,
    pub unchanged: Vec<String>,
    /// Rendered in a dry run, never written
    pub skipped: Vec<String>,
}

fn check_expected(outputs: &GeneratedOutputs, expected: &[String]) -> Result<()> {
    let expected: BTreeSet<&str> = expected.iter().map(String::as_str).collect();
    let actual: BTreeSet<&str> = outputs.keys().map(String::as_str).collect();

    let missing: Vec<String> = expected.difference(&actual).map(|s| s.to_string()).collect();
    let unexpected: Vec<String> = actual.difference(&expected).map(|s| s.to_string()).collect();
    if missing.is_empty() && unexpected.is_empty() {
        Ok(())
    } else {
        Err(IdlError::ExpectedOutputsMismatch { missing, unexpected })
    }
}

/// Render every output of `generator` and store the ones that changed
pub fn run(
    generator: &dyn Generator,
    idl: &Idl,
    renderer: &dyn TemplateRenderer,
    storage: &mut dyn GeneratorStorage,
    options: &CodegenRunOptions,
) -> Result<CodegenReport> {
    let outputs = generator.render_all(idl, renderer)?;
    debug!(generator = generator.name(), outputs = outputs.len(), "rendered outputs");

    if let Some(expected) = &options.expected_outputs {
        check_expected(&outputs, expected)?;
    }

    let mut report = CodegenReport::default();
    for (path, content) in outputs {
        if options.dry_run {
            debug!(path = %path, "dry run, not writing");
            report.skipped.push(path);
            continue;
        }
        if storage.get_existing(&path)?.as_deref() == Some(content.as_str()) {
            debug!(path = %path, "unchanged");
            report.unchanged.push(path);
            continue;
        }
        storage.write_new(&path, &content)?;
        report.written.push(path);
    }

    info!(
        generator = generator.name(),
        written = report.written.len(),
        unchanged = report.unchanged.len(),
        "generation finished"
    );
    Ok(report)
}
