//! Application callback generator
//!
//! Declares the plugin init callbacks of every cluster an application uses
//! and provides weak default implementations of the per-cluster init hooks.

use indexmap::IndexSet;
use serde_json::json;

use super::{source_name, GeneratedOutputs, Generator, TemplateRenderer};
use crate::ast::Idl;
use crate::error::Result;
use crate::paths;

#[derive(Debug, Default)]
pub struct CppApplicationGenerator;

impl Generator for CppApplicationGenerator {
    fn name(&self) -> &str {
        "cpp-app"
    }

    fn render_all(&self, idl: &Idl, renderer: &dyn TemplateRenderer) -> Result<GeneratedOutputs> {
        let server_clusters = paths::server_cluster_names(idl);
        let client_clusters: IndexSet<&str> = idl
            .endpoints
            .iter()
            .flat_map(|e| e.client_bindings.iter())
            .map(String::as_str)
            .collect();
        let used: IndexSet<&str> = server_clusters
            .iter()
            .chain(client_clusters.iter())
            .copied()
            .collect();

        let bindings = json!({
            "source": source_name(idl),
            "server_clusters": server_clusters.iter().collect::<Vec<_>>(),
            "client_clusters": client_clusters.iter().collect::<Vec<_>>(),
            "clusters": used.iter().collect::<Vec<_>>(),
        });

        let mut outputs = GeneratedOutputs::new();
        outputs.insert(
            "app/PluginApplicationCallbacks.h".to_string(),
            renderer.render("app/PluginApplicationCallbacks.h", &bindings)?,
        );
        outputs.insert(
            "app/callback-stub.cpp".to_string(),
            renderer.render("app/callback-stub.cpp", &bindings)?,
        );
        Ok(outputs)
    }
}
