//! Build-graph fragment generator
//!
//! Emits a GN list with one scope per cluster the document declares, so a
//! build can depend on exactly the clusters an application uses.

use serde_json::json;

use super::{distinct_clusters, source_name, GeneratedOutputs, Generator, TemplateRenderer};
use crate::ast::Idl;
use crate::error::Result;

#[derive(Debug, Default)]
pub struct GnGenerator;

impl Generator for GnGenerator {
    fn name(&self) -> &str {
        "gn"
    }

    fn render_all(&self, idl: &Idl, renderer: &dyn TemplateRenderer) -> Result<GeneratedOutputs> {
        let clusters: Vec<_> = distinct_clusters(idl)
            .into_iter()
            .map(|c| {
                json!({
                    "name": c.name,
                    "code": c.code,
                    "side": c.side.to_string(),
                })
            })
            .collect();

        let mut outputs = GeneratedOutputs::new();
        outputs.insert(
            "gn/clusters.gni".to_string(),
            renderer.render(
                "gn/clusters.gni",
                &json!({ "source": source_name(idl), "clusters": clusters }),
            )?,
        );
        Ok(outputs)
    }
}
