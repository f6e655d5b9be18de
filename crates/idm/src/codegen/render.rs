//! Template rendering
//!
//! Templates ship inside the crate and are rendered with handlebars. Output
//! is source code, so HTML escaping is off. Case conversion helpers from
//! [`crate::case`] are available to every template:
//!
//! | helper          | example                   |
//! |-----------------|---------------------------|
//! | `snake_case`    | `{{snake_case name}}`     |
//! | `constant_case` | `{{constant_case name}}`  |
//! | `spinal_case`   | `{{spinal_case name}}`    |
//! | `pascal_case`   | `{{pascal_case name}}`    |
//! | `camel_case`    | `{{camel_case name}}`     |
//! | `hex4`, `hex8`  | `{{hex4 code}}`           |

use handlebars::{handlebars_helper, no_escape, Handlebars};
use serde_json::Value;
use tracing::debug;

use crate::case;
use crate::error::{IdlError, Result};

/// Renders a named template against JSON bindings
pub trait TemplateRenderer {
    fn render(&self, template_id: &str, bindings: &Value) -> Result<String>;
}

const TEMPLATES: &[(&str, &str)] = &[
    (
        "java/ClusterIDMapping.java",
        include_str!("../../templates/java/ClusterIDMapping.java.hbs"),
    ),
    ("java/Cluster.java", include_str!("../../templates/java/Cluster.java.hbs")),
    (
        "bridge/BridgeClustersImpl.h",
        include_str!("../../templates/bridge/BridgeClustersImpl.h.hbs"),
    ),
    ("bridge/Cluster.h", include_str!("../../templates/bridge/Cluster.h.hbs")),
    (
        "app/PluginApplicationCallbacks.h",
        include_str!("../../templates/app/PluginApplicationCallbacks.h.hbs"),
    ),
    ("app/callback-stub.cpp", include_str!("../../templates/app/callback-stub.cpp.hbs")),
    ("sdk/ClusterMetadata.h", include_str!("../../templates/sdk/ClusterMetadata.h.hbs")),
    ("sdk/clusters.gni", include_str!("../../templates/sdk/clusters.gni.hbs")),
    ("gn/clusters.gni", include_str!("../../templates/gn/clusters.gni.hbs")),
    ("idl/idl.matter", include_str!("../../templates/idl/idl.matter.hbs")),
];

handlebars_helper!(snake_case: |s: str| case::to_snake_case(s));
handlebars_helper!(constant_case: |s: str| case::to_constant_case(s));
handlebars_helper!(spinal_case: |s: str| case::to_spinal_case(s));
handlebars_helper!(pascal_case: |s: str| case::to_pascal_case(s));
handlebars_helper!(camel_case: |s: str| case::to_lower_camel_case(s));
handlebars_helper!(hex4: |v: u64| format!("0x{:04X}", v));
handlebars_helper!(hex8: |v: u64| format!("0x{:08X}", v));

/// The shipped renderer: embedded templates on a handlebars registry
pub struct HandlebarsRenderer {
    registry: Handlebars<'static>,
}

impl HandlebarsRenderer {
    /// Renderer with every embedded template registered
    pub fn new() -> Result<Self> {
        let mut registry = Handlebars::new();
        registry.register_escape_fn(no_escape);
        registry.register_helper("snake_case", Box::new(snake_case));
        registry.register_helper("constant_case", Box::new(constant_case));
        registry.register_helper("spinal_case", Box::new(spinal_case));
        registry.register_helper("pascal_case", Box::new(pascal_case));
        registry.register_helper("camel_case", Box::new(camel_case));
        registry.register_helper("hex4", Box::new(hex4));
        registry.register_helper("hex8", Box::new(hex8));

        let mut renderer = Self { registry };
        for (id, text) in TEMPLATES {
            renderer.register(id, text)?;
        }
        debug!(templates = TEMPLATES.len(), "registered embedded templates");
        Ok(renderer)
    }

    /// Replace or add a template
    pub fn with_template(mut self, template_id: &str, text: &str) -> Result<Self> {
        self.register(template_id, text)?;
        Ok(self)
    }

    pub fn has_template(&self, template_id: &str) -> bool {
        self.registry.has_template(template_id)
    }

    fn register(&mut self, template_id: &str, text: &str) -> Result<()> {
        self.registry
            .register_template_string(template_id, text)
            .map_err(|e| IdlError::template(template_id, e.to_string()))
    }
}

impl TemplateRenderer for HandlebarsRenderer {
    fn render(&self, template_id: &str, bindings: &Value) -> Result<String> {
        if !self.registry.has_template(template_id) {
            return Err(IdlError::template(template_id, "no such template"));
        }
        self.registry
            .render(template_id, bindings)
            .map_err(|e| IdlError::template(template_id, e.to_string()))
    }
}

impl std::fmt::Debug for HandlebarsRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlebarsRenderer")
            .field("templates", &self.registry.get_templates().len())
            .finish()
    }
}
