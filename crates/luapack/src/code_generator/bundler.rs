use log::debug;

use crate::{
    code_generator::module_registry::{
        RESERVED_PREFIX, generate_export, generate_module_assignment, generate_registry_init,
    },
    error::BundleError,
    module_registry::ModuleRegistry,
    types::MinifyMode,
    util::is_lua_identifier,
};

/// First line of every generated bundle
pub const BUNDLE_HEADER: &str = "-- Bundled by luapack. Do not edit by hand.";

/// Parameters for rendering a bundle
#[derive(Debug, Clone)]
pub struct BundleParams {
    /// Local name of the exported table holding `require`
    pub namespace: String,
    pub mode: MinifyMode,
    /// Emit [`BUNDLE_HEADER`] as the first line
    pub header: bool,
}

/// Renders a module registry into a single Lua chunk
///
/// Output layout is `<prologue> <module assignment>* <export>`. Rendering is a
/// pure function of the registry and the params, so identical inputs give
/// byte-identical bundles.
#[derive(Debug)]
pub struct Bundler {
    params: BundleParams,
}

impl Bundler {
    pub fn new(params: BundleParams) -> Result<Self, BundleError> {
        validate_namespace(&params.namespace)?;
        Ok(Self { params })
    }

    pub fn render(&self, registry: &ModuleRegistry) -> String {
        debug!(
            "Rendering {} modules into namespace '{}' ({} mode)",
            registry.len(),
            self.params.namespace,
            self.params.mode
        );

        let mut output = String::new();
        if self.params.header {
            output.push_str(BUNDLE_HEADER);
            output.push('\n');
        }

        let prologue = generate_registry_init(&self.params.namespace);
        let export = generate_export(&self.params.namespace);

        if self.params.mode.is_flattened() {
            let mut statements: Vec<String> = prologue
                .iter()
                .map(|line| line.trim().to_string())
                .collect();
            for unit in registry.iter() {
                let parts = generate_module_assignment(unit);
                statements.push(
                    parts
                        .iter()
                        .filter(|part| !part.is_empty())
                        .map(String::as_str)
                        .collect::<Vec<_>>()
                        .join(" "),
                );
            }
            statements.push(export);
            output.push_str(&statements.join(" "));
            output.push('\n');
        } else {
            for line in &prologue {
                output.push_str(line);
                output.push('\n');
            }
            for unit in registry.iter() {
                for part in generate_module_assignment(unit) {
                    if !part.is_empty() {
                        output.push_str(&part);
                        output.push('\n');
                    }
                }
            }
            output.push_str(&export);
            output.push('\n');
        }

        output
    }
}

fn validate_namespace(namespace: &str) -> Result<(), BundleError> {
    if !is_lua_identifier(namespace) {
        return Err(BundleError::config(format!(
            "namespace '{namespace}' is not a valid Lua identifier"
        )));
    }
    if namespace == "require" || namespace.starts_with(RESERVED_PREFIX) {
        return Err(BundleError::config(format!(
            "namespace '{namespace}' would shadow a generated local"
        )));
    }
    Ok(())
}
