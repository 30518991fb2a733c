//! One bundling run, from the root directory to the written artifacts
//!
//! Everything that can fail fatally happens before the first write: the
//! bundle and the optional installer are fully rendered in memory first.

use std::{
    env, fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use log::{debug, info, warn};

use crate::{
    code_generator::{BundleParams, Bundler},
    config::Config,
    dirs::CONFIG_FILE_NAME,
    discovery::{DiscoveryOptions, ExclusionRule, discover_modules, discover_tree, root_name},
    error::{BundleError, Diagnostic},
    installer::render_installer,
    minifier::{strip, without_shebang},
    module_registry::{ModuleRegistry, ModuleUnit},
    util::{is_lua_identifier, normalize_path, sha256_hex},
    writer::{StagedFile, run_post_pass, stage},
};

/// Outcome of a successful run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleReport {
    /// Path the bundle was written to
    pub output: PathBuf,
    /// Module ids in bundle order
    pub modules: Vec<String>,
    pub warnings: Vec<Diagnostic>,
    /// SHA-256 hex of the written bundle
    pub digest: String,
    /// Path the installer was written to, when one was requested
    pub installer: Option<PathBuf>,
}

/// Drives a single bundling pass
#[derive(Debug)]
pub struct BundleOrchestrator {
    config: Config,
}

impl BundleOrchestrator {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Bundle the configured root and write the artifacts
    pub fn run(&self) -> Result<BundleReport> {
        let config = &self.config;
        config.validate()?;

        let root = config.root.as_path();
        let root_name = root_name(root)
            .with_context(|| format!("Failed to resolve bundle root {}", root.display()))?;
        let namespace = match &config.namespace {
            Some(namespace) => namespace.clone(),
            None => default_namespace(&root_name),
        };
        let output = match &config.output {
            Some(output) => output.clone(),
            None => env::current_dir()
                .context("Failed to determine the working directory")?
                .join(format!("{root_name}.lua")),
        };
        info!("Bundling {} into {}", root.display(), output.display());

        // Renderer checks run before any file is read
        let bundler = Bundler::new(BundleParams {
            namespace: namespace.clone(),
            mode: config.minify,
            header: config.header,
        })?;

        // Generated files inside the root are neither bundled nor installed
        let mut artifacts = vec![ExclusionRule::path(CONFIG_FILE_NAME)];
        for artifact in std::iter::once(&output).chain(config.installer_output.as_ref()) {
            if let Some(relative) = path_within_root(root, artifact) {
                debug!("Excluding generated artifact {relative}");
                artifacts.push(ExclusionRule::path(&relative));
            }
        }
        let exclusions: Vec<ExclusionRule> = config
            .exclude
            .iter()
            .map(|prefix| ExclusionRule::new(prefix))
            .chain(artifacts.iter().cloned())
            .collect();

        let files = discover_modules(
            root,
            &DiscoveryOptions {
                extension: &config.extension,
                exclusions: &exclusions,
                prefix: config.prefix.as_deref(),
            },
        )?;
        if files.is_empty() {
            warn!("No .{} files found under {}", config.extension, root.display());
        }

        let mut registry = ModuleRegistry::new();
        let mut warnings = Vec::new();
        for file in files {
            let source =
                fs::read_to_string(&file.absolute_path).map_err(|source| BundleError::Read {
                    path: file.absolute_path.clone(),
                    source,
                })?;
            let stripped = strip(without_shebang(&source), config.minify);
            warnings.extend(
                stripped
                    .warnings
                    .into_iter()
                    .map(|warning| warning.with_path(&file.relative_path)),
            );
            registry.add_module(ModuleUnit {
                module_id: file.module_id,
                relative_path: file.relative_path,
                body: stripped.text,
            })?;
        }

        let mut bundle = bundler.render(&registry);
        if !config.post_minify.is_empty() {
            bundle = run_post_pass(&config.post_minify, &bundle)?;
        }

        let installer = match &config.installer_output {
            Some(path) => {
                let tree = discover_tree(root, &artifacts)?;
                let script = render_installer(&tree, &config.installer)?;
                Some((path.clone(), script))
            }
            None => None,
        };

        // Both artifacts are staged before either becomes visible
        let staged_bundle = stage(&output, &bundle)
            .with_context(|| format!("Failed to write bundle to {}", output.display()))?;
        let staged_installer = installer
            .as_ref()
            .map(|(path, script)| {
                stage(path, script)
                    .with_context(|| format!("Failed to write installer to {}", path.display()))
            })
            .transpose()?;
        commit_all(staged_bundle, staged_installer)?;

        let digest = sha256_hex(&bundle);
        info!(
            "Bundled {} modules ({} bytes, sha256 {digest})",
            registry.len(),
            bundle.len()
        );

        Ok(BundleReport {
            output,
            modules: registry.module_ids().map(str::to_string).collect(),
            warnings,
            digest,
            installer: installer.map(|(path, _)| path),
        })
    }
}

/// Move the staged artifacts into place, installer first
///
/// When the bundle cannot be committed the freshly written installer is
/// removed again, so a failed run leaves no artifact behind.
fn commit_all(bundle: StagedFile, installer: Option<StagedFile>) -> Result<()> {
    let installer_path = installer.as_ref().map(|staged| staged.path().to_path_buf());
    if let Some(installer) = installer {
        installer.commit()?;
    }
    let bundle_path = bundle.path().to_path_buf();
    if let Err(err) = bundle.commit() {
        if let Some(path) = &installer_path {
            let _ = fs::remove_file(path);
        }
        return Err(err)
            .with_context(|| format!("Failed to write bundle to {}", bundle_path.display()));
    }
    if let Some(path) = &installer_path {
        info!("Wrote installer to {}", path.display());
    }
    Ok(())
}

/// Turn a directory name into a Lua identifier usable as the namespace
pub fn default_namespace(root_name: &str) -> String {
    let mut name: String = root_name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    if name.is_empty() || name.starts_with(|c: char| c.is_ascii_digit()) {
        name.insert(0, '_');
    }
    if !is_lua_identifier(&name) || name == "require" {
        name.push('_');
    }
    name
}

/// Root-relative path of `artifact`, if it lies under `root`
fn path_within_root(root: &Path, artifact: &Path) -> Option<String> {
    let root = root.canonicalize().ok()?;
    let file_name = artifact.file_name()?;
    let parent = match artifact.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let artifact = parent.canonicalize().ok()?.join(file_name);
    let relative = artifact.strip_prefix(&root).ok()?;
    normalize_path(relative).ok()
}
