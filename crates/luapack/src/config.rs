//! Configuration for a bundling run
//!
//! Settings are layered, lowest priority first:
//! 1. built-in defaults
//! 2. the user file (`luapack.toml` in the platform config directory)
//! 3. the project file (`luapack.toml` in the root, or `--config`)
//! 4. command line flags
//!
//! Scalar settings from a higher layer replace lower ones. Exclusion prefixes
//! accumulate across layers.

use std::{
    fs,
    path::{Path, PathBuf},
};

use log::debug;
use serde::Deserialize;

use crate::{
    dirs::{CONFIG_FILE_NAME, user_config_file},
    error::BundleError,
    types::{FxIndexSet, MinifyMode},
};

/// Default extension of module files
pub const DEFAULT_EXTENSION: &str = "lua";

/// Settings for the download bootstrap script
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallerConfig {
    /// URL the files are fetched from; each file's path is appended to it
    pub base_url: Option<String>,
}

/// Resolved configuration of one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub root: PathBuf,
    /// Bundle destination, defaults to `<root name>.lua` in the working directory
    pub output: Option<PathBuf>,
    /// Module file extension without the dot
    pub extension: String,
    /// Root-relative path prefixes left out of the bundle
    pub exclude: FxIndexSet<String>,
    pub minify: MinifyMode,
    /// Name of the exported table, defaults to a sanitized root name
    pub namespace: Option<String>,
    /// Extra leading segment for every module id
    pub prefix: Option<String>,
    pub header: bool,
    /// External command the bundle is piped through before writing
    pub post_minify: Vec<String>,
    /// Where to write the installer script, if at all
    pub installer_output: Option<PathBuf>,
    pub installer: InstallerConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            output: None,
            extension: DEFAULT_EXTENSION.to_string(),
            exclude: FxIndexSet::default(),
            minify: MinifyMode::default(),
            namespace: None,
            prefix: None,
            header: true,
            post_minify: Vec::new(),
            installer_output: None,
            installer: InstallerConfig::default(),
        }
    }
}

/// One configuration layer, as written in `luapack.toml`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigLayer {
    pub output: Option<PathBuf>,
    pub extension: Option<String>,
    pub exclude: Vec<String>,
    pub minify: Option<MinifyMode>,
    pub namespace: Option<String>,
    pub prefix: Option<String>,
    pub header: Option<bool>,
    pub post_minify: Option<Vec<String>>,
    pub installer_output: Option<PathBuf>,
    pub installer: InstallerLayer,
}

/// `[installer]` table of a configuration layer
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InstallerLayer {
    pub base_url: Option<String>,
}

impl ConfigLayer {
    /// Parse a layer from TOML text; `origin` only labels errors
    pub fn parse(text: &str, origin: &Path) -> Result<Self, BundleError> {
        toml::from_str(text).map_err(|err| {
            BundleError::config(format!("invalid config file {}: {err}", origin.display()))
        })
    }

    /// Read and parse a layer from disk
    pub fn from_file(path: &Path) -> Result<Self, BundleError> {
        let text = fs::read_to_string(path).map_err(|source| BundleError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text, path)
    }
}

impl Config {
    /// Create a configuration with defaults for `root`
    pub fn for_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    /// Load the user and project layers on top of the defaults
    ///
    /// An explicit config path must exist; the implicit files are optional.
    pub fn load(root: &Path, explicit: Option<&Path>) -> Result<Self, BundleError> {
        Self::load_with_user_file(root, explicit, user_config_file().as_deref())
    }

    /// Same as [`Config::load`] with the user file location given explicitly
    pub fn load_with_user_file(
        root: &Path,
        explicit: Option<&Path>,
        user_file: Option<&Path>,
    ) -> Result<Self, BundleError> {
        let mut config = Self::for_root(root);

        if let Some(user_file) = user_file.filter(|path| path.is_file()) {
            debug!("Loading user config from {}", user_file.display());
            config.apply(ConfigLayer::from_file(user_file)?);
        }

        let project_file = match explicit {
            Some(path) if !path.is_file() => {
                return Err(BundleError::config(format!(
                    "config file {} does not exist",
                    path.display()
                )));
            }
            Some(path) => Some(path.to_path_buf()),
            None => Some(root.join(CONFIG_FILE_NAME)).filter(|path| path.is_file()),
        };
        if let Some(project_file) = project_file {
            debug!("Loading project config from {}", project_file.display());
            config.apply(ConfigLayer::from_file(&project_file)?);
        }

        Ok(config)
    }

    /// Apply a higher-priority layer
    pub fn apply(&mut self, layer: ConfigLayer) {
        if let Some(output) = layer.output {
            self.output = Some(output);
        }
        if let Some(extension) = layer.extension {
            self.extension = extension.trim_start_matches('.').to_string();
        }
        self.exclude.extend(layer.exclude);
        if let Some(minify) = layer.minify {
            self.minify = minify;
        }
        if let Some(namespace) = layer.namespace {
            self.namespace = Some(namespace);
        }
        if let Some(prefix) = layer.prefix {
            self.prefix = Some(prefix);
        }
        if let Some(header) = layer.header {
            self.header = header;
        }
        if let Some(post_minify) = layer.post_minify {
            self.post_minify = post_minify;
        }
        if let Some(installer_output) = layer.installer_output {
            self.installer_output = Some(installer_output);
        }
        if let Some(base_url) = layer.installer.base_url {
            self.installer.base_url = Some(base_url);
        }
    }

    /// Check settings that do not depend on the filesystem
    pub fn validate(&self) -> Result<(), BundleError> {
        if self.extension.is_empty() || self.extension.contains(['/', '\\']) {
            return Err(BundleError::config(format!(
                "invalid module extension '{}'",
                self.extension
            )));
        }
        if self.exclude.iter().any(String::is_empty) {
            return Err(BundleError::config("exclusion prefixes must not be empty"));
        }
        if self.post_minify.first().is_some_and(String::is_empty) {
            return Err(BundleError::config("post-minify command is empty"));
        }
        if let Some(prefix) = &self.prefix {
            crate::module_id::validate_prefix(prefix)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::for_root("ccmaze");
        assert_eq!(config.root, PathBuf::from("ccmaze"));
        assert_eq!(config.extension, "lua");
        assert_eq!(config.minify, MinifyMode::Flatten);
        assert!(config.header);
        assert!(config.exclude.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_full_layer() {
        let layer = ConfigLayer::parse(
            r#"
            extension = ".lua"
            exclude = ["tests", "init.lua"]
            minify = "lines"
            namespace = "ccmaze"
            prefix = "ccmaze"
            header = false
            post_minify = ["luamin", "-c"]

            [installer]
            base_url = "https://example.com/ccmaze/"
            "#,
            Path::new("luapack.toml"),
        )
        .expect("valid layer");

        let mut config = Config::for_root(".");
        config.apply(layer);
        assert_eq!(config.extension, "lua");
        assert_eq!(
            config.exclude.iter().map(String::as_str).collect::<Vec<_>>(),
            vec!["tests", "init.lua"]
        );
        assert_eq!(config.minify, MinifyMode::Lines);
        assert_eq!(config.namespace.as_deref(), Some("ccmaze"));
        assert_eq!(config.prefix.as_deref(), Some("ccmaze"));
        assert!(!config.header);
        assert_eq!(config.post_minify, vec!["luamin", "-c"]);
        assert_eq!(
            config.installer.base_url.as_deref(),
            Some("https://example.com/ccmaze/")
        );
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        let err = ConfigLayer::parse("minfy = \"off\"", Path::new("luapack.toml"))
            .expect_err("typo must fail");
        assert!(matches!(err, BundleError::Config(_)));
    }

    #[test]
    fn test_layers_override_and_accumulate() -> Result<(), BundleError> {
        let temp_dir = TempDir::new().expect("temp dir");
        let root = temp_dir.path().join("project");
        fs::create_dir_all(&root).expect("create root");

        let user_file = temp_dir.path().join("user.toml");
        fs::write(&user_file, "minify = \"off\"\nexclude = [\"tests\"]\nheader = false\n")
            .expect("write user config");
        fs::write(
            root.join(CONFIG_FILE_NAME),
            "minify = \"lines\"\nexclude = [\"init.lua\", \"tests\"]\n",
        )
        .expect("write project config");

        let config = Config::load_with_user_file(&root, None, Some(&user_file))?;
        assert_eq!(config.minify, MinifyMode::Lines);
        assert!(!config.header);
        assert_eq!(
            config.exclude.iter().map(String::as_str).collect::<Vec<_>>(),
            vec!["tests", "init.lua"]
        );
        Ok(())
    }

    #[test]
    fn test_missing_explicit_config_is_an_error() {
        let temp_dir = TempDir::new().expect("temp dir");
        let missing = temp_dir.path().join("nope.toml");
        let err = Config::load_with_user_file(temp_dir.path(), Some(&missing), None)
            .expect_err("explicit file must exist");
        assert!(matches!(err, BundleError::Config(_)));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::for_root(".");
        config.extension = String::new();
        assert!(config.validate().is_err());

        let mut config = Config::for_root(".");
        config.exclude.insert(String::new());
        assert!(config.validate().is_err());

        let mut config = Config::for_root(".");
        config.prefix = Some("a..b".to_string());
        assert!(config.validate().is_err());
    }
}
