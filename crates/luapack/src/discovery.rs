//! Source tree discovery
//!
//! Two listings come out of a root directory: the module files that go into
//! the bundle (filtered by extension and exclusion rules), and the full tree
//! of files and directories that the installer script recreates on the host.
//! Both are sorted by normalized path so repeated runs see the same order.

use std::path::{Path, PathBuf};

use log::{debug, trace};
use walkdir::WalkDir;

use crate::{error::BundleError, module_id::derive_module_id, util::normalize_path};

/// A module file found under the bundle root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub absolute_path: PathBuf,
    /// Root-relative path with `/` separators
    pub relative_path: String,
    pub module_id: String,
}

/// Path rule that removes files from the bundle
///
/// A prefix rule matches every normalized path that starts with it, so
/// `tests` excludes `tests/run.lua`, `tests.lua` and `tests_util.lua` alike.
/// End the prefix with `/` to match only paths below a directory. A path rule
/// matches one file exactly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExclusionRule {
    prefix: String,
    exact: bool,
}

impl ExclusionRule {
    pub fn new(prefix: &str) -> Self {
        Self {
            prefix: Self::normalize(prefix),
            exact: false,
        }
    }

    /// Rule matching exactly one root-relative path
    pub fn path(path: &str) -> Self {
        Self {
            prefix: Self::normalize(path),
            exact: true,
        }
    }

    fn normalize(prefix: &str) -> String {
        prefix.trim_start_matches("./").replace('\\', "/")
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn matches(&self, relative_path: &str) -> bool {
        if self.exact {
            relative_path == self.prefix
        } else {
            relative_path.starts_with(&self.prefix)
        }
    }
}

/// Every file and directory under a root, for the installer
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceTree {
    /// Name of the root directory; the first segment of every path below
    pub root_name: String,
    /// Directories, including the root itself, relative to the root's parent
    pub directories: Vec<String>,
    /// Regular files relative to the root's parent
    pub files: Vec<String>,
}

/// Parameters controlling module discovery
#[derive(Debug, Clone)]
pub struct DiscoveryOptions<'a> {
    /// Extension without the leading dot
    pub extension: &'a str,
    pub exclusions: &'a [ExclusionRule],
    /// Optional module id prefix
    pub prefix: Option<&'a str>,
}

/// Find every module file under `root`
pub fn discover_modules(
    root: &Path,
    options: &DiscoveryOptions<'_>,
) -> Result<Vec<SourceFile>, BundleError> {
    ensure_root(root)?;
    let suffix = format!(".{}", options.extension);
    let mut files = Vec::new();

    for entry in WalkDir::new(root).follow_links(false) {
        let entry = entry.map_err(|err| walk_error(root, err))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(root)
            .map_err(|_| BundleError::config(format!("{} escapes the root", entry.path().display())))?;
        let relative_path = normalize_path(relative)?;

        if !relative_path.ends_with(&suffix) {
            trace!("Skipping non-module file {relative_path}");
            continue;
        }
        if let Some(rule) = options
            .exclusions
            .iter()
            .find(|rule| rule.matches(&relative_path))
        {
            debug!("Excluding {relative_path} (rule '{}')", rule.prefix());
            continue;
        }

        let module_id = derive_module_id(&relative_path, options.extension, options.prefix)?;
        files.push(SourceFile {
            absolute_path: entry.path().to_path_buf(),
            relative_path,
            module_id,
        });
    }

    files.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
    debug!("Discovered {} module files under {}", files.len(), root.display());
    Ok(files)
}

/// List every file and directory under `root`, for the installer
///
/// Files matching one of `exclusions` (root-relative, like module paths) are
/// left out of the listing.
pub fn discover_tree(
    root: &Path,
    exclusions: &[ExclusionRule],
) -> Result<SourceTree, BundleError> {
    ensure_root(root)?;
    let root_name = root_name(root)?;
    let mut tree = SourceTree {
        root_name: root_name.clone(),
        directories: vec![root_name.clone()],
        files: Vec::new(),
    };

    for entry in WalkDir::new(root).min_depth(1).follow_links(false) {
        let entry = entry.map_err(|err| walk_error(root, err))?;
        let relative = entry
            .path()
            .strip_prefix(root)
            .map_err(|_| BundleError::config(format!("{} escapes the root", entry.path().display())))?;
        let relative_path = normalize_path(relative)?;
        let path = format!("{root_name}/{relative_path}");

        if entry.file_type().is_dir() {
            tree.directories.push(path);
        } else if entry.file_type().is_file() {
            if exclusions.iter().any(|rule| rule.matches(&relative_path)) {
                debug!("Leaving {relative_path} out of the installer");
                continue;
            }
            tree.files.push(path);
        }
    }

    tree.directories.sort();
    tree.files.sort();
    Ok(tree)
}

/// Name of the root directory, resolving `.` and friends
pub fn root_name(root: &Path) -> Result<String, BundleError> {
    ensure_root(root)?;
    let canonical = root.canonicalize().map_err(|source| BundleError::Read {
        path: root.to_path_buf(),
        source,
    })?;
    canonical
        .file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
        .ok_or_else(|| {
            BundleError::config(format!(
                "cannot determine a directory name for {}",
                root.display()
            ))
        })
}

fn ensure_root(root: &Path) -> Result<(), BundleError> {
    if !root.exists() {
        return Err(BundleError::config(format!(
            "root directory {} does not exist",
            root.display()
        )));
    }
    if !root.is_dir() {
        return Err(BundleError::config(format!(
            "root {} is not a directory",
            root.display()
        )));
    }
    Ok(())
}

fn walk_error(root: &Path, err: walkdir::Error) -> BundleError {
    let path = err.path().unwrap_or(root).to_path_buf();
    let source = err
        .into_io_error()
        .unwrap_or_else(|| std::io::Error::other("filesystem loop detected"));
    BundleError::Read { path, source }
}
