//! Shared type definitions for the luapack crate
//!
//! This module contains common types that are used across multiple components
//! of the bundler, ensuring consistency and avoiding circular dependencies.

use std::hash::BuildHasherDefault;

use indexmap::{IndexMap, IndexSet};
use rustc_hash::FxHasher;
use serde::Deserialize;

/// Type alias for FxHasher-based IndexMap
pub type FxIndexMap<K, V> = IndexMap<K, V, BuildHasherDefault<FxHasher>>;

/// Type alias for FxHasher-based IndexSet
pub type FxIndexSet<T> = IndexSet<T, BuildHasherDefault<FxHasher>>;

/// How module bodies are reduced before they are wrapped
///
/// `Off` copies every file verbatim. `Lines` strips comments and blank lines
/// but keeps one statement line per output line, which keeps runtime error
/// messages readable. `Flatten` strips the same way and then joins the whole
/// artifact into a single line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum MinifyMode {
    /// Copy module bodies verbatim
    Off,
    /// Strip comments, keep line structure
    Lines,
    /// Strip comments and join everything onto one line
    #[default]
    Flatten,
}

impl MinifyMode {
    /// Check if module bodies go through the stripper
    pub fn is_enabled(self) -> bool {
        !matches!(self, Self::Off)
    }

    /// Check if output is joined onto a single line
    pub fn is_flattened(self) -> bool {
        matches!(self, Self::Flatten)
    }
}

impl std::fmt::Display for MinifyMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Off => write!(f, "off"),
            Self::Lines => write!(f, "lines"),
            Self::Flatten => write!(f, "flatten"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minify_mode_predicates() {
        assert!(!MinifyMode::Off.is_enabled());
        assert!(MinifyMode::Lines.is_enabled());
        assert!(MinifyMode::Flatten.is_enabled());
        assert!(MinifyMode::Flatten.is_flattened());
        assert!(!MinifyMode::Lines.is_flattened());
    }

    #[test]
    fn test_minify_mode_from_toml() {
        #[derive(Deserialize)]
        struct Wrapper {
            minify: MinifyMode,
        }

        let parsed: Wrapper = toml::from_str(r#"minify = "lines""#).expect("valid toml");
        assert_eq!(parsed.minify, MinifyMode::Lines);
        assert_eq!(MinifyMode::Off.to_string(), "off");
    }
}
