//! Code generation for bundling Lua modules into a single file
//!
//! This module implements the registry bundling approach which:
//! - Wraps each module body in a deferred `function(...) ... end`
//! - Stores the wrappers in a local table keyed by module id
//! - Shadows `require` with a resolver that checks the local table first
//!   and falls back to the host's `require` for everything else

pub mod bundler;
pub mod module_registry;

// Re-export the main bundler and key types
pub use bundler::{BUNDLE_HEADER, BundleParams, Bundler};
