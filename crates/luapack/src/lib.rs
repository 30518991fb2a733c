//! Bundle a directory of Lua modules into one self-contained chunk
//!
//! Every module file becomes a deferred unit keyed by its dotted module id.
//! The bundle installs a local `require` that serves those units first and
//! falls back to the host's `require` for anything else.

pub mod code_generator;
pub mod config;
pub mod dirs;
pub mod discovery;
pub mod error;
pub mod installer;
pub mod minifier;
pub mod module_id;
pub mod module_registry;
pub mod orchestrator;
pub mod types;
pub mod util;
pub mod writer;

pub use config::Config;
pub use error::{BundleError, Diagnostic};
pub use orchestrator::{BundleOrchestrator, BundleReport};
pub use types::MinifyMode;
