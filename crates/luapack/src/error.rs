//! Error and diagnostic types for bundling runs
//!
//! Every `BundleError` is fatal and aborts the run before anything is written.
//! `Diagnostic` values are warnings: they are collected during the run and
//! reported once the bundle has been written.

use std::{fmt, path::PathBuf};

use thiserror::Error;

/// Fatal errors raised by a bundling run
#[derive(Debug, Error)]
pub enum BundleError {
    /// Bad root path, invalid option value or missing required setting
    #[error("configuration error: {0}")]
    Config(String),

    /// A path segment cannot be turned into a module id without ambiguity
    #[error("cannot derive a module id for '{path}': {reason}")]
    InvalidModulePath { path: String, reason: String },

    /// Two source files derived the same module id
    #[error("module id '{module_id}' is derived from both '{first}' and '{second}'")]
    Collision {
        module_id: String,
        first: String,
        second: String,
    },

    /// A file or directory could not be read after discovery
    #[error("failed to read {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The output artifact could not be persisted
    #[error("failed to write {}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The optional post-minify command failed
    #[error("post-minify command `{command}` failed: {reason}")]
    ExternalTool { command: String, reason: String },
}

impl BundleError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}

/// Kind of a non-fatal problem found while stripping a module
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// A block comment runs to end of file; the rest of the file was dropped
    UnterminatedBlockComment,
    /// A long string runs to end of file; it was kept verbatim
    UnterminatedLongString,
    /// A quoted string hit an unescaped line break
    UnterminatedString,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnterminatedBlockComment => {
                write!(f, "block comment is never closed, discarded to end of file")
            }
            Self::UnterminatedLongString => write!(f, "long string is never closed"),
            Self::UnterminatedString => write!(f, "unfinished string literal"),
        }
    }
}

/// A warning attached to a source location
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Normalized path of the module, empty when stripping detached text
    pub path: String,
    /// 1-based line where the offending construct starts
    pub line: usize,
    pub kind: DiagnosticKind,
}

impl Diagnostic {
    pub fn new(line: usize, kind: DiagnosticKind) -> Self {
        Self {
            path: String::new(),
            line,
            kind,
        }
    }

    /// Attach the module path the warning belongs to
    #[must_use]
    pub fn with_path(mut self, path: &str) -> Self {
        path.clone_into(&mut self.path);
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "line {}: {}", self.line, self.kind)
        } else {
            write!(f, "{}:{}: {}", self.path, self.line, self.kind)
        }
    }
}
