//! Module id derivation
//!
//! A module id is the file's root-relative path without its extension, with
//! `/` replaced by `.`, the same dotted form Lua's `require` uses. Because `.`
//! is the delimiter, segments that already contain a dot are rejected instead
//! of being silently merged; this keeps the mapping injective.

use cow_utils::CowUtils;

use crate::error::BundleError;

/// Separator between path segments in a module id
pub const MODULE_ID_DELIMITER: char = '.';

/// Derive the registry key for a normalized relative path
///
/// `relative_path` must use `/` separators and end with `.<extension>`.
/// `prefix`, when given, is prepended as an extra leading segment.
pub fn derive_module_id(
    relative_path: &str,
    extension: &str,
    prefix: Option<&str>,
) -> Result<String, BundleError> {
    let invalid = |reason: String| BundleError::InvalidModulePath {
        path: relative_path.to_string(),
        reason,
    };

    let stem = relative_path
        .strip_suffix(extension)
        .and_then(|rest| rest.strip_suffix('.'))
        .ok_or_else(|| invalid(format!("expected a '.{extension}' file")))?;

    for segment in stem.split('/') {
        validate_segment(segment).map_err(&invalid)?;
    }

    let id = stem.cow_replace("/", ".");
    match prefix {
        Some(prefix) => {
            validate_prefix(prefix)?;
            Ok(format!("{prefix}{MODULE_ID_DELIMITER}{id}"))
        }
        None => Ok(id.into_owned()),
    }
}

/// Check a configured module id prefix
///
/// A prefix may itself be dotted (`game.lib`), but every part must be a
/// non-empty segment.
pub fn validate_prefix(prefix: &str) -> Result<(), BundleError> {
    for segment in prefix.split(MODULE_ID_DELIMITER) {
        if segment.is_empty() || segment.contains('/') {
            return Err(BundleError::config(format!(
                "invalid module prefix '{prefix}'"
            )));
        }
    }
    Ok(())
}

fn validate_segment(segment: &str) -> Result<(), String> {
    if segment.is_empty() {
        return Err("empty path segment".to_string());
    }
    if segment.contains(MODULE_ID_DELIMITER) {
        return Err(format!(
            "segment '{segment}' contains '{MODULE_ID_DELIMITER}', which would make the module id \
             ambiguous"
        ));
    }
    Ok(())
}
