//! Module registry generation for code bundling
//!
//! This module handles:
//! - The registry tables and the shadow `require` placed at the top of a bundle
//! - Registry assignments that wrap each module body in a deferred function
//! - The namespace table returned at the end of the bundle

use crate::{module_registry::ModuleUnit, util::lua_string_literal};

/// Name of the generated table mapping module ids to loader functions
pub const MODULES_TABLE: &str = "__luapack_modules";

/// Prefix reserved for generated locals
pub const RESERVED_PREFIX: &str = "__luapack_";

/// Registry tables and the shadow resolver
///
/// The resolver follows Lua 5.1 `require`: results are cached, a module that
/// returns nothing yields `true`, re-entering a module that is still loading
/// is an error, and the module name is passed as the loader's argument. Ids
/// missing from the bundle go to the host's own `require`.
const RESOLVER: &str = r#"local __luapack_modules = {}
local __luapack_loaded = {}
local __luapack_loading = {}
local __luapack_native_require = require
local function require(name)
    local loader = __luapack_modules[name]
    if loader == nil then
        if __luapack_native_require == nil then
            error("module '" .. tostring(name) .. "' not found", 2)
        end
        return __luapack_native_require(name)
    end
    local cached = __luapack_loaded[name]
    if cached ~= nil then
        return cached
    end
    if __luapack_loading[name] then
        error("loop or previous error loading module '" .. tostring(name) .. "'", 2)
    end
    __luapack_loading[name] = true
    local result = loader(name)
    if result == nil then
        result = true
    end
    __luapack_loaded[name] = result
    return result
end"#;

/// Generate the prologue statements, one per line
pub fn generate_registry_init(namespace: &str) -> Vec<String> {
    RESOLVER
        .lines()
        .map(str::to_string)
        .chain(std::iter::once(format!(
            "local {namespace} = {{ require = require }}"
        )))
        .collect()
}

/// Generate the registry assignment for one module
///
/// Returns the opening line, the body and the closing `end` as separate
/// parts so the caller can decide how to join them.
pub fn generate_module_assignment(unit: &ModuleUnit) -> [String; 3] {
    [
        format!(
            "{MODULES_TABLE}[{}] = function(...)",
            lua_string_literal(&unit.module_id)
        ),
        unit.body.trim_end_matches(['\r', '\n']).to_string(),
        "end".to_string(),
    ]
}

/// Generate the statement that hands the namespace back to the loader
pub fn generate_export(namespace: &str) -> String {
    format!("return {namespace}")
}
