//! Download bootstrap script generation
//!
//! The installer is a small Lua program for the target host: it removes an
//! old install directory, recreates the directory layout and downloads every
//! file from a fixed base URL. The generated text only depends on the
//! discovered tree and the base URL, so it is as reproducible as the
//! bundle itself.

use std::fmt::Write;

use log::debug;

use crate::{
    config::InstallerConfig, discovery::SourceTree, error::BundleError, util::lua_string_literal,
};

const INSTALLER_BODY: &str = r#"-- Remove the old install directory if it exists.
if fs.exists(install_dir) then
    print("Removing old " .. install_dir .. " directory...")
    fs.delete(install_dir)
end

-- Create the directories.
print("Creating " .. install_dir .. " directory...")
for _, dir in ipairs(dirs) do
    fs.makeDir(dir)
end

-- Download the files.
local total = #files
for index, file in ipairs(files) do
    local url = base_url .. file
    print("Downloading (" .. index .. "/" .. total .. "): " .. url)
    local response, err = http.get(url)
    if not response then
        error("Failed to download " .. url .. ": " .. tostring(err), 0)
    end
    local contents = response.readAll()
    response.close()
    local handle = fs.open(file, "w")
    handle.write(contents)
    handle.close()
end

print("All files downloaded successfully!")
"#;

/// Render the installer script for `tree`
pub fn render_installer(tree: &SourceTree, config: &InstallerConfig) -> Result<String, BundleError> {
    let base_url = config
        .base_url
        .as_deref()
        .filter(|url| !url.trim().is_empty())
        .ok_or_else(|| BundleError::config("the installer needs `installer.base_url` (--base-url)"))?;
    let base_url = if base_url.ends_with('/') {
        base_url.to_string()
    } else {
        format!("{base_url}/")
    };
    let install_dir = &tree.root_name;

    debug!(
        "Rendering installer for {} directories and {} files",
        tree.directories.len(),
        tree.files.len()
    );

    let mut script = String::new();
    let _ = writeln!(script, "-- Installer generated by luapack. Do not edit by hand.");
    let _ = writeln!(script, "local base_url = {}", lua_string_literal(&base_url));
    let _ = writeln!(script, "local install_dir = {}", lua_string_literal(install_dir));
    script.push('\n');
    push_string_list(&mut script, "dirs", &tree.directories);
    push_string_list(&mut script, "files", &tree.files);
    script.push_str(INSTALLER_BODY);
    Ok(script)
}

fn push_string_list(script: &mut String, name: &str, entries: &[String]) {
    let _ = writeln!(script, "local {name} = {{");
    for entry in entries {
        let _ = writeln!(script, "    {},", lua_string_literal(entry));
    }
    script.push_str("}\n\n");
}
