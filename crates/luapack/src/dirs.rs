use std::path::PathBuf;

use etcetera::{BaseStrategy, choose_base_strategy};

/// Name of the configuration file, both per project and per user
pub const CONFIG_FILE_NAME: &str = "luapack.toml";

/// Directory holding the user-level configuration
///
/// `$XDG_CONFIG_HOME/luapack` on Unix-likes, `%APPDATA%\luapack` on Windows.
/// Returns `None` when no home directory can be determined.
pub fn user_config_dir() -> Option<PathBuf> {
    choose_base_strategy()
        .ok()
        .map(|strategy| strategy.config_dir().join("luapack"))
}

/// Path of the user-level configuration file, whether or not it exists
pub fn user_config_file() -> Option<PathBuf> {
    user_config_dir().map(|dir| dir.join(CONFIG_FILE_NAME))
}
