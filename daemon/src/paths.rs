/// Canonical file paths for the daemon's data files.
///
/// Both files live in the data directory:
///   - config.toml  Written by the operator, read (and watched) by the daemon.
///   - status.toml  Written by the daemon after every sync.
use std::path::PathBuf;

pub const HOME_ENV: &str = "CHATSTATES_HOME";
const APP_DIR_NAME: &str = "ChatStates";
const XDG_DIR_NAME: &str = "chatstates";
pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const STATUS_FILE_NAME: &str = "status.toml";

/// Returns the data directory: `$CHATSTATES_HOME`, else `%APPDATA%\ChatStates`,
/// else `$HOME/.config/chatstates`, else `./chatstates`.
pub fn app_data_dir() -> PathBuf {
    resolve_data_dir(|key| std::env::var(key).ok().filter(|v| !v.is_empty()))
}

fn resolve_data_dir(var: impl Fn(&str) -> Option<String>) -> PathBuf {
    if let Some(home) = var(HOME_ENV) {
        return PathBuf::from(home);
    }
    if let Some(appdata) = var("APPDATA") {
        return PathBuf::from(appdata).join(APP_DIR_NAME);
    }
    if let Some(home) = var("HOME") {
        return PathBuf::from(home).join(".config").join(XDG_DIR_NAME);
    }
    PathBuf::from(XDG_DIR_NAME)
}

/// Returns the full path to the config file.
pub fn config_file_path() -> PathBuf {
    app_data_dir().join(CONFIG_FILE_NAME)
}

/// Returns the full path to the status file.
pub fn status_file_path() -> PathBuf {
    app_data_dir().join(STATUS_FILE_NAME)
}
