//! Host platform (linux for example) utility functions

use std::path::PathBuf;

/// Name of the environment variable pointing at the software root, which
/// contains the `params` and `sessions` directories.
pub const SW_ROOT_ENV_VAR: &str = "TRACK_GRID_ROOT";

/// Retrieve uname information.
pub fn get_uname() -> std::io::Result<uname::Info> {
    uname::uname()
}

/// Get the software root directory from the environment.
pub fn get_sw_root() -> Result<PathBuf, std::env::VarError> {
    std::env::var(SW_ROOT_ENV_VAR).map(PathBuf::from)
}
