pub mod add_code;
pub mod show;

use rsmanifest_core::UserConfig;
use std::path::{Path, PathBuf};

/// Resolve the user manifest path, reporting failures on stderr.
fn user_manifest_path(config: &UserConfig, explicit: Option<&Path>) -> Option<PathBuf> {
    match config.user_manifest_path(explicit) {
        Ok(path) => {
            tracing::debug!(path = %path.display(), "using user manifest");
            Some(path)
        }
        Err(e) => {
            eprintln!("error: {e}");
            None
        }
    }
}
