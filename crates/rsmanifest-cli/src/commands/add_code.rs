//! Add-code command implementation.

use rsmanifest_core::{NewCode, UserConfig, add_code};
use std::path::Path;
use std::process::ExitCode;

pub fn run(
    user_file: Option<&Path>,
    name: String,
    version: String,
    uri: String,
    source_d: String,
    virtual_env: Option<String>,
) -> ExitCode {
    let config = UserConfig::load();
    let Some(path) = super::user_manifest_path(&config, user_file) else {
        return ExitCode::FAILURE;
    };

    let virtual_env = virtual_env.or(config.manifest.default_virtual_env);
    let code = NewCode {
        name,
        version,
        uri,
        source_d,
    };
    let name = code.name.clone();

    match add_code(&path, code, virtual_env.as_deref()) {
        Ok(_) => {
            println!("recorded: {name} -> {}", path.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
