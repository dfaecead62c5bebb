//! Show and list command implementations.

use rsmanifest_core::{CONTAINER_FILE, Manifest, UserConfig, json};
use std::path::Path;
use std::process::ExitCode;

pub fn run(user_file: Option<&Path>, container: bool) -> ExitCode {
    let manifest = if container {
        Manifest::load(CONTAINER_FILE)
    } else {
        let config = UserConfig::load();
        let Some(path) = super::user_manifest_path(&config, user_file) else {
            return ExitCode::FAILURE;
        };
        Manifest::load(&path)
    };

    let manifest = match manifest {
        Ok(m) => m,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    match json::to_string_pretty(&manifest) {
        Ok(s) => {
            print!("{s}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

pub fn list(user_file: Option<&Path>) -> ExitCode {
    let config = UserConfig::load();
    let Some(path) = super::user_manifest_path(&config, user_file) else {
        return ExitCode::FAILURE;
    };

    let manifest = match Manifest::load(&path) {
        Ok(m) => m,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let mut empty = true;
    for (venv, codes) in &manifest.codes {
        if codes.is_empty() {
            continue;
        }
        empty = false;
        if venv.is_empty() {
            println!("[system]");
        } else {
            println!("[{venv}]");
        }
        for entry in codes.values() {
            println!(
                "  {:<15} {:<12} {}  {}",
                entry.name, entry.version, entry.installed, entry.uri
            );
        }
    }

    if empty {
        println!("no codes recorded");
    }
    ExitCode::SUCCESS
}
