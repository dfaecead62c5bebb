mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::Directive;

#[derive(Parser)]
#[command(name = "rsmanifest")]
#[command(about = "Record installed code versions in rsmanifest.json")]
struct Cli {
    /// User manifest to read and write (default: ~/rsmanifest.json)
    #[arg(long, global = true, value_name = "PATH")]
    user_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Record an installed code in the user manifest
    AddCode {
        /// Name of the package
        name: String,

        /// Commit or version
        version: String,

        /// Repository or source link
        uri: String,

        /// Directory the code was installed from
        source_d: String,

        /// Virtualenv the code was installed into
        #[arg(long)]
        virtual_env: Option<String>,
    },

    /// Print a manifest as JSON
    Show {
        /// Show the container manifest instead of the user manifest
        #[arg(long)]
        container: bool,
    },

    /// List recorded codes by virtualenv
    List,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match "rsmanifest_core=warn".parse::<Directive>() {
        Ok(directive) => EnvFilter::from_default_env().add_directive(directive),
        Err(_) => EnvFilter::from_default_env(),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let user_file = cli.user_file.as_deref();
    match cli.command {
        Command::AddCode {
            name,
            version,
            uri,
            source_d,
            virtual_env,
        } => commands::add_code::run(
            user_file,
            name,
            version,
            uri,
            source_d,
            virtual_env,
        ),
        Command::Show { container } => commands::show::run(user_file, container),
        Command::List => commands::show::list(user_file),
    }
}
