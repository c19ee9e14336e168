mod activation;
mod cli;
mod config;
mod error;
mod platform;
mod toolchain;
mod version;

use std::process::ExitCode;

use clap::Parser;

use cli::{output, Cli, Command};

fn main() -> ExitCode {
    let cli = Cli::parse();

    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(cli::log_filter(&cli.log_level))
        .try_init();

    let result = match cli.command {
        Command::Install(args) => cli::install::run(args),
        Command::Status(args) => cli::status::run(args),
        Command::Uninstall(args) => cli::uninstall::run(args),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::error(&format!("{e:#}"));
            ExitCode::FAILURE
        }
    }
}
