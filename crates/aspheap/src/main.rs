//! aspheap: exercise a pool of recycled parse arenas.

use std::process::ExitCode;

use aspheap_lib::{app, config, errors};

fn main() -> ExitCode {
    let config = config::AppConfig::parse();

    let default_level = if config.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .init();

    match app::run(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::from(errors::exit_code(&err))
        }
    }
}
