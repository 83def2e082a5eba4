#![allow(clippy::cargo_common_metadata)]

use std::{io::stderr, process::ExitCode};

pub(crate) mod cli;

use pydeps::fmt::Label;

fn main() -> ExitCode {
    // Standard output is reserved for the list of dependencies
    tracing_subscriber::fmt()
        .compact()
        .with_env_filter(tracing_subscriber::filter::EnvFilter::from_default_env())
        .with_writer(stderr)
        .with_target(true)
        .with_timer(tracing_subscriber::fmt::time::uptime())
        .with_level(true)
        .init();

    match cli::Cli::new().run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{}\n{err:?}", Label::Error);
            ExitCode::FAILURE
        }
    }
}
