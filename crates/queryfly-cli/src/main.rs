//! `qfly` - inspect and compile queryfly query strings.
//!
//! ```text
//! qfly parse "age=gte:18&_orderBy=name:1" --diagnostics
//! qfly compile "age=gte:18&_field=name" --collection users --known name,age
//! ```
//!
//! Logging goes to stderr and is controlled by `QUERYFLY_LOG` (default
//! `warn`); `-v` switches it to `debug`.

mod cli;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{run, Cli};

const ENV_LOG: &str = "QUERYFLY_LOG";

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env(ENV_LOG).unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .with_env_filter(filter)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    tracing::debug!(command = ?cli.command, "running");

    let output = run(&cli)?;
    println!("{output}");
    Ok(())
}
