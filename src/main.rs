// Entrypoint for the CLI application.
// - Keeps `main` small: parse arguments, set up logging, build the HTTP
//   client and output context, and hand them to the command session.
// - Every failure, setup included, is reported as `Error: <message>` and
//   exits with status 1.

use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use vespa_cli::{api::ApiClient, cli::Cli, cli::Session, output::Output};

fn init_tracing(quiet: bool, verbose: bool) {
    let filter = if quiet {
        EnvFilter::new("off")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.global.quiet, cli.global.verbose);

    let mut output = Output::terminal(cli.global.no_color);
    let client = match ApiClient::new() {
        Ok(client) => client,
        Err(e) => {
            output.error(format!("{:#}", e));
            return ExitCode::FAILURE;
        }
    };
    // The config file is located lazily, so `--target` works without a home
    let mut session = Session {
        output,
        client: &client,
        config_path: None,
    };

    if session.execute(cli) {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
