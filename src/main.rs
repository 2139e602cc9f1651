//! compat-check - conformance checks for OpenAI-compatible servers
//!
//! Runs a catalog of checks against a chat completions server and reports
//! the results as a console tree or a JSON document. The exit code is the
//! number of failed tests, capped at 127.

use clap::Parser;
use compat_check::commands::Args;
use compat_check::{cli, common::logging};

#[tokio::main]
async fn main() {
    let args = Args::parse();
    logging::init_cli(args.verbose);

    match cli::dispatch(args).await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}
