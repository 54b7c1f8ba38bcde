use std::env;
use std::process::ExitCode;

use anyhow::{Context, Result};
use pagesource_cli::{CliCommand, parse_arguments, print_help, print_version, run};
use pagesource_core::ReqwestFetcher;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // stdout carries the JSON body only
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn,pagesource_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let raw_args = env::args().skip(1).collect::<Vec<_>>();
    let options = match parse_arguments(&raw_args)? {
        CliCommand::Run(options) => options,
        CliCommand::Help => {
            print_help();
            return Ok(ExitCode::SUCCESS);
        }
        CliCommand::Version => {
            print_version();
            return Ok(ExitCode::SUCCESS);
        }
    };

    let fetcher = ReqwestFetcher::new().context("failed to set up the HTTP client")?;
    let outcome = run(&options, &fetcher).await?;

    println!("{}", outcome.output);
    Ok(ExitCode::from(outcome.exit_code))
}
