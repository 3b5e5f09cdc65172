use std::{path::PathBuf, sync::Arc};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use client_core::{HttpPredictionClient, InputStateHolder, SubmissionController, SubmissionState};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;
mod session;

use config::{load_settings, DEFAULT_CONFIG_PATH};

#[derive(Parser, Debug)]
#[command(name = "predictor", about = "Predict engine performance from throttle and gear")]
struct Cli {
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,
    #[arg(long)]
    service_url: Option<String>,
    /// Request timeout in seconds; 0 disables it.
    #[arg(long)]
    timeout_secs: Option<u64>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a single prediction and print the results.
    Predict {
        #[arg(long, allow_negative_numbers = true)]
        throttle: Option<f64>,
        #[arg(long, allow_negative_numbers = true)]
        gear: Option<i64>,
    },
    /// Read commands from stdin and print each prediction as it completes.
    Interactive,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut settings = load_settings(&cli.config);
    if let Some(service_url) = cli.service_url {
        settings.service_url = service_url;
    }
    if let Some(timeout_secs) = cli.timeout_secs {
        settings.request_timeout_secs = Some(timeout_secs);
    }

    let client = HttpPredictionClient::new(settings.client_options())
        .context("failed to configure prediction client")?;
    info!(endpoint = %client.endpoint(), "prediction client ready");

    let controller = Arc::new(SubmissionController::new(Arc::new(client)));
    let mut holder = InputStateHolder::new(settings.initial_input());

    match cli.command {
        Command::Predict { throttle, gear } => {
            if let Some(throttle) = throttle {
                holder.set_throttle(throttle);
            }
            if let Some(gear) = gear {
                holder.set_gear(gear);
            }
            let input = holder.current();
            println!("{}", session::describe_input(&input));

            match controller.submit_current(&holder).await {
                state @ SubmissionState::Success(_) => {
                    println!("{}", session::format_state(&state));
                }
                SubmissionState::Failure(err) => bail!("{err}"),
                other => bail!("prediction did not complete: {other:?}"),
            }
        }
        Command::Interactive => session::run(controller, holder).await?,
    }

    Ok(())
}
