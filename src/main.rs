use std::process::ExitCode;

use clap::Parser;
use popbench::cli::Cli;
use popbench::config::load_config;
use popbench::runner;
use popbench::transport::MqttConnection;
use popbench::utils::error::BenchError;
use popbench::utils::logging;
use tokio::io::AsyncWriteExt;
use tracing::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            // no-op when the run already set up logging
            logging::init("error");
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), BenchError> {
    let settings = cli.apply(load_config()?);
    logging::init(cli.effective_log_level(&settings));

    let config = settings.validate()?;
    let tls = config
        .tls
        .as_ref()
        .map(|opts| opts.client_config())
        .transpose()?;

    let report = runner::run(&config, |id| {
        MqttConnection::new(id, &config, tls.clone())
    })
    .await?;

    let rendered = report.render(config.format)?;
    match &config.output {
        Some(path) => {
            tokio::fs::write(path, rendered).await?;
            info!(path = %path.display(), "report written");
        }
        None => {
            let mut stdout = tokio::io::stdout();
            stdout.write_all(rendered.as_bytes()).await?;
            stdout.flush().await?;
        }
    }

    Ok(())
}
