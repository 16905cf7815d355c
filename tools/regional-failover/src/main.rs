use anyhow::{Context, Result};
use clap::Parser;
use regional_failover::{
    AwsCloud, Cli, FailoverConfig, FailoverRunner, InteractiveConfirm, RunOutcome,
    SessionSettings,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = FailoverConfig::from(Cli::parse());
    let settings = SessionSettings::from_env();
    let environment = config.environment.clone();
    let command = config.command;

    let runner = FailoverRunner::new(config, InteractiveConfirm);
    let outcome = runner
        .run(|| AwsCloud::new(settings))
        .await
        .with_context(|| format!("{} failover of {} failed", command, environment))?;

    if outcome == RunOutcome::Declined {
        info!("Nothing was changed");
        return Ok(());
    }

    let report =
        serde_json::to_string_pretty(&outcome).context("Failed to render failover report")?;
    println!("{}", report);

    Ok(())
}
