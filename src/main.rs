//! Falcon 9 landing prediction - command-line entry point

use clap::Parser;
use falcon_landing::cli::{cmd_collect, cmd_generate, cmd_predict, cmd_run, cmd_summary, Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "falcon_landing=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Generate { output, samples, seed } => {
            cmd_generate(&output, samples, seed)?;
        }
        Commands::Collect { output, base_url, timeout_secs } => {
            cmd_collect(&output, base_url.as_deref(), timeout_secs).await?;
        }
        Commands::Summary { data, report } => {
            cmd_summary(&data, report.as_deref())?;
        }
        Commands::Predict { data, report, pipeline } => {
            cmd_predict(&data, report.as_deref(), &pipeline)?;
        }
        Commands::Run { source, data, out_dir, samples, pipeline } => {
            cmd_run(source, data.as_deref(), &out_dir, samples, &pipeline).await?;
        }
    }

    Ok(())
}
