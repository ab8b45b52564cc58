//! upf-client 入口

use std::time::Duration;

use clap::Parser;
use upf_client::cli::{Cli, CommandRunner, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // 日志写到 stderr，不干扰表格和 JSON 输出
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| cli.log_level.clone().into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let runner = CommandRunner::new(
        cli.endpoints.into(),
        cli.format,
        Duration::from_millis(cli.timeout_ms),
    );

    match cli.command {
        Commands::Flow { fseid, limit } => runner.run_flow(&fseid, limit).await?,
        Commands::Config => runner.run_config().await?,
        Commands::Imsi { imsi } => runner.run_imsi(&imsi).await?,
        Commands::Rule { fseid } => runner.run_rule(&fseid).await?,
        Commands::Validate { imsi, pdr_id, dnn } => {
            runner.run_validate(&imsi, &pdr_id, &dnn).await?
        }
        Commands::ValidateHttp { imsi, pdr_id, dnn } => {
            runner.run_validate_http(&imsi, &pdr_id, &dnn).await?
        }
    }

    Ok(())
}
