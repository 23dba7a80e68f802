use clap::Parser;
use hemma::config::Config;
use tracing_subscriber::EnvFilter;

/// Self-hosted smart-home web gateway with stateless cookie sessions.
#[derive(Debug, Parser)]
#[command(name = "hemma", version, about)]
struct Cli {
    /// Address to bind the gateway to.
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Port to listen on.
    #[arg(long, default_value_t = 8433)]
    port: u16,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    // Missing secrets are a startup failure, never a per-request surprise.
    let config = Config::from_env()?;

    hemma::gateway::run_gateway(&cli.host, cli.port, config).await
}
