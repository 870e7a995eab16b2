use alloy_primitives::Address;
use arb_keeper::execution::FlashLoanExecutor;
use arb_keeper::{config, keeper};
use clap::{Parser, Subcommand};
use eyre::Result;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(version, about = "Cross-route arbitrage keeper for constant-product pools")]
struct Args {
    /// Path to the TOML configuration file
    #[arg(long, default_value = "config.toml")]
    config: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Watch blocks and trigger flash-loan arbitrage (default)
    Run,
    /// Withdraw accumulated profit from the flash-loan contract
    Withdraw,
    /// Rotate the keeper address authorized on the contract
    ChangeKeeper {
        /// Address of the new keeper
        new_keeper: Address,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let config = config::load(&args.config)?;

    match args.command.unwrap_or(Command::Run) {
        Command::Run => keeper::run(config).await,
        Command::Withdraw => {
            let executor = executor(&config)?;
            executor.withdraw(config.assets.stable).await?;
            Ok(())
        }
        Command::ChangeKeeper { new_keeper } => {
            let executor = executor(&config)?;
            executor.change_keeper(new_keeper).await?;
            Ok(())
        }
    }
}

fn executor(config: &config::KeeperConfig) -> Result<FlashLoanExecutor> {
    FlashLoanExecutor::new(
        &config.rpc.http_url,
        &config.executor.private_key,
        config.executor.flashloan_address,
    )
}
