use anyhow::Result;
use clap::Parser;
use stockledger::cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    stockledger::telemetry::init(cli.verbose, cli.log_json);
    cli.run().await
}
