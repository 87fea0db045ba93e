use clap::{Parser, Subcommand};
use rst_common::with_tokio::tokio;

use prople_jsonrpc_axum::rpc::RpcError;
use prople_snapd::svc::rpc::Rpc;

#[derive(Parser)]
#[command(name = "snapd")]
#[command(version = "0.1")]
#[command(about = "Prople snap identity agent daemon", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(name = "rpc")]
    #[command(about = "Running JSON-RPC server")]
    Rpc {
        #[arg(short, long, value_name = "FILE")]
        config: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), RpcError> {
    let cli = Cli::parse();
    match &cli.command {
        Commands::Rpc { config } => {
            let rpc_server = Rpc::new(config.to_owned());
            let svc = rpc_server.svc()?;
            let _ = svc.serve().await?;
        }
    }

    Ok(())
}
