use anyhow::Result;
use clap::{Parser, Subcommand};
use etaforum_backend::config::{DatabaseConfig, ForumConfig};
use etaforum_backend::node::ForumNode;
use etaforum_backend::{bootstrap, telemetry, utils};

#[derive(Parser)]
#[command(author, version, about = "Course forum backend with AI-assisted answers")]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server (Axum) for REST/API access
    Serve {
        /// Listen port, overrides `PORT`
        #[arg(long)]
        port: Option<u16>,
    },
    /// Apply the database schema and exit
    Migrate,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    telemetry::init_tracing();

    let args = Args::parse();

    match args.command.unwrap_or(Command::Serve { port: None }) {
        Command::Serve { port } => {
            let mut config = ForumConfig::from_env()?;
            if let Some(port) = port {
                config.api_port = port;
            }
            let node = ForumNode::start(config).await?;
            tracing::info!(
                app = utils::APP_NAME,
                port = node.config().api_port,
                "bootstrap complete"
            );
            node.run_http_server().await
        }
        Command::Migrate => {
            // only the store is needed here, the answer service may be unset
            let resources = bootstrap::initialize(&DatabaseConfig::from_env()?).await?;
            tracing::info!(
                database_initialized = resources.database_initialized,
                "schema is up to date"
            );
            Ok(())
        }
    }
}
