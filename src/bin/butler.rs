use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;

use butler::broker::{self, Broker};
use butler::broker::server::DEFAULT_PORT;
use butler::loader::load_flow_from_yaml;
use butler::report::{HttpReporter, TaskPatch};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the progress broker daemon
    Serve {
        #[arg(long, default_value_t = DEFAULT_PORT)]
        port: u16,
    },

    /// Send a one-shot task update to a running broker
    Report {
        /// Task id to update
        id: String,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        description: Option<String>,

        /// Progress in [0, 1]
        #[arg(long)]
        progress: Option<f64>,

        /// Broker base URL
        #[arg(long, default_value = "http://localhost:2048")]
        endpoint: String,
    },

    /// Validate and summarize a flow definition file
    Check {
        /// Path to the flow YAML file
        #[arg(long, short)]
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { port } => {
            info!("Starting Butler broker on port {port}");
            broker::serve(Arc::new(Broker::new()), port).await?;
        }

        Commands::Report {
            id,
            title,
            description,
            progress,
            endpoint,
        } => {
            let url = format!("{}/update/{}", endpoint.trim_end_matches('/'), id);
            let reporter = HttpReporter::new(url);
            reporter
                .send(TaskPatch {
                    title,
                    description,
                    progress,
                })
                .await?;
            info!("Update delivered");
        }

        Commands::Check { file } => {
            let flow = load_flow_from_yaml(&file)?;
            println!("Flow: {} ({} actions)", flow.name, flow.actions.len());
            for (index, action) in flow.actions.iter().enumerate() {
                println!(
                    "  {:>2}. {:?}{}",
                    index + 1,
                    action.kind,
                    if action.enabled { "" } else { " (disabled)" }
                );
            }
        }
    }

    Ok(())
}
