use anyhow::Context;
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use std::path::PathBuf;
use std::sync::Arc;

use credo_rs::credo::config::{ComparatorKind, VerifierConfig};
use credo_rs::credo::directory::fixtures;
use credo_rs::credo::server::{self, AppState, VerificationResponse};
use credo_rs::credo::workflow::{Builder, Stage, VerificationGraph};

#[derive(Parser, Debug)]
#[command(author, version, about = "Healthcare provider directory verification", long_about = None)]
struct Args {
    /// YAML config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Scores strictly above this are written back to the directory
    #[arg(long, global = true)]
    threshold: Option<u8>,

    /// fixture, field or llm
    #[arg(long, global = true)]
    comparator: Option<ComparatorKind>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Verify a single provider
    Verify {
        #[arg(short, long)]
        provider_id: String,

        /// Print the full result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Serve the verification HTTP API
    Serve {
        #[arg(long)]
        host: Option<String>,

        #[arg(short, long)]
        port: Option<u16>,
    },
    /// List the sample providers
    Fixtures,
}

fn load_config(args: &Args) -> anyhow::Result<VerifierConfig> {
    let mut config = VerifierConfig::load(args.config.as_deref()).context("loading config")?;
    if let Some(threshold) = args.threshold {
        config.confidence_threshold = threshold;
    }
    if let Some(comparator) = args.comparator {
        config.comparator = comparator;
    }
    Ok(config.validate()?)
}

fn build_graph(config: &VerifierConfig) -> anyhow::Result<VerificationGraph> {
    let graph = Builder::from_config(config)
        .and_then(Builder::build)
        .context("building verification workflow")?;
    Ok(graph)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::init();

    let args = Args::parse();
    let config = load_config(&args)?;

    log::info!(
        "Using {:?} comparator with threshold {}",
        config.comparator,
        config.confidence_threshold
    );

    match args.command {
        Commands::Verify { provider_id, json } => {
            let graph = build_graph(&config)?;
            let state = graph.run(&provider_id).await;
            let failed = state.stage == Stage::Failed;

            if json {
                let response = VerificationResponse::from_state(state);
                println!("{}", serde_json::to_string_pretty(&response)?);
            } else {
                for line in &state.status_log {
                    println!("{}", line);
                }
                println!();
                println!("Stage:      {}", state.stage.as_str());
                println!("Decision:   {}", state.decision.as_str());
                if let Some(score) = state.confidence_score {
                    println!("Confidence: {}%", score);
                }
                for d in &state.discrepancies {
                    println!(
                        "  {}: '{}' (database) vs '{}' (web)",
                        d.field, d.db_value, d.scraped_value
                    );
                }
            }

            if failed {
                std::process::exit(1);
            }
        }
        Commands::Serve { host, port } => {
            tracing::subscriber::set_global_default(tracing_subscriber::fmt().finish())
                .context("installing tracing subscriber")?;

            let host = host.unwrap_or_else(|| config.server.host.clone());
            let port = port.unwrap_or(config.server.port);
            let graph = build_graph(&config)?;

            let state = AppState {
                graph: Arc::new(graph),
                threshold: config.confidence_threshold,
            };
            server::serve(&host, port, state).await?;
        }
        Commands::Fixtures => {
            println!(
                "{:<6} {:<24} {:<18} {:<12} {:>5}",
                "ID", "Name", "Specialty", "City", "Score"
            );
            for (id, fixture) in fixtures::all() {
                let db = &fixture.database;
                println!(
                    "{:<6} {:<24} {:<18} {:<12} {:>5}",
                    id, db.name, db.specialty, db.city, fixture.confidence
                );
            }
        }
    }

    Ok(())
}
