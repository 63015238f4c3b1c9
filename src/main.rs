mod agent;
mod api;
mod composer;
mod database;
mod executor;
mod memory;
mod nlp;
mod planner;
mod query;
mod settings;
mod similarity;
mod time_window;
mod web;
mod world_model;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::{
    agent::Agent,
    database::{Database, Store},
    settings::{Args, Command, Settings},
    world_model::{actionable_insights, scan},
};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let settings = Settings::from_file(args.config.as_deref()).with_context(|| {
        format!(
            "Problem while loading settings from {}",
            args.config
                .as_deref()
                .map_or("defaults".into(), |p| p.display().to_string())
        )
    })?;
    let database = Database::connect(&settings.store)?;

    match args.command {
        Command::Serve => {
            let schema = api::schema(database, settings.memory.max_turns);
            web::serve(schema, settings.web.address).await;
        }
        Command::Ask { question } => {
            let agent = Agent::new(database);
            let answer = agent.handle_query(&question)?;
            println!("{}", answer.answer);
            for row in answer.table.rows() {
                println!("{}", serde_json::to_string(row)?);
            }
        }
        Command::Seed { dir } => {
            for (collection, inserted) in database.seed(&dir)? {
                info!("{collection}: {inserted} documents");
            }
        }
        Command::Health => {
            let (ok, message) = database.healthcheck();
            if !ok {
                error!("{message}");
                anyhow::bail!(message);
            }
            println!("{message}");
        }
        Command::Insights => {
            let gaps = scan(&database)?;
            println!("{}", serde_json::to_string_pretty(&gaps)?);
            for insight in actionable_insights(&gaps) {
                println!("- {insight}");
            }
        }
    }
    Ok(())
}
