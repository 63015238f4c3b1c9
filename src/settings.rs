// src/settings.rs

use std::{
    net::SocketAddr,
    path::{Path, PathBuf},
};

use clap::{Parser, Subcommand};
use config::{builder::DefaultState, ConfigBuilder, ConfigError, File};
use serde::{Deserialize, Serialize};

const DEFAULT_ADDR: &str = "127.0.0.1:8000";
const DEFAULT_STORE_PATH: &str = "finance-chat-db";
const DEFAULT_DATABASE: &str = "finance_chat";
const DEFAULT_MAX_TURNS: i64 = 20;

#[derive(Parser, Debug)]
#[command(version)]
pub struct Args {
    /// Path to the local configuration TOML file.
    #[arg(short, value_name = "CONFIG_PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve the GraphQL endpoint.
    Serve,
    /// Answer a single question and print the result.
    Ask {
        /// The question, in free text.
        question: String,
    },
    /// Load `customers.json`, `accounts.json` and `transactions.json` (JSON lines).
    Seed {
        #[arg(value_name = "DATA_DIR")]
        dir: PathBuf,
    },
    /// Check that the store can be reached.
    Health,
    /// Print data gap counts and actionable insights.
    Insights,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Web {
    #[serde(deserialize_with = "deserialize_socket_addr")]
    pub address: SocketAddr,
}

/// Where the document store lives.
///
/// Passed to [`crate::database::Database::connect`]; nothing reads the
/// environment behind its back.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StoreSettings {
    pub path: PathBuf,
    /// Namespace prefix of the collection trees.
    pub database: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MemorySettings {
    pub max_turns: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Settings {
    pub web: Web,
    pub store: StoreSettings,
    pub memory: MemorySettings,
}

impl Settings {
    /// Load settings from the given TOML file, with sane defaults.
    ///
    /// Without a file every value falls back to its default.
    pub fn from_file(path: Option<&Path>) -> Result<Self, ConfigError> {
        let builder = ConfigBuilder::<DefaultState>::default()
            .set_default("web.address", DEFAULT_ADDR)?
            .set_default("store.path", DEFAULT_STORE_PATH)?
            .set_default("store.database", DEFAULT_DATABASE)?
            .set_default("memory.max_turns", DEFAULT_MAX_TURNS)?;

        let builder = match path {
            Some(path) => builder.add_source(File::from(path)),
            None => builder,
        };

        builder.build()?.try_deserialize()
    }
}

fn deserialize_socket_addr<'de, D>(deserializer: D) -> Result<SocketAddr, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    s.parse().map_err(serde::de::Error::custom)
}
