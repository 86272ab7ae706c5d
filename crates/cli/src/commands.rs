//! CLI commands

use anyhow::{Context, Result};
use clap::Subcommand;
use nomdoc_core::{MemoryStorage, SharedStorage};
use nomdoc_http::session::{SessionHandle, connect};
use serde_json::{Value, json};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

use crate::config;

#[derive(Subcommand)]
pub enum Commands {
    /// Log in with email and password and print the session status
    Login {
        #[arg(long)]
        email: String,

        #[arg(long, env = "NOMDOC_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Log in, then run a graph query and print its data
    Query {
        #[arg(long)]
        email: String,

        #[arg(long, env = "NOMDOC_PASSWORD", hide_env_values = true)]
        password: String,

        /// Graph query document
        query: String,

        /// Query variables as a JSON object
        #[arg(long)]
        variables: Option<String>,

        /// Revoke the session once the query has run
        #[arg(long)]
        logout: bool,
    },

    /// Have a login token mailed to an address
    RequestLoginToken {
        #[arg(long)]
        email: String,
    },

    /// Generate a default configuration file
    InitConfig {
        /// Output file path (defaults to <state dir>/config.toml)
        output: Option<PathBuf>,
    },
}

impl Commands {
    pub async fn execute(self, config_path: Option<PathBuf>, state_dir: &Path) -> Result<()> {
        match self {
            Commands::InitConfig { output } => {
                let path = output.unwrap_or_else(|| state_dir.join(config::CONFIG_FILE_NAME));
                config::write_default_config(&path)?;
                println!("Configuration written to {}", path.display());
                Ok(())
            }
            Commands::Login { email, password } => {
                let handle = open_session(config_path.as_deref(), state_dir)?;
                handle.session.login_with_password(&email, &password).await?;
                print_json(&json!({"status": handle.session.status().to_string()}))
            }
            Commands::Query {
                email,
                password,
                query,
                variables,
                logout,
            } => {
                let variables = variables
                    .as_deref()
                    .map(serde_json::from_str::<Value>)
                    .transpose()
                    .context("--variables is not valid JSON")?;

                let handle = open_session(config_path.as_deref(), state_dir)?;
                handle.session.login_with_password(&email, &password).await?;
                let data: Value = handle
                    .client
                    .query_graph(&query, variables.as_ref())
                    .await?;
                print_json(&data)?;

                if logout {
                    handle.session.logout().await?;
                }
                Ok(())
            }
            Commands::RequestLoginToken { email } => {
                let handle = open_session(config_path.as_deref(), state_dir)?;
                let sent = handle.session.login_with_token(&email).await?;
                info!("Login token sent to {}", sent.email_address);
                print_json(&json!({"emailAddress": sent.email_address}))
            }
        }
    }
}

fn open_session(config_path: Option<&Path>, state_dir: &Path) -> Result<SessionHandle> {
    let session_config = config::load_config(config_path, state_dir)?;
    // A single process is a single context, so in-memory storage suffices
    let storage: Arc<dyn SharedStorage> = Arc::new(MemoryStorage::new());
    Ok(connect(&session_config, storage, None)?)
}

fn print_json(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
