//! rexpro - command-line client for Rexster's RexPro protocol
//!
//! Provides both a REPL and one-shot script execution.

mod commands;
mod config;
mod repl;

use clap::{Parser, Subcommand};
use colored::Colorize;
use config::Config;
use rexpro_client::{Client, ConnectionConfig};
use serde_json::Value;
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "rexpro")]
#[command(about = "Command-line client for Rexster graph servers over RexPro")]
#[command(version)]
struct Cli {
    /// YAML configuration file
    #[arg(short, long, env = "REXPRO_CONFIG")]
    config: Option<PathBuf>,

    /// Server address
    #[arg(short, long)]
    server: Option<SocketAddr>,

    /// Graph to run scripts against
    #[arg(short, long, global = true)]
    graph: Option<String>,

    /// Script language
    #[arg(short, long, global = true)]
    language: Option<String>,

    /// Connect timeout in seconds
    #[arg(long)]
    connect_timeout: Option<u64>,

    /// Response timeout in seconds
    #[arg(long)]
    request_timeout: Option<u64>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start interactive REPL
    Repl,

    /// Run a script (or @file to read it from a file)
    Script {
        /// Script source
        script: String,

        /// Variable binding as name=value (value is JSON or a plain string)
        #[arg(short, long = "bind", value_parser = commands::parse_binding)]
        bindings: Vec<(String, Value)>,
    },

    /// Open a session
    Session,
}

impl Cli {
    /// Applies command-line flags on top of the loaded configuration.
    fn apply_to(&self, config: &mut Config) {
        if let Some(server) = self.server {
            config.server = server;
        }
        if let Some(ref graph) = self.graph {
            config.graph = graph.clone();
        }
        if let Some(ref language) = self.language {
            config.language = language.clone();
        }
        if let Some(secs) = self.connect_timeout {
            config.connect_timeout_secs = secs;
        }
        if let Some(secs) = self.request_timeout {
            config.request_timeout_secs = secs;
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref()).map_err(|e| {
        eprintln!("{}: {}", "Configuration error".red(), e);
        e
    })?;
    cli.apply_to(&mut config);
    config.validate()?;

    tracing::debug!("Using server {} graph {}", config.server, config.graph);

    let connection = ConnectionConfig::new(config.server)
        .with_connect_timeout(config.connect_timeout())
        .with_request_timeout(config.request_timeout());
    let client = Client::new(connection).with_language(config.language.clone());

    match cli.command {
        Some(Commands::Repl) | None => {
            repl::run(client, config.graph).await?;
        }
        Some(cmd) => match commands::execute(&client, &config.graph, cmd).await {
            Ok(output) => println!("{}", output),
            Err(e) => {
                eprintln!("{}: {}", "Error".red(), e);
                std::process::exit(1);
            }
        },
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_flags_override_loaded_config() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"request_timeout_secs: 0\ngraph: fromfile\n")
            .unwrap();

        let mut config = Config::load(Some(file.path())).unwrap();
        assert!(config.validate().is_err());

        let cli = Cli::try_parse_from([
            "rexpro",
            "--request-timeout",
            "5",
            "session",
            "--graph",
            "fromflag",
        ])
        .unwrap();
        cli.apply_to(&mut config);

        assert!(config.validate().is_ok());
        assert_eq!(config.request_timeout_secs, 5);
        assert_eq!(config.graph, "fromflag");
    }
}
