//! Command execution.

use crate::Commands;
use colored::Colorize;
use rexpro_client::{Client, ClientError};
use rexpro_protocol::{Body, BodyVariant, Meta, ScriptResponse};
use serde_json::Value;

/// Executes a one-shot command and returns the formatted output.
pub async fn execute(
    client: &Client,
    graph: &str,
    cmd: Commands,
) -> Result<String, Box<dyn std::error::Error>> {
    match cmd {
        Commands::Repl => unreachable!(),

        Commands::Script { script, bindings } => {
            let script = read_script_arg(&script)?;
            let bindings: Meta = bindings.into_iter().collect();
            let response = client.run_script(&script, graph, bindings).await?;
            Ok(format_results(&response))
        }

        Commands::Session => {
            let body = client.open_session().await?;
            Ok(format_session(body)?)
        }
    }
}

/// Parses a `name=value` binding. The value is read as JSON, falling back to
/// a plain string when it isn't valid JSON.
pub fn parse_binding(arg: &str) -> Result<(String, Value), String> {
    let (name, value) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected name=value, got '{}'", arg))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("binding name missing in '{}'", arg));
    }
    Ok((name.to_string(), parse_value(value)))
}

/// Reads a binding value as JSON, or as a string if that fails.
pub fn parse_value(raw: &str) -> Value {
    let raw = raw.trim();
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

/// Parses a script argument (`@file.groovy` reads from file).
fn read_script_arg(arg: &str) -> Result<String, std::io::Error> {
    match arg.strip_prefix('@') {
        Some(path) => std::fs::read_to_string(path),
        None => Ok(arg.to_string()),
    }
}

/// Formats the results (and returned bindings) of a script response.
pub fn format_results(response: &ScriptResponse) -> String {
    let mut output = String::new();

    if response.results().is_empty() {
        output.push_str(&"No results".yellow().to_string());
    } else {
        for (i, result) in response.results().iter().enumerate() {
            if i > 0 {
                output.push('\n');
            }
            output.push_str(&format!(
                "{} {}",
                format!("[{}]", i).cyan(),
                format_json(result)
            ));
        }
    }

    if !response.bindings().is_empty() {
        output.push_str(&format!("\n{}", "Bindings:".bold()));
        for (name, value) in response.bindings() {
            output.push_str(&format!("\n  {} = {}", name.cyan(), value));
        }
    }

    output
}

/// Formats a session response, or converts an error response into an error.
pub fn format_session(body: Body) -> Result<String, ClientError> {
    match body {
        Body::SessionResponse(resp) => Ok(format!(
            "{} {}",
            "Session".green(),
            resp.session().cyan()
        )),
        Body::ErrorResponse(err) => Err(ClientError::ServerError {
            message: err.error_message().to_string(),
            flag: err.flag(),
        }),
        other => Err(ClientError::UnexpectedResponse(other.message_type())),
    }
}

pub fn format_json(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}
