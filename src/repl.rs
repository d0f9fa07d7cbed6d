//! Interactive REPL.

use crate::commands::{format_json, format_results, format_session, parse_value};
use colored::Colorize;
use rexpro_client::Client;
use rexpro_protocol::Meta;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::{Config, Editor};

const HELP_TEXT: &str = r#"
Available commands:
  help                          Show this help

  script <code>                 Run a script against the current graph
  graph [name]                  Show or switch the current graph

  bind <name> <value>           Bind a variable (JSON, or a plain string)
  unbind <name>                 Remove a binding
  bindings                      List bindings

  session                       Open a session on the server

  quit, exit                    Exit the REPL
"#;

/// REPL state carried between lines.
struct Repl {
    client: Client,
    graph: String,
    bindings: Meta,
}

/// What the REPL should do after a line.
enum Outcome {
    Print(String),
    Quit,
}

pub async fn run(client: Client, graph: String) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", "rexpro CLI".bold().cyan());
    println!(
        "Server {} ({} on graph {})",
        client.config().addr,
        client.language(),
        graph.cyan()
    );

    let config = Config::builder()
        .history_ignore_space(true)
        .auto_add_history(true)
        .build();
    let mut rl: Editor<(), DefaultHistory> = Editor::with_config(config)?;

    let history_path = std::env::var("HOME")
        .map(|h| std::path::PathBuf::from(h).join(".rexpro_history"))
        .unwrap_or_else(|_| ".rexpro_history".into());
    let _ = rl.load_history(&history_path);

    println!("Type 'help' for available commands.\n");

    let mut repl = Repl {
        client,
        graph,
        bindings: Meta::new(),
    };

    loop {
        let prompt = format!("{} ", format!("rexpro:{}>", repl.graph).cyan());
        match rl.readline(&prompt) {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                match repl.execute(line).await {
                    Ok(Outcome::Print(output)) => println!("{}\n", output),
                    Ok(Outcome::Quit) => break,
                    Err(e) => println!("{}: {}\n", "Error".red(), e),
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("^D");
                break;
            }
            Err(err) => {
                println!("{}: {:?}", "Error".red(), err);
                break;
            }
        }
    }

    let _ = rl.save_history(&history_path);
    Ok(())
}

impl Repl {
    async fn execute(&mut self, line: &str) -> Result<Outcome, Box<dyn std::error::Error>> {
        if let Some(outcome) = self.execute_local(line) {
            return Ok(outcome);
        }

        let (cmd, rest) = split_command(line);
        match cmd.as_str() {
            "script" | "s" => {
                if rest.is_empty() {
                    return Ok(Outcome::Print("Usage: script <code>".to_string()));
                }
                let response = self
                    .client
                    .run_script(rest, &self.graph, self.bindings.clone())
                    .await?;
                Ok(Outcome::Print(format_results(&response)))
            }

            "session" => {
                let body = self.client.open_session().await?;
                Ok(Outcome::Print(format_session(body)?))
            }

            _ => Ok(Outcome::Print(format!(
                "Unknown command: {}. Type 'help' for help.",
                cmd
            ))),
        }
    }

    /// Handles commands that never touch the network.
    fn execute_local(&mut self, line: &str) -> Option<Outcome> {
        let (cmd, rest) = split_command(line);

        let output = match cmd.as_str() {
            "help" | "?" => HELP_TEXT.to_string(),

            "quit" | "exit" | "q" => return Some(Outcome::Quit),

            "graph" | "g" => {
                if rest.is_empty() {
                    format!("Graph: {}", self.graph.cyan())
                } else {
                    self.graph = rest.to_string();
                    format!("{} {}", "Using graph".green(), self.graph.cyan())
                }
            }

            "bind" | "b" => match rest.split_once(char::is_whitespace) {
                Some((name, value)) => {
                    let value = parse_value(value);
                    let shown = value.to_string();
                    self.bindings.insert(name.to_string(), value);
                    format!("{} {} = {}", "Bound".green(), name.cyan(), shown)
                }
                None => "Usage: bind <name> <value>".to_string(),
            },

            "unbind" | "u" => {
                if rest.is_empty() {
                    "Usage: unbind <name>".to_string()
                } else if self.bindings.remove(rest).is_some() {
                    format!("{} {}", "Unbound".green(), rest.cyan())
                } else {
                    format!("No binding named {}", rest).yellow().to_string()
                }
            }

            "bindings" => {
                if self.bindings.is_empty() {
                    "No bindings".yellow().to_string()
                } else {
                    let mut output = String::new();
                    for (name, value) in &self.bindings {
                        output.push_str(&format!("  {} = {}\n", name.cyan(), format_json(value)));
                    }
                    output
                }
            }

            _ => return None,
        };

        Some(Outcome::Print(output))
    }
}

/// Splits a line into a lowercased command word and the trimmed remainder.
fn split_command(line: &str) -> (String, &str) {
    let line = line.trim();
    match line.split_once(char::is_whitespace) {
        Some((cmd, rest)) => (cmd.to_lowercase(), rest.trim()),
        None => (line.to_lowercase(), ""),
    }
}
