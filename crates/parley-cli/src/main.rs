//! Parley - terminal chat with a local language-model server

use anyhow::{Context, Result};
use clap::Parser;
use colored::*;
use parley_common::{ParleyConfig, Role};
use parley_llm::{ChatSession, ModelGateway, OllamaGateway, TracingObserver, resolve_model};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use termimad::MadSkin;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

mod commands;
mod render;

use commands::{Command, HELP, parse_input};
use render::{display_error, display_message, display_segmented};

/// Command-line arguments for Parley
#[derive(Parser)]
#[command(
    name = "parley",
    about = "Parley - chat with a local language model from your terminal"
)]
pub struct Args {
    /// Path to the config file
    #[clap(short, long)]
    config: Option<PathBuf>,

    /// Backend API base URL (overrides config)
    #[clap(long)]
    base_url: Option<String>,

    /// Model to chat with
    #[clap(short, long)]
    model: Option<String>,

    /// System prompt sent with every request
    #[clap(short, long)]
    system: Option<String>,

    /// Show thinking steps expanded
    #[clap(long)]
    show_thinking: bool,

    /// Report every chat call as a structured trace event
    #[clap(long)]
    trace: bool,

    /// List available models and exit
    #[clap(long)]
    list_models: bool,

    /// Enable debug mode
    #[clap(short, long)]
    debug: bool,
}

impl Args {
    /// Fold command-line overrides into the loaded configuration
    fn apply_to(&self, config: &mut ParleyConfig) {
        if let Some(base_url) = &self.base_url {
            config.provider.base_url = base_url.clone();
        }
        if let Some(system) = &self.system {
            config.defaults.system_prompt = Some(system.clone());
        }
        if self.show_thinking {
            config.defaults.show_thinking = true;
        }
        if self.debug {
            config.defaults.log_level = "debug".to_string();
        }
    }
}

fn init_tracing(log_level: &str) -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

fn print_help() {
    println!("{}", "Commands:".bright_cyan().bold());
    for (command, description) in HELP {
        println!("  {:<16} {}", command.bright_yellow(), description);
    }
    println!();
}

fn print_models(models: &[String], current: &str) {
    if models.is_empty() {
        println!("{}", "No models reported by the backend.".yellow());
        return;
    }
    println!("{}", "Available models:".bright_cyan().bold());
    for model in models {
        if model == current {
            println!("• {} {}", model.bright_green().bold(), "(current)".dimmed());
        } else {
            println!("• {}", model);
        }
    }
}

/// Main conversation loop
async fn conversation_loop(
    gateway: &dyn ModelGateway,
    session: &mut ChatSession,
    mut show_thinking: bool,
) -> Result<()> {
    println!(
        "{}",
        format!("💬 Chatting with {}. Type 'quit' or 'exit' to stop, '/help' for commands.", session.model())
            .bright_green()
    );
    println!();

    let skin = MadSkin::default();

    loop {
        print!("{}", "You: ".bright_cyan().bold());
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            // EOF
            break;
        }

        let Some(command) = parse_input(&input) else {
            continue;
        };

        match command {
            Command::Quit => {
                println!("{}", "👋 Goodbye!".bright_green());
                break;
            }
            Command::Clear => {
                session.clear();
                println!("{}", "🧹 Conversation cleared.".bright_yellow());
            }
            Command::History => {
                for message in session.history() {
                    display_message(&skin, message.role, &message.content, show_thinking);
                }
            }
            Command::Models => {
                let models = gateway.list_models().await;
                print_models(&models, session.model());
            }
            Command::Model(None) => {
                println!("{} {}", "Model:".bright_yellow(), session.model().bright_green());
            }
            Command::Model(Some(model)) => {
                session.set_model(model);
                println!("{} {}", "Switched to".bright_yellow(), session.model().bright_green());
            }
            Command::System(prompt) => {
                session.set_system_prompt(prompt);
                match session.system_prompt() {
                    Some(_) => println!("{}", "System prompt set.".bright_yellow()),
                    None => println!("{}", "System prompt cleared.".bright_yellow()),
                }
            }
            Command::ToggleThinking => {
                show_thinking = !show_thinking;
                let state = if show_thinking { "expanded" } else { "collapsed" };
                println!("{} {}", "Thinking steps:".bright_yellow(), state);
            }
            Command::Help => print_help(),
            Command::Unknown(name) => {
                display_error(format!("Unknown command {}. Try /help.", name));
            }
            Command::Chat(prompt) => match session.send(gateway, prompt).await {
                Ok(turn) => {
                    display_segmented(&skin, Role::Assistant, &turn.segmented, show_thinking);
                }
                Err(e) => display_error(format!("Error generating response: {}", e)),
            },
        }

        println!();
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let config_path = match &args.config {
        Some(path) => path.clone(),
        None => ParleyConfig::config_path()?,
    };
    let mut config = ParleyConfig::load(&config_path)
        .with_context(|| format!("Failed to load configuration from {:?}", config_path))?;
    args.apply_to(&mut config);

    init_tracing(&config.defaults.log_level)?;

    info!("Starting Parley");
    info!("Config: {:?}", config_path);
    let mut gateway = OllamaGateway::new(&config.provider)?;
    info!("Backend: {}", gateway.base_url());
    if args.trace {
        gateway = gateway.with_observer(Arc::new(TracingObserver));
    }

    let available = gateway.list_models().await;

    if args.list_models {
        print_models(&available, "");
        return Ok(());
    }

    let model = resolve_model(
        &available,
        args.model.as_deref(),
        &config.provider.default_model,
    );
    info!("Model: {}", model);

    let mut session = ChatSession::new(model)
        .with_system_prompt(config.system_prompt().map(str::to_string));

    conversation_loop(&gateway, &mut session, config.defaults.show_thinking).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_config() {
        let args = Args::parse_from([
            "parley",
            "--base-url",
            "http://gpu-box:11434/api",
            "--system",
            "Be terse.",
            "--show-thinking",
            "--debug",
        ]);
        let mut config = ParleyConfig::default();
        args.apply_to(&mut config);

        assert_eq!(config.provider.base_url, "http://gpu-box:11434/api");
        assert_eq!(config.system_prompt(), Some("Be terse."));
        assert!(config.defaults.show_thinking);
        assert_eq!(config.defaults.log_level, "debug");
    }

    #[test]
    fn test_no_flags_keep_config() {
        let args = Args::parse_from(["parley"]);
        let mut config = ParleyConfig::default();
        config.defaults.system_prompt = Some("From file.".to_string());
        config.defaults.show_thinking = true;
        args.apply_to(&mut config);

        assert_eq!(config.provider.base_url, "http://localhost:11434/api");
        assert_eq!(config.system_prompt(), Some("From file."));
        assert!(config.defaults.show_thinking);
        assert_eq!(config.defaults.log_level, "info");
    }
}
