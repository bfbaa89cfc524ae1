use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use tccv_core::{ChatSession, Config, HttpChatClient, ENDPOINT_ENV};

mod app;
mod handler;
mod layout;
mod logging;
mod markdown;
mod surface;
mod tui;
mod ui;

use app::App;
use tui::EventHandler;

#[derive(Parser)]
#[command(name = "tccv-chat")]
#[command(about = "Terminal chat client for the TCCV education chatbot")]
#[command(version)]
struct Cli {
    /// Chat endpoint URL (overrides the config file and the environment)
    #[arg(long, global = true)]
    endpoint: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Send one message and print the reply
    Ask {
        /// Message text, sent as-is
        text: String,
    },
    /// Show the resolved configuration
    Config {
        /// Persist this endpoint to the config file
        #[arg(long)]
        set_endpoint: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Ask { text }) => {
            logging::init_stderr();
            ask(&load_config(), cli.endpoint, &text).await
        }
        Some(Commands::Config { set_endpoint }) => show_config(cli.endpoint, set_endpoint),
        None => {
            let log_path = logging::init_file()?;
            tracing::info!(path = %log_path.display(), "logging to file");
            run_tui(load_config(), cli.endpoint).await
        }
    }
}

/// A broken config file falls back to defaults instead of blocking the chat
fn load_config() -> Config {
    Config::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "could not load config, using defaults");
        Config::new()
    })
}

async fn run_tui(config: Config, endpoint: Option<String>) -> Result<()> {
    let client = HttpChatClient::new(&endpoint.unwrap_or_else(|| config.endpoint()));

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = EventHandler::new();
    let tx = events.sender();

    let mut app = App::new(client, &config);
    tracing::info!(
        endpoint = app.backend.endpoint(),
        policy = ?app.panel.session.policy(),
        "starting chat"
    );

    let result = async {
        while !app.should_quit {
            terminal.draw(|frame| ui::render(&mut app, frame))?;

            let Some(event) = events.next().await else { break };
            handler::handle_event(&mut app, event, &tx)?;
        }
        Ok::<_, anyhow::Error>(())
    }
    .await;

    tui::restore()?;
    result
}

async fn ask(config: &Config, endpoint: Option<String>, text: &str) -> Result<()> {
    if text.trim().is_empty() {
        bail!("Message is empty");
    }

    let endpoint = endpoint.unwrap_or_else(|| config.endpoint());
    let client = HttpChatClient::new(&endpoint);

    let mut session = ChatSession::new(config.send_policy()).with_error_text(config.error_text());
    tracing::debug!(endpoint = client.endpoint(), policy = ?session.policy(), "sending one message");
    for c in text.chars() {
        session.composer_mut().insert(c);
    }
    session.send(&client).await;

    if let Some(reply) = session.conversation().last() {
        println!("{}", reply.text);
    }
    Ok(())
}

fn show_config(endpoint: Option<String>, set_endpoint: Option<String>) -> Result<()> {
    let path = Config::path()?;
    let mut config = Config::load_from(&path)?;

    if let Some(url) = set_endpoint {
        config.endpoint = Some(url);
        config.save_to(&path)?;
        println!("Saved {}", path.display());
    }

    let from_env = endpoint.is_none() && std::env::var(ENDPOINT_ENV).is_ok();
    let resolved = endpoint.unwrap_or_else(|| config.endpoint());
    println!("Config file:  {}", path.display());
    println!("Endpoint:     {resolved}");
    if from_env {
        println!("              (from {ENDPOINT_ENV})");
    }
    println!("Send policy:  {:?}", config.send_policy());
    println!("Error text:   {}", config.error_text());
    Ok(())
}
