use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

use color_eyre::eyre::{eyre, WrapErr};
use color_eyre::Result;
use poe_bot::bot::ProxyBot;
use poe_bot::cli::{self, parse_args, CliCommand, InitOptions};
use poe_bot::client::PoeClient;
use poe_bot::config::BotConfig;
use poe_bot::server;
use tracing_subscriber::EnvFilter;

fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("poe_bot=info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(io::stderr)
        .init();
}

/// Ask a yes/no question, defaulting to no.
fn prompt_confirmation(message: &str) -> Result<bool> {
    print!("{} (y/N): ", message);
    io::stdout().flush().wrap_err("Failed to flush stdout")?;

    let mut input = String::new();
    io::stdin()
        .read_line(&mut input)
        .wrap_err("Failed to read input")?;

    let trimmed = input.trim().to_lowercase();
    Ok(trimmed == "y" || trimmed == "yes")
}

fn prompt_access_key() -> Result<String> {
    print!("Input Poe Server Bot Access key: ");
    io::stdout().flush().wrap_err("Failed to flush stdout")?;
    let key = rpassword::read_password().wrap_err("Failed to read access key")?;
    Ok(key.trim().to_string())
}

fn run_init(arg: &str) -> Result<()> {
    let name = cli::project_name(arg)?;
    let dist_path = PathBuf::from(arg);

    if dist_path.exists()
        && !prompt_confirmation("Directory already exists, do you want to overwrite it?")?
    {
        return Ok(());
    }

    let access_key = prompt_access_key()?;
    let mut options = InitOptions::new(&dist_path, &name, access_key);
    if let Some(dir) = std::env::var_os("POE_TEMPLATE_DIR") {
        options = options.with_template_dir(dir);
    }
    cli::init(&options)?;

    println!("\n✨ Poe server bot project created!\n");
    println!("Next steps:");
    println!("  1. cd {}", arg);
    println!("  2. cargo run");
    Ok(())
}

async fn run_serve() -> Result<()> {
    let config = BotConfig::from_env()?;
    let client = PoeClient::from_config(&config)?;
    let bot = ProxyBot::new(client, config.upstream_bot.clone());

    tracing::info!(upstream = bot.upstream(), "Starting proxy bot");
    server::serve(&config, Arc::new(bot)).await?;
    Ok(())
}

async fn run_sync_settings() -> Result<()> {
    let config = BotConfig::from_env()?;
    let client = PoeClient::from_config(&config)?;
    let response = client.sync_bot_settings(&config.bot_name).await?;
    println!("{}", response);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    init_logging();

    match parse_args(std::env::args()) {
        CliCommand::Init { name } => run_init(&name),
        CliCommand::Serve => run_serve().await,
        CliCommand::SyncSettings => run_sync_settings().await,
        CliCommand::Version => {
            println!("{}", cli::version_string());
            Ok(())
        }
        CliCommand::Help => {
            println!("{}", cli::USAGE);
            Ok(())
        }
        CliCommand::Invalid { message } => {
            eprintln!("{}\n\n{}", message, cli::USAGE);
            Err(eyre!("invalid arguments"))
        }
    }
}
