// src/bin/chanmsg.rs
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};

use chanmsg::config::{self, ClientConfig};
use chanmsg::{HttpClient, ListOptions, Order};

#[derive(Parser)]
#[command(name = "chanmsg", about = "Send, update, fetch and list channel messages")]
struct Cli {
    /// Path to the config file (default: ./chanmsg.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a config file with credentials and service root
    Init {
        #[arg(long)]
        account_sid: String,
        #[arg(long)]
        auth_token: String,
        /// Service root (default: https://chat.twilio.com/v1)
        #[arg(long)]
        base_url: Option<String>,
        /// Append one line per request to this file
        #[arg(long)]
        log_file: Option<PathBuf>,
    },
    /// Send a message to a channel
    Send {
        #[arg(long)]
        service: String,
        #[arg(long)]
        channel: String,
        /// Sender identity (server default when omitted)
        #[arg(long)]
        from: Option<String>,
        #[arg(long)]
        body: String,
        #[arg(long, default_value = "{}")]
        attributes: String,
    },
    /// Replace the body and attributes of a message
    Update {
        #[arg(long)]
        service: String,
        #[arg(long)]
        channel: String,
        #[arg(long)]
        message: String,
        #[arg(long)]
        body: String,
        #[arg(long, default_value = "{}")]
        attributes: String,
    },
    /// Fetch one message
    Get {
        #[arg(long)]
        service: String,
        #[arg(long)]
        channel: String,
        #[arg(long)]
        message: String,
    },
    /// List a channel's messages (first page unless --all or --max-pages)
    List {
        #[arg(long)]
        service: String,
        #[arg(long)]
        channel: String,
        /// asc or desc
        #[arg(long)]
        order: Option<Order>,
        #[arg(long)]
        page_size: Option<u32>,
        /// Follow next links until the last page
        #[arg(long, conflicts_with = "max_pages")]
        all: bool,
        /// Follow next links for at most this many pages
        #[arg(long)]
        max_pages: Option<usize>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config_path = match cli.config {
        Some(path) => path,
        None => config::config_path(&chanmsg::work_dir()?),
    };

    match cli.command {
        Commands::Init {
            account_sid,
            auth_token,
            base_url,
            log_file,
        } => cmd_init(&config_path, account_sid, auth_token, base_url, log_file),
        Commands::Send {
            service,
            channel,
            from,
            body,
            attributes,
        } => {
            let client = load_client(&config_path)?;
            let message = chanmsg::create_message(
                &client,
                &service,
                &channel,
                from.as_deref(),
                &body,
                &attributes,
            )?;
            print_json(&message)
        }
        Commands::Update {
            service,
            channel,
            message,
            body,
            attributes,
        } => {
            let client = load_client(&config_path)?;
            let message =
                chanmsg::update_message(&client, &service, &channel, &message, &body, &attributes)?;
            print_json(&message)
        }
        Commands::Get {
            service,
            channel,
            message,
        } => {
            let client = load_client(&config_path)?;
            let message = chanmsg::get_message(&client, &service, &channel, &message)?;
            print_json(&message)
        }
        Commands::List {
            service,
            channel,
            order,
            page_size,
            all,
            max_pages,
        } => {
            let client = load_client(&config_path)?;
            let options = ListOptions { order, page_size };
            let first = chanmsg::list_messages_with(&client, &service, &channel, &options)?;
            let messages = if all {
                first.into_all()?
            } else {
                let mut messages = Vec::new();
                for page in first.pages().take(max_pages.unwrap_or(1)) {
                    messages.extend(page?.into_messages());
                }
                messages
            };
            eprintln!("{} message(s)", messages.len());
            print_json(&messages)
        }
    }
}

fn cmd_init(
    config_path: &Path,
    account_sid: String,
    auth_token: String,
    base_url: Option<String>,
    log_file: Option<PathBuf>,
) -> Result<()> {
    if config_path.exists() {
        println!("{} already exists, overwriting", config_path.display());
    }
    let mut config = ClientConfig {
        account_sid,
        auth_token,
        log_file,
        ..Default::default()
    };
    if let Some(base_url) = base_url {
        config.base_url = base_url;
    }
    config.validate()?;
    config::save_config(config_path, &config)?;
    println!("Wrote {}", config_path.display());
    Ok(())
}

fn load_client(config_path: &Path) -> Result<HttpClient> {
    let mut config = config::load_config(config_path)?.unwrap_or_default();
    config.apply_env();
    config.validate().with_context(|| {
        format!(
            "Invalid client configuration. Run 'chanmsg init' or edit {}",
            config_path.display()
        )
    })?;
    HttpClient::new(&config)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
