//! ESI command-line client
//!
//! `esi [--config PATH] <command> [args]`
//!
//! Public resources are fetched anonymously. Commands that need a token
//! go through the token manager first (cache, then refresh, then browser
//! login). Results are printed as pretty JSON on stdout; logs go to stderr.

mod commands;
mod config;
mod error;

use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use esi_auth::{FileTokenStore, SystemBrowser, TokenManager};
use esi_client::EsiClient;
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::commands::{Command, token_summary};
use crate::config::{Config, DEFAULT_CONFIG_FILE};

/// Split `--config PATH` (or `--config=PATH`) from the command words.
fn split_args(args: &[String]) -> (Option<&str>, Vec<String>) {
    let mut config_path = None;
    let mut words = Vec::new();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg == "--config" {
            config_path = iter.next().map(String::as_str);
        } else if let Some(path) = arg.strip_prefix("--config=") {
            config_path = Some(path);
        } else {
            words.push(arg.clone());
        }
    }
    (config_path, words)
}

#[tokio::main]
async fn main() -> Result<()> {
    // JSON logs on stderr, LOG_LEVEL / RUST_LOG support; stdout is for results
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_env("LOG_LEVEL")
                .or_else(|_| EnvFilter::try_from_default_env())
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr),
        )
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let (cli_config_path, words) = split_args(&args);
    let command = Command::parse(&words)?;

    let (config_path, config) = match Config::explicit_path(cli_config_path) {
        Some(path) => {
            info!(path = %path.display(), "loading configuration");
            let config = Config::load(&path);
            (path, config)
        }
        None => {
            let path = PathBuf::from(DEFAULT_CONFIG_FILE);
            let config = Config::load_optional(&path);
            (path, config)
        }
    };
    let config = config
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;

    let http = common::build_http_client(&config.http).context("failed to build HTTP client")?;
    let mut client = EsiClient::new(http.clone(), config.esi.clone());

    if command.requires_auth() {
        config
            .sso
            .require_client_id()
            .with_context(|| format!("{command:?} needs a registered application"))?;

        let manager = TokenManager::new(http)
            .with_store(Arc::new(FileTokenStore::new(&config.sso.cache_file)))
            .with_browser(Arc::new(SystemBrowser))
            .with_callback_addr(SocketAddr::from((
                Ipv4Addr::LOCALHOST,
                config.sso.callback_port,
            )))
            .with_callback_timeout(Duration::from_secs(config.sso.callback_timeout_secs));
        let sso = config.sso.client_config();

        let record = match command {
            Command::Login => manager.authorize(&sso).await,
            _ => manager.acquire_token(&sso).await,
        }
        .context("failed to obtain an access token")?;

        if matches!(command, Command::Token | Command::Login) {
            print_json(&token_summary(&record))?;
            return Ok(());
        }
        client.set_token(record.access_token);
    }

    let value = command
        .run(&client)
        .await
        .with_context(|| format!("{command:?} failed"))?;
    print_json(&value)
}

fn print_json(value: &serde_json::Value) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("failed to render JSON")?;
    println!("{text}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn config_flag_is_removed_from_command_words() {
        let args = strings(&["--config", "/etc/esi.toml", "type", "34"]);
        let (path, words) = split_args(&args);
        assert_eq!(path, Some("/etc/esi.toml"));
        assert_eq!(words, strings(&["type", "34"]));
    }

    #[test]
    fn config_flag_with_equals_and_after_command() {
        let args = strings(&["regions", "--config=local.toml"]);
        let (path, words) = split_args(&args);
        assert_eq!(path, Some("local.toml"));
        assert_eq!(words, strings(&["regions"]));
    }

    #[test]
    fn no_config_flag() {
        let args = strings(&["history", "10000002", "34"]);
        let (path, words) = split_args(&args);
        assert!(path.is_none());
        assert_eq!(words.len(), 3);
    }
}
