mod app_config;
mod auth;
mod email;
mod error;
mod structs;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use anyhow::Context;
use app_config::AppConfig;
use auth::{
    authority::TokenAuthority,
    code_provider::{ConsoleCodeProvider, StaticCodeProvider},
    credentials::ClientCredentials,
    token::TokenStore,
};
use email::{
    client::EmailClient,
    poller::MailboxPoller,
    reply::{ReplySender, ReplyTemplate},
};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub type HttpClient = reqwest::Client;

// Fetch pipelines interleave on this one thread; the seen set relies on that
#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::Layer::default().with_ansi(false))
        .init();

    let config = AppConfig::load()
        .map_err(|e| {
            tracing::error!("Error loading configuration: {}", e);
            e
        })
        .context("config.toml is invalid")?;
    tracing::info!("{}", config);

    let credentials = ClientCredentials::from_file(&config.credentials_path)
        .map_err(|e| {
            tracing::error!("Error loading credentials: {}", e);
            e
        })
        .with_context(|| format!("Could not load {:?}", config.credentials_path))?;

    let http_client = reqwest::Client::new();
    let authority = TokenAuthority::new(
        http_client.clone(),
        credentials,
        TokenStore::new(&config.token_path),
    );

    let access = match &config.auth_code {
        Some(code) => authority.authorize(&StaticCodeProvider::new(code)).await,
        None => authority.authorize(&ConsoleCodeProvider).await,
    }
    .context("Authorization failed, mailbox watch not started")?;

    let client = Arc::new(EmailClient::new(http_client, access, &config.api_base));
    let replier = Arc::new(ReplySender::new(
        client.clone(),
        ReplyTemplate::from(&config),
    ));
    let poller = MailboxPoller::new(client, replier, config.push_topic.clone());

    let shutdown = CancellationToken::new();
    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            match signal::ctrl_c().await {
                Ok(()) => {
                    tracing::info!("Received Ctrl+C, shutting down");
                    shutdown.cancel();
                }
                Err(e) => tracing::error!("Failed to listen for Ctrl+C: {}", e),
            }
        });
    }

    tracing::info!("Watching mailbox for unread messages");
    poller.run(shutdown).await;

    Ok(())
}
