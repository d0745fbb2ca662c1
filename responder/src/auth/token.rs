use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::Arc,
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::{
    auth::{authority::exchange_refresh_token, credentials::ClientCredentials},
    error::AppResult,
    structs::response::GmailApiTokenResponse,
    HttpClient,
};

/// Token cache entry, in the shape Google client libraries write to `token.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
    /// Epoch milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry_date: Option<i64>,
}

impl Token {
    pub fn from_response(resp: GmailApiTokenResponse, now: DateTime<Utc>) -> Self {
        Token {
            access_token: resp.access_token,
            refresh_token: resp.refresh_token,
            scope: resp.scope,
            token_type: resp.token_type,
            expiry_date: resp.expires_in.map(|secs| expiry_from(now, secs)),
        }
    }

    /// A token without an expiry is treated as valid.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expiry_date
            .map_or(false, |expiry| expiry <= now.timestamp_millis())
    }
}

pub(crate) fn expiry_from(now: DateTime<Utc>, expires_in_secs: u64) -> i64 {
    (now + chrono::Duration::seconds(expires_in_secs as i64)).timestamp_millis()
}

pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `Ok(None)` when no token has been stored yet.
    pub async fn load(&self) -> AppResult<Option<Token>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => Ok(Some(serde_json::from_str(&content)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn save(&self, token: &Token) -> AppResult<()> {
        let json = serde_json::to_string(token)?;
        tokio::fs::write(&self.path, json).await?;
        Ok(())
    }
}

/// Shared handle on the current access token. Refreshes in memory once the
/// stored expiry has passed and a refresh token is available.
#[derive(Clone)]
pub struct AccessToken {
    http_client: HttpClient,
    credentials: Arc<ClientCredentials>,
    token: Arc<Mutex<Token>>,
}

impl AccessToken {
    pub fn new(http_client: HttpClient, credentials: Arc<ClientCredentials>, token: Token) -> Self {
        Self {
            http_client,
            credentials,
            token: Arc::new(Mutex::new(token)),
        }
    }

    pub async fn bearer(&self) -> AppResult<String> {
        let mut token = self.token.lock().await;
        if token.is_expired(Utc::now()) {
            if let Some(refresh_token) = token.refresh_token.clone() {
                tracing::info!("Access token expired, refreshing");
                let resp = exchange_refresh_token(
                    self.http_client.clone(),
                    &self.credentials,
                    refresh_token,
                )
                .await?;
                token.access_token = resp.access_token;
                token.expiry_date = resp.expires_in.map(|secs| expiry_from(Utc::now(), secs));
                if resp.scope.is_some() {
                    token.scope = resp.scope;
                }
            }
        }

        Ok(token.access_token.clone())
    }

    pub async fn snapshot(&self) -> Token {
        self.token.lock().await.clone()
    }
}
