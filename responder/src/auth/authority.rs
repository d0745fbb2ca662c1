use std::sync::Arc;

use chrono::Utc;
use lib_email_clients::gmail::constants::AccessScopes;
use serde::de::DeserializeOwned;
use url::Url;

use crate::{
    auth::{
        code_provider::AuthCodeProvider,
        credentials::ClientCredentials,
        token::{AccessToken, Token, TokenStore},
    },
    error::{AppError, AppResult},
    structs::response::{GmailApiRefreshTokenResponse, GmailApiTokenResponse},
    HttpClient,
};

pub struct TokenAuthority {
    http_client: HttpClient,
    credentials: Arc<ClientCredentials>,
    store: TokenStore,
}

impl TokenAuthority {
    pub fn new(http_client: HttpClient, credentials: ClientCredentials, store: TokenStore) -> Self {
        Self {
            http_client,
            credentials: Arc::new(credentials),
            store,
        }
    }

    pub fn authorization_url(&self) -> AppResult<Url> {
        let ClientCredentials {
            auth_uri,
            client_id,
            redirect_uri,
            ..
        } = self.credentials.as_ref();

        let url = Url::parse_with_params(
            auth_uri,
            &[
                ("client_id", client_id.as_str()),
                ("redirect_uri", redirect_uri.as_str()),
                ("response_type", "code"),
                ("scope", AccessScopes::Modify.url()),
                ("access_type", "offline"),
            ],
        )?;

        Ok(url)
    }

    /// Uses the cached token as-is when one exists, otherwise runs the
    /// authorization-code flow through `provider` and caches the result.
    pub async fn authorize<P: AuthCodeProvider>(&self, provider: &P) -> AppResult<AccessToken> {
        let token = match self.store.load().await {
            Ok(Some(token)) => token,
            Ok(None) => self.authorize_interactively(provider).await?,
            Err(e) => {
                tracing::error!("Error loading token from {:?}: {}", self.store.path(), e);
                return Err(e);
            }
        };

        Ok(AccessToken::new(
            self.http_client.clone(),
            self.credentials.clone(),
            token,
        ))
    }

    async fn authorize_interactively<P: AuthCodeProvider>(&self, provider: &P) -> AppResult<Token> {
        let auth_url = self.authorization_url()?;
        // Nothing else is scheduled yet, so blocking the runtime thread here is fine
        let code = provider
            .authorization_code(auth_url.as_str())
            .map_err(|e| {
                tracing::error!("Error reading authorization code: {:?}", e);
                AppError::Internal(e)
            })?;

        let token = match self.exchange_code(&code).await {
            Ok(token) => token,
            Err(e) => {
                tracing::error!("Error retrieving access token: {}", e);
                return Err(e);
            }
        };

        warn_on_missing_scope(&token);

        match self.store.save(&token).await {
            Ok(_) => tracing::info!("Token stored to {:?}", self.store.path()),
            Err(e) => tracing::error!("Could not store token to {:?}: {}", self.store.path(), e),
        }

        Ok(token)
    }

    async fn exchange_code(&self, code: &str) -> AppResult<Token> {
        let ClientCredentials {
            token_uri,
            client_id,
            client_secret,
            redirect_uri,
            ..
        } = self.credentials.as_ref();

        let resp = self
            .http_client
            .post(token_uri)
            .form(&[
                ("client_id", client_id.as_str()),
                ("client_secret", client_secret.as_str()),
                ("code", code),
                ("redirect_uri", redirect_uri.as_str()),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await?;

        let resp: GmailApiTokenResponse = parse_token_response(resp).await?;
        Ok(Token::from_response(resp, Utc::now()))
    }
}

pub async fn exchange_refresh_token(
    http_client: HttpClient,
    credentials: &ClientCredentials,
    refresh_token: String,
) -> AppResult<GmailApiRefreshTokenResponse> {
    let ClientCredentials {
        token_uri,
        client_id,
        client_secret,
        ..
    } = credentials;

    let resp = http_client
        .post(token_uri)
        .form(&[
            ("client_id", client_id.as_str()),
            ("client_secret", client_secret.as_str()),
            ("refresh_token", refresh_token.as_str()),
            ("grant_type", "refresh_token"),
        ])
        .send()
        .await?;

    parse_token_response(resp).await
}

async fn parse_token_response<T: DeserializeOwned>(resp: reqwest::Response) -> AppResult<T> {
    let status = resp.status();
    let body = resp.text().await?;
    if !status.is_success() {
        return Err(AppError::from_status(status, body));
    }

    serde_json::from_str(&body).map_err(|e| {
        tracing::error!("Failed to parse token response: {}", body);
        e.into()
    })
}

fn warn_on_missing_scope(token: &Token) {
    let Some(scope) = &token.scope else {
        return;
    };

    let can_modify = scope
        .split_whitespace()
        .filter_map(|s| s.parse::<AccessScopes>().ok())
        .any(|s| s.allows_modify());

    if !can_modify {
        tracing::warn!("Granted scopes do not include gmail.modify: {}", scope);
    }
}
