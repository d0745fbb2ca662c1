use std::path::Path;

use config::{Config, FileFormat};
use serde::Deserialize;

use crate::error::{AppError, AppResult};

const GOOGLE_AUTH_URI: &str = "https://accounts.google.com/o/oauth2/auth";
const GOOGLE_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// One section of a Google client secret file.
#[derive(Debug, Deserialize)]
struct ClientSecret {
    client_id: String,
    client_secret: String,
    #[serde(default)]
    redirect_uris: Vec<String>,
    auth_uri: Option<String>,
    token_uri: Option<String>,
}

/// Google writes either a `web` or an `installed` section depending on the client type.
#[derive(Debug, Deserialize)]
struct ClientSecretFile {
    web: Option<ClientSecret>,
    installed: Option<ClientSecret>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub auth_uri: String,
    pub token_uri: String,
}

impl ClientCredentials {
    pub fn from_file(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        let file: ClientSecretFile = Config::builder()
            .add_source(config::File::from(path).format(FileFormat::Json))
            .build()?
            .try_deserialize()?;
        Self::from_secret_file(file)
    }

    pub fn from_json(json: &str) -> AppResult<Self> {
        let file: ClientSecretFile = Config::builder()
            .add_source(config::File::from_str(json, FileFormat::Json))
            .build()?
            .try_deserialize()?;
        Self::from_secret_file(file)
    }

    fn from_secret_file(file: ClientSecretFile) -> AppResult<Self> {
        let secret = file
            .web
            .or(file.installed)
            .ok_or(AppError::MissingField("web or installed"))?;

        let redirect_uri = secret
            .redirect_uris
            .into_iter()
            .next()
            .ok_or(AppError::MissingField("redirect_uris"))?;

        Ok(ClientCredentials {
            client_id: secret.client_id,
            client_secret: secret.client_secret,
            redirect_uri,
            auth_uri: secret
                .auth_uri
                .unwrap_or_else(|| GOOGLE_AUTH_URI.to_string()),
            token_uri: secret
                .token_uri
                .unwrap_or_else(|| GOOGLE_TOKEN_URI.to_string()),
        })
    }
}
