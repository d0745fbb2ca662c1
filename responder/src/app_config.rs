use std::{env, path::PathBuf};

use config::{builder::DefaultState, Config, ConfigBuilder, ConfigError, Environment};
use serde::Deserialize;

pub const DEFAULT_CONFIG_PATH: &str = "config.toml";
pub const GMAIL_API_BASE: &str = "https://gmail.googleapis.com/gmail/v1/users/me";

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub credentials_path: PathBuf,
    pub token_path: PathBuf,
    pub api_base: String,
    pub push_topic: String,
    pub reply_subject: String,
    pub reply_body: String,
    pub reply_label: String,
    /// Authorization code supplied up front for headless first runs
    pub auth_code: Option<String>,
}

impl AppConfig {
    /// Defaults, then `config.toml` (or `$RESPONDER_CONFIG`), then `RESPONDER_*` env vars.
    pub fn load() -> Result<Self, ConfigError> {
        let path = env::var("RESPONDER_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::from_file(&path)
    }

    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        Self::defaults()?
            .add_source(config::File::with_name(path).required(false))
            .add_source(Environment::with_prefix("RESPONDER"))
            .build()?
            .try_deserialize()
    }

    fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        Config::builder()
            .set_default("credentials_path", "credentials.json")?
            .set_default("token_path", "token.json")?
            .set_default("api_base", GMAIL_API_BASE)?
            .set_default(
                "push_topic",
                "projects/assignment-392120/topics/email-watcher",
            )?
            .set_default("reply_subject", "Automatic Reply")?
            .set_default(
                "reply_body",
                "Thank you for your email. I am on Vacation. i will contact you after my vaction .",
            )?
            .set_default("reply_label", "Google’s APIs")
    }
}

impl std::fmt::Display for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "credentials_path: {:?}, token_path: {:?}, api_base: {}, push_topic: {}, reply_label: {}, auth_code: {}",
            self.credentials_path,
            self.token_path,
            self.api_base,
            self.push_topic,
            self.reply_label,
            if self.auth_code.is_some() { "<set>" } else { "<unset>" }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_file() {
        let config = AppConfig::from_file("does-not-exist.toml").unwrap();
        assert_eq!(config.credentials_path, PathBuf::from("credentials.json"));
        assert_eq!(config.token_path, PathBuf::from("token.json"));
        assert_eq!(config.api_base, GMAIL_API_BASE);
        assert_eq!(config.reply_subject, "Automatic Reply");
        assert_eq!(config.reply_label, "Google’s APIs");
    }

    #[test]
    fn test_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("responder.toml");
        std::fs::write(
            &path,
            "token_path = \"state/token.json\"\nreply_label = \"Auto replied\"\n",
        )
        .unwrap();

        let config = AppConfig::from_file(path.to_str().unwrap()).unwrap();
        assert_eq!(config.token_path, PathBuf::from("state/token.json"));
        assert_eq!(config.reply_label, "Auto replied");
        assert_eq!(config.credentials_path, PathBuf::from("credentials.json"));
    }

    #[test]
    fn test_display_hides_auth_code() {
        let mut config = AppConfig::from_file("does-not-exist.toml").unwrap();
        config.auth_code = Some("4/secret".to_string());
        let shown = config.to_string();
        assert!(!shown.contains("4/secret"));
        assert!(shown.contains("<set>"));
    }
}
