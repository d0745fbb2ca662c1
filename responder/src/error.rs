use reqwest::StatusCode;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug)]
pub enum AppError {
    Config(config::ConfigError),
    Io(std::io::Error),
    Http(reqwest::Error),
    /// Gmail or the token endpoint answered with a non-success status
    Api {
        status: StatusCode,
        body: String,
    },
    Json(serde_json::Error),
    Unauthorized(String),
    TooManyRequests,
    LabelNotFound(String),
    MissingField(&'static str),
    Internal(anyhow::Error),
}

impl AppError {
    pub fn from_status(status: StatusCode, body: String) -> Self {
        match status {
            StatusCode::UNAUTHORIZED => AppError::Unauthorized(body),
            StatusCode::TOO_MANY_REQUESTS => AppError::TooManyRequests,
            _ => AppError::Api { status, body },
        }
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppError::Config(e) => write!(f, "configuration error: {e}"),
            AppError::Io(e) => write!(f, "io error: {e}"),
            AppError::Http(e) => write!(f, "http error: {e}"),
            AppError::Api { status, body } => write!(f, "api error {status}: {body}"),
            AppError::Json(e) => write!(f, "decode error: {e}"),
            AppError::Unauthorized(msg) => write!(f, "unauthorized: {msg}"),
            AppError::TooManyRequests => write!(f, "too many requests"),
            AppError::LabelNotFound(name) => write!(f, "Label \"{name}\" not found."),
            AppError::MissingField(field) => write!(f, "response is missing `{field}`"),
            AppError::Internal(e) => write!(f, "{e:#}"),
        }
    }
}

impl std::error::Error for AppError {}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        AppError::Internal(error)
    }
}

impl From<reqwest::Error> for AppError {
    fn from(error: reqwest::Error) -> Self {
        match error.status() {
            Some(StatusCode::UNAUTHORIZED) => AppError::Unauthorized(error.to_string()),
            Some(StatusCode::TOO_MANY_REQUESTS) => AppError::TooManyRequests,
            _ => AppError::Http(error),
        }
    }
}

impl From<config::ConfigError> for AppError {
    fn from(error: config::ConfigError) -> Self {
        AppError::Config(error)
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        AppError::Io(error)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(error: serde_json::Error) -> Self {
        AppError::Json(error)
    }
}

impl From<url::ParseError> for AppError {
    fn from(error: url::ParseError) -> Self {
        AppError::Internal(error.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status() {
        assert!(matches!(
            AppError::from_status(StatusCode::UNAUTHORIZED, "expired".to_string()),
            AppError::Unauthorized(msg) if msg == "expired"
        ));
        assert!(matches!(
            AppError::from_status(StatusCode::TOO_MANY_REQUESTS, String::new()),
            AppError::TooManyRequests
        ));
        assert!(matches!(
            AppError::from_status(StatusCode::NOT_FOUND, "gone".to_string()),
            AppError::Api { status: StatusCode::NOT_FOUND, .. }
        ));
    }

    #[test]
    fn test_label_not_found_message() {
        let err = AppError::LabelNotFound("Google’s APIs".to_string());
        assert_eq!(err.to_string(), "Label \"Google’s APIs\" not found.");
    }
}
