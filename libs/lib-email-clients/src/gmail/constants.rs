use std::{fmt, str::FromStr};

pub const INBOX_LABEL: &str = "INBOX";
pub const UNREAD_QUERY: &str = "is:unread";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessScopes {
    AllGmail,
    Compose,
    Labels,
    Modify,
    Readonly,
    Send,
}

impl AccessScopes {
    pub fn url(&self) -> &'static str {
        match self {
            AccessScopes::AllGmail => "https://mail.google.com/",
            AccessScopes::Compose => "https://www.googleapis.com/auth/gmail.compose",
            AccessScopes::Labels => "https://www.googleapis.com/auth/gmail.labels",
            AccessScopes::Modify => "https://www.googleapis.com/auth/gmail.modify",
            AccessScopes::Readonly => "https://www.googleapis.com/auth/gmail.readonly",
            AccessScopes::Send => "https://www.googleapis.com/auth/gmail.send",
        }
    }

    /// Whether this scope lets the holder read, send and relabel messages.
    pub fn allows_modify(&self) -> bool {
        matches!(self, AccessScopes::AllGmail | AccessScopes::Modify)
    }
}

impl FromStr for AccessScopes {
    type Err = AccessScopesParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [
            AccessScopes::AllGmail,
            AccessScopes::Compose,
            AccessScopes::Labels,
            AccessScopes::Modify,
            AccessScopes::Readonly,
            AccessScopes::Send,
        ]
        .into_iter()
        .find(|scope| scope.url() == s)
        .ok_or(AccessScopesParseError)
    }
}

#[derive(Debug)]
pub struct AccessScopesParseError;

impl fmt::Display for AccessScopesParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid access scope")
    }
}

impl std::error::Error for AccessScopesParseError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_round_trip() {
        let scope: AccessScopes = "https://www.googleapis.com/auth/gmail.modify"
            .parse()
            .unwrap();
        assert_eq!(scope, AccessScopes::Modify);
        assert!(scope.allows_modify());
        assert!(!AccessScopes::Readonly.allows_modify());
        assert!("https://example.com/scope".parse::<AccessScopes>().is_err());
    }
}
