use std::sync::Arc;

use serde_json::{json, Value};
use tokio::sync::mpsc;
use wiremock::{MockServer, Request, Respond, ResponseTemplate};

use crate::{
    auth::{
        credentials::ClientCredentials,
        token::{AccessToken, Token},
    },
    email::{
        client::EmailClient,
        reply::{ReplySender, ReplyTemplate},
    },
};

pub const USER_PATH: &str = "/gmail/v1/users/me";
pub const LABEL_NAME: &str = "Google’s APIs";

pub fn api_path(suffix: &str) -> String {
    format!("{USER_PATH}/{suffix}")
}

pub fn credentials(server: &MockServer) -> ClientCredentials {
    ClientCredentials {
        client_id: "test-client.apps.googleusercontent.com".to_string(),
        client_secret: "test-secret".to_string(),
        redirect_uri: "http://localhost:3000/oauth2callback".to_string(),
        auth_uri: format!("{}/o/oauth2/auth", server.uri()),
        token_uri: format!("{}/token", server.uri()),
    }
}

pub fn token(access_token: &str) -> Token {
    Token {
        access_token: access_token.to_string(),
        refresh_token: Some("1//refresh".to_string()),
        scope: Some("https://www.googleapis.com/auth/gmail.modify".to_string()),
        token_type: Some("Bearer".to_string()),
        expiry_date: None,
    }
}

pub fn template() -> ReplyTemplate {
    ReplyTemplate {
        subject: "Automatic Reply".to_string(),
        body: "Thank you for your email. I am on Vacation.".to_string(),
        label: LABEL_NAME.to_string(),
    }
}

pub struct TestMailbox {
    pub server: MockServer,
    pub client: Arc<EmailClient>,
    pub replier: Arc<ReplySender>,
}

pub async fn setup() -> TestMailbox {
    let server = MockServer::start().await;
    let http_client = reqwest::Client::new();
    let access = AccessToken::new(
        http_client.clone(),
        Arc::new(credentials(&server)),
        token("ya29.test"),
    );
    let client = Arc::new(EmailClient::new(
        http_client,
        access,
        format!("{}{}", server.uri(), USER_PATH),
    ));
    let replier = Arc::new(ReplySender::new(client.clone(), template()));

    TestMailbox {
        server,
        client,
        replier,
    }
}

pub fn message_json(id: &str, thread_id: &str, headers: &[(&str, &str)]) -> Value {
    let headers = headers
        .iter()
        .map(|(name, value)| json!({ "name": name, "value": value }))
        .collect::<Vec<_>>();

    json!({
        "id": id,
        "threadId": thread_id,
        "labelIds": ["UNREAD", "INBOX"],
        "payload": {
            "mimeType": "text/plain",
            "headers": headers,
        },
    })
}

pub fn labels_json(with_reply_label: bool) -> Value {
    let mut labels = vec![json!({ "id": "INBOX", "name": "INBOX", "type": "system" })];
    if with_reply_label {
        labels.push(json!({ "id": "Label_7", "name": LABEL_NAME, "type": "user" }));
    }
    json!({ "labels": labels })
}

pub async fn requests_to(server: &MockServer, path: &str) -> Vec<Request> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|r| r.url.path() == path)
        .collect()
}

/// Answers with a fixed template and reports every matched request.
pub struct NotifyingResponder {
    template: ResponseTemplate,
    tx: mpsc::UnboundedSender<()>,
}

impl Respond for NotifyingResponder {
    fn respond(&self, _request: &Request) -> ResponseTemplate {
        let _ = self.tx.send(());
        self.template.clone()
    }
}

pub fn notifying(template: ResponseTemplate) -> (NotifyingResponder, mpsc::UnboundedReceiver<()>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (NotifyingResponder { template, tx }, rx)
}

/// Decodes the `raw` field of a captured `messages/send` request.
pub fn sent_raw(request: &Request) -> String {
    let body: Value = serde_json::from_slice(&request.body).expect("send body is json");
    let raw = body["raw"].as_str().expect("send body has raw");
    lib_utils::b64::b64u_decode_to_string(raw).expect("raw is base64url")
}
