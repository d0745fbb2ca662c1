use std::time::Duration;

use google_gmail1::api::{Label, ListLabelsResponse, ListMessagesResponse, Message, Thread, WatchResponse};
use leaky_bucket::RateLimiter;
use lib_email_clients::gmail::{
    api_quota::{GMAIL_API_QUOTA, GMAIL_QUOTA_PER_SECOND},
    constants::{INBOX_LABEL, UNREAD_QUERY},
};
use serde::de::DeserializeOwned;
use serde_json::json;

use crate::{
    auth::token::AccessToken,
    error::{AppError, AppResult},
    HttpClient,
};

macro_rules! gmail_url {
    ($base:expr, $($params:expr),*) => {
        {
            let list_params: Vec<&str> = vec![$($params),*];
            let path = list_params.join("/");
            format!("{}/{}", $base.trim_end_matches('/'), path)
        }
    };
}

/// Thin Gmail REST client scoped to the authenticated user (`users/me`).
pub struct EmailClient {
    http_client: HttpClient,
    access: AccessToken,
    api_base: String,
    rate_limiter: RateLimiter,
}

impl EmailClient {
    pub fn new(http_client: HttpClient, access: AccessToken, api_base: impl Into<String>) -> Self {
        let rate_limiter = RateLimiter::builder()
            .initial(GMAIL_QUOTA_PER_SECOND)
            .max(GMAIL_QUOTA_PER_SECOND)
            .interval(Duration::from_secs(1))
            .refill(GMAIL_QUOTA_PER_SECOND)
            .build();

        EmailClient {
            http_client,
            access,
            api_base: api_base.into(),
            rate_limiter,
        }
    }

    pub async fn watch_mailbox(&self, topic_name: &str) -> AppResult<WatchResponse> {
        self.rate_limiter.acquire(GMAIL_API_QUOTA.watch).await;
        let req = self
            .http_client
            .post(gmail_url!(self.api_base, "watch"))
            .json(&json!({
                "topicName": topic_name,
                "labelIds": [INBOX_LABEL],
            }));

        self.send_json(req).await
    }

    /// Ids of unread messages in the inbox, first result page only.
    pub async fn list_unread_inbox_messages(&self) -> AppResult<Vec<String>> {
        self.rate_limiter
            .acquire(GMAIL_API_QUOTA.messages_list)
            .await;
        let req = self
            .http_client
            .get(gmail_url!(self.api_base, "messages"))
            .query(&[("labelIds", INBOX_LABEL), ("q", UNREAD_QUERY)]);

        let data: ListMessagesResponse = self.send_json(req).await?;

        Ok(data
            .messages
            .unwrap_or_default()
            .into_iter()
            .filter_map(|m| m.id)
            .collect())
    }

    pub async fn get_message_by_id(&self, message_id: &str) -> AppResult<Message> {
        self.rate_limiter
            .acquire(GMAIL_API_QUOTA.messages_get)
            .await;
        let req = self
            .http_client
            .get(gmail_url!(self.api_base, "messages", message_id))
            .query(&[("format", "full")]);

        self.send_json(req).await
    }

    pub async fn get_labels(&self) -> AppResult<Vec<Label>> {
        self.rate_limiter.acquire(GMAIL_API_QUOTA.labels_list).await;
        let req = self.http_client.get(gmail_url!(self.api_base, "labels"));
        let data: ListLabelsResponse = self.send_json(req).await?;

        Ok(data.labels.unwrap_or_default())
    }

    /// Looks the label up on every call, names are not cached.
    pub async fn get_label_id(&self, label_name: &str) -> AppResult<String> {
        let labels = self.get_labels().await?;
        find_label_id(&labels, label_name)
    }

    /// Sends an already base64url encoded RFC 822 message.
    pub async fn send_raw_message(&self, raw: &str, thread_id: Option<&str>) -> AppResult<Message> {
        self.rate_limiter
            .acquire(GMAIL_API_QUOTA.messages_send)
            .await;
        let mut body = json!({ "raw": raw });
        if let Some(thread_id) = thread_id {
            body["threadId"] = json!(thread_id);
        }
        let req = self
            .http_client
            .post(gmail_url!(self.api_base, "messages", "send"))
            .json(&body);

        self.send_json(req).await
    }

    pub async fn modify_message_labels(
        &self,
        message_id: &str,
        add_label_ids: &[&str],
        remove_label_ids: &[&str],
    ) -> AppResult<Message> {
        self.rate_limiter
            .acquire(GMAIL_API_QUOTA.messages_modify)
            .await;
        let req = self
            .http_client
            .post(gmail_url!(self.api_base, "messages", message_id, "modify"))
            .json(&json!({
                "addLabelIds": add_label_ids,
                "removeLabelIds": remove_label_ids,
            }));

        self.send_json(req).await
    }

    pub async fn modify_thread_labels(
        &self,
        thread_id: &str,
        add_label_ids: &[&str],
        remove_label_ids: &[&str],
    ) -> AppResult<Thread> {
        self.rate_limiter
            .acquire(GMAIL_API_QUOTA.threads_modify)
            .await;
        let req = self
            .http_client
            .post(gmail_url!(self.api_base, "threads", thread_id, "modify"))
            .json(&json!({
                "addLabelIds": add_label_ids,
                "removeLabelIds": remove_label_ids,
            }));

        self.send_json(req).await
    }

    async fn send_json<T: DeserializeOwned>(&self, req: reqwest::RequestBuilder) -> AppResult<T> {
        let access_token = self.access.bearer().await?;
        let resp = req.bearer_auth(access_token).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(AppError::from_status(status, body));
        }

        Ok(resp.json::<T>().await?)
    }
}

fn find_label_id(labels: &[Label], label_name: &str) -> AppResult<String> {
    labels
        .iter()
        .find(|l| l.name.as_deref() == Some(label_name))
        .and_then(|l| l.id.clone())
        .ok_or_else(|| AppError::LabelNotFound(label_name.to_string()))
}

#[cfg(test)]
mod tests {
    use google_gmail1::api::Label;

    use super::*;

    #[test]
    fn test_gmail_url() {
        const BASE: &str = "https://gmail.googleapis.com/gmail/v1/users/me";
        let url = gmail_url!(BASE, "messages");
        assert_eq!(url, "https://gmail.googleapis.com/gmail/v1/users/me/messages");
        let url = gmail_url!(BASE, "threads", "123", "modify");
        assert_eq!(
            url,
            "https://gmail.googleapis.com/gmail/v1/users/me/threads/123/modify"
        );
        let url = gmail_url!("http://127.0.0.1:4000/users/me/", "labels");
        assert_eq!(url, "http://127.0.0.1:4000/users/me/labels");
    }

    #[test]
    fn test_find_label_id() {
        let labels = vec![
            Label {
                id: Some("INBOX".to_string()),
                name: Some("INBOX".to_string()),
                ..Label::default()
            },
            Label {
                id: Some("Label_10".to_string()),
                name: Some("Google’s APIs".to_string()),
                ..Label::default()
            },
        ];

        assert_eq!(find_label_id(&labels, "Google’s APIs").unwrap(), "Label_10");
        assert!(matches!(
            find_label_id(&labels, "Vacation"),
            Err(AppError::LabelNotFound(name)) if name == "Vacation"
        ));
    }
}
