use std::sync::Arc;

use lib_email_clients::gmail::constants::INBOX_LABEL;
use lib_utils::b64::b64u_encode;

use crate::{app_config::AppConfig, email::client::EmailClient, error::AppError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyTemplate {
    pub subject: String,
    pub body: String,
    pub label: String,
}

impl From<&AppConfig> for ReplyTemplate {
    fn from(config: &AppConfig) -> Self {
        ReplyTemplate {
            subject: config.reply_subject.clone(),
            body: config.reply_body.clone(),
            label: config.reply_label.clone(),
        }
    }
}

/// Terminal state of one reply attempt.
#[derive(Debug)]
pub enum ReplyOutcome {
    Labeled { message_id: String, label_id: String },
    /// The reply went out but could not be labeled
    LabelFailed { message_id: String, error: AppError },
    SendFailed(AppError),
    ThreadModifyFailed(AppError),
}

impl ReplyOutcome {
    pub fn was_sent(&self) -> bool {
        matches!(
            self,
            ReplyOutcome::Labeled { .. } | ReplyOutcome::LabelFailed { .. }
        )
    }
}

pub struct ReplySender {
    client: Arc<EmailClient>,
    template: ReplyTemplate,
}

impl ReplySender {
    pub fn new(client: Arc<EmailClient>, template: ReplyTemplate) -> Self {
        Self { client, template }
    }

    /// Sends the canned reply to `to` on `thread_id`, then labels the sent message.
    pub async fn send_reply(&self, thread_id: &str, to: &str) -> ReplyOutcome {
        if let Err(e) = self
            .client
            .modify_thread_labels(thread_id, &[INBOX_LABEL], &[])
            .await
        {
            tracing::error!("Error modifying thread {}: {}", thread_id, e);
            return ReplyOutcome::ThreadModifyFailed(e);
        }

        let raw = build_raw_reply(&self.template.subject, to, &self.template.body);
        let sent = match self
            .client
            .send_raw_message(&b64u_encode(raw), Some(thread_id))
            .await
        {
            Ok(sent) => sent,
            Err(e) => {
                tracing::error!("Error while sending the auto-reply: {}", e);
                return ReplyOutcome::SendFailed(e);
            }
        };
        tracing::info!("Auto-reply sent successfully: {:?}", sent);

        let Some(message_id) = sent.id else {
            tracing::error!("Send response carried no message id, cannot label reply");
            return ReplyOutcome::LabelFailed {
                message_id: String::new(),
                error: AppError::MissingField("id"),
            };
        };

        match self.label_reply(&message_id).await {
            Ok(label_id) => {
                tracing::info!("Label applied successfully.");
                ReplyOutcome::Labeled {
                    message_id,
                    label_id,
                }
            }
            Err(error) => {
                tracing::error!("Error labeling reply {}: {}", message_id, error);
                ReplyOutcome::LabelFailed { message_id, error }
            }
        }
    }

    async fn label_reply(&self, message_id: &str) -> Result<String, AppError> {
        let label_id = self.client.get_label_id(&self.template.label).await?;
        self.client
            .modify_message_labels(message_id, &[label_id.as_str()], &[])
            .await?;
        Ok(label_id)
    }
}

/// Single part text/plain message: headers, blank line, body.
pub fn build_raw_reply(subject: &str, to: &str, body: &str) -> String {
    [
        "Content-Type: text/plain;charset=utf-8",
        "MIME-Version: 1.0",
        format!("Subject: {subject}").as_str(),
        format!("To: {to}").as_str(),
        "",
        body,
    ]
    .join("\n")
    .trim()
    .to_string()
}
