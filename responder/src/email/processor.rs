use google_gmail1::api::Message;

use crate::{
    email::{
        client::EmailClient,
        reply::{ReplyOutcome, ReplySender},
    },
    error::AppResult,
};

#[derive(Debug)]
pub enum MessageOutcome {
    SenderNotFound,
    NoThread,
    Replied(ReplyOutcome),
}

/// Value of the first header named exactly `From`.
pub fn extract_sender(message: &Message) -> Option<String> {
    message
        .payload
        .as_ref()?
        .headers
        .as_ref()?
        .iter()
        .find(|h| h.name.as_deref() == Some("From"))
        .and_then(|h| h.value.clone())
}

pub async fn process_message(
    client: &EmailClient,
    replier: &ReplySender,
    message_id: &str,
) -> AppResult<MessageOutcome> {
    let message = client.get_message_by_id(message_id).await?;

    let Some(sender) = extract_sender(&message) else {
        tracing::info!("Sender email not found.");
        return Ok(MessageOutcome::SenderNotFound);
    };
    tracing::info!("Sender: {}", sender);

    let Some(thread_id) = message.thread_id.as_deref() else {
        tracing::warn!("Cannot reply, message has no thread id.");
        return Ok(MessageOutcome::NoThread);
    };

    Ok(MessageOutcome::Replied(
        replier.send_reply(thread_id, &sender).await,
    ))
}
