/// Per-user quota units Gmail allows each second.
pub const GMAIL_QUOTA_PER_SECOND: usize = 250;

/// Quota units charged per API method.
pub struct GmailApiQuota {
    pub watch: usize,
    pub messages_list: usize,
    pub messages_get: usize,
    pub messages_send: usize,
    pub messages_modify: usize,
    pub threads_modify: usize,
    pub labels_list: usize,
}

pub const GMAIL_API_QUOTA: GmailApiQuota = GmailApiQuota {
    watch: 100,
    messages_list: 5,
    messages_get: 5,
    messages_send: 100,
    messages_modify: 5,
    threads_modify: 10,
    labels_list: 1,
};
