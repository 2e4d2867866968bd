pub const DEFAULT_TELEGRAM_API_URL: &str = "https://api.telegram.org";

/// Seconds the Bot API holds a `getUpdates` request open when idle.
pub const LONG_POLL_TIMEOUT_SECS: u64 = 30;
/// Slack on top of the long-poll window before the HTTP client gives up.
pub const HTTP_TIMEOUT_GRACE_SECS: u64 = 15;
pub const POLL_RETRY_DELAY_SECS: u64 = 3;

pub const ALLOWED_UPDATES: &[&str] = &["chat_member"];
