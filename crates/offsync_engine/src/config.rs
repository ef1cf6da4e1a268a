//! Configuration for the offline engine.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Key under which the queue is persisted when no account is configured.
pub const DEFAULT_QUEUE_KEY: &str = "offline-queue";

/// Suffix appended to the queue key for the dead-letter list.
pub const DEAD_LETTER_SUFFIX: &str = ".dead-letter";

/// Account bytes kept as is; everything else, `.` and `%` included, is
/// percent-encoded so an encoded account never ends in the dead-letter
/// suffix.
const ACCOUNT_KEEP: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'_');

/// Configuration for an [`crate::OfflineEngine`].
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Base key of the persisted queue.
    pub base_key: String,
    /// Account the queue belongs to, if queues are kept per identity.
    pub account: Option<String>,
    /// Retry ceiling for rejected changes.
    pub retry: RetryPolicy,
    /// Whether `enqueue` starts a flush when online.
    pub flush_on_enqueue: bool,
    /// Whether connectivity edges are reported to the notifier.
    pub announce_connectivity: bool,
}

impl EngineConfig {
    /// Creates the default configuration.
    pub fn new() -> Self {
        Self {
            base_key: DEFAULT_QUEUE_KEY.to_string(),
            account: None,
            retry: RetryPolicy::default(),
            flush_on_enqueue: true,
            announce_connectivity: true,
        }
    }

    /// Sets the base queue key.
    pub fn with_queue_key(mut self, key: impl Into<String>) -> Self {
        self.base_key = key.into();
        self
    }

    /// Scopes the queue to an account.
    pub fn with_account(mut self, account: impl Into<String>) -> Self {
        self.account = Some(account.into());
        self
    }

    /// Sets the retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Sets whether `enqueue` starts a flush when online.
    pub fn with_flush_on_enqueue(mut self, flush: bool) -> Self {
        self.flush_on_enqueue = flush;
        self
    }

    /// Sets whether connectivity edges are reported to the notifier.
    pub fn with_announce_connectivity(mut self, announce: bool) -> Self {
        self.announce_connectivity = announce;
        self
    }

    /// Returns the storage key of the queue.
    ///
    /// `<base>` without an account, `<base>:<account>` with one. The account
    /// is percent-encoded, keeping only ASCII letters, digits, `-` and `_`,
    /// so distinct accounts never share a key.
    pub fn queue_key(&self) -> String {
        match &self.account {
            Some(account) => format!("{}:{}", self.base_key, encode_account(account)),
            None => self.base_key.clone(),
        }
    }

    /// Returns the storage key of the dead-letter list.
    pub fn dead_letter_key(&self) -> String {
        format!("{}{}", self.queue_key(), DEAD_LETTER_SUFFIX)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn encode_account(account: &str) -> String {
    utf8_percent_encode(account, ACCOUNT_KEEP).to_string()
}

/// How often a rejected change is retried before it is abandoned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RetryPolicy {
    /// Maximum number of rejected dispatches; `None` retries forever.
    pub max_attempts: Option<u32>,
}

impl RetryPolicy {
    /// Retries rejected changes forever.
    pub fn unlimited() -> Self {
        Self { max_attempts: None }
    }

    /// Abandons a change after `attempts` rejections (at least one).
    pub fn max_attempts(attempts: u32) -> Self {
        Self {
            max_attempts: Some(attempts.max(1)),
        }
    }

    /// Returns true if a change rejected `attempts` times should be abandoned.
    pub fn is_exhausted(&self, attempts: u32) -> bool {
        self.max_attempts.is_some_and(|max| attempts >= max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_config_builder() {
        let config = EngineConfig::new()
            .with_queue_key("drafts")
            .with_retry(RetryPolicy::max_attempts(5))
            .with_flush_on_enqueue(false)
            .with_announce_connectivity(false);

        assert_eq!(config.queue_key(), "drafts");
        assert_eq!(config.retry.max_attempts, Some(5));
        assert!(!config.flush_on_enqueue);
        assert!(!config.announce_connectivity);
    }

    #[test]
    fn default_keys() {
        let config = EngineConfig::default();
        assert_eq!(config.queue_key(), "offline-queue");
        assert_eq!(config.dead_letter_key(), "offline-queue.dead-letter");
        assert!(config.flush_on_enqueue);
    }

    #[test]
    fn account_scoped_keys() {
        let config = EngineConfig::new().with_account("alice@example.com");
        assert_eq!(config.queue_key(), "offline-queue:alice%40example%2Ecom");
        assert_eq!(
            config.dead_letter_key(),
            "offline-queue:alice%40example%2Ecom.dead-letter"
        );
    }

    #[test]
    fn distinct_accounts_get_distinct_keys() {
        let key = |account: &str| EngineConfig::new().with_account(account).queue_key();

        assert_ne!(key("a@b"), key("a_b"));
        assert_ne!(key("a b"), key("a_b"));
        assert_ne!(key("a%40b"), key("a@b"));
        assert_eq!(key("a_b"), "offline-queue:a_b");
    }

    #[test]
    fn account_queue_never_matches_dead_letter_key() {
        let plain = EngineConfig::new().with_account("x");
        let suffixed = EngineConfig::new().with_account("x.dead-letter");

        assert_ne!(suffixed.queue_key(), plain.dead_letter_key());
        assert_eq!(suffixed.queue_key(), "offline-queue:x%2Edead-letter");
    }

    #[test]
    fn retry_policy_limits() {
        assert!(!RetryPolicy::unlimited().is_exhausted(u32::MAX));

        let policy = RetryPolicy::max_attempts(3);
        assert!(!policy.is_exhausted(2));
        assert!(policy.is_exhausted(3));

        // Zero is clamped to one
        assert_eq!(RetryPolicy::max_attempts(0).max_attempts, Some(1));
    }
}
