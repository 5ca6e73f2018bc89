use std::time::Duration;

/// Attempts per request, the first one included.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Pause between two per-member battle lookups.
pub const DEFAULT_THROTTLE: Duration = Duration::from_millis(500);

pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(250);

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Regional Wargaming API cluster.
#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    strum_macros::Display,
    strum_macros::EnumString,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Realm {
    #[default]
    Eu,
    Na,
    Asia,
}

impl Realm {
    /// Base URL of the World of Tanks API on this realm.
    pub fn base_url(self) -> &'static str {
        match self {
            Realm::Eu => "https://api.worldoftanks.eu/wot",
            Realm::Na => "https://api.worldoftanks.com/wot",
            Realm::Asia => "https://api.worldoftanks.asia/wot",
        }
    }
}

/// Transport and rate settings for [`crate::WotClient`].
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use goldtool::{ClientConfig, Realm};
///
/// let config = ClientConfig::for_realm(Realm::Na).with_throttle(Duration::from_secs(1));
/// assert_eq!(config.base_url, "https://api.worldoftanks.com/wot");
/// assert_eq!(config.max_attempts, 3);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    pub max_attempts: u32,
    pub retry_delay: Duration,
    pub throttle: Duration,
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn for_realm(realm: Realm) -> Self {
        Self {
            base_url: realm.base_url().to_owned(),
            ..Self::default()
        }
    }

    /// Point the client at another host, e.g. a proxy or a local test server.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    pub fn with_throttle(mut self, throttle: Duration) -> Self {
        self.throttle = throttle;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: Realm::default().base_url().to_owned(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_delay: DEFAULT_RETRY_DELAY,
            throttle: DEFAULT_THROTTLE,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}
