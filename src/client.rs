use std::ops::ControlFlow;

use tracing::instrument;

use crate::config::ClientConfig;
use crate::error::{Result, WotError};
use crate::model::{Roster, Season};
use crate::wot_api::{self, Transport};

pub use crate::wot_api::battles::BattleProgress;

/// The main entry point for talking to the World of Tanks API.
///
/// `WotClient` wraps one shared [`reqwest::Client`] and exposes the lookups
/// needed to build a clan roster. Every call takes the API key explicitly.
///
/// # Examples
///
/// ```no_run
/// # async fn example() -> goldtool::Result<()> {
/// use goldtool::WotClient;
///
/// let client = WotClient::new();
/// let clan_id = client.resolve_clan_id("my-application-id", "STRGV").await?;
/// let roster = client.fetch_clan_members("my-application-id", clan_id).await?;
/// println!("Found {} members", roster.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct WotClient {
    transport: Transport,
}

impl WotClient {
    /// Create a new client against the EU realm with default settings.
    ///
    /// The underlying [`reqwest::Client`] has no request timeout; use
    /// [`WotClient::with_config`] to apply [`ClientConfig::timeout`].
    pub fn new() -> Self {
        Self::with_client(reqwest::Client::new(), ClientConfig::default())
    }

    /// Create a client whose HTTP client is built from `config`.
    ///
    /// Fails with [`WotError::ClientBuild`] if the HTTP client cannot be
    /// initialized, e.g. when no TLS backend is available.
    pub fn with_config(config: ClientConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|source| WotError::ClientBuild { source })?;
        Ok(Self::with_client(http, config))
    }

    /// Create a client using the provided [`reqwest::Client`].
    ///
    /// Use this when you need to configure proxies, headers, etc. Timeouts
    /// belong to `client`: `config.timeout` is not applied here.
    pub fn with_client(client: reqwest::Client, config: ClientConfig) -> Self {
        Self {
            transport: Transport {
                http: client,
                config,
            },
        }
    }

    /// Fetch every Global Map season known to the backend.
    #[instrument(skip_all)]
    pub async fn fetch_seasons(&self, api_key: &str) -> Result<Vec<Season>> {
        wot_api::seasons::fetch_seasons(&self.transport, api_key).await
    }

    /// Resolve a clan tag to its id. Fails with `NotFound` unless exactly one
    /// search result carries exactly this tag.
    #[instrument(skip(self, api_key))]
    pub async fn resolve_clan_id(&self, api_key: &str, clan_tag: &str) -> Result<u64> {
        wot_api::clans::resolve_clan_id(&self.transport, api_key, clan_tag).await
    }

    /// Fetch the current members of a clan, with zeroed battle counts.
    #[instrument(skip(self, api_key))]
    pub async fn fetch_clan_members(&self, api_key: &str, clan_id: u64) -> Result<Roster> {
        wot_api::clans::fetch_clan_members(&self.transport, api_key, clan_id).await
    }

    /// Fill in tier 8 and tier 10 battles of `season_id` for every member.
    #[instrument(skip(self, api_key, roster))]
    pub async fn fetch_season_battles(
        &self,
        api_key: &str,
        roster: &mut Roster,
        season_id: &str,
    ) -> Result<()> {
        self.fetch_season_battles_with(api_key, roster, season_id, |_| ControlFlow::Continue(()))
            .await
    }

    /// Like [`WotClient::fetch_season_battles`], reporting each finished member
    /// to `observer`. Returning [`ControlFlow::Break`] stops the lookup with
    /// [`crate::WotError::Cancelled`].
    pub async fn fetch_season_battles_with<F>(
        &self,
        api_key: &str,
        roster: &mut Roster,
        season_id: &str,
        observer: F,
    ) -> Result<()>
    where
        F: FnMut(BattleProgress<'_>) -> ControlFlow<()>,
    {
        wot_api::battles::fetch_season_battles(&self.transport, api_key, roster, season_id, observer)
            .await
    }
}

impl Default for WotClient {
    fn default() -> Self {
        Self::new()
    }
}
