use std::ops::ControlFlow;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::client::WotClient;
use crate::error::{Result, WotError};
use crate::model::{Roster, Season, SeasonCatalog};

/// Where a pipeline run currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, strum_macros::Display)]
#[strum(serialize_all = "snake_case")]
pub enum PipelineStage {
    Idle,
    SeasonsFetched,
    ClanResolved,
    MembersFetched,
    BattlesFetched,
}

/// A message emitted while a run makes progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Progress {
    Stage(PipelineStage),
    Member {
        done: usize,
        total: usize,
        name: String,
    },
}

/// Inputs of one pipeline run.
#[derive(Clone)]
pub struct PipelineRequest {
    pub api_key: String,
    pub clan_tag: String,
    /// Season name, or season id.
    pub season: String,
}

impl std::fmt::Debug for PipelineRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineRequest")
            .field("api_key", &"<redacted>")
            .field("clan_tag", &self.clan_tag)
            .field("season", &self.season)
            .finish()
    }
}

/// A fully populated roster together with what it was built for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PipelineOutcome {
    pub clan_tag: String,
    pub clan_id: u64,
    pub season: Season,
    pub roster: Roster,
}

/// Cooperative cancellation flag shared between a run and its owner.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            return Err(WotError::Cancelled);
        }
        Ok(())
    }
}

/// Run the season, clan, members and battles lookups that build a roster,
/// aborting on the first failure.
///
/// Nothing of a failed run is returned. The cancel flag is checked between
/// stages and between two member lookups.
#[instrument(skip(client, request, cancel, on_progress), fields(clan_tag = %request.clan_tag, season = %request.season))]
pub async fn run_pipeline<F>(
    client: &WotClient,
    request: &PipelineRequest,
    cancel: &CancelFlag,
    mut on_progress: F,
) -> Result<PipelineOutcome>
where
    F: FnMut(Progress),
{
    let api_key = request.api_key.as_str();
    on_progress(Progress::Stage(PipelineStage::Idle));
    cancel.check()?;

    let catalog = SeasonCatalog::new(client.fetch_seasons(api_key).await?);
    let season = catalog
        .resolve(&request.season)
        .cloned()
        .ok_or_else(|| WotError::NotFound {
            what: "season",
            query: request.season.clone(),
            matches: 0,
        })?;
    debug!(season_id = %season.id, "resolved season");
    on_progress(Progress::Stage(PipelineStage::SeasonsFetched));
    cancel.check()?;

    let clan_id = client.resolve_clan_id(api_key, &request.clan_tag).await?;
    on_progress(Progress::Stage(PipelineStage::ClanResolved));
    cancel.check()?;

    let mut roster = client.fetch_clan_members(api_key, clan_id).await?;
    on_progress(Progress::Stage(PipelineStage::MembersFetched));
    cancel.check()?;

    client
        .fetch_season_battles_with(api_key, &mut roster, &season.id, |progress| {
            on_progress(Progress::Member {
                done: progress.done,
                total: progress.total,
                name: progress.member.name.clone(),
            });
            if cancel.is_cancelled() {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        })
        .await?;
    on_progress(Progress::Stage(PipelineStage::BattlesFetched));

    info!(clan_id, members = roster.len(), "roster complete");
    Ok(PipelineOutcome {
        clan_tag: request.clan_tag.clone(),
        clan_id,
        season,
        roster,
    })
}
