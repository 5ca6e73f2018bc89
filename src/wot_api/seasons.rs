use serde::Deserialize;
use tracing::{debug, instrument};

use crate::error::Result;
use crate::model::Season;
use crate::wot_api::{self, Payload, Transport, APPLICATION_ID};

const ENDPOINT: &str = "globalmap/seasons";
const FIELDS: &[&str] = &["season_name", "season_id"];

#[derive(Debug, Deserialize)]
struct SeasonEntry {
    season_name: String,
    season_id: String,
}

#[instrument(skip_all)]
pub(crate) async fn fetch_seasons(transport: &Transport, api_key: &str) -> Result<Vec<Season>> {
    let params = [(APPLICATION_ID, api_key.to_owned())];
    let payload = wot_api::get_request(transport, ENDPOINT, &params, FIELDS).await?;
    let seasons = parse_seasons(payload)?;
    debug!(count = seasons.len(), "parsed seasons");
    Ok(seasons)
}

fn parse_seasons(payload: Payload) -> Result<Vec<Season>> {
    let entries: Vec<SeasonEntry> = wot_api::decode_data(ENDPOINT, payload)?;
    Ok(entries
        .into_iter()
        .map(|e| Season {
            name: e.season_name,
            id: e.season_id,
        })
        .collect())
}
