use std::collections::HashMap;
use std::ops::ControlFlow;

use serde::Deserialize;
use tracing::{debug, instrument};

use crate::error::{Result, WotError};
use crate::model::{ClanMember, TierBattles};
use crate::wot_api::{self, Payload, Transport, APPLICATION_ID};

const ENDPOINT: &str = "globalmap/seasonaccountinfo";
const FIELDS: &[&str] = &["seasons.battles", "seasons.vehicle_level"];

/// Tiers 10 and 8, pre-encoded the same way as the field list.
const VEHICLE_LEVELS: &str = "10%2C+8";

/// Tier of each entry by position, for responses that omit `vehicle_level`.
const POSITIONAL_LEVELS: [u8; 2] = [10, 8];

#[derive(Debug, Deserialize)]
struct AccountSeasons {
    seasons: Option<HashMap<String, Option<Vec<LevelBattles>>>>,
}

#[derive(Debug, Deserialize)]
struct LevelBattles {
    battles: Option<u32>,
    vehicle_level: Option<u8>,
}

/// Progress of a season battle lookup, reported after each member.
#[derive(Debug, Clone, Copy)]
pub struct BattleProgress<'a> {
    pub done: usize,
    pub total: usize,
    pub member: &'a ClanMember,
}

/// Look up tier 8/10 battles for every member, one request per member.
///
/// Requests are spaced by the configured throttle. The observer runs after
/// each member; returning [`ControlFlow::Break`] stops with [`WotError::Cancelled`].
#[instrument(skip(transport, api_key, roster, observer), fields(members = roster.len()))]
pub(crate) async fn fetch_season_battles<F>(
    transport: &Transport,
    api_key: &str,
    roster: &mut [ClanMember],
    season_id: &str,
    mut observer: F,
) -> Result<()>
where
    F: FnMut(BattleProgress<'_>) -> ControlFlow<()>,
{
    let total = roster.len();
    for (index, member) in roster.iter_mut().enumerate() {
        if index > 0 && !transport.config.throttle.is_zero() {
            tokio::time::sleep(transport.config.throttle).await;
        }

        let battles = fetch_member_battles(transport, api_key, member.id, season_id).await?;
        member.record_season(season_id, battles);
        debug!(
            account_id = member.id,
            tier10 = battles.tier10,
            tier8 = battles.tier8,
            "fetched member battles"
        );

        let progress = BattleProgress {
            done: index + 1,
            total,
            member: &*member,
        };
        if observer(progress).is_break() {
            return Err(WotError::Cancelled);
        }
    }
    Ok(())
}

async fn fetch_member_battles(
    transport: &Transport,
    api_key: &str,
    account_id: u64,
    season_id: &str,
) -> Result<TierBattles> {
    let params = [
        (APPLICATION_ID, api_key.to_owned()),
        ("season_id", season_id.to_owned()),
        ("account_id", account_id.to_string()),
        ("vehicle_level", VEHICLE_LEVELS.to_owned()),
    ];
    let payload = wot_api::get_request(transport, ENDPOINT, &params, FIELDS).await?;
    parse_member_battles(payload, account_id, season_id)
}

fn parse_member_battles(payload: Payload, account_id: u64, season_id: &str) -> Result<TierBattles> {
    let mut accounts: HashMap<String, Option<AccountSeasons>> =
        wot_api::decode_data(ENDPOINT, payload)?;
    let key = account_id.to_string();

    let Some(account) = accounts.remove(&key) else {
        return Err(WotError::Malformed {
            endpoint: ENDPOINT.to_owned(),
            context: format!("response has no entry for account {key}"),
        });
    };

    // Accounts without global map activity come back as null.
    let entries = account
        .and_then(|a| a.seasons)
        .and_then(|mut seasons| seasons.remove(season_id))
        .flatten()
        .unwrap_or_default();

    Ok(count_levels(&entries))
}

fn count_levels(entries: &[LevelBattles]) -> TierBattles {
    let mut battles = TierBattles::default();
    for (position, entry) in entries.iter().enumerate() {
        let level = entry
            .vehicle_level
            .or_else(|| POSITIONAL_LEVELS.get(position).copied());
        let count = entry.battles.unwrap_or(0);
        match level {
            Some(10) => battles.tier10 = count,
            Some(8) => battles.tier8 = count,
            other => debug!(level = ?other, count, "ignoring battles for unrequested tier"),
        }
    }
    battles
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_parse_battles_by_level() {
        let payload = Payload::Data(json!({
            "1001": {"seasons": {"season_12": [
                {"battles": 4, "vehicle_level": 8},
                {"battles": 17, "vehicle_level": 10}
            ]}}
        }));

        let battles = parse_member_battles(payload, 1001, "season_12").unwrap();
        assert_eq!(battles, TierBattles { tier8: 4, tier10: 17 });
    }

    #[test]
    fn test_parse_battles_positional_fallback() {
        let payload = Payload::Data(json!({
            "1001": {"seasons": {"season_12": [{"battles": 17}, {"battles": 4}]}}
        }));

        let battles = parse_member_battles(payload, 1001, "season_12").unwrap();
        assert_eq!(battles, TierBattles { tier8: 4, tier10: 17 });
    }

    #[test]
    fn test_null_battles_normalize_to_zero() {
        let payload = Payload::Data(json!({
            "1001": {"seasons": {"season_12": [
                {"battles": null, "vehicle_level": 10},
                {"battles": null, "vehicle_level": 8}
            ]}}
        }));
        let battles = parse_member_battles(payload, 1001, "season_12").unwrap();
        assert_eq!(battles, TierBattles::default());

        let payload = Payload::Data(json!({"1001": null}));
        let battles = parse_member_battles(payload, 1001, "season_12").unwrap();
        assert_eq!(battles, TierBattles::default());

        let payload = Payload::Data(json!({"1001": {"seasons": {"season_12": null}}}));
        let battles = parse_member_battles(payload, 1001, "season_12").unwrap();
        assert_eq!(battles, TierBattles::default());

        let payload = Payload::Data(json!({"1001": {"seasons": null}}));
        let battles = parse_member_battles(payload, 1001, "season_12").unwrap();
        assert_eq!(battles, TierBattles::default());

        let payload = Payload::Data(json!({"1001": {}}));
        let battles = parse_member_battles(payload, 1001, "season_12").unwrap();
        assert_eq!(battles, TierBattles::default());
    }

    #[test]
    fn test_missing_account_is_malformed() {
        let payload = Payload::Data(json!({"999": null}));
        assert!(matches!(
            parse_member_battles(payload, 1001, "season_12"),
            Err(WotError::Malformed { .. })
        ));
    }
}
