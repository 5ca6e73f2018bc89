use std::collections::HashMap;

use itertools::Itertools;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::error::{Result, WotError};
use crate::model::{ClanMember, Roster};
use crate::wot_api::{self, Payload, Transport, APPLICATION_ID};

const LIST_ENDPOINT: &str = "clans/list";
const LIST_FIELDS: &[&str] = &["tag", "clan_id"];

const INFO_ENDPOINT: &str = "clans/info";
const INFO_FIELDS: &[&str] = &["members.account_id", "members.account_name"];

#[derive(Debug, Deserialize)]
struct ClanListEntry {
    tag: String,
    clan_id: u64,
}

#[derive(Debug, Deserialize)]
struct ClanInfo {
    members: Option<Vec<MemberEntry>>,
}

#[derive(Debug, Deserialize)]
struct MemberEntry {
    account_id: u64,
    account_name: String,
}

#[instrument(skip(transport, api_key))]
pub(crate) async fn resolve_clan_id(
    transport: &Transport,
    api_key: &str,
    clan_tag: &str,
) -> Result<u64> {
    let params = [
        (APPLICATION_ID, api_key.to_owned()),
        ("search", clan_tag.to_owned()),
    ];
    let payload = wot_api::get_request(transport, LIST_ENDPOINT, &params, LIST_FIELDS).await?;
    let clan_id = parse_clan_id(payload, clan_tag)?;
    debug!(clan_id, "resolved clan tag");
    Ok(clan_id)
}

/// The search endpoint matches fuzzily; only an entry with the exact tag counts.
fn parse_clan_id(payload: Payload, clan_tag: &str) -> Result<u64> {
    let entries: Vec<ClanListEntry> = wot_api::decode_data(LIST_ENDPOINT, payload)?;
    debug!(candidates = entries.len(), "searched clans");
    entries
        .into_iter()
        .filter(|e| e.tag == clan_tag)
        .exactly_one()
        .map(|e| e.clan_id)
        .map_err(|matches| WotError::NotFound {
            what: "clan tag",
            query: clan_tag.to_owned(),
            matches: matches.count(),
        })
}

#[instrument(skip(transport, api_key))]
pub(crate) async fn fetch_clan_members(
    transport: &Transport,
    api_key: &str,
    clan_id: u64,
) -> Result<Roster> {
    let params = [
        (APPLICATION_ID, api_key.to_owned()),
        ("clan_id", clan_id.to_string()),
    ];
    let payload = wot_api::get_request(transport, INFO_ENDPOINT, &params, INFO_FIELDS).await?;
    let roster = parse_members(payload, clan_id)?;
    debug!(count = roster.len(), "parsed clan members");
    Ok(roster)
}

fn parse_members(payload: Payload, clan_id: u64) -> Result<Roster> {
    let mut clans: HashMap<String, Option<ClanInfo>> =
        wot_api::decode_data(INFO_ENDPOINT, payload)?;
    let key = clan_id.to_string();
    match clans.remove(&key) {
        Some(Some(info)) => Ok(info
            .members
            .unwrap_or_default()
            .into_iter()
            .map(|m| ClanMember::new(m.account_name, m.account_id))
            .collect()),
        Some(None) => Err(WotError::NotFound {
            what: "clan id",
            query: key,
            matches: 0,
        }),
        None => Err(WotError::Malformed {
            endpoint: INFO_ENDPOINT.to_owned(),
            context: format!("response has no entry for clan {key}"),
        }),
    }
}
