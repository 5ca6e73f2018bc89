// In-process stand-in for the Wargaming API.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{RawQuery, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use serde_json::{json, Value};

use goldtool::{ClientConfig, WotClient};

pub const API_KEY: &str = "test-key";
pub const CLAN_TAG: &str = "STRGV";
pub const CLAN_ID: u64 = 500197237;
pub const EMPTY_CLAN_ID: u64 = 500000009;
pub const SEASON_ID: &str = "season_12";
pub const SEASON_NAME: &str = "Season 12: Frontline";

const CLANS: &[(&str, u64)] = &[
    (CLAN_TAG, CLAN_ID),
    ("STRGV2", 500000001),
    ("TWIN", 500000002),
    ("TWIN", 500000003),
    ("EMPTY", EMPTY_CLAN_ID),
];

const MEMBERS: &[(u64, &str)] = &[
    (1001, "Alpha"),
    (1002, "Bravo"),
    (1003, "Charlie"),
    (1004, "Delta"),
    (1005, "Echo"),
];

type Reply = (StatusCode, String);

#[derive(Default)]
pub struct FakeState {
    requests: Mutex<Vec<String>>,
    server_errors: AtomicUsize,
    forced: Mutex<Option<Reply>>,
}

impl FakeState {
    /// Every request seen so far, as `path?query`.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    pub fn requests_to(&self, path: &str) -> usize {
        self.requests()
            .iter()
            .filter(|r| r.starts_with(path))
            .count()
    }

    /// Answer the next `count` requests with a 503.
    pub fn fail_next(&self, count: usize) {
        self.server_errors.store(count, Ordering::SeqCst);
    }

    /// Answer every following request with this status and body.
    pub fn force(&self, status: StatusCode, body: impl Into<String>) {
        *self.forced.lock().unwrap() = Some((status, body.into()));
    }

    fn intercept(&self, path: &str, query: &Option<String>) -> Option<Reply> {
        let query = query.clone().unwrap_or_default();
        self.requests.lock().unwrap().push(format!("{path}?{query}"));

        let pending = self
            .server_errors
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        if pending.is_ok() {
            return Some((StatusCode::SERVICE_UNAVAILABLE, "try again".to_owned()));
        }
        if let Some(reply) = self.forced.lock().unwrap().clone() {
            return Some(reply);
        }
        if params(&query).get("application_id").map(String::as_str) != Some(API_KEY) {
            return Some(error("INVALID_APPLICATION_ID"));
        }
        None
    }
}

pub struct FakeBackend {
    pub state: Arc<FakeState>,
    pub base_url: String,
}

impl FakeBackend {
    pub async fn start() -> Self {
        let state = Arc::new(FakeState::default());
        let app = Router::new()
            .route("/wot/globalmap/seasons/", get(seasons))
            .route("/wot/clans/list/", get(clans_list))
            .route("/wot/clans/info/", get(clans_info))
            .route("/wot/globalmap/seasonaccountinfo/", get(season_account_info))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            state,
            base_url: format!("http://{addr}/wot"),
        }
    }

    pub fn config(&self) -> ClientConfig {
        ClientConfig::default()
            .with_base_url(self.base_url.clone())
            .with_throttle(Duration::ZERO)
            .with_retry_delay(Duration::ZERO)
            .with_timeout(Duration::from_secs(5))
    }

    pub fn client(&self) -> WotClient {
        self.client_with(self.config())
    }

    /// A client that never goes through a system proxy for the local server.
    pub fn client_with(&self, config: ClientConfig) -> WotClient {
        let http = reqwest::Client::builder()
            .no_proxy()
            .timeout(config.timeout)
            .build()
            .unwrap();
        WotClient::with_client(http, config)
    }
}

/// Split a raw query string without decoding the values.
fn params(query: &str) -> HashMap<String, String> {
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .map(|(k, v)| (k.to_owned(), v.to_owned()))
        .collect()
}

fn ok(data: Value) -> Reply {
    let body = json!({"status": "ok", "meta": {"count": 1}, "data": data});
    (StatusCode::OK, body.to_string())
}

fn error(message: &str) -> Reply {
    let body = json!({
        "status": "error",
        "error": {"field": null, "message": message, "code": 407, "value": null}
    });
    (StatusCode::OK, body.to_string())
}

async fn seasons(State(state): State<Arc<FakeState>>, RawQuery(query): RawQuery) -> Reply {
    if let Some(reply) = state.intercept("/wot/globalmap/seasons/", &query) {
        return reply;
    }
    ok(json!([
        {"season_name": SEASON_NAME, "season_id": SEASON_ID},
        {"season_name": "Season 11: Renaissance", "season_id": "season_11"}
    ]))
}

async fn clans_list(State(state): State<Arc<FakeState>>, RawQuery(query): RawQuery) -> Reply {
    if let Some(reply) = state.intercept("/wot/clans/list/", &query) {
        return reply;
    }
    let search = params(&query.unwrap_or_default())
        .remove("search")
        .unwrap_or_default()
        .to_uppercase();
    let found: Vec<Value> = CLANS
        .iter()
        .filter(|(tag, _)| tag.contains(search.as_str()))
        .map(|(tag, id)| json!({"tag": tag, "clan_id": id}))
        .collect();
    ok(Value::Array(found))
}

async fn clans_info(State(state): State<Arc<FakeState>>, RawQuery(query): RawQuery) -> Reply {
    if let Some(reply) = state.intercept("/wot/clans/info/", &query) {
        return reply;
    }
    let clan_id = params(&query.unwrap_or_default())
        .remove("clan_id")
        .unwrap_or_default();
    let info = match clan_id.parse::<u64>() {
        Ok(CLAN_ID) => {
            let members: Vec<Value> = MEMBERS
                .iter()
                .map(|(id, name)| json!({"account_id": id, "account_name": name}))
                .collect();
            json!({"members": members})
        }
        Ok(EMPTY_CLAN_ID) => json!({"members": []}),
        _ => Value::Null,
    };
    ok(json!({ clan_id: info }))
}

async fn season_account_info(
    State(state): State<Arc<FakeState>>,
    RawQuery(query): RawQuery,
) -> Reply {
    if let Some(reply) = state.intercept("/wot/globalmap/seasonaccountinfo/", &query) {
        return reply;
    }
    let mut params = params(&query.unwrap_or_default());
    let season_id = params.remove("season_id").unwrap_or_default();
    if season_id != SEASON_ID {
        return error("INVALID_SEASON_ID");
    }
    let account_id = params.remove("account_id").unwrap_or_default();

    let tiers = |t10: Value, t8: Value| {
        json!({"seasons": {SEASON_ID: [
            {"battles": t10, "vehicle_level": 10},
            {"battles": t8, "vehicle_level": 8}
        ]}})
    };
    let account = match account_id.as_str() {
        "1001" => tiers(json!(10), json!(0)),
        // tier 8 listed first
        "1002" => json!({"seasons": {SEASON_ID: [
            {"battles": 5, "vehicle_level": 8},
            {"battles": 5, "vehicle_level": 10}
        ]}}),
        "1003" => tiers(Value::Null, Value::Null),
        "1004" => tiers(json!(20), json!(4)),
        _ => Value::Null,
    };
    ok(json!({ account_id: account }))
}
