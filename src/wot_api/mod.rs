pub(crate) mod battles;
pub(crate) mod clans;
pub(crate) mod seasons;

use itertools::Itertools;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::error::{Result, WotError};

/// Query parameter carrying the API key.
pub(crate) const APPLICATION_ID: &str = "application_id";

/// Separator between entries of the `fields` parameter, already percent-encoded.
pub(crate) const FIELD_SEPARATOR: &str = "%2C+";

const INVALID_APPLICATION_ID: &str = "INVALID_APPLICATION_ID";

/// Shared HTTP client plus the settings every request is made with.
#[derive(Debug, Clone)]
pub(crate) struct Transport {
    pub(crate) http: reqwest::Client,
    pub(crate) config: ClientConfig,
}

/// Body of a successful request.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Payload {
    /// `data` member of an `ok` envelope.
    Data(Value),
    /// Body that was not a JSON envelope, passed through verbatim.
    Opaque(String),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
enum Status {
    Ok,
    Error,
}

#[derive(Debug, Deserialize)]
struct Envelope {
    status: Status,
    #[serde(default)]
    data: Value,
    error: Option<ErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
    code: Option<u16>,
    field: Option<String>,
}

/// Build the request URL: `{base}/{endpoint}/?k=v&...&fields=a%2C+b`.
pub(crate) fn build_url(
    base_url: &str,
    endpoint: &str,
    params: &[(&str, String)],
    fields: &[&str],
) -> String {
    let mut url = format!(
        "{}/{}/",
        base_url.trim_end_matches('/'),
        endpoint.trim_matches('/')
    );
    let mut pairs = params.iter().map(|(k, v)| format!("{k}={v}")).collect_vec();
    if !fields.is_empty() {
        pairs.push(format!("fields={}", fields.join(FIELD_SEPARATOR)));
    }
    if !pairs.is_empty() {
        url.push('?');
        url.push_str(&pairs.join("&"));
    }
    url
}

/// Issue a GET against `endpoint`, retrying transient failures, and unwrap the envelope.
pub(crate) async fn get_request(
    transport: &Transport,
    endpoint: &str,
    params: &[(&str, String)],
    fields: &[&str],
) -> Result<Payload> {
    let url = build_url(&transport.config.base_url, endpoint, params, fields);
    let (status, body) = send_with_retry(transport, endpoint, &url).await?;
    decode_payload(endpoint, status, body)
}

async fn send_with_retry(
    transport: &Transport,
    endpoint: &str,
    url: &str,
) -> Result<(StatusCode, String)> {
    let max_attempts = transport.config.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        debug!(endpoint, attempt, "sending request");
        match send_once(&transport.http, endpoint, url).await {
            Ok(response) => return Ok(response),
            Err(err) if attempt < max_attempts && err.is_transient() => {
                warn!(endpoint, attempt, error = %err, "transient failure, retrying");
                if !transport.config.retry_delay.is_zero() {
                    tokio::time::sleep(transport.config.retry_delay).await;
                }
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

async fn send_once(
    client: &reqwest::Client,
    endpoint: &str,
    url: &str,
) -> Result<(StatusCode, String)> {
    // The url carries the api key, keep it out of error messages.
    let response = client.get(url).send().await.map_err(|e| WotError::Http {
        endpoint: endpoint.to_owned(),
        source: e.without_url(),
    })?;

    let status = response.status();
    if status.is_server_error() {
        return Err(WotError::UnexpectedStatus {
            endpoint: endpoint.to_owned(),
            status,
        });
    }

    let body = response.text().await.map_err(|e| WotError::ResponseBody {
        endpoint: endpoint.to_owned(),
        source: e.without_url(),
    })?;

    Ok((status, body))
}

/// Turn a response body into a [`Payload`] or a typed error.
pub(crate) fn decode_payload(endpoint: &str, status: StatusCode, body: String) -> Result<Payload> {
    let envelope = match serde_json::from_str::<Envelope>(&body) {
        Ok(envelope) => envelope,
        Err(err) if status.is_success() => {
            debug!(endpoint, error = %err, "response is not an api envelope, passing body through");
            return Ok(Payload::Opaque(body));
        }
        Err(_) => {
            return Err(WotError::UnexpectedStatus {
                endpoint: endpoint.to_owned(),
                status,
            })
        }
    };

    match envelope.status {
        Status::Error => {
            let Some(error) = envelope.error else {
                return Err(WotError::Api {
                    endpoint: endpoint.to_owned(),
                    message: "error status without error details".to_owned(),
                });
            };
            if error.message == INVALID_APPLICATION_ID {
                return Err(WotError::InvalidCredentials {
                    message: error.message,
                });
            }
            debug!(endpoint, code = ?error.code, field = ?error.field, "api reported an error");
            Err(WotError::Api {
                endpoint: endpoint.to_owned(),
                message: error.message,
            })
        }
        Status::Ok if status.is_success() => Ok(Payload::Data(envelope.data)),
        Status::Ok => Err(WotError::UnexpectedStatus {
            endpoint: endpoint.to_owned(),
            status,
        }),
    }
}

/// Deserialize the `data` member of a payload into `T`.
pub(crate) fn decode_data<T: DeserializeOwned>(endpoint: &str, payload: Payload) -> Result<T> {
    match payload {
        Payload::Data(value) => serde_json::from_value(value).map_err(|e| WotError::Malformed {
            endpoint: endpoint.to_owned(),
            context: e.to_string(),
        }),
        Payload::Opaque(body) => Err(WotError::Malformed {
            endpoint: endpoint.to_owned(),
            context: format!("expected a json envelope, got {} bytes of text", body.len()),
        }),
    }
}
