use std::time::Instant;

use chrono::Utc;
use lazy_static::lazy_static;
use tracing::{debug, info};

use crate::config::EndpointConfig;
use crate::errors::ProbeError;
use crate::probe::model::ProbeResult;

const REST_PATH: &str = "/rest/v1/";
const API_KEY_HEADER: &str = "apikey";

lazy_static! {
    static ref SHARED_CLIENT: reqwest::Client = reqwest::Client::new();
}

pub fn shared_client() -> &'static reqwest::Client {
    &SHARED_CLIENT
}

pub fn rest_url(base_url: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), REST_PATH)
}

/// Issues exactly one GET against the endpoint's REST root, carrying the API
/// key both as the `apikey` header and as a bearer token. Suspends twice:
/// once for the response, once for the body. No retries, no timeout beyond
/// the client default.
pub async fn run_probe(endpoint: &EndpointConfig) -> Result<ProbeResult, ProbeError> {
    let url = rest_url(&endpoint.base_url);
    debug!("Probing {}", url);

    let probed_at = Utc::now();
    let started = Instant::now();

    let response = shared_client()
        .get(&url)
        .header(API_KEY_HEADER, &endpoint.api_key)
        .bearer_auth(&endpoint.api_key)
        .send()
        .await?;

    let status = response.status();
    let body = response.text().await?;

    let result = ProbeResult {
        url,
        status_code: status.as_u16(),
        ok: status.is_success(),
        body_bytes: body.len(),
        duration_ms: started.elapsed().as_millis() as u64,
        probed_at,
    };

    info!(
        "Probe finished: status={} ok={} body_bytes={} duration_ms={}",
        result.status_code, result.ok, result.body_bytes, result.duration_ms
    );

    Ok(result)
}
