use crate::config::{Config, EndpointConfig};
use crate::errors::ProbeError;
use crate::probe::http_probe::rest_url;
use crate::probe::model::ProbeResult;

const KEY_PREFIX_LEN: usize = 20;
const ELLIPSIS: &str = "...";

/// Shows the first 20 characters of the key and masks the rest. Keys that
/// fit in the prefix are shown whole.
pub fn truncate_key(key: &str) -> String {
    if key.chars().count() <= KEY_PREFIX_LEN {
        return key.to_owned();
    }
    let prefix: String = key.chars().take(KEY_PREFIX_LEN).collect();
    format!("{}{}", prefix, ELLIPSIS)
}

pub fn print_header(endpoint: &EndpointConfig) {
    println!("Probing {}", rest_url(&endpoint.base_url));
    println!("Key: {}", truncate_key(&endpoint.api_key));
}

pub fn print_result(result: &ProbeResult) {
    println!("Status: {} (ok: {})", result.status_code, result.ok);
    println!("Response length: {} bytes", result.body_bytes);
    println!("Duration: {} ms", result.duration_ms);
}

pub fn print_failure(err: &ProbeError) {
    println!("Connection failed: {}", err);
}

/// Secondary output channel for the probe result. Implementations are
/// constructed once at startup; a run without any extra emitter is a normal
/// state, not a missing one.
pub trait ResultEmitter {
    fn emit(&self, result: &ProbeResult);
}

pub struct JsonEmitter;

impl ResultEmitter for JsonEmitter {
    fn emit(&self, result: &ProbeResult) {
        match serde_json::to_string_pretty(result) {
            Ok(json) => println!("{}", json),
            Err(e) => tracing::warn!("Failed to serialize probe result: {}", e),
        }
    }
}

/// Resolves the `output.json_summary` flag into an optional emitter.
pub fn extra_emitter(config: &Config) -> Option<Box<dyn ResultEmitter>> {
    if config.output.json_summary {
        Some(Box::new(JsonEmitter))
    } else {
        None
    }
}
