//! Complete-response fallback: one request/response exchange used when
//! streaming cannot be established or sustained.

use serde_json::Value;

use chatflow_core::ChatRequest;

use crate::error::{ClientError, Result};

/// Transport envelopes from intermediary infrastructure are unwrapped
/// at most this many times. Not a retry loop.
const MAX_ENVELOPE_UNWRAPS: usize = 2;

/// At most one automatic retry, for network-class failures only.
const MAX_RETRIES: u32 = 1;

/// Issue the fallback request and extract the complete response text.
pub(crate) async fn request_fallback(
    http: &reqwest::Client,
    url: &str,
    request: &ChatRequest,
) -> Result<String> {
    let mut last_error = None;

    for attempt in 0..=MAX_RETRIES {
        match try_fallback(http, url, request).await {
            Ok(content) => return Ok(content),
            Err(e) if e.is_network() && attempt < MAX_RETRIES => {
                tracing::warn!(attempt = attempt + 1, error = %e, "Retrying fallback request");
                last_error = Some(e);
            }
            Err(e) => return Err(e),
        }
    }

    Err(last_error.unwrap_or_else(|| ClientError::Fallback("fallback request failed".to_string())))
}

async fn try_fallback(http: &reqwest::Client, url: &str, request: &ChatRequest) -> Result<String> {
    let response = http.post(url).json(request).send().await?;

    let status = response.status();
    if !status.is_success() {
        return Err(ClientError::Fallback(format!(
            "fallback endpoint returned {}",
            status
        )));
    }

    let value: Value = response.json().await?;
    let value = unwrap_envelopes(value)?;
    extract_content(&value).ok_or_else(|| {
        ClientError::Fallback("fallback response carries no content field".to_string())
    })
}

/// Unwrap up to two `{ "body": "<json string>" }` transport envelopes.
/// A body still wrapped after that is an error, never a longer loop.
fn unwrap_envelopes(mut value: Value) -> Result<Value> {
    for _ in 0..MAX_ENVELOPE_UNWRAPS {
        match value.get("body").and_then(Value::as_str) {
            Some(inner) => value = serde_json::from_str(inner)?,
            None => return Ok(value),
        }
    }

    if value.get("body").and_then(Value::as_str).is_some() {
        return Err(ClientError::Fallback(
            "fallback response still enveloped after two unwraps".to_string(),
        ));
    }
    Ok(value)
}

/// The response text may live under any of these keys depending on the
/// serving infrastructure.
fn extract_content(value: &Value) -> Option<String> {
    ["content", "message", "response"]
        .iter()
        .find_map(|key| value.get(key).and_then(Value::as_str))
        .map(String::from)
}
