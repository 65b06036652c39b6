// std
use std::time::Duration as StdDuration;

// crates.io
use reqwest::{Client, StatusCode};
use serde_json::Value;

use crate::{Error, Result};

/// Lifecycle events the provider is asked to report back to the status callback.
pub const STATUS_EVENTS: [&str; 4] = ["initiated", "ringing", "answered", "completed"];

#[derive(Debug, Clone)]
pub struct CallRequest<'a> {
	pub to: &'a str,
	pub from: &'a str,
	/// Document the provider fetches once the callee picks up.
	pub playback_url: &'a str,
	pub status_callback_url: &'a str,
	pub status_events: &'a [&'a str],
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacedCall {
	pub provider_call_id: String,
}

pub async fn create_call(
	cfg: &rally_config::Telephony,
	req: &CallRequest<'_>,
) -> Result<PlacedCall> {
	let client = Client::builder().timeout(StdDuration::from_millis(cfg.timeout_ms)).build()?;
	let url = calls_url(cfg)?;

	tracing::debug!(provider_id = %cfg.provider_id, to = req.to, "Creating outbound call.");

	let res = client
		.post(url)
		.basic_auth(&cfg.account_sid, Some(&cfg.auth_token))
		.form(&call_form(req))
		.send()
		.await?;
	let status = res.status();

	if !status.is_success() {
		let body = res.text().await.unwrap_or_default();

		return Err(rejection(status, &body));
	}

	let json: Value = res.json().await?;

	parse_create_response(json)
}

fn calls_url(cfg: &rally_config::Telephony) -> Result<String> {
	let sid = cfg.account_sid.trim();

	if sid.is_empty() || !sid.chars().all(|ch| ch.is_ascii_alphanumeric()) {
		return Err(Error::InvalidConfig {
			message: "telephony.account_sid must be a non-empty alphanumeric identifier."
				.to_string(),
		});
	}

	Ok(format!("{}/2010-04-01/Accounts/{sid}/Calls.json", cfg.api_base.trim_end_matches('/')))
}

fn call_form(req: &CallRequest<'_>) -> Vec<(&'static str, String)> {
	let mut form = vec![
		("To", req.to.to_string()),
		("From", req.from.to_string()),
		("Url", req.playback_url.to_string()),
		("Method", "POST".to_string()),
		("StatusCallback", req.status_callback_url.to_string()),
		("StatusCallbackMethod", "POST".to_string()),
	];

	for event in req.status_events {
		form.push(("StatusCallbackEvent", (*event).to_string()));
	}

	form
}

fn parse_create_response(json: Value) -> Result<PlacedCall> {
	let sid = json
		.get("sid")
		.and_then(Value::as_str)
		.map(str::trim)
		.filter(|sid| !sid.is_empty())
		.ok_or_else(|| Error::InvalidResponse {
			message: "Call creation response is missing sid.".to_string(),
		})?;

	Ok(PlacedCall { provider_call_id: sid.to_string() })
}

fn rejection(status: StatusCode, body: &str) -> Error {
	let message = serde_json::from_str::<Value>(body)
		.ok()
		.and_then(|json| json.get("message").and_then(Value::as_str).map(str::to_string))
		.unwrap_or_else(|| body.trim().chars().take(256).collect());

	Error::Rejected { status: status.as_u16(), message }
}
