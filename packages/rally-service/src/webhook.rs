use serde::Deserialize;
use time::OffsetDateTime;

use crate::{RallyService, Result};
use rally_domain::CallStatus;
use rally_storage::StatusUpdate;

/// Form body of a provider status callback. Unrelated provider fields are ignored.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct CallStatusEvent {
	#[serde(default, alias = "CallSid")]
	pub call_id: Option<String>,
	#[serde(default, alias = "CallStatus")]
	pub status: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookOutcome {
	/// Missing fields, an unrecognized status, or an unknown provider call id.
	Ignored,
	Applied,
	Unchanged,
	Rejected,
}

impl RallyService {
	/// Applies one status notification. Only storage failures are errors, so the provider
	/// redelivers exactly when nothing could be recorded.
	pub async fn handle_call_status(&self, event: CallStatusEvent) -> Result<WebhookOutcome> {
		let provider_call_id = event.call_id.as_deref().map(str::trim).unwrap_or_default();
		let raw_status = event.status.as_deref().map(str::trim).unwrap_or_default();

		if provider_call_id.is_empty() || raw_status.is_empty() {
			tracing::debug!("Status callback without call id or status. Ignoring.");

			return Ok(WebhookOutcome::Ignored);
		}

		let Ok(status) = raw_status.parse::<CallStatus>() else {
			tracing::warn!(provider_call_id, status = raw_status, "Unrecognized call status. Ignoring.");

			return Ok(WebhookOutcome::Ignored);
		};
		let update = self
			.store
			.apply_provider_status(provider_call_id, status, OffsetDateTime::now_utc())
			.await?;
		let outcome = match update {
			StatusUpdate::UnknownCall => {
				tracing::debug!(provider_call_id, "Status callback for an unknown call. Ignoring.");

				WebhookOutcome::Ignored
			},
			StatusUpdate::Applied { call_id, previous } => {
				tracing::info!(%call_id, provider_call_id, %previous, %status, "Call status updated.");

				WebhookOutcome::Applied
			},
			StatusUpdate::Unchanged { call_id } => {
				tracing::debug!(%call_id, %status, "Duplicate status callback.");

				WebhookOutcome::Unchanged
			},
			StatusUpdate::Rejected { call_id, current } => {
				tracing::info!(
					%call_id,
					%current,
					reported = %status,
					"Call already resolved. Keeping terminal status."
				);

				WebhookOutcome::Rejected
			},
		};

		Ok(outcome)
	}
}
