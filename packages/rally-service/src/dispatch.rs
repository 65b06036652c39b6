use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{Error, PlacementTask, RallyService, Result};
use rally_storage::models::CallRecord;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DispatchRequest {
	pub tenant_id: String,
	pub campaign_id: Uuid,
	pub message_id: Uuid,
}

/// Returned as soon as every record is queued. Placement outcomes are read back through
/// progress and the call log.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DispatchHandle {
	pub dispatch_id: Uuid,
	pub campaign_id: Uuid,
	pub message_id: Uuid,
	pub queued: usize,
	pub call_ids: Vec<Uuid>,
}

impl RallyService {
	pub async fn dispatch(&self, req: DispatchRequest) -> Result<DispatchHandle> {
		let tenant_id = crate::require_tenant(&req.tenant_id)?;
		let campaign = self
			.store
			.campaign(tenant_id, req.campaign_id)
			.await?
			.ok_or_else(|| Error::NotFound { message: "Campaign not found.".to_string() })?;
		let message = self
			.store
			.message(tenant_id, req.message_id)
			.await?
			.ok_or_else(|| Error::NotFound { message: "Message not found.".to_string() })?;
		let recipients = self
			.store
			.roster(campaign.campaign_id)
			.await?
			.into_iter()
			.filter(|recipient| recipient.active)
			.collect::<Vec<_>>();

		if let Some(foreign) = recipients.iter().find(|recipient| recipient.tenant_id != tenant_id) {
			tracing::warn!(
				campaign_id = %campaign.campaign_id,
				recipient_id = %foreign.recipient_id,
				"Roster references a recipient owned by another tenant."
			);

			return Err(Error::TenantMismatch {
				message: "Campaign roster contains a recipient from another tenant.".to_string(),
			});
		}

		let dispatch_id = Uuid::new_v4();
		let mut call_ids = Vec::with_capacity(recipients.len());

		for recipient in recipients {
			let record = CallRecord::queued(
				tenant_id,
				campaign.campaign_id,
				message.message_id,
				recipient.recipient_id,
				dispatch_id,
				OffsetDateTime::now_utc(),
			);

			self.store.insert_call(&record).await?;

			let task = PlacementTask {
				call_id: record.call_id,
				to: recipient.phone,
				message_id: message.message_id,
			};
			let placer = self.placer.clone();

			if !self.pool.submit(async move { placer.place(task).await }) {
				tracing::error!(
					call_id = %record.call_id,
					"Placement pool is closed. Call stays queued."
				);
			}

			call_ids.push(record.call_id);
		}

		tracing::info!(
			%dispatch_id,
			campaign_id = %campaign.campaign_id,
			queued = call_ids.len(),
			"Dispatch queued."
		);

		Ok(DispatchHandle {
			dispatch_id,
			campaign_id: campaign.campaign_id,
			message_id: message.message_id,
			queued: call_ids.len(),
			call_ids,
		})
	}
}
