use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{RallyService, Result};
use rally_domain::CallStatus;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CallLogRequest {
	pub tenant_id: String,
	pub campaign_id: Option<Uuid>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CallLogResponse {
	pub items: Vec<CallLogItem>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CallLogItem {
	pub call_id: Uuid,
	pub campaign_id: Uuid,
	pub recipient_id: Uuid,
	pub recipient: String,
	pub phone: String,
	pub provider_call_id: Option<String>,
	pub status: CallStatus,
	#[serde(with = "time::serde::rfc3339")]
	pub initiated_at: OffsetDateTime,
	#[serde(with = "time::serde::rfc3339")]
	pub updated_at: OffsetDateTime,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RosterRequest {
	pub tenant_id: String,
	pub campaign_id: Option<Uuid>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterEntry {
	pub name: String,
	pub phone: String,
}

impl RallyService {
	/// The tenant's calls, newest first.
	pub async fn list_calls(&self, req: CallLogRequest) -> Result<CallLogResponse> {
		let tenant_id = crate::require_tenant(&req.tenant_id)?;
		let mut rows = self.store.list_calls(tenant_id, req.campaign_id).await?;

		rows.sort_by(|a, b| {
			b.initiated_at.cmp(&a.initiated_at).then_with(|| a.recipient_name.cmp(&b.recipient_name))
		});

		let items = rows
			.into_iter()
			.map(|row| CallLogItem {
				call_id: row.call_id,
				campaign_id: row.campaign_id,
				recipient_id: row.recipient_id,
				recipient: row.recipient_name,
				phone: row.phone,
				provider_call_id: row.provider_call_id,
				status: row.status,
				initiated_at: row.initiated_at,
				updated_at: row.updated_at,
			})
			.collect();

		Ok(CallLogResponse { items })
	}

	/// Who a dispatch of this campaign would call right now.
	pub async fn campaign_recipients(&self, req: RosterRequest) -> Result<Vec<RosterEntry>> {
		let tenant_id = crate::require_tenant(&req.tenant_id)?;
		let campaign_id = crate::require_campaign(req.campaign_id)?;

		if self.store.campaign(tenant_id, campaign_id).await?.is_none() {
			return Ok(Vec::new());
		}

		let entries = self
			.store
			.roster(campaign_id)
			.await?
			.into_iter()
			.filter(|recipient| recipient.active && recipient.tenant_id == tenant_id)
			.map(|recipient| RosterEntry { name: recipient.name, phone: recipient.phone })
			.collect();

		Ok(entries)
	}
}
