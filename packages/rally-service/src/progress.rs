use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{RallyService, Result};
use rally_domain::{CallStatus, ProgressCounts};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProgressRequest {
	pub tenant_id: String,
	pub campaign_id: Option<Uuid>,
}

#[derive(Clone, Debug, Serialize)]
pub struct ProgressResponse {
	#[serde(flatten)]
	pub counts: ProgressCounts,
	pub rows: Vec<ProgressRow>,
}

#[derive(Clone, Debug, Serialize)]
pub struct ProgressRow {
	pub recipient: String,
	pub phone: String,
	pub status: CallStatus,
}

impl RallyService {
	/// Live snapshot of one campaign, read straight from the store on every call.
	pub async fn progress(&self, req: ProgressRequest) -> Result<ProgressResponse> {
		let tenant_id = crate::require_tenant(&req.tenant_id)?;
		let campaign_id = crate::require_campaign(req.campaign_id)?;
		let calls = self.store.list_calls(tenant_id, Some(campaign_id)).await?;
		let counts = ProgressCounts::tally(calls.iter().map(|call| call.status));
		let rows = calls
			.into_iter()
			.map(|call| ProgressRow {
				recipient: call.recipient_name,
				phone: call.phone,
				status: call.status,
			})
			.collect();

		Ok(ProgressResponse { counts, rows })
	}
}
