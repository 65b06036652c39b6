use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{RallyService, Result};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CancelRequest {
	pub tenant_id: String,
	pub campaign_id: Option<Uuid>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CancelResponse {
	pub canceled: u64,
}

impl RallyService {
	/// Moves every `queued` or `initiated` call of the campaign to `canceled` in one statement.
	///
	/// Calls the provider already connected keep running. A worker that passed its status check
	/// before this ran may still place its call; its result is recorded without leaving
	/// `canceled`.
	pub async fn cancel(&self, req: CancelRequest) -> Result<CancelResponse> {
		let tenant_id = crate::require_tenant(&req.tenant_id)?;
		let campaign_id = crate::require_campaign(req.campaign_id)?;
		let canceled =
			self.store.cancel_pending(tenant_id, campaign_id, OffsetDateTime::now_utc()).await?;

		tracing::info!(%campaign_id, canceled, "Pending calls canceled.");

		Ok(CancelResponse { canceled })
	}
}
