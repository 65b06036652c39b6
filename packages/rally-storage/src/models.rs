use time::OffsetDateTime;
use uuid::Uuid;

use rally_domain::CallStatus;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Campaign {
	pub campaign_id: Uuid,
	pub tenant_id: String,
	pub title: String,
	pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Message {
	pub message_id: Uuid,
	pub tenant_id: String,
	pub name: String,
	pub audio_url: String,
	pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Recipient {
	pub recipient_id: Uuid,
	pub tenant_id: String,
	pub name: String,
	pub phone: String,
	pub active: bool,
	pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CallRecord {
	pub call_id: Uuid,
	pub tenant_id: String,
	pub campaign_id: Uuid,
	pub message_id: Uuid,
	pub recipient_id: Uuid,
	pub dispatch_id: Uuid,
	pub provider_call_id: Option<String>,
	#[sqlx(try_from = "String")]
	pub status: CallStatus,
	pub initiated_at: OffsetDateTime,
	pub updated_at: OffsetDateTime,
}
impl CallRecord {
	/// A fresh record as the dispatcher writes it, before any placement attempt.
	pub fn queued(
		tenant_id: &str,
		campaign_id: Uuid,
		message_id: Uuid,
		recipient_id: Uuid,
		dispatch_id: Uuid,
		now: OffsetDateTime,
	) -> Self {
		Self {
			call_id: Uuid::new_v4(),
			tenant_id: tenant_id.to_string(),
			campaign_id,
			message_id,
			recipient_id,
			dispatch_id,
			provider_call_id: None,
			status: CallStatus::Queued,
			initiated_at: now,
			updated_at: now,
		}
	}
}

/// A call record joined with the recipient it targets.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CallRow {
	pub call_id: Uuid,
	pub campaign_id: Uuid,
	pub recipient_id: Uuid,
	pub recipient_name: String,
	pub phone: String,
	pub provider_call_id: Option<String>,
	#[sqlx(try_from = "String")]
	pub status: CallStatus,
	pub initiated_at: OffsetDateTime,
	pub updated_at: OffsetDateTime,
}
