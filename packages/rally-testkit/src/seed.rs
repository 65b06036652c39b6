use time::OffsetDateTime;
use uuid::Uuid;

use crate::Result;
use rally_storage::{
	CallStore,
	db::Db,
	models::{CallRecord, Campaign, Message, Recipient},
	queries,
};

/// Ids of a campaign written by [`seed_campaign`]. `recipients` follows roster order.
#[derive(Debug, Clone)]
pub struct SeededCampaign {
	pub tenant_id: String,
	pub campaign_id: Uuid,
	pub message_id: Uuid,
	pub recipients: Vec<Uuid>,
}

/// Writes a campaign, one message and an active roster entry per name. Numbers are
/// `+1555010NNNN` in roster order.
pub async fn seed_campaign(db: &Db, tenant_id: &str, names: &[&str]) -> Result<SeededCampaign> {
	let now = OffsetDateTime::now_utc();
	let campaign = Campaign {
		campaign_id: Uuid::new_v4(),
		tenant_id: tenant_id.to_string(),
		title: "Rehearsal".to_string(),
		created_at: now,
	};
	let message = Message {
		message_id: Uuid::new_v4(),
		tenant_id: tenant_id.to_string(),
		name: "Reminder".to_string(),
		audio_url: "https://cdn.example.com/reminder.mp3".to_string(),
		created_at: now,
	};

	queries::insert_campaign(db, &campaign).await?;
	queries::insert_message(db, &message).await?;

	let mut recipients = Vec::with_capacity(names.len());

	for (idx, name) in names.iter().enumerate() {
		let recipient = Recipient {
			recipient_id: Uuid::new_v4(),
			tenant_id: tenant_id.to_string(),
			name: name.to_string(),
			phone: format!("+1555010{idx:04}"),
			active: true,
			created_at: now,
		};

		queries::insert_recipient(db, &recipient).await?;
		queries::add_to_roster(db, campaign.campaign_id, recipient.recipient_id, idx as i32)
			.await?;
		recipients.push(recipient.recipient_id);
	}

	Ok(SeededCampaign {
		tenant_id: tenant_id.to_string(),
		campaign_id: campaign.campaign_id,
		message_id: message.message_id,
		recipients,
	})
}

/// Inserts a `queued` record for `recipient_id` under a fresh dispatch id.
pub async fn insert_queued(
	db: &Db,
	seeded: &SeededCampaign,
	recipient_id: Uuid,
) -> Result<CallRecord> {
	let record = CallRecord::queued(
		&seeded.tenant_id,
		seeded.campaign_id,
		seeded.message_id,
		recipient_id,
		Uuid::new_v4(),
		OffsetDateTime::now_utc(),
	);

	db.insert_call(&record).await?;

	Ok(record)
}
