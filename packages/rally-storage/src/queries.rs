//! Lookup entities the dispatcher resolves. Their lifecycle belongs to the surrounding
//! application; the inserts here exist for seeding and tests.

use uuid::Uuid;

use crate::{
	Result,
	db::Db,
	models::{Campaign, Message, Recipient},
};

pub async fn insert_campaign(db: &Db, campaign: &Campaign) -> Result<()> {
	sqlx::query(
		"\
INSERT INTO campaigns (campaign_id, tenant_id, title, created_at)
VALUES ($1, $2, $3, $4)",
	)
	.bind(campaign.campaign_id)
	.bind(campaign.tenant_id.as_str())
	.bind(campaign.title.as_str())
	.bind(campaign.created_at)
	.execute(&db.pool)
	.await?;

	Ok(())
}

pub async fn insert_message(db: &Db, message: &Message) -> Result<()> {
	sqlx::query(
		"\
INSERT INTO messages (message_id, tenant_id, name, audio_url, created_at)
VALUES ($1, $2, $3, $4, $5)",
	)
	.bind(message.message_id)
	.bind(message.tenant_id.as_str())
	.bind(message.name.as_str())
	.bind(message.audio_url.as_str())
	.bind(message.created_at)
	.execute(&db.pool)
	.await?;

	Ok(())
}

pub async fn insert_recipient(db: &Db, recipient: &Recipient) -> Result<()> {
	sqlx::query(
		"\
INSERT INTO recipients (recipient_id, tenant_id, name, phone, active, created_at)
VALUES ($1, $2, $3, $4, $5, $6)",
	)
	.bind(recipient.recipient_id)
	.bind(recipient.tenant_id.as_str())
	.bind(recipient.name.as_str())
	.bind(recipient.phone.as_str())
	.bind(recipient.active)
	.bind(recipient.created_at)
	.execute(&db.pool)
	.await?;

	Ok(())
}

pub async fn add_to_roster(
	db: &Db,
	campaign_id: Uuid,
	recipient_id: Uuid,
	position: i32,
) -> Result<()> {
	sqlx::query(
		"\
INSERT INTO campaign_recipients (campaign_id, recipient_id, position)
VALUES ($1, $2, $3)
ON CONFLICT (campaign_id, recipient_id) DO UPDATE SET position = EXCLUDED.position",
	)
	.bind(campaign_id)
	.bind(recipient_id)
	.bind(position)
	.execute(&db.pool)
	.await?;

	Ok(())
}

pub async fn fetch_campaign(db: &Db, tenant_id: &str, campaign_id: Uuid) -> Result<Option<Campaign>> {
	let campaign = sqlx::query_as::<_, Campaign>(
		"\
SELECT campaign_id, tenant_id, title, created_at
FROM campaigns
WHERE campaign_id = $1 AND tenant_id = $2",
	)
	.bind(campaign_id)
	.bind(tenant_id)
	.fetch_optional(&db.pool)
	.await?;

	Ok(campaign)
}

pub async fn fetch_message(
	db: &Db,
	tenant_id: Option<&str>,
	message_id: Uuid,
) -> Result<Option<Message>> {
	let message = sqlx::query_as::<_, Message>(
		"\
SELECT message_id, tenant_id, name, audio_url, created_at
FROM messages
WHERE message_id = $1 AND ($2::text IS NULL OR tenant_id = $2)",
	)
	.bind(message_id)
	.bind(tenant_id)
	.fetch_optional(&db.pool)
	.await?;

	Ok(message)
}

/// Every recipient linked to the campaign, active or not, in roster order.
pub async fn fetch_roster(db: &Db, campaign_id: Uuid) -> Result<Vec<Recipient>> {
	let recipients = sqlx::query_as::<_, Recipient>(
		"\
SELECT r.recipient_id, r.tenant_id, r.name, r.phone, r.active, r.created_at
FROM campaign_recipients cr
JOIN recipients r ON r.recipient_id = cr.recipient_id
WHERE cr.campaign_id = $1
ORDER BY cr.position ASC, r.name ASC, r.recipient_id ASC",
	)
	.bind(campaign_id)
	.fetch_all(&db.pool)
	.await?;

	Ok(recipients)
}
