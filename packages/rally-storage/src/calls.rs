use time::OffsetDateTime;
use uuid::Uuid;

use rally_domain::{CallStatus, Transition};

use crate::{
	Result,
	db::Db,
	models::{CallRecord, CallRow},
	store::{Placement, StatusUpdate},
};

pub async fn insert_call(db: &Db, record: &CallRecord) -> Result<()> {
	sqlx::query(
		"\
INSERT INTO call_records (
	call_id,
	tenant_id,
	campaign_id,
	message_id,
	recipient_id,
	dispatch_id,
	provider_call_id,
	status,
	initiated_at,
	updated_at
)
VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
	)
	.bind(record.call_id)
	.bind(record.tenant_id.as_str())
	.bind(record.campaign_id)
	.bind(record.message_id)
	.bind(record.recipient_id)
	.bind(record.dispatch_id)
	.bind(record.provider_call_id.as_deref())
	.bind(record.status.as_str())
	.bind(record.initiated_at)
	.bind(record.updated_at)
	.execute(&db.pool)
	.await?;

	Ok(())
}

pub async fn fetch_call(db: &Db, call_id: Uuid) -> Result<Option<CallRecord>> {
	let record = sqlx::query_as::<_, CallRecord>(
		"\
SELECT
	call_id,
	tenant_id,
	campaign_id,
	message_id,
	recipient_id,
	dispatch_id,
	provider_call_id,
	status,
	initiated_at,
	updated_at
FROM call_records
WHERE call_id = $1",
	)
	.bind(call_id)
	.fetch_optional(&db.pool)
	.await?;

	Ok(record)
}

pub async fn fetch_status(db: &Db, call_id: Uuid) -> Result<Option<CallStatus>> {
	let raw: Option<String> =
		sqlx::query_scalar("SELECT status FROM call_records WHERE call_id = $1")
			.bind(call_id)
			.fetch_optional(&db.pool)
			.await?;

	raw.map(parse_status).transpose()
}

/// Writes a worker's placement result. The row lock is taken only after the provider answered,
/// so no lock is held across the network call.
pub async fn record_placement(
	db: &Db,
	call_id: Uuid,
	placement: &Placement,
	now: OffsetDateTime,
) -> Result<Option<CallStatus>> {
	let mut tx = db.pool.begin().await?;
	let current: Option<String> =
		sqlx::query_scalar("SELECT status FROM call_records WHERE call_id = $1 FOR UPDATE")
			.bind(call_id)
			.fetch_optional(&mut *tx)
			.await?;
	let Some(current) = current.map(parse_status).transpose()? else {
		tx.commit().await?;

		return Ok(None);
	};
	let id_taken = match placement.provider_call_id() {
		Some(provider_call_id) => sqlx::query_scalar::<_, bool>(
			"\
SELECT EXISTS (
	SELECT 1
	FROM call_records
	WHERE provider_call_id = $1 AND call_id <> $2
)",
		)
		.bind(provider_call_id)
		.bind(call_id)
		.fetch_one(&mut *tx)
		.await?,
		None => false,
	};

	if id_taken {
		tracing::warn!(
			%call_id,
			provider_call_id = placement.provider_call_id(),
			"Provider call id already belongs to another record."
		);
	}

	let (provider_call_id, next) = placement.settle(current, id_taken);

	sqlx::query(
		"\
UPDATE call_records
SET
	provider_call_id = COALESCE($1, provider_call_id),
	status = $2,
	updated_at = $3
WHERE call_id = $4",
	)
	.bind(provider_call_id)
	.bind(next.as_str())
	.bind(now)
	.bind(call_id)
	.execute(&mut *tx)
	.await?;

	tx.commit().await?;

	Ok(Some(next))
}

pub async fn apply_provider_status(
	db: &Db,
	provider_call_id: &str,
	status: CallStatus,
	now: OffsetDateTime,
) -> Result<StatusUpdate> {
	let mut tx = db.pool.begin().await?;
	let row: Option<(Uuid, String)> = sqlx::query_as(
		"\
SELECT call_id, status
FROM call_records
WHERE provider_call_id = $1
FOR UPDATE",
	)
	.bind(provider_call_id)
	.fetch_optional(&mut *tx)
	.await?;
	let Some((call_id, current)) = row else {
		tx.commit().await?;

		return Ok(StatusUpdate::UnknownCall);
	};
	let current = parse_status(current)?;
	let update = match current.transition_to(status) {
		Transition::Apply => {
			sqlx::query("UPDATE call_records SET status = $1, updated_at = $2 WHERE call_id = $3")
				.bind(status.as_str())
				.bind(now)
				.bind(call_id)
				.execute(&mut *tx)
				.await?;

			StatusUpdate::Applied { call_id, previous: current }
		},
		Transition::Unchanged => StatusUpdate::Unchanged { call_id },
		Transition::Rejected => StatusUpdate::Rejected { call_id, current },
	};

	tx.commit().await?;

	Ok(update)
}

pub async fn list_calls(
	db: &Db,
	tenant_id: &str,
	campaign_id: Option<Uuid>,
) -> Result<Vec<CallRow>> {
	let mut builder = sqlx::QueryBuilder::new(
		"SELECT c.call_id, c.campaign_id, c.recipient_id, r.name AS recipient_name, r.phone, \
		 c.provider_call_id, c.status, c.initiated_at, c.updated_at \
		 FROM call_records c JOIN recipients r ON r.recipient_id = c.recipient_id \
		 WHERE c.tenant_id = ",
	);

	builder.push_bind(tenant_id);

	if let Some(campaign_id) = campaign_id {
		builder.push(" AND c.campaign_id = ");
		builder.push_bind(campaign_id);
	}

	builder.push(" ORDER BY c.initiated_at ASC, r.name ASC, c.call_id ASC");

	let rows: Vec<CallRow> = builder.build_query_as().fetch_all(&db.pool).await?;

	Ok(rows)
}

pub async fn cancel_pending(
	db: &Db,
	tenant_id: &str,
	campaign_id: Uuid,
	now: OffsetDateTime,
) -> Result<u64> {
	let cancelable: Vec<&str> =
		CallStatus::CANCELABLE.iter().map(|status| status.as_str()).collect();
	let result = sqlx::query(
		"\
UPDATE call_records
SET status = $1, updated_at = $2
WHERE tenant_id = $3 AND campaign_id = $4 AND status = ANY($5)",
	)
	.bind(CallStatus::Canceled.as_str())
	.bind(now)
	.bind(tenant_id)
	.bind(campaign_id)
	.bind(cancelable.as_slice())
	.execute(&db.pool)
	.await?;

	Ok(result.rows_affected())
}

fn parse_status(raw: String) -> Result<CallStatus> {
	raw.parse().map_err(|err: rally_domain::ParseStatusError| {
		crate::Error::InvalidArgument(err.to_string())
	})
}
