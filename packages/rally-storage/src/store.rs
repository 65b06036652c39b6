use std::{future::Future, pin::Pin};

use time::OffsetDateTime;
use uuid::Uuid;

use rally_domain::{CallStatus, Transition};

use crate::{
	Result, calls,
	db::Db,
	models::{CallRecord, CallRow, Campaign, Message, Recipient},
	queries,
};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Outcome of one placement attempt, as the worker reports it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placement {
	Placed { provider_call_id: String },
	Failed,
}
impl Placement {
	pub fn provider_call_id(&self) -> Option<&str> {
		match self {
			Self::Placed { provider_call_id } => Some(provider_call_id.as_str()),
			Self::Failed => None,
		}
	}

	/// The status a record holding `current` ends up with. A record that already reached a
	/// terminal status keeps it.
	pub fn resulting_status(&self, current: CallStatus) -> CallStatus {
		let target = match self {
			Self::Placed { .. } => CallStatus::Initiated,
			Self::Failed => CallStatus::Failed,
		};

		match current.transition_to(target) {
			Transition::Apply => target,
			Transition::Unchanged | Transition::Rejected => current,
		}
	}

	/// The provider id and status to write for a record holding `current`. A provider id that
	/// another record already holds is dropped and the attempt counts as failed.
	pub fn settle(&self, current: CallStatus, id_taken: bool) -> (Option<&str>, CallStatus) {
		if id_taken {
			return (None, Self::Failed.resulting_status(current));
		}

		(self.provider_call_id(), self.resulting_status(current))
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusUpdate {
	UnknownCall,
	Applied { call_id: Uuid, previous: CallStatus },
	Unchanged { call_id: Uuid },
	Rejected { call_id: Uuid, current: CallStatus },
}

/// Persistence seam for call records and the lookup entities dispatch reads.
///
/// Every method that mutates a record applies [`CallStatus::transition_to`] atomically with the
/// read of the current status.
pub trait CallStore
where
	Self: Send + Sync,
{
	fn campaign<'a>(
		&'a self,
		tenant_id: &'a str,
		campaign_id: Uuid,
	) -> BoxFuture<'a, Result<Option<Campaign>>>;

	fn message<'a>(
		&'a self,
		tenant_id: &'a str,
		message_id: Uuid,
	) -> BoxFuture<'a, Result<Option<Message>>>;

	/// Unscoped lookup used by the playback endpoint, which the provider calls without a tenant.
	fn message_by_id<'a>(&'a self, message_id: Uuid) -> BoxFuture<'a, Result<Option<Message>>>;

	fn roster<'a>(&'a self, campaign_id: Uuid) -> BoxFuture<'a, Result<Vec<Recipient>>>;

	fn insert_call<'a>(&'a self, record: &'a CallRecord) -> BoxFuture<'a, Result<()>>;

	fn call_status<'a>(&'a self, call_id: Uuid) -> BoxFuture<'a, Result<Option<CallStatus>>>;

	fn record_placement<'a>(
		&'a self,
		call_id: Uuid,
		placement: &'a Placement,
		now: OffsetDateTime,
	) -> BoxFuture<'a, Result<Option<CallStatus>>>;

	fn apply_provider_status<'a>(
		&'a self,
		provider_call_id: &'a str,
		status: CallStatus,
		now: OffsetDateTime,
	) -> BoxFuture<'a, Result<StatusUpdate>>;

	fn list_calls<'a>(
		&'a self,
		tenant_id: &'a str,
		campaign_id: Option<Uuid>,
	) -> BoxFuture<'a, Result<Vec<CallRow>>>;

	fn cancel_pending<'a>(
		&'a self,
		tenant_id: &'a str,
		campaign_id: Uuid,
		now: OffsetDateTime,
	) -> BoxFuture<'a, Result<u64>>;
}

impl CallStore for Db {
	fn campaign<'a>(
		&'a self,
		tenant_id: &'a str,
		campaign_id: Uuid,
	) -> BoxFuture<'a, Result<Option<Campaign>>> {
		Box::pin(queries::fetch_campaign(self, tenant_id, campaign_id))
	}

	fn message<'a>(
		&'a self,
		tenant_id: &'a str,
		message_id: Uuid,
	) -> BoxFuture<'a, Result<Option<Message>>> {
		Box::pin(queries::fetch_message(self, Some(tenant_id), message_id))
	}

	fn message_by_id<'a>(&'a self, message_id: Uuid) -> BoxFuture<'a, Result<Option<Message>>> {
		Box::pin(queries::fetch_message(self, None, message_id))
	}

	fn roster<'a>(&'a self, campaign_id: Uuid) -> BoxFuture<'a, Result<Vec<Recipient>>> {
		Box::pin(queries::fetch_roster(self, campaign_id))
	}

	fn insert_call<'a>(&'a self, record: &'a CallRecord) -> BoxFuture<'a, Result<()>> {
		Box::pin(calls::insert_call(self, record))
	}

	fn call_status<'a>(&'a self, call_id: Uuid) -> BoxFuture<'a, Result<Option<CallStatus>>> {
		Box::pin(calls::fetch_status(self, call_id))
	}

	fn record_placement<'a>(
		&'a self,
		call_id: Uuid,
		placement: &'a Placement,
		now: OffsetDateTime,
	) -> BoxFuture<'a, Result<Option<CallStatus>>> {
		Box::pin(calls::record_placement(self, call_id, placement, now))
	}

	fn apply_provider_status<'a>(
		&'a self,
		provider_call_id: &'a str,
		status: CallStatus,
		now: OffsetDateTime,
	) -> BoxFuture<'a, Result<StatusUpdate>> {
		Box::pin(calls::apply_provider_status(self, provider_call_id, status, now))
	}

	fn list_calls<'a>(
		&'a self,
		tenant_id: &'a str,
		campaign_id: Option<Uuid>,
	) -> BoxFuture<'a, Result<Vec<CallRow>>> {
		Box::pin(calls::list_calls(self, tenant_id, campaign_id))
	}

	fn cancel_pending<'a>(
		&'a self,
		tenant_id: &'a str,
		campaign_id: Uuid,
		now: OffsetDateTime,
	) -> BoxFuture<'a, Result<u64>> {
		Box::pin(calls::cancel_pending(self, tenant_id, campaign_id, now))
	}
}
