use std::{
	collections::HashMap,
	future,
	sync::{
		Mutex,
		atomic::{AtomicBool, Ordering},
	},
};

use time::OffsetDateTime;
use uuid::Uuid;

use rally_domain::{CallStatus, Transition};
use rally_storage::{
	BoxFuture, CallStore, Placement, StatusUpdate,
	models::{CallRecord, CallRow, Campaign, Message, Recipient},
};

/// In-process [`CallStore`] with the same transition semantics as the Postgres store.
#[derive(Default)]
pub struct MemoryStore {
	state: Mutex<State>,
	unavailable: AtomicBool,
}
impl MemoryStore {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn insert_campaign(&self, campaign: Campaign) {
		self.lock().campaigns.insert(campaign.campaign_id, campaign);
	}

	pub fn insert_message(&self, message: Message) {
		self.lock().messages.insert(message.message_id, message);
	}

	pub fn insert_recipient(&self, recipient: Recipient) {
		self.lock().recipients.insert(recipient.recipient_id, recipient);
	}

	pub fn add_to_roster(&self, campaign_id: Uuid, recipient_id: Uuid, position: i32) {
		let mut state = self.lock();

		state.roster.retain(|entry| !(entry.0 == campaign_id && entry.1 == recipient_id));
		state.roster.push((campaign_id, recipient_id, position));
	}

	pub fn set_recipient_active(&self, recipient_id: Uuid, active: bool) {
		if let Some(recipient) = self.lock().recipients.get_mut(&recipient_id) {
			recipient.active = active;
		}
	}

	/// Makes every subsequent operation fail as if the database were unreachable.
	pub fn set_unavailable(&self, unavailable: bool) {
		self.unavailable.store(unavailable, Ordering::SeqCst);
	}

	/// Snapshot of all call records in insertion order.
	pub fn calls(&self) -> Vec<CallRecord> {
		self.lock().calls.clone()
	}

	pub fn call(&self, call_id: Uuid) -> Option<CallRecord> {
		self.lock().calls.iter().find(|record| record.call_id == call_id).cloned()
	}

	fn lock(&self) -> std::sync::MutexGuard<'_, State> {
		self.state.lock().unwrap_or_else(|err| err.into_inner())
	}

	fn run<'a, T, F>(&'a self, f: F) -> BoxFuture<'a, rally_storage::Result<T>>
	where
		T: Send + 'a,
		F: FnOnce(&mut State) -> T,
	{
		let result = if self.unavailable.load(Ordering::SeqCst) {
			Err(rally_storage::Error::Sqlx(sqlx::Error::PoolTimedOut))
		} else {
			Ok(f(&mut self.lock()))
		};

		Box::pin(future::ready(result))
	}
}

impl CallStore for MemoryStore {
	fn campaign<'a>(
		&'a self,
		tenant_id: &'a str,
		campaign_id: Uuid,
	) -> BoxFuture<'a, rally_storage::Result<Option<Campaign>>> {
		self.run(|state| {
			state.campaigns.get(&campaign_id).filter(|c| c.tenant_id == tenant_id).cloned()
		})
	}

	fn message<'a>(
		&'a self,
		tenant_id: &'a str,
		message_id: Uuid,
	) -> BoxFuture<'a, rally_storage::Result<Option<Message>>> {
		self.run(|state| {
			state.messages.get(&message_id).filter(|m| m.tenant_id == tenant_id).cloned()
		})
	}

	fn message_by_id<'a>(
		&'a self,
		message_id: Uuid,
	) -> BoxFuture<'a, rally_storage::Result<Option<Message>>> {
		self.run(|state| state.messages.get(&message_id).cloned())
	}

	fn roster<'a>(
		&'a self,
		campaign_id: Uuid,
	) -> BoxFuture<'a, rally_storage::Result<Vec<Recipient>>> {
		self.run(|state| {
			let mut entries = state
				.roster
				.iter()
				.filter(|entry| entry.0 == campaign_id)
				.filter_map(|entry| state.recipients.get(&entry.1).map(|r| (entry.2, r)))
				.collect::<Vec<_>>();

			entries.sort_by(|a, b| {
				a.0.cmp(&b.0)
					.then_with(|| a.1.name.cmp(&b.1.name))
					.then_with(|| a.1.recipient_id.cmp(&b.1.recipient_id))
			});

			entries.into_iter().map(|(_, recipient)| recipient.clone()).collect()
		})
	}

	fn insert_call<'a>(
		&'a self,
		record: &'a CallRecord,
	) -> BoxFuture<'a, rally_storage::Result<()>> {
		self.run(|state| state.calls.push(record.clone()))
	}

	fn call_status<'a>(
		&'a self,
		call_id: Uuid,
	) -> BoxFuture<'a, rally_storage::Result<Option<CallStatus>>> {
		self.run(|state| state.find(call_id).map(|record| record.status))
	}

	fn record_placement<'a>(
		&'a self,
		call_id: Uuid,
		placement: &'a Placement,
		now: OffsetDateTime,
	) -> BoxFuture<'a, rally_storage::Result<Option<CallStatus>>> {
		self.run(|state| {
			let id_taken = placement.provider_call_id().is_some_and(|provider_call_id| {
				state.calls.iter().any(|record| {
					record.call_id != call_id
						&& record.provider_call_id.as_deref() == Some(provider_call_id)
				})
			});
			let record = state.find(call_id)?;
			let (provider_call_id, next) = placement.settle(record.status, id_taken);

			if let Some(provider_call_id) = provider_call_id {
				record.provider_call_id = Some(provider_call_id.to_string());
			}

			record.status = next;
			record.updated_at = now;

			Some(next)
		})
	}

	fn apply_provider_status<'a>(
		&'a self,
		provider_call_id: &'a str,
		status: CallStatus,
		now: OffsetDateTime,
	) -> BoxFuture<'a, rally_storage::Result<StatusUpdate>> {
		self.run(|state| {
			let Some(record) = state
				.calls
				.iter_mut()
				.find(|record| record.provider_call_id.as_deref() == Some(provider_call_id))
			else {
				return StatusUpdate::UnknownCall;
			};
			let call_id = record.call_id;
			let current = record.status;

			match current.transition_to(status) {
				Transition::Apply => {
					record.status = status;
					record.updated_at = now;

					StatusUpdate::Applied { call_id, previous: current }
				},
				Transition::Unchanged => StatusUpdate::Unchanged { call_id },
				Transition::Rejected => StatusUpdate::Rejected { call_id, current },
			}
		})
	}

	fn list_calls<'a>(
		&'a self,
		tenant_id: &'a str,
		campaign_id: Option<Uuid>,
	) -> BoxFuture<'a, rally_storage::Result<Vec<CallRow>>> {
		self.run(|state| {
			let mut rows = state
				.calls
				.iter()
				.filter(|record| record.tenant_id == tenant_id)
				.filter(|record| campaign_id.is_none_or(|id| record.campaign_id == id))
				.filter_map(|record| {
					let recipient = state.recipients.get(&record.recipient_id)?;

					Some(CallRow {
						call_id: record.call_id,
						campaign_id: record.campaign_id,
						recipient_id: record.recipient_id,
						recipient_name: recipient.name.clone(),
						phone: recipient.phone.clone(),
						provider_call_id: record.provider_call_id.clone(),
						status: record.status,
						initiated_at: record.initiated_at,
						updated_at: record.updated_at,
					})
				})
				.collect::<Vec<_>>();

			rows.sort_by(|a, b| {
				a.initiated_at
					.cmp(&b.initiated_at)
					.then_with(|| a.recipient_name.cmp(&b.recipient_name))
					.then_with(|| a.call_id.cmp(&b.call_id))
			});

			rows
		})
	}

	fn cancel_pending<'a>(
		&'a self,
		tenant_id: &'a str,
		campaign_id: Uuid,
		now: OffsetDateTime,
	) -> BoxFuture<'a, rally_storage::Result<u64>> {
		self.run(|state| {
			let mut canceled = 0;

			for record in state.calls.iter_mut().filter(|record| {
				record.tenant_id == tenant_id
					&& record.campaign_id == campaign_id
					&& record.status.is_cancelable()
			}) {
				record.status = CallStatus::Canceled;
				record.updated_at = now;
				canceled += 1;
			}

			canceled
		})
	}
}

#[derive(Default)]
struct State {
	campaigns: HashMap<Uuid, Campaign>,
	messages: HashMap<Uuid, Message>,
	recipients: HashMap<Uuid, Recipient>,
	roster: Vec<(Uuid, Uuid, i32)>,
	calls: Vec<CallRecord>,
}
impl State {
	fn find(&mut self, call_id: Uuid) -> Option<&mut CallRecord> {
		self.calls.iter_mut().find(|record| record.call_id == call_id)
	}
}
