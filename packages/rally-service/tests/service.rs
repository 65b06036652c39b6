use std::{
	collections::HashSet,
	sync::{
		Arc, Mutex,
		atomic::{AtomicUsize, Ordering},
	},
	time::Duration,
};

use time::OffsetDateTime;
use tokio::sync::Notify;
use uuid::Uuid;

use rally_config::{Config, Dispatch, Postgres, Security, Service, Storage, Telephony};
use rally_domain::CallStatus;
use rally_providers::{CallRequest, PlacedCall};
use rally_service::{
	CallLogRequest, CallStatusEvent, CancelRequest, DispatchRequest, Error, PlacementPool,
	ProgressRequest, RallyService, RosterRequest, TelephonyProvider, WebhookOutcome,
};
use rally_storage::{
	BoxFuture, CallStore,
	models::{CallRecord, Campaign, Message, Recipient},
};
use rally_testkit::MemoryStore;

const TENANT: &str = "tenant_alpha";
const OTHER_TENANT: &str = "tenant_beta";

#[derive(Default)]
struct RecordingTelephony {
	calls: Mutex<Vec<RecordedCall>>,
	failing: HashSet<String>,
	panicking: HashSet<String>,
	delay: Option<Duration>,
	in_flight: AtomicUsize,
	max_in_flight: AtomicUsize,
}
impl RecordingTelephony {
	fn failing(numbers: &[&str]) -> Self {
		Self { failing: numbers.iter().map(|n| n.to_string()).collect(), ..Self::default() }
	}

	fn recorded(&self) -> Vec<RecordedCall> {
		self.calls.lock().expect("Failed to lock recorded calls.").clone()
	}
}
impl TelephonyProvider for RecordingTelephony {
	fn create_call<'a>(
		&'a self,
		_: &'a Telephony,
		req: &'a CallRequest<'a>,
	) -> BoxFuture<'a, rally_providers::Result<PlacedCall>> {
		Box::pin(async move {
			let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;

			self.max_in_flight.fetch_max(now, Ordering::SeqCst);

			if let Some(delay) = self.delay {
				tokio::time::sleep(delay).await;
			}

			self.in_flight.fetch_sub(1, Ordering::SeqCst);

			if self.panicking.contains(req.to) {
				panic!("Provider mock panicked for {}.", req.to);
			}

			let mut calls = self.calls.lock().expect("Failed to lock recorded calls.");

			calls.push(RecordedCall {
				to: req.to.to_string(),
				playback_url: req.playback_url.to_string(),
				status_callback_url: req.status_callback_url.to_string(),
			});

			if self.failing.contains(req.to) {
				return Err(rally_providers::Error::Rejected {
					status: 400,
					message: "Invalid To number.".to_string(),
				});
			}

			Ok(PlacedCall { provider_call_id: format!("CA{:04}", calls.len()) })
		})
	}
}

#[derive(Clone, Debug)]
struct RecordedCall {
	to: String,
	playback_url: String,
	status_callback_url: String,
}

/// Answers every request with the same provider call id.
struct FixedIdTelephony;
impl TelephonyProvider for FixedIdTelephony {
	fn create_call<'a>(
		&'a self,
		_: &'a Telephony,
		_: &'a CallRequest<'a>,
	) -> BoxFuture<'a, rally_providers::Result<PlacedCall>> {
		Box::pin(async move { Ok(PlacedCall { provider_call_id: "CA-SHARED".to_string() }) })
	}
}

/// Holds every provider request until released, to widen the cancel window.
struct GatedTelephony {
	entered: Notify,
	release: Notify,
	contacted: AtomicUsize,
}
impl TelephonyProvider for GatedTelephony {
	fn create_call<'a>(
		&'a self,
		_: &'a Telephony,
		_: &'a CallRequest<'a>,
	) -> BoxFuture<'a, rally_providers::Result<PlacedCall>> {
		Box::pin(async move {
			let n = self.contacted.fetch_add(1, Ordering::SeqCst) + 1;

			self.entered.notify_one();
			self.release.notified().await;

			Ok(PlacedCall { provider_call_id: format!("CA-gated-{n}") })
		})
	}
}

struct Fixture {
	campaign_id: Uuid,
	message_id: Uuid,
	recipients: Vec<Uuid>,
}

fn test_config(pool_size: usize) -> Config {
	Config {
		service: Service {
			http_bind: "127.0.0.1:0".to_string(),
			log_level: "info".to_string(),
			public_base_url: "https://calls.example.com".to_string(),
		},
		storage: Storage {
			postgres: Postgres { dsn: "postgres://unused".to_string(), pool_max_conns: 1 },
		},
		telephony: Telephony {
			provider_id: "mock".to_string(),
			api_base: "http://127.0.0.1:9".to_string(),
			account_sid: "AC123".to_string(),
			auth_token: "secret".to_string(),
			from_number: "+15550100000".to_string(),
			timeout_ms: 1_000,
		},
		dispatch: Dispatch { pool_size },
		security: Security { bind_localhost_only: true, api_auth_token: None },
	}
}

fn seed(store: &MemoryStore, tenant_id: &str, roster: &[(&str, &str, bool)]) -> Fixture {
	let now = OffsetDateTime::now_utc();
	let campaign_id = Uuid::new_v4();
	let message_id = Uuid::new_v4();

	store.insert_campaign(Campaign {
		campaign_id,
		tenant_id: tenant_id.to_string(),
		title: "Choir rehearsal".to_string(),
		created_at: now,
	});
	store.insert_message(Message {
		message_id,
		tenant_id: tenant_id.to_string(),
		name: "Moved to 7pm".to_string(),
		audio_url: "https://cdn.example.com/moved.mp3".to_string(),
		created_at: now,
	});

	let recipients = roster
		.iter()
		.enumerate()
		.map(|(idx, (name, phone, active))| {
			let recipient_id = Uuid::new_v4();

			store.insert_recipient(Recipient {
				recipient_id,
				tenant_id: tenant_id.to_string(),
				name: name.to_string(),
				phone: phone.to_string(),
				active: *active,
				created_at: now,
			});
			store.add_to_roster(campaign_id, recipient_id, idx as i32);

			recipient_id
		})
		.collect();

	Fixture { campaign_id, message_id, recipients }
}

fn service(
	store: Arc<MemoryStore>,
	telephony: Arc<dyn TelephonyProvider>,
	pool_size: usize,
) -> RallyService {
	RallyService::with_telephony(test_config(pool_size), store, telephony)
}

fn dispatch_req(tenant_id: &str, fixture: &Fixture) -> DispatchRequest {
	DispatchRequest {
		tenant_id: tenant_id.to_string(),
		campaign_id: fixture.campaign_id,
		message_id: fixture.message_id,
	}
}

fn progress_req(tenant_id: &str, fixture: &Fixture) -> ProgressRequest {
	ProgressRequest { tenant_id: tenant_id.to_string(), campaign_id: Some(fixture.campaign_id) }
}

fn status_event(provider_call_id: &str, status: &str) -> CallStatusEvent {
	CallStatusEvent { call_id: Some(provider_call_id.to_string()), status: Some(status.to_string()) }
}

async fn insert_record(
	store: &MemoryStore,
	fixture: &Fixture,
	idx: usize,
	status: CallStatus,
) -> Uuid {
	let mut record = CallRecord::queued(
		TENANT,
		fixture.campaign_id,
		fixture.message_id,
		fixture.recipients[idx],
		Uuid::new_v4(),
		OffsetDateTime::now_utc(),
	);

	record.status = status;

	store.insert_call(&record).await.expect("Failed to insert call record.");

	record.call_id
}

async fn report(service: &RallyService, provider_call_id: &str, status: &str) -> WebhookOutcome {
	service
		.handle_call_status(status_event(provider_call_id, status))
		.await
		.expect("Webhook failed.")
}

#[tokio::test]
async fn dispatch_queues_active_recipients_and_places_each_once() {
	let store = Arc::new(MemoryStore::new());
	let telephony = Arc::new(RecordingTelephony::default());
	let fixture = seed(
		&store,
		TENANT,
		&[
			("Ada", "(555) 010-0001", true),
			("Brook", "555-010-0002", true),
			("Cyd", "+44 20 7946 0958", true),
			("Dee", "555-010-0004", false),
		],
	);
	let service = service(store.clone(), telephony.clone(), 2);
	let handle = service.dispatch(dispatch_req(TENANT, &fixture)).await.expect("Dispatch failed.");

	assert_eq!(handle.queued, 3);
	assert_eq!(handle.call_ids.len(), 3);
	assert_eq!(store.calls().len(), 3);

	let before = service.progress(progress_req(TENANT, &fixture)).await.expect("Progress failed.");

	assert_eq!(before.counts.total, 3);
	assert_eq!(before.counts.completed, 0);
	assert_eq!(before.counts.failed, 0);
	assert_eq!(before.counts.in_flight, 3);

	service.wait_idle().await;

	let records = store.calls();
	let provider_ids =
		records.iter().filter_map(|r| r.provider_call_id.clone()).collect::<HashSet<_>>();

	assert_eq!(provider_ids.len(), 3);
	assert!(records.iter().all(|record| record.status == CallStatus::Initiated));
	assert!(records.iter().all(|record| record.dispatch_id == handle.dispatch_id));

	let mut dialed = telephony.recorded().into_iter().map(|call| call.to).collect::<Vec<_>>();

	dialed.sort();

	assert_eq!(dialed, vec!["+15550100001", "+15550100002", "+442079460958"]);

	let call = &telephony.recorded()[0];

	assert_eq!(
		call.playback_url,
		format!("https://calls.example.com/v1/telephony/play?message_id={}", fixture.message_id)
	);
	assert_eq!(call.status_callback_url, "https://calls.example.com/v1/telephony/call-status");
}

#[tokio::test]
async fn dispatch_rejects_foreign_campaign_and_message() {
	let store = Arc::new(MemoryStore::new());
	let fixture = seed(&store, OTHER_TENANT, &[("Ada", "5550100001", true)]);
	let service = service(store.clone(), Arc::new(RecordingTelephony::default()), 2);
	let err = service.dispatch(dispatch_req(TENANT, &fixture)).await.expect_err("Expected error.");

	assert!(matches!(err, Error::NotFound { .. }), "Unexpected error: {err:?}");
	assert!(store.calls().is_empty());

	let own = seed(&store, TENANT, &[("Brook", "5550100002", true)]);
	let mixed = DispatchRequest {
		tenant_id: TENANT.to_string(),
		campaign_id: own.campaign_id,
		message_id: fixture.message_id,
	};
	let err = service.dispatch(mixed).await.expect_err("Expected error.");

	assert!(matches!(err, Error::NotFound { .. }), "Unexpected error: {err:?}");
	assert!(store.calls().is_empty());

	let progress = service.progress(progress_req(TENANT, &fixture)).await.expect("Progress failed.");

	assert_eq!(progress.counts.total, 0);
	assert!(progress.rows.is_empty());
}

#[tokio::test]
async fn dispatch_rejects_roster_with_foreign_recipient() {
	let store = Arc::new(MemoryStore::new());
	let fixture = seed(&store, TENANT, &[("Ada", "5550100001", true)]);
	let foreign = seed(&store, OTHER_TENANT, &[("Eve", "5550100009", true)]);

	store.add_to_roster(fixture.campaign_id, foreign.recipients[0], 1);

	let telephony = Arc::new(RecordingTelephony::default());
	let service = service(store.clone(), telephony.clone(), 2);
	let err = service.dispatch(dispatch_req(TENANT, &fixture)).await.expect_err("Expected error.");

	assert!(matches!(err, Error::TenantMismatch { .. }), "Unexpected error: {err:?}");

	service.wait_idle().await;

	assert!(store.calls().is_empty());
	assert!(telephony.recorded().is_empty());
}

#[tokio::test]
async fn dispatch_requires_tenant() {
	let store = Arc::new(MemoryStore::new());
	let fixture = seed(&store, TENANT, &[("Ada", "5550100001", true)]);
	let service = service(store.clone(), Arc::new(RecordingTelephony::default()), 2);
	let err = service.dispatch(dispatch_req("  ", &fixture)).await.expect_err("Expected error.");

	assert!(matches!(err, Error::InvalidRequest { .. }), "Unexpected error: {err:?}");
}

#[tokio::test]
async fn redispatch_adds_a_second_set_of_records() {
	let store = Arc::new(MemoryStore::new());
	let fixture = seed(&store, TENANT, &[("Ada", "5550100001", true), ("Brook", "5550100002", true)]);
	let service = service(store.clone(), Arc::new(RecordingTelephony::default()), 2);
	let first = service.dispatch(dispatch_req(TENANT, &fixture)).await.expect("Dispatch failed.");
	let second = service.dispatch(dispatch_req(TENANT, &fixture)).await.expect("Dispatch failed.");

	service.wait_idle().await;

	assert_ne!(first.dispatch_id, second.dispatch_id);
	assert_eq!(store.calls().len(), 4);
}

#[tokio::test]
async fn provider_failure_only_fails_its_own_record() {
	let store = Arc::new(MemoryStore::new());
	let fixture = seed(
		&store,
		TENANT,
		&[("Ada", "5550100001", true), ("Brook", "5550100002", true), ("Cyd", "12", true)],
	);
	let telephony = Arc::new(RecordingTelephony::failing(&["+15550100002"]));
	let service = service(store.clone(), telephony.clone(), 3);

	service.dispatch(dispatch_req(TENANT, &fixture)).await.expect("Dispatch failed.");
	service.wait_idle().await;

	let status_of = |idx: usize| {
		store
			.calls()
			.into_iter()
			.find(|record| record.recipient_id == fixture.recipients[idx])
			.map(|record| record.status)
	};

	assert_eq!(status_of(0), Some(CallStatus::Initiated));
	assert_eq!(status_of(1), Some(CallStatus::Failed));
	// An undialable number fails without reaching the provider.
	assert_eq!(status_of(2), Some(CallStatus::Failed));
	assert_eq!(telephony.recorded().len(), 2);

	let progress = service.progress(progress_req(TENANT, &fixture)).await.expect("Progress failed.");

	assert_eq!(progress.counts.failed, 2);
	assert_eq!(progress.counts.in_flight, 1);
	assert!(progress.counts.is_balanced());
}

#[tokio::test]
async fn pool_never_exceeds_its_size() {
	let store = Arc::new(MemoryStore::new());
	let roster = (1..=6)
		.map(|idx| (format!("Member {idx}"), format!("555010000{idx}")))
		.collect::<Vec<_>>();
	let roster = roster.iter().map(|(n, p)| (n.as_str(), p.as_str(), true)).collect::<Vec<_>>();
	let fixture = seed(&store, TENANT, &roster);
	let telephony = Arc::new(RecordingTelephony {
		delay: Some(Duration::from_millis(20)),
		..RecordingTelephony::default()
	});
	let service = service(store.clone(), telephony.clone(), 2);

	assert_eq!(service.pool.size(), 2);

	service.dispatch(dispatch_req(TENANT, &fixture)).await.expect("Dispatch failed.");
	service.wait_idle().await;

	assert_eq!(telephony.recorded().len(), 6);
	assert_eq!(telephony.max_in_flight.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn panicking_placement_does_not_stop_the_pool() {
	let store = Arc::new(MemoryStore::new());
	let fixture = seed(
		&store,
		TENANT,
		&[("Ada", "5550100001", true), ("Brook", "5550100002", true), ("Cyd", "5550100003", true)],
	);
	let telephony = Arc::new(RecordingTelephony {
		panicking: HashSet::from(["+15550100001".to_string()]),
		..RecordingTelephony::default()
	});
	let service = service(store.clone(), telephony.clone(), 1);

	service.dispatch(dispatch_req(TENANT, &fixture)).await.expect("Dispatch failed.");
	service.wait_idle().await;

	let records = store.calls();
	let statuses = records.iter().map(|record| record.status).collect::<Vec<_>>();

	assert_eq!(statuses, vec![CallStatus::Failed, CallStatus::Initiated, CallStatus::Initiated]);
	assert_eq!(records[0].provider_call_id, None);
	assert_eq!(telephony.recorded().len(), 2);

	let progress = service.progress(progress_req(TENANT, &fixture)).await.expect("Progress failed.");

	assert_eq!(progress.counts.failed, 1);
	assert_eq!(progress.counts.in_flight, 2);
}

#[tokio::test]
async fn reused_provider_call_id_fails_the_later_record() {
	let store = Arc::new(MemoryStore::new());
	let fixture = seed(&store, TENANT, &[("Ada", "5550100001", true), ("Brook", "5550100002", true)]);
	let service = service(store.clone(), Arc::new(FixedIdTelephony), 1);

	service.dispatch(dispatch_req(TENANT, &fixture)).await.expect("Dispatch failed.");
	service.wait_idle().await;

	let records = store.calls();

	assert_eq!(records[0].status, CallStatus::Initiated);
	assert_eq!(records[0].provider_call_id.as_deref(), Some("CA-SHARED"));
	assert_eq!(records[1].status, CallStatus::Failed);
	assert_eq!(records[1].provider_call_id, None);
	assert_eq!(report(&service, "CA-SHARED", "completed").await, WebhookOutcome::Applied);
	assert_eq!(store.call(records[1].call_id).map(|r| r.status), Some(CallStatus::Failed));
}

#[tokio::test]
async fn cancel_before_placement_never_contacts_the_provider() {
	let store = Arc::new(MemoryStore::new());
	let fixture = seed(&store, TENANT, &[("Ada", "5550100001", true), ("Brook", "5550100002", true)]);
	let telephony = Arc::new(GatedTelephony {
		entered: Notify::new(),
		release: Notify::new(),
		contacted: AtomicUsize::new(0),
	});
	let service = service(store.clone(), telephony.clone(), 1);

	service.dispatch(dispatch_req(TENANT, &fixture)).await.expect("Dispatch failed.");
	telephony.entered.notified().await;

	let canceled = service
		.cancel(CancelRequest {
			tenant_id: TENANT.to_string(),
			campaign_id: Some(fixture.campaign_id),
		})
		.await
		.expect("Cancel failed.");

	assert_eq!(canceled.canceled, 2);

	telephony.release.notify_one();
	service.wait_idle().await;

	let records = store.calls();

	// The in-flight placement lands after cancellation and keeps `canceled`.
	assert_eq!(records[0].status, CallStatus::Canceled);
	assert_eq!(records[0].provider_call_id.as_deref(), Some("CA-gated-1"));
	assert_eq!(records[1].status, CallStatus::Canceled);
	assert_eq!(records[1].provider_call_id, None);
	assert_eq!(telephony.contacted.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn cancel_skips_resolved_calls_and_is_idempotent() {
	let store = Arc::new(MemoryStore::new());
	let fixture = seed(
		&store,
		TENANT,
		&[("Ada", "5550100001", true), ("Brook", "5550100002", true), ("Cyd", "5550100003", true)],
	);
	let service = service(store.clone(), Arc::new(RecordingTelephony::default()), 1);
	let first = insert_record(&store, &fixture, 0, CallStatus::Queued).await;
	let second = insert_record(&store, &fixture, 1, CallStatus::Initiated).await;
	let done = insert_record(&store, &fixture, 2, CallStatus::Completed).await;
	let req = CancelRequest { tenant_id: TENANT.to_string(), campaign_id: Some(fixture.campaign_id) };

	assert_eq!(service.cancel(req.clone()).await.expect("Cancel failed.").canceled, 2);
	assert_eq!(service.cancel(req).await.expect("Cancel failed.").canceled, 0);
	assert_eq!(store.call(first).map(|r| r.status), Some(CallStatus::Canceled));
	assert_eq!(store.call(second).map(|r| r.status), Some(CallStatus::Canceled));
	assert_eq!(store.call(done).map(|r| r.status), Some(CallStatus::Completed));

	let foreign = CancelRequest {
		tenant_id: OTHER_TENANT.to_string(),
		campaign_id: Some(fixture.campaign_id),
	};

	assert_eq!(service.cancel(foreign).await.expect("Cancel failed.").canceled, 0);

	let missing = CancelRequest { tenant_id: TENANT.to_string(), campaign_id: None };

	assert!(matches!(service.cancel(missing).await, Err(Error::InvalidRequest { .. })));
}

#[tokio::test]
async fn webhook_is_idempotent_and_keeps_terminal_status() {
	let store = Arc::new(MemoryStore::new());
	let fixture = seed(&store, TENANT, &[("Ada", "5550100001", true)]);
	let service = service(store.clone(), Arc::new(RecordingTelephony::default()), 1);
	let handle = service.dispatch(dispatch_req(TENANT, &fixture)).await.expect("Dispatch failed.");

	service.wait_idle().await;

	let call_id = handle.call_ids[0];
	let provider_call_id =
		store.call(call_id).and_then(|r| r.provider_call_id).expect("Missing provider call id.");

	assert_eq!(report(&service, &provider_call_id, "ringing").await, WebhookOutcome::Applied);
	assert_eq!(report(&service, &provider_call_id, "in-progress").await, WebhookOutcome::Applied);
	assert_eq!(store.call(call_id).map(|r| r.status), Some(CallStatus::Answered));
	assert_eq!(report(&service, &provider_call_id, "completed").await, WebhookOutcome::Applied);
	assert_eq!(report(&service, &provider_call_id, "completed").await, WebhookOutcome::Unchanged);
	assert_eq!(report(&service, &provider_call_id, "ringing").await, WebhookOutcome::Rejected);
	assert_eq!(store.call(call_id).map(|r| r.status), Some(CallStatus::Completed));

	let progress = service.progress(progress_req(TENANT, &fixture)).await.expect("Progress failed.");

	assert_eq!(progress.counts.completed, 1);
	assert_eq!(progress.counts.in_flight, 0);
	assert_eq!(progress.rows[0].recipient, "Ada");
}

#[tokio::test]
async fn webhook_ignores_unknown_calls_and_statuses() {
	let store = Arc::new(MemoryStore::new());
	let service = service(store.clone(), Arc::new(RecordingTelephony::default()), 1);
	let unknown_call = service
		.handle_call_status(status_event("CA-missing", "completed"))
		.await
		.expect("Webhook failed.");
	let unknown_status = service
		.handle_call_status(status_event("CA-missing", "teleported"))
		.await
		.expect("Webhook failed.");
	let empty = service
		.handle_call_status(CallStatusEvent::default())
		.await
		.expect("Webhook failed.");

	assert_eq!(unknown_call, WebhookOutcome::Ignored);
	assert_eq!(unknown_status, WebhookOutcome::Ignored);
	assert_eq!(empty, WebhookOutcome::Ignored);

	store.set_unavailable(true);

	let err = service
		.handle_call_status(status_event("CA-missing", "completed"))
		.await
		.expect_err("Expected storage error.");

	assert!(matches!(err, Error::Storage { .. }), "Unexpected error: {err:?}");
}

#[tokio::test]
async fn progress_requires_campaign_and_scopes_to_tenant() {
	let store = Arc::new(MemoryStore::new());
	let fixture = seed(&store, TENANT, &[("Ada", "5550100001", true)]);
	let service = service(store.clone(), Arc::new(RecordingTelephony::default()), 1);

	insert_record(&store, &fixture, 0, CallStatus::Busy).await;

	let missing = ProgressRequest { tenant_id: TENANT.to_string(), campaign_id: None };

	assert!(matches!(service.progress(missing).await, Err(Error::InvalidRequest { .. })));

	let own = service.progress(progress_req(TENANT, &fixture)).await.expect("Progress failed.");

	assert_eq!(own.counts.total, 1);
	assert_eq!(own.counts.failed, 1);

	let foreign =
		service.progress(progress_req(OTHER_TENANT, &fixture)).await.expect("Progress failed.");

	assert_eq!(foreign.counts.total, 0);
	assert!(foreign.rows.is_empty());
}

#[tokio::test]
async fn call_log_lists_newest_first_and_filters_by_campaign() {
	let store = Arc::new(MemoryStore::new());
	let fixture = seed(&store, TENANT, &[("Ada", "5550100001", true)]);
	let other = seed(&store, TENANT, &[("Brook", "5550100002", true)]);
	let service = service(store.clone(), Arc::new(RecordingTelephony::default()), 1);
	let older = insert_record(&store, &fixture, 0, CallStatus::Completed).await;

	tokio::time::sleep(Duration::from_millis(5)).await;

	let newer = insert_record(&store, &other, 0, CallStatus::Queued).await;
	let all = service
		.list_calls(CallLogRequest { tenant_id: TENANT.to_string(), campaign_id: None })
		.await
		.expect("Call log failed.");

	assert_eq!(all.items.iter().map(|item| item.call_id).collect::<Vec<_>>(), vec![newer, older]);

	let filtered = service
		.list_calls(CallLogRequest {
			tenant_id: TENANT.to_string(),
			campaign_id: Some(fixture.campaign_id),
		})
		.await
		.expect("Call log failed.");

	assert_eq!(filtered.items.len(), 1);
	assert_eq!(filtered.items[0].recipient, "Ada");

	let encoded = serde_json::to_value(&filtered.items[0]).expect("Failed to encode call log.");

	assert_eq!(encoded["status"], "completed");
	assert!(encoded["initiated_at"].as_str().is_some_and(|ts| ts.contains('T')));
}

#[tokio::test]
async fn roster_preview_lists_active_recipients_in_order() {
	let store = Arc::new(MemoryStore::new());
	let fixture = seed(
		&store,
		TENANT,
		&[("Ada", "5550100001", true), ("Brook", "5550100002", false), ("Cyd", "5550100003", true)],
	);
	let service = service(store.clone(), Arc::new(RecordingTelephony::default()), 1);
	let names = service
		.campaign_recipients(RosterRequest {
			tenant_id: TENANT.to_string(),
			campaign_id: Some(fixture.campaign_id),
		})
		.await
		.expect("Roster preview failed.")
		.into_iter()
		.map(|entry| entry.name)
		.collect::<Vec<_>>();

	assert_eq!(names, vec!["Ada", "Cyd"]);

	let foreign = service
		.campaign_recipients(RosterRequest {
			tenant_id: OTHER_TENANT.to_string(),
			campaign_id: Some(fixture.campaign_id),
		})
		.await
		.expect("Roster preview failed.");

	assert!(foreign.is_empty());

	store.set_recipient_active(fixture.recipients[0], false);

	let after = service
		.campaign_recipients(RosterRequest {
			tenant_id: TENANT.to_string(),
			campaign_id: Some(fixture.campaign_id),
		})
		.await
		.expect("Roster preview failed.");

	assert_eq!(after.len(), 1);
	assert_eq!(after[0].name, "Cyd");
}

#[tokio::test]
async fn playback_plays_known_messages_only() {
	let store = Arc::new(MemoryStore::new());
	let fixture = seed(&store, TENANT, &[]);
	let service = service(store.clone(), Arc::new(RecordingTelephony::default()), 1);
	let known = service.playback(Some(fixture.message_id)).await.expect("Playback failed.");

	assert_eq!(known.content_type, "text/xml");
	assert!(known.body.contains("<Play>https://cdn.example.com/moved.mp3</Play>"));

	let unknown = service.playback(Some(Uuid::new_v4())).await.expect("Playback failed.");

	assert!(unknown.body.contains("<Say>No recording found. Goodbye.</Say>"));
	assert_eq!(service.playback(None).await.expect("Playback failed.").body, unknown.body);
}

#[tokio::test]
async fn explicit_pool_is_used() {
	let store = Arc::new(MemoryStore::new());
	let service = RallyService::with_pool(
		test_config(10),
		store,
		Arc::new(RecordingTelephony::default()),
		PlacementPool::new(3),
	);

	assert_eq!(service.pool.size(), 3);
}
