pub mod calls;
pub mod cancel;
pub mod dispatch;
pub mod placement;
pub mod playback;
pub mod progress;
pub mod webhook;

mod error;

pub use calls::{CallLogItem, CallLogRequest, CallLogResponse, RosterEntry, RosterRequest};
pub use cancel::{CancelRequest, CancelResponse};
pub use dispatch::{DispatchHandle, DispatchRequest};
pub use error::{Error, Result};
pub use placement::{PlacementPool, PlacementTask, Placer};
pub use playback::Playback;
pub use progress::{ProgressRequest, ProgressResponse, ProgressRow};
pub use webhook::{CallStatusEvent, WebhookOutcome};

use std::sync::Arc;

use rally_config::{Config, Telephony};
use rally_providers::{CallRequest, PlacedCall, telephony};
use rally_storage::{BoxFuture, CallStore};

pub const PLAY_PATH: &str = "/v1/telephony/play";
pub const STATUS_PATH: &str = "/v1/telephony/call-status";

pub trait TelephonyProvider
where
	Self: Send + Sync,
{
	fn create_call<'a>(
		&'a self,
		cfg: &'a Telephony,
		req: &'a CallRequest<'a>,
	) -> BoxFuture<'a, rally_providers::Result<PlacedCall>>;
}

pub struct RallyService {
	pub cfg: Arc<Config>,
	pub store: Arc<dyn CallStore>,
	pub pool: PlacementPool,
	placer: Arc<Placer>,
}
impl RallyService {
	/// Builds the service with the REST telephony client and a pool sized from
	/// `dispatch.pool_size`. Must be called inside a tokio runtime.
	pub fn new(cfg: Config, store: Arc<dyn CallStore>) -> Self {
		Self::with_telephony(cfg, store, Arc::new(DefaultTelephony))
	}

	pub fn with_telephony(
		cfg: Config,
		store: Arc<dyn CallStore>,
		telephony: Arc<dyn TelephonyProvider>,
	) -> Self {
		let pool = PlacementPool::new(cfg.dispatch.pool_size);

		Self::with_pool(cfg, store, telephony, pool)
	}

	pub fn with_pool(
		cfg: Config,
		store: Arc<dyn CallStore>,
		telephony: Arc<dyn TelephonyProvider>,
		pool: PlacementPool,
	) -> Self {
		let cfg = Arc::new(cfg);
		let placer = Arc::new(Placer::new(cfg.clone(), store.clone(), telephony));

		Self { cfg, store, pool, placer }
	}

	/// Awaits every placement submitted so far.
	pub async fn wait_idle(&self) {
		self.pool.wait_idle().await;
	}
}

struct DefaultTelephony;
impl TelephonyProvider for DefaultTelephony {
	fn create_call<'a>(
		&'a self,
		cfg: &'a Telephony,
		req: &'a CallRequest<'a>,
	) -> BoxFuture<'a, rally_providers::Result<PlacedCall>> {
		Box::pin(telephony::create_call(cfg, req))
	}
}

pub(crate) fn require_tenant(tenant_id: &str) -> Result<&str> {
	let tenant_id = tenant_id.trim();

	if tenant_id.is_empty() {
		return Err(Error::InvalidRequest { message: "tenant_id is required.".to_string() });
	}

	Ok(tenant_id)
}

pub(crate) fn require_campaign(campaign_id: Option<uuid::Uuid>) -> Result<uuid::Uuid> {
	campaign_id
		.ok_or_else(|| Error::InvalidRequest { message: "campaign_id is required.".to_string() })
}
