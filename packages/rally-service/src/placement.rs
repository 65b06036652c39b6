use std::{future::Future, sync::Arc};

use time::OffsetDateTime;
use tokio::sync::{Mutex, mpsc};
use tokio_util::task::TaskTracker;
use uuid::Uuid;

use crate::{PLAY_PATH, STATUS_PATH, TelephonyProvider};
use rally_config::Config;
use rally_domain::phone;
use rally_providers::{CallRequest, STATUS_EVENTS};
use rally_storage::{BoxFuture, CallStore, Placement};

type Job = BoxFuture<'static, ()>;

/// Bounded executor for outbound call placement.
///
/// `size` workers drain one FIFO queue. Each job runs in its own task, so a panicking job only
/// takes that job down and the worker moves on to the next one.
pub struct PlacementPool {
	sender: mpsc::UnboundedSender<Job>,
	tracker: TaskTracker,
	size: usize,
}
impl PlacementPool {
	/// Spawns the workers on the current tokio runtime. A size of zero is raised to one.
	pub fn new(size: usize) -> Self {
		let size = size.max(1);
		let (sender, receiver) = mpsc::unbounded_channel::<Job>();
		let queue = Arc::new(Mutex::new(receiver));

		for worker in 0..size {
			tokio::spawn(run_worker(worker, queue.clone()));
		}

		tracing::debug!(size, "Placement pool started.");

		Self { sender, tracker: TaskTracker::new(), size }
	}

	pub fn size(&self) -> usize {
		self.size
	}

	/// Queues a job. Returns `false` when the workers are gone, which only happens while the
	/// runtime shuts down.
	pub fn submit<F>(&self, job: F) -> bool
	where
		F: Future<Output = ()> + Send + 'static,
	{
		let job = self.tracker.track_future(job);

		self.sender.send(Box::pin(job)).is_ok()
	}

	/// Resolves once every job submitted so far has finished.
	pub async fn wait_idle(&self) {
		self.tracker.close();
		self.tracker.wait().await;
		self.tracker.reopen();
	}
}

async fn run_worker(worker: usize, queue: Arc<Mutex<mpsc::UnboundedReceiver<Job>>>) {
	loop {
		let job = { queue.lock().await.recv().await };
		let Some(job) = job else {
			break;
		};

		if let Err(err) = tokio::spawn(job).await {
			tracing::error!(worker, error = %err, "Placement job did not complete.");
		}
	}

	tracing::debug!(worker, "Placement worker stopped.");
}

/// One unit of work handed from the dispatcher to the pool.
#[derive(Debug, Clone)]
pub struct PlacementTask {
	pub call_id: Uuid,
	pub to: String,
	pub message_id: Uuid,
}

/// Places a single call and writes the immediate result back.
pub struct Placer {
	cfg: Arc<Config>,
	store: Arc<dyn CallStore>,
	telephony: Arc<dyn TelephonyProvider>,
}
impl Placer {
	pub fn new(
		cfg: Arc<Config>,
		store: Arc<dyn CallStore>,
		telephony: Arc<dyn TelephonyProvider>,
	) -> Self {
		Self { cfg, store, telephony }
	}

	pub async fn place(&self, task: PlacementTask) {
		let call_id = task.call_id;
		let current = match self.store.call_status(call_id).await {
			Ok(current) => current,
			Err(err) => {
				tracing::error!(%call_id, error = %err, "Failed to load call record before placement.");

				return;
			},
		};

		match current {
			None => {
				tracing::warn!(%call_id, "Call record is missing. Skipping placement.");

				return;
			},
			Some(status) if status.is_terminal() => {
				tracing::info!(%call_id, %status, "Call is already resolved. Skipping placement.");

				return;
			},
			Some(_) => {},
		}

		// Cancellation can still land between the check above and the provider request. The
		// terminal guard in the store keeps `canceled` when the placement result is written.
		let joined = tokio::spawn(attempt(self.cfg.clone(), self.telephony.clone(), task)).await;
		let placement = match joined {
			Ok(placement) => placement,
			Err(err) => {
				tracing::error!(%call_id, error = %err, "Placement attempt aborted.");

				Placement::Failed
			},
		};

		match self.store.record_placement(call_id, &placement, OffsetDateTime::now_utc()).await {
			Ok(Some(status)) => {
				tracing::info!(
					%call_id,
					provider_call_id = placement.provider_call_id(),
					%status,
					"Placement result recorded."
				);
			},
			Ok(None) => {
				tracing::warn!(%call_id, "Call record vanished during placement.");
			},
			Err(err) => {
				tracing::error!(%call_id, error = %err, "Failed to record placement result.");
			},
		}
	}
}

async fn attempt(
	cfg: Arc<Config>,
	telephony: Arc<dyn TelephonyProvider>,
	task: PlacementTask,
) -> Placement {
	let Some(to) = phone::normalize(&task.to) else {
		tracing::warn!(call_id = %task.call_id, "Destination is not a dialable number.");

		return Placement::Failed;
	};
	let base = cfg.service.public_base_url.as_str();
	let playback_url = format!("{base}{PLAY_PATH}?message_id={}", task.message_id);
	let status_callback_url = format!("{base}{STATUS_PATH}");
	let req = CallRequest {
		to: &to,
		from: &cfg.telephony.from_number,
		playback_url: &playback_url,
		status_callback_url: &status_callback_url,
		status_events: &STATUS_EVENTS,
	};

	match telephony.create_call(&cfg.telephony, &req).await {
		Ok(placed) => Placement::Placed { provider_call_id: placed.provider_call_id },
		Err(err) => {
			tracing::warn!(call_id = %task.call_id, error = %err, "Provider rejected the call.");

			Placement::Failed
		},
	}
}
