use serde::Serialize;

use crate::status::CallStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bucket {
	Completed,
	/// failed, busy, no-answer and canceled.
	Failed,
	InFlight,
}
impl Bucket {
	pub fn of(status: CallStatus) -> Self {
		match status {
			CallStatus::Completed => Self::Completed,
			CallStatus::Failed | CallStatus::Busy | CallStatus::NoAnswer | CallStatus::Canceled =>
				Self::Failed,
			CallStatus::Queued
			| CallStatus::Initiated
			| CallStatus::Ringing
			| CallStatus::Answered => Self::InFlight,
		}
	}
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ProgressCounts {
	pub total: u64,
	pub completed: u64,
	pub failed: u64,
	pub in_flight: u64,
}
impl ProgressCounts {
	pub fn tally<I>(statuses: I) -> Self
	where
		I: IntoIterator<Item = CallStatus>,
	{
		let mut counts = Self::default();

		for status in statuses {
			counts.record(status);
		}

		counts
	}

	pub fn record(&mut self, status: CallStatus) {
		self.total += 1;

		match Bucket::of(status) {
			Bucket::Completed => self.completed += 1,
			Bucket::Failed => self.failed += 1,
			Bucket::InFlight => self.in_flight += 1,
		}
	}

	pub fn is_balanced(&self) -> bool {
		self.completed + self.failed + self.in_flight == self.total
	}

	/// True once every call reached a terminal status.
	pub fn is_settled(&self) -> bool {
		self.in_flight == 0
	}
}
