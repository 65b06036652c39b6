use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Lifecycle state of one outbound call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CallStatus {
	Queued,
	Initiated,
	Ringing,
	Answered,
	Completed,
	Failed,
	Busy,
	NoAnswer,
	Canceled,
}
impl CallStatus {
	pub const ALL: [Self; 9] = [
		Self::Queued,
		Self::Initiated,
		Self::Ringing,
		Self::Answered,
		Self::Completed,
		Self::Failed,
		Self::Busy,
		Self::NoAnswer,
		Self::Canceled,
	];
	pub const TERMINAL: [Self; 5] =
		[Self::Completed, Self::Failed, Self::Busy, Self::NoAnswer, Self::Canceled];
	/// Statuses the cancellation handler moves to `Canceled`.
	pub const CANCELABLE: [Self; 2] = [Self::Queued, Self::Initiated];

	pub fn as_str(self) -> &'static str {
		match self {
			Self::Queued => "queued",
			Self::Initiated => "initiated",
			Self::Ringing => "ringing",
			Self::Answered => "answered",
			Self::Completed => "completed",
			Self::Failed => "failed",
			Self::Busy => "busy",
			Self::NoAnswer => "no-answer",
			Self::Canceled => "canceled",
		}
	}

	pub fn is_terminal(self) -> bool {
		Self::TERMINAL.contains(&self)
	}

	pub fn is_cancelable(self) -> bool {
		Self::CANCELABLE.contains(&self)
	}

	/// Decides how a stored status reacts to a newly reported one.
	///
	/// Non-terminal statuses follow last-write-wins. Once a terminal status is stored it is kept,
	/// so late or duplicated notifications cannot move a finished call backwards.
	pub fn transition_to(self, next: Self) -> Transition {
		if self == next {
			Transition::Unchanged
		} else if self.is_terminal() {
			Transition::Rejected
		} else {
			Transition::Apply
		}
	}
}
impl fmt::Display for CallStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}
impl FromStr for CallStatus {
	type Err = ParseStatusError;

	fn from_str(raw: &str) -> Result<Self, Self::Err> {
		let normalized = raw.trim().to_ascii_lowercase().replace('_', "-");
		let status = match normalized.as_str() {
			"queued" => Self::Queued,
			"initiated" => Self::Initiated,
			"ringing" => Self::Ringing,
			// Providers report a connected call as `in-progress`.
			"answered" | "in-progress" => Self::Answered,
			"completed" => Self::Completed,
			"failed" => Self::Failed,
			"busy" => Self::Busy,
			"no-answer" => Self::NoAnswer,
			"canceled" | "cancelled" => Self::Canceled,
			_ => return Err(ParseStatusError { raw: raw.to_string() }),
		};

		Ok(status)
	}
}

impl TryFrom<String> for CallStatus {
	type Error = ParseStatusError;

	fn try_from(raw: String) -> Result<Self, Self::Error> {
		raw.parse()
	}
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown call status {raw:?}.")]
pub struct ParseStatusError {
	pub raw: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
	Apply,
	Unchanged,
	Rejected,
}
