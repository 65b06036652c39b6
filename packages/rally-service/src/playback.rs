use uuid::Uuid;

use crate::{RallyService, Result};
use rally_providers::twiml;

/// Voice document the provider fetches when a call connects.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Playback {
	pub content_type: &'static str,
	pub body: String,
}

impl RallyService {
	/// Plays the message's recording, or apologizes when the message is unknown. The provider
	/// calls this without tenant context, so the lookup is by id alone.
	pub async fn playback(&self, message_id: Option<Uuid>) -> Result<Playback> {
		let message = match message_id {
			Some(message_id) => self.store.message_by_id(message_id).await?,
			None => None,
		};
		let body = match message {
			Some(message) => twiml::play(&message.audio_url),
			None => {
				tracing::warn!(?message_id, "Playback requested for an unknown message.");

				twiml::say(twiml::MISSING_MESSAGE_TEXT)
			},
		};

		Ok(Playback { content_type: twiml::CONTENT_TYPE, body })
	}
}
