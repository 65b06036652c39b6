//! Voice documents served back to the provider when a call connects.

pub const CONTENT_TYPE: &str = "text/xml";
pub const MISSING_MESSAGE_TEXT: &str = "No recording found. Goodbye.";

const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;

/// Plays the audio at `audio_url` to the callee.
pub fn play(audio_url: &str) -> String {
	format!("{XML_DECLARATION}<Response><Play>{}</Play></Response>", escape(audio_url))
}

/// Speaks `text` to the callee.
pub fn say(text: &str) -> String {
	format!("{XML_DECLARATION}<Response><Say>{}</Say></Response>", escape(text))
}

fn escape(raw: &str) -> String {
	let mut out = String::with_capacity(raw.len());

	for ch in raw.chars() {
		match ch {
			'&' => out.push_str("&amp;"),
			'<' => out.push_str("&lt;"),
			'>' => out.push_str("&gt;"),
			'"' => out.push_str("&quot;"),
			'\'' => out.push_str("&apos;"),
			_ => out.push(ch),
		}
	}

	out
}
