//! Phone number normalization for outbound dialing.
//!
//! Roster numbers arrive in whatever shape people typed them. Dialing needs E.164, so North
//! American numbers written with punctuation are folded into `+1XXXXXXXXXX` and numbers already
//! carrying an international prefix are checked and kept.

const MIN_E164_DIGITS: usize = 8;
const MAX_E164_DIGITS: usize = 15;

/// Returns the E.164 form of `raw`, or `None` when it cannot be dialed.
pub fn normalize(raw: &str) -> Option<String> {
	let trimmed = raw.trim();

	if trimmed.starts_with('+') {
		let digits: String = trimmed.chars().filter(char::is_ascii_digit).collect();
		let candidate = format!("+{digits}");

		return is_e164(&candidate).then_some(candidate);
	}

	let digits: String = trimmed.chars().filter(char::is_ascii_digit).collect();
	let national = match digits.len() {
		10 => digits.as_str(),
		11 if digits.starts_with('1') => &digits[1..],
		_ => return None,
	};

	Some(format!("+1{national}"))
}

pub fn is_e164(number: &str) -> bool {
	let Some(digits) = number.strip_prefix('+') else {
		return false;
	};

	(MIN_E164_DIGITS..=MAX_E164_DIGITS).contains(&digits.len())
		&& digits.bytes().all(|byte| byte.is_ascii_digit())
		&& !digits.starts_with('0')
}
