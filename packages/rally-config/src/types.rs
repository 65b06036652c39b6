use serde::Deserialize;

pub const DEFAULT_POOL_SIZE: usize = 10;
pub const DEFAULT_TELEPHONY_TIMEOUT_MS: u64 = 10_000;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	pub telephony: Telephony,
	#[serde(default)]
	pub dispatch: Dispatch,
	#[serde(default)]
	pub security: Security,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Service {
	pub http_bind: String,
	pub log_level: String,
	/// Externally reachable base URL the provider uses for playback and status callbacks.
	pub public_base_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Storage {
	pub postgres: Postgres,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Telephony {
	pub provider_id: String,
	pub api_base: String,
	pub account_sid: String,
	pub auth_token: String,
	/// Caller id presented on every outbound call, in E.164.
	pub from_number: String,
	#[serde(default = "default_telephony_timeout_ms")]
	pub timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Dispatch {
	/// Upper bound on outbound calls in flight at once.
	#[serde(default = "default_pool_size")]
	pub pool_size: usize,
}
impl Default for Dispatch {
	fn default() -> Self {
		Self { pool_size: DEFAULT_POOL_SIZE }
	}
}

#[derive(Debug, Clone, Deserialize)]
pub struct Security {
	#[serde(default = "default_true")]
	pub bind_localhost_only: bool,
	/// Bearer token required on tenant routes. Unset disables the check.
	pub api_auth_token: Option<String>,
}
impl Default for Security {
	fn default() -> Self {
		Self { bind_localhost_only: true, api_auth_token: None }
	}
}

fn default_pool_size() -> usize {
	DEFAULT_POOL_SIZE
}

fn default_telephony_timeout_ms() -> u64 {
	DEFAULT_TELEPHONY_TIMEOUT_MS
}

fn default_true() -> bool {
	true
}
