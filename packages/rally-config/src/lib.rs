mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Config, DEFAULT_POOL_SIZE, DEFAULT_TELEPHONY_TIMEOUT_MS, Dispatch, Postgres, Security, Service,
	Storage, Telephony,
};

use std::{fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	for (label, value) in [
		("service.http_bind", &cfg.service.http_bind),
		("service.log_level", &cfg.service.log_level),
		("storage.postgres.dsn", &cfg.storage.postgres.dsn),
		("telephony.provider_id", &cfg.telephony.provider_id),
		("telephony.account_sid", &cfg.telephony.account_sid),
		("telephony.auth_token", &cfg.telephony.auth_token),
	] {
		if value.trim().is_empty() {
			return Err(Error::Validation { message: format!("{label} must be non-empty.") });
		}
	}

	for (label, value) in [
		("service.public_base_url", &cfg.service.public_base_url),
		("telephony.api_base", &cfg.telephony.api_base),
	] {
		if !(value.starts_with("http://") || value.starts_with("https://")) {
			return Err(Error::Validation {
				message: format!("{label} must be an http:// or https:// URL."),
			});
		}
	}

	if !is_e164(&cfg.telephony.from_number) {
		return Err(Error::Validation {
			message: "telephony.from_number must be an E.164 number such as +15550100000."
				.to_string(),
		});
	}
	if cfg.telephony.timeout_ms == 0 {
		return Err(Error::Validation {
			message: "telephony.timeout_ms must be greater than zero.".to_string(),
		});
	}
	if cfg.storage.postgres.pool_max_conns == 0 {
		return Err(Error::Validation {
			message: "storage.postgres.pool_max_conns must be greater than zero.".to_string(),
		});
	}
	if cfg.dispatch.pool_size == 0 {
		return Err(Error::Validation {
			message: "dispatch.pool_size must be greater than zero.".to_string(),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	if cfg.security.api_auth_token.as_deref().map(|token| token.trim().is_empty()).unwrap_or(false)
	{
		cfg.security.api_auth_token = None;
	}

	cfg.service.public_base_url = cfg.service.public_base_url.trim().trim_end_matches('/').to_string();
	cfg.telephony.api_base = cfg.telephony.api_base.trim().trim_end_matches('/').to_string();
	cfg.telephony.from_number = cfg.telephony.from_number.trim().to_string();
}

// Mirrors `rally_domain::phone::is_e164`; config stays free of domain dependencies.
fn is_e164(number: &str) -> bool {
	let Some(digits) = number.strip_prefix('+') else {
		return false;
	};

	(8..=15).contains(&digits.len())
		&& digits.bytes().all(|byte| byte.is_ascii_digit())
		&& !digits.starts_with('0')
}
