pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	#[error("Not found: {message}")]
	NotFound { message: String },
	#[error("Tenant mismatch: {message}")]
	TenantMismatch { message: String },
	#[error("Storage error: {message}")]
	Storage { message: String },
}

impl From<rally_storage::Error> for Error {
	fn from(err: rally_storage::Error) -> Self {
		match err {
			rally_storage::Error::Sqlx(inner) => Self::Storage { message: inner.to_string() },
			rally_storage::Error::InvalidArgument(message) => Self::Storage { message },
		}
	}
}
