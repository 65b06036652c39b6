use std::sync::Arc;

use rally_service::RallyService;
use rally_storage::db::Db;

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<RallyService>,
	/// Bearer token tenant routes require, if any.
	pub api_auth_token: Option<Arc<str>>,
}
impl AppState {
	pub async fn new(config: rally_config::Config) -> color_eyre::Result<Self> {
		let db = Db::connect(&config.storage.postgres).await?;

		db.ensure_schema().await?;

		let service = RallyService::new(config, Arc::new(db));

		Ok(Self::from_service(service))
	}

	pub fn from_service(service: RallyService) -> Self {
		let api_auth_token = service.cfg.security.api_auth_token.as_deref().map(Arc::from);

		Self { service: Arc::new(service), api_auth_token }
	}
}
