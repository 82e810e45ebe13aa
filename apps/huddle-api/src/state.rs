use std::sync::Arc;

use huddle_service::HuddleService;
use huddle_storage::db::Db;

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<HuddleService>,
	/// Bearer token required on `/search`, when configured.
	pub auth_token: Option<String>,
}
impl AppState {
	pub async fn new(config: huddle_config::Config) -> color_eyre::Result<Self> {
		let db = Db::connect(&config.storage.postgres).await?;

		db.ensure_schema().await?;

		let service = HuddleService::new(config, db)?;

		Ok(Self::from_service(service))
	}

	pub fn from_service(service: HuddleService) -> Self {
		let auth_token = service.cfg.security.api_auth_token.clone();

		Self { service: Arc::new(service), auth_token }
	}
}
