use crate::api::ApiClient;
use crate::config::Config;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub api: ApiClient,
    pub config: Config,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn new(config: Config) -> SharedState {
        let api = ApiClient::new(config.api_base_url.clone());
        Arc::new(Self { api, config })
    }
}
