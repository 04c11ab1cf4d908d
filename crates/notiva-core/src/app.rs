//! App state type

use std::sync::Arc;

use crate::config::Config;
use crate::token_cache::TokenCache;

use notiva_types::device_adapter::DeviceAdapter;

pub struct AppState {
	pub config: Config,
	pub device_adapter: Arc<dyn DeviceAdapter>,
	pub token_cache: Arc<TokenCache>,
}

impl AppState {
	pub fn new(config: Config, device_adapter: Arc<dyn DeviceAdapter>) -> App {
		Arc::new(AppState { config, device_adapter, token_cache: Arc::new(TokenCache::new()) })
	}
}

pub type App = Arc<AppState>;

// vim: ts=4
