use std::sync::Arc;

use crate::config::Config;
use crate::engine::{Engine, EngineApi};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub api: EngineApi,
}

impl AppState {
    pub fn new(config: Config, engine: Arc<Engine>) -> Self {
        Self {
            config: Arc::new(config),
            api: EngineApi::new(engine),
        }
    }

    pub fn engine(&self) -> &Arc<Engine> {
        self.api.engine()
    }
}
