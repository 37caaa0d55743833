use std::sync::Arc;

use crate::config::Config;
use crate::database::{RedisStore, init_redis};
use crate::store::Store;

pub type SharedState = Arc<State>;

pub struct State {
    pub config: Config,
    pub store: Arc<dyn Store>,
}

impl State {
    pub async fn new() -> SharedState {
        let config = Config::load();

        let connection = init_redis(&config.redis_url).await;
        let store = Arc::new(RedisStore::new(connection));

        Arc::new(Self { config, store })
    }

    /// State over an arbitrary store, for tests and local runs without Redis.
    pub fn with_store(config: Config, store: Arc<dyn Store>) -> SharedState {
        Arc::new(Self { config, store })
    }
}
