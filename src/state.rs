use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::config::Config;
use crate::store::DocumentStore;

pub type AppState = Arc<State>;

pub struct State {
    pub config: Config,
    pub store: Arc<dyn DocumentStore>,
    /// Active admin session tokens, in-process only.
    pub sessions: RwLock<HashSet<String>>,
}

impl State {
    pub fn new(config: Config, store: Arc<dyn DocumentStore>) -> AppState {
        Arc::new(Self {
            config,
            store,
            sessions: RwLock::new(HashSet::new()),
        })
    }
}
