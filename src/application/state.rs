//! # Bot State
//!
//! Process-scoped, memory-only state: cooldown buckets, active wizard sessions and
//! live paginated messages. Created at startup and gone on restart.

use chrono::{DateTime, Local};
use tokio::sync::Mutex;

use crate::application::guards::CooldownTracker;
use crate::application::pagination::PageRegistry;
use crate::application::session::SessionEngine;
use crate::domain::config::AppConfig;

pub struct BotState {
    pub cooldowns: Mutex<CooldownTracker>,
    pub sessions: SessionEngine,
    pub pages: Mutex<PageRegistry>,
    pub started_at: DateTime<Local>,
}

impl BotState {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            cooldowns: Mutex::new(CooldownTracker::new()),
            sessions: SessionEngine::new(config.sessions.cancel_token.clone()),
            pages: Mutex::new(PageRegistry::new(config.pagination.idle_timeout())),
            started_at: Local::now(),
        }
    }
}
