//! # Command Context
//!
//! Everything a handler can reach: the room it replies to and the process-wide
//! application context (configuration, registry, state and API clients).

use std::sync::Arc;

use crate::application::registry::CommandRegistry;
use crate::application::state::BotState;
use crate::domain::config::AppConfig;
use crate::domain::traits::{ApiProvider, ChatProvider};

/// Process-scoped services, created once in `main`.
pub struct AppContext {
    pub config: AppConfig,
    pub registry: CommandRegistry,
    pub state: BotState,
    pub apis: Arc<dyn ApiProvider>,
}

impl AppContext {
    pub fn new(config: AppConfig, registry: CommandRegistry, apis: Arc<dyn ApiProvider>) -> Self {
        let state = BotState::new(&config);
        Self {
            config,
            registry,
            state,
            apis,
        }
    }
}

/// Per-event handle passed to guards and handlers.
#[derive(Clone)]
pub struct CommandContext {
    pub chat: Arc<dyn ChatProvider>,
    pub app: Arc<AppContext>,
}

impl CommandContext {
    pub fn new(chat: Arc<dyn ChatProvider>, app: Arc<AppContext>) -> Self {
        Self { chat, app }
    }
}
