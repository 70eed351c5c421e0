//! # Paginated Output
//!
//! Splits long text into fixed-size pages and keeps the navigation state of every
//! paginated message the bot has sent.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;

use crate::domain::traits::ChatProvider;
use crate::strings::messages;

pub const BACK_KEY: &str = "◀️";
pub const FORWARD_KEY: &str = "▶️";
pub const STOP_KEY: &str = "⏹️";

/// Slices `text` into pages of at most `chunk_size` characters.
pub fn paginate(text: &str, chunk_size: usize) -> Vec<String> {
    let chunk_size = chunk_size.max(1);
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(chunk_size)
        .map(|chunk| chunk.iter().collect())
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    Back,
    Forward,
    Stop,
}

impl Navigation {
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            BACK_KEY => Some(Navigation::Back),
            FORWARD_KEY => Some(Navigation::Forward),
            STOP_KEY => Some(Navigation::Stop),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PaginatedResult {
    pages: Vec<String>,
    current: usize,
    owner_id: String,
    last_activity: Instant,
}

impl PaginatedResult {
    pub fn new(pages: Vec<String>, owner_id: impl Into<String>, now: Instant) -> Self {
        Self {
            pages,
            current: 0,
            owner_id: owner_id.into(),
            last_activity: now,
        }
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Returns `false` when already on the last page.
    pub fn forward(&mut self) -> bool {
        if self.current + 1 < self.pages.len() {
            self.current += 1;
            true
        } else {
            false
        }
    }

    /// Returns `false` when already on the first page.
    pub fn back(&mut self) -> bool {
        if self.current > 0 {
            self.current -= 1;
            true
        } else {
            false
        }
    }

    pub fn render(&self) -> String {
        let page = self.pages.get(self.current).map(String::as_str).unwrap_or("");
        if self.pages.len() > 1 {
            messages::paginated_page(page, self.current + 1, self.pages.len())
        } else {
            messages::code_block(page)
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum NavigationOutcome {
    /// Unknown message, foreign sender or expired controls.
    Ignored,
    /// Boundary reached, nothing to redraw.
    Unchanged,
    Render(String),
    Stopped,
}

/// Live paginated messages, keyed by message id.
#[derive(Debug)]
pub struct PageRegistry {
    entries: HashMap<String, PaginatedResult>,
    idle_timeout: Option<Duration>,
}

impl PageRegistry {
    pub fn new(idle_timeout: Option<Duration>) -> Self {
        Self {
            entries: HashMap::new(),
            idle_timeout,
        }
    }

    pub fn insert(&mut self, message_id: impl Into<String>, result: PaginatedResult) {
        self.entries.insert(message_id.into(), result);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn expired(&self, result: &PaginatedResult, now: Instant) -> bool {
        self.idle_timeout
            .is_some_and(|timeout| now.saturating_duration_since(result.last_activity) >= timeout)
    }

    /// Drops entries whose controls went inert.
    pub fn prune(&mut self, now: Instant) {
        let Some(timeout) = self.idle_timeout else {
            return;
        };
        self.entries
            .retain(|_, result| now.saturating_duration_since(result.last_activity) < timeout);
    }

    pub fn navigate(
        &mut self,
        message_id: &str,
        sender_id: &str,
        navigation: Navigation,
        now: Instant,
    ) -> NavigationOutcome {
        let expired = match self.entries.get(message_id) {
            None => return NavigationOutcome::Ignored,
            Some(result) if result.owner_id != sender_id => return NavigationOutcome::Ignored,
            Some(result) => self.expired(result, now),
        };
        if expired {
            self.entries.remove(message_id);
            return NavigationOutcome::Ignored;
        }
        if navigation == Navigation::Stop {
            self.entries.remove(message_id);
            return NavigationOutcome::Stopped;
        }

        let Some(result) = self.entries.get_mut(message_id) else {
            return NavigationOutcome::Ignored;
        };
        result.last_activity = now;
        let moved = match navigation {
            Navigation::Back => result.back(),
            Navigation::Forward => result.forward(),
            Navigation::Stop => false,
        };
        if moved {
            NavigationOutcome::Render(result.render())
        } else {
            NavigationOutcome::Unchanged
        }
    }
}

/// Sends `text` as one message, or as the first of several navigable pages.
pub async fn send_paginated(
    chat: &dyn ChatProvider,
    pages: &Mutex<PageRegistry>,
    owner_id: &str,
    text: &str,
    chunk_size: usize,
) -> Result<(), String> {
    let chunks = paginate(text, chunk_size);
    if chunks.is_empty() {
        chat.send_message(messages::NOTHING_TO_SHOW).await?;
        return Ok(());
    }

    let now = Instant::now();
    let result = PaginatedResult::new(chunks, owner_id, now);
    let message_id = chat.send_message(&result.render()).await?;
    if result.page_count() == 1 {
        return Ok(());
    }

    for key in [BACK_KEY, FORWARD_KEY, STOP_KEY] {
        chat.add_reaction(&message_id, key).await?;
    }
    let mut registry = pages.lock().await;
    registry.prune(now);
    registry.insert(message_id, result);
    Ok(())
}
