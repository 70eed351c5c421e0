//! # Interactive Session Engine
//!
//! Runs multi-step wizards that collect sequential replies from one participant in
//! one channel. Each step waits for the next message with its own timeout, runs it
//! through the step's validator and either advances, re-prompts or aborts.
//!
//! The router feeds replies in through [`SessionEngine::deliver`]; a running wizard
//! owns the receiving end of a per-session channel. At most one session exists per
//! (participant, channel) key.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use tokio::sync::{mpsc, watch};

use crate::application::errors::SessionFailure;
use crate::domain::traits::ChatProvider;
use crate::strings::messages;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionKey {
    pub participant_id: String,
    pub channel_id: String,
}

impl SessionKey {
    pub fn new(participant_id: impl Into<String>, channel_id: impl Into<String>) -> Self {
        Self {
            participant_id: participant_id.into(),
            channel_id: channel_id.into(),
        }
    }
}

/// A reply routed to a session.
#[derive(Debug, Clone)]
pub struct SessionInput {
    pub message_id: String,
    pub body: String,
}

/// Verdict of a step validator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validation {
    Accept,
    /// Stay on the same step; `notice` is sent as the re-prompt.
    Reject { notice: String },
    /// End the whole session without an artifact.
    Abort { notice: String },
}

pub struct WizardStep {
    /// Builds the prompt from the answers collected so far.
    pub prompt: fn(&[String]) -> String,
    pub validate: fn(&str) -> Validation,
}

pub struct WizardSpec {
    pub name: &'static str,
    pub steps: Vec<WizardStep>,
    pub step_timeout: Duration,
    pub timeout_notice: String,
    pub cancel_notice: String,
}

/// Accepts any non-blank reply.
pub fn free_text(answer: &str) -> Validation {
    if answer.trim().is_empty() {
        Validation::Reject {
            notice: messages::SESSION_EMPTY_ANSWER.to_string(),
        }
    } else {
        Validation::Accept
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    AwaitingStep(usize),
    Completed,
    Cancelled,
    TimedOut,
}

/// Transient state of one running wizard.
#[derive(Debug)]
pub struct Session {
    pub key: SessionKey,
    pub answers: Vec<String>,
    pub state: SessionState,
    pub step_timeout: Duration,
    /// Ids of every prompt and reply exchanged, oldest first.
    pub transcript: Vec<String>,
}

impl Session {
    fn new(key: SessionKey, step_timeout: Duration) -> Self {
        Self {
            key,
            answers: Vec::new(),
            state: SessionState::AwaitingStep(0),
            step_timeout,
            transcript: Vec::new(),
        }
    }

    fn accept(&mut self, answer: String, step_count: usize) {
        if let SessionState::AwaitingStep(index) = self.state {
            self.answers.push(answer);
            self.state = if index + 1 >= step_count {
                SessionState::Completed
            } else {
                SessionState::AwaitingStep(index + 1)
            };
        }
    }

    fn time_out(&mut self) {
        self.answers.clear();
        self.state = SessionState::TimedOut;
    }

    fn cancel(&mut self) {
        self.answers.clear();
        self.state = SessionState::Cancelled;
    }
}

/// What a completed wizard hands back to its command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedSession {
    pub answers: Vec<String>,
    pub transcript: Vec<String>,
}

/// Removes the session's entry when the wizard finishes, however it finishes.
struct Registration<'a> {
    engine: &'a SessionEngine,
    key: SessionKey,
    inbox: mpsc::UnboundedReceiver<SessionInput>,
}

impl Drop for Registration<'_> {
    fn drop(&mut self) {
        self.engine.lock_active().remove(&self.key);
    }
}

/// Counts a wizard as running until its `run` call returns.
struct Running<'a>(&'a watch::Sender<usize>);

impl<'a> Running<'a> {
    fn start(count: &'a watch::Sender<usize>) -> Self {
        count.send_modify(|n| *n += 1);
        Self(count)
    }
}

impl Drop for Running<'_> {
    fn drop(&mut self) {
        self.0.send_modify(|n| *n = n.saturating_sub(1));
    }
}

enum Wake {
    Input(SessionInput),
    Timeout,
    Shutdown,
    Closed,
}

/// Resolves once shutdown has been signalled.
async fn stopped(shutdown: &mut watch::Receiver<bool>) {
    while !*shutdown.borrow_and_update() {
        if shutdown.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

pub struct SessionEngine {
    active: Mutex<HashMap<SessionKey, mpsc::UnboundedSender<SessionInput>>>,
    cancel_token: String,
    shutdown: watch::Sender<bool>,
    running: watch::Sender<usize>,
}

impl SessionEngine {
    pub fn new(cancel_token: impl Into<String>) -> Self {
        let (shutdown, _) = watch::channel(false);
        let (running, _) = watch::channel(0);
        Self {
            active: Mutex::new(HashMap::new()),
            cancel_token: cancel_token.into(),
            shutdown,
            running,
        }
    }

    fn lock_active(
        &self,
    ) -> std::sync::MutexGuard<'_, HashMap<SessionKey, mpsc::UnboundedSender<SessionInput>>> {
        self.active.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Atomically claims `key`, failing if a session already holds it.
    fn begin(&self, key: SessionKey) -> Result<Registration<'_>, SessionFailure> {
        let mut active = self.lock_active();
        if active.contains_key(&key) {
            return Err(SessionFailure::AlreadyActive);
        }
        let (tx, inbox) = mpsc::unbounded_channel();
        active.insert(key.clone(), tx);
        Ok(Registration {
            engine: self,
            key,
            inbox,
        })
    }

    /// Hands a reply to the session owning `key`. Returns `false` if there is none.
    pub fn deliver(&self, key: &SessionKey, input: SessionInput) -> bool {
        match self.lock_active().get(key) {
            Some(tx) => tx.send(input).is_ok(),
            None => false,
        }
    }

    pub fn is_active(&self, key: &SessionKey) -> bool {
        self.lock_active().contains_key(key)
    }

    pub fn active_keys(&self) -> Vec<SessionKey> {
        self.lock_active().keys().cloned().collect()
    }

    /// Cancels every waiting session. Used on process shutdown.
    pub fn shutdown(&self) {
        self.shutdown.send_replace(true);
    }

    /// Resolves once no wizard is running, final notices included.
    pub async fn wait_idle(&self) {
        let mut running = self.running.subscribe();
        // The sender lives in `self`, so the channel cannot close here.
        let _ = running.wait_for(|count| *count == 0).await;
    }

    async fn notify(chat: &dyn ChatProvider, session: &mut Session, content: &str) {
        match chat.send_message(content).await {
            Ok(id) => session.transcript.push(id),
            Err(e) => tracing::warn!("Failed to send session message: {}", e),
        }
    }

    /// Runs `wizard` for `key` to completion, cancellation or timeout.
    ///
    /// Every notice (already active, timeout, cancellation, rejection) is sent from
    /// here; the caller only has to act on a completed session.
    pub async fn run(
        &self,
        chat: &dyn ChatProvider,
        key: SessionKey,
        wizard: &WizardSpec,
    ) -> Result<CompletedSession, SessionFailure> {
        let _running = Running::start(&self.running);
        let mut registration = match self.begin(key.clone()) {
            Ok(registration) => registration,
            Err(failure) => {
                if let Err(e) = chat.send_message(messages::SESSION_ALREADY_ACTIVE).await {
                    tracing::warn!("Failed to send session message: {}", e);
                }
                return Err(failure);
            }
        };
        let mut shutdown = self.shutdown.subscribe();
        let mut session = Session::new(key, wizard.step_timeout);
        let step_count = wizard.steps.len();
        tracing::info!(
            "Session '{}' started for {} in {}",
            wizard.name,
            session.key.participant_id,
            session.key.channel_id
        );

        let mut needs_prompt = true;
        while let SessionState::AwaitingStep(index) = session.state {
            let step = &wizard.steps[index];
            if needs_prompt {
                let prompt = (step.prompt)(&session.answers);
                Self::notify(chat, &mut session, &prompt).await;
            }

            let wake = tokio::select! {
                _ = stopped(&mut shutdown) => Wake::Shutdown,
                received = tokio::time::timeout(session.step_timeout, registration.inbox.recv()) => {
                    match received {
                        Ok(Some(input)) => Wake::Input(input),
                        Ok(None) => Wake::Closed,
                        Err(_) => Wake::Timeout,
                    }
                }
            };

            let input = match wake {
                Wake::Input(input) => input,
                Wake::Timeout => {
                    drop(registration);
                    session.time_out();
                    tracing::info!("Session '{}' timed out at step {}", wizard.name, index);
                    Self::notify(chat, &mut session, &wizard.timeout_notice).await;
                    return Err(SessionFailure::TimedOut);
                }
                Wake::Shutdown => {
                    drop(registration);
                    session.cancel();
                    tracing::info!("Session '{}' cancelled by shutdown", wizard.name);
                    Self::notify(chat, &mut session, &wizard.cancel_notice).await;
                    return Err(SessionFailure::Cancelled);
                }
                Wake::Closed => {
                    session.cancel();
                    tracing::info!("Session '{}' lost its inbox", wizard.name);
                    return Err(SessionFailure::Cancelled);
                }
            };

            session.transcript.push(input.message_id);
            let answer = input.body.trim();

            if answer.eq_ignore_ascii_case(&self.cancel_token) {
                drop(registration);
                session.cancel();
                tracing::info!("Session '{}' cancelled at step {}", wizard.name, index);
                Self::notify(chat, &mut session, &wizard.cancel_notice).await;
                return Err(SessionFailure::Cancelled);
            }

            match (step.validate)(answer) {
                Validation::Accept => {
                    session.accept(answer.to_string(), step_count);
                    needs_prompt = true;
                }
                Validation::Reject { notice } => {
                    Self::notify(chat, &mut session, &notice).await;
                    needs_prompt = false;
                }
                Validation::Abort { notice } => {
                    drop(registration);
                    session.cancel();
                    tracing::info!("Session '{}' aborted at step {}", wizard.name, index);
                    Self::notify(chat, &mut session, &notice).await;
                    return Err(SessionFailure::ValidationRejected);
                }
            }
        }

        tracing::info!("Session '{}' completed", wizard.name);
        drop(registration);
        Ok(CompletedSession {
            answers: session.answers,
            transcript: session.transcript,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::testing::MockChat;
    use std::sync::Arc;

    fn yes_no(answer: &str) -> Validation {
        match answer.to_lowercase().as_str() {
            "yes" | "no" => Validation::Accept,
            _ => Validation::Reject {
                notice: "yes or no please".into(),
            },
        }
    }

    fn strict(answer: &str) -> Validation {
        if answer == "ok" {
            Validation::Accept
        } else {
            Validation::Abort {
                notice: "aborting".into(),
            }
        }
    }

    fn wizard(last: fn(&str) -> Validation) -> WizardSpec {
        WizardSpec {
            name: "test",
            steps: vec![
                WizardStep {
                    prompt: |_| "first?".into(),
                    validate: free_text,
                },
                WizardStep {
                    prompt: |answers| format!("got {}, second?", answers[0]),
                    validate: last,
                },
            ],
            step_timeout: Duration::from_secs(60),
            timeout_notice: "timed out".into(),
            cancel_notice: "cancelled".into(),
        }
    }

    fn input(body: &str) -> SessionInput {
        SessionInput {
            message_id: format!("$reply-{body}"),
            body: body.into(),
        }
    }

    async fn wait_until_active(engine: &SessionEngine, key: &SessionKey) {
        while !engine.is_active(key) {
            tokio::task::yield_now().await;
        }
    }

    fn spawn_run(
        engine: &Arc<SessionEngine>,
        chat: &Arc<MockChat>,
        key: &SessionKey,
        last: fn(&str) -> Validation,
    ) -> tokio::task::JoinHandle<Result<CompletedSession, SessionFailure>> {
        let engine = engine.clone();
        let chat = chat.clone();
        let key = key.clone();
        tokio::spawn(async move { engine.run(chat.as_ref(), key, &wizard(last)).await })
    }

    #[tokio::test(start_paused = true)]
    async fn test_completes_with_answers_in_order() {
        let engine = Arc::new(SessionEngine::new("cancel"));
        let chat = Arc::new(MockChat::new());
        let key = SessionKey::new("@alice:example.org", "!room:example.org");

        let run = spawn_run(&engine, &chat, &key, yes_no);
        wait_until_active(&engine, &key).await;
        assert!(engine.deliver(&key, input("Title")));
        assert!(engine.deliver(&key, input("maybe")));
        assert!(engine.deliver(&key, input("yes")));

        let done = run.await.unwrap().unwrap();
        assert_eq!(done.answers, vec!["Title".to_string(), "yes".to_string()]);
        assert!(!engine.is_active(&key));
        assert_eq!(
            chat.texts(),
            vec!["first?", "got Title, second?", "yes or no please"]
        );
        // Prompts, notices and replies are all in the transcript.
        assert_eq!(done.transcript.len(), 6);
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_session_for_same_key_is_rejected() {
        let engine = Arc::new(SessionEngine::new("cancel"));
        let chat = Arc::new(MockChat::new());
        let key = SessionKey::new("@alice:example.org", "!room:example.org");

        let first = spawn_run(&engine, &chat, &key, yes_no);
        wait_until_active(&engine, &key).await;

        let second = engine.run(chat.as_ref(), key.clone(), &wizard(yes_no)).await;
        assert_eq!(second, Err(SessionFailure::AlreadyActive));
        assert!(chat.texts().contains(&messages::SESSION_ALREADY_ACTIVE.to_string()));

        // Another participant in the same channel is independent.
        let other = SessionKey::new("@bob:example.org", "!room:example.org");
        let third = spawn_run(&engine, &chat, &other, yes_no);
        wait_until_active(&engine, &other).await;
        engine.deliver(&other, input("B"));
        engine.deliver(&other, input("no"));
        assert_eq!(third.await.unwrap().unwrap().answers, vec!["B", "no"]);

        // The first session is still waiting on its own first step.
        assert!(engine.is_active(&key));
        engine.deliver(&key, input("A"));
        engine.deliver(&key, input("yes"));
        assert_eq!(first.await.unwrap().unwrap().answers, vec!["A", "yes"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_discards_answers() {
        let engine = Arc::new(SessionEngine::new("cancel"));
        let chat = Arc::new(MockChat::new());
        let key = SessionKey::new("@alice:example.org", "!room:example.org");

        let run = spawn_run(&engine, &chat, &key, yes_no);
        wait_until_active(&engine, &key).await;
        engine.deliver(&key, input("stale"));

        assert_eq!(run.await.unwrap(), Err(SessionFailure::TimedOut));
        assert!(!engine.is_active(&key));
        assert_eq!(chat.texts().last().map(String::as_str), Some("timed out"));

        // A fresh run starts from an empty answer set.
        let again = spawn_run(&engine, &chat, &key, yes_no);
        wait_until_active(&engine, &key).await;
        engine.deliver(&key, input("fresh"));
        engine.deliver(&key, input("no"));
        assert_eq!(again.await.unwrap().unwrap().answers, vec!["fresh", "no"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_token_ends_session() {
        let engine = Arc::new(SessionEngine::new("cancel"));
        let chat = Arc::new(MockChat::new());
        let key = SessionKey::new("@alice:example.org", "!room:example.org");

        let run = spawn_run(&engine, &chat, &key, yes_no);
        wait_until_active(&engine, &key).await;
        engine.deliver(&key, input("Title"));
        engine.deliver(&key, input("CANCEL"));

        assert_eq!(run.await.unwrap(), Err(SessionFailure::Cancelled));
        assert_eq!(chat.texts().last().map(String::as_str), Some("cancelled"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_abort_validation_cancels() {
        let engine = Arc::new(SessionEngine::new("cancel"));
        let chat = Arc::new(MockChat::new());
        let key = SessionKey::new("@alice:example.org", "!room:example.org");

        let run = spawn_run(&engine, &chat, &key, strict);
        wait_until_active(&engine, &key).await;
        engine.deliver(&key, input("Title"));
        engine.deliver(&key, input("maybe"));

        assert_eq!(run.await.unwrap(), Err(SessionFailure::ValidationRejected));
        assert_eq!(chat.texts().last().map(String::as_str), Some("aborting"));
        assert!(!engine.is_active(&key));
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_cancels_waiting_sessions() {
        let engine = Arc::new(SessionEngine::new("cancel"));
        let chat = Arc::new(MockChat::new());
        let key = SessionKey::new("@alice:example.org", "!room:example.org");

        let run = spawn_run(&engine, &chat, &key, yes_no);
        wait_until_active(&engine, &key).await;
        engine.shutdown();

        assert_eq!(run.await.unwrap(), Err(SessionFailure::Cancelled));
        assert!(engine.active_keys().is_empty());
        assert_eq!(chat.texts().last().map(String::as_str), Some("cancelled"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_idle_covers_the_final_notice() {
        let engine = Arc::new(SessionEngine::new("cancel"));
        let chat = Arc::new(MockChat::new());
        let key = SessionKey::new("@alice:example.org", "!room:example.org");

        let run = spawn_run(&engine, &chat, &key, yes_no);
        wait_until_active(&engine, &key).await;
        engine.shutdown();

        tokio::time::timeout(Duration::from_secs(1), engine.wait_idle())
            .await
            .unwrap();
        assert_eq!(chat.texts().last().map(String::as_str), Some("cancelled"));
        assert_eq!(run.await.unwrap(), Err(SessionFailure::Cancelled));

        // Nothing running resolves at once.
        engine.wait_idle().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_key_is_released_before_final_notice() {
        let engine = Arc::new(SessionEngine::new("cancel"));
        let key = SessionKey::new("@alice:example.org", "!room:example.org");
        let seen: Arc<std::sync::Mutex<Vec<(String, bool)>>> = Arc::default();
        let chat = {
            let engine = engine.clone();
            let key = key.clone();
            let seen = seen.clone();
            Arc::new(MockChat::new().on_send(move |content| {
                seen.lock().unwrap().push((content.to_string(), engine.is_active(&key)));
            }))
        };

        let run = spawn_run(&engine, &chat, &key, yes_no);
        assert_eq!(run.await.unwrap(), Err(SessionFailure::TimedOut));
        let run = spawn_run(&engine, &chat, &key, yes_no);
        wait_until_active(&engine, &key).await;
        engine.deliver(&key, input("cancel"));
        assert_eq!(run.await.unwrap(), Err(SessionFailure::Cancelled));
        let run = spawn_run(&engine, &chat, &key, strict);
        wait_until_active(&engine, &key).await;
        engine.deliver(&key, input("Title"));
        engine.deliver(&key, input("maybe"));
        assert_eq!(run.await.unwrap(), Err(SessionFailure::ValidationRejected));

        let seen = seen.lock().unwrap();
        for notice in ["timed out", "cancelled", "aborting"] {
            assert!(seen.contains(&(notice.to_string(), false)), "{notice}: {seen:?}");
        }
        // Prompts go out while the key is still held.
        assert!(seen.contains(&("first?".to_string(), true)));
    }

    #[test]
    fn test_deliver_without_session() {
        let engine = SessionEngine::new("cancel");
        let key = SessionKey::new("@alice:example.org", "!room:example.org");
        assert!(!engine.deliver(&key, input("hello")));
    }
}
