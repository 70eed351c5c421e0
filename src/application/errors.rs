//! # Failures and the Error Reporter
//!
//! Every way an invocation can fail, grouped by where it is resolved, and the
//! fixed table that turns a failure into the text the invoker sees.

use std::time::Duration;

use thiserror::Error;

use crate::domain::types::Permission;
use crate::strings::messages;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GuardFailure {
    #[error("command is restricted to bot owners")]
    OwnerOnly,
    #[error("invoker lacks the {} permission", .0.as_str())]
    MissingPermission(Permission),
    #[error("bot lacks the {} permission", .0.as_str())]
    BotMissingPermission(Permission),
    #[error("command cannot run outside a guild")]
    GuildOnly,
    #[error("cooldown active for another {remaining:?}")]
    CooldownActive { remaining: Duration },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizationFailure {
    #[error("unknown command `{0}`")]
    UnknownCommand(String),
    #[error("missing required argument `{0}`")]
    MissingArgument(String),
    #[error("could not resolve `{raw}` for argument `{name}`")]
    UnresolvedArgument { name: String, raw: String },
    #[error("malformed value `{raw}` for argument `{name}`")]
    BadArgument { name: String, raw: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SessionFailure {
    #[error("a session is already active for this participant and channel")]
    AlreadyActive,
    #[error("session timed out")]
    TimedOut,
    #[error("session cancelled")]
    Cancelled,
    #[error("session aborted by an unrecognised answer")]
    ValidationRejected,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CollaboratorFailure {
    /// Carries the text already worded for the invoker.
    #[error("{0}")]
    NotFound(String),
    #[error("upstream error: {0}")]
    Upstream(String),
}

/// Anything a handler, guard or normalizer can fail with.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error(transparent)]
    Guard(#[from] GuardFailure),
    #[error(transparent)]
    Normalization(#[from] NormalizationFailure),
    #[error(transparent)]
    Session(#[from] SessionFailure),
    #[error(transparent)]
    Collaborator(#[from] CollaboratorFailure),
    #[error(transparent)]
    Unclassified(#[from] anyhow::Error),
}

impl CommandError {
    /// Wraps a platform adapter error, which carries no kind of its own.
    pub fn platform(message: impl Into<String>) -> Self {
        Self::Unclassified(anyhow::anyhow!(message.into()))
    }
}

pub type CommandResult = Result<(), CommandError>;

/// Maps a failure to the reply the invoker should see.
///
/// `None` means nothing is sent: either the session engine already sent its own
/// notice, or the failure is unclassified and only logged.
pub fn report(error: &CommandError) -> Option<String> {
    match error {
        CommandError::Guard(failure) => Some(match failure {
            GuardFailure::OwnerOnly => messages::OWNER_ONLY.to_string(),
            GuardFailure::MissingPermission(_) => messages::MISSING_PERMISSION.to_string(),
            GuardFailure::BotMissingPermission(_) => messages::BOT_MISSING_PERMISSION.to_string(),
            GuardFailure::GuildOnly => messages::GUILD_ONLY.to_string(),
            GuardFailure::CooldownActive { remaining } => {
                messages::cooldown_active(remaining.as_secs_f64())
            }
        }),
        CommandError::Normalization(failure) => Some(match failure {
            NormalizationFailure::UnknownCommand(_) => messages::UNKNOWN_COMMAND.to_string(),
            NormalizationFailure::MissingArgument(_) => messages::MISSING_ARGUMENT.to_string(),
            NormalizationFailure::UnresolvedArgument { .. }
            | NormalizationFailure::BadArgument { .. } => messages::BAD_ARGUMENT.to_string(),
        }),
        CommandError::Session(failure) => {
            tracing::debug!("Session ended without artifact: {}", failure);
            None
        }
        CommandError::Collaborator(CollaboratorFailure::NotFound(text)) => Some(text.clone()),
        CommandError::Collaborator(CollaboratorFailure::Upstream(detail)) => {
            tracing::error!("Upstream API failure: {}", detail);
            None
        }
        CommandError::Unclassified(e) => {
            tracing::error!("Unhandled command error: {:#}", e);
            None
        }
    }
}
