#![recursion_limit = "256"]
//! # Main Entry Point
//!
//! Wires the layers together:
//! - Domain: Configuration and Types
//! - Infrastructure: Matrix adapter, HTTP APIs, slash parsing
//! - Application: Registry, Router, Dispatcher, Sessions, Pagination
//! - Interface: Command Handlers
//!

mod application;
mod domain;
mod infrastructure;
mod interface;
mod strings;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use clap::Parser;
use matrix_sdk::{
    Client,
    config::SyncSettings,
    room::Room,
    ruma::{
        MilliSecondsSinceUnixEpoch,
        events::{
            reaction::SyncReactionEvent,
            room::{
                member::{MembershipState, StrippedRoomMemberEvent},
                message::{MessageType, SyncRoomMessageEvent},
            },
        },
    },
};

use crate::application::context::AppContext;
use crate::application::normalizer::Trigger;
use crate::application::router::CommandRouter;
use crate::domain::config::AppConfig;
use crate::domain::traits::ChatProvider;
use crate::domain::types::{IncomingMessage, Origin, Participant, ReactionEvent};
use crate::infrastructure::apis::HttpApis;
use crate::infrastructure::matrix::MatrixService;
use crate::interface::commands::build_registry;
use crate::strings::logs;

/// Matrix multipurpose bot.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Path to the YAML configuration file.
    #[arg(long, default_value = "data/config.yaml")]
    config: PathBuf,
}

const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

fn is_stale(ts: MilliSecondsSinceUnixEpoch, start_time: SystemTime) -> bool {
    let event_time = UNIX_EPOCH + Duration::from_millis(ts.get().into());
    event_time < start_time
}

/// Builds the sender identity, falling back to the bare id when the member list lags.
async fn sender_participant(chat: &MatrixService, sender: &str) -> Participant {
    match chat.resolve_member(sender).await {
        Ok(Some(participant)) => participant,
        _ => Participant::new(sender, sender),
    }
}

async fn origin_of(room: &Room) -> Origin {
    let direct = room.is_direct().await.unwrap_or(false);
    let channel_id = room.room_id().to_string();
    Origin {
        guild_id: (!direct).then(|| channel_id.clone()),
        channel_id,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 1. Load Configuration
    let config = AppConfig::load(&cli.config)?;

    // 2. Logging Setup
    if !Path::new("data").exists() {
        fs::create_dir("data").context("Failed to create data directory")?;
    }

    // Clear previous session log
    let log_path = Path::new("data/session.log");
    if log_path.exists() {
        let _ = fs::remove_file(log_path);
    }

    let file_appender = tracing_appender::rolling::never("data", "session.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(
            "info,matrix_sdk=warn,matrix_sdk_base=warn,matrix_sdk_crypto=error,ruma=warn,hyper=warn,reqwest=warn",
        )
    });

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false);
    let console_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stdout);

    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(console_layer)
        .init();

    tracing::info!("{}", logs::config_loaded(&config.services.matrix.username));

    // 3. Application Components
    let registry = build_registry().context("Invalid command registry")?;
    tracing::info!("{}", logs::registry_ready(registry.len()));
    let apis = Arc::new(HttpApis::new(&config.apis)?);

    // 4. Matrix Setup
    let client = Client::builder()
        .homeserver_url(&config.services.matrix.homeserver)
        .build()
        .await?;

    client
        .matrix_auth()
        .login_username(
            &config.services.matrix.username,
            &config.services.matrix.password,
        )
        .send()
        .await?;

    tracing::info!("{}", logs::LOGIN_SUCCESS);

    if let Some(name) = &config.services.matrix.display_name {
        tracing::info!("{}", logs::setting_display_name(name));
        if let Err(e) = client.account().set_display_name(Some(name.as_str())).await {
            tracing::warn!("{}", logs::set_display_name_fail(&e.to_string()));
        }
    }

    let mut mentions = Vec::new();
    if let Some(user_id) = client.user_id() {
        mentions.push(user_id.to_string());
    }
    if let Some(name) = &config.services.matrix.display_name {
        mentions.push(name.clone());
    }
    let trigger = Trigger::new(config.bot.prefix.clone(), mentions);

    let app = Arc::new(AppContext::new(config, registry, apis));
    let router = Arc::new(CommandRouter::new(app.clone(), trigger));

    // 5. Event Handlers
    let start_time = SystemTime::now();

    let message_router = router.clone();
    client.add_event_handler(move |ev: SyncRoomMessageEvent, room: Room| {
        let router = message_router.clone();
        async move {
            let Some(original_msg) = ev.as_original() else {
                return;
            };
            if is_stale(ev.origin_server_ts(), start_time) {
                return;
            }
            if original_msg.sender == room.own_user_id() {
                return;
            }
            let MessageType::Text(text_content) = &original_msg.content.msgtype else {
                return;
            };

            tracing::debug!(
                "Received message from {}: {}",
                original_msg.sender,
                text_content.body
            );
            let chat = MatrixService::new(room.clone());
            let message = IncomingMessage {
                message_id: original_msg.event_id.to_string(),
                sender: sender_participant(&chat, original_msg.sender.as_str()).await,
                origin: origin_of(&room).await,
                body: text_content.body.clone(),
            };

            // Handlers run in timeline order; hand over wizard replies before spawning.
            if router.deliver_reply(&message) {
                return;
            }
            // Wizards block on further messages from this handler, so run off the sync loop.
            tokio::spawn(async move {
                router.dispatch_message(Arc::new(chat), message).await;
            });
        }
    });

    let reaction_router = router.clone();
    client.add_event_handler(move |ev: SyncReactionEvent, room: Room| {
        let router = reaction_router.clone();
        async move {
            let Some(original) = ev.as_original() else {
                return;
            };
            if is_stale(ev.origin_server_ts(), start_time) || original.sender == room.own_user_id() {
                return;
            }

            let chat = MatrixService::new(room.clone());
            let event = ReactionEvent {
                message_id: original.content.relates_to.event_id.to_string(),
                key: original.content.relates_to.key.clone(),
                sender: sender_participant(&chat, original.sender.as_str()).await,
                origin: origin_of(&room).await,
            };
            tokio::spawn(async move {
                router.route_reaction(Arc::new(chat), event).await;
            });
        }
    });

    // Handle Invites
    client.add_event_handler(|ev: StrippedRoomMemberEvent, room: Room| async move {
        if ev.content.membership == MembershipState::Invite {
            tracing::info!("{}", logs::invite_received(room.room_id().as_str()));
            if let Err(e) = room.join().await {
                tracing::warn!("{}", logs::join_failed(room.room_id().as_str(), &e.to_string()));
            }
        }
    });

    // 6. Start Loops
    tracing::info!("{}", logs::SYNC_LOOP_START);
    let sync_client = client.clone();
    let sync_handle = tokio::spawn(async move {
        sync_client.sync(SyncSettings::default()).await
    });

    tokio::select! {
        result = sync_handle => match result {
            Ok(Err(e)) => tracing::error!("{}", logs::sync_loop_fail(&e.to_string())),
            Err(e) => tracing::error!("{}", logs::sync_loop_fail(&e.to_string())),
            Ok(Ok(())) => {}
        },
        signal = tokio::signal::ctrl_c() => {
            if let Err(e) = signal {
                tracing::error!("{}", logs::shutdown_fail(&e.to_string()));
            }
        }
    }

    tracing::info!("{}", logs::SHUTDOWN);
    app.state.sessions.shutdown();
    if tokio::time::timeout(SHUTDOWN_GRACE, app.state.sessions.wait_idle())
        .await
        .is_err()
    {
        tracing::warn!("{}", logs::SHUTDOWN_GRACE_EXPIRED);
    }
    Ok(())
}
