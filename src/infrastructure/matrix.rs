//! # Matrix Service Adapter
//!
//! Implements the `ChatProvider` trait for the Matrix protocol using the `matrix_sdk`.
//! Embeds have no native Matrix equivalent and are rendered as markdown; link
//! buttons become a line of links below the embed.

use std::convert::TryFrom;
use std::time::{Duration, Instant};

use anyhow::Result;
use async_trait::async_trait;
use matrix_sdk::room::{Room, RoomMember};
use matrix_sdk::ruma::events::reaction::ReactionEventContent;
use matrix_sdk::ruma::events::relation::{Annotation, Replacement};
use matrix_sdk::ruma::events::room::message::{
    Relation, RoomMessageEventContent, RoomMessageEventContentWithoutRelation,
};
use matrix_sdk::ruma::{EventId, MxcUri, UserId};
use matrix_sdk::{Client, RoomMemberships};

use crate::domain::traits::ChatProvider;
use crate::domain::types::{Embed, GuildSummary, LinkButton, Participant, Permission};

const MATRIX_TO: &str = "https://matrix.to/#/";
const ADMIN_LEVEL: i64 = 100;
const MODERATOR_LEVEL: i64 = 50;

/// Renders an embed and its link buttons as a markdown message.
pub fn render_embed(embed: &Embed, buttons: &[LinkButton]) -> String {
    let mut lines = Vec::new();
    if let Some(author) = &embed.author {
        lines.push(format!("*{}*", author.name));
    }
    match (&embed.title, &embed.url) {
        (Some(title), Some(url)) => lines.push(format!("### [{}]({})", title, url)),
        (Some(title), None) => lines.push(format!("### {}", title)),
        _ => {}
    }
    if let Some(description) = &embed.description {
        lines.push(description.clone());
    }
    for field in &embed.fields {
        lines.push(format!("**{}**: {}", field.name, field.value));
    }
    if let Some(image) = embed.image.as_ref().or(embed.thumbnail.as_ref()) {
        lines.push(format!("![image]({})", image));
    }
    if let Some(footer) = &embed.footer {
        lines.push(format!("<sub>{}</sub>", footer));
    }
    if !buttons.is_empty() {
        let links: Vec<String> = buttons
            .iter()
            .map(|button| match &button.emoji {
                Some(emoji) => format!("{} [{}]({})", emoji, button.label, button.url),
                None => format!("[{}]({})", button.label, button.url),
            })
            .collect();
        lines.push(links.join(" | "));
    }
    lines.join("\n\n")
}

/// Role names derived from a power level, highest first.
fn roles_for_level(level: i64) -> Vec<String> {
    let mut roles = Vec::new();
    if level >= ADMIN_LEVEL {
        roles.push("Admin".to_string());
    }
    if level >= MODERATOR_LEVEL {
        roles.push("Moderator".to_string());
    }
    roles
}

/// Accepts `@user:server` and `https://matrix.to/#/@user:server`.
fn mention_target(raw: &str) -> &str {
    let raw = raw.trim();
    raw.strip_prefix(MATRIX_TO).unwrap_or(raw)
}

/// Public download URL for an `mxc://` URI on the bot's homeserver.
fn media_url(client: &Client, mxc: &MxcUri) -> Option<String> {
    let (server, media_id) = mxc.parts().ok()?;
    let homeserver = client.homeserver();
    Some(format!(
        "{}/_matrix/media/v3/download/{}/{}",
        homeserver.as_str().trim_end_matches('/'),
        server,
        media_id
    ))
}

#[derive(Clone)]
pub struct MatrixService {
    room: Room,
}

impl MatrixService {
    pub fn new(room: Room) -> Self {
        Self { room }
    }

    /// Helper to send markdown edits
    async fn internal_edit(&self, event_id: &str, new_content: &str) -> Result<()> {
        let event_id = <&EventId>::try_from(event_id)?;
        let mut content = RoomMessageEventContent::text_markdown(new_content);
        let replacement_content = RoomMessageEventContentWithoutRelation::from(content.clone());

        content.relates_to = Some(Relation::Replacement(Replacement::new(
            event_id.to_owned(),
            replacement_content,
        )));

        self.room.send(content).await?;
        Ok(())
    }

    async fn internal_react(&self, event_id: &str, key: &str) -> Result<()> {
        let event_id = <&EventId>::try_from(event_id)?;
        let content =
            ReactionEventContent::new(Annotation::new(event_id.to_owned(), key.to_string()));
        self.room.send(content).await?;
        Ok(())
    }

    fn participant(&self, member: &RoomMember) -> Participant {
        let client = self.room.client();
        Participant {
            id: member.user_id().to_string(),
            name: member.name().to_string(),
            avatar_url: member.avatar_url().and_then(|mxc| media_url(&client, mxc)),
            is_bot: client.user_id() == Some(member.user_id()),
        }
    }

    async fn power_level(&self, user_id: &UserId) -> i64 {
        let levels = self.room.users_with_power_levels().await;
        levels.get(user_id).copied().unwrap_or(0)
    }
}

#[async_trait]
impl ChatProvider for MatrixService {
    fn room_id(&self) -> String {
        self.room.room_id().as_str().to_string()
    }

    async fn send_message(&self, content: &str) -> Result<String, String> {
        tracing::info!("Bot sending message to {}: {}", self.room_id(), content);
        self.room
            .send(RoomMessageEventContent::text_markdown(content))
            .await
            .map(|resp| resp.event_id.to_string())
            .map_err(|e| e.to_string())
    }

    async fn send_embed(&self, embed: &Embed, buttons: &[LinkButton]) -> Result<String, String> {
        let rendered = render_embed(embed, buttons);
        tracing::info!(
            "Bot sending embed to {}: {}",
            self.room_id(),
            embed.title.as_deref().unwrap_or_default()
        );
        self.room
            .send(RoomMessageEventContent::text_markdown(rendered))
            .await
            .map(|resp| resp.event_id.to_string())
            .map_err(|e| e.to_string())
    }

    async fn edit_message(&self, message_id: &str, content: &str) -> Result<(), String> {
        self.internal_edit(message_id, content)
            .await
            .map_err(|e| e.to_string())
    }

    async fn add_reaction(&self, message_id: &str, key: &str) -> Result<(), String> {
        self.internal_react(message_id, key)
            .await
            .map_err(|e| e.to_string())
    }

    async fn redact(&self, message_ids: &[String]) -> Result<(), String> {
        let mut failures = Vec::new();
        for id in message_ids {
            let Ok(event_id) = <&EventId>::try_from(id.as_str()) else {
                failures.push(id.clone());
                continue;
            };
            if let Err(e) = self.room.redact(event_id, None, None).await {
                tracing::debug!("Failed to redact {}: {}", id, e);
                failures.push(id.clone());
            }
        }
        if failures.is_empty() {
            Ok(())
        } else {
            Err(format!("Could not redact {} event(s): {}", failures.len(), failures.join(", ")))
        }
    }

    async fn resolve_member(&self, raw: &str) -> Result<Option<Participant>, String> {
        let target = mention_target(raw);
        if let Ok(user_id) = <&UserId>::try_from(target) {
            let member = self
                .room
                .get_member(user_id)
                .await
                .map_err(|e| e.to_string())?;
            return Ok(member.map(|m| self.participant(&m)));
        }

        let members = self
            .room
            .members(RoomMemberships::JOIN)
            .await
            .map_err(|e| e.to_string())?;
        Ok(members
            .iter()
            .find(|m| {
                m.display_name()
                    .is_some_and(|name| name.eq_ignore_ascii_case(target))
                    || m.user_id().localpart().eq_ignore_ascii_case(target)
            })
            .map(|m| self.participant(m)))
    }

    async fn member_roles(&self, user_id: &str) -> Result<Vec<String>, String> {
        let user_id = <&UserId>::try_from(user_id).map_err(|e| e.to_string())?;
        Ok(roles_for_level(self.power_level(user_id).await))
    }

    async fn has_permission(&self, user_id: &str, permission: Permission) -> Result<bool, String> {
        let user_id = <&UserId>::try_from(user_id).map_err(|e| e.to_string())?;
        match permission {
            Permission::ManageMessages => self
                .room
                .power_levels()
                .await
                .map(|levels| levels.user_can_redact_event_of_other(user_id))
                .map_err(|e| e.to_string()),
        }
    }

    async fn own_identity(&self) -> Result<Participant, String> {
        let client = self.room.client();
        let user_id = client
            .user_id()
            .ok_or_else(|| "Client is not logged in".to_string())?
            .to_owned();
        let account = client.account();
        let name = account
            .get_display_name()
            .await
            .map_err(|e| e.to_string())?
            .unwrap_or_else(|| user_id.localpart().to_string());
        let avatar_url = account
            .get_avatar_url()
            .await
            .map_err(|e| e.to_string())?
            .and_then(|mxc| media_url(&client, &mxc));

        Ok(Participant {
            id: user_id.to_string(),
            name,
            avatar_url,
            is_bot: true,
        })
    }

    async fn latency(&self) -> Result<Duration, String> {
        let started = Instant::now();
        self.room
            .client()
            .whoami()
            .await
            .map_err(|e| e.to_string())?;
        Ok(started.elapsed())
    }

    async fn guild_summary(&self) -> Result<GuildSummary, String> {
        let client = self.room.client();
        Ok(GuildSummary {
            name: self.room.name().unwrap_or_else(|| self.room_id()),
            member_count: self.room.joined_members_count(),
            topic: self.room.topic().filter(|t| !t.is_empty()),
            icon_url: self.room.avatar_url().and_then(|mxc| media_url(&client, &mxc)),
        })
    }

    fn joined_room_count(&self) -> usize {
        self.room.client().joined_rooms().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_embed_layout() {
        let embed = Embed::new()
            .title("Weather in Paris")
            .description("Light rain")
            .field("Humidity", "80%", true)
            .thumbnail("https://openweathermap.org/img/wn/10d@2x.png")
            .footer("small print");
        let rendered = render_embed(&embed, &[]);
        assert_eq!(
            rendered,
            "### Weather in Paris\n\nLight rain\n\n**Humidity**: 80%\n\n\
             ![image](https://openweathermap.org/img/wn/10d@2x.png)\n\n<sub>small print</sub>"
        );
    }

    #[test]
    fn test_render_embed_links_and_buttons() {
        let embed = Embed::new()
            .title("left-pad")
            .url("https://www.npmjs.com/package/left-pad")
            .author("alice", None);
        let buttons = [
            LinkButton::new("Add bot", Some("➕"), "https://example.org/invite"),
            LinkButton::new("Join server", None, "https://example.org/join"),
        ];
        let rendered = render_embed(&embed, &buttons);
        assert!(rendered.starts_with("*alice*\n\n### [left-pad](https://www.npmjs.com/package/left-pad)"));
        assert!(rendered.ends_with(
            "➕ [Add bot](https://example.org/invite) | [Join server](https://example.org/join)"
        ));
    }

    #[test]
    fn test_roles_follow_power_levels() {
        assert_eq!(roles_for_level(100), vec!["Admin", "Moderator"]);
        assert_eq!(roles_for_level(50), vec!["Moderator"]);
        assert!(roles_for_level(0).is_empty());
    }

    #[test]
    fn test_mention_target() {
        assert_eq!(mention_target("https://matrix.to/#/@bob:example.org"), "@bob:example.org");
        assert_eq!(mention_target(" bob "), "bob");
    }
}
