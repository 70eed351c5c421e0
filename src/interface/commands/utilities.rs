//! # Utility Commands
//!
//! Thin wrappers over the HTTP collaborators (`github`, `pypi`, `npm`,
//! `weather`) plus the local `base64` and `poll` commands.

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

use crate::application::context::CommandContext;
use crate::application::errors::{
    CollaboratorFailure, CommandError, CommandResult, NormalizationFailure,
};
use crate::application::normalizer::Invocation;
use crate::application::registry::CommandHandler;
use crate::domain::traits::Lookup;
use crate::domain::types::Embed;
use crate::interface::commands::info::EMBED_COLOR;
use crate::strings::messages;

const NPM_COLOR: u32 = 0xD50000;
const FIELD_LIMIT: usize = 1024;
pub const POLL_NUMBERS: [&str; 10] = [
    "1️⃣", "2️⃣", "3️⃣", "4️⃣", "5️⃣", "6️⃣", "7️⃣", "8️⃣", "9️⃣", "🔟",
];

fn upstream(detail: String) -> CommandError {
    CollaboratorFailure::Upstream(detail).into()
}

fn not_found(text: impl Into<String>) -> CommandError {
    CollaboratorFailure::NotFound(text.into()).into()
}

/// Cuts `text` to fit an embed field, marking the cut with an ellipsis.
fn fit_field(text: &str) -> String {
    if text.chars().count() <= FIELD_LIMIT {
        text.to_string()
    } else {
        let head: String = text.chars().take(FIELD_LIMIT - 3).collect();
        format!("{head}...")
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn fahrenheit_to_celsius(fahrenheit: f64) -> f64 {
    let celsius = (fahrenheit - 32.0) * 5.0 / 9.0;
    (celsius * 100.0).round() / 100.0
}

pub struct Github;

#[async_trait]
impl CommandHandler for Github {
    async fn handle(&self, ctx: &CommandContext, invocation: &Invocation) -> CommandResult {
        let query = invocation.text("query").unwrap_or_default();
        let hit = match ctx.app.apis.search_repositories(query).await.map_err(upstream)? {
            Lookup::Found(hit) => hit,
            Lookup::NotFound(_) => return Err(not_found(messages::NO_REPOSITORIES)),
        };
        ctx.chat
            .send_message(&messages::first_repository(query, &hit.html_url))
            .await
            .map_err(CommandError::platform)?;
        Ok(())
    }
}

pub struct Pypi;

#[async_trait]
impl CommandHandler for Pypi {
    async fn handle(&self, ctx: &CommandContext, invocation: &Invocation) -> CommandResult {
        let name = invocation.text("package").unwrap_or_default();
        let package = match ctx.app.apis.pypi_package(name).await.map_err(upstream)? {
            Lookup::Found(package) => package,
            Lookup::NotFound(_) => return Err(not_found(messages::PYPI_NOT_FOUND)),
        };

        let mut embed = Embed::new()
            .title(&package.name)
            .url(&package.package_url)
            .color(EMBED_COLOR);
        if let Some(summary) = package.summary.as_deref().filter(|s| *s != "UNKNOWN") {
            embed = embed.description(summary);
        }
        if !package.description.trim().is_empty() {
            embed = embed.field("Description", fit_field(&package.description), false);
        }
        if let Some(home) = package.home_page.as_deref().filter(|h| !h.is_empty()) {
            embed = embed.field("Homepage", home, true);
        }
        embed = embed
            .field("Version", &package.version, true)
            .field("Author", &package.author, true)
            .field("License", &package.license, true);

        ctx.chat
            .send_embed(&embed, &[])
            .await
            .map_err(CommandError::platform)?;
        Ok(())
    }
}

pub struct Npm;

#[async_trait]
impl CommandHandler for Npm {
    async fn handle(&self, ctx: &CommandContext, invocation: &Invocation) -> CommandResult {
        let name = invocation.text("package").unwrap_or_default();
        let package = match ctx.app.apis.npm_package(name).await.map_err(upstream)? {
            Lookup::Found(package) => package,
            Lookup::NotFound(detail) => return Err(not_found(messages::npm_not_found(&detail))),
        };

        let mut embed = Embed::new()
            .title(&package.name)
            .description(&package.description)
            .url(messages::npm_package_url(name))
            .color(NPM_COLOR);
        if let Some(homepage) = &package.homepage {
            embed = embed.field("Homepage", homepage, false);
        }
        if let Some(author) = &package.author {
            embed = embed.field("Author", author, true);
        }
        if let Some(repository) = &package.repository {
            embed = embed.field("GitHub repository", repository, false);
        }
        if !package.maintainers.is_empty() {
            embed = embed.field("Repository maintainers", package.maintainers.join(", "), false);
        }
        if let Some(license) = &package.license {
            embed = embed.field("License", license, false);
        }

        ctx.chat
            .send_embed(&embed, &[])
            .await
            .map_err(CommandError::platform)?;
        Ok(())
    }
}

pub struct Base64;

impl Base64 {
    fn decode(code: &str) -> Result<String, NormalizationFailure> {
        let bad = || NormalizationFailure::BadArgument {
            name: "text".to_string(),
            raw: code.to_string(),
        };
        let bytes = STANDARD.decode(code.trim()).map_err(|_| bad())?;
        String::from_utf8(bytes).map_err(|_| bad())
    }
}

#[async_trait]
impl CommandHandler for Base64 {
    async fn handle(&self, ctx: &CommandContext, invocation: &Invocation) -> CommandResult {
        let mode = invocation.text("mode").map(str::to_lowercase);
        let text = invocation.text("text");

        let reply = match (mode.as_deref(), text) {
            (Some("e" | "encode"), Some(text)) => STANDARD.encode(text.as_bytes()),
            (Some("d" | "decode"), Some(code)) => Self::decode(code)?,
            (Some("e" | "encode" | "d" | "decode"), None) => {
                return Err(NormalizationFailure::MissingArgument("text".to_string()).into());
            }
            _ => {
                let embed = Embed::new()
                    .title(messages::BASE64_TITLE)
                    .description(messages::base64_usage(&ctx.app.config.bot.prefix))
                    .color(EMBED_COLOR)
                    .footer(messages::BASE64_FOOTER);
                ctx.chat
                    .send_embed(&embed, &[])
                    .await
                    .map_err(CommandError::platform)?;
                return Ok(());
            }
        };

        ctx.chat
            .send_message(&reply)
            .await
            .map_err(CommandError::platform)?;
        Ok(())
    }
}

pub struct Weather;

#[async_trait]
impl CommandHandler for Weather {
    async fn handle(&self, ctx: &CommandContext, invocation: &Invocation) -> CommandResult {
        let city = invocation.text("city").unwrap_or_default();
        let report = match ctx.app.apis.current_weather(city).await.map_err(upstream)? {
            Lookup::Found(report) => report,
            Lookup::NotFound(_) => return Err(not_found(messages::CITY_NOT_FOUND)),
        };

        let embed = Embed::new()
            .title(messages::weather_title(&report.city))
            .description(capitalize(&report.description))
            .color(EMBED_COLOR)
            .thumbnail(messages::weather_icon(&report.icon))
            .field(
                "Temperature",
                messages::temperature(report.temp_f, fahrenheit_to_celsius(report.temp_f)),
                true,
            )
            .field("Cloudiness", messages::percentage(report.cloudiness), true)
            .field("Humidity", messages::percentage(report.humidity), true)
            .field("Wind speed", messages::wind_speed(report.wind_speed), true)
            .field("Wind direction", messages::wind_direction(report.wind_deg), true);

        ctx.chat
            .send_embed(&embed, &[])
            .await
            .map_err(CommandError::platform)?;
        Ok(())
    }
}

pub struct Poll;

#[async_trait]
impl CommandHandler for Poll {
    async fn handle(&self, ctx: &CommandContext, invocation: &Invocation) -> CommandResult {
        let question = invocation.text("question").unwrap_or_default();
        let options: Vec<&str> = invocation
            .text("options")
            .unwrap_or_default()
            .split('/')
            .map(str::trim)
            .collect();

        let rejection = if options.len() > POLL_NUMBERS.len() {
            Some(messages::POLL_TOO_MANY)
        } else if options.len() < 2 {
            Some(messages::POLL_TOO_FEW)
        } else {
            None
        };
        if let Some(text) = rejection {
            ctx.chat
                .send_message(text)
                .await
                .map_err(CommandError::platform)?;
            return Ok(());
        }

        let lines: Vec<String> = POLL_NUMBERS
            .iter()
            .zip(&options)
            .map(|(number, option)| format!("{number} {option}"))
            .collect();
        let embed = Embed::new()
            .title(question)
            .description(lines.join("\n\n"))
            .color(EMBED_COLOR)
            .footer(messages::poll_footer(&invocation.invoker.name));

        let poll_id = ctx
            .chat
            .send_embed(&embed, &[])
            .await
            .map_err(CommandError::platform)?;
        for number in &POLL_NUMBERS[..options.len()] {
            ctx.chat
                .add_reaction(&poll_id, number)
                .await
                .map_err(CommandError::platform)?;
        }
        Ok(())
    }
}
