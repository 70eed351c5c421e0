//! # Slash Interactions
//!
//! Matrix has no native slash commands, so they are typed as messages of the form
//! `/name option: value other: value`. This module turns such a message into the
//! same typed [`Interaction`] a platform with real interactions would deliver.

use std::sync::OnceLock;

use regex::Regex;

use crate::domain::types::{Interaction, InteractionOption, OptionValue, Origin, Participant};

fn command_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)^/([A-Za-z][A-Za-z0-9_-]*)(?:\s+(.*))?$").ok())
        .as_ref()
}

fn option_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?:^|\s)([A-Za-z_][A-Za-z0-9_]*):(?:\s+|$)").ok())
        .as_ref()
}

fn typed_value(raw: &str) -> OptionValue {
    if let Ok(n) = raw.parse::<i64>() {
        return OptionValue::Integer(n);
    }
    if raw.starts_with('@') && raw.contains(':') && !raw.contains(char::is_whitespace) {
        return OptionValue::User(raw.to_string());
    }
    OptionValue::String(raw.to_string())
}

/// Splits `"question: Best? options: a/b"` into named options. Text before the
/// first `name:` marker is ignored.
fn parse_options(raw: &str) -> Vec<InteractionOption> {
    let Some(re) = option_regex() else {
        return Vec::new();
    };
    let markers: Vec<(usize, usize, String)> = re
        .captures_iter(raw)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let name = caps.get(1)?;
            Some((whole.start(), whole.end(), name.as_str().to_lowercase()))
        })
        .collect();

    let mut options = Vec::with_capacity(markers.len());
    for (i, (_, value_start, name)) in markers.iter().enumerate() {
        let value_end = markers.get(i + 1).map(|next| next.0).unwrap_or(raw.len());
        let value = raw[*value_start..value_end].trim();
        if value.is_empty() {
            continue;
        }
        options.push(InteractionOption {
            name: name.clone(),
            value: typed_value(value),
        });
    }
    options
}

/// Parses a slash message, or returns `None` if `body` is not one.
pub fn parse_interaction(body: &str, invoker: &Participant, origin: &Origin) -> Option<Interaction> {
    let caps = command_regex()?.captures(body.trim())?;
    let name = caps.get(1)?.as_str().to_lowercase();
    let options = caps.get(2).map(|m| parse_options(m.as_str())).unwrap_or_default();
    Some(Interaction {
        name,
        options,
        invoker: invoker.clone(),
        origin: origin.clone(),
    })
}
