//! # Help Text
//!
//! Summaries and detailed help for every command, shown by `help`.

pub const HELP_TITLE: &str = "🤖 Stuffbot commands";

pub const PING: &str = "Tests the bot's latency";
pub const PING_HELP: &str = "Tests the bot's latency and displays it in milliseconds";

pub const INFO: &str = "View information";
pub const INFO_HELP: &str = "View the bot's information";

pub const INVITE: &str = "Add the bot to your server";

pub const HELP: &str = "List commands";
pub const HELP_HELP: &str = "Lists every command, or shows the details of one command";

pub const AVATAR: &str = "Get a user's avatar";
pub const AVATAR_HELP: &str = "Get your/any user's avatar";

pub const SERVERINFO: &str = "View server info";
pub const SERVERINFO_HELP: &str = "View information about the current server";

pub const USERINFO: &str = "View a member's information";

pub const GITHUB: &str = "Search for GitHub repositories";

pub const PYPI: &str = "Get info for a PyPI module";

pub const NPM: &str = "Get info for an NPM module";

pub const BASE64: &str = "Encode/decode base64";
pub const BASE64_HELP: &str =
    "Encode/decode base64. Use `e` or `encode` to encode text, `d` or `decode` to decode it";

pub const WEATHER: &str = "Get weather info for a city";
pub const WEATHER_HELP: &str = "Get weather info for a city. The city name is required. Optionally add state and country codes separated by commas. Example: `_weather washington,wa,us`, or `_weather washington`";

pub const EMBED: &str = "Create an embed";
pub const EMBED_HELP: &str =
    "Create an embed step by step: title, content, footer and whether to show you as the author";

pub const POLL: &str = "Create a poll";
pub const POLL_HELP: &str =
    "Create a poll. Put the question in quotes if it has spaces, then separate up to 10 options with slashes";

pub const ADMIN: &str = "Operator tools";
pub const ADMIN_HELP: &str = "Owner-only operations: status, sessions, commands, reset-cooldowns";
