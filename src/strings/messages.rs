//! # Messages
//!
//! Contains constant strings and format functions for user-facing messages.
//! Includes error replies, session notices and the texts of every command.

// Error replies
pub const OWNER_ONLY: &str = "Only the owner of the bot can use this command.";
pub const MISSING_PERMISSION: &str = "You don't have enough permissions to use this command.";
pub const BOT_MISSING_PERMISSION: &str =
    "Command failed - I don't have enough permissions to run this command!";
pub const GUILD_ONLY: &str = "This command can't be used in direct messages.";
pub const UNKNOWN_COMMAND: &str = "❓ Unknown command.";
pub const MISSING_ARGUMENT: &str = "You've missed one or more required arguments. Check the command's help for what arguments you should provide.";
pub const BAD_ARGUMENT: &str =
    "Bad Argument error - make sure you've typed your arguments correctly.";

pub fn cooldown_active(remaining_secs: f64) -> String {
    format!("This command is on cooldown. Try again in {remaining_secs:.1}s.")
}

// Sessions
pub const SESSION_ALREADY_ACTIVE: &str =
    "⚠️ You already have an interactive command running in this room. Finish or cancel it first.";
pub const SESSION_EMPTY_ANSWER: &str = "Please send some text.";

// Pagination
pub const NOTHING_TO_SHOW: &str = "*(nothing to show)*";

pub fn code_block(content: &str) -> String {
    format!("```\n{content}\n```")
}

pub fn paginated_page(content: &str, page: usize, total: usize) -> String {
    format!("```\n{content}\n```\nPage {page}/{total}")
}

// Info
pub fn pong(latency_ms: u128) -> String {
    format!("Pong! The bot's latency is `{latency_ms}ms`")
}

pub fn info_title(name: &str) -> String {
    format!("`{name}` information")
}

pub fn source_code(url: &str) -> String {
    format!("View the bot's source code on [GitHub]({url})")
}

pub fn creator(url: &str) -> String {
    let handle = url.trim_end_matches('/').rsplit('/').next().unwrap_or(url);
    format!("[{handle}]({url})")
}

pub fn room_count(count: usize) -> String {
    format!("{count} rooms")
}

pub fn avatar_title(name: &str) -> String {
    format!("{name}'s avatar")
}

pub fn no_avatar(name: &str) -> String {
    format!(":x: {name} has no avatar set.")
}

pub fn server_title(name: &str) -> String {
    format!("{name} information")
}

pub const NO_TOPIC: &str = "None";
pub const NO_ROLES: &str = "None";
pub const ROLES_TRUNCATED: &str =
    "**[Only showing first 5 roles, since there are too many roles to show]**\n";

pub fn roles_heading(count: usize) -> String {
    format!("Roles ({count})")
}

pub fn yes_no(value: bool) -> &'static str {
    if value { "Yes" } else { "No" }
}

// Help
pub fn help_footer(prefix: &str) -> String {
    format!("Run `{prefix}help <command>` for details on a command.")
}

pub fn aliases_line(aliases: &[&str]) -> String {
    let quoted: Vec<String> = aliases.iter().map(|alias| format!("`{alias}`")).collect();
    format!("Aliases: {}", quoted.join(", "))
}

// Utilities
pub const NO_REPOSITORIES: &str = "No matching repositories found";

pub fn first_repository(query: &str, url: &str) -> String {
    format!("First result for '{query}':\n{url}")
}

pub const PYPI_NOT_FOUND: &str = ":x: That module doesn't exist!";

pub fn npm_not_found(detail: &str) -> String {
    format!(":x: {detail}")
}

pub fn npm_package_url(name: &str) -> String {
    format!("https://www.npmjs.com/package/{name}")
}

pub const BASE64_TITLE: &str = "Base64 commands";
pub const BASE64_FOOTER: &str = "Don't include the brackets while running commands!";

pub fn base64_usage(prefix: &str) -> String {
    format!(
        "Run `{prefix}base64 e {{text}}` to convert the text into base64.\nRun `{prefix}base64 d {{base64}}` to decode base64 code.\n"
    )
}

pub const CITY_NOT_FOUND: &str = concat!(
    ":x: City not found. Provide only the city name, **or:**\n",
    "The city name with the state code and country code separated by commas.\n",
    "E.g.: `washington,wa,us` or just `washington`."
);

pub fn weather_title(city: &str) -> String {
    format!("Weather in {city}")
}

pub fn weather_icon(icon: &str) -> String {
    format!("https://openweathermap.org/img/wn/{icon}@2x.png")
}

pub fn temperature(fahrenheit: f64, celsius: f64) -> String {
    format!("{fahrenheit}° F / {celsius}° C")
}

pub fn percentage(value: i64) -> String {
    format!("{value}%")
}

pub fn wind_speed(speed: f64) -> String {
    format!("{speed} m/s")
}

pub fn wind_direction(degrees: f64) -> String {
    format!("{degrees}°")
}

pub const POLL_TOO_MANY: &str = ":x: You cannot have more than 10 choices!";
pub const POLL_TOO_FEW: &str = ":x: You need to provide multiple options!";

pub fn poll_footer(name: &str) -> String {
    format!("Poll created by {name}")
}

// Admin
pub fn admin_usage(prefix: &str) -> String {
    format!("Usage: `{prefix}admin <status|sessions|commands|reset-cooldowns>`")
}

pub fn admin_status(uptime: &str, rooms: usize, commands: usize, sessions: usize, pages: usize, cooldowns: usize) -> String {
    format!(
        "**Status**\nUptime: {uptime}\nRooms: {rooms}\nCommands: {commands}\nActive sessions: {sessions}\nPaginated messages: {pages}\nCooldown buckets: {cooldowns}"
    )
}

pub const NO_SESSIONS: &str = "No interactive sessions are running.";

pub fn cooldowns_reset(count: usize) -> String {
    format!("Cleared {count} cooldown buckets.")
}

pub fn unknown_admin_operation(operation: &str) -> String {
    format!("❓ Unknown admin operation `{operation}`.")
}
