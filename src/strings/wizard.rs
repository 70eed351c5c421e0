//! # Wizard Strings
//!
//! Prompts and notices of the embed creator.

pub const TITLE_PROMPT: &str = "Embed creation process started.\nPlease send the **title you want to use for the embed**.";

pub fn description_prompt(title: &str) -> String {
    format!(
        "Title of the embed will be set to '{title}'.\nPlease send the text to use for the **content of the embed**."
    )
}

pub const FOOTER_PROMPT: &str = concat!(
    "Please send the text to use as a **footer**.\n",
    "The footer text will be small and light and will be at the bottom of the embed.\n",
    "**If you don't want a footer, say 'empty'.**"
);

pub const AUTHOR_PROMPT: &str = concat!(
    "Do you want me to display you as the author of the embed?\n",
    "Please answer with **yes** or **no**.\n",
    "__Send anything *other than* yes or no to cancel the embed creation.__"
);

pub const EXITING: &str = ":exclamation: Exiting embed creator.";
pub const TIMED_OUT: &str = ":x: Command has timed out. Exiting embed creator.";
pub const CANCELLED: &str = ":x: Embed creation cancelled.";
