//! # Infrastructure Layer
//!
//! Handles interactions with external systems and services.
//! Implements the traits defined in the Domain layer (`ChatProvider`, `ApiProvider`)
//! and parses the slash-command emulation used on Matrix.

pub mod apis;
pub mod matrix;
pub mod slash;
