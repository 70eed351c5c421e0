//! # Interface Layer
//!
//! The command surface users talk to.

pub mod commands;
