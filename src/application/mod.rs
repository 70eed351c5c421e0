//! # Application Layer
//!
//! Contains the core logic and orchestration of the bot: command registry,
//! normalization, guards, dispatch, routing, sessions, pagination and process state.

pub mod context;
pub mod dispatcher;
pub mod errors;
pub mod guards;
pub mod normalizer;
pub mod pagination;
pub mod registry;
pub mod router;
pub mod session;
pub mod state;

#[cfg(test)]
pub mod testing;
