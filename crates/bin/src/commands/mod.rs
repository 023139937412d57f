//! Command implementations for the Byline CLI.

pub mod articles;
pub mod auth;
