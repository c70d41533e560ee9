//! Configuration modules for the Lectern API.
//!
//! Each submodule owns one aspect of configuration, loaded from environment
//! variables with sensible development defaults.

pub mod cors;
pub mod database;
pub mod jwt;
pub mod stripe;
