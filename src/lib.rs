//! Client library for the FlagDeck admin API.
//!
//! The crate covers the three things the admin console is built on:
//! a typed API client ([`api::ApiClient`]), a keyed query cache with
//! staleness windows and request coalescing ([`cache::QueryCache`]), and
//! the targeting-rule editor for feature flags ([`editor::RuleEditor`]).
//! [`Console`] ties the first two together so reads are cached and
//! mutations invalidate exactly the scope they touched.

pub mod api;
pub mod cache;
pub mod config;
pub mod console;
pub mod editor;
pub mod error;
pub mod http;

pub use api::ApiClient;
pub use config::Config;
pub use console::Console;
pub use editor::RuleEditor;
pub use error::ApiError;
