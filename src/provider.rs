//! Slack-facing configuration (data) and error classification (behavior).
//!
//! `config` exposes the validated [`StrategyConfig`] covering endpoints, client credentials,
//! workspace and user scopes, the team restriction, and provider quirks. `classify` defines
//! [`ErrorClassifier`], the hook that maps Slack error codes onto [`ProviderErrorKind`].

pub mod classify;
pub mod config;

pub use classify::*;
pub use config::*;
