//! Sign in with Slack as an OAuth 2.0 strategy: v2 code exchange with user-token rewriting,
//! `users.info` profile normalization, and a typed failure taxonomy in one crate.
//!
//! The entry point is [`flows::SlackStrategy`]. A login attempt moves through
//! [`SlackStrategy::start_authorization`](flows::SlackStrategy::start_authorization), the
//! provider redirect, and [`SlackStrategy::authenticate`](flows::SlackStrategy::authenticate),
//! which exchanges the code, swaps in the user-level token, and fetches the normalized
//! [`flows::SlackProfile`]. Every piece of per-attempt data travels through the returned values,
//! so one strategy can serve any number of concurrent logins.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod error;
pub mod flows;
pub mod http;
pub mod oauth;
pub mod obs;
pub mod provider;

mod _prelude {
	pub use std::{
		collections::BTreeMap,
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use parking_lot::Mutex;
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _, tokio as _};
