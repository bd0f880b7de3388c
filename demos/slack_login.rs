//! Walks through a complete Sign in with Slack round trip against the real Slack API.
//!
//! 1. Run once with `SLACK_CLIENT_ID`, `SLACK_CLIENT_SECRET`, and `SLACK_CALLBACK_URL` set to
//!    print the authorize URL. The session is written to `slack-session.json`.
//! 2. Approve the app in the browser, then run again with `SLACK_REDIRECTED_TO` holding the full
//!    URL Slack redirected to.

// std
use std::{env, fs, io};
// crates.io
use color_eyre::{Result, eyre::eyre};
use url::Url;
// self
use oauth2_slack::{
	auth::TokenSecret,
	flows::{AuthorizationSession, CallbackParams, Login, SlackStrategy},
	provider::{AuthorizationOptions, StrategyOptions},
};

const SESSION_FILE: &str = "slack-session.json";

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let options = StrategyOptions {
		client_id: env::var("SLACK_CLIENT_ID").ok(),
		client_secret: env::var("SLACK_CLIENT_SECRET").ok().map(TokenSecret::new),
		callback_url: env::var("SLACK_CALLBACK_URL").ok(),
		team: env::var("SLACK_TEAM").ok(),
		user_scope: Some("identity.basic".into()),
		..StrategyOptions::default()
	};
	let strategy = SlackStrategy::from_options(options)?;

	let Ok(redirected_to) = env::var("SLACK_REDIRECTED_TO") else {
		let session = strategy.start_authorization(&AuthorizationOptions::default());

		fs::write(SESSION_FILE, serde_json::to_vec_pretty(&session)?)?;
		println!("Send your user to {}.", session.authorize_url);
		println!("Session stored in {SESSION_FILE}; rerun with SLACK_REDIRECTED_TO set.");

		return Ok(());
	};
	let session: AuthorizationSession = serde_json::from_slice(&fs::read(SESSION_FILE)?)?;
	let callback = CallbackParams::from_url(&Url::parse(&redirected_to)?);
	let greet = |login: Login| async move {
		if login.profile.email.is_none() {
			return Err(io::Error::other("Slack did not share an email address."));
		}

		Ok(format!("{} <{}>", login.profile.display_name, login.profile.id))
	};
	let user = strategy
		.authenticate_with(&session, &callback, &greet)
		.await
		.map_err(|e| eyre!("Login failed: {e}."))?;

	println!("Signed in as {user}.");

	Ok(())
}
