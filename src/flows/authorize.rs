//! Authorization redirect construction.

mod session;

pub use session::*;

// self
use crate::{
	_prelude::*,
	flows::SlackStrategy,
	http::StrategyHttpClient,
	obs::{self, FlowOutcome, FlowSpan, FlowStage},
	oauth::TransportErrorMapper,
	provider::AuthorizationOptions,
};

impl<C, M> SlackStrategy<C, M>
where
	C: ?Sized + StrategyHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Extra query parameters (`team`, `user_scope`) for the authorization redirect.
	pub fn authorization_params(&self, options: &AuthorizationOptions) -> BTreeMap<String, String> {
		self.config.authorization_params(options)
	}

	/// Builds the authorization redirect and the session that must accompany the callback.
	///
	/// The URL carries `response_type=code`, `client_id`, `redirect_uri`, the workspace `scope`,
	/// a random 32-character `state`, and the [`authorization_params`](Self::authorization_params).
	pub fn start_authorization(&self, options: &AuthorizationOptions) -> AuthorizationSession {
		const STAGE: FlowStage = FlowStage::Authorize;

		let _guard = FlowSpan::new(STAGE, "start_authorization").entered();

		obs::record_flow_outcome(STAGE, FlowOutcome::Attempt);

		let params = self.authorization_params(options);
		let session = build_session(&self.config, &params, OffsetDateTime::now_utc());

		obs::record_flow_outcome(STAGE, FlowOutcome::Success);

		session
	}
}

#[cfg(all(test, feature = "reqwest"))]
mod tests {
	// std
	use std::collections::HashMap;
	// self
	use super::*;
	use crate::{
		auth::{ScopeList, UserScope},
		provider::{ProviderQuirks, StrategyConfig},
	};

	fn strategy(quirks: ProviderQuirks) -> crate::flows::ReqwestSlackStrategy {
		SlackStrategy::new(
			StrategyConfig::builder()
				.client_id("client-1")
				.client_secret("secret-1")
				.callback_url("https://app.example.com/auth/slack/callback")
				.scope(ScopeList::new(["users:read", "team:read"]).expect("Scopes should be valid."))
				.user_scope(UserScope::from(
					ScopeList::new(["identity.basic", "identity.email"])
						.expect("User scopes should be valid."),
				))
				.team("T-config")
				.quirks(quirks)
				.build()
				.expect("Config should build."),
		)
	}

	#[test]
	fn authorize_url_carries_every_parameter() {
		let strategy = strategy(ProviderQuirks::default());
		let session =
			strategy.start_authorization(&AuthorizationOptions::default().with_team("T-request"));
		let pairs: HashMap<_, _> = session.authorize_url.query_pairs().into_owned().collect();

		assert!(session.authorize_url.as_str().starts_with("https://slack.com/oauth/v2/authorize?"));
		assert_eq!(pairs.get("response_type").map(String::as_str), Some("code"));
		assert_eq!(pairs.get("client_id").map(String::as_str), Some("client-1"));
		assert_eq!(
			pairs.get("redirect_uri").map(String::as_str),
			Some("https://app.example.com/auth/slack/callback")
		);
		assert_eq!(pairs.get("scope").map(String::as_str), Some("users:read team:read"));
		assert_eq!(pairs.get("state"), Some(&session.state));
		assert_eq!(pairs.get("team").map(String::as_str), Some("T-request"));
		assert_eq!(
			pairs.get("user_scope").map(String::as_str),
			Some("identity.basic identity.email")
		);
		assert_eq!(session.state.len(), 32);
		assert_eq!(session.redirect_uri, strategy.config().callback_url);
	}

	#[test]
	fn scope_delimiter_quirk_applies_to_workspace_scopes() {
		let quirks = ProviderQuirks { scope_delimiter: ',', ..ProviderQuirks::default() };
		let session = strategy(quirks).start_authorization(&AuthorizationOptions::default());
		let pairs: HashMap<_, _> = session.authorize_url.query_pairs().into_owned().collect();

		assert_eq!(pairs.get("scope").map(String::as_str), Some("users:read,team:read"));
		assert_eq!(pairs.get("team").map(String::as_str), Some("T-config"));
	}

	#[test]
	fn sessions_round_trip_through_serde() {
		let session = strategy(ProviderQuirks::default())
			.start_authorization(&AuthorizationOptions::default());
		let json = serde_json::to_string(&session).expect("Session should serialize.");
		let restored: AuthorizationSession =
			serde_json::from_str(&json).expect("Session should deserialize.");

		assert_eq!(restored, session);
	}
}
