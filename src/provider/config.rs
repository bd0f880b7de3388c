//! Strategy configuration shared by every login attempt.
//!
//! The module exposes the validated [`StrategyConfig`], its builder, the serde-friendly
//! [`StrategyOptions`] hosts load from their own configuration, and the provider quirk toggles.

/// Builder API and host-facing option parsing.
pub mod builder;
/// Provider-specific quirk toggles.
pub mod quirks;

pub use builder::*;
pub use quirks::*;

// self
use crate::{
	_prelude::*,
	auth::{ScopeList, TokenSecret, UserScope},
};

/// Default authorization endpoint.
pub const AUTHORIZATION_URL: &str = "https://slack.com/oauth/v2/authorize";
/// Default token endpoint.
pub const TOKEN_URL: &str = "https://slack.com/api/oauth.v2.access";
/// Default profile endpoint.
pub const PROFILE_URL: &str = "https://slack.com/api/users.info";
/// Workspace scopes requested when the host does not choose its own.
pub const DEFAULT_SCOPE: [&str; 4] =
	["users:read", "users:read.email", "users.profile:read", "team:read"];
/// Strategy name used when the host does not choose its own.
pub const DEFAULT_NAME: &str = "slack";
/// Provider label stamped on every normalized profile.
pub const PROVIDER: &str = "Slack";

/// How client credentials reach the token endpoint.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientAuthMethod {
	/// Form POST body parameters for `client_id`/`client_secret`.
	#[default]
	ClientSecretPost,
	/// HTTP Basic with `client_id`/`client_secret`.
	ClientSecretBasic,
}

/// Endpoint set used by the strategy.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderEndpoints {
	/// Authorization endpoint the user is redirected to.
	pub authorization: Url,
	/// Token endpoint used for the code exchange.
	pub token: Url,
	/// Profile endpoint (`users.info`).
	pub profile: Url,
}

/// Immutable strategy configuration.
#[derive(Clone, Debug)]
pub struct StrategyConfig {
	/// Strategy name hosts use for routing (`slack` by default).
	pub name: String,
	/// OAuth client identifier.
	pub client_id: String,
	/// OAuth client secret.
	pub client_secret: TokenSecret,
	/// Redirect URI registered with the Slack app.
	pub callback_url: Url,
	/// Endpoint definitions.
	pub endpoints: ProviderEndpoints,
	/// Workspace-level scopes.
	pub scope: ScopeList,
	/// Workspace the login is restricted to, if any.
	pub team: Option<String>,
	/// User-level scopes requested alongside [`scope`](Self::scope).
	pub user_scope: Option<UserScope>,
	/// Client authentication method for the token endpoint.
	pub client_auth_method: ClientAuthMethod,
	/// Provider-specific quirks.
	pub quirks: ProviderQuirks,
	/// How long an authorization session stays valid.
	pub session_ttl: Duration,
}
impl StrategyConfig {
	/// Creates a new builder with Slack's default endpoints and scopes.
	pub fn builder() -> StrategyConfigBuilder {
		StrategyConfigBuilder::new()
	}

	/// Extra query parameters for the authorization redirect.
	///
	/// `team` comes from `options` when set to a non-empty value there and from the
	/// configuration otherwise.
	/// `user_scope` is included whenever one is configured.
	pub fn authorization_params(&self, options: &AuthorizationOptions) -> BTreeMap<String, String> {
		let mut params = BTreeMap::new();

		if let Some(team) =
			options.team.as_ref().filter(|team| !team.is_empty()).or(self.team.as_ref())
		{
			params.insert("team".into(), team.clone());
		}
		if let Some(user_scope) = self.user_scope.as_ref().filter(|scope| !scope.is_empty()) {
			params.insert("user_scope".into(), user_scope.to_param().into_owned());
		}

		params
	}
}

/// Per-request options for starting an authorization.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationOptions {
	/// Workspace to pre-select; overrides the configured team.
	pub team: Option<String>,
}
impl AuthorizationOptions {
	/// Restricts this authorization to one workspace.
	pub fn with_team(mut self, team: impl Into<String>) -> Self {
		self.team = Some(team.into());

		self
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn config() -> StrategyConfigBuilder {
		StrategyConfig::builder()
			.client_id("client")
			.client_secret("secret")
			.callback_url("https://app.example.com/auth/slack/callback")
	}

	#[test]
	fn user_scope_list_is_space_joined() {
		let config = config()
			.user_scope(ScopeList::new(["a", "b"]).expect("User scopes should be valid."))
			.build()
			.expect("Config should build.");
		let params = config.authorization_params(&AuthorizationOptions::default());

		assert_eq!(params.get("user_scope").map(String::as_str), Some("a b"));
		assert!(!params.contains_key("team"));
	}

	#[test]
	fn user_scope_string_passes_through() {
		let config = config().user_scope("a b").build().expect("Config should build.");
		let params = config.authorization_params(&AuthorizationOptions::default());

		assert_eq!(params.get("user_scope").map(String::as_str), Some("a b"));
	}

	#[test]
	fn request_team_wins_over_configured_team() {
		let config = config().team("T-config").build().expect("Config should build.");
		let configured = config.authorization_params(&AuthorizationOptions::default());
		let overridden =
			config.authorization_params(&AuthorizationOptions::default().with_team("T-request"));

		assert_eq!(configured.get("team").map(String::as_str), Some("T-config"));
		assert_eq!(overridden.get("team").map(String::as_str), Some("T-request"));
	}

	#[test]
	fn empty_request_team_keeps_configured_team() {
		let config = config().team("T1").build().expect("Config should build.");
		let params = config.authorization_params(&AuthorizationOptions::default().with_team(""));

		assert_eq!(params.get("team").map(String::as_str), Some("T1"));

		let unrestricted = config_without_team().authorization_params(
			&AuthorizationOptions::default().with_team(""),
		);

		assert!(!unrestricted.contains_key("team"));
	}

	fn config_without_team() -> StrategyConfig {
		config().build().expect("Config should build.")
	}

	#[test]
	fn no_team_and_no_user_scope_yield_no_params() {
		let config = config().build().expect("Config should build.");

		assert!(config.authorization_params(&AuthorizationOptions::default()).is_empty());
	}
}
