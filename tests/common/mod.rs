#![allow(dead_code)]

// self
#[cfg(feature = "reqwest")]
use oauth2_slack::{
	flows::{ReqwestSlackStrategy, SlackStrategy},
	http::ReqwestHttpClient,
	oauth::ReqwestTransportErrorMapper,
	reqwest::Client as ReqwestClient,
};
use oauth2_slack::provider::{ClientAuthMethod, StrategyConfig};

pub const CLIENT_ID: &str = "client-it";
pub const CLIENT_SECRET: &str = "secret-it";
pub const CALLBACK_URL: &str = "https://app.example.com/auth/slack/callback";

/// Builds a config whose three endpoints live under `base`.
pub fn config(base: &str, method: ClientAuthMethod) -> StrategyConfig {
	StrategyConfig::builder()
		.client_id(CLIENT_ID)
		.client_secret(CLIENT_SECRET)
		.callback_url(CALLBACK_URL)
		.authorization_url(format!("{base}/oauth/v2/authorize"))
		.token_url(format!("{base}/api/oauth.v2.access"))
		.profile_url(format!("{base}/api/users.info"))
		.client_auth_method(method)
		.build()
		.expect("Test strategy config should build.")
}

/// Builds a reqwest HTTP client that accepts the self-signed certificates produced by
/// `httpmock` during tests.
#[cfg(feature = "reqwest")]
pub fn test_reqwest_http_client() -> ReqwestHttpClient {
	let client = ReqwestClient::builder()
		.danger_accept_invalid_certs(true)
		.danger_accept_invalid_hostnames(true)
		.build()
		.expect("Failed to build insecure Reqwest client for tests.");

	ReqwestHttpClient::with_client(client)
}

/// Constructs a reqwest-backed strategy that trusts the mock server's certificate.
#[cfg(feature = "reqwest")]
pub fn build_reqwest_test_strategy(config: StrategyConfig) -> ReqwestSlackStrategy {
	SlackStrategy::with_http_client(config, test_reqwest_http_client(), ReqwestTransportErrorMapper)
}

/// Token endpoint payload carrying a workspace token and a nested user token.
pub fn exchange_body(bot_token: &str, user_id: &str, user_token: &str) -> String {
	serde_json::json!({
		"ok": true,
		"app_id": "A1",
		"access_token": bot_token,
		"token_type": "bot",
		"scope": "users:read,users:read.email",
		"bot_user_id": "B1",
		"team": { "id": "T1", "name": "Acme" },
		"authed_user": {
			"id": user_id,
			"scope": "identity.basic",
			"access_token": user_token,
			"token_type": "user"
		}
	})
	.to_string()
}

/// `users.info` payload for an acknowledged lookup.
pub fn profile_body(user_id: &str, real_name: &str, email: &str) -> String {
	serde_json::json!({
		"ok": true,
		"user": {
			"id": user_id,
			"team_id": "T1",
			"name": real_name.to_lowercase(),
			"real_name": real_name,
			"profile": { "real_name": real_name, "email": email }
		}
	})
	.to_string()
}
