//! Typed view over the `oauth.v2.access` payload and the attempt-scoped exchange result.

// crates.io
use serde_json::{Map, Value};
// self
use crate::{
	_prelude::*,
	auth::{TeamId, TokenSecret, UserId},
};

/// Installing user's block inside the exchange payload (`authed_user`).
#[derive(Clone, Serialize, Deserialize)]
pub struct AuthedUser {
	/// Slack user id of the person who completed the flow.
	pub id: UserId,
	/// User-level token issued for `user_scope`.
	pub access_token: TokenSecret,
	/// Comma-delimited user scopes that were granted.
	pub scope: Option<String>,
	/// Token type reported by Slack (normally `user`).
	pub token_type: Option<String>,
	/// User-level refresh token, present when token rotation is enabled.
	pub refresh_token: Option<TokenSecret>,
	/// User-level token lifetime in seconds, present when token rotation is enabled.
	pub expires_in: Option<u64>,
	/// Remaining fields, kept verbatim.
	#[serde(flatten)]
	pub extra: Map<String, Value>,
}
impl Debug for AuthedUser {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AuthedUser")
			.field("id", &self.id)
			.field("access_token", &self.access_token)
			.field("scope", &self.scope)
			.field("token_type", &self.token_type)
			.field("refresh_token_set", &self.refresh_token.is_some())
			.finish()
	}
}

/// Workspace reference embedded in the exchange payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamRef {
	/// Workspace id.
	pub id: TeamId,
	/// Workspace display name.
	pub name: Option<String>,
}

/// The provider's token-exchange payload.
///
/// Only the fields the strategy depends on are typed; everything else Slack returns
/// (`bot_user_id`, `app_id`, `enterprise`, `incoming_webhook`, …) stays in [`extra`](Self::extra).
#[derive(Clone, Serialize, Deserialize)]
pub struct RawExchangeResponse {
	/// Top-level (workspace/bot) token.
	pub access_token: TokenSecret,
	/// Installing user and their user-level token.
	pub authed_user: AuthedUser,
	/// Workspace the app was installed into; absent for org-wide installs.
	pub team: Option<TeamRef>,
	/// Remaining fields, kept verbatim.
	#[serde(flatten)]
	pub extra: Map<String, Value>,
}
impl RawExchangeResponse {
	/// Reads the typed view out of the generic client's raw parameter map.
	pub fn from_params(
		params: Map<String, Value>,
	) -> Result<Self, serde_path_to_error::Error<serde_json::Error>> {
		serde_path_to_error::deserialize(Value::Object(params))
	}

	/// Returns a field from the untyped remainder of the payload.
	pub fn get(&self, key: &str) -> Option<&Value> {
		self.extra.get(key)
	}
}
impl Debug for RawExchangeResponse {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RawExchangeResponse")
			.field("access_token", &self.access_token)
			.field("authed_user", &self.authed_user)
			.field("team", &self.team)
			.field("extra_keys", &self.extra.keys().collect::<Vec<_>>())
			.finish()
	}
}

/// Result of one successful code exchange, scoped to a single login attempt.
///
/// [`access_token`](Self::access_token) is always the user-level token; the workspace token
/// stays reachable through [`raw`](Self::raw) for the profile lookup.
#[derive(Clone, Debug)]
pub struct ExchangedTokens {
	/// User-level token delivered to the host.
	pub access_token: TokenSecret,
	/// Refresh token exactly as the generic client returned it.
	pub refresh_token: Option<TokenSecret>,
	/// Full exchange payload for this attempt.
	pub raw: RawExchangeResponse,
}
impl ExchangedTokens {
	/// Slack user id of the installing user.
	pub fn user_id(&self) -> &UserId {
		&self.raw.authed_user.id
	}

	/// Top-level token returned by the exchange.
	pub fn workspace_token(&self) -> &TokenSecret {
		&self.raw.access_token
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use serde_json::json;
	// self
	use super::*;

	fn params(value: Value) -> Map<String, Value> {
		match value {
			Value::Object(map) => map,
			_ => panic!("Fixture must be a JSON object."),
		}
	}

	#[test]
	fn parses_nested_payload_and_keeps_unknown_fields() {
		let raw = RawExchangeResponse::from_params(params(json!({
			"ok": true,
			"access_token": "xoxb-1",
			"token_type": "bot",
			"bot_user_id": "B1",
			"team": { "id": "T1", "name": "Acme" },
			"authed_user": { "id": "U1", "access_token": "xoxp-1", "scope": "identity.basic" }
		})))
		.expect("Exchange payload fixture should parse.");

		assert_eq!(raw.access_token.expose(), "xoxb-1");
		assert_eq!(&*raw.authed_user.id, "U1");
		assert_eq!(raw.authed_user.access_token.expose(), "xoxp-1");
		assert_eq!(raw.team.as_ref().map(|team| &*team.id), Some("T1"));
		assert_eq!(raw.get("bot_user_id"), Some(&json!("B1")));
		assert_eq!(raw.get("ok"), Some(&json!(true)));
	}

	#[test]
	fn missing_user_token_reports_path() {
		let err = RawExchangeResponse::from_params(params(json!({
			"access_token": "xoxb-1",
			"authed_user": { "id": "U1" }
		})))
		.expect_err("Missing authed_user.access_token should fail.");

		assert!(err.path().to_string().contains("authed_user"));
		assert!(err.inner().to_string().contains("access_token"));
	}

	#[test]
	fn debug_output_redacts_tokens() {
		let raw = RawExchangeResponse::from_params(params(json!({
			"access_token": "xoxb-secret",
			"authed_user": { "id": "U1", "access_token": "xoxp-secret" },
			"incoming_webhook": { "url": "https://hooks.slack.com/services/secret" }
		})))
		.expect("Exchange payload fixture should parse.");
		let rendered = format!("{raw:?}");

		assert!(!rendered.contains("xoxb-secret"));
		assert!(!rendered.contains("xoxp-secret"));
		assert!(!rendered.contains("hooks.slack.com"));
		assert!(rendered.contains("incoming_webhook"));
	}
}
