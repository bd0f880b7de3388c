//! Error classification hooks for Slack error codes.
//!
//! Slack reports most failures as `{"ok": false, "error": "<code>"}` regardless of the HTTP
//! status. Classifiers turn those codes into a coarse [`ProviderErrorKind`] so hosts can decide
//! what to show the user without matching on strings.

// self
use crate::_prelude::*;

/// Slack endpoints the strategy talks to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Endpoint {
	/// Browser-facing authorization redirect (`oauth/v2/authorize`).
	Authorization,
	/// Code exchange (`oauth.v2.access`).
	Token,
	/// Profile lookup (`users.info`).
	UsersInfo,
}
impl Endpoint {
	/// Returns a stable label suitable for messages and span fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Endpoint::Authorization => "authorization",
			Endpoint::Token => "token",
			Endpoint::UsersInfo => "users.info",
		}
	}
}
impl Display for Endpoint {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Hook that maps provider-reported failures into [`ProviderErrorKind`].
pub trait ErrorClassifier: Send + Sync {
	/// Classifies a failure Slack reported through an `error` field.
	fn classify(&self, ctx: &ProviderErrorContext) -> ProviderErrorKind;
}

/// Coarse categories for provider-reported failures.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderErrorKind {
	/// The user declined the authorization prompt.
	AccessDenied,
	/// The authorization code or redirect is invalid, expired, or already used.
	InvalidGrant,
	/// Client credentials are wrong.
	InvalidClient,
	/// The token used for the call is invalid, revoked, or expired.
	InvalidAuth,
	/// The token lacks a scope required by the call.
	MissingScope,
	/// The requested user does not exist or is not visible.
	NotFound,
	/// Slack throttled the call.
	RateLimited,
	/// Anything else, including codes the classifier does not know.
	Other,
}

/// Context passed to classifiers.
///
/// Holds only primitive data so classifiers stay independent of the HTTP stack.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProviderErrorContext {
	/// Endpoint that reported the failure.
	pub endpoint: Endpoint,
	/// Slack (or OAuth) `error` code.
	pub code: String,
	/// Optional `error_description` or Slack `detail`.
	pub description: Option<String>,
	/// HTTP status code, when available.
	pub http_status: Option<u16>,
}
impl ProviderErrorContext {
	/// Creates a new context for the provided endpoint and error code.
	pub fn new(endpoint: Endpoint, code: impl Into<String>) -> Self {
		Self { endpoint, code: code.into(), description: None, http_status: None }
	}

	/// Adds a human-readable description.
	pub fn with_description(mut self, description: impl Into<String>) -> Self {
		self.description = Some(description.into());

		self
	}

	/// Adds an HTTP status code.
	pub fn with_http_status(mut self, status: u16) -> Self {
		self.http_status = Some(status);

		self
	}
}

/// Classifier that knows the documented Slack error codes.
#[derive(Debug, Default)]
pub struct SlackErrorClassifier;
impl Display for SlackErrorClassifier {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("slack-error-classifier")
	}
}
impl ErrorClassifier for SlackErrorClassifier {
	fn classify(&self, ctx: &ProviderErrorContext) -> ProviderErrorKind {
		if let Some(kind) = match_code(&ctx.code) {
			return kind;
		}

		classify_status(ctx.http_status)
	}
}

fn match_code(code: &str) -> Option<ProviderErrorKind> {
	let kind = match code.to_ascii_lowercase().as_str() {
		"access_denied" => ProviderErrorKind::AccessDenied,
		"invalid_code" | "code_already_used" | "code_expired" | "invalid_grant"
		| "invalid_grant_type" | "bad_redirect_uri" | "oauth_authorization_url_mismatch" =>
			ProviderErrorKind::InvalidGrant,
		"invalid_client_id" | "bad_client_secret" | "invalid_client" | "unauthorized_client" =>
			ProviderErrorKind::InvalidClient,
		"not_authed" | "invalid_auth" | "token_revoked" | "token_expired" | "account_inactive"
		| "invalid_refresh_token" => ProviderErrorKind::InvalidAuth,
		"missing_scope" | "no_permission" | "invalid_scope" | "insufficient_scope" =>
			ProviderErrorKind::MissingScope,
		"user_not_found" | "users_not_found" | "user_not_visible" =>
			ProviderErrorKind::NotFound,
		"ratelimited" | "rate_limited" => ProviderErrorKind::RateLimited,
		_ => return None,
	};

	Some(kind)
}

fn classify_status(status: Option<u16>) -> ProviderErrorKind {
	match status {
		Some(401) => ProviderErrorKind::InvalidAuth,
		Some(403) => ProviderErrorKind::MissingScope,
		Some(404) => ProviderErrorKind::NotFound,
		Some(429) => ProviderErrorKind::RateLimited,
		_ => ProviderErrorKind::Other,
	}
}
