// std
use std::net::IpAddr;
// crates.io
use url::Host;
// self
use crate::{
	_prelude::*,
	auth::{ScopeList, TokenSecret, UserScope},
	error::ConfigError,
	provider::{
		AUTHORIZATION_URL, ClientAuthMethod, DEFAULT_NAME, DEFAULT_SCOPE, PROFILE_URL,
		ProviderEndpoints, ProviderQuirks, StrategyConfig, TOKEN_URL,
	},
};

/// Lifetime of an authorization session when the host does not choose one.
pub const DEFAULT_SESSION_TTL: Duration = Duration::minutes(10);

/// Builder for [`StrategyConfig`] values.
#[derive(Clone, Debug, Default)]
pub struct StrategyConfigBuilder {
	name: Option<String>,
	client_id: Option<String>,
	client_secret: Option<TokenSecret>,
	callback_url: Option<String>,
	authorization_url: Option<String>,
	token_url: Option<String>,
	profile_url: Option<String>,
	scope: Option<ScopeList>,
	team: Option<String>,
	user_scope: Option<UserScope>,
	client_auth_method: ClientAuthMethod,
	quirks: ProviderQuirks,
	session_ttl: Option<Duration>,
}
impl StrategyConfigBuilder {
	/// Creates an empty builder; unset endpoints and scopes fall back to Slack's defaults.
	pub fn new() -> Self {
		Self::default()
	}

	/// Sets the strategy name.
	pub fn name(mut self, name: impl Into<String>) -> Self {
		self.name = Some(name.into());

		self
	}

	/// Sets the OAuth client identifier.
	pub fn client_id(mut self, client_id: impl Into<String>) -> Self {
		self.client_id = Some(client_id.into());

		self
	}

	/// Sets the OAuth client secret.
	pub fn client_secret(mut self, client_secret: impl Into<String>) -> Self {
		self.client_secret = Some(TokenSecret::new(client_secret));

		self
	}

	/// Sets the redirect URI registered with the Slack app.
	pub fn callback_url(mut self, url: impl Into<String>) -> Self {
		self.callback_url = Some(url.into());

		self
	}

	/// Overrides the authorization endpoint.
	pub fn authorization_url(mut self, url: impl Into<String>) -> Self {
		self.authorization_url = Some(url.into());

		self
	}

	/// Overrides the token endpoint.
	pub fn token_url(mut self, url: impl Into<String>) -> Self {
		self.token_url = Some(url.into());

		self
	}

	/// Overrides the profile endpoint.
	pub fn profile_url(mut self, url: impl Into<String>) -> Self {
		self.profile_url = Some(url.into());

		self
	}

	/// Replaces the default workspace scopes.
	pub fn scope(mut self, scope: ScopeList) -> Self {
		self.scope = Some(scope);

		self
	}

	/// Restricts logins to one workspace.
	pub fn team(mut self, team: impl Into<String>) -> Self {
		self.team = Some(team.into());

		self
	}

	/// Requests user-level scopes.
	pub fn user_scope(mut self, user_scope: impl Into<UserScope>) -> Self {
		self.user_scope = Some(user_scope.into());

		self
	}

	/// Overrides the client authentication method.
	pub fn client_auth_method(mut self, method: ClientAuthMethod) -> Self {
		self.client_auth_method = method;

		self
	}

	/// Overrides the provider quirks.
	pub fn quirks(mut self, quirks: ProviderQuirks) -> Self {
		self.quirks = quirks;

		self
	}

	/// Overrides how long authorization sessions stay valid.
	pub fn session_ttl(mut self, ttl: Duration) -> Self {
		self.session_ttl = Some(ttl);

		self
	}

	/// Consumes the builder and validates the resulting configuration.
	pub fn build(self) -> Result<StrategyConfig, ConfigError> {
		let client_id = required("client_id", self.client_id)?;
		let client_secret = self
			.client_secret
			.filter(|secret| !secret.is_empty())
			.ok_or(ConfigError::MissingOption { option: "client_secret" })?;
		let callback_url = parse_url("callback_url", &required("callback_url", self.callback_url)?)?;
		let endpoints = ProviderEndpoints {
			authorization: endpoint_url(
				"authorization_url",
				"authorization",
				self.authorization_url.as_deref().unwrap_or(AUTHORIZATION_URL),
			)?,
			token: endpoint_url("token_url", "token", self.token_url.as_deref().unwrap_or(TOKEN_URL))?,
			profile: endpoint_url(
				"profile_url",
				"profile",
				self.profile_url.as_deref().unwrap_or(PROFILE_URL),
			)?,
		};
		let scope = match self.scope {
			Some(scope) => scope,
			None => ScopeList::new(DEFAULT_SCOPE)?,
		};

		validate_scope_delimiter(self.quirks.scope_delimiter)?;

		Ok(StrategyConfig {
			name: self.name.filter(|name| !name.is_empty()).unwrap_or_else(|| DEFAULT_NAME.into()),
			client_id,
			client_secret,
			callback_url,
			endpoints,
			scope,
			team: self.team.filter(|team| !team.is_empty()),
			user_scope: self.user_scope,
			client_auth_method: self.client_auth_method,
			quirks: self.quirks,
			session_ttl: self.session_ttl.unwrap_or(DEFAULT_SESSION_TTL),
		})
	}
}

/// Host-facing options, deserializable from configuration files or environment layers.
///
/// Accepts both snake_case keys and the camelCase spellings common in Passport-style
/// configuration (`clientID`, `callbackURL`, …).
#[derive(Clone, Debug, Default, Deserialize)]
pub struct StrategyOptions {
	/// OAuth client identifier.
	#[serde(alias = "clientID")]
	pub client_id: Option<String>,
	/// OAuth client secret.
	#[serde(alias = "clientSecret")]
	pub client_secret: Option<TokenSecret>,
	/// Redirect URI registered with the Slack app.
	#[serde(alias = "callbackURL")]
	pub callback_url: Option<String>,
	/// Authorization endpoint override.
	#[serde(alias = "authorizationURL")]
	pub authorization_url: Option<String>,
	/// Token endpoint override.
	#[serde(alias = "tokenURL")]
	pub token_url: Option<String>,
	/// Profile endpoint override.
	#[serde(alias = "profileURL")]
	pub profile_url: Option<String>,
	/// Workspace scopes, as a list or a space/comma-delimited string.
	pub scope: Option<UserScope>,
	/// Workspace restriction.
	pub team: Option<String>,
	/// User-level scopes, as a list or a preformatted string.
	#[serde(alias = "userScope")]
	pub user_scope: Option<UserScope>,
	/// Strategy name.
	pub name: Option<String>,
	/// Client authentication method.
	pub client_auth_method: Option<ClientAuthMethod>,
	/// Provider quirks.
	#[serde(default)]
	pub quirks: ProviderQuirks,
	/// Authorization session lifetime in seconds.
	pub session_ttl_secs: Option<u64>,
}
impl StrategyOptions {
	/// Applies defaults and validates the options.
	pub fn into_config(self) -> Result<StrategyConfig, ConfigError> {
		let mut builder = StrategyConfig::builder().quirks(self.quirks);

		if let Some(value) = self.client_id {
			builder = builder.client_id(value);
		}
		if let Some(value) = self.client_secret {
			builder.client_secret = Some(value);
		}
		if let Some(value) = self.callback_url {
			builder = builder.callback_url(value);
		}
		if let Some(value) = self.authorization_url {
			builder = builder.authorization_url(value);
		}
		if let Some(value) = self.token_url {
			builder = builder.token_url(value);
		}
		if let Some(value) = self.profile_url {
			builder = builder.profile_url(value);
		}
		if let Some(value) = self.scope {
			builder = builder.scope(match value {
				UserScope::Joined(raw) => ScopeList::from_str(&raw)?,
				UserScope::List(list) => list,
			});
		}
		if let Some(value) = self.team {
			builder = builder.team(value);
		}
		if let Some(value) = self.user_scope {
			builder = builder.user_scope(value);
		}
		if let Some(value) = self.name {
			builder = builder.name(value);
		}
		if let Some(value) = self.client_auth_method {
			builder = builder.client_auth_method(value);
		}
		if let Some(secs) = self.session_ttl_secs {
			builder = builder.session_ttl(Duration::seconds(i64::try_from(secs).unwrap_or(i64::MAX)));
		}

		builder.build()
	}
}
impl TryFrom<StrategyOptions> for StrategyConfig {
	type Error = ConfigError;

	fn try_from(value: StrategyOptions) -> Result<Self, Self::Error> {
		value.into_config()
	}
}

fn required(option: &'static str, value: Option<String>) -> Result<String, ConfigError> {
	value.filter(|value| !value.trim().is_empty()).ok_or(ConfigError::MissingOption { option })
}

fn parse_url(option: &'static str, raw: &str) -> Result<Url, ConfigError> {
	Url::parse(raw).map_err(|source| ConfigError::InvalidUrl { option, source })
}

fn endpoint_url(option: &'static str, endpoint: &'static str, raw: &str) -> Result<Url, ConfigError> {
	let url = parse_url(option, raw)?;

	validate_endpoint(endpoint, &url)?;

	Ok(url)
}

fn validate_endpoint(endpoint: &'static str, url: &Url) -> Result<(), ConfigError> {
	let loopback = match url.host() {
		Some(Host::Domain(domain)) => domain.eq_ignore_ascii_case("localhost"),
		Some(Host::Ipv4(ip)) => IpAddr::V4(ip).is_loopback(),
		Some(Host::Ipv6(ip)) => IpAddr::V6(ip).is_loopback(),
		None => false,
	};

	match url.scheme() {
		"https" => Ok(()),
		"http" if loopback => Ok(()),
		_ => Err(ConfigError::InsecureEndpoint { endpoint, url: url.to_string() }),
	}
}

fn validate_scope_delimiter(delimiter: char) -> Result<(), ConfigError> {
	if delimiter.is_control() {
		Err(ConfigError::InvalidScopeDelimiter { delimiter })
	} else {
		Ok(())
	}
}
