//! `users.info` lookup and profile normalization.
//!
//! The lookup authenticates with the top-level token from the exchange and identifies the user
//! through `authed_user.id`, both passed as query parameters. No `Authorization` header is sent.

// crates.io
use oauth2::{
	AsyncHttpClient, HttpRequest,
	http::{Method, header::ACCEPT},
};
use serde_json::Value;
// self
use crate::{
	_prelude::*,
	auth::{ExchangedTokens, TeamId, UserId},
	error::{ConfigError, TransportError},
	flows::{FlowFuture, SlackStrategy},
	http::{ResponseMetadataSlot, StrategyHttpClient},
	obs::{self, FlowStage},
	oauth::{SlackEnvelope, TransportErrorMapper, meta_retry_after, provider_error},
	provider::{Endpoint, ErrorClassifier, PROVIDER, ProviderQuirks},
};

/// Normalized Slack user handed to the host.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SlackProfile {
	/// Provider label, always `Slack`.
	pub provider: String,
	/// Slack user id.
	pub id: UserId,
	/// Best available human-readable name.
	pub display_name: String,
	/// Primary email, present when `users:read.email` was granted.
	pub email: Option<String>,
	/// Workspace the user belongs to.
	pub team_id: Option<TeamId>,
	/// Largest avatar image Slack returned.
	pub avatar: Option<String>,
	/// The `user` object exactly as returned.
	pub user: Value,
	/// The full `users.info` payload.
	pub raw: Value,
}

#[derive(Debug, Deserialize)]
struct UsersInfo {
	user: SlackUser,
}

#[derive(Debug, Deserialize)]
struct SlackUser {
	id: UserId,
	name: Option<String>,
	real_name: Option<String>,
	team_id: Option<TeamId>,
	#[serde(default)]
	profile: SlackUserProfile,
}
impl SlackUser {
	fn display_name(&self) -> String {
		[self.real_name.as_deref(), self.profile.real_name.as_deref(), self.name.as_deref()]
			.into_iter()
			.flatten()
			.find(|name| !name.is_empty())
			.map_or_else(|| self.id.to_string(), str::to_owned)
	}
}

#[derive(Debug, Default, Deserialize)]
struct SlackUserProfile {
	real_name: Option<String>,
	email: Option<String>,
	image_original: Option<String>,
	image_512: Option<String>,
	image_192: Option<String>,
	image_72: Option<String>,
	image_48: Option<String>,
	image_32: Option<String>,
	image_24: Option<String>,
}
impl SlackUserProfile {
	fn largest_image(&self) -> Option<String> {
		[
			&self.image_original,
			&self.image_512,
			&self.image_192,
			&self.image_72,
			&self.image_48,
			&self.image_32,
			&self.image_24,
		]
		.into_iter()
		.flatten()
		.find(|url| !url.is_empty())
		.cloned()
	}
}

/// Fetches and normalizes the profile of the user who completed a login.
pub struct ProfileFetcher<C, M>
where
	C: ?Sized + StrategyHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	profile_url: Url,
	quirks: ProviderQuirks,
	http_client: Arc<C>,
	transport_mapper: Arc<M>,
	classifier: Arc<dyn ErrorClassifier>,
}
impl<C, M> ProfileFetcher<C, M>
where
	C: ?Sized + StrategyHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates a fetcher for `profile_url`.
	pub fn new(
		profile_url: Url,
		quirks: ProviderQuirks,
		http_client: Arc<C>,
		transport_mapper: Arc<M>,
		classifier: Arc<dyn ErrorClassifier>,
	) -> Self {
		Self { profile_url, quirks, http_client, transport_mapper, classifier }
	}

	/// Builds the `users.info` request for an exchange result.
	pub fn request(&self, tokens: &ExchangedTokens) -> Result<HttpRequest> {
		let mut url = self.profile_url.clone();

		url.query_pairs_mut()
			.append_pair("user", tokens.user_id())
			.append_pair("token", tokens.workspace_token().expose());

		let request = oauth2::http::Request::builder()
			.method(Method::GET)
			.uri(url.as_str())
			.header(ACCEPT, "application/json")
			.body(Vec::new())
			.map_err(ConfigError::from)?;

		Ok(request)
	}

	/// Issues one `users.info` call and maps the answer into a [`SlackProfile`].
	///
	/// - Transport failures and non-2xx statuses fail with [`Error::Transport`].
	/// - A body that is not JSON, or an acknowledged body without a well-formed `user`, fails
	///   with [`Error::ProfileParse`].
	/// - `ok: false` fails with [`Error::Provider`] carrying Slack's `error` code, or
	///   `unknown_error` when Slack sent none (unless
	///   [`lenient_profile_ack`](ProviderQuirks::lenient_profile_ack) is set).
	pub fn fetch<'a>(&'a self, tokens: &'a ExchangedTokens) -> FlowFuture<'a, SlackProfile> {
		Box::pin(async move {
			let request = self.request(tokens)?;
			let slot = ResponseMetadataSlot::default();
			let handle = self.http_client.with_metadata(slot.clone());
			let response = handle.call(request).await.map_err(|err| {
				self.transport_mapper.map_transport_error(
					Endpoint::UsersInfo,
					slot.take().as_ref(),
					err,
				)
			})?;
			let status = response.status();

			if !status.is_success() {
				return Err(TransportError::UnexpectedStatus {
					endpoint: Endpoint::UsersInfo,
					status: status.as_u16(),
					retry_after: meta_retry_after(slot.take().as_ref()),
				}
				.into());
			}

			self.parse(Some(status.as_u16()), response.body())
		})
	}

	fn parse(&self, status: Option<u16>, body: &[u8]) -> Result<SlackProfile> {
		let mut de = serde_json::Deserializer::from_slice(body);
		let raw: Value = serde_path_to_error::deserialize(&mut de)
			.map_err(|source| Error::ProfileParse { source, status })?;
		let envelope: SlackEnvelope = serde_path_to_error::deserialize(&raw)
			.map_err(|source| Error::ProfileParse { source, status })?;

		if !envelope.ok {
			match envelope.error {
				Some(code) =>
					return Err(provider_error(
						self.classifier.as_ref(),
						Endpoint::UsersInfo,
						code,
						envelope.detail,
						status,
					)
					.into()),
				None if !self.quirks.lenient_profile_ack =>
					return Err(provider_error(
						self.classifier.as_ref(),
						Endpoint::UsersInfo,
						"unknown_error".into(),
						None,
						status,
					)
					.into()),
				None => {},
			}
		}

		let UsersInfo { user } = serde_path_to_error::deserialize(&raw)
			.map_err(|source| Error::ProfileParse { source, status })?;
		let user_value = raw.get("user").cloned().unwrap_or(Value::Null);

		Ok(SlackProfile {
			provider: PROVIDER.into(),
			display_name: user.display_name(),
			email: user.profile.email.clone().filter(|email| !email.is_empty()),
			team_id: user.team_id.clone(),
			avatar: user.profile.largest_image(),
			id: user.id,
			user: user_value,
			raw,
		})
	}
}
impl<C, M> Debug for ProfileFetcher<C, M>
where
	C: ?Sized + StrategyHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ProfileFetcher")
			.field("profile_url", &self.profile_url.as_str())
			.field("quirks", &self.quirks)
			.finish()
	}
}

impl<C, M> SlackStrategy<C, M>
where
	C: ?Sized + StrategyHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Fetches the normalized profile for a completed exchange.
	pub async fn user_profile(&self, tokens: &ExchangedTokens) -> Result<SlackProfile> {
		let fetcher = self.profile_fetcher();

		obs::observe(FlowStage::ProfileFetch, "user_profile", fetcher.fetch(tokens)).await
	}
}
