//! Generic OAuth 2.0 code-exchange client and its `oauth2`-crate implementation.
//!
//! [`CodeExchange`] is the seam the strategy composes over: it performs the standard
//! authorization-code-for-token call and hands back the tokens together with every field of the
//! provider payload. Slack-specific behavior (the user-token rewrite) lives one layer up in
//! [`TokenExchangeAdapter`](crate::flows::TokenExchangeAdapter), so any implementation of this
//! trait can be swapped in without touching it.

pub use oauth2;

// std
use std::borrow::Cow;
// crates.io
use oauth2::{
	AuthType, AuthorizationCode, Client, ClientId, ClientSecret, EndpointNotSet, EndpointSet,
	ExtraTokenFields, HttpClientError, RedirectUrl, RequestTokenError, StandardRevocableToken,
	StandardTokenResponse, TokenResponse, TokenUrl,
	basic::{
		BasicErrorResponse, BasicRequestTokenError, BasicRevocationErrorResponse,
		BasicTokenIntrospectionResponse, BasicTokenType,
	},
};
use serde_json::{Map, Value};
// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	error::{ConfigError, ProviderError, TransportError},
	http::{ResponseMetadata, ResponseMetadataSlot, StrategyHttpClient},
	provider::{ClientAuthMethod, Endpoint, ErrorClassifier, ProviderErrorContext, StrategyConfig},
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestHttpClient;

type SlackTokenResponse = StandardTokenResponse<RawTokenFields, BasicTokenType>;
type SlackClient<HasTokenUrl> = Client<
	BasicErrorResponse,
	SlackTokenResponse,
	BasicTokenIntrospectionResponse,
	StandardRevocableToken,
	BasicRevocationErrorResponse,
	EndpointNotSet,
	EndpointNotSet,
	EndpointNotSet,
	EndpointNotSet,
	HasTokenUrl,
>;

/// Boxed future returned by [`CodeExchange`] implementations.
pub type ExchangeFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + 'a + Send>>;

/// Generic authorization-code exchange.
pub trait CodeExchange: Send + Sync {
	/// Exchanges `code` for tokens.
	///
	/// Implementations return the top-level tokens exactly as issued plus every field of the
	/// response payload in [`TokenGrant::params`].
	fn exchange_code<'a>(
		&'a self,
		code: &'a str,
		params: &'a ExchangeParams,
	) -> ExchangeFuture<'a, TokenGrant>;
}

/// Per-call parameters for [`CodeExchange::exchange_code`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExchangeParams {
	/// Redirect URI override; the configured callback URL is used when unset.
	pub redirect_uri: Option<Url>,
	/// Additional form parameters appended to the token request.
	pub extra: Vec<(String, String)>,
}
impl ExchangeParams {
	/// Overrides the redirect URI sent with the exchange.
	pub fn with_redirect_uri(mut self, redirect_uri: Url) -> Self {
		self.redirect_uri = Some(redirect_uri);

		self
	}

	/// Appends an extra form parameter.
	pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.extra.push((key.into(), value.into()));

		self
	}
}

/// Tokens plus the raw payload returned by a generic exchange.
#[derive(Clone)]
pub struct TokenGrant {
	/// Top-level access token.
	pub access_token: TokenSecret,
	/// Top-level refresh token, if issued.
	pub refresh_token: Option<TokenSecret>,
	/// Every field of the provider payload, including the two above.
	pub params: Map<String, Value>,
}
impl Debug for TokenGrant {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenGrant")
			.field("access_token", &self.access_token)
			.field("refresh_token_set", &self.refresh_token.is_some())
			.field("param_keys", &self.params.keys().collect::<Vec<_>>())
			.finish()
	}
}

/// Captures every non-standard field of the token response.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RawTokenFields {
	#[serde(flatten)]
	fields: Map<String, Value>,
}
impl ExtraTokenFields for RawTokenFields {}

/// Maps HTTP transport failures into strategy [`Error`] values.
pub trait TransportErrorMapper<E>
where
	Self: 'static + Send + Sync,
	E: 'static + Send + Sync + StdError,
{
	/// Converts an [`HttpClientError`] emitted by the transport into a strategy error.
	fn map_transport_error(
		&self,
		endpoint: Endpoint,
		metadata: Option<&ResponseMetadata>,
		error: HttpClientError<E>,
	) -> Error;
}

/// Default mapper for reqwest-backed transports.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransportErrorMapper;
#[cfg(feature = "reqwest")]
impl TransportErrorMapper<ReqwestError> for ReqwestTransportErrorMapper {
	fn map_transport_error(
		&self,
		endpoint: Endpoint,
		meta: Option<&ResponseMetadata>,
		err: HttpClientError<ReqwestError>,
	) -> Error {
		match err {
			HttpClientError::Reqwest(inner) => map_reqwest_error(endpoint, *inner),
			HttpClientError::Http(inner) => ConfigError::from(inner).into(),
			HttpClientError::Io(source) => TransportError::Io { endpoint, source }.into(),
			HttpClientError::Other(message) => map_generic_transport_error(endpoint, meta, message),
			_ => map_generic_transport_error(endpoint, meta, "unknown transport failure"),
		}
	}
}

/// [`CodeExchange`] backed by the `oauth2` crate.
///
/// Built once from a [`StrategyConfig`]; the token URL, client credentials, client
/// authentication method, and redirect URI are fixed at construction.
pub struct OAuth2CodeExchange<C, M>
where
	C: ?Sized + StrategyHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	oauth_client: SlackClient<EndpointSet>,
	http_client: Arc<C>,
	error_mapper: Arc<M>,
	classifier: Arc<dyn ErrorClassifier>,
}
impl<C, M> OAuth2CodeExchange<C, M>
where
	C: ?Sized + StrategyHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Builds the exchange client from the strategy configuration.
	pub fn from_config(
		config: &StrategyConfig,
		http_client: impl Into<Arc<C>>,
		error_mapper: impl Into<Arc<M>>,
		classifier: Arc<dyn ErrorClassifier>,
	) -> Self {
		let auth_type = match config.client_auth_method {
			ClientAuthMethod::ClientSecretPost => AuthType::RequestBody,
			ClientAuthMethod::ClientSecretBasic => AuthType::BasicAuth,
		};
		let oauth_client = SlackClient::<EndpointNotSet>::new(ClientId::new(
			config.client_id.clone(),
		))
		.set_client_secret(ClientSecret::new(config.client_secret.expose().to_owned()))
		.set_token_uri(TokenUrl::from_url(config.endpoints.token.clone()))
		.set_redirect_uri(RedirectUrl::from_url(config.callback_url.clone()))
		.set_auth_type(auth_type);

		Self {
			oauth_client,
			http_client: http_client.into(),
			error_mapper: error_mapper.into(),
			classifier,
		}
	}
}
impl<C, M> CodeExchange for OAuth2CodeExchange<C, M>
where
	C: ?Sized + StrategyHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn exchange_code<'a>(
		&'a self,
		code: &'a str,
		params: &'a ExchangeParams,
	) -> ExchangeFuture<'a, TokenGrant> {
		let meta = ResponseMetadataSlot::default();

		Box::pin(async move {
			let instrumented = self.http_client.with_metadata(meta.clone());
			let mut request = self.oauth_client.exchange_code(AuthorizationCode::new(code.to_owned()));

			if let Some(redirect) = &params.redirect_uri {
				request = request.set_redirect_uri(Cow::Owned(RedirectUrl::from_url(redirect.clone())));
			}
			for (key, value) in &params.extra {
				request = request.add_extra_param(key.clone(), value.clone());
			}

			let response = request.request_async(&instrumented).await.map_err(|err| {
				map_request_error(
					self.classifier.as_ref(),
					meta.take(),
					err,
					self.error_mapper.as_ref(),
				)
			})?;

			map_token_response(response)
		})
	}
}

#[cfg(feature = "reqwest")]
/// Exchange client specialized for the crate's default reqwest transport.
pub type ReqwestCodeExchange = OAuth2CodeExchange<ReqwestHttpClient, ReqwestTransportErrorMapper>;

/// Slack's failure envelope: `{"ok": false, "error": "..."}`.
#[derive(Debug, Deserialize)]
pub(crate) struct SlackEnvelope {
	#[serde(default)]
	pub(crate) ok: bool,
	pub(crate) error: Option<String>,
	pub(crate) detail: Option<String>,
}

fn map_token_response(response: SlackTokenResponse) -> Result<TokenGrant> {
	let access_token = TokenSecret::new(response.access_token().secret().to_owned());
	let refresh_token = response.refresh_token().map(|token| TokenSecret::new(token.secret().to_owned()));
	let params = match serde_path_to_error::serialize(&response, serde_json::value::Serializer)
		.map_err(|source| Error::ExchangeParse { source, status: None })?
	{
		Value::Object(map) => map,
		_ => Map::new(),
	};

	Ok(TokenGrant { access_token, refresh_token, params })
}

fn map_request_error<E, M>(
	classifier: &dyn ErrorClassifier,
	meta: Option<ResponseMetadata>,
	err: BasicRequestTokenError<HttpClientError<E>>,
	mapper: &M,
) -> Error
where
	E: 'static + Send + Sync + StdError,
	M: ?Sized + TransportErrorMapper<E>,
{
	let meta_ref = meta.as_ref();

	match err {
		RequestTokenError::ServerResponse(response) => {
			let description = response.error_description().cloned();

			provider_error(
				classifier,
				Endpoint::Token,
				response.error().as_ref().to_string(),
				description,
				meta_status(meta_ref),
			)
			.into()
		},
		RequestTokenError::Request(error) =>
			mapper.map_transport_error(Endpoint::Token, meta_ref, error),
		RequestTokenError::Parse(source, body) => {
			let status = meta_status(meta_ref);

			if let Ok(envelope) = serde_json::from_slice::<SlackEnvelope>(&body)
				&& !envelope.ok
			{
				return provider_error(
					classifier,
					Endpoint::Token,
					envelope.error.unwrap_or_else(|| "unknown_error".into()),
					envelope.detail,
					status,
				)
				.into();
			}
			if let Some(code) = status.filter(|code| !(200..300).contains(code)) {
				return TransportError::UnexpectedStatus {
					endpoint: Endpoint::Token,
					status: code,
					retry_after: meta_retry_after(meta_ref),
				}
				.into();
			}

			Error::ExchangeParse { source, status }
		},
		RequestTokenError::Other(message) => TransportError::Other {
			endpoint: Endpoint::Token,
			message: format!("Token endpoint returned an unexpected response: {message}"),
		}
		.into(),
	}
}

/// Builds a classified [`ProviderError`].
pub(crate) fn provider_error(
	classifier: &dyn ErrorClassifier,
	endpoint: Endpoint,
	code: String,
	description: Option<String>,
	status: Option<u16>,
) -> ProviderError {
	let mut ctx = ProviderErrorContext::new(endpoint, code);

	if let Some(description) = &description {
		ctx = ctx.with_description(description.clone());
	}
	if let Some(status) = status {
		ctx = ctx.with_http_status(status);
	}

	let kind = classifier.classify(&ctx);

	ProviderError { endpoint, kind, code: ctx.code, description }
}

#[cfg(feature = "reqwest")]
fn map_reqwest_error(endpoint: Endpoint, err: ReqwestError) -> Error {
	if err.is_builder() {
		return ConfigError::from(err).into();
	}
	if err.is_timeout() {
		return TransportError::Timeout { endpoint }.into();
	}

	TransportError::network(endpoint, err).into()
}

#[cfg(feature = "reqwest")]
fn map_generic_transport_error(
	endpoint: Endpoint,
	meta: Option<&ResponseMetadata>,
	message: impl Display,
) -> Error {
	match meta_status(meta).filter(|code| !(200..300).contains(code)) {
		Some(status) => TransportError::UnexpectedStatus {
			endpoint,
			status,
			retry_after: meta_retry_after(meta),
		}
		.into(),
		None => TransportError::Other { endpoint, message: message.to_string() }.into(),
	}
}

pub(crate) fn meta_status(meta: Option<&ResponseMetadata>) -> Option<u16> {
	meta.and_then(|value| value.status)
}

pub(crate) fn meta_retry_after(meta: Option<&ResponseMetadata>) -> Option<Duration> {
	meta.and_then(|value| value.retry_after)
}

#[cfg(all(test, feature = "reqwest"))]
mod tests {
	// self
	use super::*;
	use crate::provider::{ProviderErrorKind, SlackErrorClassifier};

	fn config(method: ClientAuthMethod) -> StrategyConfig {
		StrategyConfig::builder()
			.client_id("client-id")
			.client_secret("secret")
			.callback_url("https://app.example.com/callback")
			.client_auth_method(method)
			.build()
			.expect("Failed to build strategy config.")
	}

	#[test]
	fn builds_exchange_for_both_auth_methods() {
		for method in [ClientAuthMethod::ClientSecretPost, ClientAuthMethod::ClientSecretBasic] {
			let _exchange = <ReqwestCodeExchange>::from_config(
				&config(method),
				Arc::new(ReqwestHttpClient::default()),
				Arc::new(ReqwestTransportErrorMapper),
				Arc::new(SlackErrorClassifier),
			);
		}
	}

	#[test]
	fn provider_error_keeps_code_and_classifies() {
		let err = provider_error(
			&SlackErrorClassifier,
			Endpoint::Token,
			"code_already_used".into(),
			Some("Code was redeemed.".into()),
			Some(200),
		);

		assert_eq!(err.kind, ProviderErrorKind::InvalidGrant);
		assert_eq!(err.code, "code_already_used");
		assert_eq!(err.description.as_deref(), Some("Code was redeemed."));
	}

	#[test]
	fn token_grant_debug_hides_secrets() {
		let grant = TokenGrant {
			access_token: TokenSecret::new("xoxb-secret"),
			refresh_token: Some(TokenSecret::new("xoxe-secret")),
			params: Map::from_iter([("access_token".into(), Value::from("xoxb-secret"))]),
		};
		let rendered = format!("{grant:?}");

		assert!(!rendered.contains("xoxb-secret"));
		assert!(!rendered.contains("xoxe-secret"));
		assert!(rendered.contains("refresh_token_set: true"));
	}
}
