//! Callback handling: state validation, exchange, profile, verification.

// self
use crate::{
	_prelude::*,
	auth::{RawExchangeResponse, TokenSecret},
	error::BoxError,
	flows::{AuthorizationSession, SlackProfile, SlackStrategy},
	http::StrategyHttpClient,
	obs::{self, FlowStage},
	oauth::{ExchangeParams, TransportErrorMapper, provider_error},
	provider::Endpoint,
};

/// Query parameters Slack appends to the redirect URI.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallbackParams {
	/// Authorization code, present on success.
	pub code: Option<String>,
	/// State echoed back from the authorization request.
	pub state: Option<String>,
	/// Error code, present when the user declined or Slack refused the request.
	pub error: Option<String>,
	/// Optional error description.
	pub error_description: Option<String>,
}
impl CallbackParams {
	/// Reads the callback parameters from a redirect URL's query string.
	pub fn from_url(url: &Url) -> Self {
		let mut params = Self::default();

		for (key, value) in url.query_pairs() {
			let slot = match key.as_ref() {
				"code" => &mut params.code,
				"state" => &mut params.state,
				"error" => &mut params.error,
				"error_description" => &mut params.error_description,
				_ => continue,
			};

			*slot = Some(value.into_owned());
		}

		params
	}
}

/// Everything a successful login produced, handed to the host verifier.
#[derive(Clone, Debug)]
pub struct Login {
	/// User-level access token (`authed_user.access_token`).
	pub access_token: TokenSecret,
	/// Refresh token as returned by the exchange.
	pub refresh_token: Option<TokenSecret>,
	/// Normalized profile.
	pub profile: SlackProfile,
	/// Full exchange payload of this attempt.
	pub exchange: RawExchangeResponse,
}

/// Host callback that resolves a login to an application user.
pub trait Verify: Send + Sync {
	/// Application user type.
	type User: Send;
	/// Rejection reported by the host.
	type Error: 'static + Send + Sync + StdError;

	/// Resolves or rejects the login.
	fn verify(&self, login: Login) -> impl Future<Output = Result<Self::User, Self::Error>> + Send;
}
impl<F, Fut, U, E> Verify for F
where
	F: Send + Sync + Fn(Login) -> Fut,
	Fut: Send + Future<Output = Result<U, E>>,
	U: Send,
	E: 'static + Send + Sync + StdError,
{
	type Error = E;
	type User = U;

	fn verify(&self, login: Login) -> impl Future<Output = Result<U, E>> + Send {
		self(login)
	}
}

impl<C, M> SlackStrategy<C, M>
where
	C: ?Sized + StrategyHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Completes a login from the provider callback.
	///
	/// Runs, in order: callback error check, state validation against `session`, code exchange,
	/// and profile fetch. Each step only starts when the previous one succeeded; nothing is
	/// retried.
	pub async fn authenticate(
		&self,
		session: &AuthorizationSession,
		callback: &CallbackParams,
	) -> Result<Login> {
		let code = self.check_callback(session, callback, OffsetDateTime::now_utc())?;
		let params = ExchangeParams::default().with_redirect_uri(session.redirect_uri.clone());
		let tokens = self.exchange_code(code, &params).await?;
		let profile = self.user_profile(&tokens).await?;

		Ok(Login {
			access_token: tokens.access_token,
			refresh_token: tokens.refresh_token,
			profile,
			exchange: tokens.raw,
		})
	}

	/// Completes a login and hands it to `verify`.
	///
	/// A verifier rejection surfaces as [`Error::Verify`] carrying the host's error.
	pub async fn authenticate_with<V>(
		&self,
		session: &AuthorizationSession,
		callback: &CallbackParams,
		verify: &V,
	) -> Result<V::User>
	where
		V: Verify,
	{
		let login = self.authenticate(session, callback).await?;

		obs::observe(FlowStage::Verify, "authenticate_with", async move {
			verify
				.verify(login)
				.await
				.map_err(|err| Error::Verify { source: BoxError::from(err) })
		})
		.await
	}

	fn check_callback<'c>(
		&self,
		session: &AuthorizationSession,
		callback: &'c CallbackParams,
		now: OffsetDateTime,
	) -> Result<&'c str> {
		if let Some(code) = &callback.error {
			return Err(provider_error(
				self.classifier.as_ref(),
				Endpoint::Authorization,
				code.clone(),
				callback.error_description.clone(),
				None,
			)
			.into());
		}

		let state = callback
			.state
			.as_deref()
			.ok_or_else(|| Error::InvalidState { reason: "callback is missing `state`".into() })?;

		session.validate_state(state, now, self.config.session_ttl)?;

		callback
			.code
			.as_deref()
			.filter(|code| !code.is_empty())
			.ok_or_else(|| Error::InvalidState { reason: "callback is missing `code`".into() })
	}
}
