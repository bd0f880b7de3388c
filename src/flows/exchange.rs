//! Code exchange with the user-token rewrite.
//!
//! Slack's `oauth.v2.access` returns two tokens: a top-level workspace (bot) token and, nested
//! under `authed_user`, the token issued for the installing user's `user_scope`. Sign-in cares
//! about the user, so the adapter delivers the nested token and keeps the full payload on the
//! returned [`ExchangedTokens`] for the profile lookup.

// self
use crate::{
	_prelude::*,
	auth::{ExchangedTokens, RawExchangeResponse},
	flows::{FlowFuture, SlackStrategy},
	http::StrategyHttpClient,
	obs::{self, FlowStage},
	oauth::{CodeExchange, ExchangeParams, TransportErrorMapper},
};

/// Wraps a [`CodeExchange`] and rewrites its result to the user-level token.
#[derive(Clone)]
pub struct TokenExchangeAdapter {
	inner: Arc<dyn CodeExchange>,
}
impl TokenExchangeAdapter {
	/// Wraps the generic exchange client.
	pub fn new(inner: Arc<dyn CodeExchange>) -> Self {
		Self { inner }
	}

	/// Exchanges `code` and substitutes `authed_user.access_token` for the top-level token.
	///
	/// Failures of the wrapped client propagate unchanged. A successful exchange whose payload
	/// lacks `authed_user`, `authed_user.id`, or `authed_user.access_token` fails with
	/// [`Error::ExchangeParse`]. The refresh token passes through untouched.
	pub fn exchange<'a>(
		&'a self,
		code: &'a str,
		params: &'a ExchangeParams,
	) -> FlowFuture<'a, ExchangedTokens> {
		Box::pin(async move {
			let grant = self.inner.exchange_code(code, params).await?;
			let raw = RawExchangeResponse::from_params(grant.params)
				.map_err(|source| Error::ExchangeParse { source, status: None })?;

			Ok(ExchangedTokens {
				access_token: raw.authed_user.access_token.clone(),
				refresh_token: grant.refresh_token,
				raw,
			})
		})
	}
}
impl Debug for TokenExchangeAdapter {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("TokenExchangeAdapter(..)")
	}
}

impl<C, M> SlackStrategy<C, M>
where
	C: ?Sized + StrategyHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Exchanges an authorization code for the attempt's tokens.
	pub async fn exchange_code(
		&self,
		code: &str,
		params: &ExchangeParams,
	) -> Result<ExchangedTokens> {
		obs::observe(FlowStage::TokenExchange, "exchange_code", self.exchange.exchange(code, params))
			.await
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use serde_json::{Map, Value, json};
	// self
	use super::*;
	use crate::{
		auth::TokenSecret,
		error::ProviderError,
		oauth::{ExchangeFuture, TokenGrant},
		provider::{Endpoint, ProviderErrorKind},
	};

	struct StaticExchange(Value);
	impl CodeExchange for StaticExchange {
		fn exchange_code<'a>(
			&'a self,
			_code: &'a str,
			_params: &'a ExchangeParams,
		) -> ExchangeFuture<'a, TokenGrant> {
			let params = match self.0.clone() {
				Value::Object(map) => map,
				_ => Map::new(),
			};

			Box::pin(async move {
				let access_token = params
					.get("access_token")
					.and_then(Value::as_str)
					.map(TokenSecret::new)
					.unwrap_or_else(|| TokenSecret::new(""));
				let refresh_token =
					params.get("refresh_token").and_then(Value::as_str).map(TokenSecret::new);

				Ok(TokenGrant { access_token, refresh_token, params })
			})
		}
	}

	struct FailingExchange;
	impl CodeExchange for FailingExchange {
		fn exchange_code<'a>(
			&'a self,
			_code: &'a str,
			_params: &'a ExchangeParams,
		) -> ExchangeFuture<'a, TokenGrant> {
			Box::pin(async {
				Err(ProviderError {
					endpoint: Endpoint::Token,
					kind: ProviderErrorKind::InvalidGrant,
					code: "invalid_code".into(),
					description: None,
				}
				.into())
			})
		}
	}

	fn adapter(payload: Value) -> TokenExchangeAdapter {
		TokenExchangeAdapter::new(Arc::new(StaticExchange(payload)))
	}

	#[tokio::test]
	async fn rewrites_access_token_to_user_token() {
		let tokens = adapter(json!({
			"access_token": "bot-1",
			"refresh_token": "refresh-1",
			"authed_user": { "id": "U1", "access_token": "user-1" }
		}))
		.exchange("code", &ExchangeParams::default())
		.await
		.expect("Exchange with a nested user token should succeed.");

		assert_eq!(tokens.access_token.expose(), "user-1");
		assert_eq!(tokens.workspace_token().expose(), "bot-1");
		assert_eq!(tokens.refresh_token.as_ref().map(TokenSecret::expose), Some("refresh-1"));
		assert_eq!(&**tokens.user_id(), "U1");
	}

	#[tokio::test]
	async fn missing_authed_user_is_a_parse_failure() {
		let err = adapter(json!({ "access_token": "bot-1" }))
			.exchange("code", &ExchangeParams::default())
			.await
			.expect_err("Payload without `authed_user` should be rejected.");

		assert!(matches!(err, Error::ExchangeParse { .. }));
	}

	#[tokio::test]
	async fn missing_user_token_is_a_parse_failure() {
		let err = adapter(json!({ "access_token": "bot-1", "authed_user": { "id": "U1" } }))
			.exchange("code", &ExchangeParams::default())
			.await
			.expect_err("Payload without a user token should be rejected.");

		match err {
			Error::ExchangeParse { source, .. } =>
				assert!(source.path().to_string().contains("authed_user")),
			other => panic!("Unexpected error: {other:?}."),
		}
	}

	#[tokio::test]
	async fn inner_failures_propagate_unchanged() {
		let err = TokenExchangeAdapter::new(Arc::new(FailingExchange))
			.exchange("code", &ExchangeParams::default())
			.await
			.expect_err("Inner failure should propagate.");

		assert_eq!(err.provider_code(), Some("invalid_code"));
	}
}
