//! Login orchestration on top of the generic code exchange.
//!
//! [`SlackStrategy`] composes three parts: the immutable [`StrategyConfig`], a
//! [`TokenExchangeAdapter`] wrapping any [`CodeExchange`], and a [`ProfileFetcher`] bound to the
//! same transport. Per-attempt data (the raw exchange payload, the tokens, the profile) only ever
//! travels through return values, so one strategy can be shared behind an [`Arc`] by every
//! request handler in the host.

pub mod authorize;
pub mod exchange;
pub mod login;
pub mod profile;

pub use authorize::*;
pub use exchange::*;
pub use login::*;
pub use profile::*;

// self
use crate::{
	_prelude::*,
	http::StrategyHttpClient,
	oauth::{CodeExchange, OAuth2CodeExchange, TransportErrorMapper},
	provider::{ErrorClassifier, SlackErrorClassifier, StrategyConfig, StrategyOptions},
};
#[cfg(feature = "reqwest")]
use crate::{http::ReqwestHttpClient, oauth::ReqwestTransportErrorMapper};

/// Boxed future returned by the exchange adapter and the profile fetcher.
pub type FlowFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + 'a + Send>>;

#[cfg(feature = "reqwest")]
/// Strategy specialized for the crate's default reqwest transport stack.
pub type ReqwestSlackStrategy = SlackStrategy<ReqwestHttpClient, ReqwestTransportErrorMapper>;

/// Sign in with Slack.
///
/// The strategy owns the configuration, the HTTP transport, the transport error mapper, and the
/// error classifier. Both outbound calls of a login (`oauth.v2.access` and `users.info`) reuse the
/// same transport.
pub struct SlackStrategy<C, M>
where
	C: ?Sized + StrategyHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	config: Arc<StrategyConfig>,
	http_client: Arc<C>,
	transport_mapper: Arc<M>,
	classifier: Arc<dyn ErrorClassifier>,
	exchange: TokenExchangeAdapter,
	custom_exchange: bool,
}
impl<C, M> SlackStrategy<C, M>
where
	C: ?Sized + StrategyHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates a strategy that reuses the caller-provided transport + mapper pair.
	pub fn with_http_client(
		config: StrategyConfig,
		http_client: impl Into<Arc<C>>,
		mapper: impl Into<Arc<M>>,
	) -> Self {
		let config = Arc::new(config);
		let http_client = http_client.into();
		let transport_mapper = mapper.into();
		let classifier: Arc<dyn ErrorClassifier> = Arc::new(SlackErrorClassifier);
		let exchange = default_exchange(&config, &http_client, &transport_mapper, &classifier);

		Self {
			config,
			http_client,
			transport_mapper,
			classifier,
			exchange,
			custom_exchange: false,
		}
	}

	/// Replaces the generic code-exchange client.
	///
	/// The replacement is wrapped in a [`TokenExchangeAdapter`], so the user-token rewrite
	/// applies to it exactly as it does to the built-in client.
	pub fn with_code_exchange(mut self, exchange: Arc<dyn CodeExchange>) -> Self {
		self.exchange = TokenExchangeAdapter::new(exchange);
		self.custom_exchange = true;

		self
	}

	/// Replaces the error classifier used for every provider-reported failure.
	pub fn with_error_classifier(mut self, classifier: Arc<dyn ErrorClassifier>) -> Self {
		self.classifier = classifier;

		if !self.custom_exchange {
			self.exchange = default_exchange(
				&self.config,
				&self.http_client,
				&self.transport_mapper,
				&self.classifier,
			);
		}

		self
	}

	/// Immutable configuration this strategy was built from.
	pub fn config(&self) -> &StrategyConfig {
		&self.config
	}

	/// Strategy name hosts route on.
	pub fn name(&self) -> &str {
		&self.config.name
	}

	/// Exchange adapter used by [`authenticate`](Self::authenticate).
	pub fn exchange_adapter(&self) -> &TokenExchangeAdapter {
		&self.exchange
	}

	/// Profile fetcher bound to this strategy's transport and configuration.
	pub fn profile_fetcher(&self) -> ProfileFetcher<C, M> {
		ProfileFetcher::new(
			self.config.endpoints.profile.clone(),
			self.config.quirks,
			self.http_client.clone(),
			self.transport_mapper.clone(),
			self.classifier.clone(),
		)
	}
}
#[cfg(feature = "reqwest")]
impl SlackStrategy<ReqwestHttpClient, ReqwestTransportErrorMapper> {
	/// Creates a strategy backed by its own reqwest transport.
	pub fn new(config: StrategyConfig) -> Self {
		Self::with_http_client(
			config,
			ReqwestHttpClient::default(),
			Arc::new(ReqwestTransportErrorMapper),
		)
	}

	/// Validates host options and creates a reqwest-backed strategy.
	pub fn from_options(options: StrategyOptions) -> Result<Self> {
		Ok(Self::new(options.into_config()?))
	}
}
impl<C, M> Debug for SlackStrategy<C, M>
where
	C: ?Sized + StrategyHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("SlackStrategy")
			.field("name", &self.config.name)
			.field("client_id", &self.config.client_id)
			.field("callback_url", &self.config.callback_url.as_str())
			.field("custom_exchange", &self.custom_exchange)
			.finish()
	}
}

fn default_exchange<C, M>(
	config: &StrategyConfig,
	http_client: &Arc<C>,
	transport_mapper: &Arc<M>,
	classifier: &Arc<dyn ErrorClassifier>,
) -> TokenExchangeAdapter
where
	C: ?Sized + StrategyHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	let exchange = <OAuth2CodeExchange<C, M>>::from_config(
		config,
		http_client.clone(),
		transport_mapper.clone(),
		classifier.clone(),
	);

	TokenExchangeAdapter::new(Arc::new(exchange))
}

#[cfg(all(test, feature = "reqwest"))]
mod tests {
	// self
	use super::*;

	#[test]
	fn strategy_is_send_sync_and_debug_hides_secret() {
		fn assert_send_sync<T: Send + Sync>() {}

		assert_send_sync::<ReqwestSlackStrategy>();

		let strategy = SlackStrategy::new(
			StrategyConfig::builder()
				.client_id("client")
				.client_secret("very-secret")
				.callback_url("https://app.example.com/callback")
				.build()
				.expect("Config should build."),
		);
		let rendered = format!("{strategy:?}");

		assert_eq!(strategy.name(), "slack");
		assert!(rendered.contains("client"));
		assert!(!rendered.contains("very-secret"));
	}

	#[test]
	fn from_options_surfaces_config_errors() {
		let err = SlackStrategy::from_options(StrategyOptions::default())
			.expect_err("Empty options should be rejected.");

		assert!(matches!(err, Error::Config(_)));
	}
}
