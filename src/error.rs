//! Strategy-level error types shared across configuration, exchange, and profile fetches.

// self
use crate::{
	_prelude::*,
	provider::{Endpoint, ProviderErrorKind},
};

/// Strategy-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Boxed error used where the concrete source type belongs to a collaborator.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical strategy error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure (DNS, TCP, TLS, unexpected HTTP status).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Slack explicitly reported a failure.
	#[error(transparent)]
	Provider(#[from] ProviderError),

	/// Token endpoint responded with a payload that does not match the expected shape.
	#[error("Token endpoint returned a malformed payload.")]
	ExchangeParse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
	/// Profile endpoint responded with a body that could not be parsed.
	#[error("Failed to parse the user profile.")]
	ProfileParse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
	/// Authorization callback could not be matched to its session.
	#[error("Authorization callback rejected: {reason}.")]
	InvalidState {
		/// Human-readable reason.
		reason: String,
	},
	/// Host verifier refused the login.
	#[error("Verifier rejected the login.")]
	Verify {
		/// Error returned by the host verifier.
		#[source]
		source: BoxError,
	},
}
impl Error {
	/// Returns the provider error code when Slack reported the failure.
	pub fn provider_code(&self) -> Option<&str> {
		match self {
			Self::Provider(e) => Some(e.code.as_str()),
			_ => None,
		}
	}
}

/// Configuration and validation failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// A required option was not supplied.
	#[error("Missing required option `{option}`.")]
	MissingOption {
		/// Option name as it appears in host configuration.
		option: &'static str,
	},
	/// An endpoint or callback URL cannot be parsed.
	#[error("Option `{option}` is not a valid URL.")]
	InvalidUrl {
		/// Option name as it appears in host configuration.
		option: &'static str,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// An endpoint uses a scheme the strategy refuses to talk to.
	#[error("The {endpoint} endpoint must use HTTPS: {url}.")]
	InsecureEndpoint {
		/// Which endpoint failed validation.
		endpoint: &'static str,
		/// Endpoint URL that failed validation.
		url: String,
	},
	/// Requested scopes cannot be normalized.
	#[error("Requested scopes are invalid.")]
	InvalidScope(#[from] crate::auth::ScopeValidationError),
	/// Scope delimiter is a control character.
	#[error("Scope delimiter must be a printable character.")]
	InvalidScopeDelimiter {
		/// Invalid delimiter that was supplied.
		delimiter: char,
	},
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// HTTP request construction failed.
	#[error(transparent)]
	HttpRequest(#[from] oauth2::http::Error),
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Transport-level failures (network, IO, HTTP status).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the {endpoint} endpoint.")]
	Network {
		/// Endpoint being called.
		endpoint: Endpoint,
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the {endpoint} endpoint.")]
	Io {
		/// Endpoint being called.
		endpoint: Endpoint,
		/// IO failure.
		#[source]
		source: std::io::Error,
	},
	/// Request timed out before a response arrived.
	#[error("Request to the {endpoint} endpoint timed out.")]
	Timeout {
		/// Endpoint being called.
		endpoint: Endpoint,
	},
	/// Endpoint answered with a non-success HTTP status.
	#[error("The {endpoint} endpoint answered with HTTP {status}.")]
	UnexpectedStatus {
		/// Endpoint being called.
		endpoint: Endpoint,
		/// HTTP status code.
		status: u16,
		/// Retry-After hint from upstream, if supplied.
		retry_after: Option<Duration>,
	},
	/// Transport reported a failure it could not describe further.
	#[error("HTTP client error occurred while calling the {endpoint} endpoint: {message}.")]
	Other {
		/// Endpoint being called.
		endpoint: Endpoint,
		/// Transport-supplied message.
		message: String,
	},
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(endpoint: Endpoint, src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { endpoint, source: Box::new(src) }
	}

	/// Endpoint the failing request targeted.
	pub fn endpoint(&self) -> Endpoint {
		match self {
			Self::Network { endpoint, .. }
			| Self::Io { endpoint, .. }
			| Self::Timeout { endpoint }
			| Self::UnexpectedStatus { endpoint, .. }
			| Self::Other { endpoint, .. } => *endpoint,
		}
	}
}

/// Failure reported by Slack through an `error` field.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
#[error("Slack {endpoint} endpoint reported `{code}`.")]
pub struct ProviderError {
	/// Endpoint that reported the failure.
	pub endpoint: Endpoint,
	/// Classification assigned by the active error classifier.
	pub kind: ProviderErrorKind,
	/// Raw error code (e.g. `user_not_found`, `invalid_code`).
	pub code: String,
	/// Optional human-readable description.
	pub description: Option<String>,
}
