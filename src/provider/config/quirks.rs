// self
use crate::_prelude::*;

/// Provider-specific quirks that influence how the strategy behaves.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderQuirks {
	/// Character used to join workspace scopes in the `scope` parameter.
	pub scope_delimiter: char,
	/// Treat a `users.info` response with `ok: false` and no `error` field as success.
	///
	/// Older integrations relied on this pass-through; it is off by default and such
	/// responses fail with the `unknown_error` code.
	pub lenient_profile_ack: bool,
}
impl Default for ProviderQuirks {
	fn default() -> Self {
		Self { scope_delimiter: ' ', lenient_profile_ack: false }
	}
}
