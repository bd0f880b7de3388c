//! Token secrets and the token-exchange payload.

pub mod exchange;
pub mod secret;
