//! Authentication module
//!
//! OAuth2 client-credentials tokens for the resource API.
//!
//! A [`TokenStore`] caches one access token per credential set and performs
//! the token exchange when the cached token is missing, expired, or has been
//! rejected by the server. The [`TokenRegistry`] hands out one shared store
//! per distinct [`Credentials`] value so that concurrent fetches reuse the
//! same token and the same refresh.

mod store;
mod types;

pub use store::{TokenRegistry, TokenSource, TokenStore};
pub use types::{AccessToken, Credentials};
