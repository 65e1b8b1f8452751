//! Credentials and the stores they live in.
//! Keep the public surface thin and split implementation across sub-modules.

mod credential;
mod request_context;
mod session;

pub use credential::{Claims, CredentialDecoder, CredentialError};
pub use request_context::{bearer_token, clear_cookie, parse_cookie, set_cookie, CredentialSource, RequestCredentials};
pub use session::{CachedUser, MemorySessionStore, SessionStore, StoredSession, TOKEN_KEY, USER_KEY};

#[cfg(test)]
pub(crate) use credential::test_tokens;
