//! Bearer credentials for the two scopes the service talks to the catalog with.
//!
//! Searches run on the application's own token; collection writes run on the
//! requesting user's token. Keeping them as distinct types means one can never be
//! handed to an operation expecting the other.
use std::fmt;

use crate::util::redact::redact;

/// Application-level token from the client-credentials grant.
#[derive(Clone, PartialEq, Eq)]
pub struct AppToken(String);

/// A caller's own authorization token.
#[derive(Clone, PartialEq, Eq)]
pub struct UserToken(String);

impl AppToken {
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    #[must_use]
    pub fn secret(&self) -> &str {
        &self.0
    }
}

impl UserToken {
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    #[must_use]
    pub fn secret(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AppToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AppToken").field(&redact(&self.0)).finish()
    }
}

impl fmt::Debug for UserToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("UserToken").field(&redact(&self.0)).finish()
    }
}
