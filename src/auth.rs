use base64::{engine::general_purpose, Engine};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use tracing::debug;

use crate::{error::ClientError, storage::CredentialStore};

/// Opaque credential token. Never decoded client-side.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Encodes `email:password` for HTTP Basic authentication.
    pub fn basic(email: &str, password: &str) -> Self {
        let encoded = general_purpose::STANDARD.encode(format!("{email}:{password}"));
        Self(encoded)
    }

    pub fn from_token(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn token(&self) -> &str {
        &self.0
    }

    pub fn header_value(&self) -> Result<HeaderValue, ClientError> {
        let mut value = HeaderValue::from_str(&format!("Basic {}", self.0))?;
        value.set_sensitive(true);
        Ok(value)
    }

    pub fn headers(&self) -> Result<HeaderMap, ClientError> {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, self.header_value()?);
        Ok(headers)
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Credential(..)")
    }
}

/// Source of the headers attached to every authenticated request.
pub trait AuthProvider: Send + Sync {
    /// Headers for the current session; empty when nobody is signed in.
    fn auth_headers(&self) -> Result<HeaderMap, ClientError>;

    /// Builds the credential a login form would present.
    fn candidate(&self, email: &str, password: &str) -> Credential;

    fn sign_in(&self, credential: &Credential) -> Result<(), ClientError>;

    fn sign_out(&self) -> Result<(), ClientError>;

    fn is_signed_in(&self) -> Result<bool, ClientError> {
        Ok(!self.auth_headers()?.is_empty())
    }
}

/// HTTP Basic auth, resending the stored credential on every call.
#[derive(Debug)]
pub struct BasicAuth<S> {
    store: S,
}

impl<S: CredentialStore> BasicAuth<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

impl<S: CredentialStore> AuthProvider for BasicAuth<S> {
    fn auth_headers(&self) -> Result<HeaderMap, ClientError> {
        match self.store.get()? {
            Some(token) => Credential::from_token(token).headers(),
            None => Ok(HeaderMap::new()),
        }
    }

    fn candidate(&self, email: &str, password: &str) -> Credential {
        Credential::basic(email, password)
    }

    fn sign_in(&self, credential: &Credential) -> Result<(), ClientError> {
        self.store.set(credential.token())?;
        debug!("signed in");
        Ok(())
    }

    fn sign_out(&self) -> Result<(), ClientError> {
        self.store.clear()?;
        debug!("signed out");
        Ok(())
    }
}
