//! Authentication models: credentials, token pair, user.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use vitrine_core::{Email, UserId};

use crate::error::{ApiError, ApiResult};

/// The signed-in user as returned by the auth endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Server-side user id.
    #[serde(alias = "_id")]
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Account email.
    pub email: Email,
}

/// Access and refresh token, always held together.
///
/// Both values are opaque; the client never decodes them. `Debug` output is
/// redacted by `secrecy`.
#[derive(Debug, Clone, Deserialize)]
#[serde(from = "TokenPairWire")]
pub struct TokenPair {
    access_token: SecretString,
    refresh_token: SecretString,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenPairWire {
    access_token: String,
    refresh_token: String,
}

impl From<TokenPairWire> for TokenPair {
    fn from(wire: TokenPairWire) -> Self {
        Self::new(wire.access_token, wire.refresh_token)
    }
}

impl TokenPair {
    /// Build a pair from raw token strings.
    #[must_use]
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: SecretString::from(access_token.into()),
            refresh_token: SecretString::from(refresh_token.into()),
        }
    }

    /// Bearer credential for API calls.
    #[must_use]
    pub const fn access_token(&self) -> &SecretString {
        &self.access_token
    }

    /// Credential used only against `/auth/refresh` and `/auth/logout`.
    #[must_use]
    pub const fn refresh_token(&self) -> &SecretString {
        &self.refresh_token
    }

    /// Whether `token` is this pair's refresh token.
    pub(crate) fn has_refresh_token(&self, token: &SecretString) -> bool {
        self.refresh_token.expose_secret() == token.expose_secret()
    }
}

/// Response body of `/auth/login` and `/auth/register`.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    /// Newly minted tokens.
    #[serde(flatten)]
    pub tokens: TokenPair,
    /// The authenticated user.
    pub user: User,
}

/// Sign-in input. Transient; never persisted.
#[derive(Debug, Clone)]
pub enum Credentials {
    /// Existing account.
    Login {
        /// Account email.
        email: Email,
        /// Account password.
        password: SecretString,
    },
    /// New account.
    Register {
        /// Display name (non-blank, trimmed).
        name: String,
        /// Account email.
        email: Email,
        /// Chosen password.
        password: SecretString,
    },
}

impl Credentials {
    /// Credentials for an existing account.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::InvalidInput` if the email does not parse or the
    /// password is empty.
    pub fn login(email: &str, password: &str) -> ApiResult<Self> {
        Ok(Self::Login {
            email: Email::parse(email)?,
            password: non_empty_password(password)?,
        })
    }

    /// Credentials for a new account.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::InvalidInput` if the name is blank, the email does
    /// not parse, or the password is empty.
    pub fn register(name: &str, email: &str, password: &str) -> ApiResult<Self> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ApiError::InvalidInput("name is required".to_string()));
        }

        Ok(Self::Register {
            name: name.to_owned(),
            email: Email::parse(email)?,
            password: non_empty_password(password)?,
        })
    }

    /// The email the credentials are for.
    #[must_use]
    pub const fn email(&self) -> &Email {
        match self {
            Self::Login { email, .. } | Self::Register { email, .. } => email,
        }
    }
}

fn non_empty_password(password: &str) -> ApiResult<SecretString> {
    if password.is_empty() {
        return Err(ApiError::InvalidInput("password is required".to_string()));
    }
    Ok(SecretString::from(password.to_owned()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_response_from_wire() {
        let json = r#"{
            "accessToken": "acc-1",
            "refreshToken": "ref-1",
            "user": { "_id": "u1", "name": "Ana", "email": "ana@x.com" }
        }"#;
        let response: AuthResponse = serde_json::from_str(json).unwrap();

        assert_eq!(response.tokens.access_token().expose_secret(), "acc-1");
        assert_eq!(response.tokens.refresh_token().expose_secret(), "ref-1");
        assert_eq!(response.user.id.as_str(), "u1");
        assert_eq!(response.user.email.as_str(), "ana@x.com");
    }

    #[test]
    fn test_token_pair_debug_is_redacted() {
        let pair = TokenPair::new("very-secret-access", "very-secret-refresh");
        let debug = format!("{pair:?}");
        assert!(!debug.contains("very-secret-access"));
        assert!(!debug.contains("very-secret-refresh"));
    }

    #[test]
    fn test_register_requires_name() {
        let err = Credentials::register("   ", "ana@x.com", "secret1").unwrap_err();
        assert!(matches!(err, ApiError::InvalidInput(ref m) if m == "name is required"));
    }

    #[test]
    fn test_register_trims_name() {
        let creds = Credentials::register("  Ana ", "ana@x.com", "secret1").unwrap();
        assert!(matches!(creds, Credentials::Register { ref name, .. } if name == "Ana"));
    }

    #[test]
    fn test_login_rejects_bad_email_and_empty_password() {
        assert!(Credentials::login("not-an-email", "secret1").is_err());
        assert!(Credentials::login("ana@x.com", "").is_err());
        assert_eq!(
            Credentials::login("ana@x.com", "secret1").unwrap().email().as_str(),
            "ana@x.com"
        );
    }
}
