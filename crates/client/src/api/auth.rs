//! Authentication endpoints.

use reqwest::Method;
use secrecy::ExposeSecret;
use serde::Serialize;
use serde::de::IgnoredAny;
use tracing::instrument;

use super::{ApiClient, AuthMode};
use crate::error::ApiResult;
use crate::models::{AuthResponse, Credentials};

#[derive(Serialize)]
struct LoginBody<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct RegisterBody<'a> {
    name: &'a str,
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LogoutBody<'a> {
    refresh_token: &'a str,
}

impl ApiClient {
    /// Exchange credentials for a token pair and user.
    ///
    /// `Credentials::Login` posts to `/auth/login`, `Credentials::Register`
    /// to `/auth/register`. The result is not persisted here; the session
    /// manager does that.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthorized` for rejected credentials and
    /// `ApiError::Validation` for rejected registrations.
    #[instrument(skip_all, fields(email = %credentials.email()))]
    pub async fn authenticate(&self, credentials: &Credentials) -> ApiResult<AuthResponse> {
        match credentials {
            Credentials::Login { email, password } => {
                let body = LoginBody {
                    email: email.as_str(),
                    password: password.expose_secret(),
                };
                let url = self.endpoint(&["auth", "login"], &[]);
                self.request(Method::POST, url, Some(&body), AuthMode::NoRefresh)
                    .await
            }
            Credentials::Register {
                name,
                email,
                password,
            } => {
                let body = RegisterBody {
                    name,
                    email: email.as_str(),
                    password: password.expose_secret(),
                };
                let url = self.endpoint(&["auth", "register"], &[]);
                self.request(Method::POST, url, Some(&body), AuthMode::NoRefresh)
                    .await
            }
        }
    }

    /// Sign in to an existing account.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::InvalidInput` before any request if the email or
    /// password is unusable, otherwise see [`authenticate`](Self::authenticate).
    pub async fn login(&self, email: &str, password: &str) -> ApiResult<AuthResponse> {
        self.authenticate(&Credentials::login(email, password)?).await
    }

    /// Create an account and sign in to it.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::InvalidInput` before any request if a field is
    /// unusable, otherwise see [`authenticate`](Self::authenticate).
    pub async fn register(&self, name: &str, email: &str, password: &str) -> ApiResult<AuthResponse> {
        self.authenticate(&Credentials::register(name, email, password)?)
            .await
    }

    /// Revoke the stored refresh token server-side.
    ///
    /// Does nothing when no refresh token is stored. Local tokens are left
    /// alone; clearing them is the session manager's job.
    ///
    /// # Errors
    ///
    /// Returns any transport or server error. Callers ending a session
    /// treat these as non-fatal.
    #[instrument(skip(self))]
    pub async fn logout(&self) -> ApiResult<()> {
        let Some(refresh_token) = self.store().refresh_token() else {
            return Ok(());
        };

        let body = LogoutBody {
            refresh_token: refresh_token.expose_secret(),
        };
        let url = self.endpoint(&["auth", "logout"], &[]);
        self.request::<IgnoredAny>(Method::POST, url, Some(&body), AuthMode::NoRefresh)
            .await?;
        Ok(())
    }
}
