//! Subcommand implementations.
//!
//! Results are written to stdout; diagnostics go through `tracing` to
//! stderr.

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod reviews;

use std::io::{self, StdoutLock};

use thiserror::Error;
use vitrine_client::{ApiClient, ApiError, CartController, ClientConfig, ConfigError, SessionManager};

/// Errors that can end a command.
#[derive(Debug, Error)]
pub enum CliError {
    /// Invalid `VITRINE_*` environment.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Anything the storefront client reported.
    #[error("{}", .0.user_message())]
    Api(#[from] ApiError),

    /// Writing to stdout failed.
    #[error("Output error: {0}")]
    Output(#[from] io::Error),
}

/// Everything a command needs: the session and the cart bound to it.
pub struct Context {
    pub session: SessionManager,
    pub cart: CartController,
}

impl Context {
    /// Build the client stack from `VITRINE_*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns `CliError` if the configuration is invalid or the HTTP client
    /// cannot be built.
    pub fn from_env() -> Result<Self, CliError> {
        let config = ClientConfig::from_env()?;
        tracing::debug!(
            base_url = %config.base_url,
            state_file = %config.state_file.display(),
            "Loaded configuration"
        );

        let session = SessionManager::new(ApiClient::new(&config)?);
        let cart = CartController::new(session.clone());
        Ok(Self { session, cart })
    }

    #[must_use]
    pub fn client(&self) -> &ApiClient {
        self.session.client()
    }
}

fn stdout() -> StdoutLock<'static> {
    io::stdout().lock()
}

/// Average rating with one decimal, or a dash when there are no reviews.
fn format_rating(avg: f64, total: u32) -> String {
    if total == 0 {
        "-".to_string()
    } else {
        format!("{avg:.1} ({total})")
    }
}
