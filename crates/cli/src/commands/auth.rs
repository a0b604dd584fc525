//! `login`, `register`, `logout`, `whoami`.

use std::io::Write;

use vitrine_client::{Credentials, SessionState};

use super::{CliError, Context, stdout};

/// Sign in to an existing account.
///
/// # Errors
///
/// Returns `CliError::Api` if the credentials are rejected.
pub async fn login(ctx: &Context, email: &str, password: &str) -> Result<(), CliError> {
    let credentials = Credentials::login(email, password)?;
    let user = ctx.session.sign_in(&credentials).await?;
    writeln!(stdout(), "Signed in as {} <{}>", user.name, user.email)?;
    Ok(())
}

/// Create an account and sign in.
///
/// # Errors
///
/// Returns `CliError::Api` if a field is invalid or the server refuses the
/// registration.
pub async fn register(
    ctx: &Context,
    name: &str,
    email: &str,
    password: &str,
) -> Result<(), CliError> {
    let credentials = Credentials::register(name, email, password)?;
    let user = ctx.session.sign_in(&credentials).await?;
    writeln!(stdout(), "Welcome, {}! Account created for {}", user.name, user.email)?;
    Ok(())
}

/// Sign out. Succeeds even when the server cannot be reached.
///
/// # Errors
///
/// Returns `CliError::Output` only if stdout is closed.
pub async fn logout(ctx: &Context) -> Result<(), CliError> {
    ctx.session.sign_out().await;
    writeln!(stdout(), "Signed out")?;
    Ok(())
}

/// Print the signed-in user.
///
/// # Errors
///
/// Returns `CliError::Output` only if stdout is closed.
pub fn whoami(ctx: &Context) -> Result<(), CliError> {
    let mut out = stdout();
    match ctx.session.current() {
        SessionState::Authenticated(user) => {
            writeln!(out, "{} <{}>", user.name, user.email)?;
            writeln!(out, "id: {}", user.id)?;
        }
        SessionState::Anonymous => writeln!(out, "Not signed in")?,
    }
    Ok(())
}
