//! Account and session commands.
//!
//! # Usage
//!
//! ```bash
//! si-cli register -e owner@example.com -s my-store.myshopify.com
//! si-cli login -e owner@example.com
//! si-cli whoami
//! si-cli logout --yes
//! ```

use store_insights_client::{Credentials, InsightsBackend, Registration, SessionGate};

use super::CommandError;
use super::prompt::{confirm, value_or_prompt};

/// Create a tenant account and sign in to it.
///
/// # Errors
///
/// Returns an error if input cannot be read or the backend rejects the
/// registration.
pub async fn register<B: InsightsBackend>(
    gate: &SessionGate<B>,
    email: String,
    shop_domain: String,
    password: Option<String>,
    access_token: Option<String>,
) -> Result<(), CommandError> {
    let password = value_or_prompt(password, "Password")?;
    let access_token = value_or_prompt(access_token, "Shopify access token")?;

    let registration = Registration::new(email, password, shop_domain, access_token);
    let session = gate.register(&registration).await?;
    print_line(&format!("Registered and signed in as {}", session.tenant));
    Ok(())
}

/// Sign in to an existing account.
///
/// # Errors
///
/// Returns an error if input cannot be read or the credentials are rejected.
pub async fn login<B: InsightsBackend>(
    gate: &SessionGate<B>,
    email: String,
    password: Option<String>,
) -> Result<(), CommandError> {
    let password = value_or_prompt(password, "Password")?;

    let session = gate.login(&Credentials::new(email, password)).await?;
    print_line(&format!("Signed in as {}", session.tenant));
    Ok(())
}

/// End the session after confirmation.
///
/// # Errors
///
/// Returns an error if confirmation cannot be obtained or the stored session
/// cannot be removed.
pub fn logout<B: InsightsBackend>(gate: &SessionGate<B>, yes: bool) -> Result<(), CommandError> {
    if !gate.is_authenticated() {
        print_line("Not signed in.");
        return Ok(());
    }
    if !confirm("Are you sure you want to logout?", yes, "logout")? {
        print_line("Aborted.");
        return Ok(());
    }

    gate.logout()?;
    print_line("Logged out.");
    Ok(())
}

/// Show the signed-in tenant.
///
/// # Errors
///
/// Returns `CommandError::NotSignedIn` without a session.
pub fn whoami<B: InsightsBackend>(gate: &SessionGate<B>) -> Result<(), CommandError> {
    let tenant = gate.current_tenant().ok_or(CommandError::NotSignedIn)?;
    print_line(&tenant.to_string());
    Ok(())
}

#[allow(clippy::print_stdout)]
fn print_line(line: &str) {
    println!("{line}");
}
