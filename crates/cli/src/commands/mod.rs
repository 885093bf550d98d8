//! Command implementations.

pub mod auth;
pub mod dashboard;
mod prompt;

use store_insights_client::{AuthError, DashboardError};
use thiserror::Error;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// The command needs a session and none is stored.
    #[error("Not signed in. Run `si-cli login` first.")]
    NotSignedIn,

    /// Confirmation was needed but stdin is not a terminal.
    #[error("Confirmation required. Pass --yes to {0} without prompting.")]
    ConfirmationRequired(&'static str),

    /// A secret was neither passed nor available to prompt for.
    #[error("Missing {0}. Pass it as a flag when stdin is not a terminal.")]
    MissingInput(&'static str),

    /// Reading from stdin or writing the prompt failed.
    #[error("Terminal I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Dashboard(#[from] DashboardError),
}
