//! Subcommand handlers. Each one maps arguments onto an `App` service and
//! prints the result.

pub mod account;
pub mod bills;
pub mod catalog;
pub mod config;

use billdesk::error::AppError;
use clap::Args;
use serde::Serialize;

/// Shop owner credentials for commands behind the sign-in gate.
#[derive(Args)]
pub struct Credentials {
    /// Account email
    #[arg(long, global = true, env = "BILLDESK_EMAIL")]
    pub email: Option<String>,

    /// Account password
    #[arg(long, global = true, env = "BILLDESK_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}

impl Credentials {
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }

    /// Both values, or a validation error naming the missing flags.
    pub fn require(&self) -> Result<(&str, &str), AppError> {
        match (self.email(), self.password()) {
            (Some(email), Some(password)) => Ok((email, password)),
            _ => Err(AppError::validation("--email and --password are required")),
        }
    }
}

/// Output mode chosen by `--json`.
#[derive(Clone, Copy)]
pub struct Output {
    pub json: bool,
}

impl Output {
    /// Prints `value` as JSON in JSON mode, otherwise runs `text`.
    pub fn emit<T, F>(&self, value: &T, text: F) -> anyhow::Result<()>
    where
        T: Serialize + ?Sized,
        F: FnOnce(),
    {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
        } else {
            text();
        }
        Ok(())
    }
}
