//! Account commands: signup, verify, resend, reset, login, profile.

use clap::{Args, Subcommand};
use serde_json::json;

use billdesk::error::AppError;
use billdesk::identity::{IdentityProvider, SignUp};
use billdesk::App;
use billdesk_core::UserPatch;

use super::{Credentials, Output};

/// Email and password come from the global `--email`/`--password`.
#[derive(Args)]
pub struct SignupArgs {
    /// Owner name
    #[arg(long)]
    name: String,

    /// Shop name printed on receipts
    #[arg(long, default_value = "")]
    shop_name: String,

    /// Shop address printed on receipts
    #[arg(long, default_value = "")]
    shop_address: String,
}

#[derive(Args)]
pub struct VerifyArgs {
    /// Token printed by `signup` or `resend`
    token: String,
}

#[derive(Args)]
pub struct ResetArgs {
    #[command(subcommand)]
    command: ResetCommand,
}

#[derive(Subcommand)]
enum ResetCommand {
    /// Issue a reset token for the account named by --email
    Request,

    /// Set a new password with a token printed by `reset request`
    Confirm {
        token: String,

        /// Password to set
        #[arg(long, env = "BILLDESK_NEW_PASSWORD", hide_env_values = true)]
        new_password: String,
    },
}

#[derive(Args)]
pub struct ProfileArgs {
    /// New owner name
    #[arg(long)]
    name: Option<String>,

    /// New shop name
    #[arg(long)]
    shop_name: Option<String>,

    /// New shop address
    #[arg(long)]
    shop_address: Option<String>,
}

pub async fn signup(
    app: &App,
    args: SignupArgs,
    credentials: &Credentials,
    out: Output,
) -> anyhow::Result<()> {
    let (email, password) = credentials.require()?;
    let verification = app
        .identity
        .sign_up(&SignUp {
            email: email.to_string(),
            password: password.to_string(),
            name: args.name,
            shop_name: args.shop_name,
            shop_address: args.shop_address,
        })
        .await
        .map_err(AppError::from)?;

    let body = json!({ "uid": verification.uid, "email": verification.email, "token": verification.token });
    out.emit(&body, || {
        println!("Account created for {}", verification.email);
        println!("Verification token: {}", verification.token);
        println!("Run `billdesk verify {}` to confirm the address.", verification.token);
    })
}

pub async fn verify(app: &App, args: VerifyArgs, out: Output) -> anyhow::Result<()> {
    let user = app
        .identity
        .confirm_email(&args.token)
        .await
        .map_err(AppError::from)?;

    out.emit(&user, || println!("Email {} verified", user.email))
}

pub async fn resend(app: &App, credentials: &Credentials, out: Output) -> anyhow::Result<()> {
    let (email, password) = credentials.require()?;

    let verification = app
        .identity
        .resend_verification(email, password)
        .await
        .map_err(AppError::from)?;

    match verification {
        Some(v) => {
            let body = json!({ "uid": v.uid, "email": v.email, "token": v.token });
            out.emit(&body, || println!("Verification token: {}", v.token))
        }
        None => out.emit(&json!({ "verified": true }), || {
            println!("{} is already verified", email)
        }),
    }
}

pub async fn reset(
    app: &App,
    args: ResetArgs,
    credentials: &Credentials,
    out: Output,
) -> anyhow::Result<()> {
    match args.command {
        ResetCommand::Request => {
            let email = credentials
                .email()
                .ok_or_else(|| AppError::validation("--email is required"))?;
            let reset = app
                .identity
                .request_password_reset(email)
                .await
                .map_err(AppError::from)?
                .ok_or_else(|| AppError::not_found("Account", email))?;

            let body = json!({ "uid": reset.uid, "email": reset.email, "token": reset.token });
            out.emit(&body, || {
                println!("Reset token for {}: {}", reset.email, reset.token);
                println!("Run `billdesk reset confirm {} --new-password <password>`.", reset.token);
            })
        }
        ResetCommand::Confirm { token, new_password } => {
            let user = app
                .identity
                .reset_password(&token, &new_password)
                .await
                .map_err(AppError::from)?;

            out.emit(&json!({ "uid": user.uid, "email": user.email, "reset": true }), || {
                println!("Password changed for {}", user.email)
            })
        }
    }
}

pub async fn login(app: &App, credentials: &Credentials, out: Output) -> anyhow::Result<()> {
    let user = app
        .sign_in_verified(credentials.email(), credentials.password())
        .await?;

    out.emit(&user, || {
        println!("Signed in as {} <{}>", user.name, user.email);
        println!("Shop: {}", user.shop_name);
        println!("Address: {}", user.shop_address);
    })
}

pub async fn profile(
    app: &App,
    args: ProfileArgs,
    credentials: &Credentials,
    out: Output,
) -> anyhow::Result<()> {
    let user = app
        .sign_in_verified(credentials.email(), credentials.password())
        .await?;

    let patch = UserPatch {
        name: args.name,
        shop_name: args.shop_name,
        shop_address: args.shop_address,
    };
    if !patch.is_empty() {
        app.profiles.update(&user.uid, &patch).await?;
    }

    let details = app
        .profiles
        .shop_details(&user.uid)
        .await
        .map_err(AppError::from)?;
    out.emit(&details, || {
        println!("Shop: {}", details.shop_name);
        println!("Address: {}", details.shop_address);
        println!("Email: {}", details.email);
    })
}
