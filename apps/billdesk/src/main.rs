//! BillDesk command-line front end.

mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use billdesk::config::AppConfig;
use billdesk::error::AppError;
use billdesk::init_tracing;
use commands::{account, bills, catalog, config, Credentials};

/// Shop billing: catalog, bills, receipts
#[derive(Parser)]
#[command(name = "billdesk")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Raise log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Path to config file
    #[arg(short, long, global = true, env = "BILLDESK_CONFIG")]
    config: Option<PathBuf>,

    /// Print results and errors as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(flatten)]
    credentials: Credentials,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load the default catalog into the database
    Seed,

    /// Create a shop owner account
    Signup(account::SignupArgs),

    /// Confirm an email address with its verification token
    Verify(account::VerifyArgs),

    /// Issue a new verification token
    Resend,

    /// Reset a forgotten password
    Reset(account::ResetArgs),

    /// Check credentials and show the signed-in profile
    Login,

    /// Show or edit the shop profile
    Profile(account::ProfileArgs),

    /// List products
    Catalog(catalog::CatalogArgs),

    /// Compose and store a bill
    Bill(bills::BillArgs),

    /// Show a stored bill
    Show(bills::ShowArgs),

    /// Change customer contact details on a bill
    Update(bills::UpdateArgs),

    /// Delete a bill
    Delete(bills::DeleteArgs),

    /// Find bills by bill number, customer name or phone
    Search(bills::SearchArgs),

    /// Manage configuration
    Config(config::ConfigArgs),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let app_config = match AppConfig::load(cli.config.clone()) {
        Ok(config) => config,
        Err(e) => return report(&anyhow::Error::new(AppError::from(e)), cli.json),
    };
    init_tracing(&app_config.logging.filter, cli.verbose);

    match run(cli.command, app_config, cli.config, &cli.credentials, cli.json).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => report(&e, cli.json),
    }
}

async fn run(
    command: Commands,
    app_config: AppConfig,
    config_path: Option<PathBuf>,
    credentials: &Credentials,
    json: bool,
) -> anyhow::Result<()> {
    let command = match command {
        Commands::Config(args) => return config::run(args, &app_config, config_path),
        other => other,
    };

    let app = billdesk::App::open(app_config).await?;
    let out = commands::Output { json };

    let result = match command {
        Commands::Seed => catalog::seed(&app).await,
        Commands::Signup(args) => account::signup(&app, args, credentials, out).await,
        Commands::Verify(args) => account::verify(&app, args, out).await,
        Commands::Resend => account::resend(&app, credentials, out).await,
        Commands::Reset(args) => account::reset(&app, args, credentials, out).await,
        Commands::Login => account::login(&app, credentials, out).await,
        Commands::Profile(args) => account::profile(&app, args, credentials, out).await,
        Commands::Catalog(args) => catalog::list(&app, args, out).await,
        Commands::Bill(args) => bills::bill(&app, args, credentials, out).await,
        Commands::Show(args) => bills::show(&app, args, credentials, out).await,
        Commands::Update(args) => bills::update(&app, args, credentials, out).await,
        Commands::Delete(args) => bills::delete(&app, args, credentials, out).await,
        Commands::Search(args) => bills::search(&app, args, credentials, out).await,
        Commands::Config(_) => Ok(()),
    };

    app.close().await;
    result
}

/// Prints a failure and picks the exit status from its error code.
fn report(err: &anyhow::Error, json: bool) -> ExitCode {
    let app_error = err.downcast_ref::<AppError>();

    if json {
        let body = match app_error {
            Some(e) => serde_json::to_string(e),
            None => serde_json::to_string(&AppError::internal(format!("{:#}", err))),
        };
        match body {
            Ok(body) => eprintln!("{}", body),
            Err(_) => eprintln!("error: {:#}", err),
        }
    } else {
        match app_error {
            Some(e) => eprintln!("error: {}", e.message),
            None => eprintln!("error: {:#}", err),
        }
    }

    let status = app_error.map(|e| e.code.exit_code()).unwrap_or(1);
    ExitCode::from(u8::try_from(status).unwrap_or(1))
}
