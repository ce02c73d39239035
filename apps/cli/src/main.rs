//! pathkey administrative command line.

#![forbid(unsafe_code)]

use std::env;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use pathkey_application::{
    AssignmentStore, PermissionService, PermissionStore, ReconciliationService, RoleStore,
};
use pathkey_core::{AppError, AppResult};
use pathkey_domain::RolePermissionDefinitions;
use pathkey_infrastructure::PostgresAccessStore;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "pathkey",
    version,
    about = "Administers pathkey roles and permissions"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Updates roles and permissions according to a definitions file.
    ///
    /// Useful when the application does not let users customise role
    /// permissions themselves.
    SyncRoles {
        /// Path to a JSON definitions file with allow/deny maps of role
        /// name to permission paths.
        #[arg(long)]
        definitions: PathBuf,

        /// Runs immediately without the interactive confirmation prompt.
        #[arg(long, short = 'f')]
        force: bool,
    },
}

enum Outcome {
    Completed,
    Aborted,
}

#[derive(Debug, Clone)]
struct CliConfig {
    database_url: String,
    max_connections: u32,
}

impl CliConfig {
    fn load() -> AppResult<Self> {
        let database_url = required_env("DATABASE_URL")?;
        let max_connections = parse_env_u32("PATHKEY_MAX_CONNECTIONS", 5)?;

        if max_connections == 0 {
            return Err(AppError::Validation(
                "PATHKEY_MAX_CONNECTIONS must be greater than zero".to_owned(),
            ));
        }

        Ok(Self {
            database_url,
            max_connections,
        })
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(Outcome::Completed) => ExitCode::SUCCESS,
        Ok(Outcome::Aborted) => {
            println!("Aborted");
            ExitCode::FAILURE
        }
        Err(run_error) => {
            error!(error = %run_error, "command failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> AppResult<Outcome> {
    match cli.command {
        Command::SyncRoles { definitions, force } => {
            sync_roles(definitions.as_path(), force).await
        }
    }
}

async fn sync_roles(definitions_path: &Path, force: bool) -> AppResult<Outcome> {
    let definitions = load_definitions(definitions_path)?;

    if !force && !confirm()? {
        return Ok(Outcome::Aborted);
    }

    let config = CliConfig::load()?;
    let pool = connect_pool(&config).await?;
    let service = build_reconciliation_service(pool);

    let summary = service.reconcile(&definitions).await?;
    info!(
        roles_created = summary.roles_created,
        permissions_created = summary.permissions_created,
        assignments_retained = summary.assignments_retained,
        assignments_pruned = summary.assignments_pruned,
        "role permissions updated"
    );
    println!("Role permissions updated");

    Ok(Outcome::Completed)
}

fn load_definitions(path: &Path) -> AppResult<RolePermissionDefinitions> {
    let raw = std::fs::read_to_string(path).map_err(|read_error| {
        AppError::Validation(format!(
            "failed to read definitions file '{}': {read_error}",
            path.display()
        ))
    })?;

    serde_json::from_str(raw.as_str()).map_err(|parse_error| {
        AppError::Validation(format!(
            "failed to parse definitions file '{}': {parse_error}",
            path.display()
        ))
    })
}

fn confirm() -> AppResult<bool> {
    print!(
        "Warning: new roles may be created, and any role permission not present in the \
         definitions will be updated or removed. Proceed? [y/n] "
    );
    std::io::stdout()
        .flush()
        .map_err(|io_error| AppError::Internal(format!("failed to flush prompt: {io_error}")))?;

    let mut answer = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut answer)
        .map_err(|io_error| {
            AppError::Internal(format!("failed to read confirmation: {io_error}"))
        })?;

    Ok(is_affirmative(answer.as_str()))
}

fn is_affirmative(answer: &str) -> bool {
    answer.trim().to_lowercase().starts_with('y')
}

async fn connect_pool(config: &CliConfig) -> AppResult<PgPool> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(config.database_url.as_str())
        .await
        .map_err(|connect_error| {
            AppError::Internal(format!("failed to connect to database: {connect_error}"))
        })
}

fn build_reconciliation_service(pool: PgPool) -> ReconciliationService {
    let store = Arc::new(PostgresAccessStore::new(pool));
    let assignments: Arc<dyn AssignmentStore> = store.clone();
    let roles: Arc<dyn RoleStore> = store.clone();
    let permissions: Arc<dyn PermissionStore> = store;

    ReconciliationService::new(
        PermissionService::new(assignments.clone()),
        roles,
        permissions,
        assignments,
    )
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn required_env(name: &str) -> AppResult<String> {
    env::var(name).map_err(|_| AppError::Validation(format!("{name} is required")))
}

fn parse_env_u32(name: &str, default: u32) -> AppResult<u32> {
    match env::var(name) {
        Ok(value) => value.parse::<u32>().map_err(|parse_error| {
            AppError::Validation(format!("invalid {name} value '{value}': {parse_error}"))
        }),
        Err(_) => Ok(default),
    }
}
