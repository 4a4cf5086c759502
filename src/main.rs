use anyhow::Result;
use clap::{Parser, Subcommand};
use rolegate_core::catalog::Catalog;
use rolegate_core::domain::Role;
use rolegate_core::repository::{connect_pool, MySqlAssignmentRepository};
use rolegate_core::{config::Config, migration, AuthzEngine};
use std::str::FromStr;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "rolegate", about = "RoleGate permission engine operations")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the database if needed and apply schema migrations
    Migrate,
    /// Reconcile the assignment store with the catalog
    Sync {
        /// Compute and print the plan without applying anything
        #[arg(long)]
        dry_run: bool,
    },
    /// Report catalog/store drift; exits non-zero if any is found
    Validate,
    /// List the assignments currently granted to a role
    List {
        #[arg(long)]
        role: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rolegate_core=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    match cli.command {
        Commands::Migrate => {
            migration::run_migrations(&config).await?;
        }
        Commands::Sync { dry_run } => {
            let engine = build_engine(&config).await?;
            let plan = engine.reconciler().plan().await?;
            if dry_run {
                info!("dry run: {} (nothing applied)", plan.drift);
                println!("{}", serde_json::to_string_pretty(&plan.drift)?);
            } else {
                let outcome = engine.reconciler().apply(&plan).await?;
                info!("sync complete: {} rows granted", outcome.granted);
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            }
        }
        Commands::Validate => {
            let engine = build_engine(&config).await?;
            let drift = engine.validate().await?;
            println!("{}", serde_json::to_string_pretty(&drift)?);
            if !drift.is_clean() {
                anyhow::bail!("drift detected: {}", drift);
            }
            info!("assignment store is consistent with the catalog");
        }
        Commands::List { role } => {
            let role = Role::from_str(&role)?;
            let engine = build_engine(&config).await?;
            let pairs = engine.assignments().list_for_role(role).await?;
            for pair in &pairs {
                println!("{pair}");
            }
            info!("{} assignments for role {}", pairs.len(), role);
        }
    }

    Ok(())
}

async fn build_engine(config: &Config) -> Result<AuthzEngine<MySqlAssignmentRepository>> {
    let pool = connect_pool(&config.database).await?;
    let repo = MySqlAssignmentRepository::new(pool);
    Ok(AuthzEngine::new(Catalog::standard()?, repo))
}
