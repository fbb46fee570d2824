//! `campus`: command-line adapter for the campus events workflow.

mod config;

use std::path::PathBuf;

use anyhow::{Context, Result};
use campus_core::models::account::Principal;
use campus_core::models::event::{EventFilter, EventStatus};
use campus_db::DbManager;
use campus_db::repository::{
    SurrealAccountRepository, SurrealCredentialStore, SurrealEventRepository,
    SurrealRegistrationRepository, SurrealResourceRepository, SurrealRoleRepository,
};
use campus_workflow::{
    AccountApproval, AccountDirectory, Authority, EventLifecycle, NoticeDelivery,
    ResendNotifier, ResourceDirectory,
};
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use surrealdb::Surreal;
use surrealdb::engine::any::Any;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use crate::config::Config;

#[derive(Parser, Debug)]
#[command(name = "campus", version, about = "Campus events workflow administration")]
struct Cli {
    /// Configuration file (defaults to config/default.toml + config/$CAMPUS_ENV.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Apply pending schema migrations.
    Migrate,
    /// Create the first administrator account.
    BootstrapAdmin {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// List accounts awaiting approval.
    Pending(AdminArgs),
    /// Approve an account and send its temporary credential.
    Approve {
        #[command(flatten)]
        admin: AdminArgs,
        account_id: Uuid,
    },
    /// Reject and delete an unapproved account.
    Reject {
        #[command(flatten)]
        admin: AdminArgs,
        account_id: Uuid,
    },
    /// Show event totals per status with account and resource totals.
    Summary(AdminArgs),
    /// List events with organizer, venue and registration count.
    Events {
        /// Only events in this status (pending, approved, rejected).
        #[arg(long)]
        status: Option<EventStatus>,
        /// Only approved events that have not started yet.
        #[arg(long, conflicts_with = "status")]
        upcoming: bool,
    },
}

/// Credentials of the administrator performing the command.
#[derive(Args, Debug)]
struct AdminArgs {
    /// Administrator email.
    #[arg(long = "as")]
    email: String,
    /// Administrator password.
    #[arg(long)]
    password: String,
}

type Accounts = SurrealAccountRepository<Any>;
type Roles = SurrealRoleRepository<Any>;

/// Repository constructors sharing one client and pepper.
struct Stores {
    db: Surreal<Any>,
    pepper: Option<String>,
}

impl Stores {
    fn accounts(&self) -> Accounts {
        match &self.pepper {
            Some(p) => SurrealAccountRepository::with_pepper(self.db.clone(), p.clone()),
            None => SurrealAccountRepository::new(self.db.clone()),
        }
    }

    fn credentials(&self) -> SurrealCredentialStore<Any> {
        match &self.pepper {
            Some(p) => SurrealCredentialStore::with_pepper(self.db.clone(), p.clone()),
            None => SurrealCredentialStore::new(self.db.clone()),
        }
    }

    fn authority(&self) -> Authority<Accounts, Roles> {
        Authority::new(self.accounts(), SurrealRoleRepository::new(self.db.clone()))
    }

    fn resources(&self) -> ResourceDirectory<Accounts, Roles, SurrealResourceRepository<Any>> {
        ResourceDirectory::new(
            self.authority(),
            SurrealResourceRepository::new(self.db.clone()),
        )
    }

    fn events(
        &self,
        config: &Config,
    ) -> EventLifecycle<
        Accounts,
        Roles,
        SurrealEventRepository<Any>,
        SurrealResourceRepository<Any>,
        SurrealRegistrationRepository<Any>,
    > {
        EventLifecycle::new(
            self.authority(),
            SurrealEventRepository::new(self.db.clone()),
            SurrealResourceRepository::new(self.db.clone()),
            SurrealRegistrationRepository::new(self.db.clone()),
            config.workflow.clone(),
        )
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("campus_server=info,campus_workflow=info,campus_db=info")
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .json()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => Config::from_file(path),
        None => Config::load(),
    }
    .context("failed to load configuration")?;

    let manager = DbManager::connect(&config.database)
        .await
        .context("failed to connect to SurrealDB")?;
    let stores = Stores {
        db: manager.client().clone(),
        pepper: config.database.pepper.clone(),
    };

    match cli.command {
        Command::Migrate => {
            campus_db::run_migrations(manager.client())
                .await
                .context("migration failed")?;
            println!("schema is up to date");
        }
        Command::BootstrapAdmin {
            name,
            email,
            password,
        } => {
            let directory = directory(&stores, &config);
            let admin = directory
                .bootstrap_admin(&name, &email, &password)
                .await
                .context("failed to create admin")?;
            println!("created admin {} ({})", admin.email, admin.id);
        }
        Command::Pending(admin) => {
            let actor = sign_in(&stores, &config, &admin).await?;
            let approval = approval(&stores, &config)?;
            let pending = approval
                .list_pending(actor)
                .await
                .context("failed to list pending accounts")?;
            if pending.is_empty() {
                println!("no accounts awaiting approval");
            }
            for entry in pending {
                let role = entry
                    .requested_role
                    .map(|r| r.to_string())
                    .unwrap_or_else(|| "-".into());
                println!(
                    "{}\t{}\t{}\t{}\t{}",
                    entry.account.id,
                    entry.account.email,
                    entry.account.full_name,
                    role,
                    entry.account.created_at.to_rfc3339(),
                );
            }
        }
        Command::Approve { admin, account_id } => {
            let actor = sign_in(&stores, &config, &admin).await?;
            let approval = approval(&stores, &config)?;
            let outcome = approval
                .approve(actor, account_id)
                .await
                .context("approval failed")?;
            match outcome.notice {
                NoticeDelivery::Sent => {
                    println!("approved {}; login details sent by email", outcome.account.email);
                }
                NoticeDelivery::Failed {
                    temporary_credential,
                    reason,
                } => {
                    println!(
                        "approved {}; email not sent ({reason})",
                        outcome.account.email
                    );
                    println!("temporary password: {temporary_credential}");
                }
            }
        }
        Command::Reject { admin, account_id } => {
            let actor = sign_in(&stores, &config, &admin).await?;
            approval(&stores, &config)?
                .reject(actor, account_id)
                .await
                .context("rejection failed")?;
            println!("rejected and deleted account {account_id}");
        }
        Command::Summary(admin) => {
            let actor = sign_in(&stores, &config, &admin).await?;
            let counts = stores
                .events(&config)
                .status_counts(actor)
                .await
                .context("failed to count events")?;
            let accounts = directory(&stores, &config)
                .list_accounts(actor)
                .await
                .context("failed to list accounts")?;
            let resources = stores
                .resources()
                .list()
                .await
                .context("failed to list resources")?;
            println!(
                "events\t{} (pending {}, approved {}, rejected {})",
                counts.total(),
                counts.pending,
                counts.approved,
                counts.rejected
            );
            println!("accounts\t{}", accounts.len());
            println!("resources\t{}", resources.len());
        }
        Command::Events { status, upcoming } => {
            let events = stores.events(&config);
            let filter = if upcoming {
                EventFilter::default()
                    .with_status(EventStatus::Approved)
                    .starting_from(Utc::now())
            } else {
                EventFilter {
                    status,
                    ..Default::default()
                }
            };
            for summary in events
                .list_detailed(filter)
                .await
                .context("failed to list events")?
            {
                let capacity = summary
                    .event
                    .max_participants
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| "∞".into());
                println!(
                    "{}\t{}\t{}\t{}\t{}\t{}/{}\t{}",
                    summary.event.id,
                    summary.event.status,
                    summary.event.start_time.to_rfc3339(),
                    summary.event.title,
                    summary.venue_name.as_deref().unwrap_or("-"),
                    summary.registered,
                    capacity,
                    summary.organizer_name.as_deref().unwrap_or("-"),
                );
            }
        }
    }

    Ok(())
}

fn directory(
    stores: &Stores,
    config: &Config,
) -> AccountDirectory<Accounts, Roles, SurrealCredentialStore<Any>> {
    AccountDirectory::new(
        stores.authority(),
        stores.credentials(),
        config.workflow.clone(),
    )
}

fn approval(
    stores: &Stores,
    config: &Config,
) -> Result<AccountApproval<Accounts, Roles, ResendNotifier>> {
    let notifier =
        ResendNotifier::new(config.email.clone()).context("failed to initialise e-mail client")?;
    if !notifier.is_enabled() {
        tracing::warn!("No e-mail API key configured; credentials will be printed instead");
    }
    Ok(AccountApproval::new(
        stores.authority(),
        notifier,
        config.workflow.clone(),
    ))
}

/// Authenticate the acting administrator.
async fn sign_in(stores: &Stores, config: &Config, args: &AdminArgs) -> Result<Principal> {
    let account = directory(stores, config)
        .authenticate(&args.email, &args.password)
        .await
        .context("sign-in failed")?;
    Ok(account.principal())
}
