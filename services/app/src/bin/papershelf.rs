//! services/app/src/bin/papershelf.rs
//!
//! The composition root: wires the REST adapters into the Session Manager
//! and exposes the app's operations as CLI subcommands. This binary stands
//! in for the mobile UI as the single consumer of session state.

use app_lib::{
    adapters::{RestIdentityAdapter, RestProfileStoreAdapter},
    config::Config,
    error::AppError,
};
use clap::{Parser, Subcommand};
use papershelf_core::{
    catalog::PaperCatalog,
    domain::UserProfile,
    session::SessionManager,
    validation,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// How long `whoami` and the document commands wait for profile hydration.
const HYDRATION_WAIT: Duration = Duration::from_secs(3);

#[derive(Parser)]
#[command(
    name = "papershelf",
    about = "Browse categorized exam papers and manage your Papershelf account"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create a new account
    Register {
        email: String,
        password: String,
        /// Password confirmation; defaults to the password itself
        #[arg(long)]
        confirm: Option<String>,
        /// Display name
        #[arg(long)]
        name: String,
        /// Grade level, e.g. "10", "O-Level", "University"
        #[arg(long)]
        grade: String,
    },
    /// Sign in with an existing account
    Login { email: String, password: String },
    /// Sign out of the current session
    Logout,
    /// Send a password-reset email
    ResetPassword { email: String },
    /// Show the signed-in profile
    Whoami,
    /// List, filter, or search the paper catalog
    Papers {
        #[arg(long)]
        subject: Option<String>,
        #[arg(long)]
        query: Option<String>,
    },
    /// Bookmark or un-bookmark a paper
    Favorite { paper_id: String },
    /// Record a paper download
    Download { paper_id: String },
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Config::from_env()?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    // --- 2. Initialize Service Adapters ---
    let http = reqwest::Client::new();
    let identity = Arc::new(RestIdentityAdapter::new(
        http.clone(),
        &config.identity_url,
        &config.api_key,
        config.session_file.clone(),
    ));
    let profiles = Arc::new(RestProfileStoreAdapter::new(
        http,
        &config.profile_store_url,
        &config.api_key,
    ));

    // --- 3. Construct the Session Manager (probes any persisted session) ---
    let manager = SessionManager::new(identity, profiles);
    info!(
        authenticated = manager.snapshot().is_authenticated,
        "session manager initialized"
    );

    // --- 4. Dispatch the Subcommand ---
    match cli.command {
        Command::Register {
            email,
            password,
            confirm,
            name,
            grade,
        } => {
            let confirm = confirm.unwrap_or_else(|| password.clone());
            validation::validate_registration(&email, &password, &confirm, &name, &grade)?;
            manager.register(&email, &password, &name, &grade).await?;
            println!("{}", papershelf_core::session::REGISTER_SUCCESS);
        }
        Command::Login { email, password } => {
            validation::validate_sign_in(&email, &password)?;
            manager.sign_in(&email, &password).await?;
            println!("{}", papershelf_core::session::SIGN_IN_SUCCESS);
        }
        Command::Logout => {
            manager.sign_out();
            println!("Signed out.");
        }
        Command::ResetPassword { email } => {
            validation::validate_reset(&email)?;
            manager.reset_password(&email).await?;
            println!("{}", papershelf_core::session::RESET_SUCCESS);
        }
        Command::Whoami => {
            if !manager.snapshot().is_authenticated {
                println!("Not signed in.");
            } else {
                match wait_for_profile(&manager).await {
                    Some(user) => print_profile(&user),
                    None => println!("Signed in, but the profile has not loaded yet."),
                }
            }
        }
        Command::Papers { subject, query } => {
            let catalog = PaperCatalog::builtin();
            let papers = match (subject.as_deref(), query.as_deref()) {
                (Some(subject), Some(query)) => catalog
                    .search(query)
                    .into_iter()
                    .filter(|p| p.subject.eq_ignore_ascii_case(subject))
                    .collect(),
                (Some(subject), None) => catalog.by_subject(subject),
                (None, Some(query)) => catalog.search(query),
                (None, None) => catalog.papers().iter().collect(),
            };
            if papers.is_empty() {
                println!("No papers matched.");
            }
            for paper in papers {
                println!(
                    "{:<24} {:<12} {:<10} {}  {}",
                    paper.id, paper.subject, paper.grade_level, paper.year, paper.title
                );
            }
        }
        Command::Favorite { paper_id } => {
            let catalog = PaperCatalog::builtin();
            if catalog.get(&paper_id).is_none() {
                return Err(AppError::Internal(format!("unknown paper id: {paper_id}")));
            }
            let _ = wait_for_profile(&manager).await;
            if manager.toggle_favorite(&paper_id).await? {
                println!("Added to favorites.");
            } else {
                println!("Removed from favorites.");
            }
        }
        Command::Download { paper_id } => {
            let catalog = PaperCatalog::builtin();
            if catalog.get(&paper_id).is_none() {
                return Err(AppError::Internal(format!("unknown paper id: {paper_id}")));
            }
            let _ = wait_for_profile(&manager).await;
            manager.record_download(&paper_id).await?;
            println!("Download recorded.");
        }
    }

    Ok(())
}

/// Gives fire-and-forget hydration a chance to land before commands that
/// need the profile. Returns `None` on timeout or when signed out.
async fn wait_for_profile(manager: &SessionManager) -> Option<UserProfile> {
    if !manager.snapshot().is_authenticated {
        return None;
    }
    let mut rx = manager.subscribe();
    let outcome = tokio::time::timeout(HYDRATION_WAIT, async {
        loop {
            if let Some(user) = rx.borrow_and_update().current_user.clone() {
                return Some(user);
            }
            if rx.changed().await.is_err() {
                return None;
            }
        }
    })
    .await;
    outcome.ok().flatten()
}

fn print_profile(user: &UserProfile) {
    println!("{} <{}>", user.display_name, user.email);
    println!("grade: {}", user.grade_level);
    println!(
        "favorites: {}",
        user.favorite_ids
            .iter()
            .cloned()
            .collect::<Vec<_>>()
            .join(", ")
    );
    println!(
        "downloads: {}",
        user.downloaded_ids
            .iter()
            .cloned()
            .collect::<Vec<_>>()
            .join(", ")
    );
}
