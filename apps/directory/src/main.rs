use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use directory_client::{load_settings, DirectoryController, PostgrestStore, RecordStore, ViewState};
use shared::domain::FacultyRecord;
use storage::Storage;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(about = "Browse the faculty directory")]
struct Args {
    /// Read from a local SQLite directory instead of the remote store.
    #[arg(long)]
    database_url: Option<String>,
    /// Remote store base url; overrides directory.toml and the environment.
    #[arg(long)]
    store_url: Option<String>,
    #[arg(long)]
    api_key: Option<String>,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Every faculty member, ordered by name.
    List,
    /// Match name, email or designation.
    Search { term: String },
    /// Restrict to one department id, or `all`.
    Filter { department: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    let args = Args::parse();

    let store = open_store(&args).await?;
    let controller = DirectoryController::mount(store).await;

    match args.command.unwrap_or(Command::List) {
        Command::List => {}
        Command::Search { term } => controller.search(&term).await,
        Command::Filter { department } => {
            controller.filter_by_department_value(&department).await
        }
    }

    print_view(&controller.snapshot().await);
    Ok(())
}

async fn open_store(args: &Args) -> Result<Arc<dyn RecordStore>> {
    if let Some(database_url) = &args.database_url {
        info!(database_url = %database_url, "using local sqlite directory");
        let storage = Storage::new(database_url)
            .await
            .with_context(|| format!("failed to open directory database '{database_url}'"))?;
        storage.health_check().await?;
        return Ok(Arc::new(storage));
    }

    let mut settings = load_settings()?;
    if let Some(store_url) = &args.store_url {
        settings.store_url = Some(store_url.clone());
    }
    if let Some(api_key) = &args.api_key {
        settings.api_key = Some(api_key.clone());
    }
    let endpoint = settings.validate()?;
    info!(store_url = %endpoint.base_url, "using remote record store");
    Ok(Arc::new(PostgrestStore::new(endpoint)?))
}

fn print_view(view: &ViewState) {
    let summary = view.summary();
    println!(
        "Total faculty: {}  Departments: {}  Active profiles: {}",
        summary.total_faculty, summary.departments, summary.active_profiles
    );

    if view.faculty.is_empty() {
        println!("No faculty members found.");
        return;
    }
    for person in &view.faculty {
        print_card(person);
    }
}

fn print_card(person: &FacultyRecord) {
    println!();
    println!("{} [{}]", person.name, person.department_badge());
    println!("  {}", person.designation);
    for (label, value) in [
        ("email", &person.email),
        ("phone", &person.phone),
        ("qualification", &person.qualification),
        ("profile", &person.profile_link),
    ] {
        if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
            println!("  {label}: {value}");
        }
    }
    println!("  details: /faculty/{}", person.faculty_id);
}
