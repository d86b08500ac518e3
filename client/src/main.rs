//! BoekLog - keep a log of the books you read.

use boeklog_client::cli::{Cli, Commands};
use boeklog_client::config::Config;
use boeklog_client::db::SqliteStore;
use boeklog_client::error::{AppError, Result, SyncError};
use boeklog_client::handlers::{self, AppState, PostSync};
use boeklog_client::sync::SyncReport;
use boeklog_engine::Record;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "boeklog=info,boeklog_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    if let Err(err) = run(cli).await {
        eprintln!("Error: {err}");
        if matches!(err, AppError::Sync(SyncError::Unauthorized(_))) {
            eprintln!("Check the token with `boeklog config set --token <TOKEN>`.");
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    tracing::debug!(database = %config.database_url, "Opening local store");
    let store = SqliteStore::connect(&config.database_url).await?;
    let state = AppState::new(config, store);

    match cli.command {
        Commands::Add(args) => {
            let response = handlers::handle_add(&state, args.into()).await?;
            println!("{}", response.book.id);
            report_post_sync(&response.sync);
        }
        Commands::List { all, json } => {
            let books = handlers::handle_list(&state, all).await?;
            if json {
                println!("{}", to_json(&books)?);
            } else {
                for book in &books {
                    println!("{}", list_line(book));
                }
            }
        }
        Commands::Show { id } => {
            let book = handlers::handle_show(&state, &id).await?;
            println!("{}", to_json(&book)?);
        }
        Commands::Edit { id, fields } => {
            let response = handlers::handle_edit(&state, &id, fields.into()).await?;
            println!("Updated {}", response.book.id);
            report_post_sync(&response.sync);
        }
        Commands::Delete { id } => {
            let response = handlers::handle_delete(&state, &id).await?;
            println!("Deleted {}", response.id);
            report_post_sync(&response.sync);
        }
        Commands::Export { output } => {
            let json = handlers::handle_export(&state).await?;
            match output {
                Some(path) => {
                    tokio::fs::write(&path, json).await?;
                    println!("Exported to {}", path.display());
                }
                None => println!("{json}"),
            }
        }
        Commands::Import { file } => {
            let json = tokio::fs::read_to_string(&file).await?;
            let response = handlers::handle_import(&state, &json).await?;
            println!("Imported {} books", response.imported);
            report_post_sync(&response.sync);
        }
        Commands::Sync => match handlers::handle_sync(&state).await? {
            Some(report) => print_sync_report(&report),
            None => println!("A sync is already running"),
        },
        Commands::Status => {
            let status = handlers::handle_status(&state).await?;
            println!("Sync:        {}", if status.enabled { "enabled" } else { "disabled" });
            println!("Remote:      {}:{}", status.repo, status.path);
            println!("Version:     {}", status.version.as_deref().unwrap_or("-"));
            println!("Last synced: {}", status.last_synced_at.as_deref().unwrap_or("never"));
            println!(
                "Local:       {} books, {} deleted awaiting sync",
                status.local.active_count, status.local.tombstone_count
            );
        }
        Commands::Config { command } => {
            let view = match command.into_update() {
                Some(update) => handlers::handle_config_set(&state, update).await?,
                None => handlers::handle_config_show(&state).await?,
            };
            println!("Token:      {}", if view.token_set { "set" } else { "not set" });
            println!("Repository: {}", view.repo);
            println!("Path:       {}", view.path);
            println!("Database:   {}", view.database_url);
            println!("API:        {}", view.github_api);
        }
    }

    Ok(())
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).map_err(|e| AppError::BadRequest(e.to_string()))
}

fn list_line(book: &Record) -> String {
    let mut line = format!(
        "{}  {}  {}",
        book.id,
        book.text("readDate").unwrap_or("----------"),
        book.text("title").unwrap_or("?")
    );
    if let Some(author) = book.text("author") {
        line.push_str(&format!(" ({author})"));
    }
    if let Some(rating) = book.field("myRating").and_then(|v| v.as_u64()) {
        line.push_str(&format!("  {rating}/10"));
    }
    if book.is_tombstone() {
        line.push_str("  [deleted]");
    }
    line
}

fn print_sync_report(report: &SyncReport) {
    println!(
        "Synced: {} books ({} from remote, {} local changes pushed)",
        report.summary.active_count,
        report.merge.remote_only.len() + report.merge.remote_wins(),
        report.merge.local_only.len() + report.merge.local_wins(),
    );
}

fn report_post_sync(sync: &PostSync) {
    match sync {
        PostSync::Disabled | PostSync::Skipped => {}
        PostSync::Synced(report) => print_sync_report(report),
        PostSync::Failed(err) => eprintln!("Warning: saved locally, but sync failed: {err}"),
    }
}
