// SPDX-License-Identifier: AGPL-3.0
// Snapsync CLI - Command-line frontend

use clap::{Parser, Subcommand};
use snapsync_core::{
    ApiClient, AppError, FsMediaSource, GalleryEngine, GalleryEvent, IdentityStore, SettingsStore,
    UploadLedger,
};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "snapsync", version, about = "Sync a local photo library to a photo backend")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List photos in the library with their upload state
    List {
        /// Page through the whole library instead of the first page
        #[arg(long)]
        all: bool,
    },
    /// Search uploaded photos and show the local matches
    Search { query: String },
    /// Upload photos that are not uploaded yet
    Upload {
        /// Photo uris to upload; omit with --all to upload the library
        uris: Vec<String>,
        /// Select every photo that is not uploaded yet
        #[arg(long)]
        all: bool,
    },
    /// Show the user id and upload statistics
    Status,
    /// Set the theme preference
    Theme {
        #[arg(value_parser = ["light", "dark", "system"])]
        theme: String,
    },
}

struct App {
    settings: SettingsStore,
    identity: Arc<IdentityStore>,
    ledger: Arc<UploadLedger>,
    media: Arc<FsMediaSource>,
}

impl App {
    fn new() -> Result<Self, AppError> {
        let settings = SettingsStore::new()?;
        let identity = Arc::new(IdentityStore::new()?);
        let ledger = Arc::new(UploadLedger::new()?);
        let media = Arc::new(FsMediaSource::new(settings.get().library_dir));

        Ok(Self {
            settings,
            identity,
            ledger,
            media,
        })
    }

    fn engine(&self) -> (GalleryEngine, async_channel::Receiver<GalleryEvent>) {
        let settings = self.settings.get();
        let remote = Arc::new(ApiClient::new(settings.server_url.clone(), self.identity.clone()));
        GalleryEngine::with_channel_events(
            self.media.clone(),
            remote,
            self.ledger.clone(),
            &settings,
        )
    }
}

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("snapsync_cli=info".parse().unwrap())
                .add_directive("snapsync_core=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), AppError> {
    let app = App::new()?;

    match cli.command {
        Command::List { all } => list(&app, all).await,
        Command::Search { query } => search(&app, &query).await,
        Command::Upload { uris, all } => upload(&app, uris, all).await,
        Command::Status => status(&app).await,
        Command::Theme { theme } => {
            app.settings.set_theme(&theme)?;
            println!("Theme set to {}", theme);
            Ok(())
        }
    }
}

async fn load_library(engine: &mut GalleryEngine, all: bool) {
    engine.initial_load().await;
    if all {
        while engine.load_more().await {}
    }
}

fn print_photos(engine: &GalleryEngine) {
    for photo in engine.displayed() {
        let marker = if engine.is_uploaded(&photo.uri) {
            "uploaded"
        } else {
            "pending"
        };
        println!("{:>9}  {}", marker, photo.uri);
    }
}

async fn list(app: &App, all: bool) -> Result<(), AppError> {
    let (mut engine, _events) = app.engine();
    load_library(&mut engine, all).await;

    if engine.all_photos().is_empty() {
        // Empty and terminal can mean no photos or no permission
        app.media.probe().await?;
        println!("No photos found");
        return Ok(());
    }

    print_photos(&engine);
    if engine.has_next_page() {
        println!("(more photos available, use --all)");
    }
    Ok(())
}

async fn search(app: &App, query: &str) -> Result<(), AppError> {
    let (mut engine, _events) = app.engine();
    load_library(&mut engine, true).await;

    let matched = engine.search(query).await?;
    if matched == 0 {
        println!("No matches for \"{}\"", query);
        return Ok(());
    }

    println!("{} match(es):", matched);
    print_photos(&engine);
    Ok(())
}

async fn upload(app: &App, uris: Vec<String>, all: bool) -> Result<(), AppError> {
    if uris.is_empty() && !all {
        return Err(AppError::InvalidConfig(
            "Pass photo uris or --all".to_string(),
        ));
    }

    let (mut engine, events) = app.engine();
    load_library(&mut engine, true).await;

    if all {
        engine.select_all_displayed();
    } else {
        for uri in &uris {
            let found = engine.all_photos().iter().find(|p| &p.uri == uri).cloned();
            match found {
                Some(photo) => engine.toggle_select(&photo),
                None => tracing::warn!("Not in the library, skipping: {}", uri),
            }
        }
    }

    let printer = tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event {
                GalleryEvent::UploadStarted { total } => {
                    println!("Uploading {} photo(s)...", total);
                }
                GalleryEvent::UploadProgress {
                    attempted,
                    succeeded,
                    total,
                } => {
                    println!("  {}/{} done ({} ok)", attempted, total, succeeded);
                }
                GalleryEvent::UploadFinished { .. } => break,
            }
        }
    });

    let outcome = engine.upload_selected().await;
    // Dropping the engine closes the event channel so the printer exits
    // even when the batch emitted nothing
    drop(engine);
    let _ = printer.await;

    println!("{}", outcome);
    Ok(())
}

async fn status(app: &App) -> Result<(), AppError> {
    println!("User id: {}", app.identity.user_id());
    println!("Uploaded photos: {}", app.ledger.count());

    match app.media.probe().await {
        Ok(()) => {
            let (mut engine, _events) = app.engine();
            load_library(&mut engine, true).await;
            println!("Library photos: {}", engine.all_photos().len());
        }
        Err(e) => println!("Library unavailable: {}", e),
    }

    Ok(())
}
