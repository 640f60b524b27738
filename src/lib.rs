//! Laserflix - catalog core for laser-cutting design assets
//!
//! Keeps the JSON project database of scanned design folders safe on disk
//! (atomic saves, previous-generation `.bak`, rotated timestamped backups)
//! and caches the decoded preview thumbnails the browsing grid draws.

pub mod catalog;
pub mod cli;
pub mod dispatch;
pub mod error;
pub mod logging;
pub mod output;
pub mod record;
pub mod schedule;
pub mod settings;
pub mod store;
pub mod thumbnail;

use anyhow::{Context, Result};
use catalog::Catalog;
use cli::{Cli, Commands, FolderCommand, ListArgs, MarkArgs, ThumbnailArgs};
use error::ExitCode;
use record::{Flag, RecordFilter};
use settings::Settings;
use store::{ConfigStore, LoadSource, RecordStore};
use thumbnail::{ThumbnailCache, ThumbnailSize};

/// Run the command described by `cli`.
///
/// Returns the exit code for outcomes that are not errors (nothing found,
/// recovered from backup). Failures are returned as errors.
pub fn run_app(cli: Cli) -> Result<ExitCode> {
    logging::init_logging(cli.verbose, cli.quiet);

    let mut settings = match &cli.config {
        Some(path) => Settings::try_load_from_path(Some(path.as_path()))
            .with_context(|| format!("Failed to load settings from {}", path.display()))?,
        None => Settings::load(),
    };
    if let Some(dir) = cli.data_dir {
        settings.data_dir = dir;
    }
    log::debug!("Using data directory {}", settings.data_dir.display());

    match cli.command {
        Commands::List(args) => {
            let (catalog, source) = open_catalog(&settings)?;
            degrade(list(&catalog, &args)?, source)
        }
        Commands::Stats(args) => {
            let (catalog, source) = open_catalog(&settings)?;
            let stats = catalog.records().stats();
            if args.json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                println!("Projects:   {}", stats.total);
                println!("Favorites:  {}", stats.favorites);
                println!("Done:       {}", stats.done);
                println!("Good / Bad: {} / {}", stats.good, stats.bad);
                println!("Analyzed:   {}", stats.analyzed);
                println!("Categories: {}", stats.categories);
                println!("Tags:       {}", stats.tags);
            }
            degrade(ExitCode::Success, source)
        }
        Commands::Mark(args) => {
            let (mut catalog, source) = open_catalog(&settings)?;
            degrade(mark(&mut catalog, &args)?, source)
        }
        Commands::Backup(args) => {
            let store = RecordStore::new(settings.database_layout());
            match store
                .create_backup(args.kind())
                .context("Failed to create backup")?
            {
                Some(path) => {
                    println!("Backup written to {}", path.display());
                    Ok(ExitCode::Success)
                }
                None => {
                    println!("Nothing to back up: {} does not exist yet", store.path().display());
                    Ok(ExitCode::NotFound)
                }
            }
        }
        Commands::Backups => {
            let store = RecordStore::new(settings.database_layout());
            let backups = store.list_backups().context("Failed to list backups")?;
            if backups.is_empty() {
                println!("No backups in {}", store.layout().backup_dir.display());
                return Ok(ExitCode::NotFound);
            }
            for entry in backups {
                println!(
                    "{:<9} {}  {}",
                    entry.kind.to_string(),
                    entry.created.format("%Y-%m-%d %H:%M:%S"),
                    entry.path.display()
                );
            }
            Ok(ExitCode::Success)
        }
        Commands::Restore(args) => {
            // The current database is not loaded, so a corrupt one can be replaced.
            let store = RecordStore::new(settings.database_layout());
            match Catalog::restore_into(store, &args.path)
                .with_context(|| format!("Failed to restore {}", args.path.display()))?
            {
                Some(catalog) => {
                    println!(
                        "Restored {} projects from {}",
                        catalog.records().len(),
                        args.path.display()
                    );
                    Ok(ExitCode::Success)
                }
                None => {
                    println!("Backup {} not found", args.path.display());
                    Ok(ExitCode::NotFound)
                }
            }
        }
        Commands::Export(args) => {
            let store = RecordStore::new(settings.database_layout());
            let bytes = store
                .export_to(&args.path)
                .with_context(|| format!("Failed to export to {}", args.path.display()))?;
            println!("Exported {} bytes to {}", bytes, args.path.display());
            Ok(ExitCode::Success)
        }
        Commands::Import(args) => {
            let store = RecordStore::new(settings.database_layout());
            let catalog = Catalog::import_into(store, &args.path)
                .with_context(|| format!("Failed to import {}", args.path.display()))?;
            println!(
                "Imported {} projects from {}",
                catalog.records().len(),
                args.path.display()
            );
            Ok(ExitCode::Success)
        }
        Commands::Folders(command) => folders(&settings, command),
        Commands::Models => {
            let store = ConfigStore::new(settings.config_layout());
            let config = store.load().context("Failed to load config")?;
            for (role, model) in &config.models {
                println!("{:<14} {}", role, model);
            }
            Ok(ExitCode::Success)
        }
        Commands::Thumbnail(args) => thumbnail(&settings, &args),
        Commands::Settings => {
            print!("{}", settings.to_toml()?);
            Ok(ExitCode::Success)
        }
    }
}

fn open_catalog(settings: &Settings) -> Result<(Catalog, LoadSource)> {
    let store = RecordStore::new(settings.database_layout());
    let path = store.path().to_path_buf();
    let (catalog, source) = Catalog::open(store)
        .with_context(|| format!("Failed to open project database {}", path.display()))?;
    if source == LoadSource::Backup {
        log::warn!(
            "{} was corrupt; working from its previous generation",
            path.display()
        );
    }
    Ok((catalog, source))
}

/// Report a successful command as degraded when the database came from `.bak`.
fn degrade(code: ExitCode, source: LoadSource) -> Result<ExitCode> {
    if code == ExitCode::Success && source == LoadSource::Backup {
        Ok(ExitCode::Degraded)
    } else {
        Ok(code)
    }
}

fn list(catalog: &Catalog, args: &ListArgs) -> Result<ExitCode> {
    let filter = RecordFilter {
        favorite_only: args.favorite,
        done: if args.done {
            Some(true)
        } else if args.pending {
            Some(false)
        } else {
            None
        },
        rating: args.rating.map(Into::into),
        analyzed: args.unanalyzed.then_some(false),
        category: args.category.clone(),
        tag: args.tag.clone(),
        origin: args.origin.clone(),
        search: args.search.clone(),
    };
    let records = catalog.filter(&filter);

    if args.json {
        println!("{}", output::JsonListing::new(&records).to_json_pretty()?);
    } else {
        for record in &records {
            println!("{}", output::format_record_line(record));
        }
        log::info!("{} of {} projects", records.len(), catalog.records().len());
    }

    Ok(if records.is_empty() {
        ExitCode::NotFound
    } else {
        ExitCode::Success
    })
}

fn mark(catalog: &mut Catalog, args: &MarkArgs) -> Result<ExitCode> {
    let flag = Flag::from(args.flag);
    let value = if args.toggle {
        catalog.toggle_flag(&args.path, flag)
    } else {
        let value = !args.off;
        catalog.set_flag(&args.path, flag, value).then_some(value)
    };

    let Some(value) = value else {
        println!("No project {} in the database", args.path);
        return Ok(ExitCode::NotFound);
    };

    catalog.save().context("Failed to save project database")?;
    println!("{}: {} = {}", args.path, flag, value);
    Ok(ExitCode::Success)
}

fn folders(settings: &Settings, command: FolderCommand) -> Result<ExitCode> {
    let store = ConfigStore::new(settings.config_layout());
    let mut config = store.load().context("Failed to load config")?;

    match command {
        FolderCommand::List => {
            if config.folders.is_empty() {
                println!("No folders configured");
                return Ok(ExitCode::NotFound);
            }
            for folder in &config.folders {
                println!("{}", folder);
            }
        }
        FolderCommand::Add(args) => {
            if !config.add_folder(args.folder.clone()) {
                println!("{} is already in the list", args.folder);
                return Ok(ExitCode::Success);
            }
            store.save(&config).context("Failed to save config")?;
            println!("Added {}", args.folder);
        }
        FolderCommand::Remove(args) => {
            if !config.remove_folder(&args.folder) {
                println!("{} is not in the list", args.folder);
                return Ok(ExitCode::NotFound);
            }
            store.save(&config).context("Failed to save config")?;
            println!("Removed {}", args.folder);
        }
    }
    Ok(ExitCode::Success)
}

fn thumbnail(settings: &Settings, args: &ThumbnailArgs) -> Result<ExitCode> {
    let default = settings.thumbnail_size();
    let size = ThumbnailSize::new(
        args.width.unwrap_or(default.width),
        args.height.unwrap_or(default.height),
    );
    let cache = ThumbnailCache::new(settings.thumbnails.capacity);

    let Some(bitmap) = cache.get_or_create(&args.image, size) else {
        println!("No thumbnail available for {}", args.image.display());
        return Ok(ExitCode::NotFound);
    };

    bitmap
        .save_with_format(&args.out, image::ImageFormat::Png)
        .with_context(|| format!("Failed to write {}", args.out.display()))?;
    println!(
        "Wrote {}x{} thumbnail to {}",
        bitmap.width(),
        bitmap.height(),
        args.out.display()
    );
    Ok(ExitCode::Success)
}
