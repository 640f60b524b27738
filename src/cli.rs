//! Command-line interface definitions for Laserflix.
//!
//! Global options (verbosity, settings file, data directory) apply to every
//! subcommand. The subcommands operate on the project database, its backups,
//! the config store and the thumbnail cache.
//!
//! # Example
//!
//! ```bash
//! # List favorite Christmas projects
//! laserflix list --favorite --category Natal
//!
//! # Mark a project as good (clears "bad")
//! laserflix mark "/designs/Caixa Natal" good
//!
//! # Take a manual backup and list backups
//! laserflix backup --manual
//! laserflix backups
//! ```

use crate::record::{Flag, Rating};
use crate::store::BackupKind;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Catalog tool for laser-cutting design assets.
///
/// Browses and maintains the JSON project database with crash-safe saves,
/// timestamped backups and cached thumbnails.
#[derive(Debug, Parser)]
#[command(name = "laserflix")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Report errors as JSON on stderr
    #[arg(long, global = true)]
    pub json_errors: bool,

    /// Settings file (TOML). Defaults to the platform config directory.
    #[arg(long, global = true, value_name = "FILE", env = "LASERFLIX_SETTINGS")]
    pub config: Option<PathBuf>,

    /// Directory holding the database, config and backups
    #[arg(long, global = true, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List projects matching filters
    List(ListArgs),
    /// Show catalog counts
    Stats(StatsArgs),
    /// Set or clear a flag on a project
    Mark(MarkArgs),
    /// Create a backup of the project database
    Backup(BackupArgs),
    /// List existing backups
    Backups,
    /// Replace the database with a backup
    Restore(PathArgs),
    /// Copy the database file to another location
    Export(PathArgs),
    /// Replace the database with another database file
    Import(PathArgs),
    /// Manage the scanned folder list
    #[command(subcommand)]
    Folders(FolderCommand),
    /// Show configured model names
    Models,
    /// Render a cached thumbnail to a PNG file
    Thumbnail(ThumbnailArgs),
    /// Print the effective settings as TOML
    Settings,
}

/// Arguments for the list subcommand.
#[derive(Debug, Args, Default)]
pub struct ListArgs {
    /// Only favorites
    #[arg(long)]
    pub favorite: bool,

    /// Only projects marked done
    #[arg(long, conflicts_with = "pending")]
    pub done: bool,

    /// Only projects not marked done
    #[arg(long)]
    pub pending: bool,

    /// Filter by rating
    #[arg(long, value_enum)]
    pub rating: Option<RatingArg>,

    /// Only projects without AI analysis
    #[arg(long)]
    pub unanalyzed: bool,

    /// Filter by category (case-insensitive)
    #[arg(long, value_name = "NAME")]
    pub category: Option<String>,

    /// Filter by tag (case-insensitive)
    #[arg(long, value_name = "TAG")]
    pub tag: Option<String>,

    /// Filter by origin (case-insensitive)
    #[arg(long, value_name = "ORIGIN")]
    pub origin: Option<String>,

    /// Free-text search over name, path, categories, tags and description
    #[arg(short, long, value_name = "TEXT")]
    pub search: Option<String>,

    /// Print records as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the stats subcommand.
#[derive(Debug, Args)]
pub struct StatsArgs {
    /// Print counts as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the mark subcommand.
#[derive(Debug, Args)]
pub struct MarkArgs {
    /// Project folder path as stored in the database
    #[arg(value_name = "PATH")]
    pub path: String,

    /// Flag to change
    #[arg(value_enum)]
    pub flag: FlagArg,

    /// Clear the flag instead of setting it
    #[arg(long, conflicts_with = "toggle")]
    pub off: bool,

    /// Flip the flag
    #[arg(long)]
    pub toggle: bool,
}

/// Arguments for the backup subcommand.
#[derive(Debug, Args)]
pub struct BackupArgs {
    /// Create a manual backup (never rotated) instead of an automatic one
    #[arg(long)]
    pub manual: bool,
}

impl BackupArgs {
    pub fn kind(&self) -> BackupKind {
        if self.manual {
            BackupKind::Manual
        } else {
            BackupKind::Automatic
        }
    }
}

/// A single path argument.
#[derive(Debug, Args)]
pub struct PathArgs {
    #[arg(value_name = "FILE")]
    pub path: PathBuf,
}

/// Folder list subcommands.
#[derive(Debug, Subcommand)]
pub enum FolderCommand {
    /// Show configured folders
    List,
    /// Add a folder
    Add(FolderArgs),
    /// Remove a folder
    Remove(FolderArgs),
}

/// Arguments naming a folder.
#[derive(Debug, Args)]
pub struct FolderArgs {
    #[arg(value_name = "DIR")]
    pub folder: String,
}

/// Arguments for the thumbnail subcommand.
#[derive(Debug, Args)]
pub struct ThumbnailArgs {
    /// Source image
    #[arg(value_name = "IMAGE")]
    pub image: PathBuf,

    /// Output PNG file
    #[arg(short, long, value_name = "FILE")]
    pub out: PathBuf,

    /// Bounding width (defaults to the configured card width)
    #[arg(long)]
    pub width: Option<u32>,

    /// Bounding height (defaults to the configured card height)
    #[arg(long)]
    pub height: Option<u32>,
}

/// Flags settable from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FlagArg {
    Favorite,
    Done,
    Good,
    Bad,
}

impl From<FlagArg> for Flag {
    fn from(arg: FlagArg) -> Self {
        match arg {
            FlagArg::Favorite => Flag::Favorite,
            FlagArg::Done => Flag::Done,
            FlagArg::Good => Flag::Good,
            FlagArg::Bad => Flag::Bad,
        }
    }
}

/// Rating filter values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RatingArg {
    Good,
    Bad,
    Unrated,
}

impl From<RatingArg> for Rating {
    fn from(arg: RatingArg) -> Self {
        match arg {
            RatingArg::Good => Rating::Good,
            RatingArg::Bad => Rating::Bad,
            RatingArg::Unrated => Rating::Unrated,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_verify() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_list_filters() {
        let cli = Cli::try_parse_from([
            "laserflix",
            "list",
            "--favorite",
            "--rating",
            "unrated",
            "--tag",
            "mdf",
        ])
        .unwrap();
        match cli.command {
            Commands::List(args) => {
                assert!(args.favorite);
                assert_eq!(args.rating, Some(RatingArg::Unrated));
                assert_eq!(args.tag.as_deref(), Some("mdf"));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_mark() {
        let cli = Cli::try_parse_from(["laserflix", "mark", "/p/a", "good", "--off"]).unwrap();
        match cli.command {
            Commands::Mark(args) => {
                assert_eq!(args.path, "/p/a");
                assert_eq!(Flag::from(args.flag), Flag::Good);
                assert!(args.off);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_done_conflicts_with_pending() {
        assert!(Cli::try_parse_from(["laserflix", "list", "--done", "--pending"]).is_err());
    }

    #[test]
    fn test_backup_kind() {
        let cli = Cli::try_parse_from(["laserflix", "backup", "--manual"]).unwrap();
        match cli.command {
            Commands::Backup(args) => assert_eq!(args.kind(), BackupKind::Manual),
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["laserflix", "stats", "-vv", "--data-dir", "/tmp/lf"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/lf")));
    }
}
