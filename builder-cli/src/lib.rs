//! # Builder CLI
//!
//! Command-line host for the visual document builder.
//!
//! ## Usage
//!
//! ```bash
//! # Render a saved snapshot as a standalone HTML page
//! builder-cli export post.json --format document --output post.html
//!
//! # Replay an action script against a new document
//! builder-cli edit --new "Spring Recipes" --actions script.json --output post.json
//!
//! # Sync with a document API
//! builder-cli --api-url https://cms.example.com/api push post.json --document-id 42
//! ```
//!
//! ## Architecture
//!
//! - `CliArgs` - Command-line arguments parsed with clap
//! - `CliConfig` - Store and autosave settings derived from the arguments
//! - [`commands`] - One async function per subcommand

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]

pub mod commands;

use std::path::PathBuf;
use std::time::Duration;

use builder_autosave::AutosaveConfig;
use clap::{Parser, Subcommand, ValueEnum};

/// Default directory for the filesystem document store.
pub const DEFAULT_DATA_DIR: &str = ".builder";

/// Command-line arguments for builder-cli.
#[derive(Debug, Clone, Parser)]
#[command(name = "builder-cli")]
#[command(about = "Visual document builder: export, scripted editing and document sync")]
#[command(version)]
pub struct CliArgs {
    /// Document API base URL (e.g., <https://cms.example.com/api>)
    #[arg(long, global = true, env = "BUILDER_API_URL")]
    pub api_url: Option<String>,

    /// Bearer token for the document API
    #[arg(long, global = true, env = "BUILDER_API_TOKEN", hide_env_values = true)]
    pub api_token: Option<String>,

    /// Directory used as document store when no API URL is given
    #[arg(long, global = true, env = "BUILDER_DATA_DIR", default_value = DEFAULT_DATA_DIR)]
    pub data_dir: PathBuf,

    /// Quiet period before an autosave, in milliseconds
    #[arg(long, global = true, env = "BUILDER_AUTOSAVE_QUIET_MS", default_value = "5000")]
    pub autosave_quiet_ms: u64,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Export a snapshot file
    Export {
        /// Snapshot JSON file
        snapshot: PathBuf,
        /// Output format
        #[arg(long, value_enum, default_value_t = ExportFormat::Html)]
        format: ExportFormat,
        /// Write here instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Replay an action script through an editor session
    Edit {
        /// Snapshot to start from
        #[arg(required_unless_present = "new", conflicts_with = "new")]
        snapshot: Option<PathBuf>,
        /// Start a new document with this title
        #[arg(long, value_name = "TITLE")]
        new: Option<String>,
        /// JSON array of actions
        #[arg(long)]
        actions: PathBuf,
        /// Write the resulting snapshot here instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
        /// Autosave to the configured store under this document id
        #[arg(long, value_name = "ID")]
        autosave_id: Option<String>,
    },
    /// Upload a snapshot to the configured store
    Push {
        /// Snapshot JSON file
        snapshot: PathBuf,
        /// Document id in the store
        #[arg(long)]
        document_id: String,
    },
    /// Download a snapshot from the configured store
    Pull {
        /// Document id in the store
        #[arg(long)]
        document_id: String,
        /// Write here instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
}

/// Export output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    /// HTML fragment
    Html,
    /// Standalone HTML document
    Document,
    /// Fresh JSON snapshot
    Json,
    /// Word count, read time and featured image as JSON
    Summary,
}

/// Where documents are stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreTarget {
    /// REST document API.
    Http {
        /// API base URL.
        url: String,
        /// Optional bearer token.
        token: Option<String>,
    },
    /// Directory of JSON files.
    Directory(PathBuf),
}

/// Settings shared by every subcommand.
#[derive(Debug, Clone)]
pub struct CliConfig {
    /// Document store.
    pub store: StoreTarget,
    /// Autosave settings for `edit --autosave-id`.
    pub autosave: AutosaveConfig,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            store: StoreTarget::Directory(PathBuf::from(DEFAULT_DATA_DIR)),
            autosave: AutosaveConfig::default(),
        }
    }
}

impl From<&CliArgs> for CliConfig {
    fn from(args: &CliArgs) -> Self {
        let store = match &args.api_url {
            Some(url) => StoreTarget::Http {
                url: url.clone(),
                token: args.api_token.clone(),
            },
            None => StoreTarget::Directory(args.data_dir.clone()),
        };
        Self {
            store,
            autosave: AutosaveConfig {
                quiet_period: Duration::from_millis(args.autosave_quiet_ms),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_use_file_store() {
        let args = CliArgs::try_parse_from(["builder-cli", "pull", "--document-id", "7"])
            .expect("valid args");
        let config = CliConfig::from(&args);
        assert_eq!(config.store, StoreTarget::Directory(PathBuf::from(".builder")));
        assert_eq!(config.autosave.quiet_period, Duration::from_secs(5));
    }

    #[test]
    fn test_api_url_selects_http_store() {
        let args = CliArgs::try_parse_from([
            "builder-cli",
            "push",
            "post.json",
            "--document-id",
            "7",
            "--api-url",
            "https://cms.example.com/api",
            "--api-token",
            "tok",
        ])
        .expect("valid args");
        assert_eq!(
            CliConfig::from(&args).store,
            StoreTarget::Http {
                url: "https://cms.example.com/api".into(),
                token: Some("tok".into()),
            }
        );
    }

    #[test]
    fn test_edit_requires_source() {
        assert!(CliArgs::try_parse_from(["builder-cli", "edit", "--actions", "a.json"]).is_err());
        assert!(CliArgs::try_parse_from([
            "builder-cli",
            "edit",
            "post.json",
            "--new",
            "Title",
            "--actions",
            "a.json"
        ])
        .is_err());
        assert!(
            CliArgs::try_parse_from(["builder-cli", "edit", "--new", "T", "--actions", "a.json"])
                .is_ok()
        );
    }

    #[test]
    fn test_export_format() {
        let args = CliArgs::try_parse_from([
            "builder-cli",
            "export",
            "post.json",
            "--format",
            "document",
        ])
        .expect("valid args");
        assert!(matches!(
            args.command,
            Command::Export {
                format: ExportFormat::Document,
                ..
            }
        ));
    }
}
