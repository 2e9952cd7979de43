use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Profile-scoped asset override caches from the command line
#[derive(Debug, Parser)]
#[command(name = "reskin", version, about)]
pub struct CliArgs {
    /// Root directory holding the named caches
    #[arg(long, env = "RESKIN_CACHE_ROOT", default_value = "./reskin-data/caches", global = true)]
    pub cache_root: PathBuf,

    /// File recording session state such as the last-active profile
    #[arg(long, env = "RESKIN_STATE_FILE", default_value = "./reskin-data/state.json", global = true)]
    pub state_file: PathBuf,

    /// Endpoint serving generated interception scripts; concatenated
    /// with a cache identifier as-is
    #[arg(long, env = "RESKIN_ENDPOINT", default_value = "", global = true)]
    pub endpoint: String,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Manage profiles
    Profile {
        #[command(subcommand)]
        action: ProfileAction,
    },

    /// Inspect and edit the active profile's assets
    Asset {
        #[command(subcommand)]
        action: AssetAction,
    },

    /// Export a profile's cache as a zip archive
    Export {
        /// Profile to export
        profile: String,

        /// Output path; defaults to the archive's deterministic name in
        /// the current directory
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Resolve one URL through the active profile's cache layers
    Fetch {
        /// Request URL to resolve
        url: String,
    },

    /// Seed the default asset layer from a local directory
    Seed {
        /// Directory whose files become default cache entries
        dir: PathBuf,

        /// Key prefix put in front of each file's relative path
        #[arg(long, default_value = "/")]
        base_path: String,
    },
}

#[derive(Debug, Subcommand)]
pub enum ProfileAction {
    /// List known profiles
    List,
    /// Create a profile and switch to it
    Create { name: String },
    /// Delete a profile
    Delete { name: String },
    /// Switch the active profile
    Switch { name: String },
}

#[derive(Debug, Subcommand)]
pub enum AssetAction {
    /// List the active profile's merged asset view
    List,
    /// Write one asset into the active profile's override cache
    Set {
        /// Request URL the asset answers
        key: String,

        /// Local file supplying the payload
        #[arg(long, conflicts_with = "link")]
        file: Option<PathBuf>,

        /// Remote link fetched once for the payload
        #[arg(long)]
        link: Option<String>,

        /// Content type stored with a --file payload; guessed from the
        /// file extension when omitted
        #[arg(long, requires = "file")]
        content_type: Option<String>,
    },
}
