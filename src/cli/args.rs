//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueHint};

use crate::config::OutputFormat;
use crate::domain::DanglingParents;

/// Build a rooted tag forest from flat, possibly cyclic, multi-parent tag relations
#[derive(Parser, Debug)]
#[command(name = "tagtree")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Debug output (-d info, -dd debug, -ddd trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub debug: u8,

    /// Config file (default: ./.tagtree.toml)
    #[arg(short = 'c', long, global = true, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the tag tree
    Tree {
        /// Tag export (JSON array or {"data": [...]})
        #[arg(value_hint = ValueHint::FilePath)]
        file: Option<PathBuf>,
        /// Output format: json or ascii
        #[arg(short, long)]
        format: Option<OutputFormat>,
        /// Single-line JSON
        #[arg(long)]
        compact: bool,
        /// Placement of tags whose parents are all missing: root or exclude
        #[arg(long)]
        dangling: Option<DanglingParents>,
    },

    /// List tags heading a tree
    Roots {
        /// Tag export
        #[arg(value_hint = ValueHint::FilePath)]
        file: Option<PathBuf>,
        /// Placement of tags whose parents are all missing: root or exclude
        #[arg(long)]
        dangling: Option<DanglingParents>,
    },

    /// Report malformed tag relations (exit 65 if any)
    Check {
        /// Tag export
        #[arg(value_hint = ValueHint::FilePath)]
        file: Option<PathBuf>,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show merged config
    Show,

    /// Create config template
    Init {
        /// Create global config
        #[arg(short, long)]
        global: bool,
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Show config paths
    Path,
}
