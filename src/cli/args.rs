//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand, ValueHint};

/// Inspect and edit audience targeting expressions stored in entity settings files
#[derive(Parser, Debug)]
#[command(name = "audtarget")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Debug output (-d info, -dd debug, -ddd trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub debug: u8,

    /// Directory holding a local .audtarget.toml (default: cwd)
    #[arg(short = 'C', long, global = true)]
    pub config_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Parse the expression and report whether it is editable
    Check {
        /// Entity settings JSON file
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
    },

    /// Show the expression as a tree
    Tree {
        /// Entity settings JSON file
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
    },

    /// Print the serialized expression
    Show {
        /// Entity settings JSON file
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
        /// Print the full editor state (tree, info, editable)
        #[arg(long)]
        state: bool,
    },

    /// Create an empty expression with one inclusion group
    Enable {
        /// Entity settings JSON file
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
    },

    /// Add an inclusion group (or the exclusion group)
    AddGroup {
        /// Entity settings JSON file
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
        /// Add the exclusion group instead
        #[arg(long)]
        exclude: bool,
    },

    /// Add a category to a group (enables targeting if needed)
    Add {
        /// Entity settings JSON file
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
        /// Category key or bare id (prefixed with the configured provider)
        category: String,
        #[command(flatten)]
        target: GroupTarget,
    },

    /// Remove a category from a group
    Remove {
        /// Entity settings JSON file
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
        /// Category key or bare id (prefixed with the configured provider)
        category: String,
        #[command(flatten)]
        target: GroupTarget,
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

/// Which group a category command addresses.
#[derive(Args, Debug, Clone, Copy)]
pub struct GroupTarget {
    /// Inclusion group number, starting at 1
    #[arg(short, long, default_value_t = 1, conflicts_with = "exclude")]
    pub group: usize,
    /// Address the exclusion group
    #[arg(short = 'x', long)]
    pub exclude: bool,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show effective configuration
    Show,
    /// Print a commented config template
    Template,
    /// Show config file locations
    Path,
}
