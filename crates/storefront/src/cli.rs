//! Clap derive structures for the `storefront` CLI.
//!
//! Defines the command tree, global flags, and shared types.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

use storefront_core::{Breakpoint, DocumentKind};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// storefront -- inspect, merge, and preview storefront configuration
#[derive(Debug, Parser)]
#[command(
    name = "storefront",
    version,
    about = "Inspect and preview storefront configuration",
    long_about = "Reconciles builtin storefront defaults with documents from the remote\n\
        configuration store, follows live updates, and previews hero, banner,\n\
        and carousel rotation in the terminal.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Store profile to use
    #[arg(long, short = 'p', env = "STOREFRONT_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Document store URL (overrides profile)
    #[arg(long, env = "STOREFRONT_STORE", global = true)]
    pub store: Option<String>,

    /// Tenant identifier (overrides profile)
    #[arg(long, short = 't', env = "STOREFRONT_TENANT", global = true)]
    pub tenant: Option<String>,

    /// Store bearer token
    #[arg(long, env = "STOREFRONT_TOKEN", global = true, hide_env_values = true)]
    pub token: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "STOREFRONT_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Accept invalid TLS certificates
    #[arg(long, short = 'k', env = "STOREFRONT_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "STOREFRONT_TIMEOUT", global = true)]
    pub timeout: Option<u64>,

    /// Work from defaults and the local cache only
    #[arg(long, global = true)]
    pub offline: bool,

    /// Neither read nor write the local cache
    #[arg(long, global = true)]
    pub no_cache: bool,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text (scripting)
    Plain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Merge override files onto a defaults file
    Merge(MergeArgs),

    /// Print builtin default documents
    Defaults(DefaultsArgs),

    /// Load a document (cache, then store) and print the effective configuration
    Show(ShowArgs),

    /// Follow a document's live feed and print each new revision
    Watch(WatchArgs),

    /// Run slide rotation and print transitions
    Preview(PreviewArgs),

    /// Manage CLI settings and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Document commands ────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct MergeArgs {
    /// JSON file with the default document
    pub defaults: PathBuf,

    /// JSON override files, applied in order
    #[arg(required = true)]
    pub overrides: Vec<PathBuf>,

    /// List override fields rejected as shape-incompatible (on stderr)
    #[arg(long)]
    pub show_discarded: bool,
}

#[derive(Debug, Args)]
pub struct DefaultsArgs {
    /// Document to print (all when omitted)
    #[arg(value_parser = parse_document)]
    pub document: Option<DocumentKind>,
}

#[derive(Debug, Args)]
pub struct ShowArgs {
    /// Document to load
    #[arg(value_parser = parse_document)]
    pub document: DocumentKind,

    /// JSON pointer selecting part of the document (e.g. /colors)
    #[arg(long)]
    pub pointer: Option<String>,
}

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Document to follow
    #[arg(value_parser = parse_document)]
    pub document: DocumentKind,

    /// Exit after printing this many revisions
    #[arg(long, short = 'n')]
    pub count: Option<usize>,
}

#[derive(Debug, Args)]
pub struct PreviewArgs {
    /// Document holding the slide deck
    #[arg(long, short = 'd', default_value = "heroes", value_parser = parse_document)]
    pub document: DocumentKind,

    /// JSON pointer to the deck (defaults to the document's main deck)
    #[arg(long)]
    pub deck: Option<String>,

    /// How long to run (e.g. 30s, 2m)
    #[arg(long, default_value = "30s", value_parser = humantime::parse_duration)]
    pub duration: Duration,

    /// Viewport breakpoint (overrides settings)
    #[arg(long, value_parser = parse_breakpoint)]
    pub breakpoint: Option<Breakpoint>,

    /// Also print typed-text frames
    #[arg(long)]
    pub frames: bool,

    /// Follow the live feed while previewing
    #[arg(long)]
    pub live: bool,
}

fn parse_document(s: &str) -> Result<DocumentKind, String> {
    s.parse().map_err(|_| {
        let names: Vec<_> = DocumentKind::all().iter().map(ToString::to_string).collect();
        format!("unknown document '{s}' (expected one of: {})", names.join(", "))
    })
}

fn parse_breakpoint(s: &str) -> Result<Breakpoint, String> {
    s.parse()
        .map_err(|_| format!("unknown breakpoint '{s}' (expected mobile, tablet, or desktop)"))
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create or update a profile
    Init(ConfigInitArgs),

    /// Show current settings
    Show,

    /// Print the settings file path
    Path,

    /// Set the default profile
    SetProfile {
        /// Profile name
        name: String,
    },
}

#[derive(Debug, Args)]
pub struct ConfigInitArgs {
    /// Profile name
    #[arg(long = "name", default_value = "default")]
    pub name: String,

    /// Document store URL
    #[arg(long = "store-url")]
    pub store_url: String,

    /// Tenant identifier
    #[arg(long = "tenant-id")]
    pub tenant: String,

    /// Environment variable holding the token
    #[arg(long)]
    pub token_env: Option<String>,

    /// Replace an existing profile of the same name
    #[arg(long)]
    pub force: bool,
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: Shell,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn command_tree_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn document_names_are_case_insensitive() {
        assert_eq!(parse_document("Heroes"), Ok(DocumentKind::Heroes));
        assert!(parse_document("footer").unwrap_err().contains("theme"));
    }
}
