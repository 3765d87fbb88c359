//! CLI argument definitions.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::config::HandlerKind;

/// Stream Deck layout editor - edit the layouts a running deck daemon shows.
///
/// Robot Mode: Use --robot or --format=json for machine-parseable output.
#[derive(Parser, Debug)]
#[command(name = "sde", version, about, long_about = None)]
#[command(propagate_version = true)]
#[allow(clippy::struct_excessive_bools)] // CLI flags naturally use multiple bools
pub struct Cli {
    /// Output format (text for humans, json for agents/scripts)
    #[arg(
        long,
        short = 'f',
        default_value = "text",
        global = true,
        env = "SDE_FORMAT"
    )]
    pub format: OutputFormat,

    /// Robot mode: equivalent to --format=json
    #[arg(long, global = true)]
    pub robot: bool,

    /// Verbose logging (-v debug, -vv trace)
    #[arg(long, short = 'v', global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (suppress non-essential output)
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Daemon socket path
    #[arg(long, global = true, env = "SDE_SOCKET")]
    pub socket: Option<PathBuf>,

    /// Settings file (.toml, .yaml or .yml)
    #[arg(long, global = true, env = "SDE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Device serial to edit (defaults to the first device)
    #[arg(long, short = 'd', global = true, env = "SDE_DEVICE")]
    pub device: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Output format selection.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text with optional color
    #[default]
    Text,
    /// JSON output for scripts and agents
    Json,
    /// Compact JSON (single line)
    JsonCompact,
}

impl Cli {
    /// Returns true if output should be JSON (robot mode or explicit --format=json).
    pub const fn use_json(&self) -> bool {
        self.robot || matches!(self.format, OutputFormat::Json | OutputFormat::JsonCompact)
    }

    /// Returns true if output should be compact JSON.
    pub const fn use_compact_json(&self) -> bool {
        matches!(self.format, OutputFormat::JsonCompact)
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    // === Discovery ===
    /// List devices managed by the daemon
    Devices,

    /// List icon and key handlers
    Handlers(HandlersArgs),

    /// List application contexts from the open windows
    Apps,

    // === Layout ===
    /// Show the current page, or one key in detail
    Show(ShowArgs),

    /// Change built-in settings of a key (text, icon, url, brightness, ...)
    Edit(EditArgs),

    /// Choose the icon or key handler of a key
    SetHandler(SetHandlerArgs),

    /// Set a field of a key's handler
    SetField(SetFieldArgs),

    /// Copy a key, with all its overrides, onto another position
    CopyKey(CopyKeyArgs),

    /// Navigate, add, remove or reset pages
    #[command(subcommand)]
    Page(PageCommand),

    // === Daemon sync ===
    /// Send the daemon's working copy back as a live preview
    Push,

    /// Persist the daemon's configuration to disk
    Commit,

    /// Make the daemon re-read its configuration file
    Reload,

    /// Fire a key's action
    Press(PressArgs),

    /// Save the handler preview of a key as PNG
    Preview(PreviewArgs),

    /// Follow page changes reported by the daemon
    Watch(WatchArgs),

    // === Utilities ===
    /// Show version and build information
    Version,

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Icon or key side of a key.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum KindArg {
    Icon,
    Key,
}

impl From<KindArg> for HandlerKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Icon => Self::Icon,
            KindArg::Key => Self::Key,
        }
    }
}

// === Argument Structs ===

#[derive(Parser, Debug)]
pub struct HandlersArgs {
    /// Only handlers usable for this side
    #[arg(long, short = 'k')]
    pub kind: Option<KindArg>,

    /// Include each handler's fields
    #[arg(long, short = 'l')]
    pub long: bool,
}

/// Key position and application context shared by key commands.
#[derive(Parser, Debug)]
pub struct KeyTarget {
    /// Key index (0-based, left-to-right, top-to-bottom)
    pub key: usize,

    /// Page to edit (defaults to the page the device shows)
    #[arg(long, short = 'p')]
    pub page: Option<usize>,

    /// Application context ("Default" or a window class)
    #[arg(long, short = 'a', default_value = "Default")]
    pub app: String,
}

#[derive(Parser, Debug)]
pub struct ShowArgs {
    /// Show one key in detail
    #[arg(long, short = 'k')]
    pub key: Option<usize>,

    /// Page to show (defaults to the page the device shows)
    #[arg(long, short = 'p')]
    pub page: Option<usize>,

    /// Application context for the detail view
    #[arg(long, short = 'a', default_value = "Default")]
    pub app: String,
}

/// Built-in settings edit.
///
/// # Examples
///
/// ```bash
/// sde edit 3 --set text=Build --set text_alignment=bottom
/// sde edit 4 --app firefox --set url=https://example.org --commit
/// sde edit 0 --set brightness=40
/// ```
#[derive(Parser, Debug)]
pub struct EditArgs {
    #[command(flatten)]
    pub target: KeyTarget,

    /// NAME=VALUE; names: text, text_size, text_alignment, icon, url,
    /// switch_page, keybind, command, brightness
    #[arg(long, short = 's', value_name = "NAME=VALUE", required = true)]
    pub set: Vec<String>,

    /// Persist after editing
    #[arg(long, short = 'c')]
    pub commit: bool,
}

#[derive(Parser, Debug)]
pub struct SetHandlerArgs {
    #[command(flatten)]
    pub target: KeyTarget,

    /// Which handler to change
    #[arg(long, short = 'k', default_value = "icon")]
    pub kind: KindArg,

    /// Handler name ("Default" for built-in)
    #[arg(long, short = 'n')]
    pub name: String,

    /// Persist after editing
    #[arg(long, short = 'c')]
    pub commit: bool,
}

#[derive(Parser, Debug)]
pub struct SetFieldArgs {
    #[command(flatten)]
    pub target: KeyTarget,

    /// Which handler's field
    #[arg(long, short = 'k', default_value = "icon")]
    pub kind: KindArg,

    /// Field name
    #[arg(long)]
    pub field: String,

    /// New value
    #[arg(long)]
    pub value: String,

    /// Persist after editing
    #[arg(long, short = 'c')]
    pub commit: bool,
}

#[derive(Parser, Debug)]
pub struct CopyKeyArgs {
    /// Source key index
    pub from: usize,

    /// Destination key index
    pub to: usize,

    /// Source page (defaults to the page the device shows)
    #[arg(long)]
    pub from_page: Option<usize>,

    /// Destination page (defaults to the source page)
    #[arg(long)]
    pub to_page: Option<usize>,

    /// Persist after pasting (pasting alone only previews)
    #[arg(long, short = 'c')]
    pub commit: bool,
}

/// Page navigation and structure.
#[derive(Subcommand, Debug)]
pub enum PageCommand {
    /// Show the next page (stops at the last)
    Next,
    /// Show the previous page (stops at the first)
    Prev,
    /// Show a page by index
    Goto {
        /// Page index (0-based)
        page: usize,
    },
    /// Append an empty page and show it
    Add,
    /// Remove the shown page (resets it when it is the only one)
    Remove,
    /// Empty every key of the shown page
    Reset,
}

#[derive(Parser, Debug)]
pub struct PressArgs {
    /// Key index
    pub key: usize,
}

#[derive(Parser, Debug)]
pub struct PreviewArgs {
    #[command(flatten)]
    pub target: KeyTarget,

    /// Output PNG path
    #[arg(long, short = 'o', default_value = "preview.png")]
    pub output: PathBuf,
}

#[derive(Parser, Debug)]
pub struct WatchArgs {
    /// Exit after the first page change
    #[arg(long)]
    pub once: bool,

    /// Timeout in seconds (0 = no timeout)
    #[arg(long, short = 't', default_value = "0")]
    pub timeout: u64,
}

#[derive(Parser, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}

/// Split a `NAME=VALUE` pair. The value may be empty or contain `=`.
pub fn parse_assignment(pair: &str) -> Option<(&str, &str)> {
    let (name, value) = pair.split_once('=')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    Some((name, value))
}
