//! Stream Deck layout editor.
//!
//! Provides both human-friendly and agent-friendly (robot mode) interfaces.
#![forbid(unsafe_code)]

use std::io::{self, IsTerminal};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use clap::Parser;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tracing::warn;

use sde::apps::{self, label_for};
use sde::cli::{self, Cli, Commands, KeyTarget, PageCommand, parse_assignment};
use sde::config::HandlerKind;
use sde::edit::{BuiltinEdit, builtin_values, controls_for};
use sde::error::{EditorError, Result, ResultExt};
use sde::handlers::HandlerRegistry;
use sde::logging::{LogOptions, init_logging};
use sde::session::{Session, SessionOptions};
use sde::settings::EditorSettings;
use sde::sync::{SocketClient, SyncClient};

/// Build information embedded at compile time.
mod build_info {
    pub const VERSION: &str = env!("CARGO_PKG_VERSION");

    pub fn git_sha() -> &'static str {
        option_env!("VERGEN_GIT_SHA").unwrap_or("unknown")
    }

    pub fn git_dirty() -> &'static str {
        option_env!("VERGEN_GIT_DIRTY").unwrap_or("false")
    }

    pub fn build_timestamp() -> &'static str {
        option_env!("VERGEN_BUILD_TIMESTAMP").unwrap_or("unknown")
    }

    pub fn rustc_semver() -> &'static str {
        option_env!("VERGEN_RUSTC_SEMVER").unwrap_or("unknown")
    }

    pub fn target() -> &'static str {
        option_env!("VERGEN_CARGO_TARGET_TRIPLE").unwrap_or("unknown")
    }
}

fn main() {
    let cli = Cli::parse();

    if cli.no_color || !io::stdout().is_terminal() {
        console::set_colors_enabled(false);
    }
    if cli.no_color || !io::stderr().is_terminal() {
        console::set_colors_enabled_stderr(false);
    }
    init_logging(LogOptions {
        robot: cli.use_json(),
        verbose: cli.verbose,
        quiet: cli.quiet,
        no_color: cli.no_color,
    });

    if let Err(e) = run(&cli) {
        output_error(&cli, &e);
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    match &cli.command {
        None => print_quick_start(cli),
        Some(Commands::Version) => cmd_version(cli),
        Some(Commands::Completions(args)) => cmd_completions(cli, args),
        Some(command) => {
            let settings = EditorSettings::discover(cli.config.as_deref())?
                .with_socket(cli.socket.clone());
            run_with_settings(cli, command, &settings)
        }
    }
}

fn run_with_settings(cli: &Cli, command: &Commands, settings: &EditorSettings) -> Result<()> {
    match command {
        Commands::Devices => cmd_devices(cli, settings),
        Commands::Handlers(args) => cmd_handlers(cli, settings, args),
        Commands::Apps => cmd_apps(cli, settings),
        Commands::Show(args) => cmd_show(cli, settings, args),
        Commands::Edit(args) => cmd_edit(cli, settings, args),
        Commands::SetHandler(args) => cmd_set_handler(cli, settings, args),
        Commands::SetField(args) => cmd_set_field(cli, settings, args),
        Commands::CopyKey(args) => cmd_copy_key(cli, settings, args),
        Commands::Page(page) => cmd_page(cli, settings, page),
        Commands::Push => cmd_push(cli, settings),
        Commands::Commit => cmd_commit(cli, settings),
        Commands::Reload => cmd_reload(cli, settings),
        Commands::Press(args) => cmd_press(cli, settings, args),
        Commands::Preview(args) => cmd_preview(cli, settings, args),
        Commands::Watch(args) => cmd_watch(cli, settings, args),
        Commands::Version | Commands::Completions(_) => Ok(()),
    }
}

// === Quick Start ===

#[allow(clippy::unnecessary_wraps)] // Consistent return type with other commands
fn print_quick_start(cli: &Cli) -> Result<()> {
    if cli.use_json() {
        output_json(
            cli,
            &RobotQuickStart {
                tool: "sde",
                version: build_info::VERSION,
                description: "Layout editor for Stream Deck devices driven by a deck daemon",
                discovery: &["sde devices --robot", "sde handlers --robot", "sde apps --robot"],
                editing: &[
                    "sde show --robot",
                    "sde edit <KEY> --set text=Hi [--app <CLASS>] [--commit]",
                    "sde set-handler <KEY> --kind icon --name <HANDLER>",
                    "sde set-field <KEY> --kind icon --field <NAME> --value <VALUE>",
                    "sde copy-key <FROM> <TO> [--to-page <N>]",
                ],
                pages: &["sde page next|prev|goto <N>|add|remove|reset"],
                sync: &["sde commit", "sde reload", "sde watch --robot"],
                multi_device: "Use --device <SERIAL> to pick a device",
            },
        );
    } else {
        println!(
            "{} {} - Stream Deck layout editor\n",
            style("sde").bold().cyan(),
            build_info::VERSION
        );
        println!("{}", style("QUICK START").bold().underlined());
        println!();
        println!("  {}  List devices", style("sde devices").green());
        println!("  {}  Show the current page", style("sde show").green());
        println!("  {}  Label key 3", style("sde edit 3 --set text=Build").green());
        println!("  {}  Save to disk", style("sde commit").green());
        println!("  {}  Follow page changes", style("sde watch").green());
        println!();
        println!("Run {} for full help", style("sde --help").yellow());
    }
    Ok(())
}

#[derive(Serialize)]
struct RobotQuickStart {
    tool: &'static str,
    version: &'static str,
    description: &'static str,
    discovery: &'static [&'static str],
    editing: &'static [&'static str],
    pages: &'static [&'static str],
    sync: &'static [&'static str],
    multi_device: &'static str,
}

// === Connection ===

fn spinner(cli: &Cli, message: &str) -> Option<ProgressBar> {
    if cli.use_json() || cli.quiet || !io::stderr().is_terminal() {
        return None;
    }
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    bar.set_message(message.to_string());
    bar.enable_steady_tick(Duration::from_millis(80));
    Some(bar)
}

fn connect(cli: &Cli, settings: &EditorSettings) -> Result<Arc<SocketClient>> {
    let path = settings.socket_path()?;
    let bar = spinner(cli, "Connecting to daemon");
    let client = SocketClient::connect(path, settings.request_timeout());
    if let Some(bar) = bar {
        bar.finish_and_clear();
    }
    Ok(Arc::new(client?))
}

/// What a command does with the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Access {
    /// Only reads; an empty fallback copy is good enough.
    Read,
    /// Reads and follows page changes.
    Watch,
    /// Pushes or commits; needs the daemon's real config.
    Edit,
}

fn open_session(cli: &Cli, settings: &EditorSettings, access: Access) -> Result<Session> {
    let client = connect(cli, settings)?;
    let bar = spinner(cli, "Loading configuration");
    let session = Session::start(
        client,
        SessionOptions {
            device: cli.device.clone(),
            live_preview: settings.live_preview,
            subscribe: access == Access::Watch,
            require_config: access == Access::Edit,
        },
    );
    if let Some(bar) = bar {
        bar.finish_and_clear();
    }
    let session = session?;
    for warning in session.warnings() {
        warn!(error = %warning, "Session started with a problem");
    }
    Ok(session)
}

/// Move the session to a key: page, position and application context.
fn target_key(session: &mut Session, target: &KeyTarget) -> Result<()> {
    if let Some(page) = target.page {
        if page != session.active_page() {
            session.go_to_page(page)?;
        }
    }
    session.select_key(target.key)?;
    session.select_application(&target.app);
    Ok(())
}

// === Command Implementations ===

fn cmd_devices(cli: &Cli, settings: &EditorSettings) -> Result<()> {
    let client = connect(cli, settings)?;
    let devices = client.get_devices()?;
    if cli.use_json() {
        output_json(cli, &devices);
    } else if devices.is_empty() {
        println!("{}", style("The daemon manages no devices").yellow());
    } else {
        for d in &devices {
            println!(
                "{}: {} ({}x{} keys, page {})",
                style(&d.serial).green(),
                d.name,
                d.cols,
                d.rows,
                d.page + 1
            );
        }
    }
    Ok(())
}

fn cmd_handlers(cli: &Cli, settings: &EditorSettings, args: &cli::HandlersArgs) -> Result<()> {
    let client = connect(cli, settings)?;
    let registry = HandlerRegistry::from_modules(client.get_modules()?);
    let kind = args.kind.map(HandlerKind::from);
    let modules: Vec<_> = registry
        .modules()
        .iter()
        .filter(|m| kind.is_none_or(|k| m.supports(k)))
        .collect();

    if cli.use_json() {
        output_json(cli, &modules);
        return Ok(());
    }
    for module in modules {
        let mut sides = Vec::new();
        if module.is_icon {
            sides.push("icon");
        }
        if module.is_key {
            sides.push("key");
        }
        println!("{} [{}]", style(&module.name).green(), sides.join(", "));
        if args.long {
            for (side, fields) in [("icon", &module.icon_fields), ("key", &module.key_fields)] {
                for field in fields {
                    println!(
                        "    {side}.{} ({}): {}",
                        field.name,
                        field.kind.type_name(),
                        field.title
                    );
                }
            }
        }
    }
    Ok(())
}

fn cmd_apps(cli: &Cli, settings: &EditorSettings) -> Result<()> {
    let applications = apps::list_applications(&settings.window_list_command)?;
    if cli.use_json() {
        output_json(cli, &applications);
    } else {
        for app in applications {
            println!("{app}");
        }
    }
    Ok(())
}

#[derive(Serialize)]
struct PageView<'a> {
    serial: String,
    page: usize,
    label: String,
    keys: &'a [sde::navigator::GridSlot],
}

fn cmd_show(cli: &Cli, settings: &EditorSettings, args: &cli::ShowArgs) -> Result<()> {
    let mut session = open_session(cli, settings, Access::Read)?;
    if let Some(page) = args.page {
        session.go_to_page(page)?;
    }

    if let Some(key) = args.key {
        return show_key(cli, &mut session, key, &args.app);
    }

    let serial = session.active_serial()?;
    let view = PageView {
        serial: serial.clone(),
        page: session.active_page(),
        label: session.page_label(),
        keys: session.grid(),
    };
    if cli.use_json() {
        output_json(cli, &view);
        return Ok(());
    }

    let cols = session.store().device(&serial)?.cols.max(1);
    println!(
        "{} page {}",
        style(&serial).bold(),
        style(&view.label).cyan()
    );
    for row in view.keys.chunks(cols) {
        let cells: Vec<String> = row
            .iter()
            .map(|slot| {
                let config = slot.key.default_config();
                let label = if !config.text.is_empty() {
                    config.text.replace('\n', " ")
                } else if !config.icon_handler.is_empty() {
                    format!("<{}>", config.icon_handler)
                } else if slot.key.is_blank() {
                    "-".to_string()
                } else {
                    "*".to_string()
                };
                format!("[{:>2}] {:<12}", slot.index, truncate(&label, 12))
            })
            .collect();
        println!("  {}", cells.join(" "));
    }
    Ok(())
}

#[derive(Serialize)]
struct KeyView {
    key: usize,
    context: String,
    icon_handler: String,
    key_handler: String,
    config: sde::config::KeyConfig,
    contexts: Vec<String>,
    icon_controls: Vec<sde::edit::EditControl>,
    key_controls: Vec<sde::edit::EditControl>,
}

fn show_key(cli: &Cli, session: &mut Session, key: usize, app: &str) -> Result<()> {
    session.select_key(key)?;
    session.select_application(app);
    let config = session.current_config()?;
    let serial = session.active_serial()?;
    let stored = session.store().key(&serial, session.active_page(), key)?;

    let controls = |kind: HandlerKind, name: &str| {
        session
            .registry()
            .lookup_for(name, kind)
            .map(|module| {
                let values = match kind {
                    HandlerKind::Icon => &config.icon_handler_fields,
                    HandlerKind::Key => &config.key_handler_fields,
                };
                controls_for(module.fields(kind), values)
            })
            .unwrap_or_default()
    };
    let view = KeyView {
        key,
        context: label_for(&session.current_context()).to_string(),
        icon_handler: config.icon_handler_label().to_string(),
        key_handler: config.key_handler_label().to_string(),
        icon_controls: controls(HandlerKind::Icon, config.icon_handler_label()),
        key_controls: controls(HandlerKind::Key, config.key_handler_label()),
        contexts: stored
            .application
            .keys()
            .map(|c| label_for(c).to_string())
            .collect(),
        config: config.clone(),
    };
    if cli.use_json() {
        output_json(cli, &view);
        return Ok(());
    }

    println!(
        "{} {} ({})",
        style("Key").bold(),
        key,
        style(&view.context).cyan()
    );
    println!("  contexts: {}", view.contexts.join(", "));
    for (kind, handler, builtin) in [
        (HandlerKind::Icon, &view.icon_handler, config.uses_builtin_icon()),
        (HandlerKind::Key, &view.key_handler, config.uses_builtin_key()),
    ] {
        println!("  {} handler: {}", kind, style(handler).green());
        if builtin {
            for (name, value) in builtin_values(&config, kind) {
                println!("    {name}: {value}");
            }
        }
    }
    for control in view.icon_controls.iter().chain(&view.key_controls) {
        println!("    {}: {}", control.name(), control_value(control));
    }
    Ok(())
}

fn control_value(control: &sde::edit::EditControl) -> String {
    use sde::edit::EditControl;
    match control {
        EditControl::Entry { value, .. }
        | EditControl::FilePicker { value, .. }
        | EditControl::NumberEntry { value, .. } => value.clone(),
        EditControl::AlignmentSelect { selected, .. } => {
            selected.map(|a| a.to_string()).unwrap_or_default()
        }
        EditControl::Select { selected, .. } => selected.clone().unwrap_or_default(),
    }
}

/// Commit, or push when the edit has not been previewed yet.
fn finish_edit(cli: &Cli, session: &Session, pushed: bool, commit: bool, what: &str) -> Result<()> {
    if commit {
        session.commit()?;
    } else if !pushed {
        session.push()?;
    }
    if cli.use_json() {
        output_json(
            cli,
            &serde_json::json!({
                "ok": true,
                "edited": what,
                "committed": commit,
                "page": session.active_page(),
                "key": session.selected_key(),
            }),
        );
    } else if !cli.quiet {
        let suffix = if commit { " and committed" } else { "" };
        println!("{what} updated{suffix}");
    }
    Ok(())
}

fn cmd_edit(cli: &Cli, settings: &EditorSettings, args: &cli::EditArgs) -> Result<()> {
    let edits = args
        .set
        .iter()
        .map(|pair| {
            let (name, value) = parse_assignment(pair).ok_or_else(|| {
                EditorError::Other(format!("Expected NAME=VALUE, got '{pair}'"))
            })?;
            BuiltinEdit::parse(name, value)
        })
        .collect::<Result<Vec<_>>>()?;

    let mut session = open_session(cli, settings, Access::Edit)?;
    target_key(&mut session, &args.target)?;
    for edit in &edits {
        session.apply_builtin(edit)?;
    }
    finish_edit(
        cli,
        &session,
        settings.live_preview,
        args.commit,
        &format!("Key {}", args.target.key),
    )
}

fn cmd_set_handler(cli: &Cli, settings: &EditorSettings, args: &cli::SetHandlerArgs) -> Result<()> {
    let mut session = open_session(cli, settings, Access::Edit)?;
    target_key(&mut session, &args.target)?;
    session.set_handler(args.kind.into(), &args.name)?;
    finish_edit(
        cli,
        &session,
        settings.live_preview,
        args.commit,
        &format!("Key {} handler", args.target.key),
    )
}

fn cmd_set_field(cli: &Cli, settings: &EditorSettings, args: &cli::SetFieldArgs) -> Result<()> {
    let mut session = open_session(cli, settings, Access::Edit)?;
    target_key(&mut session, &args.target)?;
    session.set_handler_field(args.kind.into(), &args.field, &args.value)?;
    finish_edit(
        cli,
        &session,
        settings.live_preview,
        args.commit,
        &format!("Key {} field '{}'", args.target.key, args.field),
    )
}

fn cmd_copy_key(cli: &Cli, settings: &EditorSettings, args: &cli::CopyKeyArgs) -> Result<()> {
    let mut session = open_session(cli, settings, Access::Edit)?;
    let from_page = args.from_page.unwrap_or_else(|| session.active_page());
    session.copy_key_at(from_page, args.from)?;

    let to_page = args.to_page.unwrap_or(from_page);
    if to_page != session.active_page() {
        session.go_to_page(to_page)?;
    }
    session.select_key(args.to)?;
    session.paste_key()?;
    // Pasting never pushes on its own.
    finish_edit(cli, &session, false, args.commit, &format!("Key {}", args.to))
}

fn cmd_page(cli: &Cli, settings: &EditorSettings, command: &PageCommand) -> Result<()> {
    let mut session = open_session(cli, settings, Access::Edit)?;
    let action = match command {
        PageCommand::Next => {
            session.next_page()?;
            "next"
        }
        PageCommand::Prev => {
            session.previous_page()?;
            "prev"
        }
        PageCommand::Goto { page } => {
            session.go_to_page(*page)?;
            "goto"
        }
        PageCommand::Add => {
            session.add_page()?;
            "add"
        }
        PageCommand::Remove => {
            session.remove_page()?;
            "remove"
        }
        PageCommand::Reset => {
            session.reset_page()?;
            "reset"
        }
    };

    if cli.use_json() {
        output_json(
            cli,
            &serde_json::json!({
                "ok": true,
                "action": action,
                "serial": session.active_serial()?,
                "page": session.active_page(),
                "page_count": session.store().page_count(&session.active_serial()?),
            }),
        );
    } else if !cli.quiet {
        println!("Page {}", session.page_label());
    }
    Ok(())
}

fn cmd_push(cli: &Cli, settings: &EditorSettings) -> Result<()> {
    let session = open_session(cli, settings, Access::Edit)?;
    session.push()?;
    report_ok(cli, "push", "Configuration pushed");
    Ok(())
}

fn cmd_commit(cli: &Cli, settings: &EditorSettings) -> Result<()> {
    let session = open_session(cli, settings, Access::Edit)?;
    session.commit()?;
    report_ok(cli, "commit", "Configuration committed");
    Ok(())
}

fn cmd_reload(cli: &Cli, settings: &EditorSettings) -> Result<()> {
    let mut session = open_session(cli, settings, Access::Read)?;
    session.reload()?;
    report_ok(cli, "reload", "Configuration reloaded from disk");
    Ok(())
}

fn cmd_press(cli: &Cli, settings: &EditorSettings, args: &cli::PressArgs) -> Result<()> {
    let session = open_session(cli, settings, Access::Read)?;
    session.press(args.key)?;
    if cli.use_json() {
        output_json(cli, &serde_json::json!({ "ok": true, "pressed": args.key }));
    } else if !cli.quiet {
        println!("Key {} pressed", args.key);
    }
    Ok(())
}

fn cmd_preview(cli: &Cli, settings: &EditorSettings, args: &cli::PreviewArgs) -> Result<()> {
    let mut session = open_session(cli, settings, Access::Read)?;
    target_key(&mut session, &args.target)?;
    let image = session.preview()?;
    image
        .save(&args.output)
        .with_context(|| format!("Failed to save {}", args.output.display()))?;
    if cli.use_json() {
        output_json(
            cli,
            &serde_json::json!({
                "ok": true,
                "path": args.output.display().to_string(),
                "width": image.width(),
                "height": image.height(),
            }),
        );
    } else if !cli.quiet {
        println!("Preview written to {}", args.output.display());
    }
    Ok(())
}

fn cmd_watch(cli: &Cli, settings: &EditorSettings, args: &cli::WatchArgs) -> Result<()> {
    let mut session = open_session(cli, settings, Access::Watch)?;
    let serial = session.active_serial()?;
    if !cli.quiet && !cli.use_json() {
        println!(
            "Following {} from page {} (Ctrl+C to stop)...",
            style(&serial).green(),
            session.page_label()
        );
    }

    let started = Instant::now();
    let timeout = Duration::from_secs(args.timeout);
    loop {
        if session.process_events() > 0 {
            if cli.use_json() {
                // One event per line, whatever --format says.
                println!(
                    "{}",
                    serde_json::json!({
                        "event": "page_changed",
                        "serial": serial,
                        "page": session.active_page(),
                        "timestamp": chrono::Utc::now().to_rfc3339(),
                    })
                );
            } else {
                println!("Page {}", session.page_label());
            }
            if args.once {
                return Ok(());
            }
        }
        if args.timeout > 0 && started.elapsed() >= timeout {
            return Ok(());
        }
        thread::sleep(Duration::from_millis(50));
    }
}

#[allow(clippy::unnecessary_wraps)] // Consistent return type with other commands
fn cmd_version(cli: &Cli) -> Result<()> {
    if cli.use_json() {
        output_json(
            cli,
            &serde_json::json!({
                "version": build_info::VERSION,
                "git_sha": build_info::git_sha(),
                "git_dirty": build_info::git_dirty() == "true",
                "build_timestamp": build_info::build_timestamp(),
                "rustc_version": build_info::rustc_semver(),
                "target": build_info::target(),
            }),
        );
    } else {
        println!("sde {}", build_info::VERSION);
        println!(
            "git: {}{}",
            build_info::git_sha(),
            if build_info::git_dirty() == "true" {
                " (dirty)"
            } else {
                ""
            }
        );
        println!("built: {}", build_info::build_timestamp());
        println!("rustc: {}", build_info::rustc_semver());
        println!("target: {}", build_info::target());
    }
    Ok(())
}

#[allow(clippy::unnecessary_wraps)] // Consistent return type with other commands
fn cmd_completions(_cli: &Cli, args: &cli::CompletionsArgs) -> Result<()> {
    use clap::CommandFactory;
    clap_complete::generate(args.shell, &mut Cli::command(), "sde", &mut io::stdout());
    Ok(())
}

// === Utility Functions ===

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut short: String = text.chars().take(width.saturating_sub(1)).collect();
    short.push('~');
    short
}

fn report_ok(cli: &Cli, action: &str, message: &str) {
    if cli.use_json() {
        output_json(cli, &serde_json::json!({ "ok": true, "action": action }));
    } else if !cli.quiet {
        println!("{message}");
    }
}

fn output_json<T: Serialize + ?Sized>(cli: &Cli, data: &T) {
    let json = if cli.use_compact_json() {
        serde_json::to_string(data)
    } else {
        serde_json::to_string_pretty(data)
    };
    match json {
        Ok(json) => println!("{json}"),
        Err(e) => eprintln!("Failed to serialize output: {e}"),
    }
}

fn output_error(cli: &Cli, error: &EditorError) {
    if cli.use_json() {
        let json = serde_json::json!({
            "error": true,
            "message": error.to_string(),
            "suggestion": error.suggestion(),
            "recoverable": error.is_user_recoverable(),
        });
        eprintln!(
            "{}",
            serde_json::to_string_pretty(&json).unwrap_or_else(|_| error.to_string())
        );
    } else {
        eprintln!("{}: {}", style("Error").red().bold().for_stderr(), error);
        if let Some(suggestion) = error.suggestion() {
            eprintln!("{}: {}", style("Hint").yellow().for_stderr(), suggestion);
        }
    }
}
