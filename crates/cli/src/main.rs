// modelsift CLI - pick checkpoint runs by their folder-name attributes and
// print the monitoring command for them

mod clipboard;
mod exit_codes;
mod filter_args;
mod input;
mod tui;
mod util;

use std::io::{self, IsTerminal, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use serde::Serialize;

use modelsift_config::{ConfigError, Settings};
use modelsift_engine::{KeyScope, ModelRecord};

use exit_codes::{EXIT_CONFIG, EXIT_ERROR, EXIT_IO, EXIT_SUCCESS, EXIT_USAGE};
use filter_args::FilterArgs;
use input::InputArgs;

#[derive(Parser)]
#[command(name = "msift")]
#[command(about = "Filter trained-model checkpoints by name attributes and build a tensorboard command")]
#[command(long_version = long_version())]
#[command(version)]
#[command(subcommand_required = false)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Options that override the settings file for one invocation.
#[derive(Args, Debug, Clone, Default)]
struct GlobalArgs {
    /// Settings file (default: <config dir>/modelsift/settings.toml)
    #[arg(long, global = true, env = "MODELSIFT_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Fail on folder names that do not follow <type>-<k>-<v>-...-<x>-<y>
    #[arg(long, global = true)]
    strict: bool,

    /// Emit each log directory once when several runs share a title
    #[arg(long, global = true)]
    dedupe: bool,

    /// Offer every attribute key seen, not only the first model's
    #[arg(long, global = true)]
    union_keys: bool,

    /// Monitoring executable (default: tensorboard)
    #[arg(long, global = true, value_name = "CMD")]
    tool: Option<String>,

    /// Marker file name identifying a run directory (default: model.ckpt.meta)
    #[arg(long, global = true, value_name = "NAME")]
    marker: Option<String>,

    /// Debug logging on stderr (MODELSIFT_LOG overrides)
    #[arg(long, short = 'v', global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List the models that pass the filters
    #[command(after_help = "\
Examples:
  msift list models
  msift list models --where lr=0.001,0.01 --exclude type=CNN
  msift list models --epochs
  find models -name model.ckpt.meta | msift list --from-list -")]
    List {
        #[command(flatten)]
        input: InputArgs,

        #[command(flatten)]
        filters: FilterArgs,

        /// Also show the epoch counter stored next to each checkpoint
        #[arg(long)]
        epochs: bool,

        /// Output JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Show every filter key with its values, counts and selection state
    #[command(after_help = "\
Examples:
  msift filters models
  msift filters models --where type=Seq2Seq --json")]
    Filters {
        #[command(flatten)]
        input: InputArgs,

        #[command(flatten)]
        filters: FilterArgs,

        /// Output JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Print the monitoring command for the models that pass the filters
    #[command(after_help = "\
Examples:
  msift command models
  msift command models --where lr=0.1 --copy
  $(msift command models --where type=Seq2Seq)")]
    Command {
        #[command(flatten)]
        input: InputArgs,

        #[command(flatten)]
        filters: FilterArgs,

        /// Copy the command to the clipboard (OSC 52 terminal escape)
        #[arg(long)]
        copy: bool,

        /// Output JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Interactive checkbox browser
    #[command(after_help = "\
Keys:
  space  toggle value (or whole key on a heading)
  a/n/i  select all / none / invert for the key under the cursor
  y      copy command     r  rescan     ?  help     q  quit

The last command is printed on exit.")]
    Browse {
        #[command(flatten)]
        input: InputArgs,

        #[command(flatten)]
        filters: FilterArgs,
    },

    /// Show or create the settings file
    #[command(after_help = "\
Examples:
  msift config            # effective settings as TOML
  msift config --path
  msift config --init")]
    Config {
        /// Print the settings file path
        #[arg(long, conflicts_with = "init")]
        path: bool,

        /// Write a commented default settings file
        #[arg(long)]
        init: bool,
    },
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (", env!("GIT_COMMIT_HASH"), ")",
        "\nengine:  modelsift-engine ", env!("CARGO_PKG_VERSION"),
        "\ntarget:  ", env!("TARGET"),
    )
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    // Logs go to stderr; stdout carries the command and listings.
    let _ = tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_target(false)
        .without_time()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("MODELSIFT_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default)),
        )
        .try_init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.global.verbose);

    let global = cli.global;
    let result = match cli.command {
        None => {
            // No subcommand = show help
            eprintln!("Usage: msift <command> [options]");
            eprintln!("       msift --help for more information");
            Ok(())
        }
        Some(Commands::List { input, filters, epochs, json }) => {
            cmd_list(&global, input, filters, epochs, json)
        }
        Some(Commands::Filters { input, filters, json }) => cmd_filters(&global, input, filters, json),
        Some(Commands::Command { input, filters, copy, json }) => {
            cmd_command(&global, input, filters, copy, json)
        }
        Some(Commands::Browse { input, filters }) => cmd_browse(&global, input, filters),
        Some(Commands::Config { path, init }) => cmd_config(&global, path, init),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn new(code: u8, msg: impl Into<String>) -> Self {
        Self { code, message: msg.into(), hint: None }
    }

    pub fn io(err: io::Error) -> Self {
        Self::new(EXIT_IO, err.to_string())
    }

    pub fn config(err: ConfigError) -> Self {
        let hint = match &err {
            ConfigError::Parse { .. } => Some("fix or remove the file, or point --config elsewhere"),
            ConfigError::Write { .. } => Some("use --config to pick another location"),
            ConfigError::Read { .. } => None,
        };
        let mut cli_err = Self::new(EXIT_CONFIG, err.to_string());
        cli_err.hint = hint.map(str::to_string);
        cli_err
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

// ============================================================================
// settings
// ============================================================================

fn settings_path(global: &GlobalArgs) -> PathBuf {
    global.config.clone().unwrap_or_else(Settings::config_path)
}

/// Settings file plus command-line overrides.
fn resolve_settings(global: &GlobalArgs) -> Result<Settings, CliError> {
    let mut settings = Settings::load_from(&settings_path(global)).map_err(CliError::config)?;
    if global.strict {
        settings.parsing.strict_titles = true;
    }
    if global.union_keys {
        settings.parsing.key_scope = KeyScope::Union;
    }
    if global.dedupe {
        settings.command.dedupe_logdirs = true;
    }
    if let Some(tool) = &global.tool {
        settings.command.tool = tool.clone();
    }
    if let Some(marker) = &global.marker {
        if marker.is_empty() || marker.contains('/') {
            return Err(CliError::new(EXIT_USAGE, format!("invalid marker file name {marker:?}")));
        }
        settings.marker_filename = marker.clone();
    }
    Ok(settings)
}

fn open_session(
    global: &GlobalArgs,
    input: &InputArgs,
    filters: &FilterArgs,
) -> Result<(Settings, input::Loaded), CliError> {
    let settings = resolve_settings(global)?;
    let mut loaded = input::load_session(input, &settings)?;
    filters.apply(&mut loaded.session)?;
    tracing::debug!(
        "{} of {} models match",
        loaded.session.matching().len(),
        loaded.session.catalog().len()
    );
    Ok((settings, loaded))
}

// ============================================================================
// list
// ============================================================================

#[derive(Serialize)]
struct ListEntry<'a> {
    #[serde(flatten)]
    record: &'a ModelRecord,
    #[serde(skip_serializing_if = "Option::is_none")]
    started_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    epoch: Option<u64>,
}

fn cmd_list(
    global: &GlobalArgs,
    input: InputArgs,
    filters: FilterArgs,
    epochs: bool,
    json: bool,
) -> Result<(), CliError> {
    let (settings, loaded) = open_session(global, &input, &filters)?;
    let matching = loaded.session.matching();

    let epoch_of = |record: &ModelRecord| {
        if epochs {
            modelsift_io::read_epoch(&loaded.base, record, &settings.marker_filename)
        } else {
            None
        }
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();

    if json {
        let entries: Vec<ListEntry> = matching
            .iter()
            .map(|&record| ListEntry {
                record,
                started_at: record.started_at().map(|t| t.format("%Y-%m-%dT%H:%M").to_string()),
                epoch: epoch_of(record),
            })
            .collect();
        let text = serde_json::to_string_pretty(&entries)
            .map_err(|e| CliError::new(EXIT_ERROR, e.to_string()))?;
        writeln!(out, "{}", text).map_err(CliError::io)?;
        return Ok(());
    }

    let title_width = matching
        .iter()
        .map(|r| util::display_width(r.title()))
        .max()
        .unwrap_or(0);
    for &record in &matching {
        let title = util::pad_right(record.title(), title_width);
        let written = match (epochs, epoch_of(record)) {
            (false, _) => writeln!(out, "{}  {}", title, record.timestamp()),
            (true, Some(epoch)) => writeln!(out, "{}  {}  epoch {}", title, record.timestamp(), epoch),
            (true, None) => writeln!(out, "{}  {}  epoch -", title, record.timestamp()),
        };
        written.map_err(CliError::io)?;
    }
    Ok(())
}

// ============================================================================
// filters
// ============================================================================

#[derive(Serialize)]
struct FilterJson<'a> {
    key: &'a str,
    values: Vec<ValueJson>,
}

#[derive(Serialize)]
struct ValueJson {
    value: String,
    count: usize,
    selected: bool,
}

fn cmd_filters(global: &GlobalArgs, input: InputArgs, filters: FilterArgs, json: bool) -> Result<(), CliError> {
    let (_, loaded) = open_session(global, &input, &filters)?;
    let session = &loaded.session;

    let stdout = io::stdout();
    let mut out = stdout.lock();

    if json {
        let groups: Vec<FilterJson> = session
            .selection()
            .groups()
            .iter()
            .map(|g| FilterJson {
                key: g.key(),
                values: session
                    .catalog()
                    .value_counts(g.key())
                    .into_iter()
                    .map(|vc| ValueJson {
                        selected: g.is_selected(&vc.value),
                        value: vc.value,
                        count: vc.count,
                    })
                    .collect(),
            })
            .collect();
        let text = serde_json::to_string_pretty(&groups)
            .map_err(|e| CliError::new(EXIT_ERROR, e.to_string()))?;
        writeln!(out, "{}", text).map_err(CliError::io)?;
        return Ok(());
    }

    for row in tui::data::filter_rows(session) {
        let mark = tui::data::checkbox(session, &row);
        let written = match &row {
            tui::data::FilterRow::Header { key } => {
                let (selected, total) = session
                    .selection()
                    .group(key)
                    .map(|g| (g.selected_values().len(), g.domain().len()))
                    .unwrap_or_default();
                writeln!(out, "{} {}  ({}/{} selected)", mark, key, selected, total)
            }
            tui::data::FilterRow::Value { value, count, .. } => {
                writeln!(out, "    {} {}  ({})", mark, value, count)
            }
        };
        written.map_err(CliError::io)?;
    }
    Ok(())
}

// ============================================================================
// command
// ============================================================================

#[derive(Serialize)]
struct CommandJson<'a> {
    command: &'a str,
    logdirs: Vec<String>,
    matching: usize,
    total: usize,
    monitor_url: &'a str,
}

fn cmd_command(
    global: &GlobalArgs,
    input: InputArgs,
    filters: FilterArgs,
    copy: bool,
    json: bool,
) -> Result<(), CliError> {
    let (settings, loaded) = open_session(global, &input, &filters)?;
    let view = loaded.session.view();
    if view.matching.is_empty() {
        tracing::warn!("no model matches the current filters");
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();

    if json {
        let doc = CommandJson {
            command: &view.command,
            logdirs: loaded.session.options().command.logdirs(view.matching.iter().copied()),
            matching: view.matching.len(),
            total: view.total,
            monitor_url: &settings.command.monitor_url,
        };
        let text = serde_json::to_string_pretty(&doc)
            .map_err(|e| CliError::new(EXIT_ERROR, e.to_string()))?;
        writeln!(out, "{}", text).map_err(CliError::io)?;
    } else {
        writeln!(out, "{}", view.command).map_err(CliError::io)?;
        if io::stderr().is_terminal() {
            eprintln!("monitor: {}", settings.command.monitor_url);
        }
    }

    if copy {
        let mut err = io::stderr();
        if err.is_terminal() {
            clipboard::copy_to(&mut err, &view.command).map_err(CliError::io)?;
        } else {
            tracing::warn!("--copy needs a terminal on stderr; command not copied");
        }
    }
    Ok(())
}

// ============================================================================
// browse
// ============================================================================

fn cmd_browse(global: &GlobalArgs, input: InputArgs, filters: FilterArgs) -> Result<(), CliError> {
    if input.reads_stdin() {
        return Err(CliError::new(EXIT_USAGE, "browse cannot read the path list from stdin")
            .with_hint("write the list to a file and pass --from-list FILE"));
    }
    if !io::stdout().is_terminal() || !io::stdin().is_terminal() {
        return Err(CliError::new(EXIT_IO, "browse needs an interactive terminal")
            .with_hint("use `msift list` or `msift command` in scripts"));
    }

    let (settings, loaded) = open_session(global, &input, &filters)?;
    let command = tui::run(
        loaded.session,
        input.dir.clone(),
        input.label(),
        settings.command.monitor_url.clone(),
    )
    .map_err(|e| CliError::new(EXIT_IO, e))?;

    println!("{}", command);
    Ok(())
}

// ============================================================================
// config
// ============================================================================

fn cmd_config(global: &GlobalArgs, path: bool, init: bool) -> Result<(), CliError> {
    let file = settings_path(global);
    if path {
        println!("{}", file.display());
        return Ok(());
    }
    if init {
        Settings::write_default_file(&file).map_err(CliError::config)?;
        eprintln!("wrote {}", file.display());
        return Ok(());
    }

    let settings = resolve_settings(global)?;
    let text = settings
        .to_toml()
        .map_err(|e| CliError::new(EXIT_ERROR, e))?;
    print!("{}", text);
    Ok(())
}
