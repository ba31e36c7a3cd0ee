//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use appendix_core::{
    AppendPipeline, AppendReport, FailureKind, ItemFailure, ProgressReporter, SourceKind,
};
use appendix_filters::FilterRegistry;
use appendix_scan::FsScanner;
use appendix_shared::{
    AppConfig, AppendTask, ContentItem, DynamicContext, FileListSpec, FileSetSpec,
    FilterChainSpec, FilterStageSpec, init_config, load_config, load_task,
};
use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::Result;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// Appendix: append files and text to a destination file.
#[derive(Parser)]
#[command(
    name = "appendix",
    version,
    about = "Append files, file-lists, file-sets, or text to a single destination file.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Print the run report as JSON instead of a summary.
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Run an append task file.
    Run {
        /// Path to the task TOML file.
        task: PathBuf,
    },

    /// Append sources given on the command line.
    Append(AppendArgs),

    /// List the available filter stages and their parameters.
    Filters,

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Sources and filters for an ad-hoc append.
#[derive(Args, Debug)]
pub(crate) struct AppendArgs {
    /// Destination file; created if missing, existing bytes are kept.
    #[arg(long)]
    pub dest: Option<PathBuf>,

    /// Single file to append first.
    #[arg(long)]
    pub file: Option<PathBuf>,

    /// Inline text to append instead of files.
    #[arg(long)]
    pub text: Option<String>,

    /// Base directory of a file-list.
    #[arg(long)]
    pub list_dir: Option<PathBuf>,

    /// File-list entry, relative to --list-dir (repeatable, or comma-separated).
    #[arg(long = "list-file", requires = "list_dir")]
    pub list_files: Vec<String>,

    /// File with one file-list entry per line.
    #[arg(long, requires = "list_dir")]
    pub list_from: Option<PathBuf>,

    /// Base directory of a file-set scan.
    #[arg(long)]
    pub fileset: Option<PathBuf>,

    /// Include pattern for the file-set (repeatable).
    #[arg(long = "include", requires = "fileset")]
    pub includes: Vec<String>,

    /// Exclude pattern for the file-set (repeatable).
    #[arg(long = "exclude", requires = "fileset")]
    pub excludes: Vec<String>,

    /// Prefix every line of appended files; `%{current_file}` is expanded.
    #[arg(long)]
    pub prefix_lines: Option<String>,
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "appendix=info",
        1 => "appendix=debug",
        _ => "appendix=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Run { task } => cmd_run(&task, cli.json),
        Command::Append(args) => cmd_append(args, cli.json),
        Command::Filters => cmd_filters(),
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(),
        },
    }
}

fn cmd_run(path: &Path, json: bool) -> Result<()> {
    let config = load_config()?;
    let task = load_task(path)?;
    info!(task = %path.display(), "running append task");
    execute(&task, &config, json)
}

fn cmd_append(args: AppendArgs, json: bool) -> Result<()> {
    let config = load_config()?;
    let task = task_from_args(args, &config);
    execute(&task, &config, json)
}

/// Build an [`AppendTask`] from command-line sources.
fn task_from_args(args: AppendArgs, config: &AppConfig) -> AppendTask {
    let filelists = match args.list_dir {
        Some(dir) => vec![FileListSpec {
            dir: Some(dir),
            files: args.list_files,
            listfile: args.list_from,
        }],
        None => Vec::new(),
    };

    let filesets = match args.fileset {
        Some(dir) => vec![FileSetSpec {
            dir: Some(dir),
            includes: args.includes,
            excludes: args.excludes,
            default_excludes: config.defaults.default_excludes,
            follow_symlinks: config.defaults.follow_symlinks,
        }],
        None => Vec::new(),
    };

    let filterchains = match args.prefix_lines {
        Some(prefix) => vec![FilterChainSpec {
            filters: vec![FilterStageSpec::new("prefix_lines", [("prefix", prefix)])],
        }],
        None => Vec::new(),
    };

    AppendTask {
        destfile: args.dest,
        file: args.file,
        text: args.text,
        filelists,
        filesets,
        filterchains,
    }
}

fn execute(task: &AppendTask, config: &AppConfig, json: bool) -> Result<()> {
    let registry = FilterRegistry::new();
    let scanner = FsScanner::new();
    let reporter = CliProgress::new();
    let mut ctx = DynamicContext::new();

    let outcome = AppendPipeline::new(&scanner, &registry)
        .with_progress(&reporter)
        .with_chunk_size(config.defaults.chunk_size)
        .run(task, &mut ctx);
    reporter.spinner.finish_and_clear();
    let report = outcome?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_summary(&report);
    }
    Ok(())
}

fn print_summary(report: &AppendReport) {
    println!();
    if report.is_clean() {
        println!("  Appended to {}", report.destination.display());
    } else {
        println!("  Appended to {} with warnings", report.destination.display());
    }
    println!("  Items:    {}", report.items_appended);
    println!("  Bytes:    {}", report.bytes_written);
    println!("  Skipped:  {}", report.failures.len());
    println!("  Time:     {:.1}s", report.elapsed.as_secs_f64());
    for failure in &report.failures {
        let kind = match failure.kind {
            FailureKind::Scan => "scan",
            FailureKind::Item => "item",
        };
        println!("    [{kind}] {}: {}", failure.item, failure.message);
    }
    println!();
}

fn cmd_filters() -> Result<()> {
    let registry = FilterRegistry::new();
    for stage in registry.iter() {
        println!("{:<16} {}", stage.name(), stage.description());
        for param in stage.params() {
            let marker = if param.required { "required" } else { "optional" };
            println!("    {:<14} {marker:<9} {}", param.name, param.description);
        }
    }
    Ok(())
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
    appended: AtomicUsize,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);
        spinner.set_style(style);
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self {
            spinner,
            appended: AtomicUsize::new(0),
        }
    }
}

impl ProgressReporter for CliProgress {
    fn group_started(&self, kind: SourceKind, count: usize, base_dir: Option<&Path>) {
        let dir = base_dir.map(|d| d.display().to_string()).unwrap_or_default();
        self.spinner
            .set_message(format!("Appending {count} files from {kind} {dir}"));
    }

    fn item_appended(&self, item: &ContentItem, bytes: u64) {
        let n = self.appended.fetch_add(1, Ordering::Relaxed) + 1;
        self.spinner
            .set_message(format!("[{n}] {} ({bytes} bytes)", item.label()));
    }

    fn item_failed(&self, failure: &ItemFailure) {
        self.spinner
            .println(format!("  skipped {}: {}", failure.item, failure.message));
    }

    fn done(&self, _report: &AppendReport) {
        self.spinner.finish_and_clear();
    }
}
