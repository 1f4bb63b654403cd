mod commands;

use clap::{Parser, Subcommand, ValueEnum};
use color_eyre::eyre::Result;
use std::io::IsTerminal;
use std::path::PathBuf;
use tracing::{debug, error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

#[derive(Parser)]
#[command(
    name = "staleloc",
    version,
    about = "Find outdated and missing translations of documentation content"
)]
struct Cli {
    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Only log warnings and errors to the console
    #[arg(long, global = true)]
    quiet: bool,

    /// Do not write logs/staleloc.log
    #[arg(long, global = true)]
    no_log_file: bool,

    /// Load this config file instead of searching for staleloc.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ProviderKind {
    /// GitHub REST API
    Github,
    /// Local clone read through libgit2
    Git,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SinkKind {
    /// Open one issue per file
    Github,
    /// Write one JSON file per notice
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compare source files with their translations and publish notices
    Check {
        /// Repository checkout the content paths are relative to
        #[arg(short, long)]
        root: Option<PathBuf>,
        /// Source file to check; repeatable. Skips discovery when given
        #[arg(long = "file")]
        files: Vec<String>,
        /// Target language; repeatable. Overrides `languages` from config
        #[arg(long = "lang")]
        langs: Vec<String>,
        #[arg(long)]
        source_lang: Option<String>,
        #[arg(long)]
        owner: Option<String>,
        #[arg(long)]
        repo: Option<String>,
        /// Branch for history lookups; detected from CI env or the checkout otherwise
        #[arg(long)]
        branch: Option<String>,
        #[arg(long, value_enum, default_value_t = ProviderKind::Github)]
        provider: ProviderKind,
        /// Clone used by `--provider git`; defaults to the root
        #[arg(long)]
        git_dir: Option<PathBuf>,
        #[arg(long, value_enum, default_value_t = SinkKind::Github)]
        sink: SinkKind,
        /// Target of `--sink json`
        #[arg(long)]
        out_dir: Option<PathBuf>,
        /// Report only, do not publish notices
        #[arg(long, default_value_t = false)]
        dry_run: bool,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
        #[arg(long)]
        concurrency: Option<usize>,
        /// Exit with an error when anything needs attention or failed
        #[arg(long, default_value_t = false)]
        strict: bool,
    },

    /// Print the translation path of a source file
    Map {
        #[arg(long)]
        path: String,
        #[arg(long)]
        lang: String,
        #[arg(long)]
        source_lang: Option<String>,
    },

    /// Dump JSON Schemas of the machine-readable outputs
    Schema {
        #[arg(long, default_value = "")]
        out_dir: PathBuf,
    },
}

trait Runnable {
    fn run(self, ctx: &commands::Context) -> Result<()>;
}

impl Runnable for Commands {
    fn run(self, ctx: &commands::Context) -> Result<()> {
        let cmd_name = match &self {
            Commands::Check { .. } => "check",
            Commands::Map { .. } => "map",
            Commands::Schema { .. } => "schema",
        };
        info!(event = "command_started", command = cmd_name);

        let result = match self {
            Commands::Check {
                root,
                files,
                langs,
                source_lang,
                owner,
                repo,
                branch,
                provider,
                git_dir,
                sink,
                out_dir,
                dry_run,
                format,
                concurrency,
                strict,
            } => {
                debug!(
                    "Check args: root={:?} files={:?} langs={:?} provider={:?} sink={:?} dry_run={} format={:?}",
                    root, files, langs, provider, sink, dry_run, format
                );
                commands::check::run_check(
                    ctx,
                    commands::check::CheckArgs {
                        root,
                        files,
                        langs,
                        source_lang,
                        owner,
                        repo,
                        branch,
                        provider,
                        git_dir,
                        sink,
                        out_dir,
                        dry_run,
                        format,
                        concurrency,
                        strict,
                    },
                )
            }
            Commands::Map {
                path,
                lang,
                source_lang,
            } => commands::map::run_map(ctx, &path, &lang, source_lang),
            Commands::Schema { out_dir } => commands::schema::run_schema(ctx, out_dir),
        };

        match &result {
            Ok(_) => info!(event = "command_finished", command = cmd_name),
            Err(e) => error!(event = "command_failed", command = cmd_name, error = ?e),
        }

        result
    }
}

/// Console layer on stderr plus a daily rolling debug log. The returned guard
/// flushes the file writer on drop and must live until exit.
fn init_tracing(quiet: bool, log_file: bool) -> Option<WorkerGuard> {
    let default_level = if quiet { "warn" } else { "info" };
    let console_layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        );

    let (file_layer, guard) = if log_file {
        let file_appender = rolling::daily("logs", "staleloc.log");
        let (file_writer, guard) = tracing_appender::non_blocking(file_appender);
        let layer = fmt::layer()
            .with_ansi(false)
            .with_target(true)
            .with_writer(file_writer)
            .with_filter(EnvFilter::new("debug"));
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .init();
    guard
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    let _guard = init_tracing(cli.quiet, !cli.no_log_file);

    let use_color = !cli.no_color
        && std::io::stdout().is_terminal()
        && std::env::var_os("NO_COLOR").is_none();

    let ctx = commands::Context::load(use_color, cli.config.as_deref())?;
    cli.cmd.run(&ctx)
}
