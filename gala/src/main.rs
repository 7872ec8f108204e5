//! # gala
//!
//! Count the lines each contributor last touched in a git repository.
//!
//! gala runs `git blame` over every tracked source file in parallel and
//! totals the lines per author. With a username it instead lists the files
//! that author owns lines in.
//!
//! ## Usage
//!
//! ```bash
//! # Everyone in the current repository
//! gala
//!
//! # One author's files, as JSON
//! gala path/to/repo "Jane Doe" --output json
//!
//! # Top ten by file count, ignoring bots, since last year
//! gala . --sort files --limit 10 --exclude-author dependabot --since 2024-01-01
//! ```
//!
//! Every option can also come from a `GALA_*` environment variable or from a
//! `gala.yaml` file; see `config.rs` for the lookup order.

mod config;
mod render;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use clap_complete::Shell;
use galalib::{analyze, FilterConfig, GalaError, Progress};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use crate::config::{FileConfig, Settings};

/// Conventional exit status for a run stopped by SIGINT.
const EXIT_INTERRUPTED: u8 = 130;

/// Build the clap Command structure
pub(crate) fn build_command() -> Command {
    Command::new("gala")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Count the lines each contributor authored in a git repository")
        .arg(
            Arg::new("directory")
                .help("Repository to analyze [default: .]")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("username")
                .help("Show per-file contributions for this author only"),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .env("GALA_OUTPUT")
                .value_parser(["table", "json", "csv", "plain"])
                .help("Output format [default: table]"),
        )
        .arg(
            Arg::new("sort")
                .long("sort")
                .env("GALA_SORT")
                .value_parser(["lines", "name", "files"])
                .help("Sort authors by lines, name or files [default: lines]"),
        )
        .arg(
            Arg::new("limit")
                .long("limit")
                .env("GALA_LIMIT")
                .value_parser(value_parser!(usize))
                .help("Show at most this many rows (0 = all)"),
        )
        .arg(
            Arg::new("min-lines")
                .long("min-lines")
                .env("GALA_MIN_LINES")
                .value_parser(value_parser!(usize))
                .help("Hide authors with fewer lines [default: 1]"),
        )
        .arg(
            Arg::new("emoji")
                .long("emoji")
                .env("GALA_EMOJI")
                .action(ArgAction::SetTrue)
                .help("Show medals for the top three authors"),
        )
        .arg(
            Arg::new("exclude-author")
                .long("exclude-author")
                .env("GALA_EXCLUDE_AUTHORS")
                .action(ArgAction::Append)
                .value_delimiter(',')
                .help("Ignore lines by these authors (case-insensitive)"),
        )
        .arg(
            Arg::new("include-author")
                .long("include-author")
                .env("GALA_INCLUDE_AUTHORS")
                .action(ArgAction::Append)
                .value_delimiter(',')
                .help("Only count lines by these authors (case-insensitive)"),
        )
        .arg(
            Arg::new("since")
                .long("since")
                .env("GALA_SINCE")
                .help("Only attribute lines changed after this date"),
        )
        .arg(
            Arg::new("until")
                .long("until")
                .env("GALA_UNTIL")
                .help("Only attribute lines changed before this date"),
        )
        .arg(
            Arg::new("exclude-pattern")
                .short('e')
                .long("exclude-pattern")
                .env("GALA_EXCLUDE_PATTERNS")
                .action(ArgAction::Append)
                .value_delimiter(',')
                .help("Skip files matching this glob, on top of the built-in list"),
        )
        .arg(
            Arg::new("concurrency")
                .short('c')
                .long("concurrency")
                .env("GALA_CONCURRENCY")
                .value_parser(value_parser!(usize))
                .help("Concurrent blame processes [default: twice the CPU count]"),
        )
        .arg(
            Arg::new("author-format")
                .long("author-format")
                .env("GALA_AUTHOR_FORMAT")
                .value_parser(["name", "name-email"])
                .help("Identify authors by name, or by name and email"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .env("GALA_VERBOSE")
                .action(ArgAction::SetTrue)
                .help("Report files that could not be blamed"),
        )
        .arg(
            Arg::new("quiet")
                .short('q')
                .long("quiet")
                .env("GALA_QUIET")
                .action(ArgAction::SetTrue)
                .conflicts_with("verbose")
                .help("Only print the results"),
        )
        .arg(
            Arg::new("no-progress")
                .long("no-progress")
                .env("GALA_NO_PROGRESS")
                .action(ArgAction::SetTrue)
                .help("Do not draw a progress bar"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .env("GALA_CONFIG")
                .value_parser(value_parser!(PathBuf))
                .help("Read defaults from this YAML file instead of gala.yaml"),
        )
        .args_conflicts_with_subcommands(true)
        .subcommand(
            Command::new("completion")
                .about("Print a shell completion script")
                .arg(
                    Arg::new("shell")
                        .required(true)
                        .value_parser(value_parser!(Shell))
                        .help("Target shell: bash, zsh, fish, powershell or elvish"),
                ),
        )
}

/// Write the completion script for `shell` to stdout.
fn print_completions(shell: Shell) {
    let mut command = build_command();
    let name = command.get_name().to_string();
    clap_complete::generate(shell, &mut command, name, &mut std::io::stdout());
}

/// Diagnostics go to stderr so stdout stays clean for `--output json`.
fn init_logging(settings: &Settings) {
    let level = if settings.quiet {
        "error"
    } else if settings.options.verbose {
        "debug"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_env("GALA_LOG").unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

/// Progress bar on stderr, hidden when stderr is not a terminal.
struct BarProgress {
    bar: ProgressBar,
}

impl BarProgress {
    fn new() -> Self {
        let bar = ProgressBar::with_draw_target(None, ProgressDrawTarget::stderr());
        if let Ok(style) =
            ProgressStyle::with_template("{spinner} {msg} [{bar:40}] {pos}/{len} ({eta})")
        {
            bar.set_style(style.progress_chars("=> "));
        }
        bar.set_message("Analyzing files");
        Self { bar }
    }
}

impl Progress for BarProgress {
    fn start(&self, total: usize) {
        self.bar.set_length(total as u64);
    }

    /// Workers report concurrently and out of order, so the bar keeps its
    /// own tally.
    fn advance(&self, _completed: usize) {
        self.bar.inc(1);
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

/// Cancel `token` on Ctrl-C or SIGTERM.
fn spawn_signal_handler(token: CancellationToken) {
    tokio::spawn(async move {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};
            match signal(SignalKind::terminate()) {
                Ok(mut term) => {
                    tokio::select! {
                        _ = tokio::signal::ctrl_c() => {}
                        _ = term.recv() => {}
                    }
                }
                Err(e) => {
                    debug!(error = %e, "cannot listen for SIGTERM");
                    let _ = tokio::signal::ctrl_c().await;
                }
            }
        }
        #[cfg(not(unix))]
        {
            let _ = tokio::signal::ctrl_c().await;
        }
        warn!("received interrupt signal, shutting down gracefully");
        token.cancel();
    });
}

async fn run(matches: &ArgMatches) -> anyhow::Result<ExitCode> {
    let file = FileConfig::load(matches.get_one::<PathBuf>("config").map(PathBuf::as_path))?;
    let settings = Settings::resolve(matches, file.as_ref().map(|(_, config)| config))?;
    init_logging(&settings);
    if let Some((path, _)) = &file {
        debug!(path = %path.display(), "loaded config file");
    }

    let filter = FilterConfig::with_defaults().exclude_many(&settings.exclude_patterns)?;
    let cancel = CancellationToken::new();
    spawn_signal_handler(cancel.clone());

    let progress: Option<Arc<dyn Progress>> = if settings.progress {
        Some(Arc::new(BarProgress::new()))
    } else {
        None
    };

    let result = match analyze(&settings.directory, filter, &settings.options, cancel, progress)
        .await
    {
        Ok(result) => result,
        Err(GalaError::Cancelled) => {
            warn!("interrupted before any file was analyzed");
            return Ok(ExitCode::from(EXIT_INTERRUPTED));
        }
        Err(e) => return Err(e.into()),
    };

    if result.focus_author.is_some() && result.user_contributions.is_empty() {
        warn!(
            author = result.focus_author.as_deref().unwrap_or_default(),
            "no contributions found for user"
        );
    } else if result.focus_author.is_none() && result.authors.is_empty() {
        warn!("no authors found matching criteria");
    }

    let rendered = render::render(&result, settings.output, settings.emoji, settings.quiet)?;
    print!("{rendered}");

    if !result.complete {
        warn!(
            processed = result.files_processed,
            total = result.total_files,
            "results are partial"
        );
        return Ok(ExitCode::from(EXIT_INTERRUPTED));
    }
    Ok(ExitCode::SUCCESS)
}

#[tokio::main]
async fn main() -> ExitCode {
    let matches = build_command().get_matches();

    if let Some(("completion", sub)) = matches.subcommand() {
        if let Some(shell) = sub.get_one::<Shell>("shell") {
            print_completions(*shell);
        }
        return ExitCode::SUCCESS;
    }

    match run(&matches).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_is_well_formed() {
        build_command().debug_assert();
    }

    #[test]
    fn test_completion_subcommand() {
        let matches = build_command()
            .try_get_matches_from(["gala", "completion", "zsh"])
            .unwrap();

        let (name, sub) = matches.subcommand().unwrap();
        assert_eq!(name, "completion");
        assert_eq!(sub.get_one::<Shell>("shell"), Some(&Shell::Zsh));
    }

    #[test]
    fn test_completion_rejects_unknown_shell() {
        let result = build_command().try_get_matches_from(["gala", "completion", "tcsh"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        let result = build_command().try_get_matches_from(["gala", "-q", "-v"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_unknown_output_format() {
        let result = build_command().try_get_matches_from(["gala", "--output", "yaml"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_progress_counts_every_report() {
        let progress = Arc::new(BarProgress::new());
        progress.start(400);

        let handles: Vec<_> = (0..4)
            .map(|t| {
                let progress = Arc::clone(&progress);
                std::thread::spawn(move || {
                    for i in 0..100 {
                        progress.advance(t * 100 + i);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(progress.bar.position(), 400);
        progress.finish();
    }
}
