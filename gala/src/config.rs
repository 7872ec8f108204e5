//! Settings resolution: command line, environment, config file, defaults.
//!
//! clap already folds `GALA_*` environment variables into the matches, so
//! the file only fills in what neither of them supplied.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context};
use clap::parser::ValueSource;
use clap::ArgMatches;
use galalib::{AnalysisOptions, AuthorFilter, AuthorFormat, SortBy};
use serde::Deserialize;

use crate::render::OutputFormat;

const CONFIG_FILE: &str = "gala.yaml";

/// Contents of `gala.yaml`. Every key is optional.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileConfig {
    pub output: Option<String>,
    pub sort: Option<String>,
    pub limit: Option<usize>,
    pub emoji: Option<bool>,
    pub min_lines: Option<usize>,
    pub exclude_authors: Vec<String>,
    pub include_authors: Vec<String>,
    pub since: Option<String>,
    pub until: Option<String>,
    pub exclude_patterns: Vec<String>,
    pub concurrency: Option<usize>,
    pub verbose: Option<bool>,
    pub quiet: Option<bool>,
    pub no_progress: Option<bool>,
    pub author_format: Option<String>,
}

impl FileConfig {
    pub fn parse(text: &str) -> anyhow::Result<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// Load the file named by `--config`, or the first `gala.yaml` found in
    /// the current directory, `$HOME/.config/gala/` or `/etc/gala/`.
    ///
    /// An explicitly named file must exist; the search is allowed to come up
    /// empty.
    pub fn load(explicit: Option<&Path>) -> anyhow::Result<Option<(PathBuf, Self)>> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => match search_paths().into_iter().find(|p| p.is_file()) {
                Some(path) => path,
                None => return Ok(None),
            },
        };

        let text = fs::read_to_string(&path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let config =
            Self::parse(&text).with_context(|| format!("parsing config file {}", path.display()))?;
        Ok(Some((path, config)))
    }
}

fn search_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from(CONFIG_FILE)];
    if let Some(home) = std::env::var_os("HOME") {
        paths.push(PathBuf::from(home).join(".config/gala").join(CONFIG_FILE));
    }
    paths.push(PathBuf::from("/etc/gala").join(CONFIG_FILE));
    paths
}

/// Everything the CLI needs for one run.
#[derive(Debug, Clone)]
pub struct Settings {
    pub directory: PathBuf,
    pub output: OutputFormat,
    pub emoji: bool,
    pub quiet: bool,
    pub progress: bool,
    pub exclude_patterns: Vec<String>,
    pub options: AnalysisOptions,
}

impl Settings {
    pub fn resolve(matches: &ArgMatches, file: Option<&FileConfig>) -> anyhow::Result<Self> {
        let fallback = FileConfig::default();
        let file = file.unwrap_or(&fallback);

        let output = pick(matches, "output", file.output.clone())
            .map(|s| s.parse::<OutputFormat>())
            .transpose()
            .map_err(|e| anyhow!(e))?
            .unwrap_or_default();
        let sort_by = pick(matches, "sort", file.sort.clone())
            .map(|s| s.parse::<SortBy>())
            .transpose()
            .map_err(|e| anyhow!(e))?
            .unwrap_or_default();
        let author_format = pick(matches, "author-format", file.author_format.clone())
            .map(|s| s.parse::<AuthorFormat>())
            .transpose()
            .map_err(|e| anyhow!(e))?
            .unwrap_or_default();

        let mut author_filter = AuthorFilter::new();
        for author in list(matches, "include-author", &file.include_authors) {
            author_filter = author_filter.include(author);
        }
        for author in list(matches, "exclude-author", &file.exclude_authors) {
            author_filter = author_filter.exclude(author);
        }

        let quiet = flag(matches, "quiet", file.quiet);
        let mut options = AnalysisOptions::new()
            .concurrency(pick(matches, "concurrency", file.concurrency).unwrap_or(0))
            .min_lines(pick(matches, "min-lines", file.min_lines).unwrap_or(1))
            .max_results(pick(matches, "limit", file.limit).unwrap_or(0))
            .sort_by(sort_by)
            .author_format(author_format)
            .author_filter(author_filter)
            .verbose(flag(matches, "verbose", file.verbose));
        if let Some(username) = matches.get_one::<String>("username") {
            options = options.focus_author(username.clone());
        }
        if let Some(since) = pick(matches, "since", file.since.clone()) {
            options = options.since(since);
        }
        if let Some(until) = pick(matches, "until", file.until.clone()) {
            options = options.until(until);
        }

        Ok(Settings {
            directory: matches
                .get_one::<PathBuf>("directory")
                .cloned()
                .unwrap_or_else(|| PathBuf::from(".")),
            output,
            emoji: flag(matches, "emoji", file.emoji),
            quiet,
            progress: !quiet && !flag(matches, "no-progress", file.no_progress),
            exclude_patterns: list(matches, "exclude-pattern", &file.exclude_patterns),
            options,
        })
    }
}

/// Command line or environment value, else the file's.
fn pick<T: Clone + Send + Sync + 'static>(
    matches: &ArgMatches,
    id: &str,
    file: Option<T>,
) -> Option<T> {
    matches.get_one::<T>(id).cloned().or(file)
}

/// Flags always have a default, so only an explicit source beats the file.
fn flag(matches: &ArgMatches, id: &str, file: Option<bool>) -> bool {
    match matches.value_source(id) {
        Some(ValueSource::CommandLine) | Some(ValueSource::EnvVariable) => matches.get_flag(id),
        _ => file.unwrap_or(false),
    }
}

fn list(matches: &ArgMatches, id: &str, file: &[String]) -> Vec<String> {
    match matches.get_many::<String>(id) {
        Some(values) => values.cloned().collect(),
        None => file.to_vec(),
    }
}
