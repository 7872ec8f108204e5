//! Turn the aggregator's mutable totals into a sorted, filtered snapshot.

use std::path::PathBuf;
use std::time::Duration;

use chrono::Utc;

use super::aggregator::AggregateState;
use crate::options::{AnalysisOptions, SortBy};
use crate::stats::{AnalysisResult, AuthorStats, FileContribution};

/// Facts about the run that the aggregate state does not carry.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub repository: PathBuf,
    pub total_files: usize,
    pub elapsed: Duration,
    pub complete: bool,
}

/// Build the final [`AnalysisResult`].
///
/// Authors under `min_lines` are dropped, the rest are sorted by the
/// configured key and cut to `max_results` (0 keeps all). The focus
/// author's files get the same threshold and limit, ordered by line count
/// descending then path ascending.
pub fn finalize(
    state: AggregateState,
    options: &AnalysisOptions,
    summary: RunSummary,
) -> AnalysisResult {
    let AggregateState {
        total_lines,
        author_lines,
        author_files,
        files_processed,
        files_failed,
        focus_files,
        ..
    } = state;

    let mut authors: Vec<AuthorStats> = author_lines
        .into_iter()
        .filter(|(_, count)| *count >= options.min_lines)
        .map(|(name, line_count)| {
            let file_count = author_files.get(&name).map_or(0, |files| files.len());
            AuthorStats {
                percentage: percentage(line_count, total_lines),
                name,
                line_count,
                file_count,
            }
        })
        .collect();

    sort_authors(&mut authors, options.sort_by);
    truncate(&mut authors, options.max_results);

    let mut user_contributions: Vec<FileContribution> = focus_files
        .into_iter()
        .filter(|(_, count)| *count >= options.min_lines)
        .map(|(path, line_count)| FileContribution {
            path: path.to_string_lossy().to_string(),
            line_count,
        })
        .collect();

    user_contributions.sort_by(|a, b| {
        b.line_count
            .cmp(&a.line_count)
            .then_with(|| a.path.cmp(&b.path))
    });
    truncate(&mut user_contributions, options.max_results);

    AnalysisResult {
        authors,
        focus_author: options.focus_author.clone(),
        user_contributions,
        total_lines,
        files_processed,
        files_failed,
        total_files: summary.total_files,
        processing_time_ms: summary.elapsed.as_millis() as u64,
        repository: summary.repository,
        generated_at: Utc::now(),
        complete: summary.complete,
    }
}

fn percentage(lines: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        lines as f64 / total as f64 * 100.0
    }
}

/// Sort authors by `key`. Numeric keys tie-break on name so the order is
/// total: identities are unique, so no two entries compare equal.
pub fn sort_authors(authors: &mut [AuthorStats], key: SortBy) {
    match key {
        SortBy::Lines => authors.sort_by(|a, b| {
            b.line_count
                .cmp(&a.line_count)
                .then_with(|| a.name.cmp(&b.name))
        }),
        SortBy::Name => authors.sort_by(|a, b| a.name.cmp(&b.name)),
        SortBy::Files => authors.sort_by(|a, b| {
            b.file_count
                .cmp(&a.file_count)
                .then_with(|| a.name.cmp(&b.name))
        }),
    }
}

fn truncate<T>(items: &mut Vec<T>, limit: usize) {
    if limit > 0 && items.len() > limit {
        items.truncate(limit);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blame::FileBlameResult;
    use crate::error::BlameError;
    use crate::pipeline::aggregator::Aggregator;

    fn summary() -> RunSummary {
        RunSummary {
            repository: PathBuf::from("/repo"),
            total_files: 3,
            elapsed: Duration::from_millis(42),
            complete: true,
        }
    }

    fn scenario_state(focus: Option<&str>) -> AggregateState {
        let mut aggregator = Aggregator::new(focus.map(String::from), false);
        let mut b = vec!["alice".to_string(); 5];
        b.extend(vec!["bob".to_string(); 5]);
        aggregator.fold(FileBlameResult::success("A", vec!["alice".to_string(); 10]));
        aggregator.fold(FileBlameResult::success("B", b));
        aggregator.fold(FileBlameResult::failure(
            "C",
            BlameError::Failed {
                exit_code: Some(128),
                stderr: String::new(),
            },
        ));
        aggregator.finish()
    }

    fn author(name: &str, line_count: usize, file_count: usize) -> AuthorStats {
        AuthorStats {
            name: name.to_string(),
            line_count,
            file_count,
            percentage: 0.0,
        }
    }

    #[test]
    fn test_scenario_totals() {
        let result = finalize(scenario_state(None), &AnalysisOptions::new(), summary());

        assert_eq!(result.total_lines, 20);
        assert_eq!(result.files_processed, 2);
        assert_eq!(result.files_failed, 1);
        assert_eq!(result.total_files, 3);
        assert_eq!(result.processing_time_ms, 42);
        assert!(result.complete);

        assert_eq!(result.authors.len(), 2);
        assert_eq!(result.authors[0].name, "alice");
        assert_eq!(result.authors[0].line_count, 15);
        assert_eq!(result.authors[0].file_count, 2);
        assert!((result.authors[0].percentage - 75.0).abs() < 1e-9);
        assert_eq!(result.authors[1].name, "bob");
        assert_eq!(result.authors[1].line_count, 5);
        assert_eq!(result.authors[1].file_count, 1);
        assert!((result.authors[1].percentage - 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_sum_of_lines_matches_total_without_filters() {
        let options = AnalysisOptions::new().min_lines(0);
        let result = finalize(scenario_state(None), &options, summary());

        let sum: usize = result.authors.iter().map(|a| a.line_count).sum();
        assert_eq!(sum, result.total_lines);
    }

    #[test]
    fn test_focus_author_contributions() {
        let options = AnalysisOptions::new().focus_author("bob");
        let result = finalize(scenario_state(Some("bob")), &options, summary());

        assert_eq!(result.focus_author.as_deref(), Some("bob"));
        assert_eq!(
            result.user_contributions,
            vec![FileContribution {
                path: "B".to_string(),
                line_count: 5
            }]
        );
        assert_eq!(result.total_user_lines(), 5);
    }

    #[test]
    fn test_min_lines_threshold() {
        let options = AnalysisOptions::new().min_lines(10);
        let result = finalize(scenario_state(None), &options, summary());

        assert_eq!(result.authors.len(), 1);
        assert_eq!(result.authors[0].name, "alice");
        // Percentages still use the unfiltered total.
        assert!((result.authors[0].percentage - 75.0).abs() < 1e-9);
    }

    #[test]
    fn test_max_results() {
        let options = AnalysisOptions::new().max_results(1);
        let result = finalize(scenario_state(None), &options, summary());

        assert_eq!(result.authors.len(), 1);
        assert_eq!(result.authors[0].name, "alice");
    }

    #[test]
    fn test_zero_total_lines_gives_zero_percentage() {
        let mut state = AggregateState::default();
        state.author_lines.insert("ghost".to_string(), 0);
        let options = AnalysisOptions::new().min_lines(0);

        let result = finalize(state, &options, summary());

        assert_eq!(result.authors.len(), 1);
        assert_eq!(result.authors[0].percentage, 0.0);
    }

    #[test]
    fn test_sort_by_lines_breaks_ties_by_name() {
        let mut authors = vec![author("carol", 5, 1), author("bob", 5, 3), author("dave", 9, 1)];

        sort_authors(&mut authors, SortBy::Lines);

        let names: Vec<&str> = authors.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["dave", "bob", "carol"]);
    }

    #[test]
    fn test_sort_by_files_breaks_ties_by_name() {
        let mut authors = vec![author("zed", 1, 2), author("amy", 50, 2), author("kim", 2, 7)];

        sort_authors(&mut authors, SortBy::Files);

        let names: Vec<&str> = authors.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["kim", "amy", "zed"]);
    }

    #[test]
    fn test_sort_by_name() {
        let mut authors = vec![author("bob", 1, 1), author("Alice", 1, 1), author("alice", 9, 1)];

        sort_authors(&mut authors, SortBy::Name);

        let names: Vec<&str> = authors.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["Alice", "alice", "bob"]);
    }

    #[test]
    fn test_contributions_tie_break_on_path() {
        let mut state = AggregateState::default();
        state.focus_files.insert(PathBuf::from("src/z.rs"), 4);
        state.focus_files.insert(PathBuf::from("src/a.rs"), 4);
        state.focus_files.insert(PathBuf::from("src/m.rs"), 9);
        let options = AnalysisOptions::new().focus_author("alice");

        let result = finalize(state, &options, summary());

        let paths: Vec<&str> = result
            .user_contributions
            .iter()
            .map(|c| c.path.as_str())
            .collect();
        assert_eq!(paths, vec!["src/m.rs", "src/a.rs", "src/z.rs"]);
    }

    #[test]
    fn test_finalize_is_deterministic() {
        let options = AnalysisOptions::new().focus_author("alice");
        let first = finalize(scenario_state(Some("alice")), &options, summary());
        let second = finalize(scenario_state(Some("alice")), &options, summary());

        assert_eq!(first.authors, second.authors);
        assert_eq!(first.user_contributions, second.user_contributions);
    }
}
