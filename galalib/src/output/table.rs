//! Table-ready data structures for blame reports.
//!
//! `ReportTable` is a pure presentation layer: it turns an
//! [`AnalysisResult`] into strings. Filtering and sorting have already
//! happened in the finalizer.

use serde::{Deserialize, Serialize};

use crate::stats::AnalysisResult;

const MEDALS: [&str; 3] = ["🥇", "🥈", "🥉"];

/// A single data row, one value per header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRow {
    pub values: Vec<String>,
}

/// Display-ready report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportTable {
    /// Heading printed above the table
    pub title: String,
    pub headers: Vec<String>,
    pub rows: Vec<TableRow>,
    /// (metric, value) pairs for the summary block
    pub summary: Vec<(String, String)>,
    /// Index of the right-aligned numeric columns
    #[serde(skip)]
    pub numeric_columns: Vec<usize>,
}

impl ReportTable {
    /// Build the table for `result`: per-file rows when a focus author is
    /// set, ranked author rows otherwise.
    pub fn from_result(result: &AnalysisResult, emoji: bool) -> Self {
        match &result.focus_author {
            Some(author) => Self::contributions(result, author),
            None => Self::authors(result, emoji),
        }
    }

    fn authors(result: &AnalysisResult, emoji: bool) -> Self {
        let rows = result
            .authors
            .iter()
            .enumerate()
            .map(|(i, author)| TableRow {
                values: vec![
                    rank_label(i, emoji),
                    format_number(author.line_count),
                    format_number(author.file_count),
                    format!("{:.1}%", author.percentage),
                    author.name.clone(),
                ],
            })
            .collect();

        ReportTable {
            title: "Author Contributions".to_string(),
            headers: ["Rank", "Lines", "Files", "Percentage", "Author"]
                .map(String::from)
                .to_vec(),
            rows,
            summary: vec![
                metric("Total lines analyzed", format_number(result.total_lines)),
                metric("Unique authors", format_number(result.authors.len())),
                metric("Files processed", format_number(result.files_processed)),
                metric("Files failed", format_number(result.files_failed)),
                metric("Processing time", format_millis(result.processing_time_ms)),
            ],
            numeric_columns: vec![1, 2, 3],
        }
    }

    fn contributions(result: &AnalysisResult, author: &str) -> Self {
        let rows = result
            .user_contributions
            .iter()
            .map(|c| TableRow {
                values: vec![format_number(c.line_count), c.path.clone()],
            })
            .collect();

        ReportTable {
            title: format!("{author}'s Contributions"),
            headers: vec!["Lines".to_string(), "File".to_string()],
            rows,
            summary: vec![
                metric("Total lines", format_number(result.total_user_lines())),
                metric(
                    "Files contributed",
                    format_number(result.user_contributions.len()),
                ),
                metric("Processing time", format_millis(result.processing_time_ms)),
            ],
            numeric_columns: vec![0],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

fn metric(name: &str, value: String) -> (String, String) {
    (name.to_string(), value)
}

fn rank_label(index: usize, emoji: bool) -> String {
    match MEDALS.get(index) {
        Some(medal) if emoji => medal.to_string(),
        _ => (index + 1).to_string(),
    }
}

/// Format an integer with comma thousands separators: `1234567` becomes
/// `1,234,567`.
pub fn format_number(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

fn format_millis(ms: u64) -> String {
    if ms < 1000 {
        format!("{ms}ms")
    } else {
        format!("{:.3}s", ms as f64 / 1000.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::{AuthorStats, FileContribution};
    use chrono::Utc;
    use std::path::PathBuf;

    fn author(name: &str, line_count: usize, percentage: f64) -> AuthorStats {
        AuthorStats {
            name: name.to_string(),
            line_count,
            file_count: 2,
            percentage,
        }
    }

    fn result(authors: Vec<AuthorStats>) -> AnalysisResult {
        AnalysisResult {
            total_lines: authors.iter().map(|a| a.line_count).sum(),
            authors,
            focus_author: None,
            user_contributions: Vec::new(),
            files_processed: 2,
            files_failed: 1,
            total_files: 3,
            processing_time_ms: 1250,
            repository: PathBuf::from("/repo"),
            generated_at: Utc::now(),
            complete: true,
        }
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1000), "1,000");
        assert_eq!(format_number(123456), "123,456");
        assert_eq!(format_number(1234567), "1,234,567");
    }

    #[test]
    fn test_format_millis() {
        assert_eq!(format_millis(42), "42ms");
        assert_eq!(format_millis(1250), "1.250s");
    }

    #[test]
    fn test_author_table() {
        let r = result(vec![author("alice", 1500, 75.0), author("bob", 500, 25.0)]);
        let table = ReportTable::from_result(&r, false);

        assert_eq!(table.title, "Author Contributions");
        assert_eq!(table.headers[0], "Rank");
        assert_eq!(table.rows.len(), 2);
        assert_eq!(
            table.rows[0].values,
            vec!["1", "1,500", "2", "75.0%", "alice"]
        );
        assert_eq!(table.rows[1].values[0], "2");
        assert_eq!(table.summary[0], metric("Total lines analyzed", "2,000".to_string()));
        assert_eq!(table.summary[1].1, "2");
    }

    #[test]
    fn test_medals_for_top_three_only() {
        let r = result(vec![
            author("a", 4, 40.0),
            author("b", 3, 30.0),
            author("c", 2, 20.0),
            author("d", 1, 10.0),
        ]);
        let table = ReportTable::from_result(&r, true);

        let ranks: Vec<&str> = table.rows.iter().map(|r| r.values[0].as_str()).collect();
        assert_eq!(ranks, vec!["🥇", "🥈", "🥉", "4"]);
    }

    #[test]
    fn test_contribution_table() {
        let mut r = result(vec![author("bob", 5, 100.0)]);
        r.focus_author = Some("bob".to_string());
        r.user_contributions = vec![
            FileContribution {
                path: "src/big.rs".to_string(),
                line_count: 4000,
            },
            FileContribution {
                path: "README.md".to_string(),
                line_count: 3,
            },
        ];

        let table = ReportTable::from_result(&r, true);

        assert_eq!(table.title, "bob's Contributions");
        assert_eq!(table.headers, vec!["Lines", "File"]);
        assert_eq!(table.rows[0].values, vec!["4,000", "src/big.rs"]);
        assert_eq!(table.summary[0].1, "4,003");
        assert_eq!(table.summary[1].1, "2");
    }

    #[test]
    fn test_empty_table() {
        let table = ReportTable::from_result(&result(Vec::new()), false);
        assert!(table.is_empty());
        assert_eq!(table.headers.len(), 5);
    }
}
