//! Rendering of analysis results for the terminal and for other tools.

use std::fmt::Write as _;
use std::str::FromStr;

use console::{measure_text_width, pad_str, Alignment, Style};
use galalib::{format_number, AnalysisResult, ReportTable};

/// Output format selected with `--output`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Csv,
    Plain,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            "csv" => Ok(OutputFormat::Csv),
            "plain" | "text" => Ok(OutputFormat::Plain),
            _ => Err(format!("Unknown output format: {}", s)),
        }
    }
}

/// Render `result` in the requested format.
///
/// In table mode `quiet` drops the heading and the summary block.
pub fn render(
    result: &AnalysisResult,
    format: OutputFormat,
    emoji: bool,
    quiet: bool,
) -> Result<String, serde_json::Error> {
    match format {
        OutputFormat::Table => Ok(render_table(&ReportTable::from_result(result, emoji), quiet)),
        OutputFormat::Json => render_json(result),
        OutputFormat::Csv => Ok(render_csv(result)),
        OutputFormat::Plain => Ok(render_plain(result)),
    }
}

/// Pretty-printed JSON with a trailing newline.
pub fn render_json(result: &AnalysisResult) -> Result<String, serde_json::Error> {
    let mut out = serde_json::to_string_pretty(result)?;
    out.push('\n');
    Ok(out)
}

/// CSV with a header row. Text fields are always quoted.
pub fn render_csv(result: &AnalysisResult) -> String {
    let mut out = String::new();

    if result.focus_author.is_some() {
        out.push_str("File,Lines\n");
        for c in &result.user_contributions {
            let _ = writeln!(out, "{},{}", quote(&c.path), c.line_count);
        }
    } else {
        out.push_str("Author,Lines,Files,Percentage\n");
        for a in &result.authors {
            let _ = writeln!(
                out,
                "{},{},{},{:.2}",
                quote(&a.name),
                a.line_count,
                a.file_count,
                a.percentage
            );
        }
    }

    out
}

fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

/// Short totals block followed by one tab-separated line per row.
pub fn render_plain(result: &AnalysisResult) -> String {
    let mut out = String::new();

    match &result.focus_author {
        Some(author) => {
            let _ = writeln!(out, "User: {author}");
            let _ = writeln!(out, "Total Lines: {}", format_number(result.total_user_lines()));
            let _ = writeln!(out, "Files: {}\n", result.user_contributions.len());
            for c in &result.user_contributions {
                let _ = writeln!(out, "{}\t{}", format_number(c.line_count), c.path);
            }
        }
        None => {
            let _ = writeln!(out, "Total Lines: {}", format_number(result.total_lines));
            let _ = writeln!(out, "Authors: {}", result.authors.len());
            let _ = writeln!(out, "Files: {}\n", result.files_processed);
            for a in &result.authors {
                let _ = writeln!(
                    out,
                    "{}\t{}\t{}\t{:.2}%",
                    format_number(a.line_count),
                    format_number(a.file_count),
                    a.name,
                    a.percentage
                );
            }
        }
    }

    out
}

/// Boxed table, optionally preceded by a heading and followed by a summary.
pub fn render_table(table: &ReportTable, quiet: bool) -> String {
    let heading = Style::new().bold().cyan();
    let header = Style::new().bold();
    let mut out = String::new();

    if !quiet {
        let _ = writeln!(out, "\n{}", heading.apply_to(&table.title));
    }

    if !table.is_empty() {
        let widths = column_widths(table);
        let align = |col: usize| {
            if table.numeric_columns.contains(&col) {
                Alignment::Right
            } else {
                Alignment::Left
            }
        };

        let rule = separator(&widths);
        out.push_str(&rule);
        let cells: Vec<String> = table
            .headers
            .iter()
            .zip(&widths)
            .map(|(h, w)| header.apply_to(pad_str(h, *w, Alignment::Left, None)).to_string())
            .collect();
        push_row(&mut out, &cells);
        out.push_str(&rule);

        for row in &table.rows {
            let cells: Vec<String> = row
                .values
                .iter()
                .zip(&widths)
                .enumerate()
                .map(|(col, (v, w))| pad_str(v, *w, align(col), None).to_string())
                .collect();
            push_row(&mut out, &cells);
        }
        out.push_str(&rule);
    }

    if !quiet && !table.summary.is_empty() {
        let _ = writeln!(out, "\n{}", heading.apply_to("Summary"));
        let name_width = table.summary.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
        for (metric, value) in &table.summary {
            let _ = writeln!(out, "  {:<name_width$}  {}", metric, value);
        }
    }

    out
}

/// Terminal width of each column, header included.
fn column_widths(table: &ReportTable) -> Vec<usize> {
    let mut widths: Vec<usize> = table.headers.iter().map(|h| measure_text_width(h)).collect();
    for row in &table.rows {
        for (width, value) in widths.iter_mut().zip(&row.values) {
            *width = (*width).max(measure_text_width(value));
        }
    }
    widths
}

fn separator(widths: &[usize]) -> String {
    let mut line = String::from("+");
    for w in widths {
        line.push_str(&"-".repeat(w + 2));
        line.push('+');
    }
    line.push('\n');
    line
}

fn push_row(out: &mut String, cells: &[String]) {
    out.push('|');
    for cell in cells {
        let _ = write!(out, " {cell} |");
    }
    out.push('\n');
}
