//! Parser for `git blame --line-porcelain` output.
//!
//! In line-porcelain mode every source line is preceded by its full commit
//! header, so each header block carries the fields needed to build one
//! author identity:
//!
//! ```text
//! 4e3c1b0... 1 1 1
//! author Alice
//! author-mail <alice@example.com>
//! author-time 1700000000
//! ...
//! filename src/lib.rs
//! <TAB>fn main() {}
//! ```
//!
//! The tab-prefixed line closes the block. Source text never reaches the
//! header matcher because it always starts with a tab.

use crate::options::{AuthorFilter, AuthorFormat};

const AUTHOR_PREFIX: &str = "author ";
const AUTHOR_MAIL_PREFIX: &str = "author-mail ";

/// Extract one author identity per attributed line, in file order.
///
/// Lines with an empty author name are skipped, as are lines whose identity
/// the filter rejects.
pub fn parse_line_porcelain(
    output: &str,
    format: AuthorFormat,
    filter: &AuthorFilter,
) -> Vec<String> {
    let mut authors = Vec::new();
    let mut name: Option<&str> = None;
    let mut mail: Option<&str> = None;

    for line in output.lines() {
        if line.starts_with('\t') {
            if let Some(identity) = identity(name, mail, format) {
                if filter.admits(&identity) {
                    authors.push(identity);
                }
            }
            name = None;
            mail = None;
        } else if let Some(rest) = line.strip_prefix(AUTHOR_PREFIX) {
            name = Some(rest);
        } else if let Some(rest) = line.strip_prefix(AUTHOR_MAIL_PREFIX) {
            mail = Some(rest);
        }
    }

    authors
}

fn identity(name: Option<&str>, mail: Option<&str>, format: AuthorFormat) -> Option<String> {
    let name = name.map(str::trim).filter(|n| !n.is_empty())?;
    match (format, mail.map(str::trim).filter(|m| !m.is_empty())) {
        (AuthorFormat::NameEmail, Some(mail)) => Some(format!("{name} {mail}")),
        _ => Some(name.to_string()),
    }
}
