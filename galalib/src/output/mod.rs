//! Output formatting: present analysis results as tables.
//!
//! - **ReportTable**: headers, rows and a summary block, all as strings
//! - **format_number**: comma-grouped integers for display
//!
//! Nothing here computes; the finalizer has already filtered and sorted.
//!
//! ## Example
//!
//! ```rust,ignore
//! use galalib::output::ReportTable;
//!
//! let table = ReportTable::from_result(&result, true);
//! // table.headers: ["Rank", "Lines", "Files", "Percentage", "Author"]
//! // table.rows[0].values: ["🥇", "1,500", "12", "75.0%", "alice"]
//! ```

pub mod table;

pub use table::{format_number, ReportTable, TableRow};
