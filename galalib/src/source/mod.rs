//! Source discovery: find the files to blame.
//!
//! This module handles the first stage of the pipeline. It provides:
//!
//! - **Repository validation**: confirm the root is a git work tree
//! - **File filtering**: built-in, user and `.gitignore` exclusion patterns
//!
//! ## Example
//!
//! ```rust,ignore
//! use galalib::source::{discover_files, validate_repository, FilterConfig};
//!
//! let root = validate_repository(".")?;
//! let filter = FilterConfig::with_defaults()
//!     .exclude("*.generated.go")?
//!     .load_gitignore(&root)?;
//! let files = discover_files(&root, &filter)?;
//! ```

pub mod filter;
pub mod repository;

pub use filter::{discover_files, FilterConfig, DEFAULT_EXCLUDE_PATTERNS};
pub use repository::validate_repository;
