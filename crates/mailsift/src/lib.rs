//! # mailsift
//!
//! Selects mail messages by their headers.
//!
//! ## Features
//!
//! - **Loose date parsing**: `"2018-1-1"`, `"12:00:00"` or
//!   `"2018-1-1 12:30:05"` become full timestamps, borrowing missing date
//!   parts from today and zero-filling missing time parts
//! - **Header filters**: subject and sender substrings plus an inclusive
//!   time window
//! - **Case-insensitive headers**: lookups ignore case, iteration keeps the
//!   original spelling
//! - **Filter files**: criteria and message lists stored as JSON
//!
//! ## Quick Start
//!
//! ```
//! use mailsift::{FilterCriteria, HeaderMap};
//!
//! let headers = HeaderMap::parse(concat!(
//!     "From: Alice <alice@example.com>\r\n",
//!     "Subject: Hi there\r\n",
//!     "Date: Mon, 1 Jan 2018 12:00:00 +0000\r\n",
//!     "\r\n",
//!     "Body text",
//! ));
//!
//! let criteria = FilterCriteria::new().subject("Hi").sender("alice");
//! assert!(criteria.matches(&headers)?);
//! # Ok::<(), mailsift::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod error;

pub mod date;
pub mod filter;
pub mod header;
pub mod util;

pub use date::{Clock, FixedClock, RawDate, SystemClock, normalize_date, normalize_date_with};
pub use error::{Error, Result};
pub use filter::{FilterCriteria, FilterFile, match_conditions};
pub use header::{HeaderMap, HeaderValue};
pub use util::{OneOrMany, as_sequence, resolve_path};
