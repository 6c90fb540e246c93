//! # Dyn Message Management reports
//! Asynchronous wrapper around the `/reports` endpoints of the Dyn Message Management API: search sent, delivered, bounced, complained and issue mail with [`Report`], and read aggregate totals through its count accessor.
//!
//! ## Audience and uses
//! For Rust developers who need delivery data from a Message Management account in dashboards, audits or scripts: open a [`Session`], describe the search with [`Filters`], then fetch a [`Report`] for a [`ReportKind`].
//!
//! ## Runtime requirements
//! Async-only; run inside a Tokio (v1) runtime. HTTP calls use `reqwest`. Every operation is a single request awaited to completion; nothing runs in the background.
//!
//! ## Out of scope
//! Sending mail, account and sender management, retries, rate limiting and pagination beyond a raw start index. Interaction reports are not implemented and fail with [`Error::Unsupported`].
//!
//! ## Errors
//! Transport failures and non-2xx statuses surface as [`Error::Request`]; error statuses inside the API's response envelope become [`Error::Api`]; bodies missing the expected fields become [`Error::ResponseParse`] or [`Error::Json`]. The crate-wide [`Result`] alias wraps these errors.
//!
//! ## Example
//! ```no_run
//! use dyn_mm_reports::{Filters, Report, ReportKind, Session};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), dyn_mm_reports::Error> {
//!     let session = Session::new("my-api-key")?;
//!     let filters = Filters::new("2024-01-01T00:00:00Z", "2024-01-02T00:00:00Z");
//!
//!     let mut sent = Report::fetch(&session, ReportKind::Sent, filters).await?;
//!     println!("{} records, {} total", sent.results().len(), sent.count().await?);
//!
//!     let latest = sent.refresh().await?;
//!     println!("{} records after refresh", latest.len());
//!     Ok(())
//! }
//! ```

mod error;
mod reports;
mod session;

pub use error::Error;
pub use reports::{Filters, Record, Report, ReportKind};
pub use reqwest::Method;
pub use session::{Session, SessionBuilder};

/// Result type alias for report operations.
///
/// This is equivalent to `std::result::Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
