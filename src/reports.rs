//! Delivery reports: sent, delivered, bounced, complained and issue searches.
//!
//! Detail data is retained by the service for 30 days and aggregate counts for
//! 18 months, so searches older than that usually come back empty. Always pass
//! a time range when you can: without one the server scans the whole account
//! history, which is slow.

use crate::{Error, Method, Result, Session};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::fmt;
use tracing::debug;

/// One entry of a report listing, keyed by field name.
pub type Record = Map<String, Value>;

/// The report endpoints this client knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReportKind {
    /// Every message accepted for delivery.
    Sent,
    /// Messages the receiving server accepted.
    Delivered,
    /// Hard and soft bounces.
    Bounce,
    /// Spam complaints reported through feedback loops.
    Complaint,
    /// Messages that could not be sent at all.
    Issue,
    /// Recipient interactions (opens, clicks). Not queryable yet.
    Interaction,
}

impl ReportKind {
    /// Every kind that can currently be fetched.
    pub const SUPPORTED: [ReportKind; 5] = [
        ReportKind::Sent,
        ReportKind::Delivered,
        ReportKind::Bounce,
        ReportKind::Complaint,
        ReportKind::Issue,
    ];

    /// Resource path of the listing endpoint, or `None` when unsupported.
    pub fn path(self) -> Option<&'static str> {
        match self {
            ReportKind::Sent => Some("/reports/sent"),
            ReportKind::Delivered => Some("/reports/delivered"),
            ReportKind::Bounce => Some("/reports/bounces"),
            ReportKind::Complaint => Some("/reports/complaints"),
            ReportKind::Issue => Some("/reports/issues"),
            ReportKind::Interaction => None,
        }
    }

    /// Whether [`Report::fetch`] accepts this kind.
    pub fn is_supported(self) -> bool {
        self.path().is_some()
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReportKind::Sent => "sent",
            ReportKind::Delivered => "delivered",
            ReportKind::Bounce => "bounce",
            ReportKind::Complaint => "complaint",
            ReportKind::Issue => "issue",
            ReportKind::Interaction => "interaction",
        };
        f.write_str(name)
    }
}

/// Search filters shared by every report kind.
///
/// Only the options that are set are sent to the server. Times are passed
/// through as given; use full ISO 8601 (`2024-01-01T00:00:00Z`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filters {
    /// Start of the search range (`starttime`).
    pub start_time: Option<String>,
    /// End of the search range (`endtime`).
    pub end_time: Option<String>,
    /// Offset into the listing (`startindex`). Never sent with count queries.
    pub start_index: Option<u32>,
    /// Sender address to filter by (`sender`).
    pub sender: Option<String>,
    /// Name of a custom X-header to search on (`xheaders`).
    pub custom_header_name: Option<String>,
}

impl Filters {
    /// Filters for a bounded time range.
    pub fn new(start_time: impl Into<String>, end_time: impl Into<String>) -> Self {
        Self {
            start_time: Some(start_time.into()),
            end_time: Some(end_time.into()),
            ..Self::default()
        }
    }

    /// Start the listing at this offset.
    pub fn start_index(mut self, start_index: u32) -> Self {
        self.start_index = Some(start_index);
        self
    }

    /// Only match mail from this sender address.
    pub fn sender(mut self, sender: impl Into<String>) -> Self {
        self.sender = Some(sender.into());
        self
    }

    /// Only match mail carrying this custom X-header.
    pub fn custom_header_name(mut self, name: impl Into<String>) -> Self {
        self.custom_header_name = Some(name.into());
        self
    }

    /// Parameters for a listing request.
    pub fn list_params(&self) -> Vec<(&'static str, String)> {
        self.params(true)
    }

    /// Parameters for a count request: the listing ones minus `startindex`.
    pub fn count_params(&self) -> Vec<(&'static str, String)> {
        self.params(false)
    }

    fn params(&self, with_start_index: bool) -> Vec<(&'static str, String)> {
        let mut params = Vec::with_capacity(5);
        if let Some(start_time) = &self.start_time {
            params.push(("starttime", start_time.clone()));
        }
        if let Some(end_time) = &self.end_time {
            params.push(("endtime", end_time.clone()));
        }
        if with_start_index {
            if let Some(start_index) = self.start_index {
                params.push(("startindex", start_index.to_string()));
            }
        }
        if let Some(sender) = &self.sender {
            params.push(("sender", sender.clone()));
        }
        if let Some(name) = &self.custom_header_name {
            params.push(("xheaders", name.clone()));
        }
        params
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CountCache {
    NotFetched,
    Fetched(u64),
}

/// A report search and its most recently fetched results.
///
/// Construction runs the search right away, so a `Report` always holds the
/// listing of its last successful request.
#[derive(Debug)]
pub struct Report {
    session: Session,
    kind: Option<ReportKind>,
    path: String,
    filters: Filters,
    results: Vec<Record>,
    count: CountCache,
}

impl Report {
    /// Run a search against the endpoint of `kind`.
    ///
    /// Fails with [`Error::Unsupported`] before touching the network when
    /// `kind` has no endpoint.
    ///
    /// # Examples
    /// ```no_run
    /// # use dyn_mm_reports::{Filters, Report, ReportKind, Session};
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), dyn_mm_reports::Error> {
    /// let session = Session::new("my-api-key")?;
    /// let filters = Filters::new("2024-01-01T00:00:00Z", "2024-01-02T00:00:00Z");
    /// let report = Report::fetch(&session, ReportKind::Bounce, filters).await?;
    /// for record in report.results() {
    ///     println!("{record:?}");
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub async fn fetch(session: &Session, kind: ReportKind, filters: Filters) -> Result<Self> {
        let path = kind.path().ok_or(Error::Unsupported(kind))?;
        Self::query(session, Some(kind), path.to_string(), filters).await
    }

    /// Run a search against an arbitrary report path, such as
    /// `/reports/opens/unique`, that has no [`ReportKind`].
    ///
    /// The listing must still come back under `sent`.
    pub async fn fetch_at(
        session: &Session,
        path: impl Into<String>,
        filters: Filters,
    ) -> Result<Self> {
        let path = path.into().trim_end_matches('/').to_string();
        Self::query(session, None, path, filters).await
    }

    async fn query(
        session: &Session,
        kind: Option<ReportKind>,
        path: String,
        filters: Filters,
    ) -> Result<Self> {
        let mut report = Self {
            session: session.clone(),
            kind,
            path,
            filters,
            results: Vec::new(),
            count: CountCache::NotFetched,
        };
        report.update().await?;
        Ok(report)
    }

    /// Report kind, or `None` for reports built with [`Report::fetch_at`].
    pub fn kind(&self) -> Option<ReportKind> {
        self.kind
    }

    /// Resource path the listing is fetched from.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Filters sent with every request of this report.
    pub fn filters(&self) -> &Filters {
        &self.filters
    }

    /// Records returned by the last listing request, in server order.
    pub fn results(&self) -> &[Record] {
        &self.results
    }

    /// Consume the report and keep only its records.
    pub fn into_results(self) -> Vec<Record> {
        self.results
    }

    /// Re-run the search and replace the stored results with the new listing.
    ///
    /// On error the previous results are kept.
    pub async fn refresh(&mut self) -> Result<&[Record]> {
        self.update().await?;
        Ok(&self.results)
    }

    async fn update(&mut self) -> Result<()> {
        let body = self
            .session
            .execute(&self.path, Method::GET, &self.filters.list_params())
            .await?;
        self.results = parse_records(body)?;
        debug!(path = %self.path, records = self.results.len(), "report updated");
        Ok(())
    }

    /// Total number of matching records.
    ///
    /// The first call asks `<path>/count/` with the current filters (without
    /// `startindex`); later calls return the cached value without a request.
    /// The cache is never refreshed on its own: use [`Report::refresh_count`]
    /// or [`Report::invalidate_count`] when the value may be stale.
    pub async fn count(&mut self) -> Result<u64> {
        if let CountCache::Fetched(count) = self.count {
            debug!(path = %self.path, count, "count served from cache");
            return Ok(count);
        }
        self.refresh_count().await
    }

    /// Fetch the count from the server, replacing any cached value.
    pub async fn refresh_count(&mut self) -> Result<u64> {
        let path = format!("{}/count/", self.path);
        let body = self
            .session
            .execute(&path, Method::GET, &self.filters.count_params())
            .await?;
        let count = parse_count(&body)?;
        self.count = CountCache::Fetched(count);
        Ok(count)
    }

    /// The cached count, if one has been fetched.
    pub fn cached_count(&self) -> Option<u64> {
        match self.count {
            CountCache::Fetched(count) => Some(count),
            CountCache::NotFetched => None,
        }
    }

    /// Drop the cached count so the next [`Report::count`] asks the server.
    pub fn invalidate_count(&mut self) {
        self.count = CountCache::NotFetched;
    }

    /// Ignored. The count only ever comes from the server.
    pub fn set_count(&mut self, value: u64) {
        debug!(path = %self.path, value, "ignoring write to report count");
    }
}

/// Listing body: `{"sent": [...]}`.
#[derive(Debug, Deserialize)]
struct ListingBody {
    sent: Vec<Record>,
}

/// Count body: `{"response": {"data": {"count": ...}}}`.
#[derive(Debug, Deserialize)]
struct CountBody {
    response: CountResponse,
}

#[derive(Debug, Deserialize)]
struct CountResponse {
    data: CountData,
}

#[derive(Debug, Deserialize)]
struct CountData {
    count: CountValue,
}

/// The count arrives as an integer, an integral float or a numeric string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CountValue {
    Integer(u64),
    Float(f64),
    Text(String),
}

impl CountValue {
    fn to_u64(&self) -> Option<u64> {
        match self {
            CountValue::Integer(count) => Some(*count),
            CountValue::Float(count) if *count >= 0.0 && count.fract() == 0.0 => {
                Some(*count as u64)
            }
            CountValue::Float(_) => None,
            CountValue::Text(text) => text.trim().parse().ok(),
        }
    }
}

fn parse_records(body: Value) -> Result<Vec<Record>> {
    serde_json::from_value::<ListingBody>(body)
        .map(|listing| listing.sent)
        .map_err(|_| Error::ResponseParse("missing or malformed `sent` list"))
}

fn parse_count(body: &Value) -> Result<u64> {
    let body = CountBody::deserialize(body)
        .map_err(|_| Error::ResponseParse("missing or malformed `response.data.count`"))?;

    body.response
        .data
        .count
        .to_u64()
        .ok_or(Error::ResponseParse("`count` is not a non-negative integer"))
}
