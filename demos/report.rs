use dyn_mm_reports::{Filters, Report, ReportKind, SessionBuilder};

#[tokio::main]
async fn main() -> Result<(), dyn_mm_reports::Error> {
    let session = SessionBuilder::from_env()?.build()?;
    let filters = Filters::new("2024-01-01T00:00:00Z", "2024-01-02T00:00:00Z");

    for kind in ReportKind::SUPPORTED {
        let mut report = Report::fetch(&session, kind, filters.clone()).await?;
        let total = report.count().await?;
        println!("{kind}: {} listed, {total} total", report.results().len());
    }

    Ok(())
}
