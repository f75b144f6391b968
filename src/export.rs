use anyhow::{Context, Result};
use chrono::DateTime;
use std::io::Write;

use crate::models::AnnotatedListing;

const HEADER: [&str; 7] = [
    "Company",
    "Title",
    "Locations",
    "Match Score",
    "Posted",
    "Sponsorship",
    "URL",
];

pub fn format_date(timestamp: i64) -> String {
    DateTime::from_timestamp(timestamp, 0)
        .map(|d| d.format("%b %-d, %Y").to_string())
        .unwrap_or_else(|| "-".to_string())
}

pub fn write_csv<W: Write>(writer: W, view: &[AnnotatedListing]) -> Result<()> {
    let mut out = csv::Writer::from_writer(writer);
    out.write_record(HEADER)?;

    for job in view {
        let listing = &job.listing;
        let sponsorship = listing
            .sponsorship
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or("N/A");
        let locations = listing.locations.join("; ");
        let score = job.match_score.to_string();
        let posted = format_date(listing.date_posted);
        out.write_record([
            listing.company_name.as_str(),
            listing.title.as_str(),
            locations.as_str(),
            score.as_str(),
            posted.as_str(),
            sponsorship,
            listing.url.as_str(),
        ])
        .with_context(|| format!("Failed to write row for {}", job.key()))?;
    }

    out.flush().context("Failed to flush CSV output")?;
    Ok(())
}
