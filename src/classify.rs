use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::models::{AnnotatedListing, Listing};

// Customize these with your own resume keywords and skills
pub const RESUME_KEYWORDS: &[&str] = &[
    "software",
    "engineer",
    "full stack",
    "frontend",
    "backend",
    "react",
    "typescript",
    "javascript",
    "python",
    "java",
    "web development",
    "api",
    "database",
    "cloud",
    "aws",
    "machine learning",
    "data",
    "mobile",
    "android",
    "ios",
];

const US_KEYWORDS: &[&str] = &[
    "usa",
    "united states",
    "u.s.",
    "california",
    "texas",
    "new york",
    "washington",
    "massachusetts",
    "illinois",
    "georgia",
    "florida",
    "san francisco",
    "seattle",
    "austin",
    "boston",
    "chicago",
    "atlanta",
    "denver",
    "portland",
    "los angeles",
    "san diego",
    "miami",
    "dallas",
    ", ca",
    ", tx",
    ", ny",
    ", wa",
    ", ma",
    ", il",
    ", ga",
    ", fl",
];

const EUROPE_KEYWORDS: &[&str] = &[
    "europe",
    "germany",
    "france",
    "uk",
    "united kingdom",
    "spain",
    "italy",
    "netherlands",
    "poland",
    "sweden",
    "switzerland",
    "london",
    "berlin",
    "paris",
    "amsterdam",
    "dublin",
    "zurich",
];

const ARGENTINA_KEYWORDS: &[&str] = &["argentina", "buenos aires"];

const SOFTWARE_TERMS: &[&str] = &[
    "software",
    "engineer",
    "developer",
    "swe",
    "frontend",
    "backend",
    "full stack",
    "fullstack",
];

const QUANT_TERMS: &[&str] = &["quant", "quantitative", "trading"];

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| haystack.contains(n))
}

pub fn match_score(listing: &Listing) -> u8 {
    let text = format!("{} {}", listing.title, listing.company_name).to_lowercase();
    let matches = RESUME_KEYWORDS
        .iter()
        .filter(|kw| text.contains(&kw.to_lowercase()))
        .count();

    let ratio = (2.0 * matches as f64 / RESUME_KEYWORDS.len() as f64).min(1.0);
    (ratio * 100.0).round().min(100.0) as u8
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum JobType {
    Software,
    Quant,
    Pm,
    Other,
}

impl JobType {
    pub fn matches(self, title: &str) -> bool {
        let title = title.to_lowercase();
        match self {
            JobType::Software => contains_any(&title, SOFTWARE_TERMS),
            JobType::Quant => contains_any(&title, QUANT_TERMS),
            JobType::Pm => {
                title.contains("product")
                    && (title.contains("manager") || title.contains("management"))
            }
            JobType::Other => ![JobType::Software, JobType::Quant, JobType::Pm]
                .iter()
                .any(|t| t.matches(&title)),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            JobType::Software => "Software Engineering",
            JobType::Quant => "Quant/Trading",
            JobType::Pm => "Product Management",
            JobType::Other => "Other",
        }
    }
}

pub fn job_types(listing: &Listing) -> Vec<JobType> {
    [JobType::Software, JobType::Quant, JobType::Pm, JobType::Other]
        .into_iter()
        .filter(|t| t.matches(&listing.title))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Region {
    #[default]
    All,
    Remote,
    Us,
    Europe,
    Argentina,
}

pub fn normalized_locations(locations: &[String]) -> String {
    locations.join(" ").to_lowercase()
}

// Remote listings match every region.
pub fn region_matches(locations: &str, region: Region) -> bool {
    let locations = locations.to_lowercase();
    if region == Region::All || locations.contains("remote") {
        return true;
    }
    match region {
        Region::Us => contains_any(&locations, US_KEYWORDS),
        Region::Europe => contains_any(&locations, EUROPE_KEYWORDS),
        Region::Argentina => contains_any(&locations, ARGENTINA_KEYWORDS),
        Region::Remote | Region::All => false,
    }
}

pub fn region_eligible(listing: &Listing) -> bool {
    if listing.locations.is_empty() {
        return false;
    }
    let locations = normalized_locations(&listing.locations);
    [Region::Remote, Region::Us, Region::Europe, Region::Argentina]
        .into_iter()
        .any(|r| region_matches(&locations, r))
}

pub fn annotate(listing: Listing) -> AnnotatedListing {
    AnnotatedListing {
        match_score: match_score(&listing),
        region_eligible: region_eligible(&listing),
        listing,
    }
}

pub fn annotate_all(listings: Vec<Listing>) -> Vec<AnnotatedListing> {
    listings
        .into_iter()
        .filter(Listing::is_eligible)
        .map(annotate)
        .collect()
}
