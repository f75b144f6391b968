use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeSet;

use crate::classify::{normalized_locations, region_matches, JobType, Region};
use crate::models::{AnnotatedListing, ListingKey};

const SECONDS_PER_DAY: i64 = 24 * 60 * 60;

pub const HIGH_MATCH_SCORE: u8 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Sponsorship {
    #[default]
    All,
    Sponsors,
    NoSponsors,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
pub enum PostedWithin {
    #[default]
    #[value(name = "all")]
    All,
    #[value(name = "7")]
    Week,
    #[value(name = "30")]
    Month,
    #[value(name = "90")]
    Quarter,
}

impl PostedWithin {
    pub fn days(self) -> Option<i64> {
        match self {
            PostedWithin::All => None,
            PostedWithin::Week => Some(7),
            PostedWithin::Month => Some(30),
            PostedWithin::Quarter => Some(90),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    #[default]
    Match,
    Date,
    Company,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum JobTypeFilter {
    All,
    #[default]
    Software,
    Quant,
    Pm,
    Other,
}

impl JobTypeFilter {
    pub fn matches(self, title: &str) -> bool {
        match self {
            JobTypeFilter::All => true,
            JobTypeFilter::Software => JobType::Software.matches(title),
            JobTypeFilter::Quant => JobType::Quant.matches(title),
            JobTypeFilter::Pm => JobType::Pm.matches(title),
            JobTypeFilter::Other => JobType::Other.matches(title),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterConfig {
    pub search: String,
    pub min_score: u8,
    pub job_type: JobTypeFilter,
    pub region: Region,
    pub sponsorship: Sponsorship,
    pub posted_within: PostedWithin,
    pub favorites_only: bool,
    pub sort: SortKey,
}

impl FilterConfig {
    pub fn clear(&mut self) {
        self.search.clear();
        self.min_score = 0;
    }

    pub fn matches(
        &self,
        job: &AnnotatedListing,
        favorites: &BTreeSet<ListingKey>,
        now: i64,
    ) -> bool {
        let listing = &job.listing;
        if !listing.is_eligible() || !job.region_eligible {
            return false;
        }

        let search = self.search.to_lowercase();
        let matches_search = search.is_empty()
            || listing.title.to_lowercase().contains(&search)
            || listing.company_name.to_lowercase().contains(&search)
            || listing.locations_display().to_lowercase().contains(&search);

        let matches_sponsorship = match self.sponsorship {
            Sponsorship::All => true,
            Sponsorship::Sponsors => offers_sponsorship(listing.sponsorship.as_deref()),
            Sponsorship::NoSponsors => !offers_sponsorship(listing.sponsorship.as_deref()),
        };

        let matches_recency = match self.posted_within.days() {
            None => true,
            Some(days) => now - listing.date_posted <= days * SECONDS_PER_DAY,
        };

        matches_search
            && job.match_score >= self.min_score
            && self.job_type.matches(&listing.title)
            && region_matches(&normalized_locations(&listing.locations), self.region)
            && matches_sponsorship
            && matches_recency
            && (!self.favorites_only || favorites.contains(&job.key()))
    }

    pub fn apply(
        &self,
        jobs: &[AnnotatedListing],
        favorites: &BTreeSet<ListingKey>,
        now: i64,
    ) -> Vec<AnnotatedListing> {
        let mut view: Vec<AnnotatedListing> = jobs
            .iter()
            .filter(|job| self.matches(job, favorites, now))
            .cloned()
            .collect();
        sort_view(&mut view, self.sort);
        view
    }
}

fn offers_sponsorship(sponsorship: Option<&str>) -> bool {
    sponsorship.is_some_and(|s| !s.trim().is_empty() && s.to_lowercase().contains("sponsor"))
}

fn compare_company(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

pub fn sort_view(view: &mut [AnnotatedListing], sort: SortKey) {
    match sort {
        SortKey::Match => view.sort_by(|a, b| b.match_score.cmp(&a.match_score)),
        SortKey::Date => view.sort_by(|a, b| b.listing.date_posted.cmp(&a.listing.date_posted)),
        SortKey::Company => view.sort_by(|a, b| {
            compare_company(&a.listing.company_name, &b.listing.company_name)
        }),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ViewStats {
    pub total: usize,
    pub filtered: usize,
    pub top_score: Option<u8>,
    pub high_matches: usize,
}

impl ViewStats {
    pub fn new(total: usize, view: &[AnnotatedListing]) -> Self {
        Self {
            total,
            filtered: view.len(),
            top_score: view.iter().map(|j| j.match_score).max(),
            high_matches: view
                .iter()
                .filter(|j| j.match_score >= HIGH_MATCH_SCORE)
                .count(),
        }
    }
}
