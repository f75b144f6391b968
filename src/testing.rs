use anyhow::{anyhow, Result};
use std::cell::{Cell, RefCell};

use crate::feed::FeedSource;
use crate::models::Listing;
use crate::store::{KvStore, Store};

pub fn listing(company: &str, title: &str, locations: &[&str]) -> Listing {
    Listing {
        company_name: company.to_string(),
        title: title.to_string(),
        locations: locations.iter().map(|s| s.to_string()).collect(),
        url: "https://example.com/apply".to_string(),
        date_posted: 0,
        date_updated: 0,
        active: true,
        sponsorship: None,
        terms: Vec::new(),
        is_visible: None,
    }
}

pub struct StaticFeed {
    listings: RefCell<Vec<Listing>>,
    failing: Cell<bool>,
    pub fetches: Cell<usize>,
}

impl StaticFeed {
    pub fn new(listings: Vec<Listing>) -> Self {
        Self {
            listings: RefCell::new(listings),
            failing: Cell::new(false),
            fetches: Cell::new(0),
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.set(failing);
    }
}

impl FeedSource for StaticFeed {
    fn fetch(&self) -> Result<Vec<Listing>> {
        self.fetches.set(self.fetches.get() + 1);
        if self.failing.get() {
            return Err(anyhow!("Failed to fetch job listings"));
        }
        Ok(self.listings.borrow().clone())
    }
}

pub struct FailingWrites {
    inner: Store,
    key: &'static str,
    pub failing: Cell<bool>,
}

impl FailingWrites {
    pub fn new(key: &'static str) -> Self {
        Self {
            inner: Store::open_in_memory().unwrap(),
            key,
            failing: Cell::new(false),
        }
    }
}

impl KvStore for FailingWrites {
    fn get(&self, key: &str) -> Result<Option<String>> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        if self.failing.get() && key == self.key {
            return Err(anyhow!("Failed to write '{}'", key));
        }
        self.inner.set(key, value)
    }

    fn delete(&self, key: &str) -> Result<()> {
        self.inner.delete(key)
    }
}
