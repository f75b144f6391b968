use anyhow::Result;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};

use crate::classify::annotate_all;
use crate::favorites::Favorites;
use crate::feed::FeedSource;
use crate::models::{AnnotatedListing, Decision, ListingKey, SwipeAction};
use crate::store::{read_list, write_list, KvStore, HISTORY_KEY, LIKED_KEY, PASSED_KEY};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Loading,
    Reviewing,
    Exhausted,
    Failed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SwipeStats {
    pub liked: usize,
    pub passed: usize,
    pub remaining: usize,
    pub position: usize,
    pub total: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Status {
    Loading,
    Ready,
    Failed(String),
}

pub struct SwipeSession<'a> {
    store: &'a dyn KvStore,
    favorites: Favorites<'a>,
    decided: HashMap<ListingKey, Decision>,
    history: Vec<SwipeAction>,
    queue: Vec<AnnotatedListing>,
    cursor: usize,
    status: Status,
}

impl<'a> SwipeSession<'a> {
    pub fn load(store: &'a dyn KvStore) -> Self {
        let liked: Vec<ListingKey> = read_list(store, LIKED_KEY);
        let passed: Vec<ListingKey> = read_list(store, PASSED_KEY);
        let history: Vec<SwipeAction> = read_list(store, HISTORY_KEY);
        let (decided, history) = reconcile(liked, passed, history);

        debug!(
            "Loaded swipe state - decided={}, history={}",
            decided.len(),
            history.len()
        );

        Self {
            store,
            favorites: Favorites::new(store),
            decided,
            history,
            queue: Vec::new(),
            cursor: 0,
            status: Status::Loading,
        }
    }

    pub fn state(&self) -> SessionState {
        match &self.status {
            Status::Loading => SessionState::Loading,
            Status::Failed(msg) => SessionState::Failed(msg.clone()),
            Status::Ready if self.cursor >= self.queue.len() => SessionState::Exhausted,
            Status::Ready => SessionState::Reviewing,
        }
    }

    pub fn current(&self) -> Option<&AnnotatedListing> {
        match self.status {
            Status::Ready => self.queue.get(self.cursor),
            _ => None,
        }
    }

    #[cfg(test)]
    pub fn queue(&self) -> &[AnnotatedListing] {
        &self.queue
    }

    #[cfg(test)]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    #[cfg(test)]
    pub fn history(&self) -> &[SwipeAction] {
        &self.history
    }

    #[cfg(test)]
    pub fn decision(&self, key: &ListingKey) -> Option<Decision> {
        self.decided.get(key).copied()
    }

    #[cfg(test)]
    pub fn decided_len(&self) -> usize {
        self.decided.len()
    }

    pub fn stats(&self) -> SwipeStats {
        let liked = self
            .decided
            .values()
            .filter(|d| **d == Decision::Like)
            .count();
        SwipeStats {
            liked,
            passed: self.decided.len() - liked,
            remaining: self.queue.len().saturating_sub(self.cursor),
            position: self.cursor,
            total: self.queue.len(),
        }
    }

    pub fn begin_loading(&mut self) {
        self.status = Status::Loading;
    }

    pub fn refresh(&mut self, feed: &dyn FeedSource) -> Result<()> {
        self.begin_loading();
        match feed.fetch() {
            Ok(listings) => {
                let annotated = annotate_all(listings);
                let mut seen: HashSet<ListingKey> = HashSet::new();
                let mut queue: Vec<AnnotatedListing> = annotated
                    .into_iter()
                    .filter(|job| job.region_eligible && !self.decided.contains_key(&job.key()))
                    .collect();
                queue.sort_by(|a, b| b.match_score.cmp(&a.match_score));
                // Listings sharing a key would collide in `decided`.
                queue.retain(|job| seen.insert(job.key()));

                info!(
                    "Swipe queue rebuilt - queued={}, decided={}",
                    queue.len(),
                    self.decided.len()
                );
                self.queue = queue;
                self.cursor = 0;
                self.status = Status::Ready;
                Ok(())
            }
            Err(e) => {
                self.queue.clear();
                self.cursor = 0;
                self.status = Status::Failed(format!("{:#}", e));
                Err(e)
            }
        }
    }

    pub fn decide(&mut self, decision: Decision) -> Result<Option<SwipeAction>> {
        if self.state() != SessionState::Reviewing {
            return Ok(None);
        }
        let key = self.queue[self.cursor].key();

        let favorited = match decision {
            Decision::Like => self.favorites.insert(&key)?,
            Decision::Pass => false,
        };
        let action = SwipeAction {
            job_key: key.clone(),
            action: decision,
            timestamp: chrono::Utc::now().timestamp_millis(),
            favorited,
        };

        self.decided.insert(key.clone(), decision);
        self.history.push(action.clone());
        if let Err(e) = self.persist() {
            self.history.pop();
            self.decided.remove(&key);
            if favorited {
                if let Err(undo) = self.favorites.remove(&key) {
                    warn!("Could not roll back favorite '{}': {:#}", key, undo);
                }
            }
            return Err(e);
        }
        self.cursor += 1;

        debug!("Swipe {} on '{}'", decision, action.job_key);
        Ok(Some(action))
    }

    pub fn undo(&mut self) -> Result<Option<SwipeAction>> {
        if self.status != Status::Ready || self.cursor == 0 {
            return Ok(None);
        }
        let Some(last) = self.history.pop() else {
            return Ok(None);
        };

        let unfavorite = last.action == Decision::Like && last.favorited;
        if unfavorite {
            if let Err(e) = self.favorites.remove(&last.job_key) {
                self.history.push(last);
                return Err(e);
            }
        }
        self.decided.remove(&last.job_key);
        if let Err(e) = self.persist() {
            self.decided.insert(last.job_key.clone(), last.action);
            if unfavorite {
                if let Err(redo) = self.favorites.insert(&last.job_key) {
                    warn!("Could not restore favorite '{}': {:#}", last.job_key, redo);
                }
            }
            self.history.push(last);
            return Err(e);
        }
        self.cursor -= 1;

        debug!("Undid {} on '{}'", last.action, last.job_key);
        Ok(Some(last))
    }

    // Favorites starred by hand survive a reset.
    pub fn reset(&mut self, feed: &dyn FeedSource) -> Result<()> {
        for entry in &self.history {
            if entry.action == Decision::Like && entry.favorited {
                self.favorites.remove(&entry.job_key)?;
            }
        }
        self.decided.clear();
        self.history.clear();
        self.cursor = 0;

        self.store.delete(LIKED_KEY)?;
        self.store.delete(PASSED_KEY)?;
        self.store.delete(HISTORY_KEY)?;
        info!("Swipe state reset");

        self.refresh(feed)
    }

    fn persist(&self) -> Result<()> {
        let mut liked: Vec<&ListingKey> = Vec::new();
        let mut passed: Vec<&ListingKey> = Vec::new();
        for (key, decision) in &self.decided {
            match decision {
                Decision::Like => liked.push(key),
                Decision::Pass => passed.push(key),
            }
        }
        liked.sort();
        passed.sort();

        write_list(self.store, LIKED_KEY, &liked)?;
        write_list(self.store, PASSED_KEY, &passed)?;
        write_list(self.store, HISTORY_KEY, &self.history)
    }
}

// The liked/passed sets are authoritative. History entries that contradict
// them or repeat a key are dropped; decisions without one get a time-0 entry.
fn reconcile(
    liked: Vec<ListingKey>,
    passed: Vec<ListingKey>,
    history: Vec<SwipeAction>,
) -> (HashMap<ListingKey, Decision>, Vec<SwipeAction>) {
    let mut decided: HashMap<ListingKey, Decision> = HashMap::new();
    for key in passed {
        decided.insert(key, Decision::Pass);
    }
    for key in liked {
        let decision = if decided.contains_key(&key) {
            history
                .iter()
                .rev()
                .find(|h| h.job_key == key)
                .map(|h| h.action)
                .unwrap_or(Decision::Like)
        } else {
            Decision::Like
        };
        decided.insert(key, decision);
    }

    let mut seen: HashSet<ListingKey> = HashSet::new();
    let mut kept: Vec<SwipeAction> = history
        .into_iter()
        .rev()
        .filter(|h| decided.get(&h.job_key) == Some(&h.action) && seen.insert(h.job_key.clone()))
        .collect();
    kept.reverse();

    let mut missing: Vec<SwipeAction> = decided
        .iter()
        .filter(|(key, _)| !seen.contains(*key))
        .map(|(key, decision)| SwipeAction {
            job_key: key.clone(),
            action: *decision,
            timestamp: 0,
            favorited: *decision == Decision::Like,
        })
        .collect();
    missing.sort_by(|a, b| a.job_key.cmp(&b.job_key));
    missing.extend(kept);

    (decided, missing)
}
