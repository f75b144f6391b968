use anyhow::Result;
use std::collections::BTreeSet;

use crate::models::ListingKey;
use crate::store::{read_list, write_list, KvStore, FAVORITES_KEY};

// Reads through to the store on every call so the list and swipe views agree.
#[derive(Clone, Copy)]
pub struct Favorites<'a> {
    store: &'a dyn KvStore,
}

impl<'a> Favorites<'a> {
    pub fn new(store: &'a dyn KvStore) -> Self {
        Self { store }
    }

    pub fn all(&self) -> BTreeSet<ListingKey> {
        read_list::<ListingKey>(self.store, FAVORITES_KEY)
            .into_iter()
            .collect()
    }

    #[cfg(test)]
    pub fn contains(&self, key: &ListingKey) -> bool {
        self.all().contains(key)
    }

    pub fn insert(&self, key: &ListingKey) -> Result<bool> {
        let mut set = self.all();
        let added = set.insert(key.clone());
        if added {
            self.save(&set)?;
        }
        Ok(added)
    }

    pub fn remove(&self, key: &ListingKey) -> Result<bool> {
        let mut set = self.all();
        let removed = set.remove(key);
        if removed {
            self.save(&set)?;
        }
        Ok(removed)
    }

    pub fn toggle(&self, key: &ListingKey) -> Result<bool> {
        if self.remove(key)? {
            Ok(false)
        } else {
            self.insert(key)?;
            Ok(true)
        }
    }

    fn save(&self, set: &BTreeSet<ListingKey>) -> Result<()> {
        let keys: Vec<&ListingKey> = set.iter().collect();
        write_list(self.store, FAVORITES_KEY, &keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Store;

    #[test]
    fn test_toggle_roundtrip() {
        let store = Store::open_in_memory().unwrap();
        let favorites = Favorites::new(&store);
        let key = ListingKey::new("Acme", "SWE Intern");

        assert!(!favorites.contains(&key));
        assert!(favorites.toggle(&key).unwrap());
        assert!(favorites.contains(&key));
        assert!(!favorites.toggle(&key).unwrap());
        assert!(favorites.all().is_empty());
    }

    #[test]
    fn test_insert_reports_new_membership() {
        let store = Store::open_in_memory().unwrap();
        let favorites = Favorites::new(&store);
        let key = ListingKey::new("Acme", "SWE Intern");
        assert!(favorites.insert(&key).unwrap());
        assert!(!favorites.insert(&key).unwrap());
        assert!(favorites.remove(&key).unwrap());
        assert!(!favorites.remove(&key).unwrap());
    }

    #[test]
    fn test_shared_through_store() {
        let store = Store::open_in_memory().unwrap();
        let list_view = Favorites::new(&store);
        let swipe_view = Favorites::new(&store);
        let key = ListingKey::new("Acme", "SWE Intern");
        list_view.insert(&key).unwrap();
        assert!(swipe_view.contains(&key));
    }

    #[test]
    fn test_malformed_favorites_read_empty() {
        let store = Store::open_in_memory().unwrap();
        store.set(FAVORITES_KEY, "[1, 2").unwrap();
        let favorites = Favorites::new(&store);
        assert!(favorites.all().is_empty());
        let key = ListingKey::new("Acme", "SWE Intern");
        assert!(favorites.toggle(&key).unwrap());
        assert_eq!(favorites.all().len(), 1);
    }
}
