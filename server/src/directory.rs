//! In-memory guest directory for looking up guests by invitation code without querying the store on
//! every request.
//!
//! [GuestDirectory] is an immutable snapshot of the guest list, indexed by normalized code.
//! [DirectoryCache] holds the current snapshot for the whole web application and replaces it when
//! it is older than the configured maximum age or has been invalidated after a write. Lookups may
//! return stale data when the store is modified by other processes in between.

use crate::data_store::auth_token::AuthToken;
use crate::data_store::models::{normalize_code, Guest};
use crate::data_store::{GuestStoreFacade, StoreError};
use log::debug;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

pub const DEFAULT_SEARCH_LIMIT: usize = 10;

#[derive(Debug)]
pub struct GuestDirectory {
    guests: HashMap<String, Guest>,
    loaded_at: Instant,
}

impl GuestDirectory {
    /// Fetch all guests from the store and build a new directory from them.
    pub fn load(store: &mut dyn GuestStoreFacade) -> Result<Self, StoreError> {
        let guests = store.get_guests(&AuthToken::public())?;
        Ok(Self::from_guests(guests))
    }

    pub fn from_guests(guests: Vec<Guest>) -> Self {
        Self {
            guests: guests
                .into_iter()
                .map(|g| (normalize_code(&g.code), g))
                .collect(),
            loaded_at: Instant::now(),
        }
    }

    /// Look up a guest by code. The code is compared case-insensitively and surrounding
    /// whitespace is ignored.
    pub fn find(&self, code: &str) -> Option<&Guest> {
        self.guests.get(&normalize_code(code))
    }

    /// Get up to `limit` guests whose code or name contains the query (case-insensitive), sorted by
    /// name.
    ///
    /// A query consisting only of whitespace matches nothing.
    pub fn search(&self, query: &str, limit: usize) -> Vec<&Guest> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return vec![];
        }
        let mut result: Vec<&Guest> = self
            .guests
            .values()
            .filter(|g| {
                g.code.to_lowercase().contains(&query) || g.name.to_lowercase().contains(&query)
            })
            .collect();
        result.sort_by_cached_key(|g| (g.name.to_lowercase(), g.code.clone()));
        result.truncate(limit);
        result
    }

    /// All guests in the directory, in no particular order
    pub fn guests(&self) -> impl Iterator<Item = &Guest> {
        self.guests.values()
    }

    pub fn len(&self) -> usize {
        self.guests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.guests.is_empty()
    }

    fn age(&self) -> Duration {
        self.loaded_at.elapsed()
    }
}

/// Shared holder of the current [GuestDirectory] snapshot
pub struct DirectoryCache {
    state: RwLock<CacheState>,
    max_age: Duration,
}

#[derive(Default)]
struct CacheState {
    current: Option<Arc<GuestDirectory>>,
    /// Incremented on each invalidation. A reload only installs its snapshot if no invalidation
    /// happened while it was reading from the store.
    generation: u64,
}

impl DirectoryCache {
    pub fn new(max_age: Duration) -> Self {
        Self {
            state: RwLock::new(CacheState::default()),
            max_age,
        }
    }

    /// Get the current directory snapshot, (re)loading it from the store if it has not been loaded
    /// yet, has been invalidated or is older than the maximum age.
    pub fn get(&self, store: &mut dyn GuestStoreFacade) -> Result<Arc<GuestDirectory>, StoreError> {
        if let Some(directory) = self.current_if_fresh() {
            return Ok(directory);
        }
        self.reload(store)
    }

    /// Unconditionally load a new directory snapshot from the store.
    ///
    /// The loaded snapshot is returned in any case, but it is not kept for later calls if the cache
    /// has been invalidated in the meantime.
    pub fn reload(
        &self,
        store: &mut dyn GuestStoreFacade,
    ) -> Result<Arc<GuestDirectory>, StoreError> {
        let generation = self.read_state().generation;
        let directory = Arc::new(GuestDirectory::load(store)?);
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        if state.generation == generation {
            debug!("Loaded guest directory with {} guests", directory.len());
            state.current = Some(directory.clone());
        } else {
            debug!("Discarding guest directory loaded before invalidation");
        }
        Ok(directory)
    }

    /// Drop the current snapshot, such that the next [Self::get] loads a new one. Must be called
    /// after modifying guests in the store.
    pub fn invalidate(&self) {
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        state.current = None;
        state.generation += 1;
    }

    fn read_state(&self) -> std::sync::RwLockReadGuard<'_, CacheState> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn current_if_fresh(&self) -> Option<Arc<GuestDirectory>> {
        self.read_state()
            .current
            .as_ref()
            .filter(|d| d.age() <= self.max_age)
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_store::models::RsvpStatus;
    use crate::data_store::store_mock::StoreMock;
    use crate::data_store::GuestStore;

    fn guest(code: &str, name: &str) -> Guest {
        Guest {
            code: code.to_string(),
            name: name.to_string(),
            seating_zone: "Garden".to_string(),
            table_assigned: "1".to_string(),
            designation: "Friend".to_string(),
            rsvp_status: RsvpStatus::Unset,
        }
    }

    fn example_directory() -> GuestDirectory {
        GuestDirectory::from_guests(vec![
            guest("JO001", "Kwame Boateng"),
            guest("JO002", "Abena Owusu"),
            guest("JO003", "Yaw Asante"),
            guest("JO004", "abena Mensah"),
            guest("XY100", "Efua Sarpong"),
        ])
    }

    #[test]
    fn test_find_ignores_case_and_whitespace() {
        let directory = example_directory();
        assert_eq!(directory.find("JO002").unwrap().name, "Abena Owusu");
        assert_eq!(directory.find("jo002").unwrap().name, "Abena Owusu");
        assert_eq!(directory.find("  Jo002\n").unwrap().name, "Abena Owusu");
    }

    #[test]
    fn test_find_unknown_code() {
        let directory = example_directory();
        assert!(directory.find("JO999").is_none());
        assert!(directory.find("").is_none());
        assert!(directory.find("JO 002").is_none());
    }

    #[test]
    fn test_search_matches_code_and_name_sorted_by_name() {
        let directory = example_directory();
        let names: Vec<&str> = directory
            .search("abena", DEFAULT_SEARCH_LIMIT)
            .iter()
            .map(|g| g.name.as_str())
            .collect();
        assert_eq!(names, vec!["abena Mensah", "Abena Owusu"]);

        let codes: Vec<&str> = directory
            .search("jo00", DEFAULT_SEARCH_LIMIT)
            .iter()
            .map(|g| g.code.as_str())
            .collect();
        assert_eq!(codes, vec!["JO004", "JO002", "JO001", "JO003"]);
    }

    #[test]
    fn test_search_respects_limit() {
        let directory = example_directory();
        let result = directory.search("o", 2);
        assert_eq!(result.len(), 2);
        assert_eq!(result[0].name, "abena Mensah");
        assert_eq!(result[1].name, "Abena Owusu");
        assert!(directory.search("o", 0).is_empty());
    }

    #[test]
    fn test_search_without_match_or_query() {
        let directory = example_directory();
        assert!(directory.search("zzz", DEFAULT_SEARCH_LIMIT).is_empty());
        assert!(directory.search("   ", DEFAULT_SEARCH_LIMIT).is_empty());
    }

    #[test]
    fn test_cache_reuses_fresh_snapshot_and_reloads_after_invalidation() {
        let store = StoreMock::default();
        store
            .data
            .lock()
            .unwrap()
            .guests
            .push(guest("JO001", "Kwame Boateng"));
        let cache = DirectoryCache::new(Duration::from_secs(3600));

        let mut facade = store.get_facade().unwrap();
        assert_eq!(cache.get(facade.as_mut()).unwrap().len(), 1);
        store
            .data
            .lock()
            .unwrap()
            .guests
            .push(guest("JO002", "Abena Owusu"));
        // Stale, but fresh enough
        assert_eq!(cache.get(facade.as_mut()).unwrap().len(), 1);
        assert_eq!(store.data.lock().unwrap().guest_list_queries, 1);

        cache.invalidate();
        assert_eq!(cache.get(facade.as_mut()).unwrap().len(), 2);
        assert_eq!(store.data.lock().unwrap().guest_list_queries, 2);
    }

    #[test]
    fn test_cache_reloads_expired_snapshot() {
        let store = StoreMock::default();
        let cache = DirectoryCache::new(Duration::ZERO);
        let mut facade = store.get_facade().unwrap();
        cache.get(facade.as_mut()).unwrap();
        std::thread::sleep(Duration::from_millis(5));
        cache.get(facade.as_mut()).unwrap();
        assert_eq!(store.data.lock().unwrap().guest_list_queries, 2);
    }

    #[test]
    fn test_cache_discards_snapshot_loaded_before_invalidation() {
        let store = Arc::new(StoreMock::default());
        let cache = Arc::new(DirectoryCache::new(Duration::from_secs(3600)));
        {
            // A concurrent request adds a guest and invalidates the cache while the first load is
            // still in progress
            let (store2, cache2) = (store.clone(), cache.clone());
            let mut data = store.data.lock().unwrap();
            data.guests.push(guest("JO001", "Kwame Boateng"));
            data.after_guest_list_query = Some(Box::new(move || {
                store2
                    .data
                    .lock()
                    .unwrap()
                    .guests
                    .push(guest("NEW01", "Esi Ofori"));
                cache2.invalidate();
            }));
        }
        let mut facade = store.get_facade().unwrap();
        assert!(cache.get(facade.as_mut()).unwrap().find("NEW01").is_none());

        let directory = cache.get(facade.as_mut()).unwrap();
        assert_eq!(directory.find("NEW01").unwrap().name, "Esi Ofori");
        assert_eq!(store.data.lock().unwrap().guest_list_queries, 2);

        // Without further invalidation, the new snapshot is kept
        cache.get(facade.as_mut()).unwrap();
        assert_eq!(store.data.lock().unwrap().guest_list_queries, 2);
    }

    #[test]
    fn test_cache_propagates_store_errors() {
        let store = StoreMock::default();
        store.data.lock().unwrap().next_error = Some(StoreError::ConnectionError("down".into()));
        let cache = DirectoryCache::new(Duration::from_secs(60));
        let mut facade = store.get_facade().unwrap();
        assert!(matches!(
            cache.get(facade.as_mut()),
            Err(StoreError::ConnectionError(_))
        ));
        // The failed load is retried on the next access
        assert!(cache.get(facade.as_mut()).unwrap().is_empty());
        assert_eq!(store.data.lock().unwrap().guest_list_queries, 1);
    }
}
