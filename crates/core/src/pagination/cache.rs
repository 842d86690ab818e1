use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::RwLock;
use rednit_domain::{Cacheable, Page, RednitError, Result};

/// Order in which a listing delivers its items
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageOrder {
    /// Oldest first; pages are appended as they arrive.
    Chronological,
    /// Newest first; each item is pushed to the front so the cache stays
    /// oldest first.
    NewestFirst,
}

struct CacheState<T> {
    items: VecDeque<T>,
    next_page_token: Option<String>,
    initial_fetch_done: bool,
}

/// In-memory accumulation of a paginated listing
///
/// Reads return copies, so callers can browse while a load appends pages.
/// Once the first page has been merged and no cursor remains, the cache is
/// exhausted and bulk loads stop touching the network.
pub struct PaginatedCache<T> {
    state: RwLock<CacheState<T>>,
    loading: AtomicBool,
}

impl<T> Default for PaginatedCache<T> {
    fn default() -> Self {
        Self {
            state: RwLock::new(CacheState {
                items: VecDeque::new(),
                next_page_token: None,
                initial_fetch_done: false,
            }),
            loading: AtomicBool::new(false),
        }
    }
}

impl<T: Cacheable + Clone> PaginatedCache<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> Vec<T> {
        self.state.read().items.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.state.read().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.read().items.is_empty()
    }

    pub fn find(&self, id: &str) -> Option<T> {
        self.state.read().items.iter().find(|item| item.cache_id() == id).cloned()
    }

    pub fn filter(&self, predicate: impl Fn(&T) -> bool) -> Vec<T> {
        self.state.read().items.iter().filter(|item| predicate(item)).cloned().collect()
    }

    /// Add `item` as the newest entry, replacing an entry with the same id.
    pub fn push(&self, item: T) {
        let mut state = self.state.write();
        state.items.retain(|existing| existing.cache_id() != item.cache_id());
        state.items.push_back(item);
    }

    /// Returns whether an entry with `id` was removed.
    pub fn remove(&self, id: &str) -> bool {
        let mut state = self.state.write();
        let before = state.items.len();
        state.items.retain(|item| item.cache_id() != id);
        state.items.len() != before
    }

    pub fn next_page_token(&self) -> Option<String> {
        self.state.read().next_page_token.clone()
    }

    pub fn initial_fetch_done(&self) -> bool {
        self.state.read().initial_fetch_done
    }

    pub fn is_exhausted(&self) -> bool {
        let state = self.state.read();
        state.initial_fetch_done && state.next_page_token.is_none()
    }

    /// Merge one page and advance the cursor.
    ///
    /// Items whose id is already cached are skipped.
    pub fn merge_page(&self, page: Page<T>, order: PageOrder) {
        merge_into(&mut self.state.write(), page, order);
    }

    /// Merge `page` as the first page of the listing, unless a first page
    /// was already merged. The cursor is never rewound.
    ///
    /// Returns whether the page was merged.
    pub fn merge_first_page(&self, page: Page<T>, order: PageOrder) -> bool {
        let mut state = self.state.write();
        if state.initial_fetch_done {
            return false;
        }
        merge_into(&mut state, page, order);
        true
    }

    /// Forget all items and the cursor.
    pub fn reset(&self) {
        let mut state = self.state.write();
        state.items.clear();
        state.next_page_token = None;
        state.initial_fetch_done = false;
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::Acquire)
    }

    /// Claim the cache for a bulk load.
    ///
    /// # Errors
    /// Returns `RednitError::LoadInProgress` while another load holds it.
    pub fn begin_load(&self) -> Result<LoadGuard<'_>> {
        self.loading
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| RednitError::LoadInProgress)?;
        Ok(LoadGuard { loading: &self.loading })
    }
}

fn merge_into<T: Cacheable>(state: &mut CacheState<T>, page: Page<T>, order: PageOrder) {
    let mut seen: HashSet<String> =
        state.items.iter().map(|item| item.cache_id().to_string()).collect();
    let fresh = page.items.into_iter().filter(|item| seen.insert(item.cache_id().to_string()));

    match order {
        PageOrder::Chronological => state.items.extend(fresh),
        PageOrder::NewestFirst => {
            for item in fresh {
                state.items.push_front(item);
            }
        }
    }
    state.next_page_token = page.next_page_token;
    state.initial_fetch_done = true;
}

/// Releases the bulk-load claim on drop
pub struct LoadGuard<'a> {
    loading: &'a AtomicBool,
}

impl Drop for LoadGuard<'_> {
    fn drop(&mut self) {
        self.loading.store(false, Ordering::Release);
    }
}
