use std::sync::Arc;

use rednit_domain::{decode_data, Cacheable, CompiledRoute, Page, RawResponse, RednitError, Result};
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use super::cache::{PageOrder, PaginatedCache};
use crate::action::Action;
use crate::dispatch::Request;
use crate::requester::Requester;

/// A cursor-paginated provider listing
pub trait PagedEndpoint: Send + Sync + 'static {
    type Item: Cacheable + DeserializeOwned + Clone + Send + Sync + 'static;

    /// Key of the items array inside the page envelope.
    const ITEMS_KEY: &'static str;
    const ORDER: PageOrder;

    fn first_page(&self, page_size: u32) -> Result<CompiledRoute>;

    fn next_page(&self, page_size: u32, token: &str) -> Result<CompiledRoute>;

    /// Route fetching a single item that is not cached.
    fn lookup(&self, id: &str) -> Result<CompiledRoute>;

    fn decode_item(response: &RawResponse) -> Result<Self::Item> {
        decode_data(response)
    }
}

/// Cached, lazily loaded view over a [`PagedEndpoint`]
pub struct CacheView<E: PagedEndpoint> {
    requester: Requester,
    endpoint: E,
    page_size: u32,
    cache: Arc<PaginatedCache<E::Item>>,
}

impl<E: PagedEndpoint> CacheView<E> {
    pub fn new(requester: Requester, endpoint: E, page_size: u32) -> Self {
        Self { requester, endpoint, page_size, cache: Arc::new(PaginatedCache::new()) }
    }

    pub fn endpoint(&self) -> &E {
        &self.endpoint
    }

    pub fn cache(&self) -> &PaginatedCache<E::Item> {
        &self.cache
    }

    /// Cached items, oldest first.
    pub fn items(&self) -> Vec<E::Item> {
        self.cache.items()
    }

    pub fn is_exhausted(&self) -> bool {
        self.cache.is_exhausted()
    }

    /// Item with `id`: resolved from the cache when present, otherwise
    /// fetched when executed. A fetched item is not added to the cache.
    ///
    /// # Errors
    /// Returns `RednitError::Route` if the lookup route cannot be built.
    pub fn get(&self, id: &str) -> Result<Action<E::Item>> {
        if let Some(item) = self.cache.find(id) {
            debug!(id, "Cache hit");
            return Ok(Action::completed(item));
        }
        let route = self.endpoint.lookup(id)?;
        Ok(Action::decoded(&self.requester, Request::new(route), |response| E::decode_item(&response)))
    }

    /// The first page: resolved from the cache once fetched, otherwise an
    /// action that fetches it, merges it and yields the cache contents.
    ///
    /// # Errors
    /// Returns `RednitError::Route` if the page route cannot be built.
    pub fn first_page(&self) -> Result<Action<Vec<E::Item>>> {
        if self.cache.initial_fetch_done() {
            return Ok(Action::completed(self.cache.items()));
        }
        let route = self.endpoint.first_page(self.page_size)?;
        let cache = Arc::clone(&self.cache);
        Ok(Action::decoded(&self.requester, Request::new(route), move |response| {
            let page = Page::decode(&response, E::ITEMS_KEY)?;
            if !cache.merge_first_page(page, E::ORDER) {
                debug!("First page already cached, keeping current cursor");
            }
            Ok(cache.items())
        }))
    }

    /// Every item of the listing, fetching the pages not yet cached.
    ///
    /// Resumes from the stored cursor and returns without network traffic
    /// once the listing is exhausted. Blocks like [`Action::complete`].
    ///
    /// # Errors
    /// - `RednitError::LoadInProgress` when another bulk load is running
    /// - `RednitError::Parsing` when the provider repeats a page cursor
    /// - any error of the page requests; pages merged so far stay cached
    pub fn load_all(&self) -> Result<Vec<E::Item>> {
        if self.cache.is_exhausted() {
            return Ok(self.cache.items());
        }
        let _guard = self.cache.begin_load()?;
        self.fetch_remaining()?;
        Ok(self.cache.items())
    }

    /// Drop the cache and fetch the whole listing again.
    ///
    /// # Errors
    /// Same as [`load_all`](Self::load_all).
    pub fn reload(&self) -> Result<Vec<E::Item>> {
        let _guard = self.cache.begin_load()?;
        self.cache.reset();
        self.fetch_remaining()?;
        Ok(self.cache.items())
    }

    fn fetch_remaining(&self) -> Result<()> {
        let mut token = self.cache.next_page_token();
        let mut pages = 0_usize;

        loop {
            let route = match token.as_deref() {
                Some(token) => self.endpoint.next_page(self.page_size, token)?,
                None => self.endpoint.first_page(self.page_size)?,
            };
            let page = self.page_action(route).complete()?;
            pages += 1;
            debug!(page = pages, items = page.items.len(), last = page.is_last(), "Fetched page");

            if page.next_page_token.is_some() && page.next_page_token == token {
                return Err(RednitError::Parsing(format!(
                    "provider repeated page token {}",
                    token.unwrap_or_default()
                )));
            }

            let next = page.next_page_token.clone();
            self.cache.merge_page(page, E::ORDER);
            match next {
                Some(next) => token = Some(next),
                None => break,
            }
        }

        info!(pages, items = self.cache.len(), "Listing fully loaded");
        Ok(())
    }

    fn page_action(&self, route: CompiledRoute) -> Action<Page<E::Item>> {
        Action::decoded(&self.requester, Request::new(route), |response| {
            Page::decode(&response, E::ITEMS_KEY)
        })
    }
}
