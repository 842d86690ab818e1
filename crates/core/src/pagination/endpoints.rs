use chrono::{NaiveDate, Utc};
use rednit_domain::routes::{matches, profile};
use rednit_domain::{CompiledRoute, Match, Message, RawResponse, Result};

use super::cache::PageOrder;
use super::view::{CacheView, PagedEndpoint};

/// The authenticated user's matches, oldest first
#[derive(Debug, Clone, Copy, Default)]
pub struct MatchPages;

impl PagedEndpoint for MatchPages {
    type Item = Match;

    const ITEMS_KEY: &'static str = "matches";
    const ORDER: PageOrder = PageOrder::Chronological;

    fn first_page(&self, page_size: u32) -> Result<CompiledRoute> {
        profile::GET_MATCHES.compile(&[&page_size])
    }

    fn next_page(&self, page_size: u32, token: &str) -> Result<CompiledRoute> {
        profile::GET_MATCHES_PAGE.compile(&[&page_size, &token])
    }

    fn lookup(&self, id: &str) -> Result<CompiledRoute> {
        matches::GET_MATCH.compile(&[&id])
    }
}

/// Messages of one match, delivered newest first by the provider
#[derive(Debug, Clone)]
pub struct MessagePages {
    match_id: String,
}

impl MessagePages {
    pub fn new(match_id: impl Into<String>) -> Self {
        Self { match_id: match_id.into() }
    }

    pub fn match_id(&self) -> &str {
        &self.match_id
    }
}

impl PagedEndpoint for MessagePages {
    type Item = Message;

    const ITEMS_KEY: &'static str = "messages";
    const ORDER: PageOrder = PageOrder::NewestFirst;

    fn first_page(&self, page_size: u32) -> Result<CompiledRoute> {
        matches::GET_MESSAGES.compile(&[&self.match_id, &page_size])
    }

    fn next_page(&self, page_size: u32, token: &str) -> Result<CompiledRoute> {
        matches::GET_MESSAGES_PAGE.compile(&[&self.match_id, &page_size, &token])
    }

    fn lookup(&self, id: &str) -> Result<CompiledRoute> {
        profile::GET_MESSAGE.compile(&[&id])
    }

    // Single messages come back without the data envelope.
    fn decode_item(response: &RawResponse) -> Result<Message> {
        response.json()
    }
}

pub type MatchCacheView = CacheView<MatchPages>;
pub type MessageCacheView = CacheView<MessagePages>;

impl CacheView<MatchPages> {
    /// Cached matches whose matched person is called `name`.
    pub fn by_name(&self, name: &str) -> Vec<Match> {
        self.cache().filter(|item| item.name() == Some(name))
    }

    /// Cached matches whose matched person is `age` years old today.
    pub fn by_age(&self, age: u32) -> Vec<Match> {
        self.by_age_on(age, Utc::now().date_naive())
    }

    pub fn by_age_on(&self, age: u32, today: NaiveDate) -> Vec<Match> {
        self.cache()
            .filter(|item| item.person.as_ref().and_then(|person| person.age_on(today)) == Some(age))
    }
}

impl CacheView<MessagePages> {
    pub fn match_id(&self) -> &str {
        self.endpoint().match_id()
    }
}
